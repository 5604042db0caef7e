//! The [expansion algorithm](https://www.w3.org/TR/json-ld11-api/#expansion-algorithm).
//!
//! Expansion removes the context of a document:
//! every term is replaced by the IRI it maps to,
//! and every value is made explicit (value object, node reference, list object...).

use serde_json::Value;

use crate::context::{is_well_formed_language, ActiveContext, Env, ProcessingFlags, TermDefinition};
use crate::error::{JsonLdError, Result};
use crate::keyword::{is_keyword, Keyword};
use crate::options::ProcessingMode;
use crate::util::*;

/// Flags of the expansion algorithm.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ExpandFlags {
    /// Expanding a frame rather than a document.
    pub frame_expansion: bool,
    /// The element is the value of an index, type or id map.
    pub from_map: bool,
    /// The element is the direct value of `@list`.
    inside_list: bool,
}

impl ExpandFlags {
    fn nested(self) -> Self {
        ExpandFlags {
            from_map: false,
            inside_list: false,
            ..self
        }
    }
}

/// Expand `document` against `ctx`.
///
/// The result is always an array;
/// a top-level object containing only `@graph` is unwrapped.
pub(crate) fn expand_document(
    document: &Value,
    ctx: &ActiveContext,
    base_url: Option<&str>,
    frame_expansion: bool,
    env: &Env,
) -> Result<Vec<Value>> {
    let flags = ExpandFlags {
        frame_expansion,
        ..ExpandFlags::default()
    };
    let expanded = Expander::new(env).expand_element(ctx, None, document, base_url, flags)?;
    Ok(match expanded {
        None => vec![],
        Some(Value::Object(mut map)) if map.len() == 1 && map.contains_key("@graph") => map
            .remove("@graph")
            .map(into_array)
            .unwrap_or_default(),
        Some(other) => into_array(other),
    })
}

pub(crate) struct Expander<'e, 'a> {
    env: &'e Env<'a>,
}

impl<'e, 'a> Expander<'e, 'a> {
    pub fn new(env: &'e Env<'a>) -> Self {
        Expander { env }
    }

    fn ordered(&self) -> bool {
        self.env.options.ordered()
    }

    /// Expand `element`, the value of `property` (`None` at the top level).
    ///
    /// Returns `None` when the element expands to nothing.
    pub fn expand_element(
        &self,
        ctx: &ActiveContext,
        property: Option<&str>,
        element: &Value,
        base_url: Option<&str>,
        mut flags: ExpandFlags,
    ) -> Result<Option<Value>> {
        if property == Some("@default") {
            flags.frame_expansion = false;
        }
        let definition = property.and_then(|p| ctx.term(p));
        match element {
            Value::Null => Ok(None),
            Value::Array(items) => self
                .expand_array(ctx, property, definition, items, base_url, flags)
                .map(Some),
            Value::Object(map) => self.expand_map(ctx, property, definition, map, base_url, flags),
            scalar => {
                if property.is_none() || property == Some("@graph") {
                    return Ok(None);
                }
                let ctx = ctx.with_property_scope(definition, self.env)?;
                let expanded = expand_value(&ctx, property, scalar);
                Ok(Some(expanded).filter(|v| !v.is_null()))
            }
        }
    }

    fn expand_array(
        &self,
        ctx: &ActiveContext,
        property: Option<&str>,
        definition: Option<&TermDefinition>,
        items: &[Value],
        base_url: Option<&str>,
        flags: ExpandFlags,
    ) -> Result<Value> {
        let in_list =
            flags.inside_list || definition.is_some_and(|d| d.container.contains(Keyword::List));
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let item_flags = ExpandFlags {
                inside_list: false,
                ..flags
            };
            let Some(expanded) = self.expand_element(ctx, property, item, base_url, item_flags)?
            else {
                continue;
            };
            if in_list && (expanded.is_array() || is_list_object(&expanded)) {
                return Err(JsonLdError::ListOfLists(format!(
                    "in {}",
                    property.unwrap_or("top-level array")
                )));
            }
            match expanded {
                Value::Array(expanded) => result.extend(expanded),
                other => result.push(other),
            }
        }
        Ok(Value::Array(result))
    }

    fn expand_map(
        &self,
        ctx: &ActiveContext,
        property: Option<&str>,
        definition: Option<&TermDefinition>,
        element: &Map,
        base_url: Option<&str>,
        flags: ExpandFlags,
    ) -> Result<Option<Value>> {
        let mut active = ctx.clone();
        if let Some(previous) = active.previous_context().cloned() {
            if !flags.from_map {
                let expands_to =
                    |k: &String, kw: &str| active.expand_iri(k, false, true).as_deref() == Some(kw);
                let keep = element.keys().any(|k| expands_to(k, "@value"))
                    || (element.len() == 1 && element.keys().all(|k| expands_to(k, "@id")));
                if !keep {
                    active = previous;
                }
            }
        }
        active = active.with_property_scope(definition, self.env)?;
        if let Some(local) = element.get("@context") {
            active = active.process_with(
                local,
                base_url,
                &[],
                ProcessingFlags::default(),
                self.env,
            )?;
        }
        let type_scoped = active.clone();

        let mut type_keys: Vec<&String> = element
            .keys()
            .filter(|k| active.expand_iri(k, false, true).as_deref() == Some("@type"))
            .collect();
        type_keys.sort();
        for key in &type_keys {
            let mut terms: Vec<&str> = as_array(&element[key.as_str()])
                .iter()
                .filter_map(Value::as_str)
                .collect();
            terms.sort_unstable();
            for term in terms {
                if let Some((local, def)) = type_scoped
                    .term(term)
                    .and_then(|def| def.context.as_ref().map(|c| (c, def)))
                {
                    let flags = ProcessingFlags {
                        propagate: false,
                        ..ProcessingFlags::default()
                    };
                    active =
                        active.process_with(local, def.base_url.as_deref(), &[], flags, self.env)?;
                }
            }
        }
        let input_type = type_keys
            .first()
            .and_then(|key| as_array(&element[key.as_str()]).last())
            .and_then(Value::as_str)
            .and_then(|t| active.expand_iri(t, false, true));

        let mut result = Map::new();
        self.expand_object(
            &active,
            &type_scoped,
            property,
            element,
            &mut result,
            input_type.as_deref(),
            base_url,
            flags,
        )?;
        self.finish_object(result, property, flags)
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_object(
        &self,
        ctx: &ActiveContext,
        type_scoped: &ActiveContext,
        property: Option<&str>,
        element: &Map,
        result: &mut Map,
        input_type: Option<&str>,
        base_url: Option<&str>,
        flags: ExpandFlags,
    ) -> Result<()> {
        let mut nests: Vec<&String> = vec![];
        for (key, value) in entries(element, self.ordered()) {
            if key == "@context" {
                continue;
            }
            let Some(expanded_property) = ctx.expand_iri(key, false, true) else {
                continue;
            };
            if !expanded_property.contains(':') && !is_keyword(&expanded_property) {
                log::debug!("dropping {key}, which does not expand to an IRI");
                continue;
            }
            if let Ok(keyword) = expanded_property.parse::<Keyword>() {
                if keyword == Keyword::Nest {
                    if property == Some("@reverse") {
                        return Err(JsonLdError::InvalidReversePropertyMap(key.clone()));
                    }
                    if !nests.contains(&key) {
                        nests.push(key);
                    }
                    continue;
                }
                self.expand_keyword(
                    ctx,
                    type_scoped,
                    property,
                    keyword,
                    value,
                    result,
                    input_type,
                    base_url,
                    flags,
                )?;
                continue;
            }

            let definition = ctx.term(key);
            let container = definition.map(|d| d.container.clone()).unwrap_or_default();
            let expanded_value = match value {
                _ if definition.and_then(|d| d.type_mapping.as_deref()) == Some("@json") => {
                    let mut map = Map::new();
                    map.insert("@value".into(), value.clone());
                    map.insert("@type".into(), "@json".into());
                    Some(Value::Object(map))
                }
                Value::Object(map) if container.contains(Keyword::Language) => {
                    Some(Value::Array(self.expand_language_map(ctx, definition, map)?))
                }
                Value::Object(map)
                    if container.contains(Keyword::Index)
                        || container.contains(Keyword::Type)
                        || container.contains(Keyword::Id) =>
                {
                    Some(Value::Array(self.expand_index_map(
                        ctx, key, definition, map, base_url, flags,
                    )?))
                }
                _ => self.expand_element(ctx, Some(key), value, base_url, flags.nested())?,
            };
            let Some(mut expanded_value) = expanded_value else {
                continue;
            };
            if container.contains(Keyword::List) && !is_list_object(&expanded_value) {
                expanded_value = single("@list", Value::Array(into_array(expanded_value)));
            }
            if container.contains(Keyword::Graph)
                && !container.contains(Keyword::Id)
                && !container.contains(Keyword::Index)
            {
                expanded_value = Value::Array(
                    into_array(expanded_value)
                        .into_iter()
                        .map(|ev| single("@graph", Value::Array(into_array(ev))))
                        .collect(),
                );
            }
            if definition.is_some_and(|d| d.reverse) {
                let reverse_map = object_entry(result, "@reverse");
                for item in into_array(expanded_value) {
                    if is_value_object(&item) || is_list_object(&item) {
                        return Err(JsonLdError::InvalidReversePropertyValue(key.clone()));
                    }
                    add_value(reverse_map, &expanded_property, item, true);
                }
            } else {
                add_value(result, &expanded_property, expanded_value, true);
            }
        }

        for nesting_key in nests {
            let nested_ctx = ctx.with_property_scope(ctx.term(nesting_key), self.env)?;
            for nested in as_array(&element[nesting_key.as_str()]) {
                let Value::Object(nested) = nested else {
                    return Err(JsonLdError::InvalidNestValue(nested.to_string()));
                };
                if nested
                    .keys()
                    .any(|k| nested_ctx.expand_iri(k, false, true).as_deref() == Some("@value"))
                {
                    return Err(JsonLdError::InvalidNestValue(format!(
                        "{nesting_key} contains a value object"
                    )));
                }
                self.expand_object(
                    &nested_ctx,
                    type_scoped,
                    property,
                    nested,
                    result,
                    input_type,
                    base_url,
                    flags,
                )?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_keyword(
        &self,
        ctx: &ActiveContext,
        type_scoped: &ActiveContext,
        property: Option<&str>,
        keyword: Keyword,
        value: &Value,
        result: &mut Map,
        input_type: Option<&str>,
        base_url: Option<&str>,
        flags: ExpandFlags,
    ) -> Result<()> {
        let mode = ctx.processing_mode();
        if property == Some("@reverse") {
            return Err(JsonLdError::InvalidReversePropertyMap(keyword.to_string()));
        }
        let may_repeat = keyword == Keyword::Included
            || (keyword == Keyword::Type && mode == ProcessingMode::JsonLd1_1);
        if result.contains_key(keyword.as_str()) && !may_repeat {
            return Err(JsonLdError::CollidingKeywords(keyword.to_string()));
        }
        let frame = flags.frame_expansion;
        let expanded_value = match keyword {
            Keyword::Id => match value {
                Value::String(id) => ctx
                    .expand_iri(id, true, false)
                    .map(Value::String)
                    .unwrap_or_default(),
                Value::Object(map) if frame && map.is_empty() => {
                    Value::Array(vec![Value::Object(Map::new())])
                }
                Value::Array(ids) if frame && ids.iter().all(Value::is_string) => Value::Array(
                    ids.iter()
                        .filter_map(Value::as_str)
                        .filter_map(|id| ctx.expand_iri(id, true, false))
                        .map(Value::String)
                        .collect(),
                ),
                other => return Err(JsonLdError::InvalidIdValue(other.to_string())),
            },
            Keyword::Type => {
                let expanded = match value {
                    Value::String(t) => type_scoped
                        .expand_iri(t, true, true)
                        .map(Value::String)
                        .unwrap_or_default(),
                    Value::Array(types) if types.iter().all(Value::is_string) => Value::Array(
                        types
                            .iter()
                            .filter_map(Value::as_str)
                            .filter_map(|t| type_scoped.expand_iri(t, true, true))
                            .map(Value::String)
                            .collect(),
                    ),
                    Value::Object(map) if frame && map.is_empty() => value.clone(),
                    Value::Object(map) if frame && map.len() == 1 => match map.get("@default") {
                        Some(Value::String(dflt)) => single(
                            "@default",
                            type_scoped
                                .expand_iri(dflt, true, true)
                                .map(Value::String)
                                .unwrap_or_default(),
                        ),
                        _ => return Err(JsonLdError::InvalidTypeValue(value.to_string())),
                    },
                    other => return Err(JsonLdError::InvalidTypeValue(other.to_string())),
                };
                match result.remove("@type") {
                    Some(existing) => {
                        let mut types = into_array(existing);
                        types.extend(into_array(expanded));
                        Value::Array(types)
                    }
                    None => expanded,
                }
            }
            Keyword::Graph => Value::Array(
                self.expand_element(ctx, Some("@graph"), value, base_url, flags.nested())?
                    .map(into_array)
                    .unwrap_or_default(),
            ),
            Keyword::Included => {
                if mode == ProcessingMode::JsonLd1_0 {
                    return Ok(());
                }
                let included = self
                    .expand_element(ctx, property, value, base_url, flags.nested())?
                    .map(into_array)
                    .unwrap_or_default();
                if let Some(bad) = included.iter().find(|v| !is_node_object(v)) {
                    return Err(JsonLdError::InvalidIncludedValue(bad.to_string()));
                }
                let mut all = result.remove("@included").map(into_array).unwrap_or_default();
                all.extend(included);
                Value::Array(all)
            }
            Keyword::Value => {
                let expanded = if input_type == Some("@json") {
                    if mode == ProcessingMode::JsonLd1_0 {
                        return Err(JsonLdError::InvalidValueObjectValue(value.to_string()));
                    }
                    value.clone()
                } else if value.is_null() || is_scalar(value) {
                    value.clone()
                } else if frame
                    && (is_empty_object(value)
                        || value.as_array().is_some_and(|a| a.iter().all(is_scalar)))
                {
                    Value::Array(into_array(value.clone()))
                } else {
                    return Err(JsonLdError::InvalidValueObjectValue(value.to_string()));
                };
                result.insert("@value".into(), expanded);
                return Ok(());
            }
            Keyword::Language => match value {
                Value::String(tag) => {
                    if !is_well_formed_language(tag) {
                        log::warn!("ill-formed language tag {tag}");
                    }
                    Value::String(tag.to_lowercase())
                }
                Value::Object(map) if frame && map.is_empty() => value.clone(),
                Value::Array(tags) if frame && tags.iter().all(Value::is_string) => Value::Array(
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(|t| Value::String(t.to_lowercase()))
                        .collect(),
                ),
                other => return Err(JsonLdError::InvalidLanguageTaggedString(other.to_string())),
            },
            Keyword::Direction => {
                if mode == ProcessingMode::JsonLd1_0 {
                    return Ok(());
                }
                match value {
                    Value::String(dir) if dir == "ltr" || dir == "rtl" => value.clone(),
                    Value::Object(map) if frame && map.is_empty() => value.clone(),
                    Value::Array(dirs) if frame && dirs.iter().all(Value::is_string) => {
                        value.clone()
                    }
                    other => return Err(JsonLdError::InvalidBaseDirection(other.to_string())),
                }
            }
            Keyword::Index => match value {
                Value::String(_) => value.clone(),
                other => return Err(JsonLdError::InvalidIndexValue(other.to_string())),
            },
            Keyword::List => {
                if property.is_none() || property == Some("@graph") {
                    return Ok(());
                }
                let list_flags = ExpandFlags {
                    inside_list: true,
                    ..flags.nested()
                };
                let expanded = self.expand_element(ctx, property, value, base_url, list_flags)?;
                if !value.is_array() && expanded.as_ref().is_some_and(is_list_object) {
                    return Err(JsonLdError::ListOfLists(format!(
                        "in {}",
                        property.unwrap_or_default()
                    )));
                }
                Value::Array(expanded.map(into_array).unwrap_or_default())
            }
            Keyword::Set => self
                .expand_element(ctx, property, value, base_url, flags)?
                .unwrap_or_default(),
            Keyword::Reverse => {
                if !value.is_object() {
                    return Err(JsonLdError::InvalidReverseValue(value.to_string()));
                }
                let expanded =
                    self.expand_element(ctx, Some("@reverse"), value, base_url, flags.nested())?;
                if let Some(Value::Object(mut expanded)) = expanded {
                    if let Some(Value::Object(double)) = expanded.remove("@reverse") {
                        for (prop, items) in double {
                            add_value(result, &prop, items, true);
                        }
                    }
                    if !expanded.is_empty() {
                        let reverse_map = object_entry(result, "@reverse");
                        for (prop, items) in expanded {
                            for item in into_array(items) {
                                if is_value_object(&item) || is_list_object(&item) {
                                    return Err(JsonLdError::InvalidReversePropertyValue(prop));
                                }
                                add_value(reverse_map, &prop, item, true);
                            }
                        }
                    }
                }
                return Ok(());
            }
            Keyword::Default if frame => Value::Array(
                self.expand_element(ctx, Some("@default"), value, base_url, flags.nested())?
                    .map(into_array)
                    .unwrap_or_default(),
            ),
            Keyword::Embed | Keyword::Explicit | Keyword::OmitDefault | Keyword::RequireAll
                if frame =>
            {
                Value::Array(into_array(value.clone()))
            }
            other => {
                log::debug!("ignoring {other} in expansion");
                return Ok(());
            }
        };
        if !expanded_value.is_null() {
            result.insert(keyword.as_str().into(), expanded_value);
        }
        Ok(())
    }

    fn expand_language_map(
        &self,
        ctx: &ActiveContext,
        definition: Option<&TermDefinition>,
        map: &Map,
    ) -> Result<Vec<Value>> {
        let direction = match definition.and_then(|d| d.direction) {
            Some(direction) => direction,
            None => ctx.default_direction(),
        };
        let mut expanded = vec![];
        for (language, values) in entries(map, self.ordered()) {
            let is_none = ctx.expand_iri(language, false, true).as_deref() == Some("@none");
            for item in as_array(values) {
                match item {
                    Value::Null => {}
                    Value::String(_) => {
                        let mut value = Map::new();
                        value.insert("@value".into(), item.clone());
                        if !is_none {
                            if !is_well_formed_language(language) {
                                log::warn!("ill-formed language tag {language}");
                            }
                            value.insert("@language".into(), language.to_lowercase().into());
                        }
                        if let Some(direction) = direction {
                            value.insert("@direction".into(), direction.as_str().into());
                        }
                        expanded.push(Value::Object(value));
                    }
                    other => return Err(JsonLdError::InvalidLanguageMapValue(other.to_string())),
                }
            }
        }
        Ok(expanded)
    }

    fn expand_index_map(
        &self,
        ctx: &ActiveContext,
        key: &str,
        definition: Option<&TermDefinition>,
        map: &Map,
        base_url: Option<&str>,
        flags: ExpandFlags,
    ) -> Result<Vec<Value>> {
        let container = definition.map(|d| d.container.clone()).unwrap_or_default();
        let index_key = definition
            .and_then(|d| d.index.as_deref())
            .unwrap_or("@index");
        let mut expanded = vec![];
        for (index, values) in entries(map, self.ordered()) {
            let lookup = ctx.previous_context().unwrap_or(ctx);
            let scoped = lookup
                .term(index)
                .and_then(|def| def.context.as_ref().map(|c| (c, def)))
                .filter(|_| container.contains(Keyword::Type));
            let map_context = match scoped {
                Some((local, def)) => lookup.process_with(
                    local,
                    def.base_url.as_deref(),
                    &[],
                    ProcessingFlags::default(),
                    self.env,
                )?,
                None => ctx.clone(),
            };
            let expanded_index = ctx.expand_iri(index, false, true);
            let is_none = expanded_index.as_deref() == Some("@none");
            let wrapped;
            let values = if values.is_array() {
                values
            } else {
                wrapped = Value::Array(vec![values.clone()]);
                &wrapped
            };
            let item_flags = ExpandFlags {
                from_map: true,
                inside_list: false,
                ..flags
            };
            let items = self
                .expand_element(&map_context, Some(key), values, base_url, item_flags)?
                .map(into_array)
                .unwrap_or_default();
            for mut item in items {
                if container.contains(Keyword::Graph) && !is_graph_object(&item) {
                    item = single("@graph", Value::Array(into_array(item)));
                }
                if is_none {
                    expanded.push(item);
                    continue;
                }
                if container.contains(Keyword::Index) && index_key != "@index" {
                    if is_value_object(&item) {
                        return Err(JsonLdError::InvalidValueObject(format!(
                            "value object in property-valued index {index_key}"
                        )));
                    }
                    let reexpanded = expand_value(ctx, Some(index_key), &Value::String(index.clone()));
                    if let (Some(index_property), Value::Object(obj)) =
                        (ctx.expand_iri(index_key, false, true), &mut item)
                    {
                        let mut values = vec![reexpanded];
                        if let Some(existing) = obj.remove(&index_property) {
                            values.extend(into_array(existing));
                        }
                        obj.insert(index_property, Value::Array(values));
                    }
                } else if let Value::Object(obj) = &mut item {
                    if container.contains(Keyword::Index) {
                        if !obj.contains_key("@index") {
                            obj.insert("@index".into(), index.clone().into());
                        }
                    } else if container.contains(Keyword::Id) {
                        if !obj.contains_key("@id") {
                            if let Some(id) = ctx.expand_iri(index, true, false) {
                                obj.insert("@id".into(), id.into());
                            }
                        }
                    } else if container.contains(Keyword::Type) {
                        let mut types: Vec<Value> = expanded_index.clone().map(Value::String).into_iter().collect();
                        if let Some(existing) = obj.remove("@type") {
                            types.extend(into_array(existing));
                        }
                        obj.insert("@type".into(), Value::Array(types));
                    }
                }
                expanded.push(item);
            }
        }
        Ok(expanded)
    }

    fn finish_object(
        &self,
        mut result: Map,
        property: Option<&str>,
        flags: ExpandFlags,
    ) -> Result<Option<Value>> {
        if result.contains_key("@value") {
            let bad_key = result.keys().any(|k| {
                !matches!(
                    k.as_str(),
                    "@direction" | "@index" | "@language" | "@type" | "@value"
                )
            });
            let typed_and_tagged = result.contains_key("@type")
                && (result.contains_key("@language") || result.contains_key("@direction"));
            if bad_key || typed_and_tagged {
                return Err(JsonLdError::InvalidValueObject(
                    Value::Object(result).to_string(),
                ));
            }
            if result.get("@type").and_then(Value::as_str) != Some("@json") {
                let value = &result["@value"];
                if value.is_null() || value.as_array().is_some_and(Vec::is_empty) {
                    return Ok(None);
                }
                if !flags.frame_expansion {
                    if !value.is_string() && result.contains_key("@language") {
                        return Err(JsonLdError::InvalidLanguageTaggedValue(value.to_string()));
                    }
                    if let Some(type_) = result.get("@type") {
                        if !type_.as_str().is_some_and(ldtk_iri::is_absolute_iri) {
                            return Err(JsonLdError::InvalidTypedValue(type_.to_string()));
                        }
                    }
                }
            }
        } else {
            if let Some(types) = result.get_mut("@type") {
                if !types.is_array() {
                    *types = Value::Array(vec![types.take()]);
                }
            }
            if result.contains_key("@set") || result.contains_key("@list") {
                if result.len() > 2 || (result.len() == 2 && !result.contains_key("@index")) {
                    return Err(JsonLdError::InvalidSetOrListObject(
                        Value::Object(result).to_string(),
                    ));
                }
                if let Some(set) = result.remove("@set") {
                    return Ok(Some(set));
                }
            }
        }
        if result.len() == 1 && result.contains_key("@language") {
            return Ok(None);
        }
        if property.is_none() || property == Some("@graph") {
            let keep_free_floating = self.env.options.keep_free_floating_nodes();
            if result.is_empty() && !flags.frame_expansion {
                return Ok(None);
            }
            if !keep_free_floating {
                if result.contains_key("@value") || result.contains_key("@list") {
                    return Ok(None);
                }
                if !flags.frame_expansion && result.len() == 1 && result.contains_key("@id") {
                    return Ok(None);
                }
            }
        }
        Ok(Some(Value::Object(result)))
    }
}

/// [Value expansion](https://www.w3.org/TR/json-ld11-api/#value-expansion)
///
/// Returns `Value::Null` if `value` is coerced to an IRI that can not be expanded.
pub(crate) fn expand_value(ctx: &ActiveContext, property: Option<&str>, value: &Value) -> Value {
    let definition = property.and_then(|p| ctx.term(p));
    let type_mapping = definition.and_then(|d| d.type_mapping.as_deref());
    if let Value::String(txt) = value {
        let vocab = match type_mapping {
            Some("@id") => Some(false),
            Some("@vocab") => Some(true),
            _ => None,
        };
        if let Some(vocab) = vocab {
            return match ctx.expand_iri(txt, true, vocab) {
                Some(iri) => single("@id", Value::String(iri)),
                None => Value::Null,
            };
        }
    }
    let mut result = Map::new();
    result.insert("@value".into(), value.clone());
    match type_mapping {
        Some(t) if !matches!(t, "@id" | "@vocab" | "@none") => {
            result.insert("@type".into(), t.into());
        }
        _ if value.is_string() => {
            let language = match definition.and_then(|d| d.language.as_ref()) {
                Some(language) => language.as_deref(),
                None => ctx.default_language(),
            };
            let direction = match definition.and_then(|d| d.direction) {
                Some(direction) => direction,
                None => ctx.default_direction(),
            };
            if let Some(language) = language {
                result.insert("@language".into(), language.into());
            }
            if let Some(direction) = direction {
                result.insert("@direction".into(), direction.as_str().into());
            }
        }
        _ => {}
    }
    Value::Object(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loader::StaticLoader;
    use crate::options::JsonLdOptions;
    use ldtk_iri::resolve::BaseIri;
    use serde_json::json;
    use test_case::test_case;

    fn expand_with_options<L: crate::loader::DocumentLoader>(
        doc: Value,
        options: &JsonLdOptions<L>,
    ) -> Result<Value> {
        let env = Env::new(options);
        let ctx = ActiveContext::from_options(options);
        let base = options.base().map(|b| b.as_str().to_string());
        expand_document(&doc, &ctx, base.as_deref(), false, &env).map(Value::Array)
    }

    fn expand(doc: Value) -> Result<Value> {
        let options =
            JsonLdOptions::new().with_base(BaseIri::new("http://example.org/doc").unwrap());
        expand_with_options(doc, &options)
    }

    #[test]
    fn alice() {
        let got = expand(json!({
            "@context": {"name": "http://xmlns.com/foaf/0.1/name"},
            "@id": "http://example.com/Alice",
            "name": "Alice"
        }))
        .unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.com/Alice",
                "http://xmlns.com/foaf/0.1/name": [{"@value": "Alice"}]
            }])
        );
    }

    #[test]
    fn coercion_and_language() {
        let got = expand(json!({
            "@context": {
                "@vocab": "http://schema.org/",
                "@language": "en",
                "knows": {"@type": "@id"},
                "age": {"@type": "http://www.w3.org/2001/XMLSchema#integer"},
                "nick": {"@language": null},
            },
            "@id": "alice",
            "@type": "Person",
            "knows": "bob",
            "age": "42",
            "name": "Alice",
            "nick": "Al",
        }))
        .unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.org/alice",
                "@type": ["http://schema.org/Person"],
                "http://schema.org/knows": [{"@id": "http://example.org/bob"}],
                "http://schema.org/age": [{"@value": "42", "@type": "http://www.w3.org/2001/XMLSchema#integer"}],
                "http://schema.org/name": [{"@value": "Alice", "@language": "en"}],
                "http://schema.org/nick": [{"@value": "Al"}],
            }])
        );
    }

    #[test]
    fn containers() {
        let got = expand(json!({
            "@context": {
                "@vocab": "http://example.org/",
                "label": {"@container": "@language"},
                "list": {"@container": "@list"},
                "byId": {"@container": "@id"},
                "byType": {"@container": "@type"},
                "byIndex": {"@container": "@index"},
            },
            "label": {"en": "Hello", "fr": ["Bonjour", "Salut"]},
            "list": [1, 2],
            "byId": {"a": {"p": 1}},
            "byType": {"T": {"@id": "x"}},
            "byIndex": {"i": {"@value": "v"}},
        }))
        .unwrap();
        assert_eq!(
            got,
            json!([{
                "http://example.org/label": [
                    {"@value": "Hello", "@language": "en"},
                    {"@value": "Bonjour", "@language": "fr"},
                    {"@value": "Salut", "@language": "fr"},
                ],
                "http://example.org/list": [{"@list": [{"@value": 1}, {"@value": 2}]}],
                "http://example.org/byId": [{"@id": "http://example.org/a", "http://example.org/p": [{"@value": 1}]}],
                "http://example.org/byType": [{"@id": "http://example.org/x", "@type": ["http://example.org/T"]}],
                "http://example.org/byIndex": [{"@value": "v", "@index": "i"}],
            }])
        );
    }

    #[test]
    fn reverse_and_nest() {
        let got = expand(json!({
            "@context": {
                "@vocab": "http://example.org/",
                "parentOf": {"@reverse": "http://example.org/childOf"},
                "meta": "@nest",
            },
            "@id": "p",
            "parentOf": {"@id": "c"},
            "meta": {"label": "x"},
        }))
        .unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.org/p",
                "@reverse": {"http://example.org/childOf": [{"@id": "http://example.org/c"}]},
                "http://example.org/label": [{"@value": "x"}],
            }])
        );
    }

    #[test]
    fn json_literal() {
        let got = expand(json!({
            "@context": {"data": {"@id": "http://example.org/data", "@type": "@json"}},
            "data": {"b": [1, 2], "a": null},
        }))
        .unwrap();
        assert_eq!(
            got,
            json!([{"http://example.org/data": [{"@value": {"b": [1, 2], "a": null}, "@type": "@json"}]}])
        );
    }

    #[test]
    fn free_floating_nodes() {
        let doc = json!({"@graph": [{"@id": "http://example.org/a"}, {"@value": 1}]});
        assert_eq!(expand(doc.clone()).unwrap(), json!([]));
        let options = JsonLdOptions::new().with_keep_free_floating_nodes(true);
        assert_eq!(
            expand_with_options(doc, &options).unwrap(),
            json!([{"@id": "http://example.org/a"}, {"@value": 1}])
        );
    }

    #[test]
    fn type_scoped_context_does_not_propagate() {
        let got = expand(json!({
            "@context": {
                "@vocab": "http://example.org/",
                "Person": {"@context": {"name": "http://xmlns.com/foaf/0.1/name"}},
            },
            "@type": "Person",
            "name": "Alice",
            "knows": {"name": "Bob"},
        }))
        .unwrap();
        assert_eq!(
            got,
            json!([{
                "@type": ["http://example.org/Person"],
                "http://xmlns.com/foaf/0.1/name": [{"@value": "Alice"}],
                "http://example.org/knows": [{"http://example.org/name": [{"@value": "Bob"}]}],
            }])
        );
    }

    #[test]
    fn remote_context() {
        let loader = StaticLoader::new().with_json(
            "http://example.org/ctx",
            &json!({"@context": {"name": "http://xmlns.com/foaf/0.1/name"}}),
        );
        let options = JsonLdOptions::new().with_document_loader(loader);
        let got = expand_with_options(
            json!({"@context": "http://example.org/ctx", "@id": "_:x", "name": "A"}),
            &options,
        )
        .unwrap();
        assert_eq!(
            got,
            json!([{"@id": "_:x", "http://xmlns.com/foaf/0.1/name": [{"@value": "A"}]}])
        );
    }

    #[test]
    fn idempotent() {
        let doc = json!({
            "@context": {"@vocab": "http://example.org/", "l": {"@container": "@list"}},
            "@id": "a",
            "l": [1, {"@id": "b", "p": "x"}],
            "q": {"@value": "y", "@language": "EN"},
        });
        let once = expand(doc).unwrap();
        let twice = expand(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_keyword_like_keys_are_ignored() {
        let got = expand(json!({"@id": "http://example.org/a", "@foo": 1, "http://example.org/p": 2}))
            .unwrap();
        assert_eq!(
            got,
            json!([{"@id": "http://example.org/a", "http://example.org/p": [{"@value": 2}]}])
        );
    }

    #[test]
    fn value_object_drops_terms_without_iri() {
        let got = expand(json!({"http://example.org/p": {"@value": "x", "foo": 1}})).unwrap();
        assert_eq!(got, json!([{"http://example.org/p": [{"@value": "x"}]}]));
    }

    #[test_case(json!({"http://example.org/p": {"@value": "x", "@type": "http://example.org/T", "@language": "en"}}) => "invalid value object" ; "type and language")]
    #[test_case(json!({"http://example.org/p": {"@value": "x", "http://example.org/foo": 1}}) => "invalid value object" ; "extra key")]
    #[test_case(json!({"http://example.org/p": {"@value": 1, "@language": "en"}}) => "invalid language-tagged value" ; "number with language")]
    #[test_case(json!({"http://example.org/p": {"@value": "x", "@type": "_:t"}}) => "invalid typed value" ; "blank node datatype")]
    #[test_case(json!({"http://example.org/p": {"@list": [{"@list": [1]}]}}) => "list of lists" ; "nested list object")]
    #[test_case(json!({"@context": {"l": {"@id": "http://example.org/l", "@container": "@list"}}, "l": [[1]]}) => "list of lists" ; "nested array in list container")]
    #[test_case(json!({"http://example.org/p": {"@list": {"@list": [1]}}}) => "list of lists" ; "list as list value")]
    #[test_case(json!({"@id": 1}) => "invalid @id value" ; "numeric id")]
    #[test_case(json!({"@type": {"x": 1}}) => "invalid type value" ; "object type")]
    #[test_case(json!({"@id": "http://example.org/a", "@reverse": 1}) => "invalid @reverse value" ; "reverse not a map")]
    #[test_case(json!({"http://example.org/p": {"@list": [], "@id": "x"}}) => "invalid set or list object" ; "list with id")]
    #[test_case(json!({"http://example.org/p": {"@value": "x", "@index": 1}}) => "invalid @index value" ; "numeric index")]
    #[test_case(json!({"http://example.org/q": {"@id": "http://example.org/a", "@included": [{"@value": 1}]}}) => "invalid @included value" ; "value in included")]
    #[test_case(json!({"@id": "http://example.org/a", "http://example.org/p": {"@value": {"a": 1}}}) => "invalid value object value" ; "object value")]
    #[test_case(json!({"@context": {"id1": "@id", "id2": "@id"}, "id1": "a", "id2": "b"}) => "colliding keywords" ; "colliding ids")]
    #[test_case(json!({"http://example.org/p": {"@value": "x", "@direction": "up"}}) => "invalid base direction" ; "bad direction")]
    #[test_case(json!({"http://example.org/p": {"@value": "x", "@language": 1}}) => "invalid language-tagged string" ; "bad language")]
    fn error_codes(doc: Value) -> &'static str {
        expand(doc).unwrap_err().code()
    }
}
