//! The [compaction algorithm](https://www.w3.org/TR/json-ld11-api/#compaction-algorithms),
//! and the inverse context it relies on.
//!
//! Compaction is the reverse of expansion:
//! IRIs are shortened to terms or compact IRIs,
//! and values are simplified whenever the context allows to recover them.

use std::collections::BTreeMap;

use ldtk_iri::is_absolute_iri;
use ldtk_iri::relativize::Relativizer;
use serde_json::Value;

use crate::context::{ActiveContext, Env, ProcessingFlags};
use crate::error::{JsonLdError, Result};
use crate::keyword::Keyword;
use crate::options::ProcessingMode;
use crate::util::*;

/// Which of the maps of an [`InverseContext`] entry a term is selected from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Selector {
    Language,
    Type,
    Any,
}

#[derive(Debug, Default)]
struct Selection {
    language: BTreeMap<String, String>,
    type_: BTreeMap<String, String>,
    any: BTreeMap<String, String>,
}

impl Selection {
    fn get(&self, selector: Selector) -> &BTreeMap<String, String> {
        match selector {
            Selector::Language => &self.language,
            Selector::Type => &self.type_,
            Selector::Any => &self.any,
        }
    }
}

/// Maps IRIs to the terms that can be used to compact them,
/// indexed by container mapping, then by type or language mapping.
///
/// When several terms qualify, the shortest one wins (then the lexicographically least).
#[derive(Debug, Default)]
pub struct InverseContext(BTreeMap<String, BTreeMap<String, Selection>>);

impl InverseContext {
    /// Build the inverse context of `ctx`.
    pub fn new(ctx: &ActiveContext) -> Self {
        let mut result = BTreeMap::<String, BTreeMap<String, Selection>>::new();
        let default_language = ctx
            .default_language()
            .map(str::to_lowercase)
            .unwrap_or_else(|| "@none".into());
        let mut terms: Vec<_> = ctx.terms().collect();
        terms.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)));
        for (term, def) in terms {
            let Some(iri) = def.iri() else {
                continue;
            };
            let container = if def.container.is_empty() {
                "@none".to_string()
            } else {
                def.container.key()
            };
            let selection = result
                .entry(iri.to_string())
                .or_default()
                .entry(container)
                .or_default();
            let set = |map: &mut BTreeMap<String, String>, key: String| {
                map.entry(key).or_insert_with(|| term.to_string());
            };
            set(&mut selection.any, "@none".into());
            if def.reverse {
                set(&mut selection.type_, "@reverse".into());
            } else if def.type_mapping.as_deref() == Some("@none") {
                set(&mut selection.language, "@any".into());
                set(&mut selection.type_, "@any".into());
            } else if let Some(type_mapping) = &def.type_mapping {
                set(&mut selection.type_, type_mapping.clone());
            } else if let (Some(language), Some(direction)) = (&def.language, def.direction) {
                let key = match (language, direction) {
                    (Some(l), Some(d)) => format!("{}_{d}", l.to_lowercase()),
                    (Some(l), None) => l.to_lowercase(),
                    (None, Some(d)) => format!("_{d}"),
                    (None, None) => "@null".into(),
                };
                set(&mut selection.language, key);
            } else if let Some(language) = &def.language {
                let key = match language {
                    Some(l) => l.to_lowercase(),
                    None => "@null".into(),
                };
                set(&mut selection.language, key);
            } else if let Some(direction) = def.direction {
                let key = match direction {
                    Some(d) => format!("_{d}"),
                    None => "@none".into(),
                };
                set(&mut selection.language, key);
            } else if let Some(direction) = ctx.default_direction() {
                let language = ctx.default_language().unwrap_or_default().to_lowercase();
                set(&mut selection.language, format!("{language}_{direction}"));
                set(&mut selection.language, "@none".into());
                set(&mut selection.type_, "@none".into());
            } else {
                set(&mut selection.language, default_language.clone());
                set(&mut selection.language, "@none".into());
                set(&mut selection.type_, "@none".into());
            }
        }
        InverseContext(result)
    }

    fn contains(&self, iri: &str) -> bool {
        self.0.contains_key(iri)
    }

    /// [Term selection](https://www.w3.org/TR/json-ld11-api/#term-selection)
    fn select_term(
        &self,
        iri: &str,
        containers: &[&str],
        selector: Selector,
        preferred_values: &[String],
    ) -> Option<&str> {
        let by_container = self.0.get(iri)?;
        containers
            .iter()
            .filter_map(|c| by_container.get(*c))
            .find_map(|selection| {
                let map = selection.get(selector);
                preferred_values
                    .iter()
                    .find_map(|v| map.get(v).map(String::as_str))
            })
    }
}

/// An active context together with its inverse context.
pub(crate) struct Scope {
    pub ctx: ActiveContext,
    inverse: InverseContext,
}

impl Scope {
    pub fn new(ctx: ActiveContext) -> Self {
        let inverse = InverseContext::new(&ctx);
        Scope { ctx, inverse }
    }
}

pub(crate) struct Compactor<'e, 'a> {
    env: &'e Env<'a>,
}

impl<'e, 'a> Compactor<'e, 'a> {
    pub fn new(env: &'e Env<'a>) -> Self {
        Compactor { env }
    }

    fn compact_arrays(&self) -> bool {
        self.env.options.compact_arrays()
    }

    /// Compact `element`, the value of `property` (`None` at the top level).
    pub fn compact_element(
        &self,
        scope: &Scope,
        property: Option<&str>,
        element: &Value,
    ) -> Result<Value> {
        match element {
            Value::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for item in items {
                    let compacted = self.compact_element(scope, property, item)?;
                    if !compacted.is_null() {
                        result.push(compacted);
                    }
                }
                let container = property
                    .and_then(|p| scope.ctx.term(p))
                    .map(|d| &d.container);
                let keep_array = result.len() != 1
                    || !self.compact_arrays()
                    || matches!(property, Some("@graph" | "@set"))
                    || container.is_some_and(|c| {
                        c.contains(Keyword::List) || c.contains(Keyword::Set)
                    });
                match result.pop() {
                    Some(only) if !keep_array => Ok(only),
                    Some(last) => {
                        result.push(last);
                        Ok(Value::Array(result))
                    }
                    None => Ok(Value::Array(result)),
                }
            }
            Value::Object(map) => self.compact_map(scope, property, map),
            scalar => Ok(scalar.clone()),
        }
    }

    fn compact_map(&self, scope: &Scope, property: Option<&str>, element: &Map) -> Result<Value> {
        let property_definition = property.and_then(|p| scope.ctx.term(p));
        let mut derived = None;
        if let Some(previous) = scope.ctx.previous_context() {
            let node_reference = element.len() == 1 && element.contains_key("@id");
            if !element.contains_key("@value") && !node_reference {
                derived = Some(previous.clone());
            }
        }
        if let Some((local, def)) =
            property_definition.and_then(|d| d.context.as_ref().map(|c| (c, d)))
        {
            let base = derived.as_ref().unwrap_or(&scope.ctx);
            let flags = ProcessingFlags {
                override_protected: true,
                ..ProcessingFlags::default()
            };
            derived = Some(base.process_with(
                local,
                def.base_url.as_deref(),
                &[],
                flags,
                self.env,
            )?);
        }
        let owned;
        let scope = match derived {
            Some(ctx) => {
                owned = Scope::new(ctx);
                &owned
            }
            None => scope,
        };
        let definition = property.and_then(|p| scope.ctx.term(p));
        let container = definition.map(|d| d.container.clone()).unwrap_or_default();

        if element.contains_key("@value") || element.contains_key("@id") {
            if let Some(compacted) = self.compact_value(scope, property, element)? {
                return Ok(compacted);
            }
        }
        if let Some(list) = element.get("@list") {
            if container.contains(Keyword::List) {
                return self.compact_element(scope, property, list);
            }
        }

        let inside_reverse = property == Some("@reverse");
        let mut result = Map::new();
        let type_scoped = scope;
        let mut type_derived: Option<ActiveContext> = None;
        if let Some(types) = element.get("@type") {
            let mut compacted_types = vec![];
            for t in as_array(types).iter().filter_map(Value::as_str) {
                compacted_types.push(self.compact_iri(type_scoped, t, None, true, false)?);
            }
            compacted_types.sort();
            for term in compacted_types {
                let Some(def) = type_scoped.ctx.term(&term) else {
                    continue;
                };
                if let Some(local) = &def.context {
                    let base = type_derived.as_ref().unwrap_or(&scope.ctx);
                    let flags = ProcessingFlags {
                        propagate: false,
                        ..ProcessingFlags::default()
                    };
                    type_derived = Some(base.process_with(
                        local,
                        def.base_url.as_deref(),
                        &[],
                        flags,
                        self.env,
                    )?);
                }
            }
        }
        let owned;
        let scope = match type_derived {
            Some(ctx) => {
                owned = Scope::new(ctx);
                &owned
            }
            None => scope,
        };

        for (expanded_property, expanded_value) in entries(element, self.env.options.ordered()) {
            match expanded_property.as_str() {
                "@id" => {
                    let compacted = match expanded_value {
                        Value::String(id) => self.compact_iri(scope, id, None, false, false)?.into(),
                        other => other.clone(),
                    };
                    let alias = self.compact_keyword(scope, "@id")?;
                    result.insert(alias, compacted);
                }
                "@type" => {
                    let mut compacted = vec![];
                    for t in as_array(expanded_value) {
                        compacted.push(match t.as_str() {
                            Some(t) => self.compact_iri(type_scoped, t, None, true, false)?.into(),
                            None => t.clone(),
                        });
                    }
                    let alias = self.compact_keyword(scope, "@type")?;
                    let as_array = (scope.ctx.processing_mode() != ProcessingMode::JsonLd1_0
                        && scope
                            .ctx
                            .term(&alias)
                            .is_some_and(|d| d.container.contains(Keyword::Set)))
                        || !self.compact_arrays();
                    // a value object always carries a single datatype
                    let value_object = element.contains_key("@value");
                    if compacted.len() == 1 && (value_object || !as_array) {
                        let single = compacted.remove(0);
                        add_value(&mut result, &alias, single, false);
                    } else {
                        add_value(&mut result, &alias, Value::Array(compacted), as_array);
                    }
                }
                "@reverse" => {
                    let compacted = self.compact_element(scope, Some("@reverse"), expanded_value)?;
                    if let Value::Object(mut compacted) = compacted {
                        let reverse_terms: Vec<String> = compacted
                            .keys()
                            .filter(|k| scope.ctx.term(k).is_some_and(|d| d.reverse))
                            .cloned()
                            .collect();
                        for term in reverse_terms {
                            if let Some(value) = compacted.remove(&term) {
                                let as_array = scope
                                    .ctx
                                    .term(&term)
                                    .is_some_and(|d| d.container.contains(Keyword::Set))
                                    || !self.compact_arrays();
                                add_value(&mut result, &term, value, as_array);
                            }
                        }
                        if !compacted.is_empty() {
                            let alias = self.compact_keyword(scope, "@reverse")?;
                            result.insert(alias, Value::Object(compacted));
                        }
                    }
                }
                "@preserve" => {
                    let compacted = self.compact_element(scope, property, expanded_value)?;
                    if compacted.as_array().map_or(true, |a| !a.is_empty()) {
                        result.insert("@preserve".into(), compacted);
                    }
                }
                "@index" if container.contains(Keyword::Index) => {}
                "@direction" | "@index" | "@language" | "@value" => {
                    let alias = self.compact_keyword(scope, expanded_property)?;
                    result.insert(alias, expanded_value.clone());
                }
                _ => self.compact_property(
                    scope,
                    &mut result,
                    expanded_property,
                    expanded_value,
                    inside_reverse,
                )?,
            }
        }
        Ok(Value::Object(result))
    }

    fn compact_property(
        &self,
        scope: &Scope,
        result: &mut Map,
        expanded_property: &str,
        expanded_value: &Value,
        inside_reverse: bool,
    ) -> Result<()> {
        let items = as_array(expanded_value);
        if items.is_empty() {
            let item_property = self.compact_iri(
                scope,
                expanded_property,
                Some(expanded_value),
                true,
                inside_reverse,
            )?;
            let target = self.nest_target(scope, result, &item_property)?;
            add_value(target, &item_property, Value::Array(vec![]), true);
        }
        for expanded_item in items {
            let item_property = self.compact_iri(
                scope,
                expanded_property,
                Some(expanded_item),
                true,
                inside_reverse,
            )?;
            let definition = scope.ctx.term(&item_property);
            let container = definition.map(|d| d.container.clone()).unwrap_or_default();
            let as_array = container.contains(Keyword::Set)
                || matches!(item_property.as_str(), "@graph" | "@list")
                || !self.compact_arrays();
            let inner = if is_list_object(expanded_item) {
                &expanded_item["@list"]
            } else if is_graph_object(expanded_item) {
                &expanded_item["@graph"]
            } else {
                expanded_item
            };
            let mut compacted_item = self.compact_element(scope, Some(&item_property), inner)?;

            if is_list_object(expanded_item) {
                let compacted_item = Value::Array(into_array(compacted_item));
                if container.contains(Keyword::List) {
                    let target = self.nest_target(scope, result, &item_property)?;
                    target.insert(item_property, compacted_item);
                } else {
                    let mut wrapper = Map::new();
                    wrapper.insert(self.compact_keyword(scope, "@list")?, compacted_item);
                    if let Some(index) = expanded_item.get("@index") {
                        wrapper.insert(self.compact_keyword(scope, "@index")?, index.clone());
                    }
                    let target = self.nest_target(scope, result, &item_property)?;
                    add_value(target, &item_property, Value::Object(wrapper), as_array);
                }
            } else if is_graph_object(expanded_item) {
                let graph_container = container.contains(Keyword::Graph);
                if graph_container && container.contains(Keyword::Id) {
                    let map_key = match id_of(expanded_item) {
                        Some(id) => self.compact_iri(scope, id, None, false, false)?,
                        None => self.compact_keyword(scope, "@none")?,
                    };
                    let target = self.nest_target(scope, result, &item_property)?;
                    let map_object = object_entry(target, &item_property);
                    add_value(map_object, &map_key, compacted_item, as_array);
                } else if graph_container
                    && container.contains(Keyword::Index)
                    && is_simple_graph_object(expanded_item)
                {
                    let map_key = match expanded_item.get("@index").and_then(Value::as_str) {
                        Some(index) => index.to_string(),
                        None => self.compact_keyword(scope, "@none")?,
                    };
                    let target = self.nest_target(scope, result, &item_property)?;
                    let map_object = object_entry(target, &item_property);
                    add_value(map_object, &map_key, compacted_item, as_array);
                } else if graph_container && is_simple_graph_object(expanded_item) {
                    if compacted_item.as_array().is_some_and(|a| a.len() > 1) {
                        compacted_item =
                            single(&self.compact_keyword(scope, "@included")?, compacted_item);
                    }
                    let target = self.nest_target(scope, result, &item_property)?;
                    add_value(target, &item_property, compacted_item, as_array);
                } else {
                    let mut wrapper = Map::new();
                    wrapper.insert(
                        self.compact_keyword(scope, "@graph")?,
                        Value::Array(into_array(compacted_item)),
                    );
                    if let Some(id) = id_of(expanded_item) {
                        wrapper.insert(
                            self.compact_keyword(scope, "@id")?,
                            self.compact_iri(scope, id, None, false, false)?.into(),
                        );
                    }
                    if let Some(index) = expanded_item.get("@index") {
                        wrapper.insert(self.compact_keyword(scope, "@index")?, index.clone());
                    }
                    let target = self.nest_target(scope, result, &item_property)?;
                    add_value(target, &item_property, Value::Object(wrapper), as_array);
                }
            } else if let Some(map_container) = [
                Keyword::Language,
                Keyword::Index,
                Keyword::Id,
                Keyword::Type,
            ]
            .into_iter()
            .find(|k| container.contains(*k) && !container.contains(Keyword::Graph))
            {
                let mut container_key = self.compact_keyword(scope, map_container.as_str())?;
                let index_key = definition.and_then(|d| d.index.as_deref()).unwrap_or("@index");
                let mut map_key = None;
                match map_container {
                    Keyword::Language => {
                        if let Some(value) = expanded_item.get("@value") {
                            if compacted_item.is_object() {
                                compacted_item = value.clone();
                            }
                            map_key = expanded_item
                                .get("@language")
                                .and_then(Value::as_str)
                                .map(str::to_string);
                        }
                    }
                    Keyword::Index if index_key == "@index" => {
                        map_key = expanded_item
                            .get("@index")
                            .and_then(Value::as_str)
                            .map(str::to_string);
                    }
                    Keyword::Index => {
                        let expanded_index = scope
                            .ctx
                            .expand_iri(index_key, false, true)
                            .unwrap_or_else(|| index_key.to_string());
                        container_key = self.compact_iri(scope, &expanded_index, None, true, false)?;
                        if let Value::Object(obj) = &mut compacted_item {
                            map_key = take_first_string(obj, &container_key);
                        }
                    }
                    Keyword::Id => {
                        if let Value::Object(obj) = &mut compacted_item {
                            map_key = match obj.remove(&container_key) {
                                Some(Value::String(id)) => Some(id),
                                _ => None,
                            };
                        }
                    }
                    _ => {
                        let mut only_id = false;
                        if let Value::Object(obj) = &mut compacted_item {
                            map_key = take_first_string(obj, &container_key);
                            only_id = obj.len() == 1
                                && obj.keys().all(|k| {
                                    scope.ctx.expand_iri(k, false, true).as_deref() == Some("@id")
                                });
                        }
                        if only_id {
                            let reference = single(
                                "@id",
                                expanded_item.get("@id").cloned().unwrap_or_default(),
                            );
                            compacted_item =
                                self.compact_element(scope, Some(&item_property), &reference)?;
                        }
                    }
                }
                let map_key = match map_key {
                    Some(key) => key,
                    None => self.compact_keyword(scope, "@none")?,
                };
                let target = self.nest_target(scope, result, &item_property)?;
                let map_object = object_entry(target, &item_property);
                add_value(map_object, &map_key, compacted_item, as_array);
            } else {
                let target = self.nest_target(scope, result, &item_property)?;
                add_value(target, &item_property, compacted_item, as_array);
            }
        }
        Ok(())
    }

    /// The map where the value of `item_property` is stored:
    /// `result` itself, or the nesting entry of `result` designated by the term definition.
    fn nest_target<'m>(
        &self,
        scope: &Scope,
        result: &'m mut Map,
        item_property: &str,
    ) -> Result<&'m mut Map> {
        match scope.ctx.term(item_property).and_then(|d| d.nest.as_deref()) {
            None => Ok(result),
            Some(nest_term) => {
                if scope.ctx.expand_iri(nest_term, false, true).as_deref() != Some("@nest") {
                    return Err(JsonLdError::InvalidNestValue(nest_term.to_string()));
                }
                Ok(object_entry(result, nest_term))
            }
        }
    }

    /// [Value compaction](https://www.w3.org/TR/json-ld11-api/#value-compaction)
    ///
    /// Returns `None` when `value` can not be made simpler than a value object or node object.
    fn compact_value(
        &self,
        scope: &Scope,
        property: Option<&str>,
        value: &Map,
    ) -> Result<Option<Value>> {
        let ctx = &scope.ctx;
        let definition = property.and_then(|p| ctx.term(p));
        let type_mapping = definition.and_then(|d| d.type_mapping.as_deref());
        let container = definition.map(|d| d.container.clone()).unwrap_or_default();
        let preserve_index = value.contains_key("@index") && !container.contains(Keyword::Index);

        if let Some(id) = value.get("@id").and_then(Value::as_str) {
            let only_id = value.len() == 1 || (value.len() == 2 && value.contains_key("@index") && !preserve_index);
            if !only_id {
                return Ok(None);
            }
            return match type_mapping {
                Some("@id") => Ok(Some(self.compact_iri(scope, id, None, false, false)?.into())),
                Some("@vocab") => Ok(Some(self.compact_iri(scope, id, None, true, false)?.into())),
                _ => Ok(None),
            };
        }
        let Some(inner) = value.get("@value") else {
            return Ok(None);
        };
        if preserve_index || type_mapping == Some("@none") {
            return Ok(None);
        }
        if let Some(value_type) = value.get("@type") {
            return Ok((value_type.as_str() == type_mapping).then(|| inner.clone()));
        }
        if !inner.is_string() {
            return Ok(Some(inner.clone()));
        }
        let language = match definition.and_then(|d| d.language.as_ref()) {
            Some(language) => language.as_deref(),
            None => ctx.default_language(),
        };
        let direction = match definition.and_then(|d| d.direction) {
            Some(direction) => direction,
            None => ctx.default_direction(),
        };
        let value_language = value.get("@language").and_then(Value::as_str);
        let value_direction = value.get("@direction").and_then(Value::as_str);
        let same_language = match (value_language, language) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        let same_direction = value_direction == direction.map(|d| d.as_str());
        Ok((same_language && same_direction && type_mapping.is_none()).then(|| inner.clone()))
    }

    fn compact_keyword(&self, scope: &Scope, keyword: &str) -> Result<String> {
        self.compact_iri(scope, keyword, None, true, false)
    }

    /// [IRI compaction](https://www.w3.org/TR/json-ld11-api/#iri-compaction)
    ///
    /// `value` is the expanded value that `var` is the property of, if any.
    pub fn compact_iri(
        &self,
        scope: &Scope,
        var: &str,
        value: Option<&Value>,
        vocab: bool,
        reverse: bool,
    ) -> Result<String> {
        let ctx = &scope.ctx;
        if vocab && scope.inverse.contains(var) {
            if let Some(term) = self.select_term(scope, var, value, reverse)? {
                return Ok(term);
            }
        }
        if vocab {
            if let Some(suffix) = ctx.vocab().and_then(|v| var.strip_prefix(v)) {
                if !suffix.is_empty() && ctx.term(suffix).is_none() {
                    return Ok(suffix.to_string());
                }
            }
        }
        let mut compact_iri: Option<String> = None;
        for (term, def) in ctx.terms() {
            let Some(iri) = def.iri() else {
                continue;
            };
            if iri == var || !def.prefix || !var.starts_with(iri) {
                continue;
            }
            let candidate = format!("{term}:{}", &var[iri.len()..]);
            let shorter = compact_iri.as_ref().map_or(true, |c| {
                (candidate.len(), candidate.as_str()) < (c.len(), c.as_str())
            });
            let usable = match ctx.term(&candidate) {
                None => true,
                Some(def) => def.iri() == Some(var) && value.is_none(),
            };
            if shorter && usable {
                compact_iri = Some(candidate);
            }
        }
        if let Some(compact_iri) = compact_iri {
            return Ok(compact_iri);
        }
        if let Some((scheme, rest)) = split_prefix(var) {
            if !rest.starts_with("//")
                && is_absolute_iri(var)
                && ctx.term(scheme).is_some_and(|d| d.prefix)
            {
                return Err(JsonLdError::IriConfusedWithPrefix(var.to_string()));
            }
        }
        if !vocab && self.env.options.compact_to_relative() {
            if let Some(base) = ctx.base_iri() {
                if let Some(relative) = Relativizer::new(base).relativize(var) {
                    if relative.starts_with('@') || split_prefix(&relative).is_some_and(|(p, _)| !p.contains('/')) {
                        return Ok(format!("./{relative}"));
                    }
                    return Ok(relative);
                }
            }
        }
        Ok(var.to_string())
    }

    /// Select the term best suited to compact `var` as the property of `value`.
    fn select_term(
        &self,
        scope: &Scope,
        var: &str,
        value: Option<&Value>,
        reverse: bool,
    ) -> Result<Option<String>> {
        let ctx = &scope.ctx;
        let json_ld_1_1 = ctx.processing_mode() != ProcessingMode::JsonLd1_0;
        let default_language = match ctx.default_direction() {
            Some(direction) => format!(
                "{}_{direction}",
                ctx.default_language().unwrap_or_default().to_lowercase()
            ),
            None => ctx
                .default_language()
                .map(str::to_lowercase)
                .unwrap_or_else(|| "@none".into()),
        };
        let map = value.and_then(Value::as_object);
        let has = |key: &str| map.is_some_and(|m| m.contains_key(key));
        let mut containers: Vec<&str> = vec![];
        let mut selector = Selector::Language;
        let mut type_language_value: Option<String> = None;

        if has("@index") && !value.is_some_and(is_graph_object) {
            containers.extend(["@index", "@index@set"]);
        }
        if reverse {
            selector = Selector::Type;
            type_language_value = Some("@reverse".into());
            containers.push("@set");
        } else if let Some(list) = map.and_then(|m| m.get("@list")) {
            if !has("@index") {
                containers.push("@list");
            }
            let list = as_array(list);
            let mut common_language = list.is_empty().then(|| default_language.clone());
            let mut common_type: Option<String> = None;
            for item in list {
                let mut item_language = "@none".to_string();
                let mut item_type = "@none".to_string();
                if is_value_object(item) {
                    if let Some(direction) = item.get("@direction").and_then(Value::as_str) {
                        let language = item.get("@language").and_then(Value::as_str).unwrap_or_default();
                        item_language = format!("{}_{direction}", language.to_lowercase());
                    } else if let Some(language) = item.get("@language").and_then(Value::as_str) {
                        item_language = language.to_lowercase();
                    } else if let Some(t) = item.get("@type").and_then(Value::as_str) {
                        item_type = t.to_string();
                    } else {
                        item_language = "@null".into();
                    }
                } else {
                    item_type = "@id".into();
                }
                match &common_language {
                    None => common_language = Some(item_language),
                    Some(c) if *c != item_language && is_value_object(item) => {
                        common_language = Some("@none".into())
                    }
                    _ => {}
                }
                match &common_type {
                    None => common_type = Some(item_type),
                    Some(c) if *c != item_type => common_type = Some("@none".into()),
                    _ => {}
                }
                if common_language.as_deref() == Some("@none")
                    && common_type.as_deref() == Some("@none")
                {
                    break;
                }
            }
            let common_language = common_language.unwrap_or_else(|| "@none".into());
            let common_type = common_type.unwrap_or_else(|| "@none".into());
            if common_type != "@none" {
                selector = Selector::Type;
                type_language_value = Some(common_type);
            } else {
                type_language_value = Some(common_language);
            }
        } else if value.is_some_and(is_graph_object) {
            if has("@index") {
                containers.extend(["@graph@index", "@graph@index@set"]);
            }
            if has("@id") {
                containers.extend(["@graph@id", "@graph@id@set"]);
            }
            containers.extend(["@graph", "@graph@set", "@set"]);
            if !has("@index") {
                containers.extend(["@graph@index", "@graph@index@set"]);
            }
            if !has("@id") {
                containers.extend(["@graph@id", "@graph@id@set"]);
            }
            containers.extend(["@index", "@index@set"]);
            selector = Selector::Type;
            type_language_value = Some("@id".into());
        } else {
            if value.is_some_and(is_value_object) {
                let language = map.and_then(|m| m.get("@language")).and_then(Value::as_str);
                let direction = map.and_then(|m| m.get("@direction")).and_then(Value::as_str);
                if let (Some(direction), false) = (direction, has("@index")) {
                    type_language_value = Some(format!(
                        "{}_{direction}",
                        language.unwrap_or_default().to_lowercase()
                    ));
                    containers.extend(["@language", "@language@set"]);
                } else if let (Some(language), false) = (language, has("@index")) {
                    type_language_value = Some(language.to_lowercase());
                    containers.extend(["@language", "@language@set"]);
                } else if let Some(t) = map.and_then(|m| m.get("@type")).and_then(Value::as_str) {
                    type_language_value = Some(t.to_string());
                    selector = Selector::Type;
                }
            } else {
                selector = Selector::Type;
                type_language_value = Some("@id".into());
                containers.extend(["@id", "@id@set", "@type", "@set@type"]);
            }
            containers.push("@set");
        }
        containers.push("@none");
        if json_ld_1_1 && !has("@index") {
            containers.extend(["@index", "@index@set"]);
        }
        if json_ld_1_1 && map.is_some_and(|m| m.len() == 1 && m.contains_key("@value")) {
            containers.extend(["@language", "@language@set"]);
        }
        let type_language_value = type_language_value.unwrap_or_else(|| "@null".into());

        let mut preferred_values = vec![];
        if type_language_value == "@reverse" {
            preferred_values.push("@reverse".to_string());
        }
        let id = map.and_then(|m| m.get("@id")).and_then(Value::as_str);
        match id {
            Some(id) if type_language_value == "@id" || type_language_value == "@reverse" => {
                let compacted = self.compact_iri(scope, id, None, true, false)?;
                if ctx.term(&compacted).and_then(|d| d.iri()) == Some(id) {
                    preferred_values.extend(["@vocab".into(), "@id".into(), "@none".into()]);
                } else {
                    preferred_values.extend(["@id".into(), "@vocab".into(), "@none".into()]);
                }
            }
            _ => {
                let empty_list = map
                    .and_then(|m| m.get("@list"))
                    .is_some_and(|l| as_array(l).is_empty());
                preferred_values.push(type_language_value);
                preferred_values.push("@none".into());
                if empty_list {
                    selector = Selector::Any;
                }
            }
        }
        preferred_values.push("@any".into());
        let directions: Vec<String> = preferred_values
            .iter()
            .filter_map(|v| v.find('_').map(|i| v[i..].to_string()))
            .collect();
        preferred_values.extend(directions);

        Ok(scope
            .inverse
            .select_term(var, &containers, selector, &preferred_values)
            .map(str::to_string))
    }
}

/// Remove the entry `key` of `obj`, and return its first value if it is a string.
///
/// Other values are put back.
fn take_first_string(obj: &mut Map, key: &str) -> Option<String> {
    let mut values = obj.remove(key).map(into_array).unwrap_or_default();
    let first = match values.first() {
        Some(Value::String(_)) => match values.remove(0) {
            Value::String(first) => Some(first),
            _ => None,
        },
        _ => None,
    };
    if !values.is_empty() {
        add_value(obj, key, Value::Array(values), false);
    }
    first
}

/// Compact an expanded document against `ctx`,
/// wrapping multiple top-level nodes in `@graph`.
pub(crate) fn compact_document(
    expanded: &[Value],
    ctx: ActiveContext,
    env: &Env,
) -> Result<Map> {
    let scope = Scope::new(ctx);
    let compactor = Compactor::new(env);
    let compacted =
        compactor.compact_element(&scope, None, &Value::Array(expanded.to_vec()))?;
    Ok(match compacted {
        Value::Array(items) if items.is_empty() => Map::new(),
        Value::Array(items) => {
            let mut map = Map::new();
            map.insert(compactor.compact_keyword(&scope, "@graph")?, Value::Array(items));
            map
        }
        Value::Object(map) => map,
        // top-level scalars are dropped by expansion
        other => {
            let mut map = Map::new();
            map.insert(compactor.compact_keyword(&scope, "@graph")?, other);
            map
        }
    })
}

/// Compact the IRI `var` against `ctx`, as a vocabulary-relative IRI if `vocab` is set.
pub(crate) fn compact_iri_in(ctx: &ActiveContext, var: &str, vocab: bool, env: &Env) -> Result<String> {
    let scope = Scope::new(ctx.clone());
    Compactor::new(env).compact_iri(&scope, var, None, vocab, false)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expand::expand_document;
    use crate::options::JsonLdOptions;
    use ldtk_iri::resolve::BaseIri;
    use serde_json::json;

    fn options() -> JsonLdOptions {
        JsonLdOptions::new().with_base(BaseIri::new("http://example.org/doc").unwrap())
    }

    fn compact_with(doc: Value, context: Value, options: &JsonLdOptions) -> Result<Value> {
        let env = Env::new(options);
        let initial = ActiveContext::from_options(options);
        let expanded = expand_document(&doc, &initial, Some("http://example.org/doc"), false, &env)?;
        let ctx = initial.process_with(
            &context,
            Some("http://example.org/doc"),
            &[],
            ProcessingFlags::default(),
            &env,
        )?;
        compact_document(&expanded, ctx, &env).map(Value::Object)
    }

    fn compact(doc: Value, context: Value) -> Result<Value> {
        compact_with(doc, context, &options())
    }

    #[test]
    fn terms_and_compact_iris() {
        let got = compact(
            json!({
                "@id": "http://example.org/alice",
                "@type": "http://xmlns.com/foaf/0.1/Person",
                "http://xmlns.com/foaf/0.1/name": "Alice",
                "http://xmlns.com/foaf/0.1/nick": "Al",
            }),
            json!({"foaf": "http://xmlns.com/foaf/0.1/", "name": "foaf:name"}),
        )
        .unwrap();
        assert_eq!(
            got,
            json!({
                "@id": "alice",
                "@type": "foaf:Person",
                "name": "Alice",
                "foaf:nick": "Al",
            })
        );
    }

    #[test]
    fn type_coercion_selects_term() {
        let context = json!({
            "@vocab": "http://schema.org/",
            "knows": {"@type": "@id"},
            "date": {"@id": "http://schema.org/date", "@type": "http://www.w3.org/2001/XMLSchema#date"},
        });
        let got = compact(
            json!({
                "http://schema.org/knows": {"@id": "http://example.org/bob"},
                "http://schema.org/date": {"@value": "2020-01-01", "@type": "http://www.w3.org/2001/XMLSchema#date"},
                "http://schema.org/other": {"@value": "x", "@type": "http://example.org/T"},
            }),
            context,
        )
        .unwrap();
        assert_eq!(
            got,
            json!({
                "knows": "bob",
                "date": "2020-01-01",
                "other": {"@value": "x", "@type": "http://example.org/T"},
            })
        );
    }

    #[test]
    fn single_type_is_a_string() {
        let context = json!({"@vocab": "http://ex.org/"});
        let doc = json!({
            "@id": "http://ex.org/a",
            "@type": "http://ex.org/T",
            "http://ex.org/p": {"@value": "x", "@type": "http://other.org/D"},
            "http://ex.org/q": {"@id": "http://ex.org/b", "@type": ["http://ex.org/T", "http://ex.org/U"]},
        });
        let got = compact(doc.clone(), context.clone()).unwrap();
        assert_eq!(got["@type"], json!("T"));
        assert_eq!(got["p"], json!({"@value": "x", "@type": "http://other.org/D"}));
        assert_eq!(got["q"]["@type"], json!(["T", "U"]));

        let opt = options().with_compact_arrays(false);
        let got = compact_with(doc.clone(), context.clone(), &opt).unwrap();
        assert_eq!(got["@type"], json!(["T"]));
        assert_eq!(got["p"], json!([{"@value": "x", "@type": "http://other.org/D"}]));

        // compacted output expands back to the original
        let mut compacted = compact(doc.clone(), context.clone()).unwrap();
        compacted["@context"] = context;
        let env_opt = options();
        let env = Env::new(&env_opt);
        let initial = ActiveContext::from_options(&env_opt);
        let again = expand_document(&compacted, &initial, Some("http://example.org/doc"), false, &env).unwrap();
        let expected = expand_document(&doc, &initial, Some("http://example.org/doc"), false, &env).unwrap();
        assert_eq!(again, expected);
    }

    #[test]
    fn relative_iris() {
        let doc = json!({"@id": "http://example.org/alice", "http://example.org/p": {"@id": "http://example.org/x/y"}});
        let got = compact(doc.clone(), json!({})).unwrap();
        assert_eq!(got["@id"], json!("alice"));
        assert_eq!(got["http://example.org/p"], json!({"@id": "x/y"}));
        let got = compact_with(doc, json!({}), &options().with_compact_to_relative(false)).unwrap();
        assert_eq!(got["@id"], json!("http://example.org/alice"));
    }

    #[test]
    fn containers() {
        let context = json!({
            "@vocab": "http://example.org/",
            "label": {"@container": "@language"},
            "list": {"@container": "@list"},
            "tags": {"@container": "@set"},
            "byId": {"@container": "@id"},
            "byIndex": {"@container": "@index"},
        });
        let doc = json!({
            "@context": context,
            "label": {"en": "Hello", "fr": "Bonjour"},
            "list": [1, 2],
            "tags": "a",
            "byId": {"a": {"p": 1}},
            "byIndex": {"i": {"@value": "v"}},
        });
        let got = compact(doc, context).unwrap();
        assert_eq!(
            got,
            json!({
                "label": {"en": "Hello", "fr": "Bonjour"},
                "list": [1, 2],
                "tags": ["a"],
                "byId": {"a": {"p": 1}},
                "byIndex": {"i": "v"},
            })
        );
    }

    #[test]
    fn list_without_container() {
        let got = compact(
            json!({"http://example.org/p": {"@list": ["a", "b"]}}),
            json!({"p": "http://example.org/p"}),
        )
        .unwrap();
        assert_eq!(got, json!({"p": {"@list": ["a", "b"]}}));
    }

    #[test]
    fn reverse_property() {
        let got = compact(
            json!({
                "@id": "http://example.org/p",
                "@reverse": {"http://example.org/childOf": {"@id": "http://example.org/c"}},
            }),
            json!({"@vocab": "http://example.org/", "parentOf": {"@reverse": "childOf", "@type": "@id"}}),
        )
        .unwrap();
        assert_eq!(got, json!({"@id": "p", "parentOf": "c"}));
    }

    #[test]
    fn nested_properties() {
        let got = compact(
            json!({"http://example.org/label": "x"}),
            json!({"meta": "@nest", "label": {"@id": "http://example.org/label", "@nest": "meta"}}),
        )
        .unwrap();
        assert_eq!(got, json!({"meta": {"label": "x"}}));
    }

    #[test]
    fn invalid_nest_value() {
        let err = compact(
            json!({"http://example.org/label": "x"}),
            json!({
                "label": {"@id": "http://example.org/label", "@nest": "meta"},
                "meta": "http://example.org/meta",
            }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid @nest value");
    }

    #[test]
    fn multiple_nodes_use_graph() {
        let got = compact(
            json!([
                {"@id": "http://example.org/a", "http://example.org/q": "x"},
                {"@id": "http://example.org/b", "http://example.org/p": 1},
            ]),
            json!({"@vocab": "http://example.org/"}),
        )
        .unwrap();
        assert_eq!(
            got,
            json!({"@graph": [{"@id": "a", "q": "x"}, {"@id": "b", "p": 1}]})
        );
    }

    #[test]
    fn language_and_direction() {
        let context = json!({
            "@vocab": "http://example.org/",
            "@language": "en",
            "de": {"@id": "http://example.org/label", "@language": "de"},
        });
        let got = compact(
            json!({"http://example.org/label": [
                {"@value": "hello", "@language": "en"},
                {"@value": "hallo", "@language": "de"},
                {"@value": "plain"},
            ]}),
            context,
        )
        .unwrap();
        assert_eq!(
            got,
            json!({
                "label": ["hello", {"@value": "plain"}],
                "de": "hallo",
            })
        );
    }

    #[test]
    fn iri_confused_with_prefix() {
        let err = compact(
            json!({"@id": "ex:foo", "http://example.org/p": 1}),
            json!({"ex": {"@id": "http://example.org/", "@prefix": true}}),
        )
        .unwrap_err();
        assert_eq!(err.code(), "IRI confused with prefix");
    }

    #[test]
    fn inverse_context_prefers_shortest_term() {
        let options = options();
        let env = Env::new(&options);
        let ctx = ActiveContext::from_options(&options)
            .process_with(
                &json!({"longer": "http://example.org/p", "p": "http://example.org/p"}),
                None,
                &[],
                ProcessingFlags::default(),
                &env,
            )
            .unwrap();
        assert_eq!(
            compact_iri_in(&ctx, "http://example.org/p", true, &env).unwrap(),
            "p"
        );
    }
}
