//! The [framing algorithm](https://www.w3.org/TR/json-ld11-framing/#framing-algorithm).
//!
//! Framing works on the node map of the input:
//! nodes matching the frame are selected,
//! and their values are embedded according to the nested frames.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::{JsonLdError, Result};
use crate::keyword::is_keyword;
use crate::node_map::{id_map, Graph, NodeMap};
use crate::options::{Embed, JsonLdOptions};
use crate::util::*;

/// The framing flags in effect for a given frame.
#[derive(Clone, Copy, Debug)]
struct FrameFlags {
    embed: Embed,
    explicit: bool,
    require_all: bool,
}

/// The default values of the framing flags, taken from the options.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameDefaults {
    embed: Embed,
    explicit: bool,
    omit_default: bool,
    require_all: bool,
    prune_blank_node_identifiers: bool,
}

impl FrameDefaults {
    pub fn from_options<L: ?Sized>(options: &JsonLdOptions<L>) -> Self {
        FrameDefaults {
            embed: options.embed(),
            explicit: options.explicit(),
            omit_default: options.omit_default(),
            require_all: options.require_all(),
            prune_blank_node_identifiers: options.prune_blank_node_identifiers(),
        }
    }
}

/// Where framed nodes are added.
enum Parent<'p> {
    Array(&'p mut Vec<Value>),
    Map(&'p mut Map),
}

impl Parent<'_> {
    fn add(&mut self, property: Option<&str>, value: Value) {
        match self {
            Parent::Array(items) => items.push(value),
            Parent::Map(map) => add_value(map, property.unwrap_or("@graph"), value, true),
        }
    }
}

/// Frame the nodes of `node_map` with the expanded `frame`.
///
/// If `merged` is set, the nodes of all graphs are merged before being matched;
/// otherwise, only the default graph is matched.
/// The result is still in expanded form.
pub(crate) fn frame_node_map(
    node_map: &NodeMap,
    frame: &[Value],
    merged: bool,
    defaults: FrameDefaults,
) -> Result<Vec<Value>> {
    let merged_graph = merged.then(|| node_map.merge());
    let (graph_name, subjects) = match &merged_graph {
        Some(graph) => ("@merged", graph),
        None => ("@default", node_map.default_graph()),
    };
    let mut framer = Framer {
        node_map,
        merged: merged_graph.as_ref(),
        subjects,
        defaults,
        subject_stack: vec![],
        unique_embeds: HashMap::new(),
        bnode_counts: HashMap::new(),
    };
    let ids: Vec<String> = subjects.keys().cloned().collect();
    let mut framed = vec![];
    framer.frame(graph_name, false, &ids, frame, Parent::Array(&mut framed), None)?;

    let to_clear: HashSet<String> = if defaults.prune_blank_node_identifiers {
        framer
            .bnode_counts
            .into_iter()
            .filter(|(_, count)| *count == 1)
            .map(|(id, _)| id)
            .collect()
    } else {
        HashSet::new()
    };
    Ok(framed
        .into_iter()
        .map(|node| cleanup_preserve(node, &to_clear))
        .collect())
}

struct Framer<'n> {
    node_map: &'n NodeMap,
    merged: Option<&'n Graph>,
    /// The graph whose nodes are matched by the top-level frame.
    subjects: &'n Graph,
    defaults: FrameDefaults,
    /// (graph, id) of the nodes currently being embedded.
    subject_stack: Vec<(String, String)>,
    /// Identifiers already embedded, per graph.
    unique_embeds: HashMap<String, HashSet<String>>,
    /// Number of occurrences of each blank node identifier in the output.
    bnode_counts: HashMap<String, usize>,
}

impl<'n> Framer<'n> {
    fn graph(&self, name: &str) -> Option<&'n Graph> {
        match name {
            "@merged" => self.merged,
            _ => self.node_map.graph(name),
        }
    }

    fn count_bnode(&mut self, id: &str) {
        if is_blank_node_id(id) {
            *self.bnode_counts.entry(id.to_string()).or_default() += 1;
        }
    }

    fn creates_cycle(&self, graph: &str, id: &str) -> bool {
        self.subject_stack
            .iter()
            .rev()
            .any(|(g, i)| g == graph && i == id)
    }

    fn frame(
        &mut self,
        graph: &str,
        embedded: bool,
        ids: &[String],
        frame: &[Value],
        mut parent: Parent<'_>,
        property: Option<&str>,
    ) -> Result<()> {
        let frame = validate_frame(frame)?;
        let flags = FrameFlags {
            embed: embed_flag(frame, self.defaults.embed)?,
            explicit: bool_flag(frame, "@explicit", self.defaults.explicit),
            require_all: bool_flag(frame, "@requireAll", self.defaults.require_all),
        };
        let Some(nodes) = self.graph(graph) else {
            return Ok(());
        };
        let mut matches = vec![];
        for id in ids {
            if let Some(subject) = nodes.get(id) {
                if self.filter_subject(subject, frame, flags.require_all)? {
                    matches.push((id.as_str(), subject));
                }
            }
        }
        matches.sort_by(|a, b| a.0.cmp(b.0));

        for (id, subject) in matches {
            if property.is_none() {
                self.unique_embeds = HashMap::new();
            }
            let already_embedded = self
                .unique_embeds
                .entry(graph.to_string())
                .or_default()
                .contains(id);
            let mut output = id_map(id);
            self.count_bnode(id);

            if !embedded && already_embedded {
                continue;
            }
            let as_reference = embedded
                && (flags.embed == Embed::Never
                    || self.creates_cycle(graph, id)
                    || (flags.embed == Embed::Once && already_embedded));
            if as_reference {
                parent.add(property, Value::Object(output));
                continue;
            }
            self.unique_embeds
                .entry(graph.to_string())
                .or_default()
                .insert(id.to_string());
            self.subject_stack.push((graph.to_string(), id.to_string()));

            if let Some(named) = self.node_map.graph(id) {
                let (recurse, subframe) = match frame.get("@graph") {
                    None => (graph != "@merged", Value::Object(Map::new())),
                    Some(subframe) => (
                        id != "@merged" && id != "@default",
                        as_array(subframe)
                            .first()
                            .filter(|f| f.is_object())
                            .cloned()
                            .unwrap_or_else(|| Value::Object(Map::new())),
                    ),
                };
                if recurse {
                    let named_ids: Vec<String> = named.keys().cloned().collect();
                    self.frame(
                        id,
                        false,
                        &named_ids,
                        std::slice::from_ref(&subframe),
                        Parent::Map(&mut output),
                        Some("@graph"),
                    )?;
                }
            }

            if let Some(included) = frame.get("@included") {
                self.frame(
                    graph,
                    false,
                    ids,
                    as_array(included),
                    Parent::Map(&mut output),
                    Some("@included"),
                )?;
            }

            for (prop, values) in entries(subject, true) {
                if is_keyword(prop) {
                    output.insert(prop.clone(), values.clone());
                    if prop == "@type" {
                        for t in as_array(values).iter().filter_map(Value::as_str) {
                            self.count_bnode(t);
                        }
                    }
                    continue;
                }
                if flags.explicit && !frame.contains_key(prop) {
                    continue;
                }
                let implicit = [implicit_frame(flags)];
                let subframe = match frame.get(prop) {
                    Some(subframe) => as_array(subframe),
                    None => &implicit[..],
                };
                for o in as_array(values) {
                    if let Some(items) = o.get("@list") {
                        let list_frame = frame
                            .get(prop)
                            .and_then(|f| as_array(f).first())
                            .and_then(|f| f.get("@list"))
                            .map(|l| as_array(l).to_vec())
                            .unwrap_or_else(|| implicit.to_vec());
                        let mut list = Map::new();
                        list.insert("@list".into(), Value::Array(vec![]));
                        for item in as_array(items) {
                            match item.get("@id").and_then(Value::as_str) {
                                Some(item_id) if is_node_reference(item) => self.frame(
                                    graph,
                                    true,
                                    &[item_id.to_string()],
                                    &list_frame,
                                    Parent::Map(&mut list),
                                    Some("@list"),
                                )?,
                                _ => add_value(&mut list, "@list", item.clone(), true),
                            }
                        }
                        add_value(&mut output, prop, Value::Object(list), true);
                    } else if let (Some(o_id), true) = (id_of(o), is_node_reference(o)) {
                        self.frame(
                            graph,
                            true,
                            &[o_id.to_string()],
                            subframe,
                            Parent::Map(&mut output),
                            Some(prop),
                        )?;
                    } else if value_match(subframe.first(), o) {
                        add_value(&mut output, prop, o.clone(), true);
                    }
                }
            }

            for (prop, next) in entries(frame, true) {
                let next = as_array(next).first().and_then(Value::as_object);
                if prop == "@type" {
                    if !next.is_some_and(|n| n.contains_key("@default")) {
                        continue;
                    }
                } else if is_keyword(prop) {
                    continue;
                }
                let omit_default = next.map_or(self.defaults.omit_default, |n| {
                    bool_flag(n, "@omitDefault", self.defaults.omit_default)
                });
                if !omit_default && !output.contains_key(prop) {
                    let preserve = match next.and_then(|n| n.get("@default")) {
                        Some(default) => into_array(default.clone()),
                        None => vec![Value::String("@null".into())],
                    };
                    let preserved = single("@preserve", Value::Array(preserve));
                    output.insert(prop.clone(), Value::Array(vec![preserved]));
                }
            }

            if let Some(Value::Object(reverse)) = frame.get("@reverse") {
                let subjects = self.subjects;
                for (reverse_prop, subframe) in entries(reverse, true) {
                    for (subject_id, node) in subjects {
                        let refers = node
                            .get(reverse_prop)
                            .is_some_and(|v| as_array(v).iter().any(|v| id_of(v) == Some(id)));
                        if !refers {
                            continue;
                        }
                        let reverse_output = object_entry(&mut output, "@reverse");
                        add_value(reverse_output, reverse_prop, Value::Array(vec![]), true);
                        if let Some(Value::Array(target)) = reverse_output.get_mut(reverse_prop) {
                            self.frame(
                                graph,
                                true,
                                std::slice::from_ref(subject_id),
                                as_array(subframe),
                                Parent::Array(target),
                                property,
                            )?;
                        }
                    }
                }
            }

            parent.add(property, Value::Object(output));
            self.subject_stack.pop();
        }
        Ok(())
    }

    fn filter_subject(&self, subject: &Map, frame: &Map, require_all: bool) -> Result<bool> {
        let mut wildcard = true;
        let mut matches_some = false;
        for (key, frame_value) in frame {
            let frame_values = as_array(frame_value);
            let node_values = subject.get(key).map(as_array).unwrap_or_default();
            let match_this = match key.as_str() {
                "@id" => {
                    let match_this = frame_values.first().map_or(true, is_empty_object)
                        || frame_values.iter().any(|f| Some(f) == subject.get("@id"));
                    if !require_all {
                        return Ok(match_this);
                    }
                    match_this
                }
                "@type" => {
                    wildcard = false;
                    if frame_values.is_empty() {
                        if !node_values.is_empty() {
                            return Ok(false);
                        }
                        true
                    } else if frame_values.len() == 1 && is_empty_object(&frame_values[0]) {
                        !node_values.is_empty()
                    } else {
                        let match_this = frame_values.iter().any(|t| {
                            t.get("@default").is_some() || node_values.contains(t)
                        });
                        if !require_all {
                            return Ok(match_this);
                        }
                        match_this
                    }
                }
                _ if is_keyword(key) => continue,
                _ => {
                    let this_frame = frame_values.first();
                    let mut has_default = false;
                    if let Some(f) = this_frame {
                        validate_frame(std::slice::from_ref(f))?;
                        has_default = f.get("@default").is_some();
                    }
                    wildcard = false;
                    if node_values.is_empty() && has_default {
                        continue;
                    }
                    if !node_values.is_empty() && frame_values.is_empty() {
                        return Ok(false);
                    }
                    match this_frame {
                        None => {
                            if !node_values.is_empty() {
                                return Ok(false);
                            }
                            true
                        }
                        Some(f) if is_list_object(f) => {
                            let pattern = as_array(&f["@list"]).first();
                            let list = node_values
                                .first()
                                .filter(|v| is_list_object(v))
                                .map(|v| as_array(&v["@list"]))
                                .unwrap_or_default();
                            match pattern {
                                Some(p) if is_value_object(p) => {
                                    list.iter().any(|v| value_match(Some(p), v))
                                }
                                Some(p) if is_node_object(p) => {
                                    let mut found = false;
                                    for v in list {
                                        if self.node_match(p, v, require_all)? {
                                            found = true;
                                            break;
                                        }
                                    }
                                    found
                                }
                                _ => false,
                            }
                        }
                        Some(f) if is_value_object(f) => {
                            node_values.iter().any(|v| value_match(Some(f), v))
                        }
                        Some(f) if is_node_reference(f) => {
                            let mut found = false;
                            for v in node_values {
                                if self.node_match(f, v, require_all)? {
                                    found = true;
                                    break;
                                }
                            }
                            found
                        }
                        Some(f) if f.is_object() => !node_values.is_empty(),
                        Some(_) => false,
                    }
                }
            };
            if !match_this && require_all {
                return Ok(false);
            }
            matches_some = matches_some || match_this;
        }
        Ok(wildcard || matches_some)
    }

    fn node_match(&self, pattern: &Value, value: &Value, require_all: bool) -> Result<bool> {
        let (Some(id), Some(pattern)) = (id_of(value), pattern.as_object()) else {
            return Ok(false);
        };
        match self.subjects.get(id) {
            Some(node) => self.filter_subject(node, pattern, require_all),
            None => Ok(false),
        }
    }
}

/// A frame must be an array containing a single object,
/// whose `@id` and `@type` entries (if any) are absolute IRIs or wildcards.
fn validate_frame(frame: &[Value]) -> Result<&Map> {
    let [Value::Object(frame)] = frame else {
        return Err(JsonLdError::InvalidFrame(format!(
            "a frame must be a single object, got {}",
            Value::Array(frame.to_vec())
        )));
    };
    for id in frame.get("@id").map(as_array).unwrap_or_default() {
        let valid = match id {
            Value::Object(_) => true,
            Value::String(id) => !is_blank_node_id(id) && ldtk_iri::is_absolute_iri(id),
            _ => false,
        };
        if !valid {
            return Err(JsonLdError::InvalidFrame(format!("invalid @id in frame: {id}")));
        }
    }
    for t in frame.get("@type").map(as_array).unwrap_or_default() {
        let valid = match t {
            Value::Object(_) => true,
            Value::String(t) => {
                t == "@json" || (!is_blank_node_id(t) && ldtk_iri::is_absolute_iri(t))
            }
            _ => false,
        };
        if !valid {
            return Err(JsonLdError::InvalidFrame(format!("invalid @type in frame: {t}")));
        }
    }
    Ok(frame)
}

fn frame_flag<'f>(frame: &'f Map, name: &str) -> Option<&'f Value> {
    frame.get(name).and_then(|v| as_array(v).first())
}

fn bool_flag(frame: &Map, name: &str, default: bool) -> bool {
    match frame_flag(frame, name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => default,
    }
}

fn embed_flag(frame: &Map, default: Embed) -> Result<Embed> {
    match frame_flag(frame, "@embed") {
        None => Ok(default),
        Some(Value::Bool(true)) => Ok(Embed::Once),
        Some(Value::Bool(false)) => Ok(Embed::Never),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| JsonLdError::InvalidEmbedValue(s.clone())),
        Some(other) => Err(JsonLdError::InvalidEmbedValue(other.to_string())),
    }
}

/// The frame used for properties not mentioned in the current frame.
fn implicit_frame(flags: FrameFlags) -> Value {
    let mut frame = Map::new();
    let embed = match flags.embed {
        Embed::Always => "@always",
        Embed::Once => "@once",
        Embed::Never => "@never",
    };
    frame.insert("@embed".into(), Value::Array(vec![embed.into()]));
    frame.insert("@explicit".into(), Value::Array(vec![flags.explicit.into()]));
    frame.insert("@requireAll".into(), Value::Array(vec![flags.require_all.into()]));
    Value::Object(frame)
}

/// Whether the value object `value` matches the value pattern `pattern`.
fn value_match(pattern: Option<&Value>, value: &Value) -> bool {
    let entry = |v: Option<&Value>, key: &str| -> Vec<Value> {
        v.and_then(|v| v.get(key))
            .map(|v| as_array(v).to_vec())
            .unwrap_or_default()
    };
    let (v2, t2, l2) = (
        entry(pattern, "@value"),
        entry(pattern, "@type"),
        entry(pattern, "@language"),
    );
    if v2.is_empty() && t2.is_empty() && l2.is_empty() {
        return true;
    }
    let wildcard = |values: &[Value]| values.first().is_some_and(is_empty_object);
    let matches = |expected: &[Value], actual: Option<&Value>| match actual {
        None => expected.is_empty(),
        Some(actual) => expected.contains(actual) || wildcard(expected),
    };
    let v1 = value.get("@value");
    v1.is_some_and(|v| v2.contains(v) || wildcard(&v2))
        && matches(&t2, value.get("@type"))
        && matches(&l2, value.get("@language"))
}

/// Replace `@preserve` wrappers by the value they hold,
/// and remove the identifiers listed in `to_clear`.
fn cleanup_preserve(value: Value, to_clear: &HashSet<String>) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| cleanup_preserve(item, to_clear))
                .collect(),
        ),
        Value::Object(mut map) => {
            if let Some(preserve) = map.remove("@preserve") {
                return into_array(preserve).into_iter().next().unwrap_or_default();
            }
            if map.contains_key("@value") {
                return Value::Object(map);
            }
            if map
                .get("@id")
                .and_then(Value::as_str)
                .is_some_and(|id| to_clear.contains(id))
            {
                map.remove("@id");
            }
            for value in map.values_mut() {
                *value = cleanup_preserve(value.take(), to_clear);
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Replace the `@null` placeholders left by framing defaults with `null`,
/// dropping them from arrays.
pub(crate) fn cleanup_null(value: Value) -> Value {
    match value {
        Value::String(s) if s == "@null" => Value::Null,
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(cleanup_null)
                .filter(|v| !v.is_null())
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, cleanup_null(v)))
                .collect(),
        ),
        other => other,
    }
}
