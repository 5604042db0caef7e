//! Helper functions over JSON values, shared by the JSON-LD algorithms.

use serde_json::Value;

/// A JSON object.
pub type Map = serde_json::Map<String, Value>;

/// View any value as a slice: arrays are viewed as their items, other values as a singleton.
pub(crate) fn as_array(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Convert any value into a vector: arrays are unwrapped, other values are wrapped.
pub(crate) fn into_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

pub(crate) fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

pub(crate) fn is_blank_node_id(id: &str) -> bool {
    id.starts_with("_:")
}

/// Whether `txt` is an absolute IRI or a blank node identifier.
pub(crate) fn is_node_id(txt: &str) -> bool {
    is_blank_node_id(txt) || ldtk_iri::is_absolute_iri(txt)
}

pub(crate) fn is_value_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key("@value"))
}

pub(crate) fn is_list_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key("@list"))
}

/// A graph object has `@graph`, and optionally `@id` and `@index`, and nothing else.
pub(crate) fn is_graph_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.contains_key("@graph")
                && map
                    .keys()
                    .all(|k| matches!(k.as_str(), "@graph" | "@id" | "@index"))
        }
        _ => false,
    }
}

/// A simple graph object is a graph object without `@id`.
pub(crate) fn is_simple_graph_object(value: &Value) -> bool {
    is_graph_object(value) && !value.as_object().is_some_and(|m| m.contains_key("@id"))
}

/// A node reference is an object with `@id` as its only entry.
pub(crate) fn is_node_reference(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.len() == 1 && map.contains_key("@id"))
}

pub(crate) fn is_node_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            !map.contains_key("@value") && !map.contains_key("@list") && !map.contains_key("@set")
        }
        _ => false,
    }
}

pub(crate) fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// The string value of the `@id` entry of `value`, if any.
pub(crate) fn id_of(value: &Value) -> Option<&str> {
    value.get("@id").and_then(Value::as_str)
}

/// Add `value` to the entry `key` of `map`.
///
/// If `as_array` is set, the entry is always an array afterwards.
/// Arrays are appended item by item.
pub(crate) fn add_value(map: &mut Map, key: &str, value: Value, as_array: bool) {
    if as_array {
        match map.get_mut(key) {
            Some(Value::Array(_)) => {}
            Some(existing) => {
                let old = existing.take();
                *existing = Value::Array(vec![old]);
            }
            None => {
                map.insert(key.to_string(), Value::Array(vec![]));
            }
        }
    }
    match value {
        Value::Array(items) => {
            if !map.contains_key(key) {
                map.insert(key.to_string(), Value::Array(vec![]));
            }
            for item in items {
                add_value(map, key, item, as_array);
            }
        }
        value => match map.get_mut(key) {
            None => {
                map.insert(key.to_string(), value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let old = existing.take();
                *existing = Value::Array(vec![old, value]);
            }
        },
    }
}

/// Append `value` to the array entry `key` of `map`, unless it is already present.
pub(crate) fn add_unique(map: &mut Map, key: &str, value: Value) {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(vec![]));
    if !entry.is_array() {
        let old = entry.take();
        *entry = Value::Array(vec![old]);
    }
    if let Value::Array(items) = entry {
        if !items.contains(&value) {
            items.push(value);
        }
    }
}

/// The entries of `map`, in key order if `ordered` is set, in insertion order otherwise.
pub(crate) fn entries(map: &Map, ordered: bool) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    if ordered {
        entries.sort_by(|a, b| a.0.cmp(b.0));
    }
    entries
}

/// A JSON object with a single entry.
pub(crate) fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// The object entry `key` of `map`, created (or replaced, if not an object) if necessary.
pub(crate) fn object_entry<'m>(map: &'m mut Map, key: &str) -> &'m mut Map {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(map) => map,
        // just ensured above
        _ => unreachable!(),
    }
}

/// Split `txt` at its first colon, provided it is not the first character.
pub(crate) fn split_prefix(txt: &str) -> Option<(&str, &str)> {
    match txt.find(':') {
        Some(i) if i > 0 => Some((&txt[..i], &txt[i + 1..])),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_value_as_array() {
        let mut map = Map::new();
        add_value(&mut map, "a", json!(1), false);
        assert_eq!(map["a"], json!(1));
        add_value(&mut map, "a", json!(2), false);
        assert_eq!(map["a"], json!([1, 2]));
        add_value(&mut map, "b", json!(3), true);
        assert_eq!(map["b"], json!([3]));
        add_value(&mut map, "c", json!([]), true);
        assert_eq!(map["c"], json!([]));
        add_value(&mut map, "d", json!([4, 5]), false);
        assert_eq!(map["d"], json!([4, 5]));
    }

    #[test]
    fn add_unique_skips_duplicates() {
        let mut map = Map::new();
        add_unique(&mut map, "a", json!({"@id": "x"}));
        add_unique(&mut map, "a", json!({"@id": "x"}));
        add_unique(&mut map, "a", json!({"@id": "y"}));
        assert_eq!(map["a"], json!([{"@id": "x"}, {"@id": "y"}]));
    }

    #[test]
    fn object_kinds() {
        assert!(is_graph_object(&json!({"@graph": [], "@id": "x"})));
        assert!(!is_graph_object(&json!({"@graph": [], "p": 1})));
        assert!(is_simple_graph_object(&json!({"@graph": []})));
        assert!(is_node_reference(&json!({"@id": "x"})));
        assert!(!is_node_object(&json!({"@value": 1})));
        assert_eq!(split_prefix("ex:a:b"), Some(("ex", "a:b")));
        assert_eq!(split_prefix(":b"), None);
    }
}
