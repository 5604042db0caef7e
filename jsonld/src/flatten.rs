//! The [flattening algorithm](https://www.w3.org/TR/json-ld11-api/#flattening-algorithm).

use serde_json::Value;

use crate::node_map::{id_map, is_bare_node, Graph, NodeMap};

/// Turn a node map into a flat array of node objects, sorted by identifier.
///
/// Named graphs are attached to the node of the default graph with the same identifier,
/// under `@graph`. Nodes carrying nothing but their identifier are omitted.
pub fn flatten_node_map(node_map: NodeMap) -> Vec<Value> {
    let mut graphs = node_map.into_graphs();
    let mut default_graph = graphs.remove("@default").unwrap_or_default();
    for (name, graph) in graphs {
        let entry = default_graph
            .entry(name.clone())
            .or_insert_with(|| id_map(&name));
        entry.insert("@graph".into(), Value::Array(emit(graph)));
    }
    emit(default_graph)
}

fn emit(graph: Graph) -> Vec<Value> {
    graph
        .into_values()
        .filter(|node| !is_bare_node(node))
        .map(Value::Object)
        .collect()
}
