//! [Node map generation](https://www.w3.org/TR/json-ld11-api/#node-map-generation),
//! used by flattening, framing and RDF serialization.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::error::{JsonLdError, Result};
use crate::keyword::is_keyword;
use crate::util::*;

/// The nodes of a graph, indexed by identifier.
pub type Graph = BTreeMap<String, Map>;

/// Issues fresh blank node identifiers (`_:b0`, `_:b1`…),
/// remembering which identifier was issued for which existing one.
#[derive(Clone, Debug)]
pub struct BlankNodeIssuer {
    prefix: String,
    counter: usize,
    issued: HashMap<String, String>,
}

impl Default for BlankNodeIssuer {
    fn default() -> Self {
        Self::new("_:b")
    }
}

impl BlankNodeIssuer {
    pub fn new<T: Into<String>>(prefix: T) -> Self {
        BlankNodeIssuer {
            prefix: prefix.into(),
            counter: 0,
            issued: HashMap::new(),
        }
    }

    /// The identifier issued for `existing`, issuing a new one if necessary.
    pub fn issue(&mut self, existing: &str) -> String {
        if let Some(issued) = self.issued.get(existing) {
            return issued.clone();
        }
        let issued = self.fresh();
        self.issued.insert(existing.to_string(), issued.clone());
        issued
    }

    /// A new identifier, not associated to any existing one.
    pub fn fresh(&mut self) -> String {
        let issued = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        issued
    }
}

/// The subject that the values being visited are attached to.
#[derive(Clone, Debug)]
enum Subject {
    Id(String),
    /// The node reference of a node whose reverse properties are being visited.
    Reverse(Value),
}

/// A map from graph names (`@default` for the default graph) to [`Graph`]s.
#[derive(Clone, Debug)]
pub struct NodeMap {
    graphs: BTreeMap<String, Graph>,
}

impl Default for NodeMap {
    fn default() -> Self {
        let mut graphs = BTreeMap::new();
        graphs.insert("@default".to_string(), Graph::new());
        NodeMap { graphs }
    }
}

impl NodeMap {
    /// Build the node map of an expanded document.
    pub fn build(expanded: Vec<Value>, issuer: &mut BlankNodeIssuer) -> Result<Self> {
        let mut node_map = NodeMap::default();
        node_map.generate(Value::Array(expanded), issuer)?;
        Ok(node_map)
    }

    /// Add the nodes of the expanded `element` to this node map.
    pub fn generate(&mut self, element: Value, issuer: &mut BlankNodeIssuer) -> Result<()> {
        self.visit(element, "@default", None, None, None, issuer)
    }

    pub fn graphs(&self) -> impl Iterator<Item = (&str, &Graph)> {
        self.graphs.iter().map(|(name, graph)| (name.as_str(), graph))
    }

    pub fn graph(&self, name: &str) -> Option<&Graph> {
        self.graphs.get(name)
    }

    pub fn default_graph(&self) -> &Graph {
        // always present, see `Default`
        &self.graphs["@default"]
    }

    pub(crate) fn into_graphs(self) -> BTreeMap<String, Graph> {
        self.graphs
    }

    /// Merge all graphs into a single one, as needed by framing with `@graph`.
    pub fn merge(&self) -> Graph {
        let mut result = Graph::new();
        for graph in self.graphs.values() {
            for (id, node) in graph {
                let merged = result
                    .entry(id.clone())
                    .or_insert_with(|| id_map(id));
                for (property, values) in node {
                    if property != "@type" && is_keyword(property) {
                        merged.insert(property.clone(), values.clone());
                    } else {
                        for value in as_array(values) {
                            add_unique(merged, property, value.clone());
                        }
                    }
                }
            }
        }
        result
    }

    fn node_mut(&mut self, graph: &str, id: &str) -> &mut Map {
        self.graphs
            .entry(graph.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| id_map(id))
    }

    fn visit(
        &mut self,
        element: Value,
        active_graph: &str,
        active_subject: Option<&Subject>,
        active_property: Option<&str>,
        mut list: Option<&mut Vec<Value>>,
        issuer: &mut BlankNodeIssuer,
    ) -> Result<()> {
        let mut element = match element {
            Value::Array(items) => {
                for item in items {
                    self.visit(
                        item,
                        active_graph,
                        active_subject,
                        active_property,
                        list.as_deref_mut(),
                        issuer,
                    )?;
                }
                return Ok(());
            }
            Value::Object(map) => map,
            _ => return Ok(()),
        };
        self.graphs.entry(active_graph.to_string()).or_default();
        if let Some(types) = element.get_mut("@type") {
            for t in types.as_array_mut().into_iter().flatten() {
                if let Some(id) = t.as_str().filter(|id| is_blank_node_id(id)) {
                    *t = issuer.issue(id).into();
                }
            }
        }

        if element.contains_key("@value") {
            let element = Value::Object(element);
            match list {
                Some(list) => list.push(element),
                None => self.attach(active_graph, active_subject, active_property, element, true),
            }
        } else if let Some(items) = element.remove("@list") {
            let mut result = vec![];
            self.visit(
                items,
                active_graph,
                active_subject,
                active_property,
                Some(&mut result),
                issuer,
            )?;
            let result = single("@list", Value::Array(result));
            match list {
                Some(list) => list.push(result),
                None => self.attach(active_graph, active_subject, active_property, result, false),
            }
        } else {
            let id = match element.remove("@id") {
                Some(Value::String(id)) if is_blank_node_id(&id) => issuer.issue(&id),
                Some(Value::String(id)) => id,
                _ => issuer.fresh(),
            };
            self.node_mut(active_graph, &id);
            let reference = single("@id", id.clone().into());
            match active_subject {
                Some(Subject::Reverse(subject)) => {
                    if let Some(property) = active_property {
                        let node = self.node_mut(active_graph, &id);
                        add_unique(node, property, subject.clone());
                    }
                }
                _ if active_property.is_some() => match list.as_deref_mut() {
                    Some(list) => list.push(reference.clone()),
                    None => self.attach(
                        active_graph,
                        active_subject,
                        active_property,
                        reference.clone(),
                        true,
                    ),
                },
                _ => {}
            }
            if let Some(types) = element.remove("@type") {
                let node = self.node_mut(active_graph, &id);
                for t in into_array(types) {
                    add_unique(node, "@type", t);
                }
            }
            if let Some(index) = element.remove("@index") {
                let node = self.node_mut(active_graph, &id);
                match node.get("@index") {
                    Some(existing) if *existing != index => {
                        return Err(JsonLdError::ConflictingIndexes(format!(
                            "{id} has indexes {existing} and {index}"
                        )));
                    }
                    _ => {
                        node.insert("@index".into(), index);
                    }
                }
            }
            if let Some(Value::Object(reverse)) = element.remove("@reverse") {
                let subject = Subject::Reverse(reference);
                for (property, values) in reverse {
                    self.visit(values, active_graph, Some(&subject), Some(&property), None, issuer)?;
                }
            }
            if let Some(graph) = element.remove("@graph") {
                self.graphs.entry(id.clone()).or_default();
                self.visit(graph, &id, None, None, None, issuer)?;
            }
            if let Some(included) = element.remove("@included") {
                self.visit(included, active_graph, None, None, None, issuer)?;
            }
            let mut properties: Vec<_> = element.into_iter().collect();
            properties.sort_by(|a, b| a.0.cmp(&b.0));
            let subject = Subject::Id(id.clone());
            for (property, value) in properties {
                let property = if is_blank_node_id(&property) {
                    issuer.issue(&property)
                } else {
                    property
                };
                let node = self.node_mut(active_graph, &id);
                if !node.contains_key(&property) {
                    node.insert(property.clone(), Value::Array(vec![]));
                }
                self.visit(value, active_graph, Some(&subject), Some(&property), None, issuer)?;
            }
        }
        Ok(())
    }

    /// Add `value` to the `property` of the `subject` node, skipping duplicates if `unique`.
    fn attach(
        &mut self,
        graph: &str,
        subject: Option<&Subject>,
        property: Option<&str>,
        value: Value,
        unique: bool,
    ) {
        let (Some(Subject::Id(subject)), Some(property)) = (subject, property) else {
            return;
        };
        let node = self.node_mut(graph, subject);
        if unique {
            add_unique(node, property, value);
        } else {
            add_value(node, property, value, true);
        }
    }
}

pub(crate) fn id_map(id: &str) -> Map {
    let mut map = Map::new();
    map.insert("@id".into(), id.into());
    map
}

/// Whether `node` carries nothing but its identifier.
pub(crate) fn is_bare_node(node: &Map) -> bool {
    node.len() == 1 && node.contains_key("@id")
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn issuer() {
        let mut issuer = BlankNodeIssuer::default();
        assert_eq!(issuer.issue("_:x"), "_:b0");
        assert_eq!(issuer.fresh(), "_:b1");
        assert_eq!(issuer.issue("_:y"), "_:b2");
        assert_eq!(issuer.issue("_:x"), "_:b0");
    }

    #[test]
    fn embedded_nodes_become_references() {
        let expanded = json!([{
            "@id": "http://example.org/a",
            "http://example.org/knows": [{
                "http://example.org/name": [{"@value": "Bob"}],
            }],
        }]);
        let mut issuer = BlankNodeIssuer::default();
        let node_map = NodeMap::build(into_array(expanded), &mut issuer).unwrap();
        let graph = node_map.default_graph();
        assert_eq!(
            Value::Object(graph["http://example.org/a"].clone()),
            json!({"@id": "http://example.org/a", "http://example.org/knows": [{"@id": "_:b0"}]})
        );
        assert_eq!(
            Value::Object(graph["_:b0"].clone()),
            json!({"@id": "_:b0", "http://example.org/name": [{"@value": "Bob"}]})
        );
    }

    #[test]
    fn lists_and_reverse() {
        let expanded = json!([{
            "@id": "http://example.org/a",
            "http://example.org/l": [{"@list": [{"@value": 1}, {"@id": "http://example.org/b"}]}],
            "@reverse": {"http://example.org/r": [{"@id": "http://example.org/c"}]},
        }]);
        let node_map = NodeMap::build(into_array(expanded), &mut BlankNodeIssuer::default()).unwrap();
        let graph = node_map.default_graph();
        assert_eq!(
            graph["http://example.org/a"]["http://example.org/l"],
            json!([{"@list": [{"@value": 1}, {"@id": "http://example.org/b"}]}])
        );
        assert_eq!(
            graph["http://example.org/c"]["http://example.org/r"],
            json!([{"@id": "http://example.org/a"}])
        );
    }

    #[test]
    fn named_graphs() {
        let expanded = json!([{
            "@id": "http://example.org/g",
            "@graph": [{"@id": "http://example.org/a", "http://example.org/p": [{"@value": 1}]}],
        }]);
        let node_map = NodeMap::build(into_array(expanded), &mut BlankNodeIssuer::default()).unwrap();
        assert!(node_map.default_graph().contains_key("http://example.org/g"));
        let g = node_map.graph("http://example.org/g").unwrap();
        assert!(g.contains_key("http://example.org/a"));
        let merged = node_map.merge();
        assert!(merged.contains_key("http://example.org/a"));
        assert!(merged.contains_key("http://example.org/g"));
    }

    #[test]
    fn conflicting_indexes() {
        let expanded = json!([
            {"@id": "http://example.org/a", "@index": "x"},
            {"@id": "http://example.org/a", "@index": "y"},
        ]);
        let err = NodeMap::build(into_array(expanded), &mut BlankNodeIssuer::default()).unwrap_err();
        assert_eq!(err.code(), "conflicting indexes");
    }
}
