//! [Serialization of RDF as JSON-LD](https://www.w3.org/TR/json-ld11-api/#serialize-rdf-as-json-ld-algorithm).
//!
//! Quads are first gathered per (graph, subject) into an indexed table of nodes;
//! lists and compound literals are then detected by walking back from their last node,
//! and the table is finally converted to expanded JSON-LD.

use std::collections::hash_map::Entry::*;
use std::collections::{BTreeMap, HashMap, HashSet};

use ldtk_api::ns::{i18n, rdf, xsd};
use ldtk_api::{Dataset, Literal, Quad, Term};
use serde_json::{Number, Value};

use crate::error::{JsonLdError, Result};
use crate::options::{JsonLdOptions, ProcessingMode, RdfDirection};
use crate::util::{single, Map};

const DEFAULT_GRAPH: &str = "@default";

/// Convert `dataset` to an expanded JSON-LD document.
///
/// Nodes of the default graph are sorted by identifier;
/// the nodes of each named graph are embedded, sorted by identifier,
/// under the `@graph` entry of the node named after the graph.
pub(crate) fn dataset_to_expanded<L: ?Sized>(
    dataset: &Dataset,
    options: &JsonLdOptions<L>,
) -> Result<Vec<Value>> {
    let mut engine = Engine::new(options);
    for quad in dataset.quads() {
        engine.process_quad(quad);
    }
    engine.into_json()
}

/// An object of the dataset, as seen from its subject.
#[derive(Clone, Debug, PartialEq)]
enum RdfObject {
    Literal(Literal),
    /// The index of the object node (in the subject's graph), and its identifier
    Node(usize, String),
}

impl RdfObject {
    fn is_literal(&self) -> bool {
        matches!(self, RdfObject::Literal(_))
    }

    fn is_node(&self) -> bool {
        matches!(self, RdfObject::Node(..))
    }

    fn eq_node(&self, other_id: &str) -> bool {
        matches!(self, RdfObject::Node(_, id) if id == other_id)
    }

    fn as_str(&self) -> &str {
        match self {
            RdfObject::Literal(lit) => lit.lexical_form(),
            RdfObject::Node(_, id) => id,
        }
    }
}

type Properties = BTreeMap<String, Vec<RdfObject>>;

struct Engine {
    use_native_types: bool,
    use_rdf_type: bool,
    rdf_direction: Option<RdfDirection>,
    processing_mode: ProcessingMode,
    // Maps (graph, node) identifiers to their index
    index: HashMap<(String, String), usize>,
    // Maps each index to its (graph, node) identifiers
    gs_id: Vec<(String, String)>,
    // Outgoing arcs of each node; named graph members are listed under `@graph`
    node: Vec<Properties>,
    // The only (subject, predicate) pointing to a blank node, or None if there are several
    unique_parent: HashMap<String, Option<(usize, String)>>,
    // Blank nodes whose rdf:rest is rdf:nil
    list_seeds: Vec<usize>,
    list_nodes: HashSet<usize>,
    compound_literals: HashSet<usize>,
}

impl Engine {
    fn new<L: ?Sized>(options: &JsonLdOptions<L>) -> Self {
        Engine {
            use_native_types: options.use_native_types(),
            use_rdf_type: options.use_rdf_type(),
            rdf_direction: options.rdf_direction(),
            processing_mode: options.processing_mode(),
            index: HashMap::new(),
            gs_id: Vec::new(),
            node: Vec::new(),
            unique_parent: HashMap::new(),
            list_seeds: Vec::new(),
            list_nodes: HashSet::new(),
            compound_literals: HashSet::new(),
        }
    }

    fn process_quad(&mut self, quad: &Quad) {
        let (Some(s_id), Some(p)) = (node_id(quad.s()), quad.p().iri()) else {
            log::debug!("skipping generalized quad {quad}");
            return;
        };
        let g_id = match quad.g() {
            None => DEFAULT_GRAPH.to_string(),
            Some(g) => match node_id(g) {
                Some(g_id) => g_id,
                None => {
                    log::debug!("skipping quad with literal graph name {quad}");
                    return;
                }
            },
        };
        let is = self.index(&g_id, &s_id);
        if quad.g().is_some() {
            let ig = self.index(DEFAULT_GRAPH, &g_id);
            push_if_new(&mut self.node[ig], "@graph", RdfObject::Node(is, s_id.clone()));
        }
        let obj = match quad.o() {
            Term::Literal(lit) => RdfObject::Literal(lit.clone()),
            o => {
                let o_id = node_id(o).unwrap_or_default();
                RdfObject::Node(self.index(&g_id, &o_id), o_id)
            }
        };
        push_if_new(&mut self.node[is], p, obj);

        if quad.s().is_blank_node() {
            if p == rdf::rest && quad.o().is(rdf::nil) {
                if !self.list_seeds.contains(&is) {
                    self.list_seeds.push(is);
                }
            } else if self.rdf_direction == Some(RdfDirection::CompoundLiteral) && p == rdf::direction {
                self.compound_literals.insert(is);
            }
        }
        if let Some(label) = quad.o().bnode_id() {
            let parent = (is, p.to_string());
            match self.unique_parent.entry(format!("_:{label}")) {
                Vacant(e) => {
                    e.insert(Some(parent));
                }
                Occupied(mut e) => {
                    if e.get().as_ref().is_some_and(|p| *p != parent) {
                        e.insert(None);
                    }
                }
            }
        }
    }

    fn index(&mut self, g_id: &str, s_id: &str) -> usize {
        match self.index.entry((g_id.to_string(), s_id.to_string())) {
            Vacant(e) => {
                let i = self.gs_id.len();
                e.insert(i);
                self.gs_id.push((g_id.to_string(), s_id.to_string()));
                self.node.push(Properties::new());
                i
            }
            Occupied(e) => *e.get(),
        }
    }

    fn into_json(mut self) -> Result<Vec<Value>> {
        for inode in std::mem::take(&mut self.list_seeds) {
            self.mark_list_node(inode);
        }
        if self.rdf_direction == Some(RdfDirection::CompoundLiteral) {
            let mut compound_literals = std::mem::take(&mut self.compound_literals);
            compound_literals.retain(|is| is_compound_literal(&self.node[*is]));
            self.compound_literals = compound_literals;
        }
        let mut roots: Vec<usize> = (0..self.node.len())
            .filter(|i| self.gs_id[*i].0 == DEFAULT_GRAPH)
            .collect();
        self.sort_by_id(&mut roots);
        roots
            .into_iter()
            .filter_map(|inode| self.jsonify(inode, true).transpose())
            .collect()
    }

    fn sort_by_id(&self, indexes: &mut [usize]) {
        indexes.sort_by(|a, b| self.gs_id[*a].1.cmp(&self.gs_id[*b].1));
    }

    /// Mark `inode` as a list node if it is a well-formed list node with a unique parent,
    /// then proceed with its parent if it is linked through `rdf:rest`.
    fn mark_list_node(&mut self, mut inode: usize) {
        loop {
            let (g_id, s_id) = &self.gs_id[inode];
            let Some(Some((iparent, pp))) = self.unique_parent.get(s_id) else {
                return;
            };
            if self.processing_mode == ProcessingMode::JsonLd1_0 && pp == rdf::first {
                return;
            }
            let (pg_id, ps_id) = &self.gs_id[*iparent];
            if pg_id != g_id || !is_list_node(&self.node[inode]) {
                return;
            }
            let next = (ps_id.starts_with("_:") && pp == rdf::rest).then_some(*iparent);
            self.list_nodes.insert(inode);
            match next {
                Some(parent) => inode = parent,
                None => return,
            }
        }
    }

    fn jsonify(&self, inode: usize, root: bool) -> Result<Option<Value>> {
        let node = &self.node[inode];
        if node.is_empty() {
            // only used as an object
            return Ok(None);
        }
        if self.list_nodes.contains(&inode) || self.compound_literals.contains(&inode) {
            return Ok(None);
        }
        let (_, s_id) = &self.gs_id[inode];
        let mut obj = self.make_node_object(s_id, node)?;
        if root {
            if let Some(members) = node.get("@graph") {
                let mut members: Vec<usize> = members
                    .iter()
                    .filter_map(|m| match m {
                        RdfObject::Node(i, _) => Some(*i),
                        RdfObject::Literal(_) => None,
                    })
                    .collect();
                self.sort_by_id(&mut members);
                let graph = members
                    .into_iter()
                    .filter_map(|i| self.jsonify(i, false).transpose())
                    .collect::<Result<Vec<_>>>()?;
                obj.insert("@graph".into(), Value::Array(graph));
            }
        }
        Ok(Some(Value::Object(obj)))
    }

    fn make_node_object(&self, id: &str, node: &Properties) -> Result<Map> {
        let mut obj = Map::new();
        obj.insert("@id".into(), id.into());
        for (key, vals) in node {
            if key == "@graph" {
                continue;
            }
            let vals: Vec<&RdfObject> = if !self.use_rdf_type && key == rdf::type_ {
                let (types, others): (Vec<_>, Vec<_>) = vals.iter().partition(|o| o.is_node());
                if !types.is_empty() {
                    let types = types.iter().map(|t| Value::from(t.as_str())).collect();
                    obj.insert("@type".into(), Value::Array(types));
                }
                others
            } else {
                vals.iter().collect()
            };
            if vals.is_empty() {
                continue;
            }
            let vals = vals
                .into_iter()
                .map(|o| self.convert_rdf_object(o))
                .collect::<Result<Vec<_>>>()?;
            obj.insert(key.clone(), Value::Array(vals));
        }
        Ok(obj)
    }

    fn convert_rdf_object(&self, val: &RdfObject) -> Result<Value> {
        let (inode, id) = match val {
            RdfObject::Literal(lit) => return self.convert_literal(lit),
            RdfObject::Node(inode, id) => (inode, id),
        };
        let ret = if id == rdf::nil {
            single("@list", Value::Array(vec![]))
        } else if !id.starts_with("_:") {
            single("@id", id.as_str().into())
        } else if self.list_nodes.contains(inode) {
            single("@list", Value::Array(self.list_items(*inode)?))
        } else if self.compound_literals.contains(inode) {
            let node = &self.node[*inode];
            let first = |p: &str| node.get(p).and_then(|v| v.first()).map(RdfObject::as_str);
            let mut obj = Map::new();
            obj.insert("@value".into(), first(rdf::value).unwrap_or_default().into());
            if let Some(tag) = first(rdf::language) {
                obj.insert("@language".into(), tag.into());
            }
            obj.insert("@direction".into(), first(rdf::direction).unwrap_or_default().into());
            Value::Object(obj)
        } else {
            single("@id", id.as_str().into())
        };
        Ok(ret)
    }

    fn convert_literal(&self, lit: &Literal) -> Result<Value> {
        let txt = lit.lexical_form();
        let dt = lit.datatype();
        let mut obj = Map::new();
        if let Some(tag) = lit.language_tag() {
            obj.insert("@value".into(), txt.into());
            obj.insert("@language".into(), tag.into());
            return Ok(Value::Object(obj));
        }
        let native = if self.use_native_types {
            native_value(dt, txt)
        } else {
            None
        };
        if let Some(value) = native {
            obj.insert("@value".into(), value);
        } else if dt == rdf::JSON && self.processing_mode != ProcessingMode::JsonLd1_0 {
            let value: Value = serde_json::from_str(txt)
                .map_err(|err| JsonLdError::InvalidJsonLiteral(format!("{txt}: {err}")))?;
            obj.insert("@value".into(), value);
            obj.insert("@type".into(), "@json".into());
        } else if let Some(suffix) = dt
            .strip_prefix(i18n::PREFIX)
            .filter(|_| self.rdf_direction == Some(RdfDirection::I18nDatatype))
        {
            let (tag, dir) = suffix.split_once('_').unwrap_or((suffix, ""));
            obj.insert("@value".into(), txt.into());
            if !tag.is_empty() {
                obj.insert("@language".into(), tag.into());
            }
            if !dir.is_empty() {
                obj.insert("@direction".into(), dir.into());
            }
        } else {
            obj.insert("@value".into(), txt.into());
            if dt != xsd::string {
                obj.insert("@type".into(), dt.into());
            }
        }
        Ok(Value::Object(obj))
    }

    fn list_items(&self, mut inode: usize) -> Result<Vec<Value>> {
        let mut items = vec![];
        loop {
            let node = &self.node[inode];
            if let Some(first) = node.get(rdf::first).and_then(|v| v.first()) {
                items.push(self.convert_rdf_object(first)?);
            }
            match node.get(rdf::rest).and_then(|v| v.first()) {
                Some(RdfObject::Node(next, id))
                    if id != rdf::nil && self.list_nodes.contains(next) =>
                {
                    inode = *next
                }
                _ => return Ok(items),
            }
        }
    }
}

/// The identifier of an IRI or blank node, as used in JSON-LD.
fn node_id(term: &Term) -> Option<String> {
    match term {
        Term::Iri(iri) => Some(iri.clone()),
        Term::BlankNode(label) => Some(format!("_:{label}")),
        Term::Literal(_) => None,
    }
}

fn push_if_new(properties: &mut Properties, key: &str, value: RdfObject) {
    let values = properties.entry(key.to_string()).or_default();
    if !values.contains(&value) {
        values.push(value);
    }
}

/// The native JSON value for literals of datatype
/// `xsd:boolean`, `xsd:integer` and `xsd:double` with a valid lexical form.
fn native_value(dt: &str, txt: &str) -> Option<Value> {
    if dt == xsd::boolean {
        match txt {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        }
    } else if dt == xsd::integer {
        let digits = txt.strip_prefix(['+', '-']).unwrap_or(txt);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        txt.trim_start_matches('+').parse::<i64>().ok().map(Value::from)
    } else if dt == xsd::double {
        let valid_chars = txt
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
        if !valid_chars || !txt.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        txt.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    } else {
        None
    }
}

// a list node is a blank node with exactly one rdf:first and one rdf:rest,
// and possibly rdf:type rdf:List
fn is_list_node(node: &Properties) -> bool {
    2 <= node.len()
        && node.len() <= 3
        && node.get(rdf::first).is_some_and(|v| v.len() == 1)
        && node
            .get(rdf::rest)
            .is_some_and(|v| v.len() == 1 && v[0].is_node())
        && (node.len() == 2
            || node
                .get(rdf::type_)
                .is_some_and(|v| v.len() == 1 && v[0].eq_node(rdf::List)))
}

fn is_compound_literal(node: &Properties) -> bool {
    2 <= node.len()
        && node.len() <= 3
        && node
            .get(rdf::direction)
            .is_some_and(|v| v.len() == 1 && v[0].is_literal())
        && node
            .get(rdf::value)
            .is_some_and(|v| v.len() == 1 && v[0].is_literal())
        && (node.len() == 2
            || node
                .get(rdf::language)
                .is_some_and(|v| v.len() == 1 && v[0].is_literal()))
}

#[cfg(test)]
mod test {
    use super::*;
    use ldtk_api::nq;
    use serde_json::json;

    fn from_nq(txt: &str, options: &JsonLdOptions) -> Result<Value> {
        let dataset = nq::parse_str(txt).unwrap();
        dataset_to_expanded(&dataset, options).map(Value::Array)
    }

    const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

    #[test]
    fn nodes_and_types() {
        let txt = format!(
            "<http://example.org/b> <{RDF}type> <http://example.org/T> .\n\
             <http://example.org/a> <http://example.org/p> <http://example.org/b> .\n\
             <http://example.org/a> <http://example.org/p> \"x\"@en .\n"
        );
        let got = from_nq(&txt, &JsonLdOptions::new()).unwrap();
        assert_eq!(
            got,
            json!([
                {"@id": "http://example.org/a", "http://example.org/p": [
                    {"@id": "http://example.org/b"},
                    {"@value": "x", "@language": "en"},
                ]},
                {"@id": "http://example.org/b", "@type": ["http://example.org/T"]},
            ])
        );
        let got = from_nq(&txt, &JsonLdOptions::new().with_use_rdf_type(true)).unwrap();
        assert_eq!(
            got[1],
            json!({"@id": "http://example.org/b", format!("{RDF}type"): [{"@id": "http://example.org/T"}]})
        );
    }

    #[test]
    fn lists() {
        let txt = format!(
            "<http://example.org/s> <http://example.org/p> _:l1 .\n\
             _:l1 <{RDF}first> \"1\"^^<{XSD}integer> .\n\
             _:l1 <{RDF}rest> _:l2 .\n\
             _:l2 <{RDF}first> \"2.5E0\"^^<{XSD}double> .\n\
             _:l2 <{RDF}rest> <{RDF}nil> .\n\
             <http://example.org/s> <http://example.org/q> <{RDF}nil> .\n"
        );
        let got = from_nq(&txt, &JsonLdOptions::new().with_use_native_types(true)).unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/p": [{"@list": [{"@value": 1}, {"@value": 2.5}]}],
                "http://example.org/q": [{"@list": []}],
            }])
        );
    }

    #[test]
    fn malformed_list_is_kept_as_nodes() {
        let txt = format!(
            "<http://example.org/s> <http://example.org/p> _:l1 .\n\
             _:l1 <{RDF}first> \"a\" .\n\
             <http://example.org/t> <http://example.org/p> _:l2 .\n\
             _:l2 <{RDF}first> \"b\" .\n\
             _:l2 <{RDF}rest> <{RDF}nil> .\n\
             <http://example.org/u> <http://example.org/p> _:l2 .\n"
        );
        let got = from_nq(&txt, &JsonLdOptions::new()).unwrap();
        assert_eq!(
            got,
            json!([
                {"@id": "_:l1", format!("{RDF}first"): [{"@value": "a"}]},
                {"@id": "_:l2", format!("{RDF}first"): [{"@value": "b"}], format!("{RDF}rest"): [{"@list": []}]},
                {"@id": "http://example.org/s", "http://example.org/p": [{"@id": "_:l1"}]},
                {"@id": "http://example.org/t", "http://example.org/p": [{"@id": "_:l2"}]},
                {"@id": "http://example.org/u", "http://example.org/p": [{"@id": "_:l2"}]},
            ])
        );
    }

    #[test]
    fn json_literals() {
        let txt = format!("<http://example.org/s> <http://example.org/p> \"{{\\\"a\\\":1}}\"^^<{RDF}JSON> .\n");
        let got = from_nq(&txt, &JsonLdOptions::new()).unwrap();
        assert_eq!(
            got[0]["http://example.org/p"],
            json!([{"@value": {"a": 1}, "@type": "@json"}])
        );
        let txt = format!("<http://example.org/s> <http://example.org/p> \"{{oops\"^^<{RDF}JSON> .\n");
        let err = from_nq(&txt, &JsonLdOptions::new()).unwrap_err();
        assert_eq!(err.code(), "invalid JSON literal");
    }

    #[test]
    fn native_types_require_valid_lexical_forms() {
        assert_eq!(native_value(xsd::integer, "-12"), Some(json!(-12)));
        assert_eq!(native_value(xsd::integer, "1.5"), None);
        assert_eq!(native_value(xsd::double, "1.5E2"), Some(json!(150.0)));
        assert_eq!(native_value(xsd::double, "NaN"), None);
        assert_eq!(native_value(xsd::boolean, "1"), None);
        assert_eq!(native_value(xsd::string, "true"), None);
    }

    #[test]
    fn directions() {
        let txt = "<http://example.org/s> <http://example.org/p> \"abc\"^^<https://www.w3.org/ns/i18n#en_rtl> .\n";
        let options = JsonLdOptions::new().with_rdf_direction(RdfDirection::I18nDatatype);
        let got = from_nq(txt, &options).unwrap();
        assert_eq!(
            got[0]["http://example.org/p"],
            json!([{"@value": "abc", "@language": "en", "@direction": "rtl"}])
        );

        let txt = format!(
            "<http://example.org/s> <http://example.org/p> _:c .\n\
             _:c <{RDF}value> \"abc\" .\n\
             _:c <{RDF}direction> \"ltr\" .\n"
        );
        let options = JsonLdOptions::new().with_rdf_direction(RdfDirection::CompoundLiteral);
        let got = from_nq(&txt, &options).unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/p": [{"@value": "abc", "@direction": "ltr"}],
            }])
        );
    }

    #[test]
    fn named_graphs() {
        let txt = "<http://example.org/b> <http://example.org/p> \"b\" <http://example.org/g> .\n\
                   <http://example.org/a> <http://example.org/p> \"a\" <http://example.org/g> .\n";
        let got = from_nq(txt, &JsonLdOptions::new()).unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.org/g",
                "@graph": [
                    {"@id": "http://example.org/a", "http://example.org/p": [{"@value": "a"}]},
                    {"@id": "http://example.org/b", "http://example.org/p": [{"@value": "b"}]},
                ],
            }])
        );
    }
}
