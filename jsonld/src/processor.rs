//! The entry points of the [JSON-LD API](https://www.w3.org/TR/json-ld11-api/#the-jsonldprocessor-interface).
//!
//! Each function creates its own processing environment
//! (remote context cache, blank node issuer...),
//! so that calls are independent from each other.

use std::borrow::Cow;

use ldtk_api::Dataset;
use ldtk_c14n::hash::Sha256;
use ldtk_c14n::rdfc10::canonical_nquads;
use ldtk_iri::resolve::BaseIri;
use serde_json::Value;

use crate::compact::{compact_document, compact_iri_in};
use crate::context::{ActiveContext, Env, ProcessingFlags};
use crate::error::Result;
use crate::expand::expand_document;
use crate::flatten::flatten_node_map;
use crate::frame::{cleanup_null, frame_node_map, FrameDefaults};
use crate::from_rdf::dataset_to_expanded;
use crate::loader::DocumentLoader;
use crate::node_map::{BlankNodeIssuer, NodeMap};
use crate::options::JsonLdOptions;
use crate::to_rdf::node_map_to_rdf;
use crate::util::Map;

/// An input of the JSON-LD API: a document, a context or a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonLdInput {
    /// An already parsed JSON value
    Value(Value),
    /// JSON text, to be parsed
    Text(String),
    /// The IRI of a document, to be retrieved with the document loader
    Iri(String),
}

impl From<Value> for JsonLdInput {
    fn from(value: Value) -> Self {
        JsonLdInput::Value(value)
    }
}

/// An input, once parsed or retrieved.
struct Loaded<'i> {
    document: Cow<'i, Value>,
    document_url: Option<String>,
    context_url: Option<String>,
}

impl JsonLdInput {
    fn load(&self, env: &Env) -> Result<Loaded<'_>> {
        let (document, document_url, context_url) = match self {
            JsonLdInput::Value(value) => (Cow::Borrowed(value), None, None),
            JsonLdInput::Text(txt) => (Cow::Owned(serde_json::from_str(txt)?), None, None),
            JsonLdInput::Iri(iri) => {
                let remote = env.load_document(iri)?;
                let document = remote.json()?;
                (Cow::Owned(document), Some(remote.document_url), remote.context_url)
            }
        };
        Ok(Loaded {
            document,
            document_url,
            context_url,
        })
    }
}

/// [Expand](https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-expand) `input`.
pub fn expand<L: DocumentLoader>(input: &JsonLdInput, options: &JsonLdOptions<L>) -> Result<Value> {
    let env = Env::new(options);
    let loaded = input.load(&env)?;
    expand_loaded(&loaded, false, &env).map(Value::Array)
}

/// [Compact](https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-compact) `input`
/// against `context`.
///
/// `context` may be a context, or a document with a top-level `@context` entry.
pub fn compact<L: DocumentLoader>(
    input: &JsonLdInput,
    context: &JsonLdInput,
    options: &JsonLdOptions<L>,
) -> Result<Value> {
    let env = Env::new(options);
    let loaded = input.load(&env)?;
    let expanded = expand_loaded(&loaded, false, &env)?;
    let (ctx, local) = compaction_context(context, loaded.document_url.as_deref(), &env)?;
    let compacted = compact_document(&expanded, ctx, &env)?;
    Ok(with_context(compacted, local))
}

/// [Flatten](https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-flatten) `input`,
/// and compact the result against `context` if provided.
pub fn flatten<L: DocumentLoader>(
    input: &JsonLdInput,
    context: Option<&JsonLdInput>,
    options: &JsonLdOptions<L>,
) -> Result<Value> {
    let env = Env::new(options);
    let loaded = input.load(&env)?;
    let expanded = expand_loaded(&loaded, false, &env)?;
    let node_map = NodeMap::build(expanded, &mut BlankNodeIssuer::default())?;
    let flattened = flatten_node_map(node_map);
    let Some(context) = context else {
        return Ok(Value::Array(flattened));
    };
    let (ctx, local) = compaction_context(context, loaded.document_url.as_deref(), &env)?;
    let graph_key = compact_iri_in(&ctx, "@graph", true, &env)?;
    let compacted = compact_document(&flattened, ctx, &env)?;
    Ok(with_context(force_graph(compacted, &graph_key), local))
}

/// [Frame](https://www.w3.org/TR/json-ld11-framing/#dom-jsonldprocessor-frame) `input`
/// with `frame`.
pub fn frame<L: DocumentLoader>(
    input: &JsonLdInput,
    frame: &JsonLdInput,
    options: &JsonLdOptions<L>,
) -> Result<Value> {
    let env = Env::new(options);
    let loaded = input.load(&env)?;
    let expanded = expand_loaded(&loaded, false, &env)?;

    let frame_doc = frame.load(&env)?;
    let local = frame_doc
        .document
        .get("@context")
        .cloned()
        .unwrap_or(Value::Null);
    let base = context_base(options, loaded.document_url.as_deref());
    let base_url = frame_doc
        .document_url
        .clone()
        .or_else(|| base.as_ref().map(|b| b.as_str().to_string()));
    let ctx = ActiveContext::new(base, options.processing_mode()).process_with(
        &local,
        base_url.as_deref(),
        &[],
        ProcessingFlags::default(),
        &env,
    )?;
    // without a top-level @graph, nodes of all graphs are matched together
    let merged = !frame_doc.document.as_object().is_some_and(|map| {
        map.keys()
            .any(|key| ctx.expand_iri(key, false, true).as_deref() == Some("@graph"))
    });
    let expanded_frame = expand_loaded(&frame_doc, true, &env)?;

    let node_map = NodeMap::build(expanded, &mut BlankNodeIssuer::default())?;
    let framed = frame_node_map(
        &node_map,
        &expanded_frame,
        merged,
        FrameDefaults::from_options(options),
    )?;
    let graph_key = compact_iri_in(&ctx, "@graph", true, &env)?;
    let mut compacted = compact_document(&framed, ctx, &env)?;
    if !options.omit_graph() {
        compacted = force_graph(compacted, &graph_key);
    }
    let compacted = compacted
        .into_iter()
        .map(|(key, value)| (key, cleanup_null(value)))
        .collect();
    Ok(with_context(compacted, local))
}

/// [Convert](https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-tordf) `input` to RDF.
pub fn to_rdf<L: DocumentLoader>(input: &JsonLdInput, options: &JsonLdOptions<L>) -> Result<Dataset> {
    let env = Env::new(options);
    let loaded = input.load(&env)?;
    let expanded = expand_loaded(&loaded, false, &env)?;
    let mut issuer = BlankNodeIssuer::default();
    let node_map = NodeMap::build(expanded, &mut issuer)?;
    node_map_to_rdf(&node_map, &mut issuer, options)
}

/// [Convert](https://www.w3.org/TR/json-ld11-api/#dom-jsonldprocessor-fromrdf) `dataset`
/// to an expanded JSON-LD document.
pub fn from_rdf<L: ?Sized>(dataset: &Dataset, options: &JsonLdOptions<L>) -> Result<Value> {
    dataset_to_expanded(dataset, options).map(Value::Array)
}

/// Convert `input` to RDF, and return the canonical N-Quads form of the resulting dataset,
/// as produced by [RDFC-1.0](https://www.w3.org/TR/rdf-canon/).
pub fn normalize<L: DocumentLoader>(input: &JsonLdInput, options: &JsonLdOptions<L>) -> Result<String> {
    let dataset = to_rdf(input, options)?;
    let nquads = canonical_nquads::<Sha256>(
        &dataset,
        options.c14n_depth_factor(),
        options.c14n_permutation_limit(),
    )?;
    Ok(nquads)
}

fn expand_loaded(loaded: &Loaded, frame_expansion: bool, env: &Env) -> Result<Vec<Value>> {
    let options = env.options;
    let base = options
        .base()
        .cloned()
        .or_else(|| loaded.document_url.as_deref().and_then(|url| BaseIri::new(url).ok()));
    let base_url = loaded
        .document_url
        .clone()
        .or_else(|| options.base().map(|b| b.as_str().to_string()));
    let mut ctx = ActiveContext::new(base, options.processing_mode());
    if let Some(expand_context) = options.expand_context() {
        let local = expand_context.get("@context").unwrap_or(expand_context);
        ctx = ctx.process_with(local, base_url.as_deref(), &[], ProcessingFlags::default(), env)?;
    }
    if let Some(context_url) = &loaded.context_url {
        let local = Value::String(context_url.clone());
        ctx = ctx.process_with(&local, base_url.as_deref(), &[], ProcessingFlags::default(), env)?;
    }
    expand_document(&loaded.document, &ctx, base_url.as_deref(), frame_expansion, env)
}

/// The base IRI used for compaction: the `base` option, or else the URL of the input document.
fn context_base<L: ?Sized>(options: &JsonLdOptions<L>, input_url: Option<&str>) -> Option<BaseIri> {
    options
        .base()
        .cloned()
        .or_else(|| input_url.and_then(|url| BaseIri::new(url).ok()))
}

/// Load `context` and process it into the active context used for compaction.
///
/// Also return the local context, to be included in the compacted output.
fn compaction_context(
    context: &JsonLdInput,
    input_url: Option<&str>,
    env: &Env,
) -> Result<(ActiveContext, Value)> {
    let loaded = context.load(env)?;
    let local = match loaded.document.into_owned() {
        Value::Object(mut map) if map.contains_key("@context") => {
            map.remove("@context").unwrap_or_default()
        }
        other => other,
    };
    let base = context_base(env.options, input_url);
    let base_url = loaded
        .document_url
        .or_else(|| base.as_ref().map(|b| b.as_str().to_string()));
    let ctx = ActiveContext::new(base, env.options.processing_mode()).process_with(
        &local,
        base_url.as_deref(),
        &[],
        ProcessingFlags::default(),
        env,
    )?;
    Ok((ctx, local))
}

/// Make sure that the nodes of `compacted` are in an array under `graph_key`.
fn force_graph(compacted: Map, graph_key: &str) -> Map {
    if compacted.get(graph_key).is_some_and(Value::is_array) {
        return compacted;
    }
    let nodes = if compacted.is_empty() {
        vec![]
    } else {
        vec![Value::Object(compacted)]
    };
    let mut map = Map::new();
    map.insert(graph_key.to_string(), Value::Array(nodes));
    map
}

/// Prepend `context` to `compacted`, unless it is empty.
fn with_context(compacted: Map, context: Value) -> Value {
    let empty = match &context {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Value::Object(compacted);
    }
    let mut result = Map::new();
    result.insert("@context".into(), context);
    result.extend(compacted);
    Value::Object(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loader::{NoLoader, StaticLoader};
    use ldtk_api::nq;
    use serde_json::json;

    fn value(v: Value) -> JsonLdInput {
        JsonLdInput::Value(v)
    }

    #[test]
    fn expand_alice() {
        crate::test_setup();
        let doc = json!({
            "@context": {"name": "http://xmlns.com/foaf/0.1/name"},
            "@id": "http://example.com/Alice",
            "name": "Alice",
        });
        let got = expand(&value(doc), &JsonLdOptions::new()).unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.com/Alice",
                "http://xmlns.com/foaf/0.1/name": [{"@value": "Alice"}],
            }])
        );
    }

    #[test]
    fn expand_remote_document() {
        crate::test_setup();
        let loader = StaticLoader::new()
            .with_json(
                "http://example.org/doc",
                &json!({"@context": "ctx", "@id": "alice", "name": "Alice"}),
            )
            .with_json(
                "http://example.org/ctx",
                &json!({"@context": {"@vocab": "http://schema.org/"}}),
            );
        let options = JsonLdOptions::new().with_document_loader(loader);
        let got = expand(&JsonLdInput::Iri("http://example.org/doc".into()), &options).unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.org/alice",
                "http://schema.org/name": [{"@value": "Alice"}],
            }])
        );
    }

    #[test]
    fn loading_failures() {
        let options = JsonLdOptions::new().with_document_loader(NoLoader);
        let err = expand(&JsonLdInput::Iri("http://example.org/nope".into()), &options).unwrap_err();
        assert_eq!(err.code(), "loading document failed");
        let err = expand(&JsonLdInput::Text("{oops".into()), &options).unwrap_err();
        assert_eq!(err.code(), "loading document failed");
    }

    #[test]
    fn compact_round_trip() {
        crate::test_setup();
        let doc = json!({
            "@context": {
                "foaf": "http://xmlns.com/foaf/0.1/",
                "knows": {"@id": "foaf:knows", "@type": "@id"},
            },
            "@id": "http://example.org/alice",
            "foaf:name": "Alice",
            "knows": ["http://example.org/bob", "http://example.org/carol"],
        });
        let context = json!({"@context": {"name": "http://xmlns.com/foaf/0.1/name"}});
        let options = JsonLdOptions::new();
        let compacted = compact(&value(doc.clone()), &value(context), &options).unwrap();
        assert_eq!(
            compacted,
            json!({
                "@context": {"name": "http://xmlns.com/foaf/0.1/name"},
                "@id": "http://example.org/alice",
                "name": "Alice",
                "http://xmlns.com/foaf/0.1/knows": [
                    {"@id": "http://example.org/bob"},
                    {"@id": "http://example.org/carol"},
                ],
            })
        );
        let expanded = expand(&value(doc), &options).unwrap();
        let re_expanded = expand(&value(compacted), &options).unwrap();
        assert_eq!(expanded, re_expanded);
        let expanded_twice = expand(&value(expanded.clone()), &options).unwrap();
        assert_eq!(expanded, expanded_twice);
    }

    #[test]
    fn flatten_with_context() {
        crate::test_setup();
        let context = json!({
            "name": "http://xmlns.com/foaf/0.1/name",
            "knows": {"@id": "http://xmlns.com/foaf/0.1/knows", "@type": "@id"},
        });
        let doc = json!({
            "@context": context,
            "@id": "http://example.org/a",
            "name": "A",
            "knows": {"name": "B"},
        });
        let options = JsonLdOptions::new();
        let got = flatten(&value(doc.clone()), Some(&value(context.clone())), &options).unwrap();
        assert_eq!(
            got,
            json!({
                "@context": context,
                "@graph": [
                    {"@id": "_:b0", "name": "B"},
                    {"@id": "http://example.org/a", "name": "A", "knows": "_:b0"},
                ],
            })
        );
        let got = flatten(&value(doc), None, &options).unwrap();
        assert_eq!(got.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn frame_library() {
        crate::test_setup();
        let doc = json!({
            "@context": {"@vocab": "http://example.org/", "contains": {"@type": "@id"}},
            "@graph": [
                {"@id": "http://example.org/library", "@type": "Library", "contains": "http://example.org/book"},
                {"@id": "http://example.org/book", "@type": "Book", "title": "Odyssey", "contains": "http://example.org/chapter"},
                {"@id": "http://example.org/chapter", "@type": "Chapter", "title": "Ch. 1"},
            ],
        });
        let frame_doc = json!({
            "@context": {"@vocab": "http://example.org/"},
            "@type": "Library",
            "contains": {"@type": "Book", "contains": {"@type": "Chapter"}},
        });
        let got = frame(&value(doc), &value(frame_doc), &JsonLdOptions::new()).unwrap();
        assert_eq!(
            got,
            json!({
                "@context": {"@vocab": "http://example.org/"},
                "@id": "http://example.org/library",
                "@type": "Library",
                "contains": {
                    "@id": "http://example.org/book",
                    "@type": "Book",
                    "title": "Odyssey",
                    "contains": {
                        "@id": "http://example.org/chapter",
                        "@type": "Chapter",
                        "title": "Ch. 1",
                    },
                },
            })
        );
    }

    #[test]
    fn frame_defaults_and_graph() {
        crate::test_setup();
        let doc = json!({
            "@context": {"@vocab": "http://example.org/"},
            "@id": "http://example.org/a",
            "@type": "Person",
        });
        let frame_doc = json!({
            "@context": {"@vocab": "http://example.org/"},
            "@type": "Person",
            "name": {"@default": "anonymous"},
            "age": {},
        });
        let options = JsonLdOptions::new().with_omit_graph(false);
        let got = frame(&value(doc), &value(frame_doc), &options).unwrap();
        assert_eq!(
            got,
            json!({
                "@context": {"@vocab": "http://example.org/"},
                "@graph": [{
                    "@id": "http://example.org/a",
                    "@type": "Person",
                    "name": "anonymous",
                    "age": null,
                }],
            })
        );
    }

    #[test]
    fn rdf_round_trip() {
        crate::test_setup();
        let doc = json!({
            "@id": "http://example.org/s",
            "http://example.org/p": {"@list": [1, "x", true]},
            "http://example.org/q": {"@value": "chat", "@language": "fr"},
        });
        let options = JsonLdOptions::new().with_use_native_types(true);
        let dataset = to_rdf(&value(doc.clone()), &options).unwrap();
        assert_eq!(dataset.len(), 8);
        let back = from_rdf(&dataset, &options).unwrap();
        assert_eq!(back, expand(&value(doc), &options).unwrap());
    }

    #[test]
    fn from_rdf_nquads() {
        crate::test_setup();
        let dataset = nq::parse_str(
            "<http://example.org/s> <http://example.org/p> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
        )
        .unwrap();
        let got = from_rdf(&dataset, &JsonLdOptions::new()).unwrap();
        assert_eq!(
            got,
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/p": [{
                    "@value": "42",
                    "@type": "http://www.w3.org/2001/XMLSchema#integer",
                }],
            }])
        );
    }

    #[test]
    fn normalize_is_independent_from_labels() {
        crate::test_setup();
        let options = JsonLdOptions::new();
        let doc = |label: &str| {
            json!({
                "@id": format!("_:{label}"),
                "http://example.org/p": {"@id": "_:other", "http://example.org/q": "v"},
            })
        };
        let n1 = normalize(&value(doc("x")), &options).unwrap();
        let n2 = normalize(&value(doc("y")), &options).unwrap();
        assert_eq!(n1, n2);
        assert_eq!(n1.lines().count(), 2);
        assert!(n1.contains("_:c14n0") && n1.contains("_:c14n1"));
        assert!(!n1.contains("_:x") && !n1.contains("_:other"));
    }

    fn blank_node_graph(edges: impl Fn(usize) -> Vec<usize>) -> JsonLdInput {
        let nodes: Vec<Value> = (0..5)
            .map(|i| {
                let targets: Vec<Value> = edges(i)
                    .into_iter()
                    .map(|j| json!({"@id": format!("_:n{j}")}))
                    .collect();
                json!({"@id": format!("_:n{i}"), "http://example.com/#p": targets})
            })
            .collect();
        value(json!({"@graph": nodes}))
    }

    #[test]
    fn normalize_complexity_limits() {
        crate::test_setup();
        let clique = blank_node_graph(|i| (0..5).filter(|j| *j != i).collect());
        assert_eq!(normalize(&clique, &JsonLdOptions::new()).unwrap().lines().count(), 20);
        let options = JsonLdOptions::new().with_c14n_permutation_limit(3);
        let err = normalize(&clique, &options).unwrap_err();
        assert_eq!(err.code(), "canonicalization complexity exceeded");

        let cycle = blank_node_graph(|i| vec![(i + 1) % 5]);
        assert_eq!(normalize(&cycle, &JsonLdOptions::new()).unwrap().lines().count(), 5);
        let options = JsonLdOptions::new().with_c14n_depth_factor(0.5);
        let err = normalize(&cycle, &options).unwrap_err();
        assert_eq!(err.code(), "canonicalization complexity exceeded");
    }
}
