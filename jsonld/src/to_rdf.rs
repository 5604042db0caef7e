//! [Deserialization of JSON-LD to RDF](https://www.w3.org/TR/json-ld11-api/#deserialize-json-ld-to-rdf-algorithm).

use ldtk_api::ns::{i18n, rdf, xsd};
use ldtk_api::{Dataset, Literal, Term};
use serde_json::{Number, Value};

use crate::error::Result;
use crate::node_map::{BlankNodeIssuer, NodeMap};
use crate::options::{JsonLdOptions, RdfDirection};
use crate::util::*;

/// Build the RDF dataset described by `node_map`.
///
/// `issuer` must be the one used to build `node_map`,
/// so that blank nodes created for lists do not clash with existing ones.
pub(crate) fn node_map_to_rdf<L: ?Sized>(
    node_map: &NodeMap,
    issuer: &mut BlankNodeIssuer,
    options: &JsonLdOptions<L>,
) -> Result<Dataset> {
    let converter = Converter {
        generalized: options.produce_generalized_rdf(),
        rdf_direction: options.rdf_direction(),
    };
    let mut dataset = Dataset::new();
    for (graph_name, graph) in node_map.graphs() {
        let graph_term = match graph_name {
            "@default" => None,
            name => match converter.node_term(name) {
                Some(term) => Some(term),
                None => {
                    log::debug!("skipping graph with relative name {name}");
                    continue;
                }
            },
        };
        for (subject, node) in graph {
            let Some(subject) = converter.node_term(subject) else {
                log::debug!("skipping node with relative identifier {subject}");
                continue;
            };
            for (property, values) in node {
                if property == "@type" {
                    for t in as_array(values).iter().filter_map(Value::as_str) {
                        if let Some(t) = converter.node_term(t) {
                            let p = Term::new_iri_unchecked(rdf::type_);
                            dataset.insert_spog(subject.clone(), p, t, graph_term.clone());
                        }
                    }
                    continue;
                }
                if property.starts_with('@') {
                    continue;
                }
                let predicate = match converter.node_term(property) {
                    Some(Term::BlankNode(_)) if !converter.generalized => continue,
                    Some(p) => p,
                    None => {
                        log::debug!("skipping relative property {property}");
                        continue;
                    }
                };
                for item in as_array(values) {
                    let mut triples = vec![];
                    if let Some(object) = converter.object_to_rdf(item, &mut triples, issuer)? {
                        dataset.insert_spog(
                            subject.clone(),
                            predicate.clone(),
                            object,
                            graph_term.clone(),
                        );
                    }
                    for [s, p, o] in triples {
                        dataset.insert_spog(s, p, o, graph_term.clone());
                    }
                }
            }
        }
    }
    Ok(dataset)
}

struct Converter {
    generalized: bool,
    rdf_direction: Option<RdfDirection>,
}

impl Converter {
    /// The term for a node identifier, or None if it is a relative IRI.
    fn node_term(&self, id: &str) -> Option<Term> {
        if let Some(label) = id.strip_prefix("_:") {
            Some(Term::new_bnode_unchecked(label))
        } else if ldtk_iri::is_absolute_iri(id) {
            Some(Term::new_iri_unchecked(id))
        } else {
            None
        }
    }

    /// [Object to RDF conversion](https://www.w3.org/TR/json-ld11-api/#object-to-rdf-conversion)
    fn object_to_rdf(
        &self,
        item: &Value,
        triples: &mut Vec<[Term; 3]>,
        issuer: &mut BlankNodeIssuer,
    ) -> Result<Option<Term>> {
        let Value::Object(item) = item else {
            return Ok(None);
        };
        if let Some(items) = item.get("@list") {
            return self.list_to_rdf(as_array(items), triples, issuer).map(Some);
        }
        let Some(value) = item.get("@value") else {
            return Ok(item
                .get("@id")
                .and_then(Value::as_str)
                .and_then(|id| self.node_term(id)));
        };
        let mut datatype = item.get("@type").and_then(Value::as_str).map(str::to_string);
        if let Some(dt) = &datatype {
            if dt != "@json" && !ldtk_iri::is_absolute_iri(dt) {
                log::debug!("skipping value with relative datatype {dt}");
                return Ok(None);
            }
        }
        let language = item.get("@language").and_then(Value::as_str);
        if let Some(tag) = language {
            if !ldtk_api::term::is_valid_language_tag(tag) {
                log::warn!("skipping value with invalid language tag {tag}");
                return Ok(None);
            }
        }
        let lexical = if datatype.as_deref() == Some("@json") {
            datatype = Some(rdf::JSON.to_string());
            ldtk_c14n::json::canonicalize(value)?
        } else {
            match value {
                Value::Bool(b) => {
                    datatype.get_or_insert_with(|| xsd::boolean.to_string());
                    b.to_string()
                }
                Value::Number(n) => {
                    let is_double = datatype.as_deref() == Some(xsd::double);
                    match integer_form(n) {
                        Some(txt) if !is_double => {
                            datatype.get_or_insert_with(|| xsd::integer.to_string());
                            txt
                        }
                        _ => {
                            datatype.get_or_insert_with(|| xsd::double.to_string());
                            canonical_double(n.as_f64().unwrap_or_default())
                        }
                    }
                }
                Value::String(txt) => txt.clone(),
                _ => return Ok(None),
            }
        };

        let direction = item.get("@direction").and_then(Value::as_str);
        let literal = match (direction, self.rdf_direction) {
            (Some(dir), Some(RdfDirection::I18nDatatype)) => {
                let tag = language.unwrap_or_default().to_ascii_lowercase();
                Literal::new_dt(lexical, format!("{}{tag}_{dir}", i18n::PREFIX))
            }
            (Some(dir), Some(RdfDirection::CompoundLiteral)) => {
                let node = fresh_bnode(issuer);
                triples.push([
                    node.clone(),
                    Term::new_iri_unchecked(rdf::value),
                    Term::Literal(Literal::new_simple(lexical)),
                ]);
                if let Some(tag) = language {
                    triples.push([
                        node.clone(),
                        Term::new_iri_unchecked(rdf::language),
                        Term::Literal(Literal::new_simple(tag.to_ascii_lowercase())),
                    ]);
                }
                triples.push([
                    node.clone(),
                    Term::new_iri_unchecked(rdf::direction),
                    Term::Literal(Literal::new_simple(dir)),
                ]);
                return Ok(Some(node));
            }
            _ => match (language, datatype) {
                (Some(tag), _) => Literal::new_lang_unchecked(lexical, tag),
                (None, Some(dt)) => Literal::new_dt(lexical, dt),
                (None, None) => Literal::new_simple(lexical),
            },
        };
        Ok(Some(Term::Literal(literal)))
    }

    /// [List conversion](https://www.w3.org/TR/json-ld11-api/#list-to-rdf-conversion)
    fn list_to_rdf(
        &self,
        items: &[Value],
        triples: &mut Vec<[Term; 3]>,
        issuer: &mut BlankNodeIssuer,
    ) -> Result<Term> {
        let nodes: Vec<Term> = items
            .iter()
            .map(|_| fresh_bnode(issuer))
            .collect();
        let nil = Term::new_iri_unchecked(rdf::nil);
        for (i, item) in items.iter().enumerate() {
            let node = nodes[i].clone();
            let mut embedded = vec![];
            if let Some(object) = self.object_to_rdf(item, &mut embedded, issuer)? {
                triples.push([node.clone(), Term::new_iri_unchecked(rdf::first), object]);
            }
            triples.append(&mut embedded);
            let rest = nodes.get(i + 1).cloned().unwrap_or_else(|| nil.clone());
            triples.push([node, Term::new_iri_unchecked(rdf::rest), rest]);
        }
        Ok(nodes.into_iter().next().unwrap_or(nil))
    }
}

fn fresh_bnode(issuer: &mut BlankNodeIssuer) -> Term {
    let id = issuer.fresh();
    Term::new_bnode_unchecked(id.strip_prefix("_:").unwrap_or(&id))
}

/// The `xsd:integer` lexical form of `n`, if it is integral and below 10^21.
fn integer_form(n: &Number) -> Option<String> {
    if n.is_i64() || n.is_u64() {
        return Some(n.to_string());
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f.abs() < 1e21).then(|| format!("{f:.0}"))
}

/// The canonical `xsd:double` lexical form of `f`, e.g. `1.1E0` or `-2.5E-7`.
pub(crate) fn canonical_double(f: f64) -> String {
    let txt = format!("{f:.15E}");
    let Some((mantissa, exponent)) = txt.split_once('E') else {
        return txt;
    };
    let mantissa = mantissa.trim_end_matches('0');
    let mantissa = match mantissa.strip_suffix('.') {
        Some(int) => format!("{int}.0"),
        None => mantissa.to_string(),
    };
    format!("{mantissa}E{exponent}")
}

#[cfg(test)]
mod test {
    use super::*;
    use ldtk_api::nq;
    use serde_json::json;
    use test_case::test_case;

    fn to_nquads(expanded: Value, options: &JsonLdOptions) -> String {
        let mut issuer = BlankNodeIssuer::default();
        let node_map = NodeMap::build(into_array(expanded), &mut issuer).unwrap();
        let dataset = node_map_to_rdf(&node_map, &mut issuer, options).unwrap();
        nq::serialize(&dataset)
    }

    #[test_case(1.1, "1.1E0")]
    #[test_case(0.0, "0.0E0")]
    #[test_case(-2.5e-7, "-2.5E-7")]
    #[test_case(1e21, "1.0E21")]
    #[test_case(123456.789, "1.23456789E5")]
    fn doubles(f: f64, expected: &str) {
        assert_eq!(canonical_double(f), expected);
    }

    #[test]
    fn literals() {
        let got = to_nquads(
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/p": [
                    {"@value": "plain"},
                    {"@value": "chat", "@language": "fr"},
                    {"@value": true},
                    {"@value": 42},
                    {"@value": 5.0},
                    {"@value": 2.5},
                    {"@value": 3, "@type": "http://www.w3.org/2001/XMLSchema#double"},
                    {"@value": {"b": 1, "a": [true]}, "@type": "@json"},
                ],
            }]),
            &JsonLdOptions::new(),
        );
        let s = "<http://example.org/s> <http://example.org/p>";
        let expected = [
            format!("{s} \"plain\" ."),
            format!("{s} \"chat\"@fr ."),
            format!("{s} \"true\"^^<{}> .", xsd::boolean),
            format!("{s} \"42\"^^<{}> .", xsd::integer),
            format!("{s} \"5\"^^<{}> .", xsd::integer),
            format!("{s} \"2.5E0\"^^<{}> .", xsd::double),
            format!("{s} \"3.0E0\"^^<{}> .", xsd::double),
            format!("{s} \"{{\\\"a\\\":[true],\\\"b\\\":1}}\"^^<{}> .", rdf::JSON),
        ];
        for line in expected {
            assert!(got.contains(&line), "{line} not in\n{got}");
        }
    }

    #[test]
    fn lists() {
        let got = to_nquads(
            json!([{
                "@id": "http://example.org/s",
                "http://example.org/p": [{"@list": [{"@value": "a"}, {"@id": "http://example.org/o"}]}],
                "http://example.org/q": [{"@list": []}],
            }]),
            &JsonLdOptions::new(),
        );
        let expected = format!(
            "<http://example.org/s> <http://example.org/p> _:b0 .\n\
             _:b0 <{first}> \"a\" .\n\
             _:b0 <{rest}> _:b1 .\n\
             _:b1 <{first}> <http://example.org/o> .\n\
             _:b1 <{rest}> <{nil}> .\n\
             <http://example.org/s> <http://example.org/q> <{nil}> .\n",
            first = rdf::first,
            rest = rdf::rest,
            nil = rdf::nil,
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn relative_iris_and_bnode_predicates_are_skipped() {
        let doc = json!([{
            "@id": "http://example.org/s",
            "relative": [{"@value": 1}],
            "_:p": [{"@value": 2}],
            "http://example.org/p": [{"@id": "relative"}, {"@value": "x", "@language": "not a tag"}],
        }]);
        assert_eq!(to_nquads(doc.clone(), &JsonLdOptions::new()), "");
        let got = to_nquads(doc, &JsonLdOptions::new().with_produce_generalized_rdf(true));
        assert_eq!(
            got,
            format!("<http://example.org/s> _:b0 \"2\"^^<{}> .\n", xsd::integer)
        );
    }

    #[test]
    fn directions() {
        let doc = json!([{
            "@id": "http://example.org/s",
            "http://example.org/p": [{"@value": "abc", "@language": "en-US", "@direction": "rtl"}],
        }]);
        let got = to_nquads(doc.clone(), &JsonLdOptions::new());
        assert_eq!(got, "<http://example.org/s> <http://example.org/p> \"abc\"@en-US .\n");

        let options = JsonLdOptions::new().with_rdf_direction(RdfDirection::I18nDatatype);
        let got = to_nquads(doc.clone(), &options);
        assert_eq!(
            got,
            "<http://example.org/s> <http://example.org/p> \"abc\"^^<https://www.w3.org/ns/i18n#en-us_rtl> .\n"
        );

        let options = JsonLdOptions::new().with_rdf_direction(RdfDirection::CompoundLiteral);
        let got = to_nquads(doc, &options);
        assert_eq!(
            got,
            format!(
                "<http://example.org/s> <http://example.org/p> _:b0 .\n\
                 _:b0 <{}> \"abc\" .\n\
                 _:b0 <{}> \"en-us\" .\n\
                 _:b0 <{}> \"rtl\" .\n",
                rdf::value,
                rdf::language,
                rdf::direction,
            )
        );
    }

    #[test]
    fn named_graphs() {
        let got = to_nquads(
            json!([{
                "@id": "http://example.org/g",
                "@graph": [{"@id": "http://example.org/s", "@type": ["http://example.org/T"]}],
            }]),
            &JsonLdOptions::new(),
        );
        assert_eq!(
            got,
            format!(
                "<http://example.org/s> <{}> <http://example.org/T> <http://example.org/g> .\n",
                rdf::type_
            )
        );
    }
}
