//! Reading and writing [N-Quads](https://www.w3.org/TR/n-quads/).
//!
//! The writer produces canonical N-Quads as defined by
//! [RDFC-1.0](https://www.w3.org/TR/rdf-canon/#canonical-quads):
//! no superfluous whitespace, and a minimal set of escape sequences in literals.
//! The reader is backed by [`rio_turtle`].
use crate::dataset::Dataset;
use crate::ns::xsd;
use crate::quad::Quad;
use crate::term::{Literal, Term};
use rio_api::model as rio;
use rio_api::parser::QuadsParser;
use rio_turtle::{NQuadsParser, TurtleError};
use std::fmt::{self, Write};
use thiserror::Error;

/// An error raised while parsing N-Quads.
#[derive(Debug, Error)]
pub enum NqError {
    /// Syntax error
    #[error("N-Quads syntax error: {0}")]
    Syntax(#[from] TurtleError),
    /// The input uses a feature (e.g. RDF-star) that is not supported
    #[error("Unsupported N-Quads feature: {0}")]
    Unsupported(String),
}

/// Write `term` in N-Quads syntax.
pub fn write_term<W: Write>(w: &mut W, term: &Term) -> fmt::Result {
    match term {
        Term::Iri(iri) => write!(w, "<{iri}>"),
        Term::BlankNode(label) => write!(w, "_:{label}"),
        Term::Literal(lit) => write_literal(w, lit),
    }
}

fn write_literal<W: Write>(w: &mut W, lit: &Literal) -> fmt::Result {
    w.write_char('"')?;
    for c in lit.lexical_form().chars() {
        match c {
            '"' => w.write_str("\\\"")?,
            '\\' => w.write_str("\\\\")?,
            '\n' => w.write_str("\\n")?,
            '\r' => w.write_str("\\r")?,
            '\t' => w.write_str("\\t")?,
            '\x08' => w.write_str("\\b")?,
            '\x0c' => w.write_str("\\f")?,
            '\x7f' => w.write_str("\\u007F")?,
            c if c <= '\x1f' => write!(w, "\\u{:04X}", c as u8)?,
            _ => w.write_char(c)?,
        }
    }
    w.write_char('"')?;
    if let Some(tag) = lit.language_tag() {
        write!(w, "@{tag}")
    } else if lit.datatype() != xsd::string {
        write!(w, "^^<{}>", lit.datatype())
    } else {
        Ok(())
    }
}

/// Write `quad` in N-Quads syntax, without the trailing newline.
pub fn write_quad<W: Write>(w: &mut W, quad: &Quad) -> fmt::Result {
    for term in quad.terms() {
        write_term(w, term)?;
        w.write_char(' ')?;
    }
    w.write_char('.')
}

/// Serialize `quad` as a complete N-Quads line (including the trailing newline).
pub fn quad_to_line(quad: &Quad) -> String {
    let mut line = String::new();
    // writing into a String can not fail
    let _ = write_quad(&mut line, quad);
    line.push('\n');
    line
}

/// Serialize `dataset` in N-Quads, one line per quad, in insertion order.
pub fn serialize(dataset: &Dataset) -> String {
    dataset.quads().map(quad_to_line).collect()
}

/// Parse an N-Quads document into a [`Dataset`].
pub fn parse_str(txt: &str) -> Result<Dataset, NqError> {
    let mut dataset = Dataset::new();
    NQuadsParser::new(txt.as_bytes()).parse_all(&mut |q: rio::Quad<'_>| -> Result<(), NqError> {
        let quad = Quad::new(
            subject(q.subject)?,
            Term::Iri(q.predicate.iri.to_string()),
            object(q.object)?,
            q.graph_name.map(graph_name),
        );
        dataset.insert(quad);
        Ok(())
    })?;
    log::debug!("parsed {} quads", dataset.len());
    Ok(dataset)
}

fn subject(s: rio::Subject) -> Result<Term, NqError> {
    match s {
        rio::Subject::NamedNode(n) => Ok(Term::Iri(n.iri.to_string())),
        rio::Subject::BlankNode(b) => Ok(Term::BlankNode(b.id.to_string())),
        rio::Subject::Triple(t) => Err(NqError::Unsupported(format!("quoted triple {t}"))),
    }
}

fn object(o: rio::Term) -> Result<Term, NqError> {
    match o {
        rio::Term::NamedNode(n) => Ok(Term::Iri(n.iri.to_string())),
        rio::Term::BlankNode(b) => Ok(Term::BlankNode(b.id.to_string())),
        rio::Term::Literal(rio::Literal::Simple { value }) => {
            Ok(Term::Literal(Literal::new_simple(value)))
        }
        rio::Term::Literal(rio::Literal::LanguageTaggedString { value, language }) => {
            Ok(Term::Literal(Literal::new_lang_unchecked(value, language)))
        }
        rio::Term::Literal(rio::Literal::Typed { value, datatype }) => {
            Ok(Term::Literal(Literal::new_dt(value, datatype.iri)))
        }
        rio::Term::Triple(t) => Err(NqError::Unsupported(format!("quoted triple {t}"))),
    }
}

fn graph_name(g: rio::GraphName) -> Term {
    match g {
        rio::GraphName::NamedNode(n) => Term::Iri(n.iri.to_string()),
        rio::GraphName::BlankNode(b) => Term::BlankNode(b.id.to_string()),
    }
}
