//! RDF terms.
//!
//! A [`Term`] is either an IRI, a blank node or a [`Literal`].
//! Terms are plain owned values, compared and hashed structurally,
//! and totally ordered (IRIs first, then blank nodes, then literals)
//! so that collections of terms can be sorted deterministically.
use std::fmt;
use thiserror::Error;

mod base_direction;
pub use base_direction::*;
mod bnode_id;
pub use bnode_id::*;
mod language_tag;
pub use language_tag::*;
mod literal;
pub use literal::*;

/// An RDF term.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Term {
    /// An absolute IRI
    Iri(String),
    /// A blank node, identified by its label (without the leading `_:`)
    BlankNode(String),
    /// A literal
    Literal(Literal),
}

/// The different kinds of [`Term`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TermKind {
    /// An IRI
    Iri,
    /// A blank node
    BlankNode,
    /// A literal
    Literal,
}

impl Term {
    /// Build an IRI term, checking that `iri` is a valid absolute IRI.
    pub fn new_iri<T: Into<String>>(iri: T) -> Result<Self, TermError> {
        let iri = iri.into();
        if ldtk_iri::is_valid_iri(&iri) {
            Ok(Term::Iri(iri))
        } else {
            Err(TermError::InvalidIri(iri))
        }
    }

    /// Build an IRI term without checking its validity.
    pub fn new_iri_unchecked<T: Into<String>>(iri: T) -> Self {
        Term::Iri(iri.into())
    }

    /// Build a blank node from its label (without the leading `_:`),
    /// checking that it complies with the N-Quads `BLANK_NODE_LABEL` rule.
    pub fn new_bnode<T: Into<String>>(label: T) -> Result<Self, TermError> {
        let label = label.into();
        if is_valid_bnode_id(&label) {
            Ok(Term::BlankNode(label))
        } else {
            Err(TermError::InvalidBnodeId(label))
        }
    }

    /// Build a blank node from its label without checking its validity.
    pub fn new_bnode_unchecked<T: Into<String>>(label: T) -> Self {
        Term::BlankNode(label.into())
    }

    /// Build a literal with the given lexical form and datatype.
    pub fn new_literal_dt<T: Into<String>, U: Into<String>>(lex: T, datatype: U) -> Self {
        Term::Literal(Literal::new_dt(lex, datatype))
    }

    /// Build a language tagged string, checking the validity of the language tag.
    pub fn new_literal_lang<T: Into<String>, U: Into<String>>(
        lex: T,
        tag: U,
    ) -> Result<Self, TermError> {
        Literal::new_lang(lex, tag).map(Term::Literal)
    }

    /// The kind of this term.
    pub fn kind(&self) -> TermKind {
        match self {
            Term::Iri(_) => TermKind::Iri,
            Term::BlankNode(_) => TermKind::BlankNode,
            Term::Literal(_) => TermKind::Literal,
        }
    }

    /// Whether this term is an IRI.
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    /// Whether this term is a blank node.
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Whether this term is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// The IRI of this term, if it is an IRI.
    pub fn iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The label of this term, if it is a blank node.
    pub fn bnode_id(&self) -> Option<&str> {
        match self {
            Term::BlankNode(label) => Some(label),
            _ => None,
        }
    }

    /// The literal, if this term is one.
    pub fn literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Whether this term is the IRI `iri`.
    pub fn is(&self, iri: &str) -> bool {
        self.iri() == Some(iri)
    }
}

/// Terms are displayed in their N-Quads form.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::nq::write_term(f, self)
    }
}

/// This error is raised when building an invalid [`Term`].
#[derive(Debug, Error)]
pub enum TermError {
    /// The given IRI is not a valid absolute IRI
    #[error("The given IRI '{0}' is not valid")]
    InvalidIri(String),
    /// The given blank node identifier is not valid
    #[error("The given blank node identifier '{0}' does not comply with BLANK_NODE_LABEL")]
    InvalidBnodeId(String),
    /// The given language tag is not valid
    #[error("The given language tag '{0}' is not BCP47-compliant")]
    InvalidLanguageTag(String),
}
