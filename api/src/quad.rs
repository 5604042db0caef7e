//! I define the [`Quad`] type.
//!
//! A quad is a triple (subject, predicate, object)
//! together with an optional graph name (`None` for the default graph).
use crate::term::Term;
use std::fmt;

/// An RDF quad.
///
/// Quads are not checked for well-formedness:
/// generalized quads (e.g. with a blank node as predicate) can be represented.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Quad {
    /// The subject of this quad
    pub subject: Term,
    /// The predicate of this quad
    pub predicate: Term,
    /// The object of this quad
    pub object: Term,
    /// The graph name of this quad (`None` for the default graph)
    pub graph_name: Option<Term>,
}

impl Quad {
    /// Build a new quad.
    pub fn new(subject: Term, predicate: Term, object: Term, graph_name: Option<Term>) -> Self {
        Quad {
            subject,
            predicate,
            object,
            graph_name,
        }
    }

    /// The subject of this quad.
    pub fn s(&self) -> &Term {
        &self.subject
    }

    /// The predicate of this quad.
    pub fn p(&self) -> &Term {
        &self.predicate
    }

    /// The object of this quad.
    pub fn o(&self) -> &Term {
        &self.object
    }

    /// The graph name of this quad.
    pub fn g(&self) -> Option<&Term> {
        self.graph_name.as_ref()
    }

    /// Iterate over the (three or four) terms of this quad.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .chain(self.graph_name.as_ref())
    }

    /// Apply `f` to every term of this quad, producing a new quad.
    pub fn map_terms<F: FnMut(&Term) -> Term>(&self, mut f: F) -> Quad {
        Quad {
            subject: f(&self.subject),
            predicate: f(&self.predicate),
            object: f(&self.object),
            graph_name: self.graph_name.as_ref().map(f),
        }
    }
}

/// Quads are displayed as N-Quads lines, without the trailing newline.
impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::nq::write_quad(f, self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn terms() {
        let s = Term::new_bnode_unchecked("s");
        let p = Term::new_iri_unchecked("http://example.org/p");
        let o = Term::new_bnode_unchecked("o");
        let q = Quad::new(s.clone(), p.clone(), o.clone(), None);
        assert_eq!(q.terms().count(), 3);
        let g = Term::new_iri_unchecked("http://example.org/g");
        let q = Quad::new(s, p, o, Some(g.clone()));
        assert_eq!(q.terms().count(), 4);
        assert_eq!(q.g(), Some(&g));
    }

    #[test]
    fn map_terms() {
        let q = Quad::new(
            Term::new_bnode_unchecked("a"),
            Term::new_iri_unchecked("http://example.org/p"),
            Term::new_bnode_unchecked("b"),
            Some(Term::new_bnode_unchecked("c")),
        );
        let q2 = q.map_terms(|t| match t {
            Term::BlankNode(label) => Term::new_bnode_unchecked(label.to_uppercase()),
            _ => t.clone(),
        });
        assert_eq!(q2.to_string(), "_:A <http://example.org/p> _:B _:C .");
    }
}
