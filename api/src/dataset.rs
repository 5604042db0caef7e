//! I define the [`Dataset`] type, an insertion-ordered set of [quads](Quad).
use crate::quad::Quad;
use crate::term::Term;
use indexmap::IndexSet;

/// An RDF dataset: a default graph and any number of named graphs.
///
/// Quads are kept in insertion order, and inserting a quad that is already present
/// (by structural equality of its four components) is a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    quads: IndexSet<Quad>,
}

impl Dataset {
    /// Build an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quad in this dataset.
    ///
    /// Return `true` if the quad was not already present.
    pub fn insert(&mut self, quad: Quad) -> bool {
        self.quads.insert(quad)
    }

    /// Insert the quad (s, p, o, g) in this dataset.
    ///
    /// Return `true` if the quad was not already present.
    pub fn insert_spog(&mut self, s: Term, p: Term, o: Term, g: Option<Term>) -> bool {
        self.insert(Quad::new(s, p, o, g))
    }

    /// Whether this dataset contains `quad`.
    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    /// The number of quads in this dataset.
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Whether this dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Iterate over all quads, in insertion order.
    pub fn quads(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Iterate over the quads of the given graph (`None` for the default graph), in insertion order.
    pub fn graph<'a>(&'a self, graph_name: Option<&'a Term>) -> impl Iterator<Item = &'a Quad> {
        self.quads.iter().filter(move |q| q.g() == graph_name)
    }

    /// The names of the named graphs of this dataset, in order of first appearance.
    pub fn graph_names(&self) -> IndexSet<&Term> {
        self.quads.iter().filter_map(Quad::g).collect()
    }
}

impl Extend<Quad> for Dataset {
    fn extend<T: IntoIterator<Item = Quad>>(&mut self, iter: T) {
        self.quads.extend(iter)
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<T: IntoIterator<Item = Quad>>(iter: T) -> Self {
        Dataset {
            quads: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Quad;
    type IntoIter = indexmap::set::Iter<'a, Quad>;
    fn into_iter(self) -> Self::IntoIter {
        self.quads.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn iri(suffix: &str) -> Term {
        Term::new_iri_unchecked(format!("http://example.org/{suffix}"))
    }

    #[test]
    fn insert_dedup() {
        let mut d = Dataset::new();
        assert!(d.is_empty());
        assert!(d.insert_spog(iri("s"), iri("p"), iri("o"), None));
        assert!(!d.insert_spog(iri("s"), iri("p"), iri("o"), None));
        assert!(d.insert_spog(iri("s"), iri("p"), iri("o"), Some(iri("g"))));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn insertion_order() {
        let mut d = Dataset::new();
        d.insert_spog(iri("b"), iri("p"), iri("o"), None);
        d.insert_spog(iri("a"), iri("p"), iri("o"), Some(iri("g2")));
        d.insert_spog(iri("c"), iri("p"), iri("o"), Some(iri("g1")));
        d.insert_spog(iri("a"), iri("p"), iri("o"), None);
        let subjects: Vec<_> = d.graph(None).map(|q| q.s().clone()).collect();
        assert_eq!(subjects, vec![iri("b"), iri("a")]);
        let names: Vec<_> = d.graph_names().into_iter().cloned().collect();
        assert_eq!(names, vec![iri("g2"), iri("g1")]);
    }
}
