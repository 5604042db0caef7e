//! I provide the implementation of the RDFC-1.0 algorithm described at
//! <https://www.w3.org/TR/rdf-canon/>
//!
//! RDFC-1.0 is identical to URDNA2015 when used with [SHA-256](Sha256).

use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;

use ldtk_api::nq::{quad_to_line, write_term};
use ldtk_api::{Dataset, Quad, Term};

use crate::_permutations::for_each_permutation_of;
use crate::hash::{hex, HashFunction, Sha256, Sha384};
use crate::{C14nError, Result};

/// Write into `w` a canonical N-quads representation of `d`, where
/// + blank nodes are canonically [relabelled](relabel) with
///   - the [SHA-256](Sha256) hash function,
///   - the [`DEFAULT_DEPTH_FACTOR`],
///   - the [`DEFAULT_PERMUTATION_LIMIT`];
/// + quads are sorted in codepoint order.
///
/// See also [`normalize_with`].
pub fn normalize<W: io::Write>(d: &Dataset, w: W) -> Result<()> {
    normalize_with::<Sha256, W>(d, w, DEFAULT_DEPTH_FACTOR, DEFAULT_PERMUTATION_LIMIT)
}

/// Write into `w` a canonical N-quads representation of `d`, where
/// + blank nodes are canonically [relabelled](relabel_sha384) with
///   - the [SHA-384](Sha384) hash function,
///   - the [`DEFAULT_DEPTH_FACTOR`],
///   - the [`DEFAULT_PERMUTATION_LIMIT`];
/// + quads are sorted in codepoint order.
///
/// See also [`normalize_with`].
pub fn normalize_sha384<W: io::Write>(d: &Dataset, w: W) -> Result<()> {
    normalize_with::<Sha384, W>(d, w, DEFAULT_DEPTH_FACTOR, DEFAULT_PERMUTATION_LIMIT)
}

/// Write into `w` a canonical N-quads representation of `d`, where
/// + blank nodes are canonically [relabelled](relabel_with) with
///   - the [hash function](HashFunction) `H`,
///   - the given `depth_factor`,
///   - the given `permutation_limit`;
/// + quads are sorted in codepoint order.
///
/// See also [`normalize`].
pub fn normalize_with<H: HashFunction, W: io::Write>(
    d: &Dataset,
    mut w: W,
    depth_factor: f32,
    permutation_limit: usize,
) -> Result<()> {
    let txt = canonical_nquads::<H>(d, depth_factor, permutation_limit)?;
    w.write_all(txt.as_bytes())?;
    Ok(())
}

/// Return the canonical N-Quads serialization of `d` as a string.
///
/// See [`normalize_with`] for the meaning of the parameters.
pub fn canonical_nquads<H: HashFunction>(
    d: &Dataset,
    depth_factor: f32,
    permutation_limit: usize,
) -> Result<String> {
    let (quads, _) = relabel_with::<H>(d, depth_factor, permutation_limit)?;
    let mut lines: Vec<String> = quads.iter().map(quad_to_line).collect();
    // UTF-8 byte order is the same as code point order
    lines.sort_unstable();
    Ok(lines.concat())
}

/// Return the quads of `d` with canonical blank node labels,
/// paired with a mapping from original blank node labels to canonical ones.
///
/// This calls [`relabel_with`] with
///   - the [SHA-256](Sha256) hash function,
///   - the [`DEFAULT_DEPTH_FACTOR`],
///   - the [`DEFAULT_PERMUTATION_LIMIT`].
///
/// Implements <https://www.w3.org/TR/rdf-canon/#canon-algorithm>
///
/// See also [`normalize`].
pub fn relabel(d: &Dataset) -> Result<(Vec<Quad>, C14nIdMap)> {
    relabel_with::<Sha256>(d, DEFAULT_DEPTH_FACTOR, DEFAULT_PERMUTATION_LIMIT)
}

/// Same as [`relabel`], but with the [SHA-384](Sha384) hash function.
pub fn relabel_sha384(d: &Dataset) -> Result<(Vec<Quad>, C14nIdMap)> {
    relabel_with::<Sha384>(d, DEFAULT_DEPTH_FACTOR, DEFAULT_PERMUTATION_LIMIT)
}

/// Return the quads of `d` with canonical blank node labels,
/// paired with a mapping from original blank node labels to canonical ones.
///
/// The generic parameter `H` determines which [hash function](HashFunction)
/// the algorithm should use internally
/// (RDFC-1.0 uses [SHA-256](Sha256) by default).
///
/// The parameters `depth_factor` and `permutation_limit`
/// are used to stop the algorithm if the computation becomes too complex,
/// in order to secure it against [dataset poisoning](https://www.w3.org/TR/rdf-canon/#dataset-poisoning).
/// The default values ([`DEFAULT_DEPTH_FACTOR`]) and [`DEFAULT_PERMUTATION_LIMIT`])
/// are expected to work with any "realistic" dataset.
///
/// More precisely:
/// * the algorithm will not recurse more deeply than `depth_factor`*N,
///   where N is the total number of blank nodes in the dataset;
/// * the algorithm will not try to disambiguate more than
///   `permutation_limit` undistinguishable blank nodes
///   (blank nodes with the same immediate neighbourhood).
///
/// Exceeding either limit fails with [`C14nError::ComplexityExceeded`].
///
/// Implements <https://www.w3.org/TR/rdf-canon/#canon-algorithm>
pub fn relabel_with<H: HashFunction>(
    d: &Dataset,
    depth_factor: f32,
    permutation_limit: usize,
) -> Result<(Vec<Quad>, C14nIdMap)> {
    // Step 1
    let mut state = C14nState::<H>::new(depth_factor, permutation_limit);
    // Step 2
    for quad in d.quads() {
        if !quad.p().is_iri() {
            return Err(C14nError::Unsupported(format!(
                "RDFC-1.0 only supports IRIs as predicates, found {}",
                quad.p()
            )));
        }
        for component in quad.terms() {
            if let Some(bnid) = component.bnode_id() {
                let entry = state.b2q.entry(Rc::from(bnid)).or_default();
                // a blank node may appear several times in the same quad
                if !entry.last().is_some_and(|q| std::ptr::eq(*q, quad)) {
                    entry.push(quad);
                }
            }
        }
    }
    // Step 3
    for (bnid, quads) in &state.b2q {
        let hash = hash_first_degree_quads::<H>(bnid, &quads[..]);
        state.h2b.entry(hash).or_default().push(bnid.clone());
        state.b2h.insert(bnid.clone(), hash);
    }
    // Step 4
    // NB: we are relying on the fact that BTreeMap's elements are sorted
    let mut next_h2b = BTreeMap::new();
    for (hash, bnids) in std::mem::take(&mut state.h2b) {
        debug_assert!(!bnids.is_empty());
        if bnids.len() > 1 {
            next_h2b.insert(hash, bnids);
        } else {
            state.canonical.issue(&bnids[0]);
        }
    }
    // Step 5
    for identifier_list in next_h2b.values() {
        let mut hash_path_list = vec![];
        // Step 5.2
        for i in identifier_list {
            if state.canonical.issued.contains_key(i) {
                continue;
            }
            let mut issuer = BnodeIssuer::new("b");
            issuer.issue(i);
            hash_path_list.push(state.hash_n_degree_quads(i, &issuer, 0)?);
        }
        // Step 5.3
        hash_path_list.sort_by_key(|p| p.0);
        for (_, issuer) in hash_path_list {
            for bnid in issuer.issued_order {
                state.canonical.issue(&bnid);
            }
        }
    }
    // Step 6
    let issued = state.canonical.issued;
    let quads = d
        .quads()
        .map(|q| {
            q.map_terms(|t| match t {
                Term::BlankNode(bnid) => match issued.get(bnid.as_str()) {
                    Some(canon_id) => Term::BlankNode(canon_id.to_string()),
                    None => t.clone(),
                },
                _ => t.clone(),
            })
        })
        .collect();
    Ok((quads, issued))
}

/// The default value of `depth_factor` in [`normalize`] and [`relabel`].
pub const DEFAULT_DEPTH_FACTOR: f32 = 1.0;

/// The default value of `permutation_limit` in [`normalize`] and [`relabel`].
pub const DEFAULT_PERMUTATION_LIMIT: usize = 6;

/// An identifier map as returned by [`relabel`] and [`relabel_with`]
pub type C14nIdMap = BTreeMap<Rc<str>, Rc<str>>;

#[derive(Clone, Debug)]
struct C14nState<'a, H: HashFunction> {
    b2q: BTreeMap<Rc<str>, Vec<&'a Quad>>,
    h2b: BTreeMap<H::Output, Vec<Rc<str>>>,
    canonical: BnodeIssuer,
    /// Memoized results of hash-first-degree-quads
    b2h: BTreeMap<Rc<str>, H::Output>,
    /// Maximum recursion factor in `hash_n_degree_quads`
    depth_factor: f32,
    /// Maximum number of nodes on which permutations will be computed
    permutation_limit: usize,
}

impl<'a, H: HashFunction> C14nState<'a, H> {
    fn new(depth_factor: f32, permutation_limit: usize) -> Self {
        C14nState {
            b2q: BTreeMap::new(),
            h2b: BTreeMap::new(),
            canonical: BnodeIssuer::new("c14n"),
            b2h: BTreeMap::new(),
            depth_factor,
            permutation_limit,
        }
    }

    /// Implements <https://www.w3.org/TR/rdf-canon/#hash-related-blank-node>
    fn hash_related_bnode(
        &self,
        related: &str,
        quad: &Quad,
        issuer: &BnodeIssuer,
        position: &str,
    ) -> H::Output {
        let mut input = H::initialize();
        input.update(position.as_bytes());
        if position != "g" {
            input.update(b"<");
            input.update(quad.p().iri().unwrap_or_default().as_bytes());
            input.update(b">");
        }
        if let Some(canon_id) = self.canonical.issued.get(related) {
            input.update(b"_:");
            input.update(canon_id.as_bytes());
        } else if let Some(temp_id) = issuer.issued.get(related) {
            input.update(b"_:");
            input.update(temp_id.as_bytes());
        } else if let Some(h1d) = self.b2h.get(related) {
            input.update(hex(h1d).as_bytes());
        }
        input.finalize()
    }

    /// Implements <https://www.w3.org/TR/rdf-canon/#hash-nd-quads>
    fn hash_n_degree_quads(
        &self,
        identifier: &str,
        issuer: &BnodeIssuer,
        depth: usize,
    ) -> Result<(H::Output, BnodeIssuer)> {
        if depth as f32 > self.depth_factor * self.b2q.len() as f32 {
            return Err(C14nError::ComplexityExceeded(format!(
                "too many recursions (limit={} per bnode)",
                self.depth_factor
            )));
        }
        // Step 1
        let mut hn = BTreeMap::<H::Output, Vec<Rc<str>>>::new();
        // Step 2
        let quads = self.b2q.get(identifier).map(Vec::as_slice).unwrap_or_default();
        // Step 3
        for quad in quads {
            for (component, position) in quad.terms().zip(["s", "p", "o", "g"]) {
                if let Some(bnid) = component.bnode_id() {
                    if bnid == identifier {
                        continue;
                    }
                    let hash = self.hash_related_bnode(bnid, quad, issuer, position);
                    hn.entry(hash).or_default().push(Rc::from(bnid));
                }
            }
        }
        // Step 4
        let mut data_to_hash = H::initialize();
        // Step 5
        let mut ret_issuer: Option<BnodeIssuer> = None;
        for (related_hash, mut blank_node) in hn {
            data_to_hash.update(hex(&related_hash));
            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<BnodeIssuer> = None;
            // Step 5.4
            if blank_node.len() > self.permutation_limit {
                return Err(C14nError::ComplexityExceeded(format!(
                    "too many permutations ({} nodes, limit set to {})",
                    blank_node.len(),
                    self.permutation_limit,
                )));
            }
            for_each_permutation_of(&mut blank_node, |p| -> Result<()> {
                let mut issuer_copy = ret_issuer.as_ref().unwrap_or(issuer).clone();
                let mut path = String::new();
                let mut recursion_list = vec![];
                // Step 5.4.4
                for related in p {
                    if let Some(canon_id) = self.canonical.issued.get(related) {
                        path.push_str("_:");
                        path.push_str(canon_id);
                    } else {
                        let (id, new) = issuer_copy.issue(related);
                        path.push_str("_:");
                        path.push_str(id);
                        if new {
                            recursion_list.push(related.clone());
                        }
                    }
                    if skip_path(&chosen_path, &path) {
                        return Ok(()); // skip to the next permutation
                    }
                }
                // Step 5.4.5
                for related in recursion_list {
                    let result = self.hash_n_degree_quads(&related, &issuer_copy, depth + 1)?;
                    let (id, _) = issuer_copy.issue(&related);
                    path.push_str("_:");
                    path.push_str(id);
                    path.push('<');
                    path.push_str(&hex(&result.0));
                    path.push('>');
                    issuer_copy = result.1;
                    if skip_path(&chosen_path, &path) {
                        return Ok(()); // skip to the next permutation
                    }
                }
                // Step 5.4.6
                if chosen_path.is_empty() || path < chosen_path {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
                Ok(())
            })?;
            data_to_hash.update(chosen_path.as_bytes());
            if chosen_issuer.is_some() {
                ret_issuer = chosen_issuer;
            }
        }
        let ret = (
            data_to_hash.finalize(),
            ret_issuer.unwrap_or_else(|| issuer.clone()),
        );
        debug_assert!({
            log::trace!(
                "hash-n-degree({}, {})\n-> {}",
                identifier,
                depth,
                hex(&ret.0)
            );
            true
        });
        Ok(ret)
    }
}

/// Issues blank node identifiers with a given prefix (`c14n` for canonical ones, `b` for temporary ones).
#[derive(Clone, Debug)]
struct BnodeIssuer {
    prefix: &'static str,
    issued: C14nIdMap,
    // keeps the order in which identifiers were issued; its length is the counter
    issued_order: Vec<Rc<str>>,
}

impl BnodeIssuer {
    const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            issued: BTreeMap::new(),
            issued_order: vec![],
        }
    }

    /// Implements <https://www.w3.org/TR/rdf-canon/#issue-identifier>
    /// modified to also return a boolean indicating whether the issued identifier
    /// was newly created (true) or if it existed before (false)
    fn issue(&mut self, bnid: &str) -> (&str, bool) {
        let key: Rc<str> = Rc::from(bnid);
        let key2 = Rc::clone(&key);
        let mut new = false;
        let ret = self.issued.entry(key).or_insert_with(|| {
            new = true;
            let counter = self.issued_order.len();
            self.issued_order.push(key2);
            Rc::from(format!("{}{}", self.prefix, counter))
        });
        (&**ret, new)
    }
}

/// Implements <https://www.w3.org/TR/rdf-canon/#hash-1d-quads>
/// with the difference that the C14n state is not passed;
/// instead, the quad list corresponding to bnid is passed directly
fn hash_first_degree_quads<H: HashFunction>(bnid: &str, quads: &[&Quad]) -> H::Output {
    let mut nquads: Vec<_> = quads
        .iter()
        .map(|q| {
            let mut line = String::new();
            for term in q.terms() {
                nq_for_hash(term, &mut line, bnid);
            }
            line.push_str(".\n");
            line
        })
        .collect();
    nquads.sort_unstable();
    let mut hasher = H::initialize();
    for line in nquads {
        hasher.update(&line);
    }
    let ret = hasher.finalize();
    debug_assert!({
        log::trace!("hash-first-degree({})\n-> {}", bnid, hex(&ret));
        true
    });
    ret
}

fn nq_for_hash(term: &Term, buffer: &mut String, ref_bnid: &str) {
    match term.bnode_id() {
        Some(bnid) if bnid == ref_bnid => buffer.push_str("_:a"),
        Some(_) => buffer.push_str("_:z"),
        None => {
            // writing into a String can not fail
            let _ = write_term(buffer, term);
        }
    }
    buffer.push(' ');
}

/// Whether `path` can not become smaller than `chosen_path` anymore
/// (step 5.4.4.3 and 5.4.5.5 of hash-n-degree-quads).
fn skip_path(chosen_path: &str, path: &str) -> bool {
    !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
}

#[cfg(test)]
mod test;
