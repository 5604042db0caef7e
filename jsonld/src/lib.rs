//! This crate is part of ldtk,
//! a [JSON-LD] and [Linked Data] toolkit in Rust.
//!
//! It provides a [JSON-LD 1.1] processor, with the following operations
//! (see [`processor`]):
//! * [`expand`], [`compact`] and [`flatten`] JSON-LD documents;
//! * [`frame`] them, as defined by [JSON-LD 1.1 Framing];
//! * convert them [to](to_rdf()) and [from](from_rdf()) RDF datasets;
//! * [`normalize`] them, as the canonical N-Quads form of their RDF dataset.
//!
//! Remote documents and contexts are retrieved through a [`DocumentLoader`](loader::DocumentLoader),
//! configured in the [`JsonLdOptions`].
//!
//! [JSON-LD]: https://www.w3.org/TR/json-ld11/
//! [JSON-LD 1.1]: https://www.w3.org/TR/json-ld11-api/
//! [JSON-LD 1.1 Framing]: https://www.w3.org/TR/json-ld11-framing/
//! [Linked Data]: http://linkeddata.org/

pub mod compact;
pub mod context;
pub mod error;
pub use error::*;
pub mod expand;
pub mod flatten;
mod frame;
mod from_rdf;
pub mod keyword;
pub mod loader;
pub mod node_map;
pub mod options;
pub use options::*;
pub mod processor;
pub use processor::*;
mod to_rdf;
pub mod util;

#[cfg(test)]
fn test_setup() {
    TEST_SETUP.call_once(|| {
        env_logger::init();
    });
}

#[cfg(test)]
static TEST_SETUP: std::sync::Once = std::sync::Once::new();
