//! I provide different document loaders:
//! * [`NoLoader`]: does not load anything (to be used with self-sufficient JSON-LD documents)
//! * [`StaticLoader`]: loads a selected set of URLs from memory (useful to embed in a program normative contexts)
//! * [`FsLoader`]: loads documents from the file system, by mapping directories to specific URLs
//! * [`ClosureLoader`]: loads documents by calling an arbitrary function
//! * [`ChainLoader`]: loads document from the first loader, otherwise falls back to the second one.
//! * [`FileUrlLoader`]: loads documents from `file:` URLs (only if the `file_url` feature is enabled)
//!
//! Loaders are used through a shared reference,
//! so that a single loader can serve several processing calls;
//! loaders needing mutable state must rely on interior mutability.

use std::fmt;

mod chain_loader;
pub use chain_loader::*;
mod closure_loader;
pub use closure_loader::*;
mod fs_loader;
pub use fs_loader::*;
mod static_loader;
pub use static_loader::*;

#[cfg(feature = "file_url")]
mod file_url_loader;
#[cfg(feature = "file_url")]
pub use file_url_loader::*;

/// The content type of JSON-LD documents.
pub const JSON_LD_CONTENT_TYPE: &str = "application/ld+json";

/// A [document loader](https://www.w3.org/TR/json-ld11-api/#loaddocumentcallback)
/// retrieves remote documents and contexts.
pub trait DocumentLoader {
    /// Retrieve the document identified by `url`.
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError>;
}

impl<T: DocumentLoader + ?Sized> DocumentLoader for &T {
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        T::load(*self, url)
    }
}

impl<T: DocumentLoader + ?Sized> DocumentLoader for Box<T> {
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        T::load(self, url)
    }
}

/// A document retrieved by a [`DocumentLoader`],
/// as defined by <https://www.w3.org/TR/json-ld11-api/#remotedocument>.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteDocument {
    /// The final URL of the loaded document (after redirections, if any).
    pub document_url: String,
    /// The content type of the loaded document.
    pub content_type: Option<String>,
    /// The URL of a context provided out of band (e.g. in an HTTP Link header).
    pub context_url: Option<String>,
    /// The raw content of the document.
    pub document: Vec<u8>,
}

impl RemoteDocument {
    /// Build a JSON-LD remote document with the given URL and content.
    pub fn new<U: Into<String>, D: Into<Vec<u8>>>(document_url: U, document: D) -> Self {
        RemoteDocument {
            document_url: document_url.into(),
            content_type: Some(JSON_LD_CONTENT_TYPE.to_string()),
            context_url: None,
            document: document.into(),
        }
    }

    /// Parse the content of this document as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.document)
    }
}

/// A dummy document loader, that does not load anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLoader;

impl DocumentLoader for NoLoader {
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        log::debug!("NoLoader refused to load {url}");
        Err(LoaderError::NotFound(url.to_string()))
    }
}

/// Error type raised by [document loaders](DocumentLoader).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoaderError {
    /// Document not found
    #[error("document not found {0}")]
    NotFound(String),
    /// An IO error occurred while reading the document
    #[error("IO error while loading {0}: {1}")]
    Io(String, #[source] std::io::Error),
    /// Error raised by a [`ClosureLoader`]'s closure
    #[error("{0}")]
    Internal(String),
    /// URL is not a `file:` URL
    #[error("not a file: URL: {0}")]
    NotFileUrl(String),
    /// `file:` URL does not encode a correct path
    #[error("invalid path in {0}")]
    BadFileUrl(String),
    /// Both loaders of a [`ChainLoader`] failed
    #[error("{0}; {1}")]
    Chain(Box<LoaderError>, Box<LoaderError>),
}

impl fmt::Debug for dyn DocumentLoader + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DocumentLoader")
    }
}
