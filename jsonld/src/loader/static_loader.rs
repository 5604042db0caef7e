use std::collections::HashMap;

use serde_json::Value;

use super::{DocumentLoader, LoaderError, RemoteDocument};

/// A document loader that stores a selected set of documents in memory.
/// This is useful for stable (e.g. normative) contexts that are expected to be used a lot.
///
/// See <https://www.w3.org/TR/json-ld11/#privacy>
#[derive(Clone, Debug, Default)]
pub struct StaticLoader {
    cache: HashMap<String, Vec<u8>>,
}

impl StaticLoader {
    /// Creates a new [`StaticLoader`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend this [`StaticLoader`] with another document
    pub fn with<U: Into<String>, D: Into<Vec<u8>>>(mut self, url: U, document: D) -> Self {
        self.cache.insert(url.into(), document.into());
        self
    }

    /// Extend this [`StaticLoader`] with another (pre-parsed) document
    pub fn with_json<U: Into<String>>(self, url: U, document: &Value) -> Self {
        self.with(url, document.to_string())
    }

    /// Whether this loader has a document for `url`
    pub fn contains(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }
}

impl DocumentLoader for StaticLoader {
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        self.cache
            .get(url)
            .ok_or_else(|| LoaderError::NotFound(url.into()))
            .map(|doc| {
                log::debug!("StaticLoader hit for {url}");
                RemoteDocument::new(url, doc.clone())
            })
    }
}
