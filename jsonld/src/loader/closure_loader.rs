use std::fmt;

use super::{DocumentLoader, LoaderError, RemoteDocument};

/// Closure loader.
///
/// This is a special JSON-LD document loader that relies on an arbitrary function to load JSON-LD documents.
/// The closure receives the URL and returns the content of the document, or an error message.
pub struct ClosureLoader<F> {
    closure: F,
}

impl<F> ClosureLoader<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    /// Creates a new closure loader with the given closure.
    pub const fn new(f: F) -> Self {
        Self { closure: f }
    }
}

impl<F> DocumentLoader for ClosureLoader<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        let content = (self.closure)(url).map_err(LoaderError::Internal)?;
        Ok(RemoteDocument::new(url, content))
    }
}

impl<F> fmt::Debug for ClosureLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn calls_closure() {
        let calls = Cell::new(0);
        let loader = ClosureLoader::new(|url: &str| {
            calls.set(calls.get() + 1);
            if url.ends_with(".jsonld") {
                Ok(format!("{{\"url\": \"{url}\"}}"))
            } else {
                Err(format!("refusing {url}"))
            }
        });
        let doc = loader.load("https://example.org/a.jsonld").unwrap();
        assert_eq!(doc.json().unwrap()["url"], "https://example.org/a.jsonld");
        let err = loader.load("https://example.org/a.ttl").unwrap_err();
        assert_eq!(err.to_string(), "refusing https://example.org/a.ttl");
        assert_eq!(calls.get(), 2);
    }
}
