use url::Url;

use super::{DocumentLoader, LoaderError, RemoteDocument};

/// File-URL loader.
///
/// This is a special JSON-LD document loader that can load document from any file: URL.
///
/// Loaded documents are not cached: a new file system read is made each time
/// an URL is loaded even if it has already been queried before.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileUrlLoader {}

impl FileUrlLoader {
    /// Creates a new file system loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentLoader for FileUrlLoader {
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        if !url.starts_with("file:") {
            return Err(LoaderError::NotFileUrl(url.into()));
        }
        let url_parsed = Url::parse(url).map_err(|_| LoaderError::BadFileUrl(url.into()))?;
        let path = url_parsed
            .to_file_path()
            .map_err(|()| LoaderError::BadFileUrl(url.into()))?;
        let content = std::fs::read(path).map_err(|err| LoaderError::Io(url.into(), err))?;
        Ok(RemoteDocument::new(url, content))
    }
}
