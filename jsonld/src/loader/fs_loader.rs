use std::path::{Path, PathBuf};

use super::{DocumentLoader, LoaderError, RemoteDocument};

/// A document loader that can load documents from the file system,
/// by mapping directories to specific URLs.
///
/// When several mounted URL prefixes match, the longest one wins.
/// Loaded documents are not cached: a new file system read is made each time
/// an URL is loaded even if it has already been queried before.
#[derive(Clone, Debug, Default)]
pub struct FsLoader {
    mount_points: Vec<(String, PathBuf)>,
}

impl FsLoader {
    /// Creates a new file system loader, with no mount points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve URLs starting with `url_prefix` from the directory `dir`.
    pub fn mount<U: Into<String>, P: AsRef<Path>>(mut self, url_prefix: U, dir: P) -> Self {
        self.mount_points
            .push((url_prefix.into(), dir.as_ref().to_path_buf()));
        self
    }

    fn path_for(&self, url: &str) -> Option<PathBuf> {
        self.mount_points
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, dir)| {
                let suffix = &url[prefix.len()..];
                let suffix = suffix.split(['?', '#']).next().unwrap_or_default();
                dir.join(suffix.trim_start_matches('/'))
            })
    }
}

impl DocumentLoader for FsLoader {
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        let path = self
            .path_for(url)
            .ok_or_else(|| LoaderError::NotFound(url.into()))?;
        log::debug!("FsLoader reading {} for {url}", path.display());
        let content = std::fs::read(&path).map_err(|err| LoaderError::Io(url.into(), err))?;
        Ok(RemoteDocument::new(url, content))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn maps_longest_prefix() {
        let loader = FsLoader::new()
            .mount("https://example.org/", "/data/root")
            .mount("https://example.org/ctx/", "/data/contexts");
        assert_eq!(
            loader.path_for("https://example.org/ctx/a.jsonld"),
            Some(PathBuf::from("/data/contexts/a.jsonld"))
        );
        assert_eq!(
            loader.path_for("https://example.org/b.jsonld?x=1"),
            Some(PathBuf::from("/data/root/b.jsonld"))
        );
        assert_eq!(loader.path_for("https://example.com/b.jsonld"), None);
    }

    #[test]
    fn load_file() {
        let dir = std::env::temp_dir().join(format!("ldtk-fs-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ctx.jsonld"), r#"{"@context": {"@vocab": "https://example.org/"}}"#)
            .unwrap();
        let loader = FsLoader::new().mount("https://example.org/", &dir);
        let doc = loader.load("https://example.org/ctx.jsonld").unwrap();
        assert_eq!(doc.json().unwrap()["@context"]["@vocab"], "https://example.org/");
        assert!(matches!(
            loader.load("https://example.org/missing.jsonld"),
            Err(LoaderError::Io(..))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
