use super::{DocumentLoader, LoaderError, RemoteDocument};

/// * [`ChainLoader`]: loads document from the first loader, otherwise falls back to the second one.
#[derive(Clone, Debug, Default)]
pub struct ChainLoader<L1, L2>(L1, L2);

impl<L1, L2> ChainLoader<L1, L2> {
    /// Build a new chain loader
    pub fn new(l1: L1, l2: L2) -> Self {
        ChainLoader(l1, l2)
    }
}

impl<L1: DocumentLoader, L2: DocumentLoader> DocumentLoader for ChainLoader<L1, L2> {
    fn load(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        match self.0.load(url) {
            Ok(doc) => Ok(doc),
            Err(err1) => match self.1.load(url) {
                Ok(doc) => Ok(doc),
                Err(err2) => Err(LoaderError::Chain(Box::new(err1), Box::new(err2))),
            },
        }
    }
}
