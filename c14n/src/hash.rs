//! Define the [`HashFunction`] trait as well as standard hash functions.
use sha2::Digest;

/// Abstraction of hash function used by [RDFC-1.0](crate::rdfc10).
pub trait HashFunction {
    /// Output of the hash function; usually `[u8; N]`.
    type Output: AsRef<[u8]> + Copy + Eq + Ord;

    /// Start the computation of a hash
    fn initialize() -> Self;

    /// Update internal state by hashing `data`
    fn update(&mut self, data: impl AsRef<[u8]>);

    /// Return the hash
    fn finalize(self) -> Self::Output;

    /// Hash `data` in one go.
    fn digest(data: impl AsRef<[u8]>) -> Self::Output
    where
        Self: Sized,
    {
        let mut h = Self::initialize();
        h.update(data);
        h.finalize()
    }
}

/// Lowercase hexadecimal representation of a hash output.
pub fn hex(hash: &impl AsRef<[u8]>) -> String {
    use std::fmt::Write;
    let bytes = hash.as_ref();
    let mut digest = String::with_capacity(2 * bytes.len());
    for b in bytes {
        // writing into a String can not fail
        let _ = write!(&mut digest, "{b:02x}");
    }
    digest
}

/// The [SHA-256](https://en.wikipedia.org/wiki/SHA-2) [`HashFunction`]
pub struct Sha256(sha2::Sha256);

impl HashFunction for Sha256 {
    type Output = [u8; 32];

    fn initialize() -> Self {
        Sha256(sha2::Sha256::new())
    }

    fn update(&mut self, data: impl AsRef<[u8]>) {
        self.0.update(data.as_ref());
    }

    fn finalize(self) -> Self::Output {
        self.0.finalize().into()
    }
}

/// The [SHA-384](https://en.wikipedia.org/wiki/SHA-2) [`HashFunction`]
pub struct Sha384(sha2::Sha384);

impl HashFunction for Sha384 {
    type Output = [u8; 48];

    fn initialize() -> Self {
        Sha384(sha2::Sha384::new())
    }

    fn update(&mut self, data: impl AsRef<[u8]>) {
        self.0.update(data.as_ref());
    }

    fn finalize(self) -> Self::Output {
        self.0.finalize().into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sha256_empty() {
        assert_eq!(
            hex(&Sha256::digest("")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha384_abc() {
        assert_eq!(
            hex(&Sha384::digest("abc")),
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7"
        );
    }

    #[test]
    fn incremental_is_same_as_digest() {
        let mut h = Sha256::initialize();
        h.update("_:a <http://example.org/p> ");
        h.update("_:z .\n");
        assert_eq!(
            h.finalize(),
            Sha256::digest("_:a <http://example.org/p> _:z .\n")
        );
    }
}
