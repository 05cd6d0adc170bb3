//! File content hashes
//!
//! Every loaded file carries the blake3 hash of its text. Writing compares
//! hashes to skip files whose text came back unchanged, and a snapshot's
//! fingerprint combines the hashes of all its files.

use std::fmt::{self, Display, Formatter};

/// Blake3 hash of a file's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash `data`
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self::new(*hash.as_bytes())
    }

    /// Combine an ordered sequence of hashes into one
    ///
    /// Used to fingerprint a whole snapshot from its per-file hashes.
    #[must_use]
    pub fn combine<'a>(hashes: impl IntoIterator<Item = &'a ContentHash>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for hash in hashes {
            hasher.update(&hash.0);
        }
        Self::new(*hasher.finalize().as_bytes())
    }

    /// First 16 hex digits, for logs
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
