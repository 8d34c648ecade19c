//! Deterministic request fingerprints used as cache keys.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

/// Identifying parts of a fetch request.
///
/// Positional arguments keep their order; keyword arguments are stored
/// sorted by name, so the order they were added in never changes the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint {
    name: String,
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl RequestFingerprint {
    /// Start a fingerprint for the named request.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Set a keyword argument. A repeated name replaces the earlier value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.kwargs.insert(name.into(), value.to_string());
        self
    }

    /// Request name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// SHA-256 hex digest identifying this request.
    ///
    /// Every part is hashed with a section tag and a length prefix, so
    /// `("a|b")` and `("a", "b")` never collide.
    pub fn key(&self) -> String {
        let mut hasher = Sha256::new();
        hash_part(&mut hasher, b'n', &self.name);
        for arg in &self.args {
            hash_part(&mut hasher, b'a', arg);
        }
        for (name, value) in &self.kwargs {
            hash_part(&mut hasher, b'k', name);
            hash_part(&mut hasher, b'v', value);
        }
        hex::encode(hasher.finalize())
    }
}

fn hash_part(hasher: &mut Sha256, tag: u8, part: &str) {
    hasher.update([tag]);
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part.as_bytes());
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, "|{arg}")?;
        }
        for (name, value) in &self.kwargs {
            write!(f, "|{name}={value}")?;
        }
        Ok(())
    }
}

/// Types that identify a cacheable request.
pub trait Fingerprint {
    /// Identifying parts of this request.
    fn fingerprint(&self) -> RequestFingerprint;

    /// Cache key derived from [`fingerprint`](Self::fingerprint).
    fn cache_key(&self) -> String {
        self.fingerprint().key()
    }
}

impl Fingerprint for RequestFingerprint {
    fn fingerprint(&self) -> RequestFingerprint {
        self.clone()
    }
}
