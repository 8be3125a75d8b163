//! Identity mapping between the authority and the local cache
//!
//! The authority numbers records starting at 0, the local cache starting at 1.
//! Both schemes travel through the codebase as distinct newtypes so a raw `i64`
//! can never be applied to the wrong store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Record id in the authority's numbering scheme (zero-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub i64);

/// Record id in the local cache's numbering scheme (one-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub i64);

impl From<RemoteId> for LocalId {
    fn from(remote: RemoteId) -> Self {
        LocalId(remote.0 + 1)
    }
}

impl From<LocalId> for RemoteId {
    fn from(local: LocalId) -> Self {
        RemoteId(local.0 - 1)
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content digest of an entity's sync-relevant fields
///
/// Equal fingerprints mean "unchanged"; the reconciler never compares records
/// field by field. SHA-256 rather than `Hash` so the value is stable across
/// processes and releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// Incremental fingerprint construction
///
/// Every field is length-prefixed before hashing, so adjacent fields cannot
/// collide by shifting bytes across a boundary.
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Feed one field's bytes
    pub fn field(mut self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Feed an integer field
    pub fn int(self, value: i64) -> Self {
        self.field(value.to_be_bytes())
    }

    /// Feed a boolean field
    pub fn flag(self, value: bool) -> Self {
        self.field([value as u8])
    }

    /// Feed an optional field, distinguishing `None` from an empty value
    pub fn opt(self, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.flag(true).field(v),
            None => self.flag(false),
        }
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.finalize().into())
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Implemented by entities the reconciler diffs by content
pub trait Fingerprinted {
    fn fingerprint(&self) -> Fingerprint;
}
