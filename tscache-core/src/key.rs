//! Opaque cache key type.
//!
//! A [`CacheKey`] is produced by a [`crate::KeyGenerator`] and handed to a
//! cache plugin verbatim. The executor never inspects its contents.

use bytes::Bytes;
use std::fmt;

/// An opaque, cheaply-clonable cache key.
///
/// Cloning a `CacheKey` only bumps a reference count ([`Bytes`] is backed by
/// an `Arc`-like refcounted buffer), so it can be freely shared between the
/// cache-fetch and cache-populate subrequests of a single execution.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Bytes);

impl CacheKey {
    /// Builds a key from raw bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the key's raw byte representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the key, returning the underlying bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for CacheKey {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for CacheKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self(Bytes::from(s.into_bytes()))
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "CacheKey({s:?})"),
            Err(_) => write!(f, "CacheKey({:?})", self.0.as_ref()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "{:02x?}", self.0.as_ref()),
        }
    }
}
