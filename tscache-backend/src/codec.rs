//! The codec collaborator, turning typed query responses into cacheable
//! bytes and back.

use bytes::Bytes;

use crate::error::CodecError;

/// Serializes and deserializes a value of type `T` to and from the opaque
/// byte representation a [`crate::CachePlugin`] stores.
pub trait Codec<T>: Send + Sync {
    /// Encodes `value` into bytes suitable for [`crate::CachePlugin::cache`].
    fn serialize(&self, value: &T) -> Result<Bytes, CodecError>;

    /// Decodes bytes previously produced by [`Codec::serialize`].
    ///
    /// A decode failure is treated by the executor as equivalent to a cache
    /// miss: it falls through to the downstream query rather than
    /// propagating the error to the caller.
    fn deserialize(&self, bytes: &Bytes) -> Result<T, CodecError>;
}
