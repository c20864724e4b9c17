//! Error types for cache plugin and codec operations.

use thiserror::Error;

/// Error type for cache plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The underlying cache backend failed.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Error type for codec (de)serialization operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serializing a value into bytes failed.
    #[error("serialization failed: {0}")]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// Deserializing bytes back into a value failed.
    #[error("deserialization failed: {0}")]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}
