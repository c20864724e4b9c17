//! The cache key generator collaborator.

use crate::CacheKey;

/// Derives a [`CacheKey`] from a query.
///
/// Key generation is synchronous and infallible by contract: a generator
/// that cannot build a stable key for some query is a configuration bug in
/// the generator itself, not a per-query error the executor should handle.
pub trait KeyGenerator<Q>: Send + Sync {
    /// Produces the cache key for `query`.
    fn generate(&self, query: &Q) -> CacheKey;
}
