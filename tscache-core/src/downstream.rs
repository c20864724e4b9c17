//! The downstream query executor collaborator.

use std::future::Future;

/// Executes a query against the node downstream of the cache.
///
/// Implementations are provided by the surrounding execution graph; this
/// crate only depends on the shape of the contract.
pub trait Downstream<Q>: Send + Sync {
    /// The successful result of executing a query.
    type Response: Send + 'static;

    /// The error a downstream query can fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The in-flight future returned by [`Downstream::execute_query`].
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;

    /// Starts executing `query`, returning a future that resolves to its
    /// outcome.
    ///
    /// Implementations should be cancel-safe: the returned future may be
    /// dropped before completion if a competing subrequest wins the race in
    /// `simultaneous` scheduling.
    fn execute_query(&self, query: Q) -> Self::Future;
}
