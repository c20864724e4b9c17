//! Error taxonomy shared by the executor and its collaborators.

use thiserror::Error;

/// Errors returned while constructing an executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A required argument was missing or failed validation.
    #[error("invalid executor argument: {0}")]
    InvalidArgument(String),
}

/// The outcome of a query execution, from the caller's point of view.
///
/// Cache errors and serialization errors are deliberately not representable
/// here: they are absorbed internally and never surface to the caller (see
/// the failure matrix this type's variants are drawn from).
#[derive(Debug, Error)]
pub enum ExecutionError<E> {
    /// The downstream query failed and no cached value was available to
    /// fall back on.
    #[error("downstream query failed: {0}")]
    Downstream(E),

    /// The execution was cancelled before it reached a terminal state.
    #[error("query execution cancelled")]
    Cancelled,

    /// A subrequest task panicked or was dropped without completing, for a
    /// reason other than cancellation.
    #[error("query execution failed internally: {0}")]
    Internal(String),
}
