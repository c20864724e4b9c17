#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Cooperative cancellation primitive shared between an [`Execution`] and
/// the detached task driving it.
pub mod cancel;

/// Executor configuration: identity, scheduling mode, and expiration policy.
pub mod config;

/// Coordinates a single execution's cache fetch and downstream query under
/// the `sequential`/`simultaneous` scheduling modes.
mod driver;

/// The caller-facing handle returned by [`executor::Executor::execute_query`].
pub mod execution;

/// Executor construction and per-query dispatch.
pub mod executor;

/// Executor-level metrics collection.
///
/// When the `metrics` feature is enabled, this module records counters for
/// cache hits, downstream falls-through, cancellations, internal errors, and
/// cache-populate operations. With the feature disabled every function here
/// is a zero-cost no-op.
pub mod metrics;

pub use cancel::CancelToken;
pub use config::{Config, ConfigBuilder};
pub use execution::Execution;
pub use executor::{Executor, ExecutorBuilder};

pub use tscache_backend::{CachePlugin, Codec, CodecError, PluginError};
pub use tscache_core::{
    CacheKey, Downstream, ExecutionError, ExecutorError, KeyGenerator, TimeBounds,
};
