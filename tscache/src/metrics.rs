//! Executor-level metrics.
//!
//! Enable the `metrics` feature to record these; with it disabled every
//! function here is a zero-cost no-op.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track executions resolved from the cache.
    pub static ref EXECUTION_CACHE_HIT: &'static str = {
        metrics::describe_counter!(
            "tscache_execution_cache_hit_total",
            "Total number of executions resolved from the cache."
        );
        "tscache_execution_cache_hit_total"
    };

    /// Track executions that fell through to downstream.
    pub static ref EXECUTION_DOWNSTREAM: &'static str = {
        metrics::describe_counter!(
            "tscache_execution_downstream_total",
            "Total number of executions resolved by the downstream query."
        );
        "tscache_execution_downstream_total"
    };

    /// Track cancelled executions.
    pub static ref EXECUTION_CANCELLED: &'static str = {
        metrics::describe_counter!(
            "tscache_execution_cancelled_total",
            "Total number of executions that ended cancelled."
        );
        "tscache_execution_cancelled_total"
    };

    /// Track executions that failed internally (subrequest panic).
    pub static ref EXECUTION_INTERNAL_ERROR: &'static str = {
        metrics::describe_counter!(
            "tscache_execution_internal_errors_total",
            "Total number of executions that failed due to an internal error."
        );
        "tscache_execution_internal_errors_total"
    };

    /// Track cache-populate operations.
    pub static ref EXECUTION_CACHE_POPULATED: &'static str = {
        metrics::describe_counter!(
            "tscache_execution_cache_populated_total",
            "Total number of executions that populated the cache."
        );
        "tscache_execution_cache_populated_total"
    };
}

/// Records a cache-hit execution outcome.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_hit() {
    metrics::counter!(*EXECUTION_CACHE_HIT).increment(1);
}

/// Records a cache-hit execution outcome (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_hit() {}

/// Records a downstream-sourced execution outcome.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_downstream() {
    metrics::counter!(*EXECUTION_DOWNSTREAM).increment(1);
}

/// Records a downstream-sourced execution outcome (no-op when `metrics` is
/// disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_downstream() {}

/// Records a cancelled execution.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cancelled() {
    metrics::counter!(*EXECUTION_CANCELLED).increment(1);
}

/// Records a cancelled execution (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cancelled() {}

/// Records an internal execution error.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_internal_error() {
    metrics::counter!(*EXECUTION_INTERNAL_ERROR).increment(1);
}

/// Records an internal execution error (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_internal_error() {}

/// Records a cache-populate operation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_populated() {
    metrics::counter!(*EXECUTION_CACHE_POPULATED).increment(1);
}

/// Records a cache-populate operation (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_populated() {}
