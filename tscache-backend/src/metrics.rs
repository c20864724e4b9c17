//! Cache plugin metrics.
//!
//! Enable the `metrics` feature to record these; with it disabled every
//! function here is a zero-cost no-op.
//!
//! ## Naming pattern
//!
//! `tscache_backend_{operation}_{metric_type}`.

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Zero-cost timer for metrics collection.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts a timer, capturing the current instant if metrics are enabled.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Elapsed time since the timer was created, or `Duration::ZERO` when
    /// the `metrics` feature is disabled.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for total fetch operations counter.
    pub static ref PLUGIN_FETCH_TOTAL: &'static str = {
        metrics::describe_counter!(
            "tscache_backend_fetch_total",
            "Total number of cache plugin fetch operations."
        );
        "tscache_backend_fetch_total"
    };

    /// Metric name for fetch duration histogram.
    pub static ref PLUGIN_FETCH_DURATION: &'static str = {
        metrics::describe_histogram!(
            "tscache_backend_fetch_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of cache plugin fetch operations in seconds."
        );
        "tscache_backend_fetch_duration_seconds"
    };

    /// Metric name for fetch errors counter.
    pub static ref PLUGIN_FETCH_ERRORS: &'static str = {
        metrics::describe_counter!(
            "tscache_backend_fetch_errors_total",
            "Total number of cache plugin fetch errors."
        );
        "tscache_backend_fetch_errors_total"
    };

    /// Metric name for total cache-populate operations counter.
    pub static ref PLUGIN_CACHE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "tscache_backend_cache_total",
            "Total number of cache plugin populate operations."
        );
        "tscache_backend_cache_total"
    };

    /// Metric name for cache-populate duration histogram.
    pub static ref PLUGIN_CACHE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "tscache_backend_cache_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of cache plugin populate operations in seconds."
        );
        "tscache_backend_cache_duration_seconds"
    };

    /// Metric name for cache-populate errors counter.
    pub static ref PLUGIN_CACHE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "tscache_backend_cache_errors_total",
            "Total number of cache plugin populate errors."
        );
        "tscache_backend_cache_errors_total"
    };
}

/// Records a completed fetch operation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_fetch(duration: Duration, found: bool) {
    metrics::counter!(*PLUGIN_FETCH_TOTAL, "hit" => found.to_string()).increment(1);
    metrics::histogram!(*PLUGIN_FETCH_DURATION).record(duration.as_secs_f64());
}

/// Records a completed fetch operation (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_fetch(_duration: Duration, _found: bool) {}

/// Records a fetch error.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_fetch_error() {
    metrics::counter!(*PLUGIN_FETCH_ERRORS).increment(1);
}

/// Records a fetch error (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_fetch_error() {}

/// Records a completed cache-populate operation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache(duration: Duration) {
    metrics::counter!(*PLUGIN_CACHE_TOTAL).increment(1);
    metrics::histogram!(*PLUGIN_CACHE_DURATION).record(duration.as_secs_f64());
}

/// Records a completed cache-populate operation (no-op when `metrics` is
/// disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache(_duration: Duration) {}

/// Records a cache-populate error.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_error() {
    metrics::counter!(*PLUGIN_CACHE_ERRORS).increment(1);
}

/// Records a cache-populate error (no-op when `metrics` is disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_error() {}
