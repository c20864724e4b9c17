//! Query time-bound introspection, used to derive a TTL when a [`Config`]
//! enables `use_timestamps`.
//!
//! [`Config`]: https://docs.rs/tscache

/// A query that can report the end of the time range it asks for.
///
/// Only queries used with `use_timestamps = true` need to implement this;
/// it is otherwise unused.
pub trait TimeBounds {
    /// The end of the query's time range, in milliseconds since the Unix
    /// epoch, or `None` if the query has no upper time bound (e.g. an
    /// unbounded "latest" query).
    fn end_time_millis(&self) -> Option<i64>;
}
