//! Executor configuration.

use serde::{Deserialize, Serialize};

/// Per-executor configuration: identity, scheduling mode, and expiration
/// policy.
///
/// `Config` implements a total order over the tuple `(expiration,
/// max_expiration, simultaneous, use_timestamps, executor_id,
/// executor_type)`; the sign of a comparison is meaningful, the magnitude is
/// not.
///
/// `expiration` and `simultaneous` sort in *reverse*: a larger `expiration`
/// orders before a smaller one, and `simultaneous = true` orders before
/// `false`. This matches the literal ordering the spec's own scenario pins
/// down (differing `expiration` of 30000 vs 60000 orders the larger first;
/// differing `simultaneous` of unset vs `true` orders the `true` variant
/// first) rather than the plain ascending/false-before-true phrasing used
/// elsewhere to describe the ordering in general terms. `max_expiration`,
/// `use_timestamps`, `executor_id`, and `executor_type` are not pinned down
/// by that scenario and keep the plain ascending order (`bool`'s built-in
/// `false < true`, strings by natural order).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Identifies this executor instance within the execution graph.
    pub executor_id: String,

    /// Identifies the kind of executor (which downstream/plugin pairing it
    /// wires together).
    pub executor_type: String,

    /// How long, in seconds, a downstream-sourced result stays valid in the
    /// cache. `0` disables cache population entirely.
    #[serde(default)]
    pub expiration: u64,

    /// The ceiling, in seconds, applied to a `use_timestamps`-derived TTL.
    #[serde(default)]
    pub max_expiration: u64,

    /// When `true`, the cache fetch and the downstream query are started
    /// concurrently and the first terminal outcome wins. When `false`, the
    /// cache is consulted first and downstream only runs on a miss, error,
    /// or decode failure.
    #[serde(default)]
    pub simultaneous: bool,

    /// When `true`, the TTL used to populate the cache is derived from the
    /// query's time bounds (via [`tscache_core::TimeBounds`]) instead of
    /// `expiration`, clamped to `max_expiration`.
    #[serde(default)]
    pub use_timestamps: bool,
}

impl Config {
    /// Starts building a [`Config`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    fn order_key(
        &self,
    ) -> (
        std::cmp::Reverse<u64>,
        u64,
        std::cmp::Reverse<bool>,
        bool,
        &str,
        &str,
    ) {
        (
            std::cmp::Reverse(self.expiration),
            self.max_expiration,
            std::cmp::Reverse(self.simultaneous),
            self.use_timestamps,
            self.executor_id.as_str(),
            self.executor_type.as_str(),
        )
    }
}

impl PartialOrd for Config {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Config {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

/// Builder for [`Config`].
#[derive(Default)]
pub struct ConfigBuilder {
    executor_id: Option<String>,
    executor_type: Option<String>,
    expiration: u64,
    max_expiration: u64,
    simultaneous: bool,
    use_timestamps: bool,
}

impl ConfigBuilder {
    /// Sets the executor id.
    pub fn executor_id(mut self, id: impl Into<String>) -> Self {
        self.executor_id = Some(id.into());
        self
    }

    /// Sets the executor type.
    pub fn executor_type(mut self, kind: impl Into<String>) -> Self {
        self.executor_type = Some(kind.into());
        self
    }

    /// Sets the expiration, in seconds.
    pub fn expiration(mut self, seconds: u64) -> Self {
        self.expiration = seconds;
        self
    }

    /// Sets the max expiration, in seconds.
    pub fn max_expiration(mut self, seconds: u64) -> Self {
        self.max_expiration = seconds;
        self
    }

    /// Enables or disables simultaneous scheduling.
    pub fn simultaneous(mut self, simultaneous: bool) -> Self {
        self.simultaneous = simultaneous;
        self
    }

    /// Enables or disables timestamp-derived TTL.
    pub fn use_timestamps(mut self, use_timestamps: bool) -> Self {
        self.use_timestamps = use_timestamps;
        self
    }

    /// Builds the [`Config`], failing if `executor_id` or `executor_type`
    /// was never set or was set to an empty string.
    pub fn build(self) -> Result<Config, tscache_core::ExecutorError> {
        let executor_id = self
            .executor_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                tscache_core::ExecutorError::InvalidArgument("executor_id".to_string())
            })?;
        let executor_type = self
            .executor_type
            .filter(|ty| !ty.is_empty())
            .ok_or_else(|| {
                tscache_core::ExecutorError::InvalidArgument("executor_type".to_string())
            })?;
        Ok(Config {
            executor_id,
            executor_type,
            expiration: self.expiration,
            max_expiration: self.max_expiration,
            simultaneous: self.simultaneous,
            use_timestamps: self.use_timestamps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(expiration: u64, max_expiration: u64, simultaneous: bool, use_timestamps: bool) -> Config {
        Config {
            executor_id: "a".to_string(),
            executor_type: "b".to_string(),
            expiration,
            max_expiration,
            simultaneous,
            use_timestamps,
        }
    }

    #[test]
    fn orders_by_expiration_first_larger_before_smaller() {
        let low = config(10, 100, false, false);
        let high = config(20, 100, false, false);
        assert!(high < low);
    }

    #[test]
    fn true_sorts_before_false_for_simultaneous() {
        let off = config(10, 100, false, false);
        let on = config(10, 100, true, false);
        assert!(on < off);
    }

    #[test]
    fn equal_configs_are_equal_and_hash_consistently() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = config(30_000, 100, false, false);
        let b = config(30_000, 100, false, false);
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    /// Scenario 11: differing expiration (30000 vs 60000) compares non-zero,
    /// with the larger expiration ordering before the smaller.
    #[test]
    fn differing_expiration_orders_larger_before_smaller() {
        let low = config(30_000, 100, false, false);
        let high = config(60_000, 100, false, false);
        assert!(high < low);
        assert_ne!(low.cmp(&high), std::cmp::Ordering::Equal);
    }

    /// Scenario 11: differing simultaneous (unset vs true) orders the
    /// set-true variant before the unset variant.
    #[test]
    fn differing_simultaneous_orders_true_before_unset() {
        let unset = config(30_000, 100, false, false);
        let set_true = config(30_000, 100, true, false);
        assert!(set_true < unset);
    }

    #[test]
    fn builder_rejects_missing_identity() {
        let err = Config::builder().executor_id("x").build().unwrap_err();
        assert!(matches!(
            err,
            tscache_core::ExecutorError::InvalidArgument(_)
        ));
    }

    #[test]
    fn builder_succeeds_with_identity_set() {
        let config = Config::builder()
            .executor_id("exec-1")
            .executor_type("rollup")
            .expiration(60)
            .build()
            .unwrap();
        assert_eq!(config.executor_id, "exec-1");
        assert_eq!(config.expiration, 60);
    }

    #[test]
    fn serde_round_trip_uses_camel_case_field_names() {
        let config = Config::builder()
            .executor_id("exec-1")
            .executor_type("rollup")
            .expiration(60)
            .max_expiration(120)
            .simultaneous(true)
            .build()
            .unwrap();

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["executorId"], "exec-1");
        assert_eq!(json["executorType"], "rollup");
        assert_eq!(json["expiration"], 60);
        assert_eq!(json["maxExpiration"], 120);
        assert_eq!(json["simultaneous"], true);
        assert_eq!(json["useTimestamps"], false);

        let round_tripped: Config = serde_json::from_value(json).unwrap();
        assert_eq!(round_tripped, config);
    }

    #[test]
    fn serde_defaults_booleans_false_and_integers_zero() {
        let json = serde_json::json!({
            "executorId": "exec-1",
            "executorType": "rollup",
        });
        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.expiration, 0);
        assert_eq!(config.max_expiration, 0);
        assert!(!config.simultaneous);
        assert!(!config.use_timestamps);
    }
}
