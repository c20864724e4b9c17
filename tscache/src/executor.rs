//! Executor construction and per-query dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{Notify, oneshot};
use tscache_backend::{CachePlugin, Codec};
use tscache_core::{Downstream, ExecutionError, ExecutorError, KeyGenerator, TimeBounds};

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::driver;
use crate::execution::Execution;

/// Coordinates one cache-plugin fetch and one downstream query per
/// incoming query, for a single executor identity.
pub struct Executor<K, P, Cd, D> {
    config: Config,
    key_generator: Arc<K>,
    plugin: Arc<P>,
    codec: Arc<Cd>,
    downstream: Arc<D>,
    outstanding: Arc<DashMap<u64, (CancelToken, Arc<Notify>)>>,
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl<K, P, Cd, D> Clone for Executor<K, P, Cd, D> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            key_generator: Arc::clone(&self.key_generator),
            plugin: Arc::clone(&self.plugin),
            codec: Arc::clone(&self.codec),
            downstream: Arc::clone(&self.downstream),
            outstanding: Arc::clone(&self.outstanding),
            next_id: Arc::clone(&self.next_id),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<K, P, Cd, D> Executor<K, P, Cd, D> {
    /// Builds an executor from its already-resolved collaborators.
    ///
    /// Only the parts of `config` the executor itself owns are validated
    /// here (a non-empty `executor_id` and `executor_type`); resolving a
    /// named plugin/codec/downstream/key-generator from a registry, and
    /// reporting which one was missing, is the job of the call site that
    /// owns that registry — see [`ExecutorBuilder`] for a thin helper that
    /// does surface that error shape.
    pub fn new(
        config: Config,
        key_generator: K,
        plugin: P,
        codec: Cd,
        downstream: D,
    ) -> Result<Self, ExecutorError> {
        if config.executor_id.is_empty() {
            return Err(ExecutorError::InvalidArgument("executor_id".to_string()));
        }
        if config.executor_type.is_empty() {
            return Err(ExecutorError::InvalidArgument("executor_type".to_string()));
        }
        Ok(Self {
            config,
            key_generator: Arc::new(key_generator),
            plugin: Arc::new(plugin),
            codec: Arc::new(codec),
            downstream: Arc::new(downstream),
            outstanding: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// This executor's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The cache plugin this executor dispatches fetches and populates to.
    pub fn plugin(&self) -> &Arc<P> {
        &self.plugin
    }

    /// The codec this executor uses to (de)serialize cached results.
    pub fn codec(&self) -> &Arc<Cd> {
        &self.codec
    }

    /// The key generator this executor derives cache keys from.
    pub fn key_generator(&self) -> &Arc<K> {
        &self.key_generator
    }

    /// The downstream executor this executor falls through to.
    pub fn downstream(&self) -> &Arc<D> {
        &self.downstream
    }

    /// The number of executions that have started but not yet terminally
    /// completed.
    pub fn outstanding_requests(&self) -> usize {
        self.outstanding.len()
    }

    /// Returns `true` once [`Executor::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Starts executing `query`, returning a handle to the in-flight
    /// execution.
    ///
    /// If the executor has already been [closed](Executor::close), no
    /// subrequest is started: the returned [`Execution`] is already
    /// terminally resolved with [`ExecutionError::Cancelled`].
    pub fn execute_query<Q>(&self, query: Q) -> Execution<D::Response, D::Error>
    where
        Q: TimeBounds + Send + 'static,
        K: KeyGenerator<Q> + 'static,
        P: CachePlugin + 'static,
        Cd: Codec<D::Response> + 'static,
        D: Downstream<Q> + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            let cancel = CancelToken::new();
            cancel.cancel();
            let (tx, rx) = oneshot::channel();
            let _ = tx.send(Err(ExecutionError::Cancelled));
            return Execution::new(rx, cancel);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelToken::new();
        let (tx, rx) = oneshot::channel();

        let config = self.config.clone();
        let key_generator = Arc::clone(&self.key_generator);
        let plugin = Arc::clone(&self.plugin);
        let codec = Arc::clone(&self.codec);
        let downstream = Arc::clone(&self.downstream);
        let outstanding = Arc::clone(&self.outstanding);
        let driver_cancel = cancel.clone();
        let simultaneous = config.simultaneous;
        let done = Arc::new(Notify::new());

        // Register before spawning: the spawned task's `outstanding.remove`
        // must never be able to race ahead of this insert, or the removal
        // becomes a no-op and the entry leaks for the executor's lifetime.
        self.outstanding.insert(id, (cancel.clone(), Arc::clone(&done)));

        tokio::spawn(async move {
            let result = if simultaneous {
                driver::run_simultaneous(
                    config,
                    key_generator,
                    plugin,
                    codec,
                    downstream,
                    query,
                    driver_cancel,
                )
                .await
            } else {
                driver::run_sequential(
                    config,
                    key_generator,
                    plugin,
                    codec,
                    downstream,
                    query,
                    driver_cancel,
                )
                .await
            };
            outstanding.remove(&id);
            done.notify_waiters();
            let _ = tx.send(result);
        });

        Execution::new(rx, cancel)
    }

    /// Marks the executor closed, cancels every outstanding execution, and
    /// waits for them to finish.
    ///
    /// Idempotent. Once closed, [`Executor::execute_query`] rejects every
    /// subsequent call instead of starting new subrequests; `close` does not
    /// consume `self`, so accessors remain usable afterward.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let entries: Vec<(u64, CancelToken, Arc<Notify>)> = self
            .outstanding
            .iter()
            .map(|entry| {
                let (cancel, done) = entry.value();
                (*entry.key(), cancel.clone(), Arc::clone(done))
            })
            .collect();
        for (id, cancel, done) in entries {
            cancel.cancel();
            wait_until_removed(&self.outstanding, id, &done).await;
        }
    }
}

/// Waits until `id` is no longer present in `outstanding`.
///
/// Registers for the notification before checking the map, so a removal
/// racing with this call is never missed.
async fn wait_until_removed<V>(outstanding: &DashMap<u64, V>, id: u64, done: &Notify) {
    loop {
        let notified = done.notified();
        if !outstanding.contains_key(&id) {
            return;
        }
        notified.await;
    }
}

/// Builder for [`Executor`] that surfaces a named missing-collaborator
/// error, for call sites resolving plugin/codec/downstream/key-generator
/// from a registry.
pub struct ExecutorBuilder<K, P, Cd, D> {
    config: Option<Config>,
    key_generator: Option<K>,
    plugin: Option<P>,
    codec: Option<Cd>,
    downstream: Option<D>,
}

impl<K, P, Cd, D> Default for ExecutorBuilder<K, P, Cd, D> {
    fn default() -> Self {
        Self {
            config: None,
            key_generator: None,
            plugin: None,
            codec: None,
            downstream: None,
        }
    }
}

impl<K, P, Cd, D> ExecutorBuilder<K, P, Cd, D> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the executor configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the key generator.
    pub fn key_generator(mut self, key_generator: K) -> Self {
        self.key_generator = Some(key_generator);
        self
    }

    /// Sets the cache plugin.
    pub fn plugin(mut self, plugin: P) -> Self {
        self.plugin = Some(plugin);
        self
    }

    /// Sets the codec.
    pub fn codec(mut self, codec: Cd) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the downstream.
    pub fn downstream(mut self, downstream: D) -> Self {
        self.downstream = Some(downstream);
        self
    }

    /// Builds the executor, failing with the name of the first unset
    /// collaborator.
    pub fn build(self) -> Result<Executor<K, P, Cd, D>, ExecutorError> {
        let config = self
            .config
            .ok_or_else(|| ExecutorError::InvalidArgument("config".to_string()))?;
        let key_generator = self
            .key_generator
            .ok_or_else(|| ExecutorError::InvalidArgument("key_generator".to_string()))?;
        let plugin = self
            .plugin
            .ok_or_else(|| ExecutorError::InvalidArgument("plugin".to_string()))?;
        let codec = self
            .codec
            .ok_or_else(|| ExecutorError::InvalidArgument("codec".to_string()))?;
        let downstream = self
            .downstream
            .ok_or_else(|| ExecutorError::InvalidArgument("downstream".to_string()))?;
        Executor::new(config, key_generator, plugin, codec, downstream)
    }
}
