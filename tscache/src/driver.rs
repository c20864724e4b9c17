//! Coordinates one cache-plugin fetch and one downstream query for a single
//! execution, under the `sequential` or `simultaneous` scheduling mode.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tscache_backend::{CachePlugin, Codec, DynCachePlugin, PluginError};
use tscache_core::{CacheKey, Downstream, ExecutionError, KeyGenerator, TimeBounds};

use crate::cancel::CancelToken;
use crate::config::Config;

async fn abort_and_join<T>(mut handle: JoinHandle<T>) {
    handle.abort();
    let _ = handle.await;
}

enum RaceOutcome<T> {
    Completed(Result<T, tokio::task::JoinError>),
    Cancelled,
}

async fn race_cancel<T>(handle: &mut JoinHandle<T>, cancel: &CancelToken) -> RaceOutcome<T> {
    tokio::select! {
        res = &mut *handle => RaceOutcome::Completed(res),
        _ = cancel.cancelled() => RaceOutcome::Cancelled,
    }
}

async fn opt_handle<T>(handle: &mut Option<JoinHandle<T>>) -> Result<T, tokio::task::JoinError> {
    match handle {
        Some(h) => h.await,
        None => std::future::pending().await,
    }
}

fn spawn_fetch<P>(plugin: Arc<P>, key: CacheKey) -> JoinHandle<Result<Option<bytes::Bytes>, PluginError>>
where
    P: CachePlugin + 'static,
{
    tokio::spawn(async move { DynCachePlugin::fetch(&plugin, &key).await })
}

fn spawn_downstream<D, Q>(downstream: Arc<D>, query: Q) -> JoinHandle<Result<D::Response, D::Error>>
where
    D: Downstream<Q> + 'static,
    Q: Send + 'static,
{
    tokio::spawn(async move { downstream.execute_query(query).await })
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Computes the TTL to populate the cache with, or `None` if populating
/// should be suppressed.
fn compute_ttl(config: &Config, end_time_millis: Option<i64>) -> Option<Duration> {
    let seconds = if config.use_timestamps {
        let now = now_millis();
        match end_time_millis {
            None => config.max_expiration,
            Some(end) if end <= now => config.max_expiration,
            Some(end) => {
                let delta_ms = (end - now).max(0) as u64;
                (delta_ms / 1000).min(config.max_expiration)
            }
        }
    } else {
        config.expiration
    };
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

fn spawn_populate<P, Cd, R>(
    config: &Config,
    key: CacheKey,
    codec: Arc<Cd>,
    plugin: Arc<P>,
    response: &R,
    end_time_millis: Option<i64>,
) where
    P: CachePlugin + 'static,
    Cd: Codec<R> + 'static,
    R: 'static,
{
    let Some(ttl) = compute_ttl(config, end_time_millis) else {
        return;
    };
    let bytes = match codec.serialize(response) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "cache populate serialization failed, skipping populate");
            return;
        }
    };
    crate::metrics::record_cache_populated();
    tokio::spawn(async move {
        if let Err(err) = DynCachePlugin::cache(&plugin, &key, bytes, ttl).await {
            tracing::warn!(error = %err, "cache populate failed");
        }
    });
}

/// Runs the `sequential` scheduling mode: cache fetch first, falling
/// through to downstream on miss, cache error, or decode failure.
pub(crate) async fn run_sequential<Q, K, P, Cd, D>(
    config: Config,
    key_generator: Arc<K>,
    plugin: Arc<P>,
    codec: Arc<Cd>,
    downstream: Arc<D>,
    query: Q,
    cancel: CancelToken,
) -> Result<D::Response, ExecutionError<D::Error>>
where
    Q: TimeBounds + Send + 'static,
    K: KeyGenerator<Q>,
    P: CachePlugin + 'static,
    Cd: Codec<D::Response> + 'static,
    D: Downstream<Q> + 'static,
{
    let key = key_generator.generate(&query);
    let end_time_millis = if config.use_timestamps {
        query.end_time_millis()
    } else {
        None
    };

    let mut cache_handle = spawn_fetch(Arc::clone(&plugin), key.clone());
    let cache_outcome = race_cancel(&mut cache_handle, &cancel).await;

    let cached = match cache_outcome {
        RaceOutcome::Cancelled => {
            abort_and_join(cache_handle).await;
            crate::metrics::record_cancelled();
            return Err(ExecutionError::Cancelled);
        }
        RaceOutcome::Completed(Ok(Ok(Some(bytes)))) => match codec.deserialize(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, "cache decode failed, treating as miss");
                None
            }
        },
        RaceOutcome::Completed(Ok(Ok(None))) => None,
        RaceOutcome::Completed(Ok(Err(err))) => {
            tracing::warn!(error = %err, "cache fetch failed, falling through to downstream");
            None
        }
        RaceOutcome::Completed(Err(join_err)) => {
            tracing::warn!(error = %join_err, "cache fetch task panicked, falling through to downstream");
            None
        }
    };

    if let Some(value) = cached {
        crate::metrics::record_cache_hit();
        return Ok(value);
    }

    let mut downstream_handle = spawn_downstream(Arc::clone(&downstream), query);
    match race_cancel(&mut downstream_handle, &cancel).await {
        RaceOutcome::Cancelled => {
            abort_and_join(downstream_handle).await;
            crate::metrics::record_cancelled();
            Err(ExecutionError::Cancelled)
        }
        RaceOutcome::Completed(Ok(Ok(response))) => {
            spawn_populate(&config, key, codec, plugin, &response, end_time_millis);
            crate::metrics::record_downstream();
            Ok(response)
        }
        RaceOutcome::Completed(Ok(Err(err))) => Err(ExecutionError::Downstream(err)),
        RaceOutcome::Completed(Err(join_err)) => {
            crate::metrics::record_internal_error();
            Err(ExecutionError::Internal(join_err.to_string()))
        }
    }
}

/// Runs the `simultaneous` scheduling mode: cache fetch and downstream query
/// start immediately, and the first terminal outcome wins.
///
/// A cache miss, cache error, or decode failure is not terminal — it only
/// removes the cache side from contention. The downstream outcome always
/// decides the result once the cache side has dropped out.
pub(crate) async fn run_simultaneous<Q, K, P, Cd, D>(
    config: Config,
    key_generator: Arc<K>,
    plugin: Arc<P>,
    codec: Arc<Cd>,
    downstream: Arc<D>,
    query: Q,
    cancel: CancelToken,
) -> Result<D::Response, ExecutionError<D::Error>>
where
    Q: TimeBounds + Send + 'static,
    K: KeyGenerator<Q>,
    P: CachePlugin + 'static,
    Cd: Codec<D::Response> + 'static,
    D: Downstream<Q> + 'static,
{
    let key = key_generator.generate(&query);
    let end_time_millis = if config.use_timestamps {
        query.end_time_millis()
    } else {
        None
    };

    let mut cache_handle = Some(spawn_fetch(Arc::clone(&plugin), key.clone()));
    let mut downstream_handle = Some(spawn_downstream(Arc::clone(&downstream), query));

    loop {
        tokio::select! {
            res = opt_handle(&mut cache_handle), if cache_handle.is_some() => {
                cache_handle = None;
                match res {
                    Ok(Ok(Some(bytes))) => match codec.deserialize(&bytes) {
                        Ok(value) => {
                            if let Some(h) = downstream_handle.take() {
                                abort_and_join(h).await;
                            }
                            crate::metrics::record_cache_hit();
                            return Ok(value);
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "cache decode failed, awaiting downstream");
                        }
                    },
                    Ok(Ok(None)) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "cache fetch failed, awaiting downstream");
                    }
                    Err(join_err) => {
                        tracing::warn!(error = %join_err, "cache fetch task panicked, awaiting downstream");
                    }
                }
            }
            res = opt_handle(&mut downstream_handle), if downstream_handle.is_some() => {
                downstream_handle = None;
                if let Some(h) = cache_handle.take() {
                    abort_and_join(h).await;
                }
                return match res {
                    Ok(Ok(response)) => {
                        spawn_populate(&config, key, codec, plugin, &response, end_time_millis);
                        crate::metrics::record_downstream();
                        Ok(response)
                    }
                    Ok(Err(err)) => Err(ExecutionError::Downstream(err)),
                    Err(join_err) => {
                        crate::metrics::record_internal_error();
                        Err(ExecutionError::Internal(join_err.to_string()))
                    }
                };
            }
            _ = cancel.cancelled() => {
                if let Some(h) = cache_handle.take() {
                    abort_and_join(h).await;
                }
                if let Some(h) = downstream_handle.take() {
                    abort_and_join(h).await;
                }
                crate::metrics::record_cancelled();
                return Err(ExecutionError::Cancelled);
            }
        }
    }
}
