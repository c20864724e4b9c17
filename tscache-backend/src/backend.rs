//! The cache plugin collaborator.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tscache_core::CacheKey;

use crate::error::PluginError;
use crate::metrics::{self, Timer};

/// Fetches and populates raw cached bytes for a single cache key.
///
/// A plugin is a single logical cache backend (a client for redis, moka, an
/// HTTP cache service, etc). It deals exclusively in opaque bytes; encoding
/// a query's response into those bytes is the [`crate::Codec`]'s job.
#[async_trait]
pub trait CachePlugin: Send + Sync {
    /// The error a plugin can fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up `key`, returning `Ok(None)` on a cache miss.
    async fn fetch(&self, key: &CacheKey) -> Result<Option<Bytes>, Self::Error>;

    /// Stores `value` under `key` for `ttl`.
    ///
    /// A plugin that cannot express per-entry TTL should treat `ttl` as a
    /// best-effort hint; the executor itself guarantees it only calls this
    /// with `ttl > Duration::ZERO`.
    async fn cache(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), Self::Error>;
}

#[async_trait]
impl<P> CachePlugin for std::sync::Arc<P>
where
    P: CachePlugin + ?Sized,
{
    type Error = P::Error;

    async fn fetch(&self, key: &CacheKey) -> Result<Option<Bytes>, Self::Error> {
        self.as_ref().fetch(key).await
    }

    async fn cache(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), Self::Error> {
        self.as_ref().cache(key, value, ttl).await
    }
}

/// A type-erased [`CachePlugin`] whose error has already been boxed into a
/// [`PluginError`], for executors that want to hold a plugin behind `dyn`.
#[async_trait]
pub trait DynCachePlugin: Send + Sync {
    /// See [`CachePlugin::fetch`].
    async fn fetch(&self, key: &CacheKey) -> Result<Option<Bytes>, PluginError>;

    /// See [`CachePlugin::cache`].
    async fn cache(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), PluginError>;
}

#[async_trait]
impl<P> DynCachePlugin for P
where
    P: CachePlugin,
{
    async fn fetch(&self, key: &CacheKey) -> Result<Option<Bytes>, PluginError> {
        let timer = Timer::new();
        let result = CachePlugin::fetch(self, key).await;
        match &result {
            Ok(value) => metrics::record_fetch(timer.elapsed(), value.is_some()),
            Err(_) => metrics::record_fetch_error(),
        }
        result.map_err(|err| PluginError::Backend(Box::new(err)))
    }

    async fn cache(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), PluginError> {
        let timer = Timer::new();
        let result = CachePlugin::cache(self, key, value, ttl).await;
        match &result {
            Ok(()) => metrics::record_cache(timer.elapsed()),
            Err(_) => metrics::record_cache_error(),
        }
        result.map_err(|err| PluginError::Backend(Box::new(err)))
    }
}
