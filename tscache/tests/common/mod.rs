//! Hand-rolled in-memory collaborators used by the integration tests.
//!
//! Each mock exposes a "trigger" method the test drives explicitly, plus a
//! way to observe whether it was cancelled before it got to deliver an
//! outcome — this is how the cancellation-propagation properties (P6, P7)
//! are mechanically checked without a real cache backend or transport.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, Notify, oneshot};

use tscache::{CacheKey, CachePlugin, Codec, CodecError, Downstream, KeyGenerator, TimeBounds};

/// A query used throughout the integration tests.
#[derive(Clone, Debug)]
pub struct TestQuery {
    pub id: String,
    pub end_time_millis: Option<i64>,
}

impl TestQuery {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            end_time_millis: None,
        }
    }

    pub fn with_end_time(mut self, end_time_millis: i64) -> Self {
        self.end_time_millis = Some(end_time_millis);
        self
    }
}

impl TimeBounds for TestQuery {
    fn end_time_millis(&self) -> Option<i64> {
        self.end_time_millis
    }
}

/// The decoded, typed response downstream and the cache agree on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestResult(pub String);

impl TestResult {
    pub fn empty() -> Self {
        Self(String::new())
    }
}

/// Downstream query failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestError(pub String);

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test error: {}", self.0)
    }
}

impl StdError for TestError {}

/// Identity codec: `TestResult`'s string, UTF-8 encoded.
pub struct TestCodec;

impl Codec<TestResult> for TestCodec {
    fn serialize(&self, value: &TestResult) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(value.0.clone()))
    }

    fn deserialize(&self, bytes: &Bytes) -> Result<TestResult, CodecError> {
        std::str::from_utf8(bytes)
            .map(|s| TestResult(s.to_string()))
            .map_err(|err| CodecError::Deserialize(Box::new(err)))
    }
}

/// A codec whose `deserialize` always fails, for exercising the
/// decode-failure-treated-as-miss policy.
pub struct FailingDecodeCodec;

impl Codec<TestResult> for FailingDecodeCodec {
    fn serialize(&self, value: &TestResult) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(value.0.clone()))
    }

    fn deserialize(&self, _bytes: &Bytes) -> Result<TestResult, CodecError> {
        Err(CodecError::Deserialize(Box::new(TestError(
            "corrupt bytes".to_string(),
        ))))
    }
}

/// Derives a key verbatim from the query id.
pub struct TestKeyGenerator;

impl KeyGenerator<TestQuery> for TestKeyGenerator {
    fn generate(&self, query: &TestQuery) -> CacheKey {
        CacheKey::from(query.id.clone())
    }
}

/// A future that records whether it was dropped before delivering its
/// value, for observing cancellation of the subrequest it stands in for.
struct ControllableFuture<T> {
    receiver: oneshot::Receiver<T>,
    cancelled: Arc<AtomicBool>,
    delivered: bool,
}

impl<T> Future for ControllableFuture<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(value)) => {
                self.delivered = true;
                Poll::Ready(value)
            }
            Poll::Ready(Err(_)) => Poll::Pending,
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for ControllableFuture<T> {
    fn drop(&mut self) {
        if !self.delivered {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

/// Waits until `is_ready` reports `true`, re-checking after every
/// notification so a `notify` racing with the check is never missed.
async fn wait_until(notify: &Notify, mut is_ready: impl FnMut() -> bool) {
    loop {
        let notified = notify.notified();
        if is_ready() {
            return;
        }
        notified.await;
    }
}

/// A cache plugin whose `fetch`/`cache` outcomes are driven explicitly by
/// the test, one in-flight call at a time.
#[derive(Clone, Default)]
pub struct MockCachePlugin {
    fetch_calls: Arc<AtomicUsize>,
    cache_calls: Arc<AtomicUsize>,
    fetch_cancelled: Arc<AtomicBool>,
    pending_fetch: Arc<Mutex<Option<oneshot::Sender<Result<Option<Bytes>, TestError>>>>>,
    registered: Arc<Notify>,
}

impl MockCachePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn cache_calls(&self) -> usize {
        self.cache_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_cancelled(&self) -> bool {
        self.fetch_cancelled.load(Ordering::SeqCst)
    }

    /// Delivers the outcome for the most recently started `fetch` call,
    /// waiting for that call to register if it hasn't reached the point of
    /// awaiting its outcome yet.
    pub async fn resolve_fetch(&self, outcome: Result<Option<Bytes>, TestError>) {
        wait_until(&self.registered, || {
            self.pending_fetch.try_lock().map(|g| g.is_some()).unwrap_or(false)
        })
        .await;
        let sender = self
            .pending_fetch
            .lock()
            .await
            .take()
            .expect("resolve_fetch called with no fetch in flight");
        let _ = sender.send(outcome);
    }
}

#[async_trait]
impl CachePlugin for MockCachePlugin {
    type Error = TestError;

    async fn fetch(&self, _key: &CacheKey) -> Result<Option<Bytes>, Self::Error> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        *self.pending_fetch.lock().await = Some(tx);
        self.registered.notify_waiters();
        ControllableFuture {
            receiver: rx,
            cancelled: Arc::clone(&self.fetch_cancelled),
            delivered: false,
        }
        .await
    }

    async fn cache(&self, _key: &CacheKey, _value: Bytes, _ttl: Duration) -> Result<(), Self::Error> {
        self.cache_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A downstream executor whose `execute_query` outcome is driven explicitly
/// by the test, one in-flight call at a time.
#[derive(Clone, Default)]
pub struct MockDownstream {
    execute_calls: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
    pending: Arc<Mutex<Option<oneshot::Sender<Result<TestResult, TestError>>>>>,
    registered: Arc<Notify>,
}

impl MockDownstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Delivers the outcome for the most recently started `execute_query`
    /// call, waiting for that call to register first.
    pub async fn resolve(&self, outcome: Result<TestResult, TestError>) {
        wait_until(&self.registered, || {
            self.pending.try_lock().map(|g| g.is_some()).unwrap_or(false)
        })
        .await;
        let sender = self
            .pending
            .lock()
            .await
            .take()
            .expect("resolve called with no downstream call in flight");
        let _ = sender.send(outcome);
    }
}

impl Downstream<TestQuery> for MockDownstream {
    type Response = TestResult;
    type Error = TestError;
    type Future = BoxFuture<'static, Result<TestResult, TestError>>;

    fn execute_query(&self, _query: TestQuery) -> Self::Future {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        let pending = Arc::clone(&self.pending);
        let registered = Arc::clone(&self.registered);
        let cancelled = Arc::clone(&self.cancelled);
        Box::pin(async move {
            *pending.lock().await = Some(tx);
            registered.notify_waiters();
            ControllableFuture {
                receiver: rx,
                cancelled,
                delivered: false,
            }
            .await
        })
    }
}
