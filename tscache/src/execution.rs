//! The caller-facing handle returned by [`crate::Executor::execute_query`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tscache_core::ExecutionError;

use crate::cancel::CancelToken;

/// A single in-flight query execution.
///
/// `Execution` is itself a [`Future`]: polling it drives nothing (the
/// coordination runs in a detached task), it only observes the eventual
/// result. Dropping an `Execution` does not cancel it — call
/// [`Execution::cancel`] explicitly, or cancel the whole [`crate::Executor`]
/// via [`crate::Executor::close`].
pub struct Execution<R, E> {
    receiver: oneshot::Receiver<Result<R, ExecutionError<E>>>,
    cancel: CancelToken,
}

impl<R, E> Execution<R, E> {
    pub(crate) fn new(
        receiver: oneshot::Receiver<Result<R, ExecutionError<E>>>,
        cancel: CancelToken,
    ) -> Self {
        Self { receiver, cancel }
    }

    /// Requests cancellation of this execution.
    ///
    /// Idempotent, and safe to call after the execution has already
    /// completed. The in-flight subrequests (cache fetch, downstream query)
    /// are aborted as soon as the driver observes the request; the future
    /// resolves to [`ExecutionError::Cancelled`] once that happens.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl<R, E> Future for Execution<R, E> {
    type Output = Result<R, ExecutionError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match futures::ready!(Pin::new(&mut self.receiver).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(_) => Poll::Ready(Err(ExecutionError::Internal(
                "execution driver task dropped without producing a result".to_string(),
            ))),
        }
    }
}
