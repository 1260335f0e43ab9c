//! Uniform asynchronous result returned by every database operation
//!
//! Locally served and remotely served calls look identical to the caller:
//! register a listener, block on `get`, or `.wait().await` from tokio.

use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;

use super::context::RequestContext;
use super::promise::{Abandon, Completer, Promise};
use crate::router::{RouterError, RouterResult};

/// Outcome of one database request plus the context it was issued with.
pub struct AsyncResult<T> {
    promise: Promise<T, RouterError>,
    context: RequestContext,
}

impl<T> Clone for AsyncResult<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
            context: self.context.clone(),
        }
    }
}

impl<T> fmt::Debug for AsyncResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResult")
            .field("promise", &self.promise)
            .field("context", &self.context)
            .finish()
    }
}

impl<T: Clone + Send + 'static> AsyncResult<T> {
    /// Pending result and its completer.
    pub fn pending(context: RequestContext) -> (Completer<T, RouterError>, Self) {
        let (completer, promise) = Promise::channel();
        (completer, Self { promise, context })
    }

    /// Already successful result.
    pub fn ready(value: T, context: RequestContext) -> Self {
        Self {
            promise: Promise::settled(Ok(value)),
            context,
        }
    }

    /// Already failed result.
    pub fn failed(error: RouterError, context: RequestContext) -> Self {
        Self {
            promise: Promise::settled(Err(error)),
            context,
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Register a listener invoked exactly once with the outcome and the
    /// request context.
    ///
    /// Runs inline when the outcome is already known, otherwise on the
    /// thread that completes the request.
    pub fn register_listener<F>(&self, listener: F)
    where
        F: FnOnce(RouterResult<T>, &RequestContext) + Send + 'static,
    {
        let context = self.context.clone();
        self.promise
            .on_settled(move |outcome| listener(outcome, &context));
    }

    /// Block the calling thread until the outcome is known.
    pub fn get(&self) -> RouterResult<T> {
        self.promise.wait()
    }

    /// Like `get`, giving up after `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Option<RouterResult<T>> {
        self.promise.wait_timeout(timeout)
    }

    pub fn is_done(&self) -> bool {
        self.promise.is_settled()
    }

    /// Await the outcome without blocking a runtime thread.
    pub async fn wait(self) -> RouterResult<T> {
        let (tx, rx) = oneshot::channel();
        self.promise.on_settled(move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.await.unwrap_or_else(|_| Err(RouterError::abandoned()))
    }
}
