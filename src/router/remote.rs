//! Remote Future Adapter
//!
//! Wraps a pending transport response into the uniform `AsyncResult`.
//! The adapter subscribes once and re-publishes a single translated outcome,
//! so the listener path and the blocking path always see the same error.

use std::net::SocketAddr;
use std::sync::Arc;

use super::errors::RouterError;
use crate::engine::{ReadOperations, ResultSet};
use crate::observability::{log_event, Event, RouterMetrics};
use crate::result::{AsyncResult, RequestContext};
use crate::transport::{ReplicationClient, ResponseFuture, TransportError, WireErrorCode};

/// Map a transport failure onto the router error taxonomy.
pub fn translate(error: TransportError) -> RouterError {
    match error {
        TransportError::ErrorCode {
            code: WireErrorCode::DbUnavailable,
            message,
        } => RouterError::NoSuchDatabase(message),
        TransportError::ErrorCode {
            code: WireErrorCode::EntryUnavailable,
            message,
        } => RouterError::NoSuchIndex(message),
        other => RouterError::ReplicationFailure(other.to_string()),
    }
}

/// Expose a pending remote response through the uniform result contract.
pub fn adapt<T>(response: ResponseFuture<T>, context: RequestContext) -> AsyncResult<T>
where
    T: Clone + Send + 'static,
{
    let (completer, result) = AsyncResult::pending(context);
    response.on_settled(move |outcome| {
        completer.complete(outcome.map_err(translate));
    });
    result
}

/// Executes reads at the primary through the transport client.
pub struct RemoteExecutor {
    client: Arc<dyn ReplicationClient>,
    address: SocketAddr,
    database: String,
    metrics: Arc<RouterMetrics>,
}

impl RemoteExecutor {
    pub fn new(
        client: Arc<dyn ReplicationClient>,
        address: SocketAddr,
        database: impl Into<String>,
        metrics: Arc<RouterMetrics>,
    ) -> Self {
        Self {
            client,
            address,
            database: database.into(),
            metrics,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Adapt `response` and record a translated failure once.
    fn forward<T>(&self, response: ResponseFuture<T>, context: RequestContext) -> AsyncResult<T>
    where
        T: Clone + Send + 'static,
    {
        let result = adapt(response, context);
        let metrics = Arc::clone(&self.metrics);
        let address = self.address;
        let database = self.database.clone();
        result.register_listener(move |outcome, ctx| {
            if let Err(err) = outcome {
                metrics.record_remote_failure(err.code());
                log_event(
                    Event::RemoteFailed,
                    &[
                        ("database", database.as_str()),
                        ("primary", address.to_string().as_str()),
                        ("code", err.code().as_str()),
                        ("error", err.to_string().as_str()),
                        ("request_id", ctx.request_id().to_string().as_str()),
                    ],
                );
            }
        });
        result
    }
}

impl ReadOperations for RemoteExecutor {
    fn lookup(
        &self,
        index_id: u32,
        key: &[u8],
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>> {
        let response = self
            .client
            .lookup(self.address, &self.database, index_id, key);
        self.forward(response, context)
    }

    fn prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        let response = self
            .client
            .prefix_lookup(self.address, &self.database, index_id, prefix);
        self.forward(response, context)
    }

    fn reverse_prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        let response =
            self.client
                .reverse_prefix_lookup(self.address, &self.database, index_id, prefix);
        self.forward(response, context)
    }

    fn range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        let response = self
            .client
            .range_lookup(self.address, &self.database, index_id, from, to);
        self.forward(response, context)
    }

    fn reverse_range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        let response =
            self.client
                .reverse_range_lookup(self.address, &self.database, index_id, from, to);
        self.forward(response, context)
    }
}
