//! Transport seam
//!
//! Remote calls to the primary are issued through `ReplicationClient`. Each
//! call answers with a `ResponseFuture` whose failures are transport errors;
//! the router translates them before any caller sees them.

mod errors;

use std::net::SocketAddr;

pub use errors::{TransportError, WireErrorCode};

use crate::engine::ResultSet;
use crate::result::Promise;

/// Pending remote response
pub type ResponseFuture<T> = Promise<T, TransportError>;

/// Client for read requests served by a remote replica.
pub trait ReplicationClient: Send + Sync {
    fn lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        key: &[u8],
    ) -> ResponseFuture<Option<Vec<u8>>>;

    fn prefix_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        prefix: &[u8],
    ) -> ResponseFuture<ResultSet>;

    fn reverse_prefix_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        prefix: &[u8],
    ) -> ResponseFuture<ResultSet>;

    fn range_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        from: &[u8],
        to: &[u8],
    ) -> ResponseFuture<ResultSet>;

    fn reverse_range_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        from: &[u8],
        to: &[u8],
    ) -> ResponseFuture<ResultSet>;
}
