//! Storage engine seams
//!
//! The router never touches storage. It talks to the local engine and to the
//! write path through the traits below, all of which answer with the uniform
//! `AsyncResult` contract.

mod comparator;
mod records;

use std::sync::Arc;

pub use comparator::{ByteRangeComparator, DefaultComparator, SnapshotView, UserDefinedLookup};
pub use records::{InsertGroup, InsertRecord, PayloadKind, ResultSet};

use crate::result::{AsyncResult, RequestContext};
use crate::router::RouterResult;

/// Read surface shared by local and remote executors.
pub trait ReadOperations: Send + Sync {
    /// Point lookup. `None` when the key is absent.
    fn lookup(
        &self,
        index_id: u32,
        key: &[u8],
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>>;

    /// All entries whose key starts with `prefix`, ascending.
    fn prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet>;

    /// All entries whose key starts with `prefix`, descending.
    fn reverse_prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet>;

    /// Entries with `from <= key < to`, ascending.
    fn range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet>;

    /// Entries between `from` and `to`, descending.
    fn reverse_range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet>;
}

/// Handle to a database held by the local replica
pub trait LocalDatabase: ReadOperations {
    fn name(&self) -> &str;

    /// Run caller-supplied code against a consistent local snapshot.
    fn user_defined_lookup(
        &self,
        lookup: Arc<dyn UserDefinedLookup>,
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>>;

    /// Key-ordering comparators, one per index.
    fn comparators(&self) -> Vec<Arc<dyn ByteRangeComparator>>;

    fn shutdown(&self) -> RouterResult<()>;
}

/// Resolves local database handles by name
pub trait LocalCatalog: Send + Sync {
    /// Fails with `NoSuchDatabase` when the local replica does not hold `name`.
    fn local_database(&self, name: &str) -> RouterResult<Arc<dyn LocalDatabase>>;
}

/// Replication-aware write path
///
/// Decides internally whether a payload is applied locally or shipped to the
/// primary.
pub trait PersistenceManager: Send + Sync {
    fn make_persistent(
        &self,
        kind: PayloadKind,
        group: InsertGroup,
        context: RequestContext,
    ) -> AsyncResult<()>;
}
