//! replica-router - consistency-aware request routing for a replicated
//! log-structured key-value store
//!
//! A routed database decides per call whether an operation is served by the
//! local replica or forwarded to the current primary, and hands the caller one
//! uniform asynchronous result either way. The LSN wait-list lets callers
//! synchronize with replication progress.

pub mod cli;
pub mod engine;
pub mod lsn;
pub mod observability;
pub mod policy;
pub mod result;
pub mod role;
pub mod router;
pub mod transport;

pub use engine::{
    ByteRangeComparator, DefaultComparator, InsertGroup, InsertRecord, LocalCatalog,
    LocalDatabase, PayloadKind, PersistenceManager, ReadOperations, ResultSet, SnapshotView,
    UserDefinedLookup,
};
pub use lsn::{Lsn, LsnError, LsnResult, LsnWaitList, WaitHandle};
pub use policy::{AccessMode, ConsistencyPolicy, ReplicationPolicy};
pub use result::{AsyncResult, Completer, Promise, RequestContext};
pub use role::{ReplicaRole, ReplicaRoleSnapshot, RoleOracle, SharedRoleState};
pub use router::{
    ConfigError, ErrorCode, OperationKind, PolicySetting, RoutePlan, RoutedDatabase,
    RouterCollaborators, RouterConfig, RouterError, RouterResult, Target,
};
pub use transport::{ReplicationClient, ResponseFuture, TransportError, WireErrorCode};
