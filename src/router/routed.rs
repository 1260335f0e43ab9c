//! Routed database
//!
//! Presents the full read/write surface of one database and decides per call
//! whether the local replica or the primary serves it. Role and quorum state
//! are read once per call and never cached across calls.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::config::RouterConfig;
use super::errors::{ConfigError, RouterError, RouterResult};
use super::remote::RemoteExecutor;
use super::target::{plan_route, OperationKind, RoutePlan, Target};
use crate::engine::{
    ByteRangeComparator, InsertGroup, LocalCatalog, LocalDatabase, PayloadKind,
    PersistenceManager, ReadOperations, ResultSet, UserDefinedLookup,
};
use crate::observability::{log_event, Event, RouterMetrics};
use crate::policy::ReplicationPolicy;
use crate::result::{AsyncResult, RequestContext};
use crate::role::RoleOracle;
use crate::transport::ReplicationClient;

/// External subsystems the router consults or delegates to
#[derive(Clone)]
pub struct RouterCollaborators {
    pub role: Arc<dyn RoleOracle>,
    pub catalog: Arc<dyn LocalCatalog>,
    pub client: Arc<dyn ReplicationClient>,
    pub persistence: Arc<dyn PersistenceManager>,
}

/// Executor selected for one read
enum Executor {
    Local(Arc<dyn LocalDatabase>),
    Remote(RemoteExecutor),
}

impl ReadOperations for Executor {
    fn lookup(
        &self,
        index_id: u32,
        key: &[u8],
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>> {
        match self {
            Executor::Local(db) => db.lookup(index_id, key, context),
            Executor::Remote(remote) => remote.lookup(index_id, key, context),
        }
    }

    fn prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self {
            Executor::Local(db) => db.prefix_lookup(index_id, prefix, context),
            Executor::Remote(remote) => remote.prefix_lookup(index_id, prefix, context),
        }
    }

    fn reverse_prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self {
            Executor::Local(db) => db.reverse_prefix_lookup(index_id, prefix, context),
            Executor::Remote(remote) => remote.reverse_prefix_lookup(index_id, prefix, context),
        }
    }

    fn range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self {
            Executor::Local(db) => db.range_lookup(index_id, from, to, context),
            Executor::Remote(remote) => remote.range_lookup(index_id, from, to, context),
        }
    }

    fn reverse_range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self {
            Executor::Local(db) => db.reverse_range_lookup(index_id, from, to, context),
            Executor::Remote(remote) => remote.reverse_range_lookup(index_id, from, to, context),
        }
    }
}

/// Client-side view of one replicated database
pub struct RoutedDatabase {
    name: String,
    id: u32,
    policy: Arc<dyn ReplicationPolicy>,
    collaborators: RouterCollaborators,
    /// Attached lazily; once set it stays until shutdown.
    local: RwLock<Option<Arc<dyn LocalDatabase>>>,
    shut_down: AtomicBool,
    metrics: Arc<RouterMetrics>,
}

impl RoutedDatabase {
    /// Router without a local handle. The handle is attached on first
    /// eligible local call.
    pub fn new(
        name: impl Into<String>,
        id: u32,
        policy: Arc<dyn ReplicationPolicy>,
        collaborators: RouterCollaborators,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            policy,
            collaborators,
            local: RwLock::new(None),
            shut_down: AtomicBool::new(false),
            metrics: Arc::new(RouterMetrics::new()),
        }
    }

    /// Router around an already open local database.
    pub fn with_local(
        local: Arc<dyn LocalDatabase>,
        id: u32,
        policy: Arc<dyn ReplicationPolicy>,
        collaborators: RouterCollaborators,
    ) -> Self {
        let router = Self::new(local.name().to_string(), id, policy, collaborators);
        *router.local.write().unwrap_or_else(PoisonError::into_inner) = Some(local);
        router
    }

    pub fn from_config(
        config: &RouterConfig,
        collaborators: RouterCollaborators,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = config.consistency_policy()?;
        Ok(Self::new(
            config.database_name.clone(),
            config.database_id,
            Arc::new(policy),
            collaborators,
        ))
    }

    /// Share a metrics registry with other components.
    pub fn with_metrics(mut self, metrics: Arc<RouterMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn metrics(&self) -> &Arc<RouterMetrics> {
        &self.metrics
    }

    pub fn is_local_attached(&self) -> bool {
        self.local_handle().is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Plan for `kind` against the current role state, without acquiring
    /// anything.
    pub fn plan(&self, kind: OperationKind) -> RoutePlan {
        let snapshot = self.collaborators.role.snapshot();
        plan_route(
            &snapshot,
            self.policy.as_ref(),
            kind.access_mode(),
            self.is_local_attached(),
        )
    }

    /// Resolve where a call of `kind` executes right now.
    ///
    /// Fails with `ReplicationUnavailable` when no primary is known. Acquires
    /// the local handle when local execution is allowed and none is attached.
    pub fn resolve_target(&self, kind: OperationKind) -> RouterResult<Target> {
        self.ensure_running()?;
        let attached = self.local_handle();
        let snapshot = self.collaborators.role.snapshot();

        match plan_route(
            &snapshot,
            self.policy.as_ref(),
            kind.access_mode(),
            attached.is_some(),
        ) {
            RoutePlan::Unavailable => Err(RouterError::no_quorum()),
            RoutePlan::Remote(address) => Ok(Target::Remote(address)),
            RoutePlan::Local => match attached {
                Some(db) => Ok(Target::Local(db)),
                None => self.attach().map(Target::Local),
            },
            RoutePlan::AttachThenLocal => self.attach().map(Target::Local),
        }
    }

    /// Run caller code against a local snapshot. Never forwarded.
    pub fn user_defined_lookup(
        &self,
        lookup: Arc<dyn UserDefinedLookup>,
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>> {
        match self.local_only(OperationKind::UserDefinedLookup, &context) {
            Ok(db) => db.user_defined_lookup(lookup, context),
            Err(err) => AsyncResult::failed(err, context),
        }
    }

    /// Key-ordering comparators of the local database. Never forwarded.
    pub fn comparators(&self) -> RouterResult<Vec<Arc<dyn ByteRangeComparator>>> {
        let db = self.local_only(OperationKind::Comparators, &RequestContext::empty())?;
        Ok(db.comparators())
    }

    pub fn create_insert_group(&self) -> InsertGroup {
        InsertGroup::new(self.id)
    }

    pub fn single_insert(
        &self,
        index_id: u32,
        key: &[u8],
        value: &[u8],
        context: RequestContext,
    ) -> AsyncResult<()> {
        let mut group = self.create_insert_group();
        group.add_insert(index_id, key, value);
        self.insert(group, context)
    }

    pub fn single_delete(&self, index_id: u32, key: &[u8], context: RequestContext) -> AsyncResult<()> {
        let mut group = self.create_insert_group();
        group.add_delete(index_id, key);
        self.insert(group, context)
    }

    /// Hand an insert group to the replication-aware write path.
    ///
    /// Whether it is applied locally or shipped to the primary is decided by
    /// the persistence manager, not here.
    pub fn insert(&self, group: InsertGroup, context: RequestContext) -> AsyncResult<()> {
        if let Err(err) = self.ensure_running() {
            return AsyncResult::failed(err, context);
        }
        if self.collaborators.role.current_primary().is_none() {
            let err = RouterError::no_quorum();
            self.rejected(OperationKind::Insert, &err, &context);
            return AsyncResult::failed(err, context);
        }

        self.metrics.increment_writes();
        log_event(
            Event::WriteDispatched,
            &[
                ("database", self.name.as_str()),
                ("records", group.len().to_string().as_str()),
                ("payload", PayloadKind::Insert.as_str()),
                ("request_id", context.request_id().to_string().as_str()),
            ],
        );
        self.collaborators
            .persistence
            .make_persistent(PayloadKind::Insert, group, context)
    }

    /// Shut the attached local handle down. Later calls fail with `Shutdown`.
    pub fn shutdown(&self) -> RouterResult<()> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let local = self
            .local
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        log_event(
            Event::Shutdown,
            &[
                ("database", self.name.as_str()),
                ("local_attached", if local.is_some() { "true" } else { "false" }),
            ],
        );
        match local {
            Some(db) => db.shutdown(),
            None => Ok(()),
        }
    }

    fn ensure_running(&self) -> RouterResult<()> {
        if self.is_shut_down() {
            Err(RouterError::Shutdown(format!(
                "database '{}' has been shut down",
                self.name
            )))
        } else {
            Ok(())
        }
    }

    fn local_handle(&self) -> Option<Arc<dyn LocalDatabase>> {
        self.local
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn attach(&self) -> RouterResult<Arc<dyn LocalDatabase>> {
        let mut slot = self.local.write().unwrap_or_else(PoisonError::into_inner);
        // `shutdown` sets the flag before taking this lock, so a handle
        // installed here is always seen and released by it.
        self.ensure_running()?;
        if let Some(db) = slot.as_ref() {
            return Ok(Arc::clone(db));
        }
        let db = self.collaborators.catalog.local_database(&self.name)?;
        *slot = Some(Arc::clone(&db));
        drop(slot);

        self.metrics.increment_local_attachments();
        log_event(Event::LocalAttached, &[("database", self.name.as_str())]);
        Ok(db)
    }

    /// Pick the executor for a read, logging and counting the decision.
    fn executor(&self, kind: OperationKind, context: &RequestContext) -> RouterResult<Executor> {
        let target = match self.resolve_target(kind) {
            Ok(target) => target,
            Err(err) => {
                self.rejected(kind, &err, context);
                return Err(err);
            }
        };
        match target {
            Target::Local(db) => {
                self.metrics.increment_local_reads();
                log_event(
                    Event::RouteLocal,
                    &[
                        ("database", self.name.as_str()),
                        ("op", kind.as_str()),
                        ("request_id", context.request_id().to_string().as_str()),
                    ],
                );
                Ok(Executor::Local(db))
            }
            Target::Remote(address) => {
                self.metrics.increment_remote_reads();
                log_event(
                    Event::RouteRemote,
                    &[
                        ("database", self.name.as_str()),
                        ("op", kind.as_str()),
                        ("primary", address.to_string().as_str()),
                        ("request_id", context.request_id().to_string().as_str()),
                    ],
                );
                Ok(Executor::Remote(self.remote_executor(address)))
            }
        }
    }

    /// Resolve an operation that cannot cross the remote boundary.
    fn local_only(
        &self,
        kind: OperationKind,
        context: &RequestContext,
    ) -> RouterResult<Arc<dyn LocalDatabase>> {
        match self.resolve_target(kind) {
            Ok(Target::Local(db)) => Ok(db),
            Ok(Target::Remote(address)) => {
                self.metrics.increment_unsupported();
                log_event(
                    Event::RouteUnsupported,
                    &[
                        ("database", self.name.as_str()),
                        ("op", kind.as_str()),
                        ("primary", address.to_string().as_str()),
                        ("request_id", context.request_id().to_string().as_str()),
                    ],
                );
                Err(RouterError::unsupported(kind.as_str()))
            }
            Err(err) => {
                self.rejected(kind, &err, context);
                Err(err)
            }
        }
    }

    fn rejected(&self, kind: OperationKind, err: &RouterError, context: &RequestContext) {
        self.metrics.increment_rejected();
        log_event(
            Event::RouteRejected,
            &[
                ("database", self.name.as_str()),
                ("op", kind.as_str()),
                ("code", err.code().as_str()),
                ("error", err.to_string().as_str()),
                ("request_id", context.request_id().to_string().as_str()),
            ],
        );
    }

    fn remote_executor(&self, address: SocketAddr) -> RemoteExecutor {
        RemoteExecutor::new(
            Arc::clone(&self.collaborators.client),
            address,
            self.name.clone(),
            Arc::clone(&self.metrics),
        )
    }
}

impl ReadOperations for RoutedDatabase {
    fn lookup(
        &self,
        index_id: u32,
        key: &[u8],
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>> {
        match self.executor(OperationKind::Lookup, &context) {
            Ok(executor) => executor.lookup(index_id, key, context),
            Err(err) => AsyncResult::failed(err, context),
        }
    }

    fn prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self.executor(OperationKind::PrefixLookup, &context) {
            Ok(executor) => executor.prefix_lookup(index_id, prefix, context),
            Err(err) => AsyncResult::failed(err, context),
        }
    }

    fn reverse_prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self.executor(OperationKind::ReversePrefixLookup, &context) {
            Ok(executor) => executor.reverse_prefix_lookup(index_id, prefix, context),
            Err(err) => AsyncResult::failed(err, context),
        }
    }

    fn range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self.executor(OperationKind::RangeLookup, &context) {
            Ok(executor) => executor.range_lookup(index_id, from, to, context),
            Err(err) => AsyncResult::failed(err, context),
        }
    }

    fn reverse_range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        match self.executor(OperationKind::ReverseRangeLookup, &context) {
            Ok(executor) => executor.reverse_range_lookup(index_id, from, to, context),
            Err(err) => AsyncResult::failed(err, context),
        }
    }
}

impl fmt::Debug for RoutedDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutedDatabase")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("local_attached", &self.is_local_attached())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
