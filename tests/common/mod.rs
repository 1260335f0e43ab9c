//! Stub collaborators shared by the integration tests.
//!
//! Every stub records the calls it receives so tests can assert which side
//! (local engine, transport, write path) served a request.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use replica_router::{
    AsyncResult, ByteRangeComparator, Completer, ConsistencyPolicy, DefaultComparator, InsertGroup,
    LocalCatalog, LocalDatabase, PayloadKind, PersistenceManager, Promise, ReadOperations,
    ReplicationClient, RequestContext, ResponseFuture, ResultSet, RoutedDatabase,
    RouterCollaborators, RouterError, RouterResult, SharedRoleState, SnapshotView,
    TransportError, UserDefinedLookup,
};

pub const DATABASE: &str = "accounts";
pub const DATABASE_ID: u32 = 3;

pub fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

pub fn local_addr() -> SocketAddr {
    addr("10.0.0.1:32222")
}

pub fn primary_addr() -> SocketAddr {
    addr("10.0.0.2:32222")
}

// =============================================================================
// Local engine
// =============================================================================

pub struct StubLocalDatabase {
    name: String,
    data: Mutex<BTreeMap<(u32, Vec<u8>), Vec<u8>>>,
    calls: Mutex<Vec<String>>,
    shut_down: AtomicBool,
}

impl StubLocalDatabase {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            data: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn put(&self, index_id: u32, key: &[u8], value: &[u8]) {
        self.data
            .lock()
            .unwrap()
            .insert((index_id, key.to_vec()), value.to_vec());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn record(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }

    fn scan<P: Fn(&[u8]) -> bool>(&self, index_id: u32, keep: P, reverse: bool) -> ResultSet {
        let data = self.data.lock().unwrap();
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = data
            .iter()
            .filter(|((idx, key), _)| *idx == index_id && keep(key.as_slice()))
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect();
        if reverse {
            entries.reverse();
        }
        ResultSet::from_entries(entries)
    }
}

impl SnapshotView for StubLocalDatabase {
    fn get(&self, index_id: u32, key: &[u8]) -> Option<Vec<u8>> {
        self.data
            .lock()
            .unwrap()
            .get(&(index_id, key.to_vec()))
            .cloned()
    }
}

impl ReadOperations for StubLocalDatabase {
    fn lookup(
        &self,
        index_id: u32,
        key: &[u8],
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>> {
        self.record("lookup");
        AsyncResult::ready(SnapshotView::get(self, index_id, key), context)
    }

    fn prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        self.record("prefix_lookup");
        AsyncResult::ready(self.scan(index_id, |k| k.starts_with(prefix), false), context)
    }

    fn reverse_prefix_lookup(
        &self,
        index_id: u32,
        prefix: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        self.record("reverse_prefix_lookup");
        AsyncResult::ready(self.scan(index_id, |k| k.starts_with(prefix), true), context)
    }

    fn range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        self.record("range_lookup");
        AsyncResult::ready(self.scan(index_id, |k| k >= from && k < to, false), context)
    }

    fn reverse_range_lookup(
        &self,
        index_id: u32,
        from: &[u8],
        to: &[u8],
        context: RequestContext,
    ) -> AsyncResult<ResultSet> {
        self.record("reverse_range_lookup");
        AsyncResult::ready(self.scan(index_id, |k| k >= from && k < to, true), context)
    }
}

impl LocalDatabase for StubLocalDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn user_defined_lookup(
        &self,
        lookup: Arc<dyn UserDefinedLookup>,
        context: RequestContext,
    ) -> AsyncResult<Option<Vec<u8>>> {
        self.record("user_defined_lookup");
        AsyncResult::ready(lookup.execute(self), context)
    }

    fn comparators(&self) -> Vec<Arc<dyn ByteRangeComparator>> {
        self.record("comparators");
        vec![Arc::new(DefaultComparator)]
    }

    fn shutdown(&self) -> RouterResult<()> {
        self.record("shutdown");
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Catalog
// =============================================================================

pub struct StubCatalog {
    database: Option<Arc<StubLocalDatabase>>,
    attachments: AtomicUsize,
}

impl StubCatalog {
    pub fn holding(database: Arc<StubLocalDatabase>) -> Arc<Self> {
        Arc::new(Self {
            database: Some(database),
            attachments: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            database: None,
            attachments: AtomicUsize::new(0),
        })
    }

    pub fn attachments(&self) -> usize {
        self.attachments.load(Ordering::SeqCst)
    }
}

impl LocalCatalog for StubCatalog {
    fn local_database(&self, name: &str) -> RouterResult<Arc<dyn LocalDatabase>> {
        match &self.database {
            Some(db) if db.name() == name => {
                self.attachments.fetch_add(1, Ordering::SeqCst);
                let db: Arc<dyn LocalDatabase> = db.clone();
                Ok(db)
            }
            _ => Err(RouterError::NoSuchDatabase(format!(
                "database '{}' does not exist locally",
                name
            ))),
        }
    }
}

// =============================================================================
// Transport
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub op: &'static str,
    pub address: SocketAddr,
    pub database: String,
    pub index_id: u32,
    pub key: Vec<u8>,
    /// Upper bound, recorded for range calls only
    pub to: Option<Vec<u8>>,
}

/// How the stub client answers remote requests.
pub enum Reply {
    /// Succeed immediately with canned values
    Succeed,
    /// Fail immediately with this error
    Fail(TransportError),
    /// Leave lookups pending until the test completes them
    Hold,
}

pub struct StubClient {
    calls: Mutex<Vec<RemoteCall>>,
    reply: Mutex<Reply>,
    held: Mutex<Vec<Completer<Option<Vec<u8>>, TransportError>>>,
}

impl StubClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(Reply::Succeed),
            held: Mutex::new(Vec::new()),
        })
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Take the completer of the oldest held lookup.
    pub fn take_held(&self) -> Completer<Option<Vec<u8>>, TransportError> {
        self.held.lock().unwrap().remove(0)
    }

    fn record(
        &self,
        op: &'static str,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        key: &[u8],
        to: Option<&[u8]>,
    ) {
        self.calls.lock().unwrap().push(RemoteCall {
            op,
            address,
            database: database.to_string(),
            index_id,
            key: key.to_vec(),
            to: to.map(|bound| bound.to_vec()),
        });
    }

    fn respond<T: Clone + Send + 'static>(&self, value: T) -> ResponseFuture<T> {
        match &*self.reply.lock().unwrap() {
            Reply::Fail(err) => Promise::settled(Err(err.clone())),
            Reply::Succeed | Reply::Hold => Promise::settled(Ok(value)),
        }
    }

    fn remote_set() -> ResultSet {
        ResultSet::from_entries(vec![(b"remote-key".to_vec(), b"remote-value".to_vec())])
    }
}

impl ReplicationClient for StubClient {
    fn lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        key: &[u8],
    ) -> ResponseFuture<Option<Vec<u8>>> {
        self.record("lookup", address, database, index_id, key, None);
        if matches!(*self.reply.lock().unwrap(), Reply::Hold) {
            let (completer, response) = Promise::channel();
            self.held.lock().unwrap().push(completer);
            return response;
        }
        self.respond(Some(b"remote-value".to_vec()))
    }

    fn prefix_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        prefix: &[u8],
    ) -> ResponseFuture<ResultSet> {
        self.record("prefix_lookup", address, database, index_id, prefix, None);
        self.respond(Self::remote_set())
    }

    fn reverse_prefix_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        prefix: &[u8],
    ) -> ResponseFuture<ResultSet> {
        self.record("reverse_prefix_lookup", address, database, index_id, prefix, None);
        self.respond(Self::remote_set())
    }

    fn range_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        from: &[u8],
        to: &[u8],
    ) -> ResponseFuture<ResultSet> {
        self.record("range_lookup", address, database, index_id, from, Some(to));
        self.respond(Self::remote_set())
    }

    fn reverse_range_lookup(
        &self,
        address: SocketAddr,
        database: &str,
        index_id: u32,
        from: &[u8],
        to: &[u8],
    ) -> ResponseFuture<ResultSet> {
        self.record("reverse_range_lookup", address, database, index_id, from, Some(to));
        self.respond(Self::remote_set())
    }
}

// =============================================================================
// Write path
// =============================================================================

pub struct StubPersistence {
    received: Mutex<Vec<(PayloadKind, InsertGroup)>>,
}

impl StubPersistence {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<(PayloadKind, InsertGroup)> {
        self.received.lock().unwrap().clone()
    }
}

impl PersistenceManager for StubPersistence {
    fn make_persistent(
        &self,
        kind: PayloadKind,
        group: InsertGroup,
        context: RequestContext,
    ) -> AsyncResult<()> {
        self.received.lock().unwrap().push((kind, group));
        AsyncResult::ready((), context)
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub db: RoutedDatabase,
    pub role: Arc<SharedRoleState>,
    pub local: Arc<StubLocalDatabase>,
    pub catalog: Arc<StubCatalog>,
    pub client: Arc<StubClient>,
    pub persistence: Arc<StubPersistence>,
}

impl Harness {
    /// Router for `DATABASE` on node `local_addr()` with the local handle
    /// attached up front when `attached` is set.
    pub fn new(policy: ConsistencyPolicy, attached: bool) -> Self {
        let role = Arc::new(SharedRoleState::new(local_addr()));
        let local = StubLocalDatabase::new(DATABASE);
        let catalog = StubCatalog::holding(Arc::clone(&local));
        let client = StubClient::new();
        let persistence = StubPersistence::new();

        let collaborators = RouterCollaborators {
            role: role.clone(),
            catalog: catalog.clone(),
            client: client.clone(),
            persistence: persistence.clone(),
        };
        let db = if attached {
            let handle: Arc<dyn LocalDatabase> = local.clone();
            RoutedDatabase::with_local(handle, DATABASE_ID, Arc::new(policy), collaborators)
        } else {
            RoutedDatabase::new(DATABASE, DATABASE_ID, Arc::new(policy), collaborators)
        };

        Self {
            db,
            role,
            local,
            catalog,
            client,
            persistence,
        }
    }

    pub fn as_replica(self) -> Self {
        self.role.set_primary(primary_addr());
        self
    }

    pub fn as_primary(self) -> Self {
        self.role.set_primary(local_addr());
        self
    }
}
