//! LSN Wait-List
//!
//! Callers register "notify me once the applied LSN reaches X"; the replay
//! machinery calls `advance` as the applied position moves forward.
//!
//! Invariants:
//! - A waiter fires iff the latest applied LSN >= its target, and at most once
//! - A cancelled waiter never fires
//! - `advance` fires every newly satisfied waiter in ascending
//!   (target, registration order) before it returns
//! - Waiters already satisfied at registration fire on the notifier thread,
//!   never on the registering caller's stack
//! - While an advance is firing, satisfied registrations join the end of its
//!   batch, so they never overtake earlier waiters with the same target
//! - No callback runs while the waiter map is locked

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use super::errors::{LsnError, LsnResult};
use super::position::Lsn;
use crate::observability::{log_event, Event, RouterMetrics};
use crate::result::{AsyncResult, RequestContext};

const DEFAULT_NOTIFIER_NAME: &str = "lsn-notifier";

type WaitCallback = Box<dyn FnOnce(Lsn) + Send>;

/// A callback whose target was already reached when it was registered.
struct Deferred {
    callback: WaitCallback,
    latest: Lsn,
}

/// Identifies one registration for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaitHandle {
    target: Lsn,
    ticket: u64,
}

impl WaitHandle {
    pub fn target(&self) -> Lsn {
        self.target
    }
}

struct WaitListInner {
    latest: Lsn,
    next_ticket: u64,
    /// Keyed by (target, ticket): ascending target, FIFO among equal targets.
    waiters: BTreeMap<(Lsn, u64), WaitCallback>,
    /// Set while `advance` runs its batch outside the lock.
    advancing: bool,
    /// Satisfied registrations made while `advancing`, in arrival order.
    late: Vec<WaitCallback>,
}

/// Ordered set of pending LSN waiters driven by one progress source.
pub struct LsnWaitList {
    inner: Mutex<WaitListInner>,
    /// Serializes `advance` so firing order holds across advances.
    advance_gate: Mutex<()>,
    notifier: Mutex<Option<Sender<Deferred>>>,
    worker: Option<JoinHandle<()>>,
    metrics: Arc<RouterMetrics>,
}

impl LsnWaitList {
    /// Create a wait-list whose applied position starts at `initial`.
    pub fn new(initial: Lsn) -> LsnResult<Self> {
        Self::with_thread_name(initial, DEFAULT_NOTIFIER_NAME)
    }

    /// Like `new`, naming the notifier thread.
    pub fn with_thread_name(initial: Lsn, thread_name: &str) -> LsnResult<Self> {
        let (tx, rx) = mpsc::channel::<Deferred>();
        let worker = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                for deferred in rx {
                    run_callback(deferred.callback, deferred.latest);
                }
            })
            .map_err(|e| LsnError::Notifier(e.to_string()))?;

        Ok(Self {
            inner: Mutex::new(WaitListInner {
                latest: initial,
                next_ticket: 0,
                waiters: BTreeMap::new(),
                advancing: false,
                late: Vec::new(),
            }),
            advance_gate: Mutex::new(()),
            notifier: Mutex::new(Some(tx)),
            worker: Some(worker),
            metrics: Arc::new(RouterMetrics::new()),
        })
    }

    /// Share a metrics registry with other components.
    pub fn with_metrics(mut self, metrics: Arc<RouterMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<RouterMetrics> {
        &self.metrics
    }

    fn lock(&self) -> MutexGuard<'_, WaitListInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest applied LSN recorded so far.
    pub fn latest(&self) -> Lsn {
        self.lock().latest
    }

    /// Number of waiters not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Register `callback` to run once the applied LSN reaches `target`.
    ///
    /// The callback receives the applied LSN observed when it fired.
    pub fn register<F>(&self, target: Lsn, callback: F) -> WaitHandle
    where
        F: FnOnce(Lsn) + Send + 'static,
    {
        let mut inner = self.lock();
        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        let handle = WaitHandle { target, ticket };

        if inner.latest >= target && inner.advancing {
            inner.late.push(Box::new(callback));
        } else if inner.latest >= target {
            let latest = inner.latest;
            drop(inner);
            self.metrics.add_waiters_fired(1);
            self.defer(Box::new(callback), latest);
        } else {
            inner.waiters.insert((target, ticket), Box::new(callback));
        }
        handle
    }

    /// Result that completes with the applied LSN once `target` is reached.
    pub fn await_lsn(&self, target: Lsn) -> AsyncResult<Lsn> {
        let (completer, result) = AsyncResult::pending(RequestContext::empty());
        self.register(target, move |latest| {
            completer.succeed(latest);
        });
        result
    }

    /// Remove a waiter that has not fired. Returns false if it already fired
    /// (or is firing) or was cancelled before.
    pub fn cancel(&self, handle: &WaitHandle) -> bool {
        let removed = {
            let mut inner = self.lock();
            inner.waiters.remove(&(handle.target, handle.ticket))
        };
        match removed {
            Some(callback) => {
                drop(callback);
                self.metrics.increment_waiters_cancelled();
                log_event(
                    Event::WaiterCancelled,
                    &[("target", handle.target.to_string().as_str())],
                );
                true
            }
            None => false,
        }
    }

    /// Record a new applied position and fire every waiter it satisfies.
    ///
    /// Returns the number of waiters fired, including satisfied ones
    /// registered while the batch was running. A position lower than the
    /// recorded one is refused and logged as FATAL; state is left unchanged.
    /// Callbacks run on the calling thread and must not call `advance`.
    pub fn advance(&self, new_latest: Lsn) -> LsnResult<usize> {
        let _gate = self
            .advance_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let ready = {
            let mut inner = self.lock();
            if new_latest < inner.latest {
                let latest = inner.latest;
                drop(inner);
                self.metrics.increment_lsn_regressions();
                log_event(
                    Event::LsnRegression,
                    &[
                        ("attempted", new_latest.to_string().as_str()),
                        ("latest", latest.to_string().as_str()),
                    ],
                );
                return Err(LsnError::Regression {
                    latest,
                    attempted: new_latest,
                });
            }

            inner.latest = new_latest;
            inner.advancing = true;
            let mut ready = Vec::new();
            while let Some(entry) = inner.waiters.first_entry() {
                if entry.key().0 > new_latest {
                    break;
                }
                ready.push(entry.remove());
            }
            ready
        };

        let mut fired = ready.len();
        for callback in ready {
            run_callback(callback, new_latest);
        }
        loop {
            let late = {
                let mut inner = self.lock();
                let late = std::mem::take(&mut inner.late);
                inner.advancing = !late.is_empty();
                late
            };
            if late.is_empty() {
                break;
            }
            fired += late.len();
            for callback in late {
                run_callback(callback, new_latest);
            }
        }

        self.metrics.add_waiters_fired(fired as u64);
        log_event(
            Event::LsnAdvanced,
            &[
                ("fired", fired.to_string().as_str()),
                ("latest", new_latest.to_string().as_str()),
            ],
        );
        Ok(fired)
    }

    fn defer(&self, callback: WaitCallback, latest: Lsn) {
        let deferred = Deferred { callback, latest };
        let rejected = {
            let notifier = self.notifier.lock().unwrap_or_else(PoisonError::into_inner);
            match notifier.as_ref() {
                Some(tx) => tx.send(deferred).err().map(|e| e.0),
                None => Some(deferred),
            }
        };
        // Notifier gone: firing inline is the only way to honour the waiter.
        if let Some(deferred) = rejected {
            run_callback(deferred.callback, deferred.latest);
        }
    }
}

/// Run one waiter callback, containing a panic to that callback.
fn run_callback(callback: WaitCallback, latest: Lsn) {
    if panic::catch_unwind(AssertUnwindSafe(move || callback(latest))).is_err() {
        log_event(Event::WaiterPanicked, &[("latest", latest.to_string().as_str())]);
    }
}

impl fmt::Debug for LsnWaitList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("LsnWaitList")
            .field("latest", &inner.latest)
            .field("pending", &inner.waiters.len())
            .finish()
    }
}

impl Drop for LsnWaitList {
    fn drop(&mut self) {
        // Closing the channel lets the notifier drain and exit.
        let notifier = self
            .notifier
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(notifier);

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Box<dyn FnOnce(Lsn) + Send>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);
        let make = move |tag: u32| -> Box<dyn FnOnce(Lsn) + Send> {
            let shared = Arc::clone(&shared);
            Box::new(move |_| shared.lock().unwrap().push(tag))
        };
        (log, make)
    }

    #[test]
    fn test_advance_fires_in_target_then_fifo_order() {
        let list = LsnWaitList::new(Lsn::ZERO).unwrap();
        let (log, make) = recorder();

        list.register(Lsn::new(1, 10), make(10));
        list.register(Lsn::new(1, 7), make(71));
        list.register(Lsn::new(1, 5), make(5));
        list.register(Lsn::new(1, 7), make(72));

        assert_eq!(list.advance(Lsn::new(1, 7)).unwrap(), 3);
        assert_eq!(*log.lock().unwrap(), vec![5, 71, 72]);
        assert_eq!(list.pending(), 1);
    }

    #[test]
    fn test_registration_during_advance_keeps_fifo() {
        let list = Arc::new(LsnWaitList::new(Lsn::ZERO).unwrap());
        let (log, make) = recorder();
        let target = Lsn::new(1, 7);

        let first = make(1);
        let late = make(3);
        let reentrant = Arc::clone(&list);
        list.register(target, move |latest| {
            first(latest);
            reentrant.register(target, late);
        });
        list.register(target, make(2));

        assert_eq!(list.advance(target).unwrap(), 3);
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(list.pending(), 0);
    }

    #[test]
    fn test_already_satisfied_fires_without_advance() {
        let list = LsnWaitList::new(Lsn::new(2, 3)).unwrap();
        let (tx, rx) = channel();
        list.register(Lsn::new(2, 3), move |latest| {
            tx.send(latest).unwrap();
        });
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Lsn::new(2, 3)
        );
        assert_eq!(list.pending(), 0);
    }

    #[test]
    fn test_immediate_fire_is_not_inline() {
        let list = LsnWaitList::new(Lsn::new(1, 1)).unwrap();
        let caller = thread::current().id();
        let (tx, rx) = channel();
        list.register(Lsn::new(1, 1), move |_| {
            tx.send(thread::current().id()).unwrap();
        });
        let fired_on = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(fired_on, caller);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let list = LsnWaitList::new(Lsn::ZERO).unwrap();
        let (log, make) = recorder();
        let handle = list.register(Lsn::new(1, 4), make(4));

        assert!(list.cancel(&handle));
        assert!(!list.cancel(&handle));
        list.advance(Lsn::new(1, 9)).unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let list = LsnWaitList::new(Lsn::ZERO).unwrap();
        let (log, make) = recorder();
        let handle = list.register(Lsn::new(1, 1), make(1));
        list.advance(Lsn::new(1, 1)).unwrap();
        assert!(!list.cancel(&handle));
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_regression_refused() {
        let list = LsnWaitList::new(Lsn::new(1, 5)).unwrap();
        let err = list.advance(Lsn::new(1, 4)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(list.latest(), Lsn::new(1, 5));
        assert_eq!(list.metrics().snapshot().lsn_regressions, 1);
    }

    #[test]
    fn test_same_lsn_advance_is_legal() {
        let list = LsnWaitList::new(Lsn::new(1, 5)).unwrap();
        assert_eq!(list.advance(Lsn::new(1, 5)).unwrap(), 0);
    }

    #[test]
    fn test_await_lsn() {
        let list = LsnWaitList::new(Lsn::ZERO).unwrap();
        let result = list.await_lsn(Lsn::new(3, 1));
        assert!(!result.is_done());
        list.advance(Lsn::new(3, 2)).unwrap();
        assert_eq!(result.get(), Ok(Lsn::new(3, 2)));
    }

    #[test]
    fn test_panicking_callback_does_not_poison() {
        let list = LsnWaitList::new(Lsn::ZERO).unwrap();
        let (log, make) = recorder();
        list.register(Lsn::new(1, 1), |_| panic!("waiter bug"));
        list.register(Lsn::new(1, 1), make(2));
        assert_eq!(list.advance(Lsn::new(1, 1)).unwrap(), 2);
        assert_eq!(*log.lock().unwrap(), vec![2]);
    }
}
