//! Single-assignment outcome cell
//!
//! A `Promise` moves from pending to settled exactly once. Listeners that
//! registered while pending run on the settling thread; listeners that
//! register later run inline. Blocking waiters and listeners always observe
//! the same outcome. A panicking listener does not keep later listeners from
//! running.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::observability::{log_event, Event};

/// Error types that can describe a completer dropped without an outcome.
pub trait Abandon {
    fn abandoned() -> Self;
}

type Listener<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

enum State<T, E> {
    Pending(Vec<Listener<T, E>>),
    Settled(Result<T, E>),
}

struct Shared<T, E> {
    state: Mutex<State<T, E>>,
    settled: Condvar,
}

impl<T, E> Shared<T, E> {
    fn pending() -> Self {
        Self {
            state: Mutex::new(State::Pending(Vec::new())),
            settled: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sets the outcome if still pending. Returns false when already settled.
fn settle<T: Clone, E: Clone>(shared: &Shared<T, E>, outcome: Result<T, E>) -> bool {
    let mut state = shared.lock();
    if matches!(*state, State::Settled(_)) {
        return false;
    }
    let previous = std::mem::replace(&mut *state, State::Settled(outcome.clone()));
    drop(state);
    shared.settled.notify_all();

    if let State::Pending(listeners) = previous {
        let registered = listeners.len();
        for (position, listener) in listeners.into_iter().enumerate() {
            let value = outcome.clone();
            if panic::catch_unwind(AssertUnwindSafe(move || listener(value))).is_err() {
                log_event(
                    Event::ListenerPanicked,
                    &[
                        ("listener", position.to_string().as_str()),
                        ("registered", registered.to_string().as_str()),
                    ],
                );
            }
        }
    }
    true
}

/// Read side of the outcome cell. Cheap to clone; clones share the outcome.
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settled = matches!(*self.shared.lock(), State::Settled(_));
        f.debug_struct("Promise").field("settled", &settled).finish()
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Abandon + Send + 'static,
{
    /// Create a pending promise and the completer that settles it.
    pub fn channel() -> (Completer<T, E>, Self) {
        let shared = Arc::new(Shared::pending());
        let completer = Completer {
            shared: Some(Arc::clone(&shared)),
        };
        (completer, Self { shared })
    }

    /// Create an already settled promise.
    pub fn settled(outcome: Result<T, E>) -> Self {
        let shared = Shared {
            state: Mutex::new(State::Settled(outcome)),
            settled: Condvar::new(),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Register a listener invoked exactly once with the outcome.
    pub fn on_settled<F>(&self, listener: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let outcome = {
            let mut state = self.shared.lock();
            match &mut *state {
                State::Pending(listeners) => {
                    listeners.push(Box::new(listener));
                    return;
                }
                State::Settled(outcome) => outcome.clone(),
            }
        };
        listener(outcome);
    }

    /// Block until the outcome is set.
    pub fn wait(&self) -> Result<T, E> {
        let mut state = self.shared.lock();
        loop {
            if let State::Settled(outcome) = &*state {
                return outcome.clone();
            }
            state = self
                .shared
                .settled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the outcome is set or the timeout elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, E>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        loop {
            if let State::Settled(outcome) = &*state {
                return Some(outcome.clone());
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .shared
                .settled
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Whether the outcome has been set.
    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.lock(), State::Settled(_))
    }
}

/// Write side of the outcome cell.
///
/// Dropping a completer that never settled settles the cell with
/// `E::abandoned()`, so waiters are never stranded.
pub struct Completer<T, E>
where
    T: Clone,
    E: Clone + Abandon,
{
    shared: Option<Arc<Shared<T, E>>>,
}

impl<T, E> Completer<T, E>
where
    T: Clone,
    E: Clone + Abandon,
{
    /// Set the outcome. Returns false if it was already set.
    pub fn complete(mut self, outcome: Result<T, E>) -> bool {
        match self.shared.take() {
            Some(shared) => settle(&shared, outcome),
            None => false,
        }
    }

    pub fn succeed(self, value: T) -> bool {
        self.complete(Ok(value))
    }

    pub fn fail(self, error: E) -> bool {
        self.complete(Err(error))
    }
}

impl<T, E> Drop for Completer<T, E>
where
    T: Clone,
    E: Clone + Abandon,
{
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            settle(&shared, Err(E::abandoned()));
        }
    }
}

impl<T, E> fmt::Debug for Completer<T, E>
where
    T: Clone,
    E: Clone + Abandon,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("armed", &self.shared.is_some())
            .finish()
    }
}
