//! Published State
//!
//! [`StateCell`] is the single owner of a state machine's published state.
//! Surfaces get read-only [`watch::Receiver`]s; only the owning machine can
//! write, and it always writes through [`StateCell::update`].
//!
//! Once a cell is disposed (its screen was torn down) every later write is
//! dropped. Disposal and writes both run under the watch channel's lock, so
//! a write racing a disposal either lands before it or not at all.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Watch-backed state owned by exactly one state machine
pub struct StateCell<S> {
    tx: watch::Sender<S>,
    disposed: AtomicBool,
}

impl<S> StateCell<S> {
    /// Create a cell holding `initial`
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            disposed: AtomicBool::new(false),
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Read the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Mutate the state and notify subscribers
    ///
    /// Returns `false` if the cell has been disposed and nothing was written.
    pub fn update(&self, f: impl FnOnce(&mut S)) -> bool {
        self.update_if(|state| {
            f(state);
            true
        })
    }

    /// Mutate the state only if `f` returns `true`
    ///
    /// `f` runs under the channel lock, so it can check and write in one step.
    pub fn update_if(&self, f: impl FnOnce(&mut S) -> bool) -> bool {
        self.tx.send_if_modified(|state| {
            if self.disposed.load(Ordering::Acquire) {
                return false;
            }
            f(state)
        })
    }

    /// Stop accepting writes
    pub fn dispose(&self) {
        self.tx.send_if_modified(|_| {
            self.disposed.store(true, Ordering::Release);
            false
        });
    }

    /// Whether [`StateCell::dispose`] has been called
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl<S: Clone> StateCell<S> {
    /// Clone the current state
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }
}

impl<S: Default> Default for StateCell<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
