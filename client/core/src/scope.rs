//! Screen Task Scope
//!
//! A [`ScreenScope`] is the lifetime of one screen. Surfaces fire intents at
//! it with [`ScreenScope::launch`]; each intent runs as its own tokio task
//! against the shared state machine. When the scope is shut down or dropped,
//! the machine's published state is disposed first and every in-flight task
//! is aborted, so nothing writes to a screen that no longer exists.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A state machine whose published state can be torn down
pub trait Disposable {
    /// Stop accepting state writes
    fn dispose(&self);
}

/// Owns a state machine and every task launched against it
pub struct ScreenScope<M: Disposable + Send + Sync + 'static> {
    machine: Arc<M>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<M: Disposable + Send + Sync + 'static> ScreenScope<M> {
    /// Create a scope around `machine`
    pub fn new(machine: M) -> Self {
        Self {
            machine: Arc::new(machine),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The scoped machine, for subscriptions and synchronous intents
    pub fn machine(&self) -> &Arc<M> {
        &self.machine
    }

    /// Spawn an operation against the machine
    ///
    /// The returned receiver yields the operation's result, or an error if
    /// the scope was shut down first. It can be dropped for fire-and-forget.
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch<F, Fut, T>(&self, op: F) -> oneshot::Receiver<T>
    where
        F: FnOnce(Arc<M>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let fut = op(Arc::clone(&self.machine));
        let handle = tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
        rx
    }

    /// Number of launched tasks that have not finished
    pub fn in_flight(&self) -> usize {
        self.tasks
            .lock()
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Dispose the machine's state and abort in-flight tasks
    pub fn shutdown(&self) {
        self.machine.dispose();
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        if !tasks.is_empty() {
            tracing::debug!(aborted = tasks.len(), "Screen scope shutting down");
        }
        for task in tasks {
            task.abort();
        }
    }
}

impl<M: Disposable + Send + Sync + 'static> Drop for ScreenScope<M> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateCell;

    struct Counter {
        state: StateCell<u32>,
    }

    impl Disposable for Counter {
        fn dispose(&self) {
            self.state.dispose();
        }
    }

    #[tokio::test]
    async fn test_launch_returns_result() {
        let scope = ScreenScope::new(Counter {
            state: StateCell::new(0),
        });

        let rx = scope.launch(|m| async move {
            m.state.update(|n| *n += 2);
            m.state.snapshot()
        });

        assert_eq!(rx.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_and_disposes() {
        let scope = ScreenScope::new(Counter {
            state: StateCell::new(0),
        });
        let (gate_tx, gate_rx) = oneshot::channel::<()>();

        let rx = scope.launch(move |m| async move {
            let _ = gate_rx.await;
            m.state.update(|n| *n = 99);
        });
        assert_eq!(scope.in_flight(), 1);

        let machine = Arc::clone(scope.machine());
        scope.shutdown();
        let _ = gate_tx.send(());

        assert!(rx.await.is_err());
        assert!(machine.state.is_disposed());
        assert_eq!(machine.state.snapshot(), 0);
    }
}
