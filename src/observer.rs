use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

use crate::query::QueryState;

/// Trait for receiving list state changes.
///
/// The controller calls `state_changed` with the full state after every
/// mutation; implementations re-render, log, or collect the snapshots.
/// Calls happen while the controller's state lock is held, so an observer
/// must not call back into the controller.
pub trait StateObserver<T>: Send + Sync {
    /// Receive the state after a change
    fn state_changed(&self, state: &QueryState<T>);
}

/// A shared reference to a state observer
pub type SharedObserver<T> = Arc<dyn StateObserver<T>>;

/// An observer that silently ignores all state changes.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl<T> StateObserver<T> for NoopObserver {
    fn state_changed(&self, _state: &QueryState<T>) {}
}

impl NoopObserver {
    /// Create a new NoopObserver wrapped in an Arc
    pub fn shared<T>() -> SharedObserver<T> {
        Arc::new(Self)
    }
}

/// An observer that keeps every emitted state in order
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct RecordingObserver<T> {
    states: Mutex<Vec<QueryState<T>>>,
}

#[cfg(test)]
impl<T> Default for RecordingObserver<T> {
    fn default() -> Self {
        Self {
            states: Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl<T: Clone> RecordingObserver<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All states received so far
    pub fn states(&self) -> Vec<QueryState<T>> {
        self.states
            .lock()
            .map(|states| states.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.states.lock().map(|states| states.len()).unwrap_or(0)
    }
}

#[cfg(test)]
impl<T: Clone + Send> StateObserver<T> for RecordingObserver<T> {
    fn state_changed(&self, state: &QueryState<T>) {
        if let Ok(mut states) = self.states.lock() {
            states.push(state.clone());
        }
    }
}
