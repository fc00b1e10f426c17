//! Change observers
//!
//! Observers are notified once per reconciled edit, after the snapshot has
//! settled. They receive the snapshot immutably, so an observer can never
//! feed a write back into the transaction that notified it.

use std::sync::Arc;

use wizard_snapshot::FormSnapshot;

use crate::changeset::ChangeSet;

/// Receives settled change sets
pub trait ChangeObserver: Send + Sync {
    /// Called once per edit that changed at least one field
    fn on_change(&self, changes: &ChangeSet, snapshot: &FormSnapshot);
}

impl<F> ChangeObserver for F
where
    F: Fn(&ChangeSet, &FormSnapshot) + Send + Sync,
{
    fn on_change(&self, changes: &ChangeSet, snapshot: &FormSnapshot) {
        self(changes, snapshot);
    }
}

/// Ordered list of observers
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl ObserverSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; notification follows registration order
    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    /// Notify every observer, skipping change sets that changed nothing
    pub fn notify(&self, changes: &ChangeSet, snapshot: &FormSnapshot) {
        if !changes.changed() {
            return;
        }
        for observer in &self.observers {
            observer.on_change(changes, snapshot);
        }
    }

    /// Number of observers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}
