//! Authoritative in-memory task list plus load-state flags.

use std::sync::Arc;

use taskboard_core::{Task, TaskId};

/// Presentation gating derived from the store flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// A bulk load is in flight.
    Loading,
    /// The last load failed with this message.
    Failed(String),
    /// Records are available.
    Ready,
}

/// Holds the task list behind a shared handle.
///
/// Every effective mutation installs a new list, so the handle doubles as a change
/// marker for the derivation engine. Mutations that match nothing keep the old handle.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    items: Arc<Vec<Task>>,
    loading: bool,
    error: Option<String>,
}

impl RecordStore {
    /// Empty, idle store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current records in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.items
    }

    /// Shared handle to the current record list.
    #[must_use]
    pub const fn shared_tasks(&self) -> &Arc<Vec<Task>> {
        &self.items
    }

    /// Whether a load is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last load error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Gate for the presentation layer.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        if self.loading {
            LoadState::Loading
        } else if let Some(message) = &self.error {
            LoadState::Failed(message.clone())
        } else {
            LoadState::Ready
        }
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.items.iter().find(|task| task.id == *id)
    }

    /// Replace every record; clears the loading flag and any error.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.items = Arc::new(tasks);
        self.loading = false;
        self.error = None;
    }

    /// Append a record.
    pub fn insert(&mut self, task: Task) {
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.extend_from_slice(&self.items);
        next.push(task);
        self.items = Arc::new(next);
    }

    /// Replace the record sharing `task.id`. Returns `false` (and changes nothing) when absent.
    pub fn replace(&mut self, task: Task) -> bool {
        let Some(index) = self.items.iter().position(|existing| existing.id == task.id) else {
            return false;
        };
        let mut next = self.items.as_ref().clone();
        next[index] = task;
        self.items = Arc::new(next);
        true
    }

    /// Remove the record with `id`. Returns `false` (and changes nothing) when absent.
    pub fn remove(&mut self, id: &TaskId) -> bool {
        if !self.items.iter().any(|task| task.id == *id) {
            return false;
        }
        let next = self.items.iter().filter(|task| task.id != *id).cloned().collect();
        self.items = Arc::new(next);
        true
    }

    /// Set the loading flag.
    pub const fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Set or clear the error; any call also clears the loading flag.
    pub fn set_error(&mut self, message: Option<String>) {
        self.error = message;
        self.loading = false;
    }
}
