//! Task registry — the running/finished collections and their concurrency contract.
//!
//! All task state lives behind one `tokio::sync::Mutex`. Every operation,
//! reads included, takes the lock for a short synchronous critical section
//! and never awaits while holding it. That single discipline carries the
//! registry's guarantees:
//!
//! - check-and-insert on admission is atomic, so concurrent submissions of
//!   the same identifier admit exactly one record
//! - the running→finished move happens in one critical section, so an
//!   identifier is observable in exactly one collection at every instant
//! - readers receive whole-record snapshots copied under the lock, never a
//!   torn multi-field write
//!
//! Collections are insertion-ordered vectors scanned linearly; a registry
//! holds tens of tasks, not millions, and order is part of the listing
//! contract.

use crate::fetch::FetchProgress;
use crate::types::{TaskCollection, TaskCompletion, TaskId, TaskRecord, TaskSnapshot};
use tokio::sync::Mutex;

struct State {
    running: Vec<TaskRecord>,
    finished: Vec<TaskRecord>,
}

/// Owner of all task records, partitioned by lifecycle phase
pub struct TaskRegistry {
    state: Mutex<State>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                running: Vec::new(),
                finished: Vec::new(),
            }),
        }
    }

    /// Atomically return the existing record for `id` or admit a new one
    ///
    /// Checks running first, then finished: a resubmission of a finished
    /// identifier returns the terminal record instead of re-running it (the
    /// identifier would otherwise exist in both collections at once). Only
    /// after the finished entry is purged does resubmission admit a fresh
    /// record. The second element is true when a new record was admitted.
    pub async fn admit_or_get(&self, id: TaskId, source_url: &str) -> (TaskSnapshot, bool) {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.running.iter().find(|record| record.id == id) {
            return (existing.snapshot(), false);
        }
        if let Some(existing) = state.finished.iter().find(|record| record.id == id) {
            return (existing.snapshot(), false);
        }

        let record = TaskRecord::new(id, source_url);
        let snapshot = record.snapshot();
        state.running.push(record);
        (snapshot, true)
    }

    /// Apply an in-flight progress report to a running record
    ///
    /// Silently ignored when `id` is not running; a terminal record is
    /// immutable except through purge.
    pub async fn record_progress(&self, id: &TaskId, update: &FetchProgress) {
        let mut state = self.state.lock().await;
        if let Some(record) = state.running.iter_mut().find(|record| record.id == *id) {
            record.apply_progress(update);
        }
    }

    /// Apply the terminal mutation and move the record to finished
    ///
    /// Called exactly once per record by the owning job. Returns the
    /// finished snapshot, or None when `id` was not running.
    pub async fn finish(&self, id: &TaskId, completion: TaskCompletion) -> Option<TaskSnapshot> {
        let mut state = self.state.lock().await;
        let index = state.running.iter().position(|record| record.id == *id)?;

        let mut record = state.running.remove(index);
        record.complete(completion);
        let snapshot = record.snapshot();
        state.finished.push(record);
        Some(snapshot)
    }

    /// Snapshot the running collection in admission order
    pub async fn running(&self) -> Vec<TaskSnapshot> {
        let state = self.state.lock().await;
        state.running.iter().map(TaskRecord::snapshot).collect()
    }

    /// Snapshot the finished collection in completion order
    pub async fn finished(&self) -> Vec<TaskSnapshot> {
        let state = self.state.lock().await;
        state.finished.iter().map(TaskRecord::snapshot).collect()
    }

    /// Snapshot both collections in one consistent view
    pub async fn all(&self) -> TaskCollection {
        let state = self.state.lock().await;
        TaskCollection {
            running: state.running.iter().map(TaskRecord::snapshot).collect(),
            finished: state.finished.iter().map(TaskRecord::snapshot).collect(),
        }
    }

    /// Look up one record by identifier, finished first
    ///
    /// Finished entries are terminal and the usual target of post-completion
    /// polling, so they win the (impossible by construction) tie.
    pub async fn get(&self, id: &str) -> Option<TaskSnapshot> {
        let state = self.state.lock().await;
        state
            .finished
            .iter()
            .find(|record| record.id == *id)
            .or_else(|| state.running.iter().find(|record| record.id == *id))
            .map(TaskRecord::snapshot)
    }

    /// Number of records currently running
    pub async fn running_count(&self) -> usize {
        self.state.lock().await.running.len()
    }

    /// Remove every finished record, returning how many were removed
    pub async fn clear_finished(&self) -> usize {
        let mut state = self.state.lock().await;
        let removed = state.finished.len();
        state.finished.clear();
        removed
    }

    /// Remove finished records matching `predicate`, returning how many
    ///
    /// Running records are never touched. Matching nothing is a no-op.
    pub async fn clear_finished_matching(
        &self,
        predicate: impl Fn(&TaskRecord) -> bool,
    ) -> usize {
        let mut state = self.state.lock().await;
        let before = state.finished.len();
        state.finished.retain(|record| !predicate(record));
        before - state.finished.len()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
