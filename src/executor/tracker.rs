//! Task Tracker
//!
//! A concurrent status table for the tasks of one run. Workers update it as they
//! move through `Pending -> Running -> Completed/Failed`; the runner and the
//! stats reporter read it without taking any global lock.

use super::types::*;

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared task state for a run.
pub struct TaskTracker {
    /// Structure: `Task ID -> (input name, status)`.
    tasks: DashMap<TaskId, (String, TaskStatus)>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl TaskTracker {
    /// Creates a new, empty tracker.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a task as `Pending`.
    pub fn register(&self, task: &Task) {
        self.tasks
            .insert(task.id.clone(), (task.input.clone(), TaskStatus::Pending));
    }

    /// Marks a task as `Running` and updates the concurrency high-water mark.
    pub fn mark_running(&self, task_id: &TaskId) {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            entry.1 = TaskStatus::Running;
        }

        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_running, Ordering::SeqCst);

        tracing::trace!("Task {} running ({} active)", task_id.0, now_running);
    }

    /// Records the final status of a task.
    ///
    /// A task still marked `Running` is released from the running count, whichever
    /// path finishes it.
    pub fn finish(&self, task_id: &TaskId, status: TaskStatus) {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            if matches!(entry.1, TaskStatus::Running) {
                self.running.fetch_sub(1, Ordering::SeqCst);
            }
            entry.1 = status;
        }
    }

    pub fn status(&self, task_id: &TaskId) -> Option<TaskStatus> {
        self.tasks.get(task_id).map(|entry| entry.1.clone())
    }

    /// Number of processes currently running.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Highest number of processes that were running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Counts of `(pending, running, completed, failed)` tasks.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for entry in self.tasks.iter() {
            match entry.value().1 {
                TaskStatus::Pending => counts.0 += 1,
                TaskStatus::Running => counts.1 += 1,
                TaskStatus::Completed => counts.2 += 1,
                TaskStatus::Failed { .. } => counts.3 += 1,
            }
        }
        counts
    }

    /// Input names of the tasks that failed.
    pub fn failed_inputs(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|entry| matches!(entry.value().1, TaskStatus::Failed { .. }))
            .map(|entry| entry.value().0.clone())
            .collect()
    }
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self {
            tasks: DashMap::new(),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}
