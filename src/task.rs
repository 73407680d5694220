//! Batch task aggregate and the concurrent task registry
//!
//! A [`BatchTask`] tracks one submitted unit of work across all its targets.
//! All status/result mutation goes through guarded methods that enforce the
//! lifecycle: Pending -> InProgress -> {Succeeded, Failed, TimedOut}, a result
//! entry exists iff the target's status is terminal, and `completed` is
//! monotonic. Writes arriving after completion (late results from units that
//! ignored cancellation) are discarded.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::types::{PublishResult, TargetStatus, TaskId, TaskView};

/// One submitted unit of work: content plus per-target progress and results
#[derive(Debug)]
pub struct BatchTask {
    /// Unique task identifier
    pub id: TaskId,
    /// Content title, handed unchanged to every strategy
    pub title: String,
    /// Content body, handed unchanged to every strategy
    pub content: String,
    /// Opaque configuration blob passed through to strategies
    pub options: serde_json::Value,
    /// Target kinds, deduplicated, in first-seen order; fixed at creation
    pub targets: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    status_by_target: HashMap<String, TargetStatus>,
    result_by_target: HashMap<String, PublishResult>,
    completed: bool,
}

impl BatchTask {
    /// Create a task with every target initialized to Pending
    ///
    /// `targets` is deduplicated preserving first-seen order.
    pub fn new(
        id: TaskId,
        targets: Vec<String>,
        content: String,
        title: String,
        options: serde_json::Value,
    ) -> Self {
        let mut seen = HashSet::new();
        let targets: Vec<String> = targets
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let status_by_target = targets
            .iter()
            .map(|t| (t.clone(), TargetStatus::Pending))
            .collect();

        Self {
            id,
            title,
            content,
            options,
            targets,
            created_at: Utc::now(),
            status_by_target,
            result_by_target: HashMap::new(),
            completed: false,
        }
    }

    /// Current status of a target
    pub fn status_of(&self, target: &str) -> Option<TargetStatus> {
        self.status_by_target.get(target).copied()
    }

    /// Status map across all targets
    pub fn statuses(&self) -> &HashMap<String, TargetStatus> {
        &self.status_by_target
    }

    /// Results for targets that have reached a terminal status
    pub fn results(&self) -> &HashMap<String, PublishResult> {
        &self.result_by_target
    }

    /// Whether the orchestrator has finished driving this task
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Transition a target from Pending to InProgress
    ///
    /// Returns false (and changes nothing) if the task is already completed
    /// or the target is not currently Pending.
    pub fn mark_in_progress(&mut self, target: &str) -> bool {
        if self.completed {
            return false;
        }
        match self.status_by_target.get_mut(target) {
            Some(status @ TargetStatus::Pending) => {
                *status = TargetStatus::InProgress;
                true
            }
            _ => false,
        }
    }

    /// Record a terminal status and its result for a target
    ///
    /// Accepts Pending -> terminal (for targets that were never dispatched,
    /// e.g. strategy resolution failures) and InProgress -> terminal. Rejects
    /// the write when the task is completed (late result discard), when the
    /// target is already terminal, or when `status` is not terminal.
    pub fn record_terminal(
        &mut self,
        target: &str,
        status: TargetStatus,
        result: PublishResult,
    ) -> bool {
        if self.completed || !status.is_terminal() {
            return false;
        }
        match self.status_by_target.get_mut(target) {
            Some(current) if !current.is_terminal() => {
                *current = status;
                self.result_by_target.insert(target.to_string(), result);
                true
            }
            _ => false,
        }
    }

    /// Mark the task as completed; once true it never reverts
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    /// Whether the task was created more than `max_age` ago
    pub fn is_older_than(&self, max_age: Duration) -> bool {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        Utc::now() - self.created_at >= max_age
    }

    /// Build the read-only projection returned to callers
    pub fn view(&self) -> TaskView {
        let terminal = self
            .status_by_target
            .values()
            .filter(|s| s.is_terminal())
            .count();
        let progress_percent = if self.targets.is_empty() {
            0.0
        } else {
            100.0 * terminal as f32 / self.targets.len() as f32
        };

        TaskView {
            id: self.id,
            title: self.title.clone(),
            targets: self.targets.clone(),
            status_by_target: self.status_by_target.clone(),
            result_by_target: self.result_by_target.clone(),
            completed: self.completed,
            progress_percent,
            created_at: self.created_at,
        }
    }
}

/// Registry entry: the shared task plus its single-run execution lock
#[derive(Clone)]
pub(crate) struct TaskEntry {
    /// The task itself, shared between the orchestrator run and pollers
    pub(crate) task: Arc<RwLock<BatchTask>>,
    /// Per-task run lock; `try_lock` failure means a run is in progress
    pub(crate) run_lock: Arc<Mutex<()>>,
    /// Copy of the task's creation time, for lock-free expiry sweeps
    pub(crate) created_at: DateTime<Utc>,
}

/// Concurrent keyed store of active batch tasks
///
/// Never a bare module-level map: the registry owns its id counter and its
/// lifecycle (create / get / list / evict / sweep). Task mutation happens
/// through the per-entry `Arc<RwLock<BatchTask>>`, and only ever from that
/// task's single active orchestrator run.
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, TaskEntry>>,
    next_id: AtomicI64,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Create and store a task, returning its id
    ///
    /// Targets must already be validated against the strategy registry;
    /// duplicates are removed here, preserving first-seen order.
    pub async fn create(
        &self,
        targets: Vec<String>,
        content: String,
        title: String,
        options: serde_json::Value,
    ) -> TaskId {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let task = BatchTask::new(id, targets, content, title, options);
        let entry = TaskEntry {
            created_at: task.created_at,
            task: Arc::new(RwLock::new(task)),
            run_lock: Arc::new(Mutex::new(())),
        };
        self.tasks.write().await.insert(id, entry);
        id
    }

    /// Look up a task entry
    pub(crate) async fn get(&self, id: TaskId) -> Option<TaskEntry> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// All tasks currently in the registry
    pub(crate) async fn list_active(&self) -> Vec<TaskEntry> {
        self.tasks.read().await.values().cloned().collect()
    }

    /// Remove a task from future lookups
    ///
    /// Safe to call on a task that is mid-execution: the in-flight run holds
    /// its own Arc and completes normally, but nobody can observe the task
    /// afterward. Returns false if the id was not present.
    pub async fn evict(&self, id: TaskId) -> bool {
        self.tasks.write().await.remove(&id).is_some()
    }

    /// Remove every task older than `max_age`, regardless of completion state
    ///
    /// Returns the number of tasks removed.
    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now() - max_age;

        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, entry| entry.created_at > cutoff);
        before - tasks.len()
    }

    /// Number of tasks in the registry
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether the registry holds no tasks
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
