//! Core types for multipost

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a batch task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<TaskId> for i64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for TaskId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Per-target publishing status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// Created but not yet dispatched
    Pending,
    /// Dispatched and currently executing
    InProgress,
    /// Strategy returned a successful result
    Succeeded,
    /// Strategy returned a failure or raised an error
    Failed,
    /// Still in progress when the batch deadline elapsed
    TimedOut,
}

impl TargetStatus {
    /// Whether this status is terminal (no further transition occurs)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TargetStatus::Succeeded | TargetStatus::Failed | TargetStatus::TimedOut
        )
    }
}

/// Three-way batch-level outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every target succeeded
    AllSucceeded,
    /// Some targets succeeded, some did not
    Partial,
    /// No target succeeded
    AllFailed,
}

/// Outcome of publishing to a single target
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishResult {
    /// Whether the target accepted the content
    pub success: bool,

    /// Human-readable outcome message
    pub message: String,

    /// Locator for the published content (e.g., a URL), if the target produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

impl PublishResult {
    /// Build a successful result
    pub fn ok(message: impl Into<String>, locator: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            locator,
        }
    }

    /// Build a failure result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            locator: None,
        }
    }
}

/// Read-only projection of a batch task returned to callers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskView {
    /// Unique task identifier
    pub id: TaskId,

    /// Title of the content being published
    pub title: String,

    /// Target kinds this task publishes to, in creation order
    pub targets: Vec<String>,

    /// Current status per target
    pub status_by_target: HashMap<String, TargetStatus>,

    /// Results for targets that have reached a terminal status
    pub result_by_target: HashMap<String, PublishResult>,

    /// Whether the orchestrator has finished driving this task
    pub completed: bool,

    /// Percentage of targets that have reached a terminal status (0.0 to 100.0)
    pub progress_percent: f32,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Event emitted during the batch task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task created and stored in the registry
    TaskCreated {
        /// Task ID
        id: TaskId,
        /// Content title
        title: String,
        /// Targets the task will publish to
        targets: Vec<String>,
    },

    /// A target's publishing unit started executing
    TargetStarted {
        /// Task ID
        id: TaskId,
        /// Target kind
        target: String,
    },

    /// A target reached a terminal status
    TargetFinished {
        /// Task ID
        id: TaskId,
        /// Target kind
        target: String,
        /// Terminal status the target reached
        status: TargetStatus,
    },

    /// The orchestrator finished driving a task
    TaskCompleted {
        /// Task ID
        id: TaskId,
        /// Batch-level verdict
        verdict: Verdict,
    },

    /// Task removed from the registry
    TaskEvicted {
        /// Task ID
        id: TaskId,
    },

    /// Expiry sweep removed aged tasks
    TasksSwept {
        /// Number of tasks removed
        removed: usize,
    },

    /// Graceful shutdown initiated
    Shutdown,
}
