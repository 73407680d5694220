//! Error types for multipost
//!
//! Structural errors (task not found, re-entrant run, no supported targets)
//! propagate to callers of the public API. Per-target errors never do: the
//! orchestrator absorbs them into that target's terminal status and result,
//! so a batch run always finishes with a verdict.

use thiserror::Error;

use crate::types::TaskId;

/// Result type alias for multipost operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for multipost
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
    },

    /// No requested target kind is registered in the strategy registry
    #[error("unsupported targets: none of {requested:?} are registered")]
    UnsupportedTarget {
        /// The target kinds that were requested
        requested: Vec<String>,
    },

    /// Task created with an empty target list
    #[error("no targets requested")]
    NoTargets,

    /// Task not found in the registry
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Re-entrant run attempt while another run holds the task's run lock
    #[error("task {0} is already running")]
    AlreadyRunning(TaskId),

    /// Strategy resolution failed for a target kind
    ///
    /// Surfaced to callers as a per-target FAILED status, never as a
    /// batch-level error.
    #[error("strategy unavailable for target kind '{kind}'")]
    StrategyUnavailable {
        /// The target kind that could not be resolved
        kind: String,
    },

    /// Strategy raised an error during execution
    ///
    /// Caught at the unit boundary and surfaced as a per-target FAILED status.
    #[error("strategy for '{kind}' failed: {message}")]
    StrategyExecution {
        /// The target kind whose strategy failed
        kind: String,
        /// The underlying error message
        message: String,
    },

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}
