//! Configuration types for multipost

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for [`BatchPublisher`](crate::BatchPublisher)
///
/// All fields have sensible defaults, so `Config::default()` works out of the
/// box. Durations serialize in serde's standard `{secs, nanos}` form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Maximum concurrent target executions across all batch tasks (default: 3)
    ///
    /// This is a system-wide bound, not a per-batch one: the worker pool is
    /// shared by every concurrently running task.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_publishes: usize,

    /// Courtesy delay between the start of consecutive dispatches within one
    /// batch (default: none)
    ///
    /// Rate-limits pressure toward shared downstream platforms. The delay is
    /// best-effort and only staggers dispatch start times; it never blocks
    /// other tasks' dispatches.
    #[serde(default)]
    pub dispatch_delay: Duration,

    /// Batch-wide deadline for a single run (default: 300s)
    ///
    /// When the deadline elapses, in-flight targets are signaled for
    /// cancellation and marked timed out. This is the only timeout surface;
    /// there is no separate per-target timeout.
    #[serde(default = "default_batch_deadline")]
    pub batch_deadline: Duration,

    /// Age after which the expiry sweeper evicts a task from the registry,
    /// regardless of completion state (default: 24h)
    #[serde(default = "default_task_max_age")]
    pub task_max_age: Duration,

    /// Interval between background expiry sweeps (default: 60s)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: Duration,

    /// Event broadcast channel capacity (default: 1000)
    ///
    /// Subscribers that fall further behind than this receive a
    /// `RecvError::Lagged` error.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_publishes: default_max_concurrent(),
            dispatch_delay: Duration::ZERO,
            batch_deadline: default_batch_deadline(),
            task_max_age: default_task_max_age(),
            sweep_interval: default_sweep_interval(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_max_concurrent() -> usize {
    3
}

fn default_batch_deadline() -> Duration {
    Duration::from_secs(300)
}

fn default_task_max_age() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_event_buffer() -> usize {
    1000
}
