//! Core batch publisher implementation split into focused submodules.
//!
//! The `BatchPublisher` struct and its methods are organized by domain:
//! - [`task_ops`] - Task creation, lookup, eviction, expiry sweeping
//! - [`orchestrator`] - Batch run execution (dispatch, timeout, cancellation)
//! - [`services`] - Background service starters

mod orchestrator;
mod services;
mod task_ops;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::strategy::{StrategyFactory, StrategyRegistry};
use crate::task::TaskRegistry;
use crate::types::Event;

/// Main batch publisher instance (cloneable - all fields are Arc-wrapped)
///
/// Drives one piece of content to a set of independent publishing targets:
/// creates batch tasks, fans each task out to bounded concurrent strategy
/// executions, enforces the batch deadline, and aggregates per-target
/// outcomes into a three-way verdict.
#[derive(Clone)]
pub struct BatchPublisher {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Strategy registry mapping target kinds to publishing strategies
    pub(crate) strategies: Arc<StrategyRegistry>,
    /// Concurrent store of active batch tasks
    pub(crate) tasks: Arc<TaskRegistry>,
    /// Global worker-pool semaphore bounding concurrent target executions
    /// across all batches (respects max_concurrent_publishes config)
    pub(crate) publish_limit: Arc<tokio::sync::Semaphore>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Flag to indicate whether new tasks are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl BatchPublisher {
    /// Create a new BatchPublisher instance
    ///
    /// Builds the strategy registry, task registry, global concurrency
    /// limiter, and event broadcast channel. Strategies are registered
    /// afterward via [`register_strategy`](Self::register_strategy).
    pub fn new(config: Config) -> Result<Self> {
        if config.max_concurrent_publishes == 0 {
            return Err(Error::Config {
                message: "max_concurrent_publishes must be at least 1".to_string(),
            });
        }
        if config.event_buffer == 0 {
            return Err(Error::Config {
                message: "event_buffer must be at least 1".to_string(),
            });
        }

        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_buffer);
        let publish_limit = Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_publishes));

        tracing::info!(
            max_concurrent = config.max_concurrent_publishes,
            batch_deadline_ms = config.batch_deadline.as_millis() as u64,
            dispatch_delay_ms = config.dispatch_delay.as_millis() as u64,
            "Batch publisher initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            strategies: Arc::new(StrategyRegistry::new()),
            tasks: Arc::new(TaskRegistry::new()),
            publish_limit,
            event_tx,
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Register a publishing strategy factory for a target kind
    pub async fn register_strategy(&self, kind: impl Into<String>, factory: StrategyFactory) {
        self.strategies.register(kind, factory).await;
    }

    /// Subscribe to lifecycle events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently; a subscriber that falls behind by more than the
    /// configured buffer receives a `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped
    /// (ok() converts Err to None). Publishing continues even if no one is
    /// listening to events.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Gracefully shut down the publisher
    ///
    /// Stops accepting new tasks, waits for in-flight publishing units to
    /// drain by acquiring the entire worker pool, then releases every cached
    /// strategy handle and emits [`Event::Shutdown`]. Tasks remain in the
    /// registry for inspection until evicted or swept.
    pub async fn shutdown(&self) -> Result<()> {
        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Shutting down batch publisher");

        // Taking every permit quiesces the pool: it only completes once no
        // publishing unit still holds one.
        let all = self.config.max_concurrent_publishes as u32;
        if let Ok(permits) = self.publish_limit.acquire_many(all).await {
            drop(permits);
        }

        self.strategies.release_all().await;
        self.emit_event(Event::Shutdown);
        Ok(())
    }
}
