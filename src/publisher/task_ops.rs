//! Task operations — creation, lookup, eviction, expiry sweeping.

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Event, TaskId, TaskView};

use super::BatchPublisher;

impl BatchPublisher {
    /// Create a batch task for publishing one piece of content
    ///
    /// The requested targets are checked against the strategy registry.
    /// Kinds without a registered strategy are filtered out and the task
    /// proceeds with the supported subset; only a request where *no* kind is
    /// supported fails, with [`Error::UnsupportedTarget`]. Duplicate targets
    /// are removed, preserving first-seen order.
    ///
    /// # Arguments
    ///
    /// * `targets` - Target kinds to publish to (e.g., `["wordpress", "medium"]`)
    /// * `content` - Content body, passed unchanged to every strategy
    /// * `title` - Content title, passed unchanged to every strategy
    /// * `options` - Opaque configuration blob passed through to strategies
    pub async fn create_task(
        &self,
        targets: Vec<String>,
        content: String,
        title: String,
        options: serde_json::Value,
    ) -> Result<TaskId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        if targets.is_empty() {
            return Err(Error::NoTargets);
        }

        let mut supported = Vec::with_capacity(targets.len());
        let mut unsupported = Vec::new();
        for target in &targets {
            if self.strategies.is_supported(target).await {
                supported.push(target.clone());
            } else {
                unsupported.push(target.clone());
            }
        }

        if supported.is_empty() {
            return Err(Error::UnsupportedTarget { requested: targets });
        }
        if !unsupported.is_empty() {
            // Lenient filter: the request proceeds with the supported subset
            tracing::warn!(
                unsupported = ?unsupported,
                "Ignoring unsupported targets in create request"
            );
        }

        let id = self
            .tasks
            .create(supported, content, title.clone(), options)
            .await;

        // Re-read the stored target list: creation dedupes it
        let targets = match self.tasks.get(id).await {
            Some(entry) => entry.task.read().await.targets.clone(),
            None => Vec::new(),
        };

        tracing::info!(task_id = %id, targets = ?targets, "Batch task created");
        self.emit_event(Event::TaskCreated { id, title, targets });

        Ok(id)
    }

    /// Get a read-only view of a task
    pub async fn get_task(&self, id: TaskId) -> Result<TaskView> {
        let entry = self.tasks.get(id).await.ok_or(Error::NotFound(id))?;
        let view = entry.task.read().await.view();
        Ok(view)
    }

    /// List all tasks currently in the registry
    pub async fn list_tasks(&self) -> Vec<TaskView> {
        let entries = self.tasks.list_active().await;
        futures::future::join_all(
            entries
                .iter()
                .map(|entry| async { entry.task.read().await.view() }),
        )
        .await
    }

    /// Remove a task from the registry
    ///
    /// Safe to call on a task that is mid-execution: the in-flight run keeps
    /// driving its own handle to completion, but the task disappears from
    /// future lookups — which orphans its final results.
    pub async fn evict_task(&self, id: TaskId) -> Result<()> {
        let entry = self.tasks.get(id).await.ok_or(Error::NotFound(id))?;

        if !entry.task.read().await.completed() {
            tracing::warn!(
                task_id = %id,
                "Evicting a task that has not completed; its run result will be orphaned"
            );
        }

        self.tasks.evict(id).await;
        self.emit_event(Event::TaskEvicted { id });
        Ok(())
    }

    /// Remove every task older than `max_age`, regardless of completion state
    ///
    /// Returns the number of tasks removed.
    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        let removed = self.tasks.sweep_expired(max_age).await;
        if removed > 0 {
            tracing::info!(removed, "Swept expired tasks");
            self.emit_event(Event::TasksSwept { removed });
        }
        removed
    }
}
