//! Batch run execution — paced, semaphore-bounded dispatch under a deadline.
//!
//! One run per task at a time (per-task run lock). Targets are dispatched as
//! independent tokio tasks through the global worker-pool semaphore; per-target
//! failures never abort siblings, and no strategy error crosses a unit
//! boundary. The whole dispatch-and-join phase races the batch deadline: when
//! the deadline wins, in-flight units are signaled for cooperative
//! cancellation and marked timed out, and any late result they produce
//! afterward is discarded by the task's guarded mutators.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::strategy::{PublishRequest, Strategy};
use crate::task::BatchTask;
use crate::types::{Event, PublishResult, TargetStatus, TaskId, Verdict};
use crate::verdict::aggregate;

use super::BatchPublisher;

impl BatchPublisher {
    /// Run a batch task to its verdict
    ///
    /// Synchronous from the caller's perspective: returns once every target
    /// has reached a terminal status or the batch deadline has elapsed,
    /// whichever comes first. Per-target outcomes are written into the task
    /// as they arrive and are visible to concurrent pollers via
    /// [`get_task`](Self::get_task).
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the task is not in the registry
    /// - [`Error::AlreadyRunning`] if another run holds the task's run lock
    ///
    /// Per-target failures are never errors: they end up as FAILED or
    /// TIMED_OUT entries in the task and shape the verdict.
    pub async fn run_task(&self, id: TaskId) -> Result<Verdict> {
        let entry = self.tasks.get(id).await.ok_or(Error::NotFound(id))?;

        // Single-run lock: held for the whole run, released by guard drop
        let _run_guard = entry
            .run_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| Error::AlreadyRunning(id))?;

        let task = entry.task;
        let (targets, request) = {
            let t = task.read().await;
            let request = PublishRequest {
                title: t.title.clone(),
                content: t.content.clone(),
                options: t.options.clone(),
            };
            (t.targets.clone(), Arc::new(request))
        };

        tracing::info!(task_id = %id, target_count = targets.len(), "Starting batch run");

        // Resolve every target up front. Resolution failures become terminal
        // FAILED entries without ever dispatching a unit.
        let mut resolved: Vec<(String, Arc<dyn Strategy>)> = Vec::with_capacity(targets.len());
        for target in &targets {
            match self.strategies.resolve(target).await {
                Ok(strategy) => resolved.push((target.clone(), strategy)),
                Err(e) => {
                    tracing::warn!(
                        task_id = %id,
                        target = %target,
                        error = %e,
                        "Strategy resolution failed; target will not be dispatched"
                    );
                    task.write().await.record_terminal(
                        target,
                        TargetStatus::Failed,
                        PublishResult::failure("strategy unavailable"),
                    );
                    self.emit_event(Event::TargetFinished {
                        id,
                        target: target.clone(),
                        status: TargetStatus::Failed,
                    });
                }
            }
        }

        let cancel_token = CancellationToken::new();
        let deadline = self.config.batch_deadline;

        let dispatch_and_join = self.dispatch_and_join(id, &task, resolved, &request, &cancel_token);

        if tokio::time::timeout(deadline, dispatch_and_join).await.is_err() {
            tracing::warn!(
                task_id = %id,
                deadline_ms = deadline.as_millis() as u64,
                "Batch deadline elapsed; cancelling in-flight targets"
            );
            // Best-effort cooperative cancellation; units that ignore it may
            // still complete, and their late results are discarded.
            cancel_token.cancel();

            let timed_out = {
                let mut t = task.write().await;
                let in_progress: Vec<String> = t
                    .statuses()
                    .iter()
                    .filter(|(_, s)| **s == TargetStatus::InProgress)
                    .map(|(target, _)| target.clone())
                    .collect();
                for target in &in_progress {
                    t.record_terminal(
                        target,
                        TargetStatus::TimedOut,
                        PublishResult::failure("batch deadline elapsed"),
                    );
                }
                in_progress
            };
            for target in timed_out {
                self.emit_event(Event::TargetFinished {
                    id,
                    target,
                    status: TargetStatus::TimedOut,
                });
            }
        }

        let verdict = {
            let mut t = task.write().await;
            t.mark_completed();
            aggregate(t.statuses())
        };

        tracing::info!(task_id = %id, ?verdict, "Batch run finished");
        self.emit_event(Event::TaskCompleted { id, verdict });

        Ok(verdict)
    }

    /// Dispatch resolved targets through the global worker pool and wait for
    /// all of their units to finish
    async fn dispatch_and_join(
        &self,
        id: TaskId,
        task: &Arc<RwLock<BatchTask>>,
        resolved: Vec<(String, Arc<dyn Strategy>)>,
        request: &Arc<PublishRequest>,
        cancel_token: &CancellationToken,
    ) {
        let mut units = Vec::with_capacity(resolved.len());

        for (i, (target, strategy)) in resolved.into_iter().enumerate() {
            // Pacing between consecutive dispatch starts. Per-run sleep only:
            // other tasks' runs dispatch independently of this delay.
            if i > 0 && !self.config.dispatch_delay.is_zero() {
                tokio::time::sleep(self.config.dispatch_delay).await;
            }

            // The pool is shared across all batches; this bounds total
            // system-wide concurrent target executions.
            let permit = match self.publish_limit.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            if !task.write().await.mark_in_progress(&target) {
                continue;
            }
            self.emit_event(Event::TargetStarted {
                id,
                target: target.clone(),
            });

            let publisher = self.clone();
            let task = Arc::clone(task);
            let request = Arc::clone(request);
            let cancel = cancel_token.clone();
            let unit_target = target.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                publisher
                    .execute_target(id, task, unit_target, strategy, request, cancel)
                    .await;
            });
            units.push((target, handle));
        }

        for (target, handle) in units {
            if let Err(e) = handle.await {
                // A panicking strategy must not leave its target in flight
                tracing::error!(task_id = %id, target = %target, error = %e, "Publishing unit panicked");
                let recorded = task.write().await.record_terminal(
                    &target,
                    TargetStatus::Failed,
                    PublishResult::failure(format!("publishing unit panicked: {e}")),
                );
                if recorded {
                    self.emit_event(Event::TargetFinished {
                        id,
                        target,
                        status: TargetStatus::Failed,
                    });
                }
            }
        }
    }

    /// Execute one target's publish and absorb its outcome into the task
    ///
    /// The strategy boundary never propagates an error upward: `Err` is
    /// converted to a synthesized failure result, `Ok` maps to
    /// SUCCEEDED/FAILED from `PublishResult::success`.
    async fn execute_target(
        &self,
        id: TaskId,
        task: Arc<RwLock<BatchTask>>,
        target: String,
        strategy: Arc<dyn Strategy>,
        request: Arc<PublishRequest>,
        cancel: CancellationToken,
    ) {
        let (status, result) = match strategy.publish(&request, &cancel).await {
            Ok(result) => {
                let status = if result.success {
                    TargetStatus::Succeeded
                } else {
                    TargetStatus::Failed
                };
                (status, result)
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %id,
                    target = %target,
                    error = %e,
                    "Strategy execution failed"
                );
                (TargetStatus::Failed, PublishResult::failure(e.to_string()))
            }
        };

        let recorded = task.write().await.record_terminal(&target, status, result);
        if recorded {
            tracing::debug!(task_id = %id, target = %target, ?status, "Target finished");
            self.emit_event(Event::TargetFinished { id, target, status });
        } else {
            // The batch deadline already fired for this target
            tracing::debug!(
                task_id = %id,
                target = %target,
                "Discarding late result for completed target"
            );
        }
    }
}
