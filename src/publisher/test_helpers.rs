//! Shared test helpers — scripted strategies and publisher builders.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::strategy::{PublishRequest, Strategy, StrategyFactory};
use crate::types::PublishResult;

use super::BatchPublisher;

/// Observes strategy executions across a test run
#[derive(Default)]
pub(crate) struct ExecutionProbe {
    /// Total publish invocations
    pub(crate) calls: AtomicUsize,
    /// Publish invocations currently in flight
    pub(crate) current: AtomicUsize,
    /// High-water mark of concurrent publish invocations
    pub(crate) peak: AtomicUsize,
    /// Cleanup invocations
    pub(crate) cleanups: AtomicUsize,
}

/// What a scripted strategy does when its publish is invoked
#[derive(Clone, Copy, Debug)]
pub(crate) enum Behavior {
    /// Succeed immediately with a locator
    Ok,
    /// Return a failure result immediately
    Fail,
    /// Raise a strategy-execution error
    Err,
    /// Wait for cancellation, then report failure (cooperative hang)
    Hang,
    /// Ignore cancellation and sleep this long before succeeding
    Stubborn(Duration),
    /// Sleep this long, then succeed
    Slow(Duration),
    /// Fail prepare, so resolution reports the strategy unavailable
    PrepareFails,
}

pub(crate) struct ScriptedStrategy {
    kind: String,
    behavior: Behavior,
    probe: Option<Arc<ExecutionProbe>>,
}

#[async_trait]
impl Strategy for ScriptedStrategy {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn prepare(&self) -> Result<()> {
        match self.behavior {
            Behavior::PrepareFails => Err(Error::Other("session setup failed".to_string())),
            _ => Ok(()),
        }
    }

    async fn publish(
        &self,
        _request: &PublishRequest,
        cancel: &CancellationToken,
    ) -> Result<PublishResult> {
        if let Some(probe) = &self.probe {
            probe.calls.fetch_add(1, Ordering::SeqCst);
            let now = probe.current.fetch_add(1, Ordering::SeqCst) + 1;
            probe.peak.fetch_max(now, Ordering::SeqCst);
        }

        let outcome = match self.behavior {
            Behavior::Ok | Behavior::PrepareFails => Ok(PublishResult::ok(
                "published",
                Some(format!("https://{}.example/p/1", self.kind)),
            )),
            Behavior::Fail => Ok(PublishResult::failure("platform rejected the content")),
            Behavior::Err => Err(Error::StrategyExecution {
                kind: self.kind.clone(),
                message: "connector exploded".to_string(),
            }),
            Behavior::Hang => {
                cancel.cancelled().await;
                Ok(PublishResult::failure("cancelled"))
            }
            Behavior::Stubborn(duration) => {
                tokio::time::sleep(duration).await;
                Ok(PublishResult::ok("late publish", None))
            }
            Behavior::Slow(duration) => {
                tokio::time::sleep(duration).await;
                Ok(PublishResult::ok(
                    "published",
                    Some(format!("https://{}.example/p/1", self.kind)),
                ))
            }
        };

        if let Some(probe) = &self.probe {
            probe.current.fetch_sub(1, Ordering::SeqCst);
        }
        outcome
    }

    async fn cleanup(&self) -> Result<()> {
        if let Some(probe) = &self.probe {
            probe.cleanups.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Factory for a scripted strategy serving `kind`
pub(crate) fn scripted_factory(kind: &str, behavior: Behavior) -> StrategyFactory {
    let kind = kind.to_string();
    Box::new(move || {
        Arc::new(ScriptedStrategy {
            kind: kind.clone(),
            behavior,
            probe: None,
        })
    })
}

/// Factory for a scripted strategy that reports into `probe`
pub(crate) fn probed_factory(
    kind: &str,
    behavior: Behavior,
    probe: Arc<ExecutionProbe>,
) -> StrategyFactory {
    let kind = kind.to_string();
    Box::new(move || {
        Arc::new(ScriptedStrategy {
            kind: kind.clone(),
            behavior,
            probe: Some(probe.clone()),
        })
    })
}

/// Build a publisher with the given config
pub(crate) fn test_publisher(config: Config) -> BatchPublisher {
    BatchPublisher::new(config).unwrap()
}

/// Config with a deadline short enough to keep tests quick but long enough
/// that non-timeout tests never trip it
pub(crate) fn fast_config() -> Config {
    Config {
        batch_deadline: Duration::from_secs(5),
        ..Default::default()
    }
}

/// Publisher with scripted strategies registered for each (kind, behavior)
pub(crate) async fn publisher_with(
    config: Config,
    strategies: &[(&str, Behavior)],
) -> BatchPublisher {
    let publisher = test_publisher(config);
    for (kind, behavior) in strategies {
        publisher
            .register_strategy(*kind, scripted_factory(kind, *behavior))
            .await;
    }
    publisher
}

/// Create a task over `targets` with placeholder content
pub(crate) async fn create_simple_task(
    publisher: &BatchPublisher,
    targets: &[&str],
) -> crate::types::TaskId {
    publisher
        .create_task(
            targets.iter().map(|t| t.to_string()).collect(),
            "body".to_string(),
            "title".to_string(),
            serde_json::json!({}),
        )
        .await
        .unwrap()
}
