//! Publishing strategies and the strategy registry
//!
//! A [`Strategy`] is the pluggable capability that performs the actual
//! publishing work for one target kind (the browser automation, API calls,
//! etc. live behind this boundary). The [`StrategyRegistry`] maps target-kind
//! strings to strategy instances, materializing each kind's instance lazily
//! on first resolution and caching it until [`StrategyRegistry::release_all`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::PublishResult;

/// Payload handed unchanged to every strategy of a batch task
#[derive(Clone, Debug)]
pub struct PublishRequest {
    /// Content title
    pub title: String,

    /// Content body
    pub content: String,

    /// Opaque per-task configuration passed through to strategies
    pub options: serde_json::Value,
}

/// Pluggable publishing capability for one target kind
///
/// Implementations must be safe for concurrent use: the registry hands out a
/// shared handle, and two simultaneously running tasks targeting the same
/// kind will call [`publish`](Strategy::publish) on it at the same time.
///
/// `publish` should honor the cancellation token on a best-effort basis: the
/// orchestrator cancels it when the batch deadline elapses, and a strategy
/// that keeps running afterward has its late result discarded.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// The target kind this strategy serves (e.g., "wordpress")
    fn kind(&self) -> &str;

    /// One-time setup for expensive per-kind resources (e.g., a long-lived
    /// session). Called once, when the registry materializes the handle.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Publish the content to this strategy's target
    async fn publish(
        &self,
        request: &PublishRequest,
        cancel: &CancellationToken,
    ) -> Result<PublishResult>;

    /// Release resources acquired in [`prepare`](Strategy::prepare). Called
    /// by [`StrategyRegistry::release_all`].
    async fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory producing a fresh strategy instance for a target kind
pub type StrategyFactory = Box<dyn Fn() -> Arc<dyn Strategy> + Send + Sync>;

/// Maps target-kind strings to strategy instances
///
/// Registration stores a factory; the instance itself (and whatever resource
/// it holds) is only created on first [`resolve`](StrategyRegistry::resolve)
/// and then reused by every subsequent resolution of the same kind until
/// [`release_all`](StrategyRegistry::release_all) clears the cache.
pub struct StrategyRegistry {
    /// Registered factories, keyed by target kind
    factories: RwLock<HashMap<String, StrategyFactory>>,
    /// Materialized (prepared) strategy handles, keyed by target kind
    handles: RwLock<HashMap<String, Arc<dyn Strategy>>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory for a target kind
    ///
    /// Re-registering a kind replaces its factory; an already-materialized
    /// handle for that kind keeps serving until the next `release_all`.
    pub async fn register(&self, kind: impl Into<String>, factory: StrategyFactory) {
        let kind = kind.into();
        tracing::debug!(kind = %kind, "Registering publishing strategy");
        self.factories.write().await.insert(kind, factory);
    }

    /// Whether a target kind has a registered strategy
    pub async fn is_supported(&self, kind: &str) -> bool {
        self.factories.read().await.contains_key(kind)
    }

    /// All registered target kinds
    pub async fn supported_kinds(&self) -> Vec<String> {
        self.factories.read().await.keys().cloned().collect()
    }

    /// Resolve the strategy handle for a target kind
    ///
    /// The first resolution for a kind invokes its factory and runs
    /// [`Strategy::prepare`]; later resolutions reuse the cached handle.
    /// A failed `prepare` is reported as [`Error::StrategyUnavailable`] and
    /// leaves nothing cached, so a later resolution retries from scratch.
    pub async fn resolve(&self, kind: &str) -> Result<Arc<dyn Strategy>> {
        // Fast path: already materialized
        if let Some(handle) = self.handles.read().await.get(kind) {
            return Ok(Arc::clone(handle));
        }

        // Slow path: materialize under the write lock. The double-check keeps
        // concurrent first resolutions from invoking the factory twice.
        let mut handles = self.handles.write().await;
        if let Some(handle) = handles.get(kind) {
            return Ok(Arc::clone(handle));
        }

        let strategy = {
            let factories = self.factories.read().await;
            let factory = factories.get(kind).ok_or_else(|| Error::StrategyUnavailable {
                kind: kind.to_string(),
            })?;
            factory()
        };

        if let Err(e) = strategy.prepare().await {
            tracing::warn!(kind = %kind, error = %e, "Strategy prepare failed");
            return Err(Error::StrategyUnavailable {
                kind: kind.to_string(),
            });
        }

        tracing::info!(kind = %kind, "Strategy materialized");
        handles.insert(kind.to_string(), Arc::clone(&strategy));
        Ok(strategy)
    }

    /// Release every cached strategy handle
    ///
    /// Runs [`Strategy::cleanup`] on each handle and clears the cache. The
    /// caller is responsible for quiescing orchestrator runs first; handles
    /// still held by an in-flight run stay alive until that run drops them.
    pub async fn release_all(&self) {
        let drained: Vec<(String, Arc<dyn Strategy>)> =
            self.handles.write().await.drain().collect();

        for (kind, strategy) in drained {
            if let Err(e) = strategy.cleanup().await {
                tracing::warn!(kind = %kind, error = %e, "Strategy cleanup failed");
            } else {
                tracing::debug!(kind = %kind, "Strategy released");
            }
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// `unwrap_err` on `Result<Arc<dyn Strategy>>` needs the Ok side to be Debug
#[cfg(test)]
impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("kind", &self.kind()).finish()
    }
}
