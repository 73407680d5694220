//! # multipost
//!
//! Batch content publishing orchestration library.
//!
//! multipost accepts one piece of content together with a set of independent
//! publishing targets, fans the work out to bounded concurrent strategy
//! executions, tracks per-target progress, enforces a batch-wide deadline,
//! and aggregates the heterogeneous per-target outcomes into a three-way
//! verdict (all succeeded / partial / all failed).
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Pluggable targets** - One [`Strategy`] implementation per platform,
//!   resolved through a registry rather than branched in the orchestrator
//! - **Fault isolation** - A failing target never aborts its siblings; a
//!   batch run always finishes with a [`Verdict`]
//! - **Event-driven** - Consumers subscribe to lifecycle events, no polling
//!   required (though polling via [`BatchPublisher::get_task`] works too)
//!
//! ## Quick Start
//!
//! ```no_run
//! use multipost::{BatchPublisher, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let publisher = BatchPublisher::new(Config::default())?;
//!
//!     // Register a strategy per target kind, then:
//!     let id = publisher
//!         .create_task(
//!             vec!["wordpress".to_string(), "medium".to_string()],
//!             "body".to_string(),
//!             "Hello".to_string(),
//!             serde_json::json!({}),
//!         )
//!         .await?;
//!
//!     let verdict = publisher.run_task(id).await?;
//!     println!("verdict: {:?}", verdict);
//!
//!     for (target, result) in publisher.get_task(id).await?.result_by_target {
//!         println!("{target}: {}", result.message);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Core batch publisher implementation (decomposed into focused submodules)
pub mod publisher;
/// Publishing strategies and the strategy registry
pub mod strategy;
/// Batch task aggregate and task registry
pub mod task;
/// Core types and events
pub mod types;
/// Batch verdict aggregation
pub mod verdict;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use publisher::BatchPublisher;
pub use strategy::{PublishRequest, Strategy, StrategyFactory, StrategyRegistry};
pub use task::{BatchTask, TaskRegistry};
pub use types::{Event, PublishResult, TargetStatus, TaskId, TaskView, Verdict};
pub use verdict::aggregate;
