//! Background service starters.

use tokio::time::MissedTickBehavior;

use super::BatchPublisher;

impl BatchPublisher {
    /// Start the background expiry sweeper task
    ///
    /// Spawns a loop that removes tasks older than the configured
    /// `task_max_age` from the registry every `sweep_interval`, regardless of
    /// their completion state. Returns the handle so the caller can abort the
    /// sweeper on shutdown.
    pub fn start_expiry_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let publisher = self.clone();
        let interval = self.config.sweep_interval;
        let max_age = self.config.task_max_age;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let removed = publisher.sweep_expired(max_age).await;
                if removed > 0 {
                    tracing::debug!(removed, "Expiry sweeper pass complete");
                }
            }
        })
    }
}
