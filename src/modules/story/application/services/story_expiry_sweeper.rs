use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::shared::clock::Clock;
use crate::shared::error::SocialError;
use crate::story::application::ports::outgoing::StoryRepository;

/// Periodically tombstones stories whose expiry has passed. Reads already
/// hide expired stories, so the sweep only keeps the table small.
pub struct StoryExpirySweeper {
    repository: Arc<dyn StoryRepository>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl StoryExpirySweeper {
    pub fn new(repository: Arc<dyn StoryRepository>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            repository,
            clock,
            period,
        }
    }

    pub async fn run_once(&self) -> Result<u64, SocialError> {
        let swept = self.repository.sweep_expired(self.clock.now()).await?;
        if swept > 0 {
            tracing::info!(swept, "Expired stories swept");
        }
        Ok(swept)
    }

    /// Runs until the returned handle is aborted. The first sweep is immediate.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(period_secs = self.period.as_secs(), "Story expiry sweeper started");

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::warn!(error = %e, "Story sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::clock::FixedClock;
    use crate::shared::store_error::StoreError;
    use crate::story::application::services::story_service::tests::MockStoryRepo;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_run_once_uses_clock() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut repo = MockStoryRepo::new();
        repo.expect_sweep_expired()
            .withf(move |at| *at == now)
            .times(1)
            .returning(|_| Ok(2));

        let sweeper = StoryExpirySweeper::new(
            Arc::new(repo),
            Arc::new(FixedClock::new(now)),
            Duration::from_secs(60),
        );

        assert_eq!(sweeper.run_once().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_spawned_sweeper_survives_failures() {
        let mut repo = MockStoryRepo::new();
        repo.expect_sweep_expired()
            .times(1..)
            .returning(|_| Err(StoreError::DatabaseError("locked".to_string())));

        let sweeper = StoryExpirySweeper::new(
            Arc::new(repo),
            Arc::new(FixedClock::new(Utc::now())),
            Duration::from_millis(5),
        );

        let handle = sweeper.spawn();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
