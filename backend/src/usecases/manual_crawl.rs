use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::crawl_queue::CrawlQueueEntity,
    repositories::{
        competitors::CompetitorRepository, crawl_queue::CrawlQueueRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        crawl_scheduling::{EnqueueOutcome, MANUAL_PRIORITY, new_crawl_job},
        eligibility::{AccessDenial, write_access_denial},
        lifecycle_policy::LifecyclePolicy,
    },
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ManualCrawlError {
    #[error("{}", .0.message())]
    Denied(AccessDenial),
    #[error("competitor not found")]
    CompetitorNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, ManualCrawlError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualCrawlDto {
    pub message: String,
    pub queued: bool,
    pub position: i64,
    pub queue_id: Uuid,
}

pub struct ManualCrawlUseCase<S, C, Q>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
    Q: CrawlQueueRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    competitor_repo: Arc<C>,
    crawl_queue_repo: Arc<Q>,
    policy: LifecyclePolicy,
    crawl_max_attempts: i32,
}

impl<S, C, Q> ManualCrawlUseCase<S, C, Q>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
    Q: CrawlQueueRepository + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        competitor_repo: Arc<C>,
        crawl_queue_repo: Arc<Q>,
        policy: LifecyclePolicy,
        crawl_max_attempts: i32,
    ) -> Self {
        Self {
            subscription_repo,
            competitor_repo,
            crawl_queue_repo,
            policy,
            crawl_max_attempts,
        }
    }

    /// Puts the competitor at the front of the crawl queue, or reports where
    /// its pending entry already sits.
    pub async fn trigger(
        &self,
        user_id: Uuid,
        competitor_id: Uuid,
        now: DateTime<Utc>,
    ) -> UseCaseResult<ManualCrawlDto> {
        let subscription = self
            .subscription_repo
            .find_current_subscription(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "manual_crawl: failed to load current subscription"
                );
                ManualCrawlError::Internal(err)
            })?;

        if let Some(denial) = write_access_denial(subscription.as_ref(), now, &self.policy) {
            info!(
                %user_id,
                %competitor_id,
                error_code = denial.error_code(),
                "manual_crawl: denied by subscription state"
            );
            return Err(ManualCrawlError::Denied(denial));
        }

        let competitor = self
            .competitor_repo
            .find_owned_competitor(user_id, competitor_id)
            .await?
            .ok_or(ManualCrawlError::CompetitorNotFound)?;

        if let Some(existing) = self.crawl_queue_repo.find_by_competitor(competitor.id).await? {
            return self.report_existing(existing).await;
        }

        let job = new_crawl_job(
            competitor.id,
            competitor.url,
            MANUAL_PRIORITY,
            self.crawl_max_attempts,
            now,
        );

        match self.crawl_queue_repo.enqueue(job).await? {
            EnqueueOutcome::Enqueued(queue_id) => {
                info!(%user_id, %competitor_id, %queue_id, "manual_crawl: queued");
                Ok(ManualCrawlDto {
                    message: "Crawl queued".to_string(),
                    queued: true,
                    position: 1,
                    queue_id,
                })
            }
            EnqueueOutcome::AlreadyQueued => {
                // Lost a race with the scheduler or another trigger.
                let existing = self
                    .crawl_queue_repo
                    .find_by_competitor(competitor.id)
                    .await?
                    .ok_or_else(|| anyhow!("queue entry for {competitor_id} vanished after conflict"))?;
                self.report_existing(existing).await
            }
        }
    }

    async fn report_existing(&self, existing: CrawlQueueEntity) -> UseCaseResult<ManualCrawlDto> {
        let position = self
            .crawl_queue_repo
            .count_ahead(existing.scheduled_for, existing.priority)
            .await?;

        info!(
            competitor_id = %existing.competitor_id,
            queue_id = %existing.id,
            position,
            "manual_crawl: already queued"
        );

        Ok(ManualCrawlDto {
            message: "Crawl already queued".to_string(),
            queued: false,
            position,
            queue_id: existing.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crates::domain::{
        entities::{competitors::CompetitorEntity, subscriptions::SubscriptionEntity},
        repositories::{
            competitors::MockCompetitorRepository, crawl_queue::MockCrawlQueueRepository,
            subscriptions::MockSubscriptionRepository,
        },
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 20, 10, 0, 0).unwrap()
    }

    fn subscription(user_id: Uuid, status: &str, period_end: DateTime<Utc>) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            status: status.to_string(),
            plan_identifier: "trial".to_string(),
            current_period_start: period_end - Duration::days(14),
            current_period_end: period_end,
            competitor_limit: 3,
            created_at: period_end - Duration::days(14),
            updated_at: period_end - Duration::days(14),
        }
    }

    fn competitor(competitor_id: Uuid) -> CompetitorEntity {
        CompetitorEntity {
            id: competitor_id,
            business_id: Uuid::new_v4(),
            name: "Rival".to_string(),
            url: "https://rival.example.com".to_string(),
            is_active: true,
            crawl_frequency_minutes: 1440,
            last_crawled_at: None,
            created_at: now() - Duration::days(3),
            updated_at: now() - Duration::days(3),
        }
    }

    fn usecase(
        subscriptions: MockSubscriptionRepository,
        competitors: MockCompetitorRepository,
        queue: MockCrawlQueueRepository,
    ) -> ManualCrawlUseCase<MockSubscriptionRepository, MockCompetitorRepository, MockCrawlQueueRepository>
    {
        ManualCrawlUseCase::new(
            Arc::new(subscriptions),
            Arc::new(competitors),
            Arc::new(queue),
            LifecyclePolicy::default(),
            3,
        )
    }

    fn subscriptions_returning(sub: Option<SubscriptionEntity>) -> MockSubscriptionRepository {
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions
            .expect_find_current_subscription()
            .returning(move |_| Ok(sub.clone()));
        subscriptions
    }

    #[tokio::test]
    async fn grace_period_one_day_past_end_is_queued_at_manual_priority() {
        let user_id = Uuid::new_v4();
        let competitor_id = Uuid::new_v4();
        let queue_id = Uuid::new_v4();

        let mut competitors = MockCompetitorRepository::new();
        competitors
            .expect_find_owned_competitor()
            .returning(move |_, id| Ok(Some(competitor(id))));

        let mut queue = MockCrawlQueueRepository::new();
        queue.expect_find_by_competitor().returning(|_| Ok(None));
        queue
            .expect_enqueue()
            .withf(|job| job.priority == MANUAL_PRIORITY && job.attempt == 0)
            .times(1)
            .returning(move |_| Ok(EnqueueOutcome::Enqueued(queue_id)));

        let result = usecase(
            subscriptions_returning(Some(subscription(
                user_id,
                "grace_period",
                now() - Duration::days(1),
            ))),
            competitors,
            queue,
        )
        .trigger(user_id, competitor_id, now())
        .await
        .unwrap();

        assert!(result.queued);
        assert_eq!(result.position, 1);
        assert_eq!(result.queue_id, queue_id);
    }

    #[tokio::test]
    async fn grace_period_four_days_past_end_is_denied() {
        let user_id = Uuid::new_v4();

        let result = usecase(
            subscriptions_returning(Some(subscription(
                user_id,
                "grace_period",
                now() - Duration::days(4),
            ))),
            MockCompetitorRepository::new(),
            MockCrawlQueueRepository::new(),
        )
        .trigger(user_id, Uuid::new_v4(), now())
        .await;

        assert!(matches!(
            result,
            Err(ManualCrawlError::Denied(AccessDenial::GracePeriod))
        ));
    }

    #[tokio::test]
    async fn missing_subscription_is_denied() {
        let result = usecase(
            subscriptions_returning(None),
            MockCompetitorRepository::new(),
            MockCrawlQueueRepository::new(),
        )
        .trigger(Uuid::new_v4(), Uuid::new_v4(), now())
        .await;

        assert!(matches!(
            result,
            Err(ManualCrawlError::Denied(AccessDenial::NoSubscription))
        ));
    }

    #[tokio::test]
    async fn paused_subscription_is_denied_even_mid_period() {
        let user_id = Uuid::new_v4();

        let result = usecase(
            subscriptions_returning(Some(subscription(
                user_id,
                "paused",
                now() + Duration::days(10),
            ))),
            MockCompetitorRepository::new(),
            MockCrawlQueueRepository::new(),
        )
        .trigger(user_id, Uuid::new_v4(), now())
        .await;

        assert!(matches!(
            result,
            Err(ManualCrawlError::Denied(AccessDenial::SubscriptionInactive))
        ));
    }

    #[tokio::test]
    async fn unowned_competitor_is_not_found() {
        let user_id = Uuid::new_v4();

        let mut competitors = MockCompetitorRepository::new();
        competitors
            .expect_find_owned_competitor()
            .returning(|_, _| Ok(None));

        let result = usecase(
            subscriptions_returning(Some(subscription(user_id, "active", now() + Duration::days(20)))),
            competitors,
            MockCrawlQueueRepository::new(),
        )
        .trigger(user_id, Uuid::new_v4(), now())
        .await;

        assert!(matches!(result, Err(ManualCrawlError::CompetitorNotFound)));
    }

    #[tokio::test]
    async fn already_queued_reports_existing_position() {
        let user_id = Uuid::new_v4();
        let competitor_id = Uuid::new_v4();
        let existing = CrawlQueueEntity {
            id: Uuid::new_v4(),
            competitor_id,
            url: "https://rival.example.com".to_string(),
            priority: 0,
            attempt: 0,
            max_attempts: 3,
            scheduled_for: now() - Duration::minutes(30),
            created_at: now() - Duration::minutes(30),
        };
        let existing_id = existing.id;
        let scheduled_for = existing.scheduled_for;

        let mut competitors = MockCompetitorRepository::new();
        competitors
            .expect_find_owned_competitor()
            .returning(move |_, id| Ok(Some(competitor(id))));

        let mut queue = MockCrawlQueueRepository::new();
        queue
            .expect_find_by_competitor()
            .returning(move |_| Ok(Some(existing.clone())));
        queue
            .expect_count_ahead()
            .withf(move |at, priority| *at == scheduled_for && *priority == 0)
            .returning(|_, _| Ok(7));

        let result = usecase(
            subscriptions_returning(Some(subscription(user_id, "active", now() + Duration::days(20)))),
            competitors,
            queue,
        )
        .trigger(user_id, competitor_id, now())
        .await
        .unwrap();

        assert!(!result.queued);
        assert_eq!(result.position, 7);
        assert_eq!(result.queue_id, existing_id);
    }
}
