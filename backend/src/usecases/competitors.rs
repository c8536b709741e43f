use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::{competitors::CompetitorRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        competitors::{AddCompetitorModel, CompetitorDto, CompetitorValidationError},
        eligibility::{AccessDenial, write_access_denial},
        lifecycle_policy::LifecyclePolicy,
        subscriptions::has_competitor_capacity,
    },
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CompetitorError {
    #[error("{}", .0.message())]
    Denied(AccessDenial),
    #[error(transparent)]
    Invalid(CompetitorValidationError),
    #[error("business not found")]
    BusinessNotFound,
    #[error("competitor limit of {limit} reached")]
    LimitReached { limit: i32 },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct CompetitorUseCase<S, C>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    competitor_repo: Arc<C>,
    policy: LifecyclePolicy,
}

impl<S, C> CompetitorUseCase<S, C>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, competitor_repo: Arc<C>, policy: LifecyclePolicy) -> Self {
        Self {
            subscription_repo,
            competitor_repo,
            policy,
        }
    }

    pub async fn add_competitor(
        &self,
        user_id: Uuid,
        model: AddCompetitorModel,
        now: DateTime<Utc>,
    ) -> Result<CompetitorDto, CompetitorError> {
        let subscription = self.subscription_repo.find_current_subscription(user_id).await?;

        if let Some(denial) = write_access_denial(subscription.as_ref(), now, &self.policy) {
            info!(
                %user_id,
                error_code = denial.error_code(),
                "competitors: add denied by subscription state"
            );
            return Err(CompetitorError::Denied(denial));
        }
        let subscription =
            subscription.ok_or(CompetitorError::Denied(AccessDenial::NoSubscription))?;

        let insert_competitor_entity = model.to_entity(now).map_err(CompetitorError::Invalid)?;

        self.competitor_repo
            .find_owned_business(user_id, model.business_id)
            .await?
            .ok_or(CompetitorError::BusinessNotFound)?;

        let current_count = self.competitor_repo.count_competitors_for_user(user_id).await?;
        if !has_competitor_capacity(&subscription, current_count) {
            info!(
                %user_id,
                current_count,
                limit = subscription.competitor_limit,
                "competitors: limit reached"
            );
            return Err(CompetitorError::LimitReached {
                limit: subscription.competitor_limit,
            });
        }

        let created = self
            .competitor_repo
            .create_competitor(insert_competitor_entity)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "competitors: failed to create competitor");
                CompetitorError::Internal(err)
            })?;

        info!(
            %user_id,
            competitor_id = %created.id,
            business_id = %created.business_id,
            "competitors: added"
        );

        Ok(CompetitorDto::from(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crates::domain::{
        entities::{
            businesses::BusinessEntity, competitors::CompetitorEntity,
            subscriptions::SubscriptionEntity,
        },
        repositories::{
            competitors::MockCompetitorRepository, subscriptions::MockSubscriptionRepository,
        },
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 15, 0, 0).unwrap()
    }

    fn trial(user_id: Uuid) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            status: "trialing".to_string(),
            plan_identifier: "trial".to_string(),
            current_period_start: now() - Duration::days(2),
            current_period_end: now() + Duration::days(12),
            competitor_limit: 3,
            created_at: now() - Duration::days(2),
            updated_at: now() - Duration::days(2),
        }
    }

    fn model(business_id: Uuid) -> AddCompetitorModel {
        AddCompetitorModel {
            business_id,
            name: "Corner Shop".to_string(),
            url: "https://corner.example.com/prices".to_string(),
            crawl_frequency_minutes: None,
        }
    }

    fn subscriptions_with_trial() -> MockSubscriptionRepository {
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions
            .expect_find_current_subscription()
            .returning(|user_id| Ok(Some(trial(user_id))));
        subscriptions
    }

    fn owned_business(competitors: &mut MockCompetitorRepository) {
        competitors
            .expect_find_owned_business()
            .returning(|user_id, business_id| {
                Ok(Some(BusinessEntity {
                    id: business_id,
                    user_id,
                    name: "Main Street".to_string(),
                    created_at: now() - Duration::days(2),
                }))
            });
    }

    #[tokio::test]
    async fn adds_competitor_under_limit() {
        let mut competitors = MockCompetitorRepository::new();
        owned_business(&mut competitors);
        competitors
            .expect_count_competitors_for_user()
            .returning(|_| Ok(2));
        competitors
            .expect_create_competitor()
            .times(1)
            .returning(|insert| {
                Ok(CompetitorEntity {
                    id: Uuid::new_v4(),
                    business_id: insert.business_id,
                    name: insert.name,
                    url: insert.url,
                    is_active: insert.is_active,
                    crawl_frequency_minutes: insert.crawl_frequency_minutes,
                    last_crawled_at: insert.last_crawled_at,
                    created_at: insert.created_at,
                    updated_at: insert.updated_at,
                })
            });

        let usecase = CompetitorUseCase::new(
            Arc::new(subscriptions_with_trial()),
            Arc::new(competitors),
            LifecyclePolicy::default(),
        );
        let dto = usecase
            .add_competitor(Uuid::new_v4(), model(Uuid::new_v4()), now())
            .await
            .unwrap();

        assert_eq!(dto.crawl_frequency_minutes, 1440);
        assert_eq!(dto.last_crawled_at, None);
    }

    #[tokio::test]
    async fn limit_reached_blocks_insert() {
        let mut competitors = MockCompetitorRepository::new();
        owned_business(&mut competitors);
        competitors
            .expect_count_competitors_for_user()
            .returning(|_| Ok(3));
        competitors.expect_create_competitor().never();

        let usecase = CompetitorUseCase::new(
            Arc::new(subscriptions_with_trial()),
            Arc::new(competitors),
            LifecyclePolicy::default(),
        );
        let result = usecase
            .add_competitor(Uuid::new_v4(), model(Uuid::new_v4()), now())
            .await;

        assert!(matches!(result, Err(CompetitorError::LimitReached { limit: 3 })));
    }

    #[tokio::test]
    async fn foreign_business_is_not_found() {
        let mut competitors = MockCompetitorRepository::new();
        competitors
            .expect_find_owned_business()
            .returning(|_, _| Ok(None));

        let usecase = CompetitorUseCase::new(
            Arc::new(subscriptions_with_trial()),
            Arc::new(competitors),
            LifecyclePolicy::default(),
        );
        let result = usecase
            .add_competitor(Uuid::new_v4(), model(Uuid::new_v4()), now())
            .await;

        assert!(matches!(result, Err(CompetitorError::BusinessNotFound)));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_lookup() {
        let mut bad = model(Uuid::new_v4());
        bad.url = "not a url".to_string();

        let usecase = CompetitorUseCase::new(
            Arc::new(subscriptions_with_trial()),
            Arc::new(MockCompetitorRepository::new()),
            LifecyclePolicy::default(),
        );
        let result = usecase.add_competitor(Uuid::new_v4(), bad, now()).await;

        assert!(matches!(
            result,
            Err(CompetitorError::Invalid(CompetitorValidationError::InvalidUrl))
        ));
    }

    #[tokio::test]
    async fn no_subscription_is_denied() {
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions
            .expect_find_current_subscription()
            .returning(|_| Ok(None));

        let usecase = CompetitorUseCase::new(
            Arc::new(subscriptions),
            Arc::new(MockCompetitorRepository::new()),
            LifecyclePolicy::default(),
        );
        let result = usecase
            .add_competitor(Uuid::new_v4(), model(Uuid::new_v4()), now())
            .await;

        assert!(matches!(
            result,
            Err(CompetitorError::Denied(AccessDenial::NoSubscription))
        ));
    }
}
