use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        lifecycle_policy::LifecyclePolicy,
        subscriptions::{AccessStatusDto, SubscriptionDto, new_trial_subscription},
    },
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TrialError {
    #[error("a subscription already exists for this user")]
    AlreadySubscribed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    policy: LifecyclePolicy,
}

impl<S> SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, policy: LifecyclePolicy) -> Self {
        Self {
            subscription_repo,
            policy,
        }
    }

    /// Opens the one free trial a user gets. Any existing subscription row,
    /// expired ones included, blocks a second trial.
    pub async fn start_trial(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionDto, TrialError> {
        if let Some(existing) = self.subscription_repo.find_current_subscription(user_id).await? {
            info!(
                %user_id,
                subscription_id = %existing.id,
                status = %existing.status,
                "subscriptions: trial refused, subscription exists"
            );
            return Err(TrialError::AlreadySubscribed);
        }

        let created = self
            .subscription_repo
            .create_subscription(new_trial_subscription(user_id, now, &self.policy))
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to create trial");
                TrialError::Internal(err)
            })?;

        info!(
            %user_id,
            subscription_id = %created.id,
            current_period_end = %created.current_period_end,
            "subscriptions: trial started"
        );

        Ok(SubscriptionDto::from(created))
    }

    pub async fn access_status(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<AccessStatusDto> {
        let subscription = self.subscription_repo.find_current_subscription(user_id).await?;

        Ok(AccessStatusDto::evaluate(subscription.as_ref(), now, &self.policy))
    }
}
