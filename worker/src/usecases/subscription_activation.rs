use chrono::{DateTime, Utc};
use crates::domain::{
    entities::subscriptions::InsertSubscriptionEntity,
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        lifecycle_policy::UNLIMITED_COMPETITORS,
        subscriptions::{ActivateSubscriptionModel, SubscriptionDto, activation_changes},
    },
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("planIdentifier must not be empty")]
    EmptyPlan,
    #[error("competitorLimit must be -1 (unlimited) or a non-negative number")]
    InvalidCompetitorLimit,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, ActivationError>;

/// Applies a payment-provider activation: the user's current subscription
/// becomes `active` on the paid plan with a fresh billing period.
pub struct SubscriptionActivationUseCase {
    subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>,
}

impl SubscriptionActivationUseCase {
    pub fn new(subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>) -> Self {
        Self {
            subscription_repository,
        }
    }

    pub async fn activate(
        &self,
        model: ActivateSubscriptionModel,
        now: DateTime<Utc>,
    ) -> UseCaseResult<SubscriptionDto> {
        if model.plan_identifier.trim().is_empty() {
            return Err(ActivationError::EmptyPlan);
        }
        if model.competitor_limit < UNLIMITED_COMPETITORS {
            return Err(ActivationError::InvalidCompetitorLimit);
        }

        let user_id = model.user_id;
        let changes = activation_changes(&model, now)?;

        let current = self
            .subscription_repository
            .find_current_subscription(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "activate_subscription: failed to load subscription"
                );
                ActivationError::Internal(err)
            })?;

        let activated = match current {
            Some(subscription) => {
                info!(
                    %user_id,
                    subscription_id = %subscription.id,
                    previous_status = %subscription.status,
                    plan = %changes.plan_identifier,
                    "activate_subscription: activating current subscription"
                );
                self.subscription_repository
                    .activate_subscription(subscription.id, changes)
                    .await?
            }
            None => {
                info!(
                    %user_id,
                    plan = %changes.plan_identifier,
                    "activate_subscription: no subscription yet; creating an active one"
                );
                self.subscription_repository
                    .create_subscription(InsertSubscriptionEntity {
                        user_id,
                        status: changes.status,
                        plan_identifier: changes.plan_identifier,
                        current_period_start: changes.current_period_start,
                        current_period_end: changes.current_period_end,
                        competitor_limit: changes.competitor_limit,
                        created_at: now,
                        updated_at: now,
                    })
                    .await?
            }
        };

        Ok(SubscriptionDto::from(activated))
    }
}
