use anyhow::{Context, Result};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{
        ActivateSubscriptionEntity, InsertSubscriptionEntity, SubscriptionEntity,
    },
    value_objects::{
        eligibility::{AccessDenial, is_eligible, write_access_denial},
        enums::subscription_statuses::SubscriptionStatus,
        lifecycle_policy::{LifecyclePolicy, UNLIMITED_COMPETITORS},
    },
};

/// A subscription picked up by the lifecycle job, with its owner's contact details.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleCandidate {
    pub subscription: SubscriptionEntity,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateSubscriptionModel {
    pub user_id: Uuid,
    pub plan_identifier: String,
    pub competitor_limit: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: SubscriptionStatus,
    pub plan_identifier: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub competitor_limit: i32,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(entity: SubscriptionEntity) -> Self {
        Self {
            status: entity.status(),
            id: entity.id,
            user_id: entity.user_id,
            plan_identifier: entity.plan_identifier,
            current_period_start: entity.current_period_start,
            current_period_end: entity.current_period_end,
            competitor_limit: entity.competitor_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessStatusDto {
    pub subscription_id: Option<Uuid>,
    pub status: Option<SubscriptionStatus>,
    pub plan_identifier: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub grace_ends_at: Option<DateTime<Utc>>,
    pub crawl_eligible: bool,
    pub can_write: bool,
    pub error_code: Option<&'static str>,
    pub message: Option<&'static str>,
}

impl AccessStatusDto {
    pub fn evaluate(
        subscription: Option<&SubscriptionEntity>,
        now: DateTime<Utc>,
        policy: &LifecyclePolicy,
    ) -> Self {
        let denial: Option<AccessDenial> = write_access_denial(subscription, now, policy);
        let status = subscription.map(SubscriptionEntity::status);

        Self {
            subscription_id: subscription.map(|s| s.id),
            status,
            plan_identifier: subscription.map(|s| s.plan_identifier.clone()),
            current_period_end: subscription.map(|s| s.current_period_end),
            grace_ends_at: subscription
                .filter(|s| {
                    matches!(
                        s.status(),
                        SubscriptionStatus::Trialing | SubscriptionStatus::GracePeriod
                    )
                })
                .map(|s| policy.grace_deadline(s.current_period_end)),
            crawl_eligible: subscription.is_some_and(|s| is_eligible(s, now, policy)),
            can_write: denial.is_none(),
            error_code: denial.map(|d| d.error_code()),
            message: denial.map(|d| d.message()),
        }
    }
}

pub fn new_trial_subscription(
    user_id: Uuid,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> InsertSubscriptionEntity {
    InsertSubscriptionEntity {
        user_id,
        status: SubscriptionStatus::Trialing.to_string(),
        plan_identifier: policy.trial_plan_identifier.clone(),
        current_period_start: now,
        current_period_end: now + policy.trial_duration(),
        competitor_limit: policy.trial_competitor_limit,
        created_at: now,
        updated_at: now,
    }
}

/// Conversion to a paid plan starts a fresh one-month billing period at `now`.
pub fn activation_changes(
    model: &ActivateSubscriptionModel,
    now: DateTime<Utc>,
) -> Result<ActivateSubscriptionEntity> {
    let current_period_end = now
        .checked_add_months(Months::new(1))
        .context("failed to compute billing period end")?;

    Ok(ActivateSubscriptionEntity {
        status: SubscriptionStatus::Active.to_string(),
        plan_identifier: model.plan_identifier.clone(),
        current_period_start: now,
        current_period_end,
        competitor_limit: model.competitor_limit,
        updated_at: now,
    })
}

/// Whether one more competitor fits under the subscription's limit.
pub fn has_competitor_capacity(subscription: &SubscriptionEntity, current_count: i64) -> bool {
    subscription.competitor_limit == UNLIMITED_COMPETITORS
        || current_count < i64::from(subscription.competitor_limit)
}
