use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::subscription_statuses::SubscriptionStatus,
    infra::db::postgres::schema::subscriptions,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub plan_identifier: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub competitor_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    /// Parsed lifecycle status. A value the enum does not know is read as
    /// `expired` so it can never grant crawl eligibility.
    pub fn status(&self) -> SubscriptionStatus {
        self.status.parse().unwrap_or_else(|err| {
            warn!(
                subscription_id = %self.id,
                stored_status = %self.status,
                error = %err,
                "subscriptions: unknown stored status, treating as expired"
            );
            SubscriptionStatus::Expired
        })
    }

    pub fn is_trial_plan(&self, trial_plan_identifier: &str) -> bool {
        self.plan_identifier == trial_plan_identifier
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub status: String,
    pub plan_identifier: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub competitor_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub struct ActivateSubscriptionEntity {
    pub status: String,
    pub plan_identifier: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub competitor_limit: i32,
    pub updated_at: DateTime<Utc>,
}
