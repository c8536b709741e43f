use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{
        ActivateSubscriptionEntity, InsertSubscriptionEntity, SubscriptionEntity,
    },
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus, subscriptions::LifecycleCandidate,
    },
};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// The user's newest subscription row, which is authoritative.
    async fn find_current_subscription(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Newest subscription row for each of `user_ids`; users without one are absent.
    async fn find_current_subscriptions_for_users(
        &self,
        user_ids: Vec<Uuid>,
    ) -> Result<Vec<SubscriptionEntity>>;

    /// Current subscriptions in `status` on `plan_identifier` whose period
    /// ended strictly before `period_end_before`, oldest period end first.
    async fn list_lifecycle_candidates(
        &self,
        status: SubscriptionStatus,
        plan_identifier: String,
        period_end_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LifecycleCandidate>>;

    /// Compare-and-set status update. Returns `false` when the row was no
    /// longer in `from`, e.g. because an overlapping pass moved it first.
    async fn transition_status(
        &self,
        subscription_id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    async fn create_subscription(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity>;

    async fn activate_subscription(
        &self,
        subscription_id: Uuid,
        changes: ActivateSubscriptionEntity,
    ) -> Result<SubscriptionEntity>;
}
