use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{dsl::sql, prelude::*, sql_types::Bool};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::{
            ActivateSubscriptionEntity, InsertSubscriptionEntity, SubscriptionEntity,
        },
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            enums::subscription_statuses::SubscriptionStatus, subscriptions::LifecycleCandidate,
        },
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{subscriptions, users},
    },
};

/// Restricts a query to rows that are their user's newest subscription.
const NEWEST_FOR_USER: &str = "NOT EXISTS (SELECT 1 FROM subscriptions AS newer \
     WHERE newer.user_id = subscriptions.user_id \
     AND (newer.created_at, newer.id) > (subscriptions.created_at, subscriptions.id))";

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_current_subscription(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .order((subscriptions::created_at.desc(), subscriptions::id.desc()))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_current_subscriptions_for_users(
        &self,
        user_ids: Vec<Uuid>,
    ) -> Result<Vec<SubscriptionEntity>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .filter(subscriptions::user_id.eq_any(user_ids))
            .distinct_on(subscriptions::user_id)
            .order((
                subscriptions::user_id,
                subscriptions::created_at.desc(),
                subscriptions::id.desc(),
            ))
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_lifecycle_candidates(
        &self,
        status: SubscriptionStatus,
        plan_identifier: String,
        period_end_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LifecycleCandidate>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscriptions::table
            .inner_join(users::table)
            .filter(subscriptions::status.eq(status.to_string()))
            .filter(subscriptions::plan_identifier.eq(plan_identifier))
            .filter(subscriptions::current_period_end.lt(period_end_before))
            .filter(sql::<Bool>(NEWEST_FOR_USER))
            .order(subscriptions::current_period_end.asc())
            .limit(limit)
            .select((SubscriptionEntity::as_select(), users::email, users::name))
            .load::<(SubscriptionEntity, String, Option<String>)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(subscription, email, name)| LifecycleCandidate {
                subscription,
                email,
                name,
            })
            .collect())
    }

    async fn transition_status(
        &self,
        subscription_id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(
            subscriptions::table
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::status.eq(from.to_string())),
        )
        .set((
            subscriptions::status.eq(to.to_string()),
            subscriptions::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

        Ok(updated == 1)
    }

    async fn create_subscription(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(subscriptions::table)
            .values(&insert_subscription_entity)
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn activate_subscription(
        &self,
        subscription_id: Uuid,
        changes: ActivateSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::update(subscriptions::table.find(subscription_id))
            .set(&changes)
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }
}
