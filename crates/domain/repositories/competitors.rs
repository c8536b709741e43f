use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        businesses::BusinessEntity,
        competitors::{CompetitorEntity, InsertCompetitorEntity},
    },
    value_objects::crawl_scheduling::DueCandidate,
};

#[automock]
#[async_trait]
pub trait CompetitorRepository {
    /// Active, unqueued competitors past their crawl interval at `now`,
    /// never-crawled first then oldest `last_crawled_at`, paged by `offset`.
    async fn list_due_candidates(
        &self,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DueCandidate>>;

    /// The competitor, only if it belongs to a business owned by `user_id`.
    async fn find_owned_competitor(
        &self,
        user_id: Uuid,
        competitor_id: Uuid,
    ) -> Result<Option<CompetitorEntity>>;

    async fn find_owned_business(
        &self,
        user_id: Uuid,
        business_id: Uuid,
    ) -> Result<Option<BusinessEntity>>;

    async fn count_competitors_for_user(&self, user_id: Uuid) -> Result<i64>;

    async fn create_competitor(
        &self,
        insert_competitor_entity: InsertCompetitorEntity,
    ) -> Result<CompetitorEntity>;
}
