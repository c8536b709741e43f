use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::crawl_queue::{CrawlQueueEntity, InsertCrawlQueueEntity},
    value_objects::crawl_scheduling::EnqueueOutcome,
};

#[automock]
#[async_trait]
pub trait CrawlQueueRepository {
    /// Inserts the job unless the competitor already has one pending.
    /// A uniqueness conflict is reported as `AlreadyQueued`, not as an error.
    async fn enqueue(
        &self,
        insert_crawl_queue_entity: InsertCrawlQueueEntity,
    ) -> Result<EnqueueOutcome>;

    async fn find_by_competitor(&self, competitor_id: Uuid) -> Result<Option<CrawlQueueEntity>>;

    /// Number of rows with `scheduled_for <= scheduled_for` and `priority >= priority`.
    async fn count_ahead(&self, scheduled_for: DateTime<Utc>, priority: i32) -> Result<i64>;
}
