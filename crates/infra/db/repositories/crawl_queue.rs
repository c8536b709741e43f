use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::crawl_queue::{CrawlQueueEntity, InsertCrawlQueueEntity},
        repositories::crawl_queue::CrawlQueueRepository,
        value_objects::crawl_scheduling::EnqueueOutcome,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::crawl_queue},
};

pub struct CrawlQueuePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CrawlQueuePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CrawlQueueRepository for CrawlQueuePostgres {
    async fn enqueue(
        &self,
        insert_crawl_queue_entity: InsertCrawlQueueEntity,
    ) -> Result<EnqueueOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The unique index on competitor_id decides between concurrent passes.
        let inserted = diesel::insert_into(crawl_queue::table)
            .values(&insert_crawl_queue_entity)
            .on_conflict(crawl_queue::competitor_id)
            .do_nothing()
            .returning(crawl_queue::id)
            .get_result::<Uuid>(&mut conn)
            .optional()?;

        Ok(match inserted {
            Some(queue_id) => EnqueueOutcome::Enqueued(queue_id),
            None => EnqueueOutcome::AlreadyQueued,
        })
    }

    async fn find_by_competitor(&self, competitor_id: Uuid) -> Result<Option<CrawlQueueEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = crawl_queue::table
            .filter(crawl_queue::competitor_id.eq(competitor_id))
            .select(CrawlQueueEntity::as_select())
            .first::<CrawlQueueEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn count_ahead(&self, scheduled_for: DateTime<Utc>, priority: i32) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = crawl_queue::table
            .filter(crawl_queue::scheduled_for.le(scheduled_for))
            .filter(crawl_queue::priority.ge(priority))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }
}
