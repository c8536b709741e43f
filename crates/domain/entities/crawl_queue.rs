use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::crawl_queue;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = crawl_queue)]
pub struct CrawlQueueEntity {
    pub id: Uuid,
    pub competitor_id: Uuid,
    pub url: String,
    pub priority: i32,
    pub attempt: i32,
    pub max_attempts: i32,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = crawl_queue)]
pub struct InsertCrawlQueueEntity {
    pub competitor_id: Uuid,
    pub url: String,
    pub priority: i32,
    pub attempt: i32,
    pub max_attempts: i32,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
