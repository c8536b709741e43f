use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::competitors;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = competitors)]
pub struct CompetitorEntity {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub crawl_frequency_minutes: i32,
    pub last_crawled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = competitors)]
pub struct InsertCompetitorEntity {
    pub business_id: Uuid,
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub crawl_frequency_minutes: i32,
    pub last_crawled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
