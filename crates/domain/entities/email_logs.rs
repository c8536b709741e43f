use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::email_logs;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = email_logs)]
pub struct EmailLogEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email_type: String,
    pub recipient: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = email_logs)]
pub struct InsertEmailLogEntity {
    pub user_id: Uuid,
    pub email_type: String,
    pub recipient: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
