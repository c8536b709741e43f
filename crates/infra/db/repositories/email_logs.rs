use anyhow::Result;
use async_trait::async_trait;
use diesel::{dsl::exists, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::email_logs::InsertEmailLogEntity,
        repositories::email_logs::EmailLogRepository,
        value_objects::enums::email_types::{EmailLogStatus, EmailType},
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::email_logs},
};

pub struct EmailLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EmailLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EmailLogRepository for EmailLogPostgres {
    async fn has_sent(&self, user_id: Uuid, email_type: EmailType) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let sent = diesel::select(exists(
            email_logs::table
                .filter(email_logs::user_id.eq(user_id))
                .filter(email_logs::email_type.eq(email_type.as_str()))
                .filter(email_logs::status.eq(EmailLogStatus::Sent.to_string())),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(sent)
    }

    async fn record(&self, insert_email_log_entity: InsertEmailLogEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::insert_into(email_logs::table)
            .values(&insert_email_log_entity)
            .execute(&mut conn)?;

        Ok(())
    }
}
