use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::email_logs::InsertEmailLogEntity, value_objects::enums::email_types::EmailType,
};

#[automock]
#[async_trait]
pub trait EmailLogRepository {
    /// Whether an email of this type was already delivered successfully to the user.
    async fn has_sent(&self, user_id: Uuid, email_type: EmailType) -> Result<bool>;

    async fn record(&self, insert_email_log_entity: InsertEmailLogEntity) -> Result<()>;
}
