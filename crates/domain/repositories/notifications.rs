use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

use crate::domain::value_objects::enums::email_types::EmailType;

#[automock]
#[async_trait]
pub trait EmailSender {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

#[automock]
pub trait TemplateRenderer {
    fn subject(&self, template: EmailType) -> String;

    fn render(&self, template: EmailType, data: &Value) -> Result<String>;
}
