use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::domain::repositories::notifications::EmailSender;

/// Sends transactional mail through a JSON HTTP API (Resend-compatible).
pub struct HttpEmailSender {
    api_url: Url,
    api_key: String,
    from: String,
    client: Client,
}

impl HttpEmailSender {
    pub fn new(api_url: Url, api_key: String, from: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build email http client")?;

        Ok(Self {
            api_url,
            api_key,
            from,
            client,
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "email api returned non-success status: {}",
            response.status()
        ))
    }
}

// The request carries the API key; never surface reqwest's full error text.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("email api request timed out");
    }
    if error.is_connect() {
        return anyhow!("email api connection failed");
    }
    anyhow!("email api request failed")
}
