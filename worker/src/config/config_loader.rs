use super::config_model::{App, Cron, Database, DotEnvyConfig, Email, WorkerServer};
use anyhow::{Context, Result};
use crates::config::policy_loader;
use url::Url;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .context("SERVER_PORT_WORKER is missing")?
            .parse()
            .context("SERVER_PORT_WORKER is invalid")?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is missing")?,
        max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?,
    };

    let cron = Cron {
        internal_token: std::env::var("CRON_SECRET").ok().and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
    };

    let email = Email {
        api_url: Url::parse(
            &std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
        )
        .context("EMAIL_API_URL is invalid")?,
        api_key: std::env::var("EMAIL_API_KEY").context("EMAIL_API_KEY is missing")?,
        from: std::env::var("EMAIL_FROM").context("EMAIL_FROM is missing")?,
    };

    let app = App {
        base_url: std::env::var("APP_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string(),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        cron,
        email,
        app,
        policy: policy_loader::load_lifecycle_policy()?,
        scheduler: policy_loader::load_scheduler_settings()?,
    })
}
