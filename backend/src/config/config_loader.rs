use super::config_model::{Auth, BackendServer, Database, DotEnvyConfig};
use anyhow::{Context, Result, bail};
use crates::config::policy_loader;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .context("SERVER_PORT_BACKEND is missing")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is missing")?,
        max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?,
    };

    let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET is missing")?;
    if jwt_secret.trim().is_empty() {
        bail!("JWT_SECRET must not be empty");
    }

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth: Auth { jwt_secret },
        policy: policy_loader::load_lifecycle_policy()?,
        scheduler: policy_loader::load_scheduler_settings()?,
    })
}
