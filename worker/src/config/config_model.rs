use crates::domain::value_objects::lifecycle_policy::{LifecyclePolicy, SchedulerSettings};
use url::Url;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub cron: Cron,
    pub email: Email,
    pub app: App,
    pub policy: LifecyclePolicy,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Cron {
    /// Shared secret for the internal endpoints; `None` disables them (503).
    pub internal_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Email {
    pub api_url: Url,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct App {
    pub base_url: String,
}
