use crates::domain::value_objects::lifecycle_policy::{LifecyclePolicy, SchedulerSettings};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub policy: LifecyclePolicy,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Auth {
    /// HS256 secret shared with the session issuer.
    pub jwt_secret: String,
}
