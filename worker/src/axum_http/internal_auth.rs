use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::config::config_model::DotEnvyConfig;

/// Guards the internal endpoints with the shared cron secret.
/// Unconfigured secret → 503; missing or wrong bearer token → 401.
pub async fn require_internal_token(
    State(config): State<Arc<DotEnvyConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_token) = config.cron.internal_token.as_deref() else {
        warn!(path = %request.uri().path(), "internal_auth: CRON_SECRET is not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "internal token is not configured",
        )
            .into_response();
    };

    if let Err(status) = authorize_bearer(request.headers(), expected_token) {
        warn!(path = %request.uri().path(), "internal_auth: rejected request");
        return (status, "unauthorized").into_response();
    }

    next.run(request).await
}

pub fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
