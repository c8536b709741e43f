use std::{sync::Arc, time::Instant};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use crate::usecases::{
    elapsed_ms,
    lifecycle_transitions::{LifecyclePassStats, LifecycleTransitionUseCase},
    scheduling_pass::{SchedulingPassStats, SchedulingPassUseCase},
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/cron/schedule-crawls" \
//     -H "Authorization: Bearer $CRON_SECRET"

#[derive(Clone)]
pub struct CronRouteState {
    scheduling_usecase: Arc<SchedulingPassUseCase>,
    lifecycle_usecase: Arc<LifecycleTransitionUseCase>,
}

pub fn routes(
    scheduling_usecase: Arc<SchedulingPassUseCase>,
    lifecycle_usecase: Arc<LifecycleTransitionUseCase>,
) -> Router {
    Router::new()
        .route("/schedule-crawls", post(schedule_crawls))
        .route("/expire-subscriptions", post(expire_subscriptions))
        .with_state(CronRouteState {
            scheduling_usecase,
            lifecycle_usecase,
        })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub stats: T,
    pub elapsed_ms: u64,
}

impl<T: Serialize> CronResponse<T> {
    fn success(stats: T, elapsed_ms: u64) -> Response {
        Json(Self {
            status: "success",
            message: None,
            stats,
            elapsed_ms,
        })
        .into_response()
    }

    fn failed(message: &str, stats: T, elapsed_ms: u64) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self {
                status: "error",
                message: Some(message.to_string()),
                stats,
                elapsed_ms,
            }),
        )
            .into_response()
    }
}

pub async fn schedule_crawls(State(state): State<CronRouteState>) -> Response {
    let started = Instant::now();

    match state.scheduling_usecase.run(Utc::now()).await {
        Ok(stats) => {
            let elapsed = stats.elapsed_ms;
            CronResponse::success(stats, elapsed)
        }
        Err(err) => {
            error!(error = ?err, "schedule_crawls: pass failed");
            CronResponse::failed(
                "crawl scheduling failed",
                SchedulingPassStats::default(),
                elapsed_ms(started),
            )
        }
    }
}

pub async fn expire_subscriptions(State(state): State<CronRouteState>) -> Response {
    let started = Instant::now();

    match state.lifecycle_usecase.run(Utc::now()).await {
        Ok(stats) => {
            let elapsed = stats.elapsed_ms;
            CronResponse::success(stats, elapsed)
        }
        Err(err) => {
            error!(error = ?err, "expire_subscriptions: pass failed");
            CronResponse::failed(
                "subscription expiration failed",
                LifecyclePassStats::default(),
                elapsed_ms(started),
            )
        }
    }
}
