use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use crates::domain::repositories::{
    competitors::CompetitorRepository, crawl_queue::CrawlQueueRepository,
    subscriptions::SubscriptionRepository,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::manual_crawl::{ManualCrawlError, ManualCrawlUseCase},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCrawlRequest {
    pub competitor_id: Uuid,
}

impl From<ManualCrawlError> for AppError {
    fn from(err: ManualCrawlError) -> Self {
        match err {
            ManualCrawlError::Denied(denial) => AppError::from(denial),
            ManualCrawlError::CompetitorNotFound => AppError::NotFound {
                error_code: "COMPETITOR_NOT_FOUND",
                message: "Competitor not found".to_string(),
            },
            ManualCrawlError::Internal(err) => AppError::Internal(err),
        }
    }
}

pub fn routes<S, C, Q>(manual_crawl_usecase: Arc<ManualCrawlUseCase<S, C, Q>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
    Q: CrawlQueueRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/trigger", post(trigger_crawl::<S, C, Q>))
        .with_state(manual_crawl_usecase)
}

/// 202 when a new queue row was created, 200 when one was already pending.
pub async fn trigger_crawl<S, C, Q>(
    State(manual_crawl_usecase): State<Arc<ManualCrawlUseCase<S, C, Q>>>,
    auth: AuthUser,
    Json(request): Json<TriggerCrawlRequest>,
) -> Result<Response, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
    Q: CrawlQueueRepository + Send + Sync + 'static,
{
    let result = manual_crawl_usecase
        .trigger(auth.user_id, request.competitor_id, Utc::now())
        .await?;

    let status = if result.queued {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(result)).into_response())
}
