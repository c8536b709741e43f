use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use crates::domain::{
    repositories::{competitors::CompetitorRepository, subscriptions::SubscriptionRepository},
    value_objects::competitors::AddCompetitorModel,
};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::competitors::{CompetitorError, CompetitorUseCase},
};

impl From<CompetitorError> for AppError {
    fn from(err: CompetitorError) -> Self {
        match err {
            CompetitorError::Denied(denial) => AppError::from(denial),
            CompetitorError::Invalid(invalid) => AppError::BadRequest(invalid.to_string()),
            CompetitorError::BusinessNotFound => AppError::NotFound {
                error_code: "BUSINESS_NOT_FOUND",
                message: "Business not found".to_string(),
            },
            CompetitorError::LimitReached { limit } => AppError::Forbidden {
                error_code: "COMPETITOR_LIMIT_REACHED",
                message: format!(
                    "Your plan allows {limit} competitors. Upgrade to monitor more."
                ),
            },
            CompetitorError::Internal(err) => AppError::Internal(err),
        }
    }
}

pub fn routes<S, C>(competitors_usecase: Arc<CompetitorUseCase<S, C>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(add_competitor::<S, C>))
        .with_state(competitors_usecase)
}

pub async fn add_competitor<S, C>(
    State(competitors_usecase): State<Arc<CompetitorUseCase<S, C>>>,
    auth: AuthUser,
    Json(add_competitor_model): Json<AddCompetitorModel>,
) -> Result<Response, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
{
    let competitor = competitors_usecase
        .add_competitor(auth.user_id, add_competitor_model, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(competitor)).into_response())
}
