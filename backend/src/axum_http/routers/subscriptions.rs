use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use crates::domain::repositories::subscriptions::SubscriptionRepository;
use serde_json::json;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::subscriptions::{SubscriptionUseCase, TrialError},
};

impl From<TrialError> for AppError {
    fn from(err: TrialError) -> Self {
        match err {
            TrialError::AlreadySubscribed => {
                AppError::Conflict("A subscription already exists for this account".to_string())
            }
            TrialError::Internal(err) => AppError::Internal(err),
        }
    }
}

pub fn routes<S>(subscriptions_usecase: Arc<SubscriptionUseCase<S>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/trial", post(start_trial::<S>))
        .route("/access", get(access_status::<S>))
        .with_state(subscriptions_usecase)
}

pub async fn start_trial<S>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<S>>>,
    auth: AuthUser,
) -> Result<Response, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let subscription = subscriptions_usecase
        .start_trial(auth.user_id, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "subscription": subscription })),
    )
        .into_response())
}

pub async fn access_status<S>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<S>>>,
    auth: AuthUser,
) -> Result<Response, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let access = subscriptions_usecase
        .access_status(auth.user_id, Utc::now())
        .await?;

    Ok((StatusCode::OK, Json(access)).into_response())
}
