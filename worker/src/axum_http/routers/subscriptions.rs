use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use crates::domain::value_objects::subscriptions::{ActivateSubscriptionModel, SubscriptionDto};
use serde::Serialize;
use tracing::error;

use crate::usecases::subscription_activation::{ActivationError, SubscriptionActivationUseCase};

pub fn routes(usecase: Arc<SubscriptionActivationUseCase>) -> Router {
    Router::new()
        .route("/activate", post(activate))
        .with_state(usecase)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionDto>,
}

pub async fn activate(
    State(usecase): State<Arc<SubscriptionActivationUseCase>>,
    Json(payload): Json<ActivateSubscriptionModel>,
) -> Response {
    let user_id = payload.user_id;

    match usecase.activate(payload, Utc::now()).await {
        Ok(subscription) => Json(ActivateResponse {
            status: "success",
            message: None,
            subscription: Some(subscription),
        })
        .into_response(),
        Err(ActivationError::Internal(err)) => {
            error!(%user_id, error = ?err, "activate_subscription: usecase failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActivateResponse {
                    status: "error",
                    message: Some("activation failed".to_string()),
                    subscription: None,
                }),
            )
                .into_response()
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(ActivateResponse {
                status: "error",
                message: Some(err.to_string()),
                subscription: None,
            }),
        )
            .into_response(),
    }
}
