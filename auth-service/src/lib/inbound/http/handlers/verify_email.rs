use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .verify_email(body.token.trim())
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::OK, MessageData::new("Email address verified")))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyEmailRequest {
    token: String,
}
