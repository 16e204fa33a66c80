use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::account::errors::AuthError;
use crate::domain::account::models::Password;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let command = ResetPasswordCommand {
        token: body.token.trim().to_string(),
        new_password: Password::new(body.new_password).map_err(AuthError::from)?,
    };

    state
        .auth_service
        .reset_password(command)
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::OK, MessageData::new("Password has been reset")))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    token: String,
    new_password: String,
}
