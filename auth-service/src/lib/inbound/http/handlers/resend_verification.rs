use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::account::errors::AuthError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(body): Json<ResendVerificationRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let email = EmailAddress::new(body.email).map_err(AuthError::from)?;

    state
        .auth_service
        .resend_verification(&email)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::OK,
                MessageData::new(
                    "If the address belongs to an unverified account, a verification email has been sent",
                ),
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResendVerificationRequest {
    email: String,
}
