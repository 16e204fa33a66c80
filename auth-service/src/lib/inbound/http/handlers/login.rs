use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::errors::AuthError;
use crate::domain::account::models::AuthSession;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    // A malformed email cannot belong to an account
    let email = EmailAddress::new(body.email)
        .map_err(|_| ApiError::from(AuthError::InvalidCredentials))?;

    state
        .auth_service
        .login(LoginCommand {
            email,
            password: body.password,
        })
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::OK, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: AccountData,
}

impl From<&AuthSession> for LoginResponseData {
    fn from(session: &AuthSession) -> Self {
        Self {
            access_token: session.access_token.token.clone(),
            token_type: "Bearer".to_string(),
            expires_at: session.access_token.expires_at,
            user: (&session.account).into(),
        }
    }
}
