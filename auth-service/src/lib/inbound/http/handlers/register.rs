use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::errors::EmailError;
use crate::domain::account::errors::PasswordPolicyError;
use crate::domain::account::errors::PersonNameError;
use crate::domain::account::errors::UsernameError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::Password;
use crate::domain::account::models::PersonName;
use crate::domain::account::models::RegisterCommand;
use crate::domain::account::models::Username;
use crate::domain::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    state
        .auth_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::CREATED, account.into()))
}

/// HTTP request body for registering an account (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    name: String,
    surname: String,
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Invalid name: {0}")]
    Name(#[from] PersonNameError),

    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        Ok(RegisterCommand {
            name: PersonName::new(self.name)?,
            surname: PersonName::new(self.surname)?,
            username: Username::new(self.username)?,
            email: EmailAddress::new(self.email)?,
            password: Password::new(self.password)?,
        })
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
