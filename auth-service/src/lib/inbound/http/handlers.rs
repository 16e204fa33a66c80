use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::account::errors::AuthError;
use crate::domain::account::models::Account;
use crate::domain::action_token::errors::ActionTokenError;

pub mod forgot_password;
pub mod get_user;
pub mod health;
pub mod login;
pub mod profile;
pub mod register;
pub mod resend_verification;
pub mod reset_password;
pub mod update_role;
pub mod update_status;
pub mod verify_email;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
}

impl ApiError {
    /// Generic 500; the cause is logged, never returned to the client.
    fn internal() -> Self {
        ApiError::InternalServerError("Internal server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::EmailTaken(_) | AuthError::UsernameTaken(_) => {
                ApiError::Conflict(err.to_string())
            }
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::AccountDisabled | AuthError::EmailNotVerified => {
                ApiError::Forbidden(err.to_string())
            }
            AuthError::InvalidUserId(_)
            | AuthError::InvalidUsername(_)
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidPassword(_)
            | AuthError::InvalidName(_)
            | AuthError::InvalidInput(_) => ApiError::UnprocessableEntity(err.to_string()),
            AuthError::ActionToken(
                ActionTokenError::NotFound | ActionTokenError::Expired | ActionTokenError::AlreadyUsed,
            ) => ApiError::BadRequest(err.to_string()),
            AuthError::ActionToken(ActionTokenError::Storage(_))
            | AuthError::Credential(_)
            | AuthError::Token(_)
            | AuthError::Configuration(_)
            | AuthError::Storage(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::internal()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Plain acknowledgement for operations without a resource to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public view of an account; never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountData {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountData {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.as_str().to_string(),
            surname: account.surname.as_str().to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            role: account.role.as_str().to_string(),
            email_verified: account.email_verified,
            status: account.status.as_str().to_string(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
