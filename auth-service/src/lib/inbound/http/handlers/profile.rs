use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::domain::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Account of the bearer token's subject.
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    state
        .auth_service
        .get_user_by_id(&user.user_id)
        .await
        .map_err(ApiError::from)?
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", user.user_id)))
}
