use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::models::UserId;
use crate::domain::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let user_id = UserId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .auth_service
        .get_user_by_id(&user_id)
        .await
        .map_err(ApiError::from)?
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", user_id)))
}
