use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::models::AccountStatus;
use crate::domain::account::models::UserId;
use crate::domain::account::ports::UserManagementPort;
use crate::inbound::http::router::AppState;

pub async fn update_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let user_id = UserId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let status = body
        .status
        .parse::<AccountStatus>()
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    state
        .user_management
        .update_status(&user_id, status)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateStatusRequest {
    status: String,
}
