use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::domain::account::ports::UserManagementPort;
use crate::inbound::http::router::AppState;

pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let user_id = UserId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let role = body
        .role
        .parse::<Role>()
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    state
        .user_management
        .update_role(&user_id, role)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateRoleRequest {
    role: String,
}
