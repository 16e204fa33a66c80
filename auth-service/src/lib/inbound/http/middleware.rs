use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == Role::ADMIN)
    }
}

/// Middleware that validates bearer tokens and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?;

    let claims = state
        .authenticator
        .validate_token(token, state.clock.now())
        .map_err(|e| {
            tracing::warn!(error = %e, "JWT validation failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

    let user_id = UserId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse user ID from token");
        ApiError::Unauthorized("Invalid token format".to_string())
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id,
        roles: claims.roles,
    });

    Ok(next.run(req).await)
}

/// Middleware that admits only callers holding the admin role.
///
/// Must run after `authenticate`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication".to_string()))?;

    if !user.is_admin() {
        tracing::info!(user_id = %user.user_id, "Admin route refused");
        return Err(ApiError::Forbidden(
            "Administrator role required".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
    })
}
