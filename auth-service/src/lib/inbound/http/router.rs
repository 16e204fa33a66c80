use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::forgot_password::forgot_password;
use super::handlers::get_user::get_user;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::profile::profile;
use super::handlers::register::register;
use super::handlers::resend_verification::resend_verification;
use super::handlers::reset_password::reset_password;
use super::handlers::update_role::update_role;
use super::handlers::update_status::update_status;
use super::handlers::verify_email::verify_email;
use super::middleware::authenticate as auth_middleware;
use super::middleware::require_admin;
use crate::domain::account::ports::AuthServicePort;
use crate::domain::account::ports::UserManagementPort;
use crate::domain::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub user_management: Arc<dyn UserManagementPort>,
    pub authenticator: Arc<Authenticator>,
    pub clock: Arc<dyn Clock>,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    user_management: Arc<dyn UserManagementPort>,
    authenticator: Arc<Authenticator>,
    clock: Arc<dyn Clock>,
) -> Router {
    let state = AppState {
        auth_service,
        user_management,
        authenticator,
        clock,
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/verify-email", post(verify_email))
        .route("/api/v1/auth/resend-verification", post(resend_verification))
        .route("/api/v1/auth/forgot-password", post(forgot_password))
        .route("/api/v1/auth/reset-password", post(reset_password));

    let protected_routes = Router::new()
        .route("/api/v1/auth/profile", get(profile))
        .route("/api/v1/users/:user_id", get(get_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Layers added last run first: authenticate, then the role check
    let admin_routes = Router::new()
        .route("/api/v1/users/:user_id/role", patch(update_role))
        .route("/api/v1/users/:user_id/status", patch(update_status))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
