//! Authentication HTTP Handlers
//!
//! REST API endpoints for authentication operations.

use crate::error::AuthError;
use crate::extractors::{AuthUser, JsonBody};
use crate::middleware;
use crate::models::*;
use crate::service::AuthService;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
pub fn create_routes(auth_service: AuthState) -> Router {
    // Bearer tokens here are parsed by the service itself
    let public = Router::new()
        .route("/api/users", post(register).put(update_user))
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh_token))
        .route("/api/revoke", post(revoke_token))
        .route("/api/polka/webhooks", post(polka_webhook));

    let protected = Router::new()
        .route("/api/me", get(get_current_user))
        .layer(axum_middleware::from_fn_with_state(
            auth_service.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(auth_service)
}

// ============================================
// Registration
// ============================================

/// POST /api/users
///
/// Register a new user account
pub async fn register(
    State(auth): State<AuthState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = auth.register(req).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users
///
/// Change email and password of the authenticated user
pub async fn update_user(
    State(auth): State<AuthState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = auth.update_credentials(&headers, req).await?;

    Ok(Json(user))
}

// ============================================
// Login / Token Lifecycle
// ============================================

/// POST /api/login
///
/// Authenticate user and return session/refresh tokens
pub async fn login(
    State(auth): State<AuthState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = auth.login(req).await?;

    Ok(Json(response))
}

/// POST /api/refresh
///
/// Issue a new session token for the refresh token in the Authorization header
pub async fn refresh_token(
    State(auth): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let response = auth.refresh(&headers).await?;

    Ok(Json(response))
}

/// POST /api/revoke
///
/// Revoke the refresh token in the Authorization header
pub async fn revoke_token(
    State(auth): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    auth.revoke(&headers).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================
// Webhooks
// ============================================

/// POST /api/polka/webhooks
///
/// Subscription events from the payment provider
pub async fn polka_webhook(
    State(auth): State<AuthState>,
    headers: HeaderMap,
    JsonBody(event): JsonBody<PolkaEvent>,
) -> Result<impl IntoResponse, AuthError> {
    auth.handle_polka_event(&headers, event).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================
// User Profile
// ============================================

/// GET /api/me
///
/// Get current user profile
pub async fn get_current_user(
    State(auth): State<AuthState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AuthError> {
    let user = auth.get_user(user_id).await?;

    Ok(Json(user))
}
