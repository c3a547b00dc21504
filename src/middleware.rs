//! Authentication Middleware
//!
//! Session token validation for whole route groups.

use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::handlers::AuthState;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Require authenticated user
///
/// Validates the session token from the Authorization header and stores
/// the user id in request extensions for [`AuthUser`].
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id = auth.authorize(req.headers())?;

    req.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(req).await)
}
