//! Authentication Error Types
//!
//! One error enum per component, plus the facade-level [`AuthError`]
//! that request handlers map to HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Failure to recover a credential from request headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Authorization header is malformed")]
    MalformedHeader,
}

/// Session token issuance/validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token subject is not a valid user id")]
    MalformedSubject,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Refresh token lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token has expired")]
    Expired,

    #[error("Refresh token has been revoked")]
    Revoked,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Password hashing failed inside the algorithm or RNG
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct HashError(pub String);

/// Password verification errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("Password does not match")]
    Mismatch,

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// The OS random source could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to obtain entropy: {0}")]
pub struct EntropyError(pub String);

/// Storage collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        tracing::error!("Database error: {:?}", err);
        StoreError::Database(err.to_string())
    }
}

/// Facade errors returned to request handlers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailExists,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal,
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AuthError::EmailExists,
            StoreError::Database(msg) => AuthError::Database(msg),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        AuthError::Internal
    }
}

impl From<EntropyError> for AuthError {
    fn from(err: EntropyError) -> Self {
        tracing::error!("{}", err);
        AuthError::Internal
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AuthError::Extract(_) => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AuthError::Token(TokenError::Expired) => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                self.to_string(),
            ),
            AuthError::Token(TokenError::Signing(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
            // Signature and structure failures share one message
            AuthError::Token(_) => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid token".to_string(),
            ),
            AuthError::Lookup(LookupError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
            AuthError::Lookup(_) => (
                StatusCode::UNAUTHORIZED,
                "invalid_refresh_token",
                self.to_string(),
            ),
            AuthError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                self.to_string(),
            ),
            AuthError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "user_not_found",
                self.to_string(),
            ),
            AuthError::EmailExists => (StatusCode::CONFLICT, "email_exists", self.to_string()),
            AuthError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AuthError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                msg.clone(),
            ),
            AuthError::Database(_) | AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        (
            status,
            Json(serde_json::json!({
                "error": error_code,
                "message": message
            })),
        )
            .into_response()
    }
}
