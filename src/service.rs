//! Authentication Service
//!
//! Composes password hashing, session tokens, refresh tokens and header
//! extraction into the operations request handlers call.

use crate::config::AuthConfig;
use crate::error::{AuthError, PasswordError};
use crate::extractors::{api_key, api_key_matches, bearer_token};
use crate::models::*;
use crate::password::PasswordHasher;
use crate::refresh::RefreshTokenManager;
use crate::store::{CredentialStore, RefreshTokenStore};
use crate::token::TokenIssuer;

use axum::http::HeaderMap;
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Authentication service
pub struct AuthService {
    config: AuthConfig,
    users: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    refresh_tokens: RefreshTokenManager,
    // Verified against when the email is unknown so both login failures cost one hash
    dummy_hash: String,
}

const DUMMY_PASSWORD: &str = "chirpy-login-timing-equalizer";

impl AuthService {
    /// Create a new authentication service.
    ///
    /// Fails if the configuration is invalid.
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn CredentialStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        let hasher =
            PasswordHasher::from_config(&config).map_err(|e| AuthError::Config(e.to_string()))?;
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        let tokens = TokenIssuer::from_config(&config);
        let refresh_tokens = RefreshTokenManager::new(
            refresh_store,
            Duration::seconds(config.refresh_token_expiration),
        );

        Ok(Self {
            config,
            users,
            hasher,
            tokens,
            refresh_tokens,
            dummy_hash,
        })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenManager {
        &self.refresh_tokens
    }

    // ============================================
    // Password Hashing
    // ============================================

    /// Hash a password on the blocking pool
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!("Password hashing task failed: {}", e);
                AuthError::Internal
            })?
            .map_err(AuthError::from)
    }

    /// Verify a password on the blocking pool
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<(), PasswordError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| PasswordError::MalformedHash(format!("verification task failed: {e}")))?
    }

    // ============================================
    // User Registration
    // ============================================

    /// Register a new user
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AuthError> {
        req.validate()?;

        let hashed_password = self.hash_password(&req.password).await?;
        let user = self.users.create_user(&req.email, &hashed_password).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(UserResponse::from(user))
    }

    // ============================================
    // Login / Refresh / Revoke
    // ============================================

    /// Exchange email and password for a session token and a refresh token.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthError> {
        req.validate()?;

        let user = match self.users.get_user_by_email(&req.email).await? {
            Some(user) => user,
            None => {
                let _ = self.verify_password(&req.password, &self.dummy_hash).await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        match self.verify_password(&req.password, &user.hashed_password).await {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => return Err(AuthError::InvalidCredentials),
            Err(PasswordError::MalformedHash(msg)) => {
                tracing::error!(user_id = %user.id, "Stored password hash unusable: {}", msg);
                return Err(AuthError::InvalidCredentials);
            }
        }

        // A refresh token persisted here stays valid even if issuance below fails
        let refresh_token = self.refresh_tokens.create(user.id).await?;

        let ttl = self.config.session_ttl_secs(req.expires_in_seconds);
        let token = self.tokens.issue(user.id, Duration::seconds(ttl))?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            user: UserResponse::from(user),
            token,
            refresh_token,
        })
    }

    /// Issue a new session token for the bearer's refresh token
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<TokenResponse, AuthError> {
        let refresh_token = bearer_token(headers)?;
        let user_id = self.refresh_tokens.resolve(refresh_token).await?;

        let token = self.tokens.issue(
            user_id,
            Duration::seconds(self.config.access_token_expiration),
        )?;

        Ok(TokenResponse { token })
    }

    /// Revoke the bearer's refresh token
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let refresh_token = bearer_token(headers)?;
        self.refresh_tokens.revoke(refresh_token).await?;
        Ok(())
    }

    // ============================================
    // Authorization
    // ============================================

    /// Validate the bearer's session token and return its user id
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = bearer_token(headers)?;
        let user_id = self.tokens.validate(token).map_err(|e| {
            tracing::debug!("Session token rejected: {}", e);
            e
        })?;
        Ok(user_id)
    }

    /// Replace the authenticated user's email and password
    pub async fn update_credentials(
        &self,
        headers: &HeaderMap,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        let user_id = self.authorize(headers)?;
        req.validate()?;

        let hashed_password = self.hash_password(&req.password).await?;
        let user = self
            .users
            .update_user(user_id, &req.email, &hashed_password)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user.id, "User credentials updated");
        Ok(UserResponse::from(user))
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        self.users
            .get_user(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    // ============================================
    // Subscription Webhook
    // ============================================

    /// Apply a subscription event sent by the payment provider.
    ///
    /// Events other than `user.upgraded` are accepted and ignored.
    pub async fn handle_polka_event(
        &self,
        headers: &HeaderMap,
        event: PolkaEvent,
    ) -> Result<(), AuthError> {
        let key = api_key(headers)?;
        if !api_key_matches(key, &self.config.polka_key) {
            tracing::warn!("Webhook called with an invalid API key");
            return Err(AuthError::InvalidApiKey);
        }

        if event.event != PolkaEvent::USER_UPGRADED {
            tracing::debug!(event = %event.event, "Ignoring webhook event");
            return Ok(());
        }

        let user = self
            .users
            .upgrade_user(event.data.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user.id, "User upgraded to Chirpy Red");
        Ok(())
    }
}
