//! Refresh token lifecycle: mint, persist, resolve, revoke.

use crate::error::{AuthError, EntropyError, LookupError};
use crate::models::NewRefreshToken;
use crate::store::RefreshTokenStore;

use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use uuid::Uuid;

/// Random bytes per refresh token (hex-encoded to twice as many chars)
pub const REFRESH_TOKEN_BYTES: usize = 256;

/// Generate a fresh opaque refresh token from the OS CSPRNG
pub fn mint() -> Result<String, EntropyError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| EntropyError(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Refresh tokens backed by a [`RefreshTokenStore`]
#[derive(Clone)]
pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
    ttl: Duration,
}

impl RefreshTokenManager {
    pub fn new(store: Arc<dyn RefreshTokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn mint(&self) -> Result<String, EntropyError> {
        mint()
    }

    /// Store `token` for `user`, expiring `ttl` from now
    pub async fn persist(&self, token: &str, user: Uuid, ttl: Duration) -> Result<(), LookupError> {
        self.store
            .create_refresh_token(NewRefreshToken {
                token: token.to_string(),
                user_id: user,
                expires_at: Utc::now() + ttl,
            })
            .await?;
        Ok(())
    }

    /// Mint a token and persist it with the configured lifetime
    pub async fn create(&self, user: Uuid) -> Result<String, AuthError> {
        let token = self.mint()?;
        self.persist(&token, user, self.ttl).await?;
        Ok(token)
    }

    /// Look up the user a usable token belongs to
    pub async fn resolve(&self, token: &str) -> Result<Uuid, LookupError> {
        let record = self
            .store
            .get_refresh_token(token)
            .await?
            .ok_or(LookupError::NotFound)?;

        if record.is_revoked() {
            return Err(LookupError::Revoked);
        }
        if record.is_expired() {
            return Err(LookupError::Expired);
        }

        Ok(record.user_id)
    }

    /// Revoke a token. Revoking an already revoked token succeeds.
    pub async fn revoke(&self, token: &str) -> Result<(), LookupError> {
        match self.store.revoke_refresh_token(token).await? {
            0 => Err(LookupError::NotFound),
            _ => Ok(()),
        }
    }
}
