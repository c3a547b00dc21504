//! Storage collaborator
//!
//! The auth subsystem never talks to a database directly; it goes through
//! these traits. [`PgStore`] backs them with PostgreSQL, [`MemoryStore`]
//! keeps everything in process.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::StoreError;
use crate::models::{NewRefreshToken, RefreshTokenRecord, User};

use async_trait::async_trait;
use uuid::Uuid;

/// Persistence of user credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user. A taken email fails with [`StoreError::Conflict`].
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Replace email and password hash. `None` when no such user exists.
    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Flag the user as a paying subscriber. `None` when no such user exists.
    async fn upgrade_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}

/// Persistence of refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(&self, token: NewRefreshToken) -> Result<(), StoreError>;

    async fn get_refresh_token(&self, token: &str)
        -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Set `revoked_at` if it is not set yet; returns the number of rows matched
    async fn revoke_refresh_token(&self, token: &str) -> Result<u64, StoreError>;
}
