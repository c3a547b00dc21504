use super::{CredentialStore, RefreshTokenStore};
use crate::error::StoreError;
use crate::models::{NewRefreshToken, RefreshTokenRecord, User};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// In-process store with the same semantics as [`super::PgStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("email {email} already exists")));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::Conflict(format!("email {email} already exists")));
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn upgrade_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;

        Ok(tables.users.get_mut(&id).map(|user| {
            user.is_chirpy_red = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create_refresh_token(&self, token: NewRefreshToken) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&token.user_id) {
            return Err(StoreError::Database(format!(
                "user {} does not exist",
                token.user_id
            )));
        }
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(StoreError::Conflict("refresh token already exists".into()));
        }

        let now = Utc::now();
        tables.refresh_tokens.insert(
            token.token.clone(),
            RefreshTokenRecord {
                token: token.token,
                user_id: token.user_id,
                created_at: now,
                updated_at: now,
                expires_at: token.expires_at,
                revoked_at: None,
            },
        );

        Ok(())
    }

    async fn get_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.tables.read().await.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.refresh_tokens.get_mut(token) {
            Some(record) => {
                let now = Utc::now();
                record.revoked_at.get_or_insert(now);
                record.updated_at = now;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user("a@b.com", "hash").await.unwrap();
        let err = store.create_user("a@b.com", "hash").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_none() {
        let store = MemoryStore::new();
        let updated = store
            .update_user(Uuid::new_v4(), "a@b.com", "hash")
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_revoke_keeps_first_timestamp() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        store
            .create_refresh_token(NewRefreshToken {
                token: "abc".into(),
                user_id: user.id,
                expires_at: Utc::now() + Duration::days(60),
            })
            .await
            .unwrap();

        assert_eq!(store.revoke_refresh_token("abc").await.unwrap(), 1);
        let first = store.get_refresh_token("abc").await.unwrap().unwrap();

        assert_eq!(store.revoke_refresh_token("abc").await.unwrap(), 1);
        let second = store.get_refresh_token("abc").await.unwrap().unwrap();

        assert_eq!(first.revoked_at, second.revoked_at);
        assert_eq!(store.revoke_refresh_token("missing").await.unwrap(), 0);
    }
}
