//! Password hashing using Argon2id.

use crate::config::AuthConfig;
use crate::error::{HashError, PasswordError};

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Salted one-way hashing of user secrets.
///
/// Hashes are PHC strings, so the salt and cost parameters travel with the
/// hash and verification works even after the configured costs change.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_cost, time_cost, parallelism, None)
            .map_err(|e| HashError(format!("invalid argon2 params: {e}")))?;
        Ok(Self { params })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, HashError> {
        Self::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret with a fresh random salt
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(e.to_string()))
    }

    /// Check a secret against a stored hash.
    ///
    /// The comparison of the derived output is constant-time inside
    /// `argon2`.
    pub fn verify(&self, secret: &str, hashed: &str) -> Result<(), PasswordError> {
        let parsed_hash =
            PasswordHash::new(hashed).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        match self.argon2().verify_password(secret.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(PasswordError::Mismatch),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}
