//! Authentication Configuration
//!
//! All configuration values are loaded from environment variables.
//! No hardcoded secrets or sensitive data.

use crate::error::AuthError;
use std::env;
use std::str::FromStr;

/// Authentication configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for signing session tokens (from JWT_SECRET env var)
    pub jwt_secret: String,

    /// Session token `iss` claim (from JWT_ISSUER env var)
    pub jwt_issuer: String,

    /// Default session token lifetime in seconds (from JWT_ACCESS_EXPIRATION env var)
    pub access_token_expiration: i64,

    /// Upper bound for caller-requested session lifetimes (from JWT_MAX_ACCESS_EXPIRATION env var)
    pub max_access_token_expiration: i64,

    /// Refresh token lifetime in seconds (from JWT_REFRESH_EXPIRATION env var)
    pub refresh_token_expiration: i64,

    /// Shared key the subscription webhook must present (from POLKA_KEY env var)
    pub polka_key: String,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "chirpy".to_string(),
            access_token_expiration: 3600,       // 1 hour
            max_access_token_expiration: 3600,   // 1 hour
            refresh_token_expiration: 5_184_000, // 60 days
            polka_key: String::new(),
            argon2_memory_cost: 19456, // 19 MiB
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

fn required(name: &str) -> Result<String, AuthError> {
    env::var(name).map_err(|_| AuthError::Config(format!("{name} environment variable must be set")))
}

fn parsed_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        let defaults = Self::default();

        Ok(Self {
            jwt_secret: required("JWT_SECRET")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            access_token_expiration: parsed_or(
                "JWT_ACCESS_EXPIRATION",
                defaults.access_token_expiration,
            ),
            max_access_token_expiration: parsed_or(
                "JWT_MAX_ACCESS_EXPIRATION",
                defaults.max_access_token_expiration,
            ),
            refresh_token_expiration: parsed_or(
                "JWT_REFRESH_EXPIRATION",
                defaults.refresh_token_expiration,
            ),
            polka_key: required("POLKA_KEY")?,
            argon2_memory_cost: parsed_or("ARGON2_MEMORY_COST", defaults.argon2_memory_cost),
            argon2_time_cost: parsed_or("ARGON2_TIME_COST", defaults.argon2_time_cost),
            argon2_parallelism: parsed_or("ARGON2_PARALLELISM", defaults.argon2_parallelism),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.len() < 32 {
            return Err(AuthError::Config(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.access_token_expiration <= 0 {
            return Err(AuthError::Config(
                "JWT_ACCESS_EXPIRATION must be positive".to_string(),
            ));
        }

        if self.max_access_token_expiration < self.access_token_expiration {
            return Err(AuthError::Config(
                "JWT_MAX_ACCESS_EXPIRATION must not be less than JWT_ACCESS_EXPIRATION"
                    .to_string(),
            ));
        }

        if self.refresh_token_expiration <= self.max_access_token_expiration {
            return Err(AuthError::Config(
                "JWT_REFRESH_EXPIRATION must be greater than JWT_MAX_ACCESS_EXPIRATION"
                    .to_string(),
            ));
        }

        if self.polka_key.is_empty() {
            return Err(AuthError::Config("POLKA_KEY must not be empty".to_string()));
        }

        Ok(())
    }

    /// Clamp a caller-requested session lifetime to `(0, max]`, falling back
    /// to the default when none (or a non-positive value) is given.
    pub fn session_ttl_secs(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(secs) if secs > 0 => secs.min(self.max_access_token_expiration),
            _ => self.access_token_expiration,
        }
    }
}
