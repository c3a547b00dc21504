//! Chirpy Authentication
//!
//! Authentication subsystem for the Chirpy backend providing:
//! - User registration and login
//! - Argon2id password hashing
//! - HS256 session tokens (JWT)
//! - Opaque refresh tokens with expiry and revocation
//! - Bearer token and API key extraction
//! - The subscription upgrade webhook
//!
//! # Configuration
//!
//! All configuration is loaded from environment variables:
//! - `JWT_SECRET` - Secret key for signing session tokens (required, min 32 chars)
//! - `JWT_ISSUER` - Session token issuer claim (default: "chirpy")
//! - `JWT_ACCESS_EXPIRATION` - Session token lifetime in seconds (default: 3600)
//! - `JWT_MAX_ACCESS_EXPIRATION` - Cap for caller-requested lifetimes (default: 3600)
//! - `JWT_REFRESH_EXPIRATION` - Refresh token lifetime in seconds (default: 5184000)
//! - `POLKA_KEY` - API key of the payment provider webhook (required)
//! - `ARGON2_MEMORY_COST`, `ARGON2_TIME_COST`, `ARGON2_PARALLELISM` - hashing costs
//!
//! # Usage
//!
//! ```rust,ignore
//! use chirpy_auth::{AuthConfig, AuthService, PgStore};
//!
//! let store = Arc::new(PgStore::new(pool));
//! store.run_migrations().await?;
//!
//! let auth = Arc::new(AuthService::new(AuthConfig::from_env()?, store.clone(), store)?);
//! let app = chirpy_auth::create_routes(auth);
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod refresh;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use config::AuthConfig;
pub use error::{AuthError, ExtractError, LookupError, TokenError};
pub use extractors::AuthUser;
pub use handlers::{create_routes, AuthState};
pub use models::*;
pub use service::AuthService;
pub use store::{CredentialStore, MemoryStore, PgStore, RefreshTokenStore};
