//! Chirpy auth server
//!
//! Standalone binary serving the authentication routes.

use chirpy_auth::{create_routes, AuthConfig, AuthService, PgStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    let store = Arc::new(PgStore::new(pool));
    store.run_migrations().await?;

    let config = AuthConfig::from_env()?;
    let auth = Arc::new(AuthService::new(config, store.clone(), store)?);

    let app = create_routes(auth).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("Chirpy auth listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
