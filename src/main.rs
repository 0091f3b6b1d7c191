//! License Entitlement Server - Main Application Entry Point
//!
//! This is a REST API server that issues and validates time-limited access
//! grants for a distributable software module. Clients prove identity via a
//! third-party identity token, redeem single-use license keys to activate
//! time-bounded entitlements, and receive compact signed session
//! credentials that disconnected components can verify offline.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Identity**: external token-introspection provider
//! - **Credentials**: HMAC-SHA256 signed tokens under a shared secret
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Assemble application state (store, identity verifier, signer)
//! 5. Build HTTP router and start server on configured port

mod app;
mod config;
mod db;
mod error;
mod handlers;
mod identity;
mod middleware;
mod models;
mod services;
mod store;
mod token;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Assemble application state: explicit handles, no ambient globals
    let store = Arc::new(store::postgres::PgStore::new(
        pool,
        Duration::from_millis(config.store_timeout_ms),
    ));
    let identity = Arc::new(identity::HttpIdentityVerifier::new(
        config.identity_provider_url.clone(),
    )?);
    let signer = token::TokenSigner::new(config.session_secret.clone());
    let state = app::AppState::new(store, identity, signer, &config.admin_token);

    let app = app::router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
