//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SESSION_SECRET` (required): shared secret for credential signing;
///   every offline verifier must hold the same value, and changing it
///   invalidates all outstanding credentials
/// - `ADMIN_TOKEN` (required): bearer token for the admin endpoints
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 8000
/// - `IDENTITY_PROVIDER_URL` (optional): token-introspection endpoint,
///   defaults to Google's tokeninfo endpoint
/// - `STORE_TIMEOUT_MS` (optional): per-operation store timeout, defaults
///   to 5000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    pub session_secret: String,

    pub admin_token: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_identity_provider_url")]
    pub identity_provider_url: String,

    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    8000
}

/// Default token-introspection endpoint.
fn default_identity_provider_url() -> String {
    "https://oauth2.googleapis.com/tokeninfo".to_string()
}

/// Default store timeout in milliseconds.
fn default_store_timeout_ms() -> u64 {
    5000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
