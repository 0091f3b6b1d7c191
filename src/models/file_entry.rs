//! File registry model and admin request types.
//!
//! The file registry maps resource names to retrieval locators. Authorize
//! resolves a requested resource against it so an authorized client learns
//! where to fetch the module it is entitled to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a file registry record from the store.
///
/// # Table
///
/// Maps to the `file_registry` table, keyed by resource name. Registering
/// the same name again replaces the locator.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FileEntry {
    /// Resource name clients select by
    pub name: String,

    /// Retrieval locator (validated URL) returned to authorized clients
    pub locator: String,

    /// Timestamp of the last registration for this name
    pub updated_at: DateTime<Utc>,
}

/// Request body for the admin file-registration endpoint.
///
/// ```json
/// {
///   "name": "analyzer-module",
///   "locator": "https://downloads.example.com/analyzer-v3.so"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegisterFileRequest {
    /// Resource name to register
    pub name: String,

    /// Retrieval locator; must be HTTPS (HTTP allowed for localhost)
    pub locator: String,
}
