//! Data models representing store entities.
//!
//! This module contains all data structures that map to store tables,
//! plus the admin request types that create or mutate them.

/// File registry entry model
pub mod file_entry;
/// License key model
pub mod license_key;
/// Session model
pub mod session;
