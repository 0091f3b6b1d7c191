//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Performs business logic (engine calls, store queries, validation)
//! 3. Returns HTTP response (JSON, status code)

/// Admin key and session management endpoints
pub mod admin;
/// Authorization endpoint
pub mod authorize;
/// Admin file registry endpoints
pub mod files;
/// Health check endpoint
pub mod health;
/// Entitlement status endpoint
pub mod status;
/// Session credential verification endpoint
pub mod verify;
