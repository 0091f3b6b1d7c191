//! Administrative HTTP handlers for the file registry.
//!
//! The registry maps resource names to retrieval locators; Authorize
//! resolves requested resources against it. These handlers are thin CRUD
//! over the store, gated by the admin middleware.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    app::AppState,
    error::AppError,
    models::file_entry::{FileEntry, RegisterFileRequest},
};

/// Register or replace a file registry entry.
///
/// # Endpoint
///
/// `POST /api/admin/files`
///
/// # Responses
///
/// - **201 Created**: the stored entry
/// - **400**: empty name or invalid locator
/// - **401**: invalid admin token
pub async fn register_file(
    State(state): State<AppState>,
    Json(request): Json<RegisterFileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.name.is_empty() {
        return Err(AppError::InvalidRequest("name is required".to_string()));
    }

    validate_locator(&request.locator)?;

    let entry = state
        .store
        .upsert_file_entry(&request.name, &request.locator)
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// List all file registry entries.
///
/// # Endpoint
///
/// `GET /api/admin/files`
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileEntry>>, AppError> {
    let entries = state.store.list_file_entries().await?;

    Ok(Json(entries))
}

/// Delete a file registry entry.
///
/// # Endpoint
///
/// `DELETE /api/admin/files/{name}`
///
/// # Responses
///
/// - **204 No Content**: entry deleted
/// - **404**: no entry under that name
/// - **401**: invalid admin token
pub async fn delete_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_file_entry(&name).await? {
        return Err(AppError::ResourceNotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Validate a retrieval locator.
///
/// # Rules
///
/// - Must be a valid URL
/// - Must be HTTPS (HTTP localhost allowed for development)
/// - Maximum 2048 characters
fn validate_locator(locator: &str) -> Result<(), AppError> {
    if locator.len() > 2048 {
        return Err(AppError::InvalidRequest(
            "Locator exceeds 2048 characters".to_string(),
        ));
    }

    let parsed = url::Url::parse(locator)
        .map_err(|_| AppError::InvalidRequest("Invalid locator URL".to_string()))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            // Allow HTTP for localhost/127.0.0.1 (testing)
            if parsed.host_str() == Some("localhost")
                || parsed.host_str() == Some("127.0.0.1")
                || parsed.host_str() == Some("0.0.0.0")
            {
                Ok(())
            } else {
                Err(AppError::InvalidRequest(
                    "HTTP is only allowed for localhost. Use HTTPS for production.".to_string(),
                ))
            }
        }
        _ => Err(AppError::InvalidRequest(
            "Locator must use HTTP or HTTPS".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_locators_are_accepted() {
        assert!(validate_locator("https://downloads.example.com/module.so").is_ok());
    }

    #[test]
    fn http_is_only_allowed_for_localhost() {
        assert!(validate_locator("http://localhost:9000/module.so").is_ok());
        assert!(validate_locator("http://downloads.example.com/module.so").is_err());
    }

    #[test]
    fn garbage_and_oversized_locators_are_rejected() {
        assert!(validate_locator("not a url").is_err());
        assert!(validate_locator("ftp://example.com/module.so").is_err());

        let oversized = format!("https://example.com/{}", "a".repeat(2048));
        assert!(validate_locator(&oversized).is_err());
    }
}
