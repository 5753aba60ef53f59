//! Package document loading from files, strings and HTTP URLs.

use std::path::Path;

use serde_json::Value;

use crate::error::AssembleError;
use crate::types::PackageSpec;
use crate::validator::validate_document_shape;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for fetching a provider document.
///
/// Provider schemas run to tens of megabytes, so this is well above a typical
/// API timeout; it exists so a stalled upstream cannot hang the run.
#[cfg(feature = "remote")]
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Parse and shape-check a raw document.
///
/// `origin` names the source (path or URL) in error messages.
pub fn parse_document(raw: Value, origin: &str) -> Result<PackageSpec, String> {
    validate_document_shape(&raw).map_err(|errors| {
        let first = errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_default();
        format!(
            "{} is not a package schema ({} problem(s), first: {})",
            origin,
            errors.len(),
            first
        )
    })?;
    serde_json::from_value(raw).map_err(|e| format!("{} is not a package schema: {}", origin, e))
}

/// Load a JSON value from a file path.
///
/// # Errors
///
/// Returns `AssembleError::Io` if the file can't be read, or
/// `AssembleError::InvalidJson` if it isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, AssembleError> {
    let content = std::fs::read_to_string(path).map_err(|source| AssembleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| AssembleError::InvalidJson {
        origin: path.display().to_string(),
        source,
    })
}

/// Load a package document from a file path.
pub fn load_document(path: &Path) -> Result<PackageSpec, AssembleError> {
    let raw = load_json(path)?;
    let origin = path.display().to_string();
    serde_json::from_value(raw).map_err(|source| AssembleError::InvalidJson { origin, source })
}

/// Load a package document from a JSON string.
pub fn load_document_str(content: &str) -> Result<PackageSpec, AssembleError> {
    serde_json::from_str(content).map_err(|source| AssembleError::InvalidJson {
        origin: "<string>".to_string(),
        source,
    })
}

/// Fetch a JSON document over HTTP/HTTPS.
///
/// Requires the `remote` feature (enabled by default). Non-2xx responses
/// are errors; the body is never parsed in that case.
#[cfg(feature = "remote")]
pub fn fetch_json(url: &str, timeout: Duration) -> Result<Value, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| e.to_string())?;

    let response = client.get(url).send().map_err(|e| e.to_string())?;

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(|e| e.to_string())?;

    response.json().map_err(|e| e.to_string())
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
