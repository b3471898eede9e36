//! Document download for `takeoff extract --url`.
//!
//! Only compiled for native targets (not WASM).

use std::time::Duration;

use crate::errors::{TakeoffError, TakeoffResult};

/// Current library version (from Cargo.toml)
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request timeout for document downloads
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Download a document's bytes.
///
/// # Errors
///
/// `FetchFailed` on a malformed URL, network error, timeout, non-success
/// status, or an empty body.
pub fn fetch_document(url: &str) -> TakeoffResult<Vec<u8>> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(TakeoffError::fetch_failed(url, "Only http and https URLs are supported"));
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("Takeoff/{}", CURRENT_VERSION))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| TakeoffError::fetch_failed(url, format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| TakeoffError::fetch_failed(url, format!("Network error: {}", e)))?;

    if !response.status().is_success() {
        return Err(TakeoffError::fetch_failed(url, format!("Server returned {}", response.status())));
    }

    let bytes = response
        .bytes()
        .map_err(|e| TakeoffError::fetch_failed(url, format!("Failed to read response: {}", e)))?;

    if bytes.is_empty() {
        return Err(TakeoffError::fetch_failed(url, "Response body was empty"));
    }

    log::info!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}
