//! # Error Types
//!
//! Structured error types for takeoff_core. Only a handful of conditions are
//! fatal to an extraction call; everything else is reported through
//! [`crate::diagnostics`] and degrades to "field absent".
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::errors::{TakeoffError, TakeoffResult};
//!
//! fn require_area(area: Option<f64>) -> TakeoffResult<f64> {
//!     area.ok_or_else(|| TakeoffError::missing_field("total_area"))
//! }
//!
//! let err = require_area(None).unwrap_err();
//! assert_eq!(err.error_code(), "MISSING_REQUIRED_FIELD");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for takeoff_core operations
pub type TakeoffResult<T> = Result<T, TakeoffError>;

/// Structured error type for extraction, estimating, and rendering.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum TakeoffError {
    /// A required measurement could not be found in the document
    #[error("Could not find {field} in document")]
    MissingRequiredField { field: String },

    /// The document produced no text at all
    #[error("Unreadable document: {reason}")]
    UnreadableDocument { reason: String },

    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration file could not be parsed
    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigError { path: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Downloading a document failed
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// Report compilation or PDF rendering failed
    #[error("Report rendering failed: {reason}")]
    RenderFailed { reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl TakeoffError {
    /// Create a MissingRequiredField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        TakeoffError::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Create an UnreadableDocument error
    pub fn unreadable_document(reason: impl Into<String>) -> Self {
        TakeoffError::UnreadableDocument {
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        TakeoffError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConfigError
    pub fn config_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TakeoffError::ConfigError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        TakeoffError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FetchFailed error
    pub fn fetch_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        TakeoffError::FetchFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a RenderFailed error
    pub fn render_failed(reason: impl Into<String>) -> Self {
        TakeoffError::RenderFailed {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            TakeoffError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            TakeoffError::UnreadableDocument { .. } => "UNREADABLE_DOCUMENT",
            TakeoffError::InvalidInput { .. } => "INVALID_INPUT",
            TakeoffError::ConfigError { .. } => "CONFIG_ERROR",
            TakeoffError::FileError { .. } => "FILE_ERROR",
            TakeoffError::FetchFailed { .. } => "FETCH_FAILED",
            TakeoffError::RenderFailed { .. } => "RENDER_FAILED",
            TakeoffError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for TakeoffError {
    fn from(e: serde_json::Error) -> Self {
        TakeoffError::SerializationError {
            reason: e.to_string(),
        }
    }
}
