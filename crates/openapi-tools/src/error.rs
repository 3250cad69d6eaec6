//! Error types for `restmcp-openapi-tools`.

use thiserror::Error;

/// Main error type for catalog loading and configuration.
///
/// Dispatch never produces this type: invocation problems are reported as
/// [`crate::dispatch::InvocationResult::Failure`] values.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// Configuration errors (invalid base URL, bad header name, conflicts).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A `$ref` could not be followed inside the document.
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("OpenAPI error: failed to fetch document from '{url}': {message}")]
    DocumentFetch { url: String, message: String },

    #[error("OpenAPI error: failed to read document file '{path}': {source}")]
    DocumentReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI error: failed to parse document from '{location}': {message}")]
    DocumentParse { location: String, message: String },

    #[error("OpenAPI error: document hash mismatch. Expected: {expected}, Got: {actual}")]
    HashMismatch { expected: String, actual: String },

    /// HTTP client construction errors.
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
