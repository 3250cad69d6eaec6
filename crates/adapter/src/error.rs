//! Error types for the adapter.

use restmcp_openapi_tools::OpenApiToolsError;
use thiserror::Error;

/// Main error type for the adapter.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Configuration errors (invalid YAML, bad values, missing fields)
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OpenAPI` document errors (fetch, parse, hash pinning)
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<OpenApiToolsError> for AdapterError {
    fn from(e: OpenApiToolsError) -> Self {
        match e {
            OpenApiToolsError::Config(s) => Self::Config(s),
            OpenApiToolsError::Io(e) => Self::Io(e),
            OpenApiToolsError::Json(e) => Self::Json(e),
            other => Self::OpenApi(other.to_string()),
        }
    }
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
