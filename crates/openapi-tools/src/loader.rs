//! `OpenAPI` document loading (URL or file), hash pinning, and parsing.

use crate::config::{DocumentConfig, HashPolicy};
use crate::error::{OpenApiToolsError, Result};
use crate::safety::{redact_location, sanitize_reqwest_error};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

/// A loaded document: raw text (served verbatim as a resource) plus its parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub location: String,
    pub text: String,
    pub document: Value,
}

impl SourceDocument {
    /// Parse document text. JSON is tried first; YAML is accepted as a fallback.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::DocumentParse`] if the text is neither JSON nor YAML, or
    /// does not describe a mapping at the top level.
    pub fn parse(location: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let location = location.into();
        let text = text.into();
        let document: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(json_err) => serde_yaml::from_str(&text).map_err(|yaml_err| {
                OpenApiToolsError::DocumentParse {
                    location: redact_location(&location),
                    message: format!("not JSON ({json_err}) and not YAML ({yaml_err})"),
                }
            })?,
        };
        if !document.is_object() {
            return Err(OpenApiToolsError::DocumentParse {
                location: redact_location(&location),
                message: "top-level value is not an object".to_string(),
            });
        }
        Ok(Self {
            location,
            text,
            document,
        })
    }
}

/// Compute `sha256:<hex>` for document text.
#[must_use]
pub fn document_hash(text: &str) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(text.as_bytes())))
}

enum Location {
    Remote(Url),
    File(std::path::PathBuf),
}

/// Fetches and parses the configured document.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    config: DocumentConfig,
    client: Client,
    headers: HeaderMap,
}

impl DocumentLoader {
    /// Create a loader. `headers` are sent when fetching over HTTP (e.g. a static API token).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: DocumentConfig, headers: HeaderMap) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| OpenApiToolsError::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            client,
            headers,
        })
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.config.location
    }

    /// Read, verify, and parse the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be fetched/read, fails hash verification under
    /// [`HashPolicy::Fail`], or cannot be parsed.
    pub async fn load(&self) -> Result<SourceDocument> {
        let text = match self.classify()? {
            Location::Remote(url) => self.fetch(url).await?,
            Location::File(path) => {
                tracing::info!("Loading OpenAPI document from {}", path.display());
                tokio::fs::read_to_string(&path).await.map_err(|e| {
                    OpenApiToolsError::DocumentReadFile {
                        path: path.display().to_string(),
                        source: e,
                    }
                })?
            }
        };

        self.verify_hash(&text)?;
        SourceDocument::parse(self.config.location.clone(), text)
    }

    fn classify(&self) -> Result<Location> {
        let location = self.config.location.as_str();
        if location.starts_with("http://") || location.starts_with("https://") {
            let url = Url::parse(location).map_err(|e| {
                OpenApiToolsError::Config(format!(
                    "Invalid OpenAPI document URL '{}': {e}",
                    redact_location(location)
                ))
            })?;
            Ok(Location::Remote(url))
        } else if location.starts_with("file://") {
            let path = Url::parse(location)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| {
                    OpenApiToolsError::Config(format!("Invalid file URL: {location}"))
                })?;
            Ok(Location::File(path))
        } else {
            Ok(Location::File(std::path::PathBuf::from(location)))
        }
    }

    async fn fetch(&self, url: Url) -> Result<String> {
        let shown = redact_location(url.as_str());
        tracing::info!(location = %shown, "Fetching OpenAPI document");

        let resp = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .timeout(Duration::from_secs(self.config.fetch_timeout_secs))
            .send()
            .await
            .map_err(|e| OpenApiToolsError::DocumentFetch {
                url: shown.clone(),
                message: sanitize_reqwest_error(&e),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OpenApiToolsError::DocumentFetch {
                url: shown,
                message: format!("upstream returned {status}"),
            });
        }

        resp.text()
            .await
            .map_err(|e| OpenApiToolsError::DocumentFetch {
                url: shown,
                message: sanitize_reqwest_error(&e),
            })
    }

    fn verify_hash(&self, text: &str) -> Result<()> {
        let Some(expected) = &self.config.sha256 else {
            return Ok(());
        };
        let actual = document_hash(text);
        if actual == *expected {
            return Ok(());
        }
        match self.config.hash_policy {
            HashPolicy::Fail => Err(OpenApiToolsError::HashMismatch {
                expected: expected.clone(),
                actual,
            }),
            HashPolicy::Warn => {
                tracing::warn!(
                    "OpenAPI document hash mismatch for '{}'. Expected: {}, Got: {}",
                    redact_location(&self.config.location),
                    expected,
                    actual
                );
                Ok(())
            }
            HashPolicy::Ignore => Ok(()),
        }
    }
}
