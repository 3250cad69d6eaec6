use crate::resolver::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// Default upper bound for a single upstream call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default upper bound for fetching the `OpenAPI` document.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Where the `OpenAPI` document comes from and how it is verified.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConfig {
    /// Document location (URL or file path). Also the identifier of the schema resource.
    pub location: String,

    /// Optional pinned hash (`sha256:<hex>`).
    #[serde(default)]
    pub sha256: Option<String>,

    /// Hash policy: warn, fail, or ignore.
    #[serde(default)]
    pub hash_policy: HashPolicy,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl DocumentConfig {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            sha256: None,
            hash_policy: HashPolicy::default(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

/// Hash verification policy.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Log warning if hash doesn't match.
    #[default]
    Warn,
    /// Fail the load if hash doesn't match.
    Fail,
    /// Ignore hash verification.
    Ignore,
}

/// How inbound caller credentials are re-emitted upstream.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialConfig {
    /// Outbound header carrying the caller's token.
    #[serde(default = "default_auth_header_name")]
    pub header_name: String,

    /// Outbound scheme/prefix (e.g. `Token`). When unset the inbound value is passed through.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            header_name: default_auth_header_name(),
            prefix: None,
        }
    }
}

/// Which HTTP methods the dispatcher will issue.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MethodSupport {
    /// `GET` and `POST` only.
    Minimal,
    /// `GET`, `POST`, `PUT`, `PATCH`, `DELETE`.
    #[default]
    Extended,
}

/// Treatment of `{placeholder}`s with no matching argument.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PathPlaceholderPolicy {
    /// Fail the call with `MissingPathParameter`.
    #[default]
    Strict,
    /// Leave the literal placeholder in the URL.
    Permissive,
}

/// Upstream dispatch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// Upstream API base URL; tool paths are appended to it.
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub methods: MethodSupport,

    #[serde(default)]
    pub path_placeholders: PathPlaceholderPolicy,

    #[serde(default)]
    pub credentials: CredentialConfig,
}

impl DispatchConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            methods: MethodSupport::default(),
            path_placeholders: PathPlaceholderPolicy::default(),
            credentials: CredentialConfig::default(),
        }
    }
}

/// Catalog build settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOptions {
    /// Nesting/reference limit for schema flattening.
    #[serde(default = "default_max_depth")]
    pub max_schema_depth: usize,

    /// Tools with more parameters than this get a parameter list appended to their
    /// description.
    #[serde(default = "default_describe_parameters_over")]
    pub describe_parameters_over: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            max_schema_depth: default_max_depth(),
            describe_parameters_over: default_describe_parameters_over(),
        }
    }
}

fn default_auth_header_name() -> String {
    "Authorization".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_describe_parameters_over() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_config_defaults() {
        let cfg: DispatchConfig =
            serde_yaml::from_str("baseUrl: http://localhost:8000\n").unwrap();
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.methods, MethodSupport::Extended);
        assert_eq!(cfg.path_placeholders, PathPlaceholderPolicy::Strict);
        assert_eq!(cfg.credentials.header_name, "Authorization");
        assert!(cfg.credentials.prefix.is_none());
    }

    #[test]
    fn test_document_config_parses_policy() {
        let cfg: DocumentConfig = serde_yaml::from_str(
            "location: ./openapi.json\nsha256: sha256:abc\nhashPolicy: fail\n",
        )
        .unwrap();
        assert_eq!(cfg.hash_policy, HashPolicy::Fail);
        assert_eq!(cfg.fetch_timeout_secs, 10);
    }
}
