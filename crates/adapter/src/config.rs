//! Adapter configuration: CLI flags with env fallbacks, optionally layered over a YAML file.
//!
//! Precedence is flag/env > config file > built-in default.

use crate::error::{AdapterError, Result};
use clap::{Parser, ValueEnum};
use restmcp_openapi_tools::config::{
    CatalogOptions, CredentialConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
    DispatchConfig, DocumentConfig, HashPolicy, MethodSupport, PathPlaceholderPolicy,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_OPENAPI_PATH: &str = ".well-known/openapi.json";
pub const DEFAULT_SERVER_TITLE: &str = "My MCP Server";
pub const DEFAULT_BIND: &str = "127.0.0.1:9000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "restmcp-adapter",
    version,
    about = "Expose an OpenAPI-described REST API as MCP tools"
)]
pub struct Cli {
    /// YAML config file. Flags and env vars override its values.
    #[arg(long, env = "RESTMCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Upstream API base URL; tool paths are appended to it.
    #[arg(long, env = "API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Document path relative to the base URL.
    #[arg(long, env = "OPENAPI_JSON")]
    pub openapi_path: Option<String>,

    /// Explicit document URL or file path; overrides base URL + path.
    #[arg(long, env = "OPENAPI_SPEC_URL")]
    pub openapi_url: Option<String>,

    /// Pin the document to `sha256:<hex>`.
    #[arg(long, env = "OPENAPI_SHA256")]
    pub openapi_sha256: Option<String>,

    #[arg(long, env = "OPENAPI_HASH_POLICY", value_enum)]
    pub hash_policy: Option<HashPolicyArg>,

    /// Token used to fetch the document and, for stdio, to call the API.
    #[arg(long, env = "MCP_SERVER_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Outbound scheme put in front of forwarded tokens (e.g. `Token`).
    #[arg(long, env = "API_TOKEN_PREFIX")]
    pub token_prefix: Option<String>,

    #[arg(long, env = "AUTH_HEADER_NAME")]
    pub auth_header_name: Option<String>,

    #[arg(long, env = "SERVER_TITLE")]
    pub server_title: Option<String>,

    #[arg(long, env = "MCP_SERVER_BIND")]
    pub bind: Option<String>,

    #[arg(long, env = "MCP_TRANSPORT", value_enum)]
    pub transport: Option<Transport>,

    /// Per-call upstream timeout.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "MCP_METHODS", value_enum)]
    pub methods: Option<MethodsArg>,

    #[arg(long, env = "MCP_PATH_PLACEHOLDERS", value_enum)]
    pub path_placeholders: Option<PlaceholdersArg>,

    /// Bearer token required by `POST /admin/reload`. Unset leaves the route open.
    #[arg(long, env = "MCP_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Serve `/mcp` without sessions.
    #[arg(long, env = "MCP_STATELESS")]
    pub stateless: bool,

    /// Tracing filter directive (e.g. `info`, `restmcp_openapi_tools=debug`).
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Streamable HTTP at `/mcp` plus the REST/SSE surface.
    #[default]
    Http,
    /// MCP over stdin/stdout.
    Stdio,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HashPolicyArg {
    Warn,
    Fail,
    Ignore,
}

impl From<HashPolicyArg> for HashPolicy {
    fn from(v: HashPolicyArg) -> Self {
        match v {
            HashPolicyArg::Warn => Self::Warn,
            HashPolicyArg::Fail => Self::Fail,
            HashPolicyArg::Ignore => Self::Ignore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodsArg {
    Minimal,
    Extended,
}

impl From<MethodsArg> for MethodSupport {
    fn from(v: MethodsArg) -> Self {
        match v {
            MethodsArg::Minimal => Self::Minimal,
            MethodsArg::Extended => Self::Extended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlaceholdersArg {
    Strict,
    Permissive,
}

impl From<PlaceholdersArg> for PathPlaceholderPolicy {
    fn from(v: PlaceholdersArg) -> Self {
        match v {
            PlaceholdersArg::Strict => Self::Strict,
            PlaceholdersArg::Permissive => Self::Permissive,
        }
    }
}

/// On-disk configuration (`--config`). Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub openapi_path: Option<String>,
    #[serde(default)]
    pub openapi_url: Option<String>,
    #[serde(default)]
    pub openapi_sha256: Option<String>,
    #[serde(default)]
    pub hash_policy: Option<HashPolicy>,
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub token_prefix: Option<String>,
    #[serde(default)]
    pub auth_header_name: Option<String>,
    #[serde(default)]
    pub server_title: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub transport: Option<Transport>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub methods: Option<MethodSupport>,
    #[serde(default)]
    pub path_placeholders: Option<PathPlaceholderPolicy>,
    #[serde(default)]
    pub stateless: Option<bool>,
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default)]
    pub catalog: Option<CatalogOptions>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    /// Read and parse a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid config YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Config(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// # Errors
    ///
    /// Returns an error on invalid YAML or unknown fields.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Fully resolved adapter configuration.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub server_title: String,
    pub bind: SocketAddr,
    pub transport: Transport,
    pub stateless: bool,
    pub api_token: Option<String>,
    pub admin_token: Option<String>,
    pub document: DocumentConfig,
    pub dispatch: DispatchConfig,
    pub catalog: CatalogOptions,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AdapterConfig {
    /// Resolve CLI flags (and the config file they point at) into a final config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or a value is invalid.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge `cli` over `file`.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid bind address or an empty base URL.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self> {
        let base_url = cli
            .api_base_url
            .or(file.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(AdapterError::Config("apiBaseUrl must be non-empty".to_string()));
        }

        let location = match cli.openapi_url.or(file.openapi_url) {
            Some(url) => url,
            None => {
                let path = cli
                    .openapi_path
                    .or(file.openapi_path)
                    .unwrap_or_else(|| DEFAULT_OPENAPI_PATH.to_string());
                document_url(&base_url, &path)
            }
        };

        let bind_raw = cli
            .bind
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|e| AdapterError::Config(format!("invalid bind address '{bind_raw}': {e}")))?;

        let document = DocumentConfig {
            location,
            sha256: cli.openapi_sha256.or(file.openapi_sha256),
            hash_policy: cli
                .hash_policy
                .map(HashPolicy::from)
                .or(file.hash_policy)
                .unwrap_or_default(),
            fetch_timeout_secs: file.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        let dispatch = DispatchConfig {
            base_url,
            timeout_secs: cli
                .timeout_secs
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            methods: cli
                .methods
                .map(MethodSupport::from)
                .or(file.methods)
                .unwrap_or_default(),
            path_placeholders: cli
                .path_placeholders
                .map(PathPlaceholderPolicy::from)
                .or(file.path_placeholders)
                .unwrap_or_default(),
            credentials: CredentialConfig {
                header_name: cli
                    .auth_header_name
                    .or(file.auth_header_name)
                    .unwrap_or_else(|| CredentialConfig::default().header_name),
                prefix: cli
                    .token_prefix
                    .or(file.token_prefix)
                    .filter(|p| !p.trim().is_empty()),
            },
        };

        Ok(Self {
            server_title: cli
                .server_title
                .or(file.server_title)
                .unwrap_or_else(|| DEFAULT_SERVER_TITLE.to_string()),
            bind,
            transport: cli.transport.or(file.transport).unwrap_or_default(),
            stateless: cli.stateless || file.stateless.unwrap_or(false),
            api_token: cli
                .api_token
                .or(file.api_token)
                .filter(|t| !t.trim().is_empty()),
            admin_token: cli
                .admin_token
                .or(file.admin_token)
                .filter(|t| !t.trim().is_empty()),
            document,
            dispatch,
            catalog: file.catalog.unwrap_or_default(),
            log_level: cli
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
        })
    }
}

/// `{base}/{path}` with exactly one slash between the parts.
#[must_use]
pub fn document_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
