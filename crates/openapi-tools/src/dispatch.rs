//! Tool invocation: one catalog lookup, one upstream HTTP call, one normalized result.
//!
//! A single generic [`Dispatcher`] serves every tool; the per-tool behavior comes entirely
//! from the [`ToolDefinition`] found in the catalog. Dispatch errors are values
//! ([`InvocationResult::Failure`]), never `Err`s.

use crate::catalog::{HttpMethod, ToolCatalog, ToolDefinition};
use crate::config::{DispatchConfig, MethodSupport, PathPlaceholderPolicy};
use crate::credentials::{CallerCredentials, CredentialForwarder};
use crate::error::{OpenApiToolsError, Result};
use crate::safety::{redact_url, sanitize_reqwest_error};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").expect("placeholder pattern is valid"));

/// A tool call as seen by the core: name, arguments, caller credentials.
#[derive(Debug, Clone, Default)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
    pub credentials: CallerCredentials,
}

impl InvocationRequest {
    #[must_use]
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            credentials: CallerCredentials::default(),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: CallerCredentials) -> Self {
        self.credentials = credentials;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// No tool with the requested name.
    NotFound,
    /// The tool's method is outside the configured method set.
    UnsupportedMethod,
    /// A `{placeholder}` in the path template had no matching argument.
    MissingPathParameter,
    /// The upstream did not answer within the timeout.
    Timeout,
    /// Transport failure or non-2xx status.
    UpstreamError,
    /// A 2xx body that is neither JSON nor UTF-8 text.
    DecodeError,
}

/// Transport-neutral outcome of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum InvocationResult {
    #[serde(rename_all = "camelCase")]
    Success {
        status_code: u16,
        body_is_json: bool,
        body: Value,
    },
    Failure { kind: FailureKind, message: String },
}

impl InvocationResult {
    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Issues upstream calls for catalog tools.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    base_url: String,
    forwarder: CredentialForwarder,
    timeout: Duration,
    methods: MethodSupport,
    placeholders: PathPlaceholderPolicy,
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid, the credential header name is invalid, or
    /// the HTTP client cannot be constructed.
    pub fn new(config: &DispatchConfig) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            OpenApiToolsError::Config(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;
        let client = Client::builder()
            .build()
            .map_err(|e| OpenApiToolsError::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            forwarder: CredentialForwarder::new(&config.credentials)?,
            timeout: Duration::from_secs(config.timeout_secs),
            methods: config.methods,
            placeholders: config.path_placeholders,
        })
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn forwarder(&self) -> &CredentialForwarder {
        &self.forwarder
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn supports(&self, method: HttpMethod) -> bool {
        match self.methods {
            MethodSupport::Minimal => matches!(method, HttpMethod::Get | HttpMethod::Post),
            MethodSupport::Extended => true,
        }
    }

    /// Look up the tool and invoke it.
    pub async fn invoke(&self, catalog: &ToolCatalog, request: InvocationRequest) -> InvocationResult {
        let Some(tool) = catalog.get(&request.tool_name) else {
            let available: Vec<&str> = catalog.names().collect();
            return InvocationResult::failure(
                FailureKind::NotFound,
                format!(
                    "Tool '{}' not found. Available tools: [{}]",
                    request.tool_name,
                    available.join(", ")
                ),
            );
        };
        self.invoke_tool(tool, request.arguments, &request.credentials)
            .await
    }

    /// Invoke an already resolved tool.
    pub async fn invoke_tool(
        &self,
        tool: &ToolDefinition,
        arguments: Map<String, Value>,
        credentials: &CallerCredentials,
    ) -> InvocationResult {
        if !self.supports(tool.method) {
            return InvocationResult::failure(
                FailureKind::UnsupportedMethod,
                format!("Unsupported HTTP method {} for tool '{}'", tool.method, tool.name),
            );
        }

        let mut remaining = arguments;
        let path = match substitute_path(&tool.path_template, &mut remaining) {
            Ok(path) => path,
            Err((path, missing)) => match self.placeholders {
                PathPlaceholderPolicy::Strict => {
                    return InvocationResult::failure(
                        FailureKind::MissingPathParameter,
                        format!(
                            "Missing path parameter(s) for tool '{}': {}",
                            tool.name,
                            missing.join(", ")
                        ),
                    );
                }
                PathPlaceholderPolicy::Permissive => path,
            },
        };

        let url = match self.build_url(&path, tool.method, &remaining) {
            Ok(url) => url,
            Err(message) => return InvocationResult::failure(FailureKind::UpstreamError, message),
        };

        tracing::debug!(
            tool = %tool.name,
            method = %tool.method,
            url = %redact_url(&url),
            "Dispatching tool call"
        );

        let mut request = self
            .client
            .request(to_reqwest_method(tool.method), url)
            .headers(self.forwarder.forward_credentials(credentials))
            .timeout(self.timeout);
        if tool.method.allows_body() {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(&Value::Object(remaining));
        }

        let result = self.execute(&tool.name, request).await;
        if let InvocationResult::Failure { kind, message } = &result {
            tracing::warn!(tool = %tool.name, kind = ?kind, "Tool call failed: {}", message);
        }
        result
    }

    async fn execute(&self, tool: &str, request: reqwest::RequestBuilder) -> InvocationResult {
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return self.transport_failure(tool, &e),
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return self.transport_failure(tool, &e),
        };

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return InvocationResult::failure(
                FailureKind::UpstreamError,
                format!(
                    "API returned {} {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown"),
                    body
                ),
            );
        }

        if let Ok(json) = serde_json::from_slice::<Value>(&bytes) {
            return InvocationResult::Success {
                status_code: status.as_u16(),
                body_is_json: true,
                body: json,
            };
        }

        InvocationResult::Success {
            status_code: status.as_u16(),
            body_is_json: false,
            body: Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    fn transport_failure(&self, tool: &str, e: &reqwest::Error) -> InvocationResult {
        if e.is_timeout() {
            InvocationResult::failure(
                FailureKind::Timeout,
                format!(
                    "Request to {tool} timed out after {} seconds",
                    self.timeout.as_secs_f64()
                ),
            )
        } else {
            InvocationResult::failure(
                FailureKind::UpstreamError,
                format!("API request failed: {}", sanitize_reqwest_error(e)),
            )
        }
    }

    fn build_url(
        &self,
        path: &str,
        method: HttpMethod,
        remaining: &Map<String, Value>,
    ) -> std::result::Result<Url, String> {
        // `.` and `..` survive encoding as `%2E` forms, which URL parsing still collapses.
        if path.split('/').any(is_dot_segment) {
            return Err(format!("Path '{path}' contains a dot segment"));
        }
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| format!("Invalid upstream URL for path '{path}': {e}"))?;

        if !method.allows_body() {
            let pairs = query_pairs(remaining);
            if !pairs.is_empty() {
                let mut query = url.query_pairs_mut();
                for (k, v) in &pairs {
                    query.append_pair(k, v);
                }
            }
        }
        Ok(url)
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Unreserved characters stay literal; everything else, including `/`, `?`, `#` and `.`,
/// is escaped so a value always lands inside exactly one path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

/// Substitute `{key}` placeholders from `args`, removing substituted keys.
///
/// Values are percent-encoded as single path segments. On missing keys returns the partially substituted path (placeholders left literal)
/// together with the missing names.
fn substitute_path(
    template: &str,
    args: &mut Map<String, Value>,
) -> std::result::Result<String, (String, Vec<String>)> {
    let mut used: Vec<String> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    let path = PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let key = &caps[1];
            match args.get(key) {
                Some(v) if !v.is_null() => {
                    used.push(key.to_string());
                    utf8_percent_encode(&value_to_string(v), PATH_SEGMENT).to_string()
                }
                _ => {
                    missing.push(key.to_string());
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    for key in &used {
        args.shift_remove(key);
    }

    if missing.is_empty() {
        Ok(path)
    } else {
        Err((path, missing))
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Arrays become repeated keys; `null`s are dropped.
fn query_pairs(args: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in args {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|i| !i.is_null()) {
                    pairs.push((key.clone(), value_to_string(item)));
                }
            }
            other => pairs.push((key.clone(), value_to_string(other))),
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::config::CredentialConfig;
    use crate::loader::SourceDocument;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use restmcp_test_support::{MockUpstream, pick_unused_port};
    use serde_json::json;

    fn catalog() -> ToolCatalog {
        let doc = json!({
            "openapi": "3.0.0",
            "paths": {
                "/items/{id}": {
                    "get": { "operationId": "getItem" },
                    "put": { "operationId": "putItem" },
                    "delete": { "operationId": "deleteItem" }
                },
                "/items": { "post": { "operationId": "createItem" } },
                "/orgs/{org}/repos/{repo}": { "get": { "operationId": "getRepo" } },
                "/json": { "get": { "operationId": "json" } },
                "/text": { "get": { "operationId": "text" } },
                "/binary": { "get": { "operationId": "binary" } },
                "/slow": { "get": { "operationId": "slow" } },
                "/fail": { "get": { "operationId": "fail" } }
            }
        });
        let source = SourceDocument::parse("mem", doc.to_string()).unwrap();
        CatalogBuilder::default().build(source)
    }

    fn dispatcher(base_url: &str) -> Dispatcher {
        Dispatcher::new(&DispatchConfig::new(base_url)).unwrap()
    }

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn success_body(result: InvocationResult) -> Value {
        match result {
            InvocationResult::Success { body, .. } => body,
            InvocationResult::Failure { kind, message } => panic!("{kind:?}: {message}"),
        }
    }

    #[tokio::test]
    async fn test_path_substitution_and_query() {
        let upstream = MockUpstream::echo().await.unwrap();
        let d = dispatcher(&upstream.base_url());

        let result = d
            .invoke(&catalog(), InvocationRequest::new("getItem", args(json!({"id": "123", "q": "x"}))))
            .await;
        let body = success_body(result);
        assert_eq!(body["method"], "GET");
        assert_eq!(body["path"], "/items/123");
        assert_eq!(body["query"], "q=x");
        assert_eq!(body["contentType"], Value::Null);
    }

    #[tokio::test]
    async fn test_multiple_placeholders_and_scalar_values() {
        let upstream = MockUpstream::echo().await.unwrap();
        let d = dispatcher(&upstream.base_url());

        let result = d
            .invoke(
                &catalog(),
                InvocationRequest::new(
                    "getRepo",
                    args(json!({"org": "acme", "repo": 7, "tags": ["a", "b"], "skip": null, "flag": true})),
                ),
            )
            .await;
        let body = success_body(result);
        assert_eq!(body["path"], "/orgs/acme/repos/7");
        assert_eq!(body["query"], "tags=a&tags=b&flag=true");
    }

    #[tokio::test]
    async fn test_path_values_stay_in_one_segment() {
        let upstream = MockUpstream::echo().await.unwrap();
        let d = dispatcher(&format!("{}/api", upstream.base_url()));

        let cases = [
            ("../admin", "/api/items/..%2Fadmin"),
            ("1?role=admin", "/api/items/1%3Frole%3Dadmin"),
            ("a/b", "/api/items/a%2Fb"),
            ("x#frag", "/api/items/x%23frag"),
            ("v1.2 beta", "/api/items/v1%2E2%20beta"),
        ];
        for (id, expected) in cases {
            let body = success_body(
                d.invoke(
                    &catalog(),
                    InvocationRequest::new("getItem", args(json!({"id": id, "q": "v"}))),
                )
                .await,
            );
            assert_eq!(body["path"], expected, "path for {id}");
            assert_eq!(body["query"], "q=v", "query for {id}");
        }
    }

    #[tokio::test]
    async fn test_dot_segment_path_values_are_rejected() {
        let upstream = MockUpstream::echo().await.unwrap();
        let d = dispatcher(&upstream.base_url());
        for id in [".", ".."] {
            let result = d
                .invoke(&catalog(), InvocationRequest::new("getItem", args(json!({"id": id}))))
                .await;
            assert_eq!(result.failure_kind(), Some(FailureKind::UpstreamError), "id {id}");
        }
    }

    #[tokio::test]
    async fn test_body_methods_send_json() {
        let upstream = MockUpstream::echo().await.unwrap();
        let d = dispatcher(&upstream.base_url());

        let body = success_body(
            d.invoke(
                &catalog(),
                InvocationRequest::new("putItem", args(json!({"id": "9", "name": "bolt", "qty": 3}))),
            )
            .await,
        );
        assert_eq!(body["method"], "PUT");
        assert_eq!(body["path"], "/items/9");
        assert_eq!(body["query"], "");
        assert_eq!(body["contentType"], "application/json");
        let sent: Value = serde_json::from_str(body["body"].as_str().unwrap()).unwrap();
        assert_eq!(sent, json!({"name": "bolt", "qty": 3}));

        let body = success_body(
            d.invoke(&catalog(), InvocationRequest::new("createItem", Map::new()))
                .await,
        );
        assert_eq!(body["method"], "POST");
        assert_eq!(body["body"], "{}");
    }

    #[tokio::test]
    async fn test_delete_uses_query() {
        let upstream = MockUpstream::echo().await.unwrap();
        let d = dispatcher(&upstream.base_url());
        let body = success_body(
            d.invoke(
                &catalog(),
                InvocationRequest::new("deleteItem", args(json!({"id": "1", "force": true}))),
            )
            .await,
        );
        assert_eq!(body["method"], "DELETE");
        assert_eq!(body["query"], "force=true");
        assert_eq!(body["body"], "");
    }

    #[tokio::test]
    async fn test_base_url_prefix_and_trailing_slash() {
        let upstream = MockUpstream::echo().await.unwrap();
        let d = dispatcher(&format!("{}/api/v1/", upstream.base_url()));
        let body = success_body(
            d.invoke(&catalog(), InvocationRequest::new("getItem", args(json!({"id": "5"}))))
                .await,
        );
        assert_eq!(body["path"], "/api/v1/items/5");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let d = dispatcher("http://127.0.0.1:9");
        let result = d
            .invoke(&catalog(), InvocationRequest::new("nope", Map::new()))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::NotFound));
        let InvocationResult::Failure { message, .. } = result else {
            unreachable!()
        };
        assert!(message.contains("getItem"));
    }

    #[tokio::test]
    async fn test_minimal_method_set_rejects_put() {
        let mut cfg = DispatchConfig::new("http://127.0.0.1:9");
        cfg.methods = MethodSupport::Minimal;
        let d = Dispatcher::new(&cfg).unwrap();

        let result = d
            .invoke(&catalog(), InvocationRequest::new("putItem", args(json!({"id": "1"}))))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::UnsupportedMethod));
        assert!(d.supports(HttpMethod::Post));
        assert!(!d.supports(HttpMethod::Delete));
    }

    #[tokio::test]
    async fn test_missing_path_parameter_strict_and_permissive() {
        let upstream = MockUpstream::echo().await.unwrap();

        let strict = dispatcher(&upstream.base_url());
        let result = strict
            .invoke(&catalog(), InvocationRequest::new("getItem", args(json!({"q": "x"}))))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::MissingPathParameter));

        let mut cfg = DispatchConfig::new(upstream.base_url());
        cfg.path_placeholders = PathPlaceholderPolicy::Permissive;
        let permissive = Dispatcher::new(&cfg).unwrap();
        let body = success_body(
            permissive
                .invoke(&catalog(), InvocationRequest::new("getItem", args(json!({"q": "x"}))))
                .await,
        );
        assert_eq!(body["path"], "/items/%7Bid%7D");
        assert_eq!(body["query"], "q=x");
    }

    async fn response_upstream() -> MockUpstream {
        let app = Router::new()
            .route("/json", get(|| async { axum::Json(json!({"a": 1})) }))
            .route("/text", get(|| async { "hello" }))
            .route("/binary", get(|| async { b"hi\xff".to_vec() }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route(
                "/fail",
                get(|| async { (StatusCode::NOT_FOUND, "no such thing") }),
            );
        MockUpstream::start(app).await.unwrap()
    }

    #[tokio::test]
    async fn test_json_and_text_success() {
        let upstream = response_upstream().await;
        let d = dispatcher(&upstream.base_url());

        let result = d
            .invoke(&catalog(), InvocationRequest::new("json", Map::new()))
            .await;
        assert_eq!(
            result,
            InvocationResult::Success {
                status_code: 200,
                body_is_json: true,
                body: json!({"a": 1}),
            }
        );

        let result = d
            .invoke(&catalog(), InvocationRequest::new("text", Map::new()))
            .await;
        assert_eq!(
            result,
            InvocationResult::Success {
                status_code: 200,
                body_is_json: false,
                body: json!("hello"),
            }
        );
    }

    #[tokio::test]
    async fn test_non_utf8_body_falls_back_to_lossy_text() {
        let upstream = response_upstream().await;
        let d = dispatcher(&upstream.base_url());
        let result = d
            .invoke(&catalog(), InvocationRequest::new("binary", Map::new()))
            .await;
        assert_eq!(
            result,
            InvocationResult::Success {
                status_code: 200,
                body_is_json: false,
                body: json!("hi\u{fffd}"),
            }
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let upstream = response_upstream().await;
        let d = dispatcher(&upstream.base_url()).with_timeout(Duration::from_millis(200));
        let result = d
            .invoke(&catalog(), InvocationRequest::new("slow", Map::new()))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Timeout));
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let upstream = response_upstream().await;
        let d = dispatcher(&upstream.base_url());
        let result = d
            .invoke(&catalog(), InvocationRequest::new("fail", Map::new()))
            .await;
        let InvocationResult::Failure { kind, message } = result else {
            panic!("expected failure");
        };
        assert_eq!(kind, FailureKind::UpstreamError);
        assert!(message.contains("404"));
        assert!(message.contains("no such thing"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_upstream_error() {
        let port = pick_unused_port().unwrap();
        let d = dispatcher(&format!("http://127.0.0.1:{port}"));
        let result = d
            .invoke(&catalog(), InvocationRequest::new("json", Map::new()))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::UpstreamError));
    }

    #[tokio::test]
    async fn test_credentials_are_forwarded() {
        let upstream = MockUpstream::echo().await.unwrap();
        let mut cfg = DispatchConfig::new(upstream.base_url());
        cfg.credentials = CredentialConfig {
            header_name: "Authorization".to_string(),
            prefix: Some("Token".to_string()),
        };
        let d = Dispatcher::new(&cfg).unwrap();

        let mut inbound = reqwest::header::HeaderMap::new();
        inbound.insert("authorization", "Bearer abc".parse().unwrap());
        inbound.insert("cookie", "session=s1".parse().unwrap());
        let request = InvocationRequest::new("getItem", args(json!({"id": "1"})))
            .with_credentials(CallerCredentials::from_headers(&inbound));

        let body = success_body(d.invoke(&catalog(), request).await);
        assert_eq!(body["authorization"], "Token abc");
        assert_eq!(body["cookie"], "session=s1");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = Dispatcher::new(&DispatchConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Config(_)));
    }

    #[test]
    fn test_result_serialization() {
        let ok = InvocationResult::Success {
            status_code: 200,
            body_is_json: true,
            body: json!({"a": 1}),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"outcome": "success", "statusCode": 200, "bodyIsJson": true, "body": {"a": 1}})
        );
        let err = InvocationResult::failure(FailureKind::Timeout, "late");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"outcome": "failure", "kind": "Timeout", "message": "late"})
        );
    }
}
