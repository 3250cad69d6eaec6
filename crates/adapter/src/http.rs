//! HTTP surface: health, discovery manifest, SSE keep-alive, REST tool invocation, admin
//! reload, and the streamable MCP endpoint at `/mcp`.

use crate::openapi::OpenApiBackend;
use crate::server::ApiToolServer;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use restmcp_openapi_tools::{CallerCredentials, FailureKind, InvocationResult};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub const SSE_PING_INTERVAL: Duration = Duration::from_secs(5);

/// Session header the streamable transport hands back; browsers only see it when exposed.
pub const MCP_SESSION_ID: HeaderName = HeaderName::from_static("mcp-session-id");

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<OpenApiBackend>,
    pub admin_token: Option<Arc<str>>,
}

/// Build the full HTTP router.
///
/// `admin_token` gates `POST /admin/reload`; with `None` the route is open to anyone who
/// can reach the listener.
pub fn router(
    backend: Arc<OpenApiBackend>,
    stateless: bool,
    admin_token: Option<String>,
) -> Router {
    let handler = ApiToolServer::new(backend.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: !stateless,
            ..Default::default()
        },
    );

    Router::new()
        .route("/health", get(health))
        .route("/.well-known/mcp.json", get(well_known_manifest))
        .route("/sse", get(sse_keep_alive))
        .route("/tools/{name}", post(invoke_tool))
        .route("/admin/reload", post(admin_reload))
        .nest_service("/mcp", mcp_service)
        .layer(cors_layer())
        .with_state(AppState {
            backend,
            admin_token: admin_token.map(Arc::from),
        })
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([MCP_SESSION_ID])
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn well_known_manifest(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut manifest = state.backend.manifest().await;
    if let Some(base) = public_base_url(&headers) {
        manifest = manifest
            .with_endpoint("mcp", format!("{base}/mcp"))
            .with_endpoint("sse", format!("{base}/sse"))
            .with_endpoint("tools", format!("{base}/tools"));
    }
    Json(manifest).into_response()
}

/// `http://{Host}` of the incoming request, if it has a usable `Host` header.
fn public_base_url(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("http://{host}"))
}

async fn sse_keep_alive() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let ticks = tokio::time::interval(SSE_PING_INTERVAL);
    let stream = futures::stream::unfold(ticks, |mut ticks| async move {
        ticks.tick().await;
        let event = Event::default().data(ping_payload().to_string());
        Some((Ok::<_, Infallible>(event), ticks))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn ping_payload() -> Value {
    json!({ "type": "ping", "payload": "keep-alive" })
}

#[derive(Debug, Default, Deserialize)]
struct ToolInvokeBody {
    #[serde(default)]
    params: Map<String, Value>,
}

async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<ToolInvokeBody>(&body) {
            Ok(b) => b.params,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "InvalidRequest",
                    &format!("Request body must be {{\"params\": {{...}}}}: {e}"),
                );
            }
        }
    };

    let credentials = CallerCredentials::from_headers(&headers);
    let result = state.backend.invoke(&name, params, Some(credentials)).await;
    invocation_response(result)
}

fn invocation_response(result: InvocationResult) -> Response {
    match result {
        InvocationResult::Success {
            body_is_json: true,
            body,
            ..
        } => (StatusCode::OK, Json(body)).into_response(),
        InvocationResult::Success { body, .. } => {
            let text = match body {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                text,
            )
                .into_response()
        }
        InvocationResult::Failure { kind, message } => {
            let kind_name = serde_json::to_value(kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            error_response(status_for_failure(kind), &kind_name, &message)
        }
    }
}

#[must_use]
pub fn status_for_failure(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::UnsupportedMethod => StatusCode::METHOD_NOT_ALLOWED,
        FailureKind::MissingPathParameter => StatusCode::BAD_REQUEST,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::UpstreamError | FailureKind::DecodeError => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "kind": kind, "message": message } })),
    )
        .into_response()
}

/// `Authorization: Bearer <token>` must match when a token is configured.
fn authorized(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    let got = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    got == format!("Bearer {expected}")
}

async fn admin_reload(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&headers, state.admin_token.as_deref()) {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized", "Unauthorized");
    }
    match state.backend.reload().await {
        Ok(catalog) => Json(json!({
            "tools": catalog.len(),
            "fingerprint": catalog.fingerprint(),
            "generation": state.backend.catalog_handle().generation(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Catalog reload failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "ReloadFailed", &e.to_string())
        }
    }
}
