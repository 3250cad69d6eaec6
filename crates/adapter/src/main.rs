//! restmcp adapter: serve an OpenAPI-described REST API as MCP tools.

mod config;
mod error;
mod http;
mod openapi;
mod semantics;
mod server;

use anyhow::Context as _;
use clap::Parser as _;
use config::{AdapterConfig, Cli, LogFormat, Transport};
use openapi::OpenApiBackend;
use restmcp_openapi_tools::safety::redact_location;
use rmcp::ServiceExt as _;
use server::ApiToolServer;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AdapterConfig::from_cli(cli).context("resolve configuration")?;
    init_tracing(&config);

    let backend =
        Arc::new(OpenApiBackend::from_config(&config).context("initialize OpenAPI backend")?);
    tracing::info!(
        document = %redact_location(&config.document.location),
        base_url = %config.dispatch.base_url,
        transport = ?config.transport,
        "Starting restmcp-adapter"
    );
    backend.start().await;

    match config.transport {
        Transport::Http => serve_http(backend, &config).await,
        Transport::Stdio => serve_stdio(backend).await,
    }
}

/// Logs always go to stderr so the stdio transport keeps stdout for protocol frames.
fn init_tracing(config: &AdapterConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A subscriber may already be installed.
    let _ = match config.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

async fn serve_http(backend: Arc<OpenApiBackend>, config: &AdapterConfig) -> anyhow::Result<()> {
    if config.admin_token.is_none() {
        tracing::warn!("POST /admin/reload is unauthenticated; set --admin-token to protect it");
    }
    let app = http::router(backend, config.stateless, config.admin_token.clone());
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        stateless = config.stateless,
        "Serving MCP at /mcp, manifest at /.well-known/mcp.json"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn serve_stdio(backend: Arc<OpenApiBackend>) -> anyhow::Result<()> {
    tracing::info!("Serving MCP over stdio");
    let service = ApiToolServer::new(backend)
        .serve(rmcp::transport::stdio())
        .await
        .context("start stdio transport")?;
    let reason = service.waiting().await.context("stdio transport failed")?;
    tracing::info!(?reason, "stdio transport closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
