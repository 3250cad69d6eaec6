#![allow(dead_code)]

use anyhow::Context as _;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

pub use restmcp_test_support::{KillOnDrop, MockUpstream};

pub fn pick_unused_port() -> anyhow::Result<u16> {
    restmcp_test_support::pick_unused_port()
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    restmcp_test_support::wait_http_ok(url, timeout_dur).await
}

/// Spawn the adapter binary on `127.0.0.1:{port}` with `args` appended.
pub fn spawn_adapter(port: u16, args: &[&str]) -> anyhow::Result<Child> {
    let bin = env!("CARGO_BIN_EXE_restmcp-adapter");
    Command::new(bin)
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--log-level")
        .arg("warn")
        .args(args)
        .env_remove("RESTMCP_CONFIG")
        .env_remove("OPENAPI_SPEC_URL")
        .env_remove("MCP_SERVER_API_TOKEN")
        .env_remove("API_TOKEN_PREFIX")
        .env_remove("MCP_TRANSPORT")
        .env_remove("MCP_ADMIN_TOKEN")
        .stdin(Stdio::null())
        .spawn()
        .context("spawn adapter")
}

/// Spawn the adapter and wait until `/health` answers.
pub async fn start_adapter(args: &[&str]) -> anyhow::Result<(KillOnDrop, String)> {
    let port = pick_unused_port()?;
    let child = KillOnDrop(spawn_adapter(port, args)?);
    let base = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base}/health"), Duration::from_secs(30)).await?;
    Ok((child, base))
}
