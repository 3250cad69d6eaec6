//! rmcp server handler: the MCP face of [`OpenApiBackend`].

use crate::openapi::OpenApiBackend;
use axum::http::request::Parts;
use restmcp_openapi_tools::CallerCredentials;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData, Implementation, ListResourcesResult,
    ListToolsResult, PaginatedRequestParams, ProtocolVersion, ReadResourceRequestParams,
    ReadResourceResult, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiToolServer {
    backend: Arc<OpenApiBackend>,
}

impl ApiToolServer {
    #[must_use]
    pub fn new(backend: Arc<OpenApiBackend>) -> Self {
        Self { backend }
    }
}

/// Caller credentials from the HTTP request that carried this MCP message.
///
/// `None` when the transport has no HTTP request (stdio).
fn request_credentials(context: &RequestContext<RoleServer>) -> Option<CallerCredentials> {
    context
        .extensions
        .get::<Parts>()
        .map(|parts| CallerCredentials::from_headers(&parts.headers))
}

impl ServerHandler for ApiToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: self.backend.title().to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Tools of {} generated from its OpenAPI document. The document itself is \
                 available as the \"API Schema\" resource.",
                self.backend.title()
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(
            self.backend.list_tools().await,
        ))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let credentials = request_credentials(&context);
        let arguments = request.arguments.unwrap_or_default();
        Ok(self
            .backend
            .call_tool(&request.name, arguments, credentials)
            .await)
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult::with_all_items(
            self.backend.list_resources().await,
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        self.backend.read_resource(&request.uri).await
    }
}
