//! `OpenAPI` backend shared by every transport.
//!
//! Owns the catalog handle and the dispatcher. The MCP handler, the REST surface and the
//! manifest all go through this type, so every transport sees the same catalog.

use crate::config::AdapterConfig;
use crate::error::Result;
use crate::semantics::annotations_for_method;
use restmcp_openapi_tools::manifest::DiscoveryManifest;
use restmcp_openapi_tools::{
    CallerCredentials, CatalogBuilder, CatalogHandle, Dispatcher, DocumentLoader,
    InvocationRequest, InvocationResult, ToolCatalog, ToolDefinition,
};
use rmcp::model::{
    Annotated, CallToolResult, Content, ErrorData, JsonObject, RawResource, ReadResourceResult,
    Resource, ResourceContents, Tool,
};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const SCHEMA_RESOURCE_NAME: &str = "API Schema";
pub const SCHEMA_RESOURCE_MIME: &str = "application/json";

pub struct OpenApiBackend {
    title: String,
    catalog: Arc<CatalogHandle>,
    dispatcher: Dispatcher,
    static_credentials: CallerCredentials,
}

impl OpenApiBackend {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        catalog: Arc<CatalogHandle>,
        dispatcher: Dispatcher,
        static_credentials: CallerCredentials,
    ) -> Self {
        Self {
            title: title.into(),
            catalog,
            dispatcher,
            static_credentials,
        }
    }

    /// Wire the loader, builder and dispatcher from resolved configuration.
    ///
    /// The configured API token is used for the document fetch and as the credentials of
    /// calls that arrive without any (stdio).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, the credential header name or the HTTP clients are
    /// invalid.
    pub fn from_config(config: &AdapterConfig) -> Result<Self> {
        let dispatcher = Dispatcher::new(&config.dispatch)?;
        let static_credentials = config
            .api_token
            .as_deref()
            .map(|t| dispatcher.forwarder().static_credentials(t))
            .unwrap_or_default();
        let fetch_headers = dispatcher.forwarder().forward_credentials(&static_credentials);

        let loader = DocumentLoader::new(config.document.clone(), fetch_headers)?;
        let builder = CatalogBuilder::new(config.catalog.clone());
        let catalog = Arc::new(CatalogHandle::new(loader, builder));

        Ok(Self::new(
            config.server_title.clone(),
            catalog,
            dispatcher,
            static_credentials,
        ))
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn catalog_handle(&self) -> &Arc<CatalogHandle> {
        &self.catalog
    }

    /// Eager startup load. Failure is logged and leaves the catalog empty; the next access
    /// retries.
    pub async fn start(&self) -> usize {
        let catalog = self.catalog.catalog().await;
        if catalog.is_empty() {
            tracing::warn!("Starting with an empty tool catalog");
        } else {
            tracing::info!(tools = catalog.len(), "Tool catalog ready");
        }
        catalog.len()
    }

    /// Rebuild the catalog from the document.
    ///
    /// # Errors
    ///
    /// Returns the load error; the previous catalog stays published.
    pub async fn reload(&self) -> Result<Arc<ToolCatalog>> {
        Ok(self.catalog.reload().await?)
    }

    pub async fn catalog(&self) -> Arc<ToolCatalog> {
        self.catalog.catalog().await
    }

    pub async fn list_tools(&self) -> Vec<Tool> {
        self.catalog().await.tools().map(to_mcp_tool).collect()
    }

    /// Invoke a tool. `None` credentials means the transport has no caller identity, so the
    /// configured API token is used.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
        credentials: Option<CallerCredentials>,
    ) -> InvocationResult {
        let catalog = self.catalog().await;
        let credentials = credentials.unwrap_or_else(|| self.static_credentials.clone());
        let request = InvocationRequest::new(name, arguments).with_credentials(credentials);

        self.dispatcher.invoke(&catalog, request).await
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
        credentials: Option<CallerCredentials>,
    ) -> CallToolResult {
        to_call_tool_result(self.invoke(name, arguments, credentials).await)
    }

    /// The single schema resource; absent until a document has been loaded.
    pub async fn list_resources(&self) -> Vec<Resource> {
        let catalog = self.catalog().await;
        let Some(location) = catalog.source_location() else {
            return Vec::new();
        };
        let mut raw = RawResource::new(location, SCHEMA_RESOURCE_NAME);
        raw.description = Some("OpenAPI document the tools were generated from".to_string());
        raw.mime_type = Some(SCHEMA_RESOURCE_MIME.to_string());
        vec![Annotated::new(raw, None)]
    }

    /// Return the raw document text for the schema resource URI.
    ///
    /// # Errors
    ///
    /// `resource_not_found` for any other URI, or when no document is loaded.
    pub async fn read_resource(
        &self,
        uri: &str,
    ) -> std::result::Result<ReadResourceResult, ErrorData> {
        let catalog = self.catalog().await;
        match (catalog.source_location(), catalog.source_text()) {
            (Some(location), Some(text)) if location == uri => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, uri)],
            }),
            _ => Err(ErrorData::resource_not_found(
                format!("Resource not found: {uri}"),
                None,
            )),
        }
    }

    pub async fn manifest(&self) -> DiscoveryManifest {
        DiscoveryManifest::from_catalog(&*self.catalog().await, Some(self.title.as_str()))
    }
}

fn to_mcp_tool(tool: &ToolDefinition) -> Tool {
    let schema: JsonObject = tool.input_schema();
    let mut out = Tool::new(tool.name.clone(), tool.description.clone(), Arc::new(schema));
    out.annotations = Some(annotations_for_method(tool.method));
    out
}

/// Map a dispatch outcome onto an MCP tool result.
///
/// JSON bodies are rendered as pretty-printed text; failures become `isError: true` results
/// carrying the failure message.
#[must_use]
pub fn to_call_tool_result(result: InvocationResult) -> CallToolResult {
    match result {
        InvocationResult::Success {
            body_is_json: true,
            body,
            ..
        } => {
            let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
            CallToolResult::success(vec![Content::text(text)])
        }
        InvocationResult::Success { body, .. } => {
            let text = match body {
                Value::String(s) => s,
                other => other.to_string(),
            };
            CallToolResult::success(vec![Content::text(text)])
        }
        InvocationResult::Failure { message, .. } => {
            CallToolResult::error(vec![Content::text(message)])
        }
    }
}
