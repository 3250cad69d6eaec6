//! Discovery manifest: a pass-through projection of the catalog and document metadata.

use crate::catalog::{HttpMethod, SecurityRequirement, ToolCatalog};
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTool {
    pub name: String,
    pub description: String,
    pub path: String,
    pub method: HttpMethod,
    pub parameters: Map<String, Value>,
    pub security: Vec<SecurityRequirement>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(rename = "type")]
    pub transport: String,
    pub servers: Value,
    pub tools: Vec<ManifestTool>,
    pub security: Value,
    pub security_schemes: Value,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub endpoints: Map<String, Value>,
}

impl DiscoveryManifest {
    /// Project `catalog` into a manifest.
    ///
    /// `name` overrides the document's `info.title` when given.
    #[must_use]
    pub fn from_catalog(catalog: &ToolCatalog, name: Option<&str>) -> Self {
        let empty = json!({});
        let doc = catalog.document().unwrap_or(&empty);
        let info = doc.get("info");
        let info_str = |key: &str| {
            info.and_then(|i| i.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let tools = catalog
            .tools()
            .map(|tool| ManifestTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                path: tool.path_template.clone(),
                method: tool.method,
                parameters: tool.input_schema(),
                security: tool.security.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            name: name
                .map(str::to_string)
                .or_else(|| info_str("title"))
                .unwrap_or_else(|| "OpenAPI tools".to_string()),
            version: info_str("version").unwrap_or_else(|| "1.0.0".to_string()),
            description: info_str("description").unwrap_or_default(),
            transport: "http".to_string(),
            servers: doc.get("servers").cloned().unwrap_or_else(|| json!([])),
            tools,
            security: doc.get("security").cloned().unwrap_or_else(|| json!([])),
            security_schemes: doc
                .pointer("/components/securitySchemes")
                .cloned()
                .unwrap_or_else(|| json!({})),
            endpoints: Map::new(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, name: &str, url: impl Into<String>) -> Self {
        self.endpoints.insert(name.to_string(), Value::String(url.into()));
        self
    }
}
