//! Tool catalog construction.
//!
//! One [`ToolDefinition`] is produced per `(path, method)` pair of the document. Iteration
//! follows the document's own declaration order (`serde_json` is built with
//! `preserve_order`), and every map in the output is an [`IndexMap`], so two builds of the
//! same document serialize to identical bytes.

use crate::config::CatalogOptions;
use crate::loader::SourceDocument;
use crate::resolver::{SchemaNode, SchemaResolver};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// HTTP methods that produce tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Parse a path-item key (`get`, `POST`, ...). Other keys yield `None`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether remaining arguments travel as a JSON body (otherwise as query parameters).
    #[must_use]
    pub fn allows_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// One entry of a tool's input schema.
///
/// Declared operation parameters carry their location; properties merged in from a JSON
/// request body do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    #[serde(flatten)]
    pub schema: SchemaNode,
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ParameterLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
}

/// `{scheme name -> scopes}`, as in the document.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub method: HttpMethod,
    pub path_template: String,
    pub parameters: IndexMap<String, ToolParameter>,
    pub required: Vec<String>,
    pub responses: IndexMap<String, ResponseSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

impl ToolDefinition {
    /// JSON Schema of the tool's arguments: `{type: object, properties, required}`.
    #[must_use]
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert(
            "properties".to_string(),
            serde_json::to_value(&self.parameters).unwrap_or_else(|_| json!({})),
        );
        schema.insert("required".to_string(), json!(self.required));
        schema
    }
}

/// Immutable tool table derived from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    tools: IndexMap<String, ToolDefinition>,
    source: Option<Arc<SourceDocument>>,
}

impl ToolCatalog {
    /// A catalog with no tools and no source document.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_parts(tools: IndexMap<String, ToolDefinition>, source: SourceDocument) -> Self {
        Self {
            tools,
            source: Some(Arc::new(source)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn source(&self) -> Option<&SourceDocument> {
        self.source.as_deref()
    }

    /// Raw document text, served verbatim as the schema resource.
    #[must_use]
    pub fn source_text(&self) -> Option<&str> {
        self.source().map(|s| s.text.as_str())
    }

    #[must_use]
    pub fn source_location(&self) -> Option<&str> {
        self.source().map(|s| s.location.as_str())
    }

    #[must_use]
    pub fn document(&self) -> Option<&Value> {
        self.source().map(|s| &s.document)
    }

    /// `sha256:<hex>` over the serialized tool table.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.tools).unwrap_or_default();
        format!("sha256:{}", hex::encode(Sha256::digest(&bytes)))
    }
}

/// Walks a document's path table and produces a [`ToolCatalog`].
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    options: CatalogOptions,
}

impl CatalogBuilder {
    #[must_use]
    pub fn new(options: CatalogOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn build(&self, source: SourceDocument) -> ToolCatalog {
        let tools = self.build_tools(&source.document);
        ToolCatalog::from_parts(tools, source)
    }

    /// Build the tool table for a parsed document.
    ///
    /// Never fails: problems with individual operations are logged and the operation is
    /// included with whatever resolved.
    #[must_use]
    pub fn build_tools(&self, doc: &Value) -> IndexMap<String, ToolDefinition> {
        let resolver = SchemaResolver::new(doc).with_max_depth(self.options.max_schema_depth);
        let mut tools: IndexMap<String, ToolDefinition> = IndexMap::new();

        let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
            tracing::warn!("OpenAPI document has no 'paths' object; catalog is empty");
            return tools;
        };

        for (path, item) in paths {
            let item = match resolver.deref(item) {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!("Skipping path '{}': {}", path, e);
                    continue;
                }
            };
            let Some(methods) = item.as_object() else {
                continue;
            };
            let shared_params = item.get("parameters");

            for (key, operation) in methods {
                let Some(method) = HttpMethod::from_key(key) else {
                    continue;
                };
                let tool = self.build_tool(&resolver, path, method, operation, shared_params);
                if let Some(previous) = tools.insert(tool.name.clone(), tool) {
                    tracing::warn!(
                        tool = %previous.name,
                        "Duplicate tool name; {} {} replaces {} {}",
                        method,
                        path,
                        previous.method,
                        previous.path_template
                    );
                }
            }
        }

        tools
    }

    fn build_tool(
        &self,
        resolver: &SchemaResolver<'_>,
        path: &str,
        method: HttpMethod,
        operation: &Value,
        shared_params: Option<&Value>,
    ) -> ToolDefinition {
        let name = operation
            .get("operationId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map_or_else(|| generated_tool_name(method, path), str::to_string)
            .replace(' ', "_");

        let mut parameters: IndexMap<String, ToolParameter> = IndexMap::new();
        let mut required: Vec<String> = Vec::new();

        for param in declared_parameters(resolver, shared_params, operation.get("parameters")) {
            let Some(param_name) = param.get("name").and_then(Value::as_str) else {
                tracing::debug!(tool = %name, "Ignoring parameter without a name");
                continue;
            };
            let mut schema = param
                .get("schema")
                .map(|s| resolver.resolve(s))
                .unwrap_or_default();
            if let Some(description) = param.get("description").and_then(Value::as_str) {
                schema.description = Some(description.to_string());
            }
            let location = param
                .get("in")
                .and_then(|v| serde_json::from_value(v.clone()).ok());

            parameters.insert(param_name.to_string(), ToolParameter { schema, location });
            if param.get("required").and_then(Value::as_bool) == Some(true) {
                push_unique(&mut required, param_name);
            }
        }

        if method.allows_body()
            && let Some(body) = operation.get("requestBody")
        {
            merge_body_properties(resolver, &name, body, &mut parameters, &mut required);
        }

        let responses = success_responses(resolver, operation);
        let description = describe(
            method,
            path,
            operation,
            &parameters,
            &required,
            self.options.describe_parameters_over,
        );

        let tags = operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let security = operation.get("security").and_then(|s| {
            serde_json::from_value::<Vec<SecurityRequirement>>(s.clone())
                .map_err(|e| tracing::debug!(tool = %name, "Ignoring malformed security: {}", e))
                .ok()
        });

        ToolDefinition {
            name,
            description,
            method,
            path_template: path.to_string(),
            parameters,
            required,
            responses,
            tags,
            security,
        }
    }
}

/// `{method}_{path}` with slashes turned into underscores and braces dropped.
///
/// `GET /items/{id}` becomes `get_items_id`.
#[must_use]
pub fn generated_tool_name(method: HttpMethod, path: &str) -> String {
    let path = path
        .trim_matches('/')
        .replace('/', "_")
        .replace(['{', '}'], "");
    format!("{}_{}", method.as_str().to_ascii_lowercase(), path)
}

/// Path-item parameters followed by operation parameters; an operation parameter with the
/// same `(name, in)` replaces the shared one in place.
fn declared_parameters<'d>(
    resolver: &SchemaResolver<'d>,
    shared: Option<&'d Value>,
    own: Option<&'d Value>,
) -> Vec<&'d Value> {
    let mut merged: Vec<&'d Value> = Vec::new();
    for list in [shared, own].into_iter().flatten() {
        let Some(items) = list.as_array() else {
            continue;
        };
        for raw in items {
            let param = match resolver.deref(raw) {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!("Ignoring unresolvable parameter: {}", e);
                    continue;
                }
            };
            let key = (param.get("name"), param.get("in"));
            match merged
                .iter_mut()
                .find(|p| (p.get("name"), p.get("in")) == key)
            {
                Some(slot) => *slot = param,
                None => merged.push(param),
            }
        }
    }
    merged
}

fn merge_body_properties(
    resolver: &SchemaResolver<'_>,
    tool: &str,
    body: &Value,
    parameters: &mut IndexMap<String, ToolParameter>,
    required: &mut Vec<String>,
) {
    let body = match resolver.deref(body) {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!(tool = %tool, "Ignoring request body: {}", e);
            return;
        }
    };
    let Some(schema) = body
        .get("content")
        .and_then(|c| c.get("application/json"))
        .and_then(|m| m.get("schema"))
    else {
        return;
    };
    let schema = match resolver.deref(schema) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(tool = %tool, "Ignoring request body schema: {}", e);
            return;
        }
    };
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return;
    }

    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (prop_name, prop) in props {
            // Declared parameters win over body properties with the same name.
            if !parameters.contains_key(prop_name) {
                parameters.insert(
                    prop_name.clone(),
                    ToolParameter {
                        schema: resolver.resolve(prop),
                        location: None,
                    },
                );
            }
        }
    }

    if let Some(names) = schema.get("required").and_then(Value::as_array) {
        for name in names.iter().filter_map(Value::as_str) {
            push_unique(required, name);
        }
    }
}

fn success_responses(
    resolver: &SchemaResolver<'_>,
    operation: &Value,
) -> IndexMap<String, ResponseSpec> {
    let mut out = IndexMap::new();
    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return out;
    };
    for (status, response) in responses {
        if !status.starts_with('2') {
            continue;
        }
        let response = resolver.deref(response).unwrap_or(response);
        let description = response
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let schema = response
            .get("content")
            .and_then(|c| c.get("application/json"))
            .and_then(|m| m.get("schema"))
            .map(|s| resolver.resolve(s));
        out.insert(status.clone(), ResponseSpec { description, schema });
    }
    out
}

fn describe(
    method: HttpMethod,
    path: &str,
    operation: &Value,
    parameters: &IndexMap<String, ToolParameter>,
    required: &[String],
    list_threshold: usize,
) -> String {
    let summary = operation
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let description = operation
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut parts: Vec<String> = Vec::new();
    if !summary.is_empty() && summary != description {
        parts.push(summary.to_string());
    }
    if !description.is_empty() {
        parts.push(description.to_string());
    }

    if parameters.len() > list_threshold {
        parts.push("\nParameters:".to_string());
        for (name, param) in parameters {
            let mut line = format!("- {name}");
            if let Some(d) = param.schema.description.as_deref().filter(|d| !d.is_empty()) {
                line.push_str(": ");
                line.push_str(d);
            }
            if required.iter().any(|r| r == name) {
                line.push_str(" (required)");
            }
            parts.push(line);
        }
    }

    if parts.is_empty() {
        format!("{method} {path}")
    } else {
        parts.join("\n")
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}
