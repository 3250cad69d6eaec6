//! In-document `$ref` resolution and schema flattening.
//!
//! Only local references (`#/...`) are followed. Anything that cannot be resolved
//! (missing pointer targets, external references, cycles, runaway nesting) degrades to an
//! empty [`SchemaNode`] so a single bad fragment never aborts a catalog build.

use crate::error::{OpenApiToolsError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default nesting limit applied while flattening schemas.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Coarse shape of a [`SchemaNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Primitive,
    Array,
    Object,
}

/// Validation keywords copied through verbatim from the source schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Value>,
}

impl Constraints {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A fully dereferenced schema fragment.
///
/// Fields absent from the source stay absent; serialization never invents `null`s, so the
/// serialized form is directly usable as a JSON Schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    #[serde(flatten)]
    pub constraints: Constraints,
}

impl SchemaNode {
    #[must_use]
    pub fn kind(&self) -> SchemaKind {
        match self.type_name() {
            Some("array") => SchemaKind::Array,
            Some("object") => SchemaKind::Object,
            _ if self.properties.is_some() => SchemaKind::Object,
            _ => SchemaKind::Primitive,
        }
    }

    /// The `type` keyword when it is a single string.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(Value::as_str)
    }

    /// True when nothing at all was resolved (the fallback for unresolved references).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolves references against one document.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a> {
    doc: &'a Value,
    max_depth: usize,
}

impl<'a> SchemaResolver<'a> {
    #[must_use]
    pub fn new(doc: &'a Value) -> Self {
        Self {
            doc,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn document(&self) -> &'a Value {
        self.doc
    }

    /// Look up a local reference (`#/components/schemas/Widget`).
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::UnresolvedReference`] if the reference is not local or any
    /// pointer segment is missing.
    pub fn lookup(&self, reference: &str) -> Result<&'a Value> {
        let pointer = reference
            .strip_prefix('#')
            .filter(|p| p.starts_with('/'))
            .ok_or_else(|| {
                OpenApiToolsError::UnresolvedReference(format!(
                    "'{reference}' is not a local reference"
                ))
            })?;
        self.doc.pointer(pointer).ok_or_else(|| {
            OpenApiToolsError::UnresolvedReference(format!(
                "'{reference}' does not exist in the document"
            ))
        })
    }

    /// Follow a chain of `$ref`s until a non-reference node is reached.
    ///
    /// Nodes without `$ref` are returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::UnresolvedReference`] for missing targets, non-string refs,
    /// cycles, or chains longer than the depth limit.
    pub fn deref<'b>(&self, node: &'b Value) -> Result<&'b Value>
    where
        'a: 'b,
    {
        let mut seen: Vec<&str> = Vec::new();
        let mut current = node;
        while let Some(reference) = current.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| {
                OpenApiToolsError::UnresolvedReference("'$ref' is not a string".to_string())
            })?;
            if seen.contains(&reference) {
                return Err(OpenApiToolsError::UnresolvedReference(format!(
                    "cyclic reference '{reference}'"
                )));
            }
            if seen.len() >= self.max_depth {
                return Err(OpenApiToolsError::UnresolvedReference(format!(
                    "reference chain exceeds depth {}",
                    self.max_depth
                )));
            }
            seen.push(reference);
            current = self.lookup(reference)?;
        }
        Ok(current)
    }

    /// Flatten `node` into a [`SchemaNode`], never failing.
    ///
    /// Unresolvable fragments (at any nesting level) become empty schemas and are logged at
    /// debug level.
    #[must_use]
    pub fn resolve(&self, node: &Value) -> SchemaNode {
        let mut active = Vec::new();
        self.resolve_or_empty(node, 0, &mut active)
    }

    /// Strict variant of [`Self::resolve`] for the top-level node.
    ///
    /// Nested fragments still degrade to empty schemas.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::UnresolvedReference`] if `node` itself cannot be
    /// dereferenced.
    pub fn try_resolve(&self, node: &Value) -> Result<SchemaNode> {
        let mut active = Vec::new();
        self.resolve_at(node, 0, &mut active)
    }

    fn resolve_or_empty(&self, node: &Value, depth: usize, active: &mut Vec<String>) -> SchemaNode {
        self.resolve_at(node, depth, active).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Schema fragment left empty");
            SchemaNode::default()
        })
    }

    fn resolve_at(
        &self,
        node: &Value,
        depth: usize,
        active: &mut Vec<String>,
    ) -> Result<SchemaNode> {
        let mark = active.len();
        let result = self.resolve_inner(node, depth, active);
        active.truncate(mark);
        result
    }

    fn resolve_inner(
        &self,
        node: &Value,
        depth: usize,
        active: &mut Vec<String>,
    ) -> Result<SchemaNode> {
        if depth > self.max_depth {
            return Err(OpenApiToolsError::UnresolvedReference(format!(
                "schema nesting exceeds depth {}",
                self.max_depth
            )));
        }

        // References on the active path are tracked so self-referential schemas stop at the
        // first repetition instead of expanding up to the depth limit.
        let mut schema = node;
        while let Some(reference) = schema.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| {
                OpenApiToolsError::UnresolvedReference("'$ref' is not a string".to_string())
            })?;
            if active.iter().any(|r| r == reference) {
                return Err(OpenApiToolsError::UnresolvedReference(format!(
                    "cyclic reference '{reference}'"
                )));
            }
            if active.len() >= self.max_depth {
                return Err(OpenApiToolsError::UnresolvedReference(format!(
                    "reference chain exceeds depth {}",
                    self.max_depth
                )));
            }
            active.push(reference.to_string());
            schema = self.lookup(reference)?;
        }

        let Some(obj) = schema.as_object() else {
            return Ok(SchemaNode::default());
        };

        let type_name = obj.get("type").and_then(Value::as_str);
        let mut out = SchemaNode {
            schema_type: obj.get("type").cloned(),
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            format: obj.get("format").cloned(),
            enum_values: obj.get("enum").cloned(),
            items: None,
            properties: None,
            constraints: Constraints {
                minimum: obj.get("minimum").cloned(),
                maximum: obj.get("maximum").cloned(),
                min_length: obj.get("minLength").cloned(),
                max_length: obj.get("maxLength").cloned(),
                pattern: obj.get("pattern").cloned(),
            },
        };

        if type_name == Some("array")
            && let Some(items) = obj.get("items")
        {
            out.items = Some(Box::new(self.resolve_or_empty(items, depth + 1, active)));
        }

        if type_name == Some("object")
            && let Some(props) = obj.get("properties").and_then(Value::as_object)
        {
            let mut properties = IndexMap::with_capacity(props.len());
            for (name, prop) in props {
                properties.insert(
                    name.clone(),
                    self.resolve_or_empty(prop, depth + 1, active),
                );
            }
            out.properties = Some(properties);
        }

        Ok(out)
    }
}
