//! OpenAPI -> tool catalog translation and upstream dispatch.
//!
//! - [`resolver`]: in-document `$ref` resolution and schema flattening
//! - [`catalog`]: one [`catalog::ToolDefinition`] per `(path, method)`
//! - [`credentials`]: caller credential forwarding
//! - [`dispatch`]: tool name + arguments -> upstream HTTP call -> normalized result
//! - [`handle`]: shared catalog with atomic swap on reload
//!
//! The crate has no knowledge of any transport protocol; adapters consume plain values.

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod loader;
pub mod manifest;
pub mod resolver;
pub mod safety;

pub use catalog::{CatalogBuilder, HttpMethod, ToolCatalog, ToolDefinition};
pub use credentials::{CallerCredentials, CredentialForwarder};
pub use dispatch::{Dispatcher, FailureKind, InvocationRequest, InvocationResult};
pub use error::{OpenApiToolsError, Result};
pub use handle::CatalogHandle;
pub use loader::{DocumentLoader, SourceDocument};
