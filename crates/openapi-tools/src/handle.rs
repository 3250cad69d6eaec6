//! Shared, atomically swapped catalog.
//!
//! Readers get an `Arc<ToolCatalog>` snapshot and never observe a half-built catalog. Builds
//! are serialized; a reload that queued behind another build reuses that build's result.

use crate::catalog::{CatalogBuilder, ToolCatalog};
use crate::error::Result;
use crate::loader::DocumentLoader;
use crate::safety::redact_location;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct CatalogHandle {
    loader: DocumentLoader,
    builder: CatalogBuilder,
    current: RwLock<Option<Arc<ToolCatalog>>>,
    generation: AtomicU64,
    build_lock: tokio::sync::Mutex<()>,
}

impl CatalogHandle {
    #[must_use]
    pub fn new(loader: DocumentLoader, builder: CatalogBuilder) -> Self {
        Self {
            loader,
            builder,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            build_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Document location; also the identifier of the schema resource.
    #[must_use]
    pub fn location(&self) -> &str {
        self.loader.location()
    }

    /// Number of catalogs published so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The published catalog, if any, without triggering a load.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<ToolCatalog>> {
        self.current.read().clone()
    }

    /// The published catalog, loading it first if nothing has been published yet.
    ///
    /// A failed load is logged and yields an empty catalog; the next call retries.
    pub async fn catalog(&self) -> Arc<ToolCatalog> {
        if let Some(catalog) = self.snapshot() {
            return catalog;
        }
        match self.load_if_absent().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(
                    location = %redact_location(self.location()),
                    "Failed to load OpenAPI document: {}",
                    e
                );
                Arc::new(ToolCatalog::empty())
            }
        }
    }

    /// Rebuild the catalog from the document and publish it.
    ///
    /// If another build finished while this call waited for the build lock, its result is
    /// returned instead of building again.
    ///
    /// # Errors
    ///
    /// Returns the load error; the previously published catalog stays in place.
    pub async fn reload(&self) -> Result<Arc<ToolCatalog>> {
        let observed = self.generation();
        let _guard = self.build_lock.lock().await;
        if self.generation() != observed
            && let Some(catalog) = self.snapshot()
        {
            tracing::debug!("Reload coalesced into a concurrent build");
            return Ok(catalog);
        }
        self.build_and_publish().await
    }

    async fn load_if_absent(&self) -> Result<Arc<ToolCatalog>> {
        let _guard = self.build_lock.lock().await;
        if let Some(catalog) = self.snapshot() {
            return Ok(catalog);
        }
        self.build_and_publish().await
    }

    async fn build_and_publish(&self) -> Result<Arc<ToolCatalog>> {
        let source = self.loader.load().await?;
        let catalog = Arc::new(self.builder.build(source));

        let previous = self.current.write().replace(catalog.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);

        let fingerprint = catalog.fingerprint();
        match previous {
            Some(prev) if prev.fingerprint() == fingerprint => {
                tracing::info!(tools = catalog.len(), %fingerprint, "Catalog reloaded (unchanged)");
            }
            _ => {
                tracing::info!(tools = catalog.len(), %fingerprint, "Catalog published");
            }
        }
        Ok(catalog)
    }
}
