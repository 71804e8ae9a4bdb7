//! Memoized catalog and similarity matrix loading.

use std::sync::Arc;

use cinematch_core::{codec, Dataset};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::provider::{ArtifactProvider, ArtifactSpec};

/// Resolves, decodes and validates the two artifacts, once per process.
///
/// The first successful [`load`] is cached until [`invalidate`] is called.
/// Callers that arrive while a load is in flight wait for it and share its
/// result. A failed load caches nothing.
///
/// [`load`]: DatasetLoader::load
/// [`invalidate`]: DatasetLoader::invalidate
#[derive(Debug)]
pub struct DatasetLoader {
    provider: ArtifactProvider,
    catalog: ArtifactSpec,
    similarity: ArtifactSpec,
    cached: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetLoader {
    pub fn new(provider: ArtifactProvider, catalog: ArtifactSpec, similarity: ArtifactSpec) -> Self {
        Self {
            provider,
            catalog,
            similarity,
            cached: Mutex::new(None),
        }
    }

    /// Build a loader with an HTTP-backed provider from the configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> std::result::Result<Self, reqwest::Error> {
        Ok(Self::new(
            ArtifactProvider::from_config(config)?,
            config.catalog_spec(),
            config.similarity_spec(),
        ))
    }

    #[must_use]
    pub const fn provider(&self) -> &ArtifactProvider {
        &self.provider
    }

    #[must_use]
    pub const fn catalog_spec(&self) -> &ArtifactSpec {
        &self.catalog
    }

    #[must_use]
    pub const fn similarity_spec(&self) -> &ArtifactSpec {
        &self.similarity
    }

    /// Return the dataset, loading it on first use.
    ///
    /// # Errors
    ///
    /// Any artifact resolution error, [`cinematch_core::Error::CorruptArtifact`]
    /// or [`cinematch_core::Error::SchemaMismatch`] (wrapped in
    /// [`Error::Dataset`]), or [`Error::LoadAborted`].
    pub async fn load(&self) -> Result<Arc<Dataset>> {
        let mut cached = self.cached.lock().await;
        if let Some(dataset) = cached.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        let (catalog_path, similarity_path) = tokio::try_join!(
            self.provider.resolve(&self.catalog),
            self.provider.resolve(&self.similarity),
        )?;

        let dataset = tokio::task::spawn_blocking(move || {
            codec::load_dataset(&catalog_path, &similarity_path)
        })
        .await
        .map_err(|e| Error::LoadAborted(e.to_string()))??;

        log::info!("Loaded dataset with {} items", dataset.catalog().len());
        let dataset = Arc::new(dataset);
        *cached = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Forget the cached dataset; the next [`load`] reads the artifacts again.
    ///
    /// [`load`]: DatasetLoader::load
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            log::info!("Dataset cache invalidated");
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}
