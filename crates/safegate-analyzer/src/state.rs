//! Shared application state

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use safegate_classifiers::{
    BatchOrchestrator, ClassificationRouter, InferenceBackend, ModelPullTracker, OllamaBackend,
};
use safegate_core::BackendMode;
use std::sync::Arc;
use tracing::info;

use crate::config::AnalyzerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<AnalyzerConfig>,

    /// Single-payload classification entry point
    pub router: Arc<ClassificationRouter>,

    /// Batch driver over the same router
    pub batch: Arc<BatchOrchestrator>,

    /// Registry of model pulls
    pub tracker: ModelPullTracker,

    /// Backend used for model listing
    pub backend: Arc<dyn InferenceBackend>,

    /// Prometheus handle for rendering; absent when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state talking to the configured Ollama host
    pub fn new(config: AnalyzerConfig, metrics_handle: Option<PrometheusHandle>) -> Result<Self> {
        let backend = OllamaBackend::new(config.ollama_host.clone(), config.request_timeout())?;
        info!("Ollama backend at {}", backend.base_url());
        Self::with_backend(config, Arc::new(backend), metrics_handle)
    }

    /// Build state around an arbitrary inference backend
    pub fn with_backend(
        config: AnalyzerConfig,
        backend: Arc<dyn InferenceBackend>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let router = Arc::new(ClassificationRouter::new(
            config.backend,
            config.model.clone(),
            backend.clone(),
        )?);
        let batch = BatchOrchestrator::new(router.clone(), config.batch_size)
            .with_concurrency(config.batch_concurrency);

        info!(
            "Analyzer state ready: backend={}, model={}, batch_size={}, concurrency={}",
            config.backend,
            config.model,
            batch.chunk_size(),
            config.batch_concurrency.max(1)
        );

        Ok(Self {
            config: Arc::new(config),
            router,
            batch: Arc::new(batch),
            tracker: ModelPullTracker::new(backend.clone()),
            backend,
            metrics_handle,
        })
    }

    pub fn mode(&self) -> BackendMode {
        self.router.mode()
    }
}
