//! Classification routing
//!
//! Resolves the effective provider and model for a request and sends it to
//! either the backend dispatcher or the heuristic classifier. Both the single
//! and the batch flows enter the engine here.

use crate::backend::InferenceBackend;
use crate::classifier::{Classifier, ModelTarget};
use crate::dispatcher::BackendDispatcher;
use crate::heuristic::HeuristicClassifier;
use safegate_core::{BackendMode, ClassificationRequest, ClassificationResult, GpuHint, Result};
use std::sync::Arc;
use tracing::debug;

/// Models the analyzer accepts; anything else is remapped to the default
pub const SUPPORTED_MODELS: &[&str] = &[
    "tinyllama",
    "phi",
    "phi3:mini",
    "mistral",
    "llama2",
    "llama3.2:3b-instruct",
];

/// Provider identifier that selects the backend path
pub const OLLAMA_PROVIDER: &str = "ollama";

/// Provider identifier of the heuristic path
pub const MOCK_PROVIDER: &str = "mock";

/// Single entry point of the classification engine
pub struct ClassificationRouter {
    mode: BackendMode,
    default_model: String,
    heuristic: Arc<HeuristicClassifier>,
    backend: Option<Arc<dyn Classifier>>,
}

impl ClassificationRouter {
    /// Router that only ever uses the heuristic classifier
    pub fn heuristic_only(default_model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            mode: BackendMode::Mock,
            default_model: default_model.into(),
            heuristic: Arc::new(HeuristicClassifier::new()?),
            backend: None,
        })
    }

    /// Router for `mode`; Ollama mode dispatches to `backend`
    pub fn new(
        mode: BackendMode,
        default_model: impl Into<String>,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self> {
        let mut router = Self::heuristic_only(default_model)?;
        router.mode = mode;
        if mode == BackendMode::Ollama {
            let dispatcher = BackendDispatcher::new(backend, router.heuristic.clone());
            router.backend = Some(Arc::new(dispatcher));
        }
        Ok(router)
    }

    /// Router with a custom backend-path classifier
    pub fn with_classifier(
        default_model: impl Into<String>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self> {
        let mut router = Self::heuristic_only(default_model)?;
        router.mode = BackendMode::Ollama;
        router.backend = Some(classifier);
        Ok(router)
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Requested provider, lowercased, or the mode's default provider when
    /// none or a blank one is given
    pub fn resolve_provider(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim).filter(|p| !p.is_empty()) {
            Some(provider) => provider.to_ascii_lowercase(),
            None => match self.mode {
                BackendMode::Ollama => OLLAMA_PROVIDER.to_string(),
                BackendMode::Mock => MOCK_PROVIDER.to_string(),
            },
        }
    }

    /// Requested model if supported, otherwise the default model
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested {
            Some(model) if SUPPORTED_MODELS.contains(&model) => model.to_string(),
            _ => self.default_model.clone(),
        }
    }

    fn select(&self, provider: &str) -> Option<&Arc<dyn Classifier>> {
        if self.mode == BackendMode::Ollama && provider == OLLAMA_PROVIDER {
            self.backend.as_ref()
        } else {
            None
        }
    }

    /// Classify one request
    pub async fn classify(&self, request: &ClassificationRequest) -> ClassificationResult {
        self.classify_with(
            &request.payload,
            request.provider.as_deref(),
            request.model.as_deref(),
            request.gpu_hint(),
        )
        .await
    }

    /// Classify a payload with explicit routing parameters
    pub async fn classify_with(
        &self,
        payload: &str,
        provider: Option<&str>,
        model: Option<&str>,
        gpu: GpuHint,
    ) -> ClassificationResult {
        let provider = self.resolve_provider(provider);
        let target = ModelTarget::new(self.resolve_model(model), gpu);

        let (path, result) = match self.select(&provider) {
            Some(backend) => ("backend", backend.classify(payload, &target).await),
            None => ("heuristic", self.heuristic.classify(payload, &target).await),
        };

        debug!(
            "Classified via {} (provider={}, model={}): {} - {}",
            path,
            provider,
            target.model,
            result.category(),
            result.reason()
        );
        metrics::counter!(
            "safegate_classifications_total",
            "path" => path,
            "category" => result.category().as_str()
        )
        .increment(1);

        result
    }
}

impl std::fmt::Debug for ClassificationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRouter")
            .field("mode", &self.mode)
            .field("default_model", &self.default_model)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}
