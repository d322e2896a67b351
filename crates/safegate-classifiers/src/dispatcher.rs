//! Backend dispatch with pull-and-retry
//!
//! Flow for one payload:
//! 1. best-effort pull of the model (outcome only logged)
//! 2. generation with the caller's GPU directive
//! 3. on 400/404/5xx: pull again, retry once without the GPU directive
//! 4. interpret the text, or degrade to SAFE with the failure in `reason`

use crate::backend::{GenerateRequest, InferenceBackend};
use crate::classifier::{Classifier, ModelTarget};
use crate::heuristic::HeuristicClassifier;
use crate::parser;
use crate::prompt::build_prompt;
use async_trait::async_trait;
use safegate_core::{ClassificationResult, Error};
use std::sync::Arc;
use tracing::{debug, warn};

/// Classifier backed by an external generation service
pub struct BackendDispatcher {
    backend: Arc<dyn InferenceBackend>,
    heuristic: Arc<HeuristicClassifier>,
}

impl BackendDispatcher {
    pub fn new(backend: Arc<dyn InferenceBackend>, heuristic: Arc<HeuristicClassifier>) -> Self {
        Self { backend, heuristic }
    }

    /// Attempt a pull and discard the outcome; returns a diagnostic on failure
    async fn try_pull(&self, model: &str) -> Option<String> {
        match self.backend.pull(model).await {
            Ok(()) => None,
            Err(e) => {
                debug!("Best-effort pull of {} via {} failed: {}", model, self.backend.name(), e);
                Some(e.to_string())
            }
        }
    }

    /// Generate, retrying once after a fresh pull when the backend reports
    /// a missing model or a server-side failure
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ClassificationResult> {
        let first = match self.backend.generate(request).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        if !first.is_model_or_server_failure() {
            return Err(degraded(&first));
        }

        warn!(
            "Generation with {} failed ({}), pulling and retrying once",
            request.model, first
        );
        if let Some(diagnostic) = self.try_pull(&request.model).await {
            debug!("Retry pull diagnostic: {}", diagnostic);
        }

        match self.backend.generate(&request.without_gpu_directive()).await {
            Ok(text) => Ok(text),
            Err(second) => {
                metrics::counter!("safegate_backend_failures_total", "kind" => "retry")
                    .increment(1);
                warn!("Retry for {} failed: {}", request.model, second);
                Err(ClassificationResult::safe(format!(
                    "Ollama error after pull attempt: {} (first attempt: {})",
                    second, first
                )))
            }
        }
    }
}

/// SAFE result for a failure that is not worth a retry
fn degraded(err: &Error) -> ClassificationResult {
    match err {
        Error::BackendStatus { .. } => {
            metrics::counter!("safegate_backend_failures_total", "kind" => "status").increment(1);
            warn!("Backend HTTP error: {}", err);
            ClassificationResult::safe(format!("Ollama HTTP error: {}", err))
        }
        _ => {
            metrics::counter!("safegate_backend_failures_total", "kind" => "transport")
                .increment(1);
            warn!("Backend error: {}", err);
            ClassificationResult::safe(format!("Ollama error: {}", err))
        }
    }
}

#[async_trait]
impl Classifier for BackendDispatcher {
    async fn classify(&self, payload: &str, target: &ModelTarget) -> ClassificationResult {
        if let Some(diagnostic) = self.try_pull(&target.model).await {
            debug!("Continuing without pull: {}", diagnostic);
        }

        let request = GenerateRequest::new(&target.model, build_prompt(payload), target.gpu);
        match self.generate(&request).await {
            Ok(text) => {
                debug!("Backend answer for {}: {:?}", target.model, text);
                parser::interpret(&text, payload, &self.heuristic)
            }
            Err(result) => result,
        }
    }

    fn name(&self) -> &str {
        self.backend.name()
    }
}
