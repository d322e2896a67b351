//! Classifier trait and common types

use async_trait::async_trait;
use safegate_core::{ClassificationResult, GpuHint};

/// Trait for all payload classifiers
///
/// Classification never fails: every implementation absorbs its own errors
/// and answers with a well-formed result whose `reason` carries diagnostics.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given payload
    async fn classify(&self, payload: &str, target: &ModelTarget) -> ClassificationResult;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Resolved model and GPU directive for one classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTarget {
    /// Model identifier, already clamped to the supported vocabulary
    pub model: String,

    /// GPU directive forwarded to the backend
    pub gpu: GpuHint,
}

impl ModelTarget {
    pub fn new(model: impl Into<String>, gpu: GpuHint) -> Self {
        Self {
            model: model.into(),
            gpu,
        }
    }
}
