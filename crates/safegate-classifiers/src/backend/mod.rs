//! Inference backend boundary
//!
//! The engine talks to the external text-generation service only through
//! [`InferenceBackend`], so the HTTP client can be swapped for an in-process
//! double in tests.

pub mod ollama;

use async_trait::async_trait;
use futures::stream::BoxStream;
use safegate_core::{GpuHint, Result};

pub use ollama::OllamaBackend;

/// Lines of a streamed response body, in arrival order
pub type LineStream = BoxStream<'static, Result<String>>;

/// A single generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub gpu: GpuHint,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, gpu: GpuHint) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            gpu,
        }
    }

    /// Same request with the GPU directive dropped
    pub fn without_gpu_directive(&self) -> Self {
        Self {
            gpu: GpuHint::Unset,
            ..self.clone()
        }
    }
}

/// External text-generation service
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run a deterministic (temperature 0) generation and return the trimmed text
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Ask the backend to make `model` resident, bounded by the request timeout
    async fn pull(&self, model: &str) -> Result<()>;

    /// Start a pull and stream its NDJSON progress body line by line, without a deadline
    async fn pull_stream(&self, model: &str) -> Result<LineStream>;

    /// Names of the models the backend already holds
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Backend name used in logs
    fn name(&self) -> &str;
}
