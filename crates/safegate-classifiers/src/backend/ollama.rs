//! Ollama HTTP backend
//!
//! Endpoints used:
//! ```text
//! POST /api/generate  {"model","prompt","stream":false,"options":{"temperature":0,"num_gpu"?}}
//! POST /api/pull      {"name","stream"}   (NDJSON progress when streaming)
//! GET  /api/tags      {"models":[{"name":...}]}
//! ```

use super::{GenerateRequest, InferenceBackend, LineStream};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use safegate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Serialize)]
struct PullBody<'a> {
    name: &'a str,
    stream: bool,
}

impl<'a> GenerateBody<'a> {
    fn from_request(request: &'a GenerateRequest) -> Self {
        Self {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                num_gpu: request.gpu.num_gpu(),
            },
        }
    }
}

/// Inference backend speaking the Ollama REST API
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl OllamaBackend {
    /// Create a backend for `base_url` (e.g. `http://localhost:11434`).
    ///
    /// `request_timeout` bounds generation, best-effort pulls and tag listing;
    /// streamed pulls run without a deadline.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .timeout(self.request_timeout)
            .json(&GenerateBody::from_request(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let data: GenerateResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(map_reqwest_error)?;

        Ok(data.response.unwrap_or_default().trim().to_string())
    }

    async fn pull(&self, model: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/pull"))
            .timeout(self.request_timeout)
            .json(&PullBody {
                name: model,
                stream: false,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn pull_stream(&self, model: &str) -> Result<LineStream> {
        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&PullBody {
                name: model,
                stream: true,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let response = ensure_success(response).await?;
        debug!("Pull stream opened for {}", model);

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let lines = FramedRead::new(StreamReader::new(body), LinesCodec::new())
            .map_err(|e| Error::stream(e.to_string()));

        Ok(lines.boxed())
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let data: serde_json::Value = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(map_reqwest_error)?;

        Ok(model_names(&data))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Model names from a `/api/tags` body; `name` preferred over `model`
fn model_names(data: &serde_json::Value) -> Vec<String> {
    data.get("models")
        .and_then(|m| m.as_array())
        .map(|models| {
            models
                .iter()
                .filter_map(|m| {
                    m.get("name")
                        .and_then(|n| n.as_str())
                        .or_else(|| m.get("model").and_then(|n| n.as_str()))
                })
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("no reason").to_string()
    } else {
        body.trim().to_string()
    };
    Err(Error::backend_status(status.as_u16(), message))
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else if err.is_decode() {
        Error::decode(err.to_string())
    } else if let Some(status) = err.status() {
        Error::backend_status(status.as_u16(), err.to_string())
    } else {
        Error::transport(err.to_string())
    }
}
