//! Analyzer configuration
//!
//! Settings are layered: built-in defaults, then the optional YAML file,
//! then command-line flags or their environment variables.

use anyhow::Context;
use clap::Parser;
use safegate_core::BackendMode;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Parser, Debug, Default)]
#[command(name = "safegate-analyzer")]
#[command(about = "SafeGate payload analyzer", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ANALYZER_CONFIG", default_value = "analyzer.yaml")]
    pub config: String,

    /// Classification backend (mock or ollama)
    #[arg(short, long, env = "ANALYZER_BACKEND")]
    pub backend: Option<String>,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_HOST")]
    pub ollama_host: Option<String>,

    /// Default model
    #[arg(short, long, env = "OLLAMA_MODEL")]
    pub model: Option<String>,

    /// Payloads per batch progress chunk
    #[arg(long, env = "ANALYZER_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Per-request backend timeout in seconds
    #[arg(long, env = "ANALYZER_TIMEOUT_SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Classifications in flight within a batch chunk
    #[arg(long, env = "ANALYZER_BATCH_CONCURRENCY")]
    pub batch_concurrency: Option<usize>,

    /// Listen address
    #[arg(short = 'l', long, env = "ANALYZER_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "ANALYZER_PORT")]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Classification backend
    pub backend: BackendMode,

    /// Ollama base URL
    pub ollama_host: String,

    /// Model used when a request names none or an unsupported one
    pub model: String,

    /// Payloads per batch progress chunk
    pub batch_size: usize,

    /// Per-request backend timeout in seconds
    pub timeout_seconds: u64,

    /// Classifications in flight within a batch chunk
    pub batch_concurrency: usize,

    /// Listen address
    pub listen: String,

    /// Listen port
    pub port: u16,
}

impl AnalyzerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = Self::from_file(&cli.config)?;
        config.apply(cli)?;
        Ok(config)
    }

    /// Read a YAML file, or fall back to defaults when it does not exist
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn apply(&mut self, cli: &Cli) -> anyhow::Result<()> {
        if let Some(backend) = &cli.backend {
            self.backend = backend.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(host) = &cli.ollama_host {
            self.ollama_host = host.clone();
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(batch_size) = cli.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(timeout) = cli.timeout_seconds {
            self.timeout_seconds = timeout;
        }
        if let Some(concurrency) = cli.batch_concurrency {
            self.batch_concurrency = concurrency;
        }
        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.listen, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.listen, self.port))
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            backend: BackendMode::Mock,
            ollama_host: "http://host.docker.internal:11434".to_string(),
            model: "tinyllama".to_string(),
            batch_size: 20,
            timeout_seconds: 25,
            batch_concurrency: 1,
            listen: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}
