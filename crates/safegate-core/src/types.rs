//! Core types for SafeGate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Attack category assigned to a payload
///
/// Four malicious labels and one safe label. The declaration order is the
/// order used for aggregation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    SqlInjection,
    Xss,
    PathTraversal,
    Other,
    Safe,
}

impl Category {
    /// Every category, in aggregation order
    pub const ALL: [Category; 5] = [
        Category::SqlInjection,
        Category::Xss,
        Category::PathTraversal,
        Category::Other,
        Category::Safe,
    ];

    /// Malicious categories in inference priority order
    pub const MALICIOUS: [Category; 4] = [
        Category::SqlInjection,
        Category::Xss,
        Category::PathTraversal,
        Category::Other,
    ];

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlInjection => "SQL_INJECTION",
            Self::Xss => "XSS",
            Self::PathTraversal => "PATH_TRAVERSAL",
            Self::Other => "OTHER",
            Self::Safe => "SAFE",
        }
    }

    pub fn is_malicious(&self) -> bool {
        !matches!(self, Self::Safe)
    }

    /// Exact, case-insensitive lookup of a wire label
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Tri-state GPU directive forwarded to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuHint {
    /// No directive; the backend decides
    #[default]
    Unset,
    /// Force CPU execution
    Cpu,
    /// Ask for at least one GPU unit
    Gpu,
}

impl GpuHint {
    /// Value of the backend's `num_gpu` option, if a directive applies
    pub fn num_gpu(&self) -> Option<u32> {
        match self {
            Self::Unset => None,
            Self::Cpu => Some(0),
            Self::Gpu => Some(1),
        }
    }
}

impl From<Option<bool>> for GpuHint {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(false) => Self::Cpu,
            Some(true) => Self::Gpu,
        }
    }
}

/// Which classification path the process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Keyword heuristics only
    #[default]
    Mock,
    /// Ollama text-generation backend
    Ollama,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown backend mode: {} (expected mock or ollama)", other)),
        }
    }
}

/// A single classification call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Raw request fragment to classify
    pub payload: String,

    /// Provider identifier, e.g. "ollama"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model identifier, if the provider supports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// true hints GPU usage, false forces CPU
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_enabled: Option<bool>,
}

impl ClassificationRequest {
    /// Create a request with no provider, model or GPU preference
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_gpu(mut self, enabled: bool) -> Self {
        self.gpu_enabled = Some(enabled);
        self
    }

    pub fn gpu_hint(&self) -> GpuHint {
        self.gpu_enabled.into()
    }
}

/// Bulk classification call; routing parameters apply to every payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Payloads in the order results should come back
    #[serde(default)]
    pub payloads: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_enabled: Option<bool>,
}

impl BatchRequest {
    pub fn new<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payloads: payloads.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn gpu_hint(&self) -> GpuHint {
        self.gpu_enabled.into()
    }
}

/// Verdict for one payload
///
/// `is_malicious` is derived from the category, so a SAFE result is never
/// malicious and every other category always is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    is_malicious: bool,
    category: Category,
    reason: String,
}

impl ClassificationResult {
    /// Create a result for the given category
    pub fn new(category: Category, reason: impl Into<String>) -> Self {
        Self {
            is_malicious: category.is_malicious(),
            category,
            reason: reason.into(),
        }
    }

    /// Create a SAFE result
    pub fn safe(reason: impl Into<String>) -> Self {
        Self::new(Category::Safe, reason)
    }

    pub fn is_malicious(&self) -> bool {
        self.is_malicious
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Free-text explanation of the verdict
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Per-payload record in a batch response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub payload: String,
    pub is_malicious: bool,
    pub category: Category,
    pub reason: String,
}

impl BatchItem {
    pub fn new(payload: impl Into<String>, result: ClassificationResult) -> Self {
        Self {
            payload: payload.into(),
            is_malicious: result.is_malicious,
            category: result.category,
            reason: result.reason,
        }
    }
}

/// Aggregate counters for a batch
///
/// `total == malicious + safe == sum(by_category)` holds after every
/// [`BatchStats::record`], and every category key is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub malicious: usize,
    pub safe: usize,
    #[serde(rename = "byCategory")]
    pub by_category: BTreeMap<Category, usize>,
}

impl BatchStats {
    /// Create zeroed stats with every category bucket present
    pub fn new() -> Self {
        Self {
            total: 0,
            malicious: 0,
            safe: 0,
            by_category: Category::ALL.into_iter().map(|c| (c, 0)).collect(),
        }
    }

    /// Count one classified payload
    pub fn record(&mut self, result: &ClassificationResult) {
        self.total += 1;
        if result.is_malicious() {
            self.malicious += 1;
        } else {
            self.safe += 1;
        }
        *self.by_category.entry(result.category()).or_insert(0) += 1;
    }

    /// Count for a single category bucket
    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

impl Default for BatchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a tracked model pull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullStatus {
    Starting,
    Pulling,
    Completed,
    Error,
    /// No pull has been tracked for the model
    Unknown,
}

/// Snapshot of a model pull
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPullState {
    pub status: PullStatus,

    /// Progress in [0, 100]
    pub percent: u8,

    /// Units (bytes) received so far
    pub completed: u64,

    /// Units (bytes) expected
    pub total: u64,

    /// Failure description, set in the ERROR state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last raw status label reported by the backend, e.g. "pulling manifest"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ModelPullState {
    fn with_status(status: PullStatus) -> Self {
        Self {
            status,
            percent: 0,
            completed: 0,
            total: 0,
            message: None,
            detail: None,
        }
    }

    /// Fresh state for a pull that was just requested
    pub fn starting() -> Self {
        Self::with_status(PullStatus::Starting)
    }

    /// Synthetic state for a model with no tracked pull
    pub fn unknown() -> Self {
        Self::with_status(PullStatus::Unknown)
    }

    /// True while a tracker is still consuming the backend stream
    pub fn is_active(&self) -> bool {
        matches!(self.status, PullStatus::Starting | PullStatus::Pulling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, PullStatus::Completed | PullStatus::Error)
    }
}

/// Outcome label of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullAckStatus {
    Requested,
    Error,
}

/// Immediate answer to a pull request; completion is observed separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullAck {
    pub status: PullAckStatus,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PullAck {
    pub fn requested(model: impl Into<String>) -> Self {
        Self {
            status: PullAckStatus::Requested,
            model: model.into(),
            message: None,
        }
    }

    pub fn error(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: PullAckStatus::Error,
            model: model.into(),
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels() {
        assert_eq!(
            serde_json::to_string(&Category::SqlInjection).unwrap(),
            "\"SQL_INJECTION\""
        );
        assert_eq!(serde_json::to_string(&Category::Xss).unwrap(), "\"XSS\"");
        assert_eq!(
            serde_json::to_string(&Category::PathTraversal).unwrap(),
            "\"PATH_TRAVERSAL\""
        );
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_label(" xss "), Some(Category::Xss));
        assert_eq!(Category::from_label("CSRF"), None);
    }

    #[test]
    fn test_result_invariant() {
        for category in Category::ALL {
            let result = ClassificationResult::new(category, "test");
            assert_eq!(result.is_malicious(), category != Category::Safe);
        }
        assert!(!ClassificationResult::safe("fine").is_malicious());
    }

    #[test]
    fn test_gpu_hint() {
        assert_eq!(GpuHint::from(None).num_gpu(), None);
        assert_eq!(GpuHint::from(Some(false)).num_gpu(), Some(0));
        assert_eq!(GpuHint::from(Some(true)).num_gpu(), Some(1));
    }

    #[test]
    fn test_backend_mode_parse() {
        assert_eq!("OLLAMA".parse::<BackendMode>(), Ok(BackendMode::Ollama));
        assert_eq!(" mock ".parse::<BackendMode>(), Ok(BackendMode::Mock));
        assert!("openai".parse::<BackendMode>().is_err());
    }

    #[test]
    fn test_stats_start_with_every_bucket() {
        let stats = BatchStats::new();
        assert_eq!(stats.by_category.len(), Category::ALL.len());
        assert!(stats.by_category.values().all(|&n| n == 0));

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["byCategory"]["SAFE"], 0);
        assert_eq!(json["byCategory"]["OTHER"], 0);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = BatchStats::new();
        stats.record(&ClassificationResult::new(Category::Xss, "x"));
        stats.record(&ClassificationResult::new(Category::Xss, "x"));
        stats.record(&ClassificationResult::safe("ok"));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.malicious, 2);
        assert_eq!(stats.safe, 1);
        assert_eq!(stats.count(Category::Xss), 2);
        assert_eq!(stats.count(Category::Safe), 1);
        assert_eq!(stats.count(Category::SqlInjection), 0);
    }

    #[test]
    fn test_pull_state_serialization() {
        let json = serde_json::to_value(ModelPullState::unknown()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "unknown", "percent": 0, "completed": 0, "total": 0})
        );

        let ack = serde_json::to_value(PullAck::requested("phi")).unwrap();
        assert_eq!(ack, serde_json::json!({"status": "requested", "model": "phi"}));
    }

    #[test]
    fn test_request_deserialize_optional_fields() {
        let req: ClassificationRequest =
            serde_json::from_str(r#"{"payload": "id=1", "gpu_enabled": false}"#).unwrap();
        assert_eq!(req.payload, "id=1");
        assert_eq!(req.provider, None);
        assert_eq!(req.gpu_hint(), GpuHint::Cpu);
    }
}
