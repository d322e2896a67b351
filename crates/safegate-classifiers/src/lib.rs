//! SafeGate Classifiers
//!
//! The classification decision engine for HTTP request fragments.
//!
//! Two paths produce a verdict:
//! - Heuristic: deterministic keyword rules, no I/O
//! - Backend: a prompt sent to an external text-generation service, with
//!   strict-format parsing, inferential fallback and pull-and-retry on errors
//!
//! Neither path ever fails; broken or cold backends degrade to SAFE with the
//! failure recorded in the result's reason. Model pulls are tracked by a
//! separate background state machine.

pub mod backend;
pub mod batch;
pub mod classifier;
pub mod dispatcher;
pub mod heuristic;
pub mod parser;
pub mod progress;
pub mod prompt;
pub mod router;
pub mod tracker;

pub use backend::{GenerateRequest, InferenceBackend, LineStream, OllamaBackend};
pub use batch::{BatchOrchestrator, BatchReport, DEFAULT_CHUNK_SIZE};
pub use classifier::{Classifier, ModelTarget};
pub use dispatcher::BackendDispatcher;
pub use heuristic::HeuristicClassifier;
pub use parser::{interpret, ParsedAnswer, Verdict};
pub use progress::{progress_events, ProgressEvent};
pub use prompt::build_prompt;
pub use router::{ClassificationRouter, MOCK_PROVIDER, OLLAMA_PROVIDER, SUPPORTED_MODELS};
pub use tracker::ModelPullTracker;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backend::{InferenceBackend, OllamaBackend};
    pub use crate::batch::{BatchOrchestrator, BatchReport};
    pub use crate::classifier::Classifier;
    pub use crate::heuristic::HeuristicClassifier;
    pub use crate::router::ClassificationRouter;
    pub use crate::tracker::ModelPullTracker;
}
