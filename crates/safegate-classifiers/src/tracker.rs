//! Model availability tracking
//!
//! Each pull runs as a detached task that consumes the backend's progress
//! stream and overwrites the model's entry in a shared registry:
//!
//! ```text
//! STARTING --event--> PULLING --stream end--> COMPLETED (100%)
//!     |                  |
//!     +------failure-----+------------------> ERROR (message)
//! ```
//!
//! Callers observe progress only through [`ModelPullTracker::progress`].
//! Entries are never evicted, so the registry grows with the number of
//! distinct model names pulled during the process lifetime.

use crate::backend::InferenceBackend;
use crate::progress::{progress_events, ProgressEvent};
use futures::StreamExt;
use parking_lot::RwLock;
use safegate_core::{ModelPullState, PullAck, PullStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Registry of pull states keyed by model name
#[derive(Clone)]
pub struct ModelPullTracker {
    backend: Arc<dyn InferenceBackend>,
    states: Arc<RwLock<HashMap<String, ModelPullState>>>,
}

impl ModelPullTracker {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start tracking a pull in the background and return immediately.
    ///
    /// A model whose pull is still STARTING or PULLING is not pulled twice.
    pub fn request_pull(&self, model: &str) -> PullAck {
        let model = model.trim();
        if model.is_empty() {
            return PullAck::error(model, "model name must not be empty");
        }

        if !self.begin(model) {
            info!("Pull of {} already in progress", model);
            return PullAck::requested(model);
        }

        let tracker = self.clone();
        let name = model.to_string();
        tokio::spawn(async move {
            tracker.follow(&name).await;
        });

        info!("Pull of {} requested", model);
        PullAck::requested(model)
    }

    /// Current state for `model`, or the synthetic "unknown" record
    pub fn progress(&self, model: &str) -> ModelPullState {
        self.states
            .read()
            .get(model)
            .cloned()
            .unwrap_or_else(ModelPullState::unknown)
    }

    /// Number of models with a tracked pull
    pub fn tracked(&self) -> usize {
        self.states.read().len()
    }

    /// Reset the entry to STARTING unless a pull is active; true if reset
    fn begin(&self, model: &str) -> bool {
        let mut states = self.states.write();
        if states.get(model).is_some_and(ModelPullState::is_active) {
            return false;
        }
        states.insert(model.to_string(), ModelPullState::starting());
        true
    }

    async fn follow(&self, model: &str) {
        let lines = match self.backend.pull_stream(model).await {
            Ok(lines) => lines,
            Err(e) => return self.fail(model, e.to_string()),
        };

        let mut events = Box::pin(progress_events(lines));
        while let Some(event) = events.next().await {
            match event {
                Ok(ProgressEvent {
                    error: Some(message),
                    ..
                }) => return self.fail(model, message),
                Ok(event) => self.apply(model, &event),
                Err(e) => return self.fail(model, e.to_string()),
            }
        }

        self.complete(model);
    }

    fn apply(&self, model: &str, event: &ProgressEvent) {
        let mut states = self.states.write();
        let previous = states.get(model).map_or(0, |s| s.percent);
        states.insert(model.to_string(), event.to_state(previous));
    }

    fn complete(&self, model: &str) {
        {
            let mut states = self.states.write();
            let state = states
                .entry(model.to_string())
                .or_insert_with(ModelPullState::starting);
            state.status = PullStatus::Completed;
            state.percent = 100;
        }
        metrics::counter!("safegate_model_pulls_total", "outcome" => "completed").increment(1);
        info!("Pull of {} completed", model);
    }

    fn fail(&self, model: &str, message: String) {
        warn!("Pull of {} failed: {}", model, message);
        {
            let mut states = self.states.write();
            let state = states
                .entry(model.to_string())
                .or_insert_with(ModelPullState::starting);
            state.status = PullStatus::Error;
            state.message = Some(message);
        }
        metrics::counter!("safegate_model_pulls_total", "outcome" => "error").increment(1);
    }
}

impl std::fmt::Debug for ModelPullTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPullTracker")
            .field("backend", &self.backend.name())
            .field("tracked", &self.tracked())
            .finish()
    }
}
