//! SafeGate Analyzer
//!
//! HTTP front end of the classification engine. Exposes single and batch
//! analysis, model listing and model pull tracking, plus health and
//! Prometheus endpoints.

pub mod config;
pub mod routes;
pub mod state;

pub use config::{AnalyzerConfig, Cli};
pub use routes::create_router;
pub use state::AppState;
