//! Pull progress events
//!
//! The backend streams one JSON object per line while it fetches a model:
//! ```text
//! {"status":"pulling manifest"}
//! {"status":"pulling 8934d96d3f08","digest":"sha256:...","total":3825819519,"completed":241970}
//! {"status":"success"}
//! ```
//! Field names differ between backend versions, so the size figures are read
//! from the first non-empty of several aliases. Lines that are not JSON
//! objects are skipped.

use crate::backend::LineStream;
use futures::{future, Stream, StreamExt};
use safegate_core::{ModelPullState, PullStatus, Result};
use serde_json::{Map, Value};

const STATUS_FIELDS: &[&str] = &["status", "status_text"];
const TOTAL_FIELDS: &[&str] = &["total", "size", "total_bytes"];
const COMPLETED_FIELDS: &[&str] = &["completed", "done", "completed_bytes"];

/// One progress record reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Raw status label, "pulling" when the event has none
    pub status: String,

    /// Expected size; `None` when absent or not numeric
    pub total: Option<f64>,

    /// Received size; `None` when absent or not numeric
    pub completed: Option<f64>,

    /// In-band failure reported by the backend
    pub error: Option<String>,
}

impl ProgressEvent {
    /// Parse one NDJSON line; `None` for blank or ill-formed lines
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = serde_json::from_str(line).ok()?;
        let object = value.as_object()?;

        let status = first_present(object, STATUS_FIELDS)
            .and_then(Value::as_str)
            .unwrap_or("pulling")
            .to_string();

        Some(Self {
            status,
            total: first_present(object, TOTAL_FIELDS).and_then(Value::as_f64),
            completed: first_present(object, COMPLETED_FIELDS).and_then(Value::as_f64),
            error: object
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Percent complete, or `previous` when it cannot be computed
    pub fn percent(&self, previous: u8) -> u8 {
        match (self.completed, self.total) {
            (Some(completed), Some(total)) if total > 0.0 => {
                (completed * 100.0 / total).floor().clamp(0.0, 100.0) as u8
            }
            _ => previous.min(100),
        }
    }

    /// State that replaces the stored one when this event arrives
    pub fn to_state(&self, previous_percent: u8) -> ModelPullState {
        ModelPullState {
            status: PullStatus::Pulling,
            percent: self.percent(previous_percent),
            completed: self.completed.map(to_units).unwrap_or(0),
            total: self.total.map(to_units).unwrap_or(0),
            message: None,
            detail: Some(self.status.clone()),
        }
    }
}

/// First alias holding a non-empty value (not null, zero, false or "")
fn first_present<'a>(object: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| object.get(*field))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn to_units(value: f64) -> u64 {
    value.max(0.0) as u64
}

/// Lazily parse a line stream into progress events, skipping ill-formed lines.
///
/// Transport errors are passed through so the consumer can end tracking.
pub fn progress_events(lines: LineStream) -> impl Stream<Item = Result<ProgressEvent>> + Send {
    lines.filter_map(|line| {
        future::ready(match line {
            Ok(line) => ProgressEvent::parse(&line).map(Ok),
            Err(e) => Some(Err(e)),
        })
    })
}
