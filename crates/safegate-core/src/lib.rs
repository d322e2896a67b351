//! SafeGate Core
//!
//! Core types and utilities shared across SafeGate components.
//!
//! This crate provides:
//! - The closed attack [`Category`] vocabulary and classification results
//! - Batch aggregation counters ([`BatchStats`])
//! - Model pull progress records ([`ModelPullState`])
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    BackendMode, BatchItem, BatchRequest, BatchStats, Category, ClassificationRequest,
    ClassificationResult, GpuHint, ModelPullState, PullAck, PullAckStatus, PullStatus,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        BatchStats, Category, ClassificationRequest, ClassificationResult, GpuHint,
        ModelPullState, PullStatus,
    };
}
