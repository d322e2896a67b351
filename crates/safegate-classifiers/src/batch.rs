//! Batch classification with aggregate statistics
//!
//! Payloads are walked in fixed-size chunks. Chunks only set the cadence of
//! progress logging; every payload is classified independently and results
//! come back in input order. Within a chunk up to `concurrency`
//! classifications may be in flight at once.

use crate::router::ClassificationRouter;
use futures::stream::{self, StreamExt};
use safegate_core::{BatchItem, BatchRequest, BatchStats, ClassificationResult, GpuHint};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Default number of payloads per progress chunk
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Ordered per-payload results plus aggregate counters
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchItem>,
    pub stats: BatchStats,
}

impl BatchReport {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
            stats: BatchStats::new(),
        }
    }

    fn push(&mut self, payload: &str, result: ClassificationResult) {
        self.stats.record(&result);
        self.results.push(BatchItem::new(payload, result));
    }
}

/// Drives the router over a list of payloads
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    router: Arc<ClassificationRouter>,
    chunk_size: usize,
    concurrency: usize,
}

impl BatchOrchestrator {
    /// Sequential orchestrator; a chunk size of 0 is treated as 1
    pub fn new(router: Arc<ClassificationRouter>, chunk_size: usize) -> Self {
        Self {
            router,
            chunk_size: chunk_size.max(1),
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` classifications in flight within a chunk
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Classify every payload and aggregate the outcome
    pub async fn run(&self, request: &BatchRequest) -> BatchReport {
        let total = request.payloads.len();
        let provider = self.router.resolve_provider(request.provider.as_deref());
        let model = self.router.resolve_model(request.model.as_deref());
        let gpu = request.gpu_hint();

        let mut report = BatchReport::with_capacity(total);
        let mut processed = 0;

        for chunk in request.payloads.chunks(self.chunk_size) {
            // `buffered` yields in submission order regardless of completion order
            let pending: Vec<_> = chunk
                .iter()
                .map(|payload| self.classify_one(payload, request, gpu))
                .collect();
            let results: Vec<ClassificationResult> = stream::iter(pending)
                .buffered(self.concurrency)
                .collect()
                .await;

            for (payload, result) in chunk.iter().zip(results) {
                report.push(payload, result);
            }

            processed += chunk.len();
            info!(
                "processed {}/{} payloads provider={} model={}",
                processed, total, provider, model
            );
        }

        metrics::counter!("safegate_batch_payloads_total").increment(total as u64);
        report
    }

    async fn classify_one(
        &self,
        payload: &str,
        request: &BatchRequest,
        gpu: GpuHint,
    ) -> ClassificationResult {
        self.router
            .classify_with(
                payload,
                request.provider.as_deref(),
                request.model.as_deref(),
                gpu,
            )
            .await
    }
}
