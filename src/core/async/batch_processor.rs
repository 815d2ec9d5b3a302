//! Batch import of recognitions with sender-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which executes a batch of
//! recognition requests concurrently while keeping each sender's requests in
//! their original order.
//!
//! # Design
//!
//! The batch is partitioned by sender. Each sender's requests run sequentially
//! in one task, and tasks for different senders run concurrently. Whether a
//! request fits in the sender's balance and monthly allowance depends on the
//! requests before it, so in-order execution per sender makes the outcome of
//! an import independent of scheduling.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── AsyncLedgerEngine  (shared, concurrency-limited ledger access)
//! ```

use std::collections::HashMap;

use futures::future::join_all;
use tracing::{debug, error};

use super::AsyncLedgerEngine;
use crate::types::{LedgerError, RecognitionRequest, RecognitionView, StudentId};

/// Result of executing a single recognition request
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The request that was executed
    pub request: RecognitionRequest,

    /// The committed recognition, or why it was rejected
    pub result: Result<RecognitionView, LedgerError>,
}

/// Batch processor with sender-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: AsyncLedgerEngine,
}

impl BatchProcessor {
    /// Create a new BatchProcessor over the given engine
    pub fn new(engine: AsyncLedgerEngine) -> Self {
        Self { engine }
    }

    /// Partition a batch of requests by sender
    ///
    /// # Guarantees
    ///
    /// - Each request appears in exactly one partition
    /// - Requests for each sender keep their original order
    pub fn partition_by_sender(
        &self,
        batch: Vec<RecognitionRequest>,
    ) -> HashMap<StudentId, Vec<RecognitionRequest>> {
        let mut sender_batches: HashMap<StudentId, Vec<RecognitionRequest>> = HashMap::new();

        for request in batch {
            sender_batches
                .entry(request.sender_id)
                .or_default()
                .push(request);
        }

        sender_batches
    }

    /// Execute one sender's requests in order
    ///
    /// Every request is attempted; a rejected request does not stop the ones
    /// after it. Results are in input order.
    pub async fn process_sender_requests(
        &self,
        requests: Vec<RecognitionRequest>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let result = self
                .engine
                .transfer(
                    request.sender_id,
                    request.receiver_id,
                    request.amount,
                    request.message.clone(),
                )
                .await;
            results.push(ProcessingResult { request, result });
        }

        results
    }

    /// Execute a batch, one concurrent task per sender
    ///
    /// Results are grouped by sender and in input order within each sender;
    /// the order of the groups is unspecified.
    pub async fn process_batch(&self, batch: Vec<RecognitionRequest>) -> Vec<ProcessingResult> {
        let sender_batches = self.partition_by_sender(batch);
        debug!("Processing batch for {} senders", sender_batches.len());

        let mut tasks = Vec::with_capacity(sender_batches.len());
        for (sender_id, requests) in sender_batches {
            let processor = self.clone();
            let task =
                tokio::spawn(async move { processor.process_sender_requests(requests).await });
            tasks.push((sender_id, task));
        }

        let joined = join_all(
            tasks
                .into_iter()
                .map(|(sender_id, task)| async move { (sender_id, task.await) }),
        )
        .await;

        let mut results = Vec::new();
        for (sender_id, outcome) in joined {
            match outcome {
                Ok(sender_results) => results.extend(sender_results),
                Err(e) => error!(sender_id, "Import task failed: {}", e),
            }
        }

        results
    }
}
