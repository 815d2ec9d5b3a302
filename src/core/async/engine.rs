//! Async facade over the ledger engine
//!
//! This module provides the `AsyncLedgerEngine`, which lets async callers run
//! ledger operations without blocking their runtime.
//!
//! # Design
//!
//! Every ledger operation does blocking SQLite I/O, so each call is moved onto
//! tokio's blocking pool with `spawn_blocking`. A semaphore caps the number of
//! calls in flight at `max_concurrent_requests`; callers beyond that wait for
//! a permit instead of piling up connections that would only queue on the
//! database write lock.
//!
//! # Architecture
//!
//! ```text
//! AsyncLedgerEngine
//!     ├── Arc<LedgerEngine>  (shared synchronous engines)
//!     └── Arc<Semaphore>     (request limiter)
//! ```
//!
//! # Thread Safety
//!
//! The facade is cheap to clone and every clone shares the same engine and
//! limiter. Correctness under concurrency comes from the store's serialized
//! write transactions, not from anything held here.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::error;

use crate::config::LedgerConfig;
use crate::core::engine::LedgerEngine;
use crate::query::LedgerQueries;
use crate::types::{
    Credits, EndorsementView, LedgerError, RecognitionId, RecognitionView, RedemptionView,
    Student, StudentId,
};

/// Async, concurrency-limited access to a `LedgerEngine`
#[derive(Debug, Clone)]
pub struct AsyncLedgerEngine {
    engine: Arc<LedgerEngine>,
    permits: Arc<Semaphore>,
}

impl AsyncLedgerEngine {
    /// Wrap an engine, allowing at most `max_concurrent_requests` calls at once
    ///
    /// # Arguments
    ///
    /// * `engine` - The synchronous engine to run calls against
    /// * `max_concurrent_requests` - Request limit; zero is treated as one
    pub fn new(engine: LedgerEngine, max_concurrent_requests: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            permits: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// Open the database named by `config` and wrap it
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the database cannot be opened or migrated.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Ok(Self::new(
            LedgerEngine::open(config)?,
            config.max_concurrent_requests,
        ))
    }

    /// The wrapped synchronous engine
    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    /// Run `f` against the engine on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or `Internal` if the blocking task
    /// panicked or was cancelled.
    pub async fn run<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&LedgerEngine) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| LedgerError::internal("request limiter closed"))?;

        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || f(engine.as_ref()))
            .await
            .map_err(|e| {
                error!("Ledger task failed: {}", e);
                LedgerError::internal(&format!("ledger task failed: {}", e))
            })?
    }

    /// Run a read-only query on the blocking pool
    pub async fn query<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&LedgerQueries) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        self.run(move |engine| f(engine.queries())).await
    }

    /// See [`LedgerEngine::create_student`]
    pub async fn create_student(&self, name: String, email: String) -> Result<Student, LedgerError> {
        self.run(move |engine| engine.create_student(&name, &email))
            .await
    }

    /// See [`LedgerEngine::transfer`]
    pub async fn transfer(
        &self,
        sender_id: StudentId,
        receiver_id: StudentId,
        amount: Credits,
        message: Option<String>,
    ) -> Result<RecognitionView, LedgerError> {
        self.run(move |engine| {
            engine.transfer(sender_id, receiver_id, amount, message.as_deref())
        })
        .await
    }

    /// See [`LedgerEngine::endorse`]
    pub async fn endorse(
        &self,
        endorser_id: StudentId,
        recognition_id: RecognitionId,
    ) -> Result<EndorsementView, LedgerError> {
        self.run(move |engine| engine.endorse(endorser_id, recognition_id))
            .await
    }

    /// See [`LedgerEngine::redeem`]
    pub async fn redeem(
        &self,
        student_id: StudentId,
        credits_redeemed: Credits,
    ) -> Result<RedemptionView, LedgerError> {
        self.run(move |engine| engine.redeem(student_id, credits_redeemed))
            .await
    }

    /// See [`LedgerEngine::reset_monthly_limits`]
    pub async fn reset_monthly_limits(&self) -> Result<u64, LedgerError> {
        self.run(|engine| engine.reset_monthly_limits()).await
    }
}
