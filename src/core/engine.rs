//! Ledger engine
//!
//! This module provides the `LedgerEngine`, the single entry point that wires
//! one `LedgerStore` into every engine and the reporting queries.
//!
//! ## Architecture
//!
//! ```text
//! LedgerEngine
//!     ├── TransferEngine       (recognitions)
//!     ├── RedemptionEngine     (received credits to rupees)
//!     ├── EndorsementRecorder  (endorsements)
//!     ├── StudentRegistry      (registration, monthly reset)
//!     └── LedgerQueries        (profiles, listings, summaries)
//! ```
//!
//! All components share the same store, so every balance change goes through
//! the same serialized write path no matter which component makes it.

use crate::config::LedgerConfig;
use crate::core::endorsement::EndorsementRecorder;
use crate::core::redemption::RedemptionEngine;
use crate::core::store::LedgerStore;
use crate::core::students::StudentRegistry;
use crate::core::transfer::TransferEngine;
use crate::query::LedgerQueries;
use crate::types::{
    Credits, EndorsementView, LedgerError, RecognitionId, RecognitionView, RedemptionView,
    Student, StudentId,
};

/// Facade over the ledger engines
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    store: LedgerStore,
    transfers: TransferEngine,
    redemptions: RedemptionEngine,
    endorsements: EndorsementRecorder,
    students: StudentRegistry,
    queries: LedgerQueries,
}

impl LedgerEngine {
    /// Open the database named by `config` and build every engine over it
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the database cannot be opened or migrated.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Ok(Self::new(LedgerStore::open(config)?))
    }

    /// Build every engine over an already opened store
    pub fn new(store: LedgerStore) -> Self {
        Self {
            transfers: TransferEngine::new(store.clone()),
            redemptions: RedemptionEngine::new(store.clone()),
            endorsements: EndorsementRecorder::new(store.clone()),
            students: StudentRegistry::new(store.clone()),
            queries: LedgerQueries::new(store.clone()),
            store,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Reporting queries over the same store
    pub fn queries(&self) -> &LedgerQueries {
        &self.queries
    }

    /// See [`StudentRegistry::create_student`]
    pub fn create_student(&self, name: &str, email: &str) -> Result<Student, LedgerError> {
        self.students.create_student(name, email)
    }

    /// See [`TransferEngine::transfer`]
    pub fn transfer(
        &self,
        sender_id: StudentId,
        receiver_id: StudentId,
        amount: Credits,
        message: Option<&str>,
    ) -> Result<RecognitionView, LedgerError> {
        self.transfers.transfer(sender_id, receiver_id, amount, message)
    }

    /// See [`EndorsementRecorder::endorse`]
    pub fn endorse(
        &self,
        endorser_id: StudentId,
        recognition_id: RecognitionId,
    ) -> Result<EndorsementView, LedgerError> {
        self.endorsements.endorse(endorser_id, recognition_id)
    }

    /// See [`RedemptionEngine::redeem`]
    pub fn redeem(
        &self,
        student_id: StudentId,
        credits_redeemed: Credits,
    ) -> Result<RedemptionView, LedgerError> {
        self.redemptions.redeem(student_id, credits_redeemed)
    }

    /// See [`StudentRegistry::reset_monthly_limits`]
    pub fn reset_monthly_limits(&self) -> Result<u64, LedgerError> {
        self.students.reset_monthly_limits()
    }
}
