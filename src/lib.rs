//! Boostly Ledger Library
//! # Overview
//!
//! This library implements a peer-recognition credit ledger: students give
//! each other credits, endorse recognitions, and redeem what they received
//! for a fixed rupee payout. All state lives in a SQLite database and every
//! balance change runs as one serialized transaction.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Student, Recognition, LedgerError, etc.)
//! - [`config`] - Store location, lock wait and concurrency settings
//! - [`core`] - Ledger logic:
//!   - [`core::store`] - SQLite store and transaction boundary
//!   - [`core::transfer`] - Recognitions (credit transfers)
//!   - [`core::redemption`] - Redemptions
//!   - [`core::endorsement`] - Endorsements
//!   - [`core::students`] - Registration and the monthly reset
//!   - [`core::engine`] - Facade over all of the above
//!   - [`core::r#async`] - Async facade and batch import
//! - [`query`] - Profiles, listings and redemption summaries
//! - [`io`] - CSV import and listing output
//! - [`cli`] - CLI arguments parsing and command execution
//!
//! # Balances
//!
//! Each student holds:
//! - `sending_balance`: credits left to give away, starting at 100
//! - `received_balance`: credits received, the only redeemable balance
//! - `monthly_sending_limit_used`: credits sent since the last monthly reset,
//!   capped at 100
//!
//! # Example
//!
//! ```no_run
//! use boostly_ledger::{LedgerConfig, LedgerEngine};
//!
//! let engine = LedgerEngine::open(&LedgerConfig::default()).unwrap();
//! let asha = engine.create_student("Asha", "asha@example.com").unwrap();
//! let bilal = engine.create_student("Bilal", "bilal@example.com").unwrap();
//! engine.transfer(asha.id, bilal.id, 25, Some("Great demo")).unwrap();
//! engine.redeem(bilal.id, 20).unwrap();
//! ```

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod query;
pub mod types;

pub use config::LedgerConfig;
pub use core::{AsyncLedgerEngine, BatchProcessor, LedgerEngine, LedgerStore};
pub use query::LedgerQueries;
pub use types::{
    Credits, EndorsementView, ErrorKind, LedgerError, RecognitionRequest, RecognitionView,
    RedemptionView, Student, StudentId,
};
