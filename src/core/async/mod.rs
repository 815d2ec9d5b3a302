//! Async access to the ledger
//!
//! - **AsyncLedgerEngine**: runs ledger operations on tokio's blocking pool
//!   behind a request limiter
//! - **BatchProcessor**: imports batches of recognitions, concurrent across
//!   senders and in order within each sender

pub mod batch_processor;
pub mod engine;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::AsyncLedgerEngine;
