//! Core ledger logic
//!
//! This module contains the components that read and change ledger state:
//! - `schema` - Table definitions and schema versioning
//! - `store` - The SQLite store and its row-level helpers
//! - `transfer` - Recognitions (credit transfers)
//! - `redemption` - Conversion of received credits to rupees
//! - `endorsement` - Endorsements of existing recognitions
//! - `students` - Registration and the monthly reset
//! - `engine` - Facade wiring all of the above to one store
//! - `async` - Async facade and batch import

pub mod r#async;
pub mod endorsement;
pub mod engine;
pub mod redemption;
pub mod schema;
pub mod store;
pub mod students;
pub mod transfer;

pub use endorsement::EndorsementRecorder;
pub use engine::LedgerEngine;
pub use r#async::{AsyncLedgerEngine, BatchProcessor, ProcessingResult};
pub use redemption::RedemptionEngine;
pub use store::LedgerStore;
pub use students::StudentRegistry;
pub use transfer::TransferEngine;
