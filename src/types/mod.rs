//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `student`: Student accounts and their balances
//! - `record`: Immutable ledger records (recognitions, endorsements, redemptions)
//! - `error`: Error types for the ledger

pub mod error;
pub mod record;
pub mod student;

pub use error::{ErrorKind, LedgerError};
pub use record::{
    Endorsement, EndorsementId, EndorsementView, Recognition, RecognitionId, RecognitionRequest,
    RecognitionView, Redemption, RedemptionId, RedemptionView,
};
pub use student::{Credits, Student, StudentId};

/// Credits a new student may send before the monthly allowance is spent
pub const INITIAL_SENDING_BALANCE: Credits = 100;

/// Maximum credits a student may send between two monthly resets
pub const MONTHLY_SENDING_LIMIT: Credits = 100;

/// Smallest amount a single recognition may carry
pub const MIN_RECOGNITION_AMOUNT: Credits = 1;

/// Largest amount a single recognition may carry
pub const MAX_RECOGNITION_AMOUNT: Credits = 100;

/// Maximum length of a recognition message, in characters
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Fixed payout rate for redemptions
pub const RUPEES_PER_CREDIT: i64 = 5;
