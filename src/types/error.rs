//! Error types for the Boostly ledger
//!
//! This module defines all error types that can occur while applying ledger
//! operations. Every variant carries enough context to produce a useful
//! message for the caller.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: referenced student or recognition does not exist
//! - **Business Rule Errors**: insufficient balance, monthly limit exceeded,
//!   self-transfer, self-endorsement, duplicates
//! - **Input Errors**: values outside the accepted ranges
//! - **Storage Errors**: failures of the underlying SQLite store
//!
//! Business rule failures are always detected before commit, so the store is
//! left exactly as it was before the operation began.

use thiserror::Error;

use super::student::{Credits, StudentId};

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// A referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity ("student", "recognition", ...)
        entity: String,
        /// Identifier that was looked up
        id: i64,
    },

    /// A balance is too low for the requested operation
    ///
    /// `balance` names which balance was checked ("sending" or "received").
    #[error("Insufficient {balance} balance for student {student}: available {available}, requested {requested}")]
    InsufficientBalance {
        student: StudentId,
        balance: String,
        available: Credits,
        requested: Credits,
    },

    /// The monthly sending cap would be exceeded
    #[error("Monthly sending limit exceeded for student {student}: used {used} of {limit}, requested {requested}")]
    LimitExceeded {
        student: StudentId,
        used: Credits,
        requested: Credits,
        limit: Credits,
    },

    /// The operation is not allowed for this caller (self-transfer, self-endorsement)
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// An input value is outside its accepted range
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// The operation would duplicate an existing unique record
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// The underlying store failed for a reason unrelated to business rules
    ///
    /// Not recoverable locally; surfaced as-is.
    #[error("Storage failure: {message}")]
    StorageFailure { message: String },

    /// A worker task failed before producing a result
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Coarse classification of a [`LedgerError`]
///
/// This is what a transport layer matches on to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InsufficientBalance,
    LimitExceeded,
    InvalidOperation,
    InvalidInput,
    Conflict,
    StorageFailure,
    Internal,
}

impl From<rusqlite::Error> for LedgerError {
    fn from(error: rusqlite::Error) -> Self {
        LedgerError::StorageFailure {
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            LedgerError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            LedgerError::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            LedgerError::InvalidInput { .. } => ErrorKind::InvalidInput,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::StorageFailure { .. } => ErrorKind::StorageFailure,
            LedgerError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// HTTP status code a transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::InsufficientBalance
            | ErrorKind::LimitExceeded
            | ErrorKind::InvalidOperation
            | ErrorKind::InvalidInput => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::StorageFailure | ErrorKind::Internal => 500,
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &str, id: i64) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(
        student: StudentId,
        balance: &str,
        available: Credits,
        requested: Credits,
    ) -> Self {
        LedgerError::InsufficientBalance {
            student,
            balance: balance.to_string(),
            available,
            requested,
        }
    }

    /// Create a LimitExceeded error
    pub fn limit_exceeded(
        student: StudentId,
        used: Credits,
        requested: Credits,
        limit: Credits,
    ) -> Self {
        LedgerError::LimitExceeded {
            student,
            used,
            requested,
            limit,
        }
    }

    /// Create an InvalidOperation error
    pub fn invalid_operation(reason: &str) -> Self {
        LedgerError::InvalidOperation {
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: &str, reason: &str) -> Self {
        LedgerError::InvalidInput {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(reason: &str) -> Self {
        LedgerError::Conflict {
            reason: reason.to_string(),
        }
    }

    /// Create a StorageFailure error
    pub fn storage_failure(message: &str) -> Self {
        LedgerError::StorageFailure {
            message: message.to_string(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: &str) -> Self {
        LedgerError::Internal {
            message: message.to_string(),
        }
    }
}
