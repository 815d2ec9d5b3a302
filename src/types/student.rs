//! Student-related types for the Boostly ledger
//!
//! This module defines the Student structure, which carries the three
//! balances the ledger engines read and mutate.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::MONTHLY_SENDING_LIMIT;

/// Student identifier
///
/// Assigned by the store on insert. Caller identities are the same type.
pub type StudentId = i64;

/// Credit amount
///
/// Credits are whole units; signed so that SQL arithmetic maps directly.
pub type Credits = i64;

/// Student account state
///
/// A student both gives credits away (from `sending_balance`) and collects
/// them from peers (into `received_balance`). Only received credits can be
/// redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    /// The student ID
    pub id: StudentId,

    /// Display name
    pub name: String,

    /// Email address, unique across students
    pub email: String,

    /// Credits available to give away
    ///
    /// Starts at 100 and only ever decreases through recognitions.
    pub sending_balance: Credits,

    /// Credits received from peers and not yet redeemed
    pub received_balance: Credits,

    /// Credits sent since the last monthly reset
    ///
    /// Never exceeds [`MONTHLY_SENDING_LIMIT`].
    pub monthly_sending_limit_used: Credits,

    /// When the student was registered
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Credits the student can still send before the monthly cap is hit
    pub fn remaining_monthly_limit(&self) -> Credits {
        MONTHLY_SENDING_LIMIT - self.monthly_sending_limit_used
    }
}
