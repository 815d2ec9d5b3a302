//! Ledger record types for the Boostly ledger
//!
//! Recognitions, endorsements and redemptions are append-only: once a row is
//! inserted it is never updated or deleted. The `*View` types are the same
//! records joined with the display data callers expect back.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::student::{Credits, StudentId};

/// Recognition identifier
pub type RecognitionId = i64;

/// Endorsement identifier
pub type EndorsementId = i64;

/// Redemption identifier
pub type RedemptionId = i64;

/// A transfer of credits from one student to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recognition {
    pub id: RecognitionId,
    pub sender_id: StudentId,
    pub receiver_id: StudentId,

    /// Credits transferred (1-100)
    pub amount: Credits,

    /// Optional note from the sender; empty messages are stored as `None`
    pub message: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A third party's endorsement of a recognition
///
/// At most one per (recognition, endorser) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endorsement {
    pub id: EndorsementId,
    pub recognition_id: RecognitionId,
    pub endorser_id: StudentId,
    pub created_at: DateTime<Utc>,
}

/// A conversion of received credits into a rupee payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redemption {
    pub id: RedemptionId,
    pub student_id: StudentId,
    pub credits_redeemed: Credits,

    /// Always `credits_redeemed * RUPEES_PER_CREDIT`
    pub rupees_value: i64,

    pub created_at: DateTime<Utc>,
}

/// A recognition joined with sender and receiver names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionView {
    #[serde(flatten)]
    pub recognition: Recognition,
    pub sender_name: String,
    pub receiver_name: String,
}

/// An endorsement joined with the endorsed recognition's details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndorsementView {
    #[serde(flatten)]
    pub endorsement: Endorsement,
    pub endorser_name: String,
    pub recognition_amount: Credits,
    pub sender_name: String,
    pub receiver_name: String,
}

/// A redemption joined with the redeeming student's details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedemptionView {
    #[serde(flatten)]
    pub redemption: Redemption,
    pub student_name: String,
    pub student_email: String,

    /// The student's received balance right after this redemption
    pub remaining_balance: Credits,
}

/// A recognition waiting to be executed, as read from an import batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub sender_id: StudentId,
    pub receiver_id: StudentId,
    pub amount: Credits,
    pub message: Option<String>,
}
