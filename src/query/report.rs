//! Read-model types returned by the reporting queries

use serde::Serialize;

use crate::types::{Credits, RecognitionView, RedemptionView, Student, StudentId};

/// Aggregate activity for one student
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentStatistics {
    pub recognitions_sent: i64,
    pub total_credits_sent: Credits,
    pub recognitions_received: i64,
    pub total_credits_received: Credits,
    pub endorsements_given: i64,
}

/// A student with derived limits and activity statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentProfile {
    #[serde(flatten)]
    pub student: Student,
    pub remaining_monthly_limit: Credits,
    pub statistics: StudentStatistics,
}

/// Optional filters for recognition listings; `None` matches everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecognitionFilter {
    pub sender_id: Option<StudentId>,
    pub receiver_id: Option<StudentId>,
}

/// A recognition in a listing, with its endorsement count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionSummary {
    #[serde(flatten)]
    pub view: RecognitionView,
    pub endorsement_count: i64,
}

/// One endorser of a recognition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endorser {
    pub endorsement_id: i64,
    pub endorser_id: StudentId,
    pub endorser_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A recognition with contact details and everyone who endorsed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionDetail {
    #[serde(flatten)]
    pub view: RecognitionView,
    pub sender_email: String,
    pub receiver_email: String,
    pub endorsement_count: i64,
    pub endorsers: Vec<Endorser>,
}

/// A list of redemptions with running totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedemptionReport {
    pub total_credits_redeemed: Credits,
    pub total_rupees_value: i64,
    pub redemptions: Vec<RedemptionView>,
}

impl RedemptionReport {
    /// Build a report, summing the totals over `redemptions`
    pub fn new(redemptions: Vec<RedemptionView>) -> Self {
        let total_credits_redeemed = redemptions
            .iter()
            .map(|r| r.redemption.credits_redeemed)
            .sum();
        let total_rupees_value = redemptions.iter().map(|r| r.redemption.rupees_value).sum();

        Self {
            total_credits_redeemed,
            total_rupees_value,
            redemptions,
        }
    }
}
