//! Read-only reporting over the ledger

pub mod projections;
pub mod report;

pub use projections::LedgerQueries;
pub use report::{
    Endorser, RecognitionDetail, RecognitionFilter, RecognitionSummary, RedemptionReport,
    StudentProfile, StudentStatistics,
};
