use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use crate::config::{LedgerConfig, DEFAULT_BUSY_TIMEOUT_MS};
use crate::types::{Credits, RecognitionId, StudentId};

/// Peer recognition credit ledger
#[derive(Parser, Debug)]
#[command(name = "boostly")]
#[command(about = "Peer recognition credit ledger", long_about = None)]
pub struct CliArgs {
    /// SQLite database file
    #[arg(
        long = "database",
        value_name = "PATH",
        env = "BOOSTLY_DATABASE",
        default_value = "boostly.db",
        global = true
    )]
    pub database: PathBuf,

    /// How long to wait for a competing writer, in milliseconds
    #[arg(
        long = "busy-timeout-ms",
        value_name = "MS",
        env = "BOOSTLY_BUSY_TIMEOUT_MS",
        global = true,
        help = "How long to wait for a competing writer (default: 5000)"
    )]
    pub busy_timeout_ms: Option<u64>,

    /// Maximum number of ledger requests in flight during an import
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        env = "BOOSTLY_MAX_CONCURRENT",
        global = true,
        help = "Maximum number of ledger requests in flight (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// Ledger commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create or upgrade the database schema
    Init,

    /// Register a student
    AddStudent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Send credits to another student
    Recognize {
        #[arg(long = "as", value_name = "ID")]
        sender: StudentId,
        #[arg(long = "to", value_name = "ID")]
        receiver: StudentId,
        #[arg(long, allow_negative_numbers = true)]
        amount: Credits,
        #[arg(long)]
        message: Option<String>,
    },

    /// Endorse someone else's recognition
    Endorse {
        #[arg(long = "as", value_name = "ID")]
        endorser: StudentId,
        #[arg(long, value_name = "ID")]
        recognition: RecognitionId,
    },

    /// Convert received credits to rupees
    Redeem {
        #[arg(long = "as", value_name = "ID")]
        student: StudentId,
        #[arg(long, allow_negative_numbers = true)]
        credits: Credits,
    },

    /// Show a student's profile and statistics as JSON
    Student { id: StudentId },

    /// List all students as CSV
    Students,

    /// List recognitions as CSV, newest first
    Recognitions {
        #[arg(long, value_name = "ID")]
        sender: Option<StudentId>,
        #[arg(long, value_name = "ID")]
        receiver: Option<StudentId>,
    },

    /// Show a recognition and its endorsers as JSON
    Recognition { id: RecognitionId },

    /// List endorsements of a recognition or by a student as JSON
    #[command(group(ArgGroup::new("target").required(true).args(["recognition", "student"])))]
    Endorsements {
        #[arg(long, value_name = "ID")]
        recognition: Option<RecognitionId>,
        #[arg(long, value_name = "ID")]
        student: Option<StudentId>,
    },

    /// List redemptions as CSV; totals go to stderr
    Redemptions {
        #[arg(long, value_name = "ID")]
        student: Option<StudentId>,
    },

    /// Apply a CSV batch of recognitions (sender,receiver,amount,message)
    ImportRecognitions {
        #[arg(value_name = "CSV")]
        file: PathBuf,
    },

    /// Clear every student's monthly sending usage
    ResetMonthlyLimits,
}

impl CliArgs {
    /// Create a LedgerConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced
    /// by `LedgerConfig::new` with a warning.
    pub fn to_config(&self) -> LedgerConfig {
        let default = LedgerConfig::default();
        LedgerConfig::new(
            self.database.clone(),
            self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
            self.max_concurrent
                .unwrap_or(default.max_concurrent_requests),
        )
    }
}
