//! Command execution
//!
//! Runs one parsed [`Command`] against the ledger. Command output goes to the
//! `output` writer; anything that is not command output (report totals) goes
//! to `diagnostics`. Listings are CSV, single entities are pretty JSON.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::args::{CliArgs, Command};
use crate::config::LedgerConfig;
use crate::core::{AsyncLedgerEngine, BatchProcessor, LedgerEngine};
use crate::io::{
    write_recognitions_csv, write_redemptions_csv, write_students_csv, RecognitionReader,
};
use crate::query::{RecognitionFilter, RedemptionReport};
use crate::types::LedgerError;

/// Outcome counts of a recognition import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Rows that committed a recognition
    pub applied: usize,
    /// Rows the ledger rejected
    pub rejected: usize,
    /// Rows that could not be parsed
    pub skipped: usize,
}

/// Execute the command in `args`
///
/// # Errors
///
/// Returns the ledger error of a failed operation. Output and file failures
/// are reported as `Internal` and `InvalidInput` respectively.
pub fn run(
    args: &CliArgs,
    output: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> Result<(), LedgerError> {
    let config = args.to_config();
    let engine = LedgerEngine::open(&config)?;
    let queries = engine.queries();

    match &args.command {
        Command::Init => {
            info!("Ledger schema ready at {:?}", engine.store().path());
            Ok(())
        }
        Command::AddStudent { name, email } => {
            write_json(&engine.create_student(name, email)?, output)
        }
        Command::Recognize {
            sender,
            receiver,
            amount,
            message,
        } => write_json(
            &engine.transfer(*sender, *receiver, *amount, message.as_deref())?,
            output,
        ),
        Command::Endorse {
            endorser,
            recognition,
        } => write_json(&engine.endorse(*endorser, *recognition)?, output),
        Command::Redeem { student, credits } => {
            write_json(&engine.redeem(*student, *credits)?, output)
        }
        Command::Student { id } => write_json(&queries.student_profile(*id)?, output),
        Command::Students => write_students_csv(&queries.list_students()?, output)
            .map_err(|e| LedgerError::internal(&e)),
        Command::Recognitions { sender, receiver } => {
            let filter = RecognitionFilter {
                sender_id: *sender,
                receiver_id: *receiver,
            };
            write_recognitions_csv(&queries.list_recognitions(filter)?, output)
                .map_err(|e| LedgerError::internal(&e))
        }
        Command::Recognition { id } => write_json(&queries.recognition_detail(*id)?, output),
        Command::Endorsements {
            recognition,
            student,
        } => {
            let endorsements = match (recognition, student) {
                (Some(recognition), _) => queries.endorsements_for_recognition(*recognition)?,
                (None, Some(student)) => queries.endorsements_by_student(*student)?,
                (None, None) => {
                    return Err(LedgerError::invalid_input(
                        "endorsements",
                        "either --recognition or --student is required",
                    ))
                }
            };
            write_json(&endorsements, output)
        }
        Command::Redemptions { student } => {
            let report = match student {
                Some(student) => queries.redemptions_for_student(*student)?,
                None => queries.all_redemptions()?,
            };
            write_redemption_report(&report, output, diagnostics)
        }
        Command::ResetMonthlyLimits => {
            let cleared = engine.reset_monthly_limits()?;
            writeln!(output, "{}", cleared).map_err(|e| LedgerError::internal(&e.to_string()))
        }
        Command::ImportRecognitions { file } => {
            write_json(&import_recognitions(&config, file)?, output)
        }
    }
}

/// Apply every row of an import file
///
/// Unparseable rows and rejected recognitions are logged and counted; they
/// never abort the import. Rows run concurrently across senders and in file
/// order for each sender.
pub fn import_recognitions(
    config: &LedgerConfig,
    path: &Path,
) -> Result<ImportSummary, LedgerError> {
    let reader = RecognitionReader::new(path).map_err(|e| LedgerError::invalid_input("file", &e))?;

    let mut summary = ImportSummary::default();
    let mut requests = Vec::new();
    for row in reader {
        match row {
            Ok(request) => requests.push(request),
            Err(e) => {
                warn!("Skipping import row: {}", e);
                summary.skipped += 1;
            }
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.max_concurrent_requests)
        .enable_all()
        .build()
        .map_err(|e| LedgerError::internal(&format!("Failed to create tokio runtime: {}", e)))?;

    let results = runtime.block_on(async {
        let engine = AsyncLedgerEngine::open(config)?;
        let processor = BatchProcessor::new(engine);
        Ok::<_, LedgerError>(processor.process_batch(requests).await)
    })?;

    for processed in &results {
        match &processed.result {
            Ok(_) => summary.applied += 1,
            Err(e) => {
                warn!(
                    sender_id = processed.request.sender_id,
                    receiver_id = processed.request.receiver_id,
                    amount = processed.request.amount,
                    "Import row rejected: {}",
                    e
                );
                summary.rejected += 1;
            }
        }
    }

    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        skipped = summary.skipped,
        "Recognition import finished"
    );
    Ok(summary)
}

fn write_redemption_report(
    report: &RedemptionReport,
    output: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> Result<(), LedgerError> {
    write_redemptions_csv(&report.redemptions, output).map_err(|e| LedgerError::internal(&e))?;
    writeln!(
        diagnostics,
        "Total: {} credits redeemed for {} rupees",
        report.total_credits_redeemed, report.total_rupees_value
    )
    .map_err(|e| LedgerError::internal(&e.to_string()))
}

fn write_json<T: Serialize>(value: &T, output: &mut dyn Write) -> Result<(), LedgerError> {
    serde_json::to_writer_pretty(&mut *output, value)
        .map_err(|e| LedgerError::internal(&format!("Failed to write JSON: {}", e)))?;
    writeln!(output).map_err(|e| LedgerError::internal(&e.to_string()))
}
