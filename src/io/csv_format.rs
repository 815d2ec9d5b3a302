//! CSV format handling for recognition imports and ledger listings
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserializing import rows
//! - Conversion from CSV records to recognition requests
//! - Listing output for students, recognitions and redemptions
//!
//! All functions are pure (no file I/O) for easy testing.

use std::io::Write;

use csv::Writer;
use serde::Deserialize;

use crate::query::RecognitionSummary;
use crate::types::{Credits, RecognitionRequest, RedemptionView, Student, StudentId};

/// CSV record structure for deserialization
///
/// Matches the import format with columns: sender, receiver, amount, message.
/// The message column is optional.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub sender: StudentId,
    pub receiver: StudentId,
    pub amount: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Convert a CsvRecord to a RecognitionRequest
///
/// Only the shape of the row is checked here. Range checks on the amount and
/// the message happen in the transfer engine, so an imported row is judged
/// exactly like any other request.
///
/// # Returns
///
/// * `Ok(RecognitionRequest)` - Successfully converted record
/// * `Err(String)` - The amount is not a whole number of credits
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<RecognitionRequest, String> {
    let amount: Credits = csv_record.amount.trim().parse().map_err(|_| {
        format!(
            "Invalid amount '{}' for recognition from {} to {}",
            csv_record.amount, csv_record.sender, csv_record.receiver
        )
    })?;

    let message = csv_record.message.filter(|m| !m.trim().is_empty());

    Ok(RecognitionRequest {
        sender_id: csv_record.sender,
        receiver_id: csv_record.receiver,
        amount,
        message,
    })
}

/// Write students in CSV format, in the order given
///
/// Columns: id, name, email, sending_balance, received_balance,
/// monthly_sending_limit_used
pub fn write_students_csv(students: &[Student], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "name",
            "email",
            "sending_balance",
            "received_balance",
            "monthly_sending_limit_used",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for student in students {
        writer
            .write_record(&[
                student.id.to_string(),
                student.name.clone(),
                student.email.clone(),
                student.sending_balance.to_string(),
                student.received_balance.to_string(),
                student.monthly_sending_limit_used.to_string(),
            ])
            .map_err(|e| format!("Failed to write student record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write recognitions in CSV format, in the order given
///
/// Columns: id, sender_id, sender_name, receiver_id, receiver_name, amount,
/// message, endorsements, created_at. A missing message is an empty field.
pub fn write_recognitions_csv(
    recognitions: &[RecognitionSummary],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "sender_id",
            "sender_name",
            "receiver_id",
            "receiver_name",
            "amount",
            "message",
            "endorsements",
            "created_at",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for summary in recognitions {
        let recognition = &summary.view.recognition;
        writer
            .write_record(&[
                recognition.id.to_string(),
                recognition.sender_id.to_string(),
                summary.view.sender_name.clone(),
                recognition.receiver_id.to_string(),
                summary.view.receiver_name.clone(),
                recognition.amount.to_string(),
                recognition.message.clone().unwrap_or_default(),
                summary.endorsement_count.to_string(),
                recognition.created_at.to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write recognition record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write redemptions in CSV format, in the order given
///
/// Columns: id, student_id, student_name, credits_redeemed, rupees_value,
/// created_at
pub fn write_redemptions_csv(
    redemptions: &[RedemptionView],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "student_id",
            "student_name",
            "credits_redeemed",
            "rupees_value",
            "created_at",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for view in redemptions {
        let redemption = &view.redemption;
        writer
            .write_record(&[
                redemption.id.to_string(),
                redemption.student_id.to_string(),
                view.student_name.clone(),
                redemption.credits_redeemed.to_string(),
                redemption.rupees_value.to_string(),
                redemption.created_at.to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write redemption record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
