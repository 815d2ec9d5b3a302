//! Credit transfer engine
//!
//! This module provides the `TransferEngine`, which turns a recognition
//! request into one atomic ledger update:
//!
//! - the sender's `sending_balance` decreases by the amount
//! - the sender's `monthly_sending_limit_used` increases by the amount
//! - the receiver's `received_balance` increases by the amount
//! - exactly one recognition row is inserted
//!
//! All four effects commit together or not at all.

use chrono::Utc;
use tracing::{info, warn};

use crate::core::store::{self, LedgerStore};
use crate::types::{
    Credits, LedgerError, RecognitionView, StudentId, MAX_MESSAGE_LENGTH, MAX_RECOGNITION_AMOUNT,
    MIN_RECOGNITION_AMOUNT, MONTHLY_SENDING_LIMIT,
};

/// Executes recognitions against the ledger store
#[derive(Debug, Clone)]
pub struct TransferEngine {
    store: LedgerStore,
}

impl TransferEngine {
    /// Create a TransferEngine over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Transfer `amount` credits from `sender_id` to `receiver_id`
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` if sender and receiver are the same student
    /// - `InvalidInput` if the amount is outside 1-100 or the message is too long
    /// - `NotFound` if the receiver or sender does not exist
    /// - `LimitExceeded` if the transfer would push monthly sending past 100
    /// - `InsufficientBalance` if the sender's sending balance is below `amount`
    /// - `StorageFailure` for store errors
    ///
    /// On any error the store is unchanged.
    pub fn transfer(
        &self,
        sender_id: StudentId,
        receiver_id: StudentId,
        amount: Credits,
        message: Option<&str>,
    ) -> Result<RecognitionView, LedgerError> {
        let message = validate_request(sender_id, receiver_id, amount, message)
            .inspect_err(|e| warn!(sender_id, receiver_id, amount, error = %e, "Recognition rejected"))?;

        let result = self.store.transaction(|conn| {
            if !store::student_exists(conn, receiver_id)? {
                return Err(LedgerError::not_found("receiver", receiver_id));
            }

            let sender = store::fetch_student(conn, sender_id)?
                .ok_or_else(|| LedgerError::not_found("sender", sender_id))?;

            // When both checks fail the monthly limit is reported
            if sender.monthly_sending_limit_used + amount > MONTHLY_SENDING_LIMIT {
                return Err(LedgerError::limit_exceeded(
                    sender_id,
                    sender.monthly_sending_limit_used,
                    amount,
                    MONTHLY_SENDING_LIMIT,
                ));
            }

            if sender.sending_balance < amount {
                return Err(LedgerError::insufficient_balance(
                    sender_id,
                    "sending",
                    sender.sending_balance,
                    amount,
                ));
            }

            store::adjust_balances(conn, sender_id, -amount, 0, amount)?;
            store::adjust_balances(conn, receiver_id, 0, amount, 0)?;

            let id = store::insert_recognition(
                conn,
                sender_id,
                receiver_id,
                amount,
                message,
                Utc::now(),
            )?;

            store::fetch_recognition_view(conn, id)?.ok_or_else(|| {
                LedgerError::storage_failure(&format!("recognition {} vanished after insert", id))
            })
        });

        match &result {
            Ok(view) => info!(
                recognition_id = view.recognition.id,
                sender_id, receiver_id, amount, "Recognition committed"
            ),
            Err(e) => warn!(sender_id, receiver_id, amount, error = %e, "Recognition rejected"),
        }

        result
    }
}

/// Check the request before touching storage
///
/// Returns the message to store: an empty message is treated as absent.
fn validate_request(
    sender_id: StudentId,
    receiver_id: StudentId,
    amount: Credits,
    message: Option<&str>,
) -> Result<Option<&str>, LedgerError> {
    if sender_id == receiver_id {
        return Err(LedgerError::invalid_operation(
            "cannot send recognition to yourself",
        ));
    }

    if !(MIN_RECOGNITION_AMOUNT..=MAX_RECOGNITION_AMOUNT).contains(&amount) {
        return Err(LedgerError::invalid_input(
            "amount",
            &format!(
                "must be between {} and {} credits, got {}",
                MIN_RECOGNITION_AMOUNT, MAX_RECOGNITION_AMOUNT, amount
            ),
        ));
    }

    let message = message.filter(|m| !m.is_empty());
    if let Some(text) = message {
        let length = text.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(LedgerError::invalid_input(
                "message",
                &format!(
                    "cannot exceed {} characters, got {}",
                    MAX_MESSAGE_LENGTH, length
                ),
            ));
        }
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::test_support::{add_student, temp_store};
    use crate::types::{ErrorKind, Student};
    use rstest::rstest;

    fn student(store: &LedgerStore, id: StudentId) -> Student {
        store
            .with_conn(|conn| store::fetch_student(conn, id))
            .unwrap()
            .unwrap()
    }

    fn recognition_count(store: &LedgerStore) -> i64 {
        store
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM recognitions", [], |row| row.get(0))?)
            })
            .unwrap()
    }

    #[test]
    fn test_transfer_moves_credits() {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let b = add_student(&store, "Bilal");
        let engine = TransferEngine::new(store.clone());

        let view = engine.transfer(a, b, 30, Some("great demo")).unwrap();

        assert_eq!(view.recognition.sender_id, a);
        assert_eq!(view.recognition.receiver_id, b);
        assert_eq!(view.recognition.amount, 30);
        assert_eq!(view.recognition.message.as_deref(), Some("great demo"));
        assert_eq!(view.sender_name, "Asha");
        assert_eq!(view.receiver_name, "Bilal");

        let sender = student(&store, a);
        assert_eq!(sender.sending_balance, 70);
        assert_eq!(sender.monthly_sending_limit_used, 30);
        assert_eq!(sender.received_balance, 0);

        let receiver = student(&store, b);
        assert_eq!(receiver.received_balance, 30);
        assert_eq!(receiver.sending_balance, 100);
        assert_eq!(receiver.monthly_sending_limit_used, 0);

        assert_eq!(recognition_count(&store), 1);
    }

    #[test]
    fn test_empty_message_is_stored_as_none() {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let b = add_student(&store, "Bilal");
        let engine = TransferEngine::new(store);

        let view = engine.transfer(a, b, 5, Some("")).unwrap();
        assert_eq!(view.recognition.message, None);
    }

    #[test]
    fn test_self_transfer_is_invalid_operation() {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let engine = TransferEngine::new(store.clone());

        let err = engine.transfer(a, a, 10, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert_eq!(student(&store, a).sending_balance, 100);
        assert_eq!(recognition_count(&store), 0);
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-5)]
    #[case::above_max(101)]
    fn test_amount_out_of_range(#[case] amount: Credits) {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let b = add_student(&store, "Bilal");
        let engine = TransferEngine::new(store.clone());

        let err = engine.transfer(a, b, amount, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(recognition_count(&store), 0);
    }

    #[rstest]
    #[case::at_limit(500, true)]
    #[case::over_limit(501, false)]
    fn test_message_length(#[case] length: usize, #[case] accepted: bool) {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let b = add_student(&store, "Bilal");
        let engine = TransferEngine::new(store);

        let message = "é".repeat(length);
        let result = engine.transfer(a, b, 1, Some(&message));
        assert_eq!(result.is_ok(), accepted);
    }

    #[test]
    fn test_missing_receiver_is_not_found() {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let engine = TransferEngine::new(store.clone());

        let err = engine.transfer(a, 999, 10, None).unwrap_err();
        assert_eq!(err, LedgerError::not_found("receiver", 999));
        assert_eq!(student(&store, a).sending_balance, 100);
    }

    #[test]
    fn test_missing_sender_is_not_found() {
        let (_dir, store) = temp_store();
        let b = add_student(&store, "Bilal");
        let engine = TransferEngine::new(store.clone());

        let err = engine.transfer(999, b, 10, None).unwrap_err();
        assert_eq!(err, LedgerError::not_found("sender", 999));
        assert_eq!(student(&store, b).received_balance, 0);
    }

    #[test]
    fn test_insufficient_sending_balance_changes_nothing() {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let b = add_student(&store, "Bilal");
        store
            .transaction(|conn| store::adjust_balances(conn, a, -95, 0, 0))
            .unwrap();
        let engine = TransferEngine::new(store.clone());

        let err = engine.transfer(a, b, 10, None).unwrap_err();
        assert_eq!(err, LedgerError::insufficient_balance(a, "sending", 5, 10));

        let sender = student(&store, a);
        assert_eq!(sender.sending_balance, 5);
        assert_eq!(sender.monthly_sending_limit_used, 0);
        assert_eq!(student(&store, b).received_balance, 0);
        assert_eq!(recognition_count(&store), 0);
    }

    #[test]
    fn test_monthly_limit_changes_nothing() {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let b = add_student(&store, "Bilal");
        // Plenty of sending balance, but the month is nearly spent
        store
            .transaction(|conn| store::adjust_balances(conn, a, 0, 0, 95))
            .unwrap();
        let engine = TransferEngine::new(store.clone());

        let err = engine.transfer(a, b, 10, None).unwrap_err();
        assert_eq!(err, LedgerError::limit_exceeded(a, 95, 10, 100));

        let sender = student(&store, a);
        assert_eq!(sender.sending_balance, 100);
        assert_eq!(sender.monthly_sending_limit_used, 95);
        assert_eq!(recognition_count(&store), 0);
    }

    #[test]
    fn test_exact_limit_is_allowed() {
        let (_dir, store) = temp_store();
        let a = add_student(&store, "Asha");
        let b = add_student(&store, "Bilal");
        let engine = TransferEngine::new(store.clone());

        engine.transfer(a, b, 100, None).unwrap();
        let sender = student(&store, a);
        assert_eq!(sender.sending_balance, 0);
        assert_eq!(sender.monthly_sending_limit_used, 100);
    }
}
