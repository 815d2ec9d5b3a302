//! Redemption engine
//!
//! Converts received credits into a rupee payout at a fixed rate. The balance
//! decrement and the redemption record are committed together.

use chrono::Utc;
use tracing::{info, warn};

use crate::core::store::{self, LedgerStore};
use crate::types::{Credits, LedgerError, RedemptionView, StudentId, RUPEES_PER_CREDIT};

/// Executes redemptions against the ledger store
#[derive(Debug, Clone)]
pub struct RedemptionEngine {
    store: LedgerStore,
}

impl RedemptionEngine {
    /// Create a RedemptionEngine over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Redeem `credits_redeemed` of the student's received balance
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `credits_redeemed` is not positive
    /// - `NotFound` if the student does not exist
    /// - `InsufficientBalance` if the received balance is below the request
    /// - `StorageFailure` for store errors
    pub fn redeem(
        &self,
        student_id: StudentId,
        credits_redeemed: Credits,
    ) -> Result<RedemptionView, LedgerError> {
        if credits_redeemed <= 0 {
            let error = LedgerError::invalid_input(
                "credits_redeemed",
                &format!("must be positive, got {}", credits_redeemed),
            );
            warn!(student_id, credits_redeemed, error = %error, "Redemption rejected");
            return Err(error);
        }

        let rupees_value = rupees_for(credits_redeemed)?;

        let result = self.store.transaction(|conn| {
            let student = store::fetch_student(conn, student_id)?
                .ok_or_else(|| LedgerError::not_found("student", student_id))?;

            if student.received_balance < credits_redeemed {
                return Err(LedgerError::insufficient_balance(
                    student_id,
                    "received",
                    student.received_balance,
                    credits_redeemed,
                ));
            }

            store::adjust_balances(conn, student_id, 0, -credits_redeemed, 0)?;
            let id = store::insert_redemption(
                conn,
                student_id,
                credits_redeemed,
                rupees_value,
                student.received_balance - credits_redeemed,
                Utc::now(),
            )?;

            store::fetch_redemption_view(conn, id)?.ok_or_else(|| {
                LedgerError::storage_failure(&format!("redemption {} vanished after insert", id))
            })
        });

        match &result {
            Ok(view) => info!(
                redemption_id = view.redemption.id,
                student_id, credits_redeemed, rupees_value, "Redemption committed"
            ),
            Err(e) => warn!(student_id, credits_redeemed, error = %e, "Redemption rejected"),
        }

        result
    }
}

/// Rupee payout for a number of credits
fn rupees_for(credits: Credits) -> Result<i64, LedgerError> {
    credits
        .checked_mul(RUPEES_PER_CREDIT)
        .ok_or_else(|| LedgerError::invalid_input("credits_redeemed", "value too large"))
}
