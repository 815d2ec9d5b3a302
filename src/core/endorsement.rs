//! Endorsement recorder
//!
//! Endorsements move no credits, so they are not run inside a serialized
//! write transaction. The duplicate check before the insert only produces a
//! friendlier path for the common case; two racing requests can both pass
//! it, and the UNIQUE (recognition_id, endorser_id) constraint then rejects
//! the loser with the same `Conflict`.

use chrono::Utc;
use tracing::{info, warn};

use crate::core::store::{self, LedgerStore};
use crate::types::{EndorsementView, LedgerError, RecognitionId, StudentId};

/// Records endorsements of existing recognitions
#[derive(Debug, Clone)]
pub struct EndorsementRecorder {
    store: LedgerStore,
}

impl EndorsementRecorder {
    /// Create an EndorsementRecorder over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Record that `endorser_id` endorses `recognition_id`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the recognition or the endorser does not exist
    /// - `InvalidOperation` if the endorser sent or received the recognition
    /// - `Conflict` if this endorser already endorsed this recognition
    /// - `StorageFailure` for store errors
    pub fn endorse(
        &self,
        endorser_id: StudentId,
        recognition_id: RecognitionId,
    ) -> Result<EndorsementView, LedgerError> {
        let result = self.store.with_conn(|conn| {
            let recognition = store::fetch_recognition(conn, recognition_id)?
                .ok_or_else(|| LedgerError::not_found("recognition", recognition_id))?;

            if recognition.sender_id == endorser_id || recognition.receiver_id == endorser_id {
                return Err(LedgerError::invalid_operation(
                    "cannot endorse your own recognition (as sender or receiver)",
                ));
            }

            if !store::student_exists(conn, endorser_id)? {
                return Err(LedgerError::not_found("endorser", endorser_id));
            }

            if store::endorsement_exists(conn, recognition_id, endorser_id)? {
                return Err(LedgerError::conflict(
                    "recognition already endorsed by this student",
                ));
            }

            let id = store::insert_endorsement(conn, recognition_id, endorser_id, Utc::now())?;

            store::fetch_endorsement_view(conn, id)?.ok_or_else(|| {
                LedgerError::storage_failure(&format!("endorsement {} vanished after insert", id))
            })
        });

        match &result {
            Ok(view) => info!(
                endorsement_id = view.endorsement.id,
                endorser_id, recognition_id, "Endorsement recorded"
            ),
            Err(e) => warn!(endorser_id, recognition_id, error = %e, "Endorsement rejected"),
        }

        result
    }
}
