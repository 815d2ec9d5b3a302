//! SQLite-backed ledger store
//!
//! This module provides the `LedgerStore`, the single owner of all student
//! balances and ledger records, plus the row-level helpers the engines use
//! inside their transactions.
//!
//! ## Connections
//!
//! A fresh connection is opened for every operation. SQLite connections are
//! cheap, and keeping none of them around means several processes can share
//! one database file safely.
//!
//! ## Write transactions
//!
//! [`LedgerStore::transaction`] runs its closure inside `BEGIN IMMEDIATE`. The write
//! lock is taken before the first read, so two writers can never interleave
//! their read-decide-write sequences: the second one waits (up to the busy
//! timeout) until the first commits or rolls back. The transaction guard
//! rolls back when it is dropped without a commit, which covers every early
//! return in the closure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use crate::config::LedgerConfig;
use crate::core::schema;
use crate::types::{
    Credits, Endorsement, EndorsementId, EndorsementView, LedgerError, Recognition,
    RecognitionId, RecognitionView, Redemption, RedemptionId, RedemptionView, Student,
    StudentId,
};

pub(crate) const STUDENT_COLUMNS: &str = "id, name, email, sending_balance, received_balance, \
     monthly_sending_limit_used, created_at";

pub(crate) const RECOGNITION_VIEW_SELECT: &str = "SELECT r.id, r.sender_id, r.receiver_id, \
     r.amount, r.message, r.created_at, s.name, rec.name \
     FROM recognitions r \
     JOIN students s ON r.sender_id = s.id \
     JOIN students rec ON r.receiver_id = rec.id";

pub(crate) const ENDORSEMENT_VIEW_SELECT: &str = "SELECT e.id, e.recognition_id, \
     e.endorser_id, e.created_at, en.name, r.amount, sender.name, receiver.name \
     FROM endorsements e \
     JOIN students en ON e.endorser_id = en.id \
     JOIN recognitions r ON e.recognition_id = r.id \
     JOIN students sender ON r.sender_id = sender.id \
     JOIN students receiver ON r.receiver_id = receiver.id";

pub(crate) const REDEMPTION_VIEW_SELECT: &str = "SELECT r.id, r.student_id, \
     r.credits_redeemed, r.rupees_value, r.created_at, s.name, s.email, r.remaining_balance \
     FROM redemptions r \
     JOIN students s ON r.student_id = s.id";

/// Durable storage for students and ledger records
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl LedgerStore {
    /// Open or create the ledger database and bring its schema up to date
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store = Self {
            path: config.database_path.clone(),
            busy_timeout: config.busy_timeout,
        };

        debug!("Opening ledger database at {:?}", store.path);
        let mut conn = store.connect()?;

        // WAL keeps readers from blocking behind the writer
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!("Ledger journal mode: {}", journal_mode);
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        // Processes opening a fresh file at once must not both create the schema
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        schema::init_schema(&tx)?;
        tx.commit()?;

        Ok(store)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, LedgerError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Run read-only work on an autocommit connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Connection) -> Result<T, LedgerError>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Run `f` as one serialized write transaction
    ///
    /// Commits only if `f` returns `Ok`; any error leaves the database exactly
    /// as it was before the call.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Connection) -> Result<T, LedgerError>,
    {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Whether a storage error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// Row mappers

pub(crate) fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        sending_balance: row.get(3)?,
        received_balance: row.get(4)?,
        monthly_sending_limit_used: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) fn recognition_view_from_row(row: &Row<'_>) -> rusqlite::Result<RecognitionView> {
    Ok(RecognitionView {
        recognition: Recognition {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            receiver_id: row.get(2)?,
            amount: row.get(3)?,
            message: row.get(4)?,
            created_at: row.get(5)?,
        },
        sender_name: row.get(6)?,
        receiver_name: row.get(7)?,
    })
}

pub(crate) fn endorsement_view_from_row(row: &Row<'_>) -> rusqlite::Result<EndorsementView> {
    Ok(EndorsementView {
        endorsement: Endorsement {
            id: row.get(0)?,
            recognition_id: row.get(1)?,
            endorser_id: row.get(2)?,
            created_at: row.get(3)?,
        },
        endorser_name: row.get(4)?,
        recognition_amount: row.get(5)?,
        sender_name: row.get(6)?,
        receiver_name: row.get(7)?,
    })
}

pub(crate) fn redemption_view_from_row(row: &Row<'_>) -> rusqlite::Result<RedemptionView> {
    Ok(RedemptionView {
        redemption: Redemption {
            id: row.get(0)?,
            student_id: row.get(1)?,
            credits_redeemed: row.get(2)?,
            rupees_value: row.get(3)?,
            created_at: row.get(4)?,
        },
        student_name: row.get(5)?,
        student_email: row.get(6)?,
        remaining_balance: row.get(7)?,
    })
}

// Students

pub(crate) fn fetch_student(
    conn: &Connection,
    id: StudentId,
) -> Result<Option<Student>, LedgerError> {
    let student = conn
        .query_row(
            &format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS),
            [id],
            student_from_row,
        )
        .optional()?;
    Ok(student)
}

pub(crate) fn student_exists(conn: &Connection, id: StudentId) -> Result<bool, LedgerError> {
    let found = conn
        .query_row("SELECT 1 FROM students WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn email_registered(conn: &Connection, email: &str) -> Result<bool, LedgerError> {
    let found = conn
        .query_row("SELECT 1 FROM students WHERE email = ?1", [email], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Insert a student with the initial balances
///
/// A duplicate email is reported as `Conflict`.
pub(crate) fn insert_student(
    conn: &Connection,
    name: &str,
    email: &str,
    sending_balance: Credits,
    created_at: DateTime<Utc>,
) -> Result<StudentId, LedgerError> {
    conn.execute(
        "INSERT INTO students (name, email, sending_balance, received_balance, \
         monthly_sending_limit_used, created_at) VALUES (?1, ?2, ?3, 0, 0, ?4)",
        params![name, email, sending_balance, created_at],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            LedgerError::conflict("email already registered")
        } else {
            e.into()
        }
    })?;
    Ok(conn.last_insert_rowid())
}

/// Apply a signed change to one student's balances
///
/// Fails with `StorageFailure` if the row vanished, which cannot happen
/// inside a write transaction that already read it.
pub(crate) fn adjust_balances(
    conn: &Connection,
    id: StudentId,
    sending_delta: Credits,
    received_delta: Credits,
    monthly_used_delta: Credits,
) -> Result<(), LedgerError> {
    let changed = conn.execute(
        "UPDATE students SET sending_balance = sending_balance + ?1, \
         received_balance = received_balance + ?2, \
         monthly_sending_limit_used = monthly_sending_limit_used + ?3 \
         WHERE id = ?4",
        params![sending_delta, received_delta, monthly_used_delta, id],
    )?;

    if changed != 1 {
        return Err(LedgerError::storage_failure(&format!(
            "failed to update balances of student {}",
            id
        )));
    }
    Ok(())
}

pub(crate) fn reset_monthly_usage(conn: &Connection) -> Result<u64, LedgerError> {
    let changed = conn.execute(
        "UPDATE students SET monthly_sending_limit_used = 0 \
         WHERE monthly_sending_limit_used <> 0",
        [],
    )?;
    Ok(changed as u64)
}

// Recognitions

pub(crate) fn fetch_recognition(
    conn: &Connection,
    id: RecognitionId,
) -> Result<Option<Recognition>, LedgerError> {
    let recognition = conn
        .query_row(
            "SELECT id, sender_id, receiver_id, amount, message, created_at \
             FROM recognitions WHERE id = ?1",
            [id],
            |row| {
                Ok(Recognition {
                    id: row.get(0)?,
                    sender_id: row.get(1)?,
                    receiver_id: row.get(2)?,
                    amount: row.get(3)?,
                    message: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(recognition)
}

pub(crate) fn insert_recognition(
    conn: &Connection,
    sender_id: StudentId,
    receiver_id: StudentId,
    amount: Credits,
    message: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<RecognitionId, LedgerError> {
    conn.execute(
        "INSERT INTO recognitions (sender_id, receiver_id, amount, message, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![sender_id, receiver_id, amount, message, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn fetch_recognition_view(
    conn: &Connection,
    id: RecognitionId,
) -> Result<Option<RecognitionView>, LedgerError> {
    let view = conn
        .query_row(
            &format!("{} WHERE r.id = ?1", RECOGNITION_VIEW_SELECT),
            [id],
            recognition_view_from_row,
        )
        .optional()?;
    Ok(view)
}

// Endorsements

pub(crate) fn endorsement_exists(
    conn: &Connection,
    recognition_id: RecognitionId,
    endorser_id: StudentId,
) -> Result<bool, LedgerError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM endorsements WHERE recognition_id = ?1 AND endorser_id = ?2",
            [recognition_id, endorser_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Insert an endorsement
///
/// The UNIQUE (recognition_id, endorser_id) constraint is the authority on
/// duplicates: a violation is reported as `Conflict` whether or not the
/// caller checked first.
pub(crate) fn insert_endorsement(
    conn: &Connection,
    recognition_id: RecognitionId,
    endorser_id: StudentId,
    created_at: DateTime<Utc>,
) -> Result<EndorsementId, LedgerError> {
    conn.execute(
        "INSERT INTO endorsements (recognition_id, endorser_id, created_at) VALUES (?1, ?2, ?3)",
        params![recognition_id, endorser_id, created_at],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            LedgerError::conflict("recognition already endorsed by this student")
        } else {
            e.into()
        }
    })?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn fetch_endorsement_view(
    conn: &Connection,
    id: EndorsementId,
) -> Result<Option<EndorsementView>, LedgerError> {
    let view = conn
        .query_row(
            &format!("{} WHERE e.id = ?1", ENDORSEMENT_VIEW_SELECT),
            [id],
            endorsement_view_from_row,
        )
        .optional()?;
    Ok(view)
}

// Redemptions

pub(crate) fn insert_redemption(
    conn: &Connection,
    student_id: StudentId,
    credits_redeemed: Credits,
    rupees_value: i64,
    remaining_balance: Credits,
    created_at: DateTime<Utc>,
) -> Result<RedemptionId, LedgerError> {
    conn.execute(
        "INSERT INTO redemptions \
         (student_id, credits_redeemed, rupees_value, remaining_balance, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![student_id, credits_redeemed, rupees_value, remaining_balance, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn fetch_redemption_view(
    conn: &Connection,
    id: RedemptionId,
) -> Result<Option<RedemptionView>, LedgerError> {
    let view = conn
        .query_row(
            &format!("{} WHERE r.id = ?1", REDEMPTION_VIEW_SELECT),
            [id],
            redemption_view_from_row,
        )
        .optional()?;
    Ok(view)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// A store in a throwaway directory; keep the TempDir alive for the test
    pub(crate) fn temp_store() -> (TempDir, LedgerStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = LedgerConfig::default().with_database(dir.path().join("ledger.db"));
        let store = LedgerStore::open(&config).expect("Failed to open store");
        (dir, store)
    }

    pub(crate) fn add_student(store: &LedgerStore, name: &str) -> StudentId {
        store
            .transaction(|conn| {
                insert_student(
                    conn,
                    name,
                    &format!("{}@example.com", name.to_lowercase()),
                    100,
                    Utc::now(),
                )
            })
            .expect("Failed to insert student")
    }
}
