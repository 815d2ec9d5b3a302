//! Reporting queries over the ledger
//!
//! Everything here is read-only and runs on an autocommit connection, so a
//! listing never waits behind a writer. Listings are ordered newest first,
//! with the row id breaking ties between records created in the same instant.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::core::store::{
    self, LedgerStore, ENDORSEMENT_VIEW_SELECT, REDEMPTION_VIEW_SELECT, STUDENT_COLUMNS,
};
use crate::query::report::{
    Endorser, RecognitionDetail, RecognitionFilter, RecognitionSummary, RedemptionReport,
    StudentProfile, StudentStatistics,
};
use crate::types::{
    EndorsementView, LedgerError, RecognitionId, RecognitionView, RedemptionId, RedemptionView,
    Student, StudentId,
};

// Recognition view columns followed by both parties' emails
const RECOGNITION_DETAIL_SELECT: &str = "SELECT r.id, r.sender_id, r.receiver_id, \
     r.amount, r.message, r.created_at, s.name, rec.name, s.email, rec.email \
     FROM recognitions r \
     JOIN students s ON r.sender_id = s.id \
     JOIN students rec ON r.receiver_id = rec.id";

const ENDORSEMENT_COUNT: &str =
    "(SELECT COUNT(*) FROM endorsements e WHERE e.recognition_id = r.id)";

/// Read-only access to profiles, listings and summaries
#[derive(Debug, Clone)]
pub struct LedgerQueries {
    store: LedgerStore,
}

impl LedgerQueries {
    /// Create a LedgerQueries over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// A student with remaining monthly allowance and activity statistics
    ///
    /// # Errors
    ///
    /// - `NotFound` if the student does not exist
    /// - `StorageFailure` for store errors
    pub fn student_profile(&self, student_id: StudentId) -> Result<StudentProfile, LedgerError> {
        self.store.with_conn(|conn| {
            let student = store::fetch_student(conn, student_id)?
                .ok_or_else(|| LedgerError::not_found("student", student_id))?;
            let statistics = student_statistics(conn, student_id)?;

            Ok(StudentProfile {
                remaining_monthly_limit: student.remaining_monthly_limit(),
                student,
                statistics,
            })
        })
    }

    /// All students, newest first
    pub fn list_students(&self) -> Result<Vec<Student>, LedgerError> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM students ORDER BY created_at DESC, id DESC",
                STUDENT_COLUMNS
            ))?;
            let students = stmt
                .query_map([], store::student_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(students)
        })
    }

    /// Recognitions matching `filter`, newest first, with endorsement counts
    pub fn list_recognitions(
        &self,
        filter: RecognitionFilter,
    ) -> Result<Vec<RecognitionSummary>, LedgerError> {
        let mut conditions = Vec::new();
        let mut values = Vec::new();
        if let Some(sender_id) = filter.sender_id {
            values.push(sender_id);
            conditions.push(format!("r.sender_id = ?{}", values.len()));
        }
        if let Some(receiver_id) = filter.receiver_id {
            values.push(receiver_id);
            conditions.push(format!("r.receiver_id = ?{}", values.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT r.id, r.sender_id, r.receiver_id, r.amount, r.message, r.created_at, \
             s.name, rec.name, {} \
             FROM recognitions r \
             JOIN students s ON r.sender_id = s.id \
             JOIN students rec ON r.receiver_id = rec.id{} \
             ORDER BY r.created_at DESC, r.id DESC",
            ENDORSEMENT_COUNT, where_clause
        );

        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let summaries = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(RecognitionSummary {
                        view: store::recognition_view_from_row(row)?,
                        endorsement_count: row.get(8)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(summaries)
        })
    }

    /// One recognition with both parties' emails and its endorsers
    ///
    /// # Errors
    ///
    /// - `NotFound` if the recognition does not exist
    /// - `StorageFailure` for store errors
    pub fn recognition_detail(
        &self,
        recognition_id: RecognitionId,
    ) -> Result<RecognitionDetail, LedgerError> {
        self.store.with_conn(|conn| {
            let (view, sender_email, receiver_email): (RecognitionView, String, String) = conn
                .query_row(
                    &format!("{} WHERE r.id = ?1", RECOGNITION_DETAIL_SELECT),
                    [recognition_id],
                    |row| {
                        Ok((
                            store::recognition_view_from_row(row)?,
                            row.get(8)?,
                            row.get(9)?,
                        ))
                    },
                )
                .optional()?
                .ok_or_else(|| LedgerError::not_found("recognition", recognition_id))?;

            let mut stmt = conn.prepare(
                "SELECT e.id, e.endorser_id, s.name, e.created_at \
                 FROM endorsements e \
                 JOIN students s ON e.endorser_id = s.id \
                 WHERE e.recognition_id = ?1 \
                 ORDER BY e.created_at DESC, e.id DESC",
            )?;
            let endorsers = stmt
                .query_map([recognition_id], |row| {
                    Ok(Endorser {
                        endorsement_id: row.get(0)?,
                        endorser_id: row.get(1)?,
                        endorser_name: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(RecognitionDetail {
                view,
                sender_email,
                receiver_email,
                endorsement_count: endorsers.len() as i64,
                endorsers,
            })
        })
    }

    /// Endorsements of one recognition, newest first
    ///
    /// # Errors
    ///
    /// - `NotFound` if the recognition does not exist
    pub fn endorsements_for_recognition(
        &self,
        recognition_id: RecognitionId,
    ) -> Result<Vec<EndorsementView>, LedgerError> {
        self.store.with_conn(|conn| {
            if store::fetch_recognition(conn, recognition_id)?.is_none() {
                return Err(LedgerError::not_found("recognition", recognition_id));
            }
            endorsement_views(conn, "e.recognition_id", recognition_id)
        })
    }

    /// Endorsements given by one student, newest first
    ///
    /// # Errors
    ///
    /// - `NotFound` if the student does not exist
    pub fn endorsements_by_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<EndorsementView>, LedgerError> {
        self.store.with_conn(|conn| {
            if !store::student_exists(conn, student_id)? {
                return Err(LedgerError::not_found("student", student_id));
            }
            endorsement_views(conn, "e.endorser_id", student_id)
        })
    }

    /// One student's redemptions with totals
    ///
    /// # Errors
    ///
    /// - `NotFound` if the student does not exist
    pub fn redemptions_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<RedemptionReport, LedgerError> {
        self.store.with_conn(|conn| {
            if !store::student_exists(conn, student_id)? {
                return Err(LedgerError::not_found("student", student_id));
            }
            let redemptions = redemption_views(
                conn,
                &format!(
                    "{} WHERE r.student_id = ?1 ORDER BY r.created_at DESC, r.id DESC",
                    REDEMPTION_VIEW_SELECT
                ),
                params![student_id],
            )?;
            Ok(RedemptionReport::new(redemptions))
        })
    }

    /// Every redemption in the ledger with totals
    pub fn all_redemptions(&self) -> Result<RedemptionReport, LedgerError> {
        self.store.with_conn(|conn| {
            let redemptions = redemption_views(
                conn,
                &format!(
                    "{} ORDER BY r.created_at DESC, r.id DESC",
                    REDEMPTION_VIEW_SELECT
                ),
                params![],
            )?;
            Ok(RedemptionReport::new(redemptions))
        })
    }

    /// A single redemption
    ///
    /// # Errors
    ///
    /// - `NotFound` if the redemption does not exist
    pub fn redemption(&self, redemption_id: RedemptionId) -> Result<RedemptionView, LedgerError> {
        self.store.with_conn(|conn| {
            store::fetch_redemption_view(conn, redemption_id)?
                .ok_or_else(|| LedgerError::not_found("redemption", redemption_id))
        })
    }
}

fn student_statistics(
    conn: &Connection,
    student_id: StudentId,
) -> Result<StudentStatistics, LedgerError> {
    let statistics = conn.query_row(
        "SELECT \
         (SELECT COUNT(*) FROM recognitions WHERE sender_id = ?1), \
         (SELECT COALESCE(SUM(amount), 0) FROM recognitions WHERE sender_id = ?1), \
         (SELECT COUNT(*) FROM recognitions WHERE receiver_id = ?1), \
         (SELECT COALESCE(SUM(amount), 0) FROM recognitions WHERE receiver_id = ?1), \
         (SELECT COUNT(*) FROM endorsements WHERE endorser_id = ?1)",
        [student_id],
        |row| {
            Ok(StudentStatistics {
                recognitions_sent: row.get(0)?,
                total_credits_sent: row.get(1)?,
                recognitions_received: row.get(2)?,
                total_credits_received: row.get(3)?,
                endorsements_given: row.get(4)?,
            })
        },
    )?;
    Ok(statistics)
}

fn endorsement_views(
    conn: &Connection,
    column: &str,
    id: i64,
) -> Result<Vec<EndorsementView>, LedgerError> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE {} = ?1 ORDER BY e.created_at DESC, e.id DESC",
        ENDORSEMENT_VIEW_SELECT, column
    ))?;
    let views = stmt
        .query_map([id], store::endorsement_view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

fn redemption_views(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<RedemptionView>, LedgerError> {
    let mut stmt = conn.prepare(sql)?;
    let views = stmt
        .query_map(params, store::redemption_view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::test_support::{add_student, temp_store};
    use crate::core::{EndorsementRecorder, RedemptionEngine, TransferEngine};
    use crate::types::ErrorKind;

    struct Fixture {
        _dir: tempfile::TempDir,
        queries: LedgerQueries,
        asha: StudentId,
        bilal: StudentId,
        chen: StudentId,
        first: RecognitionId,
        second: RecognitionId,
    }

    /// Asha sends Bilal 30 then Chen 20; Chen endorses the first and redeems 10
    fn fixture() -> Fixture {
        let (dir, store) = temp_store();
        let asha = add_student(&store, "Asha");
        let bilal = add_student(&store, "Bilal");
        let chen = add_student(&store, "Chen");

        let transfers = TransferEngine::new(store.clone());
        let first = transfers
            .transfer(asha, bilal, 30, Some("first"))
            .unwrap()
            .recognition
            .id;
        let second = transfers.transfer(asha, chen, 20, None).unwrap().recognition.id;

        EndorsementRecorder::new(store.clone())
            .endorse(chen, first)
            .unwrap();
        RedemptionEngine::new(store.clone()).redeem(chen, 10).unwrap();

        Fixture {
            _dir: dir,
            queries: LedgerQueries::new(store),
            asha,
            bilal,
            chen,
            first,
            second,
        }
    }

    #[test]
    fn test_student_profile_statistics() {
        let f = fixture();

        let asha = f.queries.student_profile(f.asha).unwrap();
        assert_eq!(asha.remaining_monthly_limit, 50);
        assert_eq!(
            asha.statistics,
            StudentStatistics {
                recognitions_sent: 2,
                total_credits_sent: 50,
                recognitions_received: 0,
                total_credits_received: 0,
                endorsements_given: 0,
            }
        );

        let chen = f.queries.student_profile(f.chen).unwrap();
        assert_eq!(chen.student.received_balance, 10);
        assert_eq!(chen.statistics.recognitions_received, 1);
        assert_eq!(chen.statistics.total_credits_received, 20);
        assert_eq!(chen.statistics.endorsements_given, 1);
    }

    #[test]
    fn test_missing_profile_is_not_found() {
        let f = fixture();
        let err = f.queries.student_profile(999).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_list_students_newest_first() {
        let f = fixture();
        let ids: Vec<_> = f
            .queries
            .list_students()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![f.chen, f.bilal, f.asha]);
    }

    #[test]
    fn test_list_recognitions_newest_first() {
        let f = fixture();
        let all = f.queries.list_recognitions(RecognitionFilter::default()).unwrap();

        let ids: Vec<_> = all.iter().map(|s| s.view.recognition.id).collect();
        assert_eq!(ids, vec![f.second, f.first]);
        assert_eq!(all[0].endorsement_count, 0);
        assert_eq!(all[1].endorsement_count, 1);
    }

    #[test]
    fn test_list_recognitions_filters() {
        let f = fixture();

        let to_bilal = f
            .queries
            .list_recognitions(RecognitionFilter {
                sender_id: None,
                receiver_id: Some(f.bilal),
            })
            .unwrap();
        assert_eq!(to_bilal.len(), 1);
        assert_eq!(to_bilal[0].view.recognition.id, f.first);

        let from_asha_to_chen = f
            .queries
            .list_recognitions(RecognitionFilter {
                sender_id: Some(f.asha),
                receiver_id: Some(f.chen),
            })
            .unwrap();
        assert_eq!(from_asha_to_chen.len(), 1);
        assert_eq!(from_asha_to_chen[0].view.recognition.id, f.second);

        let from_bilal = f
            .queries
            .list_recognitions(RecognitionFilter {
                sender_id: Some(f.bilal),
                receiver_id: None,
            })
            .unwrap();
        assert!(from_bilal.is_empty());
    }

    #[test]
    fn test_recognition_detail_lists_endorsers() {
        let f = fixture();
        let detail = f.queries.recognition_detail(f.first).unwrap();

        assert_eq!(detail.sender_email, "asha@example.com");
        assert_eq!(detail.receiver_email, "bilal@example.com");
        assert_eq!(detail.endorsement_count, 1);
        assert_eq!(detail.endorsers[0].endorser_id, f.chen);
        assert_eq!(detail.endorsers[0].endorser_name, "Chen");
    }

    #[test]
    fn test_recognition_detail_missing() {
        let f = fixture();
        let err = f.queries.recognition_detail(999).unwrap_err();
        assert_eq!(err, LedgerError::not_found("recognition", 999));
    }

    #[test]
    fn test_endorsement_listings() {
        let f = fixture();

        let for_first = f.queries.endorsements_for_recognition(f.first).unwrap();
        assert_eq!(for_first.len(), 1);
        assert_eq!(for_first[0].endorser_name, "Chen");
        assert_eq!(for_first[0].recognition_amount, 30);

        assert!(f
            .queries
            .endorsements_for_recognition(f.second)
            .unwrap()
            .is_empty());

        let by_chen = f.queries.endorsements_by_student(f.chen).unwrap();
        assert_eq!(by_chen.len(), 1);
        assert_eq!(by_chen[0].sender_name, "Asha");
        assert_eq!(by_chen[0].receiver_name, "Bilal");

        assert_eq!(
            f.queries.endorsements_by_student(999).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_redemption_reports() {
        let f = fixture();

        let chen = f.queries.redemptions_for_student(f.chen).unwrap();
        assert_eq!(chen.total_credits_redeemed, 10);
        assert_eq!(chen.total_rupees_value, 50);
        assert_eq!(chen.redemptions[0].remaining_balance, 10);

        let bilal = f.queries.redemptions_for_student(f.bilal).unwrap();
        assert!(bilal.redemptions.is_empty());
        assert_eq!(bilal.total_credits_redeemed, 0);

        let all = f.queries.all_redemptions().unwrap();
        assert_eq!(all.redemptions.len(), 1);

        let id = all.redemptions[0].redemption.id;
        assert_eq!(f.queries.redemption(id).unwrap().student_name, "Chen");
        assert_eq!(
            f.queries.redemption(id + 1).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
