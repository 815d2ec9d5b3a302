//! Student registry
//!
//! Registration of new students and the monthly maintenance job that clears
//! the sending counters.

use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::core::store::{self, LedgerStore};
use crate::types::{LedgerError, Student, INITIAL_SENDING_BALANCE};

const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 100;

/// Registers students and runs balance maintenance
#[derive(Debug, Clone)]
pub struct StudentRegistry {
    store: LedgerStore,
}

impl StudentRegistry {
    /// Create a StudentRegistry over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Register a student with a full sending allowance and nothing received
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the name is not 2-100 characters or the email is malformed
    /// - `Conflict` if the email is already registered
    /// - `StorageFailure` for store errors
    pub fn create_student(&self, name: &str, email: &str) -> Result<Student, LedgerError> {
        validate_new_student(name, email)?;

        let result = self.store.transaction(|conn| {
            if store::email_registered(conn, email)? {
                return Err(LedgerError::conflict("email already registered"));
            }

            let id = store::insert_student(conn, name, email, INITIAL_SENDING_BALANCE, Utc::now())?;
            store::fetch_student(conn, id)?.ok_or_else(|| {
                LedgerError::storage_failure(&format!("student {} vanished after insert", id))
            })
        });

        match &result {
            Ok(student) => info!(student_id = student.id, email, "Student registered"),
            Err(e) => warn!(email, error = %e, "Student registration rejected"),
        }

        result
    }

    /// Zero `monthly_sending_limit_used` for every student
    ///
    /// This is the monthly maintenance job; it is run by an external
    /// scheduler, never by the engines. Sending balances are not refilled.
    /// Returns the number of students whose counter was cleared.
    pub fn reset_monthly_limits(&self) -> Result<u64, LedgerError> {
        let cleared = self.store.transaction(store::reset_monthly_usage)?;
        info!(cleared, "Monthly sending limits reset");
        Ok(cleared)
    }
}

/// Registration input, checked before anything touches the store
#[derive(Debug, Validate)]
struct NewStudent {
    #[validate(length(min = 2, max = 100))]
    name: String,

    #[validate(email)]
    email: String,
}

fn validate_new_student(name: &str, email: &str) -> Result<(), LedgerError> {
    let input = NewStudent {
        name: name.to_owned(),
        email: email.to_owned(),
    };
    if let Err(errors) = input.validate() {
        let fields = errors.field_errors();
        if fields.contains_key("name") {
            return Err(LedgerError::invalid_input(
                "name",
                &format!(
                    "must be between {} and {} characters, got {}",
                    MIN_NAME_LENGTH,
                    MAX_NAME_LENGTH,
                    name.chars().count()
                ),
            ));
        }
        return Err(invalid_email());
    }

    // Addresses on a bare host name are not accepted
    match email.rsplit_once('@') {
        Some((_, domain)) if domain.contains('.') => Ok(()),
        _ => Err(invalid_email()),
    }
}

fn invalid_email() -> LedgerError {
    LedgerError::invalid_input("email", "must be a valid email address")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::test_support::temp_store;
    use crate::types::ErrorKind;
    use rstest::rstest;

    #[test]
    fn test_create_student_initial_balances() {
        let (_dir, store) = temp_store();
        let registry = StudentRegistry::new(store);

        let student = registry.create_student("Asha", "asha@example.com").unwrap();
        assert_eq!(student.name, "Asha");
        assert_eq!(student.email, "asha@example.com");
        assert_eq!(student.sending_balance, 100);
        assert_eq!(student.received_balance, 0);
        assert_eq!(student.monthly_sending_limit_used, 0);
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let (_dir, store) = temp_store();
        let registry = StudentRegistry::new(store);

        registry.create_student("Asha", "asha@example.com").unwrap();
        let err = registry
            .create_student("Asha Again", "asha@example.com")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[rstest]
    #[case::too_short("A")]
    #[case::empty("")]
    #[case::too_long(&"x".repeat(101))]
    fn test_invalid_names(#[case] name: &str) {
        let err = validate_new_student(name, "asha@example.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("name"));
    }

    #[rstest]
    #[case::shortest("Al")]
    #[case::longest(&"x".repeat(100))]
    #[case::multibyte_counts_chars("Łu")]
    fn test_valid_names(#[case] name: &str) {
        assert!(validate_new_student(name, "asha@example.com").is_ok());
    }

    #[rstest]
    #[case::no_at("asha.example.com")]
    #[case::no_local("@example.com")]
    #[case::no_tld("asha@example")]
    #[case::two_ats("asha@@example.com")]
    #[case::empty_label("asha@example..com")]
    #[case::whitespace("asha @example.com")]
    #[case::comma_and_parens("a,b@exa(mple).com")]
    #[case::angle_brackets("<x>@-bad-.c")]
    #[case::trailing_bang("a@b.c!")]
    fn test_invalid_emails(#[case] email: &str) {
        let err = validate_new_student("Asha", email).unwrap_err();
        assert_eq!(err, invalid_email());
    }

    #[rstest]
    #[case::simple("asha@example.com")]
    #[case::subdomain("b.khan@mail.school.edu")]
    #[case::plus_tag("chen+boostly@example.org")]
    fn test_valid_emails(#[case] email: &str) {
        assert!(validate_new_student("Asha", email).is_ok());
    }

    #[test]
    fn test_malformed_email_is_not_registered() {
        let (_dir, store) = temp_store();
        let registry = StudentRegistry::new(store.clone());

        let err = registry.create_student("Asha", "a@b.c!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let students: i64 = store
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(students, 0);
    }

    #[test]
    fn test_reset_monthly_limits() {
        let (_dir, store) = temp_store();
        let registry = StudentRegistry::new(store.clone());
        let a = registry.create_student("Asha", "asha@example.com").unwrap();
        registry.create_student("Bilal", "bilal@example.com").unwrap();
        store
            .transaction(|conn| store::adjust_balances(conn, a.id, -60, 0, 60))
            .unwrap();

        assert_eq!(registry.reset_monthly_limits().unwrap(), 1);

        let after = store
            .with_conn(|conn| store::fetch_student(conn, a.id))
            .unwrap()
            .unwrap();
        assert_eq!(after.monthly_sending_limit_used, 0);
        assert_eq!(after.sending_balance, 40);
    }
}
