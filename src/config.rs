//! Ledger configuration
//!
//! Controls where the store lives, how long a connection waits for the write
//! lock, and how many requests the async facade runs at once.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Default time a connection waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration for the ledger store and its async facade
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// How long a connection waits for a competing writer to finish
    pub busy_timeout: Duration,
    /// Maximum number of requests executing concurrently in the async facade
    pub max_concurrent_requests: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("boostly.db"),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            max_concurrent_requests: num_cpus::get(),
        }
    }
}

impl LedgerConfig {
    /// Create a LedgerConfig with custom values
    ///
    /// Zero values are rejected with a warning and replaced by the defaults.
    pub fn new(
        database_path: impl Into<PathBuf>,
        busy_timeout_ms: u64,
        max_concurrent_requests: usize,
    ) -> Self {
        let default = Self::default();

        let busy_timeout = if busy_timeout_ms == 0 {
            warn!(
                "Invalid busy_timeout_ms ({}), using default ({})",
                busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS
            );
            default.busy_timeout
        } else {
            Duration::from_millis(busy_timeout_ms)
        };

        let max_concurrent_requests = if max_concurrent_requests == 0 {
            warn!(
                "Invalid max_concurrent_requests ({}), using default ({})",
                max_concurrent_requests, default.max_concurrent_requests
            );
            default.max_concurrent_requests
        } else {
            max_concurrent_requests
        };

        Self {
            database_path: database_path.into(),
            busy_timeout,
            max_concurrent_requests,
        }
    }

    /// Same configuration pointed at another database file
    pub fn with_database(mut self, database_path: impl Into<PathBuf>) -> Self {
        self.database_path = database_path.into();
        self
    }
}
