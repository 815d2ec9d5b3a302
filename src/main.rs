//! Boostly ledger CLI
//!
//! Command-line interface for the peer recognition credit ledger.
//!
//! # Usage
//!
//! ```bash
//! boostly --database boostly.db init
//! boostly add-student --name "Asha Rao" --email asha@example.com
//! boostly recognize --as 1 --to 2 --amount 25 --message "Great demo"
//! boostly endorse --as 3 --recognition 1
//! boostly redeem --as 2 --credits 20
//! boostly recognitions --receiver 2 > recognitions.csv
//! boostly import-recognitions batch.csv
//! RUST_LOG=debug boostly reset-monthly-limits
//! ```
//!
//! Command output goes to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (rejected operation, missing database, unreadable file, etc.)

use std::process;

use boostly_ledger::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let mut output = std::io::stdout().lock();
    let mut diagnostics = std::io::stderr();
    if let Err(e) = cli::run(&args, &mut output, &mut diagnostics) {
        eprintln!("Error ({}): {}", e.status_code(), e);
        process::exit(1);
    }
}
