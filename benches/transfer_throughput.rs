//! Benchmark suite for recognition throughput
//!
//! Compares executing the same set of recognitions one at a time through the
//! synchronous `LedgerEngine` against a concurrent `BatchProcessor` import,
//! using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Every iteration starts from a fresh database in a temporary directory with
//! `senders` students, each sending ten 10-credit recognitions to the next
//! student. Database setup is excluded from the measurement.

use boostly_ledger::{
    AsyncLedgerEngine, BatchProcessor, LedgerConfig, LedgerEngine, RecognitionRequest,
};
use tempfile::TempDir;

fn main() {
    divan::main();
}

const RECOGNITIONS_PER_SENDER: usize = 10;

struct Fixture {
    _dir: TempDir,
    config: LedgerConfig,
    requests: Vec<RecognitionRequest>,
}

fn fixture(senders: usize) -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = LedgerConfig::default().with_database(dir.path().join("bench.db"));
    let engine = LedgerEngine::open(&config).expect("Failed to open ledger");

    let ids: Vec<_> = (0..senders)
        .map(|i| {
            engine
                .create_student(&format!("Student {}", i), &format!("student{}@example.com", i))
                .expect("Failed to create student")
                .id
        })
        .collect();

    // Interleave senders the way a mixed import file would
    let mut requests = Vec::with_capacity(senders * RECOGNITIONS_PER_SENDER);
    for _ in 0..RECOGNITIONS_PER_SENDER {
        for (i, sender_id) in ids.iter().enumerate() {
            requests.push(RecognitionRequest {
                sender_id: *sender_id,
                receiver_id: ids[(i + 1) % ids.len()],
                amount: 10,
                message: Some("benchmark".to_string()),
            });
        }
    }

    Fixture {
        _dir: dir,
        config,
        requests,
    }
}

/// Execute every recognition sequentially on one thread
#[divan::bench(args = [2, 16])]
fn sequential_transfers(bencher: divan::Bencher, senders: usize) {
    bencher
        .with_inputs(|| fixture(senders))
        .bench_values(|fixture| {
            let engine = LedgerEngine::open(&fixture.config).expect("Failed to open ledger");
            for request in &fixture.requests {
                engine
                    .transfer(
                        request.sender_id,
                        request.receiver_id,
                        request.amount,
                        request.message.as_deref(),
                    )
                    .expect("Transfer failed");
            }
            fixture
        });
}

/// Execute the same recognitions as a batch import, concurrent across senders
#[divan::bench(args = [2, 16])]
fn batch_import(bencher: divan::Bencher, senders: usize) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .build()
        .expect("Failed to create tokio runtime");

    bencher
        .with_inputs(|| fixture(senders))
        .bench_values(|fixture| {
            let results = runtime.block_on(async {
                let engine =
                    AsyncLedgerEngine::open(&fixture.config).expect("Failed to open ledger");
                BatchProcessor::new(engine)
                    .process_batch(fixture.requests.clone())
                    .await
            });
            assert!(results.iter().all(|r| r.result.is_ok()));
            fixture
        });
}
