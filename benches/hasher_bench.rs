//! Benchmarks for hash-walker
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

fn benchmark_queue_operations(c: &mut Criterion) {
    use hash_walker::runner::queue::{task_queue, Claim, HashTask};

    c.bench_function("task_queue_send_claim", |b| {
        let (sender, receiver) = task_queue(10_000);

        b.iter(|| {
            sender.send(HashTask::new("/test/path")).unwrap();
            match receiver.claim_timeout(Duration::from_millis(1)) {
                Claim::Task(task) => black_box(task),
                other => panic!("expected a task, got {other:?}"),
            };
        })
    });
}

fn benchmark_block_hashing(c: &mut Criterion) {
    use hash_walker::content::{hash_bytes, HashAlgorithm};

    let block = vec![0x5Au8; 64 * 1024];

    c.bench_function("hash_64k_sha256", |b| {
        b.iter(|| black_box(hash_bytes(HashAlgorithm::Sha256, &block)))
    });

    c.bench_function("hash_64k_blake3", |b| {
        b.iter(|| black_box(hash_bytes(HashAlgorithm::Blake3, &block)))
    });
}

criterion_group!(benches, benchmark_queue_operations, benchmark_block_hashing);
criterion_main!(benches);
