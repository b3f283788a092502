use chain_core::{HashAlgorithm, ProofOfWork};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn bench_pow(c: &mut Criterion) {
    c.bench_function("mine_sha256_difficulty_3", |b| {
        let pow = ProofOfWork::new(HashAlgorithm::Sha256, 3);
        b.iter(|| pow.mine(black_box(100)));
    });

    c.bench_function("mine_keccak256_difficulty_3", |b| {
        let pow = ProofOfWork::new(HashAlgorithm::Keccak256, 3);
        b.iter(|| pow.mine(black_box(100)));
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
