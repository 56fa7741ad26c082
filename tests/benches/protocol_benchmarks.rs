//! # Roadside Ledger Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | rl-01 Signatures | sign and verify canonical request bytes |
//! | rl-02 Ledger | append a chain, look up parents |
//! | shared-bus | reassemble chunked frames |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rl_01_signatures::{
    endorsement_from, verify_endorsed_message, SigningApi, SigningService, VerificationService,
};
use rl_02_ledger_store::Blockchain;
use shared_bus::{encode_frame, FrameBuffer};
use shared_types::{Block, EndorsementRequest, TransactionPayload, WireMessage, AGGREGATOR_ID};

fn request(tx_id: u64) -> EndorsementRequest {
    EndorsementRequest::new(TransactionPayload {
        peer_id: 1,
        tx_id,
        timestamp: 1_000 + tx_id,
        payment: 250.0,
        winner_id: 1,
    })
}

fn bench_signatures(c: &mut Criterion) {
    let mut group = c.benchmark_group("rl-01-signatures");
    let mut signer = SigningService::from_seed(1).unwrap();
    let verifier = VerificationService::new();
    let bytes = request(1).canonical_bytes().unwrap();

    group.bench_function("sign_message", |b| {
        b.iter(|| black_box(signer.sign_message(black_box(&bytes)).unwrap()))
    });

    let endorsement = endorsement_from(&signer.sign_message(&bytes).unwrap());
    group.bench_function("verify_endorsed_message", |b| {
        b.iter(|| black_box(verify_endorsed_message(&verifier, &endorsement, black_box(&bytes))))
    });

    group.bench_function("key_generation", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            black_box(SigningService::from_seed(seed).unwrap())
        })
    });
    group.finish();
}

fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("rl-02-ledger-store");
    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("append_chain", size), &size, |b, &size| {
            b.iter(|| {
                let mut chain = Blockchain::new();
                for height in 1..=size {
                    chain
                        .add_block(Block::new(height, AGGREGATOR_ID, AGGREGATOR_ID, height))
                        .unwrap();
                }
                black_box(chain.blockchain_height())
            })
        });
    }

    let mut rng = StdRng::seed_from_u64(3);
    let mut chain = Blockchain::new();
    for height in 1..=1_000u64 {
        chain
            .add_block(Block::new(height, rng.gen_range(0..4), rng.gen_range(0..4), height))
            .unwrap();
    }
    let top = chain.current_top_block().clone();
    group.bench_function("get_parent", |b| b.iter(|| black_box(chain.get_parent(black_box(&top)))));
    group.finish();
}

fn bench_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-bus-framing");
    let frames: Vec<u8> = (1..=100)
        .flat_map(|tx_id| encode_frame(&WireMessage::EndorsementRequest(request(tx_id))).unwrap())
        .collect();

    for chunk_size in [16usize, 256, 4096] {
        group.throughput(Throughput::Bytes(frames.len() as u64));
        group.bench_with_input(BenchmarkId::new("reassemble", chunk_size), &chunk_size, |b, &chunk_size| {
            b.iter(|| {
                let mut buffer = FrameBuffer::<u32>::new();
                let decoded: usize = frames
                    .chunks(chunk_size)
                    .map(|chunk| buffer.push(2, chunk).len())
                    .sum();
                black_box(decoded)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_signatures, bench_ledger, bench_framing);
criterion_main!(benches);
