//! Criterion benchmarks for the chunk codec (encode/decode at each level).
//!
//! Run with:
//!   cargo bench --bench chunk
//!
//! Optionally set SILESIA_CORPUS_DIR to a directory of corpus files so the
//! benchmarks run against real-world data instead of synthetic lorem ipsum.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use zxc::chunk::{decode_chunk, encode_chunk};

mod corpus {
    include!("corpus.rs");
}

fn bench_chunk_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_encode_decode");
    let chunk_size = 262_144usize;
    let chunk = corpus::corpus_chunks(chunk_size).remove(0);

    for level in 1..=5u8 {
        group.throughput(Throughput::Bytes(chunk_size as u64));
        group.bench_with_input(BenchmarkId::new("encode", level), &chunk, |b, chunk| {
            b.iter(|| encode_chunk(chunk, level).unwrap())
        });

        let encoded = encode_chunk(&chunk, level).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", level), &encoded, |b, encoded| {
            b.iter(|| decode_chunk(encoded.block_type, &encoded.payload, encoded.raw_size as usize).unwrap())
        });
    }

    group.finish();
}

fn bench_chunk_numeric(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_numeric");
    let values: Vec<u32> = (0..65_536u32).map(|i| i.wrapping_mul(7)).collect();
    let chunk: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

    group.throughput(Throughput::Bytes(chunk.len() as u64));
    group.bench_function("encode_num", |b| b.iter(|| encode_chunk(&chunk, 3).unwrap()));

    let encoded = encode_chunk(&chunk, 3).unwrap();
    group.bench_function("decode_num", |b| {
        b.iter(|| decode_chunk(encoded.block_type, &encoded.payload, encoded.raw_size as usize).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_chunk_encode_decode, bench_chunk_numeric);
criterion_main!(benches);
