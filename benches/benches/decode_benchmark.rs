//! Decode and aggregation throughput.
//!
//! Run with: `cargo bench --package tickwell-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tickwell_aggregate::BarAggregator;
use tickwell_bench::{bi5_blob, fixture_hour, raw_payload};
use tickwell_fetch::{Payload, TickDecoder, decompress_bi5};
use tickwell_types::Tick;

/// Busy and quiet hours for EURUSD.
const HOUR_SIZES: [u32; 3] = [500, 5_000, 20_000];

fn decode_benchmark(c: &mut Criterion) {
    let decoder = TickDecoder::new(100_000);
    let hour = fixture_hour();
    let mut group = c.benchmark_group("decode");

    for count in HOUR_SIZES {
        group.throughput(Throughput::Elements(u64::from(count)));

        let raw = raw_payload(count);
        group.bench_with_input(BenchmarkId::new("records", count), &raw, |b, raw| {
            b.iter(|| {
                let payload = Payload::split(black_box(raw));
                decoder
                    .decode_all(&payload, hour)
                    .filter_map(Result::ok)
                    .count()
            });
        });

        let blob = bi5_blob(count);
        group.bench_with_input(BenchmarkId::new("blob", count), &blob, |b, blob| {
            b.iter(|| {
                let raw = decompress_bi5(black_box(blob)).unwrap();
                let payload = Payload::split(&raw);
                decoder
                    .decode_all(&payload, hour)
                    .filter_map(Result::ok)
                    .count()
            });
        });
    }

    group.finish();
}

fn aggregate_benchmark(c: &mut Criterion) {
    let decoder = TickDecoder::new(100_000);
    let raw = raw_payload(20_000);
    let payload = Payload::split(&raw);
    let ticks: Vec<Tick> = decoder
        .decode_all(&payload, fixture_hour())
        .filter_map(Result::ok)
        .collect();

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(ticks.len() as u64));

    for interval in ["1s", "1m", "1h"] {
        group.bench_with_input(BenchmarkId::from_parameter(interval), &ticks, |b, ticks| {
            b.iter(|| {
                let mut aggregator = BarAggregator::new(interval.parse().unwrap());
                let mut bars = ticks
                    .iter()
                    .filter_map(|tick| aggregator.process(tick))
                    .count();
                bars += usize::from(aggregator.flush().is_some());
                black_box(bars)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, decode_benchmark, aggregate_benchmark);
criterion_main!(benches);
