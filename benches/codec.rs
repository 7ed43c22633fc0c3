//! OSC codec benchmark suite.
//!
//! Measures encode and decode of typical Bitwig traffic:
//! - single messages with 0, 1 and 4 arguments
//! - a bundle the size of one browser result window
//!
//! Run with: cargo bench --bench codec
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use bitwig_osc_bridge::protocol::{decode, decode_packet, encode, encode_bundle};
use bitwig_osc_bridge::{Message, OscType, address};

// ============================================================================
// Fixtures
// ============================================================================

fn messages() -> Vec<(&'static str, Message)> {
    vec![
        ("bare", Message::bare(address::PLAY)),
        ("float", Message::with_value(address::TEMPO, 128.0_f32)),
        (
            "mixed",
            Message::new(
                address::browser_result(7, "name"),
                vec![
                    OscType::from("Polymer"),
                    OscType::Int(1),
                    OscType::Bool(true),
                    OscType::Double(0.5),
                ],
            ),
        ),
    ]
}

fn result_window() -> Vec<Message> {
    (1..=address::BROWSER_WINDOW_SIZE)
        .map(|slot| Message::with_value(address::browser_result(slot, "name"), format!("Result {slot}")))
        .collect()
}

// ============================================================================
// Benchmark: Single Messages
// ============================================================================

fn bench_messages(c: &mut Criterion) {
    let mut group = c.benchmark_group("message");

    for (name, message) in messages() {
        let bytes = encode(&message);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", name), &message, |b, message| {
            b.iter(|| encode(black_box(message)));
        });
        group.bench_with_input(BenchmarkId::new("decode", name), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Result Window Bundle
// ============================================================================

fn bench_bundle(c: &mut Criterion) {
    let window = result_window();
    let bytes = encode_bundle(&window);

    let mut group = c.benchmark_group("bundle");
    group.throughput(Throughput::Elements(window.len() as u64));
    group.bench_function("encode", |b| b.iter(|| encode_bundle(black_box(&window))));
    group.bench_function("decode", |b| b.iter(|| decode_packet(black_box(&bytes))));
    group.finish();
}

criterion_group!(benches, bench_messages, bench_bundle);
criterion_main!(benches);
