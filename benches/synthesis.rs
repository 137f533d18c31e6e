//! Benchmarks for integer and word construction.

use bracket_synth::intrinsic;
use bracket_synth::{Synthesizer, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn seeded() -> Synthesizer {
    let mut s = Synthesizer::new();
    for d in 0..=9 {
        s.register(intrinsic::digit(d).expect("digit")).expect("register digit");
    }
    for source in [
        intrinsic::false_(),
        intrinsic::true_(),
        intrinsic::undefined(),
        intrinsic::nan(),
    ] {
        s.register_letters(source, None).expect("register letters");
    }
    s
}

/// Integer construction from cached digits, by digit count
fn bench_integer(c: &mut Criterion) {
    let mut group = c.benchmark_group("integer");
    let s = seeded();

    for n in [7u64, 1_234, 90_071_992_547_409] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| s.integer(black_box(n)).expect("integer").len());
        });
    }

    group.finish();
}

/// Word construction, including the rendering of the result
fn bench_word(c: &mut Criterion) {
    let mut group = c.benchmark_group("word");

    for word in ["fun", "undefined", "definite"] {
        group.bench_with_input(BenchmarkId::from_parameter(word), &word, |b, &word| {
            let mut s = seeded();
            b.iter(|| s.word(black_box(word)).expect("word").compile());
        });
    }

    group.finish();
}

/// Registering and evaluating letters of a fresh text
fn bench_register_letters(c: &mut Criterion) {
    c.bench_function("register_letters/false", |b| {
        b.iter(|| {
            let mut s = Synthesizer::new();
            s.register_letters(intrinsic::false_(), None)
                .expect("register letters")
        });
    });
}

/// Evaluating synthesized text with the built-in interpreter
fn bench_evaluate(c: &mut Criterion) {
    let mut s = seeded();
    let text = s
        .synthesize(&Value::from("undefined"))
        .expect("synthesize")
        .compile();
    c.bench_function("evaluate/undefined", |b| {
        b.iter(|| bracket_synth::evaluate(black_box(&text)).expect("evaluate"));
    });
}

criterion_group!(
    benches,
    bench_integer,
    bench_word,
    bench_register_letters,
    bench_evaluate,
);
criterion_main!(benches);
