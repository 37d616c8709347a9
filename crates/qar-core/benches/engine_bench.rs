//! Criterion benchmarks for qar-core
//!
//! Run with: cargo bench -p qar-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qar_core::{
    Algorithm, GrooveExpander, MAX_STEPS, Pattern, PatternParams, ProbabilityExpander, Rack,
    RhythmEngine, TrackParam,
};

const SAMPLE_RATE: f32 = 48000.0;
const FRAME_COUNTS: &[usize] = &[64, 256, 1024];

fn bench_pattern(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pattern");

    for algorithm in [Algorithm::Euclidean, Algorithm::GolombRuler] {
        group.bench_function(algorithm.name(), |b| {
            b.iter(|| {
                for steps in 1..=MAX_STEPS {
                    let params = PatternParams::new(steps, steps / 2)
                        .with_accents(steps / 4, 1)
                        .with_algorithm(algorithm);
                    black_box(Pattern::generate(black_box(&params)));
                }
            });
        });
    }

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("RhythmEngine");
    let dt = 1.0 / SAMPLE_RATE;
    let clock_frames = (SAMPLE_RATE * 0.125) as usize;

    for &frames in FRAME_COUNTS {
        group.bench_with_input(BenchmarkId::new("process", frames), &frames, |b, &frames| {
            let mut engine = RhythmEngine::new();
            engine.set_constant_time_master(1);
            for t in 0..4 {
                engine.set_knob(t, TrackParam::Steps, (7 + 3 * t) as f32);
            }
            let mut frame = 0usize;
            b.iter(|| {
                for _ in 0..frames {
                    engine.inputs_mut().clock = if frame % clock_frames < 48 { 10.0 } else { 0.0 };
                    engine.process(dt, None);
                    frame += 1;
                }
                black_box(engine.outputs());
            });
        });
    }

    group.finish();
}

fn bench_rack(c: &mut Criterion) {
    let mut group = c.benchmark_group("Rack");

    for &frames in FRAME_COUNTS {
        group.bench_with_input(
            BenchmarkId::new("engine_plus_two_satellites", frames),
            &frames,
            |b, &frames| {
                let mut rack = Rack::new(SAMPLE_RATE);
                rack.push(Box::new(RhythmEngine::new()));
                rack.push(Box::new(ProbabilityExpander::new()));
                rack.push(Box::new(GrooveExpander::new()));
                b.iter(|| {
                    rack.run(frames);
                    black_box(rack.frame());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pattern, bench_engine, bench_rack);
criterion_main!(benches);
