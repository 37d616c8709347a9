//! Pattern demo: Euclidean and Golomb patterns side by side, then a short
//! constant-time run of the engine.
//!
//! Run with: cargo run -p qar-core --example pattern_demo

use qar_core::{Algorithm, Pattern, PatternParams, RhythmEngine, TrackParam};

fn render(pattern: &Pattern) -> String {
    (0..pattern.steps())
        .map(|i| match (pattern.is_beat(i), pattern.is_accent(i)) {
            (true, true) => 'X',
            (true, false) => 'x',
            _ => '.',
        })
        .collect()
}

fn main() {
    println!("=== Patterns ===\n");
    println!("{:<10} {:>5} {:>4}  {:<18}  {:<18}", "", "Steps", "Div", "Euclidean", "Golomb");
    println!("{:-<10} {:->5} {:->4}  {:-<18}  {:-<18}", "", "", "", "", "");

    for (steps, division) in [(8, 3), (12, 5), (16, 4), (16, 6), (18, 7)] {
        let params = PatternParams::new(steps, division).with_accents(division / 2, 0);
        let euclid = Pattern::generate(&params);
        let golomb = Pattern::generate(&params.with_algorithm(Algorithm::GolombRuler));
        println!(
            "{:<10} {:>5} {:>4}  {:<18}  {:<18}",
            "",
            steps,
            division,
            render(&euclid),
            render(&golomb)
        );
    }

    println!("\n=== Constant time: 16 vs 7 steps over 2 seconds ===\n");

    let sample_rate = 1000.0;
    let mut engine = RhythmEngine::new();
    engine.set_knob(0, TrackParam::Steps, 16.0);
    engine.set_knob(1, TrackParam::Steps, 7.0);
    engine.set_knob(1, TrackParam::Division, 3.0);
    engine.set_constant_time_master(1);

    let mut lines = [String::new(), String::new()];
    for frame in 0..2200 {
        engine.inputs_mut().clock = if frame % 100 < 5 { 10.0 } else { 0.0 };
        engine.process(1.0 / sample_rate, None);
        for (t, line) in lines.iter_mut().enumerate() {
            let events = engine.events()[t];
            if events.stepped {
                line.push(if events.beat { 'x' } else { '.' });
            }
            if events.end_of_cycle {
                line.push('|');
            }
        }
    }
    for (t, line) in lines.iter().enumerate() {
        println!("track {}: {}", t + 1, line);
    }
}
