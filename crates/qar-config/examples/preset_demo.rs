//! Preset demo: factory presets, TOML output, validation and a short run of
//! a rack built from a preset.
//!
//! Run with: cargo run -p qar-config --example preset_demo

use qar_config::{
    RhythmPreset, TrackConfig, factory_preset_names, get_factory_preset, validate_preset,
};
use qar_core::{RhythmEngine, TRACK_COUNT};

fn main() {
    println!("=== Factory Presets ===\n");
    for id in factory_preset_names() {
        if let Some(preset) = get_factory_preset(id) {
            println!(
                "{:<14} {:<14} tracks: {}  satellites: {}",
                id,
                preset.name,
                preset.tracks.len(),
                preset.satellites.len()
            );
        }
    }

    println!("\n=== Shuffle as TOML ===\n");
    let Some(shuffle) = get_factory_preset("shuffle") else {
        return;
    };
    match shuffle.to_toml() {
        Ok(text) => println!("{text}"),
        Err(e) => println!("cannot serialize: {e}"),
    }

    println!("=== Validation ===\n");
    let broken = RhythmPreset::new("Broken").with_track(TrackConfig {
        pad: 30,
        algorithm: "fractal".to_string(),
        ..TrackConfig::new(24, 3)
    });
    match validate_preset(&broken) {
        Ok(()) => println!("valid"),
        Err(e) => println!("{e}"),
    }

    println!("\n=== Shuffle, 4 bars at 120 BPM ===\n");
    let mut rack = match shuffle.with_sample_rate(1000).build_rack() {
        Ok(rack) => rack,
        Err(e) => {
            println!("cannot build rack: {e}");
            return;
        }
    };

    // sixteenth notes at 120 BPM: 125 ms between clock edges
    let mut lines: [String; TRACK_COUNT] = Default::default();
    for frame in 0..8000 {
        if let Some(engine) = rack.module_mut::<RhythmEngine>(0) {
            engine.inputs_mut().clock = if frame % 125 < 5 { 10.0 } else { 0.0 };
        }
        rack.process_frame();
        if let Some(engine) = rack.module::<RhythmEngine>(0) {
            for (t, line) in lines.iter_mut().enumerate() {
                let events = engine.events()[t];
                if events.stepped {
                    line.push(match (events.beat, events.accent) {
                        (true, true) => 'X',
                        (true, false) => 'x',
                        _ => '.',
                    });
                }
                if events.end_of_cycle {
                    line.push('|');
                }
            }
        }
    }
    for (t, line) in lines.iter().enumerate() {
        println!("track {}: {}", t + 1, line);
    }
}
