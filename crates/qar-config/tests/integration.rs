//! Integration tests for qar-config.
//!
//! Presets go through files on disk and come back as running racks.

use qar_config::{
    ConfigError, RhythmPreset, SatelliteConfig, TrackConfig, ValidationError, factory_presets,
    get_factory_preset, list_presets_in, preset_name_from_path,
};
use qar_core::{Rack, RhythmEngine, TRACK_COUNT};
use tempfile::TempDir;

const CLOCK_FRAMES: usize = 100;

fn count_beats(rack: &mut Rack, frames: usize) -> [usize; TRACK_COUNT] {
    let mut beats = [0; TRACK_COUNT];
    for frame in 0..frames {
        let engine = rack.module_mut::<RhythmEngine>(0).unwrap();
        engine.inputs_mut().clock = if frame % CLOCK_FRAMES < 5 { 10.0 } else { 0.0 };
        rack.process_frame();
        let engine = rack.module::<RhythmEngine>(0).unwrap();
        for (count, events) in beats.iter_mut().zip(engine.events()) {
            if events.beat {
                *count += 1;
            }
        }
    }
    beats
}

#[test]
fn save_and_load_through_nested_directory() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("user").join("grooves").join("mine.toml");

    let preset = get_factory_preset("relay").unwrap();
    preset.save(&path).unwrap();
    assert!(path.is_file());

    let loaded = RhythmPreset::load(&path).unwrap();
    assert_eq!(loaded, preset);

    let listed = list_presets_in(path.parent().unwrap());
    assert_eq!(listed.len(), 1);
    assert_eq!(preset_name_from_path(&listed[0]).as_deref(), Some("mine"));
}

#[test]
fn loading_missing_file_names_the_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    let err = RhythmPreset::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn hand_edited_file_is_rejected_when_applied() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("edited.toml");
    std::fs::write(
        &path,
        r#"
name = "Edited"

[[tracks]]
steps = 32

[[satellites]]
kind = "delay"
"#,
    )
    .unwrap();

    let preset = RhythmPreset::load(&path).unwrap();
    let err = preset.build_rack().err().expect("build_rack should fail");
    let ConfigError::Validation(ValidationError::Multiple(errors)) = err else {
        panic!("expected multiple validation errors, got {err}");
    };
    assert_eq!(errors.len(), 2);
}

#[test]
fn every_factory_preset_runs() {
    for preset in factory_presets() {
        let mut rack = preset.build_rack().unwrap();
        let beats = count_beats(&mut rack, 40 * CLOCK_FRAMES);
        assert!(
            beats.iter().any(|&b| b > 0),
            "factory preset {} produced no beats",
            preset.name
        );
    }
}

#[test]
fn probability_zero_silences_only_its_track() {
    let preset = RhythmPreset::new("Silence")
        .with_track(TrackConfig::new(8, 4))
        .with_track(TrackConfig::new(8, 4))
        .with_track(TrackConfig::new(8, 0))
        .with_track(TrackConfig::new(8, 0))
        .with_satellite(SatelliteConfig {
            probability: vec![vec![0.0; 8]],
            ..SatelliteConfig::new("probability").with_enabled(&[true])
        });
    let mut rack = preset.build_rack().unwrap();
    let beats = count_beats(&mut rack, 32 * CLOCK_FRAMES);
    assert_eq!(beats[0], 0);
    assert!(beats[1] >= 12, "track 2 beats: {}", beats[1]);
}

#[test]
fn captured_rack_rebuilds_identically() {
    let original = get_factory_preset("shuffle").unwrap();
    let mut rack = original.build_rack().unwrap();
    count_beats(&mut rack, 10 * CLOCK_FRAMES);

    let captured = RhythmPreset::capture_rack("Shuffle copy", &rack).unwrap();
    assert_eq!(captured.engine, original.engine);
    assert_eq!(captured.tracks[..2], original.tracks[..]);
    assert_eq!(captured.satellites.len(), 1);
    let groove = &captured.satellites[0];
    assert_eq!(groove.amount, Some(0.8));
    assert_eq!(groove.swing[1][3], 0.3);

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("copy.toml");
    captured.save(&path).unwrap();
    let mut a = captured.build_rack().unwrap();
    let mut b = RhythmPreset::load(&path).unwrap().build_rack().unwrap();
    assert_eq!(
        count_beats(&mut a, 20 * CLOCK_FRAMES),
        count_beats(&mut b, 20 * CLOCK_FRAMES)
    );
}
