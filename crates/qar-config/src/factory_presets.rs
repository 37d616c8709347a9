//! Factory presets bundled with the library.
//!
//! These are embedded at compile time and always available. Each one is a
//! starting point that shows off one feature of the engine or its satellites.

use crate::RhythmPreset;

/// Internal identifiers of the factory presets, in listing order.
pub static FACTORY_PRESET_NAMES: &[&str] = &[
    "init",
    "tresillo",
    "golomb_drift",
    "polymeter",
    "shuffle",
    "chance_hats",
    "relay",
];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("tresillo", TRESILLO_PRESET),
    ("golomb_drift", GOLOMB_DRIFT_PRESET),
    ("polymeter", POLYMETER_PRESET),
    ("shuffle", SHUFFLE_PRESET),
    ("chance_hats", CHANCE_HATS_PRESET),
    ("relay", RELAY_PRESET),
];

const INIT_PRESET: &str = r#"
name = "Init"
description = "Four tracks of 16 steps, four beats each"

[[tracks]]
[[tracks]]
[[tracks]]
[[tracks]]
"#;

const TRESILLO_PRESET: &str = r#"
name = "Tresillo"
description = "3 against 8 over a four-on-the-floor pulse"

[engine]
reset_mode = "pre-first"

[[tracks]]
steps = 8
division = 3
accents = 1

[[tracks]]
steps = 16
division = 4

[[tracks]]
steps = 16
division = 5
accents = 2
accent_rotation = 1

[[tracks]]
steps = 12
division = 5
offset = 2
"#;

const GOLOMB_DRIFT_PRESET: &str = r#"
name = "Golomb Drift"
description = "Non-repeating onsets from Golomb rulers"

[[tracks]]
steps = 16
division = 4
algorithm = "golomb"

[[tracks]]
steps = 12
division = 3
algorithm = "golomb"

[[tracks]]
steps = 18
division = 5
accents = 2
algorithm = "golomb"

[[tracks]]
steps = 16
division = 4
"#;

const POLYMETER_PRESET: &str = r#"
name = "Polymeter"
description = "Constant-time cycles of 16, 7, 5 and 12 steps"

[engine]
constant_time_master = 1

[[tracks]]
steps = 16
division = 4

[[tracks]]
steps = 7
division = 3

[[tracks]]
steps = 5
division = 2

[[tracks]]
steps = 12
division = 5
accents = 1
"#;

const SHUFFLE_PRESET: &str = r#"
name = "Shuffle"
description = "Swung odd steps on the first two tracks"

[engine]
constant_time_master = 1

[[tracks]]
steps = 16
division = 8

[[tracks]]
steps = 16
division = 5
accents = 2

[[satellites]]
kind = "groove"
enabled = [true, true]
amount = 0.8
swing = [
    [0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3],
    [0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3, 0.0, 0.3],
]
"#;

const CHANCE_HATS_PRESET: &str = r#"
name = "Chance Hats"
description = "Every step a beat, thinned out by probability"

[[tracks]]
steps = 16
division = 4

[[tracks]]
steps = 16
division = 16
accents = 4

[[satellites]]
kind = "probability"
enabled = [false, true]
probability = [
    [],
    [1.0, 0.4, 0.7, 0.4, 1.0, 0.4, 0.7, 0.2, 1.0, 0.4, 0.7, 0.4, 1.0, 0.2, 0.7, 0.5],
]
"#;

const RELAY_PRESET: &str = r#"
name = "Relay"
description = "Boss mode: each track plays one cycle then waits for its start input"

[engine]
chain_mode = "boss"
reset_mode = "pre-first"

[[tracks]]
steps = 8
division = 3

[[tracks]]
steps = 12
division = 5

[[tracks]]
steps = 16
division = 6

[[tracks]]
steps = 10
division = 4

[[satellites]]
kind = "passthrough"

[[satellites]]
kind = "rotator"
enabled = [false, true]
rotation = [0, 3]
"#;

/// All factory presets, parsed.
pub fn factory_presets() -> Vec<RhythmPreset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| RhythmPreset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by identifier or display name, case-insensitive.
///
/// # Example
///
/// ```rust
/// use qar_config::get_factory_preset;
///
/// let preset = get_factory_preset("Golomb Drift").unwrap();
/// assert_eq!(preset.tracks[0].algorithm, "golomb");
/// ```
pub fn get_factory_preset(name: &str) -> Option<RhythmPreset> {
    if let Some((_, toml)) = FACTORY_PRESETS_TOML
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(name))
    {
        return RhythmPreset::from_toml(toml).ok();
    }
    factory_presets()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Identifiers of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// Whether a name matches a factory preset by identifier or display name.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_preset;

    #[test]
    fn every_factory_preset_parses_and_validates() {
        for (id, toml) in FACTORY_PRESETS_TOML {
            let preset = RhythmPreset::from_toml(toml)
                .unwrap_or_else(|e| panic!("factory preset {id} does not parse: {e}"));
            validate_preset(&preset)
                .unwrap_or_else(|e| panic!("factory preset {id} is invalid: {e}"));
        }
        assert_eq!(factory_presets().len(), FACTORY_PRESETS_TOML.len());
    }

    #[test]
    fn names_list_matches_table() {
        assert_eq!(factory_preset_names(), FACTORY_PRESET_NAMES.to_vec());
    }

    #[test]
    fn lookup_by_id_and_display_name() {
        assert_eq!(get_factory_preset("tresillo").unwrap().name, "Tresillo");
        assert_eq!(get_factory_preset("CHANCE HATS").unwrap().name, "Chance Hats");
        assert!(is_factory_preset("golomb_drift"));
        assert!(!is_factory_preset("my_custom_groove"));
    }

    #[test]
    fn factory_racks_build() {
        for preset in factory_presets() {
            let rack = preset.build_rack().unwrap();
            assert_eq!(rack.len(), 1 + preset.satellites.len());
        }
    }

    #[test]
    fn init_has_four_default_tracks() {
        let init = get_factory_preset("init").unwrap();
        assert_eq!(init.tracks.len(), 4);
        assert!(init.tracks.iter().all(|t| t.steps == 16 && t.division == 4));
    }
}
