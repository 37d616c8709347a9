//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use qar_core::{
    BeatRotatorExpander, EngineSettings, GrooveExpander, MAX_STEPS, ModuleKind,
    PassthroughExpander, ProbabilityExpander, Rack, RackModule, RandomSource, RhythmEngine,
    TRACK_COUNT, Track, TrackParam,
};

use crate::error::ConfigError;
use crate::validation::{
    ValidationResult, parse_algorithm, parse_chain_mode, parse_reset_mode, parse_satellite_kind,
    validate_preset,
};

/// Saved state of one rhythm engine and the satellites to its right.
///
/// # TOML Format
///
/// ```toml
/// name = "Tresillo"
/// description = "3 against 8 with an accent on the downbeat"
/// sample_rate = 48000
///
/// [engine]
/// chain_mode = "none"
/// constant_time_master = 0
/// muted = false
/// reset_mode = "first"
///
/// [[tracks]]
/// steps = 8
/// division = 3
/// accents = 1
/// algorithm = "euclidean"
///
/// [[satellites]]
/// kind = "probability"
/// enabled = [true]
/// probability = [[1.0, 1.0, 0.5]]
/// ```
///
/// Tracks missing from the file take their defaults when applied. Satellites
/// are listed left to right, starting with the one touching the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RhythmPreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate hint for the rack (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Engine-wide settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-track knobs, at most four.
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,

    /// Satellites, left to right.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub satellites: Vec<SatelliteConfig>,
}

fn default_sample_rate() -> u32 {
    48000
}

/// `[engine]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// `none`, `boss` or `employee`.
    pub chain_mode: String,
    /// Constant-time master track, 1-based; 0 disables.
    pub constant_time_master: u32,
    /// Suppress beat and accent outputs.
    pub muted: bool,
    /// `first` or `pre-first`.
    pub reset_mode: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(EngineSettings::default())
    }
}

impl EngineConfig {
    /// Describe live engine settings.
    pub fn from_settings(settings: EngineSettings) -> Self {
        Self {
            chain_mode: settings.chain_mode.name().to_string(),
            constant_time_master: settings.constant_time_master as u32,
            muted: settings.muted,
            reset_mode: settings.reset_mode.name().to_string(),
        }
    }

    /// Parse into engine settings.
    pub fn settings(&self) -> ValidationResult<EngineSettings> {
        Ok(EngineSettings {
            chain_mode: parse_chain_mode(&self.chain_mode)?,
            constant_time_master: self.constant_time_master as usize,
            muted: self.muted,
            reset_mode: parse_reset_mode(&self.reset_mode)?,
        })
    }
}

/// One `[[tracks]]` entry: stored knob positions and the algorithm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackConfig {
    /// Total steps.
    pub steps: u32,
    /// Beats per cycle.
    pub division: u32,
    /// Beat rotation.
    pub offset: u32,
    /// Leading silent steps.
    pub pad: u32,
    /// Accent count.
    pub accents: u32,
    /// Accent rotation.
    pub accent_rotation: u32,
    /// `euclidean` or `golomb`.
    pub algorithm: String,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self::from_track(&Track::new())
    }
}

impl TrackConfig {
    /// A track with the given length and beat count, everything else default.
    pub fn new(steps: u32, division: u32) -> Self {
        Self {
            steps,
            division,
            ..Self::default()
        }
    }

    /// Describe a live track.
    pub fn from_track(track: &Track) -> Self {
        let knobs = track.knobs();
        let knob = |param: TrackParam| knobs.get(param).round().max(0.0) as u32;
        Self {
            steps: knob(TrackParam::Steps),
            division: knob(TrackParam::Division),
            offset: knob(TrackParam::Offset),
            pad: knob(TrackParam::Pad),
            accents: knob(TrackParam::Accents),
            accent_rotation: knob(TrackParam::AccentRotation),
            algorithm: track.algorithm().name().to_string(),
        }
    }

    /// Stored value of one control.
    pub fn knob(&self, param: TrackParam) -> u32 {
        match param {
            TrackParam::Steps => self.steps,
            TrackParam::Division => self.division,
            TrackParam::Offset => self.offset,
            TrackParam::Pad => self.pad,
            TrackParam::Accents => self.accents,
            TrackParam::AccentRotation => self.accent_rotation,
        }
    }
}

/// One `[[satellites]]` entry.
///
/// Which tables are read depends on `kind`: `probability` reads
/// `probability`, `groove` reads `swing` and `amount`, `rotator` reads
/// `rotation`, `passthrough` reads nothing. Every kind but passthrough reads
/// `enabled`. Short tables leave the remaining tracks and steps at their
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SatelliteConfig {
    /// Satellite kind name.
    pub kind: String,

    /// Per-track enable flags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled: Vec<bool>,

    /// Per-track, per-step probabilities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub probability: Vec<Vec<f32>>,

    /// Per-track, per-step swing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub swing: Vec<Vec<f32>>,

    /// Global groove amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f32>,

    /// Per-track rotation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotation: Vec<u32>,
}

impl SatelliteConfig {
    /// An entry of the given kind with every table empty.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            enabled: Vec::new(),
            probability: Vec::new(),
            swing: Vec::new(),
            amount: None,
            rotation: Vec::new(),
        }
    }

    /// Enable the given tracks.
    pub fn with_enabled(mut self, enabled: &[bool]) -> Self {
        self.enabled = enabled.to_vec();
        self
    }

    fn enabled_flags(enabled: impl Fn(usize) -> bool) -> Vec<bool> {
        (0..TRACK_COUNT).map(enabled).collect()
    }

    fn step_table(value: impl Fn(usize, usize) -> f32) -> Vec<Vec<f32>> {
        (0..TRACK_COUNT)
            .map(|t| (0..MAX_STEPS).map(|s| value(t, s)).collect())
            .collect()
    }

    /// Describe a live probability satellite.
    pub fn from_probability(sat: &ProbabilityExpander) -> Self {
        Self {
            enabled: Self::enabled_flags(|t| sat.enabled(t)),
            probability: Self::step_table(|t, s| sat.probability(t, s)),
            ..Self::new("probability")
        }
    }

    /// Describe a live groove satellite.
    pub fn from_groove(sat: &GrooveExpander) -> Self {
        Self {
            enabled: Self::enabled_flags(|t| sat.enabled(t)),
            swing: Self::step_table(|t, s| sat.swing(t, s)),
            amount: Some(sat.amount()),
            ..Self::new("groove")
        }
    }

    /// Describe a live rotator satellite.
    pub fn from_rotator(sat: &BeatRotatorExpander) -> Self {
        Self {
            enabled: Self::enabled_flags(|t| sat.enabled(t)),
            rotation: (0..TRACK_COUNT).map(|t| sat.rotation(t) as u32).collect(),
            ..Self::new("rotator")
        }
    }

    /// Describe the satellite in a rack slot, if it is one presets know.
    pub fn from_rack(rack: &Rack, slot: usize) -> Option<Self> {
        match rack.kind_at(slot)? {
            ModuleKind::ProbabilityExpander => rack
                .module::<ProbabilityExpander>(slot)
                .map(Self::from_probability),
            ModuleKind::GrooveExpander => rack.module::<GrooveExpander>(slot).map(Self::from_groove),
            ModuleKind::BeatRotatorExpander => rack
                .module::<BeatRotatorExpander>(slot)
                .map(Self::from_rotator),
            ModuleKind::PassthroughExpander => Some(Self::new("passthrough")),
            _ => None,
        }
    }

    /// Construct the satellite this entry describes.
    pub fn build(&self) -> ValidationResult<Box<dyn RackModule>> {
        let kind = parse_satellite_kind(&self.kind)?;
        let module: Box<dyn RackModule> = match kind {
            ModuleKind::ProbabilityExpander => {
                let mut sat = ProbabilityExpander::new();
                for (track, values) in self.probability.iter().enumerate() {
                    sat.set_track(track, values);
                }
                for (track, &on) in self.enabled.iter().enumerate() {
                    sat.set_enabled(track, on);
                }
                Box::new(sat)
            }
            ModuleKind::GrooveExpander => {
                let mut sat = GrooveExpander::new();
                for (track, values) in self.swing.iter().enumerate() {
                    sat.set_track(track, values);
                }
                if let Some(amount) = self.amount {
                    sat.set_amount(amount);
                }
                for (track, &on) in self.enabled.iter().enumerate() {
                    sat.set_enabled(track, on);
                }
                Box::new(sat)
            }
            ModuleKind::BeatRotatorExpander => {
                let mut sat = BeatRotatorExpander::new();
                for (track, &rotation) in self.rotation.iter().enumerate() {
                    sat.set_rotation(track, rotation as usize);
                }
                for (track, &on) in self.enabled.iter().enumerate() {
                    sat.set_enabled(track, on);
                }
                Box::new(sat)
            }
            _ => Box::new(PassthroughExpander::new()),
        };
        Ok(module)
    }
}

impl RhythmPreset {
    /// Create a preset with default engine settings and no tracks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            engine: EngineConfig::default(),
            tracks: Vec::new(),
            satellites: Vec::new(),
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate hint.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Append a track.
    pub fn with_track(mut self, track: TrackConfig) -> Self {
        self.tracks.push(track);
        self
    }

    /// Append a satellite to the right of the existing ones.
    pub fn with_satellite(mut self, satellite: SatelliteConfig) -> Self {
        self.satellites.push(satellite);
        self
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Describe a live engine. Satellites are left empty.
    pub fn capture<R: RandomSource>(name: impl Into<String>, engine: &RhythmEngine<R>) -> Self {
        Self {
            engine: EngineConfig::from_settings(engine.settings()),
            tracks: engine.tracks().iter().map(TrackConfig::from_track).collect(),
            ..Self::new(name)
        }
    }

    /// Describe a rack laid out the way [`RhythmPreset::build_rack`] builds
    /// one: the engine in slot 0, satellites to its right.
    pub fn capture_rack(name: impl Into<String>, rack: &Rack) -> Result<Self, ConfigError> {
        let engine = rack
            .module::<RhythmEngine>(0)
            .ok_or(ConfigError::UnsupportedModule { slot: 0 })?;
        let mut preset = Self::capture(name, engine);
        preset.sample_rate = rack.context().sample_rate.round() as u32;
        for slot in 1..rack.len() {
            let sat = SatelliteConfig::from_rack(rack, slot)
                .ok_or(ConfigError::UnsupportedModule { slot })?;
            preset.satellites.push(sat);
        }
        Ok(preset)
    }

    /// Validate, then load settings and knobs into an engine.
    ///
    /// Tracks beyond those listed are reset to their defaults. Playback
    /// state (cursors, clock estimate) is left alone.
    pub fn apply<R: RandomSource>(&self, engine: &mut RhythmEngine<R>) -> Result<(), ConfigError> {
        validate_preset(self)?;
        engine.apply_settings(self.engine.settings()?);
        let defaults = TrackConfig::default();
        for index in 0..TRACK_COUNT {
            let track = self.tracks.get(index).unwrap_or(&defaults);
            for param in TrackParam::ALL {
                engine.set_knob(index, param, track.knob(param) as f32);
            }
            engine.set_algorithm(index, parse_algorithm(&track.algorithm)?);
        }
        Ok(())
    }

    /// Validate, then build a rack: the engine in slot 0 and every satellite
    /// to its right in listed order.
    pub fn build_rack(&self) -> Result<Rack, ConfigError> {
        let mut engine = RhythmEngine::new();
        self.apply(&mut engine)?;

        let mut rack = Rack::new(self.sample_rate as f32);
        rack.push(Box::new(engine));
        for sat in &self.satellites {
            rack.push(sat.build()?);
        }
        Ok(rack)
    }
}

impl Default for RhythmPreset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qar_core::{Algorithm, ChainMode, ResetMode};

    #[test]
    fn test_preset_new() {
        let preset = RhythmPreset::new("Test Preset");
        assert_eq!(preset.name, "Test Preset");
        assert!(preset.description.is_none());
        assert_eq!(preset.sample_rate, 48000);
        assert_eq!(preset.engine.chain_mode, "none");
        assert_eq!(preset.engine.reset_mode, "first");
        assert!(preset.tracks.is_empty());
    }

    #[test]
    fn track_defaults_follow_engine() {
        let track = TrackConfig::default();
        assert_eq!(track.steps, 16);
        assert_eq!(track.division, 4);
        assert_eq!(track.algorithm, "euclidean");
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let preset = RhythmPreset::from_toml(
            r#"
name = "Short"

[[tracks]]
steps = 8
division = 3
"#,
        )
        .unwrap();
        assert_eq!(preset.sample_rate, 48000);
        assert_eq!(preset.engine, EngineConfig::default());
        assert_eq!(preset.tracks[0].steps, 8);
        assert_eq!(preset.tracks[0].pad, 0);
        assert_eq!(preset.tracks[0].algorithm, "euclidean");
        assert!(preset.satellites.is_empty());
    }

    #[test]
    fn toml_round_trip() {
        let preset = RhythmPreset::new("Round")
            .with_description("trip")
            .with_track(TrackConfig::new(7, 2))
            .with_satellite(SatelliteConfig {
                swing: vec![vec![0.0, 0.25]],
                amount: Some(0.5),
                ..SatelliteConfig::new("groove").with_enabled(&[true])
            });
        let text = preset.to_toml().unwrap();
        assert!(text.contains("[[satellites]]"));
        assert!(!text.contains("rotation = []"));
        assert_eq!(RhythmPreset::from_toml(&text).unwrap(), preset);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = RhythmPreset::from_toml("name = ").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn apply_sets_engine_and_tracks() {
        let mut preset = RhythmPreset::new("Apply").with_track(TrackConfig {
            offset: 2,
            algorithm: "golomb".to_string(),
            ..TrackConfig::new(12, 4)
        });
        preset.engine.chain_mode = "boss".to_string();
        preset.engine.constant_time_master = 1;
        preset.engine.reset_mode = "pre-first".to_string();

        let mut engine = RhythmEngine::new();
        engine.set_knob(3, TrackParam::Steps, 5.0);
        preset.apply(&mut engine).unwrap();

        let settings = engine.settings();
        assert_eq!(settings.chain_mode, ChainMode::Boss);
        assert_eq!(settings.constant_time_master, 1);
        assert_eq!(settings.reset_mode, ResetMode::PreFirstStep);

        let track = engine.track(0).unwrap();
        assert_eq!(track.knobs().steps, 12.0);
        assert_eq!(track.knobs().offset, 2.0);
        assert_eq!(track.algorithm(), Algorithm::GolombRuler);
        // unlisted tracks return to defaults
        assert_eq!(engine.track(3).unwrap().knobs().steps, 16.0);
    }

    #[test]
    fn apply_rejects_invalid_and_leaves_engine_alone() {
        let mut preset = RhythmPreset::new("Bad");
        preset.engine.chain_mode = "manager".to_string();
        let mut engine = RhythmEngine::new();
        engine.set_muted(true);
        let err = preset.apply(&mut engine).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(engine.is_muted());
    }

    #[test]
    fn capture_then_apply_reproduces_engine() {
        let mut engine = RhythmEngine::new();
        engine.set_knob(1, TrackParam::Steps, 9.0);
        engine.set_knob(1, TrackParam::Accents, 2.0);
        engine.set_algorithm(2, Algorithm::GolombRuler);
        engine.set_muted(true);
        let preset = RhythmPreset::capture("Snapshot", &engine);
        assert_eq!(preset.tracks.len(), TRACK_COUNT);
        assert!(preset.engine.muted);

        let mut other = RhythmEngine::new();
        preset.apply(&mut other).unwrap();
        assert_eq!(other.settings(), engine.settings());
        for (a, b) in engine.tracks().iter().zip(other.tracks()) {
            assert_eq!(a.knobs(), b.knobs());
            assert_eq!(a.algorithm(), b.algorithm());
        }
    }

    #[test]
    fn satellites_build_from_tables() {
        let sat = SatelliteConfig {
            probability: vec![vec![0.5, 0.25]],
            ..SatelliteConfig::new("probability").with_enabled(&[true, false])
        };
        let module = sat.build().unwrap();
        assert_eq!(module.kind(), ModuleKind::ProbabilityExpander);
        let prob = module
            .as_any()
            .downcast_ref::<ProbabilityExpander>()
            .unwrap();
        assert!(prob.enabled(0));
        assert!(!prob.enabled(1));
        assert_eq!(prob.probability(0, 1), 0.25);
        assert_eq!(prob.probability(0, 2), 1.0);

        let rot = SatelliteConfig {
            rotation: vec![0, 3],
            ..SatelliteConfig::new("rotator")
        };
        let module = rot.build().unwrap();
        let rot = module
            .as_any()
            .downcast_ref::<BeatRotatorExpander>()
            .unwrap();
        assert_eq!(rot.rotation(1), 3);

        assert!(SatelliteConfig::new("flanger").build().is_err());
    }

    #[test]
    fn rack_round_trip() {
        let preset = RhythmPreset::new("Rack")
            .with_sample_rate(44100)
            .with_track(TrackConfig::new(8, 3))
            .with_satellite(SatelliteConfig::new("passthrough"))
            .with_satellite(SatelliteConfig {
                swing: vec![vec![0.0, 0.5]],
                amount: Some(0.8),
                ..SatelliteConfig::new("groove").with_enabled(&[true])
            });
        let rack = preset.build_rack().unwrap();
        assert_eq!(rack.len(), 3);
        assert_eq!(rack.kind_at(0), Some(ModuleKind::RhythmEngine));
        assert_eq!(rack.kind_at(2), Some(ModuleKind::GrooveExpander));

        let captured = RhythmPreset::capture_rack("Rack", &rack).unwrap();
        assert_eq!(captured.sample_rate, 44100);
        assert_eq!(captured.tracks[0].steps, 8);
        assert_eq!(captured.satellites[0].kind, "passthrough");
        let groove = &captured.satellites[1];
        assert_eq!(groove.amount, Some(0.8));
        assert_eq!(groove.swing[0][1], 0.5);
        assert_eq!(groove.enabled, vec![true, false, false, false]);
    }

    #[test]
    fn capture_rack_needs_engine_first() {
        let mut rack = Rack::new(48000.0);
        rack.push(Box::new(PassthroughExpander::new()));
        assert!(matches!(
            RhythmPreset::capture_rack("X", &rack),
            Err(ConfigError::UnsupportedModule { slot: 0 })
        ));
    }
}
