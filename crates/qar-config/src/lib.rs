//! Presets for the qar rhythm engine.
//!
//! A [`RhythmPreset`] is the persisted state of one engine and the satellites
//! chained to its right: engine settings, per-track knobs and algorithm, and
//! each satellite's tables. Presets are TOML files; a set of factory presets
//! is compiled in.
//!
//! # Example
//!
//! ```rust
//! use qar_config::{RhythmPreset, SatelliteConfig, TrackConfig};
//! use qar_core::{ModuleKind, RhythmEngine};
//!
//! let preset = RhythmPreset::new("Sparse")
//!     .with_track(TrackConfig::new(8, 3))
//!     .with_satellite(SatelliteConfig {
//!         probability: vec![vec![1.0, 0.0, 1.0]],
//!         ..SatelliteConfig::new("probability").with_enabled(&[true])
//!     });
//!
//! let text = preset.to_toml().unwrap();
//! let loaded = RhythmPreset::from_toml(&text).unwrap();
//!
//! let rack = loaded.build_rack().unwrap();
//! assert_eq!(rack.kind_at(1), Some(ModuleKind::ProbabilityExpander));
//! let engine = rack.module::<RhythmEngine>(0).unwrap();
//! assert_eq!(engine.track(0).unwrap().steps(), 8);
//! ```

mod error;
mod preset;

/// Preset directories and lookup.
#[cfg(feature = "std")]
pub mod paths;

/// Preset validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
#[cfg(feature = "std")]
pub use paths::{
    ensure_user_presets_dir, find_preset, list_all_presets, list_presets_in,
    preset_name_from_path, resolve_preset, system_presets_dir, user_config_dir,
    user_presets_dir,
};
pub use preset::{EngineConfig, RhythmPreset, SatelliteConfig, TrackConfig};
pub use validation::{
    SATELLITE_KINDS, ValidationError, ValidationResult, parse_algorithm, parse_chain_mode,
    parse_reset_mode, parse_satellite_kind, satellite_kind_name, validate_preset,
};
