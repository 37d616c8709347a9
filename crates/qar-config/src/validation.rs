//! Preset validation.
//!
//! The engine saturates anything it is given, so a hand-edited preset asking
//! for 40 steps would quietly play 18. Validation rejects such presets before
//! they are applied and reports every problem at once.
//!
//! # Example
//!
//! ```rust
//! use qar_config::{RhythmPreset, TrackConfig, validate_preset};
//!
//! let mut preset = RhythmPreset::new("Broken");
//! preset.tracks.push(TrackConfig { steps: 40, ..TrackConfig::default() });
//! assert!(validate_preset(&preset).is_err());
//! ```

use qar_core::{Algorithm, ChainMode, MAX_STEPS, ModuleKind, ResetMode, TRACK_COUNT, TrackParam};
use thiserror::Error;

use crate::preset::{EngineConfig, RhythmPreset, SatelliteConfig, TrackConfig};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside its allowed range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Path of the offending field.
        field: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Name that does not match any known option.
    #[error("unknown value '{value}' for '{field}'")]
    UnknownName {
        /// Path of the offending field.
        field: String,
        /// The unrecognized name.
        value: String,
    },

    /// Satellite kind that does not exist.
    #[error("unknown satellite kind: {0}")]
    UnknownSatellite(String),

    /// Table with more entries than the engine has room for.
    #[error("'{field}' has {len} entries, at most {max} allowed")]
    TableLength {
        /// Path of the offending table.
        field: String,
        /// Entries found.
        len: usize,
        /// Entries allowed.
        max: usize,
    },

    /// Table that the satellite kind does not read.
    #[error("'{field}' is not used by {kind} satellites")]
    UnexpectedField {
        /// Path of the offending table.
        field: String,
        /// Satellite kind name.
        kind: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Satellite kind names as they appear in preset files.
pub const SATELLITE_KINDS: [(&str, ModuleKind); 4] = [
    ("probability", ModuleKind::ProbabilityExpander),
    ("groove", ModuleKind::GrooveExpander),
    ("rotator", ModuleKind::BeatRotatorExpander),
    ("passthrough", ModuleKind::PassthroughExpander),
];

/// Parse a chain mode name.
pub fn parse_chain_mode(name: &str) -> ValidationResult<ChainMode> {
    ChainMode::from_name(name).ok_or_else(|| unknown_name("engine.chain_mode", name))
}

/// Parse a reset convention name.
pub fn parse_reset_mode(name: &str) -> ValidationResult<ResetMode> {
    ResetMode::from_name(name).ok_or_else(|| unknown_name("engine.reset_mode", name))
}

/// Parse an algorithm name.
pub fn parse_algorithm(name: &str) -> ValidationResult<Algorithm> {
    Algorithm::from_name(name).ok_or_else(|| unknown_name("algorithm", name))
}

/// Map a satellite kind name to the module kind it builds.
pub fn parse_satellite_kind(name: &str) -> ValidationResult<ModuleKind> {
    SATELLITE_KINDS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, kind)| kind)
        .ok_or_else(|| ValidationError::UnknownSatellite(name.to_string()))
}

/// Preset name of a satellite module kind.
pub fn satellite_kind_name(kind: ModuleKind) -> Option<&'static str> {
    SATELLITE_KINDS
        .iter()
        .find(|&&(_, k)| k == kind)
        .map(|&(name, _)| name)
}

fn unknown_name(field: &str, value: &str) -> ValidationError {
    ValidationError::UnknownName {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: String, value: f32, min: f32, max: f32) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
}

fn check_len(errors: &mut Vec<ValidationError>, field: String, len: usize, max: usize) {
    if len > max {
        errors.push(ValidationError::TableLength { field, len, max });
    }
}

fn validate_engine(engine: &EngineConfig, errors: &mut Vec<ValidationError>) {
    if let Err(e) = parse_chain_mode(&engine.chain_mode) {
        errors.push(e);
    }
    if let Err(e) = parse_reset_mode(&engine.reset_mode) {
        errors.push(e);
    }
    check_range(
        errors,
        "engine.constant_time_master".to_string(),
        engine.constant_time_master as f32,
        0.0,
        TRACK_COUNT as f32,
    );
}

fn validate_track(index: usize, track: &TrackConfig, errors: &mut Vec<ValidationError>) {
    for param in TrackParam::ALL {
        let desc = param.descriptor();
        check_range(
            errors,
            format!("tracks[{index}].{}", desc.string_id),
            track.knob(param) as f32,
            desc.min,
            desc.max,
        );
    }
    if Algorithm::from_name(&track.algorithm).is_none() {
        errors.push(unknown_name(
            &format!("tracks[{index}].algorithm"),
            &track.algorithm,
        ));
    }
}

fn validate_step_table(
    errors: &mut Vec<ValidationError>,
    field: &str,
    table: &[Vec<f32>],
    min: f32,
    max: f32,
) {
    check_len(errors, field.to_string(), table.len(), TRACK_COUNT);
    for (track, values) in table.iter().enumerate() {
        check_len(errors, format!("{field}[{track}]"), values.len(), MAX_STEPS);
        for (step, &value) in values.iter().enumerate() {
            check_range(errors, format!("{field}[{track}][{step}]"), value, min, max);
        }
    }
}

fn validate_satellite(index: usize, sat: &SatelliteConfig, errors: &mut Vec<ValidationError>) {
    let kind = match parse_satellite_kind(&sat.kind) {
        Ok(kind) => kind,
        Err(e) => {
            errors.push(e);
            return;
        }
    };
    let prefix = format!("satellites[{index}]");
    let unexpected = |field: &str| ValidationError::UnexpectedField {
        field: format!("{prefix}.{field}"),
        kind: sat.kind.clone(),
    };

    check_len(errors, format!("{prefix}.enabled"), sat.enabled.len(), TRACK_COUNT);

    if kind == ModuleKind::ProbabilityExpander {
        validate_step_table(errors, &format!("{prefix}.probability"), &sat.probability, 0.0, 1.0);
    } else if !sat.probability.is_empty() {
        errors.push(unexpected("probability"));
    }

    if kind == ModuleKind::GrooveExpander {
        validate_step_table(errors, &format!("{prefix}.swing"), &sat.swing, -1.0, 1.0);
        if let Some(amount) = sat.amount {
            check_range(errors, format!("{prefix}.amount"), amount, 0.0, 1.0);
        }
    } else {
        if !sat.swing.is_empty() {
            errors.push(unexpected("swing"));
        }
        if sat.amount.is_some() {
            errors.push(unexpected("amount"));
        }
    }

    if kind == ModuleKind::BeatRotatorExpander {
        check_len(errors, format!("{prefix}.rotation"), sat.rotation.len(), TRACK_COUNT);
        for (track, &rotation) in sat.rotation.iter().enumerate() {
            check_range(
                errors,
                format!("{prefix}.rotation[{track}]"),
                rotation as f32,
                0.0,
                (MAX_STEPS - 1) as f32,
            );
        }
    } else if !sat.rotation.is_empty() {
        errors.push(unexpected("rotation"));
    }
}

/// Validate every field of a preset, collecting all problems.
///
/// # Example
///
/// ```rust
/// use qar_config::{get_factory_preset, validate_preset};
///
/// let preset = get_factory_preset("tresillo").unwrap();
/// validate_preset(&preset).expect("factory presets are valid");
/// ```
pub fn validate_preset(preset: &RhythmPreset) -> ValidationResult<()> {
    let mut errors = Vec::new();

    check_range(
        &mut errors,
        "sample_rate".to_string(),
        preset.sample_rate as f32,
        1.0,
        768_000.0,
    );
    validate_engine(&preset.engine, &mut errors);
    check_len(&mut errors, "tracks".to_string(), preset.tracks.len(), TRACK_COUNT);
    for (i, track) in preset.tracks.iter().enumerate() {
        validate_track(i, track, &mut errors);
    }
    for (i, sat) in preset.satellites.iter().enumerate() {
        validate_satellite(i, sat, &mut errors);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
