//! Per-track control descriptors and knob + CV resolution.
//!
//! Every per-track control is a stored knob value plus an optional additive
//! CV. A full-scale 10 V CV sweeps the whole range of the control. The sum is
//! rounded to a whole step, saturated into the descriptor range, and then the
//! cross-parameter invariants of [`PatternParams::clamped`] are applied.
//!
//! # Example
//!
//! ```rust
//! use qar_core::{Algorithm, TrackCv, TrackKnobs, resolve_track_params};
//!
//! let knobs = TrackKnobs { steps: 8.0, division: 3.0, ..TrackKnobs::default() };
//! let cv = TrackCv { division: 10.0, ..TrackCv::default() };
//!
//! // CV drives division far past the step count; it saturates.
//! let params = resolve_track_params(&knobs, &cv, Algorithm::Euclidean);
//! assert_eq!(params.division, 8);
//! ```

use libm::roundf;

use crate::pattern::{Algorithm, PatternParams};
use crate::MAX_STEPS;

/// Full-scale CV voltage that sweeps a control across its range.
pub const CV_FULL_SCALE_VOLTS: f32 = 10.0;

/// Identifies a per-track control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackParam {
    /// Total steps.
    Steps,
    /// Beats per cycle.
    Division,
    /// Beat rotation.
    Offset,
    /// Leading silent steps.
    Pad,
    /// Accent count.
    Accents,
    /// Accent rotation.
    AccentRotation,
}

impl TrackParam {
    /// Every control, in panel order.
    pub const ALL: [TrackParam; 6] = [
        TrackParam::Steps,
        TrackParam::Division,
        TrackParam::Offset,
        TrackParam::Pad,
        TrackParam::Accents,
        TrackParam::AccentRotation,
    ];

    /// Metadata for this control.
    pub const fn descriptor(self) -> ParamDescriptor {
        let max_steps = MAX_STEPS as f32;
        match self {
            TrackParam::Steps => ParamDescriptor::steps("Steps", "steps", 0.0, max_steps, 16.0),
            TrackParam::Division => {
                ParamDescriptor::steps("Divisions", "division", 0.0, max_steps, 4.0)
            }
            TrackParam::Offset => {
                ParamDescriptor::steps("Offset", "offset", 0.0, max_steps - 1.0, 0.0)
            }
            TrackParam::Pad => ParamDescriptor::steps("Pad", "pad", 0.0, max_steps - 1.0, 0.0),
            TrackParam::Accents => {
                ParamDescriptor::steps("Accents", "accents", 0.0, max_steps, 0.0)
            }
            TrackParam::AccentRotation => ParamDescriptor::steps(
                "Accent Rotation",
                "accent_rotation",
                0.0,
                max_steps - 1.0,
                0.0,
            ),
        }
    }

    /// Find a control by its string id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.descriptor().string_id.eq_ignore_ascii_case(id))
    }
}

/// Describes one control's range and CV response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Stable id used by presets.
    pub string_id: &'static str,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Value on init.
    pub default: f32,
    /// Units added per volt of CV.
    pub cv_scale: f32,
}

impl ParamDescriptor {
    /// Integer step-count control where full-scale CV covers the range.
    pub const fn steps(
        name: &'static str,
        string_id: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            string_id,
            min,
            max,
            default,
            cv_scale: (max - min) / CV_FULL_SCALE_VOLTS,
        }
    }

    /// Knob plus CV, rounded and saturated into range.
    pub fn combine(&self, knob: f32, cv_volts: f32) -> f32 {
        let raw = knob + cv_volts * self.cv_scale;
        if raw.is_nan() {
            return self.min;
        }
        roundf(raw).clamp(self.min, self.max)
    }

    /// Saturate a stored value into range without CV.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Stored knob positions for one track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackKnobs {
    /// Total steps.
    pub steps: f32,
    /// Beats per cycle.
    pub division: f32,
    /// Beat rotation.
    pub offset: f32,
    /// Leading silent steps.
    pub pad: f32,
    /// Accent count.
    pub accents: f32,
    /// Accent rotation.
    pub accent_rotation: f32,
}

impl Default for TrackKnobs {
    fn default() -> Self {
        Self {
            steps: TrackParam::Steps.descriptor().default,
            division: TrackParam::Division.descriptor().default,
            offset: TrackParam::Offset.descriptor().default,
            pad: TrackParam::Pad.descriptor().default,
            accents: TrackParam::Accents.descriptor().default,
            accent_rotation: TrackParam::AccentRotation.descriptor().default,
        }
    }
}

impl TrackKnobs {
    /// Read a control.
    pub fn get(&self, param: TrackParam) -> f32 {
        match param {
            TrackParam::Steps => self.steps,
            TrackParam::Division => self.division,
            TrackParam::Offset => self.offset,
            TrackParam::Pad => self.pad,
            TrackParam::Accents => self.accents,
            TrackParam::AccentRotation => self.accent_rotation,
        }
    }

    /// Write a control, saturated into its range.
    pub fn set(&mut self, param: TrackParam, value: f32) {
        let value = param.descriptor().clamp(value);
        match param {
            TrackParam::Steps => self.steps = value,
            TrackParam::Division => self.division = value,
            TrackParam::Offset => self.offset = value,
            TrackParam::Pad => self.pad = value,
            TrackParam::Accents => self.accents = value,
            TrackParam::AccentRotation => self.accent_rotation = value,
        }
    }
}

/// CV voltages patched into one track's control inputs. Unpatched is 0 V.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackCv {
    /// Steps CV.
    pub steps: f32,
    /// Division CV.
    pub division: f32,
    /// Offset CV.
    pub offset: f32,
    /// Pad CV.
    pub pad: f32,
    /// Accent count CV.
    pub accents: f32,
    /// Accent rotation CV.
    pub accent_rotation: f32,
}

impl TrackCv {
    /// Read a CV input.
    pub fn get(&self, param: TrackParam) -> f32 {
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

/// Combine knobs and CV into clamped pattern parameters.
pub fn resolve_track_params(knobs: &TrackKnobs, cv: &TrackCv, algorithm: Algorithm) -> PatternParams {
    let value = |param: TrackParam| {
        param
            .descriptor()
            .combine(knobs.get(param), cv.get(param)) as usize
    };
    PatternParams {
        steps: value(TrackParam::Steps),
        division: value(TrackParam::Division),
        offset: value(TrackParam::Offset),
        pad: value(TrackParam::Pad),
        accents: value(TrackParam::Accents),
        accent_rotation: value(TrackParam::AccentRotation),
        algorithm,
    }
    .clamped()
}
