//! Per-step probability satellite.

use super::{EngineView, Satellite, sanitize};
use crate::bus::{ModuleKind, PROBABILITY_TABLE};
use crate::{MAX_STEPS, TRACK_COUNT};

/// Supplies a firing probability for every step of every enabled track.
///
/// A beat on a step with probability `p` fires when the engine's uniform draw
/// is below `p`. Steps default to 1.0, so an enabled track with untouched
/// values behaves exactly like no satellite.
#[derive(Clone, Debug)]
pub struct ProbabilityExpander {
    enabled: [bool; TRACK_COUNT],
    probability: [[f32; MAX_STEPS]; TRACK_COUNT],
    view: EngineView,
}

impl Default for ProbabilityExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbabilityExpander {
    /// All tracks disabled, every step at 1.0.
    pub fn new() -> Self {
        Self {
            enabled: [false; TRACK_COUNT],
            probability: [[1.0; MAX_STEPS]; TRACK_COUNT],
            view: EngineView::default(),
        }
    }

    /// Whether a track is supplied.
    pub fn enabled(&self, track: usize) -> bool {
        self.enabled.get(track).copied().unwrap_or(false)
    }

    /// Supply (or stop supplying) a track.
    pub fn set_enabled(&mut self, track: usize, enabled: bool) {
        if let Some(slot) = self.enabled.get_mut(track) {
            *slot = enabled;
        }
    }

    /// Probability of one step.
    pub fn probability(&self, track: usize, step: usize) -> f32 {
        self.probability
            .get(track)
            .and_then(|t| t.get(step))
            .copied()
            .unwrap_or(1.0)
    }

    /// Set one step, saturated into `0..=1`.
    pub fn set_probability(&mut self, track: usize, step: usize, probability: f32) {
        if let Some(slot) = self.probability.get_mut(track).and_then(|t| t.get_mut(step)) {
            *slot = sanitize(probability, 0.0, 1.0, 1.0);
        }
    }

    /// Set every step of a track. Missing values are left alone.
    pub fn set_track(&mut self, track: usize, values: &[f32]) {
        for (step, &p) in values.iter().enumerate().take(MAX_STEPS) {
            self.set_probability(track, step, p);
        }
    }

    /// Last engine layout seen.
    pub fn engine_view(&self) -> &EngineView {
        &self.view
    }
}

impl Satellite for ProbabilityExpander {
    const KIND: ModuleKind = ModuleKind::ProbabilityExpander;

    fn write_toward_engine(&self, msg: &mut [f32]) {
        for (track, values) in self.probability.iter().enumerate() {
            if self.enabled[track] {
                PROBABILITY_TABLE.write_track(msg, track, values);
            }
        }
    }

    fn engine_view_mut(&mut self) -> &mut EngineView {
        &mut self.view
    }
}

impl_rack_module!(ProbabilityExpander);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusMessage;

    #[test]
    fn values_saturate() {
        let mut sat = ProbabilityExpander::new();
        sat.set_probability(0, 0, 3.0);
        sat.set_probability(0, 1, -1.0);
        sat.set_probability(0, 2, f32::NAN);
        sat.set_probability(9, 0, 0.5);
        assert_eq!(sat.probability(0, 0), 1.0);
        assert_eq!(sat.probability(0, 1), 0.0);
        assert_eq!(sat.probability(0, 2), 1.0);
        assert_eq!(sat.probability(9, 0), 1.0);
    }

    #[test]
    fn only_enabled_tracks_are_written() {
        let mut sat = ProbabilityExpander::new();
        sat.set_track(1, &[0.5, 0.25]);
        sat.set_enabled(1, true);
        let mut msg = BusMessage::ZERO;
        sat.write_toward_engine(msg.as_mut_slice());
        assert_eq!(PROBABILITY_TABLE.read(msg.as_slice(), 1, 1), Some(0.25));
        assert_eq!(PROBABILITY_TABLE.read(msg.as_slice(), 1, 2), Some(1.0));
        assert!(!PROBABILITY_TABLE.is_enabled(msg.as_slice(), 0));
    }
}
