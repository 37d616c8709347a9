//! State of one of the engine's four tracks.

use crate::bus::{PROBABILITY_TABLE, RotationTable, SWING_TABLE};
use crate::chain::{ChainController, ChainMode, RunState};
use crate::clock::TrackClock;
use crate::param::{TrackCv, TrackKnobs, resolve_track_params};
use crate::pattern::{Algorithm, Pattern, PatternParams};
use crate::trigger::{PULSE_WIDTH_SECONDS, PulseGenerator, SchmittTrigger, gate_volts};
use crate::MAX_STEPS;

/// Where the cursor lands after a reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResetMode {
    /// Cursor at step 0; the next advance moves to step 1.
    #[default]
    FirstStep,
    /// Cursor at -1; the next advance lands on step 0 and fires it.
    PreFirstStep,
}

impl ResetMode {
    /// Cursor value after reset.
    pub fn index(self) -> i32 {
        match self {
            ResetMode::FirstStep => 0,
            ResetMode::PreFirstStep => -1,
        }
    }

    /// Stable name used by presets and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            ResetMode::FirstStep => "first",
            ResetMode::PreFirstStep => "pre-first",
        }
    }

    /// Parse a stable name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "first" => Some(ResetMode::FirstStep),
            "pre-first" => Some(ResetMode::PreFirstStep),
            _ => None,
        }
    }
}

/// Output voltages of one track for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackOutputs {
    /// Beat pulse.
    pub beat: f32,
    /// Accent pulse.
    pub accent: f32,
    /// End-of-cycle pulse.
    pub end_of_cycle: f32,
}

/// Pulses started by one track during the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackEvents {
    /// The cursor moved.
    pub stepped: bool,
    /// A beat pulse started.
    pub beat: bool,
    /// An accent pulse started.
    pub accent: bool,
    /// The cursor wrapped past the last step.
    pub end_of_cycle: bool,
}

/// Knobs, pattern, modifiers, cursor and timing of one track.
#[derive(Clone, Debug)]
pub struct Track {
    knobs: TrackKnobs,
    algorithm: Algorithm,
    params: PatternParams,
    pattern: Pattern,
    probability: [f32; MAX_STEPS],
    swing: [f32; MAX_STEPS],
    rotation: usize,
    beat_index: i32,
    pub(crate) clock: TrackClock,
    pub(crate) chain: ChainController,
    start_connected: bool,
    pub(crate) algorithm_trigger: SchmittTrigger,
    pub(crate) start_trigger: SchmittTrigger,
    beat_pulse: PulseGenerator,
    accent_pulse: PulseGenerator,
    eoc_pulse: PulseGenerator,
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl Track {
    /// A track at default knob positions with its pattern generated.
    pub fn new() -> Self {
        let knobs = TrackKnobs::default();
        let params = resolve_track_params(&knobs, &TrackCv::default(), Algorithm::default());
        Self {
            knobs,
            algorithm: Algorithm::default(),
            params,
            pattern: Pattern::generate(&params),
            probability: [1.0; MAX_STEPS],
            swing: [0.0; MAX_STEPS],
            rotation: 0,
            beat_index: 0,
            clock: TrackClock::new(),
            chain: ChainController::new(),
            start_connected: false,
            algorithm_trigger: SchmittTrigger::default(),
            start_trigger: SchmittTrigger::default(),
            beat_pulse: PulseGenerator::new(),
            accent_pulse: PulseGenerator::new(),
            eoc_pulse: PulseGenerator::new(),
        }
    }

    /// Stored knob positions.
    pub fn knobs(&self) -> &TrackKnobs {
        &self.knobs
    }

    /// Mutable knob positions. Takes effect on the next frame.
    pub fn knobs_mut(&mut self) -> &mut TrackKnobs {
        &mut self.knobs
    }

    /// Selected algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Select an algorithm. Takes effect on the next frame.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    /// Flip between Euclidean and Golomb.
    pub fn toggle_algorithm(&mut self) {
        self.algorithm = self.algorithm.toggled();
    }

    /// Parameters the current pattern was generated from, rotation included.
    pub fn params(&self) -> &PatternParams {
        &self.params
    }

    /// Current pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Step count of the current pattern.
    pub fn steps(&self) -> usize {
        self.pattern.steps()
    }

    /// Cursor, `-1` before the first step.
    pub fn beat_index(&self) -> i32 {
        self.beat_index
    }

    /// Run state.
    pub fn run_state(&self) -> RunState {
        self.chain.state()
    }

    /// Whether the track is advancing.
    pub fn is_running(&self) -> bool {
        self.chain.is_running()
    }

    /// Whether something is patched into the start input.
    pub fn start_connected(&self) -> bool {
        self.start_connected
    }

    /// Probability applied to `step`, 1.0 without a satellite.
    pub fn probability(&self, step: usize) -> f32 {
        self.probability.get(step).copied().unwrap_or(1.0)
    }

    /// Swing applied when moving into `step`, 0.0 without a satellite.
    pub fn swing(&self, step: usize) -> f32 {
        self.swing.get(step).copied().unwrap_or(0.0)
    }

    /// Rotation supplied by a rotator satellite.
    pub fn rotation(&self) -> usize {
        self.rotation
    }

    /// Timing state.
    pub fn clock(&self) -> &TrackClock {
        &self.clock
    }

    /// Record whether the start input is patched. Returns `true` on change.
    pub(crate) fn set_start_connected(&mut self, connected: bool) -> bool {
        let changed = self.start_connected != connected;
        self.start_connected = connected;
        changed
    }

    /// Re-evaluate the run state under `mode`.
    pub(crate) fn evaluate_chain(&mut self, mode: ChainMode) {
        self.chain.evaluate(mode, self.start_connected);
    }

    /// Fold satellite modifiers for track `track` out of an inbound message.
    /// Tracks no satellite enabled fall back to the identity values.
    pub(crate) fn load_modifiers(&mut self, msg: Option<&[f32]>, track: usize) {
        for step in 0..MAX_STEPS {
            self.probability[step] = msg
                .and_then(|m| PROBABILITY_TABLE.read(m, track, step))
                .map_or(1.0, |p| if p.is_nan() { 1.0 } else { p.clamp(0.0, 1.0) });
            self.swing[step] = msg
                .and_then(|m| SWING_TABLE.read(m, track, step))
                .map_or(0.0, |s| if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) });
        }
        self.rotation = msg
            .and_then(|m| RotationTable::read(m, track))
            .unwrap_or(0);
    }

    /// Resolve knobs and CV, fold in the rotation, and regenerate the pattern
    /// when anything changed. Returns `true` when the pattern was rebuilt.
    pub(crate) fn update_params(&mut self, cv: &TrackCv) -> bool {
        let mut params = resolve_track_params(&self.knobs, cv, self.algorithm);
        if params.steps > 0 {
            params.offset = (params.offset + self.rotation) % params.steps;
        }
        if params == self.params {
            return false;
        }
        self.params = params;
        self.pattern = Pattern::generate(&params);
        if params.steps > 0 && self.beat_index >= params.steps as i32 {
            self.beat_index = 0;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "pattern regenerated: steps={} division={} algorithm={}",
            params.steps,
            params.division,
            params.algorithm.name()
        );
        true
    }

    /// Index the cursor would move to next.
    pub(crate) fn next_index(&self) -> usize {
        let steps = self.steps();
        if steps == 0 {
            return 0;
        }
        let next = (self.beat_index + 1).max(0) as usize;
        if next >= steps { 0 } else { next }
    }

    /// Move the cursor one step. Returns `true` when it wrapped.
    pub(crate) fn step(&mut self) -> bool {
        let steps = self.steps() as i32;
        self.beat_index += 1;
        if self.beat_index >= steps {
            self.beat_index = 0;
            true
        } else {
            false
        }
    }

    /// Put the cursor at `index` (clamped to `-1..steps`) and restart timing.
    pub(crate) fn restart_at(&mut self, index: i32) {
        let last = self.steps() as i32 - 1;
        self.beat_index = index.clamp(-1, last.max(0));
        self.clock.restart();
    }

    /// Start beat and (optionally) accent pulses.
    pub(crate) fn trigger_beat(&mut self, accent: bool) {
        self.beat_pulse.trigger(PULSE_WIDTH_SECONDS);
        if accent {
            self.accent_pulse.trigger(PULSE_WIDTH_SECONDS);
        }
    }

    /// Start the end-of-cycle pulse.
    pub(crate) fn trigger_end_of_cycle(&mut self) {
        self.eoc_pulse.trigger(PULSE_WIDTH_SECONDS);
    }

    /// Advance pulse generators and read the outputs.
    pub(crate) fn process_pulses(&mut self, dt: f32) -> TrackOutputs {
        TrackOutputs {
            beat: gate_volts(self.beat_pulse.process(dt)),
            accent: gate_volts(self.accent_pulse.process(dt)),
            end_of_cycle: gate_volts(self.eoc_pulse.process(dt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusMessage;

    #[test]
    fn default_track_has_sixteen_steps() {
        let track = Track::new();
        assert_eq!(track.steps(), 16);
        assert_eq!(track.pattern().beat_count(), 4);
        assert_eq!(track.beat_index(), 0);
        assert!(track.is_running());
    }

    #[test]
    fn cursor_wraps_and_clamps() {
        let mut track = Track::new();
        track.knobs_mut().steps = 3.0;
        track.update_params(&TrackCv::default());
        assert!(!track.step());
        assert!(!track.step());
        assert!(track.step());
        assert_eq!(track.beat_index(), 0);
        track.restart_at(9);
        assert_eq!(track.beat_index(), 2);
        track.restart_at(-4);
        assert_eq!(track.beat_index(), -1);
        assert_eq!(track.next_index(), 0);
    }

    #[test]
    fn shrinking_steps_wraps_cursor() {
        let mut track = Track::new();
        track.restart_at(12);
        track.knobs_mut().steps = 8.0;
        assert!(track.update_params(&TrackCv::default()));
        assert_eq!(track.beat_index(), 0);
    }

    #[test]
    fn unchanged_params_do_not_regenerate() {
        let mut track = Track::new();
        assert!(!track.update_params(&TrackCv::default()));
        track.toggle_algorithm();
        assert!(track.update_params(&TrackCv::default()));
        assert_eq!(track.params().algorithm, Algorithm::GolombRuler);
    }

    #[test]
    fn rotation_is_added_to_offset() {
        let mut msg = BusMessage::ZERO;
        RotationTable::write(msg.as_mut_slice(), 2, 3);
        let mut track = Track::new();
        track.load_modifiers(Some(msg.as_slice()), 2);
        assert_eq!(track.rotation(), 3);
        track.update_params(&TrackCv::default());
        assert_eq!(track.params().offset, 3);
        assert!(track.pattern().is_beat(3));
    }

    #[test]
    fn missing_satellite_means_identity_modifiers() {
        let mut track = Track::new();
        track.load_modifiers(None, 0);
        for step in 0..MAX_STEPS {
            assert_eq!(track.probability(step), 1.0);
            assert_eq!(track.swing(step), 0.0);
        }
        assert_eq!(track.probability(MAX_STEPS + 1), 1.0);
    }

    #[test]
    fn out_of_range_modifiers_saturate() {
        let mut msg = BusMessage::ZERO;
        let mut values = [0.5; MAX_STEPS];
        values[0] = 4.0;
        values[1] = f32::NAN;
        PROBABILITY_TABLE.write_track(msg.as_mut_slice(), 0, &values);
        SWING_TABLE.write_track(msg.as_mut_slice(), 0, &[-3.0; MAX_STEPS]);
        let mut track = Track::new();
        track.load_modifiers(Some(msg.as_slice()), 0);
        assert_eq!(track.probability(0), 1.0);
        assert_eq!(track.probability(1), 1.0);
        assert_eq!(track.probability(2), 0.5);
        assert_eq!(track.swing(5), -1.0);
    }

    #[test]
    fn reset_mode_names_round_trip() {
        for mode in [ResetMode::FirstStep, ResetMode::PreFirstStep] {
            assert_eq!(ResetMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(ResetMode::PreFirstStep.index(), -1);
    }
}
