//! The quad rhythm engine.
//!
//! [`RhythmEngine`] owns four [`Track`]s and advances them once per frame:
//!
//! 1. Transport inputs: reset, mute toggle, external clock.
//! 2. Inbound satellite modifiers (probability, swing, rotation) from the
//!    right-hand neighbor, when that neighbor is a satellite.
//! 3. Per track: algorithm toggle, knob + CV resolution, pattern regeneration
//!    on change, start trigger, clock advance, probability gate, pulses.
//! 4. Resync in constant-time mode.
//! 5. Outbound engine layout toward the satellites.
//!
//! Nothing here allocates or fails; out-of-range inputs saturate.
//!
//! # Example
//!
//! ```rust
//! use qar_core::{RhythmEngine, TrackParam};
//!
//! let mut engine = RhythmEngine::new();
//! engine.set_knob(0, TrackParam::Steps, 8.0);
//! engine.set_knob(0, TrackParam::Division, 3.0);
//!
//! let dt = 1.0 / 1000.0;
//! let mut beats = 0;
//! for frame in 0..4000 {
//!     engine.inputs_mut().clock = if frame % 100 < 5 { 10.0 } else { 0.0 };
//!     engine.process(dt, None);
//!     if engine.events()[0].beat {
//!         beats += 1;
//!     }
//! }
//! // 40 clock edges over an 8-step, 3-beat pattern
//! assert_eq!(beats, 15);
//! ```

use crate::bus::{BUS_SIZE, BusMessage, EngineLayout, ExpanderPeer, ModuleKind};
use crate::chain::ChainMode;
use crate::clock::{ClockTick, ClockTracker, StepMode};
use crate::param::{TrackCv, TrackParam};
use crate::pattern::Algorithm;
use crate::rack::{ExpanderPorts, ProcessContext, RackModule};
use crate::random::{RandomSource, Xorshift32};
use crate::track::{ResetMode, Track, TrackEvents, TrackOutputs};
use crate::trigger::SchmittTrigger;
use crate::TRACK_COUNT;

/// Clock edges closer than this to a reset are ignored for stepping.
pub const RESET_CLOCK_HOLDOFF_SECONDS: f32 = 1e-3;

/// Engine-wide settings that persist with a patch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Start/stop chaining behavior.
    pub chain_mode: ChainMode,
    /// Master track for constant-time mode, 1-based; 0 disables the mode.
    pub constant_time_master: usize,
    /// Suppress beat and accent pulses.
    pub muted: bool,
    /// Where reset puts the cursor.
    pub reset_mode: ResetMode,
}

/// Per-track input voltages.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackInputs {
    /// Additive CV for each control.
    pub cv: TrackCv,
    /// Algorithm toggle trigger.
    pub algorithm: f32,
    /// Start trigger. `None` when nothing is patched.
    pub start: Option<f32>,
}

/// Input voltages for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineInputs {
    /// External clock.
    pub clock: f32,
    /// Reset trigger.
    pub reset: f32,
    /// Mute toggle trigger.
    pub mute: f32,
    /// Per-track inputs.
    pub tracks: [TrackInputs; TRACK_COUNT],
}

/// Output voltages for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineOutputs {
    /// Per-track outputs.
    pub tracks: [TrackOutputs; TRACK_COUNT],
}

/// Four tracks sharing a clock, transport and expander link.
pub struct RhythmEngine<R: RandomSource = Xorshift32> {
    tracks: [Track; TRACK_COUNT],
    settings: EngineSettings,
    clock: ClockTracker,
    clock_trigger: SchmittTrigger,
    reset_trigger: SchmittTrigger,
    mute_trigger: SchmittTrigger,
    reset_holdoff: f32,
    inputs: EngineInputs,
    outputs: EngineOutputs,
    events: [TrackEvents; TRACK_COUNT],
    rng: R,
    outbound: BusMessage,
    peer_kind: Option<ModuleKind>,
}

impl RhythmEngine<Xorshift32> {
    /// Engine with default settings and the default random seed.
    pub fn new() -> Self {
        Self::with_random(Xorshift32::default())
    }

    /// Engine with default settings and a seeded generator.
    pub fn with_seed(seed: u32) -> Self {
        Self::with_random(Xorshift32::new(seed))
    }
}

impl Default for RhythmEngine<Xorshift32> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> RhythmEngine<R> {
    /// Engine drawing probability gates from `rng`.
    pub fn with_random(rng: R) -> Self {
        Self {
            tracks: core::array::from_fn(|_| Track::new()),
            settings: EngineSettings::default(),
            clock: ClockTracker::new(),
            clock_trigger: SchmittTrigger::default(),
            reset_trigger: SchmittTrigger::default(),
            mute_trigger: SchmittTrigger::default(),
            reset_holdoff: 0.0,
            inputs: EngineInputs::default(),
            outputs: EngineOutputs::default(),
            events: [TrackEvents::default(); TRACK_COUNT],
            rng,
            outbound: BusMessage::ZERO,
            peer_kind: None,
        }
    }

    // --- settings -------------------------------------------------------

    /// Current settings.
    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Replace every setting. The chain mode is re-evaluated.
    pub fn apply_settings(&mut self, settings: EngineSettings) {
        self.set_constant_time_master(settings.constant_time_master);
        self.settings.muted = settings.muted;
        self.settings.reset_mode = settings.reset_mode;
        self.set_chain_mode(settings.chain_mode);
    }

    /// Change the chain mode and re-evaluate every track's run state.
    pub fn set_chain_mode(&mut self, mode: ChainMode) {
        self.settings.chain_mode = mode;
        for track in &mut self.tracks {
            track.evaluate_chain(mode);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("chain mode set to {}", mode.name());
    }

    /// Select the constant-time master track (1-based, 0 disables).
    pub fn set_constant_time_master(&mut self, master: usize) {
        self.settings.constant_time_master = master.min(TRACK_COUNT);
    }

    /// Set the mute flag.
    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
    }

    /// Whether beat and accent pulses are suppressed.
    pub fn is_muted(&self) -> bool {
        self.settings.muted
    }

    /// Choose where reset puts the cursor.
    pub fn set_reset_mode(&mut self, mode: ResetMode) {
        self.settings.reset_mode = mode;
    }

    // --- tracks ---------------------------------------------------------

    /// A track by index.
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// A track by index, mutably.
    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// All tracks.
    pub fn tracks(&self) -> &[Track; TRACK_COUNT] {
        &self.tracks
    }

    /// Set a stored knob, saturated into range. Ignores bad track indices.
    pub fn set_knob(&mut self, track: usize, param: TrackParam, value: f32) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.knobs_mut().set(param, value);
        }
    }

    /// Select a track's algorithm.
    pub fn set_algorithm(&mut self, track: usize, algorithm: Algorithm) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.set_algorithm(algorithm);
        }
    }

    /// Panel button: flip a track's algorithm.
    pub fn toggle_algorithm(&mut self, track: usize) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.toggle_algorithm();
        }
    }

    /// Move a track's cursor (clamped to `-1..steps`) and restart its timing.
    pub fn seek(&mut self, track: usize, index: i32) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.restart_at(index);
        }
    }

    // --- io ---------------------------------------------------------------

    /// Input voltages read on the next frame.
    pub fn inputs(&self) -> &EngineInputs {
        &self.inputs
    }

    /// Mutable input voltages.
    pub fn inputs_mut(&mut self) -> &mut EngineInputs {
        &mut self.inputs
    }

    /// Output voltages of the last frame.
    pub fn outputs(&self) -> &EngineOutputs {
        &self.outputs
    }

    /// Pulses started during the last frame.
    pub fn events(&self) -> &[TrackEvents; TRACK_COUNT] {
        &self.events
    }

    /// External clock estimate.
    pub fn clock(&self) -> &ClockTracker {
        &self.clock
    }

    /// Timing mode implied by the settings and the master track.
    pub fn step_mode(&self) -> StepMode {
        let master = self.settings.constant_time_master;
        if master == 0 {
            return StepMode::ClockDriven;
        }
        match self.tracks.get(master - 1).map(Track::steps) {
            Some(master_steps) if master_steps > 0 => StepMode::ConstantTime { master_steps },
            _ => StepMode::ClockDriven,
        }
    }

    /// Put every cursor at the reset position and re-evaluate run states.
    pub fn reset(&mut self) {
        let index = self.settings.reset_mode.index();
        let mode = self.settings.chain_mode;
        for track in &mut self.tracks {
            track.restart_at(index);
            track.evaluate_chain(mode);
        }
        self.reset_holdoff = RESET_CLOCK_HOLDOFF_SECONDS;
        #[cfg(feature = "tracing")]
        tracing::debug!("engine reset to index {index}");
    }

    /// Process one frame of `dt` seconds.
    ///
    /// `expander` is the right-hand neighbor. It is only read from and
    /// written to when it declares a satellite kind; anything else is treated
    /// as no neighbor.
    pub fn process(&mut self, dt: f32, expander: Option<&mut dyn ExpanderPeer>) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let inputs = self.inputs;
        let chain_mode = self.settings.chain_mode;
        self.events = [TrackEvents::default(); TRACK_COUNT];

        let kind = expander.as_ref().map(|peer| peer.kind());
        if kind != self.peer_kind {
            #[cfg(feature = "tracing")]
            match kind {
                Some(k) if !k.is_satellite() => {
                    tracing::debug!("ignoring non-satellite neighbor {}", k.name());
                }
                Some(k) => tracing::debug!("satellite attached: {}", k.name()),
                None => tracing::debug!("expander detached"),
            }
            self.peer_kind = kind;
        }
        let mut peer = expander.filter(|peer| peer.kind().is_satellite());

        // transport
        for (track, ti) in self.tracks.iter_mut().zip(&inputs.tracks) {
            if track.set_start_connected(ti.start.is_some()) {
                track.evaluate_chain(chain_mode);
            }
        }
        if self.reset_trigger.process(inputs.reset) {
            self.reset();
        }
        if self.mute_trigger.process(inputs.mute) {
            self.settings.muted = !self.settings.muted;
        }
        let edge = self.clock_trigger.process(inputs.clock);
        self.clock.tick(dt, edge);
        let held = self.reset_holdoff > 0.0;
        self.reset_holdoff = (self.reset_holdoff - dt).max(0.0);
        let tick = ClockTick {
            dt,
            edge: edge && !held,
            period: self.clock.period(),
        };

        // modifiers and patterns
        let inbound = peer.as_deref().map(|p| p.read_region(0, BUS_SIZE));
        for (i, (track, ti)) in self.tracks.iter_mut().zip(&inputs.tracks).enumerate() {
            track.load_modifiers(inbound, i);
            if track.algorithm_trigger.process(ti.algorithm) {
                track.toggle_algorithm();
            }
            track.chain.refresh(chain_mode, track.start_connected());
            track.update_params(&ti.cv);
        }

        let mode = self.step_mode();
        let longest = self
            .tracks
            .iter()
            .filter(|t| t.is_running())
            .map(Track::steps)
            .max()
            .unwrap_or(0);
        let mut wrapped = [false; TRACK_COUNT];
        // steps to play once resync has settled every cursor
        let mut play = [false; TRACK_COUNT];
        let mut resync = false;

        for i in 0..TRACK_COUNT {
            let ti = &inputs.tracks[i];
            let track = &mut self.tracks[i];
            let start_edge = ti.start.is_some_and(|v| track.start_trigger.process(v));
            if start_edge && track.chain.start(chain_mode) {
                let index = track.beat_index().max(0);
                track.restart_at(index);
                self.events[i].stepped = true;
                play[i] = true;
                continue;
            }

            let track = &mut self.tracks[i];
            if !track.is_running() || track.steps() == 0 {
                continue;
            }
            let steps = track.steps();
            let swing = track.swing(track.next_index());
            if !track.clock.advance(&tick, mode, steps, swing) {
                continue;
            }
            self.events[i].stepped = true;
            if track.step() {
                wrapped[i] = true;
                self.events[i].end_of_cycle = true;
                track.trigger_end_of_cycle();
                if steps == longest {
                    resync = true;
                }
                if track.chain.end_of_cycle(chain_mode, track.start_connected()) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("track {i} stopped at end of cycle");
                    continue;
                }
            }
            play[i] = true;
        }

        if resync && matches!(mode, StepMode::ConstantTime { .. }) {
            #[cfg(feature = "tracing")]
            tracing::debug!("resync: longest track wrapped");
            for i in 0..TRACK_COUNT {
                let track = &mut self.tracks[i];
                if wrapped[i] || !track.is_running() || track.steps() == 0 {
                    continue;
                }
                track.restart_at(0);
                self.events[i].stepped = true;
                play[i] = true;
            }
        }

        for i in (0..TRACK_COUNT).filter(|&i| play[i]) {
            self.fire(i);
        }

        for (out, track) in self.outputs.tracks.iter_mut().zip(&mut self.tracks) {
            *out = track.process_pulses(dt);
        }

        if let Some(p) = peer.as_deref_mut() {
            self.outbound.clear();
            for (i, track) in self.tracks.iter().enumerate() {
                EngineLayout::write_track(
                    self.outbound.as_mut_slice(),
                    i,
                    track.beat_index(),
                    track.is_running(),
                    track.pattern(),
                );
            }
            p.write_region(0, self.outbound.as_slice());
            p.request_flip();
        }
    }

    /// Play the current step of track `i`: probability gate, mute, pulses.
    fn fire(&mut self, i: usize) {
        let muted = self.settings.muted;
        let track = &mut self.tracks[i];
        if track.beat_index() < 0 || !track.is_running() {
            return;
        }
        let step = track.beat_index() as usize;
        if !track.pattern().is_beat(step) {
            return;
        }
        let draw = self.rng.next_f32();
        if draw >= track.probability(step) || muted {
            return;
        }
        let accent = track.pattern().is_accent(step);
        track.trigger_beat(accent);
        self.events[i].beat = true;
        self.events[i].accent = accent;
    }
}

impl<R: RandomSource + 'static> RackModule for RhythmEngine<R> {
    fn kind(&self) -> ModuleKind {
        ModuleKind::RhythmEngine
    }

    fn process(&mut self, ctx: &ProcessContext, ports: &mut ExpanderPorts) {
        RhythmEngine::process(self, ctx.sample_time, ports.right.peer());
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}
