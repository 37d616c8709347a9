//! QAR Core - quad algorithmic rhythm engine and expander bus
//!
//! This crate provides a four-track trigger sequencer for a modular host and
//! the fixed-layout bus its satellite modules use to modify it. It is designed
//! to be called once per audio frame with zero allocation on that path.
//!
//! # Core Abstractions
//!
//! ## Patterns
//!
//! - [`Pattern`] - Beat and accent flags for one track
//! - [`PatternParams`] - Steps, division, offset, pad, accents, algorithm
//! - [`Algorithm`] - Euclidean bucket distribution or Golomb ruler lookup
//!
//! ## Timing and Chaining
//!
//! - [`ClockTracker`] - External clock period estimate
//! - [`TrackClock`] - Per-track stepping, constant-time rescaling, swing
//! - [`ChainController`] - Run/stop state under [`ChainMode`]
//!
//! ## Engine
//!
//! - [`RhythmEngine`] - Four [`Track`]s sharing clock, transport and bus link
//! - [`TrackParam`] / [`ParamDescriptor`] - Knob + CV resolution
//! - [`RandomSource`] - Injected generator for probability gates
//!
//! ## Expander Bus
//!
//! - [`BusMessage`] - Flat `[f32; BUS_SIZE]` message
//! - [`ModuleKind`] / [`RegionLayout`] - Identity and statically owned regions
//! - [`ExpanderPeer`] / [`ExpanderPort`] - Double-buffered neighbor link
//! - [`ProbabilityExpander`], [`GrooveExpander`], [`BeatRotatorExpander`],
//!   [`PassthroughExpander`] - Satellites
//! - [`Rack`] - Ordered row of modules that delivers bus flips between frames
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! qar-core = { version = "0.1", default-features = false }
//! ```
//!
//! Enable the `tracing` feature to log pattern regeneration, resync, chain
//! transitions and neighbor changes.
//!
//! # Example
//!
//! ```rust
//! use qar_core::{GrooveExpander, Rack, RhythmEngine, TrackParam};
//!
//! let mut rack = Rack::new(48000.0);
//! let mut engine = RhythmEngine::new();
//! engine.set_knob(0, TrackParam::Steps, 12.0);
//! engine.set_knob(0, TrackParam::Division, 5.0);
//! engine.set_constant_time_master(1);
//!
//! let mut groove = GrooveExpander::new();
//! groove.set_shuffle(0, 0.3);
//! groove.set_enabled(0, true);
//!
//! let e = rack.push(Box::new(engine));
//! let g = rack.push(Box::new(groove));
//! rack.run(16);
//!
//! // the satellite's swing reached the engine, and the engine's layout reached the satellite
//! let engine = rack.module::<RhythmEngine>(e).unwrap();
//! assert!((engine.track(0).unwrap().swing(1) - 0.3).abs() < 1e-6);
//! let groove = rack.module::<GrooveExpander>(g).unwrap();
//! assert_eq!(groove.engine_view().track(0).unwrap().steps, 12);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in per-frame processing
//! - **Saturating**: Every input is clamped; there is no error channel
//! - **Deterministic**: Probability draws come from an injected, seedable source

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Number of tracks per engine.
pub const TRACK_COUNT: usize = 4;

/// Longest pattern a track can hold.
pub const MAX_STEPS: usize = 18;

pub mod bus;
pub mod chain;
pub mod clock;
pub mod engine;
pub mod param;
pub mod pattern;
pub mod rack;
pub mod random;
pub mod satellites;
pub mod track;
pub mod trigger;

// Re-export main types at crate root
pub use bus::{
    BUS_SIZE, BusMessage, BusRegion, EngineLayout, EngineTrackState, ExpanderPeer, ExpanderPort,
    ModuleKind, PROBABILITY_TABLE, RegionLayout, RotationTable, SWING_TABLE, StepTable,
};
pub use chain::{ChainController, ChainMode, RunState};
pub use clock::{ClockState, ClockTick, ClockTracker, StepMode, TrackClock};
pub use engine::{
    EngineInputs, EngineOutputs, EngineSettings, RESET_CLOCK_HOLDOFF_SECONDS, RhythmEngine,
    TrackInputs,
};
pub use param::{
    CV_FULL_SCALE_VOLTS, ParamDescriptor, TrackCv, TrackKnobs, TrackParam, resolve_track_params,
};
pub use pattern::{
    Algorithm, GOLOMB_RULERS, NUM_RULERS, Pattern, PatternParams, select_ruler, space_multiplier,
};
pub use rack::{ExpanderPorts, ProcessContext, Rack, RackModule};
pub use random::{ConstantSource, RandomSource, Xorshift32};
pub use satellites::{
    BeatRotatorExpander, EngineView, GrooveExpander, PassthroughExpander, ProbabilityExpander,
    Satellite,
};
pub use track::{ResetMode, Track, TrackEvents, TrackOutputs};
pub use trigger::{
    GATE_HIGH_VOLTS, PULSE_WIDTH_SECONDS, PulseGenerator, SchmittState, SchmittTrigger, gate_volts,
};
