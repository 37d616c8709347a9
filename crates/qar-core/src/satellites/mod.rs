//! Satellite modules that attach to the right of the engine.
//!
//! Every satellite follows the same contract, implemented once in [`forward`]:
//!
//! - It only talks to neighbors whose kind it recognizes. The engine-facing
//!   (left) side accepts the engine or another satellite; the far (right)
//!   side accepts satellites. Anything else is treated as unattached.
//! - Away from the engine, it forwards the engine layout unchanged and keeps a
//!   decoded copy in its [`EngineView`].
//! - Toward the engine, it starts from a zeroed message, copies whatever the
//!   farther satellites sent, then writes the tracks it has enabled over the
//!   left region of its [`RegionLayout`](crate::bus::RegionLayout). Writes
//!   outside that region are dropped. Nearer satellites therefore override
//!   farther ones track by track.
//! - Both outgoing messages request a flip.

/// Wire a [`Satellite`] into the rack.
macro_rules! impl_rack_module {
    ($ty:ty) => {
        impl $crate::rack::RackModule for $ty {
            fn kind(&self) -> $crate::bus::ModuleKind {
                <$ty as $crate::satellites::Satellite>::KIND
            }

            fn process(
                &mut self,
                _ctx: &$crate::rack::ProcessContext,
                ports: &mut $crate::rack::ExpanderPorts,
            ) {
                $crate::satellites::forward(self, ports);
            }

            fn as_any(&self) -> &dyn core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
                self
            }
        }
    };
}

mod groove;
mod passthrough;
mod probability;
mod rotator;

pub use groove::GrooveExpander;
pub use passthrough::PassthroughExpander;
pub use probability::ProbabilityExpander;
pub use rotator::BeatRotatorExpander;

use crate::bus::{BUS_SIZE, BusMessage, BusRegion, EngineLayout, EngineTrackState, ModuleKind};
use crate::rack::ExpanderPorts;
use crate::TRACK_COUNT;

/// Whole-message region.
const FULL_MESSAGE: BusRegion = BusRegion::new(0, BUS_SIZE);

/// What a satellite last heard from the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineView {
    attached: bool,
    tracks: [EngineTrackState; TRACK_COUNT],
}

impl EngineView {
    /// Whether an engine (directly or through other satellites) is upstream.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Decoded state of one track.
    pub fn track(&self, index: usize) -> Option<&EngineTrackState> {
        self.tracks.get(index)
    }

    fn update(&mut self, msg: &[f32]) {
        self.attached = true;
        for (i, track) in self.tracks.iter_mut().enumerate() {
            *track = EngineLayout::read_track(msg, i);
        }
    }

    fn detach(&mut self) {
        *self = Self::default();
    }
}

/// A module that contributes modifiers to the engine over the bus.
pub trait Satellite {
    /// Declared identity.
    const KIND: ModuleKind;

    /// Write this satellite's enabled tracks into a toward-engine message.
    /// Disabled tracks must be left as they are, and nothing outside
    /// `KIND.layout().left_region()` may change.
    fn write_toward_engine(&self, msg: &mut [f32]);

    /// Storage for the decoded engine layout.
    fn engine_view_mut(&mut self) -> &mut EngineView;
}

/// Run one frame of the satellite contract.
pub fn forward<S: Satellite>(satellite: &mut S, ports: &mut ExpanderPorts) {
    let mut away = BusMessage::ZERO;
    let mut toward = BusMessage::ZERO;

    let upstream = ports
        .left
        .peer()
        .filter(|peer| peer.kind().is_upstream_of_satellite());
    match upstream.as_deref() {
        Some(peer) => {
            let msg = peer.read_region(0, BUS_SIZE);
            away.copy_region_from(msg, FULL_MESSAGE);
            let engine = ModuleKind::RhythmEngine.layout().right_region();
            satellite
                .engine_view_mut()
                .update(&msg[..engine.end().min(msg.len())]);
        }
        None => satellite.engine_view_mut().detach(),
    }

    if let Some(peer) = ports.right.peer().filter(|peer| peer.kind().is_satellite()) {
        toward.copy_region_from(peer.read_region(0, BUS_SIZE), FULL_MESSAGE);
        peer.write_region(0, away.as_slice());
        peer.request_flip();
    }

    if let Some(peer) = upstream {
        let own = S::KIND.layout().left_region();
        let mut staged = toward;
        satellite.write_toward_engine(staged.as_mut_slice());
        debug_assert!(
            staged.matches_outside(&toward, own),
            "{} satellite wrote outside its region",
            S::KIND.name()
        );
        toward.copy_region_from(staged.as_slice(), own);
        peer.write_region(0, toward.as_slice());
        peer.request_flip();
    }
}

/// Saturate a per-step value, mapping NaN to `fallback`.
fn sanitize(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() { fallback } else { value.clamp(min, max) }
}
