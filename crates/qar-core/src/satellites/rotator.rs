//! Per-track rotation satellite.

use super::{EngineView, Satellite};
use crate::bus::{ModuleKind, RotationTable};
use crate::{MAX_STEPS, TRACK_COUNT};

/// Rotates enabled tracks by a whole number of steps.
///
/// The engine adds the rotation to the track's offset (modulo its step count)
/// and regenerates the pattern.
#[derive(Clone, Debug, Default)]
pub struct BeatRotatorExpander {
    enabled: [bool; TRACK_COUNT],
    rotation: [usize; TRACK_COUNT],
    view: EngineView,
}

impl BeatRotatorExpander {
    /// All tracks disabled, no rotation.
    pub fn new() -> Self {
        Self::default()
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

    /// Rotation of a track.
    pub fn rotation(&self, track: usize) -> usize {
        self.rotation.get(track).copied().unwrap_or(0)
    }

    /// Set a track's rotation, saturated to `MAX_STEPS - 1`.
    pub fn set_rotation(&mut self, track: usize, rotation: usize) {
        if let Some(slot) = self.rotation.get_mut(track) {
            *slot = rotation.min(MAX_STEPS - 1);
        }
    }

    /// Last engine layout seen.
    pub fn engine_view(&self) -> &EngineView {
        &self.view
    }
}

impl Satellite for BeatRotatorExpander {
    const KIND: ModuleKind = ModuleKind::BeatRotatorExpander;

    fn write_toward_engine(&self, msg: &mut [f32]) {
        for (track, &rotation) in self.rotation.iter().enumerate() {
            if self.enabled[track] {
                RotationTable::write(msg, track, rotation);
            }
        }
    }

    fn engine_view_mut(&mut self) -> &mut EngineView {
        &mut self.view
    }
}

impl_rack_module!(BeatRotatorExpander);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusMessage;

    #[test]
    fn rotation_saturates_and_is_sent() {
        let mut sat = BeatRotatorExpander::new();
        sat.set_rotation(1, 99);
        assert_eq!(sat.rotation(1), MAX_STEPS - 1);
        sat.set_rotation(0, 2);
        sat.set_enabled(0, true);
        let mut msg = BusMessage::ZERO;
        sat.write_toward_engine(msg.as_mut_slice());
        assert_eq!(RotationTable::read(msg.as_slice(), 0), Some(2));
        assert_eq!(RotationTable::read(msg.as_slice(), 1), None);
    }
}
