//! Per-step swing satellite.

use super::{EngineView, Satellite, sanitize};
use crate::bus::{ModuleKind, SWING_TABLE};
use crate::{MAX_STEPS, TRACK_COUNT};

/// Supplies a swing value for every step of every enabled track.
///
/// Swing shifts the step it belongs to by `swing * step_duration`, positive
/// is late. Every value is scaled by the global groove amount before it is
/// sent, so one control fades a whole groove in and out. Swing only has an
/// audible effect when the engine runs in constant-time mode.
#[derive(Clone, Debug)]
pub struct GrooveExpander {
    enabled: [bool; TRACK_COUNT],
    swing: [[f32; MAX_STEPS]; TRACK_COUNT],
    amount: f32,
    view: EngineView,
}

impl Default for GrooveExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl GrooveExpander {
    /// All tracks disabled, straight timing, full amount.
    pub fn new() -> Self {
        Self {
            enabled: [false; TRACK_COUNT],
            swing: [[0.0; MAX_STEPS]; TRACK_COUNT],
            amount: 1.0,
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

    /// Unscaled swing of one step.
    pub fn swing(&self, track: usize, step: usize) -> f32 {
        self.swing
            .get(track)
            .and_then(|t| t.get(step))
            .copied()
            .unwrap_or(0.0)
    }

    /// Set one step, saturated into `-1..=1`.
    pub fn set_swing(&mut self, track: usize, step: usize, swing: f32) {
        if let Some(slot) = self.swing.get_mut(track).and_then(|t| t.get_mut(step)) {
            *slot = sanitize(swing, -1.0, 1.0, 0.0);
        }
    }

    /// Set every step of a track. Missing values are left alone.
    pub fn set_track(&mut self, track: usize, values: &[f32]) {
        for (step, &s) in values.iter().enumerate().take(MAX_STEPS) {
            self.set_swing(track, step, s);
        }
    }

    /// Classic shuffle: every odd step late by `amount`, even steps straight.
    pub fn set_shuffle(&mut self, track: usize, amount: f32) {
        for step in 0..MAX_STEPS {
            let swing = if step % 2 == 1 { amount } else { 0.0 };
            self.set_swing(track, step, swing);
        }
    }

    /// Global groove amount.
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Set the global groove amount, saturated into `0..=1`.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = sanitize(amount, 0.0, 1.0, 1.0);
    }

    /// Last engine layout seen.
    pub fn engine_view(&self) -> &EngineView {
        &self.view
    }
}

impl Satellite for GrooveExpander {
    const KIND: ModuleKind = ModuleKind::GrooveExpander;

    fn write_toward_engine(&self, msg: &mut [f32]) {
        for (track, values) in self.swing.iter().enumerate() {
            if self.enabled[track] {
                let scaled = values.map(|s| s * self.amount);
                SWING_TABLE.write_track(msg, track, &scaled);
            }
        }
    }

    fn engine_view_mut(&mut self) -> &mut EngineView {
        &mut self.view
    }
}

impl_rack_module!(GrooveExpander);
