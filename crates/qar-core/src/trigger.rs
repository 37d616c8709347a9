//! Trigger detection and pulse generation for control-voltage ports.

/// Voltage a high gate or pulse is driven to.
pub const GATE_HIGH_VOLTS: f32 = 10.0;

/// Width of every output pulse, in seconds.
pub const PULSE_WIDTH_SECONDS: f32 = 1e-3;

/// Internal state of a [`SchmittTrigger`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchmittState {
    /// Below the low threshold (or never seen high).
    #[default]
    Low,
    /// Above the high threshold.
    High,
    /// No sample seen yet; the first sample sets the state without an edge.
    Uninitialized,
}

/// Rising-edge detector with hysteresis.
///
/// Reports an edge when the input crosses `high` from the low state. The
/// input must fall below `low` before another edge can fire.
#[derive(Clone, Copy, Debug)]
pub struct SchmittTrigger {
    state: SchmittState,
    low: f32,
    high: f32,
}

impl Default for SchmittTrigger {
    fn default() -> Self {
        Self::new(0.1, 1.0)
    }
}

impl SchmittTrigger {
    /// Create a trigger with the given thresholds, starting in the low state.
    pub fn new(low: f32, high: f32) -> Self {
        Self {
            state: SchmittState::Low,
            low,
            high,
        }
    }

    /// Process one sample. Returns `true` on a rising edge.
    pub fn process(&mut self, input: f32) -> bool {
        match self.state {
            SchmittState::Uninitialized => {
                self.state = if input >= self.high {
                    SchmittState::High
                } else {
                    SchmittState::Low
                };
                false
            }
            SchmittState::High => {
                if input <= self.low {
                    self.state = SchmittState::Low;
                }
                false
            }
            SchmittState::Low => {
                if input >= self.high {
                    self.state = SchmittState::High;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Whether the trigger currently reads high.
    pub fn is_high(&self) -> bool {
        self.state == SchmittState::High
    }

    /// Current state.
    pub fn state(&self) -> SchmittState {
        self.state
    }

    /// Forget the current state. The next sample initializes without an edge.
    pub fn reset(&mut self) {
        self.state = SchmittState::Uninitialized;
    }
}

/// Retriggerable fixed-width pulse.
///
/// [`trigger`](Self::trigger) arms the pulse; [`process`](Self::process) is
/// called once per frame and reports whether the output is high.
#[derive(Clone, Copy, Debug, Default)]
pub struct PulseGenerator {
    remaining: f32,
}

impl PulseGenerator {
    /// Create an idle generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a pulse of `duration` seconds.
    pub fn trigger(&mut self, duration: f32) {
        if duration > self.remaining {
            self.remaining = duration;
        }
    }

    /// Advance by `dt` seconds. Returns `true` while the pulse is high.
    pub fn process(&mut self, dt: f32) -> bool {
        if self.remaining > 0.0 {
            self.remaining -= dt;
            true
        } else {
            false
        }
    }

    /// Drop any pulse in flight.
    pub fn reset(&mut self) {
        self.remaining = 0.0;
    }
}

/// Convert a gate flag into output volts.
#[inline]
pub fn gate_volts(high: bool) -> f32 {
    if high { GATE_HIGH_VOLTS } else { 0.0 }
}
