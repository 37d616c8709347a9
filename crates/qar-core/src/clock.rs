//! External clock tracking and per-track step timing.
//!
//! [`ClockTracker`] follows the external clock input and estimates its period
//! from the two most recent edges. [`TrackClock`] decides, every frame, whether
//! a track advances to its next step.
//!
//! Two timing modes exist per engine:
//!
//! - [`StepMode::ClockDriven`]: a track steps exactly once per clock edge.
//! - [`StepMode::ConstantTime`]: every track's step duration is rescaled so
//!   that a full cycle lasts `master_steps` clock periods regardless of the
//!   track's own step count. Swing only applies in this mode.

/// Lifecycle of the external clock estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockState {
    /// No edge seen yet.
    #[default]
    Idle,
    /// One edge seen; period unknown.
    Armed,
    /// Two or more edges seen; the period estimate is valid.
    Running,
}

/// Estimates the external clock period from successive edges.
///
/// # Example
///
/// ```rust
/// use qar_core::{ClockState, ClockTracker};
///
/// let mut clock = ClockTracker::new();
/// let dt = 1.0 / 1000.0;
/// clock.tick(dt, true);
/// for _ in 0..249 {
///     clock.tick(dt, false);
/// }
/// clock.tick(dt, true);
///
/// assert_eq!(clock.state(), ClockState::Running);
/// assert!((clock.period().unwrap() - 0.25).abs() < 1e-4);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ClockTracker {
    state: ClockState,
    elapsed: f32,
    period: f32,
}

impl ClockTracker {
    /// Create a tracker that has seen no edges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` seconds; `edge` marks a clock rising edge this frame.
    pub fn tick(&mut self, dt: f32, edge: bool) {
        self.elapsed += dt;
        if !edge {
            return;
        }
        match self.state {
            ClockState::Idle => self.state = ClockState::Armed,
            ClockState::Armed | ClockState::Running => {
                self.period = self.elapsed;
                self.state = ClockState::Running;
            }
        }
        self.elapsed = 0.0;
    }

    /// Current state.
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Period estimate in seconds, once two edges have been seen.
    pub fn period(&self) -> Option<f32> {
        match self.state {
            ClockState::Running => Some(self.period),
            _ => None,
        }
    }

    /// Seconds since the most recent edge.
    pub fn since_last_edge(&self) -> f32 {
        self.elapsed
    }

    /// Forget every edge.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Timing mode shared by all tracks of an engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepMode {
    /// One step per external clock edge.
    #[default]
    ClockDriven,
    /// Step duration rescaled so a full cycle spans `master_steps` clock periods.
    ConstantTime {
        /// Step count of the master track.
        master_steps: usize,
    },
}

/// What the external clock did this frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClockTick {
    /// Seconds elapsed this frame.
    pub dt: f32,
    /// Rising edge on the clock input.
    pub edge: bool,
    /// Period estimate, if known.
    pub period: Option<f32>,
}

/// Per-track step timing.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrackClock {
    elapsed: f32,
    step_duration: f32,
    last_swing: f32,
}

impl TrackClock {
    /// Create a clock with no elapsed time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Step duration for a track of `steps` steps.
    ///
    /// Clock-driven tracks step once per period; constant-time tracks scale
    /// by `master_steps / steps`. Zero steps yields zero.
    pub fn step_duration(period: f32, steps: usize, mode: StepMode) -> f32 {
        match mode {
            StepMode::ClockDriven => period,
            StepMode::ConstantTime { master_steps } => {
                if steps == 0 {
                    0.0
                } else {
                    period * master_steps as f32 / steps as f32
                }
            }
        }
    }

    /// Advance by one frame. Returns `true` when the track steps.
    ///
    /// In constant-time mode, time only counts once `tick.period` is known,
    /// and at most one step is taken per frame.
    ///
    /// `next_swing` is the swing value (`-1..=1`) of the step the track would
    /// move to. It shifts that single step by `next_swing * step_duration`;
    /// the previous shift is taken back out so swing never accumulates.
    pub fn advance(&mut self, tick: &ClockTick, mode: StepMode, steps: usize, next_swing: f32) -> bool {
        if steps == 0 {
            return false;
        }
        match mode {
            StepMode::ClockDriven => {
                if let Some(period) = tick.period {
                    self.step_duration = period;
                }
                self.last_swing = 0.0;
                tick.edge
            }
            StepMode::ConstantTime { .. } => {
                // nothing accumulates until the period is known
                let Some(period) = tick.period else {
                    return false;
                };
                self.elapsed += tick.dt;
                self.step_duration = Self::step_duration(period, steps, mode);
                let swing = self.step_duration * next_swing.clamp(-1.0, 1.0);
                let threshold = self.step_duration + swing - self.last_swing;
                if self.elapsed >= threshold {
                    // keep the sub-frame remainder, never a backlog of steps
                    self.elapsed = (self.elapsed - threshold).clamp(0.0, tick.dt);
                    self.last_swing = swing;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Clear elapsed time and swing history. Used by reset, resync and start.
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
        self.last_swing = 0.0;
    }

    /// Most recent step duration in seconds.
    pub fn current_step_duration(&self) -> f32 {
        self.step_duration
    }

    /// Swing shift applied to the current step, in seconds.
    pub fn last_swing_duration(&self) -> f32 {
        self.last_swing
    }

    /// Seconds accumulated toward the next step.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 1000.0;

    fn running_tick(period: f32, edge: bool) -> ClockTick {
        ClockTick {
            dt: DT,
            edge,
            period: Some(period),
        }
    }

    #[test]
    fn tracker_lifecycle() {
        let mut clock = ClockTracker::new();
        assert_eq!(clock.state(), ClockState::Idle);
        clock.tick(DT, true);
        assert_eq!(clock.state(), ClockState::Armed);
        assert!(clock.period().is_none());
        for _ in 0..99 {
            clock.tick(DT, false);
        }
        clock.tick(DT, true);
        assert_eq!(clock.state(), ClockState::Running);
        assert!((clock.period().unwrap() - 0.1).abs() < 1e-4);
        assert_eq!(clock.since_last_edge(), 0.0);
        clock.tick(DT, false);
        assert!((clock.since_last_edge() - DT).abs() < 1e-7);
        clock.reset();
        assert_eq!(clock.state(), ClockState::Idle);
    }

    #[test]
    fn constant_time_duration_scales() {
        let mode = StepMode::ConstantTime { master_steps: 16 };
        let d = TrackClock::step_duration(0.1, 8, mode);
        assert!((d - 0.2).abs() < 1e-6);
        assert_eq!(TrackClock::step_duration(0.1, 0, mode), 0.0);
        assert_eq!(TrackClock::step_duration(0.1, 5, StepMode::ClockDriven), 0.1);
    }

    #[test]
    fn clock_driven_steps_on_edges_only() {
        let mut tc = TrackClock::new();
        let mode = StepMode::ClockDriven;
        assert!(!tc.advance(&running_tick(0.1, false), mode, 8, 0.0));
        assert!(tc.advance(&running_tick(0.1, true), mode, 8, 0.0));
        assert!(!tc.advance(&running_tick(0.1, false), mode, 8, 0.5));
    }

    #[test]
    fn constant_time_waits_for_period() {
        let mut tc = TrackClock::new();
        let mode = StepMode::ConstantTime { master_steps: 4 };
        let tick = ClockTick {
            dt: DT,
            edge: false,
            period: None,
        };
        for _ in 0..1000 {
            assert!(!tc.advance(&tick, mode, 4, 0.0));
        }
    }

    #[test]
    fn late_clock_does_not_release_a_burst() {
        let mut tc = TrackClock::new();
        let mode = StepMode::ConstantTime { master_steps: 16 };
        let idle = ClockTick {
            dt: DT,
            edge: false,
            period: None,
        };
        for _ in 0..3000 {
            assert!(!tc.advance(&idle, mode, 16, 0.0));
        }
        assert_eq!(tc.elapsed(), 0.0);

        // 100 ms steps: 150 ms holds exactly one
        let steps = (0..150)
            .filter(|_| tc.advance(&running_tick(0.1, false), mode, 16, 0.0))
            .count();
        assert_eq!(steps, 1);
    }

    #[test]
    fn shorter_period_does_not_step_twice_in_a_row() {
        let mut tc = TrackClock::new();
        let mode = StepMode::ConstantTime { master_steps: 4 };
        // 390 ms accumulated toward a 400 ms step
        for _ in 0..390 {
            assert!(!tc.advance(&running_tick(0.4, false), mode, 4, 0.0));
        }
        // tempo jumps to 10 ms steps: one step now, the next 10 frames later
        assert!(tc.advance(&running_tick(0.01, false), mode, 4, 0.0));
        assert!(!tc.advance(&running_tick(0.01, false), mode, 4, 0.0));
        assert!((tc.current_step_duration() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn constant_time_cycle_spans_master_steps() {
        let mut tc = TrackClock::new();
        let mode = StepMode::ConstantTime { master_steps: 16 };
        let period = 0.1;
        let mut frames = 0usize;
        let mut steps = 0;
        while steps < 7 {
            frames += 1;
            if tc.advance(&running_tick(period, false), mode, 7, 0.0) {
                steps += 1;
            }
        }
        let elapsed = frames as f32 * DT;
        assert!((elapsed - 1.6).abs() <= DT * 1.5, "cycle took {elapsed}s");
    }

    #[test]
    fn swing_shifts_without_drift() {
        let mode = StepMode::ConstantTime { master_steps: 4 };
        let mut straight = TrackClock::new();
        let mut swung = TrackClock::new();
        let mut straight_times = Vec::new();
        let mut swung_times = Vec::new();
        let mut swung_steps = 0usize;
        for frame in 1..=2000 {
            let tick = running_tick(0.1, false);
            if straight.advance(&tick, mode, 4, 0.0) {
                straight_times.push(frame);
            }
            // odd steps (the ones moved into at 1, 3, ...) are delayed by 25%
            let next = swung_steps + 1;
            let swing = if next % 2 == 1 { 0.25 } else { 0.0 };
            if swung.advance(&tick, mode, 4, swing) {
                swung_times.push(frame);
                swung_steps += 1;
                let expected = if swung_steps % 2 == 1 { 0.025 } else { 0.0 };
                assert!((swung.last_swing_duration() - expected).abs() < 1e-6);
                assert!((swung.current_step_duration() - 0.1).abs() < 1e-6);
            }
        }
        assert!(swung_times.len() >= 18);
        for i in 0..18 {
            let delta = swung_times[i] as i64 - straight_times[i] as i64;
            if i % 2 == 0 {
                // step i+1 is odd: shifted by a quarter of 100ms
                assert!((delta - 25).abs() <= 1, "step {i} delta {delta}");
            } else {
                assert!(delta.abs() <= 1, "step {i} delta {delta}");
            }
        }
    }
}
