//! Start/stop chaining between tracks and between engine instances.
//!
//! A track's end-of-cycle output can be patched into another track's start
//! input (on the same engine or a neighbor), so patterns play one after the
//! other. [`ChainMode`] decides how a track with a connected start input
//! behaves:
//!
//! | Mode       | After reset                  | At end of cycle               |
//! |------------|------------------------------|-------------------------------|
//! | `None`     | running                      | keeps running                 |
//! | `Boss`     | running                      | stops if start is connected   |
//! | `Employee` | stopped if start is connected| stops if start is connected   |
//!
//! A stopped track resumes on the next rising edge at its start input.

/// Engine-wide chaining behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChainMode {
    /// Tracks always run.
    #[default]
    None,
    /// Tracks run first, then wait for a start trigger after each cycle.
    Boss,
    /// Tracks wait for a start trigger before their first cycle and after each one.
    Employee,
}

impl ChainMode {
    /// Stable name used by presets and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            ChainMode::None => "none",
            ChainMode::Boss => "boss",
            ChainMode::Employee => "employee",
        }
    }

    /// Parse a stable name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(ChainMode::None),
            "boss" => Some(ChainMode::Boss),
            "employee" => Some(ChainMode::Employee),
            _ => None,
        }
    }
}

/// Whether a track is currently allowed to advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    /// Advancing and emitting.
    #[default]
    Running,
    /// Frozen in place until a start trigger.
    Stopped,
}

/// Run/stop state machine for one track.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChainController {
    state: RunState,
}

impl ChainController {
    /// Create a running controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Shorthand for `state() == RunState::Running`.
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Initial state after reset or after the chain mode changes.
    pub fn evaluate(&mut self, mode: ChainMode, start_connected: bool) {
        self.state = match mode {
            ChainMode::Employee if start_connected => RunState::Stopped,
            _ => RunState::Running,
        };
    }

    /// Per-frame self-healing: a track with nothing that could ever restart it
    /// is never left stopped.
    pub fn refresh(&mut self, mode: ChainMode, start_connected: bool) {
        if mode == ChainMode::None || !start_connected {
            self.state = RunState::Running;
        }
    }

    /// The track wrapped past its last step. Returns `true` if it stopped.
    pub fn end_of_cycle(&mut self, mode: ChainMode, start_connected: bool) -> bool {
        if mode != ChainMode::None && start_connected {
            self.state = RunState::Stopped;
            true
        } else {
            false
        }
    }

    /// Rising edge at the start input. Returns `true` if the track was stopped
    /// and is now running.
    pub fn start(&mut self, mode: ChainMode) -> bool {
        if mode != ChainMode::None && self.state == RunState::Stopped {
            self.state = RunState::Running;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_mode_always_runs() {
        let mut c = ChainController::new();
        c.evaluate(ChainMode::None, true);
        assert!(c.is_running());
        assert!(!c.end_of_cycle(ChainMode::None, true));
        assert!(c.is_running());
    }

    #[test]
    fn boss_runs_then_waits() {
        let mut c = ChainController::new();
        c.evaluate(ChainMode::Boss, true);
        assert!(c.is_running());
        assert!(c.end_of_cycle(ChainMode::Boss, true));
        assert_eq!(c.state(), RunState::Stopped);
        assert!(c.start(ChainMode::Boss));
        assert!(c.is_running());
    }

    #[test]
    fn boss_without_start_input_never_stops() {
        let mut c = ChainController::new();
        c.evaluate(ChainMode::Boss, false);
        assert!(!c.end_of_cycle(ChainMode::Boss, false));
        assert!(c.is_running());
    }

    #[test]
    fn employee_waits_for_start() {
        let mut connected = ChainController::new();
        let mut free = ChainController::new();
        connected.evaluate(ChainMode::Employee, true);
        free.evaluate(ChainMode::Employee, false);
        assert_eq!(connected.state(), RunState::Stopped);
        assert!(free.is_running());
        assert!(connected.start(ChainMode::Employee));
        assert!(connected.is_running());
    }

    #[test]
    fn start_on_running_track_is_ignored() {
        let mut c = ChainController::new();
        c.evaluate(ChainMode::Boss, true);
        assert!(!c.start(ChainMode::Boss));
    }

    #[test]
    fn refresh_releases_unpatched_track() {
        let mut c = ChainController::new();
        c.evaluate(ChainMode::Employee, true);
        c.refresh(ChainMode::Employee, true);
        assert_eq!(c.state(), RunState::Stopped);
        c.refresh(ChainMode::Employee, false);
        assert!(c.is_running());
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in [ChainMode::None, ChainMode::Boss, ChainMode::Employee] {
            assert_eq!(ChainMode::from_name(mode.name()), Some(mode));
        }
    }
}
