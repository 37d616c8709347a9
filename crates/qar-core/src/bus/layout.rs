//! Fixed message layout shared by the engine and its satellites.
//!
//! A bus message is a flat `[f32; BUS_SIZE]`. Every module kind statically
//! owns a range of it; nothing is negotiated at runtime. Messages flowing
//! away from the engine carry the engine's per-track state; messages flowing
//! toward the engine carry satellite modifiers.
//!
//! ```text
//! offset  region                          direction
//! 0       engine layout    4 x 39         away from engine
//! 156     probability      4 + 4 x 18     toward engine
//! 232     swing            4 + 4 x 18     toward engine
//! 308     rotation         4 + 4          toward engine
//! 316     end
//! ```
//!
//! Per-step tables are positional: `offset + TRACK_COUNT + track * MAX_STEPS + step`.
//! The leading `TRACK_COUNT` floats are per-track enable flags; a table entry
//! is only meaningful when its track's flag is set, which keeps a zero-filled
//! message equivalent to "no satellite".

use crate::pattern::Pattern;
use crate::{MAX_STEPS, TRACK_COUNT};

/// A contiguous range of a bus message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusRegion {
    /// First index.
    pub offset: usize,
    /// Number of floats.
    pub len: usize,
}

impl BusRegion {
    /// Construct a region.
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last index.
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Whether `index` lies inside the region.
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.offset && index < self.end()
    }

    /// Whether two regions share any index.
    pub const fn overlaps(&self, other: &BusRegion) -> bool {
        self.len > 0 && other.len > 0 && self.offset < other.end() && other.offset < self.end()
    }
}

/// Floats per track in the engine layout: steps, beat index, running flag,
/// beat flags, accent flags.
pub const ENGINE_TRACK_STRIDE: usize = 3 + 2 * MAX_STEPS;

/// Engine layout region.
pub const ENGINE_REGION: BusRegion = BusRegion::new(0, TRACK_COUNT * ENGINE_TRACK_STRIDE);

/// Length of an enable-flagged per-step table.
pub const STEP_TABLE_LEN: usize = TRACK_COUNT + TRACK_COUNT * MAX_STEPS;

/// Probability table region.
pub const PROBABILITY_REGION: BusRegion = BusRegion::new(ENGINE_REGION.end(), STEP_TABLE_LEN);

/// Swing table region.
pub const SWING_REGION: BusRegion = BusRegion::new(PROBABILITY_REGION.end(), STEP_TABLE_LEN);

/// Rotation region: enable flags then one rotation per track.
pub const ROTATION_REGION: BusRegion = BusRegion::new(SWING_REGION.end(), 2 * TRACK_COUNT);

/// Total floats in a bus message.
pub const BUS_SIZE: usize = ROTATION_REGION.end();

/// Identity a module declares to its neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// The quad rhythm engine.
    RhythmEngine,
    /// Per-step probability satellite.
    ProbabilityExpander,
    /// Per-step swing satellite.
    GrooveExpander,
    /// Per-track rotation satellite.
    BeatRotatorExpander,
    /// Forwards both directions without adding anything.
    PassthroughExpander,
    /// Any module outside this family.
    Foreign,
}

/// Where a module kind keeps its own data.
///
/// `left_variable_count` floats starting at `passthrough_offset` travel toward
/// the engine; `right_variable_count` floats starting there travel away from
/// it. Everything outside is forwarded untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionLayout {
    /// First index owned by the kind.
    pub passthrough_offset: usize,
    /// Floats written into toward-engine messages.
    pub left_variable_count: usize,
    /// Floats written into away-from-engine messages.
    pub right_variable_count: usize,
}

impl RegionLayout {
    const EMPTY: Self = Self {
        passthrough_offset: 0,
        left_variable_count: 0,
        right_variable_count: 0,
    };

    /// Region written toward the engine.
    pub const fn left_region(&self) -> BusRegion {
        BusRegion::new(self.passthrough_offset, self.left_variable_count)
    }

    /// Region written away from the engine.
    pub const fn right_region(&self) -> BusRegion {
        BusRegion::new(self.passthrough_offset, self.right_variable_count)
    }
}

impl ModuleKind {
    /// Every kind in the family (excludes [`ModuleKind::Foreign`]).
    pub const FAMILY: [ModuleKind; 5] = [
        ModuleKind::RhythmEngine,
        ModuleKind::ProbabilityExpander,
        ModuleKind::GrooveExpander,
        ModuleKind::BeatRotatorExpander,
        ModuleKind::PassthroughExpander,
    ];

    /// Whether this kind is a satellite that speaks the bus protocol.
    pub fn is_satellite(self) -> bool {
        matches!(
            self,
            ModuleKind::ProbabilityExpander
                | ModuleKind::GrooveExpander
                | ModuleKind::BeatRotatorExpander
                | ModuleKind::PassthroughExpander
        )
    }

    /// Whether a satellite accepts `self` on its engine-facing side.
    pub fn is_upstream_of_satellite(self) -> bool {
        self == ModuleKind::RhythmEngine || self.is_satellite()
    }

    /// Statically owned region.
    pub const fn layout(self) -> RegionLayout {
        match self {
            ModuleKind::RhythmEngine => RegionLayout {
                passthrough_offset: ENGINE_REGION.offset,
                left_variable_count: 0,
                right_variable_count: ENGINE_REGION.len,
            },
            ModuleKind::ProbabilityExpander => RegionLayout {
                passthrough_offset: PROBABILITY_REGION.offset,
                left_variable_count: PROBABILITY_REGION.len,
                right_variable_count: 0,
            },
            ModuleKind::GrooveExpander => RegionLayout {
                passthrough_offset: SWING_REGION.offset,
                left_variable_count: SWING_REGION.len,
                right_variable_count: 0,
            },
            ModuleKind::BeatRotatorExpander => RegionLayout {
                passthrough_offset: ROTATION_REGION.offset,
                left_variable_count: ROTATION_REGION.len,
                right_variable_count: 0,
            },
            ModuleKind::PassthroughExpander | ModuleKind::Foreign => RegionLayout::EMPTY,
        }
    }

    /// Stable name used by presets and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            ModuleKind::RhythmEngine => "engine",
            ModuleKind::ProbabilityExpander => "probability",
            ModuleKind::GrooveExpander => "groove",
            ModuleKind::BeatRotatorExpander => "rotator",
            ModuleKind::PassthroughExpander => "passthrough",
            ModuleKind::Foreign => "foreign",
        }
    }

    /// Parse a stable name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::FAMILY
            .into_iter()
            .chain([ModuleKind::Foreign])
            .find(|k| k.name() == name)
    }
}

/// A bus message buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BusMessage([f32; BUS_SIZE]);

impl Default for BusMessage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BusMessage {
    /// An all-zero message: equivalent to no satellite attached.
    pub const ZERO: Self = Self([0.0; BUS_SIZE]);

    /// Zero every float.
    pub fn clear(&mut self) {
        self.0 = [0.0; BUS_SIZE];
    }

    /// Read-only view.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Mutable view.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    /// Whether `self` and `other` agree everywhere outside `region`.
    pub fn matches_outside(&self, other: &BusMessage, region: BusRegion) -> bool {
        self.0
            .iter()
            .zip(&other.0)
            .enumerate()
            .all(|(i, (a, b))| region.contains(i) || a.to_bits() == b.to_bits())
    }

    /// Copy `region` from `src` into `self`, verbatim.
    pub fn copy_region_from(&mut self, src: &[f32], region: BusRegion) {
        let end = region.end().min(src.len()).min(BUS_SIZE);
        if region.offset < end {
            self.0[region.offset..end].copy_from_slice(&src[region.offset..end]);
        }
    }
}

#[inline]
fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

#[inline]
fn get(msg: &[f32], index: usize) -> f32 {
    msg.get(index).copied().unwrap_or(0.0)
}

#[inline]
fn set(msg: &mut [f32], index: usize, value: f32) {
    if let Some(slot) = msg.get_mut(index) {
        *slot = value;
    }
}

/// Typed accessor for an enable-flagged per-step table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepTable {
    region: BusRegion,
}

/// Per-step probability written by probability satellites.
pub const PROBABILITY_TABLE: StepTable = StepTable {
    region: PROBABILITY_REGION,
};

/// Per-step swing written by groove satellites.
pub const SWING_TABLE: StepTable = StepTable {
    region: SWING_REGION,
};

impl StepTable {
    /// The region this table occupies.
    pub const fn region(&self) -> BusRegion {
        self.region
    }

    /// Index of a step value.
    pub const fn index(&self, track: usize, step: usize) -> usize {
        self.region.offset + TRACK_COUNT + track * MAX_STEPS + step
    }

    /// Whether any satellite supplied this track.
    pub fn is_enabled(&self, msg: &[f32], track: usize) -> bool {
        track < TRACK_COUNT && get(msg, self.region.offset + track) > 0.5
    }

    /// Supplied value, or `None` when the track is not enabled.
    pub fn read(&self, msg: &[f32], track: usize, step: usize) -> Option<f32> {
        if step >= MAX_STEPS || !self.is_enabled(msg, track) {
            return None;
        }
        Some(get(msg, self.index(track, step)))
    }

    /// Write a whole track and mark it enabled.
    pub fn write_track(&self, msg: &mut [f32], track: usize, values: &[f32; MAX_STEPS]) {
        if track >= TRACK_COUNT {
            return;
        }
        set(msg, self.region.offset + track, 1.0);
        for (step, &value) in values.iter().enumerate() {
            set(msg, self.index(track, step), value);
        }
    }
}

/// Typed accessor for the rotation region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationTable;

impl RotationTable {
    /// Rotation for a track, or `None` when no rotator supplied it.
    pub fn read(msg: &[f32], track: usize) -> Option<usize> {
        if track >= TRACK_COUNT || get(msg, ROTATION_REGION.offset + track) <= 0.5 {
            return None;
        }
        let raw = get(msg, ROTATION_REGION.offset + TRACK_COUNT + track);
        if raw.is_nan() || raw < 0.0 {
            return Some(0);
        }
        Some((raw as usize).min(MAX_STEPS - 1))
    }

    /// Write a track's rotation and mark it enabled.
    pub fn write(msg: &mut [f32], track: usize, rotation: usize) {
        if track >= TRACK_COUNT {
            return;
        }
        set(msg, ROTATION_REGION.offset + track, 1.0);
        set(
            msg,
            ROTATION_REGION.offset + TRACK_COUNT + track,
            rotation.min(MAX_STEPS - 1) as f32,
        );
    }
}

/// One track of the engine layout, as decoded by a satellite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineTrackState {
    /// Track step count.
    pub steps: usize,
    /// Current cursor, `-1` before the first step.
    pub beat_index: i32,
    /// Whether the track is running.
    pub running: bool,
    /// Beat and accent flags.
    pub pattern: Pattern,
}

/// Typed accessor for the engine layout region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineLayout;

impl EngineLayout {
    const fn base(track: usize) -> usize {
        ENGINE_REGION.offset + track * ENGINE_TRACK_STRIDE
    }

    /// Write one track.
    pub fn write_track(
        msg: &mut [f32],
        track: usize,
        beat_index: i32,
        running: bool,
        pattern: &Pattern,
    ) {
        if track >= TRACK_COUNT {
            return;
        }
        let base = Self::base(track);
        set(msg, base, pattern.steps() as f32);
        set(msg, base + 1, beat_index as f32);
        set(msg, base + 2, flag(running));
        for step in 0..MAX_STEPS {
            set(msg, base + 3 + step, flag(pattern.is_beat(step)));
            set(msg, base + 3 + MAX_STEPS + step, flag(pattern.is_accent(step)));
        }
    }

    /// Decode one track.
    pub fn read_track(msg: &[f32], track: usize) -> EngineTrackState {
        let (steps, beat_index) = Self::read_cursor(msg, track);
        let mut beats = [false; MAX_STEPS];
        let mut accents = [false; MAX_STEPS];
        for step in 0..steps {
            beats[step] = Self::is_beat(msg, track, step);
            accents[step] = Self::is_accent(msg, track, step);
        }
        EngineTrackState {
            steps,
            beat_index,
            running: Self::is_running(msg, track),
            pattern: Pattern::from_flags(steps, &beats, &accents),
        }
    }

    /// Step count and cursor of one track, without the pattern.
    pub fn read_cursor(msg: &[f32], track: usize) -> (usize, i32) {
        let base = Self::base(track.min(TRACK_COUNT - 1));
        let steps = get(msg, base).max(0.0) as usize;
        (steps.min(MAX_STEPS), get(msg, base + 1) as i32)
    }

    /// Whether a step is a beat on one track.
    pub fn is_beat(msg: &[f32], track: usize, step: usize) -> bool {
        track < TRACK_COUNT && step < MAX_STEPS && get(msg, Self::base(track) + 3 + step) > 0.5
    }

    /// Whether a step is an accent on one track.
    pub fn is_accent(msg: &[f32], track: usize, step: usize) -> bool {
        track < TRACK_COUNT
            && step < MAX_STEPS
            && get(msg, Self::base(track) + 3 + MAX_STEPS + step) > 0.5
    }

    /// Whether one track is running.
    pub fn is_running(msg: &[f32], track: usize) -> bool {
        track < TRACK_COUNT && get(msg, Self::base(track) + 2) > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternParams;

    #[test]
    fn regions_are_disjoint_and_packed() {
        let regions = [ENGINE_REGION, PROBABILITY_REGION, SWING_REGION, ROTATION_REGION];
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        assert_eq!(BUS_SIZE, 316);
    }

    #[test]
    fn kind_layouts_match_regions() {
        assert_eq!(ModuleKind::ProbabilityExpander.layout().left_region(), PROBABILITY_REGION);
        assert_eq!(ModuleKind::GrooveExpander.layout().left_region(), SWING_REGION);
        assert_eq!(ModuleKind::BeatRotatorExpander.layout().left_region(), ROTATION_REGION);
        assert_eq!(ModuleKind::RhythmEngine.layout().right_region(), ENGINE_REGION);
        assert_eq!(ModuleKind::PassthroughExpander.layout().left_variable_count, 0);
    }

    #[test]
    fn step_index_is_positional() {
        assert_eq!(
            PROBABILITY_TABLE.index(2, 5),
            PROBABILITY_REGION.offset + TRACK_COUNT + 2 * MAX_STEPS + 5
        );
    }

    #[test]
    fn zero_message_means_unset() {
        let msg = BusMessage::ZERO;
        for track in 0..TRACK_COUNT {
            assert_eq!(PROBABILITY_TABLE.read(msg.as_slice(), track, 0), None);
            assert_eq!(RotationTable::read(msg.as_slice(), track), None);
        }
    }

    #[test]
    fn step_table_write_then_read() {
        let mut msg = BusMessage::ZERO;
        let mut values = [0.0; MAX_STEPS];
        values[3] = 0.25;
        SWING_TABLE.write_track(msg.as_mut_slice(), 1, &values);
        assert!(SWING_TABLE.is_enabled(msg.as_slice(), 1));
        assert!(!SWING_TABLE.is_enabled(msg.as_slice(), 0));
        assert_eq!(SWING_TABLE.read(msg.as_slice(), 1, 3), Some(0.25));
        assert_eq!(SWING_TABLE.read(msg.as_slice(), 1, MAX_STEPS), None);
    }

    #[test]
    fn engine_layout_encodes_pattern() {
        let pattern = Pattern::generate(&PatternParams::new(8, 3).with_accents(1, 0));
        let mut msg = BusMessage::ZERO;
        EngineLayout::write_track(msg.as_mut_slice(), 3, 5, true, &pattern);
        assert_eq!(EngineLayout::read_cursor(msg.as_slice(), 3), (8, 5));
        let decoded = EngineLayout::read_track(msg.as_slice(), 3);
        assert_eq!(decoded.pattern.beats(), pattern.beats());
        assert_eq!(decoded.pattern.accents(), pattern.accents());
        assert!(EngineLayout::is_running(msg.as_slice(), 3));
        for step in 0..8 {
            assert_eq!(EngineLayout::is_beat(msg.as_slice(), 3, step), pattern.is_beat(step));
            assert_eq!(EngineLayout::is_accent(msg.as_slice(), 3, step), pattern.is_accent(step));
        }
    }

    #[test]
    fn short_slices_never_panic() {
        let short = [1.0f32; 4];
        assert_eq!(PROBABILITY_TABLE.read(&short, 0, 0), None);
        assert_eq!(EngineLayout::read_cursor(&short, 0), (1, 1));
        let mut msg = BusMessage::ZERO;
        msg.copy_region_from(&short, ROTATION_REGION);
        assert_eq!(msg, BusMessage::ZERO);
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ModuleKind::FAMILY {
            assert_eq!(ModuleKind::from_name(kind.name()), Some(kind));
        }
        assert!(!ModuleKind::RhythmEngine.is_satellite());
        assert!(ModuleKind::PassthroughExpander.is_satellite());
        assert!(!ModuleKind::Foreign.is_upstream_of_satellite());
    }
}
