//! Beat and accent pattern generation.
//!
//! Two combinatorial algorithms place beats inside a track of up to
//! [`MAX_STEPS`] steps:
//!
//! - **Euclidean**: the bucket method. Distributes `division` beats as evenly
//!   as possible across the `steps - pad` active slots.
//! - **Golomb ruler**: looks up a ruler whose pairwise mark distances are all
//!   distinct, stretches it across the active slots, and places one beat per
//!   mark. The result never repeats an inter-onset interval.
//!
//! Accents are a second Euclidean distribution nested inside the first: the
//! realized beats (in placement order) are the slots, `accents` is the count.
//!
//! Everything here is a pure function of [`PatternParams`]. No allocation.
//!
//! # Example
//!
//! ```rust
//! use qar_core::{Algorithm, Pattern, PatternParams};
//!
//! let params = PatternParams::new(8, 3).with_algorithm(Algorithm::Euclidean);
//! let pattern = Pattern::generate(&params);
//!
//! assert_eq!(pattern.beat_count(), 3);
//! assert!(pattern.is_beat(0));
//! ```

use crate::MAX_STEPS;

/// Beat placement algorithm for a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Maximally-even bucket distribution.
    #[default]
    Euclidean,
    /// Non-repeating onsets from a Golomb ruler table.
    GolombRuler,
}

impl Algorithm {
    /// The other algorithm. Used by the per-track toggle button.
    pub fn toggled(self) -> Self {
        match self {
            Algorithm::Euclidean => Algorithm::GolombRuler,
            Algorithm::GolombRuler => Algorithm::Euclidean,
        }
    }

    /// Stable name used by presets and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Euclidean => "euclidean",
            Algorithm::GolombRuler => "golomb",
        }
    }

    /// Parse a stable name back into an algorithm.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "euclidean" => Some(Algorithm::Euclidean),
            "golomb" => Some(Algorithm::GolombRuler),
            _ => None,
        }
    }
}

/// Number of rulers in [`GOLOMB_RULERS`].
pub const NUM_RULERS: usize = 10;

/// Perfect and near-perfect Golomb rulers, 1 to 6 marks.
///
/// Indices 0..=4 and 6 are the optimal rulers for 1..=6 marks. The remaining
/// entries are alternate rulers of the same order and span; they are reached
/// by divisions above 6 and when a 6-mark ruler does not fit the step budget.
pub const GOLOMB_RULERS: [&[u8]; NUM_RULERS] = [
    &[0],
    &[0, 1],
    &[0, 1, 3],
    &[0, 1, 4, 6],
    &[0, 1, 4, 9, 11],
    &[0, 2, 7, 8, 11],
    &[0, 1, 4, 10, 12, 17],
    &[0, 1, 4, 10, 15, 17],
    &[0, 1, 8, 11, 13, 17],
    &[0, 1, 8, 12, 14, 17],
];

/// Span of a ruler (position of its last mark).
fn ruler_span(ruler: &[u8]) -> usize {
    ruler.last().copied().unwrap_or(0) as usize
}

/// Preferred ruler for a given division, before the budget check.
fn preferred_ruler(division: usize) -> usize {
    match division {
        0 | 1 => 0,
        2 => 1,
        3 => 2,
        4 => 3,
        5 => 4,
        6 => 6,
        7 => 7,
        8 => 8,
        _ => 9,
    }
}

/// Select the ruler for `division` that fits inside `budget` active steps.
///
/// Falls back to shorter rulers until `span + 1 <= budget`. Ruler 0 (a single
/// mark) always fits a non-empty budget.
pub fn select_ruler(division: usize, budget: usize) -> usize {
    let mut index = preferred_ruler(division);
    while index > 0 && ruler_span(GOLOMB_RULERS[index]) + 1 > budget {
        index -= 1;
    }
    index
}

/// Stretch factor applied to a ruler so sparse rulers cover the whole budget.
///
/// `ceil(budget / (span + 1))`, reduced until the last mark still lands inside
/// the budget so that stretched marks never wrap onto each other.
pub fn space_multiplier(span: usize, budget: usize) -> usize {
    if span == 0 || budget == 0 {
        return 1;
    }
    let mut multiplier = budget / (span + 1);
    if budget % (span + 1) != 0 {
        multiplier += 1;
    }
    while multiplier > 1 && span * multiplier >= budget {
        multiplier -= 1;
    }
    multiplier.max(1)
}

/// Generating parameters for one track.
///
/// Values are plain step counts. [`PatternParams::clamped`] enforces the
/// cross-parameter invariants; [`Pattern::generate`] clamps internally, so
/// callers may pass any combination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PatternParams {
    /// Total steps in the track (0..=MAX_STEPS).
    pub steps: usize,
    /// Number of beats to place.
    pub division: usize,
    /// Rotation applied to every beat position.
    pub offset: usize,
    /// Leading silent steps excluded from the active window.
    pub pad: usize,
    /// Number of accents distributed over the beats.
    pub accents: usize,
    /// Rotation of the accent distribution, in beats.
    pub accent_rotation: usize,
    /// Placement algorithm.
    pub algorithm: Algorithm,
}

impl PatternParams {
    /// Parameters with the given step count and division, everything else zero.
    pub fn new(steps: usize, division: usize) -> Self {
        Self {
            steps,
            division,
            ..Self::default()
        }
    }

    /// Set the offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set the pad.
    pub fn with_pad(mut self, pad: usize) -> Self {
        self.pad = pad;
        self
    }

    /// Set accent count and rotation.
    pub fn with_accents(mut self, accents: usize, rotation: usize) -> Self {
        self.accents = accents;
        self.accent_rotation = rotation;
        self
    }

    /// Set the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Saturate every field into its valid range.
    ///
    /// Order matters: steps first, then pad, then division against the
    /// remaining budget, then the accent fields against division.
    pub fn clamped(self) -> Self {
        let steps = self.steps.min(MAX_STEPS);
        if steps == 0 {
            return Self {
                steps: 0,
                division: 0,
                offset: 0,
                pad: 0,
                accents: 0,
                accent_rotation: 0,
                algorithm: self.algorithm,
            };
        }
        let pad = self.pad.min(steps - 1);
        let division = self.division.clamp(1, steps - pad);
        let offset = self.offset.min(steps - 1);
        let accents = self.accents.min(division);
        let accent_rotation = self.accent_rotation.min(division - 1);
        Self {
            steps,
            division,
            offset,
            pad,
            accents,
            accent_rotation,
            algorithm: self.algorithm,
        }
    }

    /// Number of steps available for beats (`steps - pad`).
    pub fn budget(&self) -> usize {
        self.steps.saturating_sub(self.pad)
    }
}

/// A generated beat/accent pattern.
///
/// Only the first [`steps`](Self::steps) entries are meaningful; the rest are
/// always `false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pattern {
    steps: usize,
    beats: [bool; MAX_STEPS],
    accents: [bool; MAX_STEPS],
    /// Beat step indices in placement order.
    order: [u8; MAX_STEPS],
    beat_count: usize,
    ruler: Option<usize>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Pattern {
    /// A pattern with no steps.
    pub const EMPTY: Self = Self {
        steps: 0,
        beats: [false; MAX_STEPS],
        accents: [false; MAX_STEPS],
        order: [0; MAX_STEPS],
        beat_count: 0,
        ruler: None,
    };

    /// Generate the pattern described by `params` (clamped first).
    pub fn generate(params: &PatternParams) -> Self {
        let p = params.clamped();
        let mut pattern = Self {
            steps: p.steps,
            ..Self::EMPTY
        };
        if p.steps == 0 {
            return pattern;
        }

        match p.algorithm {
            Algorithm::Euclidean => pattern.place_euclidean(&p),
            Algorithm::GolombRuler => pattern.place_golomb(&p),
        }
        pattern.place_accents(p.accents, p.accent_rotation);
        pattern
    }

    /// Rebuild a pattern from beat and accent flags (for example decoded from
    /// the bus). Accents on non-beats are dropped; placement order is step order.
    pub fn from_flags(steps: usize, beats: &[bool], accents: &[bool]) -> Self {
        let mut pattern = Self {
            steps: steps.min(MAX_STEPS),
            ..Self::EMPTY
        };
        for step in 0..pattern.steps {
            if beats.get(step).copied().unwrap_or(false) {
                pattern.mark(step);
                pattern.accents[step] = accents.get(step).copied().unwrap_or(false);
            }
        }
        pattern
    }

    fn mark(&mut self, step: usize) {
        if !self.beats[step] {
            self.beats[step] = true;
            self.order[self.beat_count] = step as u8;
            self.beat_count += 1;
        }
    }

    fn place_euclidean(&mut self, p: &PatternParams) {
        let n = p.budget();
        let k = p.division;
        let mut bucket = n - 1;
        for step_index in 0..n {
            bucket += k;
            if bucket >= n {
                bucket -= n;
                self.mark((step_index + p.offset + p.pad) % p.steps);
            }
        }
    }

    fn place_golomb(&mut self, p: &PatternParams) {
        let budget = p.budget();
        let index = select_ruler(p.division, budget);
        let ruler = GOLOMB_RULERS[index];
        let multiplier = space_multiplier(ruler_span(ruler), budget);
        for &mark in ruler {
            let position = mark as usize * multiplier + p.pad;
            self.mark((position + p.offset) % p.steps);
        }
        self.ruler = Some(index);
    }

    /// Euclidean distribution of `accents` over the placed beats.
    fn place_accents(&mut self, accents: usize, rotation: usize) {
        let k = self.beat_count;
        let a = accents.min(k);
        if k == 0 || a == 0 {
            return;
        }
        let mut bucket = k - 1;
        for slot in 0..k {
            bucket += a;
            if bucket >= k {
                bucket -= k;
                let step = self.order[(slot + rotation) % k] as usize;
                self.accents[step] = true;
            }
        }
    }

    /// Total steps in the pattern.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of beats placed.
    pub fn beat_count(&self) -> usize {
        self.beat_count
    }

    /// Number of accents placed.
    pub fn accent_count(&self) -> usize {
        self.accents().iter().filter(|&&a| a).count()
    }

    /// Whether `step` is a beat. Out-of-range steps are never beats.
    pub fn is_beat(&self, step: usize) -> bool {
        step < self.steps && self.beats[step]
    }

    /// Whether `step` is an accent. Out-of-range steps are never accents.
    pub fn is_accent(&self, step: usize) -> bool {
        step < self.steps && self.accents[step]
    }

    /// Beat flags for the active steps.
    pub fn beats(&self) -> &[bool] {
        &self.beats[..self.steps]
    }

    /// Accent flags for the active steps.
    pub fn accents(&self) -> &[bool] {
        &self.accents[..self.steps]
    }

    /// Beat step indices in the order they were placed.
    pub fn placement_order(&self) -> &[u8] {
        &self.order[..self.beat_count]
    }

    /// Index into [`GOLOMB_RULERS`] used for this pattern, if any.
    pub fn ruler(&self) -> Option<usize> {
        self.ruler
    }
}
