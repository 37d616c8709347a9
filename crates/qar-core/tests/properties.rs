//! Property-based tests for qar-core pattern generation and timing.
//!
//! Covers beat counts, Euclidean evenness, Golomb interval uniqueness, the
//! accent subset invariant and constant-time cycle alignment using proptest
//! for randomized parameters.

use proptest::prelude::*;
use qar_core::{
    Algorithm, ClockTick, GOLOMB_RULERS, MAX_STEPS, Pattern, PatternParams, StepMode, TrackClock,
};

/// Beat positions of a pattern in step order.
fn beat_positions(pattern: &Pattern) -> Vec<usize> {
    (0..pattern.steps()).filter(|&i| pattern.is_beat(i)).collect()
}

/// Circular gaps between consecutive beats.
fn circular_gaps(positions: &[usize], steps: usize) -> Vec<usize> {
    let mut gaps = Vec::with_capacity(positions.len());
    for (i, &p) in positions.iter().enumerate() {
        let next = positions[(i + 1) % positions.len()];
        let gap = (next + steps - p) % steps;
        gaps.push(if gap == 0 { steps } else { gap });
    }
    gaps
}

fn any_algorithm() -> impl Strategy<Value = Algorithm> {
    prop_oneof![Just(Algorithm::Euclidean), Just(Algorithm::GolombRuler)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For every `1 <= k <= n - pad`, the Euclidean pattern has exactly `k` beats,
    /// all inside the active window, whatever the offset.
    #[test]
    fn euclidean_completeness(
        steps in 1usize..=MAX_STEPS,
        pad_seed in 0usize..MAX_STEPS,
        k_seed in 0usize..MAX_STEPS,
        offset_seed in 0usize..MAX_STEPS,
    ) {
        let pad = pad_seed % steps;
        let k = 1 + k_seed % (steps - pad);
        let offset = offset_seed % steps;
        let pattern = Pattern::generate(
            &PatternParams::new(steps, k).with_pad(pad).with_offset(offset),
        );
        prop_assert_eq!(pattern.beat_count(), k);
        prop_assert_eq!(beat_positions(&pattern).len(), k);
    }

    /// Without pad, the largest and smallest gap between consecutive beats
    /// differ by at most one step.
    #[test]
    fn euclidean_evenness(
        steps in 1usize..=MAX_STEPS,
        k_seed in 0usize..MAX_STEPS,
        offset_seed in 0usize..MAX_STEPS,
    ) {
        let k = 1 + k_seed % steps;
        let pattern = Pattern::generate(
            &PatternParams::new(steps, k).with_offset(offset_seed % steps),
        );
        let gaps = circular_gaps(&beat_positions(&pattern), steps);
        let max = *gaps.iter().max().unwrap();
        let min = *gaps.iter().min().unwrap();
        prop_assert!(max - min <= 1, "steps={} k={} gaps={:?}", steps, k, gaps);
    }

    /// Golomb patterns realize every mark of the selected ruler at distinct
    /// steps, and no interval between marks repeats.
    #[test]
    fn golomb_non_repetition(
        steps in 1usize..=MAX_STEPS,
        pad_seed in 0usize..MAX_STEPS,
        division in 1usize..=MAX_STEPS,
        offset_seed in 0usize..MAX_STEPS,
    ) {
        let pad = pad_seed % steps;
        let offset = offset_seed % steps;
        let params = PatternParams::new(steps, division)
            .with_pad(pad)
            .with_offset(offset)
            .with_algorithm(Algorithm::GolombRuler);
        let pattern = Pattern::generate(&params);
        let ruler = GOLOMB_RULERS[pattern.ruler().unwrap()];
        prop_assert_eq!(pattern.beat_count(), ruler.len());

        // undo offset and pad; what is left is the stretched ruler
        let marks: Vec<usize> = pattern
            .placement_order()
            .iter()
            .map(|&p| (p as usize + 2 * steps - offset - pad) % steps)
            .collect();
        let mut seen = vec![false; steps];
        for (i, &a) in marks.iter().enumerate() {
            for &b in &marks[i + 1..] {
                let d = b.abs_diff(a);
                prop_assert!(d > 0);
                prop_assert!(!seen[d], "interval {} repeats in {:?}", d, marks);
                seen[d] = true;
            }
        }
    }

    /// Accents only ever land on beats, for both algorithms.
    #[test]
    fn accents_are_subset_of_beats(
        steps in 0usize..=MAX_STEPS,
        division in 0usize..=MAX_STEPS,
        pad in 0usize..MAX_STEPS,
        offset in 0usize..MAX_STEPS,
        accents in 0usize..=MAX_STEPS,
        rotation in 0usize..MAX_STEPS,
        algorithm in any_algorithm(),
    ) {
        let params = PatternParams::new(steps, division)
            .with_pad(pad)
            .with_offset(offset)
            .with_accents(accents, rotation)
            .with_algorithm(algorithm);
        let pattern = Pattern::generate(&params);
        for i in 0..MAX_STEPS {
            if pattern.is_accent(i) {
                prop_assert!(pattern.is_beat(i), "accent on non-beat step {}", i);
            }
        }
        prop_assert!(pattern.accent_count() <= pattern.beat_count());
    }

    /// In constant-time mode a track of `S` steps completes its cycle in
    /// `M` clock periods, within one frame.
    #[test]
    fn constant_time_cycle_alignment(
        master in 1usize..=16,
        steps in 1usize..=MAX_STEPS,
        period in 0.05f32..0.1f32,
    ) {
        const DT: f32 = 1.0 / 1000.0;
        let mode = StepMode::ConstantTime { master_steps: master };
        let tick = ClockTick { dt: DT, edge: false, period: Some(period) };
        let mut clock = TrackClock::new();
        let mut frames = 0u64;
        let mut advanced = 0;
        while advanced < steps {
            frames += 1;
            if clock.advance(&tick, mode, steps, 0.0) {
                advanced += 1;
            }
        }
        let elapsed = frames as f64 * f64::from(DT);
        let expected = master as f64 * f64::from(period);
        prop_assert!(
            (elapsed - expected).abs() <= 1.5 * f64::from(DT),
            "M={} S={} period={} took {}s, expected {}s",
            master, steps, period, elapsed, expected
        );
    }
}
