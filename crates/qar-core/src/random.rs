//! Injectable random source for probability gates.

/// Uniform random source in `[0, 1)`.
///
/// The engine owns one of these instead of reaching for a global RNG, so a
/// seeded generator gives reproducible probability draws in tests.
pub trait RandomSource {
    /// Next uniform sample in `[0, 1)`.
    fn next_f32(&mut self) -> f32;
}

/// Xorshift32 generator.
#[derive(Clone, Copy, Debug)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Default seed used by [`Default`].
    pub const DEFAULT_SEED: u32 = 0x1234_5678;

    /// Create a generator. A zero seed is replaced, xorshift cannot leave zero.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { Self::DEFAULT_SEED } else { seed },
        }
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl RandomSource for Xorshift32 {
    #[inline]
    fn next_f32(&mut self) -> f32 {
        // top 24 bits give an exact f32 mantissa
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// A source that always returns the same value. Handy for forcing gates open
/// (`0.0`) or shut (`1.0`, never below any probability).
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantSource(pub f32);

impl RandomSource for ConstantSource {
    fn next_f32(&mut self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_in_unit_interval() {
        let mut rng = Xorshift32::new(7);
        for _ in 0..10_000 {
            let x = rng.next_f32();
            assert!((0.0..1.0).contains(&x), "{x}");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Xorshift32::new(99);
        let mut b = Xorshift32::new(99);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn zero_seed_still_moves() {
        let mut rng = Xorshift32::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn mean_is_near_half() {
        let mut rng = Xorshift32::default();
        let n = 20_000;
        let sum: f32 = (0..n).map(|_| rng.next_f32()).sum();
        let mean = sum / n as f32;
        assert!((mean - 0.5).abs() < 0.02, "mean {mean}");
    }
}
