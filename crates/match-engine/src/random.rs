//! Seeded pseudo-random number generator
//!
//! Every random draw the engine makes (rolls, bonus units, tie coin flips,
//! map generation, opponent choices) goes through [`RandomSource`], so a test
//! can swap in a scripted source and force an outcome.

/// Source of randomness used by the match engine.
///
/// Only `next_u64` is required; the rest are derived from it.
pub trait RandomSource {
    /// Generate next u64
    fn next_u64(&mut self) -> u64;

    /// Generate next u32
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a value in range [0, max)
    fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Uniform float in [0, 1)
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform float in [low, high)
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Dice roll in [1, 100]
    fn roll(&mut self) -> u32 {
        self.next_range(100) + 1
    }

    /// Fair coin
    fn coin_flip(&mut self) -> bool {
        self.next_f64() < 0.5
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

/// Seeded random number generator (xorshift64*)
///
/// Deterministic: same seed + index = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and a match index (the match day)
    pub fn new(seed: &[u8; 32], match_index: u32) -> Self {
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }

        state ^= (match_index as u64).wrapping_mul(0x517cc1b727220a95);

        Self::from_state(state)
    }

    /// Create an RNG from a single u64 seed
    pub fn from_u64(seed: u64) -> Self {
        Self::from_state(seed ^ 0x2545f4914f6cdd1d)
    }

    /// Create an RNG seeded from the operating system
    #[cfg(feature = "entropy")]
    pub fn from_entropy() -> Self {
        let seed: [u8; 32] = rand::random();
        Self::new(&seed, 0)
    }

    fn from_state(state: u64) -> Self {
        // xorshift never leaves the all-zero state
        let state = if state == 0 { 0x9e3779b97f4a7c15 } else { state };

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }
        rng
    }
}

impl RandomSource for SeededRng {
    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }
}
