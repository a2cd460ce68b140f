//! Deterministic random number generation for search and self-play.
//!
//! Every source of randomness in the crate (temperature-0 tie-breaks, move
//! sampling, color assignment in matches) draws from a `GameRng`. Workers and
//! per-move agents receive forks of a parent stream, so a run is reproducible
//! from a single seed regardless of how the worker pool schedules episodes.
//!
//! ```
//! use rust_azero::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//! let mut worker = rng.fork();
//!
//! let mut rng2 = GameRng::new(42);
//! let mut worker2 = rng2.fork();
//! assert_eq!(worker.gen_range_usize(0..1000), worker2.gen_range_usize(0..1000));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// SplitMix64 finalizer.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeded ChaCha8 stream with deterministic forking.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive an independent child stream.
    ///
    /// The n-th fork of a given seed is always the same stream. The child
    /// seed hashes `(seed, n)`, so a fork of a fork does not land on a
    /// sibling's seed.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        Self::new(splitmix64(self.seed ^ splitmix64(self.fork_counter)))
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Generate a random boolean with given probability of true.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability)
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Walk the cumulative sum of `probabilities` against one uniform draw.
    ///
    /// Returns the first index whose running total exceeds the draw, so
    /// zero-probability entries are never picked. When
    /// rounding leaves the total just short of the draw, the last index is
    /// returned. `None` only for an empty slice.
    pub fn sample_cumulative(&mut self, probabilities: &[f32]) -> Option<usize> {
        if probabilities.is_empty() {
            return None;
        }

        let threshold = self.uniform();
        let mut cursor = 0.0f32;
        for (i, &p) in probabilities.iter().enumerate() {
            cursor += p;
            if cursor > threshold {
                return Some(i);
            }
        }

        Some(probabilities.len() - 1)
    }
}
