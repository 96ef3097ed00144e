//! Deterministic stream of uniform random numbers driving the samplers.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seedable source of uniform numbers in `[0, 1)`.
///
/// Two contexts created from the same seed produce the same sequence, which
/// keeps Monte Carlo estimates reproducible. Use [`SamplingContext::split`] to
/// hand independent streams to worker threads.
#[derive(Debug, Clone)]
pub struct SamplingContext {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SamplingContext {
    /// Creates a new stream from the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The seed the stream was created with.
    pub fn seed(&self) -> u64 { self.seed }

    /// Draws the next number in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 { self.rng.gen::<f32>() }

    /// Draws the next `N` numbers in `[0, 1)`.
    #[inline]
    pub fn next_array<const N: usize>(&mut self) -> [f32; N] {
        let mut out = [0.0; N];
        out.iter_mut().for_each(|x| *x = self.rng.gen::<f32>());
        out
    }

    /// Derives an independent stream sharing the seed, selected by `index`.
    pub fn split(&self, index: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(index + 1);
        Self {
            seed: self.seed,
            rng,
        }
    }
}

impl Default for SamplingContext {
    fn default() -> Self { Self::new(0) }
}
