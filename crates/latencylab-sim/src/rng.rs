//! Deterministic random number generation.
//!
//! Two generators back the two executors:
//!
//! - [`SimRng`] is a hand-rolled splitmix64 stream used by the legacy v1
//!   executor. It is frozen: its seed derivation, output stream, and
//!   gaussian algorithm (Marsaglia polar) must never change, because the v1
//!   executor is the behavioral reference other executors are tested
//!   against.
//! - The v2 executor uses [`rand::rngs::SmallRng`] with `rand_distr`; its
//!   stream is only required to be reproducible for a given `(seed,
//!   run_id)`, not to match v1.
//!
//! Both plug into the sampler through the [`GaussianRng`] seam. Use generic
//! parameters (`impl GaussianRng`), not trait objects; the sampler sits on
//! the hot path of every task start.

use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};

use crate::error::SimError;

/// One round of the splitmix64 mixing function.
///
/// Also used standalone to derive per-run seeds: distinct `(seed, run_id)`
/// inputs land in well-separated states.
pub fn splitmix64(x: u64) -> u64 {
    let x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let z = x;
    let z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic, explicitly-seeded generator with an independent state per
/// run. FROZEN: the legacy executor's outputs are defined in terms of this
/// exact stream.
#[derive(Debug, Clone)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(state: u64) -> Self {
        Self { state }
    }

    /// Derives the generator for run `run_id` of a batch seeded with
    /// `seed`: the state initializer is `splitmix64(seed ^ run_id)`.
    pub fn for_run(seed: u64, run_id: u64) -> Self {
        Self::new(splitmix64(seed ^ run_id))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let z = self.state;
        let z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        let z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform `f64` in `[0, 1)` with 53 bits of precision.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Standard normal variate via the Marsaglia polar method.
    ///
    /// Computed fresh on every call; no second-variate caching, so the
    /// stream position is a pure function of the calls made so far.
    pub fn next_gaussian(&mut self) -> f64 {
        loop {
            let u = 2.0 * self.next_f64() - 1.0;
            let v = 2.0 * self.next_f64() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                return u * (-2.0 * s.ln() / s).sqrt();
            }
        }
    }
}

/// Seam between the sampler and an executor's generator.
pub trait GaussianRng {
    /// A gaussian variate with the given mean and standard deviation.
    fn gaussian(&mut self, mean: f64, std: f64) -> Result<f64, SimError>;
}

impl GaussianRng for SimRng {
    fn gaussian(&mut self, mean: f64, std: f64) -> Result<f64, SimError> {
        Ok(mean + std * self.next_gaussian())
    }
}

impl GaussianRng for SmallRng {
    fn gaussian(&mut self, mean: f64, std: f64) -> Result<f64, SimError> {
        let normal = Normal::new(mean, std).map_err(|e| {
            SimError::Internal(format!("bad normal parameters (mean={mean}, std={std}): {e}"))
        })?;
        Ok(normal.sample(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    // Reference vectors for the frozen stream. If these move, the v1
    // executor's outputs move with them.
    #[test]
    fn splitmix64_reference_vectors() {
        assert_eq!(splitmix64(0), 16_294_208_416_658_607_535);
        assert_eq!(splitmix64(1), 10_451_216_379_200_822_465);
        assert_eq!(splitmix64(0xDEAD_BEEF), 5_395_234_354_446_855_067);
    }

    #[test]
    fn frozen_stream_for_run_zero_of_seed_123() {
        let mut rng = SimRng::for_run(123, 0);
        assert_eq!(rng.next_u64(), 16_163_597_885_971_035_396);
        assert_eq!(rng.next_u64(), 10_982_231_802_386_507_451);
        assert_eq!(rng.next_u64(), 8_940_668_774_041_556_464);
    }

    #[test]
    fn same_state_yields_same_stream() {
        let mut a = SimRng::for_run(42, 7);
        let mut b = SimRng::for_run(42, 7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn distinct_runs_yield_distinct_streams() {
        let mut a = SimRng::for_run(42, 0);
        let mut b = SimRng::for_run(42, 1);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_f64_is_a_unit_uniform() {
        let mut rng = SimRng::for_run(9, 0);
        for _ in 0..1000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn polar_gaussian_is_finite_and_centered() {
        let mut rng = SimRng::for_run(5, 0);
        let n = 4000;
        let mean: f64 = (0..n).map(|_| rng.next_gaussian()).sum::<f64>() / f64::from(n);
        assert!(mean.abs() < 0.1, "sample mean {mean} too far from 0");
    }

    #[test]
    fn gaussian_seam_scales_and_shifts() {
        let mut rng = SimRng::for_run(1, 0);
        // std = 0 collapses the variate onto the mean for both impls.
        assert_eq!(rng.gaussian(42.0, 0.0).unwrap(), 42.0);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(rng.gaussian(42.0, 0.0).unwrap(), 42.0);
    }
}
