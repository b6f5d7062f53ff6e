//! Duration and delay sampling.
//!
//! One sampling function serves both executors; the gaussian source differs
//! per executor through the [`GaussianRng`] seam. Contract:
//!
//! - `fixed` returns `value` exactly.
//! - `normal` returns `max(min, gaussian(mean, std))` with `min`
//!   defaulting to 0.
//! - `lognormal` returns `exp(gaussian(mu, sigma))`.
//! - Anything else is an internal error: the validator pins the
//!   distribution namespace before a model reaches a sampler.
//!
//! Schedulers additionally clamp sampled durations and delays to `>= 0`
//! after sampling; clamping is a silent contract, not an error.

use latencylab_model::DurationDist;

use crate::error::SimError;
use crate::rng::GaussianRng;

/// Samples a duration (or wiring delay) in milliseconds.
pub fn sample_duration_ms<R: GaussianRng>(
    rng: &mut R,
    dist: &DurationDist,
) -> Result<f64, SimError> {
    match dist.dist.as_str() {
        "fixed" => require(dist, "value"),
        "normal" => {
            let mean = require(dist, "mean")?;
            let std = require(dist, "std")?;
            let min = dist.param("min").unwrap_or(0.0);
            Ok(rng.gaussian(mean, std)?.max(min))
        }
        "lognormal" => {
            let mu = require(dist, "mu")?;
            let sigma = require(dist, "sigma")?;
            Ok(rng.gaussian(mu, sigma)?.exp())
        }
        other => Err(SimError::Internal(format!("unhandled dist: {other}"))),
    }
}

fn require(dist: &DurationDist, key: &str) -> Result<f64, SimError> {
    dist.param(key).ok_or_else(|| {
        SimError::Internal(format!("{} dist missing parameter '{key}'", dist.dist))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;
    use latencylab_model::DurationDist;
    use std::collections::BTreeMap;

    fn dist(kind: &str, params: &[(&str, f64)]) -> DurationDist {
        DurationDist {
            dist: kind.to_owned(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn fixed_returns_value_exactly() {
        let mut rng = SimRng::for_run(0, 0);
        let d = DurationDist::fixed(12.5);
        assert_eq!(sample_duration_ms(&mut rng, &d).unwrap(), 12.5);
    }

    #[test]
    fn normal_with_zero_std_is_the_mean() {
        let mut rng = SimRng::for_run(0, 0);
        let d = dist("normal", &[("mean", 8.0), ("std", 0.0)]);
        assert_eq!(sample_duration_ms(&mut rng, &d).unwrap(), 8.0);
    }

    #[test]
    fn normal_clamps_to_min() {
        let mut rng = SimRng::for_run(0, 0);
        let d = dist("normal", &[("mean", 1.0), ("std", 0.0), ("min", 5.0)]);
        assert_eq!(sample_duration_ms(&mut rng, &d).unwrap(), 5.0);
    }

    #[test]
    fn normal_min_defaults_to_zero() {
        let mut rng = SimRng::for_run(0, 0);
        let d = dist("normal", &[("mean", -100.0), ("std", 0.0)]);
        assert_eq!(sample_duration_ms(&mut rng, &d).unwrap(), 0.0);
    }

    #[test]
    fn lognormal_with_zero_sigma_is_exp_mu() {
        let mut rng = SimRng::for_run(0, 0);
        let d = dist("lognormal", &[("mu", 2.0), ("sigma", 0.0)]);
        let sampled = sample_duration_ms(&mut rng, &d).unwrap();
        assert!((sampled - 2.0f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn unknown_dist_is_an_internal_error() {
        let mut rng = SimRng::for_run(0, 0);
        let d = dist("pareto", &[("alpha", 2.0)]);
        let err = sample_duration_ms(&mut rng, &d).unwrap_err();
        assert!(err.to_string().contains("unhandled dist: pareto"));
    }

    #[test]
    fn missing_parameter_is_an_internal_error() {
        let mut rng = SimRng::for_run(0, 0);
        let d = dist("normal", &[("mean", 1.0)]);
        let err = sample_duration_ms(&mut rng, &d).unwrap_err();
        assert!(err.to_string().contains("missing parameter 'std'"));
    }
}
