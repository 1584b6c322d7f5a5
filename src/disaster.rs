use crate::effect::{EffectMap, compute_effects, proportional_effects};
use crate::geography::Geography;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::{Bernoulli, Exp, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spatial distribution of disaster epicentres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialPdf {
    /// Uniform over the bounding rectangle of the archipelago.
    #[default]
    Uniform,
}

/// Parameters of the stochastic disaster process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisasterParameters {
    /// Probability that a disaster occurs in a given sample.
    pub global_prob: f64,
    /// Distribution of the epicentre.
    pub spatial_pdf: SpatialPdf,
    /// Rate of the exponential distribution of magnitudes.
    pub magnitude_lambda: f64,
}

/// Outcome of one sample of the disaster process.
///
/// A magnitude of exactly zero means no disaster occurred, in which case the
/// epicentre is the out-of-bounds sentinel `(-1, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisasterReport {
    pub magnitude: f64,
    pub x: f64,
    pub y: f64,
}

impl DisasterReport {
    pub fn none() -> Self {
        Self {
            magnitude: 0.0,
            x: -1.0,
            y: -1.0,
        }
    }

    pub fn occurred(&self) -> bool {
        self.magnitude > 0.0
    }
}

impl Default for DisasterReport {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for DisasterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.occurred() {
            write!(
                f,
                "disaster of magnitude {:.3} at ({:.3}, {:.3})",
                self.magnitude, self.x, self.y
            )
        } else {
            write!(f, "no disaster")
        }
    }
}

/// Disaster generator bound to a geography.
///
/// The generator itself is stateless apart from the RNG it is given. The
/// caller keeps the last report and queries its effects with [`Environment::effects`].
pub struct Environment {
    geography: Geography,
    occur_dist: Bernoulli,
    mag_dist: Exp<f64>,
    x_dist: Uniform<f64>,
    y_dist: Uniform<f64>,
}

impl Environment {
    /// Create a new `Environment`.
    ///
    /// # Errors
    /// Returns an error if the parameters or bounds do not define valid
    /// distributions.
    pub fn new(geography: Geography, params: DisasterParameters) -> Result<Self> {
        let occur_dist =
            Bernoulli::new(params.global_prob).context("invalid disaster probability")?;
        let mag_dist = Exp::new(params.magnitude_lambda).context("invalid magnitude rate")?;

        let bounds = *geography.bounds();
        let (x_dist, y_dist) = match params.spatial_pdf {
            SpatialPdf::Uniform => (
                Uniform::new_inclusive(bounds.x_min, bounds.x_max)
                    .context("invalid x bounds")?,
                Uniform::new_inclusive(bounds.y_min, bounds.y_max)
                    .context("invalid y bounds")?,
            ),
        };

        Ok(Self {
            geography,
            occur_dist,
            mag_dist,
            x_dist,
            y_dist,
        })
    }

    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    /// Sample the disaster process once.
    pub fn sample_disaster<R: Rng + ?Sized>(&self, rng: &mut R) -> DisasterReport {
        if self.occur_dist.sample(rng) {
            let x = self.x_dist.sample(rng);
            let y = self.y_dist.sample(rng);
            // Zero is reserved for "no disaster".
            let magnitude = self.mag_dist.sample(rng).max(f64::MIN_POSITIVE);
            DisasterReport { magnitude, x, y }
        } else {
            DisasterReport::none()
        }
    }

    /// Raw and proportional effects of a report on every island.
    pub fn effects(&self, report: &DisasterReport) -> (EffectMap, EffectMap) {
        let individual = compute_effects(report, &self.geography);
        let proportional = proportional_effects(&individual);
        (individual, proportional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::{Bounds, IslandId};
    use rand_chacha::ChaCha12Rng;

    const N_TRIALS: usize = 10_000;

    fn environment(global_prob: f64) -> Environment {
        let ids: Vec<_> = (0..4).map(IslandId).collect();
        let bounds = Bounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: -5.0,
            y_max: 5.0,
        };
        let params = DisasterParameters {
            global_prob,
            spatial_pdf: SpatialPdf::Uniform,
            magnitude_lambda: 1.0,
        };
        Environment::new(Geography::build(&ids, bounds), params).expect("invalid environment")
    }

    #[test]
    fn zero_probability_never_produces_a_disaster() {
        let env = environment(0.0);
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        for _ in 0..N_TRIALS {
            let report = env.sample_disaster(&mut rng);
            assert_eq!(report, DisasterReport::none());
        }
    }

    #[test]
    fn unit_probability_always_produces_a_disaster_within_bounds() {
        let env = environment(1.0);
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        for _ in 0..N_TRIALS {
            let report = env.sample_disaster(&mut rng);
            assert!(report.magnitude > 0.0);
            assert!(env.geography().bounds().contains(report.x, report.y));
        }
    }

    #[test]
    fn seeded_sequences_are_reproducible() {
        let env_a = environment(0.5);
        let env_b = environment(0.5);
        let mut rng_a = ChaCha12Rng::seed_from_u64(42);
        let mut rng_b = ChaCha12Rng::seed_from_u64(42);

        let seq_a: Vec<_> = (0..64).map(|_| env_a.sample_disaster(&mut rng_a)).collect();
        let seq_b: Vec<_> = (0..64).map(|_| env_b.sample_disaster(&mut rng_b)).collect();
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().any(|report| report.occurred()));
        assert!(seq_a.iter().any(|report| !report.occurred()));
    }

    #[test]
    fn magnitudes_follow_the_exponential_mean() {
        let env = environment(1.0);
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mean = (0..N_TRIALS)
            .map(|_| env.sample_disaster(&mut rng).magnitude)
            .sum::<f64>()
            / N_TRIALS as f64;
        assert!((mean - 1.0).abs() < 0.1, "mean magnitude is {mean}");
    }

    #[test]
    fn effects_without_disaster_are_zero() {
        let env = environment(0.0);
        let (individual, proportional) = env.effects(&DisasterReport::none());
        assert_eq!(individual.len(), 4);
        assert!(individual.values().all(|&eff| eff == 0.0));
        assert!(proportional.values().all(|&eff| eff == 0.0));
    }
}
