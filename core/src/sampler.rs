//! Gaussian noise sources for particle diffusion.
//!
//! Each state dimension gets its own [`RandomSampler`] with its own generator, so noise is
//! uncorrelated across dimensions. All five generators are seeded from one [`Seeder`], which
//! is drawn from once per dimension so the five streams are distinct rather than re-derived
//! from the same seed.
use chrono::Utc;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::config::NoiseConfig;
use crate::error::ConfigurationError;
use crate::particle::{Dimension, STATE_SIZE};

/// Zero-mean normal sampler with a fixed standard deviation.
#[derive(Clone, Debug)]
pub struct RandomSampler {
    normal: Normal<f64>,
    rng: StdRng,
}
impl RandomSampler {
    /// Creates a sampler for `dimension`. A negative or non-finite `sigma` is rejected here so
    /// that drawing can never fail.
    pub fn new(dimension: Dimension, sigma: f64, seed: u64) -> Result<Self, ConfigurationError> {
        let invalid = ConfigurationError::InvalidSigma { dimension, sigma };
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(invalid);
        }
        let normal = Normal::new(0.0, sigma).map_err(|_| invalid)?;
        Ok(RandomSampler {
            normal,
            rng: StdRng::seed_from_u64(seed),
        })
    }
    pub fn sigma(&self) -> f64 {
        self.normal.std_dev()
    }
    pub fn draw(&mut self) -> f64 {
        self.normal.sample(&mut self.rng)
    }
}

/// Uniform integer seed source used to seed the per-dimension samplers.
#[derive(Clone, Debug)]
pub struct Seeder {
    rng: StdRng,
    upper: u64,
}
impl Seeder {
    /// Seeds are drawn uniformly from `0..=upper`.
    pub fn new(seed: u64, upper: u64) -> Self {
        Seeder {
            rng: StdRng::seed_from_u64(seed),
            upper,
        }
    }
    /// Seeder keyed to the current wall-clock time; seeds fall in `0..=now` (Unix seconds).
    pub fn from_wall_clock() -> Self {
        let now = Utc::now();
        let upper = now.timestamp().max(1) as u64;
        let seed = now.timestamp_micros() as u64;
        debug!("Seeding samplers from wall clock ({seed})");
        Self::new(seed, upper)
    }
    /// Reproducible seeder for a fixed seed; seeds span the full `u64` range.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(seed, u64::MAX)
    }
    pub fn upper(&self) -> u64 {
        self.upper
    }
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random_range(0..=self.upper)
    }
}

/// The five per-dimension samplers of one generator, drawn together.
#[derive(Clone, Debug)]
pub struct SamplerBank {
    samplers: [RandomSampler; STATE_SIZE],
}
impl SamplerBank {
    /// Builds one sampler per dimension in `x, y, s, dh, db` order, taking one seed from
    /// `seeder` for each.
    pub fn new(noise: &NoiseConfig, seeder: &mut Seeder) -> Result<Self, ConfigurationError> {
        let mut build = |dimension: Dimension| {
            RandomSampler::new(dimension, noise.sigma(dimension), seeder.next_seed())
        };
        Ok(SamplerBank {
            samplers: [
                build(Dimension::X)?,
                build(Dimension::Y)?,
                build(Dimension::Scale)?,
                build(Dimension::HeadDirection)?,
                build(Dimension::BodyDirection)?,
            ],
        })
    }
    pub fn sampler(&self, dimension: Dimension) -> &RandomSampler {
        &self.samplers[dimension.index()]
    }
    /// One draw from every sampler, indexed by [`Dimension::index`].
    pub fn draw(&mut self) -> [f64; STATE_SIZE] {
        let mut noise = [0.0; STATE_SIZE];
        for (value, sampler) in noise.iter_mut().zip(self.samplers.iter_mut()) {
            *value = sampler.draw();
        }
        noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_negative_sigma_rejected() {
        let err = RandomSampler::new(Dimension::Y, -0.1, 1).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidSigma {
                dimension: Dimension::Y,
                sigma: -0.1
            }
        );
        assert!(RandomSampler::new(Dimension::X, f64::NAN, 1).is_err());
        assert!(RandomSampler::new(Dimension::X, f64::INFINITY, 1).is_err());
    }
    #[test]
    fn test_zero_sigma_draws_zero() {
        let mut sampler = RandomSampler::new(Dimension::Scale, 0.0, 7).unwrap();
        for _ in 0..100 {
            assert_eq!(sampler.draw(), 0.0);
        }
    }
    #[test]
    fn test_sampler_statistics() {
        let mut sampler = RandomSampler::new(Dimension::X, 2.0, 42).unwrap();
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| sampler.draw()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert_approx_eq!(mean, 0.0, 0.1);
        assert_approx_eq!(var.sqrt(), 2.0, 0.1);
        assert_eq!(sampler.sigma(), 2.0);
    }
    #[test]
    fn test_seeder_streams_are_distinct() {
        let mut seeder = Seeder::from_seed(3);
        let seeds: Vec<u64> = (0..STATE_SIZE).map(|_| seeder.next_seed()).collect();
        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }
    #[test]
    fn test_seeder_range_is_bounded() {
        let mut seeder = Seeder::new(11, 10);
        for _ in 0..1000 {
            assert!(seeder.next_seed() <= 10);
        }
        assert!(Seeder::from_wall_clock().upper() >= 1);
        // a single-value range is still a valid range
        let mut pinned = Seeder::new(3, 0);
        assert_eq!(pinned.next_seed(), 0);
    }
    #[test]
    fn test_bank_is_reproducible_for_a_seed() {
        let noise = NoiseConfig::uniform(1.0);
        let mut a = SamplerBank::new(&noise, &mut Seeder::from_seed(5)).unwrap();
        let mut b = SamplerBank::new(&noise, &mut Seeder::from_seed(5)).unwrap();
        assert_eq!(a.draw(), b.draw());
    }
    #[test]
    fn test_bank_dimensions_are_independent_streams() {
        let noise = NoiseConfig::uniform(1.0);
        let mut bank = SamplerBank::new(&noise, &mut Seeder::from_seed(9)).unwrap();
        let draws = bank.draw();
        assert_ne!(draws[0], draws[1]);
        assert_eq!(bank.sampler(Dimension::BodyDirection).sigma(), 1.0);
    }
}
