//! Particle diffusion and weighted estimation for head/body particles.
//!
//! [`HeadBodyParticleGenerator`] owns one [`SamplerBank`] shared by every call to
//! [`ParticleGenerator::generate`]. Each call takes the bank's lock once, draws its five noise
//! values, and releases the lock before writing the destination particle, so concurrent
//! callers never interleave draws and each particle gets a consistent 5-tuple of noise.
//!
//! Estimation reduces a weighted population to one particle. Position and scale use the
//! weighted arithmetic mean; head and body directions use the circular mean of
//! [`crate::circular::Resultant`], which fails with
//! [`EstimationError::AveragingDegenerate`] instead of inventing a direction when the
//! weighted direction vectors cancel.
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};

use crate::circular::{Orientation, Resultant};
use crate::config::{GeneratorConfig, NoiseConfig};
use crate::error::{ConfigurationError, Direction, EstimationError, PreconditionError};
use crate::particle::{Dimension, HeadBodyParticle, STATE_SIZE};
use crate::sampler::{SamplerBank, Seeder};

/// Propagation and estimation over a population of particles.
///
/// Particle sets and weight sets are parallel slices: `weights[i]` belongs to `particles[i]`.
pub trait ParticleGenerator {
    type Particle;
    /// Overwrites `dst` with a diffused copy of `src`.
    fn generate(&self, src: &Self::Particle, dst: &mut Self::Particle);
    /// Reduces a weighted population to a single best estimate.
    fn weighted_mean(
        &self,
        particles: &[Self::Particle],
        weights: &[f64],
    ) -> Result<Self::Particle, EstimationError>;
}

/// Result of a weighted estimation, with concentration diagnostics for the circular dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedEstimate {
    pub mean: HeadBodyParticle,
    /// Effective number of particles behind the estimate, `(sum w)^2 / sum w^2`.
    pub effective_sample_size: f64,
    /// Mean resultant length of the head direction, in `[0, 1]`.
    pub head_concentration: f64,
    /// Mean resultant length of the body direction, in `[0, 1]`.
    pub body_concentration: f64,
}

/// Partial sums of a weighted population. Sums over disjoint chunks combine with
/// [`WeightedSums::merge`].
///
/// Weights are expected relative to the largest weight of the population (see
/// [`validate_weights`]), which keeps every sum finite for any finite weight set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeightedSums {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub weight: f64,
    pub weight_squared: f64,
    pub head: Resultant,
    pub body: Resultant,
}
impl WeightedSums {
    pub fn accumulate(&mut self, particle: &HeadBodyParticle, weight: f64) {
        self.x += particle.x * weight;
        self.y += particle.y * weight;
        self.s += particle.s * weight;
        self.weight += weight;
        self.weight_squared += weight * weight;
        self.head.accumulate(particle.dh, weight);
        self.body.accumulate(particle.db, weight);
    }
    pub fn merge(self, other: WeightedSums) -> WeightedSums {
        WeightedSums {
            x: self.x + other.x,
            y: self.y + other.y,
            s: self.s + other.s,
            weight: self.weight + other.weight,
            weight_squared: self.weight_squared + other.weight_squared,
            head: self.head.merge(other.head),
            body: self.body.merge(other.body),
        }
    }
    /// Turns the sums into an estimate. Expects a positive total weight.
    pub fn finish(&self, threshold: f64) -> Result<WeightedEstimate, EstimationError> {
        if !(self.weight > 0.0) || !self.weight.is_finite() {
            return Err(PreconditionError::NonPositiveWeightSum(self.weight).into());
        }
        let mut mean = HeadBodyParticle::default();
        for (dimension, sum) in [
            (Dimension::X, self.x),
            (Dimension::Y, self.y),
            (Dimension::Scale, self.s),
        ] {
            let value = sum / self.weight;
            if !value.is_finite() {
                return Err(EstimationError::NonFiniteMean(dimension));
            }
            mean.set(dimension, value);
        }
        mean.dh = circular_mean(&self.head, Direction::Head, threshold)?;
        mean.db = circular_mean(&self.body, Direction::Body, threshold)?;
        Ok(WeightedEstimate {
            mean,
            effective_sample_size: self.weight * self.weight / self.weight_squared,
            head_concentration: self.head.mean_resultant_length(self.weight),
            body_concentration: self.body.mean_resultant_length(self.weight),
        })
    }
}

fn circular_mean(
    resultant: &Resultant,
    direction: Direction,
    threshold: f64,
) -> Result<Orientation, EstimationError> {
    let squared_magnitude = resultant.squared_magnitude();
    if !squared_magnitude.is_finite() {
        return Err(EstimationError::NonFiniteMean(direction.into()));
    }
    resultant
        .mean(threshold)
        .ok_or(EstimationError::AveragingDegenerate {
            direction,
            squared_magnitude,
        })
}

/// Checks the preconditions of a weighted estimation and returns the largest weight.
///
/// Accumulating `w / largest` instead of `w` leaves every mean unchanged and bounds the
/// weight sum by the population size, so no finite weight set can overflow it.
pub fn validate_weights(
    particles: &[HeadBodyParticle],
    weights: &[f64],
) -> Result<f64, PreconditionError> {
    if particles.len() != weights.len() {
        return Err(PreconditionError::LengthMismatch {
            particles: particles.len(),
            weights: weights.len(),
        });
    }
    if particles.is_empty() {
        return Err(PreconditionError::EmptyPopulation);
    }
    if let Some((index, &weight)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !(**w >= 0.0 && w.is_finite()))
    {
        return Err(PreconditionError::InvalidWeight { index, weight });
    }
    let largest = weights.iter().copied().fold(0.0, f64::max);
    if largest == 0.0 {
        return Err(PreconditionError::NonPositiveWeightSum(0.0));
    }
    for (index, particle) in particles.iter().enumerate() {
        if let Some(dimension) = Dimension::ALL
            .into_iter()
            .find(|&d| !particle.get(d).is_finite())
        {
            return Err(PreconditionError::NonFiniteParticle { index, dimension });
        }
    }
    Ok(largest)
}

/// Effective number of particles, `1 / sum(w_norm^2)`. Zero for an empty or all-zero weight set.
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let largest = weights.iter().copied().fold(0.0, f64::max);
    if !(largest > 0.0) || !largest.is_finite() {
        return 0.0;
    }
    let (sum, sum_of_squares) = weights
        .iter()
        .map(|w| w / largest)
        .fold((0.0, 0.0), |(sum, squares), w| (sum + w, squares + w * w));
    sum * sum / sum_of_squares
}

/// Writes `src + noise` into `dst`, with `noise` indexed by [`Dimension::index`].
pub fn apply_noise(src: &HeadBodyParticle, dst: &mut HeadBodyParticle, noise: &[f64; STATE_SIZE]) {
    dst.x = src.x + noise[Dimension::X.index()];
    dst.y = src.y + noise[Dimension::Y.index()];
    dst.s = src.s + noise[Dimension::Scale.index()];
    dst.dh = src.dh + noise[Dimension::HeadDirection.index()];
    dst.db = src.db + noise[Dimension::BodyDirection.index()];
}

pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering poisoned sampler lock");
        poisoned.into_inner()
    })
}

/// Gaussian diffusion and circular weighted estimation for [`HeadBodyParticle`]s.
#[derive(Debug)]
pub struct HeadBodyParticleGenerator {
    config: GeneratorConfig,
    samplers: Mutex<SamplerBank>,
    seeder: Mutex<Seeder>,
}

impl HeadBodyParticleGenerator {
    /// Generator with the given per-dimension sigmas, seeded from the wall clock.
    pub fn new(
        sigma_x: f64,
        sigma_y: f64,
        sigma_s: f64,
        sigma_dh: f64,
        sigma_db: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::from_config(GeneratorConfig::new(NoiseConfig::new(
            sigma_x, sigma_y, sigma_s, sigma_dh, sigma_db,
        )))
    }
    pub fn from_config(config: GeneratorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let mut seeder = match config.seed {
            Some(seed) => Seeder::from_seed(seed),
            None => Seeder::from_wall_clock(),
        };
        let samplers = SamplerBank::new(&config.noise, &mut seeder)?;
        debug!(
            "Created head/body generator: sigmas {:?}, degeneracy threshold {:e}, seed {:?}",
            config.noise, config.degeneracy_threshold, config.seed
        );
        Ok(HeadBodyParticleGenerator {
            config,
            samplers: Mutex::new(samplers),
            seeder: Mutex::new(seeder),
        })
    }
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
    pub fn degeneracy_threshold(&self) -> f64 {
        self.config.degeneracy_threshold
    }
    /// Draws one noise value per dimension from the shared bank, holding its lock for exactly
    /// these five draws.
    pub fn draw_noise(&self) -> [f64; STATE_SIZE] {
        lock_or_recover(&self.samplers).draw()
    }
    /// Independent sampler bank for one worker, seeded from this generator's seeder.
    pub fn fork_samplers(&self) -> Result<SamplerBank, ConfigurationError> {
        let mut seeder = lock_or_recover(&self.seeder);
        SamplerBank::new(&self.config.noise, &mut seeder)
    }
    /// Weighted mean together with the effective sample size and direction concentrations.
    pub fn weighted_estimate(
        &self,
        particles: &[HeadBodyParticle],
        weights: &[f64],
    ) -> Result<WeightedEstimate, EstimationError> {
        validate_weights(particles, weights)
            .map_err(EstimationError::from)
            .and_then(|largest| {
                let mut sums = WeightedSums::default();
                for (particle, &weight) in particles.iter().zip(weights) {
                    sums.accumulate(particle, weight / largest);
                }
                sums.finish(self.config.degeneracy_threshold)
            })
            .inspect_err(|e| warn!("Weighted estimation failed: {e}"))
    }
}

impl ParticleGenerator for HeadBodyParticleGenerator {
    type Particle = HeadBodyParticle;

    fn generate(&self, src: &HeadBodyParticle, dst: &mut HeadBodyParticle) {
        let noise = self.draw_noise();
        apply_noise(src, dst, &noise);
    }
    fn weighted_mean(
        &self,
        particles: &[HeadBodyParticle],
        weights: &[f64],
    ) -> Result<HeadBodyParticle, EstimationError> {
        self.weighted_estimate(particles, weights)
            .map(|estimate| estimate.mean)
    }
}
