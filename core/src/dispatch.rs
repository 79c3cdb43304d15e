//! Population-level propagation and estimation, sequential or data-parallel.
//!
//! Propagation fans [`ParticleGenerator::generate`] out over a whole population. Index `i` of
//! the source always maps to index `i` of the destination. Three strategies are available:
//!
//! - [`DispatchStrategy::Sequential`]: one loop on the calling thread.
//! - [`DispatchStrategy::SharedLock`]: rayon workers call `generate` on the same generator and
//!   take turns on its sampler lock, five draws at a time. Only sampling is serialized.
//! - [`DispatchStrategy::PerWorker`]: the population is split into one chunk per rayon thread
//!   and each chunk draws from its own [`crate::sampler::SamplerBank`] forked from the
//!   generator, so workers never contend for a lock. With a fixed seed the output depends on
//!   the size of the rayon pool.
//!
//! Estimation in parallel folds [`WeightedSums`] over chunks and merges them. Floating-point
//! addition is only approximately associative, so the result may differ from the sequential
//! sum in the last bits.
use log::{trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EstimationError, PreconditionError, Result};
use crate::generator::{
    HeadBodyParticleGenerator, ParticleGenerator, WeightedEstimate, WeightedSums, apply_noise,
    validate_weights,
};
use crate::particle::HeadBodyParticle;

/// How a population-level call is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    #[default]
    Sequential,
    SharedLock,
    PerWorker,
}

/// Propagates every particle of `src` into the same index of `dst` with any generator.
///
/// With `parallel` set, the calls are spread across the rayon pool against the one shared
/// generator; otherwise they run in order on the calling thread.
pub fn generate_all<G>(
    generator: &G,
    src: &[G::Particle],
    dst: &mut [G::Particle],
    parallel: bool,
) -> Result<()>
where
    G: ParticleGenerator + Sync,
    G::Particle: Send + Sync,
{
    check_lengths(src.len(), dst.len())?;
    if parallel {
        dst.par_iter_mut()
            .zip(src.par_iter())
            .for_each(|(d, s)| generator.generate(s, d));
    } else {
        for (d, s) in dst.iter_mut().zip(src) {
            generator.generate(s, d);
        }
    }
    Ok(())
}

/// Propagates `src` into `dst` (same length) using `strategy`.
pub fn propagate_into(
    generator: &HeadBodyParticleGenerator,
    src: &[HeadBodyParticle],
    dst: &mut [HeadBodyParticle],
    strategy: DispatchStrategy,
) -> Result<()> {
    trace!("Propagating {} particles ({strategy:?})", src.len());
    match strategy {
        DispatchStrategy::Sequential => generate_all(generator, src, dst, false),
        DispatchStrategy::SharedLock => generate_all(generator, src, dst, true),
        DispatchStrategy::PerWorker => propagate_per_worker(generator, src, dst),
    }
}

/// Returns the propagated copy of `population`.
pub fn propagate(
    generator: &HeadBodyParticleGenerator,
    population: &[HeadBodyParticle],
    strategy: DispatchStrategy,
) -> Result<Vec<HeadBodyParticle>> {
    let mut next = population.to_vec();
    propagate_into(generator, population, &mut next, strategy)?;
    Ok(next)
}

fn propagate_per_worker(
    generator: &HeadBodyParticleGenerator,
    src: &[HeadBodyParticle],
    dst: &mut [HeadBodyParticle],
) -> Result<()> {
    check_lengths(src.len(), dst.len())?;
    let chunk_size = src.len().div_ceil(rayon::current_num_threads()).max(1);
    let banks = (0..src.len().div_ceil(chunk_size))
        .map(|_| generator.fork_samplers())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    dst.par_chunks_mut(chunk_size)
        .zip(src.par_chunks(chunk_size))
        .zip(banks.into_par_iter())
        .for_each(|((dst_chunk, src_chunk), mut bank)| {
            for (d, s) in dst_chunk.iter_mut().zip(src_chunk) {
                apply_noise(s, d, &bank.draw());
            }
        });
    Ok(())
}

fn check_lengths(source_len: usize, destination_len: usize) -> Result<()> {
    if source_len != destination_len {
        return Err(PreconditionError::PopulationMismatch {
            source_len,
            destination_len,
        }
        .into());
    }
    Ok(())
}

/// Weighted estimate computed as per-chunk partial sums merged across the rayon pool.
pub fn weighted_estimate_parallel(
    generator: &HeadBodyParticleGenerator,
    particles: &[HeadBodyParticle],
    weights: &[f64],
) -> std::result::Result<WeightedEstimate, EstimationError> {
    validate_weights(particles, weights)
        .map_err(EstimationError::from)
        .and_then(|largest| {
            particles
                .par_iter()
                .zip(weights.par_iter())
                .fold(WeightedSums::default, |mut sums, (particle, &weight)| {
                    sums.accumulate(particle, weight / largest);
                    sums
                })
                .reduce(WeightedSums::default, WeightedSums::merge)
                .finish(generator.degeneracy_threshold())
        })
        .inspect_err(|e| warn!("Parallel weighted estimation failed: {e}"))
}

/// Weighted estimate using `strategy`; every strategy other than `Sequential` reduces in parallel.
pub fn weighted_estimate(
    generator: &HeadBodyParticleGenerator,
    particles: &[HeadBodyParticle],
    weights: &[f64],
    strategy: DispatchStrategy,
) -> std::result::Result<WeightedEstimate, EstimationError> {
    match strategy {
        DispatchStrategy::Sequential => generator.weighted_estimate(particles, weights),
        DispatchStrategy::SharedLock | DispatchStrategy::PerWorker => {
            weighted_estimate_parallel(generator, particles, weights)
        }
    }
}
