//! End-to-end tests for weighted estimation
//!
//! The tests below exercise [`ParticleGenerator::weighted_mean`] and the parallel estimator in
//! [`headbody::dispatch`] on hand-built populations with known answers, then run a short
//! propagate / weight / estimate loop with a toy likelihood to check that the estimate follows a
//! target whose head direction sits on the wraparound between sectors 7 and 0.
use assert_approx_eq::assert_approx_eq;
use headbody::dispatch::{DispatchStrategy, propagate, weighted_estimate};
use headbody::{
    Direction, EstimationError, GeneratorConfig, HeadBodyParticle, HeadBodyParticleGenerator,
    NoiseConfig, Orientation, ParticleGenerator, PreconditionError,
};

fn generator(noise: NoiseConfig) -> HeadBodyParticleGenerator {
    HeadBodyParticleGenerator::from_config(GeneratorConfig::new(noise).with_seed(1234)).unwrap()
}

/// Gaussian likelihood of a particle given a target state, using circular distance for the
/// direction fields.
fn likelihood(particle: &HeadBodyParticle, target: &HeadBodyParticle) -> f64 {
    let dx = particle.x - target.x;
    let dy = particle.y - target.y;
    let dh = particle.dh.difference(target.dh);
    let db = particle.db.difference(target.db);
    (-0.5 * ((dx * dx + dy * dy) / 25.0 + (dh * dh + db * db) / 0.25)).exp()
}

#[test]
fn uniform_sectors_are_degenerate_for_head_direction() {
    let generator = generator(NoiseConfig::zero());
    let particles: Vec<_> = (0..8)
        .map(|sector| HeadBodyParticle::with_sectors(0.0, 0.0, 1.0, sector, 0))
        .collect();
    match generator.weighted_mean(&particles, &[0.125; 8]) {
        Err(EstimationError::AveragingDegenerate {
            direction,
            squared_magnitude,
        }) => {
            assert_eq!(direction, Direction::Head);
            assert!(squared_magnitude <= 1e-10);
        }
        other => panic!("expected a degenerate head average, got {other:?}"),
    }
}

#[test]
fn shared_direction_is_recovered_for_any_weights() {
    let generator = generator(NoiseConfig::zero());
    let particles: Vec<_> = (0..5)
        .map(|i| HeadBodyParticle::new(i as f64, 2.0 * i as f64, 1.0, 3.0, 3.0))
        .collect();
    for weights in [
        [1.0, 2.0, 3.0, 4.0, 5.0],
        [1e-6, 1e-6, 1e-6, 1e-6, 1e3],
        [0.0, 0.0, 7.5, 0.0, 0.0],
    ] {
        let mean = generator.weighted_mean(&particles, &weights).unwrap();
        assert_approx_eq!(mean.dh.value(), 3.0);
        assert_approx_eq!(mean.db.value(), 3.0);
        assert_approx_eq!(mean.y, 2.0 * mean.x);
    }
}

#[test]
fn linear_means_follow_weights() {
    let generator = generator(NoiseConfig::zero());
    let particles = vec![
        HeadBodyParticle::new(0.0, 0.0, 1.0, 0.0, 0.0),
        HeadBodyParticle::new(10.0, 0.0, 1.0, 0.0, 0.0),
    ];
    assert_approx_eq!(generator.weighted_mean(&particles, &[1.0, 1.0]).unwrap().x, 5.0);
    assert_approx_eq!(generator.weighted_mean(&particles, &[3.0, 1.0]).unwrap().x, 2.5);
}

#[test]
fn preconditions_are_reported_not_patched() {
    let generator = generator(NoiseConfig::zero());
    let particles = vec![HeadBodyParticle::default(); 3];
    let cases: [(&[HeadBodyParticle], &[f64]); 3] = [
        (&particles, &[0.0, 0.0, 0.0]),
        (&particles, &[1.0, 1.0]),
        (&[], &[]),
    ];
    for (particles, weights) in cases {
        for strategy in [DispatchStrategy::Sequential, DispatchStrategy::SharedLock] {
            let result = weighted_estimate(&generator, particles, weights, strategy);
            assert!(
                matches!(result, Err(EstimationError::Precondition(_))),
                "{strategy:?}: {result:?}"
            );
        }
    }
    assert_eq!(
        generator.weighted_mean(&particles, &[0.0, 0.0, 0.0]),
        Err(EstimationError::Precondition(
            PreconditionError::NonPositiveWeightSum(0.0)
        ))
    );
}

#[test]
fn tracking_loop_follows_target_across_wraparound() {
    let generator = generator(NoiseConfig::new(3.0, 3.0, 0.0, 0.4, 0.4));
    let target = HeadBodyParticle::new(100.0, 60.0, 1.0, 7.6, 0.2);
    let mut population = vec![HeadBodyParticle::new(95.0, 64.0, 1.0, 0.5, 7.5); 2_000];

    let mut estimate = population[0];
    for _ in 0..10 {
        population = propagate(&generator, &population, DispatchStrategy::SharedLock).unwrap();
        let weights: Vec<f64> = population.iter().map(|p| likelihood(p, &target)).collect();
        estimate = weighted_estimate(&generator, &population, &weights, DispatchStrategy::Sequential)
            .unwrap()
            .mean;
        // collapse onto the estimate in place of an external resampler
        population = vec![estimate; population.len()];
    }
    assert_approx_eq!(estimate.x, target.x, 2.0);
    assert_approx_eq!(estimate.y, target.y, 2.0);
    assert!(estimate.dh.difference(target.dh).abs() < 0.3);
    assert!(estimate.db.difference(target.db).abs() < 0.3);
    // the mean direction is reported in (-4, 4]
    assert!(estimate.dh.value() < 0.0);
    assert_approx_eq!(
        Orientation::new(estimate.dh.value()).wrapped().value(),
        7.6,
        0.3
    );
}
