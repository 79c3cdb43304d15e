//! Head/body particle propagation and circular weighted estimation
//!
//! This crate provides the two numeric primitives at the heart of a particle-filter tracker whose
//! state mixes ordinary continuous quantities with circular ones: the diffusion step that
//! turns one particle population into the next, and the weighted estimation step that reduces a
//! weighted population to a single best estimate. The observation model that produces the
//! weights, the resampling scheme, and any video I/O live outside this crate; the enclosing filter
//! loop is expected to run
//!
//! ```text
//! propagate -> weight (external) -> estimate -> resample (external) -> repeat
//! ```
//!
//! This crate is primarily built off of a handful of additional dependencies:
//! - [`rand`](https://crates.io/crates/rand) and [`rand_distr`](https://crates.io/crates/rand_distr): Provides the seeded generators and the normal distribution used for diffusion noise.
//! - [`nalgebra`](https://crates.io/crates/nalgebra): Provides the 2-D vectors used to accumulate circular resultants and the fixed-size state vector conversions.
//! - [`rayon`](https://crates.io/crates/rayon): Provides the data-parallel dispatch over large populations.
//! - [`serde`](https://crates.io/crates/serde): Provides configuration (de)serialization to JSON, YAML and TOML.
//!
//! ## Crate overview
//!
//! This crate is organized into several modules:
//! - [circular]: Contains the [`Orientation`](circular::Orientation) type for directions in eighths of a turn and the weighted resultant used for circular means.
//! - [particle]: Contains the [`HeadBodyParticle`] state type.
//! - [sampler]: Contains the per-dimension Gaussian samplers and their seeding.
//! - [generator]: Contains the [`ParticleGenerator`] trait and the [`HeadBodyParticleGenerator`] implementation.
//! - [dispatch]: Contains sequential and rayon-parallel population-level propagation and estimation.
//! - [config]: Contains the generator configuration and its file formats.
//! - [error]: Contains the error types reported by configuration and estimation.
//!
//! ## State definition
//!
//! A particle is the five-element state
//!
//! $$
//! p = [x, y, s, d_h, d_b]
//! $$
//!
//! Where:
//! - $x$ and $y$ are the image position of the tracked person (pixels).
//! - $s$ is the scale of the person's bounding region (unitless).
//! - $d_h$ and $d_b$ are the head and body direction deltas in eighths of a turn (one sector is 45°).
//!
//! No field is bounded in storage. The direction fields are circular with modulus 8, which is only
//! relevant when they are compared or averaged. That is handled by [`circular::Orientation`].
//!
//! ## Diffusion
//!
//! Propagation adds independent zero-mean Gaussian noise to every dimension:
//!
//! $$
//! p'_k = p_k + \varepsilon_k, \quad \varepsilon_k \sim \mathcal{N}(0, \sigma_k^2)
//! $$
//!
//! Each dimension has its own generator, seeded once at construction. A generator can be shared
//! across threads; each call to [`ParticleGenerator::generate`] holds the sampler lock for its five
//! draws and nothing else.
//!
//! ## Weighted estimation
//!
//! Position and scale use the weighted arithmetic mean $\bar{v} = \sum_i w_i v_i / \sum_i w_i$.
//! Directions cannot be averaged this way (sectors 0 and 7 are neighbours, yet their arithmetic mean
//! is 3.5), so each direction sample is mapped onto the unit circle and the weighted vectors are
//! summed:
//!
//! $$
//! V = \sum_i w_i (\cos\theta_i, \sin\theta_i), \quad \theta_i = d_i \frac{2\pi}{8}, \quad
//! \bar{d} = \operatorname{atan2}(V_y, V_x) \frac{8}{2\pi}
//! $$
//!
//! When $|V|^2$ falls at or below the configured degeneracy threshold (default $10^{-10}$) the
//! direction vectors have cancelled and the mean is undefined; estimation then reports
//! [`EstimationError::AveragingDegenerate`] for that direction instead of returning a value.
//!
//! ## Example
//!
//! ```rust
//! use headbody::{HeadBodyParticle, HeadBodyParticleGenerator, ParticleGenerator};
//!
//! let generator = HeadBodyParticleGenerator::new(2.0, 2.0, 0.01, 0.3, 0.3).unwrap();
//! let previous = vec![HeadBodyParticle::with_sectors(120.0, 80.0, 1.0, 7, 0); 100];
//! let mut next = previous.clone();
//! for (src, dst) in previous.iter().zip(next.iter_mut()) {
//!     generator.generate(src, dst);
//! }
//! let weights = vec![1.0; next.len()];
//! let estimate = generator.weighted_mean(&next, &weights).unwrap();
//! assert!((estimate.x - 120.0).abs() < 2.0);
//! ```
pub mod circular;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod particle;
pub mod sampler;

pub use circular::{Orientation, Resultant};
pub use config::{GeneratorConfig, NoiseConfig};
pub use dispatch::DispatchStrategy;
pub use error::{
    ConfigurationError, Direction, Error, EstimationError, PreconditionError, Result,
};
pub use generator::{HeadBodyParticleGenerator, ParticleGenerator, WeightedEstimate};
pub use particle::{Dimension, HeadBodyParticle};
