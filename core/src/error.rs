//! Error types for generator configuration and weighted estimation.
//!
//! Every failure is returned to the caller as a value. The generator never retries and never
//! substitutes a default for a quantity it could not compute; the enclosing filter loop
//! decides whether a failed frame means "tracking uncertain", "keep the previous estimate",
//! or "drop the track".
use std::fmt::{self, Display};
use std::io;

use thiserror::Error;

use crate::particle::Dimension;

/// The two circular dimensions of a head/body particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Head,
    Body,
}
impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Head => write!(f, "head direction"),
            Direction::Body => write!(f, "body direction"),
        }
    }
}
impl From<Direction> for Dimension {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Head => Dimension::HeadDirection,
            Direction::Body => Dimension::BodyDirection,
        }
    }
}

/// Invalid generator configuration, detected at construction time.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("standard deviation for {dimension} must be finite and non-negative, got {sigma}")]
    InvalidSigma { dimension: Dimension, sigma: f64 },

    #[error("degeneracy threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
}

/// Violated precondition of a population-level call. Detected before any work is done.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PreconditionError {
    #[error("particle count ({particles}) does not match weight count ({weights})")]
    LengthMismatch { particles: usize, weights: usize },

    #[error("cannot estimate from an empty particle population")]
    EmptyPopulation,

    #[error("weight sum must be positive and finite, got {0}")]
    NonPositiveWeightSum(f64),

    #[error("weight at index {index} is negative, infinite or not a number ({weight})")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("particle at index {index} has a non-finite {dimension}")]
    NonFiniteParticle { index: usize, dimension: Dimension },

    #[error("source population ({source_len}) and destination population ({destination_len}) differ in length")]
    PopulationMismatch {
        source_len: usize,
        destination_len: usize,
    },
}

/// Failure of [`crate::ParticleGenerator::weighted_mean`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EstimationError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// The weighted direction vectors cancelled out, so the circular mean is undefined.
    #[error(
        "failed to calculate {direction} average: resultant squared magnitude {squared_magnitude:e} is at or below threshold"
    )]
    AveragingDegenerate {
        direction: Direction,
        squared_magnitude: f64,
    },

    /// Finite inputs whose weighted sum still overflowed.
    #[error("weighted mean of {0} is not finite")]
    NonFiniteMean(Dimension),
}

/// Crate-level error, unifying every failure the public API can report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("estimation failed: {0}")]
    Estimation(#[from] EstimationError),

    #[error("configuration file error: {0}")]
    Io(#[from] io::Error),
}
impl From<PreconditionError> for Error {
    fn from(err: PreconditionError) -> Self {
        Error::Estimation(EstimationError::Precondition(err))
    }
}

/// Result type for fallible crate operations
pub type Result<T> = std::result::Result<T, Error>;
