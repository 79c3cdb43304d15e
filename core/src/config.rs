//! Generator configuration and its file formats.
//!
//! A [`GeneratorConfig`] can be written to and read from JSON, YAML or TOML. The generic
//! [`GeneratorConfig::to_file`] / [`GeneratorConfig::from_file`] pick the format from the file
//! extension (`.json`, `.yaml`/`.yml`, `.toml`).
//!
//! ```toml
//! degeneracy_threshold = 1e-10
//! seed = 42
//!
//! [noise]
//! sigma_x = 4.0
//! sigma_y = 4.0
//! sigma_s = 0.05
//! sigma_dh = 0.5
//! sigma_db = 0.25
//! ```
use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::circular::DEFAULT_DEGENERACY_THRESHOLD;
use crate::error::{self, ConfigurationError};
use crate::particle::Dimension;

/// Standard deviation of the zero-mean diffusion noise for each dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub sigma_s: f64,
    pub sigma_dh: f64,
    pub sigma_db: f64,
}
impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            sigma_x: 1.0,
            sigma_y: 1.0,
            sigma_s: 0.01,
            sigma_dh: 0.5,
            sigma_db: 0.5,
        }
    }
}
impl NoiseConfig {
    pub fn new(sigma_x: f64, sigma_y: f64, sigma_s: f64, sigma_dh: f64, sigma_db: f64) -> Self {
        NoiseConfig {
            sigma_x,
            sigma_y,
            sigma_s,
            sigma_dh,
            sigma_db,
        }
    }
    /// Same sigma on every dimension.
    pub fn uniform(sigma: f64) -> Self {
        Self::new(sigma, sigma, sigma, sigma, sigma)
    }
    /// No diffusion at all; propagation becomes a copy.
    pub fn zero() -> Self {
        Self::uniform(0.0)
    }
    pub fn sigma(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::X => self.sigma_x,
            Dimension::Y => self.sigma_y,
            Dimension::Scale => self.sigma_s,
            Dimension::HeadDirection => self.sigma_dh,
            Dimension::BodyDirection => self.sigma_db,
        }
    }
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for dimension in Dimension::ALL {
            let sigma = self.sigma(dimension);
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(ConfigurationError::InvalidSigma { dimension, sigma });
            }
        }
        Ok(())
    }
}

/// Full configuration of a [`crate::HeadBodyParticleGenerator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Squared resultant magnitude at or below which a circular mean is reported as degenerate.
    pub degeneracy_threshold: f64,
    /// Fixed seed for reproducible runs. `None` seeds from the wall clock.
    pub seed: Option<u64>,
    // must stay last: TOML writes tables after plain keys
    pub noise: NoiseConfig,
}
impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            degeneracy_threshold: DEFAULT_DEGENERACY_THRESHOLD,
            seed: None,
            noise: NoiseConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new(noise: NoiseConfig) -> Self {
        GeneratorConfig {
            noise,
            ..Default::default()
        }
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn with_degeneracy_threshold(mut self, threshold: f64) -> Self {
        self.degeneracy_threshold = threshold;
        self
    }
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.noise.validate()?;
        if !self.degeneracy_threshold.is_finite() || self.degeneracy_threshold < 0.0 {
            return Err(ConfigurationError::InvalidThreshold(
                self.degeneracy_threshold,
            ));
        }
        Ok(())
    }
    /// Writes the configuration to `path` in the format named by its extension.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> error::Result<()> {
        let path = path.as_ref();
        let text = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self).map_err(io::Error::other)?,
            Format::Yaml => serde_yaml::to_string(self).map_err(io::Error::other)?,
            Format::Toml => toml::to_string(self).map_err(io::Error::other)?,
        };
        fs::write(path, text)?;
        Ok(())
    }
    /// Reads a configuration from `path` in the format named by its extension. A file that
    /// parses but fails [`GeneratorConfig::validate`] is rejected as a configuration error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> error::Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let text = fs::read_to_string(path)?;
        let config: GeneratorConfig = match format {
            Format::Json => serde_json::from_str(&text).map_err(io::Error::other)?,
            Format::Yaml => serde_yaml::from_str(&text).map_err(io::Error::other)?,
            Format::Toml => toml::from_str(&text).map_err(io::Error::other)?,
        };
        config.validate()?;
        debug!("Loaded generator configuration from {}", path.display());
        Ok(config)
    }
}

/// On-disk configuration format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
    Toml,
}
impl Format {
    fn from_path(path: &Path) -> io::Result<Format> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("yaml" | "yml") => Ok(Format::Yaml),
            Some("toml") => Ok(Format::Toml),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported configuration file: {}", path.display()),
            )),
        }
    }
}
