//! Circular quantities measured in eighths of a turn.
//!
//! Head and body directions are quantized into eight 45° sectors. A value is stored as a plain
//! real so that propagation noise can move it between sectors, but it is compared and averaged
//! on the circle: 7.0 and 0.0 are one sector apart, not seven. Storage never wraps, so an
//! [`Orientation`] of 9.5 is legal and equivalent to 1.5.
//!
//! Averaging works on the unit circle. Each sample contributes a weighted unit vector
//!
//! $$
//! V = \sum_i w_i (\cos\theta_i, \sin\theta_i), \quad \theta_i = v_i \frac{2\pi}{8}
//! $$
//!
//! and the mean direction is $\operatorname{atan2}(V_y, V_x)$ mapped back to sectors. When the
//! vectors cancel ($|V|^2$ at or below a small threshold) the mean is undefined and
//! [`Resultant::mean`] returns `None`.
use std::f64::consts::PI;
use std::fmt::{self, Display};
use std::ops::Add;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Number of directional sectors in one full turn.
pub const SECTORS: u8 = 8;
/// Angular width of one sector in radians (45°).
pub const RADIANS_PER_SECTOR: f64 = 2.0 * PI / SECTORS as f64;
/// Default squared-magnitude cutoff below which a circular mean is treated as undefined.
pub const DEFAULT_DEGENERACY_THRESHOLD: f64 = 1e-10;

/// A direction expressed in eighths of a turn, circular with modulus [`Orientation::MODULUS`].
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Orientation(f64);

impl Orientation {
    pub const MODULUS: f64 = SECTORS as f64;

    pub const fn new(value: f64) -> Self {
        Orientation(value)
    }
    /// Builds an orientation from an integral sector index. Negative and out-of-range indices
    /// are kept as given.
    pub fn from_sector(sector: i32) -> Self {
        Orientation(sector as f64)
    }
    pub fn from_radians(radians: f64) -> Self {
        Orientation(radians / RADIANS_PER_SECTOR)
    }
    /// Raw stored value, not wrapped.
    pub fn value(self) -> f64 {
        self.0
    }
    pub fn to_radians(self) -> f64 {
        self.0 * RADIANS_PER_SECTOR
    }
    /// Nearest integral sector, not wrapped.
    pub fn sector(self) -> i32 {
        self.0.round() as i32
    }
    /// Nearest sector index wrapped into `0..8`.
    pub fn wrapped_sector(self) -> u8 {
        (self.0.round() as i64).rem_euclid(SECTORS as i64) as u8
    }
    /// Equivalent orientation in `[0, 8)`.
    pub fn wrapped(self) -> Self {
        let wrapped = self.0.rem_euclid(Self::MODULUS);
        // rem_euclid rounds tiny negative inputs up to the modulus itself
        if wrapped >= Self::MODULUS {
            Orientation(0.0)
        } else {
            Orientation(wrapped)
        }
    }
    /// Equivalent orientation in `(-4, 4]`.
    pub fn signed(self) -> Self {
        let wrapped = self.wrapped().0;
        if wrapped > Self::MODULUS / 2.0 {
            Orientation(wrapped - Self::MODULUS)
        } else {
            Orientation(wrapped)
        }
    }
    /// Shortest signed rotation from `other` to `self`, in `(-4, 4]` sectors.
    pub fn difference(self, other: Orientation) -> f64 {
        Orientation(self.0 - other.0).signed().0
    }
    /// Point on the unit circle for this direction.
    pub fn unit_vector(self) -> Vector2<f64> {
        let (sin, cos) = self.to_radians().sin_cos();
        Vector2::new(cos, sin)
    }
}
impl Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}/8", self.0)
    }
}
impl From<f64> for Orientation {
    fn from(value: f64) -> Self {
        Orientation(value)
    }
}
impl From<Orientation> for f64 {
    fn from(orientation: Orientation) -> Self {
        orientation.0
    }
}
impl Add<f64> for Orientation {
    type Output = Orientation;
    fn add(self, delta: f64) -> Orientation {
        Orientation(self.0 + delta)
    }
}

/// Running sum of weighted unit vectors for one circular dimension.
///
/// Resultants from disjoint chunks of a population can be combined with [`Resultant::merge`],
/// which is what the parallel estimator does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resultant {
    vector: Vector2<f64>,
}
impl Default for Resultant {
    fn default() -> Self {
        Resultant {
            vector: Vector2::zeros(),
        }
    }
}
impl Resultant {
    pub fn accumulate(&mut self, orientation: Orientation, weight: f64) {
        self.vector += orientation.unit_vector() * weight;
    }
    pub fn merge(self, other: Resultant) -> Resultant {
        Resultant {
            vector: self.vector + other.vector,
        }
    }
    pub fn vector(&self) -> &Vector2<f64> {
        &self.vector
    }
    pub fn squared_magnitude(&self) -> f64 {
        self.vector.norm_squared()
    }
    /// Mean direction in `(-4, 4]`, or `None` when `|V|^2 <= threshold`.
    pub fn mean(&self, threshold: f64) -> Option<Orientation> {
        if self.squared_magnitude() <= threshold {
            return None;
        }
        Some(Orientation::from_radians(
            self.vector.y.atan2(self.vector.x),
        ))
    }
    /// Mean resultant length `|V| / total_weight`; 1 for perfectly concentrated samples,
    /// near 0 for samples spread evenly around the circle.
    pub fn mean_resultant_length(&self, total_weight: f64) -> f64 {
        if total_weight > 0.0 {
            (self.vector.norm() / total_weight).min(1.0)
        } else {
            0.0
        }
    }
}
