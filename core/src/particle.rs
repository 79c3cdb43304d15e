//! The head/body particle: one hypothesis of the tracked person's state.
use std::fmt::{self, Display};

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use crate::circular::Orientation;

/// Number of scalar state dimensions in a [`HeadBodyParticle`].
pub const STATE_SIZE: usize = 5;

/// One scalar dimension of a [`HeadBodyParticle`], in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    X,
    Y,
    Scale,
    HeadDirection,
    BodyDirection,
}
impl Dimension {
    pub const ALL: [Dimension; STATE_SIZE] = [
        Dimension::X,
        Dimension::Y,
        Dimension::Scale,
        Dimension::HeadDirection,
        Dimension::BodyDirection,
    ];
    pub fn index(self) -> usize {
        match self {
            Dimension::X => 0,
            Dimension::Y => 1,
            Dimension::Scale => 2,
            Dimension::HeadDirection => 3,
            Dimension::BodyDirection => 4,
        }
    }
}
impl Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::X => "x",
            Dimension::Y => "y",
            Dimension::Scale => "scale",
            Dimension::HeadDirection => "head direction",
            Dimension::BodyDirection => "body direction",
        };
        f.write_str(name)
    }
}

/// Image position `(x, y)`, scale `s`, and head/body direction deltas `dh`/`db` in eighths of
/// a turn. No field is bounded; direction wraparound is handled by [`Orientation`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadBodyParticle {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub dh: Orientation,
    pub db: Orientation,
}
impl Display for HeadBodyParticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadBodyParticle")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("s", &self.s)
            .field("dh", &format_args!("{}", self.dh))
            .field("db", &format_args!("{}", self.db))
            .finish()
    }
}
impl HeadBodyParticle {
    pub fn new(x: f64, y: f64, s: f64, dh: f64, db: f64) -> Self {
        HeadBodyParticle {
            x,
            y,
            s,
            dh: Orientation::new(dh),
            db: Orientation::new(db),
        }
    }
    /// Builds a particle whose directions are integral sector indices.
    pub fn with_sectors(x: f64, y: f64, s: f64, dh: i32, db: i32) -> Self {
        HeadBodyParticle {
            x,
            y,
            s,
            dh: Orientation::from_sector(dh),
            db: Orientation::from_sector(db),
        }
    }
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::X => self.x,
            Dimension::Y => self.y,
            Dimension::Scale => self.s,
            Dimension::HeadDirection => self.dh.value(),
            Dimension::BodyDirection => self.db.value(),
        }
    }
    pub fn set(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::X => self.x = value,
            Dimension::Y => self.y = value,
            Dimension::Scale => self.s = value,
            Dimension::HeadDirection => self.dh = Orientation::new(value),
            Dimension::BodyDirection => self.db = Orientation::new(value),
        }
    }
    pub fn set_dh(&mut self, value: f64) {
        self.dh = Orientation::new(value);
    }
    pub fn set_db(&mut self, value: f64) {
        self.db = Orientation::new(value);
    }
    pub fn set_dh_sector(&mut self, sector: i32) {
        self.dh = Orientation::from_sector(sector);
    }
    pub fn set_db_sector(&mut self, sector: i32) {
        self.db = Orientation::from_sector(sector);
    }
    /// Head direction rounded to the nearest sector (not wrapped).
    pub fn dh_sector(&self) -> i32 {
        self.dh.sector()
    }
    /// Body direction rounded to the nearest sector (not wrapped).
    pub fn db_sector(&self) -> i32 {
        self.db.sector()
    }
    pub fn is_finite(&self) -> bool {
        Dimension::ALL.iter().all(|&d| self.get(d).is_finite())
    }
}
impl From<&HeadBodyParticle> for Vec<f64> {
    /// Flattens the particle in `[x, y, s, dh, db]` order.
    fn from(particle: &HeadBodyParticle) -> Self {
        Dimension::ALL.iter().map(|&d| particle.get(d)).collect()
    }
}
impl From<HeadBodyParticle> for Vec<f64> {
    fn from(particle: HeadBodyParticle) -> Self {
        (&particle).into()
    }
}
impl TryFrom<&[f64]> for HeadBodyParticle {
    type Error = &'static str;
    /// Reads a particle from `[x, y, s, dh, db]`.
    fn try_from(slice: &[f64]) -> Result<Self, Self::Error> {
        if slice.len() != STATE_SIZE {
            return Err("Slice must have length 5 for HeadBodyParticle");
        }
        Ok(HeadBodyParticle::new(
            slice[0], slice[1], slice[2], slice[3], slice[4],
        ))
    }
}
impl TryFrom<Vec<f64>> for HeadBodyParticle {
    type Error = &'static str;
    fn try_from(vec: Vec<f64>) -> Result<Self, Self::Error> {
        Self::try_from(vec.as_slice())
    }
}
impl From<HeadBodyParticle> for SVector<f64, STATE_SIZE> {
    fn from(particle: HeadBodyParticle) -> Self {
        SVector::<f64, STATE_SIZE>::from_fn(|i, _| particle.get(Dimension::ALL[i]))
    }
}
impl From<SVector<f64, STATE_SIZE>> for HeadBodyParticle {
    fn from(vector: SVector<f64, STATE_SIZE>) -> Self {
        HeadBodyParticle::new(vector[0], vector[1], vector[2], vector[3], vector[4])
    }
}
