//! The 21-point hand model produced by the external pose estimator.
//!
//! Coordinates are normalized to the image (`x`, `y` in `[0, 1]`); `z` is
//! carried through for completeness but never used by the classifier.

use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "LandmarkRepr")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance in the image plane.
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Accepted wire shapes: `[x, y]`, `[x, y, z]` or `{"x":..,"y":..,"z":..}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRepr {
    Array(Vec<f32>),
    Object {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
}

impl TryFrom<LandmarkRepr> for Landmark {
    type Error = LandmarkError;

    fn try_from(value: LandmarkRepr) -> Result<Self, Self::Error> {
        match value {
            LandmarkRepr::Array(coords) => match coords.as_slice() {
                [x, y] => Ok(Landmark::new(*x, *y)),
                [x, y, z] => Ok(Landmark {
                    x: *x,
                    y: *y,
                    z: *z,
                }),
                other => Err(LandmarkError::BadArity(other.len())),
            },
            LandmarkRepr::Object { x, y, z } => Ok(Landmark { x, y, z }),
        }
    }
}

/// One detected hand. Always exactly [`LANDMARK_COUNT`] points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn from_slice(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            })?;
        Ok(Self { points })
    }

    /// Panics if `index >= LANDMARK_COUNT`; callers use the named constants.
    pub fn point(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn map_points(&self, f: impl Fn(&Landmark) -> Landmark) -> Self {
        Self {
            points: self.points.map(|p| f(&p)),
        }
    }
}

impl TryFrom<Vec<Landmark>> for HandLandmarks {
    type Error = LandmarkError;

    fn try_from(value: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::from_slice(&value)
    }
}

impl From<HandLandmarks> for Vec<Landmark> {
    fn from(value: HandLandmarks) -> Self {
        value.points.to_vec()
    }
}

/// One line of the landmark stream: `{"landmarks": [...]}` or
/// `{"landmarks": null}` when no hand is visible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    #[serde(default)]
    pub landmarks: Option<HandLandmarks>,
}
