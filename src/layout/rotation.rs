use super::Size;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Watermark rotation, clockwise, in 45 degree steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg45,
    Deg90,
    Deg135,
    Deg180,
    Deg225,
    Deg270,
    Deg315,
}

impl Rotation {
    pub const ALL: [Rotation; 8] = [
        Rotation::Deg0,
        Rotation::Deg45,
        Rotation::Deg90,
        Rotation::Deg135,
        Rotation::Deg180,
        Rotation::Deg225,
        Rotation::Deg270,
        Rotation::Deg315,
    ];

    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg45 => 45,
            Rotation::Deg90 => 90,
            Rotation::Deg135 => 135,
            Rotation::Deg180 => 180,
            Rotation::Deg225 => 225,
            Rotation::Deg270 => 270,
            Rotation::Deg315 => 315,
        }
    }

    pub fn radians(&self) -> f32 {
        (self.degrees() as f32).to_radians()
    }

    pub fn is_upright(&self) -> bool {
        matches!(self, Rotation::Deg0)
    }

    /// Size of the axis-aligned box enclosing `size` after rotation.
    pub fn bounding_size(&self, size: Size) -> Size {
        let (sin, cos) = match self {
            Rotation::Deg0 | Rotation::Deg180 => (0.0, 1.0),
            Rotation::Deg90 | Rotation::Deg270 => (1.0, 0.0),
            _ => (std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
        };
        Size::new(
            size.width * cos + size.height * sin,
            size.width * sin + size.height * cos,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rotation must be one of 0, 45, 90, 135, 180, 225, 270, 315 (got {0})")]
pub struct InvalidRotation(pub String);

impl TryFrom<u16> for Rotation {
    type Error = InvalidRotation;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Rotation::ALL
            .into_iter()
            .find(|r| r.degrees() == degrees)
            .ok_or_else(|| InvalidRotation(degrees.to_string()))
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl std::str::FromStr for Rotation {
    type Err = InvalidRotation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let degrees = s
            .trim()
            .parse::<u16>()
            .map_err(|_| InvalidRotation(s.to_string()))?;
        Rotation::try_from(degrees)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}
