//! Static collider descriptions as they appear in room files.
//!
//! Entries look like `{"tags": ["wall"], "position": "x,y", "size": "w,h"}`,
//! where `position` is the bottom-left corner.

use fletch_common::{FletchError, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{tags, CollisionNode, CollisionType};
use crate::shape::CollisionShape;

/// Errors in a collider description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    /// A `"x,y"` field did not hold two numbers
    #[error("invalid vector in '{field}': {value:?}")]
    InvalidVector {
        /// Field name
        field: String,
        /// Raw text
        value: String,
    },

    /// Width or height was zero or negative
    #[error("collider size must be positive, got {0}")]
    InvalidSize(Vec2),
}

impl From<MapError> for FletchError {
    fn from(err: MapError) -> Self {
        FletchError::InvalidData(err.to_string())
    }
}

/// Parses a `"x,y"` pair.
pub fn parse_vec2(field: &str, text: &str) -> Result<Vec2, MapError> {
    let invalid = || MapError::InvalidVector {
        field: field.to_string(),
        value: text.to_string(),
    };

    let (x, y) = text.split_once(',').ok_or_else(invalid)?;
    let x: f32 = x.trim().parse().map_err(|_| invalid())?;
    let y: f32 = y.trim().parse().map_err(|_| invalid())?;

    if x.is_finite() && y.is_finite() {
        Ok(Vec2::new(x, y))
    } else {
        Err(invalid())
    }
}

/// One static collider in a room file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderDesc {
    /// Passive tags of the collider
    #[serde(default)]
    pub tags: Vec<String>,
    /// Bottom-left corner, `"x,y"`
    pub position: String,
    /// Width and height, `"w,h"`
    pub size: String,
}

impl ColliderDesc {
    /// Parsed bottom-left corner.
    pub fn corner(&self) -> Result<Vec2, MapError> {
        parse_vec2("position", &self.position)
    }

    /// Parsed size.
    pub fn dimensions(&self) -> Result<Vec2, MapError> {
        let size = parse_vec2("size", &self.size)?;
        if size.x <= 0.0 || size.y <= 0.0 {
            return Err(MapError::InvalidSize(size));
        }
        Ok(size)
    }

    /// Builds a static rect node anchored at its bottom-left corner, seen as
    /// the description's tags.
    pub fn to_static_node(&self, sensor: bool) -> Result<CollisionNode, MapError> {
        let size = self.dimensions()?;
        let shape = CollisionShape::rect(size.x, size.y, Vec2::ZERO).at(self.corner()?);

        Ok(CollisionNode::new(shape, CollisionType::Static)
            .with_sensor(sensor)
            .with_passive_tags(tags(self.tags.iter().cloned())))
    }
}
