//! Math helpers shared by physics and gameplay.
//!
//! World space is y-up: `Direction::Up` is `+y`.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// One of the two world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal axis
    X,
    /// Vertical axis
    Y,
}

impl Axis {
    /// Both axes in resolution order.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Keeps only the component of `v` along this axis.
    #[must_use]
    pub fn mask(self, v: Vec2) -> Vec2 {
        match self {
            Axis::X => Vec2::new(v.x, 0.0),
            Axis::Y => Vec2::new(0.0, v.y),
        }
    }
}

/// Facing of an actor, one of the four cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// `+y`
    Up,
    /// `-y`
    #[default]
    Down,
    /// `-x`
    Left,
    /// `+x`
    Right,
}

impl Direction {
    /// Unit vector pointing this way.
    #[must_use]
    pub fn to_vec2(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::Y,
            Direction::Down => Vec2::NEG_Y,
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
        }
    }

    /// Axis this direction lies on.
    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::X,
            Direction::Up | Direction::Down => Axis::Y,
        }
    }

    /// Cardinal direction closest to `v`. Diagonals resolve to the vertical
    /// facing; zero and non-finite vectors have none.
    #[must_use]
    pub fn from_vec2(v: Vec2) -> Option<Self> {
        if v == Vec2::ZERO || !v.is_finite() {
            return None;
        }

        let facing = match (v.x.abs() > v.y.abs(), v.x > 0.0, v.y > 0.0) {
            (true, true, _) => Direction::Right,
            (true, false, _) => Direction::Left,
            (false, _, true) => Direction::Up,
            (false, _, false) => Direction::Down,
        };
        Some(facing)
    }
}
