//! Positioned, velocity-carrying collision shapes.
//!
//! A shape is either an anchored rectangle or a circle. Pairwise queries
//! dispatch with an exhaustive match over both kinds, so adding a kind is a
//! compile error until every pairing is handled.

use fletch_common::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::CollisionError;
use crate::geometry::{
    circle_circle_check, circle_circle_solve, circle_rect_check, circle_rect_solve, rect_overlap,
    rect_rect_solve, sweep_rect_rect, Circle, Hit, Rect,
};

/// Geometry of a collision shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Rectangle whose bottom-left corner sits at `position - anchor`
    Rect {
        /// Full width
        width: f32,
        /// Full height
        height: f32,
        /// Offset from the position to the bottom-left corner
        anchor: Vec2,
    },
    /// Circle centered on the position
    Circle {
        /// Radius
        radius: f32,
    },
}

/// A collision shape with a position and a velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionShape {
    position: Vec2,
    velocity: Vec2,
    kind: ShapeKind,
}

impl CollisionShape {
    /// Creates an anchored rectangle at the origin.
    #[must_use]
    pub fn rect(width: f32, height: f32, anchor: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            kind: ShapeKind::Rect {
                width,
                height,
                anchor,
            },
        }
    }

    /// Creates a rectangle anchored at its center.
    #[must_use]
    pub fn centered_rect(width: f32, height: f32) -> Self {
        Self::rect(width, height, Vec2::new(width * 0.5, height * 0.5))
    }

    /// Creates a circle at the origin.
    #[must_use]
    pub fn circle(radius: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            kind: ShapeKind::Circle { radius },
        }
    }

    /// Returns the shape moved to `position`.
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Checks that every dimension is finite and positive.
    pub fn validate(&self) -> Result<(), CollisionError> {
        let ok = match self.kind {
            ShapeKind::Rect {
                width,
                height,
                anchor,
            } => width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 && anchor.is_finite(),
            ShapeKind::Circle { radius } => radius.is_finite() && radius > 0.0,
        };

        if ok && self.position.is_finite() {
            Ok(())
        } else {
            Err(CollisionError::InvalidShape {
                reason: format!("{:?} at {:?}", self.kind, self.position),
            })
        }
    }

    /// Geometry of the shape.
    #[must_use]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the shape.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Replaces the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Accumulates into the velocity. Nothing resets it but the caller.
    pub fn add_velocity(&mut self, velocity: Vec2) {
        self.velocity += velocity;
    }

    /// Rectangle covered by a rect shape at its current position.
    #[must_use]
    pub fn rect_bounds(&self) -> Option<Rect> {
        match self.kind {
            ShapeKind::Rect {
                width,
                height,
                anchor,
            } => Some(Rect::from_corner(
                self.position - anchor,
                Vec2::new(width, height),
            )),
            ShapeKind::Circle { .. } => None,
        }
    }

    /// Circle covered by a circle shape at its current position.
    #[must_use]
    pub fn circle_bounds(&self) -> Option<Circle> {
        match self.kind {
            ShapeKind::Circle { radius } => Some(Circle::new(self.position, radius)),
            ShapeKind::Rect { .. } => None,
        }
    }

    /// Axis-aligned bounds of either kind.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self.kind {
            ShapeKind::Rect { .. } => self
                .rect_bounds()
                .unwrap_or_else(|| Rect::new(self.position, Vec2::ZERO)),
            ShapeKind::Circle { radius } => Circle::new(self.position, radius).bounds(),
        }
    }

    /// Sweeps this shape along `delta` against `other`.
    ///
    /// Only rect-vs-rect is supported; any pairing with a circle reports no
    /// hit.
    #[must_use]
    pub fn sweep(&self, other: &CollisionShape, delta: Vec2) -> Option<Hit> {
        match (self.rect_bounds(), other.rect_bounds()) {
            (Some(mine), Some(theirs)) => sweep_rect_rect(&mine, &theirs, delta),
            _ => None,
        }
    }

    /// Sweeps this shape along its own velocity against `other`.
    #[must_use]
    pub fn swept_collide(&self, other: &CollisionShape) -> Option<Hit> {
        self.sweep(other, self.velocity)
    }

    /// Checks if the two shapes overlap at their current positions.
    #[must_use]
    pub fn overlap(&self, other: &CollisionShape) -> bool {
        match (&self.kind, &other.kind) {
            (ShapeKind::Rect { .. }, ShapeKind::Rect { .. }) => {
                rect_overlap(&self.bounds(), &other.bounds())
            }
            (ShapeKind::Circle { radius }, ShapeKind::Rect { .. }) => {
                circle_rect_check(&Circle::new(self.position, *radius), &other.bounds())
            }
            (ShapeKind::Rect { .. }, ShapeKind::Circle { radius }) => {
                circle_rect_check(&Circle::new(other.position, *radius), &self.bounds())
            }
            (ShapeKind::Circle { radius: a }, ShapeKind::Circle { radius: b }) => {
                circle_circle_check(
                    &Circle::new(self.position, *a),
                    &Circle::new(other.position, *b),
                )
            }
        }
    }

    /// Displacement that separates this shape from `other`; zero if they do
    /// not overlap.
    #[must_use]
    pub fn resolve(&self, other: &CollisionShape) -> Vec2 {
        match (&self.kind, &other.kind) {
            (ShapeKind::Rect { .. }, ShapeKind::Rect { .. }) => {
                rect_rect_solve(&self.bounds(), &other.bounds())
            }
            (ShapeKind::Circle { radius }, ShapeKind::Rect { .. }) => {
                circle_rect_solve(&Circle::new(self.position, *radius), &other.bounds())
            }
            // Push the rect the opposite way the circle would be pushed.
            (ShapeKind::Rect { .. }, ShapeKind::Circle { radius }) => {
                -circle_rect_solve(&Circle::new(other.position, *radius), &self.bounds())
            }
            (ShapeKind::Circle { radius: a }, ShapeKind::Circle { radius: b }) => {
                circle_circle_solve(
                    &Circle::new(self.position, *a),
                    &Circle::new(other.position, *b),
                )
            }
        }
    }
}
