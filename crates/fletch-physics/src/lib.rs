//! # Fletch Physics
//!
//! Collision detection and resolution for Fletch.
//!
//! This crate provides the discrete-time collision layer every actor moves
//! through:
//! - Geometry primitives (boxes, circles, swept box test)
//! - Collision shapes with position and velocity
//! - Collision nodes with active/passive tag filtering and enter/exit tracking
//! - The collision controller, which resolves dynamic nodes against static
//!   ones one axis at a time
//! - Static collider descriptions read from room files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod controller;
pub mod error;
pub mod geometry;
pub mod map;
pub mod node;
pub mod shape;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::controller::*;
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::map::*;
    pub use crate::node::*;
    pub use crate::shape::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use fletch_common::Vec2;

    #[test]
    fn test_wall_stops_player() {
        let mut physics = CollisionController::new();

        let wall = CollisionNode::new(
            CollisionShape::rect(4.0, 40.0, Vec2::ZERO).at(Vec2::new(20.0, -20.0)),
            CollisionType::Static,
        )
        .with_passive_tags(tags(["wall"]));
        physics.add_collider(wall);

        let mut player = CollisionNode::new(
            CollisionShape::rect(4.0, 4.0, Vec2::ZERO),
            CollisionType::Dynamic,
        )
        .with_active_tags(tags(["wall"]));
        player.set_velocity(Vec2::new(100.0, 0.0));
        let player = physics.add_collider(player);

        let events = physics.update(1.0);

        let node = physics.node(player).expect("player registered");
        assert!((node.position().x - 16.0).abs() < 1e-4);
        assert_eq!(events.len(), 1);
        assert!(events[0].entering);
        assert!(events[0].tags.contains("wall"));
    }
}
