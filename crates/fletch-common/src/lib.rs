//! # Fletch Common
//!
//! Common types, utilities, and shared abstractions for Fletch.
//!
//! This crate provides foundational types used across all Fletch subsystems:
//! - ID types (ColliderId, ActorId)
//! - Math types (Vec2 re-export, facing directions, axes)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_allocation_is_sequential() {
        let mut ids = IdAllocator::new();
        let a = ColliderId::from_raw(ids.next());
        let b = ColliderId::from_raw(ids.next());
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_direction_round_trip() {
        for dir in [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ] {
            assert_eq!(Direction::from_vec2(dir.to_vec2()), Some(dir));
        }
    }
}
