//! # Fletch Gameplay
//!
//! Gameplay layer for Fletch.
//!
//! This crate provides the actor framework and everything that lives in a
//! room:
//! - A generic state machine over an actor's data
//! - Actors: the player, arrows and props
//! - Input handling and action bindings
//! - Animation loop timing
//! - Room layouts and gameplay tuning
//! - The world context that runs a frame and applies actor commands
//! - Event bus for game events

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod animation;
pub mod arrow;
pub mod config;
pub mod events;
pub mod input;
pub mod player;
pub mod prop;
pub mod room;
pub mod state_machine;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::animation::*;
    pub use crate::arrow::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::player::*;
    pub use crate::prop::*;
    pub use crate::room::*;
    pub use crate::state_machine::*;
    pub use crate::world::*;
}

pub use prelude::*;
