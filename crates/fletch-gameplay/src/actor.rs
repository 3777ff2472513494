//! Shared actor plumbing.
//!
//! An actor is a data object (its body), a state machine driving that body,
//! and the handle of its collider. States never touch the world directly:
//! they write a desired velocity into the body and queue [`Command`]s that
//! the world applies after the collision pass.

use std::fmt;

use fletch_common::{ActorId, ColliderId, Vec2};
use fletch_physics::TagSet;

use crate::events::GameEvent;
use crate::state_machine::{StateKey, StateMachine, StateMachineError};

/// Collision tags shared by actors and scenery.
pub mod tag {
    /// Solid walls
    pub const WALL: &str = "wall";
    /// Pits the player falls into
    pub const FALL: &str = "fall";
    /// Room exits
    pub const DOOR: &str = "door";
    /// Things the player can interact with
    pub const INTERACTABLE: &str = "interactable";
    /// The player
    pub const PLAYER: &str = "player";
    /// Arrows in flight or stuck
    pub const ARROW: &str = "arrow";
}

/// Structural change requested by an actor state.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Spawn an arrow
    SpawnArrow {
        /// Spawn point
        origin: Vec2,
        /// Unit flight direction
        direction: Vec2,
        /// Draw power in `[0, 1]`
        power: f32,
    },
    /// Interact with whatever interactable the actor is touching
    Interact,
    /// Remove the issuing actor from the world
    Despawn,
    /// Publish an event on the world's bus
    Publish(GameEvent),
}

/// Data object an actor's states operate on.
pub trait Body {
    /// Last position read back from the collider.
    fn position(&self) -> Vec2;

    /// Stores the collider's resolved position.
    fn sync_position(&mut self, position: Vec2);

    /// Velocity the states want for the next collision pass.
    fn desired_velocity(&self) -> Vec2;

    /// Takes the commands queued this frame.
    fn take_commands(&mut self) -> Vec<Command>;

    /// Takes a requested instant move, if any.
    fn take_teleport(&mut self) -> Option<Vec2> {
        None
    }
}

/// A body, its state machine, and its collider handle.
pub struct Actor<K, B> {
    id: ActorId,
    collider: ColliderId,
    body: B,
    machine: StateMachine<K, B>,
}

impl<K: StateKey, B: fmt::Debug> fmt::Debug for Actor<K, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("collider", &self.collider)
            .field("state", &self.machine.current())
            .field("body", &self.body)
            .finish()
    }
}

impl<K: StateKey, B: Body> Actor<K, B> {
    /// Wraps a body and machine and enters `initial`.
    pub fn new(
        id: ActorId,
        collider: ColliderId,
        mut body: B,
        mut machine: StateMachine<K, B>,
        initial: K,
    ) -> Result<Self, StateMachineError> {
        machine.transition(&mut body, initial)?;
        Ok(Self {
            id,
            collider,
            body,
            machine,
        })
    }

    /// Actor id.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Handle of the actor's collider.
    #[must_use]
    pub fn collider(&self) -> ColliderId {
        self.collider
    }

    /// The actor's data.
    #[must_use]
    pub fn body(&self) -> &B {
        &self.body
    }

    /// Mutable access to the actor's data.
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    /// Key of the current state.
    #[must_use]
    pub fn state(&self) -> Option<K> {
        self.machine.current()
    }

    /// Runs one state update.
    pub fn update(&mut self, dt: f32) -> Result<Option<K>, StateMachineError> {
        self.machine.update(&mut self.body, dt)
    }

    /// Forces a transition.
    pub fn transition(&mut self, key: K) -> Result<(), StateMachineError> {
        self.machine.transition(&mut self.body, key)
    }

    /// Forwards a collision contact change to the current state.
    pub fn on_collision(&mut self, tags: &TagSet, entering: bool) {
        self.machine.on_collision(&mut self.body, tags, entering);
    }

    /// Forwards an animation loop end to the current state.
    pub fn on_animation_end(&mut self) {
        self.machine.on_animation_end(&mut self.body);
    }
}
