//! Arrows.
//!
//! An arrow flies in a straight line until it hits a wall, sticks there for
//! a while and then despawns. Arrows that never hit anything despawn after
//! their maximum flight time.

use fletch_common::{ActorId, ColliderId, Vec2};
use fletch_physics::{
    tags, CollisionError, CollisionNode, CollisionShape, CollisionType, TagSet,
};
use serde::{Deserialize, Serialize};

use crate::actor::{tag, Actor, Body, Command};
use crate::events::GameEvent;
use crate::state_machine::{State, StateMachine, StateMachineError};

/// Arrow tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowConfig {
    /// Speed at full draw, in units per second
    pub speed: f32,
    /// Collider width
    pub width: f32,
    /// Collider height
    pub height: f32,
    /// Seconds before an arrow in flight despawns
    pub max_flight_time: f32,
    /// Seconds a stuck arrow stays in the wall
    pub stuck_duration: f32,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            speed: 240.0,
            width: 4.0,
            height: 4.0,
            max_flight_time: 2.0,
            stuck_duration: 1.5,
        }
    }
}

/// Arrow states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrowStateKey {
    /// In flight
    Flying,
    /// Stuck in a wall
    Stuck,
}

/// An arrow's data.
#[derive(Debug, Clone)]
pub struct ArrowBody {
    id: ActorId,
    config: ArrowConfig,
    position: Vec2,
    direction: Vec2,
    power: f32,
    velocity: Vec2,
    hit_wall: bool,
    despawning: bool,
    commands: Vec<Command>,
}

impl ArrowBody {
    /// Creates an arrow at `origin` heading along `direction`.
    #[must_use]
    pub fn new(id: ActorId, origin: Vec2, direction: Vec2, power: f32, config: ArrowConfig) -> Self {
        Self {
            id,
            config,
            position: origin,
            direction: direction.normalize_or_zero(),
            power: power.clamp(0.0, 1.0),
            velocity: Vec2::ZERO,
            hit_wall: false,
            despawning: false,
            commands: Vec::new(),
        }
    }

    /// Unit flight direction.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Draw power the arrow was shot with.
    #[must_use]
    pub fn power(&self) -> f32 {
        self.power
    }

    fn despawn(&mut self) {
        if !self.despawning {
            self.despawning = true;
            self.commands.push(Command::Despawn);
        }
    }
}

impl Body for ArrowBody {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn sync_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn desired_velocity(&self) -> Vec2 {
        self.velocity
    }

    fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

#[derive(Default)]
struct FlyingState {
    elapsed: f32,
}

impl State<ArrowStateKey, ArrowBody> for FlyingState {
    fn start(&mut self, arrow: &mut ArrowBody) {
        self.elapsed = 0.0;
        arrow.velocity = arrow.direction * arrow.config.speed * arrow.power;
    }

    fn update(&mut self, arrow: &mut ArrowBody, dt: f32) -> Option<ArrowStateKey> {
        if arrow.hit_wall {
            return Some(ArrowStateKey::Stuck);
        }

        self.elapsed += dt;
        if self.elapsed >= arrow.config.max_flight_time {
            arrow.velocity = Vec2::ZERO;
            arrow.despawn();
        } else {
            arrow.velocity = arrow.direction * arrow.config.speed * arrow.power;
        }
        None
    }

    fn on_collision(&mut self, arrow: &mut ArrowBody, tags: &TagSet, entering: bool) {
        if entering && tags.contains(tag::WALL) {
            arrow.hit_wall = true;
        }
    }
}

#[derive(Default)]
struct StuckState {
    elapsed: f32,
}

impl State<ArrowStateKey, ArrowBody> for StuckState {
    fn start(&mut self, arrow: &mut ArrowBody) {
        self.elapsed = 0.0;
        arrow.velocity = Vec2::ZERO;
        arrow.commands.push(Command::Publish(GameEvent::ArrowStuck {
            arrow: arrow.id,
            position: arrow.position,
        }));
    }

    fn update(&mut self, arrow: &mut ArrowBody, dt: f32) -> Option<ArrowStateKey> {
        arrow.velocity = Vec2::ZERO;
        self.elapsed += dt;
        if self.elapsed >= arrow.config.stuck_duration {
            arrow.despawn();
        }
        None
    }
}

/// An arrow actor.
pub type Arrow = Actor<ArrowStateKey, ArrowBody>;

/// Collider for an arrow: a small box stopped by walls.
pub fn arrow_node(config: &ArrowConfig, origin: Vec2) -> Result<CollisionNode, CollisionError> {
    CollisionNode::builder(CollisionType::Dynamic)
        .shape(CollisionShape::centered_rect(config.width, config.height))
        .position(origin)
        .passive_tags(tags([tag::ARROW]))
        .active_tags(tags([tag::WALL]))
        .build()
}

/// Builds an arrow in `Flying`.
pub fn new_arrow(
    id: ActorId,
    collider: ColliderId,
    body: ArrowBody,
) -> Result<Arrow, StateMachineError> {
    let machine = StateMachine::new()
        .with_state(ArrowStateKey::Flying, FlyingState::default())
        .with_state(ArrowStateKey::Stuck, StuckState::default());

    Actor::new(id, collider, body, machine, ArrowStateKey::Flying)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow(power: f32) -> Arrow {
        let id = ActorId::from_raw(2);
        let config = ArrowConfig {
            speed: 100.0,
            max_flight_time: 1.0,
            stuck_duration: 0.5,
            ..ArrowConfig::default()
        };
        new_arrow(
            id,
            ColliderId::from_raw(9),
            ArrowBody::new(id, Vec2::ZERO, Vec2::new(3.0, 4.0), power, config),
        )
        .expect("all states registered")
    }

    #[test]
    fn test_velocity_scales_with_power() {
        let arrow = arrow(0.5);
        assert_eq!(arrow.state(), Some(ArrowStateKey::Flying));
        let velocity = arrow.body().desired_velocity();
        assert!((velocity - Vec2::new(30.0, 40.0)).length() < 1e-4);
    }

    #[test]
    fn test_wall_hit_sticks_then_despawns() {
        let mut arrow = arrow(1.0);
        arrow.body_mut().sync_position(Vec2::new(12.0, 16.0));

        arrow.on_collision(&tags(["player"]), true);
        assert_eq!(arrow.update(0.25).expect("valid"), None);

        arrow.on_collision(&tags([tag::WALL]), true);
        assert_eq!(arrow.update(0.25).expect("valid"), Some(ArrowStateKey::Stuck));
        assert_eq!(arrow.body().desired_velocity(), Vec2::ZERO);
        assert_eq!(
            arrow.body_mut().take_commands(),
            vec![Command::Publish(GameEvent::ArrowStuck {
                arrow: ActorId::from_raw(2),
                position: Vec2::new(12.0, 16.0),
            })]
        );

        arrow.update(0.25).expect("valid");
        assert!(arrow.body_mut().take_commands().is_empty());
        arrow.update(0.25).expect("valid");
        arrow.update(0.25).expect("valid");
        assert_eq!(arrow.body_mut().take_commands(), vec![Command::Despawn]);
    }

    #[test]
    fn test_expires_in_flight_once() {
        let mut arrow = arrow(1.0);
        for _ in 0..8 {
            arrow.update(0.25).expect("valid");
        }
        assert_eq!(arrow.state(), Some(ArrowStateKey::Flying));
        assert_eq!(arrow.body_mut().take_commands(), vec![Command::Despawn]);
        assert_eq!(arrow.body().desired_velocity(), Vec2::ZERO);
    }
}
