//! The archer.
//!
//! The player walks, draws the bow, looses arrows and falls into pits. Each
//! behavior is a state over [`PlayerBody`]; the states read the cached
//! [`Input`] and write the velocity the collision pass will try to apply.

use fletch_common::{ActorId, ColliderId, Direction, Vec2};
use fletch_physics::{
    tags, CollisionError, CollisionNode, CollisionShape, CollisionType, TagSet,
};
use serde::{Deserialize, Serialize};

use crate::actor::{tag, Actor, Body, Command};
use crate::events::GameEvent;
use crate::input::Input;
use crate::state_machine::{State, StateMachine, StateMachineError};

/// Player movement and bow tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Walk speed in units per second
    pub walk_speed: f32,
    /// Seconds to reach full draw
    pub draw_time: f32,
    /// Smallest draw fraction that still shoots
    pub min_draw: f32,
    /// Walk speed multiplier while drawing
    pub draw_move_factor: f32,
    /// Seconds the player stands still after a shot
    pub shot_recovery: f32,
    /// Seconds spent falling before respawning
    pub fall_duration: f32,
    /// Collider width
    pub width: f32,
    /// Collider height
    pub height: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 80.0,
            draw_time: 0.8,
            min_draw: 0.25,
            draw_move_factor: 0.4,
            shot_recovery: 0.25,
            fall_duration: 0.6,
            width: 12.0,
            height: 12.0,
        }
    }
}

/// Player states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerStateKey {
    /// Standing still
    Idle,
    /// Walking
    Walk,
    /// Drawing the bow
    Draw,
    /// Recovering from a shot
    Shoot,
    /// Falling into a pit
    Fall,
}

/// The player's data.
#[derive(Debug, Clone)]
pub struct PlayerBody {
    id: ActorId,
    config: PlayerConfig,
    position: Vec2,
    velocity: Vec2,
    facing: Direction,
    aim: Vec2,
    input: Input,
    draw_power: f32,
    safe_position: Vec2,
    falling: bool,
    commands: Vec<Command>,
    teleport: Option<Vec2>,
}

impl PlayerBody {
    /// Creates a player body standing at `position`.
    #[must_use]
    pub fn new(id: ActorId, position: Vec2, config: PlayerConfig) -> Self {
        Self {
            id,
            config,
            position,
            velocity: Vec2::ZERO,
            facing: Direction::Down,
            aim: Direction::Down.to_vec2(),
            input: Input::default(),
            draw_power: 0.0,
            safe_position: position,
            falling: false,
            commands: Vec::new(),
            teleport: None,
        }
    }

    /// Caches this frame's input for the states to read.
    pub fn set_input(&mut self, input: Input) {
        self.input = input;
    }

    /// Direction the player is facing.
    #[must_use]
    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// Unit aim direction.
    #[must_use]
    pub fn aim(&self) -> Vec2 {
        self.aim
    }

    /// Current draw fraction in `[0, 1]`.
    #[must_use]
    pub fn draw_power(&self) -> f32 {
        self.draw_power
    }

    /// Last position known to be on solid ground.
    #[must_use]
    pub fn safe_position(&self) -> Vec2 {
        self.safe_position
    }

    /// Tuning.
    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Shared handling for states that stand on the ground: falling,
    /// safe-position tracking, interaction, and starting a draw.
    fn ground_transition(&mut self) -> Option<PlayerStateKey> {
        if self.falling {
            return Some(PlayerStateKey::Fall);
        }
        self.safe_position = self.position;

        if self.input.interact_just_pressed {
            self.commands.push(Command::Interact);
        }
        if self.input.draw {
            return Some(PlayerStateKey::Draw);
        }
        None
    }

    fn aim_at_target(&mut self) {
        if let Some(target) = self.input.aim_target {
            let direction = (target - self.position).normalize_or_zero();
            if direction != Vec2::ZERO {
                self.aim = direction;
                if let Some(facing) = Direction::from_vec2(direction) {
                    self.facing = facing;
                }
            }
        }
    }

    fn watch_for_fall(&mut self, tags: &TagSet, entering: bool) {
        if entering && tags.contains(tag::FALL) {
            self.falling = true;
        }
    }
}

impl Body for PlayerBody {
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

    fn take_teleport(&mut self) -> Option<Vec2> {
        self.teleport.take()
    }
}

struct IdleState;

impl State<PlayerStateKey, PlayerBody> for IdleState {
    fn start(&mut self, body: &mut PlayerBody) {
        body.velocity = Vec2::ZERO;
    }

    fn update(&mut self, body: &mut PlayerBody, _dt: f32) -> Option<PlayerStateKey> {
        body.velocity = Vec2::ZERO;
        if let Some(next) = body.ground_transition() {
            return Some(next);
        }
        body.input.has_movement().then_some(PlayerStateKey::Walk)
    }

    fn on_collision(&mut self, body: &mut PlayerBody, tags: &TagSet, entering: bool) {
        body.watch_for_fall(tags, entering);
    }
}

struct WalkState;

impl State<PlayerStateKey, PlayerBody> for WalkState {
    fn update(&mut self, body: &mut PlayerBody, _dt: f32) -> Option<PlayerStateKey> {
        if let Some(next) = body.ground_transition() {
            return Some(next);
        }

        let movement = body.input.movement;
        if movement == Vec2::ZERO {
            return Some(PlayerStateKey::Idle);
        }

        body.velocity = movement * body.config.walk_speed;
        body.aim = movement.normalize_or_zero();
        if let Some(facing) = Direction::from_vec2(movement) {
            body.facing = facing;
        }
        None
    }

    fn end(&mut self, body: &mut PlayerBody) {
        body.velocity = Vec2::ZERO;
    }

    fn on_collision(&mut self, body: &mut PlayerBody, tags: &TagSet, entering: bool) {
        body.watch_for_fall(tags, entering);
    }
}

#[derive(Default)]
struct DrawState {
    elapsed: f32,
}

impl State<PlayerStateKey, PlayerBody> for DrawState {
    fn start(&mut self, body: &mut PlayerBody) {
        self.elapsed = 0.0;
        body.draw_power = 0.0;
        body.aim_at_target();
    }

    fn update(&mut self, body: &mut PlayerBody, dt: f32) -> Option<PlayerStateKey> {
        if body.falling {
            body.draw_power = 0.0;
            return Some(PlayerStateKey::Fall);
        }

        self.elapsed += dt;
        body.draw_power = (self.elapsed / body.config.draw_time.max(f32::EPSILON)).min(1.0);
        body.velocity =
            body.input.movement * body.config.walk_speed * body.config.draw_move_factor;
        body.aim_at_target();

        if body.input.draw {
            return None;
        }
        if body.draw_power >= body.config.min_draw {
            Some(PlayerStateKey::Shoot)
        } else {
            body.draw_power = 0.0;
            Some(PlayerStateKey::Idle)
        }
    }

    fn end(&mut self, body: &mut PlayerBody) {
        body.velocity = Vec2::ZERO;
    }

    fn on_collision(&mut self, body: &mut PlayerBody, tags: &TagSet, entering: bool) {
        body.watch_for_fall(tags, entering);
    }
}

#[derive(Default)]
struct ShootState {
    elapsed: f32,
}

impl State<PlayerStateKey, PlayerBody> for ShootState {
    fn start(&mut self, body: &mut PlayerBody) {
        self.elapsed = 0.0;
        body.velocity = Vec2::ZERO;
        body.commands.push(Command::SpawnArrow {
            origin: body.position,
            direction: body.aim,
            power: body.draw_power,
        });
    }

    fn update(&mut self, body: &mut PlayerBody, dt: f32) -> Option<PlayerStateKey> {
        body.velocity = Vec2::ZERO;
        self.elapsed += dt;
        (self.elapsed >= body.config.shot_recovery).then_some(PlayerStateKey::Idle)
    }

    fn end(&mut self, body: &mut PlayerBody) {
        body.draw_power = 0.0;
    }

    fn on_collision(&mut self, body: &mut PlayerBody, tags: &TagSet, entering: bool) {
        body.watch_for_fall(tags, entering);
    }
}

#[derive(Default)]
struct FallState {
    elapsed: f32,
}

impl State<PlayerStateKey, PlayerBody> for FallState {
    fn start(&mut self, body: &mut PlayerBody) {
        self.elapsed = 0.0;
        body.falling = false;
        body.velocity = Vec2::ZERO;
    }

    fn update(&mut self, body: &mut PlayerBody, dt: f32) -> Option<PlayerStateKey> {
        body.velocity = Vec2::ZERO;
        self.elapsed += dt;
        if self.elapsed < body.config.fall_duration {
            return None;
        }

        body.teleport = Some(body.safe_position);
        body.commands.push(Command::Publish(GameEvent::PlayerFell {
            player: body.id,
            respawn: body.safe_position,
        }));
        Some(PlayerStateKey::Idle)
    }
}

/// The player actor.
pub type Player = Actor<PlayerStateKey, PlayerBody>;

/// Collider for a player: a solid box centered on the player that is
/// stopped by walls and senses pits, doors and interactables.
///
/// Fails when the configured size is not a positive finite box.
pub fn player_node(
    config: &PlayerConfig,
    position: Vec2,
) -> Result<CollisionNode, CollisionError> {
    CollisionNode::builder(CollisionType::Dynamic)
        .shape(CollisionShape::centered_rect(config.width, config.height))
        .position(position)
        .passive_tags(tags([tag::PLAYER]))
        .active_tags(tags([tag::WALL, tag::FALL, tag::DOOR, tag::INTERACTABLE]))
        .build()
}

/// Builds a player in `Idle`.
pub fn new_player(
    id: ActorId,
    collider: ColliderId,
    position: Vec2,
    config: PlayerConfig,
) -> Result<Player, StateMachineError> {
    let machine = StateMachine::new()
        .with_state(PlayerStateKey::Idle, IdleState)
        .with_state(PlayerStateKey::Walk, WalkState)
        .with_state(PlayerStateKey::Draw, DrawState::default())
        .with_state(PlayerStateKey::Shoot, ShootState::default())
        .with_state(PlayerStateKey::Fall, FallState::default());

    Actor::new(
        id,
        collider,
        PlayerBody::new(id, position, config),
        machine,
        PlayerStateKey::Idle,
    )
}
