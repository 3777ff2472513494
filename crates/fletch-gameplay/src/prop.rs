//! Interactable props (levers, braziers, targets).
//!
//! A prop idles on a looping animation, restarting its idle state every time
//! the loop ends. Hitting it with an arrow or interacting with it toggles it.

use fletch_common::{ActorId, ColliderId, Vec2};
use fletch_physics::{tags, CollisionNode, ColliderDesc, MapError, TagSet};
use serde::{Deserialize, Serialize};

use crate::actor::{tag, Actor, Body, Command};
use crate::animation::AnimationTimer;
use crate::events::GameEvent;
use crate::state_machine::{State, StateMachine, StateMachineError};

/// Prop tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropConfig {
    /// Length of the idle animation loop in seconds
    pub idle_loop: f32,
    /// Seconds after a toggle before the prop reacts again
    pub trigger_cooldown: f32,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            idle_loop: 1.0,
            trigger_cooldown: 0.5,
        }
    }
}

/// Prop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropStateKey {
    /// Looping idle animation
    Idle,
    /// Just toggled
    Triggered,
}

/// A prop's data.
#[derive(Debug, Clone)]
pub struct PropBody {
    id: ActorId,
    config: PropConfig,
    position: Vec2,
    active: bool,
    idle_loops: u32,
    loop_ended: bool,
    triggered: bool,
    animation: AnimationTimer,
    commands: Vec<Command>,
}

impl PropBody {
    /// Creates an inactive prop.
    #[must_use]
    pub fn new(id: ActorId, position: Vec2, config: PropConfig) -> Self {
        Self {
            id,
            animation: AnimationTimer::new(config.idle_loop),
            config,
            position,
            active: false,
            idle_loops: 0,
            loop_ended: false,
            triggered: false,
            commands: Vec::new(),
        }
    }

    /// Whether the prop is switched on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of times the idle state has been entered.
    #[must_use]
    pub fn idle_loops(&self) -> u32 {
        self.idle_loops
    }

    /// Asks the prop to toggle on its next idle update.
    pub fn request_interaction(&mut self) {
        self.triggered = true;
    }

    /// Advances the idle animation; returns how many loops ended.
    pub fn tick_animation(&mut self, dt: f32) -> u32 {
        self.animation.tick(dt)
    }
}

impl Body for PropBody {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn sync_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn desired_velocity(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

struct IdleState;

impl State<PropStateKey, PropBody> for IdleState {
    fn start(&mut self, prop: &mut PropBody) {
        prop.idle_loops += 1;
        prop.loop_ended = false;
        prop.animation.restart();
    }

    fn update(&mut self, prop: &mut PropBody, _dt: f32) -> Option<PropStateKey> {
        if prop.triggered {
            Some(PropStateKey::Triggered)
        } else if prop.loop_ended {
            Some(PropStateKey::Idle)
        } else {
            None
        }
    }

    fn on_collision(&mut self, prop: &mut PropBody, tags: &TagSet, entering: bool) {
        if entering && tags.contains(tag::ARROW) {
            prop.triggered = true;
        }
    }

    fn on_animation_end(&mut self, prop: &mut PropBody) {
        prop.loop_ended = true;
    }
}

#[derive(Default)]
struct TriggeredState {
    elapsed: f32,
}

impl State<PropStateKey, PropBody> for TriggeredState {
    fn start(&mut self, prop: &mut PropBody) {
        self.elapsed = 0.0;
        prop.active = !prop.active;
        prop.commands.push(Command::Publish(GameEvent::PropToggled {
            prop: prop.id,
            active: prop.active,
        }));
    }

    fn update(&mut self, prop: &mut PropBody, dt: f32) -> Option<PropStateKey> {
        self.elapsed += dt;
        (self.elapsed >= prop.config.trigger_cooldown).then_some(PropStateKey::Idle)
    }

    fn end(&mut self, prop: &mut PropBody) {
        prop.triggered = false;
    }
}

/// A prop actor.
pub type Prop = Actor<PropStateKey, PropBody>;

/// Collider for a prop: a static sensor seen as interactable (plus the
/// description's tags) that notices arrows.
pub fn prop_node(desc: &ColliderDesc) -> Result<CollisionNode, MapError> {
    let node = desc.to_static_node(true)?;
    let mut passive = node.passive_tags().clone();
    passive.insert(tag::INTERACTABLE.to_string());

    Ok(node
        .with_passive_tags(passive)
        .with_active_tags(tags([tag::ARROW])))
}

/// Builds a prop in `Idle`.
pub fn new_prop(
    id: ActorId,
    collider: ColliderId,
    position: Vec2,
    config: PropConfig,
) -> Result<Prop, StateMachineError> {
    let machine = StateMachine::new()
        .with_state(PropStateKey::Idle, IdleState)
        .with_state(PropStateKey::Triggered, TriggeredState::default());

    Actor::new(
        id,
        collider,
        PropBody::new(id, position, config),
        machine,
        PropStateKey::Idle,
    )
}
