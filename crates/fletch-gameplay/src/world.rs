//! The world: one room's worth of actors, scenery and collision state.
//!
//! A frame runs in a fixed order:
//! 1. every actor's state machine updates and writes a desired velocity into
//!    its collider;
//! 2. the collision controller resolves all movement;
//! 3. actors read back their resolved positions;
//! 4. contact changes are dispatched to the owning actors (and doors);
//! 5. commands queued by the states are applied: spawns, despawns,
//!    interactions and published events.
//!
//! Colliders are only added or removed in step 5, never during the solve.

use std::collections::BTreeMap;

use ahash::AHashMap;
use fletch_common::{ActorId, ColliderId, IdAllocator, Vec2};
use fletch_physics::{
    CollisionController, CollisionError, CollisionEvent, ColliderDesc, MapError, TagSet,
};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::actor::{tag, Body, Command};
use crate::arrow::{arrow_node, new_arrow, Arrow, ArrowBody};
use crate::config::GameplayConfig;
use crate::events::{EventBus, GameEvent};
use crate::input::Input;
use crate::player::{new_player, player_node, Player};
use crate::prop::{new_prop, prop_node, Prop};
use crate::room::RoomLayout;
use crate::state_machine::StateMachineError;

/// Errors raised while building or stepping a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A state machine was misconfigured
    #[error("state machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    /// A collider was misconfigured or missing
    #[error("collision error: {0}")]
    Collision(#[from] CollisionError),

    /// A room description was invalid
    #[error("room error: {0}")]
    Map(#[from] MapError),

    /// No actor with this id
    #[error("unknown actor: {0}")]
    UnknownActor(ActorId),
}

/// Non-actor colliders placed by the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenery {
    /// Solid wall
    Wall,
    /// Pit
    Fall,
    /// Exit to another room
    Door {
        /// Room behind the door
        destination: String,
    },
}

/// Any actor living in a world.
#[derive(Debug)]
pub enum AnyActor {
    /// The player
    Player(Player),
    /// An arrow
    Arrow(Arrow),
    /// A prop
    Prop(Prop),
}

macro_rules! each_actor {
    ($actor:expr, $inner:ident => $body:expr) => {
        match $actor {
            AnyActor::Player($inner) => $body,
            AnyActor::Arrow($inner) => $body,
            AnyActor::Prop($inner) => $body,
        }
    };
}

impl AnyActor {
    /// Actor id.
    #[must_use]
    pub fn id(&self) -> ActorId {
        each_actor!(self, actor => actor.id())
    }

    /// Handle of the actor's collider.
    #[must_use]
    pub fn collider(&self) -> ColliderId {
        each_actor!(self, actor => actor.collider())
    }

    /// Last resolved position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        each_actor!(self, actor => actor.body().position())
    }

    /// The player, if this is one.
    #[must_use]
    pub fn as_player(&self) -> Option<&Player> {
        match self {
            AnyActor::Player(player) => Some(player),
            _ => None,
        }
    }

    /// The arrow, if this is one.
    #[must_use]
    pub fn as_arrow(&self) -> Option<&Arrow> {
        match self {
            AnyActor::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }

    /// The prop, if this is one.
    #[must_use]
    pub fn as_prop(&self) -> Option<&Prop> {
        match self {
            AnyActor::Prop(prop) => Some(prop),
            _ => None,
        }
    }

    fn update(&mut self, input: &Input, dt: f32) -> Result<(), StateMachineError> {
        match self {
            AnyActor::Player(player) => {
                player.body_mut().set_input(input.clone());
                player.update(dt)?;
            }
            AnyActor::Arrow(arrow) => {
                arrow.update(dt)?;
            }
            AnyActor::Prop(prop) => {
                for _ in 0..prop.body_mut().tick_animation(dt) {
                    prop.on_animation_end();
                }
                prop.update(dt)?;
            }
        }
        Ok(())
    }

    fn on_collision(&mut self, tags: &TagSet, entering: bool) {
        each_actor!(self, actor => actor.on_collision(tags, entering));
    }

    fn on_animation_end(&mut self) {
        each_actor!(self, actor => actor.on_animation_end());
    }

    fn sync_position(&mut self, position: Vec2) {
        each_actor!(self, actor => actor.body_mut().sync_position(position));
    }

    fn desired_velocity(&self) -> Vec2 {
        each_actor!(self, actor => actor.body().desired_velocity())
    }

    fn take_commands(&mut self) -> Vec<Command> {
        each_actor!(self, actor => actor.body_mut().take_commands())
    }

    fn take_teleport(&mut self) -> Option<Vec2> {
        each_actor!(self, actor => actor.body_mut().take_teleport())
    }
}

/// Explicit game context: collision state, actors and scenery of one room.
#[derive(Debug)]
pub struct World {
    physics: CollisionController,
    actors: BTreeMap<ActorId, AnyActor>,
    owners: AHashMap<ColliderId, ActorId>,
    scenery: AHashMap<ColliderId, Scenery>,
    ids: IdAllocator,
    player: Option<ActorId>,
    config: GameplayConfig,
    events: EventBus,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new(config: GameplayConfig) -> Self {
        Self {
            physics: CollisionController::new(),
            actors: BTreeMap::new(),
            owners: AHashMap::default(),
            scenery: AHashMap::default(),
            ids: IdAllocator::new(),
            player: None,
            config,
            events: EventBus::default(),
        }
    }

    /// Builds a world from a room layout, player included.
    pub fn from_layout(layout: &RoomLayout, config: GameplayConfig) -> Result<Self, WorldError> {
        let mut world = Self::new(config);

        for wall in &layout.walls {
            world.add_wall(wall)?;
        }
        for fall in &layout.falls {
            world.add_fall(fall)?;
        }
        for door in &layout.doors {
            world.add_door(&door.collider, &door.destination)?;
        }
        for prop in &layout.props {
            world.spawn_prop(prop)?;
        }
        world.spawn_player(layout.player_start()?)?;

        info!(
            room = %layout.name,
            walls = layout.walls.len(),
            falls = layout.falls.len(),
            doors = layout.doors.len(),
            props = layout.props.len(),
            "Room loaded"
        );
        Ok(world)
    }

    fn add_scenery(
        &mut self,
        desc: &ColliderDesc,
        sensor: bool,
        extra_tag: &str,
        scenery: Scenery,
    ) -> Result<ColliderId, WorldError> {
        let node = desc.to_static_node(sensor)?;
        let mut passive = node.passive_tags().clone();
        passive.insert(extra_tag.to_string());

        let id = self.physics.add_collider(node.with_passive_tags(passive));
        self.scenery.insert(id, scenery);
        Ok(id)
    }

    /// Adds a solid wall.
    pub fn add_wall(&mut self, desc: &ColliderDesc) -> Result<ColliderId, WorldError> {
        self.add_scenery(desc, false, tag::WALL, Scenery::Wall)
    }

    /// Adds a pit.
    pub fn add_fall(&mut self, desc: &ColliderDesc) -> Result<ColliderId, WorldError> {
        self.add_scenery(desc, true, tag::FALL, Scenery::Fall)
    }

    /// Adds a door leading to `destination`.
    pub fn add_door(
        &mut self,
        desc: &ColliderDesc,
        destination: &str,
    ) -> Result<ColliderId, WorldError> {
        self.add_scenery(
            desc,
            true,
            tag::DOOR,
            Scenery::Door {
                destination: destination.to_string(),
            },
        )
    }

    fn insert_actor(&mut self, actor: AnyActor) -> ActorId {
        let id = actor.id();
        self.owners.insert(actor.collider(), id);
        self.actors.insert(id, actor);
        id
    }

    /// Spawns the player, replacing any existing one.
    pub fn spawn_player(&mut self, position: Vec2) -> Result<ActorId, WorldError> {
        let node = player_node(&self.config.player, position)?;
        if let Some(old) = self.player.take() {
            self.despawn(old)?;
        }

        let id = ActorId::from_raw(self.ids.next());
        let collider = self.physics.add_collider(node);
        let player = new_player(id, collider, position, self.config.player.clone())?;

        self.player = Some(id);
        debug!(actor = %id, ?position, "Player spawned");
        Ok(self.insert_actor(AnyActor::Player(player)))
    }

    /// Spawns a prop described by a room entry.
    pub fn spawn_prop(&mut self, desc: &ColliderDesc) -> Result<ActorId, WorldError> {
        let node = prop_node(desc)?;
        let position = node.position();

        let id = ActorId::from_raw(self.ids.next());
        let collider = self.physics.add_collider(node);
        let prop = new_prop(id, collider, position, self.config.prop.clone())?;

        debug!(actor = %id, ?position, "Prop spawned");
        Ok(self.insert_actor(AnyActor::Prop(prop)))
    }

    /// Spawns an arrow.
    pub fn spawn_arrow(
        &mut self,
        origin: Vec2,
        direction: Vec2,
        power: f32,
    ) -> Result<ActorId, WorldError> {
        let node = arrow_node(&self.config.arrow, origin)?;
        let id = ActorId::from_raw(self.ids.next());
        let collider = self.physics.add_collider(node);
        let body = ArrowBody::new(id, origin, direction, power, self.config.arrow.clone());
        let arrow = new_arrow(id, collider, body)?;

        debug!(actor = %id, ?origin, ?direction, power, "Arrow spawned");
        Ok(self.insert_actor(AnyActor::Arrow(arrow)))
    }

    /// Removes an actor and its collider.
    pub fn despawn(&mut self, id: ActorId) -> Result<(), WorldError> {
        let actor = self.actors.remove(&id).ok_or(WorldError::UnknownActor(id))?;
        let collider = actor.collider();
        self.owners.remove(&collider);
        self.physics.remove_collider(collider);
        if self.player == Some(id) {
            self.player = None;
        }

        debug!(actor = %id, "Actor despawned");
        Ok(())
    }

    /// Forwards an animation loop end from the animation layer.
    pub fn notify_animation_end(&mut self, id: ActorId) -> Result<(), WorldError> {
        self.actors
            .get_mut(&id)
            .ok_or(WorldError::UnknownActor(id))?
            .on_animation_end();
        Ok(())
    }

    /// Runs one frame.
    pub fn update(&mut self, input: &Input, dt: f32) -> Result<(), WorldError> {
        for actor in self.actors.values_mut() {
            actor.update(input, dt)?;

            let collider = actor.collider();
            let node = self
                .physics
                .node_mut(collider)
                .ok_or(CollisionError::UnknownCollider(collider))?;
            if let Some(position) = actor.take_teleport() {
                node.set_position(position);
            }
            node.set_velocity(actor.desired_velocity());
        }

        let contacts = self.physics.update(dt);

        for actor in self.actors.values_mut() {
            if let Some(node) = self.physics.node(actor.collider()) {
                actor.sync_position(node.position());
            }
        }

        for contact in contacts {
            self.dispatch(&contact);
        }

        self.apply_commands()
    }

    fn dispatch(&mut self, contact: &CollisionEvent) {
        trace!(
            collider = %contact.collider,
            other = %contact.other,
            tags = ?contact.tags,
            entering = contact.entering,
            "Contact"
        );

        let Some(owner) = self.owners.get(&contact.collider).copied() else {
            return;
        };
        if let Some(actor) = self.actors.get_mut(&owner) {
            actor.on_collision(&contact.tags, contact.entering);
        }

        if contact.entering && self.player == Some(owner) {
            if let Some(Scenery::Door { destination }) = self.scenery.get(&contact.other) {
                let destination = destination.clone();
                info!(%destination, "Player reached door");
                self.publish(GameEvent::RoomTransition { destination });
            }
        }
    }

    fn apply_commands(&mut self) -> Result<(), WorldError> {
        let queued: Vec<(ActorId, Vec<Command>)> = self
            .actors
            .iter_mut()
            .map(|(id, actor)| (*id, actor.take_commands()))
            .filter(|(_, commands)| !commands.is_empty())
            .collect();

        for (id, commands) in queued {
            for command in commands {
                self.apply(id, command)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, issuer: ActorId, command: Command) -> Result<(), WorldError> {
        match command {
            Command::SpawnArrow {
                origin,
                direction,
                power,
            } => {
                let arrow = self.spawn_arrow(origin, direction, power)?;
                self.publish(GameEvent::ArrowFired {
                    arrow,
                    origin,
                    direction: direction.normalize_or_zero(),
                    power,
                });
            }
            Command::Interact => self.interact(issuer),
            Command::Despawn => {
                if self.actors.contains_key(&issuer) {
                    self.despawn(issuer)?;
                    self.publish(GameEvent::ActorDespawned { actor: issuer });
                }
            }
            Command::Publish(event) => self.publish(event),
        }
        Ok(())
    }

    /// Asks every prop touching `issuer` to toggle.
    fn interact(&mut self, issuer: ActorId) {
        let Some(collider) = self.actors.get(&issuer).map(AnyActor::collider) else {
            return;
        };
        let touching: Vec<ColliderId> = self
            .physics
            .node(collider)
            .map(|node| node.contacts().collect())
            .unwrap_or_default();

        for other in touching {
            let Some(owner) = self.owners.get(&other) else {
                continue;
            };
            if let Some(AnyActor::Prop(prop)) = self.actors.get_mut(owner) {
                debug!(actor = %issuer, prop = %owner, "Interaction");
                prop.body_mut().request_interaction();
            }
        }
    }

    fn publish(&self, event: GameEvent) {
        debug!(?event, "Game event");
        if !self.events.publish(event) {
            warn!("Event bus full, dropping event");
        }
    }

    /// The player, if spawned.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.player
            .and_then(|id| self.actors.get(&id))
            .and_then(AnyActor::as_player)
    }

    /// An actor by id.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&AnyActor> {
        self.actors.get(&id)
    }

    /// All actors in id order.
    pub fn actors(&self) -> impl Iterator<Item = &AnyActor> {
        self.actors.values()
    }

    /// Scenery behind a collider, if any.
    #[must_use]
    pub fn scenery(&self, collider: ColliderId) -> Option<&Scenery> {
        self.scenery.get(&collider)
    }

    /// Collision state.
    #[must_use]
    pub fn physics(&self) -> &CollisionController {
        &self.physics
    }

    /// Published game events.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Gameplay tuning.
    #[must_use]
    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    /// Tags of a collider, for debugging and tests.
    #[must_use]
    pub fn collider_tags(&self, collider: ColliderId) -> TagSet {
        self.physics
            .node(collider)
            .map(|node| node.passive_tags().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow::ArrowStateKey;
    use crate::player::{PlayerConfig, PlayerStateKey};
    use crate::prop::PropConfig;

    fn desc(position: &str, size: &str) -> ColliderDesc {
        ColliderDesc {
            tags: Vec::new(),
            position: position.into(),
            size: size.into(),
        }
    }

    fn config() -> GameplayConfig {
        GameplayConfig {
            player: PlayerConfig {
                walk_speed: 40.0,
                draw_time: 0.5,
                min_draw: 0.25,
                fall_duration: 0.5,
                shot_recovery: 0.25,
                ..PlayerConfig::default()
            },
            prop: PropConfig {
                idle_loop: 0.5,
                trigger_cooldown: 0.5,
            },
            ..GameplayConfig::default()
        }
    }

    fn right() -> Input {
        Input {
            movement: Vec2::X,
            ..Input::default()
        }
    }

    fn player_state(world: &World) -> Option<PlayerStateKey> {
        world.player().and_then(Player::state)
    }

    fn player_position(world: &World) -> Vec2 {
        world.player().expect("player").body().position()
    }

    #[test]
    fn test_walls_block_player() {
        let mut world = World::new(config());
        world.add_wall(&desc("20,-20", "8,40")).expect("valid wall");
        world.spawn_player(Vec2::ZERO).expect("player");

        for _ in 0..20 {
            world.update(&right(), 0.25).expect("frame");
        }

        // Player is 12 wide and centered, so it stops 6 short of the wall.
        assert!((player_position(&world).x - 14.0).abs() < 1e-3);
        assert_eq!(player_state(&world), Some(PlayerStateKey::Walk));
    }

    #[test]
    fn test_fall_flow() {
        let mut world = World::new(config());
        world.add_fall(&desc("20,-8", "16,16")).expect("valid fall");
        world.spawn_player(Vec2::ZERO).expect("player");

        let mut frames = 0;
        while player_state(&world) != Some(PlayerStateKey::Fall) {
            world.update(&right(), 0.25).expect("frame");
            frames += 1;
            assert!(frames < 20, "player never fell");
        }
        let safe = world.player().expect("player").body().safe_position();
        assert!(safe.x + 6.0 <= 20.0);

        while player_state(&world) != Some(PlayerStateKey::Idle) {
            world.update(&Input::default(), 0.25).expect("frame");
            frames += 1;
            assert!(frames < 40, "player never got up");
        }

        assert_eq!(player_position(&world), safe);
        let events = world.events().drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerFell { respawn, .. } if *respawn == safe)));

        // Standing on safe ground again: no second fall.
        for _ in 0..4 {
            world.update(&Input::default(), 0.25).expect("frame");
        }
        assert_eq!(player_state(&world), Some(PlayerStateKey::Idle));
    }

    #[test]
    fn test_arrow_flow() {
        let mut world = World::new(config());
        world.add_wall(&desc("40,-50", "8,100")).expect("valid wall");
        world.spawn_player(Vec2::ZERO).expect("player");
        let draw = Input {
            draw: true,
            aim_target: Some(Vec2::new(100.0, 0.0)),
            ..Input::default()
        };

        for _ in 0..4 {
            world.update(&draw, 0.25).expect("frame");
        }
        world.update(&Input::default(), 0.25).expect("frame");

        let arrow_id = world
            .actors()
            .find_map(|actor| actor.as_arrow().map(Arrow::id))
            .expect("arrow spawned");
        let arrow_collider = world.actor(arrow_id).expect("arrow").collider();

        let mut stuck = false;
        for _ in 0..40 {
            world.update(&Input::default(), 0.25).expect("frame");
            match world.actor(arrow_id).and_then(AnyActor::as_arrow) {
                Some(arrow) if arrow.state() == Some(ArrowStateKey::Stuck) => {
                    stuck = true;
                    // Stopped at the wall face, not inside it.
                    assert!(arrow.body().position().x + 2.0 <= 40.0 + 1e-3);
                }
                Some(_) => {}
                None => break,
            }
        }

        assert!(stuck);
        assert!(world.actor(arrow_id).is_none());
        assert!(!world.physics().contains(arrow_collider));

        let events = world.events().drain();
        let fired = events
            .iter()
            .position(|e| matches!(e, GameEvent::ArrowFired { arrow, .. } if *arrow == arrow_id));
        let stuck_at = events
            .iter()
            .position(|e| matches!(e, GameEvent::ArrowStuck { arrow, .. } if *arrow == arrow_id));
        let gone = events.iter().position(
            |e| matches!(e, GameEvent::ActorDespawned { actor } if *actor == arrow_id),
        );
        assert!(fired < stuck_at && stuck_at < gone && fired.is_some());
    }

    #[test]
    fn test_prop_loop_and_interaction() {
        let mut world = World::new(config());
        let prop_id = world.spawn_prop(&desc("10,-4", "8,8")).expect("prop");
        world.spawn_player(Vec2::new(8.0, 0.0)).expect("player");

        for _ in 0..4 {
            world.update(&Input::default(), 0.25).expect("frame");
        }
        let prop = world.actor(prop_id).and_then(AnyActor::as_prop).expect("prop");
        assert_eq!(prop.body().idle_loops(), 3);
        assert!(!prop.body().is_active());

        let interact = Input {
            interact_just_pressed: true,
            ..Input::default()
        };
        world.update(&interact, 0.25).expect("frame");
        world.update(&Input::default(), 0.25).expect("frame");

        let prop = world.actor(prop_id).and_then(AnyActor::as_prop).expect("prop");
        assert!(prop.body().is_active());
        let toggles = world
            .events()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PropToggled { prop, active: true } if *prop == prop_id))
            .count();
        assert_eq!(toggles, 1);
    }

    #[test]
    fn test_notify_animation_end() {
        let mut world = World::new(config());
        let prop_id = world.spawn_prop(&desc("0,0", "8,8")).expect("prop");

        world.notify_animation_end(prop_id).expect("known actor");
        world.update(&Input::default(), 0.01).expect("frame");

        let prop = world.actor(prop_id).and_then(AnyActor::as_prop).expect("prop");
        assert_eq!(prop.body().idle_loops(), 2);
        assert!(matches!(
            world.notify_animation_end(ActorId::from_raw(99)),
            Err(WorldError::UnknownActor(_))
        ));
    }

    #[test]
    fn test_door_publishes_transition() {
        let mut world = World::new(config());
        let door = world
            .add_door(&desc("10,-8", "8,16"), "cellar")
            .expect("valid door");
        world.spawn_player(Vec2::ZERO).expect("player");

        for _ in 0..3 {
            world.update(&right(), 0.25).expect("frame");
        }

        assert_eq!(
            world.scenery(door),
            Some(&Scenery::Door {
                destination: "cellar".into()
            })
        );
        assert!(world.collider_tags(door).contains("door"));
        let transitions: Vec<_> = world
            .events()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::RoomTransition { .. }))
            .collect();
        assert_eq!(
            transitions,
            vec![GameEvent::RoomTransition {
                destination: "cellar".into()
            }]
        );
    }

    #[test]
    fn test_degenerate_sizes_are_rejected() {
        let mut bad = config();
        bad.player.width = f32::NAN;
        bad.arrow.height = 0.0;
        let mut world = World::new(bad);

        assert!(matches!(
            world.spawn_player(Vec2::ZERO),
            Err(WorldError::Collision(_))
        ));
        assert!(matches!(
            world.spawn_arrow(Vec2::ZERO, Vec2::X, 1.0),
            Err(WorldError::Collision(_))
        ));
        assert!(world.player().is_none());
        assert_eq!(world.actors().count(), 0);
        assert!(world.physics().is_empty());
    }

    #[test]
    fn test_failed_respawn_keeps_player() {
        let mut world = World::new(config());
        let id = world.spawn_player(Vec2::ZERO).expect("player");

        world.config.player.height = -4.0;
        assert!(world.spawn_player(Vec2::X).is_err());

        assert_eq!(world.player().map(Player::id), Some(id));
        assert_eq!(world.physics().len(), 1);
    }

    #[test]
    fn test_despawn_unknown_actor() {
        let mut world = World::new(config());
        assert!(matches!(
            world.despawn(ActorId::from_raw(5)),
            Err(WorldError::UnknownActor(_))
        ));
    }

    #[test]
    fn test_from_layout() {
        let layout = RoomLayout::from_json(
            r#"{
                "name": "hall",
                "player_start": "16,16",
                "walls": [{"tags": ["stone"], "position": "0,0", "size": "160,8"}],
                "falls": [{"position": "64,64", "size": "16,16"}],
                "doors": [{"position": "152,40", "size": "8,16", "destination": "cellar"}],
                "props": [{"tags": ["lever"], "position": "100,100", "size": "8,8"}]
            }"#,
        )
        .expect("valid room");

        let world = World::from_layout(&layout, config()).expect("valid world");

        assert_eq!(world.physics().len(), 5);
        assert_eq!(player_position(&world), Vec2::new(16.0, 16.0));
        assert_eq!(world.actors().count(), 2);
        assert_eq!(world.config().player.walk_speed, 40.0);
    }

    #[test]
    fn test_from_layout_rejects_bad_vector() {
        let layout = RoomLayout {
            player_start: "nope".into(),
            ..RoomLayout::default()
        };
        assert!(matches!(
            World::from_layout(&layout, config()),
            Err(WorldError::Map(_))
        ));
    }
}
