//! Game events published by the world for outer layers (audio, UI, room
//! loading) to consume.

use crossbeam_channel::{bounded, Receiver, Sender};
use fletch_common::{ActorId, Vec2};
use serde::{Deserialize, Serialize};

/// Something that happened in the world this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The player loosed an arrow
    ArrowFired {
        /// Spawned arrow
        arrow: ActorId,
        /// Spawn point
        origin: Vec2,
        /// Unit flight direction
        direction: Vec2,
        /// Draw power in `[0, 1]`
        power: f32,
    },
    /// An arrow hit a wall
    ArrowStuck {
        /// The arrow
        arrow: ActorId,
        /// Where it stopped
        position: Vec2,
    },
    /// An actor left the world
    ActorDespawned {
        /// The actor
        actor: ActorId,
    },
    /// The player fell and was put back on safe ground
    PlayerFell {
        /// The player
        player: ActorId,
        /// Where the player was put back
        respawn: Vec2,
    },
    /// A prop was switched on or off
    PropToggled {
        /// The prop
        prop: ActorId,
        /// New state
        active: bool,
    },
    /// The player walked through a door
    RoomTransition {
        /// Name of the room behind the door
        destination: String,
    },
}

/// Bounded queue of [`GameEvent`]s.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Queues an event. Returns `false` if the bus was full and the event
    /// was dropped.
    pub fn publish(&self, event: GameEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Maximum number of queued events.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// A sender for publishing from elsewhere.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}
