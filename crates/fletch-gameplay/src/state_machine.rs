//! Keyed finite state machines for actor behavior.
//!
//! A machine owns one boxed [`State`] per key, created once when the actor is
//! built. The actor's data is passed to every hook as `&mut A`, so states
//! hold only their own working fields (timers, flags).
//!
//! Transitions always run `end` on the old state before `start` on the new
//! one, and a state returned from `update` is not updated until the next
//! call. Returning the current key re-enters the state.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use fletch_physics::TagSet;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a misconfigured state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    /// Transition to a key with no registered state
    #[error("no state registered for key {0}")]
    UnknownState(String),
}

/// Bounds every state key satisfies.
pub trait StateKey: Copy + Eq + Hash + fmt::Debug {}

impl<T: Copy + Eq + Hash + fmt::Debug> StateKey for T {}

/// One behavior of an actor.
///
/// Only `update` is required; the other hooks do nothing by default.
pub trait State<K, A> {
    /// Called once on entry, before any `update`.
    fn start(&mut self, _actor: &mut A) {}

    /// Called once per frame while active. Returning a key requests a
    /// transition.
    fn update(&mut self, actor: &mut A, dt: f32) -> Option<K>;

    /// Called once on exit, before the next state's `start`.
    fn end(&mut self, _actor: &mut A) {}

    /// A collision contact with matching tags started or ended.
    fn on_collision(&mut self, _actor: &mut A, _tags: &TagSet, _entering: bool) {}

    /// The actor's current animation finished a loop.
    fn on_animation_end(&mut self, _actor: &mut A) {}
}

/// Keyed set of states with one current state.
pub struct StateMachine<K, A> {
    states: HashMap<K, Box<dyn State<K, A>>>,
    current: Option<K>,
}

impl<K: StateKey, A> Default for StateMachine<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StateKey, A> fmt::Debug for StateMachine<K, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .finish()
    }
}

impl<K: StateKey, A> StateMachine<K, A> {
    /// Creates a machine with no states and no current state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            current: None,
        }
    }

    /// Registers a state, builder style.
    #[must_use]
    pub fn with_state(mut self, key: K, state: impl State<K, A> + 'static) -> Self {
        self.insert(key, state);
        self
    }

    /// Registers a state, replacing any previous one under `key`.
    pub fn insert(&mut self, key: K, state: impl State<K, A> + 'static) {
        self.states.insert(key, Box::new(state));
    }

    /// Checks if a state is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.states.contains_key(&key)
    }

    /// Key of the current state, `None` before the first transition.
    #[must_use]
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// Ends the current state (if any) and starts `key`.
    ///
    /// The key is checked first, so an unknown key leaves the machine
    /// untouched.
    pub fn transition(&mut self, actor: &mut A, key: K) -> Result<(), StateMachineError> {
        if !self.states.contains_key(&key) {
            return Err(StateMachineError::UnknownState(format!("{key:?}")));
        }

        let from = self.current;
        if let Some(state) = from.and_then(|current| self.states.get_mut(&current)) {
            state.end(actor);
        }

        debug!(?from, to = ?key, "State transition");
        self.current = Some(key);
        if let Some(state) = self.states.get_mut(&key) {
            state.start(actor);
        }
        Ok(())
    }

    /// Updates the current state and performs the transition it requests.
    ///
    /// Returns the key transitioned to, if any. Without a current state this
    /// does nothing.
    pub fn update(&mut self, actor: &mut A, dt: f32) -> Result<Option<K>, StateMachineError> {
        let Some(state) = self.current.and_then(|key| self.states.get_mut(&key)) else {
            return Ok(None);
        };

        match state.update(actor, dt) {
            Some(next) => {
                self.transition(actor, next)?;
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    /// Forwards a collision contact change to the current state.
    pub fn on_collision(&mut self, actor: &mut A, tags: &TagSet, entering: bool) {
        if let Some(state) = self.current.and_then(|key| self.states.get_mut(&key)) {
            state.on_collision(actor, tags, entering);
        }
    }

    /// Forwards an animation loop end to the current state.
    pub fn on_animation_end(&mut self, actor: &mut A) {
        if let Some(state) = self.current.and_then(|key| self.states.get_mut(&key)) {
            state.on_animation_end(actor);
        }
    }
}
