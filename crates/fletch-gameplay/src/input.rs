//! Input handling for the archer.
//!
//! Raw key and mouse state is tracked per frame and mapped to actions
//! through rebindable bindings. [`InputManager::process`] flattens it into an
//! [`Input`] snapshot that actor states cache and read during their update.

use std::collections::HashMap;

use fletch_common::Vec2;
use serde::{Deserialize, Serialize};

/// Keyboard keys the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// W
    W,
    /// A
    A,
    /// S
    S,
    /// D
    D,
    /// E
    E,
    /// F
    F,
    /// Space bar
    Space,
    /// Escape
    Escape,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel click
    Middle,
}

/// Held state of one button plus whether it changed this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    down: bool,
    changed: bool,
}

impl ButtonState {
    /// Records the button's current state.
    pub fn set(&mut self, down: bool) {
        self.changed |= self.down != down;
        self.down = down;
    }

    /// Forgets this frame's edge.
    pub fn settle(&mut self) {
        self.changed = false;
    }

    /// Held down.
    #[must_use]
    pub fn pressed(self) -> bool {
        self.down
    }

    /// Went down this frame.
    #[must_use]
    pub fn just_pressed(self) -> bool {
        self.down && self.changed
    }

    /// Came up this frame.
    #[must_use]
    pub fn just_released(self) -> bool {
        !self.down && self.changed
    }
}

/// Bindable game actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Walk up
    MoveUp,
    /// Walk down
    MoveDown,
    /// Walk left
    MoveLeft,
    /// Walk right
    MoveRight,
    /// Hold to draw the bow, release to shoot
    Draw,
    /// Use a prop
    Interact,
    /// Toggle pause
    Pause,
}

impl Action {
    /// Every action, in binding order.
    pub const ALL: [Action; 7] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
        Action::Draw,
        Action::Interact,
        Action::Pause,
    ];

    /// Binding used when nothing else is configured.
    #[must_use]
    pub fn default_binding(self) -> KeyBinding {
        match self {
            Action::MoveUp => KeyBinding::new(KeyCode::W).or_key(KeyCode::Up),
            Action::MoveDown => KeyBinding::new(KeyCode::S).or_key(KeyCode::Down),
            Action::MoveLeft => KeyBinding::new(KeyCode::A).or_key(KeyCode::Left),
            Action::MoveRight => KeyBinding::new(KeyCode::D).or_key(KeyCode::Right),
            Action::Draw => KeyBinding::new(KeyCode::Space).or_button(MouseButton::Left),
            Action::Interact => KeyBinding::new(KeyCode::E),
            Action::Pause => KeyBinding::new(KeyCode::Escape),
        }
    }
}

/// One frame of processed input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Input {
    /// Walk direction, at most unit length, y pointing up
    pub movement: Vec2,
    /// Draw held
    pub draw: bool,
    /// Interact pressed this frame
    pub interact_just_pressed: bool,
    /// Pause pressed this frame
    pub pause_just_pressed: bool,
    /// Cursor in world coordinates
    pub aim_target: Option<Vec2>,
}

impl Input {
    /// Whether the player is asking to walk.
    #[must_use]
    pub fn has_movement(&self) -> bool {
        self.movement != Vec2::ZERO
    }
}

/// Keys and at most one mouse button that trigger an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Keys, any of which triggers the action
    pub keys: Vec<KeyCode>,
    /// Mouse button that also triggers the action
    #[serde(default)]
    pub button: Option<MouseButton>,
}

impl KeyBinding {
    /// Binding to a single key.
    #[must_use]
    pub fn new(key: KeyCode) -> Self {
        Self {
            keys: vec![key],
            button: None,
        }
    }

    /// Adds another key.
    #[must_use]
    pub fn or_key(mut self, key: KeyCode) -> Self {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Adds a mouse button.
    #[must_use]
    pub fn or_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    /// Whether `key` is one of this binding's keys.
    #[must_use]
    pub fn matches(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }
}

/// Tracks raw input and maps it to actions.
#[derive(Debug)]
pub struct InputManager {
    keys: HashMap<KeyCode, ButtonState>,
    buttons: HashMap<MouseButton, ButtonState>,
    bindings: HashMap<Action, KeyBinding>,
    cursor: Option<Vec2>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Manager with the default bindings.
    #[must_use]
    pub fn new() -> Self {
        let mut manager = Self {
            keys: HashMap::new(),
            buttons: HashMap::new(),
            bindings: HashMap::new(),
            cursor: None,
        };
        manager.set_default_bindings();
        manager
    }

    /// Restores every action's default binding.
    pub fn set_default_bindings(&mut self) {
        self.bindings = Action::ALL
            .into_iter()
            .map(|action| (action, action.default_binding()))
            .collect();
    }

    /// Replaces an action's binding.
    pub fn rebind(&mut self, action: Action, binding: KeyBinding) {
        self.bindings.insert(action, binding);
    }

    /// Current binding of an action.
    #[must_use]
    pub fn get_binding(&self, action: Action) -> Option<&KeyBinding> {
        self.bindings.get(&action)
    }

    /// Records a key's state.
    pub fn update_key(&mut self, key: KeyCode, is_pressed: bool) {
        self.keys.entry(key).or_default().set(is_pressed);
    }

    /// Records a mouse button's state.
    pub fn update_mouse_button(&mut self, button: MouseButton, is_pressed: bool) {
        self.buttons.entry(button).or_default().set(is_pressed);
    }

    /// Records the cursor position in world coordinates.
    pub fn update_cursor(&mut self, world: Vec2) {
        self.cursor = Some(world);
    }

    /// Forgets the cursor, e.g. when it leaves the window.
    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// Drops this frame's edges. Call once per frame after processing.
    pub fn end_frame(&mut self) {
        self.keys
            .values_mut()
            .chain(self.buttons.values_mut())
            .for_each(ButtonState::settle);
    }

    /// State of a key.
    #[must_use]
    pub fn key(&self, key: KeyCode) -> ButtonState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    /// State of a mouse button.
    #[must_use]
    pub fn mouse(&self, button: MouseButton) -> ButtonState {
        self.buttons.get(&button).copied().unwrap_or_default()
    }

    fn bound_states(&self, action: Action) -> impl Iterator<Item = ButtonState> + '_ {
        let binding = self.bindings.get(&action);
        let keys = binding
            .into_iter()
            .flat_map(|binding| binding.keys.iter())
            .map(|key| self.key(*key));
        let button = binding
            .and_then(|binding| binding.button)
            .map(|button| self.mouse(button));
        keys.chain(button)
    }

    /// Any input bound to `action` is held.
    #[must_use]
    pub fn is_action_pressed(&self, action: Action) -> bool {
        self.bound_states(action).any(ButtonState::pressed)
    }

    /// Some input bound to `action` went down this frame.
    #[must_use]
    pub fn is_action_just_pressed(&self, action: Action) -> bool {
        self.bound_states(action).any(ButtonState::just_pressed)
    }

    /// Some input bound to `action` came up this frame.
    #[must_use]
    pub fn is_action_just_released(&self, action: Action) -> bool {
        self.bound_states(action).any(ButtonState::just_released)
    }

    /// Snapshot for this frame.
    #[must_use]
    pub fn process(&self) -> Input {
        let axis = |negative: Action, positive: Action| {
            f32::from(u8::from(self.is_action_pressed(positive)))
                - f32::from(u8::from(self.is_action_pressed(negative)))
        };
        let movement = Vec2::new(
            axis(Action::MoveLeft, Action::MoveRight),
            axis(Action::MoveDown, Action::MoveUp),
        )
        .normalize_or_zero();

        Input {
            movement,
            draw: self.is_action_pressed(Action::Draw),
            interact_just_pressed: self.is_action_just_pressed(Action::Interact),
            pause_just_pressed: self.is_action_just_pressed(Action::Pause),
            aim_target: self.cursor,
        }
    }
}
