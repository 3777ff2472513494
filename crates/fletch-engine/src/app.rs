//! Headless application runner.
//!
//! Loads a room, feeds the scripted input track through the input manager
//! and steps the world on a fixed timestep until the frame budget runs out
//! or the player leaves through a door.

use std::time::Duration;

use anyhow::{Context, Result};
use fletch_gameplay::{GameEvent, Input, InputManager, RoomLayout, World};
use tracing::{debug, info};

use crate::config::{EngineConfig, ScriptedInput};
use crate::timing::FixedTimestep;

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every configured host frame ran
    FrameBudget {
        /// Host frames run
        frames: u64,
    },
    /// The player reached a door
    RoomTransition {
        /// Room behind the door
        destination: String,
        /// Host frames run, the transition frame included
        frames: u64,
    },
}

/// A world plus the input and timing that drive it.
pub struct App {
    config: EngineConfig,
    world: World,
    input: InputManager,
    script: Vec<ScriptedInput>,
    next_script: usize,
    timing: FixedTimestep,
    frame: u64,
    paused: bool,
}

impl App {
    /// Loads the configured room.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let layout = RoomLayout::load(&config.room)
            .with_context(|| format!("failed to load room {}", config.room.display()))?;
        Self::with_layout(config, &layout)
    }

    /// Builds an app around an already parsed room.
    pub fn with_layout(mut config: EngineConfig, layout: &RoomLayout) -> Result<Self> {
        config.validate();

        let world = World::from_layout(layout, config.gameplay.clone())
            .with_context(|| format!("failed to build room '{}'", layout.name))?;
        let timing = FixedTimestep::new(config.fixed_dt)
            .with_max_delta(config.max_frame_time)
            .with_max_steps(config.max_steps);

        Ok(Self {
            script: config.input.clone(),
            config,
            world,
            input: InputManager::new(),
            next_script: 0,
            timing,
            frame: 0,
            paused: false,
        })
    }

    /// The simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Host frames run so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether the simulation is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Runs until the frame budget is spent or a room transition happens.
    pub fn run(&mut self) -> Result<RunOutcome> {
        let frame_budget = Duration::from_secs_f32(self.config.fixed_dt);
        self.timing.reset();

        while self.frame < self.config.frames {
            let delta = if self.config.realtime {
                self.timing.delta_time()
            } else {
                self.config.fixed_dt
            };

            if let Some(destination) = self.step(delta)? {
                return Ok(RunOutcome::RoomTransition {
                    destination,
                    frames: self.frame,
                });
            }

            if self.config.realtime {
                self.timing.sleep_remainder(frame_budget);
            }
        }

        Ok(RunOutcome::FrameBudget { frames: self.frame })
    }

    /// Runs one host frame of `delta` seconds. Returns the destination if
    /// the player reached a door.
    pub fn step(&mut self, delta: f32) -> Result<Option<String>> {
        self.apply_script();

        let mut input = self.input.process();
        if input.pause_just_pressed {
            self.paused = !self.paused;
            info!(paused = self.paused, frame = self.frame, "Pause toggled");
        }

        let steps = self.timing.accumulate(delta);
        if !self.paused {
            for _ in 0..steps {
                self.world
                    .update(&input, self.timing.fixed_dt())
                    .with_context(|| format!("simulation failed on frame {}", self.frame))?;
                clear_edges(&mut input);
            }
        }

        self.input.end_frame();
        self.frame += 1;
        Ok(self.drain_events())
    }

    fn apply_script(&mut self) {
        while let Some(entry) = self.script.get(self.next_script) {
            if entry.frame > self.frame {
                break;
            }
            if let Some(key) = entry.key {
                self.input.update_key(key, entry.pressed);
            }
            if let Some(button) = entry.button {
                self.input.update_mouse_button(button, entry.pressed);
            }
            if let Some(cursor) = entry.cursor {
                self.input.update_cursor(cursor);
            }
            debug!(frame = self.frame, ?entry, "Scripted input");
            self.next_script += 1;
        }
    }

    fn drain_events(&self) -> Option<String> {
        let mut destination = None;
        for event in self.world.events().drain() {
            info!(frame = self.frame, ?event, "Game event");
            if let GameEvent::RoomTransition { destination: room } = event {
                if destination.is_none() {
                    destination = Some(room);
                }
            }
        }
        destination
    }
}

/// One-shot flags only hold for the first step of a host frame.
fn clear_edges(input: &mut Input) {
    input.interact_just_pressed = false;
    input.pause_just_pressed = false;
}

/// Runs the configured room headless.
pub fn run(config: EngineConfig) -> Result<RunOutcome> {
    let mut app = App::new(config)?;
    info!(
        actors = app.world().actors().count(),
        colliders = app.world().physics().len(),
        "Room ready"
    );

    let outcome = app.run()?;
    info!(?outcome, "Run finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fletch_common::Vec2;
    use fletch_gameplay::{Body, KeyCode, MouseButton, PlayerStateKey};
    use tempfile::TempDir;

    fn layout() -> RoomLayout {
        RoomLayout::from_json(
            r#"{
                "name": "test",
                "player_start": "0,0",
                "doors": [{"position": "30,-8", "size": "8,16", "destination": "cellar"}]
            }"#,
        )
        .expect("valid room")
    }

    fn key(frame: u64, key: KeyCode, pressed: bool) -> ScriptedInput {
        ScriptedInput {
            frame,
            key: Some(key),
            button: None,
            cursor: None,
            pressed,
        }
    }

    fn config(frames: u64, input: Vec<ScriptedInput>) -> EngineConfig {
        EngineConfig {
            fixed_dt: 0.1,
            frames,
            input,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_walk_into_door() {
        let mut app = App::with_layout(config(100, vec![key(0, KeyCode::D, true)]), &layout())
            .expect("valid app");

        let outcome = app.run().expect("run");

        match outcome {
            RunOutcome::RoomTransition { destination, frames } => {
                assert_eq!(destination, "cellar");
                assert!(frames <= 10);
            },
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_frame_budget() {
        let mut app = App::with_layout(config(5, Vec::new()), &layout()).expect("valid app");

        assert_eq!(app.run().expect("run"), RunOutcome::FrameBudget { frames: 5 });
        let player = app.world().player().expect("player");
        assert_eq!(player.body().position(), Vec2::ZERO);
    }

    #[test]
    fn test_pause_freezes_world() {
        let script = vec![key(0, KeyCode::Escape, true), key(0, KeyCode::D, true)];
        let mut app = App::with_layout(config(5, script), &layout()).expect("valid app");

        assert_eq!(app.run().expect("run"), RunOutcome::FrameBudget { frames: 5 });
        assert!(app.is_paused());
        let player = app.world().player().expect("player");
        assert_eq!(player.body().position(), Vec2::ZERO);
    }

    #[test]
    fn test_scripted_shot() {
        let script = vec![
            ScriptedInput {
                frame: 0,
                key: None,
                button: Some(MouseButton::Left),
                cursor: Some(Vec2::new(0.0, 50.0)),
                pressed: true,
            },
            ScriptedInput {
                frame: 10,
                key: None,
                button: Some(MouseButton::Left),
                cursor: None,
                pressed: false,
            },
        ];
        let mut app = App::with_layout(config(11, script), &layout()).expect("valid app");

        for _ in 0..10 {
            app.step(0.1).expect("frame");
        }
        let player = app.world().player().expect("player");
        assert_eq!(player.state(), Some(PlayerStateKey::Draw));
        assert_eq!(player.body().aim(), Vec2::Y);

        app.step(0.1).expect("frame");
        let player = app.world().player().expect("player");
        assert_eq!(player.state(), Some(PlayerStateKey::Shoot));
        assert_eq!(app.world().actors().filter(|a| a.as_arrow().is_some()).count(), 1);
        assert_eq!(app.frame(), 11);
    }

    #[test]
    fn test_missing_room_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = EngineConfig {
            room: temp_dir.path().join("missing.json"),
            ..EngineConfig::default()
        };

        let err = App::new(config).err().expect("missing room");
        assert!(err.to_string().contains("failed to load room"));
    }

    #[test]
    fn test_room_file_from_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let room = temp_dir.path().join("hall.json");
        std::fs::write(&room, r#"{"player_start": "4,4"}"#).expect("write room");

        let app = App::new(EngineConfig {
            room,
            ..EngineConfig::default()
        })
        .expect("valid app");

        let player = app.world().player().expect("player");
        assert_eq!(player.body().position(), Vec2::new(4.0, 4.0));
    }
}
