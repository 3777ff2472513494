//! Engine configuration.
//!
//! Timing, the room to load, logging, a scripted input track for headless
//! runs, and the gameplay tuning. Stored as TOML.

use fletch_common::Vec2;
use fletch_gameplay::{GameplayConfig, KeyCode, MouseButton};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "fletch.toml";

/// One scripted input change, applied at the start of a host frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Host frame the change happens on
    pub frame: u64,
    /// Keyboard key, if this is a key change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyCode>,
    /// Mouse button, if this is a button change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    /// Cursor position in world space
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Vec2>,
    /// New pressed state for `key` or `button`
    #[serde(default)]
    pub pressed: bool,
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed simulation step in seconds
    pub fixed_dt: f32,
    /// Longest host frame fed to the accumulator, in seconds
    pub max_frame_time: f32,
    /// Most simulation steps run in one host frame
    pub max_steps: u32,
    /// Host frames to run before stopping
    pub frames: u64,
    /// Pace host frames against the wall clock
    pub realtime: bool,
    /// Room file to load
    pub room: PathBuf,
    /// Default tracing directives, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Gameplay tuning
    pub gameplay: GameplayConfig,
    /// Scripted input track
    pub input: Vec<ScriptedInput>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_frame_time: 0.25,
            max_steps: 8,
            frames: 600,
            realtime: false,
            room: PathBuf::from("assets/rooms/hall.json"),
            log_filter: "fletch=info".to_string(),
            gameplay: GameplayConfig::default(),
            input: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.fixed_dt = self.fixed_dt.clamp(0.001, 0.1);
        self.max_frame_time = self.max_frame_time.clamp(self.fixed_dt, 1.0);
        self.max_steps = self.max_steps.clamp(1, 64);

        if self.log_filter.trim().is_empty() {
            warn!("Empty log filter, using default");
            self.log_filter = Self::default().log_filter;
        }

        self.input.sort_by_key(|entry| entry.frame);
        self.gameplay.validate();
    }
}
