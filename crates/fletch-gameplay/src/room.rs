//! Room layouts.
//!
//! A room file is JSON listing the player start and every wall, pit, door
//! and prop:
//!
//! ```json
//! {
//!   "player_start": "16,16",
//!   "walls": [{"tags": ["wall"], "position": "0,0", "size": "160,8"}],
//!   "falls": [{"tags": ["fall"], "position": "64,64", "size": "16,16"}],
//!   "doors": [{"tags": ["door"], "position": "152,40", "size": "8,16", "destination": "cellar"}],
//!   "props": [{"tags": ["lever"], "position": "100,100", "size": "8,8"}]
//! }
//! ```

use std::path::Path;

use fletch_common::{FletchError, FletchResult, Vec2};
use fletch_physics::{parse_vec2, ColliderDesc, MapError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A door: a collider plus the room it leads to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorDesc {
    /// Door area
    #[serde(flatten)]
    pub collider: ColliderDesc,
    /// Name of the room behind the door
    pub destination: String,
}

/// Everything placed in a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomLayout {
    /// Room name
    pub name: String,
    /// Player spawn point, `"x,y"`
    pub player_start: String,
    /// Solid walls
    pub walls: Vec<ColliderDesc>,
    /// Pits
    pub falls: Vec<ColliderDesc>,
    /// Exits
    pub doors: Vec<DoorDesc>,
    /// Interactable props
    pub props: Vec<ColliderDesc>,
}

impl RoomLayout {
    /// Parses a room from JSON.
    pub fn from_json(json: &str) -> FletchResult<Self> {
        serde_json::from_str(json).map_err(|e| FletchError::Serialization(e.to_string()))
    }

    /// Reads and parses a room file.
    pub fn load(path: impl AsRef<Path>) -> FletchResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let mut layout = Self::from_json(&json)?;
        if layout.name.is_empty() {
            layout.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        debug!(path = %path.display(), room = %layout.name, "Room file read");
        Ok(layout)
    }

    /// Parsed player spawn point; the origin when unset.
    pub fn player_start(&self) -> Result<Vec2, MapError> {
        if self.player_start.trim().is_empty() {
            return Ok(Vec2::ZERO);
        }
        parse_vec2("player_start", &self.player_start)
    }
}
