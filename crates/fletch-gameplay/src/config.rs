//! Gameplay tuning.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arrow::ArrowConfig;
use crate::player::PlayerConfig;
use crate::prop::PropConfig;

/// Tuning for every actor kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Player tuning
    pub player: PlayerConfig,
    /// Arrow tuning
    pub arrow: ArrowConfig,
    /// Prop tuning
    pub prop: PropConfig,
}

impl GameplayConfig {
    /// Clamps values to usable ranges. NaN falls back to the default.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        let player = &mut self.player;
        let base = &defaults.player;
        player.walk_speed = clamp_or(player.walk_speed, 0.0, 1000.0, base.walk_speed);
        player.draw_time = clamp_or(player.draw_time, 0.05, 10.0, base.draw_time);
        player.min_draw = clamp_or(player.min_draw, 0.0, 1.0, base.min_draw);
        player.draw_move_factor =
            clamp_or(player.draw_move_factor, 0.0, 1.0, base.draw_move_factor);
        player.shot_recovery = clamp_or(player.shot_recovery, 0.0, 5.0, base.shot_recovery);
        player.fall_duration = clamp_or(player.fall_duration, 0.0, 10.0, base.fall_duration);
        if !is_box(player.width, player.height) {
            warn!(
                width = player.width,
                height = player.height,
                "Invalid player size, using default"
            );
            player.width = base.width;
            player.height = base.height;
        }

        let arrow = &mut self.arrow;
        let base = &defaults.arrow;
        arrow.speed = clamp_or(arrow.speed, 1.0, 5000.0, base.speed);
        arrow.max_flight_time = clamp_or(arrow.max_flight_time, 0.1, 60.0, base.max_flight_time);
        arrow.stuck_duration = clamp_or(arrow.stuck_duration, 0.0, 60.0, base.stuck_duration);
        if !is_box(arrow.width, arrow.height) {
            warn!(
                width = arrow.width,
                height = arrow.height,
                "Invalid arrow size, using default"
            );
            arrow.width = base.width;
            arrow.height = base.height;
        }

        let prop = &mut self.prop;
        let base = &defaults.prop;
        prop.idle_loop = clamp_or(prop.idle_loop, 0.05, 60.0, base.idle_loop);
        prop.trigger_cooldown = clamp_or(prop.trigger_cooldown, 0.0, 60.0, base.trigger_cooldown);
    }
}

fn clamp_or(value: f32, min: f32, max: f32, default: f32) -> f32 {
    if value.is_nan() {
        default
    } else {
        value.clamp(min, max)
    }
}

/// Positive, finite width and height.
fn is_box(width: f32, height: f32) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GameplayConfig =
            serde_json::from_str(r#"{"player": {"walk_speed": 120.0}}"#).expect("valid json");
        assert_eq!(config.player.walk_speed, 120.0);
        assert_eq!(config.player.draw_time, PlayerConfig::default().draw_time);
        assert_eq!(config.arrow, ArrowConfig::default());
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = GameplayConfig::default();
        config.player.min_draw = 3.0;
        config.player.width = -1.0;
        config.arrow.speed = 0.0;
        config.prop.idle_loop = 0.0;

        config.validate();

        assert_eq!(config.player.min_draw, 1.0);
        assert_eq!(config.player.width, PlayerConfig::default().width);
        assert_eq!(config.arrow.speed, 1.0);
        assert_eq!(config.prop.idle_loop, 0.05);
    }

    #[test]
    fn test_validate_replaces_nan() {
        let mut config = GameplayConfig::default();
        config.player.width = f32::NAN;
        config.player.walk_speed = f32::NAN;
        config.arrow.height = f32::INFINITY;
        config.prop.idle_loop = f32::NAN;

        config.validate();

        assert_eq!(config.player.width, PlayerConfig::default().width);
        assert_eq!(config.player.walk_speed, PlayerConfig::default().walk_speed);
        assert_eq!(config.arrow.height, ArrowConfig::default().height);
        assert_eq!(config.prop.idle_loop, PropConfig::default().idle_loop);
    }
}
