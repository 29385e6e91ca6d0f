//! Run configuration
//!
//! Loaded by the host from its own config source and handed to
//! [`World::new`](crate::sim::World::new). Values outside their legal range
//! are clamped rather than rejected.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{VIEW_H, VIEW_W};

/// Smallest view side the camera and spawner accept
pub const MIN_VIEW_SIZE: f32 = 200.0;
/// Debug time scale bounds and step
pub const MIN_TIME_SCALE: f32 = 0.5;
pub const MAX_TIME_SCALE: f32 = 4.0;
pub const TIME_SCALE_STEP: f32 = 0.5;

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    // === View ===
    /// Visible play area width in arena units
    pub view_width: f32,
    /// Visible play area height in arena units
    pub view_height: f32,

    // === Pacing ===
    /// Initial simulation speed multiplier
    pub time_scale: f32,
    /// Level-up rerolls granted per run
    pub rerolls: u32,
    /// Delay before the boss key works again
    pub boss_event_cooldown: f32,
    /// Ultimate cooldown before the ultimate_cdr item stat
    pub ultimate_base_cooldown: f32,

    // === Diagnostics ===
    /// Emit per-hit `combat` trace lines
    pub log_combat: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            view_width: VIEW_W,
            view_height: VIEW_H,

            time_scale: 1.0,
            rerolls: 2,
            boss_event_cooldown: 5.0,
            ultimate_base_cooldown: 120.0,

            log_combat: true,
        }
    }
}

impl SimSettings {
    /// Parse settings; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Clamp every field into its legal range
    pub fn sanitized(mut self) -> Self {
        self.view_width = finite_or(self.view_width, VIEW_W).max(MIN_VIEW_SIZE);
        self.view_height = finite_or(self.view_height, VIEW_H).max(MIN_VIEW_SIZE);
        self.time_scale = finite_or(self.time_scale, 1.0).clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
        self.boss_event_cooldown = finite_or(self.boss_event_cooldown, 5.0).max(0.0);
        self.ultimate_base_cooldown = finite_or(self.ultimate_base_cooldown, 120.0).max(0.0);
        self
    }

    pub fn view_size(&self) -> Vec2 {
        Vec2::new(self.view_width, self.view_height)
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = SimSettings::from_json(r#"{ "rerolls": 5, "log_combat": false }"#).unwrap();
        assert_eq!(settings.rerolls, 5);
        assert!(!settings.log_combat);
        assert_eq!(settings.view_width, VIEW_W);
        assert_eq!(settings.ultimate_base_cooldown, 120.0);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings =
            SimSettings::from_json(r#"{ "view_width": 50, "view_height": 10, "time_scale": 9 }"#)
                .unwrap();
        assert_eq!(settings.view_size(), Vec2::splat(MIN_VIEW_SIZE));
        assert_eq!(settings.time_scale, MAX_TIME_SCALE);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(SimSettings::from_json("{ rerolls: }").is_err());
    }
}
