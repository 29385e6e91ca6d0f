//! Arena Survivor - combat simulation core for a top-down arena survival game
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (entity pools, weapons, status effects, boss event)
//! - `catalog`: Read-only weapon/item/enemy/boss/character definitions
//! - `meta`: Skill tree meta-progression and run-start bonuses
//! - `persistence`: Checksummed progress envelope
//! - `settings`: Run configuration

pub mod catalog;
pub mod meta;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use catalog::{Catalog, CatalogError};
pub use meta::{MetaBonuses, SkillTree};
pub use settings::SimSettings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena dimensions (square world)
    pub const ARENA_W: f32 = 4000.0;
    pub const ARENA_H: f32 = 4000.0;

    /// Default visible play area
    pub const VIEW_W: f32 = 1180.0;
    pub const VIEW_H: f32 = 640.0;

    /// Pool capacities
    pub const MAX_ENEMIES: usize = 512;
    pub const MAX_BULLETS: usize = 512;
    pub const MAX_DROPS: usize = 256;
    pub const MAX_PUDDLES: usize = 64;
    pub const MAX_WEAPON_FX: usize = 16;

    /// Player loadout limits
    pub const MAX_WEAPON_SLOTS: usize = 6;
    pub const MAX_WEAPON_LEVEL: u32 = 4;
    pub const MAX_PASSIVE_ITEMS: usize = 64;

    /// Player movement
    pub const PLAYER_BASE_SPEED: f32 = 150.0;
    pub const PLAYER_BASE_HP: f32 = 1100.0;
    /// Distance kept between the player and the arena edge
    pub const PLAYER_EDGE_MARGIN: f32 = 20.0;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 6.0;
    pub const BULLET_LIFETIME: f32 = 2.2;
    /// Radius of an enemy body for bullet tests
    pub const ENEMY_HIT_RADIUS: f32 = 16.0;
    /// Radius of the player body for enemy bullet tests
    pub const PLAYER_HIT_RADIUS: f32 = 20.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Clamp a point into the arena, keeping `margin` from every edge
#[inline]
pub fn clamp_to_arena(pos: Vec2, margin: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(margin, consts::ARENA_W - margin),
        pos.y.clamp(margin, consts::ARENA_H - margin),
    )
}
