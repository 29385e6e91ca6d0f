//! Enemy status effects
//!
//! Bleed stacks up to [`MAX_BLEED_STACKS`] and shares one timer. Burn, slow,
//! stun and armor shred are plain durations: reapplying refreshes the timer.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MAX_BLEED_STACKS: u32 = 5;

pub const BLEED_DURATION: f32 = 4.0;
pub const BURN_DURATION: f32 = 4.0;
pub const SLOW_DURATION: f32 = 2.5;
pub const STUN_DURATION: f32 = 0.6;
pub const SHRED_DURATION: f32 = 3.0;

/// Burn damage per second
pub const BURN_DPS: f32 = 4.0;
/// Bleed damage per second per stack
pub const BLEED_DPS_PER_STACK: f32 = 1.5;
/// Damage taken multiplier while armor is shredded
pub const SHRED_DAMAGE_MUL: f32 = 1.2;
/// Duration refreshed every frame by slow/burn auras
pub const AURA_REFRESH: f32 = 0.5;

/// Per-enemy debuff timers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Debuffs {
    pub burn_timer: f32,
    pub bleed_timer: f32,
    pub bleed_stacks: u32,
    pub slow_timer: f32,
    pub stun_timer: f32,
    pub armor_shred_timer: f32,
}

impl Debuffs {
    pub fn add_bleed_stack(&mut self) {
        self.bleed_stacks = (self.bleed_stacks + 1).min(MAX_BLEED_STACKS);
        self.bleed_timer = BLEED_DURATION;
    }

    pub fn is_slowed(&self) -> bool {
        self.slow_timer > 0.0
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    pub fn is_shredded(&self) -> bool {
        self.armor_shred_timer > 0.0
    }

    pub fn is_burning(&self) -> bool {
        self.burn_timer > 0.0
    }

    /// Advance all timers and return the damage over time dealt this frame
    ///
    /// Bleed stacks drop to zero when the bleed timer runs out.
    pub fn tick(&mut self, dt: f32) -> f32 {
        let mut damage = 0.0;
        if self.burn_timer > 0.0 {
            self.burn_timer -= dt;
            damage += BURN_DPS * dt;
        }
        if self.bleed_timer > 0.0 {
            self.bleed_timer -= dt;
            damage += self.bleed_stacks as f32 * BLEED_DPS_PER_STACK * dt;
            if self.bleed_timer <= 0.0 {
                self.bleed_stacks = 0;
            }
        }
        if self.slow_timer > 0.0 {
            self.slow_timer -= dt;
        }
        if self.stun_timer > 0.0 {
            self.stun_timer -= dt;
        }
        if self.armor_shred_timer > 0.0 {
            self.armor_shred_timer -= dt;
        }
        damage
    }
}

/// Which statuses a roll applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub bleed: bool,
    pub burn: bool,
    pub slow: bool,
    pub stun: bool,
    pub shred: bool,
}

/// Independent per-hit status chances
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusChances {
    pub bleed: f32,
    pub burn: f32,
    pub slow: f32,
    pub stun: f32,
    pub shred: f32,
}

impl StatusChances {
    /// Base chances for a weapon id
    pub fn for_weapon(id: &str) -> Self {
        let mut c = StatusChances::default();
        match id {
            "daggers" => c.bleed = 0.6,
            "sword" | "short_sword" | "longsword" => c.bleed = 0.15,
            "axe" => c.shred = 0.5,
            "hammer" => c.stun = 0.35,
            "scythe" => c.bleed = 0.35,
            "whip" => c.slow = 0.35,
            "chain_blades" => c.slow = 0.25,
            "wand" => c.stun = 0.15,
            "laser" => c.burn = 0.4,
            "greatsword" => c.stun = 0.15,
            _ => {}
        }
        c
    }

    /// Add flat item slow/burn chances on top, clamping each to [0, 1]
    pub fn with_item_bonus(mut self, slow_on_hit: f32, burn_on_hit: f32) -> Self {
        self.slow = (self.slow + slow_on_hit).clamp(0.0, 1.0);
        self.burn = (self.burn + burn_on_hit).clamp(0.0, 1.0);
        self
    }

    pub fn without_bleed(mut self) -> Self {
        self.bleed = 0.0;
        self
    }

    /// Roll each chance independently and apply the hits to `debuffs`
    pub fn roll(&self, debuffs: &mut Debuffs, rng: &mut impl Rng) -> Applied {
        let mut applied = Applied::default();
        if self.bleed > 0.0 && rng.random::<f32>() < self.bleed {
            debuffs.add_bleed_stack();
            applied.bleed = true;
        }
        if self.burn > 0.0 && rng.random::<f32>() < self.burn {
            debuffs.burn_timer = BURN_DURATION;
            applied.burn = true;
        }
        if self.slow > 0.0 && rng.random::<f32>() < self.slow {
            debuffs.slow_timer = SLOW_DURATION;
            applied.slow = true;
        }
        if self.stun > 0.0 && rng.random::<f32>() < self.stun {
            debuffs.stun_timer = STUN_DURATION;
            applied.stun = true;
        }
        if self.shred > 0.0 && rng.random::<f32>() < self.shred {
            debuffs.armor_shred_timer = SHRED_DURATION;
            applied.shred = true;
        }
        applied
    }
}
