//! Stat blocks and aggregation
//!
//! Usable stats are always recomputed as `clamp(base + bonus)`; nothing is
//! accumulated in place across frames.

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Eleven additive player stats
///
/// Percent fields are fractions (0.1 = +10%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub damage: f32,
    pub max_hp: f32,
    pub move_speed: f32,
    pub attack_speed: f32,
    pub armor: f32,
    pub dodge: f32,
    pub crit_chance: f32,
    pub crit_damage: f32,
    pub cooldown_reduction: f32,
    pub xp_magnet: f32,
    pub hp_regen: f32,
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Stats) -> Stats {
        self += rhs;
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        self.damage += rhs.damage;
        self.max_hp += rhs.max_hp;
        self.move_speed += rhs.move_speed;
        self.attack_speed += rhs.attack_speed;
        self.armor += rhs.armor;
        self.dodge += rhs.dodge;
        self.crit_chance += rhs.crit_chance;
        self.crit_damage += rhs.crit_damage;
        self.cooldown_reduction += rhs.cooldown_reduction;
        self.xp_magnet += rhs.xp_magnet;
        self.hp_regen += rhs.hp_regen;
    }
}

impl Mul<f32> for Stats {
    type Output = Stats;

    fn mul(self, k: f32) -> Stats {
        Stats {
            damage: self.damage * k,
            max_hp: self.max_hp * k,
            move_speed: self.move_speed * k,
            attack_speed: self.attack_speed * k,
            armor: self.armor * k,
            dodge: self.dodge * k,
            crit_chance: self.crit_chance * k,
            crit_damage: self.crit_damage * k,
            cooldown_reduction: self.cooldown_reduction * k,
            xp_magnet: self.xp_magnet * k,
            hp_regen: self.hp_regen * k,
        }
    }
}

impl Stats {
    /// Clamp every bounded field into its legal range
    ///
    /// `regen_amp` scales hp regen after its first clamp; the amplified
    /// value has a second, wider ceiling. Damage and armor are unbounded.
    pub fn clamped(mut self, regen_amp: f32) -> Stats {
        self.max_hp = self.max_hp.clamp(1.0, 9999.0);
        self.attack_speed = self.attack_speed.clamp(-0.5, 3.0);
        self.move_speed = self.move_speed.clamp(-0.3, 2.0);
        self.dodge = self.dodge.clamp(0.0, 0.75);
        self.crit_chance = self.crit_chance.clamp(0.0, 0.75);
        self.crit_damage = self.crit_damage.clamp(0.0, 3.0);
        self.cooldown_reduction = self.cooldown_reduction.clamp(0.0, 0.6);
        self.xp_magnet = self.xp_magnet.clamp(0.0, 600.0);
        self.hp_regen = self.hp_regen.clamp(0.0, 50.0);
        self.hp_regen *= 1.0 + regen_amp.clamp(0.0, 3.0);
        self.hp_regen = self.hp_regen.clamp(0.0, 100.0);
        self
    }

    /// Move speed converted into attack speed (haste ultimate)
    pub fn hasted(mut self) -> Stats {
        self.attack_speed += self.move_speed;
        self.move_speed = 0.0;
        self
    }

    /// Score rewarding defensive investment, used by legendary amplification
    pub fn secondary_score(&self) -> f32 {
        self.max_hp / 100.0 + self.move_speed * 10.0 + self.armor + self.dodge * 20.0
    }
}

/// Secondary item effects summed over the player's passive items
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemEffects {
    pub slow_on_hit: f32,
    pub slow_aura: f32,
    pub burn_on_hit: f32,
    pub burn_aura: f32,
    pub thorns: f32,
    pub lifesteal_on_kill: f32,
    pub rarity_bias: f32,
    pub slow_bonus_damage: f32,
    pub legendary_amp: f32,
    pub hp_regen_amp: f32,
    pub xp_kill_chance: f32,
    pub ultimate_cdr: f32,
}

impl ItemEffects {
    /// Aggregate item effects; unknown item indices are skipped
    pub fn collect(items: &[usize], catalog: &Catalog) -> Self {
        let mut fx = ItemEffects::default();
        for item in items.iter().filter_map(|&i| catalog.item(i)) {
            fx.slow_on_hit += item.slow_on_hit;
            fx.slow_aura = fx.slow_aura.max(item.slow_aura);
            fx.burn_on_hit += item.burn_on_hit;
            fx.burn_aura = fx.burn_aura.max(item.burn_aura);
            fx.thorns += item.thorns_percent;
            fx.lifesteal_on_kill += item.lifesteal_on_kill;
            fx.rarity_bias += item.rarity_bias;
            fx.slow_bonus_damage += item.slow_bonus_damage;
            fx.legendary_amp += item.legendary_amp;
            fx.hp_regen_amp += item.hp_regen_amp;
            fx.xp_kill_chance += item.xp_kill_chance;
            fx.ultimate_cdr += item.ultimate_cdr;
        }
        fx.slow_on_hit = fx.slow_on_hit.clamp(0.0, 1.0);
        fx.burn_on_hit = fx.burn_on_hit.clamp(0.0, 1.0);
        fx.thorns = fx.thorns.clamp(0.0, 0.9);
        fx.rarity_bias = fx.rarity_bias.clamp(0.0, 0.9);
        fx.slow_bonus_damage = fx.slow_bonus_damage.clamp(0.0, 1.0);
        fx.legendary_amp = fx.legendary_amp.clamp(0.0, 0.2);
        fx.hp_regen_amp = fx.hp_regen_amp.clamp(0.0, 3.0);
        fx.xp_kill_chance = fx.xp_kill_chance.clamp(0.0, 1.0);
        fx.ultimate_cdr = fx.ultimate_cdr.clamp(0.0, 0.75);
        fx
    }
}

/// Recompute the item bonus block from passive items
///
/// Non-legendary items are summed first. When legendary amplification is
/// present, legendary item stats are scaled by `1 + clamp(amp * score, 0, 0.75)`
/// where the score comes from `base` plus the non-legendary sum.
pub fn compute_bonus(base: &Stats, items: &[usize], catalog: &Catalog) -> Stats {
    let amp = ItemEffects::collect(items, catalog).legendary_amp;
    let owned = || items.iter().filter_map(|&i| catalog.item(i));

    if amp <= 0.0 {
        return owned().fold(Stats::default(), |acc, item| acc + item.stats);
    }

    let mut bonus = owned()
        .filter(|item| !item.is_legendary())
        .fold(Stats::default(), |acc, item| acc + item.stats);

    let score = (*base + bonus).secondary_score();
    let legendary_bonus = (amp * score).clamp(0.0, 0.75);

    for item in owned().filter(|item| item.is_legendary()) {
        bonus += item.stats * (1.0 + legendary_bonus);
    }
    bonus
}

/// Total usable stats for this frame
pub fn total_stats(base: &Stats, bonus: &Stats, hasted: bool, regen_amp: f32) -> Stats {
    let mut s = *base + *bonus;
    if hasted {
        s = s.hasted();
    }
    s.clamped(regen_amp)
}
