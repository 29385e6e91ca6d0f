//! Weapon slots and firing
//!
//! A weapon's behavior is resolved from its catalog id once, when it is
//! equipped. Every frame each slot's cooldown ticks by `dt * (1 + attack_speed)`
//! and the slot fires at the nearest vulnerable enemy (or the boss) when
//! the cooldown runs out.

use std::f32::consts::{FRAC_PI_4, TAU};
use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::combat::{roll_crit, strike_enemy};
use super::geometry::{OrientedRect, beam_projection, in_circle, in_cone};
use super::projectiles::{BulletSpec, spawn_bullet, spawn_puddle, spawn_scythe, spawn_weapon_fx};
use super::state::{FxKind, World};
use super::stats::Stats;
use super::status::StatusChances;
use crate::catalog::{Catalog, WeaponDef};
use crate::consts::MAX_WEAPON_SLOTS;
use crate::normalize_angle;

/// Orbiting blade rotation speed (rad/s)
pub const ORBIT_SPEED: f32 = 2.4;
/// Blade length as a multiple of weapon range
pub const ORBIT_RANGE_SCALE: f32 = 1.25;
pub const ORBIT_WIDTH: f32 = 22.0;
/// Per-target blade re-hit cooldown before attack speed
pub const ORBIT_HIT_COOLDOWN: f32 = 0.2;

/// Fraction of drain damage returned as healing
pub const DRAIN_HEAL_FRACTION: f32 = 0.15;
pub const PUDDLE_DEFAULT_RADIUS: f32 = 90.0;
pub const PUDDLE_TTL: f32 = 5.0;
pub const LIGHTNING_STUN_CHANCE: f32 = 0.15;
pub const LIGHTNING_STUN_DURATION: f32 = 0.3;
pub const SCYTHE_BASE_SPEED: f32 = 140.0;
pub const SCYTHE_SPEED_PER_LEVEL: f32 = 12.0;
pub const SCYTHE_ANGLE_SPEED: f32 = 2.5;
const BITE_FX_DURATION: f32 = 0.6;
const DAGGER_FX_DURATION: f32 = 0.25;
const MAX_DAGGER_TARGETS: usize = 6;

/// How a weapon attacks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeaponBehavior {
    /// Blades circling the player; one per level, no cooldown
    OrbitBlade,
    /// Cone strike in the aim direction
    MeleeArc { half_angle_deg: f32 },
    /// Straight line from the player; `knockback` pushes hit enemies back
    Beam { half_width: f32, knockback: f32 },
    /// Pooled bullets, optionally spread, piercing or homing
    Ballistic,
    /// Damage-over-time pool dropped on a random visible enemy
    Puddle,
    /// Outward spiralling scythe that hits each enemy once
    ThrownScythe,
    /// Hits everything in range and heals the player
    DrainAura,
    /// Hits the nearest few enemies at once
    Daggers,
    /// Radial strike with a chance to stun
    LightningZone,
    /// Unknown weapon id; never fires
    Inert,
}

impl WeaponBehavior {
    pub fn resolve(id: &str) -> Self {
        match id {
            "sword" => WeaponBehavior::OrbitBlade,
            "short_sword" | "longsword" | "fists" => WeaponBehavior::MeleeArc {
                half_angle_deg: 80.0,
            },
            "axe" | "greatsword" | "hammer" => WeaponBehavior::MeleeArc {
                half_angle_deg: 110.0,
            },
            "laser" => WeaponBehavior::Beam {
                half_width: 10.0,
                knockback: 0.0,
            },
            "whip" => WeaponBehavior::Beam {
                half_width: 8.0,
                knockback: 0.0,
            },
            "chain_blades" => WeaponBehavior::Beam {
                half_width: 10.0,
                knockback: 20.0,
            },
            "pistol" | "machine_gun" | "sniper" | "crossbow" | "rocket_launcher" | "boomerang"
            | "shotgun" | "wand" | "frost_wand" | "fire_staff" | "orb_of_chaos" => {
                WeaponBehavior::Ballistic
            }
            "alchemist_puddle" => WeaponBehavior::Puddle,
            "scythe" => WeaponBehavior::ThrownScythe,
            "vampire_bite" => WeaponBehavior::DrainAura,
            "daggers" => WeaponBehavior::Daggers,
            "lightning_zone" => WeaponBehavior::LightningZone,
            _ => WeaponBehavior::Inert,
        }
    }
}

/// An equipped weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponSlot {
    pub def_index: usize,
    /// 1 ..= MAX_WEAPON_LEVEL
    pub level: u32,
    pub cd_timer: f32,
    pub behavior: WeaponBehavior,
    /// Base status chances before item bonuses
    pub chances: StatusChances,
}

impl WeaponSlot {
    pub fn new(def_index: usize, def: &WeaponDef) -> Self {
        let behavior = WeaponBehavior::resolve(&def.id);
        if behavior == WeaponBehavior::Inert {
            log::warn!("weapon '{}' has no known behavior and will never fire", def.id);
        }
        Self {
            def_index,
            level: 1,
            cd_timer: 0.0,
            behavior,
            chances: StatusChances::for_weapon(&def.id),
        }
    }

    /// Damage per hit: +20% per level above 1, scaled by player damage
    pub fn damage(&self, def: &WeaponDef, stats: &Stats) -> f32 {
        def.damage * (1.0 + 0.2 * (self.level as f32 - 1.0)) * (1.0 + stats.damage)
    }

    /// Cooldown multiplier from level: -5% per level, floored at 0.7
    pub fn level_cooldown(&self) -> f32 {
        (1.0 - 0.05 * (self.level as f32 - 1.0)).clamp(0.7, 1.0)
    }
}

/// Everything a behavior needs about the slot that is firing
struct Shot<'a> {
    def: &'a WeaponDef,
    slot: WeaponSlot,
    stats: Stats,
    damage: f32,
    chances: StatusChances,
}

/// Where a slot is aiming
struct Target {
    pos: Vec2,
    aim: Vec2,
}

/// Advance the orbiting blades while one is equipped
pub fn update_orbit(world: &mut World, dt: f32) {
    if !world.player.has_orbit_blade() {
        return;
    }
    world.player.orbit_angle += dt * ORBIT_SPEED;
    if world.player.orbit_angle > TAU {
        world.player.orbit_angle -= TAU;
    }
}

/// Tick every weapon slot and fire the ready ones
pub fn fire_weapons(world: &mut World, dt: f32) {
    let catalog = Arc::clone(&world.catalog);
    let stats = world.player.total_stats();
    let attack_speed = 1.0 + stats.attack_speed;
    let cooldown_scale = (1.0 - stats.cooldown_reduction).clamp(0.4, 1.0);
    let effects = world.player.effects;

    for slot_index in 0..MAX_WEAPON_SLOTS {
        let Some(slot) = world.player.weapons[slot_index] else {
            continue;
        };
        let Some(def) = catalog.weapon(slot.def_index) else {
            continue;
        };
        let shot = Shot {
            def,
            slot,
            stats,
            damage: slot.damage(def, &stats),
            chances: slot
                .chances
                .with_item_bonus(effects.slow_on_hit, effects.burn_on_hit),
        };

        match slot.behavior {
            WeaponBehavior::OrbitBlade => {
                sweep_orbit_blades(world, &catalog, &shot, attack_speed);
                continue;
            }
            WeaponBehavior::Inert => continue,
            _ => {}
        }

        let Some(ready) = world.player.weapons[slot_index].as_mut() else {
            continue;
        };
        ready.cd_timer -= dt * attack_speed;
        if ready.cd_timer > 0.0 {
            continue;
        }

        let Some(target) = acquire_target(world, slot.behavior, def.range) else {
            continue;
        };

        match slot.behavior {
            WeaponBehavior::LightningZone => fire_lightning_zone(world, &catalog, &shot),
            WeaponBehavior::Puddle => fire_puddle(world, &shot, &target),
            WeaponBehavior::Beam {
                half_width,
                knockback,
            } => fire_beam(world, &catalog, &shot, &target, half_width, knockback),
            WeaponBehavior::ThrownScythe => fire_scythe(world, &shot, &target),
            WeaponBehavior::DrainAura => fire_drain(world, &catalog, &shot),
            WeaponBehavior::Daggers => fire_daggers(world, &catalog, &shot),
            WeaponBehavior::MeleeArc { half_angle_deg } => {
                fire_melee_arc(world, &catalog, &shot, &target, half_angle_deg)
            }
            WeaponBehavior::Ballistic => fire_ballistic(world, &shot, &target),
            WeaponBehavior::OrbitBlade | WeaponBehavior::Inert => {}
        }

        if let Some(fired) = world.player.weapons[slot_index].as_mut() {
            fired.cd_timer = def.cooldown * cooldown_scale * slot.level_cooldown();
        }
    }
}

/// Boss while one is up; else a random visible enemy for puddles, else the
/// nearest vulnerable enemy within range
fn acquire_target(world: &mut World, behavior: WeaponBehavior, range: f32) -> Option<Target> {
    let origin = world.player.pos;
    let (pos, d2) = if world.boss_active() {
        (world.boss.pos, world.boss.pos.distance_squared(origin))
    } else if behavior == WeaponBehavior::Puddle {
        let visible: Vec<Vec2> = world
            .enemies
            .iter_active()
            .filter(|(_, e)| !e.is_invulnerable() && world.in_view(e.pos))
            .map(|(_, e)| e.pos)
            .collect();
        if visible.is_empty() {
            return None;
        }
        let pick = world.rng.random_range(0..visible.len());
        (visible[pick], visible[pick].distance_squared(origin))
    } else {
        world
            .enemies
            .iter_active()
            .filter(|(_, e)| !e.is_invulnerable())
            .map(|(_, e)| (e.pos, e.pos.distance_squared(origin)))
            .fold(None, |best: Option<(Vec2, f32)>, cand| match best {
                Some(b) if b.1 <= cand.1 => Some(b),
                _ => Some(cand),
            })?
    };

    if behavior != WeaponBehavior::Puddle && range > 0.0 && d2 > range * range {
        return None;
    }
    Some(Target {
        pos,
        aim: (pos - origin).normalize_or_zero(),
    })
}

/// Orbiting blades hit every vulnerable enemy under them, once per cooldown
fn sweep_orbit_blades(world: &mut World, catalog: &Catalog, shot: &Shot, attack_speed: f32) {
    let count = shot.slot.level.max(1);
    let length = shot.def.range * ORBIT_RANGE_SCALE;
    let hit_cooldown = ORBIT_HIT_COOLDOWN / attack_speed;
    let origin = world.player.pos;

    for s in 0..count {
        let angle = world.player.orbit_angle + TAU * s as f32 / count as f32;
        let blade = OrientedRect::blade(origin, angle, length, ORBIT_WIDTH);

        if world.boss_active() && world.boss.sword_hit_cd <= 0.0 {
            let radius = catalog.boss(world.boss.def_index).radius;
            if blade.overlaps_circle(world.boss.pos, radius) {
                world.boss.hp -= roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
                world.boss.sword_hit_cd = hit_cooldown;
            }
        }

        for i in 0..world.enemies.capacity() {
            let enemy = &world.enemies[i];
            if !enemy.active || enemy.is_invulnerable() || enemy.sword_hit_cd > 0.0 {
                continue;
            }
            if !blade.contains(enemy.pos) {
                continue;
            }
            let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
            strike_enemy(world, catalog, &shot.stats, i, damage, &shot.chances, &shot.def.name);
            world.enemies[i].sword_hit_cd = hit_cooldown;
        }
    }
}

fn fire_lightning_zone(world: &mut World, catalog: &Catalog, shot: &Shot) {
    let range = shot.def.range * (1.0 + 0.1 * (shot.slot.level as f32 - 1.0));
    let origin = world.player.pos;

    if world.boss_active() {
        if in_circle(origin, range, world.boss.pos) {
            world.boss.hp -= roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        }
        return;
    }

    for i in 0..world.enemies.capacity() {
        let enemy = &world.enemies[i];
        if !enemy.active || enemy.is_invulnerable() || !in_circle(origin, range, enemy.pos) {
            continue;
        }
        let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        strike_enemy(
            world,
            catalog,
            &shot.stats,
            i,
            damage,
            &StatusChances::default(),
            &shot.def.name,
        );
        if world.rng.random::<f32>() < LIGHTNING_STUN_CHANCE {
            world.enemies[i].debuffs.stun_timer = LIGHTNING_STUN_DURATION;
            combat_log!(world, "stun applied to {}", catalog.enemy_name(world.enemies[i].def_index));
        }
    }
}

fn fire_puddle(world: &mut World, shot: &Shot, target: &Target) {
    let radius = if shot.def.range > 0.0 {
        shot.def.range
    } else {
        PUDDLE_DEFAULT_RADIUS
    };
    spawn_puddle(world, target.pos, radius, shot.damage, PUDDLE_TTL);
    combat_log!(world, "puddle spawned (r={:.0} dps={:.1})", radius, shot.damage);
}

fn fire_beam(
    world: &mut World,
    catalog: &Catalog,
    shot: &Shot,
    target: &Target,
    half_width: f32,
    knockback: f32,
) {
    let origin = world.player.pos;
    let range = shot.def.range;

    if world.boss_active() {
        let p = beam_projection(origin, target.aim, world.boss.pos);
        let reach = half_width + catalog.boss(world.boss.def_index).radius;
        if p.along > 0.0 && p.along <= range && p.perp <= reach {
            world.boss.hp -= roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        }
    }

    for i in 0..world.enemies.capacity() {
        let enemy = &world.enemies[i];
        if !enemy.active {
            continue;
        }
        let p = beam_projection(origin, target.aim, enemy.pos);
        if p.along < 0.0 || p.along > range || p.perp > half_width || enemy.is_invulnerable() {
            continue;
        }
        let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        strike_enemy(world, catalog, &shot.stats, i, damage, &shot.chances, &shot.def.name);
        if knockback > 0.0 {
            world.enemies[i].pos -= target.aim * knockback;
        }
    }
}

fn fire_scythe(world: &mut World, shot: &Shot, target: &Target) {
    let base_angle = target.aim.y.atan2(target.aim.x) + world.player.scythe_throw_angle;
    world.player.scythe_throw_angle = normalize_angle(world.player.scythe_throw_angle - FRAC_PI_4);
    let speed = SCYTHE_BASE_SPEED + SCYTHE_SPEED_PER_LEVEL * (shot.slot.level as f32 - 1.0);
    let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
    let origin = world.player.pos;
    spawn_scythe(
        world,
        origin,
        base_angle,
        speed,
        SCYTHE_ANGLE_SPEED,
        damage,
        shot.chances,
    );
}

fn fire_drain(world: &mut World, catalog: &Catalog, shot: &Shot) {
    let origin = world.player.pos;
    let chances = shot.chances.without_bleed();

    for i in 0..world.enemies.capacity() {
        let enemy = &world.enemies[i];
        if !enemy.active || enemy.is_invulnerable() || !in_circle(origin, shot.def.range, enemy.pos)
        {
            continue;
        }
        let pos = enemy.pos;
        let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        let dealt = strike_enemy(world, catalog, &shot.stats, i, damage, &chances, &shot.def.name);
        spawn_weapon_fx(world, FxKind::Bite, pos, 0.0, BITE_FX_DURATION, Some(i));
        world.player.heal(dealt * DRAIN_HEAL_FRACTION, shot.stats.max_hp);
    }
}

/// Nearest `limit` vulnerable enemies within `range`, closest first
fn nearest_targets(world: &World, range: f32, limit: usize) -> Vec<usize> {
    let origin = world.player.pos;
    let mut shortlist: Vec<(usize, f32)> = Vec::with_capacity(limit + 1);
    for (i, enemy) in world.enemies.iter_active() {
        if enemy.is_invulnerable() {
            continue;
        }
        let d2 = enemy.pos.distance_squared(origin);
        if d2 > range * range {
            continue;
        }
        let at = shortlist.partition_point(|&(_, best)| best <= d2);
        if at < limit {
            shortlist.insert(at, (i, d2));
            shortlist.truncate(limit);
        }
    }
    shortlist.into_iter().map(|(i, _)| i).collect()
}

fn fire_daggers(world: &mut World, catalog: &Catalog, shot: &Shot) {
    let limit = (3 + shot.slot.level as usize - 1).min(MAX_DAGGER_TARGETS);
    let origin = world.player.pos;

    for i in nearest_targets(world, shot.def.range, limit) {
        let dir = (world.enemies[i].pos - origin).normalize_or_zero();
        spawn_weapon_fx(
            world,
            FxKind::Dagger,
            origin,
            dir.y.atan2(dir.x),
            DAGGER_FX_DURATION,
            Some(i),
        );
        let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        strike_enemy(world, catalog, &shot.stats, i, damage, &shot.chances, &shot.def.name);
    }
}

fn fire_melee_arc(
    world: &mut World,
    catalog: &Catalog,
    shot: &Shot,
    target: &Target,
    half_angle_deg: f32,
) {
    let origin = world.player.pos;
    let cos_half = half_angle_deg.to_radians().cos();

    for i in 0..world.enemies.capacity() {
        let enemy = &world.enemies[i];
        if !enemy.active
            || !in_cone(origin, target.aim, enemy.pos, shot.def.range, cos_half)
            || enemy.is_invulnerable()
        {
            continue;
        }
        let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        strike_enemy(world, catalog, &shot.stats, i, damage, &shot.chances, &shot.def.name);
    }
}

fn fire_ballistic(world: &mut World, shot: &Shot, target: &Target) {
    let pellets = shot.def.pellets.max(1);
    let spread = shot.def.spread.max(0.0).to_radians();
    let base_angle = target.aim.y.atan2(target.aim.x);
    let step = if pellets > 1 {
        spread / (pellets - 1) as f32
    } else {
        0.0
    };
    let origin = world.player.pos;

    for s in 0..pellets {
        let angle = base_angle + step * s as f32 - step * (pellets - 1) as f32 * 0.5;
        let vel = Vec2::from_angle(angle) * shot.def.projectile_speed;
        let damage = roll_crit(&shot.stats, shot.def, shot.damage, &mut world.rng);
        spawn_bullet(
            world,
            BulletSpec {
                pos: origin,
                vel,
                damage,
                pierce: shot.def.pierce,
                homing: shot.def.homing,
                from_player: true,
                weapon_index: Some(shot.slot.def_index),
                chances: shot.chances,
            },
        );
    }
}
