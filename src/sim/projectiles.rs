//! Bullets, damage puddles and weapon effect particles
//!
//! Spawning goes through the pools, so requests beyond capacity are dropped.

use std::sync::Arc;

use glam::Vec2;

use super::combat::{damage_after_armor, strike_enemy};
use super::geometry::in_circle;
use super::state::{Bullet, FxKind, Puddle, WeaponFx, World};
use super::stats::Stats;
use super::status::StatusChances;
use crate::catalog::Catalog;
use crate::consts::*;

/// Homing turn blend per frame
const HOMING_BLEND: f32 = 0.15;
/// Speed homing bullets steer toward
const HOMING_SPEED: f32 = 350.0;
/// Seconds between combat log lines for one puddle
const PUDDLE_LOG_INTERVAL: f32 = 0.25;
/// Scythe hit circle radius
pub const SCYTHE_HIT_RADIUS: f32 = 34.0;
/// Scythe flight time
pub const SCYTHE_LIFETIME: f32 = 8.0;
/// Player heal when a scythe kills
pub const SCYTHE_KILL_HEAL: f32 = 6.0;
/// Scythes vanish this far outside the arena
const SCYTHE_BOUNDS_SLACK: f32 = 20.0;

/// Everything needed to fire one bullet
#[derive(Debug, Clone, Copy, Default)]
pub struct BulletSpec {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub pierce: i32,
    pub homing: bool,
    pub from_player: bool,
    pub weapon_index: Option<usize>,
    pub chances: StatusChances,
}

impl BulletSpec {
    /// Plain enemy shot
    pub fn enemy(pos: Vec2, vel: Vec2, damage: f32) -> Self {
        Self {
            pos,
            vel,
            damage,
            ..Default::default()
        }
    }
}

pub fn spawn_bullet(world: &mut World, spec: BulletSpec) -> Option<usize> {
    world.bullets.spawn(Bullet {
        active: true,
        from_player: spec.from_player,
        pos: spec.pos,
        vel: spec.vel,
        damage: spec.damage,
        radius: BULLET_RADIUS,
        lifetime: BULLET_LIFETIME,
        pierce: spec.pierce,
        homing: spec.homing,
        weapon_index: spec.weapon_index,
        chances: spec.chances,
    })
}

pub fn spawn_puddle(world: &mut World, pos: Vec2, radius: f32, dps: f32, ttl: f32) -> Option<usize> {
    world.puddles.spawn(Puddle {
        active: true,
        pos,
        radius,
        dps,
        ttl,
        log_timer: 0.0,
    })
}

/// Cosmetic bite or dagger particle
pub fn spawn_weapon_fx(
    world: &mut World,
    kind: FxKind,
    pos: Vec2,
    angle: f32,
    duration: f32,
    target: Option<usize>,
) -> Option<usize> {
    world.weapon_fx.spawn(WeaponFx {
        active: true,
        kind,
        origin: pos,
        angle,
        start_angle: angle,
        duration,
        target,
        ..Default::default()
    })
}

/// Throw a scythe spiralling out from `origin`
pub fn spawn_scythe(
    world: &mut World,
    origin: Vec2,
    angle: f32,
    radial_speed: f32,
    angle_speed: f32,
    damage: f32,
    chances: StatusChances,
) -> Option<usize> {
    let scythe_id = world.next_scythe_id();
    world.weapon_fx.spawn(WeaponFx {
        active: true,
        kind: FxKind::Scythe,
        origin,
        angle,
        start_angle: angle,
        timer: 0.0,
        duration: SCYTHE_LIFETIME,
        radius: 0.0,
        radial_speed,
        angle_speed,
        damage,
        chances,
        scythe_id,
        hit_boss: false,
        target: None,
    })
}

fn out_of_arena(pos: Vec2, slack: f32) -> bool {
    pos.x < -slack || pos.x > ARENA_W + slack || pos.y < -slack || pos.y > ARENA_H + slack
}

fn nearest_active_enemy(world: &World, from: Vec2) -> Option<Vec2> {
    world
        .enemies
        .iter_active()
        .map(|(_, e)| e.pos)
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

/// Move bullets and resolve their hits
pub fn update_bullets(world: &mut World, dt: f32) {
    let catalog = Arc::clone(&world.catalog);
    let stats = world.player.total_stats();

    for i in 0..world.bullets.capacity() {
        if !world.bullets[i].active {
            continue;
        }
        world.bullets[i].lifetime -= dt;
        if world.bullets[i].lifetime <= 0.0 {
            world.bullets[i].active = false;
            continue;
        }

        if world.bullets[i].homing && world.bullets[i].from_player {
            let pos = world.bullets[i].pos;
            if let Some(target) = nearest_active_enemy(world, pos) {
                let dir = (target - pos).normalize_or_zero();
                let bullet = &mut world.bullets[i];
                bullet.vel = bullet.vel * (1.0 - HOMING_BLEND) + dir * HOMING_SPEED * HOMING_BLEND;
            }
        }

        let bullet = &mut world.bullets[i];
        bullet.pos += bullet.vel * dt;
        if out_of_arena(bullet.pos, 0.0) {
            bullet.active = false;
            continue;
        }

        if bullet.from_player {
            player_bullet_hits(world, &catalog, &stats, i);
        } else if bullet.pos.distance_squared(world.player.pos) < PLAYER_HIT_RADIUS * PLAYER_HIT_RADIUS {
            let damage = damage_after_armor(bullet.damage, stats.armor);
            bullet.active = false;
            world.player.hp -= damage;
        }
    }
}

/// Spend one pierce; the bullet is gone below zero
fn consume_pierce(bullet: &mut Bullet) {
    bullet.pierce -= 1;
    if bullet.pierce < 0 {
        bullet.active = false;
    }
}

fn player_bullet_hits(world: &mut World, catalog: &Catalog, stats: &Stats, index: usize) {
    if world.boss_active() {
        let radius = catalog.boss(world.boss.def_index).radius;
        let bullet = &mut world.bullets[index];
        if bullet.pos.distance_squared(world.boss.pos) < radius * radius {
            world.boss.hp -= bullet.damage;
            consume_pierce(bullet);
            return;
        }
    }

    let (pos, reach) = {
        let bullet = &world.bullets[index];
        (bullet.pos, ENEMY_HIT_RADIUS + bullet.radius)
    };
    let hit = world
        .enemies
        .iter_active()
        .find(|(_, e)| e.pos.distance_squared(pos) < reach * reach)
        .map(|(e, enemy)| (e, enemy.is_invulnerable()));
    let Some((e, invulnerable)) = hit else {
        return;
    };
    if invulnerable {
        world.bullets[index].active = false;
        return;
    }

    let bullet = world.bullets[index].clone();
    let source = bullet
        .weapon_index
        .map(|w| catalog.weapon_name(w))
        .unwrap_or("bullet");
    strike_enemy(world, catalog, stats, e, bullet.damage, &bullet.chances, source);
    consume_pierce(&mut world.bullets[index]);
}

/// Tick puddles, damaging every vulnerable enemy inside
///
/// In a boss encounter the boss takes puddle damage too.
pub fn update_puddles(world: &mut World, dt: f32) {
    let catalog = Arc::clone(&world.catalog);
    let boss_active = world.boss_active();
    let boss_radius = catalog.boss(world.boss.def_index).radius;

    for p in 0..world.puddles.capacity() {
        if !world.puddles[p].active {
            continue;
        }
        let puddle = &mut world.puddles[p];
        puddle.ttl -= dt;
        puddle.log_timer -= dt;
        if puddle.ttl <= 0.0 {
            puddle.active = false;
            continue;
        }
        let (pos, radius, damage) = (puddle.pos, puddle.radius, puddle.dps * dt);
        let log_now = puddle.log_timer <= 0.0;

        for e in 0..world.enemies.capacity() {
            let enemy = &mut world.enemies[e];
            if !enemy.active || enemy.is_invulnerable() {
                continue;
            }
            if enemy.pos.distance_squared(pos) < radius * radius {
                enemy.hp -= damage;
                if log_now {
                    combat_log!(
                        world,
                        "puddle hit {} for {:.2}",
                        catalog.enemy_name(world.enemies[e].def_index),
                        damage
                    );
                }
            }
        }

        if boss_active {
            let reach = radius + boss_radius;
            if world.boss.pos.distance_squared(pos) < reach * reach {
                world.boss.hp -= damage;
            }
        }

        if log_now {
            world.puddles[p].log_timer = PUDDLE_LOG_INTERVAL;
        }
    }
}

/// Advance weapon particles; scythes strike what their hit circle touches
pub fn update_weapon_fx(world: &mut World, dt: f32) {
    let catalog = Arc::clone(&world.catalog);
    let stats = world.player.total_stats();

    for f in 0..world.weapon_fx.capacity() {
        if !world.weapon_fx[f].active {
            continue;
        }
        let fx = &mut world.weapon_fx[f];
        fx.timer += dt;
        if fx.kind == FxKind::Scythe {
            fx.radius = fx.radial_speed * fx.timer;
            fx.angle = fx.start_angle + fx.angle_speed * fx.timer;
            if out_of_arena(fx.scythe_pos(), SCYTHE_BOUNDS_SLACK) {
                fx.active = false;
                continue;
            }
            scythe_hits(world, &catalog, &stats, f);
        }
        let fx = &mut world.weapon_fx[f];
        if fx.timer >= fx.duration {
            fx.active = false;
        }
    }
}

fn scythe_hits(world: &mut World, catalog: &Catalog, stats: &Stats, index: usize) {
    let fx = world.weapon_fx[index].clone();
    let pos = fx.scythe_pos();

    for e in 0..world.enemies.capacity() {
        let enemy = &world.enemies[e];
        if !enemy.active || enemy.is_invulnerable() || enemy.scythe_hit_id == fx.scythe_id {
            continue;
        }
        if !in_circle(pos, SCYTHE_HIT_RADIUS, enemy.pos) {
            continue;
        }
        strike_enemy(world, catalog, stats, e, fx.damage, &fx.chances, "scythe");
        world.enemies[e].scythe_hit_id = fx.scythe_id;
        if world.enemies[e].hp <= 0.0 {
            world.player.heal(SCYTHE_KILL_HEAL, stats.max_hp);
        }
    }

    if world.boss_active() && !fx.hit_boss {
        let reach = catalog.boss(world.boss.def_index).radius + SCYTHE_HIT_RADIUS;
        if world.boss.pos.distance_squared(pos) < reach * reach {
            world.boss.hp -= fx.damage;
            world.weapon_fx[index].hit_boss = true;
        }
    }
}
