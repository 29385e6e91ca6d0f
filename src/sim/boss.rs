//! Boss encounter sub-mode
//!
//! Entering saves the wave and moves the player into an empty room. After a
//! countdown the boss appears and runs its attack patterns until it dies, the
//! player dies or the encounter timer runs out. Every outcome restores the
//! saved wave; a victory also offers legendary rewards.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use super::combat::damage_after_armor;
use super::geometry::{beam_projection, in_circle};
use super::projectiles::{BulletSpec, spawn_bullet};
use super::rewards::build_boss_reward_choices;
use super::snapshot::{restore_snapshot, save_snapshot};
use super::state::{Boss, GameEvent, GameMode, World};
use crate::consts::*;
use crate::{clamp_to_arena, polar_to_cartesian};

/// Delay before the boss appears
pub const BOSS_COUNTDOWN: f32 = 3.0;
/// Encounter is lost when this runs out
pub const BOSS_TIME_LIMIT: f32 = 180.0;
/// Room centers keep this far from the arena edge
const ROOM_MARGIN: f32 = 200.0;
/// Boss spawn distance from the player
const SPAWN_DISTANCE: f32 = 280.0;
const SPAWN_DISTANCE_SPREAD: f32 = 80.0;
/// Boss and safe zones keep this far from the arena edge
const BOSS_EDGE: f32 = 40.0;
/// Contact reach beyond the boss radius
const CONTACT_SLACK: f32 = 14.0;
const SLAM_KNOCKBACK: f32 = 80.0;
const MIN_WAVE_BULLETS: i32 = 6;
const WAVE_DAMAGE_MUL: f32 = 0.7;
const SAFE_ZONE_ATTEMPTS: usize = 20;
/// Safe zones scatter within this fraction of the smaller view side
const SAFE_ZONE_SPREAD: f32 = 0.35;
const MIN_SAFE_ZONE_SPREAD: f32 = 120.0;

/// Enter the encounter from normal wave play
///
/// Returns false (and does nothing) from any other mode.
pub fn start_boss_event(world: &mut World) -> bool {
    if world.mode != GameMode::Wave {
        return false;
    }
    save_snapshot(world);
    world.mode = GameMode::BossEvent;
    world.encounter.countdown = BOSS_COUNTDOWN;
    world.encounter.timer = BOSS_TIME_LIMIT;
    world.encounter.timer_max = BOSS_TIME_LIMIT;
    world.encounter.event_cd = world.settings.boss_event_cooldown;
    world.boss = Boss::default();

    let room = Vec2::new(
        ROOM_MARGIN + world.rng.random::<f32>() * (ARENA_W - ROOM_MARGIN * 2.0),
        ROOM_MARGIN + world.rng.random::<f32>() * (ARENA_H - ROOM_MARGIN * 2.0),
    );
    world.encounter.room_center = room;
    world.player.pos = room;

    world.enemies.clear();
    world.bullets.clear();
    world.drops.clear();
    world.puddles.clear();
    world.weapon_fx.clear();
    world.center_camera_on_player();

    log::info!("Boss event started at ({:.0}, {:.0})", room.x, room.y);
    world.push_event(GameEvent::BossEventStarted);
    true
}

pub fn spawn_boss(world: &mut World, pos: Vec2) {
    let def_index = 0;
    let def = world.catalog.boss(def_index);
    world.boss = Boss {
        active: true,
        def_index,
        pos,
        hp: def.hp,
        max_hp: def.hp,
        attack_timer: 0.0,
        beam_angle: world.rng.random::<f32>() * TAU,
        wave_cd: def.wave_cooldown * 0.5,
        slam_cd: def.slam_cooldown * 0.5,
        hazard_timer: 0.0,
        hazard_cd: def.hazard_cooldown * 0.5,
        sword_hit_cd: 0.0,
        safe_zones: [pos; 3],
    };
    log::info!("Boss {} spawned with {:.0} hp", def.name, def.hp);
    world.push_event(GameEvent::BossSpawned { pos });
}

/// Countdown, encounter timer and boss hit cooldown
pub fn advance_encounter_clock(world: &mut World, dt: f32) {
    if world.encounter.countdown > 0.0 {
        world.encounter.countdown -= dt;
        if world.encounter.countdown <= 0.0 {
            let angle = world.rng.random::<f32>() * TAU;
            let dist = SPAWN_DISTANCE + world.rng.random::<f32>() * SPAWN_DISTANCE_SPREAD;
            let pos = clamp_to_arena(world.player.pos + polar_to_cartesian(dist, angle), BOSS_EDGE);
            spawn_boss(world, pos);
        }
    }
    world.encounter.timer = (world.encounter.timer - dt).max(0.0);
    world.boss.sword_hit_cd = (world.boss.sword_hit_cd - dt).max(0.0);
}

/// Run the boss's attack patterns, then settle the encounter
pub fn update_boss_event(world: &mut World, dt: f32) {
    if world.boss.active {
        update_boss(world, dt);
        if world.boss.hp <= 0.0 {
            end_boss_event(world, true);
            return;
        }
    }
    if world.player.hp <= 0.0 || world.encounter.timer <= 0.0 {
        end_boss_event(world, false);
    }
}

fn update_boss(world: &mut World, dt: f32) {
    let catalog = Arc::clone(&world.catalog);
    let def = catalog.boss(world.boss.def_index);
    let stats = world.player.total_stats();
    let to_player = world.player.pos - world.boss.pos;
    let dist = to_player.length();
    let dir = to_player.normalize_or_zero();

    let boss = &mut world.boss;
    if dist > 0.001 && boss.hazard_timer <= 0.0 {
        boss.pos += dir * def.speed * dt;
    }

    if boss.attack_timer > 0.0 {
        boss.attack_timer -= dt;
    }
    if dist < def.radius + CONTACT_SLACK && boss.attack_timer <= 0.0 {
        world.player.hp -= damage_after_armor(def.damage, stats.armor);
        boss.attack_timer = def.attack_cooldown;
    }

    for cd in [&mut boss.wave_cd, &mut boss.slam_cd, &mut boss.hazard_cd] {
        if *cd > 0.0 {
            *cd -= dt;
        }
    }

    boss.beam_angle += def.beam_rot_speed * dt;
    if boss.beam_angle > TAU {
        boss.beam_angle -= TAU;
    }
    let beam = beam_projection(boss.pos, Vec2::from_angle(boss.beam_angle), world.player.pos);
    if beam.along > 0.0 && beam.along < def.beam_length && beam.perp <= def.beam_width * 0.5 {
        world.player.hp -= damage_after_armor(def.beam_dps * dt, stats.armor);
    }

    let hazard_active = if boss.hazard_timer > 0.0 {
        boss.hazard_timer = (boss.hazard_timer - dt).max(0.0);
        let safe = boss
            .safe_zones
            .iter()
            .any(|zone| in_circle(*zone, def.hazard_safe_radius, world.player.pos));
        if !safe {
            world.player.hp -= damage_after_armor(def.hazard_dps * dt, stats.armor);
        }
        true
    } else if boss.hazard_cd <= 0.0 {
        boss.hazard_timer = def.hazard_duration;
        boss.hazard_cd = def.hazard_cooldown;
        place_safe_zones(world, def.hazard_safe_radius);
        log::debug!("Boss hazard phase for {:.1}s", def.hazard_duration);
        true
    } else {
        false
    };
    if hazard_active {
        return;
    }

    if world.boss.wave_cd <= 0.0 {
        let n = def.wave_bullets.max(MIN_WAVE_BULLETS);
        let origin = world.boss.pos;
        for i in 0..n {
            let angle = TAU * i as f32 / n as f32;
            let vel = polar_to_cartesian(def.wave_speed, angle);
            spawn_bullet(
                world,
                BulletSpec::enemy(origin, vel, def.damage * WAVE_DAMAGE_MUL),
            );
        }
        world.boss.wave_cd = def.wave_cooldown;
    }

    if world.boss.slam_cd <= 0.0 && dist < def.slam_radius {
        world.player.hp -= damage_after_armor(def.slam_damage, stats.armor);
        if dist > 0.001 {
            world.player.pos =
                clamp_to_arena(world.player.pos + dir * SLAM_KNOCKBACK, PLAYER_EDGE_MARGIN);
        }
        world.boss.slam_cd = def.slam_cooldown;
        combat_log!(world, "boss slam hit player");
    }
}

/// Scatter the three safe zones around the player, kept apart
fn place_safe_zones(world: &mut World, safe_radius: f32) {
    let spread = (world.view.x.min(world.view.y) * SAFE_ZONE_SPREAD).max(MIN_SAFE_ZONE_SPREAD);
    let min_gap2 = safe_radius * safe_radius * 3.0;
    let center = world.player.pos;

    for i in 0..world.boss.safe_zones.len() {
        for _ in 0..SAFE_ZONE_ATTEMPTS {
            let angle = world.rng.random::<f32>() * TAU;
            let dist = spread * (0.4 + world.rng.random::<f32>() * 0.6);
            let zone = clamp_to_arena(center + polar_to_cartesian(dist, angle), BOSS_EDGE);
            let clear = world.boss.safe_zones[..i]
                .iter()
                .all(|other| other.distance_squared(zone) >= min_gap2);
            if clear {
                world.boss.safe_zones[i] = zone;
                break;
            }
        }
    }
}

/// Leave the encounter and restore the saved wave
pub fn end_boss_event(world: &mut World, victory: bool) {
    world.boss.active = false;
    world.encounter.timer = 0.0;
    world.encounter.timer_max = 0.0;
    world.encounter.countdown = 0.0;
    if !restore_snapshot(world) {
        log::warn!("Boss event ended without a saved wave");
    }

    world.mode = GameMode::Wave;
    if victory {
        world.boss_victories += 1;
        build_boss_reward_choices(world);
        if !world.choices.is_empty() {
            world.mode = GameMode::LevelUp;
        }
    }
    log::info!("Boss event ended: {}", if victory { "victory" } else { "defeat" });
    world.push_event(GameEvent::BossEventEnded { victory });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::sim::state::Enemy;

    fn wave_world() -> World {
        let mut w = World::with_seed(Arc::new(Catalog::builtin().unwrap()), 33);
        w.mode = GameMode::Wave;
        w
    }

    fn populate(w: &mut World) {
        for i in 0..3 {
            w.enemies.spawn(Enemy {
                active: true,
                pos: Vec2::new(500.0 + 40.0 * i as f32, 500.0),
                hp: 10.0,
                ..Default::default()
            });
        }
        for _ in 0..2 {
            spawn_bullet(w, BulletSpec::enemy(Vec2::splat(700.0), Vec2::X, 1.0));
        }
    }

    /// Boss active next to a still player with every pattern on cooldown
    fn quiet_boss(w: &mut World, offset: Vec2) {
        let pos = w.player.pos + offset;
        spawn_boss(w, pos);
        w.encounter.countdown = 0.0;
        w.boss.wave_cd = 100.0;
        w.boss.slam_cd = 100.0;
        w.boss.hazard_cd = 100.0;
        w.boss.attack_timer = 100.0;
    }

    #[test]
    fn test_entry_clears_pools_and_victory_restores() {
        let mut w = wave_world();
        populate(&mut w);
        let drops = w.drops.active_count();
        let player_pos = w.player.pos;

        assert!(start_boss_event(&mut w));
        assert_eq!(w.mode, GameMode::BossEvent);
        assert_eq!(w.enemies.active_count(), 0);
        assert_eq!(w.bullets.active_count(), 0);
        assert_eq!(w.drops.active_count(), 0);
        assert_eq!(w.player.pos, w.encounter.room_center);
        assert!(w.snapshot.is_some());

        quiet_boss(&mut w, Vec2::new(300.0, 0.0));
        w.boss.hp = 0.0;
        update_boss_event(&mut w, SIM_DT);
        assert_eq!(w.enemies.active_count(), 3);
        assert_eq!(w.bullets.active_count(), 2);
        assert_eq!(w.drops.active_count(), drops);
        assert_eq!(w.player.pos, player_pos);
        assert_eq!(w.mode, GameMode::LevelUp);
        assert_eq!(w.boss_victories, 1);
        assert!(w.snapshot.is_none());
        assert!(
            w.drain_events()
                .contains(&GameEvent::BossEventEnded { victory: true })
        );
    }

    #[test]
    fn test_entry_only_from_wave() {
        let mut w = wave_world();
        w.mode = GameMode::LevelUp;
        assert!(!start_boss_event(&mut w));
        assert!(w.snapshot.is_none());
    }

    #[test]
    fn test_timeout_is_defeat() {
        let mut w = wave_world();
        populate(&mut w);
        start_boss_event(&mut w);
        w.encounter.timer = 0.01;
        advance_encounter_clock(&mut w, SIM_DT);
        update_boss_event(&mut w, SIM_DT);
        assert_eq!(w.mode, GameMode::Wave);
        assert_eq!(w.enemies.active_count(), 3);
        assert_eq!(w.boss_victories, 0);
        assert!(!w.boss.active);
    }

    #[test]
    fn test_player_death_is_defeat_and_restores_hp() {
        let mut w = wave_world();
        let hp = w.player.hp;
        start_boss_event(&mut w);
        w.player.hp = -5.0;
        update_boss_event(&mut w, SIM_DT);
        assert_eq!(w.mode, GameMode::Wave);
        assert_eq!(w.player.hp, hp);
    }

    #[test]
    fn test_countdown_spawns_boss_nearby() {
        let mut w = wave_world();
        start_boss_event(&mut w);
        w.player.pos = Vec2::new(ARENA_W * 0.5, ARENA_H * 0.5);
        w.encounter.countdown = 0.01;
        advance_encounter_clock(&mut w, SIM_DT);
        assert!(w.boss.active);
        let d = w.boss.pos.distance(w.player.pos);
        assert!((SPAWN_DISTANCE - 0.01..=SPAWN_DISTANCE + SPAWN_DISTANCE_SPREAD + 0.01).contains(&d));
        assert_eq!(w.boss.hp, w.catalog.boss(0).hp);
    }

    #[test]
    fn test_beam_hits_player_in_line() {
        let mut w = wave_world();
        start_boss_event(&mut w);
        quiet_boss(&mut w, Vec2::new(-300.0, 0.0));
        w.boss.beam_angle = 0.0;
        let hp = w.player.hp;
        update_boss_event(&mut w, SIM_DT);
        let expected = damage_after_armor(w.catalog.boss(0).beam_dps * SIM_DT, 0.0);
        assert!((w.player.hp - (hp - expected)).abs() < 1e-3);
    }

    #[test]
    fn test_wave_burst_fires_ring() {
        let mut w = wave_world();
        start_boss_event(&mut w);
        quiet_boss(&mut w, Vec2::new(600.0, 0.0));
        w.boss.beam_angle = std::f32::consts::FRAC_PI_2;
        w.boss.wave_cd = 0.0;
        update_boss_event(&mut w, SIM_DT);
        let expected = w.catalog.boss(0).wave_bullets.max(MIN_WAVE_BULLETS) as usize;
        assert_eq!(w.bullets.active_count(), expected);
        assert!(w.bullets.iter_active().all(|(_, b)| !b.from_player));
    }

    #[test]
    fn test_slam_knocks_player_back() {
        let mut w = wave_world();
        start_boss_event(&mut w);
        quiet_boss(&mut w, Vec2::new(-50.0, 0.0));
        w.boss.beam_angle = std::f32::consts::PI;
        w.boss.slam_cd = 0.0;
        let before = w.player.pos;
        update_boss_event(&mut w, SIM_DT);
        assert!((w.player.pos.x - (before.x + SLAM_KNOCKBACK)).abs() < 1e-3);
        assert!(w.boss.slam_cd > 0.0);
    }

    #[test]
    fn test_hazard_places_separated_safe_zones() {
        let mut w = wave_world();
        start_boss_event(&mut w);
        quiet_boss(&mut w, Vec2::new(600.0, 0.0));
        w.boss.beam_angle = std::f32::consts::FRAC_PI_2;
        w.boss.hazard_cd = 0.0;
        update_boss_event(&mut w, SIM_DT);
        let def = w.catalog.boss(0).clone();
        assert_eq!(w.boss.hazard_timer, def.hazard_duration);
        let zones = w.boss.safe_zones;
        for (i, a) in zones.iter().enumerate() {
            for b in &zones[i + 1..] {
                assert!(a.distance_squared(*b) >= def.hazard_safe_radius.powi(2) * 3.0 - 1e-2);
            }
        }

        let boss_pos = w.boss.pos;
        w.player.pos = zones[0];
        let hp = w.player.hp;
        update_boss_event(&mut w, SIM_DT);
        assert_eq!(w.boss.pos, boss_pos);
        assert_eq!(w.player.hp, hp);
    }
}
