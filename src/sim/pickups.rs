//! Drops, magnetism and levelling

use glam::Vec2;
use rand::Rng;

use super::rewards::build_levelup_choices;
use super::state::{Drop, DropKind, GameEvent, GameMode, World};

/// Lifetime of xp and heal drops
pub const DROP_TTL: f32 = 10.0;
/// Chests stay for the whole run
pub const CHEST_TTL: f32 = 9999.0;
/// Magnet reach before the xp_magnet stat
const MAGNET_BASE_RANGE: f32 = 150.0;
const MAGNET_ACCEL: f32 = 400.0;
const MAGNET_MAX_SPEED: f32 = 600.0;

pub fn spawn_drop(world: &mut World, pos: Vec2, kind: DropKind, value: f32) -> Option<usize> {
    world.drops.spawn(Drop {
        active: true,
        kind,
        pos,
        value,
        ttl: DROP_TTL,
        magnetized: false,
        magnet_speed: 0.0,
    })
}

pub fn spawn_chest(world: &mut World, pos: Vec2) -> Option<usize> {
    world.drops.spawn(Drop {
        active: true,
        kind: DropKind::Chest,
        pos,
        ttl: CHEST_TTL,
        ..Default::default()
    })
}

/// Gain a level and open the reward screen
pub fn level_up(world: &mut World) {
    world.level += 1;
    world.xp_to_next = 10.0 + 5.0 * world.level as f32;
    world.mode = GameMode::LevelUp;
    build_levelup_choices(world);
    log::info!("Level up: {} (next at {} xp)", world.level, world.xp_to_next);
    world.push_event(GameEvent::LevelUp { level: world.level });
}

/// Expire, magnetize and collect drops
pub fn update_drops(world: &mut World, dt: f32) {
    let stats = world.player.total_stats();
    let magnet_range = MAGNET_BASE_RANGE + stats.xp_magnet;

    for i in 0..world.drops.capacity() {
        let player_pos = world.player.pos;
        let drop = &mut world.drops[i];
        if !drop.active {
            continue;
        }
        drop.ttl -= dt;
        if drop.ttl <= 0.0 {
            drop.active = false;
            continue;
        }

        let dist = drop.pos.distance(player_pos);
        if dist < drop.kind.pickup_radius() {
            drop.active = false;
            let (kind, value) = (drop.kind, drop.value);
            collect(world, kind, value, stats.max_hp);
            continue;
        }

        if drop.kind != DropKind::Chest && (dist < magnet_range || drop.magnetized) {
            drop.magnetized = true;
            drop.magnet_speed = (drop.magnet_speed + MAGNET_ACCEL * dt).min(MAGNET_MAX_SPEED);
            if dist > 1e-4 {
                let step = (player_pos - drop.pos) / dist * drop.magnet_speed * dt;
                drop.pos += step;
            }
        }
    }
}

fn collect(world: &mut World, kind: DropKind, value: f32, max_hp: f32) {
    match kind {
        DropKind::Xp => {
            world.xp += value.trunc() * world.meta.xp_mult;
            if world.xp >= world.xp_to_next {
                world.xp -= world.xp_to_next;
                level_up(world);
            }
            let chance = world.player.effects.xp_kill_chance;
            if chance > 0.0 && world.rng.random::<f32>() < chance {
                execute_nearest_enemy(world);
            }
        }
        DropKind::Heal => world.player.heal(value, max_hp),
        DropKind::Chest => level_up(world),
    }
}

fn execute_nearest_enemy(world: &mut World) {
    let from = world.player.pos;
    let nearest = world
        .enemies
        .iter_active()
        .min_by(|(_, a), (_, b)| {
            a.pos
                .distance_squared(from)
                .total_cmp(&b.pos.distance_squared(from))
        })
        .map(|(i, _)| i);
    if let Some(i) = nearest {
        world.enemies[i].hp = 0.0;
        combat_log!(
            world,
            "xp_kill proc on {}",
            world.catalog.enemy_name(world.enemies[i].def_index)
        );
    }
}
