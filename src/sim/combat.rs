//! Damage resolution shared by every weapon
//!
//! Player hits go through crit, then hit modifiers (armor shred and the
//! slow bonus item), then land on the enemy and roll statuses and item procs.
//! Armor only mitigates damage the player receives.

use rand::Rng;

use super::state::World;
use super::stats::Stats;
use super::status::{SHRED_DAMAGE_MUL, StatusChances};
use crate::catalog::{Catalog, WeaponDef, WeaponScale};

/// Crit multiplier for weapons that do not set their own
pub const DEFAULT_CRIT_MULTIPLIER: f32 = 1.5;
/// Floor for the combined crit multiplier
pub const MIN_CRIT_MULTIPLIER: f32 = 1.1;
/// Proc range when an item does not set one
pub const DEFAULT_PROC_RANGE: f32 = 140.0;

/// Incoming damage after armor: 2% per point, capped at 70%
#[inline]
pub fn damage_after_armor(damage: f32, armor: f32) -> f32 {
    let reduction = (armor * 0.02).clamp(0.0, 0.7);
    damage * (1.0 - reduction)
}

/// Roll a crit for weapons that scale with crit
pub fn roll_crit(stats: &Stats, weapon: &WeaponDef, damage: f32, rng: &mut impl Rng) -> f32 {
    if !weapon.scales_with(WeaponScale::Crit) || stats.crit_chance <= 0.0 {
        return damage;
    }
    if rng.random::<f32>() < stats.crit_chance {
        let base = if weapon.crit_multiplier > 0.0 {
            weapon.crit_multiplier
        } else {
            DEFAULT_CRIT_MULTIPLIER
        };
        let multiplier = (base + stats.crit_damage).max(MIN_CRIT_MULTIPLIER);
        return damage * multiplier;
    }
    damage
}

/// Armor shred and slow bonus damage against one enemy
pub fn apply_hit_mods(world: &mut World, index: usize, damage: f32) -> f32 {
    let enemy = &world.enemies[index];
    let mut damage = damage;
    if enemy.debuffs.is_shredded() {
        damage *= SHRED_DAMAGE_MUL;
    }
    let slow_bonus = world.player.effects.slow_bonus_damage;
    if slow_bonus > 0.0 && enemy.debuffs.is_slowed() {
        let extra = damage * slow_bonus;
        combat_log!(
            world,
            "slow_bonus +{:.1} dmg to {}",
            extra,
            world.catalog.enemy_name(enemy.def_index)
        );
        damage += extra;
    }
    damage
}

/// Land a player hit on an enemy slot
///
/// `damage` already includes any crit. Returns the damage dealt.
pub fn strike_enemy(
    world: &mut World,
    catalog: &Catalog,
    stats: &Stats,
    index: usize,
    damage: f32,
    chances: &StatusChances,
    source: &str,
) -> f32 {
    let dealt = apply_hit_mods(world, index, damage);
    let now = world.game_time;
    let enemy = &mut world.enemies[index];
    enemy.last_hit_at = now;
    enemy.hp -= dealt;
    let name = catalog.enemy_name(enemy.def_index);
    let applied = chances.roll(&mut enemy.debuffs, &mut world.rng);

    combat_log!(world, "hit {} with {} for {:.1}", name, source, dealt);
    for (landed, status) in [
        (applied.bleed, "bleed"),
        (applied.burn, "burn"),
        (applied.slow, "slow"),
        (applied.stun, "stun"),
        (applied.shred, "armor_shred"),
    ] {
        if landed {
            combat_log!(world, "{} applied to {}", status, name);
        }
    }

    try_item_procs(world, catalog, stats, index);
    dealt
}

/// Roll every owned item's on-hit proc against the struck enemy
pub fn try_item_procs(world: &mut World, catalog: &Catalog, stats: &Stats, index: usize) {
    for k in 0..world.player.passive_items.len() {
        let Some(proc) = catalog
            .item(world.player.passive_items[k])
            .and_then(|item| item.proc)
        else {
            continue;
        };
        if proc.chance <= 0.0 || proc.damage <= 0.0 || proc.bounces <= 0 {
            continue;
        }
        if world.rng.random::<f32>() < proc.chance {
            let range = if proc.range > 0.0 {
                proc.range
            } else {
                DEFAULT_PROC_RANGE
            };
            let damage = proc.damage * (1.0 + stats.damage);
            combat_log!(
                world,
                "chain_lightning proc dmg {:.1} bounces {}",
                damage,
                proc.bounces
            );
            chain_lightning(world, catalog, index, damage, proc.bounces as usize, range);
        }
    }
}

/// Greedy nearest-unvisited walk from `start`, striking each hop
///
/// Returns the enemy slots hit, in order.
pub fn chain_lightning(
    world: &mut World,
    catalog: &Catalog,
    start: usize,
    damage: f32,
    bounces: usize,
    range: f32,
) -> Vec<usize> {
    let mut path = Vec::new();
    if bounces == 0 || range <= 0.0 {
        return path;
    }
    let mut visited = vec![false; world.enemies.capacity()];
    visited[start] = true;
    let mut current = start;

    for _ in 0..bounces {
        let from = world.enemies[current].pos;
        let mut best = range * range;
        let mut next = None;
        for (i, enemy) in world.enemies.iter_active() {
            if visited[i] {
                continue;
            }
            let d2 = enemy.pos.distance_squared(from);
            if d2 < best {
                best = d2;
                next = Some(i);
            }
        }
        let Some(next) = next else {
            break;
        };
        let hit = apply_hit_mods(world, next, damage);
        let now = world.game_time;
        let enemy = &mut world.enemies[next];
        enemy.last_hit_at = now;
        enemy.hp -= hit;
        combat_log!(
            world,
            "chain_lightning hit {} for {:.1}",
            catalog.enemy_name(world.enemies[next].def_index),
            hit
        );
        visited[next] = true;
        path.push(next);
        current = next;
    }
    path
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::sim::state::Enemy;
    use crate::sim::status::Debuffs;

    fn world() -> World {
        World::with_seed(Arc::new(Catalog::builtin().unwrap()), 3)
    }

    fn enemy_at(world: &mut World, pos: Vec2, hp: f32) -> usize {
        world
            .enemies
            .spawn(Enemy {
                active: true,
                pos,
                hp,
                max_hp: hp,
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_damage_after_armor() {
        assert!((damage_after_armor(100.0, 10.0) - 80.0).abs() < 1e-4);
        assert!((damage_after_armor(100.0, 100.0) - 30.0).abs() < 1e-4);
        assert!((damage_after_armor(100.0, -5.0) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_crit_needs_scaling_and_chance() {
        let mut rng = Pcg32::seed_from_u64(1);
        let weapon = WeaponDef {
            crit_multiplier: 2.0,
            scales: vec![WeaponScale::Crit],
            ..Default::default()
        };
        let sure = Stats {
            crit_chance: 1.0,
            ..Default::default()
        };
        assert_eq!(roll_crit(&sure, &weapon, 10.0, &mut rng), 20.0);
        assert_eq!(roll_crit(&Stats::default(), &weapon, 10.0, &mut rng), 10.0);
        let plain = WeaponDef::default();
        assert_eq!(roll_crit(&sure, &plain, 10.0, &mut rng), 10.0);
    }

    #[test]
    fn test_crit_multiplier_floor() {
        let mut rng = Pcg32::seed_from_u64(1);
        let weapon = WeaponDef {
            crit_multiplier: 0.5,
            scales: vec![WeaponScale::Crit],
            ..Default::default()
        };
        let stats = Stats {
            crit_chance: 1.0,
            ..Default::default()
        };
        assert!((roll_crit(&stats, &weapon, 10.0, &mut rng) - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_hit_mods_shred_and_slow_bonus() {
        let mut w = world();
        let i = enemy_at(&mut w, Vec2::new(100.0, 100.0), 50.0);
        assert_eq!(apply_hit_mods(&mut w, i, 10.0), 10.0);

        w.enemies[i].debuffs = Debuffs {
            armor_shred_timer: 1.0,
            slow_timer: 1.0,
            ..Default::default()
        };
        assert!((apply_hit_mods(&mut w, i, 10.0) - 12.0).abs() < 1e-4);
        w.player.effects.slow_bonus_damage = 0.5;
        assert!((apply_hit_mods(&mut w, i, 10.0) - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_strike_enemy_subtracts_and_marks() {
        let mut w = world();
        let catalog = Arc::clone(&w.catalog);
        let i = enemy_at(&mut w, Vec2::new(100.0, 100.0), 50.0);
        w.game_time = 3.5;
        let chances = StatusChances {
            bleed: 1.0,
            ..Default::default()
        };
        let dealt = strike_enemy(&mut w, &catalog, &Stats::default(), i, 8.0, &chances, "test");
        assert_eq!(dealt, 8.0);
        assert_eq!(w.enemies[i].hp, 42.0);
        assert_eq!(w.enemies[i].last_hit_at, 3.5);
        assert_eq!(w.enemies[i].debuffs.bleed_stacks, 1);
    }

    #[test]
    fn test_chain_lightning_visits_each_once_in_range() {
        let mut w = world();
        let catalog = Arc::clone(&w.catalog);
        let a = enemy_at(&mut w, Vec2::new(100.0, 100.0), 50.0);
        let b = enemy_at(&mut w, Vec2::new(150.0, 100.0), 50.0);
        let c = enemy_at(&mut w, Vec2::new(220.0, 100.0), 50.0);
        let far = enemy_at(&mut w, Vec2::new(900.0, 100.0), 50.0);

        let path = chain_lightning(&mut w, &catalog, a, 5.0, 5, 100.0);
        assert_eq!(path, vec![b, c]);
        assert_eq!(w.enemies[a].hp, 50.0);
        assert_eq!(w.enemies[b].hp, 45.0);
        assert_eq!(w.enemies[c].hp, 45.0);
        assert_eq!(w.enemies[far].hp, 50.0);
    }

    #[test]
    fn test_chain_lightning_zero_bounces() {
        let mut w = world();
        let catalog = Arc::clone(&w.catalog);
        let a = enemy_at(&mut w, Vec2::new(100.0, 100.0), 50.0);
        enemy_at(&mut w, Vec2::new(120.0, 100.0), 50.0);
        assert!(chain_lightning(&mut w, &catalog, a, 5.0, 0, 100.0).is_empty());
    }

    #[test]
    fn test_item_proc_chains_from_struck_enemy() {
        use crate::catalog::{CatalogData, ItemDef, ProcDef};

        let data = CatalogData {
            items: vec![ItemDef {
                id: "storm_coil".to_string(),
                name: "Storm Coil".to_string(),
                proc: Some(ProcDef {
                    chance: 1.0,
                    damage: 10.0,
                    bounces: 2,
                    range: 0.0,
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        let catalog = Arc::new(Catalog::from_data(data).unwrap());
        let mut w = World::with_seed(Arc::clone(&catalog), 3);
        w.player.passive_items.push(0);
        let hit: Vec<usize> = [0.0, 100.0, 200.0, 500.0]
            .iter()
            .map(|&x| enemy_at(&mut w, Vec2::new(300.0 + x, 300.0), 50.0))
            .collect();
        let stats = Stats {
            damage: 0.5,
            ..Default::default()
        };

        // Default range 140 reaches the neighbour at 100 but not the one at 500
        try_item_procs(&mut w, &catalog, &stats, hit[0]);
        let hps: Vec<f32> = hit.iter().map(|&i| w.enemies[i].hp).collect();
        assert_eq!(hps, vec![50.0, 35.0, 35.0, 50.0]);
    }

    #[test]
    fn test_item_without_proc_does_nothing() {
        let mut w = world();
        let catalog = Arc::clone(&w.catalog);
        let a = enemy_at(&mut w, Vec2::new(100.0, 100.0), 50.0);
        let b = enemy_at(&mut w, Vec2::new(150.0, 100.0), 50.0);
        try_item_procs(&mut w, &catalog, &Stats::default(), a);
        assert_eq!(w.enemies[b].hp, 50.0);
    }
}
