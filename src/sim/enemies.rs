//! Wave enemy spawning and per-role behavior

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use super::combat::damage_after_armor;
use super::pickups::spawn_drop;
use super::projectiles::{BulletSpec, spawn_bullet};
use super::state::{DropKind, Enemy, World};
use super::status::AURA_REFRESH;
use crate::catalog::EnemyRole;
use crate::clamp_to_arena;

/// Spawn invulnerability for fresh enemies
pub const SPAWN_INVULN: f32 = 1.0;
/// How far outside the view enemies appear
const SPAWN_MARGIN: f32 = 20.0;
/// Spawned enemies keep this distance from the arena edge
const SPAWN_EDGE: f32 = 40.0;
/// Contact damage reach
const CONTACT_RANGE: f32 = 20.0;
/// Exploder trigger reach when the definition leaves it unset
const DEFAULT_EXPLODE_RADIUS: f32 = 28.0;
/// Dash duration of a charger
const CHARGE_DURATION: f32 = 0.35;
/// Chance that a kill also drops a heal
const HEAL_DROP_CHANCE: f32 = 0.05;

/// Place enemy `def_index` just outside a random edge of the view
pub fn spawn_enemy(world: &mut World, def_index: usize) -> Option<usize> {
    let hp = world.catalog.enemy(def_index)?.hp;
    let (min, view) = (world.camera, world.view);
    let max = min + view;
    let pos = match world.rng.random_range(0..4) {
        0 => Vec2::new(min.x - SPAWN_MARGIN, min.y + world.rng.random::<f32>() * view.y),
        1 => Vec2::new(max.x + SPAWN_MARGIN, min.y + world.rng.random::<f32>() * view.y),
        2 => Vec2::new(min.x + world.rng.random::<f32>() * view.x, min.y - SPAWN_MARGIN),
        _ => Vec2::new(min.x + world.rng.random::<f32>() * view.x, max.y + SPAWN_MARGIN),
    };
    world.enemies.spawn(Enemy {
        active: true,
        def_index,
        pos: clamp_to_arena(pos, SPAWN_EDGE),
        hp,
        max_hp: hp,
        spawn_invuln: SPAWN_INVULN,
        last_hit_at: -1.0,
        ..Default::default()
    })
}

/// Advance the wave clock and spawn on schedule
///
/// Every full minute adds a difficulty tier that may shift the rolled
/// enemy toward later catalog entries.
pub fn update_spawning(world: &mut World, dt: f32) {
    world.game_time += dt;
    world.spawn_timer -= dt;
    if world.spawn_timer > 0.0 {
        return;
    }
    let count = world.catalog.enemies().len();
    if count == 0 {
        world.spawn_timer = 1.0;
        return;
    }

    let mut def_index = world.rng.random_range(0..count);
    let tier = (world.game_time / 60.0) as usize;
    if tier > 0 && world.rng.random::<f32>() < 0.2 + 0.1 * tier as f32 {
        def_index = (def_index + tier) % count;
    }
    spawn_enemy(world, def_index);

    let interval = (1.0 - world.game_time * 0.005).clamp(0.15, 1.0);
    world.spawn_timer = interval / world.meta.spawn_scale.max(f32::EPSILON);
}

/// Run every active enemy for one frame
pub fn update_enemies(world: &mut World, dt: f32) {
    let catalog = Arc::clone(&world.catalog);
    let stats = world.player.total_stats();
    let effects = world.player.effects;

    for i in 0..world.enemies.capacity() {
        if !world.enemies[i].active {
            continue;
        }
        let def_index = world.enemies[i].def_index;
        let Some(def) = catalog.enemy(def_index) else {
            world.enemies[i].active = false;
            continue;
        };
        let name = def.name.as_str();
        let player_pos = world.player.pos;
        let to_player = player_pos - world.enemies[i].pos;
        let dist = to_player.length();
        let dir = to_player.normalize_or_zero();

        let enemy = &mut world.enemies[i];
        if enemy.spawn_invuln > 0.0 {
            enemy.spawn_invuln -= dt;
        }
        enemy.hp -= enemy.debuffs.tick(dt);
        if enemy.sword_hit_cd > 0.0 {
            enemy.sword_hit_cd -= dt;
        }

        if effects.slow_aura > 0.0 && dist < effects.slow_aura {
            enemy.debuffs.slow_timer = AURA_REFRESH;
        }
        if effects.burn_aura > 0.0 && dist < effects.burn_aura {
            let fresh = !enemy.debuffs.is_burning();
            enemy.debuffs.burn_timer = AURA_REFRESH;
            if fresh {
                combat_log!(world, "burn_aura applied to {}", name);
            }
        }

        let enemy = &mut world.enemies[i];
        let stunned = enemy.debuffs.is_stunned();
        let mut shot = None;
        if !stunned && def.role.shoots() {
            enemy.cooldown -= dt;
            if enemy.cooldown <= 0.0 {
                shot = Some(BulletSpec::enemy(
                    enemy.pos,
                    dir * def.projectile_speed,
                    def.damage,
                ));
                enemy.cooldown = def.cooldown;
            }
        }
        if !stunned && def.role == EnemyRole::Charger {
            enemy.charge_timer -= dt;
            if enemy.charge_timer <= 0.0 {
                enemy.vel = dir * def.charge_speed;
                enemy.charge_time = CHARGE_DURATION;
                enemy.charge_timer = def.charge_cooldown;
            }
        }
        if !stunned && def.role != EnemyRole::Turret {
            if enemy.charge_time > 0.0 {
                enemy.pos += enemy.vel * dt;
                enemy.charge_time -= dt;
            } else {
                let slow = if enemy.debuffs.is_slowed() { 0.5 } else { 1.0 };
                enemy.pos += dir * def.speed * slow * dt;
            }
        }
        if let Some(spec) = shot {
            spawn_bullet(world, spec);
        }

        if dist < CONTACT_RANGE {
            let applied = damage_after_armor(def.damage, stats.armor) * dt;
            hurt_player(world, i, applied, name);
        }

        if def.role == EnemyRole::Exploder {
            let radius = if def.explode_radius > 0.0 {
                def.explode_radius
            } else {
                DEFAULT_EXPLODE_RADIUS
            };
            if dist < radius {
                let applied = damage_after_armor(def.damage, stats.armor) * 2.0;
                hurt_player(world, i, applied, name);
                world.enemies[i].hp = 0.0;
            }
        }

        if world.enemies[i].hp <= 0.0 {
            kill_enemy(world, i, stats.max_hp);
        }
    }
}

/// Damage the player from enemy `index`, reflecting thorns back onto it
fn hurt_player(world: &mut World, index: usize, applied: f32, name: &str) {
    world.player.hp -= applied;
    let thorns = world.player.effects.thorns;
    if thorns > 0.0 {
        world.enemies[index].hp -= applied * thorns;
        combat_log!(world, "thorns reflect {:.1} to {}", applied * thorns, name);
    }
}

/// Retire a dead enemy; kills during spawn invulnerability drop nothing
fn kill_enemy(world: &mut World, index: usize, max_hp: f32) {
    let enemy = &mut world.enemies[index];
    enemy.active = false;
    let (pos, rewarded) = (enemy.pos, !enemy.is_invulnerable());
    world.kills += 1;
    if !rewarded {
        return;
    }

    let lifesteal = world.player.effects.lifesteal_on_kill;
    if lifesteal > 0.0 {
        world.player.heal(lifesteal, max_hp);
        combat_log!(world, "lifesteal_on_kill +{:.1} HP", lifesteal);
    }
    let xp = 1.0 + world.rng.random_range(0..2) as f32;
    spawn_drop(world, pos, DropKind::Xp, xp);
    if world.rng.random::<f32>() < HEAL_DROP_CHANCE {
        let heal = 10.0 + world.rng.random_range(0..10) as f32;
        spawn_drop(world, pos, DropKind::Heal, heal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogData, EnemyDef};
    use crate::consts::SIM_DT;
    use crate::sim::state::GameMode;

    fn enemy_def(id: &str, role: EnemyRole) -> EnemyDef {
        EnemyDef {
            id: id.to_string(),
            name: id.to_string(),
            role,
            hp: 20.0,
            speed: 60.0,
            damage: 10.0,
            cooldown: 2.0,
            projectile_speed: 200.0,
            charge_speed: 400.0,
            charge_cooldown: 3.0,
            ..Default::default()
        }
    }

    /// One enemy per role, in declaration order
    fn world() -> World {
        let data = CatalogData {
            enemies: vec![
                enemy_def("grunt", EnemyRole::Melee),
                enemy_def("spitter", EnemyRole::Ranged),
                enemy_def("bull", EnemyRole::Charger),
                enemy_def("tower", EnemyRole::Turret),
                enemy_def("popper", EnemyRole::Exploder),
            ],
            ..Default::default()
        };
        let mut w = World::with_seed(Arc::new(Catalog::from_data(data).unwrap()), 5);
        w.drops.clear();
        w.mode = GameMode::Wave;
        w.player.pos = Vec2::new(2000.0, 2000.0);
        w
    }

    fn place(world: &mut World, def_index: usize, pos: Vec2) -> usize {
        let i = spawn_enemy(world, def_index).unwrap();
        world.enemies[i].pos = pos;
        world.enemies[i].spawn_invuln = 0.0;
        i
    }

    #[test]
    fn test_spawn_enemy_outside_view() {
        let mut w = world();
        w.center_camera_on_player();
        for _ in 0..20 {
            let i = spawn_enemy(&mut w, 0).unwrap();
            let e = &w.enemies[i];
            assert!(!w.in_view(e.pos));
            assert_eq!(e.hp, 20.0);
            assert_eq!(e.spawn_invuln, SPAWN_INVULN);
        }
        assert!(spawn_enemy(&mut w, 99).is_none());
    }

    #[test]
    fn test_dead_enemy_counts_once() {
        let mut w = world();
        let i = place(&mut w, 0, Vec2::new(1000.0, 1000.0));
        w.enemies[i].hp = 0.0;
        update_enemies(&mut w, SIM_DT);
        assert!(!w.enemies[i].active);
        assert_eq!(w.kills, 1);
        update_enemies(&mut w, SIM_DT);
        assert_eq!(w.kills, 1);
        assert!(w.drops.iter_active().any(|(_, d)| d.kind == DropKind::Xp));
    }

    #[test]
    fn test_invulnerable_death_drops_nothing() {
        let mut w = world();
        w.player.effects.lifesteal_on_kill = 5.0;
        w.player.hp = 100.0;
        let i = place(&mut w, 0, Vec2::new(1000.0, 1000.0));
        w.enemies[i].spawn_invuln = 1.0;
        w.enemies[i].hp = -1.0;
        update_enemies(&mut w, SIM_DT);
        assert!(!w.enemies[i].active);
        assert_eq!(w.kills, 1);
        assert_eq!(w.drops.active_count(), 0);
        assert_eq!(w.player.hp, 100.0);
    }

    #[test]
    fn test_lifesteal_on_kill() {
        let mut w = world();
        w.player.effects.lifesteal_on_kill = 5.0;
        w.player.hp = 100.0;
        let i = place(&mut w, 0, Vec2::new(1000.0, 1000.0));
        w.enemies[i].hp = 0.0;
        update_enemies(&mut w, SIM_DT);
        assert_eq!(w.player.hp, 105.0);
    }

    #[test]
    fn test_stun_stops_movement_and_slow_halves_it() {
        let mut w = world();
        let start = Vec2::new(1000.0, 2000.0);
        let stunned = place(&mut w, 0, start);
        w.enemies[stunned].debuffs.stun_timer = 1.0;
        let slowed = place(&mut w, 0, start + Vec2::new(0.0, 100.0));
        w.enemies[slowed].debuffs.slow_timer = 1.0;
        let free = place(&mut w, 0, start - Vec2::new(0.0, 100.0));

        update_enemies(&mut w, 0.1);
        assert_eq!(w.enemies[stunned].pos, start);
        let slow_step = w.enemies[slowed].pos.distance(start + Vec2::new(0.0, 100.0));
        let free_step = w.enemies[free].pos.distance(start - Vec2::new(0.0, 100.0));
        assert!((free_step - 6.0).abs() < 1e-3);
        assert!((slow_step - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_turret_holds_position_and_shoots() {
        let mut w = world();
        let pos = Vec2::new(1800.0, 2000.0);
        let i = place(&mut w, 3, pos);
        update_enemies(&mut w, SIM_DT);
        assert_eq!(w.enemies[i].pos, pos);
        let shots: Vec<_> = w.bullets.iter_active().map(|(_, b)| b.clone()).collect();
        assert_eq!(shots.len(), 1);
        assert!(!shots[0].from_player);
        assert!(shots[0].vel.x > 0.0);
        assert_eq!(w.enemies[i].cooldown, 2.0);
    }

    #[test]
    fn test_charger_dashes() {
        let mut w = world();
        let pos = Vec2::new(1000.0, 2000.0);
        let i = place(&mut w, 2, pos);
        update_enemies(&mut w, 0.1);
        let e = &w.enemies[i];
        assert!((e.pos.x - (pos.x + 40.0)).abs() < 1e-3);
        assert!(e.charge_time > 0.0);
        assert_eq!(e.charge_timer, 3.0);
    }

    #[test]
    fn test_exploder_detonates_near_player() {
        let mut w = world();
        let hp = w.player.hp;
        let i_pos = w.player.pos + Vec2::new(25.0, 0.0);
        let i = place(&mut w, 4, i_pos);
        update_enemies(&mut w, SIM_DT);
        assert!(!w.enemies[i].active);
        assert!((w.player.hp - (hp - 20.0)).abs() < 1e-3);
    }

    #[test]
    fn test_contact_damage_and_thorns() {
        let mut w = world();
        w.player.effects.thorns = 0.5;
        let hp = w.player.hp;
        let i_pos = w.player.pos + Vec2::new(10.0, 0.0);
        let i = place(&mut w, 0, i_pos);
        update_enemies(&mut w, 0.1);
        assert!((w.player.hp - (hp - 1.0)).abs() < 1e-3);
        assert!((w.enemies[i].hp - 19.5).abs() < 1e-3);
    }

    #[test]
    fn test_slow_aura_refreshes() {
        let mut w = world();
        w.player.effects.slow_aura = 200.0;
        let near_pos = w.player.pos + Vec2::new(100.0, 0.0);
        let near = place(&mut w, 0, near_pos);
        let far_pos = w.player.pos + Vec2::new(500.0, 0.0);
        let far = place(&mut w, 0, far_pos);
        update_enemies(&mut w, SIM_DT);
        assert!(w.enemies[near].debuffs.is_slowed());
        assert!(!w.enemies[far].debuffs.is_slowed());
    }

    #[test]
    fn test_spawn_director_interval() {
        let mut w = world();
        w.spawn_timer = 0.0;
        update_spawning(&mut w, SIM_DT);
        assert_eq!(w.enemies.active_count(), 1);
        assert!((w.spawn_timer - (1.0 - w.game_time * 0.005)).abs() < 1e-4);

        w.game_time = 600.0;
        w.spawn_timer = 0.0;
        w.meta.spawn_scale = 1.5;
        update_spawning(&mut w, SIM_DT);
        assert!((w.spawn_timer - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_director_without_enemies() {
        let mut w = World::with_seed(Arc::new(Catalog::from_data(CatalogData::default()).unwrap()), 1);
        update_spawning(&mut w, SIM_DT);
        assert_eq!(w.spawn_timer, 1.0);
        assert_eq!(w.enemies.active_count(), 0);
    }
}
