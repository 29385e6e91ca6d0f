//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world by one step. Systems run in a
//! fixed order so a seeded world replays identically.

use std::sync::Arc;

use glam::Vec2;

use super::boss::{advance_encounter_clock, start_boss_event, update_boss_event};
use super::enemies::{spawn_enemy, update_enemies, update_spawning};
use super::pickups::update_drops;
use super::projectiles::{update_bullets, update_puddles, update_weapon_fx};
use super::state::{GameEvent, GameMode, World};
use super::weapons::{fire_weapons, update_orbit};
use crate::catalog::Ultimate;
use crate::clamp_to_arena;
use crate::consts::*;
use crate::meta::MetaBonuses;
use crate::settings::{MAX_TIME_SCALE, MIN_TIME_SCALE, TIME_SCALE_STEP};

/// Haste ultimate duration
pub const HASTE_DURATION: f32 = 30.0;
/// Enemies added by the debug spawn key
const DEBUG_SPAWN_COUNT: usize = 5;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held movement directions
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Fire the character ultimate
    pub ultimate: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start a boss encounter (debug)
    pub trigger_boss: bool,
    /// Spawn a handful of enemies (debug)
    pub debug_spawn: bool,
    /// Step the time scale (debug)
    pub speed_up: bool,
    pub speed_down: bool,
}

impl TickInput {
    /// Unnormalized movement direction (y grows downward)
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir
    }
}

/// Begin a run with `character` and the meta-progression bonuses
///
/// An unknown character index starts a bare run with no weapon.
pub fn start_run(world: &mut World, character: Option<usize>, meta: MetaBonuses) {
    world.reset();
    let catalog = Arc::clone(&world.catalog);
    let def = character.and_then(|i| catalog.character(i));

    if let Some(def) = def {
        world.player.base += def.stats;
    }
    world.player.base.damage += meta.damage_pct;
    world.player.base.armor += meta.armor_flat;
    world.meta = meta;

    if let Some(def) = def {
        match catalog.find_weapon(&def.weapon) {
            Some(weapon) => {
                world.player.equip_weapon(weapon, &catalog);
            }
            None => log::warn!("Character '{}' has no usable weapon '{}'", def.id, def.weapon),
        }
    }

    world.player.recalc(&catalog);
    world.player.hp = world.player.total_stats().max_hp;
    world.selected_character = def.and(character);
    world.mode = GameMode::Wave;
    world.spawn_timer = 0.0;

    log::info!(
        "Run started as {}",
        def.map(|d| d.name.as_str()).unwrap_or("nobody")
    );
    world.push_event(GameEvent::RunStarted {
        character: world.selected_character,
    });
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match world.mode {
            GameMode::Wave | GameMode::BossEvent => {
                world.pause_return_mode = world.mode;
                world.mode = GameMode::Pause;
                return;
            }
            GameMode::Pause => world.mode = world.pause_return_mode,
            _ => {}
        }
    }

    // Only live play advances
    if !matches!(world.mode, GameMode::Wave | GameMode::BossEvent) {
        return;
    }

    if input.speed_up {
        world.time_scale = (world.time_scale + TIME_SCALE_STEP).min(MAX_TIME_SCALE);
    }
    if input.speed_down {
        world.time_scale = (world.time_scale - TIME_SCALE_STEP).max(MIN_TIME_SCALE);
    }
    let dt = dt * world.time_scale;

    if world.mode == GameMode::Wave {
        if input.debug_spawn {
            for _ in 0..DEBUG_SPAWN_COUNT {
                spawn_enemy(world, 0);
            }
        }
        if input.trigger_boss && world.encounter.event_cd <= 0.0 {
            start_boss_event(world);
        }
    }

    if input.ultimate {
        activate_ultimate(world);
    }

    match world.mode {
        GameMode::Wave => update_wave(world, input, dt),
        GameMode::BossEvent => update_boss_mode(world, input, dt),
        _ => {}
    }
}

/// Fire the selected character's ultimate if it is off cooldown
pub fn activate_ultimate(world: &mut World) -> bool {
    if world.ultimate_cd > 0.0 {
        return false;
    }
    let ultimate = world
        .selected_character
        .and_then(|i| world.catalog.character(i))
        .map(|def| def.ultimate)
        .unwrap_or_default();

    match ultimate {
        Ultimate::KillAll => {
            for (_, enemy) in world.enemies.iter_active_mut() {
                enemy.hp = 0.0;
            }
        }
        Ultimate::ShiftSpeed => world.player.haste_timer = HASTE_DURATION,
    }
    let cdr = world.player.effects.ultimate_cdr;
    world.ultimate_cd = world.settings.ultimate_base_cooldown * (1.0 - cdr);
    log::info!("Ultimate {:?} used, ready again in {:.1}s", ultimate, world.ultimate_cd);
    true
}

fn update_wave(world: &mut World, input: &TickInput, dt: f32) {
    update_player(world, input, dt);
    update_orbit(world, dt);
    fire_weapons(world, dt);
    update_bullets(world, dt);
    update_weapon_fx(world, dt);
    update_puddles(world, dt);
    update_enemies(world, dt);
    update_drops(world, dt);
    update_spawning(world, dt);

    if world.player.hp <= 0.0 && world.mode != GameMode::GameOver {
        world.mode = GameMode::GameOver;
        let points = world.meta_points();
        log::info!(
            "Game over at level {} after {:.0}s with {} kills ({} meta points)",
            world.level,
            world.game_time,
            world.kills,
            points
        );
        world.push_event(GameEvent::GameOver { points });
    }
}

fn update_boss_mode(world: &mut World, input: &TickInput, dt: f32) {
    advance_encounter_clock(world, dt);
    update_player(world, input, dt);
    update_orbit(world, dt);
    fire_weapons(world, dt);
    update_bullets(world, dt);
    update_weapon_fx(world, dt);
    update_puddles(world, dt);
    update_boss_event(world, dt);
}

/// Timers, movement, regen and camera
fn update_player(world: &mut World, input: &TickInput, dt: f32) {
    world.ultimate_cd = (world.ultimate_cd - dt).max(0.0);
    world.item_popup_timer = (world.item_popup_timer - dt).max(0.0);
    world.encounter.event_cd = (world.encounter.event_cd - dt).max(0.0);
    world.player.haste_timer = (world.player.haste_timer - dt).max(0.0);

    let stats = world.player.total_stats();
    let player = &mut world.player;

    let dir = input.direction().normalize_or_zero();
    player.is_moving = dir != Vec2::ZERO;
    if player.is_moving {
        player.facing = dir;
        let speed = PLAYER_BASE_SPEED * (1.0 + stats.move_speed);
        player.pos = clamp_to_arena(player.pos + dir * speed * dt, PLAYER_EDGE_MARGIN);
    }

    if stats.hp_regen > 0.0 && player.hp > 0.0 {
        player.heal(stats.hp_regen * dt, stats.max_hp);
    }

    world.follow_camera();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::sim::state::Enemy;

    fn world(seed: u64) -> World {
        World::with_seed(Arc::new(Catalog::builtin().unwrap()), seed)
    }

    fn character(w: &World, id: &str) -> usize {
        w.catalog.characters().iter().position(|c| c.id == id).unwrap()
    }

    fn running(seed: u64, id: &str) -> World {
        let mut w = world(seed);
        let c = character(&w, id);
        start_run(&mut w, Some(c), MetaBonuses::default());
        w
    }

    #[test]
    fn test_start_run_equips_character() {
        let mut w = world(1);
        let knight = character(&w, "knight");
        let meta = MetaBonuses {
            damage_pct: 0.06,
            armor_flat: 2.0,
            ..Default::default()
        };
        start_run(&mut w, Some(knight), meta);

        assert_eq!(w.mode, GameMode::Wave);
        assert_eq!(w.selected_character, Some(knight));
        let sword = w.catalog.find_weapon("sword").unwrap();
        assert_eq!(w.player.weapon_level(sword), Some(1));
        // knight grants 3 armor and 100 max hp
        assert!((w.player.base.armor - 5.0).abs() < 1e-6);
        assert!((w.player.base.damage - 0.06).abs() < 1e-6);
        assert_eq!(w.player.hp, PLAYER_BASE_HP + 100.0);
        assert_eq!(w.meta, meta);
        assert!(w.drain_events().contains(&GameEvent::RunStarted {
            character: Some(knight)
        }));
    }

    #[test]
    fn test_start_run_without_character() {
        let mut w = world(1);
        start_run(&mut w, Some(99), MetaBonuses::default());
        assert_eq!(w.mode, GameMode::Wave);
        assert_eq!(w.selected_character, None);
        assert_eq!(w.player.free_weapon_slots(), MAX_WEAPON_SLOTS);
    }

    #[test]
    fn test_tick_does_nothing_before_run() {
        let mut w = world(3);
        let pos = w.player.pos;
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut w, &input, SIM_DT);
        assert_eq!(w.mode, GameMode::Start);
        assert_eq!(w.player.pos, pos);
        assert_eq!(w.game_time, 0.0);
    }

    #[test]
    fn test_tick_pause() {
        let mut w = running(5, "ranger");
        tick(&mut w, &TickInput::default(), SIM_DT);
        let time = w.game_time;

        let input = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut w, &input, SIM_DT);
        assert_eq!(w.mode, GameMode::Pause);
        assert_eq!(w.pause_return_mode, GameMode::Wave);

        // Paused ticks leave the clock alone
        tick(&mut w, &TickInput::default(), SIM_DT);
        assert_eq!(w.game_time, time);

        // Unpause
        tick(&mut w, &input, SIM_DT);
        assert_eq!(w.mode, GameMode::Wave);
        assert!(w.game_time > time);
    }

    #[test]
    fn test_movement_and_facing() {
        let mut w = running(5, "ranger");
        let start = w.player.pos;
        let speed = PLAYER_BASE_SPEED * (1.0 + w.player.total_stats().move_speed);
        let input = TickInput {
            right: true,
            down: true,
            ..Default::default()
        };
        tick(&mut w, &input, SIM_DT);
        let moved = w.player.pos - start;
        assert!((moved.length() - speed * SIM_DT).abs() < 1e-3);
        assert!(moved.x > 0.0 && moved.y > 0.0);
        assert!((w.player.facing - Vec2::new(1.0, 1.0).normalize()).length() < 1e-5);

        tick(&mut w, &TickInput::default(), SIM_DT);
        assert!(!w.player.is_moving);
        assert!(w.player.facing.x > 0.0);
    }

    #[test]
    fn test_movement_clamped_to_arena() {
        let mut w = running(5, "ranger");
        w.player.pos = Vec2::new(PLAYER_EDGE_MARGIN + 1.0, 500.0);
        let input = TickInput {
            left: true,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut w, &input, SIM_DT);
        }
        assert_eq!(w.player.pos.x, PLAYER_EDGE_MARGIN);
    }

    #[test]
    fn test_time_scale_steps_and_clamps() {
        let mut w = running(5, "ranger");
        let up = TickInput {
            speed_up: true,
            ..Default::default()
        };
        for _ in 0..20 {
            tick(&mut w, &up, SIM_DT);
        }
        assert_eq!(w.time_scale, MAX_TIME_SCALE);

        let down = TickInput {
            speed_down: true,
            ..Default::default()
        };
        for _ in 0..20 {
            tick(&mut w, &down, SIM_DT);
        }
        assert_eq!(w.time_scale, MIN_TIME_SCALE);

        let before = w.game_time;
        tick(&mut w, &TickInput::default(), SIM_DT);
        assert!((w.game_time - before - SIM_DT * MIN_TIME_SCALE).abs() < 1e-6);
    }

    #[test]
    fn test_debug_spawn() {
        let mut w = running(5, "ranger");
        w.spawn_timer = 100.0;
        let input = TickInput {
            debug_spawn: true,
            ..Default::default()
        };
        tick(&mut w, &input, SIM_DT);
        assert_eq!(w.enemies.active_count(), DEBUG_SPAWN_COUNT);
        assert!(w.enemies.iter_active().all(|(_, e)| e.def_index == 0));
    }

    #[test]
    fn test_kill_all_ultimate() {
        let mut w = running(5, "knight");
        w.spawn_timer = 100.0;
        for i in 0..4 {
            w.enemies.spawn(Enemy {
                active: true,
                pos: w.player.pos + Vec2::new(600.0 + 40.0 * i as f32, 0.0),
                hp: 50.0,
                max_hp: 50.0,
                last_hit_at: -1.0,
                ..Default::default()
            });
        }
        let input = TickInput {
            ultimate: true,
            ..Default::default()
        };
        tick(&mut w, &input, SIM_DT);
        assert_eq!(w.enemies.active_count(), 0);
        assert_eq!(w.kills, 4);
        let expected = w.settings.ultimate_base_cooldown - SIM_DT;
        assert!((w.ultimate_cd - expected).abs() < 1e-3);

        // Still cooling down
        assert!(!activate_ultimate(&mut w));
    }

    #[test]
    fn test_shift_speed_ultimate_hastes() {
        let mut w = running(5, "ranger");
        let before = w.player.total_stats();
        assert!(activate_ultimate(&mut w));
        assert_eq!(w.player.haste_timer, HASTE_DURATION);
        let hasted = w.player.total_stats();
        assert_eq!(hasted.move_speed, 0.0);
        assert!((hasted.attack_speed - (before.attack_speed + before.move_speed)).abs() < 1e-5);
    }

    #[test]
    fn test_ultimate_cooldown_reduction() {
        let mut w = running(5, "knight");
        w.player.effects.ultimate_cdr = 0.5;
        assert!(activate_ultimate(&mut w));
        assert!((w.ultimate_cd - w.settings.ultimate_base_cooldown * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_boss_trigger_respects_cooldown() {
        let mut w = running(5, "ranger");
        let input = TickInput {
            trigger_boss: true,
            ..Default::default()
        };
        tick(&mut w, &input, SIM_DT);
        assert_eq!(w.mode, GameMode::BossEvent);
        assert!(w.snapshot.is_some());

        // Lose immediately to get back to the wave
        w.player.hp = 0.0;
        tick(&mut w, &TickInput::default(), SIM_DT);
        assert_eq!(w.mode, GameMode::Wave);
        assert!(w.encounter.event_cd > 0.0);

        tick(&mut w, &input, SIM_DT);
        assert_eq!(w.mode, GameMode::Wave);
    }

    #[test]
    fn test_game_over_reports_points() {
        let mut w = running(5, "ranger");
        w.level = 4;
        w.boss_victories = 1;
        w.player.hp = 0.0;
        w.drain_events();
        tick(&mut w, &TickInput::default(), SIM_DT);
        assert_eq!(w.mode, GameMode::GameOver);
        assert_eq!(w.drain_events(), vec![GameEvent::GameOver { points: 5 }]);

        // Dead worlds stay put
        let time = w.game_time;
        tick(&mut w, &TickInput::default(), SIM_DT);
        assert_eq!(w.game_time, time);
    }

    #[test]
    fn test_regen_heals_to_cap() {
        let mut w = running(5, "alchemist");
        let max_hp = w.player.total_stats().max_hp;
        w.player.hp = max_hp - 0.001;
        w.spawn_timer = 100.0;
        tick(&mut w, &TickInput::default(), SIM_DT);
        assert_eq!(w.player.hp, max_hp);
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed stay identical
        let mut w1 = running(99999, "alchemist");
        let mut w2 = running(99999, "alchemist");

        let inputs = [
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput {
                up: true,
                debug_spawn: true,
                ..Default::default()
            },
            TickInput {
                left: true,
                down: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..120 {
            for input in &inputs {
                tick(&mut w1, input, SIM_DT);
                tick(&mut w2, input, SIM_DT);
            }
        }

        assert_eq!(w1.game_time.to_bits(), w2.game_time.to_bits());
        assert_eq!(w1.kills, w2.kills);
        assert_eq!(w1.enemies.active_count(), w2.enemies.active_count());
        assert_eq!(w1.player.pos, w2.player.pos);
        assert_eq!(w1.player.hp.to_bits(), w2.player.hp.to_bits());
        assert_eq!(w1.mode, w2.mode);
    }
}
