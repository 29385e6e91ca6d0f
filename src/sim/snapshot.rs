//! Wave state saved across a boss encounter

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::Pool;
use super::state::{Bullet, Drop, Enemy, GameMode, Player, Puddle, WeaponFx, World};

/// Deep copy of everything a boss encounter disturbs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveSnapshot {
    pub mode: GameMode,
    pub player: Player,
    pub enemies: Pool<Enemy>,
    pub bullets: Pool<Bullet>,
    pub drops: Pool<Drop>,
    pub puddles: Pool<Puddle>,
    pub weapon_fx: Pool<WeaponFx>,
    pub spawn_timer: f32,
    pub kills: u32,
    pub xp: f32,
    pub level: u32,
    pub xp_to_next: f32,
    pub game_time: f32,
    pub last_item_index: Option<usize>,
    pub item_popup_timer: f32,
    pub item_popup_name: String,
    pub camera: Vec2,
    pub ultimate_cd: f32,
    pub time_scale: f32,
    pub rerolls: u32,
    pub high_roll_used: bool,
}

impl WaveSnapshot {
    pub fn capture(world: &World) -> Self {
        Self {
            mode: world.mode,
            player: world.player.clone(),
            enemies: world.enemies.clone(),
            bullets: world.bullets.clone(),
            drops: world.drops.clone(),
            puddles: world.puddles.clone(),
            weapon_fx: world.weapon_fx.clone(),
            spawn_timer: world.spawn_timer,
            kills: world.kills,
            xp: world.xp,
            level: world.level,
            xp_to_next: world.xp_to_next,
            game_time: world.game_time,
            last_item_index: world.last_item_index,
            item_popup_timer: world.item_popup_timer,
            item_popup_name: world.item_popup_name.clone(),
            camera: world.camera,
            ultimate_cd: world.ultimate_cd,
            time_scale: world.time_scale,
            rerolls: world.rerolls,
            high_roll_used: world.high_roll_used,
        }
    }

    pub fn restore(self, world: &mut World) {
        world.mode = self.mode;
        world.player = self.player;
        world.enemies = self.enemies;
        world.bullets = self.bullets;
        world.drops = self.drops;
        world.puddles = self.puddles;
        world.weapon_fx = self.weapon_fx;
        world.spawn_timer = self.spawn_timer;
        world.kills = self.kills;
        world.xp = self.xp;
        world.level = self.level;
        world.xp_to_next = self.xp_to_next;
        world.game_time = self.game_time;
        world.last_item_index = self.last_item_index;
        world.item_popup_timer = self.item_popup_timer;
        world.item_popup_name = self.item_popup_name;
        world.camera = self.camera;
        world.ultimate_cd = self.ultimate_cd;
        world.time_scale = self.time_scale;
        world.rerolls = self.rerolls;
        world.high_roll_used = self.high_roll_used;
    }
}

/// Save the wave, replacing any snapshot already held
pub fn save_snapshot(world: &mut World) {
    if world.snapshot.is_some() {
        log::warn!("Overwriting an unrestored wave snapshot");
    }
    world.snapshot = Some(WaveSnapshot::capture(world));
}

/// Restore and consume the saved wave; false when none is held
pub fn restore_snapshot(world: &mut World) -> bool {
    match world.snapshot.take() {
        Some(snapshot) => {
            snapshot.restore(world);
            true
        }
        None => false,
    }
}
