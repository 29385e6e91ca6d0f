//! World state and entity records
//!
//! Everything a renderer reads after a tick lives in [`World`]. The five
//! transient entity kinds sit in fixed-capacity [`Pool`]s.

use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pickups::spawn_chest;
use super::pool::{Pool, Slot};
use super::rewards::RewardChoice;
use super::snapshot::WaveSnapshot;
use super::stats::{ItemEffects, Stats, compute_bonus, total_stats};
use super::status::{Debuffs, StatusChances};
use super::weapons::{WeaponBehavior, WeaponSlot};
use crate::catalog::Catalog;
use crate::consts::*;
use crate::meta::MetaBonuses;
use crate::settings::SimSettings;

/// Seconds the picked-item banner stays up
pub const ITEM_POPUP_DURATION: f32 = 4.5;
/// Number of chests scattered at run start
const START_CHESTS: usize = 3;

/// Top-level game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Character select, nothing simulated
    #[default]
    Start,
    /// Normal wave play
    Wave,
    /// Waiting for a reward choice
    LevelUp,
    /// Paused from Wave or BossEvent
    Pause,
    /// Boss encounter sub-mode
    BossEvent,
    /// Player died
    GameOver,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub hp: f32,
    pub base: Stats,
    /// Item bonus, recomputed whenever passive items change
    pub bonus: Stats,
    /// Secondary item effects, recomputed alongside `bonus`
    pub effects: ItemEffects,
    pub weapons: [Option<WeaponSlot>; MAX_WEAPON_SLOTS],
    /// Catalog item indices in acquisition order (duplicates allowed)
    pub passive_items: Vec<usize>,
    /// Last non-zero movement direction
    pub facing: Vec2,
    pub is_moving: bool,
    /// Remaining haste ultimate time (move speed becomes attack speed)
    pub haste_timer: f32,
    /// Offset added to every scythe throw, rotated after each one
    pub scythe_throw_angle: f32,
    /// Rotation of the orbiting blades
    pub orbit_angle: f32,
}

impl Default for Player {
    fn default() -> Self {
        let base = Stats {
            max_hp: PLAYER_BASE_HP,
            move_speed: 1.0,
            ..Default::default()
        };
        Self {
            pos: Vec2::new(ARENA_W * 0.5, ARENA_H * 0.5),
            hp: base.max_hp,
            base,
            bonus: Stats::default(),
            effects: ItemEffects::default(),
            weapons: Default::default(),
            passive_items: Vec::new(),
            facing: Vec2::Y,
            is_moving: false,
            haste_timer: 0.0,
            scythe_throw_angle: 0.0,
            orbit_angle: -std::f32::consts::FRAC_PI_2,
        }
    }
}

impl Player {
    /// Clamped usable stats for this frame
    pub fn total_stats(&self) -> Stats {
        total_stats(
            &self.base,
            &self.bonus,
            self.haste_timer > 0.0,
            self.effects.hp_regen_amp,
        )
    }

    /// Recompute the item bonus and secondary effects
    pub fn recalc(&mut self, catalog: &Catalog) {
        self.bonus = compute_bonus(&self.base, &self.passive_items, catalog);
        self.effects = ItemEffects::collect(&self.passive_items, catalog);
    }

    /// Add a passive item; returns false when the item list is full
    pub fn apply_item(&mut self, item: usize, catalog: &Catalog) -> bool {
        let added = self.passive_items.len() < MAX_PASSIVE_ITEMS;
        if added {
            self.passive_items.push(item);
        }
        self.recalc(catalog);
        added
    }

    pub fn weapon_slot(&self, def_index: usize) -> Option<&WeaponSlot> {
        self.weapons
            .iter()
            .flatten()
            .find(|slot| slot.def_index == def_index)
    }

    fn weapon_slot_mut(&mut self, def_index: usize) -> Option<&mut WeaponSlot> {
        self.weapons
            .iter_mut()
            .flatten()
            .find(|slot| slot.def_index == def_index)
    }

    /// Level of an owned weapon
    pub fn weapon_level(&self, def_index: usize) -> Option<u32> {
        self.weapon_slot(def_index).map(|slot| slot.level)
    }

    pub fn free_weapon_slots(&self) -> usize {
        self.weapons.iter().filter(|slot| slot.is_none()).count()
    }

    /// Whether offering this weapon as a reward would change anything
    pub fn weapon_choice_allowed(&self, def_index: usize) -> bool {
        match self.weapon_level(def_index) {
            Some(level) => level < MAX_WEAPON_LEVEL,
            None => self.free_weapon_slots() > 0,
        }
    }

    /// Equip a new weapon or level up an owned one
    ///
    /// Levels cap at [`MAX_WEAPON_LEVEL`]; returns whether anything changed.
    pub fn equip_weapon(&mut self, def_index: usize, catalog: &Catalog) -> bool {
        if let Some(slot) = self.weapon_slot_mut(def_index) {
            let before = slot.level;
            slot.level = (slot.level + 1).min(MAX_WEAPON_LEVEL);
            return slot.level != before;
        }
        let Some(def) = catalog.weapon(def_index) else {
            return false;
        };
        match self.weapons.iter_mut().find(|slot| slot.is_none()) {
            Some(free) => {
                *free = Some(WeaponSlot::new(def_index, def));
                true
            }
            None => false,
        }
    }

    pub fn has_orbit_blade(&self) -> bool {
        self.weapons
            .iter()
            .flatten()
            .any(|slot| slot.behavior == WeaponBehavior::OrbitBlade)
    }

    /// Heal by `amount`, never above `max_hp`
    pub fn heal(&mut self, amount: f32, max_hp: f32) {
        self.hp = (self.hp + amount).clamp(0.0, max_hp);
    }
}

/// A wave enemy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enemy {
    pub active: bool,
    pub def_index: usize,
    pub pos: Vec2,
    /// Dash velocity, only used while `charge_time > 0`
    pub vel: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Remaining spawn invulnerability
    pub spawn_invuln: f32,
    /// Ranged attack cooldown
    pub cooldown: f32,
    /// Time until the next charge
    pub charge_timer: f32,
    /// Remaining dash time of the current charge
    pub charge_time: f32,
    pub debuffs: Debuffs,
    /// Game time of the last hit, for hit flashes (negative = never)
    pub last_hit_at: f32,
    /// Orbiting blade re-hit cooldown
    pub sword_hit_cd: f32,
    /// Id of the last scythe throw that struck this enemy
    pub scythe_hit_id: u32,
}

impl Enemy {
    pub fn is_invulnerable(&self) -> bool {
        self.spawn_invuln > 0.0
    }
}

impl Slot for Enemy {
    fn is_active(&self) -> bool {
        self.active
    }
    fn deactivate(&mut self) {
        self.active = false;
    }
}

/// A projectile fired by the player or an enemy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bullet {
    pub active: bool,
    pub from_player: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub radius: f32,
    pub lifetime: f32,
    /// Extra enemies this bullet may pass through; gone below zero
    pub pierce: i32,
    pub homing: bool,
    /// Catalog index of the firing weapon
    pub weapon_index: Option<usize>,
    pub chances: StatusChances,
}

impl Slot for Bullet {
    fn is_active(&self) -> bool {
        self.active
    }
    fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Pickup kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DropKind {
    #[default]
    Xp,
    Heal,
    Chest,
}

impl DropKind {
    /// Distance at which the player collects the drop
    pub fn pickup_radius(&self) -> f32 {
        match self {
            DropKind::Xp => 20.0,
            DropKind::Heal => 30.0,
            DropKind::Chest => 26.0,
        }
    }
}

/// A pickup lying in the arena
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drop {
    pub active: bool,
    pub kind: DropKind,
    pub pos: Vec2,
    pub value: f32,
    pub ttl: f32,
    /// Once set, the drop homes in on the player until collected
    pub magnetized: bool,
    pub magnet_speed: f32,
}

impl Slot for Drop {
    fn is_active(&self) -> bool {
        self.active
    }
    fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Damage-over-time area
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Puddle {
    pub active: bool,
    pub pos: Vec2,
    pub radius: f32,
    pub dps: f32,
    pub ttl: f32,
    /// Throttles combat log lines
    pub log_timer: f32,
}

impl Slot for Puddle {
    fn is_active(&self) -> bool {
        self.active
    }
    fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Weapon effect particle kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FxKind {
    /// Thrown scythe spiralling outward; deals damage
    #[default]
    Scythe,
    /// Bite mark on a drained enemy
    Bite,
    /// Dagger flying toward its target
    Dagger,
}

/// Transient weapon effect
///
/// Only [`FxKind::Scythe`] affects combat. Bites and daggers are drawn
/// after their damage has already been applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponFx {
    pub active: bool,
    pub kind: FxKind,
    /// Spawn point (spiral center for scythes)
    pub origin: Vec2,
    pub angle: f32,
    pub start_angle: f32,
    pub timer: f32,
    pub duration: f32,
    /// Current spiral radius
    pub radius: f32,
    pub radial_speed: f32,
    pub angle_speed: f32,
    pub damage: f32,
    pub chances: StatusChances,
    /// Unique per throw; stamped onto enemies it has hit
    pub scythe_id: u32,
    pub hit_boss: bool,
    /// Enemy slot this effect tracks
    pub target: Option<usize>,
}

impl WeaponFx {
    /// Current position of a scythe's hit circle
    pub fn scythe_pos(&self) -> Vec2 {
        self.origin + Vec2::from_angle(self.angle) * self.radius
    }
}

impl Slot for WeaponFx {
    fn is_active(&self) -> bool {
        self.active
    }
    fn deactivate(&mut self) {
        self.active = false;
    }
}

/// The boss encounter's single adversary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Boss {
    pub active: bool,
    pub def_index: usize,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Contact damage cooldown
    pub attack_timer: f32,
    pub beam_angle: f32,
    pub wave_cd: f32,
    pub slam_cd: f32,
    /// Remaining hazard phase time; the boss stands still while > 0
    pub hazard_timer: f32,
    pub hazard_cd: f32,
    /// Orbiting blade re-hit cooldown
    pub sword_hit_cd: f32,
    pub safe_zones: [Vec2; 3],
}

/// Boss encounter timers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Encounter {
    /// Time until the boss appears
    pub countdown: f32,
    /// Time left before the encounter is lost
    pub timer: f32,
    pub timer_max: f32,
    pub room_center: Vec2,
    /// Re-trigger cooldown for the debug boss key
    pub event_cd: f32,
}

/// Notable things that happened during a tick
///
/// Drained by the caller once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted { character: Option<usize> },
    ItemPicked { item: usize },
    WeaponEquipped { weapon: usize, level: u32 },
    LevelUp { level: u32 },
    BossEventStarted,
    BossSpawned { pos: Vec2 },
    BossEventEnded { victory: bool },
    GameOver { points: u32 },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub catalog: Arc<Catalog>,
    pub settings: SimSettings,
    /// Run-start bonuses from meta progression
    pub meta: MetaBonuses,
    pub mode: GameMode,
    /// Mode to resume when leaving Pause
    pub pause_return_mode: GameMode,
    pub player: Player,
    pub enemies: Pool<Enemy>,
    pub bullets: Pool<Bullet>,
    pub drops: Pool<Drop>,
    pub puddles: Pool<Puddle>,
    pub weapon_fx: Pool<WeaponFx>,
    pub boss: Boss,
    pub encounter: Encounter,
    /// Wave state saved while a boss encounter runs
    pub snapshot: Option<WaveSnapshot>,
    pub spawn_timer: f32,
    pub kills: u32,
    pub xp: f32,
    pub level: u32,
    pub xp_to_next: f32,
    pub game_time: f32,
    pub last_item_index: Option<usize>,
    pub item_popup_timer: f32,
    pub item_popup_name: String,
    /// Top-left corner of the view in arena coordinates
    pub camera: Vec2,
    /// View size
    pub view: Vec2,
    pub ultimate_cd: f32,
    pub time_scale: f32,
    pub rerolls: u32,
    pub high_roll_used: bool,
    pub selected_character: Option<usize>,
    /// Current reward offers (level-up or boss victory)
    pub choices: Vec<RewardChoice>,
    pub boss_victories: u32,
    pub scythe_id_counter: u32,
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
}

impl World {
    /// Fresh world in [`GameMode::Start`]
    pub fn new(catalog: Arc<Catalog>, settings: SimSettings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let mut world = Self {
            catalog,
            view: settings.view_size(),
            time_scale: settings.time_scale,
            rerolls: settings.rerolls,
            settings,
            meta: MetaBonuses::default(),
            mode: GameMode::Start,
            pause_return_mode: GameMode::Start,
            player: Player::default(),
            enemies: Pool::with_capacity(MAX_ENEMIES),
            bullets: Pool::with_capacity(MAX_BULLETS),
            drops: Pool::with_capacity(MAX_DROPS),
            puddles: Pool::with_capacity(MAX_PUDDLES),
            weapon_fx: Pool::with_capacity(MAX_WEAPON_FX),
            boss: Boss::default(),
            encounter: Encounter::default(),
            snapshot: None,
            spawn_timer: 0.0,
            kills: 0,
            xp: 0.0,
            level: 1,
            xp_to_next: 10.0,
            game_time: 0.0,
            last_item_index: None,
            item_popup_timer: 0.0,
            item_popup_name: String::new(),
            camera: Vec2::ZERO,
            ultimate_cd: 0.0,
            high_roll_used: false,
            selected_character: None,
            choices: Vec::new(),
            boss_victories: 0,
            scythe_id_counter: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        };
        world.reset();
        world
    }

    /// World with default settings
    pub fn with_seed(catalog: Arc<Catalog>, seed: u64) -> Self {
        Self::new(catalog, SimSettings::default(), seed)
    }

    /// Return to the character select state with a fresh player
    pub fn reset(&mut self) {
        self.view = self.settings.view_size();
        self.spawn_timer = 0.0;
        self.kills = 0;
        self.xp = 0.0;
        self.level = 1;
        self.xp_to_next = 10.0;
        self.game_time = 0.0;
        self.last_item_index = None;
        self.item_popup_timer = 0.0;
        self.item_popup_name.clear();
        self.scythe_id_counter = 0;
        self.mode = GameMode::Start;
        self.pause_return_mode = GameMode::Start;
        self.time_scale = self.settings.time_scale;
        self.encounter = Encounter::default();
        self.boss = Boss::default();
        self.snapshot = None;
        self.ultimate_cd = 0.0;
        self.choices.clear();
        self.selected_character = None;
        self.rerolls = self.settings.rerolls;
        self.high_roll_used = false;
        self.boss_victories = 0;
        self.meta = MetaBonuses::default();

        self.enemies.clear();
        self.bullets.clear();
        self.drops.clear();
        self.puddles.clear();
        self.weapon_fx.clear();

        self.player = Player::default();
        self.center_camera_on_player();
        self.place_start_chests();
    }

    fn place_start_chests(&mut self) {
        let mut placed = 0;
        let mut attempts = 0;
        while placed < START_CHESTS && attempts < 200 {
            attempts += 1;
            let pos = Vec2::new(
                80.0 + self.rng.random::<f32>() * (ARENA_W - 160.0),
                80.0 + self.rng.random::<f32>() * (ARENA_H - 160.0),
            );
            if pos.distance_squared(self.player.pos) < 600.0 * 600.0 {
                continue;
            }
            let crowded = self.drops.iter_active().any(|(_, d)| {
                d.kind == DropKind::Chest && d.pos.distance_squared(pos) < 400.0 * 400.0
            });
            if crowded {
                continue;
            }
            spawn_chest(self, pos);
            placed += 1;
        }
    }

    /// Largest legal camera position
    pub fn max_camera(&self) -> Vec2 {
        Vec2::new(ARENA_W - self.view.x, ARENA_H - self.view.y).max(Vec2::ZERO)
    }

    pub fn center_camera_on_player(&mut self) {
        let target = self.player.pos - self.view * 0.5;
        self.camera = target.clamp(Vec2::ZERO, self.max_camera());
    }

    /// Scroll the camera when the player nears a view edge
    pub fn follow_camera(&mut self) {
        let margin = self.view * 0.2;
        let on_screen = self.player.pos - self.camera;
        if on_screen.x > self.view.x - margin.x {
            self.camera.x = self.player.pos.x - (self.view.x - margin.x);
        }
        if on_screen.x < margin.x {
            self.camera.x = self.player.pos.x - margin.x;
        }
        if on_screen.y > self.view.y - margin.y {
            self.camera.y = self.player.pos.y - (self.view.y - margin.y);
        }
        if on_screen.y < margin.y {
            self.camera.y = self.player.pos.y - margin.y;
        }
        self.camera = self.camera.clamp(Vec2::ZERO, self.max_camera());
    }

    /// Point inside the current view rectangle
    pub fn in_view(&self, pos: Vec2) -> bool {
        let max = self.camera + self.view;
        pos.x >= self.camera.x && pos.x <= max.x && pos.y >= self.camera.y && pos.y <= max.y
    }

    pub fn boss_active(&self) -> bool {
        self.mode == GameMode::BossEvent && self.boss.active
    }

    /// Next scythe throw id (never zero)
    pub fn next_scythe_id(&mut self) -> u32 {
        self.scythe_id_counter += 1;
        self.scythe_id_counter
    }

    /// Show the picked-item banner
    pub fn trigger_item_popup(&mut self, item: usize) {
        self.item_popup_name = self.catalog.item_name(item).to_string();
        self.item_popup_timer = ITEM_POPUP_DURATION;
    }

    /// Meta points earned by the run so far
    pub fn meta_points(&self) -> u32 {
        self.level.saturating_sub(1) + 2 * self.boss_victories
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
