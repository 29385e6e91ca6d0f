//! Definition records for weapons, items, enemies, bosses and characters
//!
//! Field names mirror the JSON data files. Every field is optional in the
//! data; missing values fall back to `Default`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::sim::stats::Stats;

/// Item/weapon rarity tier, ordered common to legendary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    /// Rank index 0 (common) ..= 4 (legendary)
    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn from_rank(rank: usize) -> Self {
        Self::ALL[rank.min(Self::ALL.len() - 1)]
    }
}

impl From<String> for Rarity {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "uncommon" => Rarity::Uncommon,
            "rare" => Rarity::Rare,
            "epic" => Rarity::Epic,
            "legendary" => Rarity::Legendary,
            _ => Rarity::Common,
        }
    }
}

impl From<Rarity> for String {
    fn from(r: Rarity) -> Self {
        r.as_str().to_string()
    }
}

/// Which player stats a weapon scales with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponScale {
    Damage,
    AttackSpeed,
    Range,
    Crit,
}

/// Weapon definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponDef {
    pub id: String,
    pub name: String,
    /// Free-form category label ("melee", "ranged", ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub rarity: Rarity,
    pub cooldown: f32,
    pub damage: f32,
    pub range: f32,
    pub projectile_speed: f32,
    pub crit_multiplier: f32,
    pub pierce: i32,
    pub pellets: i32,
    /// Total fan angle in degrees
    pub spread: f32,
    #[serde(deserialize_with = "int_or_bool")]
    pub homing: bool,
    pub scales: Vec<WeaponScale>,
}

impl WeaponDef {
    pub fn scales_with(&self, scale: WeaponScale) -> bool {
        self.scales.contains(&scale)
    }
}

/// On-hit proc carried by an item (chain lightning)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcDef {
    pub chance: f32,
    pub damage: f32,
    pub bounces: i32,
    pub range: f32,
}

/// Passive item definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub desc: String,
    pub stats: Stats,
    pub proc: Option<ProcDef>,
    pub slow_on_hit: f32,
    /// Aura radius; the largest aura among owned items wins
    pub slow_aura: f32,
    pub burn_on_hit: f32,
    pub burn_aura: f32,
    pub thorns_percent: f32,
    pub lifesteal_on_kill: f32,
    pub rarity_bias: f32,
    pub slow_bonus_damage: f32,
    pub legendary_amp: f32,
    pub hp_regen_amp: f32,
    pub xp_kill_chance: f32,
    pub ultimate_cdr: f32,
}

impl ItemDef {
    pub fn is_legendary(&self) -> bool {
        self.rarity == Rarity::Legendary
    }
}

/// Enemy behavior role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnemyRole {
    #[default]
    Melee,
    Ranged,
    Charger,
    Turret,
    Exploder,
    Boss,
}

impl EnemyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyRole::Melee => "melee",
            EnemyRole::Ranged => "ranged",
            EnemyRole::Charger => "charger",
            EnemyRole::Turret => "turret",
            EnemyRole::Exploder => "exploder",
            EnemyRole::Boss => "boss",
        }
    }

    /// Roles that fire projectiles at the player on a cooldown
    pub fn shoots(&self) -> bool {
        matches!(self, EnemyRole::Ranged | EnemyRole::Turret | EnemyRole::Boss)
    }
}

impl From<String> for EnemyRole {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "ranged" => EnemyRole::Ranged,
            "charger" => EnemyRole::Charger,
            "turret" => EnemyRole::Turret,
            "exploder" => EnemyRole::Exploder,
            "boss" => EnemyRole::Boss,
            _ => EnemyRole::Melee,
        }
    }
}

impl From<EnemyRole> for String {
    fn from(r: EnemyRole) -> Self {
        r.as_str().to_string()
    }
}

/// Wave enemy definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    pub role: EnemyRole,
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub cooldown: f32,
    pub projectile_speed: f32,
    pub charge_speed: f32,
    pub charge_cooldown: f32,
    pub explode_radius: f32,
}

/// Boss encounter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossDef {
    pub id: String,
    pub name: String,
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    pub attack_cooldown: f32,
    pub beam_rot_speed: f32,
    pub beam_length: f32,
    pub beam_dps: f32,
    pub beam_width: f32,
    pub wave_cooldown: f32,
    pub wave_bullets: i32,
    pub wave_speed: f32,
    pub slam_cooldown: f32,
    pub slam_radius: f32,
    pub slam_damage: f32,
    pub hazard_cooldown: f32,
    pub hazard_duration: f32,
    pub hazard_dps: f32,
    pub hazard_safe_radius: f32,
}

impl Default for BossDef {
    /// The built-in Proto Behemoth
    fn default() -> Self {
        Self {
            id: "proto_beast".to_string(),
            name: "Proto Behemoth".to_string(),
            hp: 1800.0,
            speed: 90.0,
            damage: 30.0,
            radius: 26.0,
            attack_cooldown: 0.7,
            beam_rot_speed: 1.1,
            beam_length: 900.0,
            beam_dps: 120.0,
            beam_width: 22.0,
            wave_cooldown: 5.0,
            wave_bullets: 16,
            wave_speed: 220.0,
            slam_cooldown: 4.0,
            slam_radius: 80.0,
            slam_damage: 45.0,
            hazard_cooldown: 12.0,
            hazard_duration: 5.0,
            hazard_dps: 60.0,
            hazard_safe_radius: 70.0,
        }
    }
}

/// Character ultimate ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Ultimate {
    /// Kill every active enemy
    #[default]
    KillAll,
    /// Convert move speed into attack speed for a while
    ShiftSpeed,
}

impl From<String> for Ultimate {
    fn from(s: String) -> Self {
        match s.as_str() {
            "shift_speed" => Ultimate::ShiftSpeed,
            _ => Ultimate::KillAll,
        }
    }
}

impl From<Ultimate> for String {
    fn from(u: Ultimate) -> Self {
        match u {
            Ultimate::KillAll => "kill_all",
            Ultimate::ShiftSpeed => "shift_speed",
        }
        .to_string()
    }
}

/// Playable character definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDef {
    pub id: String,
    pub name: String,
    /// Starting weapon id
    pub weapon: String,
    pub stats: Stats,
    /// Flavor rule text shown on the select screen
    pub rule: String,
    pub ultimate: Ultimate,
}

/// Data files write flags as 0/1; accept booleans too
fn int_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
