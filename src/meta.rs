//! Skill tree meta-progression
//!
//! Points earned across runs are spent on a fixed node table. The ranks
//! bought here turn into [`MetaBonuses`], which a run applies once at start.

use serde::{Deserialize, Serialize};

/// Skill tree branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    Boss,
    Horde,
    Environment,
    Rolls,
    Stats,
}

impl Branch {
    pub const ALL: [Branch; 5] = [
        Branch::Boss,
        Branch::Horde,
        Branch::Environment,
        Branch::Rolls,
        Branch::Stats,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Branch::Boss => "Boss",
            Branch::Horde => "Horde",
            Branch::Environment => "Map/Env",
            Branch::Rolls => "Rolls",
            Branch::Stats => "Stats",
        }
    }
}

/// What a node's ranks do to a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaEffect {
    /// Reserved node, no gameplay effect yet
    None,
    /// Added to base damage
    DamagePct,
    /// Added to base armor
    ArmorFlat,
    /// Added to the xp multiplier
    XpMult,
    /// Compounded into the spawn rate scale
    SpawnScale,
}

/// One purchasable node
#[derive(Debug, Clone, Copy)]
pub struct SkillNode {
    /// Stable identifier used by saved progress
    pub key: &'static str,
    pub name: &'static str,
    pub branch: Branch,
    /// Node that must be maxed before this one can be bought
    pub parent: Option<usize>,
    pub depth: u32,
    pub max_rank: u32,
    pub effect: MetaEffect,
    pub value_per_rank: f32,
}

const fn node(
    key: &'static str,
    name: &'static str,
    branch: Branch,
    parent: Option<usize>,
    depth: u32,
    effect: MetaEffect,
    value_per_rank: f32,
) -> SkillNode {
    SkillNode {
        key,
        name,
        branch,
        parent,
        depth,
        max_rank: 3,
        effect,
        value_per_rank,
    }
}

/// The node table; indices are stable and `parent` refers into it
///
/// Effect values are local tuning; most nodes are reserved and do nothing yet.
#[rustfmt::skip]
pub const NODES: [SkillNode; 16] = [
    // Boss
    node("boss_root", "Boss Focus", Branch::Boss, None, 0, MetaEffect::None, 0.0),
    node("boss_armor", "Less Boss Armor", Branch::Boss, Some(0), 1, MetaEffect::None, 0.0),
    node("boss_damage", "Less Boss Damage", Branch::Boss, Some(0), 1, MetaEffect::None, 0.0),
    // Horde
    node("horde_root", "Horde Tactics", Branch::Horde, None, 0, MetaEffect::XpMult, 0.05),
    node("horde_size", "Horde Density", Branch::Horde, Some(3), 1, MetaEffect::SpawnScale, 0.1),
    node("horde_elites", "Elite Packs", Branch::Horde, Some(3), 1, MetaEffect::None, 0.0),
    // Map/Env
    node("map_root", "Map/Env", Branch::Environment, None, 0, MetaEffect::None, 0.0),
    node("map_size", "Arena Scale", Branch::Environment, Some(6), 1, MetaEffect::None, 0.0),
    node("map_hazards", "Environmental Hazards", Branch::Environment, Some(6), 1, MetaEffect::None, 0.0),
    // Rolls
    node("rolls_root", "Roll Control", Branch::Rolls, None, 0, MetaEffect::None, 0.0),
    node("rolls_reroll", "Extra Reroll", Branch::Rolls, Some(9), 1, MetaEffect::None, 0.0),
    node("rolls_highroll", "High Roll Boost", Branch::Rolls, Some(9), 1, MetaEffect::None, 0.0),
    // Stats
    node("stats_root", "Stats Core", Branch::Stats, None, 0, MetaEffect::ArmorFlat, 1.0),
    node("stats_damage", "Damage", Branch::Stats, Some(12), 1, MetaEffect::DamagePct, 0.03),
    node("stats_attack_speed", "Attack Speed", Branch::Stats, Some(13), 2, MetaEffect::None, 0.0),
    node("stats_crit", "Crit Chance", Branch::Stats, Some(13), 2, MetaEffect::None, 0.0),
];

/// Spawn scale bounds after compounding
const MIN_SPAWN_SCALE: f32 = 0.5;
const MAX_SPAWN_SCALE: f32 = 2.0;

pub fn node_index(key: &str) -> Option<usize> {
    NODES.iter().position(|n| n.key == key)
}

/// Points needed to raise a node from `rank` to `rank + 1`
pub fn rank_cost(rank: u32) -> u32 {
    1 + rank
}

/// Run modifiers derived from skill tree ranks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetaBonuses {
    pub damage_pct: f32,
    pub armor_flat: f32,
    pub xp_mult: f32,
    /// Divides the spawn interval
    pub spawn_scale: f32,
}

impl Default for MetaBonuses {
    fn default() -> Self {
        Self {
            damage_pct: 0.0,
            armor_flat: 0.0,
            xp_mult: 1.0,
            spawn_scale: 1.0,
        }
    }
}

/// Meta progression state owned by the caller and passed into runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkillTree {
    /// Unspent points
    pub points: u32,
    /// Points ever awarded
    pub total_points: u32,
    ranks: [u32; NODES.len()],
}

impl SkillTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from saved values; ranks beyond a node's max are clamped
    pub fn from_parts(points: u32, total_points: u32, ranks: [u32; NODES.len()]) -> Self {
        let mut ranks = ranks;
        for (rank, node) in ranks.iter_mut().zip(NODES.iter()) {
            *rank = (*rank).min(node.max_rank);
        }
        Self {
            points,
            total_points,
            ranks,
        }
    }

    pub fn ranks(&self) -> &[u32; NODES.len()] {
        &self.ranks
    }

    pub fn rank(&self, node: usize) -> u32 {
        self.ranks.get(node).copied().unwrap_or(0)
    }

    /// Credit points earned by a finished run
    pub fn award(&mut self, points: u32) {
        self.points += points;
        self.total_points += points;
        log::debug!(
            "Skill tree awarded {} points ({} unspent, {} total)",
            points,
            self.points,
            self.total_points
        );
    }

    /// Whether `node` could be bought right now
    pub fn can_purchase(&self, node: usize) -> bool {
        let Some(def) = NODES.get(node) else {
            return false;
        };
        let parent_maxed = def
            .parent
            .is_none_or(|parent| self.rank(parent) >= NODES[parent].max_rank);
        if !parent_maxed {
            return false;
        }
        let rank = self.ranks[node];
        rank < def.max_rank && self.points >= rank_cost(rank)
    }

    /// Spend points on one rank of `node`
    pub fn purchase(&mut self, node: usize) -> bool {
        if !self.can_purchase(node) {
            return false;
        }
        let cost = rank_cost(self.ranks[node]);
        self.points -= cost;
        self.ranks[node] += 1;
        log::debug!(
            "Skill '{}' raised to rank {} for {} points",
            NODES[node].key,
            self.ranks[node],
            cost
        );
        true
    }

    /// Run modifiers for the current ranks
    pub fn bonuses(&self) -> MetaBonuses {
        let mut bonuses = MetaBonuses::default();
        for (def, &rank) in NODES.iter().zip(self.ranks.iter()) {
            if rank == 0 {
                continue;
            }
            let value = def.value_per_rank * rank as f32;
            match def.effect {
                MetaEffect::DamagePct => bonuses.damage_pct += value,
                MetaEffect::ArmorFlat => bonuses.armor_flat += value,
                MetaEffect::XpMult => bonuses.xp_mult += value,
                MetaEffect::SpawnScale => bonuses.spawn_scale *= 1.0 + value,
                MetaEffect::None => {}
            }
        }
        bonuses.spawn_scale = bonuses.spawn_scale.clamp(MIN_SPAWN_SCALE, MAX_SPAWN_SCALE);
        bonuses
    }
}
