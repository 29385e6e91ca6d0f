//! Checksummed skill tree envelope
//!
//! ```json
//! { "points": 3, "total_points": 9, "checksum": 123, "upgrades": { "boss_root": 1 } }
//! ```
//!
//! The checksum is FNV-1a (32 bit) over a fixed salt followed by a
//! line-oriented payload: `points=N`, `total=N`, then `key=rank` for every
//! node in table order.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::PersistenceError;
use crate::meta::{NODES, SkillTree};

const CHECKSUM_SALT: &str = "buh_skill_tree_v1";
const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Saved progress as it appears on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTreeProgress {
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub total_points: u32,
    /// Absent in files written before checksums existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
    #[serde(default)]
    pub upgrades: BTreeMap<String, u32>,
}

impl SkillTreeProgress {
    pub fn from_tree(tree: &SkillTree) -> Self {
        let upgrades = NODES
            .iter()
            .zip(tree.ranks().iter())
            .map(|(node, &rank)| (node.key.to_string(), rank))
            .collect();
        let ranks = *tree.ranks();
        Self {
            points: tree.points,
            total_points: tree.total_points,
            checksum: Some(checksum(tree.points, tree.total_points, &ranks)),
            upgrades,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Node ranks in table order; unknown keys are ignored
    fn ranks(&self) -> [u32; NODES.len()] {
        let mut ranks = [0; NODES.len()];
        for (rank, node) in ranks.iter_mut().zip(NODES.iter()) {
            *rank = self.upgrades.get(node.key).copied().unwrap_or(0);
        }
        ranks
    }

    /// Verify the checksum and rebuild the tree
    pub fn into_tree(self) -> Result<SkillTree, PersistenceError> {
        let ranks = self.ranks();
        let computed = checksum(self.points, self.total_points, &ranks);
        match self.checksum {
            Some(stored) if stored != computed => {
                return Err(PersistenceError::ChecksumMismatch { stored, computed });
            }
            Some(_) => {}
            None => log::info!("Skill tree progress has no checksum, accepting as-is"),
        }
        Ok(SkillTree::from_parts(self.points, self.total_points, ranks))
    }
}

/// Salted FNV-1a checksum of a progress payload
pub fn checksum(points: u32, total_points: u32, ranks: &[u32; NODES.len()]) -> u32 {
    let mut payload = String::new();
    // Writing into a String cannot fail
    let _ = write!(payload, "points={points}\ntotal={total_points}\n");
    for (node, rank) in NODES.iter().zip(ranks.iter()) {
        let _ = writeln!(payload, "{}={}", node.key, rank);
    }
    let salted = fnv1a(FNV_OFFSET, CHECKSUM_SALT.as_bytes());
    fnv1a(salted, payload.as_bytes())
}

fn fnv1a(mut hash: u32, bytes: &[u8]) -> u32 {
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
