//! Read-only definition catalog
//!
//! Loaded once before a run starts and never mutated afterward. Lookups by
//! index are bounds-checked and degrade to neutral values instead of failing.

pub mod defs;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use defs::{
    BossDef, CharacterDef, EnemyDef, EnemyRole, ItemDef, ProcDef, Rarity, Ultimate, WeaponDef,
    WeaponScale,
};

/// Sample data shipped with the crate
const BUILTIN_JSON: &str = include_str!("builtin.json");

/// Errors raised while turning external data into a [`Catalog`]
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} entry {index} has an empty id")]
    EmptyId { kind: &'static str, index: usize },

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("character '{character}' starts with unknown weapon '{weapon}'")]
    UnknownWeapon { character: String, weapon: String },

    #[error("enemy '{id}' must have positive hp (got {hp})")]
    NonPositiveHp { id: String, hp: f32 },
}

/// Raw catalog document as it appears on disk
///
/// The data files split these arrays across several documents; any subset
/// may be present in one document and documents can be merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogData {
    pub weapons: Vec<WeaponDef>,
    pub items: Vec<ItemDef>,
    pub enemies: Vec<EnemyDef>,
    pub bosses: Vec<BossDef>,
    pub characters: Vec<CharacterDef>,
}

impl CatalogData {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Append every definition from `other`
    pub fn merge(&mut self, other: CatalogData) {
        self.weapons.extend(other.weapons);
        self.items.extend(other.items);
        self.enemies.extend(other.enemies);
        self.bosses.extend(other.bosses);
        self.characters.extend(other.characters);
    }
}

/// Immutable definition tables indexed by position
#[derive(Debug, Clone)]
pub struct Catalog {
    weapons: Vec<WeaponDef>,
    items: Vec<ItemDef>,
    enemies: Vec<EnemyDef>,
    bosses: Vec<BossDef>,
    characters: Vec<CharacterDef>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            weapons: Vec::new(),
            items: Vec::new(),
            enemies: Vec::new(),
            bosses: vec![BossDef::default()],
            characters: Vec::new(),
        }
    }
}

impl Catalog {
    /// Validate raw data and build a catalog
    ///
    /// An empty boss list gets the built-in boss so boss lookups always
    /// resolve.
    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        let mut bosses = data.bosses;
        if bosses.is_empty() {
            bosses.push(BossDef::default());
        }
        let catalog = Self {
            weapons: data.weapons,
            items: data.items,
            enemies: data.enemies,
            bosses,
            characters: data.characters,
        };
        catalog.validate()?;
        log::info!(
            "Catalog loaded: {} weapons, {} items, {} enemies, {} bosses, {} characters",
            catalog.weapons.len(),
            catalog.items.len(),
            catalog.enemies.len(),
            catalog.bosses.len(),
            catalog.characters.len()
        );
        Ok(catalog)
    }

    /// Parse a single combined JSON document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::from_data(CatalogData::from_json(json)?)
    }

    /// The sample catalog bundled with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_JSON)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        check_ids("weapon", self.weapons.iter().map(|w| w.id.as_str()))?;
        check_ids("item", self.items.iter().map(|i| i.id.as_str()))?;
        check_ids("enemy", self.enemies.iter().map(|e| e.id.as_str()))?;
        check_ids("boss", self.bosses.iter().map(|b| b.id.as_str()))?;
        check_ids("character", self.characters.iter().map(|c| c.id.as_str()))?;

        for enemy in &self.enemies {
            if enemy.hp <= 0.0 {
                return Err(CatalogError::NonPositiveHp {
                    id: enemy.id.clone(),
                    hp: enemy.hp,
                });
            }
        }
        for character in &self.characters {
            if !character.weapon.is_empty() && self.find_weapon(&character.weapon).is_none() {
                return Err(CatalogError::UnknownWeapon {
                    character: character.id.clone(),
                    weapon: character.weapon.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn weapons(&self) -> &[WeaponDef] {
        &self.weapons
    }

    pub fn items(&self) -> &[ItemDef] {
        &self.items
    }

    pub fn enemies(&self) -> &[EnemyDef] {
        &self.enemies
    }

    pub fn characters(&self) -> &[CharacterDef] {
        &self.characters
    }

    pub fn weapon(&self, index: usize) -> Option<&WeaponDef> {
        self.weapons.get(index)
    }

    pub fn item(&self, index: usize) -> Option<&ItemDef> {
        self.items.get(index)
    }

    pub fn enemy(&self, index: usize) -> Option<&EnemyDef> {
        self.enemies.get(index)
    }

    pub fn character(&self, index: usize) -> Option<&CharacterDef> {
        self.characters.get(index)
    }

    /// Boss definition; out-of-range indices fall back to the first boss
    pub fn boss(&self, index: usize) -> &BossDef {
        static FALLBACK: std::sync::OnceLock<BossDef> = std::sync::OnceLock::new();
        self.bosses
            .get(index)
            .or_else(|| self.bosses.first())
            .unwrap_or_else(|| FALLBACK.get_or_init(BossDef::default))
    }

    /// Weapon index by id
    pub fn find_weapon(&self, id: &str) -> Option<usize> {
        self.weapons.iter().position(|w| w.id == id)
    }

    pub fn weapon_name(&self, index: usize) -> &str {
        self.weapon(index).map(|w| w.name.as_str()).unwrap_or("")
    }

    pub fn item_name(&self, index: usize) -> &str {
        self.item(index).map(|i| i.name.as_str()).unwrap_or("")
    }

    /// Display label for combat logging
    pub fn enemy_name(&self, index: usize) -> &str {
        self.enemy(index).map(|e| e.name.as_str()).unwrap_or("enemy")
    }
}

fn check_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for (index, id) in ids.enumerate() {
        if id.is_empty() {
            return Err(CatalogError::EmptyId { kind, index });
        }
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.weapons().is_empty());
        assert!(!catalog.items().is_empty());
        assert!(!catalog.enemies().is_empty());
        assert!(!catalog.characters().is_empty());
        assert_eq!(catalog.boss(0).id, "proto_beast");
        assert!(catalog.find_weapon("sword").is_some());
    }

    #[test]
    fn test_out_of_range_lookups_degrade() {
        let catalog = Catalog::default();
        assert!(catalog.weapon(99).is_none());
        assert_eq!(catalog.item_name(99), "");
        assert_eq!(catalog.enemy_name(99), "enemy");
        assert_eq!(catalog.boss(42).id, "proto_beast");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = r#"{"weapons":[{"id":"pistol"},{"id":"pistol"}]}"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { kind: "weapon", .. }));
    }

    #[test]
    fn test_unknown_character_weapon_rejected() {
        let json = r#"{"characters":[{"id":"hero","weapon":"laser"}]}"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownWeapon { .. }));
    }

    #[test]
    fn test_enemy_hp_must_be_positive() {
        let json = r#"{"enemies":[{"id":"ghost","hp":0}]}"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::NonPositiveHp { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_merge_documents() {
        let mut data = CatalogData::from_json(r#"{"weapons":[{"id":"pistol"}]}"#).unwrap();
        data.merge(CatalogData::from_json(r#"{"items":[{"id":"ring"}]}"#).unwrap());
        let catalog = Catalog::from_data(data).unwrap();
        assert_eq!(catalog.weapons().len(), 1);
        assert_eq!(catalog.items().len(), 1);
    }
}
