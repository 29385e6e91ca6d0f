//! Reward rolling for the level-up and boss victory screens
//!
//! Rarity ranks come from a weight table that the player's rarity bias
//! tilts toward rare and above. An empty rank falls back to lower ranks and
//! finally to a uniform pick.

use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GameMode, World};
use crate::catalog::{Catalog, Rarity};
use crate::consts::MAX_WEAPON_LEVEL;

/// Offers on a level-up screen
pub const LEVELUP_CHOICES: usize = 3;
/// Weighted attempts to fill the level-up screen
const LEVELUP_ATTEMPTS: usize = 32;
/// Base weights, common to legendary
const RARITY_WEIGHTS: [f32; 5] = [50.0, 35.0, 20.0, 10.0, 5.0];

/// One offer on the reward screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardChoice {
    Item(usize),
    Weapon(usize),
}

/// Rarity weights after applying `bias`
pub fn rarity_weights(bias: f32) -> [f32; 5] {
    let mut weights = RARITY_WEIGHTS;
    if bias > 0.0 {
        let down = (1.0 - bias * 0.6).clamp(0.2, 1.0);
        let up = 1.0 + bias;
        for (rank, weight) in weights.iter_mut().enumerate() {
            *weight *= if rank < Rarity::Rare.rank() { down } else { up };
        }
    }
    weights
}

/// Roll a rarity rank (0 = common ..= 4 = legendary)
pub fn roll_rarity_rank(bias: f32, rng: &mut impl Rng) -> usize {
    let weights = rarity_weights(bias);
    let total: f32 = weights.iter().sum();
    let mut r = rng.random::<f32>() * total;
    for (rank, weight) in weights.iter().enumerate() {
        if r < *weight {
            return rank;
        }
        r -= weight;
    }
    weights.len() - 1
}

/// Uniform pick among entries of exactly `rank`
fn pick_by_rank(rarities: &[Rarity], rank: usize, rng: &mut impl Rng) -> Option<usize> {
    let matching: Vec<usize> = rarities
        .iter()
        .enumerate()
        .filter(|(_, rarity)| rarity.rank() == rank)
        .map(|(i, _)| i)
        .collect();
    if matching.is_empty() {
        return None;
    }
    Some(matching[rng.random_range(0..matching.len())])
}

/// Biased pick with rank-down fallback, then a uniform pick
fn roll_biased(rarities: &[Rarity], bias: f32, rng: &mut impl Rng) -> Option<usize> {
    if rarities.is_empty() {
        return None;
    }
    let rank = roll_rarity_rank(bias, rng);
    (0..=rank)
        .rev()
        .find_map(|r| pick_by_rank(rarities, r, rng))
        .or_else(|| Some(rng.random_range(0..rarities.len())))
}

fn item_rarities(catalog: &Catalog) -> Vec<Rarity> {
    catalog.items().iter().map(|item| item.rarity).collect()
}

fn weapon_rarities(catalog: &Catalog) -> Vec<Rarity> {
    catalog.weapons().iter().map(|weapon| weapon.rarity).collect()
}

pub fn roll_item(world: &mut World) -> Option<usize> {
    let bias = world.player.effects.rarity_bias;
    roll_biased(&item_rarities(&world.catalog), bias, &mut world.rng)
}

pub fn roll_weapon(world: &mut World) -> Option<usize> {
    let bias = world.player.effects.rarity_bias;
    roll_biased(&weapon_rarities(&world.catalog), bias, &mut world.rng)
}

/// Number of catalog weapons the player could take right now
pub fn allowed_weapon_count(world: &World) -> usize {
    (0..world.catalog.weapons().len())
        .filter(|&i| world.player.weapon_choice_allowed(i))
        .count()
}

/// Biased weapon roll limited to weapons the player could take
///
/// A bounded number of biased rolls is tried first, then a uniform pick
/// over the allowed weapons.
pub fn roll_weapon_filtered(world: &mut World) -> Option<usize> {
    let rarities = weapon_rarities(&world.catalog);
    let bias = world.player.effects.rarity_bias;
    for _ in 0..rarities.len() * 2 + 5 {
        let Some(i) = roll_biased(&rarities, bias, &mut world.rng) else {
            break;
        };
        if world.player.weapon_choice_allowed(i) {
            return Some(i);
        }
    }
    let allowed: Vec<usize> = (0..rarities.len())
        .filter(|&i| world.player.weapon_choice_allowed(i))
        .collect();
    if allowed.is_empty() {
        return None;
    }
    Some(allowed[world.rng.random_range(0..allowed.len())])
}

fn offer(world: &mut World, choice: Option<RewardChoice>) -> bool {
    match choice {
        Some(choice) if !world.choices.contains(&choice) => {
            world.choices.push(choice);
            true
        }
        _ => false,
    }
}

/// Fill `world.choices` with up to three distinct offers
///
/// Two thirds of attempts roll an item and one third a weapon; a weapon
/// roll that fails or repeats falls back to an item.
pub fn build_levelup_choices(world: &mut World) {
    world.choices.clear();
    let has_items = !world.catalog.items().is_empty();
    let has_weapons = !world.catalog.weapons().is_empty();
    if !has_items && !has_weapons {
        log::debug!("Level up choices skipped: no items or weapons");
        return;
    }
    let weapons_available = allowed_weapon_count(world) > 0;

    let mut attempts = 0;
    while world.choices.len() < LEVELUP_CHOICES && attempts < LEVELUP_ATTEMPTS {
        attempts += 1;
        let roll = world.rng.random_range(0..3);
        if roll < 2 && has_items {
            let item = roll_item(world).map(RewardChoice::Item);
            offer(world, item);
        } else if has_weapons && weapons_available {
            let weapon = roll_weapon_filtered(world).map(RewardChoice::Weapon);
            if !offer(world, weapon) && has_items {
                let item = roll_item(world).map(RewardChoice::Item);
                offer(world, item);
            }
        } else if has_items {
            let item = roll_item(world).map(RewardChoice::Item);
            offer(world, item);
        }
    }
    log::debug!("Level up choices: {:?}", world.choices);
}

/// Up to three distinct legendary items for a boss victory
pub fn build_boss_reward_choices(world: &mut World) {
    world.choices.clear();
    let mut legendaries: Vec<usize> = world
        .catalog
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| item.rarity == Rarity::Legendary)
        .map(|(i, _)| i)
        .collect();
    legendaries.shuffle(&mut world.rng);
    world.choices.extend(
        legendaries
            .into_iter()
            .take(LEVELUP_CHOICES)
            .map(RewardChoice::Item),
    );
    log::debug!("Boss reward choices: {:?}", world.choices);
}

/// Apply one offer; returns whether the player changed
fn grant(world: &mut World, catalog: &Catalog, choice: RewardChoice) -> bool {
    match choice {
        RewardChoice::Item(item) => {
            if catalog.item(item).is_none() || !world.player.apply_item(item, catalog) {
                return false;
            }
            world.last_item_index = Some(item);
            world.trigger_item_popup(item);
            world.push_event(GameEvent::ItemPicked { item });
            true
        }
        RewardChoice::Weapon(weapon) => {
            let changed = world.player.equip_weapon(weapon, catalog);
            if changed {
                let level = world.player.weapon_level(weapon).unwrap_or(1);
                world.push_event(GameEvent::WeaponEquipped { weapon, level });
            }
            changed
        }
    }
}

/// Take offer `index` and resume the wave
///
/// Ignored outside the reward screen or for an index with no offer.
pub fn choose(world: &mut World, index: usize) -> bool {
    if world.mode != GameMode::LevelUp {
        return false;
    }
    let Some(&choice) = world.choices.get(index) else {
        return false;
    };
    let catalog = Arc::clone(&world.catalog);
    grant(world, &catalog, choice);
    log::debug!("Reward chosen: {:?}", choice);
    world.choices.clear();
    world.mode = GameMode::Wave;
    true
}

/// Spend a reroll to replace every offer
pub fn reroll(world: &mut World) -> bool {
    if world.mode != GameMode::LevelUp || world.rerolls == 0 {
        return false;
    }
    world.rerolls -= 1;
    build_levelup_choices(world);
    log::debug!("Rerolled, {} left", world.rerolls);
    true
}

/// Grant one to three of the current offers at once, once per run
///
/// Offers are taken in random order. Weapons already at max level are
/// skipped, and new weapons only while slots remain. Returns the choice
/// indices that actually changed the player.
pub fn high_roll(world: &mut World) -> Vec<usize> {
    if world.mode != GameMode::LevelUp || world.high_roll_used || world.choices.is_empty() {
        return Vec::new();
    }
    world.high_roll_used = true;

    let count = world.choices.len();
    let grants = (1 + world.rng.random_range(0..3)).min(count);
    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(&mut world.rng);

    let mut free_slots = world.player.free_weapon_slots();
    let mut selected = Vec::with_capacity(grants);
    for &i in &order {
        if selected.len() >= grants {
            break;
        }
        match world.choices[i] {
            RewardChoice::Item(_) => selected.push(i),
            RewardChoice::Weapon(weapon) => match world.player.weapon_level(weapon) {
                Some(level) if level < MAX_WEAPON_LEVEL => selected.push(i),
                Some(_) => {}
                None if free_slots > 0 => {
                    selected.push(i);
                    free_slots -= 1;
                }
                None => {}
            },
        }
    }

    let catalog = Arc::clone(&world.catalog);
    let applied: Vec<usize> = selected
        .into_iter()
        .filter(|&i| {
            let choice = world.choices[i];
            grant(world, &catalog, choice)
        })
        .collect();
    log::debug!("High roll granted {} of {} offers", applied.len(), grants);
    world.choices.clear();
    world.mode = GameMode::Wave;
    applied
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::catalog::{CatalogData, ItemDef, WeaponDef};
    use crate::consts::MAX_WEAPON_SLOTS;

    fn world() -> World {
        let mut w = World::with_seed(Arc::new(Catalog::builtin().unwrap()), 9);
        w.mode = GameMode::LevelUp;
        w
    }

    fn rank_frequencies(bias: f32) -> [f32; 5] {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut counts = [0u32; 5];
        let n = 60_000;
        for _ in 0..n {
            counts[roll_rarity_rank(bias, &mut rng)] += 1;
        }
        counts.map(|c| c as f32 / n as f32)
    }

    #[test]
    fn test_unbiased_rarity_matches_weights() {
        let freq = rank_frequencies(0.0);
        let total: f32 = RARITY_WEIGHTS.iter().sum();
        for (rank, f) in freq.iter().enumerate() {
            let expected = RARITY_WEIGHTS[rank] / total;
            assert!((f - expected).abs() < 0.01, "rank {rank}: {f} vs {expected}");
        }
    }

    #[test]
    fn test_bias_shifts_toward_rare() {
        let plain = rank_frequencies(0.0);
        let biased = rank_frequencies(0.9);
        assert!(biased[0] < plain[0]);
        assert!(biased[1] < plain[1]);
        assert!(biased[3] > plain[3]);
        assert!(biased[4] > plain[4]);
    }

    #[test]
    fn test_empty_rank_falls_back() {
        let mut rng = Pcg32::seed_from_u64(1);
        let only_common = [Rarity::Common, Rarity::Common];
        for _ in 0..100 {
            assert!(roll_biased(&only_common, 0.9, &mut rng).is_some());
        }
        let only_legendary = [Rarity::Legendary];
        for _ in 0..100 {
            assert_eq!(roll_biased(&only_legendary, 0.0, &mut rng), Some(0));
        }
        assert_eq!(roll_biased(&[], 0.0, &mut rng), None);
    }

    #[test]
    fn test_levelup_choices_are_distinct() {
        let mut w = world();
        for _ in 0..50 {
            build_levelup_choices(&mut w);
            assert_eq!(w.choices.len(), LEVELUP_CHOICES);
            for (i, a) in w.choices.iter().enumerate() {
                assert!(!w.choices[i + 1..].contains(a));
            }
        }
    }

    #[test]
    fn test_no_unequippable_weapon_offers() {
        let mut w = world();
        let catalog = Arc::clone(&w.catalog);
        for i in 0..MAX_WEAPON_SLOTS {
            w.player.equip_weapon(i, &catalog);
            for _ in 1..MAX_WEAPON_LEVEL {
                w.player.equip_weapon(i, &catalog);
            }
        }
        assert_eq!(allowed_weapon_count(&w), 0);
        for _ in 0..30 {
            build_levelup_choices(&mut w);
            assert!(
                w.choices
                    .iter()
                    .all(|c| matches!(c, RewardChoice::Item(_)))
            );
        }
    }

    #[test]
    fn test_empty_catalog_offers_nothing() {
        let catalog = Catalog::from_data(CatalogData::default()).unwrap();
        let mut w = World::with_seed(Arc::new(catalog), 2);
        build_levelup_choices(&mut w);
        assert!(w.choices.is_empty());
    }

    #[test]
    fn test_choose_item_and_return_to_wave() {
        let mut w = world();
        w.choices = vec![RewardChoice::Item(0)];
        assert!(choose(&mut w, 0));
        assert_eq!(w.mode, GameMode::Wave);
        assert_eq!(w.player.passive_items, vec![0]);
        assert_eq!(w.last_item_index, Some(0));
        assert!(w.item_popup_timer > 0.0);
        assert_eq!(w.drain_events(), vec![GameEvent::ItemPicked { item: 0 }]);
        assert!(!choose(&mut w, 0));
    }

    #[test]
    fn test_choose_weapon_upgrades_owned() {
        let mut w = world();
        let catalog = Arc::clone(&w.catalog);
        w.player.equip_weapon(2, &catalog);
        w.choices = vec![RewardChoice::Weapon(2)];
        assert!(choose(&mut w, 0));
        assert_eq!(w.player.weapon_level(2), Some(2));
    }

    #[test]
    fn test_reroll_spends_budget() {
        let mut w = world();
        w.rerolls = 1;
        assert!(reroll(&mut w));
        assert_eq!(w.rerolls, 0);
        assert_eq!(w.choices.len(), LEVELUP_CHOICES);
        assert!(!reroll(&mut w));
    }

    #[test]
    fn test_high_roll_once_and_reports_applied() {
        let mut w = world();
        build_levelup_choices(&mut w);
        let offered = w.choices.clone();
        let applied = high_roll(&mut w);
        assert!(!applied.is_empty() && applied.len() <= 3);
        assert!(applied.iter().all(|&i| i < offered.len()));
        assert!(w.high_roll_used);
        assert_eq!(w.mode, GameMode::Wave);

        w.mode = GameMode::LevelUp;
        build_levelup_choices(&mut w);
        assert!(high_roll(&mut w).is_empty());
    }

    #[test]
    fn test_high_roll_skips_maxed_weapon() {
        let data = CatalogData {
            weapons: vec![WeaponDef {
                id: "pistol".to_string(),
                name: "Pistol".to_string(),
                ..Default::default()
            }],
            items: vec![ItemDef {
                id: "ring".to_string(),
                name: "Ring".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut w = World::with_seed(Arc::new(Catalog::from_data(data).unwrap()), 4);
        let catalog = Arc::clone(&w.catalog);
        for _ in 0..MAX_WEAPON_LEVEL {
            w.player.equip_weapon(0, &catalog);
        }
        w.mode = GameMode::LevelUp;
        w.choices = vec![RewardChoice::Weapon(0)];
        assert!(high_roll(&mut w).is_empty());
        assert_eq!(w.player.weapon_level(0), Some(MAX_WEAPON_LEVEL));
    }

    #[test]
    fn test_boss_rewards_are_legendary() {
        let mut w = world();
        build_boss_reward_choices(&mut w);
        assert!(!w.choices.is_empty() && w.choices.len() <= LEVELUP_CHOICES);
        for choice in &w.choices {
            let RewardChoice::Item(i) = *choice else {
                panic!("boss rewards are items");
            };
            assert_eq!(w.catalog.items()[i].rarity, Rarity::Legendary);
        }
    }

    proptest! {
        #[test]
        fn prop_high_roll_fills_only_free_slot(seed in any::<u64>()) {
            let mut w = World::with_seed(Arc::new(Catalog::builtin().unwrap()), seed);
            let catalog = Arc::clone(&w.catalog);
            for weapon in 0..MAX_WEAPON_SLOTS - 1 {
                w.player.equip_weapon(weapon, &catalog);
            }
            w.mode = GameMode::LevelUp;
            w.choices = vec![
                RewardChoice::Weapon(MAX_WEAPON_SLOTS),
                RewardChoice::Weapon(MAX_WEAPON_SLOTS + 1),
                RewardChoice::Weapon(MAX_WEAPON_SLOTS + 2),
            ];

            let applied = high_roll(&mut w);
            prop_assert_eq!(applied.len(), 1);
            prop_assert_eq!(w.player.free_weapon_slots(), 0);
            prop_assert_eq!(w.mode, GameMode::Wave);
        }
    }
}
