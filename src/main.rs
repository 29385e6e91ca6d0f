//! Arena Survivor headless driver
//!
//! Runs one scripted run against the built-in catalog and logs a summary.
//! Usage: `arena-survivor [seed] [seconds] [character]`

use std::sync::Arc;

use arena_survivor::consts::*;
use arena_survivor::persistence;
use arena_survivor::sim::{GameEvent, GameMode, TickInput, World, choose, high_roll, start_run, tick};
use arena_survivor::{Catalog, SimSettings, SkillTree};

/// Host frame length; the simulation substeps inside it
const FRAME_DT: f32 = 1.0 / 30.0;
/// Seconds between direction changes of the scripted walk
const TURN_INTERVAL: f32 = 2.0;
/// Game time at which the script requests a boss encounter
const BOSS_AT: f32 = 60.0;

/// Host-side loop state
struct Game {
    world: World,
    accumulator: f32,
    elapsed: f32,
}

impl Game {
    fn new(world: World) -> Self {
        Self {
            world,
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Scripted input for the current moment
    fn input(&self) -> TickInput {
        let heading = (self.elapsed / TURN_INTERVAL) as u32 % 4;
        TickInput {
            up: heading == 0,
            right: heading == 1,
            down: heading == 2,
            left: heading == 3,
            ultimate: self.world.ultimate_cd <= 0.0 && self.world.enemies.active_count() > 20,
            trigger_boss: self.world.boss_victories == 0 && self.world.game_time >= BOSS_AT,
            ..Default::default()
        }
    }

    /// Advance one host frame with fixed substeps
    fn frame(&mut self) {
        self.accumulator += FRAME_DT;
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            let input = self.input();
            tick(&mut self.world, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            steps += 1;
            self.resolve_rewards();
        }
        if steps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }
        self.elapsed += FRAME_DT;

        for event in self.world.drain_events() {
            log::debug!("Event: {:?}", event);
            if let GameEvent::ItemPicked { item } = event {
                log::info!("Picked {}", self.world.catalog.item_name(item));
            }
        }
    }

    /// Take the high roll once, then always the first offer
    fn resolve_rewards(&mut self) {
        if self.world.mode != GameMode::LevelUp {
            return;
        }
        if !self.world.high_roll_used && self.world.level >= 5 {
            let applied = high_roll(&mut self.world);
            log::info!("High roll applied {} rewards", applied.len());
        } else if !choose(&mut self.world, 0) {
            log::warn!("No reward could be applied, skipping");
            self.world.choices.clear();
            self.world.mode = GameMode::Wave;
        }
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(180.0);
    let character = args.next().unwrap_or_else(|| "knight".to_string());

    let catalog = match Catalog::builtin() {
        Ok(catalog) => Arc::new(catalog),
        Err(err) => {
            log::error!("Built-in catalog failed to load: {err}");
            std::process::exit(1);
        }
    };
    let settings = match std::env::var("ARENA_SETTINGS") {
        Ok(path) => std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|json| SimSettings::from_json(&json).map_err(|err| err.to_string()))
            .unwrap_or_else(|err| {
                log::warn!("Ignoring settings from {path}: {err}");
                SimSettings::default()
            }),
        Err(_) => SimSettings::default(),
    };

    let mut tree = SkillTree::new();
    let character_index = catalog.characters().iter().position(|c| c.id == character);
    if character_index.is_none() {
        log::warn!("Unknown character '{character}', starting without one");
    }

    log::info!("Arena Survivor (headless) starting with seed {seed}");
    let mut world = World::new(catalog, settings, seed);
    start_run(&mut world, character_index, tree.bonuses());

    let mut game = Game::new(world);
    while game.elapsed < seconds && game.world.mode != GameMode::GameOver {
        game.frame();
    }

    let world = &game.world;
    log::info!(
        "Run finished: {:?}, level {}, {} kills, {} boss wins, {:.0}s survived, {:.0}/{:.0} hp",
        world.mode,
        world.level,
        world.kills,
        world.boss_victories,
        world.game_time,
        world.player.hp.max(0.0),
        world.player.total_stats().max_hp
    );

    tree.award(world.meta_points());
    match persistence::save(&tree) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Could not encode progress: {err}"),
    }
}
