//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering or platform dependencies

/// Per-hit trace line under the `combat` target, muted by `log_combat`
macro_rules! combat_log {
    ($world:expr, $($arg:tt)*) => {
        if $world.settings.log_combat {
            log::trace!(target: "combat", "[{:.2}] {}", $world.game_time, format_args!($($arg)*));
        }
    };
}

pub mod boss;
pub mod combat;
pub mod enemies;
pub mod geometry;
pub mod pickups;
pub mod pool;
pub mod projectiles;
pub mod rewards;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod status;
pub mod tick;
pub mod weapons;

pub use boss::{end_boss_event, start_boss_event};
pub use pool::Pool;
pub use rewards::{RewardChoice, choose, high_roll, reroll};
pub use snapshot::{WaveSnapshot, restore_snapshot, save_snapshot};
pub use state::{
    Boss, Bullet, Drop, DropKind, Encounter, Enemy, FxKind, GameEvent, GameMode, Player, Puddle,
    WeaponFx, World,
};
pub use stats::{ItemEffects, Stats};
pub use status::{Debuffs, StatusChances};
pub use tick::{TickInput, activate_ultimate, start_run, tick};
pub use weapons::{WeaponBehavior, WeaponSlot};
