#![allow(clippy::too_many_arguments, clippy::float_cmp)]
// Weapon module: hit-scan weapons, projectiles and the trap

pub mod g_local;
pub mod g_utils;
pub mod game_import;
pub mod g_combat;
pub mod g_config;
pub mod g_weapon;
pub mod g_trap;
pub mod dispatch;

#[cfg(test)]
mod testing;

pub use dispatch::{die, pain, run_frame, run_think, touch, BfgPhase, Projectile};
pub use g_combat::{Combat, DamageEvent, RadiusDamage};
pub use g_config::WeaponConfig;
pub use g_local::{DamageScope, Edict, EntityId, GameContext, LevelLocals, MeansOfDeath, WeaponError};
pub use g_trap::{fire_trap, TrapState};
pub use g_utils::Edicts;
pub use g_weapon::{
    fire_bfg, fire_blaster, fire_bullet, fire_grenade, fire_grenade2, fire_rail, fire_rocket, fire_shotgun,
};
#[cfg(feature = "xatrix")]
pub use g_weapon::{fire_ionripper, fire_plasma};
pub use game_import::{GameImport, TempEntity, Trace};
