// g_local.rs — entity model, level state and shared weapon definitions

use std::fmt;

use rand::RngCore;

use myq2_common::q_shared::{Contents, Vec3};

use crate::dispatch::Projectile;
use crate::g_combat::{damage_batch, Combat, DamageEvent, RadiusDamage};
use crate::g_config::WeaponConfig;
use crate::g_utils::Edicts;
use crate::game_import::GameImport;

// ============================================================
// Constants
// ============================================================

/// Length of one server frame in seconds.
pub const FRAMETIME: f32 = 0.1;

pub const MAX_EDICTS: usize = 1024;

/// Seconds a freed slot stays unused before it may be handed out again.
pub const FREED_SLOT_DELAY: f32 = 0.5;

// ============================================================
// Entity identity
// ============================================================

/// Handle to an arena slot. The generation changes every time the slot is
/// freed, so a handle kept across a free never resolves to the slot's next tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// The world entity. Never freed.
    pub const WORLD: EntityId = EntityId { index: 0, generation: 0 };

    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub fn is_world(self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

// ============================================================
// Errors
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeaponError {
    /// Every slot up to `MAX_EDICTS` is live or was freed too recently.
    NoFreeEdicts,
    /// The handle refers to a freed (or reused) slot.
    StaleEntity(EntityId),
}

impl fmt::Display for WeaponError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaponError::NoFreeEdicts => write!(f, "ED_Alloc: no free edicts"),
            WeaponError::StaleEntity(id) => write!(f, "stale entity handle {}", id),
        }
    }
}

impl std::error::Error for WeaponError {}

// ============================================================
// Enums
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveType {
    #[default]
    None,
    Noclip,
    Push,
    Stop,
    Walk,
    Step,
    Fly,
    Toss,
    FlyMissile,
    Bounce,
    WallBounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Solid {
    #[default]
    Not,
    Trigger,
    Bbox,
    Bsp,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ServerFlags: i32 {
        const DEADMONSTER = 0x00000002;
        const MONSTER     = 0x00000004;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EntityFlags: i32 {
        const IMMUNE_LASER      = 0x00000004;
        /// physics lets the projectile pass through players
        const NOCLIP_PROJECTILE = 0x00002000;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DamageFlags: i32 {
        /// damage was indirect
        const RADIUS        = 0x00000001;
        const NO_ARMOR      = 0x00000002;
        /// damage is from an energy based weapon
        const ENERGY        = 0x00000004;
        const NO_KNOCKBACK  = 0x00000008;
        /// damage is from a bullet (used for ricochets)
        const BULLET        = 0x00000010;
        const NO_PROTECTION = 0x00000020;
    }
}
pub const DAMAGE_RADIUS: DamageFlags = DamageFlags::RADIUS;
pub const DAMAGE_ENERGY: DamageFlags = DamageFlags::ENERGY;
pub const DAMAGE_BULLET: DamageFlags = DamageFlags::BULLET;

/// Means of death, carried by every damage event for obituaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MeansOfDeath {
    Unknown = 0,
    Blaster = 1,
    Shotgun = 2,
    Sshotgun = 3,
    Machinegun = 4,
    Chaingun = 5,
    Grenade = 6,
    GSplash = 7,
    Rocket = 8,
    RSplash = 9,
    Hyperblaster = 10,
    Railgun = 11,
    BfgLaser = 12,
    BfgBlast = 13,
    BfgEffect = 14,
    Handgrenade = 15,
    HgSplash = 16,
    HeldGrenade = 24,
    Explosive = 25,
    Ripper = 34,
    Phalanx = 35,
    Trap = 39,
    Ripperself = 40,
    PSplash = 41,
    TrapSplash = 42,
    TrapExplode = 43,
    HeldTrap = 44,
}

// ============================================================
// Entity state
// ============================================================

/// Networked part of an entity.
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub origin: Vec3,
    pub angles: Vec3,
    pub old_origin: Vec3,
    pub modelindex: i32,
    pub frame: i32,
    pub skinnum: i32,
    pub effects: u32,
    pub renderfx: i32,
    pub sound: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Edict {
    pub s: EntityState,
    pub inuse: bool,
    pub(crate) generation: u32,
    pub classname: String,

    pub svflags: ServerFlags,
    pub flags: EntityFlags,
    pub solid: Solid,
    pub movetype: MoveType,
    pub clipmask: Contents,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub absmin: Vec3,
    pub absmax: Vec3,
    pub size: Vec3,

    pub velocity: Vec3,
    pub avelocity: Vec3,
    pub ideal_yaw: f32,
    pub viewheight: i32,

    /// Controlled player slot, if any.
    pub client: Option<usize>,
    pub owner: Option<EntityId>,
    /// Who gets credit for kills after `owner` has been reassigned.
    pub obitowner: Option<EntityId>,
    pub enemy: Option<EntityId>,
    pub groundentity: Option<EntityId>,

    pub takedamage: bool,
    pub health: i32,
    pub mass: i32,
    pub count: i32,
    pub dead: bool,
    pub waterlevel: i32,

    pub dmg: i32,
    pub radius_dmg: i32,
    pub dmg_radius: f32,
    pub spawnflags: i32,

    pub nextthink: f32,
    pub timestamp: f32,
    pub wait: f32,
    pub delay: f32,
    pub freetime: f32,
    /// Level time until which this entity carries quad damage.
    pub quad_until: f32,

    /// Weapon behaviour driving touch and think. `None` for plain entities.
    pub projectile: Option<Projectile>,
}

impl Edict {
    pub fn is_monster(&self) -> bool {
        self.svflags.contains(ServerFlags::MONSTER)
    }

    pub fn is_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn on_ground(&self) -> bool {
        self.groundentity.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LevelLocals {
    pub framenum: i32,
    pub time: f32,
}

// ============================================================
// Game context
// ============================================================

/// Everything a fire/touch/think call needs, borrowed for the duration of one call.
pub struct GameContext<'a> {
    pub edicts: &'a mut Edicts,
    pub level: &'a mut LevelLocals,
    pub gi: &'a mut dyn GameImport,
    pub combat: &'a mut dyn Combat,
    pub cfg: &'a WeaponConfig,
    pub rng: &'a mut dyn RngCore,
}

/// Damage calls inside one open begin/end pair. See [`GameContext::damage_batch`].
pub struct DamageScope<'s> {
    edicts: &'s mut Edicts,
    gi: &'s dyn GameImport,
    combat: &'s mut dyn Combat,
}

impl DamageScope<'_> {
    pub fn t_damage(&mut self, ev: DamageEvent) {
        self.combat.t_damage(self.edicts, &ev);
    }

    pub fn t_radius_damage(&mut self, rd: RadiusDamage) {
        self.combat.t_radius_damage(self.gi, self.edicts, &rd);
    }
}

impl GameContext<'_> {
    /// Run `f` as a single damage batch, so a detonation's direct hit and
    /// splash are flushed together.
    pub fn damage_batch<R>(&mut self, f: impl FnOnce(&mut DamageScope<'_>) -> R) -> R {
        let edicts = &mut *self.edicts;
        let gi = &*self.gi;
        damage_batch(&mut *self.combat, |combat| f(&mut DamageScope { edicts, gi, combat }))
    }

    /// Direct damage, bracketed as its own damage batch.
    pub fn t_damage(&mut self, ev: DamageEvent) {
        self.damage_batch(|d| d.t_damage(ev));
    }

    /// Radius damage, bracketed as its own damage batch.
    pub fn t_radius_damage(&mut self, rd: RadiusDamage) {
        self.damage_batch(|d| d.t_radius_damage(rd));
    }

    pub fn sound(&mut self, ent: EntityId, channel: i32, name: &str, attenuation: f32) {
        let index = self.gi.soundindex(name);
        self.gi.sound(ent, channel, index, 1.0, attenuation, 0.0);
    }

    /// True while the entity's owner-for-credit holds quad damage.
    pub fn is_quadded(&self, ent: EntityId) -> bool {
        let time = self.level.time;
        self.edicts
            .get(ent)
            .and_then(|e| e.obitowner)
            .and_then(|o| self.edicts.get(o))
            .map(|o| o.quad_until > time)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_world() {
        assert!(EntityId::WORLD.is_world());
        assert_eq!(EntityId::WORLD.index(), 0);
        assert!(!EntityId::new(3, 1).is_world());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(WeaponError::NoFreeEdicts.to_string(), "ED_Alloc: no free edicts");
        let id = EntityId::new(7, 2);
        assert_eq!(WeaponError::StaleEntity(id).to_string(), "stale entity handle #7v2");
    }

    #[test]
    fn test_damage_flag_values() {
        assert_eq!(DAMAGE_RADIUS.bits(), 1);
        assert_eq!(DAMAGE_ENERGY.bits(), 4);
        assert_eq!(DAMAGE_BULLET.bits(), 0x10);
    }

    #[test]
    fn test_means_of_death_codes() {
        assert_eq!(MeansOfDeath::Blaster as i32, 1);
        assert_eq!(MeansOfDeath::HeldGrenade as i32, 24);
        assert_eq!(MeansOfDeath::Trap as i32, 39);
    }
}
