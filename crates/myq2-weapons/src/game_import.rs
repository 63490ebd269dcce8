//! Game import interface: services the engine provides to the weapon code.
//!
//! The engine owns collision, entity linking, asset registries and the
//! broadcast channel. Weapon code only reaches them through this trait.

use myq2_common::q_shared::{
    CPlane, CSurface, Contents, Multicast, Splash, TempEvent, Vec3, SVC_TEMP_ENTITY,
};

use crate::g_local::EntityId;

/// Result of a single trace. `ent` is `None` (or the world) when nothing owned was hit.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub allsolid: bool,
    pub startsolid: bool,
    /// 1.0 = didn't hit anything
    pub fraction: f32,
    pub endpos: Vec3,
    pub plane: CPlane,
    pub surface: Option<CSurface>,
    pub contents: Contents,
    pub ent: Option<EntityId>,
}

impl Trace {
    /// A trace that ran its full length.
    pub fn clear(end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            endpos: end,
            ..Default::default()
        }
    }

    pub fn hit_sky(&self) -> bool {
        self.surface.as_ref().is_some_and(|s| s.is_sky())
    }
}

/// Wall impact puffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactKind {
    Gunshot,
    Shotgun,
    Blaster,
    Flechette,
}

impl ImpactKind {
    pub fn event(self) -> TempEvent {
        match self {
            ImpactKind::Gunshot => TempEvent::Gunshot,
            ImpactKind::Shotgun => TempEvent::Shotgun,
            ImpactKind::Blaster => TempEvent::Blaster,
            ImpactKind::Flechette => TempEvent::Flechette,
        }
    }
}

/// Position-only blasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplosionKind {
    Explosion1,
    Rocket,
    RocketWater,
    Grenade,
    GrenadeWater,
    Plasma,
    Bfg,
    BfgBig,
}

impl ExplosionKind {
    pub fn event(self) -> TempEvent {
        match self {
            ExplosionKind::Explosion1 => TempEvent::Explosion1,
            ExplosionKind::Rocket => TempEvent::RocketExplosion,
            ExplosionKind::RocketWater => TempEvent::RocketExplosionWater,
            ExplosionKind::Grenade => TempEvent::GrenadeExplosion,
            ExplosionKind::GrenadeWater => TempEvent::GrenadeExplosionWater,
            ExplosionKind::Plasma => TempEvent::PlasmaExplosion,
            ExplosionKind::Bfg => TempEvent::BfgExplosion,
            ExplosionKind::BfgBig => TempEvent::BfgBigexplosion,
        }
    }
}

/// A one-shot effect broadcast to clients.
#[derive(Debug, Clone, PartialEq)]
pub enum TempEntity {
    Impact { kind: ImpactKind, pos: Vec3, normal: Vec3 },
    Splash { count: u8, pos: Vec3, normal: Vec3, color: Splash },
    BubbleTrail { start: Vec3, end: Vec3 },
    RailTrail { start: Vec3, end: Vec3 },
    Explosion { kind: ExplosionKind, pos: Vec3 },
    BfgLaser { start: Vec3, end: Vec3 },
    LaserSparks { count: u8, pos: Vec3, normal: Vec3, color: u8 },
    WeldingSparks { count: u8, pos: Vec3, normal: Vec3, color: u8 },
}

impl TempEntity {
    pub fn event(&self) -> TempEvent {
        match self {
            TempEntity::Impact { kind, .. } => kind.event(),
            TempEntity::Splash { .. } => TempEvent::Splash,
            TempEntity::BubbleTrail { .. } => TempEvent::Bubbletrail,
            TempEntity::RailTrail { .. } => TempEvent::Railtrail,
            TempEntity::Explosion { kind, .. } => kind.event(),
            TempEntity::BfgLaser { .. } => TempEvent::BfgLaser,
            TempEntity::LaserSparks { .. } => TempEvent::LaserSparks,
            TempEntity::WeldingSparks { .. } => TempEvent::WeldingSparks,
        }
    }

    /// Encode the message body: `svc_temp_entity`, the event code, then the payload.
    pub fn write<G: GameImport + ?Sized>(&self, gi: &mut G) {
        gi.write_byte(SVC_TEMP_ENTITY as i32);
        gi.write_byte(self.event() as i32);
        match self {
            TempEntity::Impact { pos, normal, .. } => {
                gi.write_position(pos);
                gi.write_dir(normal);
            }
            TempEntity::Splash { count, pos, normal, color } => {
                gi.write_byte(*count as i32);
                gi.write_position(pos);
                gi.write_dir(normal);
                gi.write_byte(*color as i32);
            }
            TempEntity::BubbleTrail { start, end }
            | TempEntity::RailTrail { start, end }
            | TempEntity::BfgLaser { start, end } => {
                gi.write_position(start);
                gi.write_position(end);
            }
            TempEntity::Explosion { pos, .. } => gi.write_position(pos),
            TempEntity::LaserSparks { count, pos, normal, color }
            | TempEntity::WeldingSparks { count, pos, normal, color } => {
                gi.write_byte(*count as i32);
                gi.write_position(pos);
                gi.write_dir(normal);
                gi.write_byte(*color as i32);
            }
        }
    }
}

/// Game import interface: functions provided by the engine to the weapon code.
pub trait GameImport {
    // Collision
    fn trace(
        &self,
        start: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        end: &Vec3,
        passent: Option<EntityId>,
        contentmask: Contents,
    ) -> Trace;
    /// Lag-compensated trace that rewinds entity positions based on attacker's ping.
    /// Falls back to regular trace if lag compensation is disabled.
    fn lag_compensated_trace(
        &self,
        start: &Vec3,
        mins: &Vec3,
        maxs: &Vec3,
        end: &Vec3,
        passent: Option<EntityId>,
        contentmask: Contents,
        _attacker: EntityId,
    ) -> Trace {
        self.trace(start, mins, maxs, end, passent, contentmask)
    }
    fn pointcontents(&self, point: &Vec3) -> Contents;
    fn linkentity(&mut self, ent: EntityId);
    fn unlinkentity(&mut self, ent: EntityId);

    // Indexing
    fn modelindex(&mut self, name: &str) -> i32;
    fn soundindex(&mut self, name: &str) -> i32;

    // Sound
    fn sound(&mut self, ent: EntityId, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32);

    // Network messaging
    fn write_byte(&mut self, c: i32);
    fn write_position(&mut self, pos: &Vec3);
    fn write_dir(&mut self, dir: &Vec3);
    fn multicast(&mut self, origin: &Vec3, to: Multicast);

    /// Write a temp entity message and send it to everyone in range of `origin`.
    fn temp_entity(&mut self, te: &TempEntity, origin: &Vec3, to: Multicast) {
        te.write(self);
        self.multicast(origin, to);
    }
}
