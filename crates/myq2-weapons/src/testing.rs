// testing.rs — scripted world and damage recorder for unit tests

use rand::rngs::StdRng;
use rand::SeedableRng;

use myq2_common::q_shared::{
    CPlane, CSurface, Contents, Multicast, SurfaceFlags, Vec3,
};

use crate::g_combat::{Combat, DamageEvent};
use crate::g_config::WeaponConfig;
use crate::g_local::{EntityId, GameContext, LevelLocals, ServerFlags, Solid};
use crate::g_utils::Edicts;
use crate::game_import::{GameImport, TempEntity, Trace};

/// One call into the message writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Wire {
    Byte(i32),
    Position(Vec3),
    Dir(Vec3),
    Multicast(Vec3, Multicast),
}

/// An infinite plane `origin[axis] == at` that stops traces crossing it.
#[derive(Debug, Clone)]
pub struct Wall {
    pub axis: usize,
    pub at: f32,
    pub contents: Contents,
    pub surface: Option<CSurface>,
    /// Owning entity; `None` for world geometry.
    pub ent: Option<EntityId>,
}

/// Axis aligned box answering point-contents queries.
#[derive(Debug, Clone)]
pub struct Volume {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub contents: Contents,
}

#[derive(Debug, Default)]
pub struct FakeWorld {
    pub walls: Vec<Wall>,
    pub volumes: Vec<Volume>,

    pub wire: Vec<Wire>,
    pub temp_entities: Vec<(TempEntity, Multicast)>,
    pub sounds: Vec<(EntityId, i32, String)>,
    pub linked: Vec<EntityId>,
    pub unlinked: Vec<EntityId>,
    pub models: Vec<String>,
    pub sound_names: Vec<String>,
}

impl FakeWorld {
    pub fn add_wall(&mut self, axis: usize, at: f32) {
        self.walls.push(Wall {
            axis,
            at,
            contents: Contents::SOLID,
            surface: Some(CSurface::named("e1u1/metal1_1", SurfaceFlags::empty())),
            ent: None,
        });
    }

    pub fn add_sky(&mut self, axis: usize, at: f32) {
        self.walls.push(Wall {
            axis,
            at,
            contents: Contents::SOLID,
            surface: Some(CSurface::named("sky1", SurfaceFlags::SKY)),
            ent: None,
        });
    }

    /// Collision face of an entity standing across the plane.
    pub fn add_entity_plane(&mut self, axis: usize, at: f32, ent: EntityId, contents: Contents) {
        self.walls.push(Wall {
            axis,
            at,
            contents,
            surface: None,
            ent: Some(ent),
        });
    }

    /// Liquid filling everything from the plane `at` upwards along `axis`.
    pub fn add_liquid(&mut self, axis: usize, at: f32, contents: Contents, texture: &str) {
        self.walls.push(Wall {
            axis,
            at,
            contents,
            surface: Some(CSurface::named(texture, SurfaceFlags::WARP)),
            ent: None,
        });
        let mut mins = [-1.0e6; 3];
        mins[axis] = at;
        self.volumes.push(Volume {
            mins,
            maxs: [1.0e6; 3],
            contents,
        });
    }

    pub fn temp_events(&self) -> Vec<&TempEntity> {
        self.temp_entities.iter().map(|(te, _)| te).collect()
    }

    pub fn sound_played(&self, name: &str) -> bool {
        self.sounds.iter().any(|(_, _, n)| n == name)
    }
}

impl GameImport for FakeWorld {
    fn trace(
        &self,
        start: &Vec3,
        _mins: &Vec3,
        _maxs: &Vec3,
        end: &Vec3,
        passent: Option<EntityId>,
        contentmask: Contents,
    ) -> Trace {
        let mut best: Option<(f32, &Wall)> = None;
        for wall in &self.walls {
            if !wall.contents.intersects(contentmask) {
                continue;
            }
            if wall.ent.is_some() && wall.ent == passent {
                continue;
            }
            let (s, e) = (start[wall.axis], end[wall.axis]);
            let crosses = (s < wall.at && wall.at <= e) || (s > wall.at && wall.at >= e);
            if !crosses {
                continue;
            }
            let f = (wall.at - s) / (e - s);
            if best.map_or(true, |(bf, _)| f < bf) {
                best = Some((f, wall));
            }
        }

        let Some((fraction, wall)) = best else {
            return Trace::clear(*end);
        };
        let mut endpos = [0.0; 3];
        for i in 0..3 {
            endpos[i] = start[i] + fraction * (end[i] - start[i]);
        }
        endpos[wall.axis] = wall.at;
        let mut normal = [0.0; 3];
        normal[wall.axis] = if end[wall.axis] > start[wall.axis] { -1.0 } else { 1.0 };
        Trace {
            fraction,
            endpos,
            plane: CPlane::from_normal(normal),
            surface: wall.surface.clone(),
            contents: wall.contents,
            ent: Some(wall.ent.unwrap_or(EntityId::WORLD)),
            ..Default::default()
        }
    }

    fn pointcontents(&self, point: &Vec3) -> Contents {
        self.volumes
            .iter()
            .filter(|v| (0..3).all(|i| point[i] >= v.mins[i] && point[i] <= v.maxs[i]))
            .fold(Contents::empty(), |acc, v| acc | v.contents)
    }

    fn linkentity(&mut self, ent: EntityId) {
        self.linked.push(ent);
    }

    fn unlinkentity(&mut self, ent: EntityId) {
        self.unlinked.push(ent);
    }

    fn modelindex(&mut self, name: &str) -> i32 {
        registry_index(&mut self.models, name)
    }

    fn soundindex(&mut self, name: &str) -> i32 {
        registry_index(&mut self.sound_names, name)
    }

    fn sound(&mut self, ent: EntityId, channel: i32, soundindex: i32, _volume: f32, _attenuation: f32, _timeofs: f32) {
        let name = self
            .sound_names
            .get((soundindex - 1) as usize)
            .cloned()
            .unwrap_or_default();
        self.sounds.push((ent, channel, name));
    }

    fn write_byte(&mut self, c: i32) {
        self.wire.push(Wire::Byte(c));
    }

    fn write_position(&mut self, pos: &Vec3) {
        self.wire.push(Wire::Position(*pos));
    }

    fn write_dir(&mut self, dir: &Vec3) {
        self.wire.push(Wire::Dir(*dir));
    }

    fn multicast(&mut self, origin: &Vec3, to: Multicast) {
        self.wire.push(Wire::Multicast(*origin, to));
    }

    fn temp_entity(&mut self, te: &TempEntity, origin: &Vec3, to: Multicast) {
        self.temp_entities.push((te.clone(), to));
        te.write(self);
        self.multicast(origin, to);
    }
}

fn registry_index(names: &mut Vec<String>, name: &str) -> i32 {
    match names.iter().position(|n| n == name) {
        Some(i) => i as i32 + 1,
        None => {
            names.push(name.to_string());
            names.len() as i32
        }
    }
}

/// Records damage and applies it to health, nothing more.
#[derive(Debug, Default)]
pub struct DamageLog {
    pub events: Vec<DamageEvent>,
    pub batches: usize,
    pub open_batches: usize,
}

impl Combat for DamageLog {
    fn begin_damage(&mut self) {
        self.open_batches += 1;
    }

    fn end_damage(&mut self) {
        self.open_batches -= 1;
        self.batches += 1;
    }

    fn t_damage(&mut self, edicts: &mut Edicts, ev: &DamageEvent) {
        assert!(self.open_batches > 0, "damage outside a batch");
        if let Some(targ) = edicts.get_mut(ev.target) {
            if targ.takedamage {
                targ.health -= ev.damage;
                if targ.health <= 0 {
                    targ.dead = true;
                }
            }
        }
        self.events.push(ev.clone());
    }
}

/// Damageable box centred on its origin.
pub fn add_dummy(edicts: &mut Edicts, origin: Vec3, health: i32) -> EntityId {
    let id = edicts.spawn(0.0).unwrap();
    let e = edicts.get_mut(id).unwrap();
    e.classname = "dummy".to_string();
    e.s.origin = origin;
    e.mins = [-16.0, -16.0, -16.0];
    e.maxs = [16.0, 16.0, 16.0];
    e.solid = Solid::Bbox;
    e.health = health;
    e.takedamage = health > 0;
    e.mass = 200;
    id
}

pub fn add_monster(edicts: &mut Edicts, origin: Vec3) -> EntityId {
    let id = add_dummy(edicts, origin, 100);
    let e = edicts.get_mut(id).unwrap();
    e.classname = "monster_soldier".to_string();
    e.svflags |= ServerFlags::MONSTER;
    id
}

pub fn add_player(edicts: &mut Edicts, origin: Vec3) -> EntityId {
    let id = add_dummy(edicts, origin, 100);
    let e = edicts.get_mut(id).unwrap();
    e.classname = "player".to_string();
    e.client = Some(0);
    e.mins = [-16.0, -16.0, -24.0];
    e.maxs = [16.0, 16.0, 32.0];
    id
}

/// Everything a `GameContext` borrows, owned in one place.
pub struct Harness {
    pub edicts: Edicts,
    pub level: LevelLocals,
    pub world: FakeWorld,
    pub combat: DamageLog,
    pub cfg: WeaponConfig,
    pub rng: StdRng,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            edicts: Edicts::new(256),
            level: LevelLocals {
                framenum: 100,
                time: 10.0,
            },
            world: FakeWorld::default(),
            combat: DamageLog::default(),
            cfg: WeaponConfig::default(),
            rng: StdRng::seed_from_u64(1),
        }
    }
}

impl Harness {
    pub fn ctx(&mut self) -> GameContext<'_> {
        GameContext {
            edicts: &mut self.edicts,
            level: &mut self.level,
            gi: &mut self.world,
            combat: &mut self.combat,
            cfg: &self.cfg,
            rng: &mut self.rng,
        }
    }

    /// Entities of the given class that are still live.
    pub fn live(&self, classname: &str) -> Vec<EntityId> {
        self.edicts
            .iter_live()
            .filter(|(_, e)| e.classname == classname)
            .map(|(id, _)| id)
            .collect()
    }

    /// How many times each id was unlinked by a free.
    pub fn free_count(&self, id: EntityId) -> usize {
        self.world.unlinked.iter().filter(|&&u| u == id).count()
    }
}
