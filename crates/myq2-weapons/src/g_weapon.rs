// g_weapon.rs — hit-scan and projectile weapons

/*
Copyright (C) 1997-2001 Id Software, Inc.

This program is free software; you can redistribute it and/or
modify it under the terms of the GNU General Public License
as published by the Free Software Foundation; either version 2
of the License, or (at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.

See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program; if not, write to the Free Software
Foundation, Inc., 59 Temple Place - Suite 330, Boston, MA  02111-1307, USA.
*/

use tracing::{debug, trace, warn};

use myq2_common::common::{crand, frand};
#[cfg(feature = "xatrix")]
use myq2_common::common::rand_i32;
use myq2_common::q_shared::{
    angle_vectors, bbox_center, vec3_origin, vector_add, vector_compare, vector_length, vector_ma,
    vector_normalize, vector_scale, vector_subtract, vectoangles, CPlane, CSurface, Contents,
    Multicast, Splash, Vec3, ATTN_NORM, CHAN_VOICE, CHAN_WEAPON, CONTENTS_LAVA, CONTENTS_SLIME,
    CONTENTS_WATER, EF_ANIM_ALLFAST, EF_BFG, EF_BLUEHYPERBLASTER, EF_GRENADE, EF_ROCKET,
    MASK_SHOT, MASK_WATER,
};
#[cfg(feature = "xatrix")]
use myq2_common::q_shared::{EF_PLASMA, RF_FULLBRIGHT};

use crate::dispatch::{BfgPhase, Projectile};
use crate::g_combat::{can_damage, findradius, DamageEvent, RadiusDamage};
use crate::g_local::{
    DamageFlags, Edict, EntityFlags, EntityId, GameContext, MeansOfDeath, MoveType, ServerFlags,
    Solid, DAMAGE_BULLET, DAMAGE_ENERGY, DAMAGE_RADIUS, FRAMETIME,
};
use crate::g_utils::{g_free_edict, g_spawn, link_entity};
use crate::game_import::{ExplosionKind, GameImport, ImpactKind, TempEntity};

/// Number of traces a rail slug may take before it gives up.
const RAIL_MAX_HOPS: usize = 100;

/// Hit-scan range.
const SHOT_RANGE: f32 = 8192.0;

fn takes_damage(ctx: &GameContext, id: EntityId) -> bool {
    ctx.edicts.get(id).is_some_and(|e| e.takedamage)
}

fn hit_sky(surf: Option<&CSurface>) -> bool {
    surf.is_some_and(|s| s.is_sky())
}

/// Spawn a projectile owned by `owner` at `start` and let `setup` fill it in.
/// The caller links it. A full entity table loses the shot.
pub(crate) fn launch(
    ctx: &mut GameContext,
    owner: EntityId,
    classname: &str,
    start: &Vec3,
    setup: impl FnOnce(&mut Edict, &mut dyn GameImport),
) -> Option<EntityId> {
    let id = match g_spawn(ctx) {
        Ok(id) => id,
        Err(err) => {
            warn!(%err, classname, "projectile lost");
            return None;
        }
    };
    let e = ctx.edicts.try_get_mut(id).ok()?;
    e.classname = classname.to_string();
    e.s.origin = *start;
    e.s.old_origin = *start;
    e.owner = Some(owner);
    setup(e, &mut *ctx.gi);
    debug!(%id, %owner, classname, "spawn");
    Some(id)
}

/// Velocity of a lobbed projectile: aim plus an upward and sideways wobble.
pub(crate) fn lob_velocity(ctx: &mut GameContext, aimdir: &Vec3, speed: i32) -> Vec3 {
    let (_, right, up) = angle_vectors(&vectoangles(aimdir));
    let mut velocity = vector_scale(aimdir, speed as f32);
    velocity = vector_ma(&velocity, 200.0 + crand(ctx.rng) * 10.0, &up);
    vector_ma(&velocity, crand(ctx.rng) * 10.0, &right)
}

/*
=================
fire_lead

This is an internal support routine used for bullet/pellet based weapons.
=================
*/
fn splash_color(contents: Contents, surf: Option<&CSurface>) -> Splash {
    if contents.contains(CONTENTS_WATER) {
        if surf.is_some_and(|s| s.name == "*brwater") {
            Splash::BrownWater
        } else {
            Splash::BlueWater
        }
    } else if contents.contains(CONTENTS_SLIME) {
        Splash::Slime
    } else if contents.contains(CONTENTS_LAVA) {
        Splash::Lava
    } else {
        Splash::Unknown
    }
}

/// Point `spread`-randomised `SHOT_RANGE` units from `from` along `dir`.
fn spread_end(ctx: &mut GameContext, from: &Vec3, dir: &Vec3, hspread: f32, vspread: f32) -> Vec3 {
    let (forward, right, up) = angle_vectors(&vectoangles(dir));
    let r = crand(ctx.rng) * hspread;
    let u = crand(ctx.rng) * vspread;
    let end = vector_ma(from, SHOT_RANGE, &forward);
    let end = vector_ma(&end, r, &right);
    vector_ma(&end, u, &up)
}

fn fire_lead(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    aimdir: &Vec3,
    damage: i32,
    kick: i32,
    te_impact: ImpactKind,
    hspread: i32,
    vspread: i32,
    mod_type: MeansOfDeath,
) {
    let Some(self_origin) = ctx.edicts.get(self_id).map(|e| e.s.origin) else {
        return;
    };

    // muzzle pressed into something: the shot never leaves the gun
    let tr = ctx.gi.trace(&self_origin, &vec3_origin, &vec3_origin, start, Some(self_id), MASK_SHOT);
    if tr.fraction < 1.0 {
        return;
    }

    let mut end = spread_end(ctx, start, aimdir, hspread as f32, vspread as f32);
    let mut content_mask = MASK_SHOT | MASK_WATER;
    let mut water_start: Option<Vec3> = None;

    if ctx.gi.pointcontents(start).intersects(MASK_WATER) {
        water_start = Some(*start);
        content_mask.remove(MASK_WATER);
    }

    let mut tr = ctx.gi.lag_compensated_trace(
        start, &vec3_origin, &vec3_origin, &end, Some(self_id), content_mask, self_id,
    );

    // see if we hit water
    if tr.contents.intersects(MASK_WATER) {
        let entry = tr.endpos;
        water_start = Some(entry);

        if !vector_compare(start, &entry) {
            let color = splash_color(tr.contents, tr.surface.as_ref());
            if color != Splash::Unknown {
                ctx.gi.temp_entity(
                    &TempEntity::Splash { count: 8, pos: entry, normal: tr.plane.normal, color },
                    &entry,
                    Multicast::Pvs,
                );
            }

            // change bullet's course when it enters water
            let dir = vector_subtract(&end, start);
            end = spread_end(ctx, &entry, &dir, hspread as f32 * 2.0, vspread as f32 * 2.0);
        }

        // re-trace ignoring water this time
        tr = ctx.gi.trace(&entry, &vec3_origin, &vec3_origin, &end, Some(self_id), MASK_SHOT);
    }

    // send gun puff / flash
    if !tr.hit_sky() && tr.fraction < 1.0 {
        let hit = tr.ent.unwrap_or(EntityId::WORLD);
        if takes_damage(ctx, hit) {
            ctx.t_damage(DamageEvent {
                target: hit,
                inflictor: self_id,
                attacker: self_id,
                dir: *aimdir,
                point: tr.endpos,
                normal: tr.plane.normal,
                damage,
                knockback: kick,
                dflags: DAMAGE_BULLET,
                mod_type,
            });
        } else if !tr.surface.as_ref().is_some_and(|s| s.name.starts_with("sky")) {
            ctx.gi.temp_entity(
                &TempEntity::Impact { kind: te_impact, pos: tr.endpos, normal: tr.plane.normal },
                &tr.endpos,
                Multicast::Pvs,
            );
        }
    }

    // if went through water, determine where the end and make a bubble trail
    if let Some(water_start) = water_start {
        let mut dir = vector_subtract(&tr.endpos, &water_start);
        vector_normalize(&mut dir);
        let pos = vector_ma(&tr.endpos, -2.0, &dir);
        let exit = if ctx.gi.pointcontents(&pos).intersects(MASK_WATER) {
            pos
        } else {
            ctx.gi
                .trace(&pos, &vec3_origin, &vec3_origin, &water_start, tr.ent, MASK_WATER)
                .endpos
        };

        let mid = vector_scale(&vector_add(&water_start, &exit), 0.5);
        ctx.gi.temp_entity(
            &TempEntity::BubbleTrail { start: water_start, end: exit },
            &mid,
            Multicast::Pvs,
        );
    }
}

/*
=================
fire_bullet

Fires a single round.  Used for machinegun and chaingun.  Would be fine for
pistols, rifles, etc....
=================
*/
pub fn fire_bullet(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    aimdir: &Vec3,
    damage: i32,
    kick: i32,
    hspread: i32,
    vspread: i32,
    mod_type: MeansOfDeath,
) {
    fire_lead(ctx, self_id, start, aimdir, damage, kick, ImpactKind::Gunshot, hspread, vspread, mod_type);
}

/*
=================
fire_shotgun

Shoots shotgun pellets.  Used by shotgun and super shotgun.
=================
*/
pub fn fire_shotgun(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    aimdir: &Vec3,
    damage: i32,
    kick: i32,
    hspread: i32,
    vspread: i32,
    count: i32,
    mod_type: MeansOfDeath,
) {
    for _ in 0..count {
        fire_lead(ctx, self_id, start, aimdir, damage, kick, ImpactKind::Shotgun, hspread, vspread, mod_type);
    }
}

/*
=================
fire_blaster

Fires a single blaster bolt.  Used by the blaster and hyper blaster.
=================
*/
pub fn blaster_touch(
    ctx: &mut GameContext,
    self_id: EntityId,
    other: EntityId,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    let Some(bolt) = ctx.edicts.get(self_id) else {
        return;
    };
    if bolt.owner == Some(other) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_id);
        return;
    }

    let (hyper, blue) = match bolt.projectile {
        Some(Projectile::Bolt { hyper, blue }) => (hyper, blue),
        _ => (false, false),
    };
    let attacker = bolt.owner.unwrap_or(self_id);
    let (origin, velocity, dmg) = (bolt.s.origin, bolt.velocity, bolt.dmg);
    let normal = plane.map_or(vec3_origin, |p| p.normal);

    if takes_damage(ctx, other) {
        ctx.t_damage(DamageEvent {
            target: other,
            inflictor: self_id,
            attacker,
            dir: velocity,
            point: origin,
            normal,
            damage: dmg,
            knockback: 1,
            dflags: DAMAGE_ENERGY,
            mod_type: if hyper { MeansOfDeath::Hyperblaster } else { MeansOfDeath::Blaster },
        });
    } else {
        let kind = if blue { ImpactKind::Flechette } else { ImpactKind::Blaster };
        ctx.gi.temp_entity(&TempEntity::Impact { kind, pos: origin, normal }, &origin, Multicast::Pvs);
    }

    g_free_edict(ctx, self_id);
}

/// If the muzzle is already inside something, back the projectile off and
/// resolve the touch now instead of letting it phase through.
fn point_blank(ctx: &mut GameContext, self_id: EntityId, proj: EntityId, dir: &Vec3) {
    let (Some(self_origin), Some(proj_origin)) = (
        ctx.edicts.get(self_id).map(|e| e.s.origin),
        ctx.edicts.get(proj).map(|e| e.s.origin),
    ) else {
        return;
    };
    let tr = ctx.gi.trace(&self_origin, &vec3_origin, &vec3_origin, &proj_origin, Some(proj), MASK_SHOT);
    if tr.fraction < 1.0 {
        if let Some(e) = ctx.edicts.get_mut(proj) {
            e.s.origin = vector_ma(&proj_origin, -10.0, dir);
        }
        crate::dispatch::touch(ctx, proj, tr.ent.unwrap_or(EntityId::WORLD), None, None);
    }
}

pub fn fire_blaster(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    dir: &Vec3,
    damage: i32,
    speed: i32,
    effect: u32,
    hyper: bool,
) {
    let mut dir = *dir;
    vector_normalize(&mut dir);

    let Some(bolt) = launch(ctx, self_id, "bolt", start, |e, gi| {
        // projectiles are deadmonsters so players are not predicted against them
        e.svflags = ServerFlags::DEADMONSTER;
        e.flags = EntityFlags::NOCLIP_PROJECTILE;
        e.s.angles = vectoangles(&dir);
        e.velocity = vector_scale(&dir, speed as f32);
        e.movetype = MoveType::FlyMissile;
        e.clipmask = MASK_SHOT;
        e.solid = Solid::Bbox;
        e.s.effects |= effect;
        e.s.modelindex = gi.modelindex("models/objects/laser/tris.md2");
        e.s.sound = gi.soundindex("misc/lasfly.wav");
        e.dmg = damage;
        e.spawnflags = i32::from(hyper);
        e.projectile = Some(Projectile::Bolt {
            hyper,
            blue: effect & EF_BLUEHYPERBLASTER != 0,
        });
    }) else {
        return;
    };
    if let Some(e) = ctx.edicts.get_mut(bolt) {
        e.nextthink = ctx.level.time + 2.0;
    }
    link_entity(ctx, bolt);

    point_blank(ctx, self_id, bolt, &dir);
}

/*
=================
fire_grenade
=================
*/
/// Blast effect for anything thrown: grenades and traps.
pub(crate) fn lobbed_explosion(in_water: bool, on_ground: bool) -> ExplosionKind {
    match (in_water, on_ground) {
        (true, true) => ExplosionKind::GrenadeWater,
        (true, false) => ExplosionKind::RocketWater,
        (false, true) => ExplosionKind::Grenade,
        (false, false) => ExplosionKind::Rocket,
    }
}

pub fn grenade_explode(ctx: &mut GameContext, id: EntityId) {
    let Some(g) = ctx.edicts.get(id) else {
        return;
    };
    let (hand, held) = match g.projectile {
        Some(Projectile::Grenade { hand, held }) => (hand, held),
        _ => (false, false),
    };
    let (origin, velocity, dmg, dmg_radius) = (g.s.origin, g.velocity, g.dmg, g.dmg_radius);
    let attacker = g.owner.unwrap_or(id);
    let enemy = g.enemy;
    let in_water = g.waterlevel > 0;
    let on_ground = g.on_ground();

    //FIXME: if we are onground then raise our Z just a bit since we are a point?
    let direct = enemy.and_then(|enemy| {
        let en = ctx.edicts.get(enemy)?;
        let v = vector_subtract(&origin, &bbox_center(&en.s.origin, &en.mins, &en.maxs));
        let points = (dmg as f32 - 0.5 * vector_length(&v)) as i32;
        Some(DamageEvent {
            target: enemy,
            inflictor: id,
            attacker,
            dir: vector_subtract(&en.s.origin, &origin),
            point: origin,
            normal: vec3_origin,
            damage: points,
            knockback: points,
            dflags: DAMAGE_RADIUS,
            mod_type: if hand { MeansOfDeath::Handgrenade } else { MeansOfDeath::Grenade },
        })
    });

    let mod_type = if held {
        MeansOfDeath::HeldGrenade
    } else if hand {
        MeansOfDeath::HgSplash
    } else {
        MeansOfDeath::GSplash
    };
    ctx.damage_batch(|d| {
        if let Some(ev) = direct {
            d.t_damage(ev);
        }
        d.t_radius_damage(RadiusDamage {
            inflictor: id,
            attacker,
            damage: dmg as f32,
            ignore: enemy,
            radius: dmg_radius,
            mod_type,
        });
    });

    let pos = vector_ma(&origin, -0.02, &velocity);
    let kind = lobbed_explosion(in_water, on_ground);
    ctx.gi.temp_entity(&TempEntity::Explosion { kind, pos }, &origin, Multicast::Phs);
    debug!(%id, ?kind, "grenade detonated");

    g_free_edict(ctx, id);
}

pub fn grenade_touch(
    ctx: &mut GameContext,
    id: EntityId,
    other: EntityId,
    _plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    let Some(g) = ctx.edicts.get(id) else {
        return;
    };
    if g.owner == Some(other) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, id);
        return;
    }
    let hand = matches!(g.projectile, Some(Projectile::Grenade { hand: true, .. }));

    if !takes_damage(ctx, other) {
        let snd = if !hand {
            "weapons/grenlb1b.wav"
        } else if frand(ctx.rng) > 0.5 {
            "weapons/hgrenb1a.wav"
        } else {
            "weapons/hgrenb2a.wav"
        };
        ctx.sound(id, CHAN_VOICE, snd, ATTN_NORM);
        return;
    }

    if let Some(g) = ctx.edicts.get_mut(id) {
        g.enemy = Some(other);
    }
    grenade_explode(ctx, id);
}

fn grenade_spawn(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    aimdir: &Vec3,
    damage: i32,
    speed: i32,
    timer: f32,
    damage_radius: f32,
    kind: Projectile,
) -> Option<EntityId> {
    let velocity = lob_velocity(ctx, aimdir, speed);
    let hand = matches!(kind, Projectile::Grenade { hand: true, .. });
    let (classname, model) = if hand {
        ("hgrenade", "models/objects/grenade2/tris.md2")
    } else {
        ("grenade", "models/objects/grenade/tris.md2")
    };
    let nextthink = ctx.level.time + timer;

    launch(ctx, self_id, classname, start, |e, gi| {
        e.velocity = velocity;
        e.avelocity = [300.0, 300.0, 300.0];
        e.movetype = MoveType::Bounce;
        e.clipmask = MASK_SHOT;
        e.solid = Solid::Bbox;
        e.s.effects |= EF_GRENADE;
        e.s.modelindex = gi.modelindex(model);
        e.nextthink = nextthink;
        e.dmg = damage;
        e.dmg_radius = damage_radius;
        if let Projectile::Grenade { held, .. } = kind {
            e.spawnflags = if held { 3 } else if hand { 1 } else { 0 };
        }
        e.projectile = Some(kind);
    })
}

pub fn fire_grenade(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    aimdir: &Vec3,
    damage: i32,
    speed: i32,
    timer: f32,
    damage_radius: f32,
) {
    let kind = Projectile::Grenade { hand: false, held: false };
    if let Some(id) = grenade_spawn(ctx, self_id, start, aimdir, damage, speed, timer, damage_radius, kind) {
        link_entity(ctx, id);
    }
}

/// Hand grenade. A held grenade whose fuse already ran out goes off in the hand.
pub fn fire_grenade2(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    aimdir: &Vec3,
    damage: i32,
    speed: i32,
    timer: f32,
    damage_radius: f32,
    held: bool,
) {
    let kind = Projectile::Grenade { hand: true, held };
    let Some(id) = grenade_spawn(ctx, self_id, start, aimdir, damage, speed, timer, damage_radius, kind) else {
        return;
    };
    if let Some(e) = ctx.edicts.get_mut(id) {
        e.s.sound = ctx.gi.soundindex("weapons/hgrenc1b.wav");
    }

    if timer <= 0.0 {
        grenade_explode(ctx, id);
    } else {
        ctx.sound(self_id, CHAN_WEAPON, "weapons/hgrent1a.wav", ATTN_NORM);
        link_entity(ctx, id);
    }
}

/*
=================
fire_rocket
=================
*/

/// Direct hit plus splash, shared by rockets and plasma orbs.
fn missile_explode(
    ctx: &mut GameContext,
    id: EntityId,
    other: EntityId,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
    direct_mod: MeansOfDeath,
    splash_mod: MeansOfDeath,
    explosion: impl FnOnce(&Edict) -> (ExplosionKind, Multicast),
) {
    let Some(m) = ctx.edicts.get(id) else {
        return;
    };
    if m.owner == Some(other) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, id);
        return;
    }

    let (origin, velocity, dmg, radius_dmg, dmg_radius) =
        (m.s.origin, m.velocity, m.dmg, m.radius_dmg, m.dmg_radius);
    let attacker = m.owner.unwrap_or(id);
    let (kind, to) = explosion(m);

    // calculate position for the explosion entity
    let pos = vector_ma(&origin, -0.02, &velocity);

    let damageable = takes_damage(ctx, other);
    ctx.damage_batch(|d| {
        if damageable {
            d.t_damage(DamageEvent {
                target: other,
                inflictor: id,
                attacker,
                dir: velocity,
                point: origin,
                normal: plane.map_or(vec3_origin, |p| p.normal),
                damage: dmg,
                knockback: 0,
                dflags: DamageFlags::empty(),
                mod_type: direct_mod,
            });
        }
        d.t_radius_damage(RadiusDamage {
            inflictor: id,
            attacker,
            damage: radius_dmg as f32,
            ignore: Some(other),
            radius: dmg_radius,
            mod_type: splash_mod,
        });
    });

    ctx.gi.temp_entity(&TempEntity::Explosion { kind, pos }, &origin, to);
    debug!(%id, ?kind, "missile detonated");
    g_free_edict(ctx, id);
}

pub fn rocket_touch(
    ctx: &mut GameContext,
    id: EntityId,
    other: EntityId,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    missile_explode(ctx, id, other, plane, surf, MeansOfDeath::Rocket, MeansOfDeath::RSplash, |m| {
        let kind = if m.waterlevel > 0 {
            ExplosionKind::RocketWater
        } else {
            ExplosionKind::Rocket
        };
        (kind, Multicast::Phs)
    });
}

pub fn fire_rocket(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    dir: &Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
    radius_damage: i32,
) {
    let nextthink = ctx.level.time + 8000.0 / speed.max(1) as f32;
    let Some(rocket) = launch(ctx, self_id, "rocket", start, |e, gi| {
        e.s.angles = vectoangles(dir);
        e.velocity = vector_scale(dir, speed as f32);
        e.movetype = MoveType::FlyMissile;
        e.clipmask = MASK_SHOT;
        e.solid = Solid::Bbox;
        e.s.effects |= EF_ROCKET;
        e.s.modelindex = gi.modelindex("models/objects/rocket/tris.md2");
        e.s.sound = gi.soundindex("weapons/rockfly.wav");
        e.nextthink = nextthink;
        e.dmg = damage;
        e.radius_dmg = radius_damage;
        e.dmg_radius = damage_radius;
        e.projectile = Some(Projectile::Rocket);
    }) else {
        return;
    };
    link_entity(ctx, rocket);
}

/*
=================
fire_rail
=================
*/
pub fn fire_rail(ctx: &mut GameContext, self_id: EntityId, start: &Vec3, aimdir: &Vec3, damage: i32, kick: i32) {
    let Some(self_origin) = ctx.edicts.get(self_id).map(|e| e.s.origin) else {
        return;
    };
    let end = vector_ma(start, SHOT_RANGE, aimdir);
    let mut from = *start;
    let mut ignore = Some(self_id);
    let mut liquid_entry: Option<Vec3> = None;
    let mut mask = MASK_SHOT | CONTENTS_SLIME | CONTENTS_LAVA;
    let mut last_end = *start;

    for _ in 0..RAIL_MAX_HOPS {
        let tr = ctx.gi.trace(&from, &vec3_origin, &vec3_origin, &end, ignore, mask);
        last_end = tr.endpos;

        if tr.contents.intersects(CONTENTS_SLIME | CONTENTS_LAVA) {
            mask.remove(CONTENTS_SLIME | CONTENTS_LAVA);
            liquid_entry.get_or_insert(tr.endpos);
        } else {
            let hit = tr.ent.unwrap_or(EntityId::WORLD);
            let (pierce, damageable) = ctx.edicts.get(hit).map_or((false, false), |e| {
                (e.is_monster() || e.is_client() || e.solid == Solid::Bbox, e.takedamage)
            });
            // rail goes through SOLID_BBOX entities (gibs, etc)
            ignore = if pierce { Some(hit) } else { None };

            if hit != self_id && damageable {
                ctx.t_damage(DamageEvent {
                    target: hit,
                    inflictor: self_id,
                    attacker: self_id,
                    dir: *aimdir,
                    point: tr.endpos,
                    normal: tr.plane.normal,
                    damage,
                    knockback: kick,
                    dflags: DamageFlags::empty(),
                    mod_type: MeansOfDeath::Railgun,
                });
            }
        }

        from = tr.endpos;
        if ignore.is_none() {
            break;
        }
    }

    // send gun puff / flash
    ctx.gi.temp_entity(&TempEntity::RailTrail { start: *start, end: last_end }, &self_origin, Multicast::Phs);
    if let Some(entry) = liquid_entry {
        ctx.gi.temp_entity(&TempEntity::RailTrail { start: entry, end: last_end }, &last_end, Multicast::Phs);
    }
}

/*
=================
fire_bfg
=================
*/
pub fn bfg_explode(ctx: &mut GameContext, self_id: EntityId) {
    let Some(bfg) = ctx.edicts.get(self_id) else {
        return;
    };
    let Some(Projectile::Bfg(BfgPhase::Exploding { frame })) = bfg.projectile else {
        return;
    };
    let (origin, velocity, radius_dmg, dmg_radius, owner) =
        (bfg.s.origin, bfg.velocity, bfg.radius_dmg, bfg.dmg_radius, bfg.owner);
    trace!(id = %self_id, frame, "bfg explode tick");

    if frame == 0 {
        // the BFG effect
        let live_owner = owner.filter(|&o| ctx.edicts.is_live(o));
        let victims: Vec<(EntityId, Vec3, f32)> = findradius(origin, dmg_radius, ctx.edicts)
            .into_iter()
            .filter(|&id| takes_damage(ctx, id))
            .filter(|&id| can_damage(&*ctx.gi, ctx.edicts, id, self_id))
            .filter(|&id| live_owner.map_or(true, |o| can_damage(&*ctx.gi, ctx.edicts, id, o)))
            .filter_map(|id| {
                let e = ctx.edicts.get(id)?;
                let dist = vector_length(&vector_subtract(&origin, &bbox_center(&e.s.origin, &e.mins, &e.maxs)));
                let mut points = radius_dmg as f32 * (1.0 - (dist / dmg_radius).sqrt());
                if Some(id) == owner {
                    points *= 0.5;
                }
                Some((id, e.s.origin, points.max(0.0)))
            })
            .collect();

        for (_, at, _) in &victims {
            ctx.gi.temp_entity(&TempEntity::Explosion { kind: ExplosionKind::Bfg, pos: *at }, at, Multicast::Phs);
        }
        ctx.damage_batch(|d| {
            for (id, at, points) in victims {
                d.t_damage(DamageEvent {
                    target: id,
                    inflictor: self_id,
                    attacker: owner.unwrap_or(self_id),
                    dir: velocity,
                    point: at,
                    normal: vec3_origin,
                    damage: points as i32,
                    knockback: 0,
                    dflags: DAMAGE_ENERGY,
                    mod_type: MeansOfDeath::BfgEffect,
                });
            }
        });
    }

    let time = ctx.level.time;
    if let Some(bfg) = ctx.edicts.get_mut(self_id) {
        let frame = frame + 1;
        bfg.s.frame = frame as i32;
        bfg.nextthink = time + FRAMETIME;
        bfg.projectile = Some(Projectile::Bfg(if frame >= 5 {
            BfgPhase::Spent
        } else {
            BfgPhase::Exploding { frame }
        }));
    }
}

pub fn bfg_touch(
    ctx: &mut GameContext,
    self_id: EntityId,
    other: EntityId,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    let Some(bfg) = ctx.edicts.get(self_id) else {
        return;
    };
    if bfg.owner == Some(other) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_id);
        return;
    }
    let (origin, velocity) = (bfg.s.origin, bfg.velocity);
    let attacker = bfg.owner.unwrap_or(self_id);

    // core explosion - prevents firing it into the wall/floor
    let damageable = takes_damage(ctx, other);
    ctx.damage_batch(|d| {
        if damageable {
            d.t_damage(DamageEvent {
                target: other,
                inflictor: self_id,
                attacker,
                dir: velocity,
                point: origin,
                normal: plane.map_or(vec3_origin, |p| p.normal),
                damage: 200,
                knockback: 0,
                dflags: DamageFlags::empty(),
                mod_type: MeansOfDeath::BfgBlast,
            });
        }
        d.t_radius_damage(RadiusDamage {
            inflictor: self_id,
            attacker,
            damage: 200.0,
            ignore: Some(other),
            radius: 100.0,
            mod_type: MeansOfDeath::BfgBlast,
        });
    });

    ctx.sound(self_id, CHAN_VOICE, "weapons/bfg__x1b.wav", ATTN_NORM);
    let sprite = ctx.gi.modelindex("sprites/s_bfg3.sp2");
    let time = ctx.level.time;
    let Some(bfg) = ctx.edicts.get_mut(self_id) else {
        return;
    };
    bfg.solid = Solid::Not;
    bfg.s.origin = vector_ma(&origin, -FRAMETIME, &velocity);
    bfg.velocity = vec3_origin;
    bfg.s.modelindex = sprite;
    bfg.s.frame = 0;
    bfg.s.sound = 0;
    bfg.s.effects &= !EF_ANIM_ALLFAST;
    bfg.projectile = Some(Projectile::Bfg(BfgPhase::Exploding { frame: 0 }));
    bfg.nextthink = time + FRAMETIME;
    bfg.enemy = Some(other);
    let at = bfg.s.origin;
    debug!(id = %self_id, "bfg primary blast");

    ctx.gi.temp_entity(&TempEntity::Explosion { kind: ExplosionKind::BfgBig, pos: at }, &at, Multicast::Pvs);
}

/// In-flight laser think: beams every monster, player and barrel in range.
pub fn bfg_think(ctx: &mut GameContext, self_id: EntityId) {
    let Some(bfg) = ctx.edicts.get(self_id) else {
        return;
    };
    let (origin, owner, skinnum) = (bfg.s.origin, bfg.owner, bfg.s.skinnum);
    let dmg = ctx.cfg.bfg_laser_damage;
    let laser_mask = Contents::SOLID | Contents::MONSTER | Contents::DEADMONSTER;

    let targets: Vec<Vec3> = findradius(origin, 256.0, ctx.edicts)
        .into_iter()
        .filter(|&id| id != self_id && Some(id) != owner)
        .filter_map(|id| ctx.edicts.get(id))
        .filter(|e| e.takedamage && (e.is_monster() || e.is_client() || e.classname == "misc_explobox"))
        .map(|e| vector_ma(&e.absmin, 0.5, &e.size))
        .collect();

    for point in targets {
        let mut dir = vector_subtract(&point, &origin);
        vector_normalize(&mut dir);

        let mut ignore = Some(self_id);
        let mut start = origin;
        let end = vector_ma(&start, 2048.0, &dir);
        let mut beam_end = start;

        for _ in 0..RAIL_MAX_HOPS {
            let tr = ctx.gi.trace(&start, &vec3_origin, &vec3_origin, &end, ignore, laser_mask);
            beam_end = tr.endpos;
            let hit = tr.ent.unwrap_or(EntityId::WORLD);
            let Some(e) = ctx.edicts.get(hit) else {
                break;
            };
            let stops = !e.is_monster() && !e.is_client();

            // hurt it if we can
            if e.takedamage && !e.flags.contains(EntityFlags::IMMUNE_LASER) && Some(hit) != owner {
                ctx.t_damage(DamageEvent {
                    target: hit,
                    inflictor: self_id,
                    attacker: owner.unwrap_or(self_id),
                    dir,
                    point: tr.endpos,
                    normal: vec3_origin,
                    damage: dmg,
                    knockback: 1,
                    dflags: DAMAGE_ENERGY,
                    mod_type: MeansOfDeath::BfgLaser,
                });
            }

            // if we hit something that's not a monster or player we're done
            if stops {
                ctx.gi.temp_entity(
                    &TempEntity::LaserSparks {
                        count: 4,
                        pos: tr.endpos,
                        normal: tr.plane.normal,
                        color: skinnum as u8,
                    },
                    &tr.endpos,
                    Multicast::Pvs,
                );
                break;
            }

            ignore = Some(hit);
            start = tr.endpos;
        }

        ctx.gi.temp_entity(&TempEntity::BfgLaser { start: origin, end: beam_end }, &origin, Multicast::Phs);
    }

    let time = ctx.level.time;
    if let Some(bfg) = ctx.edicts.get_mut(self_id) {
        bfg.nextthink = time + FRAMETIME;
    }
}

pub fn fire_bfg(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    dir: &Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
) {
    let nextthink = ctx.level.time + FRAMETIME;
    let Some(bfg) = launch(ctx, self_id, "bfg blast", start, |e, gi| {
        e.s.angles = vectoangles(dir);
        e.velocity = vector_scale(dir, speed as f32);
        e.movetype = MoveType::FlyMissile;
        e.clipmask = MASK_SHOT;
        e.solid = Solid::Bbox;
        e.s.effects |= EF_BFG | EF_ANIM_ALLFAST;
        e.s.modelindex = gi.modelindex("sprites/s_bfg1.sp2");
        e.s.sound = gi.soundindex("weapons/bfg__l1a.wav");
        e.nextthink = nextthink;
        e.radius_dmg = damage;
        e.dmg_radius = damage_radius;
        e.projectile = Some(Projectile::Bfg(BfgPhase::Flying));
    }) else {
        return;
    };
    link_entity(ctx, bfg);
}

/*
=================
fire_ionripper
=================
*/
#[cfg(feature = "xatrix")]
pub fn ionripper_sparks(ctx: &mut GameContext, self_id: EntityId) {
    if let Some(origin) = ctx.edicts.get(self_id).map(|e| e.s.origin) {
        let color = (0xe4 + (rand_i32(ctx.rng) & 3)) as u8;
        ctx.gi.temp_entity(
            &TempEntity::WeldingSparks { count: 0, pos: origin, normal: vec3_origin, color },
            &origin,
            Multicast::Pvs,
        );
    }
    g_free_edict(ctx, self_id);
}

#[cfg(feature = "xatrix")]
pub fn ionripper_touch(
    ctx: &mut GameContext,
    self_id: EntityId,
    other: EntityId,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    let ripper_self = ctx.cfg.ripper_self;
    let damageable = takes_damage(ctx, other);
    let Some(ion) = ctx.edicts.get_mut(self_id) else {
        return;
    };
    if ion.owner == Some(other) && ripper_self == 0 {
        return;
    }
    if ripper_self != 0 {
        // once it has left the gun the firer is fair game
        ion.owner = Some(self_id);
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_id);
        return;
    }

    let obitowner = ion.obitowner.unwrap_or(self_id);
    let (origin, velocity) = (ion.s.origin, ion.velocity);

    let (damage, mod_type) = if damageable && other != obitowner {
        (ion.dmg, MeansOfDeath::Ripper)
    } else if damageable && ripper_self != 0 {
        // quad-boosted bolts keep their damage
        if ion.dmg < 40 {
            ion.dmg = ripper_self;
        }
        (ion.dmg, MeansOfDeath::Ripperself)
    } else {
        return;
    };

    ctx.t_damage(DamageEvent {
        target: other,
        inflictor: self_id,
        attacker: obitowner,
        dir: velocity,
        point: origin,
        normal: plane.map_or(vec3_origin, |p| p.normal),
        damage,
        knockback: 1,
        dflags: DAMAGE_ENERGY,
        mod_type,
    });
    g_free_edict(ctx, self_id);
}

#[cfg(feature = "xatrix")]
pub fn fire_ionripper(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    dir: &Vec3,
    damage: i32,
    speed: i32,
    effect: u32,
) {
    let mut dir = *dir;
    vector_normalize(&mut dir);
    let nextthink = ctx.level.time + 3.0;

    let Some(ion) = launch(ctx, self_id, "ionripper", start, |e, gi| {
        e.s.angles = vectoangles(&dir);
        e.velocity = vector_scale(&dir, speed as f32);
        e.movetype = MoveType::WallBounce;
        e.clipmask = MASK_SHOT;
        e.solid = Solid::Bbox;
        e.s.effects |= effect;
        e.s.renderfx |= RF_FULLBRIGHT;
        e.s.modelindex = gi.modelindex("models/objects/boomrang/tris.md2");
        e.s.sound = gi.soundindex("misc/lasfly.wav");
        e.obitowner = Some(self_id);
        e.nextthink = nextthink;
        e.dmg = damage;
        e.dmg_radius = 100.0;
        e.projectile = Some(Projectile::Ripper);
    }) else {
        return;
    };
    link_entity(ctx, ion);

    point_blank(ctx, self_id, ion, &dir);
}

/*
=================
fire_plasma
=================
*/
#[cfg(feature = "xatrix")]
pub fn plasma_touch(
    ctx: &mut GameContext,
    id: EntityId,
    other: EntityId,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    missile_explode(ctx, id, other, plane, surf, MeansOfDeath::Phalanx, MeansOfDeath::PSplash, |_| {
        (ExplosionKind::Plasma, Multicast::Pvs)
    });
}

#[cfg(feature = "xatrix")]
pub fn fire_plasma(
    ctx: &mut GameContext,
    self_id: EntityId,
    start: &Vec3,
    dir: &Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
    radius_damage: i32,
) {
    let nextthink = ctx.level.time + 8000.0 / speed.max(1) as f32;
    let Some(plasma) = launch(ctx, self_id, "plasma", start, |e, gi| {
        e.s.angles = vectoangles(dir);
        e.velocity = vector_scale(dir, speed as f32);
        e.movetype = MoveType::FlyMissile;
        e.clipmask = MASK_SHOT;
        e.solid = Solid::Bbox;
        e.nextthink = nextthink;
        e.dmg = damage;
        e.radius_dmg = radius_damage;
        e.dmg_radius = damage_radius;
        e.s.sound = gi.soundindex("weapons/rockfly.wav");
        e.s.modelindex = gi.modelindex("sprites/s_photon.sp2");
        e.s.effects |= EF_PLASMA | EF_ANIM_ALLFAST;
        e.projectile = Some(Projectile::Plasma);
    }) else {
        return;
    };
    link_entity(ctx, plasma);
}
