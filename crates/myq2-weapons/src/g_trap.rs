// g_trap.rs — the trap: a thrown device that reels in and digests victims

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

use myq2_common::common::rand_i32;
use myq2_common::q_shared::{
    angle_vectors, bbox_center, rotate_point_around_vector, vec3_origin, vector_add, vector_length,
    vector_ma, vector_normalize, vector_scale, vector_subtract, vectoyaw, Multicast, Vec3, ATTN_IDLE,
    ATTN_NORM, CHAN_BODY, CHAN_VOICE, EF_COLOR_SHELL, EF_GIB, EF_TRAP, MASK_OPAQUE, MASK_SHOT,
    MASK_WATER, RF_SHELL_BLUE, RF_SHELL_DOUBLE, RF_SHELL_GREEN, RF_SHELL_HALF_DAM, RF_SHELL_MASK,
    RF_SHELL_RED, YAW,
};

use crate::dispatch::Projectile;
use crate::g_combat::{findradius, visible, DamageEvent, RadiusDamage};
use crate::g_local::{
    DamageFlags, Edict, EntityId, GameContext, MeansOfDeath, MoveType, ServerFlags, Solid,
    DAMAGE_RADIUS, FRAMETIME,
};
use crate::g_utils::{become_explosion1, g_free_edict, g_spawn, link_entity};
use crate::g_weapon::{launch, lob_velocity, lobbed_explosion};
use crate::game_import::TempEntity;

pub const TRAP_HEIGHT: f32 = 8.0;
pub const TRAP_INITIAL_HEALTH: i32 = 100;
pub const TRAP_HELD_DAMAGE: i32 = 125;
pub const TRAP_HELD_RADIUS: f32 = 165.0;

/// How far a trap looks for something to eat.
const TRAP_SEEK_RADIUS: f32 = 256.0;
/// Victims closer than this are caught.
const TRAP_CAPTURE_RANGE: f32 = 32.0;

const TRAP_MODEL: &str = "models/weapons/z_trap/tris.md2";
const GIB_SM_MEAT_MODEL: &str = "models/objects/gibs/sm_meat/tris.md2";

/// Trap bookkeeping. The animation phase lives in `s.frame`: 0..4 arming,
/// 5 digesting, 6..8 finishing up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrapState {
    /// Can be shot: has health and routes pain/die here.
    pub killable: bool,
    /// Damage shell shown until this time.
    pub shell_expire: f32,
    /// Food cube dropped; the next think removes the trap.
    pub spent: bool,
}

fn trap_state(e: &Edict) -> Option<TrapState> {
    match e.projectile {
        Some(Projectile::Trap(state)) => Some(state),
        _ => None,
    }
}

/// Detonate the trap. Credit always goes to whoever threw it.
pub fn trap_explode(ctx: &mut GameContext, id: EntityId) {
    let Some(trap) = ctx.edicts.get_mut(id) else {
        return;
    };
    trap.owner = trap.obitowner;
    let attacker = trap.owner.unwrap_or(id);
    let (origin, velocity, dmg, dmg_radius, spawnflags) =
        (trap.s.origin, trap.velocity, trap.dmg, trap.dmg_radius, trap.spawnflags);
    let enemy = trap.enemy;
    let kind = lobbed_explosion(trap.waterlevel > 0, trap.on_ground());

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
            mod_type: if spawnflags & 1 != 0 { MeansOfDeath::TrapExplode } else { MeansOfDeath::Trap },
        })
    });

    let mod_type = if spawnflags & 2 != 0 {
        MeansOfDeath::HeldTrap
    } else if spawnflags & 1 != 0 {
        MeansOfDeath::TrapSplash
    } else {
        MeansOfDeath::TrapExplode
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
    ctx.gi.temp_entity(&TempEntity::Explosion { kind, pos }, &origin, Multicast::Phs);
    debug!(%id, ?kind, "trap detonated");
    g_free_edict(ctx, id);
}

/// Let the trap be shot. The real owner stays in `obitowner`, so clearing
/// `owner` lets the thrower hit their own trap.
pub fn convert_trap_to_killable(trap: &mut Edict, id: EntityId) {
    trap.takedamage = true;
    trap.health = TRAP_INITIAL_HEALTH;
    trap.owner = Some(id);
    if let Some(Projectile::Trap(state)) = trap.projectile.as_mut() {
        state.killable = true;
    }
}

fn spawn_gib(ctx: &mut GameContext, origin: &Vec3, angles: &Vec3, wait: f32, degrees: f32) {
    let (forward, right, up) = angle_vectors(angles);
    let mut vec = rotate_point_around_vector(&up, &right, degrees);
    vec = vector_ma(&vec, wait / 2.0, &vec);
    let mut pos = vector_add(&vector_add(&vec, origin), &forward);
    pos[2] = origin[2] + wait;

    let in_water = ctx.gi.pointcontents(&pos).intersects(MASK_WATER);
    let nextthink = ctx.level.time + FRAMETIME;
    let gib = match g_spawn(ctx) {
        Ok(gib) => gib,
        Err(err) => {
            warn!(%err, "trap gib lost");
            return;
        }
    };
    if let Some(e) = ctx.edicts.get_mut(gib) {
        e.classname = "gib".to_string();
        e.s.modelindex = ctx.gi.modelindex(GIB_SM_MEAT_MODEL);
        e.s.origin = pos;
        e.s.angles = *angles;
        e.solid = Solid::Not;
        e.s.effects |= EF_GIB;
        e.takedamage = true;
        e.movetype = MoveType::Toss;
        e.svflags |= ServerFlags::MONSTER;
        e.dead = true;
        e.waterlevel = i32::from(in_water);
        e.nextthink = nextthink;
        e.projectile = Some(Projectile::Gib);
    }
    link_entity(ctx, gib);
}

/// Phases 5..8: spray gore while the victim is consumed, then drop a food cube.
fn trap_digest(ctx: &mut GameContext, id: EntityId) {
    let time = ctx.level.time;
    let Some(trap) = ctx.edicts.get_mut(id) else {
        return;
    };

    if trap.s.frame == 5 {
        let first_bite = trap.wait == 64.0;
        trap.wait -= 2.0;
        trap.delay += time;
        let (origin, angles, wait, delay) = (trap.s.origin, trap.s.angles, trap.wait, trap.delay);
        if wait < 19.0 {
            trap.s.frame += 1;
        }

        if first_bite {
            ctx.sound(id, CHAN_VOICE, "weapons/trapdown.wav", ATTN_IDLE);
        }
        for i in 0..3 {
            spawn_gib(ctx, &origin, &angles, wait, 120.0 * i as f32 + delay);
        }
        trace!(%id, wait, "trap digesting");
        return;
    }

    trap.s.frame += 1;
    if trap.s.frame != 8 {
        return;
    }

    trap.nextthink = time + 1.0;
    if let Some(Projectile::Trap(state)) = trap.projectile.as_mut() {
        state.spent = true;
    }
    let (origin, mass) = (trap.s.origin, trap.mass);

    match g_spawn(ctx) {
        Ok(cube) => {
            if let Some(e) = ctx.edicts.get_mut(cube) {
                e.classname = "item_foodcube".to_string();
                e.s.origin = [origin[0], origin[1], origin[2] + 16.0];
                e.velocity[2] = 400.0;
                e.count = mass;
            }
            link_entity(ctx, cube);
            debug!(%id, %cube, mass, "trap dropped food cube");
        }
        Err(err) => warn!(%err, "food cube lost"),
    }
}

/// Nearest live monster or player the trap can see.
fn trap_seek(ctx: &GameContext, id: EntityId, origin: Vec3) -> Option<EntityId> {
    findradius(origin, TRAP_SEEK_RADIUS, ctx.edicts)
        .into_iter()
        .filter(|&t| t != id)
        .filter_map(|t| ctx.edicts.get(t).map(|e| (t, e)))
        .filter(|(_, e)| (e.is_monster() || e.is_client()) && e.health > 0)
        .filter(|&(t, _)| visible(&*ctx.gi, ctx.edicts, id, t, MASK_OPAQUE))
        .map(|(t, e)| (t, vector_length(&vector_subtract(&origin, &e.s.origin))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(t, _)| t)
}

pub fn trap_think(ctx: &mut GameContext, id: EntityId) {
    let time = ctx.level.time;
    let was_quadded = ctx.is_quadded(id);
    let killable_traps = ctx.cfg.killable_traps;
    let Some(trap) = ctx.edicts.get_mut(id) else {
        return;
    };
    let Some(state) = trap_state(trap) else {
        return;
    };
    if state.spent {
        g_free_edict(ctx, id);
        return;
    }
    let was_killed = killable_traps && state.killable && trap.health <= 0;

    if state.shell_expire < time {
        trap.s.effects &= !EF_COLOR_SHELL;
        trap.s.renderfx &= !RF_SHELL_MASK;
    }

    if trap.timestamp < time || was_killed {
        if was_killed {
            let (dmg, dmg_radius, attacker) = (trap.dmg, trap.dmg_radius, trap.obitowner.unwrap_or(id));
            ctx.t_radius_damage(RadiusDamage {
                inflictor: id,
                attacker,
                damage: dmg as f32,
                ignore: None,
                radius: dmg_radius,
                mod_type: MeansOfDeath::Explosive,
            });
            ctx.sound(id, CHAN_BODY, "flyer/flydeth1.wav", ATTN_NORM);
            ctx.sound(id, CHAN_VOICE, "world/fuseout.wav", ATTN_NORM);
        }
        debug!(%id, was_killed, "trap expired");
        become_explosion1(ctx, id);
        return;
    }

    trap.nextthink = time + FRAMETIME;
    if !trap.on_ground() {
        return;
    }

    if trap.s.frame > 4 {
        trap_digest(ctx, id);
        return;
    }

    trap.s.effects &= !EF_TRAP;
    if trap.s.frame >= 4 {
        trap.s.effects |= EF_TRAP;
        if killable_traps && !state.killable {
            convert_trap_to_killable(trap, id);
        }
    }
    if trap.s.frame < 4 {
        trap.s.frame += 1;
    }
    let origin = trap.s.origin;

    let Some(best) = trap_seek(ctx, id, origin) else {
        return;
    };

    // pull the enemy in
    let suction = ctx.cfg.trap_suction * if was_quadded { ctx.cfg.quad_multiplier as f32 } else { 1.0 };
    let Some(victim) = ctx.edicts.get_mut(best) else {
        return;
    };
    // traps have a bbox now; measure from its top when the victim stands on it
    let mut trap_origin = origin;
    if victim.s.origin[2] > trap_origin[2] {
        trap_origin[2] += TRAP_HEIGHT;
    }
    if victim.groundentity.is_some() {
        victim.s.origin[2] += 1.0;
        victim.groundentity = None;
    }
    let mut vec = vector_subtract(&trap_origin, &victim.s.origin);
    let len = vector_length(&vec);
    if victim.is_client() {
        vector_normalize(&mut vec);
        victim.velocity = vector_ma(&victim.velocity, suction, &vec);
    } else {
        victim.ideal_yaw = vectoyaw(&vec);
        victim.s.angles[YAW] = victim.ideal_yaw;
        let (forward, _, _) = angle_vectors(&victim.s.angles);
        victim.velocity = vector_scale(&forward, 256.0);
    }
    let (victim_origin, victim_mass) = (victim.s.origin, victim.mass);

    ctx.sound(id, CHAN_VOICE, "weapons/trapsuck.wav", ATTN_IDLE);

    if len >= TRAP_CAPTURE_RANGE {
        return;
    }

    let attacker = ctx.edicts.get(id).and_then(|t| t.obitowner).unwrap_or(id);
    ctx.t_damage(DamageEvent {
        target: best,
        inflictor: id,
        attacker,
        dir: vec3_origin,
        point: victim_origin,
        normal: vec3_origin,
        damage: 100_000,
        knockback: 1,
        dflags: DamageFlags::empty(),
        mod_type: MeansOfDeath::Trap,
    });

    let duration = ctx.cfg.trap_duration;
    if let Some(trap) = ctx.edicts.get_mut(id) {
        trap.enemy = Some(best);
        trap.wait = 64.0;
        trap.s.old_origin = trap.s.origin;
        trap.timestamp = time + duration;
        trap.mass = victim_mass / 4;
        trap.s.frame = 5;
        trap.velocity = vec3_origin;
        trap.movetype = MoveType::None;
    }
    debug!(%id, victim = %best, "trap caught victim");
}

pub fn trap_pain(ctx: &mut GameContext, id: EntityId, _attacker: EntityId, _kick: f32, _damage: i32) {
    let time = ctx.level.time;
    let roll = rand_i32(ctx.rng) % 1000;
    let Some(trap) = ctx.edicts.get_mut(id) else {
        return;
    };

    trap.s.effects |= EF_COLOR_SHELL;
    trap.s.renderfx &= !RF_SHELL_MASK;
    let health = trap.health;
    trap.s.renderfx |= if health >= TRAP_INITIAL_HEALTH * 2 / 3 {
        RF_SHELL_RED | RF_SHELL_GREEN | RF_SHELL_BLUE
    } else if health >= TRAP_INITIAL_HEALTH / 3 {
        RF_SHELL_DOUBLE | RF_SHELL_RED
    } else if health >= TRAP_INITIAL_HEALTH / 10 {
        RF_SHELL_HALF_DAM | RF_SHELL_RED
    } else {
        RF_SHELL_RED
    };
    if let Some(Projectile::Trap(state)) = trap.projectile.as_mut() {
        state.shell_expire = time + 0.5;
    }

    let snd = if health < TRAP_INITIAL_HEALTH / 10 {
        "tank/pain.wav"
    } else if roll >= 500 {
        "world/airhiss2.wav"
    } else {
        "weapons/railgr1a.wav"
    };
    ctx.sound(id, CHAN_BODY, snd, ATTN_NORM);
}

/// Death is handled by the next think, which sees health at zero.
pub fn trap_die(_ctx: &mut GameContext, _id: EntityId, _inflictor: EntityId, _attacker: EntityId, _damage: i32) {}

pub fn fire_trap(
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
    let velocity = lob_velocity(ctx, aimdir, speed);
    let nextthink = ctx.level.time + 1.0;
    let timestamp = ctx.level.time + ctx.cfg.trap_duration;

    let Some(trap) = launch(ctx, self_id, "htrap", start, |e, gi| {
        e.velocity = velocity;
        e.avelocity = [0.0, 300.0, 0.0];
        e.movetype = MoveType::Bounce;
        e.clipmask = MASK_SHOT;
        e.solid = Solid::Bbox;
        e.mins = [-4.0, -4.0, 0.0];
        e.maxs = [4.0, 4.0, TRAP_HEIGHT];
        e.s.modelindex = gi.modelindex(TRAP_MODEL);
        e.s.sound = gi.soundindex("weapons/traploop.wav");
        e.takedamage = false;
        e.obitowner = e.owner;
        e.nextthink = nextthink;
        e.dmg = damage;
        e.dmg_radius = damage_radius;
        e.spawnflags = if held { 3 } else { 1 };
        e.timestamp = timestamp;
        e.projectile = Some(Projectile::Trap(TrapState::default()));
    }) else {
        return;
    };

    // thrower died holding it
    if held && timer <= 0.0 {
        let multiplier = if ctx.is_quadded(trap) { ctx.cfg.quad_multiplier } else { 1 };
        if let Some(e) = ctx.edicts.get_mut(trap) {
            e.dmg = TRAP_HELD_DAMAGE * multiplier;
            e.dmg_radius = TRAP_HELD_RADIUS;
        }
        trap_explode(ctx, trap);
    } else {
        link_entity(ctx, trap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_dummy, add_monster, add_player, Harness};

    fn grounded_trap(h: &mut Harness, origin: Vec3) -> (EntityId, EntityId) {
        let owner = add_player(&mut h.edicts, [0.0, 0.0, 1000.0]);
        fire_trap(&mut h.ctx(), owner, &origin, &[1.0, 0.0, 0.0], 150, 400, 3.0, 200.0, false);
        let trap = h.live("htrap")[0];
        let e = h.edicts.get_mut(trap).unwrap();
        e.s.origin = origin;
        e.velocity = vec3_origin;
        e.groundentity = Some(EntityId::WORLD);
        (trap, owner)
    }

    fn frame(h: &Harness, id: EntityId) -> i32 {
        h.edicts.get(id).unwrap().s.frame
    }

    #[test]
    fn test_fire_trap_spawns_linked_trap() {
        let mut h = Harness::default();
        let owner = add_player(&mut h.edicts, [0.0; 3]);
        fire_trap(&mut h.ctx(), owner, &[0.0; 3], &[1.0, 0.0, 0.0], 150, 400, 3.0, 200.0, false);

        let trap = h.live("htrap")[0];
        let e = h.edicts.get(trap).unwrap();
        assert_eq!(e.owner, Some(owner));
        assert_eq!(e.obitowner, Some(owner));
        assert_eq!(e.spawnflags, 1);
        assert_eq!(e.maxs, [4.0, 4.0, TRAP_HEIGHT]);
        assert!(!e.takedamage);
        assert_eq!(e.nextthink, 11.0);
        assert_eq!(e.timestamp, 40.0);
        assert!(h.world.linked.contains(&trap));
    }

    #[test]
    fn test_held_trap_explodes_in_hand() {
        let mut h = Harness::default();
        let owner = add_player(&mut h.edicts, [0.0; 3]);
        let bystander = add_dummy(&mut h.edicts, [60.0, 0.0, 0.0], 500);
        fire_trap(&mut h.ctx(), owner, &[0.0; 3], &[1.0, 0.0, 0.0], 150, 400, 0.0, 200.0, true);

        assert!(h.live("htrap").is_empty());
        assert!(h.world.linked.is_empty());
        let hit = h.combat.events.iter().find(|e| e.target == bystander).unwrap();
        assert_eq!(hit.mod_type, MeansOfDeath::HeldTrap);
        assert_eq!(hit.damage, (TRAP_HELD_DAMAGE as f32 - 30.0) as i32);
        assert_eq!(hit.attacker, owner);
        assert_eq!(h.combat.batches, 1);
    }

    #[test]
    fn test_airborne_trap_only_rethinks() {
        let mut h = Harness::default();
        let (trap, _) = grounded_trap(&mut h, [0.0; 3]);
        h.edicts.get_mut(trap).unwrap().groundentity = None;
        add_monster(&mut h.edicts, [20.0, 0.0, 0.0]);

        trap_think(&mut h.ctx(), trap);
        assert_eq!(frame(&h, trap), 0);
        assert!((h.edicts.get(trap).unwrap().nextthink - 10.1).abs() < 1e-4);
        assert!(h.combat.events.is_empty());
    }

    #[test]
    fn test_capture_then_digest_without_reseeking() {
        let mut h = Harness::default();
        let (trap, owner) = grounded_trap(&mut h, [0.0; 3]);
        let monster = add_monster(&mut h.edicts, [20.0, 0.0, 0.0]);
        h.edicts.get_mut(monster).unwrap().mass = 200;

        trap_think(&mut h.ctx(), trap);
        assert_eq!(h.combat.events.len(), 1);
        let ev = &h.combat.events[0];
        assert_eq!((ev.target, ev.attacker, ev.damage), (monster, owner, 100_000));
        assert_eq!(ev.mod_type, MeansOfDeath::Trap);
        assert!(h.world.sound_played("weapons/trapsuck.wav"));

        let e = h.edicts.get(trap).unwrap();
        assert_eq!(e.s.frame, 5);
        assert_eq!(e.wait, 64.0);
        assert_eq!(e.mass, 50);
        assert_eq!(e.enemy, Some(monster));
        assert_eq!(e.timestamp, 40.0);

        // another victim in range is ignored while digesting
        add_monster(&mut h.edicts, [10.0, 0.0, 0.0]);
        trap_think(&mut h.ctx(), trap);
        assert_eq!(h.combat.events.len(), 1);
        assert_eq!(h.live("gib").len(), 3);
        assert_eq!(h.edicts.get(trap).unwrap().wait, 62.0);
        assert!(h.world.sound_played("weapons/trapdown.wav"));
    }

    #[test]
    fn test_digest_finishes_with_food_cube() {
        let mut h = Harness::default();
        let (trap, _) = grounded_trap(&mut h, [0.0; 3]);
        {
            let e = h.edicts.get_mut(trap).unwrap();
            e.s.frame = 5;
            e.wait = 20.0;
            e.mass = 50;
        }

        trap_think(&mut h.ctx(), trap);
        assert_eq!(frame(&h, trap), 6);
        assert_eq!(h.live("gib").len(), 3);

        trap_think(&mut h.ctx(), trap);
        assert_eq!(frame(&h, trap), 7);
        assert!(h.live("item_foodcube").is_empty());

        trap_think(&mut h.ctx(), trap);
        assert_eq!(frame(&h, trap), 8);
        let cube = h.live("item_foodcube")[0];
        let c = h.edicts.get(cube).unwrap();
        assert_eq!(c.count, 50);
        assert_eq!(c.s.origin, [0.0, 0.0, 16.0]);
        assert_eq!(c.velocity[2], 400.0);
        assert_eq!(h.edicts.get(trap).unwrap().nextthink, 11.0);

        trap_think(&mut h.ctx(), trap);
        assert!(!h.edicts.is_live(trap));
        assert_eq!(h.free_count(trap), 1);
    }

    #[test]
    fn test_pull_player_with_quad() {
        let mut h = Harness::default();
        let (trap, owner) = grounded_trap(&mut h, [0.0; 3]);
        let victim = add_player(&mut h.edicts, [100.0, 0.0, 0.0]);

        trap_think(&mut h.ctx(), trap);
        assert_eq!(h.edicts.get(victim).unwrap().velocity, [-250.0, 0.0, 0.0]);

        h.edicts.get_mut(owner).unwrap().quad_until = 20.0;
        h.edicts.get_mut(victim).unwrap().velocity = vec3_origin;
        trap_think(&mut h.ctx(), trap);
        assert_eq!(h.edicts.get(victim).unwrap().velocity, [-1000.0, 0.0, 0.0]);
        assert!(h.combat.events.is_empty());
    }

    #[test]
    fn test_seek_prefers_nearest_visible() {
        let mut h = Harness::default();
        let (trap, _) = grounded_trap(&mut h, [0.0; 3]);
        let far = add_monster(&mut h.edicts, [200.0, 0.0, 0.0]);
        let near = add_monster(&mut h.edicts, [-100.0, 0.0, 0.0]);
        let hidden = add_monster(&mut h.edicts, [0.0, 60.0, 0.0]);
        h.world.add_wall(1, 30.0);

        assert_eq!(trap_seek(&h.ctx(), trap, [0.0; 3]), Some(near));
        h.edicts.get_mut(near).unwrap().health = 0;
        assert_eq!(trap_seek(&h.ctx(), trap, [0.0; 3]), Some(far));
        assert_ne!(trap_seek(&h.ctx(), trap, [0.0; 3]), Some(hidden));
    }

    #[test]
    fn test_killable_trap_arms_and_dies() {
        let mut h = Harness::default();
        h.cfg.killable_traps = true;
        let (trap, owner) = grounded_trap(&mut h, [0.0; 3]);
        let bystander = add_dummy(&mut h.edicts, [0.0, 0.0, 80.0], 500);
        h.edicts.get_mut(trap).unwrap().s.frame = 4;

        trap_think(&mut h.ctx(), trap);
        let e = h.edicts.get(trap).unwrap();
        assert!(e.takedamage);
        assert_eq!(e.health, TRAP_INITIAL_HEALTH);
        assert_eq!(e.owner, Some(trap));
        assert_eq!(e.obitowner, Some(owner));
        assert_ne!(e.s.effects & EF_TRAP, 0);

        h.edicts.get_mut(trap).unwrap().health = 0;
        trap_think(&mut h.ctx(), trap);
        assert!(!h.edicts.is_live(trap));
        let hit = h.combat.events.iter().find(|e| e.target == bystander).unwrap();
        assert_eq!(hit.mod_type, MeansOfDeath::Explosive);
        assert_eq!(hit.attacker, owner);
        assert!(h.world.sound_played("flyer/flydeth1.wav"));
        assert!(h.world.sound_played("world/fuseout.wav"));
    }

    #[test]
    fn test_expired_trap_becomes_explosion_without_damage() {
        let mut h = Harness::default();
        let (trap, _) = grounded_trap(&mut h, [0.0; 3]);
        add_dummy(&mut h.edicts, [0.0, 0.0, 80.0], 500);
        h.edicts.get_mut(trap).unwrap().timestamp = 9.0;

        trap_think(&mut h.ctx(), trap);
        assert!(!h.edicts.is_live(trap));
        assert!(h.combat.events.is_empty());
        assert!(matches!(
            h.world.temp_events().last(),
            Some(TempEntity::Explosion { kind: crate::game_import::ExplosionKind::Explosion1, .. })
        ));
    }

    #[test]
    fn test_pain_shell_tiers() {
        let mut h = Harness::default();
        let (trap, _) = grounded_trap(&mut h, [0.0; 3]);
        convert_trap_to_killable(h.edicts.get_mut(trap).unwrap(), trap);

        let cases = [
            (100, RF_SHELL_RED | RF_SHELL_GREEN | RF_SHELL_BLUE),
            (50, RF_SHELL_DOUBLE | RF_SHELL_RED),
            (20, RF_SHELL_HALF_DAM | RF_SHELL_RED),
            (5, RF_SHELL_RED),
        ];
        for (health, shell) in cases {
            h.edicts.get_mut(trap).unwrap().health = health;
            trap_pain(&mut h.ctx(), trap, trap, 0.0, 10);
            let e = h.edicts.get(trap).unwrap();
            assert_eq!(e.s.renderfx & RF_SHELL_MASK, shell, "health {health}");
            assert_ne!(e.s.effects & EF_COLOR_SHELL, 0);
            assert_eq!(trap_state(e).unwrap().shell_expire, 10.5);
        }
        assert!(h.world.sound_played("tank/pain.wav"));
    }
}
