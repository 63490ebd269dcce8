// g_combat.rs — damage seam and the spatial queries weapons use to pick victims

use rayon::prelude::*;

use myq2_common::q_shared::{
    bbox_center, vec3_origin, vector_length, vector_subtract, Contents, Vec3, MASK_SOLID,
};

use crate::g_local::{DamageFlags, Edict, EntityId, MeansOfDeath, MoveType, Solid, DAMAGE_RADIUS};
use crate::g_utils::Edicts;
use crate::game_import::GameImport;

/// One application of damage. `inflictor` is what hit, `attacker` who gets the credit.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageEvent {
    pub target: EntityId,
    pub inflictor: EntityId,
    pub attacker: EntityId,
    pub dir: Vec3,
    pub point: Vec3,
    pub normal: Vec3,
    pub damage: i32,
    pub knockback: i32,
    pub dflags: DamageFlags,
    pub mod_type: MeansOfDeath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadiusDamage {
    pub inflictor: EntityId,
    pub attacker: EntityId,
    pub damage: f32,
    pub ignore: Option<EntityId>,
    pub radius: f32,
    pub mod_type: MeansOfDeath,
}

/// Resolves health, armor and death. Provided by the game.
pub trait Combat {
    /// Opens a batch; every damage call site is wrapped in begin/end.
    fn begin_damage(&mut self) {}
    fn end_damage(&mut self) {}

    fn t_damage(&mut self, edicts: &mut Edicts, ev: &DamageEvent);

    /// Standard splash falloff around the inflictor.
    fn t_radius_damage(&mut self, gi: &dyn GameImport, edicts: &mut Edicts, rd: &RadiusDamage) {
        let Some(inflictor_origin) = edicts.get(rd.inflictor).map(|e| e.s.origin) else {
            return;
        };

        let hits: Vec<_> = findradius(inflictor_origin, rd.radius, edicts)
            .into_iter()
            .filter(|&id| Some(id) != rd.ignore)
            .filter_map(|id| {
                let ent = edicts.get(id)?;
                if !ent.takedamage {
                    return None;
                }
                let v = vector_subtract(&inflictor_origin, &bbox_center(&ent.s.origin, &ent.mins, &ent.maxs));
                let mut points = rd.damage - 0.5 * vector_length(&v);
                if id == rd.attacker {
                    points *= 0.5;
                }
                if points <= 0.0 {
                    return None;
                }
                Some((id, vector_subtract(&ent.s.origin, &inflictor_origin), points as i32))
            })
            .collect();

        for (id, dir, points) in hits {
            if !can_damage(gi, edicts, id, rd.inflictor) {
                continue;
            }
            self.t_damage(
                edicts,
                &DamageEvent {
                    target: id,
                    inflictor: rd.inflictor,
                    attacker: rd.attacker,
                    dir,
                    point: inflictor_origin,
                    normal: vec3_origin,
                    damage: points,
                    knockback: points,
                    dflags: DAMAGE_RADIUS,
                    mod_type: rd.mod_type,
                },
            );
        }
    }
}

/// Run `f` inside a begin/end damage batch.
pub fn damage_batch<C: Combat + ?Sized, R>(combat: &mut C, f: impl FnOnce(&mut C) -> R) -> R {
    combat.begin_damage();
    let result = f(combat);
    combat.end_damage();
    result
}

/// Find all live, solid entities whose bbox centre is within `radius`.
///
/// Uses distance-squared and parallel iteration. Returns ids sorted by slot
/// index so callers see a deterministic scan order.
pub fn findradius(origin: Vec3, radius: f32, edicts: &Edicts) -> Vec<EntityId> {
    let radius_sq = radius * radius;

    let mut result: Vec<usize> = edicts
        .as_slice()
        .par_iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, ent)| {
            if !ent.inuse || ent.solid == Solid::Not {
                return None;
            }
            let eorg = vector_subtract(&origin, &bbox_center(&ent.s.origin, &ent.mins, &ent.maxs));
            let dist_sq = eorg[0] * eorg[0] + eorg[1] * eorg[1] + eorg[2] * eorg[2];
            (dist_sq < radius_sq).then_some(idx)
        })
        .collect();

    // parallel collect doesn't preserve order
    result.sort_unstable();
    result.into_iter().filter_map(|i| edicts.id_at(i)).collect()
}

fn clear_line(gi: &dyn GameImport, from: &Vec3, to: &Vec3, passent: EntityId) -> bool {
    gi.trace(from, &vec3_origin, &vec3_origin, to, Some(passent), MASK_SOLID).fraction == 1.0
}

/// Returns true if the inflictor can directly damage the target.
/// Used for explosions and melee attacks.
pub fn can_damage(gi: &dyn GameImport, edicts: &Edicts, targ: EntityId, inflictor: EntityId) -> bool {
    let (Some(t), Some(i)) = (edicts.get(targ), edicts.get(inflictor)) else {
        return false;
    };
    let from = i.s.origin;

    // bmodels need special checking because their origin is 0,0,0
    if t.movetype == MoveType::Push {
        let dest = [
            (t.absmin[0] + t.absmax[0]) * 0.5,
            (t.absmin[1] + t.absmax[1]) * 0.5,
            (t.absmin[2] + t.absmax[2]) * 0.5,
        ];
        let trace = gi.trace(&from, &vec3_origin, &vec3_origin, &dest, Some(inflictor), MASK_SOLID);
        return trace.fraction == 1.0 || trace.ent == Some(targ);
    }

    let o = t.s.origin;
    let probes = [
        o,
        [o[0] + 15.0, o[1] + 15.0, o[2]],
        [o[0] + 15.0, o[1] - 15.0, o[2]],
        [o[0] - 15.0, o[1] + 15.0, o[2]],
        [o[0] - 15.0, o[1] - 15.0, o[2]],
    ];
    probes.iter().any(|dest| clear_line(gi, &from, dest, inflictor))
}

fn eye(e: &Edict) -> Vec3 {
    [e.s.origin[0], e.s.origin[1], e.s.origin[2] + e.viewheight as f32]
}

/// Returns true if the entity is visible to self, even if not infront.
pub fn visible(gi: &dyn GameImport, edicts: &Edicts, a: EntityId, b: EntityId, mask: Contents) -> bool {
    let (Some(ea), Some(eb)) = (edicts.get(a), edicts.get(b)) else {
        return false;
    };
    let trace = gi.trace(&eye(ea), &vec3_origin, &vec3_origin, &eye(eb), Some(a), mask);
    trace.fraction == 1.0
}
