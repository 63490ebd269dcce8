//! Per-projectile behaviour table.
//!
//! Every spawned weapon entity carries a [`Projectile`] tag. The server frame
//! calls [`run_think`] when an entity's `nextthink` comes due and physics calls
//! [`touch`] on contact; both route to the behaviour for that tag.

use tracing::trace;

use myq2_common::q_shared::{CPlane, CSurface};

use crate::g_local::{EntityId, GameContext, FRAMETIME};
use crate::g_trap::{trap_die, trap_pain, trap_think, TrapState};
use crate::g_utils::g_free_edict;
use crate::g_weapon::{bfg_explode, bfg_think, bfg_touch, blaster_touch, grenade_explode, grenade_touch, rocket_touch};
#[cfg(feature = "xatrix")]
use crate::g_weapon::{ionripper_sparks, ionripper_touch, plasma_touch};

/// Lifecycle of a BFG blast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfgPhase {
    /// In flight, lasering anything nearby every frame.
    Flying,
    /// Detonated; `frame` counts the explosion animation 0..5.
    Exploding { frame: u8 },
    /// Animation finished; freed on the next think.
    Spent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projectile {
    Bolt { hyper: bool, blue: bool },
    /// `hand` for thrown grenades, `held` when it went off in the hand.
    Grenade { hand: bool, held: bool },
    Rocket,
    #[cfg(feature = "xatrix")]
    Plasma,
    Bfg(BfgPhase),
    #[cfg(feature = "xatrix")]
    Ripper,
    Trap(TrapState),
    /// Trap victim debris.
    Gib,
}

/// Think tolerance against float drift in `time`.
const THINK_EPSILON: f32 = 0.001;

/// Runs the entity's think if it is due. Returns true when one ran.
pub fn run_think(ctx: &mut GameContext, id: EntityId) -> bool {
    let time = ctx.level.time;
    let Some(ent) = ctx.edicts.get_mut(id) else {
        return false;
    };
    let thinktime = ent.nextthink;
    if thinktime <= 0.0 || thinktime > time + THINK_EPSILON {
        return false;
    }
    ent.nextthink = 0.0;
    let Some(projectile) = ent.projectile.clone() else {
        return false;
    };
    trace!(%id, ?projectile, "think");

    match projectile {
        Projectile::Grenade { .. } => grenade_explode(ctx, id),
        Projectile::Bfg(BfgPhase::Flying) => bfg_think(ctx, id),
        Projectile::Bfg(BfgPhase::Exploding { .. }) => bfg_explode(ctx, id),
        #[cfg(feature = "xatrix")]
        Projectile::Ripper => ionripper_sparks(ctx, id),
        Projectile::Trap(_) => trap_think(ctx, id),
        #[cfg(feature = "xatrix")]
        Projectile::Plasma => {
            g_free_edict(ctx, id);
        }
        Projectile::Bolt { .. } | Projectile::Rocket | Projectile::Bfg(BfgPhase::Spent) | Projectile::Gib => {
            g_free_edict(ctx, id);
        }
    }
    true
}

/// Contact between `id` and `other`. `plane` and `surf` are absent for
/// entity-entity touches.
pub fn touch(
    ctx: &mut GameContext,
    id: EntityId,
    other: EntityId,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    let Some(projectile) = ctx.edicts.get(id).and_then(|e| e.projectile.clone()) else {
        return;
    };
    match projectile {
        Projectile::Bolt { .. } => blaster_touch(ctx, id, other, plane, surf),
        Projectile::Grenade { .. } => grenade_touch(ctx, id, other, plane, surf),
        Projectile::Rocket => rocket_touch(ctx, id, other, plane, surf),
        #[cfg(feature = "xatrix")]
        Projectile::Plasma => plasma_touch(ctx, id, other, plane, surf),
        Projectile::Bfg(BfgPhase::Flying) => bfg_touch(ctx, id, other, plane, surf),
        #[cfg(feature = "xatrix")]
        Projectile::Ripper => ionripper_touch(ctx, id, other, plane, surf),
        Projectile::Bfg(_) | Projectile::Trap(_) | Projectile::Gib => {}
    }
}

pub fn pain(ctx: &mut GameContext, id: EntityId, attacker: EntityId, kick: f32, damage: i32) {
    if let Some(Projectile::Trap(state)) = ctx.edicts.get(id).and_then(|e| e.projectile.clone()) {
        if state.killable {
            trap_pain(ctx, id, attacker, kick, damage);
        }
    }
}

pub fn die(ctx: &mut GameContext, id: EntityId, inflictor: EntityId, attacker: EntityId, damage: i32) {
    if let Some(Projectile::Trap(_)) = ctx.edicts.get(id).and_then(|e| e.projectile.as_ref()) {
        trap_die(ctx, id, inflictor, attacker, damage);
    }
}

/// Advance one server frame and run every think that came due, in slot order.
pub fn run_frame(ctx: &mut GameContext) {
    ctx.level.framenum += 1;
    ctx.level.time = ctx.level.framenum as f32 * FRAMETIME;

    for index in 1..ctx.edicts.len() {
        if let Some(id) = ctx.edicts.id_at(index) {
            run_think(ctx, id);
        }
    }
}
