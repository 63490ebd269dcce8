// g_utils.rs — entity arena: spawning, freeing and handle resolution

use tracing::{debug, warn};

use myq2_common::q_shared::{vector_add, vector_subtract, Multicast};

use crate::g_local::{
    Edict, EntityId, GameContext, WeaponError, FREED_SLOT_DELAY, MAX_EDICTS,
};
use crate::game_import::{ExplosionKind, GameImport, TempEntity};

/// Owner of every entity. Slot 0 always holds the world.
#[derive(Debug, Clone)]
pub struct Edicts {
    slots: Vec<Edict>,
    max_edicts: usize,
}

impl Default for Edicts {
    fn default() -> Self {
        Self::new(MAX_EDICTS)
    }
}

impl Edicts {
    pub fn new(max_edicts: usize) -> Self {
        let mut world = Edict::default();
        world.inuse = true;
        world.classname = "worldspawn".to_string();
        Self {
            slots: vec![world],
            max_edicts: max_edicts.max(1),
        }
    }

    /// Number of allocated slots, live or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn as_slice(&self) -> &[Edict] {
        &self.slots
    }

    /// Handle of whatever currently lives in slot `index`.
    pub fn id_at(&self, index: usize) -> Option<EntityId> {
        self.slots
            .get(index)
            .filter(|e| e.inuse)
            .map(|e| EntityId::new(index, e.generation))
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Edict> {
        self.slots
            .get(id.index())
            .filter(|e| e.inuse && e.generation == id.generation())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Edict> {
        self.slots
            .get_mut(id.index())
            .filter(|e| e.inuse && e.generation == id.generation())
    }

    pub fn try_get_mut(&mut self, id: EntityId) -> Result<&mut Edict, WeaponError> {
        self.get_mut(id).ok_or(WeaponError::StaleEntity(id))
    }

    pub fn iter_live(&self) -> impl Iterator<Item = (EntityId, &Edict)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, e)| e.inuse)
            .map(|(i, e)| (EntityId::new(i, e.generation), e))
    }

    /// Either finds a free slot, or allocates a new one.
    ///
    /// Slots freed less than half a second ago are skipped, so clients do not
    /// see a removed entity morph into its replacement.
    pub fn spawn(&mut self, level_time: f32) -> Result<EntityId, WeaponError> {
        let reusable = self.slots.iter().enumerate().skip(1).find(|(_, e)| {
            !e.inuse && (e.freetime < 2.0 || level_time - e.freetime > FREED_SLOT_DELAY)
        });

        let index = match reusable {
            Some((i, _)) => i,
            None => {
                if self.slots.len() >= self.max_edicts {
                    warn!(max = self.max_edicts, "ED_Alloc: no free edicts");
                    return Err(WeaponError::NoFreeEdicts);
                }
                self.slots.push(Edict::default());
                self.slots.len() - 1
            }
        };

        let generation = self.slots[index].generation;
        let e = &mut self.slots[index];
        *e = Edict::default();
        e.inuse = true;
        e.generation = generation;
        e.classname = "noclass".to_string();
        Ok(EntityId::new(index, generation))
    }

    /// Marks the entity as free and clears it. Returns `true` only for the
    /// call that actually released the slot; stale handles are ignored.
    pub fn free(&mut self, gi: &mut dyn GameImport, id: EntityId, level_time: f32) -> bool {
        if id.is_world() {
            warn!(%id, "refusing to free the world");
            return false;
        }
        let Some(e) = self.get_mut(id) else {
            warn!(%id, "free of stale or already freed entity");
            return false;
        };
        debug!(%id, classname = %e.classname, "free");

        let generation = e.generation.wrapping_add(1);
        *e = Edict::default();
        e.classname = "freed".to_string();
        e.freetime = level_time;
        e.generation = generation;
        gi.unlinkentity(id);
        true
    }
}

/// Free an entity at the current level time.
pub fn g_free_edict(ctx: &mut GameContext, id: EntityId) -> bool {
    let time = ctx.level.time;
    ctx.edicts.free(&mut *ctx.gi, id, time)
}

/// Spawn an entity at the current level time.
pub fn g_spawn(ctx: &mut GameContext) -> Result<EntityId, WeaponError> {
    ctx.edicts.spawn(ctx.level.time)
}

/// Refresh the absolute bounds and hand the entity to the world for collision.
pub fn link_entity(ctx: &mut GameContext, id: EntityId) {
    if let Some(e) = ctx.edicts.get_mut(id) {
        e.absmin = vector_add(&e.s.origin, &e.mins);
        e.absmax = vector_add(&e.s.origin, &e.maxs);
        e.size = vector_subtract(&e.maxs, &e.mins);
        ctx.gi.linkentity(id);
    }
}

/// Replace the entity with a generic explosion effect.
pub fn become_explosion1(ctx: &mut GameContext, id: EntityId) {
    if let Some(origin) = ctx.edicts.get(id).map(|e| e.s.origin) {
        ctx.gi.temp_entity(
            &TempEntity::Explosion {
                kind: ExplosionKind::Explosion1,
                pos: origin,
            },
            &origin,
            Multicast::Pvs,
        );
    }
    g_free_edict(ctx, id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWorld;

    #[test]
    fn test_spawn_appends_after_world() {
        let mut edicts = Edicts::new(8);
        let id = edicts.spawn(1.0).unwrap();
        assert_eq!(id.index(), 1);
        assert_eq!(edicts.get(id).unwrap().classname, "noclass");
        assert!(edicts.get(EntityId::WORLD).is_some());
    }

    #[test]
    fn test_free_twice_is_noop() {
        let mut world = FakeWorld::default();
        let mut edicts = Edicts::new(8);
        let id = edicts.spawn(1.0).unwrap();

        assert!(edicts.free(&mut world, id, 1.0));
        assert!(!edicts.free(&mut world, id, 1.0));
        assert!(edicts.get(id).is_none());
        assert_eq!(world.unlinked, vec![id]);
    }

    #[test]
    fn test_world_is_never_freed() {
        let mut world = FakeWorld::default();
        let mut edicts = Edicts::new(8);
        assert!(!edicts.free(&mut world, EntityId::WORLD, 0.0));
        assert!(edicts.is_live(EntityId::WORLD));
    }

    #[test]
    fn test_recently_freed_slot_not_reused() {
        let mut world = FakeWorld::default();
        let mut edicts = Edicts::new(8);
        let a = edicts.spawn(10.0).unwrap();
        edicts.free(&mut world, a, 10.0);

        let b = edicts.spawn(10.2).unwrap();
        assert_ne!(a.index(), b.index());

        let c = edicts.spawn(11.0).unwrap();
        assert_eq!(c.index(), a.index());
        // the old handle must not resolve to the new tenant
        assert_ne!(c, a);
        assert!(edicts.get(a).is_none());
        assert!(edicts.get(c).is_some());
    }

    #[test]
    fn test_spawn_exhaustion() {
        let mut edicts = Edicts::new(3);
        edicts.spawn(0.0).unwrap();
        edicts.spawn(0.0).unwrap();
        assert_eq!(edicts.spawn(0.0), Err(WeaponError::NoFreeEdicts));
    }

    #[test]
    fn test_iter_live_skips_freed() {
        let mut world = FakeWorld::default();
        let mut edicts = Edicts::new(8);
        let a = edicts.spawn(0.0).unwrap();
        let b = edicts.spawn(0.0).unwrap();
        edicts.free(&mut world, a, 0.0);
        let live: Vec<_> = edicts.iter_live().map(|(id, _)| id).collect();
        assert_eq!(live, vec![EntityId::WORLD, b]);
    }
}
