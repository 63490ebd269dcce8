// common.rs — random number helpers shared by game code

use rand::RngCore;

// ============================================================
// Random number functions
// ============================================================

/// Random float in [0, 1].
pub fn frand(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() & 32767) as f32 * (1.0 / 32767.0)
}

/// Random float in [-1, 1].
pub fn crand(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() & 32767) as f32 * (2.0 / 32767.0) - 1.0
}

/// Random integer in [0, 32767], the game's `rand() & 0x7fff`.
pub fn rand_i32(rng: &mut dyn RngCore) -> i32 {
    (rng.next_u32() & 0x7fff) as i32
}
