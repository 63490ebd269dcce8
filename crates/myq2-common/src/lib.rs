// Shared math, content masks and wire constants used by the game modules

pub mod q_shared;
pub mod common;
