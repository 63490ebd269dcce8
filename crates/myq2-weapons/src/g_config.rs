// g_config.rs — weapon tunables that the game used to read from cvars

/// Process-wide weapon settings, threaded through every fire/think call.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponConfig {
    /// Damage a returning ion ripper deals to its own firer. 0 turns the self-hit off.
    pub ripper_self: i32,
    pub killable_traps: bool,
    /// Trap lifetime, and how long a trap holds a captured victim.
    pub trap_duration: f32,
    /// Velocity impulse a trap applies to players it is pulling in.
    pub trap_suction: f32,
    /// Per-frame BFG laser damage: 5 in deathmatch, 10 otherwise.
    pub bfg_laser_damage: i32,
    pub quad_multiplier: i32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            ripper_self: 0,
            killable_traps: false,
            trap_duration: 30.0,
            trap_suction: 250.0,
            bfg_laser_damage: 10,
            quad_multiplier: 4,
        }
    }
}

impl WeaponConfig {
    /// Build from a cvar lookup `(name, default) -> value`.
    pub fn from_cvars(cvar: impl Fn(&str, &str) -> f32) -> Self {
        let base = Self::default();
        let deathmatch = cvar("deathmatch", "0") != 0.0;
        Self {
            ripper_self: cvar("ripper_self", "0") as i32,
            killable_traps: cvar("killable_traps", "0") != 0.0,
            trap_duration: cvar("trap_duration", "30"),
            bfg_laser_damage: if deathmatch { 5 } else { 10 },
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, f32)]) -> impl Fn(&str, &str) -> f32 {
        let map: HashMap<String, f32> = vars.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        move |name, default| {
            map.get(name)
                .copied()
                .unwrap_or_else(|| default.parse().unwrap_or(0.0))
        }
    }

    #[test]
    fn test_defaults_match_single_player() {
        let cfg = WeaponConfig::from_cvars(lookup(&[]));
        assert_eq!(cfg.ripper_self, 0);
        assert!(!cfg.killable_traps);
        assert_eq!(cfg.trap_duration, 30.0);
        assert_eq!(cfg.bfg_laser_damage, 10);
        assert_eq!(cfg, WeaponConfig::default());
    }

    #[test]
    fn test_deathmatch_and_overrides() {
        let cfg = WeaponConfig::from_cvars(lookup(&[
            ("deathmatch", 1.0),
            ("ripper_self", 25.0),
            ("killable_traps", 1.0),
            ("trap_duration", 12.5),
        ]));
        assert_eq!(cfg.bfg_laser_damage, 5);
        assert_eq!(cfg.ripper_self, 25);
        assert!(cfg.killable_traps);
        assert_eq!(cfg.trap_duration, 12.5);
        assert_eq!(cfg.quad_multiplier, 4);
    }
}
