// q_shared.rs — math, content flags and wire constants shared by the weapon engine

// ============================================================
// Basic types
// ============================================================

pub type Vec3 = [f32; 3];

#[allow(non_upper_case_globals)]
pub const vec3_origin: Vec3 = [0.0, 0.0, 0.0];

// angle indexes
pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

// ============================================================
// Content flags
// ============================================================

bitflags::bitflags! {
    /// Brush and entity contents, as answered by point-contents and traces.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Contents: i32 {
        const SOLID        = 1;
        const WINDOW       = 2;
        const AUX          = 4;
        const LAVA         = 8;
        const SLIME        = 16;
        const WATER        = 32;
        const MIST         = 64;
        const AREAPORTAL   = 0x8000;
        const PLAYERCLIP   = 0x10000;
        const MONSTERCLIP  = 0x20000;
        const ORIGIN       = 0x1000000;
        const MONSTER      = 0x2000000;
        const DEADMONSTER  = 0x4000000;
        const DETAIL       = 0x8000000;
        const TRANSLUCENT  = 0x10000000;
        const LADDER       = 0x20000000;
    }
}
pub const CONTENTS_SOLID: Contents = Contents::SOLID;
pub const CONTENTS_WINDOW: Contents = Contents::WINDOW;
pub const CONTENTS_LAVA: Contents = Contents::LAVA;
pub const CONTENTS_SLIME: Contents = Contents::SLIME;
pub const CONTENTS_WATER: Contents = Contents::WATER;
pub const CONTENTS_MONSTER: Contents = Contents::MONSTER;
pub const CONTENTS_DEADMONSTER: Contents = Contents::DEADMONSTER;

// content masks
pub const MASK_SOLID: Contents = Contents::SOLID.union(Contents::WINDOW);
pub const MASK_WATER: Contents = Contents::WATER.union(Contents::LAVA).union(Contents::SLIME);
pub const MASK_OPAQUE: Contents = Contents::SOLID.union(Contents::SLIME).union(Contents::LAVA);
pub const MASK_SHOT: Contents = Contents::SOLID
    .union(Contents::MONSTER)
    .union(Contents::WINDOW)
    .union(Contents::DEADMONSTER);

// ============================================================
// Surface flags
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: i32 {
        const LIGHT   = 0x1;
        const SLICK   = 0x2;
        const SKY     = 0x4;
        const WARP    = 0x8;
        const TRANS33 = 0x10;
        const TRANS66 = 0x20;
        const FLOWING = 0x40;
        const NODRAW  = 0x80;
    }
}
pub const SURF_SKY: SurfaceFlags = SurfaceFlags::SKY;

// ============================================================
// Plane / surface
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
}

impl CPlane {
    pub fn from_normal(normal: Vec3) -> Self {
        Self { normal, dist: 0.0 }
    }
}

/// Material of a traced surface. The name is the texture name ("*brwater", "sky1", ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CSurface {
    pub name: String,
    pub flags: SurfaceFlags,
    pub value: i32,
}

impl CSurface {
    pub fn named(name: &str, flags: SurfaceFlags) -> Self {
        Self {
            name: name.to_string(),
            flags,
            value: 0,
        }
    }

    pub fn is_sky(&self) -> bool {
        self.flags.contains(SurfaceFlags::SKY)
    }
}

// ============================================================
// Entity effects (EF_*) / render effects (RF_*)
// ============================================================

pub const EF_GIB: u32 = 0x00000002;
pub const EF_BLASTER: u32 = 0x00000008;
pub const EF_ROCKET: u32 = 0x00000010;
pub const EF_GRENADE: u32 = 0x00000020;
pub const EF_HYPERBLASTER: u32 = 0x00000040;
pub const EF_BFG: u32 = 0x00000080;
pub const EF_COLOR_SHELL: u32 = 0x00000100;
pub const EF_ANIM_ALLFAST: u32 = 0x00002000;
pub const EF_IONRIPPER: u32 = 0x00100000;
pub const EF_BLUEHYPERBLASTER: u32 = 0x00400000;
pub const EF_PLASMA: u32 = 0x01000000;
pub const EF_TRAP: u32 = 0x02000000;

pub const RF_FULLBRIGHT: i32 = 8;
pub const RF_SHELL_RED: i32 = 1024;
pub const RF_SHELL_GREEN: i32 = 2048;
pub const RF_SHELL_BLUE: i32 = 4096;
pub const RF_SHELL_DOUBLE: i32 = 0x00010000;
pub const RF_SHELL_HALF_DAM: i32 = 0x00020000;
pub const RF_SHELL_MASK: i32 =
    RF_SHELL_RED | RF_SHELL_GREEN | RF_SHELL_BLUE | RF_SHELL_DOUBLE | RF_SHELL_HALF_DAM;

// ============================================================
// Temp entity events
// ============================================================

/// Wire code of a temp entity, written right after `SVC_TEMP_ENTITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TempEvent {
    Gunshot = 0,
    Blaster = 2,
    Railtrail = 3,
    Shotgun = 4,
    Explosion1 = 5,
    RocketExplosion = 7,
    GrenadeExplosion = 8,
    Splash = 10,
    Bubbletrail = 11,
    LaserSparks = 15,
    RocketExplosionWater = 17,
    GrenadeExplosionWater = 18,
    BfgExplosion = 20,
    BfgBigexplosion = 21,
    BfgLaser = 23,
    WeldingSparks = 25,
    PlasmaExplosion = 28,
    Flechette = 55,
}

pub const SVC_TEMP_ENTITY: u8 = 3;

/// Colour byte carried by a splash temp entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Splash {
    Unknown = 0,
    Sparks = 1,
    BlueWater = 2,
    BrownWater = 3,
    Slime = 4,
    Lava = 5,
    Blood = 6,
}

// ============================================================
// Multicast / sound
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Multicast {
    All = 0,
    Phs = 1,
    Pvs = 2,
}

pub const CHAN_WEAPON: i32 = 1;
pub const CHAN_VOICE: i32 = 2;
pub const CHAN_BODY: i32 = 4;

pub const ATTN_NORM: f32 = 1.0;
pub const ATTN_IDLE: f32 = 2.0;

// ============================================================
// MATHLIB — Vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// veca + scale * vecb
#[inline]
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

#[inline]
pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

pub fn vector_compare(v1: &Vec3, v2: &Vec3) -> bool {
    v1 == v2
}

pub fn vector_length(v: &Vec3) -> f32 {
    dot_product(v, v).sqrt()
}

/// Normalize in place, returns original length. Zero vectors are left alone.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = vector_length(v);
    if length != 0.0 {
        let ilength = 1.0 / length;
        v.iter_mut().for_each(|c| *c *= ilength);
    }
    length
}

/// Midpoint of an entity's bounding box in world space.
pub fn bbox_center(origin: &Vec3, mins: &Vec3, maxs: &Vec3) -> Vec3 {
    vector_ma(origin, 0.5, &vector_add(mins, maxs))
}

pub fn cross_product(v1: &Vec3, v2: &Vec3) -> Vec3 {
    [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ]
}

// ============================================================
// Angle functions
// ============================================================

/// Forward, right and up vectors for a set of euler angles.
pub fn angle_vectors(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let (sy, cy) = (angles[YAW] * DEG_TO_RAD).sin_cos();
    let (sp, cp) = (angles[PITCH] * DEG_TO_RAD).sin_cos();
    let (sr, cr) = (angles[ROLL] * DEG_TO_RAD).sin_cos();

    let forward = [cp * cy, cp * sy, -sp];
    let right = [
        -sr * sp * cy + cr * sy,
        -sr * sp * sy - cr * cy,
        -sr * cp,
    ];
    let up = [
        cr * sp * cy + sr * sy,
        cr * sp * sy - sr * cy,
        cr * cp,
    ];
    (forward, right, up)
}

/// Yaw of a direction, truncated to whole degrees like the game DLL does.
pub fn vectoyaw(vec: &Vec3) -> f32 {
    if vec[PITCH] == 0.0 {
        return if vec[YAW] > 0.0 {
            90.0
        } else if vec[YAW] < 0.0 {
            -90.0
        } else {
            0.0
        };
    }
    let yaw = (vec[YAW].atan2(vec[PITCH]) * RAD_TO_DEG) as i32 as f32;
    if yaw < 0.0 {
        yaw + 360.0
    } else {
        yaw
    }
}

/// Euler angles that point along `value`. Yaw and pitch are truncated to whole degrees.
pub fn vectoangles(value: &Vec3) -> Vec3 {
    let (yaw, pitch) = if value[1] == 0.0 && value[0] == 0.0 {
        (0.0, if value[2] > 0.0 { 90.0 } else { 270.0 })
    } else {
        let yaw = if value[0] != 0.0 {
            (value[1].atan2(value[0]) * RAD_TO_DEG) as i32 as f32
        } else if value[1] > 0.0 {
            90.0
        } else {
            270.0
        };
        let forward = (value[0] * value[0] + value[1] * value[1]).sqrt();
        let mut pitch = (value[2].atan2(forward) * RAD_TO_DEG) as i32 as f32;
        if pitch < 0.0 {
            pitch += 360.0;
        }
        (yaw, pitch)
    };

    [-pitch, if yaw < 0.0 { yaw + 360.0 } else { yaw }, 0.0]
}

/// Some unit vector perpendicular to `src` (assumed normalized).
pub fn perpendicular_vector(src: &Vec3) -> Vec3 {
    // project the axis the source is least aligned with onto the plane
    let pos = (0..3)
        .min_by(|&a, &b| src[a].abs().total_cmp(&src[b].abs()))
        .unwrap_or(0);
    let mut axis = [0.0f32; 3];
    axis[pos] = 1.0;

    let inv_denom = 1.0 / dot_product(src, src);
    let d = dot_product(src, &axis) * inv_denom;
    let mut dst = vector_ma(&axis, -d * inv_denom, src);
    vector_normalize(&mut dst);
    dst
}

/// Rotate `point` around the axis `dir` by `degrees`.
pub fn rotate_point_around_vector(dir: &Vec3, point: &Vec3, degrees: f32) -> Vec3 {
    let vf = *dir;
    let vr = perpendicular_vector(dir);
    let vup = cross_product(&vr, &vf);

    // columns of m are the basis (vr, vup, vf); im is its transpose
    let m = [
        [vr[0], vup[0], vf[0]],
        [vr[1], vup[1], vf[1]],
        [vr[2], vup[2], vf[2]],
    ];
    let (s, c) = (degrees * DEG_TO_RAD).sin_cos();
    let zrot = [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]];

    let mul = |a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]| {
        let mut out = [[0.0f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        out
    };
    let im = [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ];
    let rot = mul(&mul(&m, &zrot), &im);

    [
        dot_product(&rot[0], point),
        dot_product(&rot[1], point),
        dot_product(&rot[2], point),
    ]
}
