//! Tunable engine constants, grouped the way the spec groups them.

/// Blocks per side of a chunk column.
pub const CHUNK_SIZE: i32 = 16;

/// Default render distance in chunks (loads a `(2R+1)^2` neighborhood).
pub const RENDER_DISTANCE: i32 = 3;

/// Sea level, in blocks.
pub const SEA_LEVEL: i32 = -2;

pub mod physics {
    pub const GRAVITY: f32 = -24.0;
    pub const TERMINAL_VELOCITY: f32 = -50.0;
    pub const SPEED: f32 = 8.0;
    pub const JUMP_FORCE: f32 = 10.0;
    pub const PLAYER_WIDTH: f32 = 0.6;
    pub const PLAYER_HEIGHT: f32 = 1.8;
    pub const HEAD_HEIGHT: f32 = 1.65;
    pub const MAX_STEP: f32 = 1.0;
    pub const MAX_JUMP_STEP: f32 = 2.0;
    pub const FRICTION_SLIDE: f32 = 0.9;
    pub const FRICTION_CORNER: f32 = 0.7;
    pub const CAMERA_WIDTH: f32 = 0.3;
    pub const JUMP_INTERVAL: f32 = 0.25;
    pub const DT_MAX: f32 = 0.1;
    /// Shrinkage applied to the AABB top/bottom before sampling collision cells.
    pub const SAMPLE_EPSILON: f32 = 0.1;
    pub const TUNNEL_CENTERING_FACTOR: f32 = 0.1;
    pub const CAMERA_BUMPER_PUSHBACK: f32 = 0.05;
    pub const CAMERA_SMOOTHING: f32 = 0.2;
    pub const VOID_RESPAWN_Y: f32 = -20.0;
    pub const RESPAWN_Y: f32 = 60.0;
    pub const PUSH_OUT_STEP: f32 = 0.1;
}

pub mod interaction {
    pub const REACH: f32 = 9.0;
    pub const SKY_BRIDGE_STEP: f32 = 0.1;
    pub const MOUSE_SENSITIVITY: f32 = 0.002;
    pub const PITCH_LIMIT: f32 = 1.5;
}

pub mod explosion {
    pub const DEFAULT_RADIUS: i32 = 3;
    pub const SNAPSHOT_RADIUS: i32 = 3;
    /// Per-TNT stagger before it ignites in a chain, in milliseconds.
    pub const CHAIN_STAGGER_MS_MIN: u64 = 20;
    pub const CHAIN_STAGGER_MS_MAX: u64 = 80;
}

pub mod effects {
    pub const DIG_POOL_SIZE: usize = 20;
    pub const EXPLOSION_BILLBOARD_POOL_SIZE: usize = 10;
    pub const EXPLOSION_SPHERE_POOL_SIZE: usize = 15;
    pub const CHEST_LID_SPEED_RAD_PER_SEC: f32 = 3.0;
    pub const CHEST_LID_OPEN_ANGLE: f32 = -1.9;
}
