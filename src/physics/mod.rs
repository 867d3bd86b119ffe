//! Player movement integration (spec §4.6): swept per-axis AABB collision
//! with step-up, tunnel centering, a camera bumper, and push-out recovery.
//! Pure function of `(PlayerState, MovementInput, &dyn TerrainQuery, dt)` —
//! grounded on the pack's pure-function physics style, generalized so unit
//! tests can exercise it against a fake flat world instead of a real `World`.

pub mod aabb;

use crate::constants::physics::*;
use aabb::Aabb;
use cgmath::{InnerSpace, Point3, Vector3};

/// The query surface physics needs from the world. `World` implements this;
/// tests use a synthetic flat-ground implementation instead.
pub trait TerrainQuery {
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MovementInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump_held: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerState {
    pub position: Point3<f32>,
    pub vy: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub jumping: bool,
    pub jump_cooldown: f32,
    pub space_released: bool,
    pub camera_y: f32,
    pub last_input_direction: Vector3<f32>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, RESPAWN_Y, 0.0),
            vy: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            jumping: false,
            jump_cooldown: 0.0,
            space_released: true,
            camera_y: RESPAWN_Y + HEAD_HEIGHT,
            last_input_direction: Vector3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Build the player's AABB at `(x, y, z)` — `y` is the foot position.
fn player_aabb(x: f32, y: f32, z: f32) -> Aabb {
    Aabb {
        min: Point3::new(x - PLAYER_WIDTH / 2.0, y, z - PLAYER_WIDTH / 2.0),
        max: Point3::new(x + PLAYER_WIDTH / 2.0, y + PLAYER_HEIGHT, z + PLAYER_WIDTH / 2.0),
    }
}

/// Test the player AABB at `(x, y, z)` for any solid overlap. `exclude_feet`
/// skips the bottom row of sampled cells, so testing horizontal motion
/// doesn't let the current support block register as a collision.
pub fn check_aabb(terrain: &dyn TerrainQuery, x: f32, y: f32, z: f32, exclude_feet: bool) -> bool {
    let bb = player_aabb(x, y, z);
    let feet_row = y.floor() as i32;
    aabb::overlapped_cells(&bb, SAMPLE_EPSILON)
        .into_iter()
        .any(|(cx, cy, cz)| {
            if exclude_feet && cy == feet_row {
                return false;
            }
            terrain.is_solid(cx, cy, cz)
        })
}

fn has_support(terrain: &dyn TerrainQuery, x: f32, y: f32, z: f32) -> bool {
    let w = PLAYER_WIDTH / 2.0;
    let feet_y = (y - SAMPLE_EPSILON).floor() as i32;
    [(x, z), (x - w, z - w), (x + w, z - w), (x - w, z + w), (x + w, z + w)]
        .iter()
        .any(|&(px, pz)| terrain.is_solid(px.floor() as i32, feet_y, pz.floor() as i32))
}

/// Attempt a step-up onto `(target_x, y, target_z)`. Returns the new `y`
/// and whether the step consumed the in-air jump (spec step 3: `h > 1`).
fn try_step_up(
    terrain: &dyn TerrainQuery,
    x: f32,
    z: f32,
    target_x: f32,
    target_z: f32,
    y: f32,
    jumping: bool,
    vy: f32,
) -> Option<(f32, bool)> {
    if !has_support(terrain, x, y, z) {
        return None;
    }
    let max_h = if jumping && vy > 0.0 { 2 } else { 1 };
    for h in 1..=max_h {
        let hf = h as f32;
        if !check_aabb(terrain, target_x, y + hf, target_z, false) && !check_aabb(terrain, x, y + hf, z, false) {
            return Some((y + hf, h > 1));
        }
    }
    None
}

/// Advance the player one frame. `dt` is clamped to `DT_MAX` so a stall
/// (alt-tab, a slow frame) never causes a tunneling jump in position.
pub fn step(state: &mut PlayerState, input: MovementInput, terrain: &dyn TerrainQuery, dt: f32) {
    let dt = dt.min(DT_MAX);

    // 1. Horizontal input -> velocity.
    let forward = Vector3::new(state.yaw.sin(), 0.0, state.yaw.cos());
    let right = Vector3::new(state.yaw.cos(), 0.0, -state.yaw.sin());
    let f = (input.forward as i32 - input.back as i32) as f32;
    let r = (input.right as i32 - input.left as i32) as f32;
    let mut move_dir = forward * f + right * r;
    if move_dir.x != 0.0 || move_dir.z != 0.0 {
        move_dir = move_dir.normalize();
        state.last_input_direction = move_dir;
    }
    let mut vx = move_dir.x * SPEED;
    let mut vz = move_dir.z * SPEED;

    let x0 = state.position.x;
    let y0 = state.position.y;
    let z0 = state.position.z;
    let nx = x0 + vx * dt;
    let nz = z0 + vz * dt;

    // 2. Swept-axis resolution.
    let mut x = x0;
    let mut z = z0;
    let mut y = y0;
    let mut x_blocked = false;
    let mut z_blocked = false;

    if !check_aabb(terrain, nx, y0, nz, true) {
        x = nx;
        z = nz;
    } else {
        if !check_aabb(terrain, nx, y0, z0, true) {
            x = nx;
            vx *= FRICTION_SLIDE;
        } else if let Some((stepped_y, consumed)) = try_step_up(terrain, x0, z0, nx, z0, y0, state.jumping, state.vy) {
            x = nx;
            y = stepped_y;
            state.vy = 0.0;
            if consumed {
                state.space_released = false;
            }
        } else {
            x_blocked = true;
        }

        if !check_aabb(terrain, x, y, nz, true) {
            z = nz;
            vz *= FRICTION_SLIDE;
        } else if let Some((stepped_y, consumed)) = try_step_up(terrain, x0, z0, x, nz, y, state.jumping, state.vy) {
            z = nz;
            y = stepped_y;
            state.vy = 0.0;
            if consumed {
                state.space_released = false;
            }
        } else {
            z_blocked = true;
        }
    }

    if x_blocked && z_blocked {
        x = x0 + (x - x0) * FRICTION_CORNER;
        z = z0 + (z - z0) * FRICTION_CORNER;
    }

    // 4. Tunnel centering: both neighbors along one axis solid at foot and
    // head height pulls the player toward the cell center on the other axis.
    let head_y = y + PLAYER_HEIGHT - 0.1;
    let x_pinned = terrain.is_solid((x + 0.6).floor() as i32, y.floor() as i32, z.floor() as i32)
        && terrain.is_solid((x - 0.6).floor() as i32, y.floor() as i32, z.floor() as i32)
        && terrain.is_solid((x + 0.6).floor() as i32, head_y.floor() as i32, z.floor() as i32)
        && terrain.is_solid((x - 0.6).floor() as i32, head_y.floor() as i32, z.floor() as i32);
    let z_pinned = terrain.is_solid(x.floor() as i32, y.floor() as i32, (z + 0.6).floor() as i32)
        && terrain.is_solid(x.floor() as i32, y.floor() as i32, (z - 0.6).floor() as i32)
        && terrain.is_solid(x.floor() as i32, head_y.floor() as i32, (z + 0.6).floor() as i32)
        && terrain.is_solid(x.floor() as i32, head_y.floor() as i32, (z - 0.6).floor() as i32);
    if x_pinned {
        let center_z = z.floor() + 0.5;
        z += (center_z - z) * TUNNEL_CENTERING_FACTOR;
    }
    if z_pinned {
        let center_x = x.floor() + 0.5;
        x += (center_x - x) * TUNNEL_CENTERING_FACTOR;
    }

    // 5. Camera bumper.
    let eye = Point3::new(x, y + HEAD_HEIGHT, z);
    let bumped = [-1.0f32, 0.0, 1.0].iter().any(|&side| {
        let probe = eye + forward * 0.25 + right * (side * CAMERA_WIDTH / 2.0);
        terrain.is_solid(probe.x.floor() as i32, probe.y.floor() as i32, probe.z.floor() as i32)
    });
    if bumped {
        x -= forward.x * CAMERA_BUMPER_PUSHBACK;
        z -= forward.z * CAMERA_BUMPER_PUSHBACK;
    }

    // 6. Ceiling bump.
    if state.vy > 0.0 && terrain.is_solid(x.floor() as i32, head_y.floor() as i32, z.floor() as i32) {
        state.vy = -0.01;
    }

    // 7. Vertical integration.
    let mut ground_y = None;
    for dy in 0..=4 {
        let gy = y.floor() as i32 - dy;
        if terrain.is_solid(x.floor() as i32, gy, z.floor() as i32) {
            ground_y = Some(gy as f32 + 1.0);
            break;
        }
    }
    y += state.vy * dt;
    if let Some(gy) = ground_y {
        if y < gy {
            y = gy;
            state.vy = 0.0;
            state.jumping = false;
        } else {
            state.vy = (state.vy + GRAVITY * dt).max(TERMINAL_VELOCITY);
        }
    } else {
        state.vy = (state.vy + GRAVITY * dt).max(TERMINAL_VELOCITY);
    }

    // 8. Jump.
    if input.jump_held && !state.jumping && state.jump_cooldown <= 0.0 && state.space_released {
        state.vy = JUMP_FORCE;
        state.jumping = true;
        state.jump_cooldown = JUMP_INTERVAL;
        state.space_released = false;
    }
    if !input.jump_held {
        state.space_released = true;
    }
    state.jump_cooldown = (state.jump_cooldown - dt).max(0.0);

    state.position = Point3::new(x, y, z);

    // 9. Push-out recovery.
    if check_aabb(terrain, state.position.x, state.position.y, state.position.z, false) {
        const DIRS: [(f32, f32, f32); 6] = [
            (1.0, 0.0, 0.0), (-1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0), (0.0, -1.0, 0.0),
            (0.0, 0.0, 1.0), (0.0, 0.0, -1.0),
        ];
        for (dx, dy, dz) in DIRS {
            let px = state.position.x + dx * PUSH_OUT_STEP;
            let py = state.position.y + dy * PUSH_OUT_STEP;
            let pz = state.position.z + dz * PUSH_OUT_STEP;
            if !check_aabb(terrain, px, py, pz, false) {
                state.position = Point3::new(px, py, pz);
                break;
            }
        }
    }

    // 10. Void respawn.
    if state.position.y < VOID_RESPAWN_Y {
        state.position = Point3::new(state.position.x, RESPAWN_Y, state.position.z);
        state.vy = 0.0;
    }

    // 11. Camera smoothing.
    let target_camera_y = state.position.y + HEAD_HEIGHT;
    state.camera_y += (target_camera_y - state.camera_y) * CAMERA_SMOOTHING;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatWorld {
        ground_y: i32,
    }

    impl TerrainQuery for FlatWorld {
        fn is_solid(&self, _x: i32, y: i32, _z: i32) -> bool {
            y <= self.ground_y
        }
    }

    #[test]
    fn player_comes_to_rest_on_flat_ground() {
        let terrain = FlatWorld { ground_y: 0 };
        let mut state = PlayerState { position: Point3::new(0.0, 5.0, 0.0), ..PlayerState::default() };
        for _ in 0..120 {
            step(&mut state, MovementInput::default(), &terrain, 1.0 / 60.0);
        }
        assert!((state.position.y - 1.0).abs() < 0.01);
        assert_eq!(state.vy, 0.0);
    }

    #[test]
    fn void_respawn_triggers_below_threshold() {
        let terrain = FlatWorld { ground_y: -1000 };
        let mut state = PlayerState { position: Point3::new(0.0, -25.0, 0.0), ..PlayerState::default() };
        step(&mut state, MovementInput::default(), &terrain, 1.0 / 60.0);
        assert_eq!(state.position.y, RESPAWN_Y);
    }

    #[test]
    fn jump_requires_support_and_cooldown() {
        let terrain = FlatWorld { ground_y: 0 };
        let mut state = PlayerState { position: Point3::new(0.0, 1.0, 0.0), ..PlayerState::default() };
        let input = MovementInput { jump_held: true, ..MovementInput::default() };
        step(&mut state, input, &terrain, 1.0 / 60.0);
        assert!(state.jumping);
        assert_eq!(state.vy, JUMP_FORCE);
    }

    #[test]
    fn walking_forward_moves_position() {
        let terrain = FlatWorld { ground_y: -1000 };
        let mut state = PlayerState { position: Point3::new(0.0, 0.0, 0.0), ..PlayerState::default() };
        let input = MovementInput { forward: true, ..MovementInput::default() };
        for _ in 0..60 {
            step(&mut state, input, &terrain, 1.0 / 60.0);
        }
        assert!(state.position.z > 0.0);
    }
}
