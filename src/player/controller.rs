//! Input mapping, spawn placement, and block interaction (spec §4.7).

use super::inventory::Inventory;
use crate::block::BlockId;
use crate::constants::interaction::*;
use crate::constants::effects::{CHEST_LID_OPEN_ANGLE, CHEST_LID_SPEED_RAD_PER_SEC};
use crate::coords::VoxelPos;
use crate::noise::{column_height, Biome};
use crate::physics::{self, MovementInput, PlayerState};
use crate::world::ray::{cast_ray, Ray};
use crate::world::{BlockKey, World};
use cgmath::{InnerSpace, Point3, Vector3};
use rand::Rng;
use std::collections::HashMap;

const COMMON_LOOT: [BlockId; 3] = [BlockId::IRON, BlockId::STONE, BlockId::WOOD];
const DISTINGUISHED_LOOT: [BlockId; 3] = [BlockId::DIAMOND, BlockId::EMERALD, BlockId::GOLD_BLOCK];
const CHEST_HIGH_ALTITUDE_Y: i32 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChestState {
    Closed,
    Opening { angle: f32 },
    Open,
}

pub struct PlayerController {
    pub state: PlayerState,
    pub inventory: Inventory,
    chests: HashMap<BlockKey, ChestState>,
}

impl PlayerController {
    pub fn new(spawn: Point3<f32>) -> Self {
        Self {
            state: PlayerState { position: spawn, ..PlayerState::default() },
            inventory: Inventory::new(36),
            chests: HashMap::new(),
        }
    }

    /// Sample up to 1000 random `(x, z)` within `±10_000` looking for a
    /// forest/plains column above the waterline; falls back to the origin.
    pub fn find_spawn(seed: u32, rng: &mut impl Rng) -> Point3<f32> {
        for _ in 0..1000 {
            let x = rng.gen_range(-10_000..10_000) as f32;
            let z = rng.gen_range(-10_000..10_000) as f32;
            let (h, biome) = column_height(x, z, seed as f32);
            if matches!(biome, Biome::Forest | Biome::Plains) && h as f32 > -0.5 {
                return Point3::new(x, 70.0, z);
            }
        }
        Point3::new(0.0, 70.0, 0.0)
    }

    pub fn apply_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.state.yaw += dx * MOUSE_SENSITIVITY;
        self.state.pitch = (self.state.pitch - dy * MOUSE_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn tick_physics(&mut self, input: MovementInput, world: &World, dt: f32) {
        physics::step(&mut self.state, input, world, dt);
    }

    /// Advance every open-in-progress chest lid (spec §4.9 chest state
    /// machine). `Open` is terminal.
    pub fn tick_chests(&mut self, dt: f32) {
        for state in self.chests.values_mut() {
            if let ChestState::Opening { angle } = state {
                *angle -= CHEST_LID_SPEED_RAD_PER_SEC * dt;
                if *angle <= CHEST_LID_OPEN_ANGLE {
                    *state = ChestState::Open;
                }
            }
        }
    }

    fn camera_ray(&self) -> Ray {
        let yaw = self.state.yaw;
        let pitch = self.state.pitch;
        let dir = Vector3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos());
        let origin = Point3::new(self.state.position.x, self.state.camera_y, self.state.position.z);
        Ray::new(origin, dir.normalize())
    }

    /// Left click: mine or open a chest.
    pub fn primary_interact(&mut self, world: &mut World) {
        let ray = self.camera_ray();
        let Some(hit) = cast_ray(ray, REACH, 0.05, |p| world.is_solid((p.x, p.y, p.z))) else {
            return; // swing only
        };
        let key = (hit.position.x, hit.position.y, hit.position.z);
        let Some(block) = world.get_block(key) else { return };

        if block == BlockId::CHEST {
            self.open_chest(key, hit.position.y);
            return;
        }
        if block == BlockId::END_STONE {
            return;
        }
        let _ = world.remove_block(key);
    }

    fn open_chest(&mut self, key: BlockKey, y: i32) {
        let state = self.chests.entry(key).or_insert(ChestState::Closed);
        if *state != ChestState::Closed {
            return;
        }
        *state = ChestState::Opening { angle: 0.0 };

        let mut rng = rand::thread_rng();
        if y > CHEST_HIGH_ALTITUDE_Y {
            for &item in &DISTINGUISHED_LOOT {
                self.inventory.add(item, 1);
            }
        } else {
            let item = COMMON_LOOT[rng.gen_range(0..COMMON_LOOT.len())];
            self.inventory.add(item, 2);
        }
    }

    fn is_chest_open_or_opening(&self, key: BlockKey) -> bool {
        !matches!(self.chests.get(&key), None | Some(ChestState::Closed))
    }

    /// Right click: place a block, or — with nothing in range — attempt a
    /// sky-bridge placement along the camera ray.
    pub fn secondary_interact(&mut self, world: &mut World) {
        let ray = self.camera_ray();
        let Some(item) = self.inventory.selected_item() else { return };

        match cast_ray(ray, REACH, 0.05, |p| world.is_solid((p.x, p.y, p.z))) {
            Some(hit) => {
                let hit_key = (hit.position.x, hit.position.y, hit.position.z);
                if world.get_block(hit_key) == Some(BlockId::CHEST) && !self.is_chest_open_or_opening(hit_key) {
                    self.open_chest(hit_key, hit.position.y);
                    return;
                }
                let normal = hit.face.normal();
                let place = VoxelPos::new(hit.position.x + normal.x, hit.position.y + normal.y, hit.position.z + normal.z);
                let place_key = (place.x, place.y, place.z);
                if world.is_solid(place_key) || self.place_intersects_player(place) {
                    return;
                }
                if world.set_block(place_key, item).is_ok() {
                    self.inventory.decrement_selected();
                }
            }
            None => self.sky_bridge(world, ray, item),
        }
    }

    fn place_intersects_player(&self, place: VoxelPos) -> bool {
        use crate::constants::physics::{PLAYER_HEIGHT, PLAYER_WIDTH};
        use crate::physics::aabb::{self, Aabb};

        let pos = self.state.position;
        let player = Aabb {
            min: Point3::new(pos.x - PLAYER_WIDTH / 2.0, pos.y, pos.z - PLAYER_WIDTH / 2.0),
            max: Point3::new(pos.x + PLAYER_WIDTH / 2.0, pos.y + PLAYER_HEIGHT, pos.z + PLAYER_WIDTH / 2.0),
        };
        let block = Aabb {
            min: Point3::new(place.x as f32, place.y as f32, place.z as f32),
            max: Point3::new(place.x as f32 + 1.0, place.y as f32 + 1.0, place.z as f32 + 1.0),
        };
        aabb::intersects(&player, &block)
    }

    fn sky_bridge(&mut self, world: &mut World, ray: Ray, item: BlockId) {
        let mut t = 0.0f32;
        while t < REACH {
            t += SKY_BRIDGE_STEP;
            let p = ray.origin + ray.direction * t;
            let cell = VoxelPos::from_f32(p.x, p.y, p.z);
            let key = (cell.x, cell.y, cell.z);
            if world.is_solid(key) {
                continue;
            }
            for n in cell.neighbors() {
                let nkey = (n.x, n.y, n.z);
                if !world.is_solid(nkey) {
                    continue;
                }
                let to_neighbor = Vector3::new((n.x - cell.x) as f32, (n.y - cell.y) as f32, (n.z - cell.z) as f32);
                if ray.direction.dot(to_neighbor) > 0.01 {
                    if world.set_block(key, item).is_ok() {
                        self.inventory.decrement_selected();
                    }
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chest_lid_reaches_open_after_enough_ticks() {
        let mut controller = PlayerController::new(Point3::new(0.0, 70.0, 0.0));
        let key = (0, 0, 0);
        controller.chests.insert(key, ChestState::Opening { angle: 0.0 });
        for _ in 0..200 {
            controller.tick_chests(1.0 / 60.0);
        }
        assert_eq!(controller.chests[&key], ChestState::Open);
    }

    #[test]
    fn find_spawn_returns_a_point_even_under_bad_luck() {
        let mut rng = rand::thread_rng();
        let spawn = PlayerController::find_spawn(42, &mut rng);
        assert_eq!(spawn.y, 70.0);
    }
}
