//! Column/layer terrain generation (spec §4.2 steps 1-3).

use super::{world_xz, BlockKey, EntityAnchors, COLUMN_RANGE};
use crate::block::BlockId;
use crate::constants::{CHUNK_SIZE, SEA_LEVEL};
use crate::coords::ChunkPos;
use crate::noise::{column_height, Biome};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

struct RoomBox {
    min: (i32, i32, i32),
    max: (i32, i32, i32),
}

impl RoomBox {
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= self.min.0 && x <= self.max.0
            && y >= self.min.1 && y <= self.max.1
            && z >= self.min.2 && z <= self.max.2
    }
}

fn roll_rooms(rng: &mut StdRng) -> Vec<RoomBox> {
    (0..2)
        .map(|_| {
            let size_x = rng.gen_range(1..=5);
            let size_y = rng.gen_range(1..=5);
            let size_z = rng.gen_range(1..=5);
            let min_x = rng.gen_range(0..CHUNK_SIZE.max(1));
            let min_z = rng.gen_range(0..CHUNK_SIZE.max(1));
            let min_y = rng.gen_range(2..10);
            RoomBox {
                min: (min_x, min_y, min_z),
                max: (min_x + size_x, (min_y + size_y).min(9), min_z + size_z),
            }
        })
        .collect()
}

pub fn generate_columns(
    pos: ChunkPos,
    seed: u32,
    rng: &mut StdRng,
    block_data: &mut HashMap<BlockKey, BlockId>,
    entities: &mut EntityAnchors,
) {
    let seed_f = seed as f32;
    let rooms = roll_rooms(rng);

    for local_x in COLUMN_RANGE {
        for local_z in COLUMN_RANGE {
            let (wx, wz) = world_xz(pos, local_x, local_z);
            let (h, biome) = column_height(wx as f32, wz as f32, seed_f);

            let near_edge = local_x == 0 || local_z == 0 || local_x == CHUNK_SIZE - 1 || local_z == CHUNK_SIZE - 1;

            if h < SEA_LEVEL {
                generate_underwater_column(wx, wz, h, biome, rng, near_edge, block_data);
            } else {
                generate_surface_column(wx, wz, h, biome, rng, &rooms, local_x, local_z, block_data);
            }

            let _ = entities; // vegetation/structures are placed in structures.rs
        }
    }
}

fn generate_underwater_column(
    wx: i32,
    wz: i32,
    h: i32,
    biome: Biome,
    rng: &mut StdRng,
    near_edge: bool,
    block_data: &mut HashMap<BlockKey, BlockId>,
) {
    block_data.insert((wx, h, wz), BlockId::SAND);
    block_data.insert((wx, h - 1, wz), BlockId::END_STONE);

    let water_id = if biome == Biome::Swamp { BlockId::SWAMP_WATER } else { BlockId::WATER };
    for y in (h + 1)..=SEA_LEVEL {
        block_data.insert((wx, y, wz), water_id);
    }

    if biome == Biome::Swamp && rng.gen_bool(0.08) {
        block_data.insert((wx, SEA_LEVEL + 1, wz), BlockId::LILYPAD);
    }

    if h < -6 && !near_edge && rng.gen_bool(0.001) {
        place_shipwreck(wx, h, wz, block_data);
    }
}

fn place_shipwreck(wx: i32, h: i32, wz: i32, block_data: &mut HashMap<BlockKey, BlockId>) {
    // A minimal wrecked hull: a 5x2x3 planked box resting on the seabed.
    for dx in 0..5 {
        for dz in 0..3 {
            block_data.insert((wx + dx, h, wz + dz), BlockId::DARK_PLANKS);
        }
    }
    for dx in [0, 4] {
        for dy in 1..3 {
            block_data.insert((wx + dx, h + dy, wz), BlockId::DARK_PLANKS);
        }
    }
}

fn generate_surface_column(
    wx: i32,
    wz: i32,
    h: i32,
    biome: Biome,
    rng: &mut StdRng,
    rooms: &[RoomBox],
    local_x: i32,
    local_z: i32,
    block_data: &mut HashMap<BlockKey, BlockId>,
) {
    let (surface, subsurface) = match biome {
        Biome::Desert => (BlockId::SAND, BlockId::SAND),
        Biome::Swamp => (BlockId::SWAMP_GRASS, BlockId::DIRT),
        _ => (BlockId::GRASS, BlockId::DIRT),
    };

    if !room_hides(rooms, local_x, h, local_z) {
        block_data.insert((wx, h, wz), surface);
    }
    if !room_hides(rooms, local_x, h - 1, local_z) {
        block_data.insert((wx, h - 1, wz), subsurface);
    }

    // 11 layers below the subsurface, plus a 12th bedrock layer: the
    // bottom two of the 11 (i == 9, 10) are plain stone, layer 12
    // (i == 11) is end_stone, and the remaining interior layers are stone
    // except for a 5% gold_ore roll.
    for i in 0..12i32 {
        let y = h - 2 - i;
        if room_hides(rooms, local_x, y, local_z) {
            continue;
        }
        let ty = if i == 11 {
            BlockId::END_STONE
        } else if i >= 9 {
            BlockId::STONE
        } else if rng.gen_bool(0.05) {
            BlockId::GOLD_ORE
        } else {
            BlockId::STONE
        };
        block_data.insert((wx, y, wz), ty);
    }
}

fn room_hides(rooms: &[RoomBox], local_x: i32, y: i32, local_z: i32) -> bool {
    rooms.iter().any(|r| r.contains(local_x, y, local_z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockRegistry;
    use rand::SeedableRng;

    #[test]
    fn seed_42_chunk_0_0_has_stone_two_below_surface() {
        let registry = BlockRegistry::with_defaults();
        let deltas = HashMap::new();
        let out = super::super::generate(ChunkPos::new(0, 0), 42, &deltas, &registry);
        let (h, biome) = column_height(0.0, 0.0, 42.0);
        if h >= SEA_LEVEL {
            assert_eq!(out.block_data.get(&(0, h - 2, 0)), Some(&BlockId::STONE));
            if biome == Biome::Plains {
                assert_eq!(out.block_data.get(&(0, h, 0)), Some(&BlockId::GRASS));
            }
        }
    }

    #[test]
    fn chunk_determinism_seed_123_chunk_3_neg2() {
        let registry = BlockRegistry::with_defaults();
        let deltas = HashMap::new();
        let pos = ChunkPos::new(3, -2);
        let a = super::super::generate(pos, 123, &deltas, &registry);
        let b = super::super::generate(pos, 123, &deltas, &registry);
        let mut a_sorted: Vec<_> = a.block_data.into_iter().collect();
        let mut b_sorted: Vec<_> = b.block_data.into_iter().collect();
        a_sorted.sort();
        b_sorted.sort();
        assert_eq!(a_sorted, b_sorted);
    }

    #[test]
    fn each_chunk_rolls_exactly_two_rooms() {
        let mut rng = StdRng::seed_from_u64(1);
        let rooms = roll_rooms(&mut rng);
        assert_eq!(rooms.len(), 2);
    }
}
