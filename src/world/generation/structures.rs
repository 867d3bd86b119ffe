//! Vegetation, structures, clouds and floating islands (spec §4.2 steps 4-6).

use super::{world_xz, BlockKey, EntityAnchors, GenericAnchor, COLUMN_RANGE};
use crate::block::BlockId;
use crate::constants::CHUNK_SIZE;
use crate::coords::ChunkPos;
use crate::noise::{column_height, noise, Biome};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};

pub fn generate_chunk_features(
    pos: ChunkPos,
    seed: u32,
    rng: &mut StdRng,
    block_data: &mut HashMap<BlockKey, BlockId>,
    entities: &mut EntityAnchors,
) {
    let seed_f = seed as f32;

    for local_x in COLUMN_RANGE {
        for local_z in COLUMN_RANGE {
            let (wx, wz) = world_xz(pos, local_x, local_z);
            let (h, biome) = column_height(wx as f32, wz as f32, seed_f);
            if !block_data.contains_key(&(wx, h, wz)) {
                continue; // underwater column, no surface vegetation
            }
            place_vegetation(wx, h, wz, biome, rng, block_data, entities);
        }
    }

    place_cloud_plane(pos, seed_f, block_data);
    maybe_place_cloud_cluster(rng, pos, block_data);
    maybe_place_floating_island(rng, pos, block_data, entities);
}

fn place_vegetation(
    wx: i32,
    h: i32,
    wz: i32,
    biome: Biome,
    rng: &mut StdRng,
    block_data: &mut HashMap<BlockKey, BlockId>,
    entities: &mut EntityAnchors,
) {
    let top = (wx, h + 1, wz);
    match biome {
        Biome::Forest => {
            if rng.gen_bool(0.04) {
                if rng.gen_bool(0.15) {
                    let collision_blocks = vec![top];
                    entities.realistic_trees.push(top);
                    entities.generic.push(GenericAnchor { kind: "realistic_tree", position: top, collision_blocks });
                } else {
                    place_big_tree(wx, h + 1, wz, block_data);
                }
            }
        }
        Biome::Azalea => {
            if rng.gen_bool(0.045) {
                place_azalea_tree(wx, h + 1, wz, block_data);
            }
        }
        Biome::Swamp => {
            if rng.gen_bool(0.03) {
                place_swamp_tree(wx, h + 1, wz, block_data);
            }
        }
        Biome::Desert => {
            if rng.gen_bool(0.01) {
                block_data.insert(top, BlockId::CACTUS);
            } else if rng.gen_bool(0.0005) {
                let collision_blocks = vec![top];
                entities.rovers.push(top);
                entities.generic.push(GenericAnchor { kind: "rover", position: top, collision_blocks });
            }
        }
        Biome::Plains => {
            if rng.gen_bool(0.0005) {
                let collision_blocks = vec![top];
                entities.gun_men.push(top);
                entities.generic.push(GenericAnchor { kind: "gun_man", position: top, collision_blocks });
            } else if rng.gen_bool(0.005) {
                place_big_tree(wx, h + 1, wz, block_data);
            } else if rng.gen_bool(0.05) {
                block_data.insert(top, BlockId::SHORT_GRASS);
            } else if rng.gen_bool(0.05) {
                let flower = if rng.gen_bool(1.0 / 3.0) { BlockId::ALLIUM } else { BlockId::FLOWER };
                block_data.insert(top, flower);
            }

            if rng.gen_bool(0.001) {
                place_house(wx, h + 1, wz, block_data, entities);
            }
        }
    }
}

fn place_big_tree(wx: i32, base_y: i32, wz: i32, block_data: &mut HashMap<BlockKey, BlockId>) {
    for dy in 0..5 {
        block_data.insert((wx, base_y + dy, wz), BlockId::WOOD);
    }
    for dx in -2..=2i32 {
        for dz in -2..=2i32 {
            for dy in 3..6 {
                if dx.abs() + dz.abs() <= 3 {
                    block_data.entry((wx + dx, base_y + dy, wz + dz)).or_insert(BlockId::LEAVES);
                }
            }
        }
    }
}

fn place_azalea_tree(wx: i32, base_y: i32, wz: i32, block_data: &mut HashMap<BlockKey, BlockId>) {
    for dy in 0..4 {
        block_data.insert((wx, base_y + dy, wz), BlockId::AZALEA_LOG);
    }
    for dx in -2..=2i32 {
        for dz in -2..=2i32 {
            for dy in 2..5 {
                if dx.abs() + dz.abs() <= 2 {
                    block_data.entry((wx + dx, base_y + dy, wz + dz)).or_insert(BlockId::AZALEA_LEAVES);
                }
            }
        }
    }
}

fn place_swamp_tree(wx: i32, base_y: i32, wz: i32, block_data: &mut HashMap<BlockKey, BlockId>) {
    for dy in 0..4 {
        block_data.insert((wx, base_y + dy, wz), BlockId::WOOD);
    }
    // Wide canopy.
    for dx in -3..=3i32 {
        for dz in -3..=3i32 {
            if dx.abs() + dz.abs() <= 4 {
                block_data.entry((wx + dx, base_y + 3, wz + dz)).or_insert(BlockId::YELLOW_LEAVES);
            }
        }
    }
    // Hanging vines beneath the canopy edge.
    for dx in [-3, 3] {
        block_data.insert((wx + dx, base_y + 2, wz), BlockId::VINE);
        block_data.insert((wx + dx, base_y + 1, wz), BlockId::VINE);
    }
}

fn place_house(
    wx: i32,
    base_y: i32,
    wz: i32,
    block_data: &mut HashMap<BlockKey, BlockId>,
    entities: &mut EntityAnchors,
) {
    let mut collision_blocks = Vec::new();
    for dx in 0..4 {
        for dz in 0..4 {
            for dy in 0..3 {
                let edge = dx == 0 || dx == 3 || dz == 0 || dz == 3;
                if edge {
                    let key = (wx + dx, base_y + dy, wz + dz);
                    block_data.insert(key, BlockId::WHITE_PLANKS);
                    collision_blocks.push(key);
                }
            }
        }
    }
    block_data.insert((wx + 1, base_y + 3, wz + 1), BlockId::CHIMNEY);
    entities.generic.push(GenericAnchor { kind: "house", position: (wx, base_y, wz), collision_blocks });
}

fn place_cloud_plane(pos: ChunkPos, seed: f32, block_data: &mut HashMap<BlockKey, BlockId>) {
    for local_x in COLUMN_RANGE {
        for local_z in COLUMN_RANGE {
            let (wx, wz) = world_xz(pos, local_x, local_z);
            if noise(wx as f32, wz as f32, 0.03, seed) > 1.2 {
                block_data.insert((wx, 55, wz), BlockId::CLOUD);
            }
        }
    }
}

fn maybe_place_cloud_cluster(rng: &mut StdRng, pos: ChunkPos, block_data: &mut HashMap<BlockKey, BlockId>) {
    if !rng.gen_bool(0.20) {
        return;
    }
    let target = rng.gen_range(30..=50);
    let (ox, oz) = pos.origin();
    let start = (ox + CHUNK_SIZE / 2, 35, oz + CHUNK_SIZE / 2);

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);
    visited.insert(start);

    while let Some(cell) = queue.pop_front() {
        if visited.len() > target {
            break;
        }
        block_data.insert(cell, BlockId::CLOUD);
        let (x, y, z) = cell;
        let neighbors = [
            (x + 1, y, z), (x - 1, y, z),
            (x, y, z + 1), (x, y, z - 1),
            (x, y + 1, z), (x, y - 1, z),
        ];
        for n in neighbors {
            if visited.len() >= target {
                break;
            }
            if visited.insert(n) && rng.gen_bool(0.6) {
                queue.push_back(n);
            }
        }
    }
}

fn maybe_place_floating_island(
    rng: &mut StdRng,
    pos: ChunkPos,
    block_data: &mut HashMap<BlockKey, BlockId>,
    entities: &mut EntityAnchors,
) {
    if !rng.gen_bool(0.08) {
        return;
    }
    let (ox, oz) = pos.origin();
    let cx = ox + CHUNK_SIZE / 2;
    let cz = oz + CHUNK_SIZE / 2;
    let base_y = rng.gen_range(40..70);
    let height = rng.gen_range(4..8);
    let max_radius = rng.gen_range(5..10) as f32;

    let mut top_cells: Vec<(i32, i32, i32)> = Vec::new();
    for layer in 0..height {
        let shrink = (layer as f32 / height as f32).powf(0.7);
        let radius = (max_radius * (1.0 - shrink)).max(1.0);
        let y = base_y + layer;
        let is_top = layer == height - 1;
        let r = radius as i32;
        for dx in -r..=r {
            for dz in -r..=r {
                if ((dx * dx + dz * dz) as f32) <= radius * radius {
                    let key = (cx + dx, y, cz + dz);
                    let ty = if is_top { BlockId::SKY_GRASS } else { BlockId::SKY_STONE };
                    block_data.insert(key, ty);
                    if is_top {
                        top_cells.push(key);
                    }
                }
            }
        }
    }

    for &(x, y, z) in &top_cells {
        if rng.gen_bool(0.10) {
            place_sky_tree(x, y + 1, z, block_data);
        }
    }

    if let Some(&(ax, ay, az)) = top_cells.first() {
        block_data.insert((ax, ay + 1, az), BlockId::CHEST);
        entities.generic.push(GenericAnchor {
            kind: "floating_island_chest",
            position: (ax, ay + 1, az),
            collision_blocks: Vec::new(),
        });
    }
}

fn place_sky_tree(wx: i32, base_y: i32, wz: i32, block_data: &mut HashMap<BlockKey, BlockId>) {
    for dy in 0..3 {
        block_data.insert((wx, base_y + dy, wz), BlockId::SKY_WOOD);
    }
    for dx in -1..=1i32 {
        for dz in -1..=1i32 {
            block_data.entry((wx + dx, base_y + 2, wz + dz)).or_insert(BlockId::SKY_LEAVES);
        }
    }
}
