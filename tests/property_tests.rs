//! Property tests for the invariants listed in spec §8. These run the
//! public surface against `proptest`-generated inputs rather than fixed
//! examples, complementing the unit tests that live alongside each module.

use proptest::prelude::*;
use std::collections::HashMap;
use voxel_world_engine::block::{BlockId, BlockRegistry};
use voxel_world_engine::coords::ChunkPos;
use voxel_world_engine::physics::{self, MovementInput, PlayerState, TerrainQuery};
use voxel_world_engine::world::generation::{self, BlockKey};

fn small_seed() -> impl Strategy<Value = u32> {
    0u32..10_000
}

fn small_chunk_coord() -> impl Strategy<Value = i32> {
    -50i32..50
}

proptest! {
    /// §8 invariant 1: two independent generator runs on the same
    /// `(seed, cx, cz)` with no deltas produce byte-equal output.
    #[test]
    fn generator_is_deterministic(seed in small_seed(), cx in small_chunk_coord(), cz in small_chunk_coord()) {
        let registry = BlockRegistry::with_defaults();
        let pos = ChunkPos::new(cx, cz);
        let deltas = HashMap::new();

        let a = generation::generate(pos, seed, &deltas, &registry);
        let b = generation::generate(pos, seed, &deltas, &registry);

        let mut a_blocks: Vec<_> = a.block_data.into_iter().collect();
        let mut b_blocks: Vec<_> = b.block_data.into_iter().collect();
        a_blocks.sort();
        b_blocks.sort();
        prop_assert_eq!(a_blocks, b_blocks);

        let mut a_solid = a.solid_blocks;
        let mut b_solid = b.solid_blocks;
        a_solid.sort();
        b_solid.sort();
        prop_assert_eq!(a_solid, b_solid);

        let mut a_visible = a.visible_keys;
        let mut b_visible = b.visible_keys;
        a_visible.sort();
        b_visible.sort();
        prop_assert_eq!(a_visible, b_visible);
    }

    /// §8 invariant 2: an opaque block is in `visible_keys` iff at least
    /// one of its six neighbors is non-occluding.
    #[test]
    fn visibility_matches_occlusion_rule(seed in small_seed(), cx in small_chunk_coord(), cz in small_chunk_coord()) {
        let registry = BlockRegistry::with_defaults();
        let pos = ChunkPos::new(cx, cz);
        let deltas = HashMap::new();
        let out = generation::generate(pos, seed, &deltas, &registry);
        let visible: std::collections::HashSet<BlockKey> = out.visible_keys.into_iter().collect();

        for (&(x, y, z), &id) in out.block_data.iter() {
            let props = registry.properties(id);
            if !props.is_occluding() {
                continue; // non-opaque blocks are always visible, not under test here
            }
            let any_open = [
                (x + 1, y, z), (x - 1, y, z),
                (x, y + 1, z), (x, y - 1, z),
                (x, y, z + 1), (x, y, z - 1),
            ]
            .iter()
            .any(|n| {
                out.block_data.get(n).map(|&nid| !registry.properties(nid).is_occluding()).unwrap_or(true)
            });
            prop_assert_eq!(visible.contains(&(x, y, z)), any_open);
        }
    }

    /// §8 invariant 4: a delta always wins over whatever generation
    /// produced at that key, for any seed/chunk/override type.
    #[test]
    fn delta_always_overrides_generation(
        seed in small_seed(),
        cx in small_chunk_coord(),
        cz in small_chunk_coord(),
        lx in 0i32..16,
        ly in -10i32..70,
        lz in 0i32..16,
        override_id in prop_oneof![
            Just(BlockId::AIR),
            Just(BlockId::DIAMOND),
            Just(BlockId::OBSIDIAN),
            Just(BlockId::GOLD_BLOCK),
        ],
    ) {
        let registry = BlockRegistry::with_defaults();
        let pos = ChunkPos::new(cx, cz);
        let (ox, oz) = pos.origin();
        let key: BlockKey = (ox + lx, ly, oz + lz);

        let mut deltas = HashMap::new();
        deltas.insert(key, override_id);

        let out = generation::generate(pos, seed, &deltas, &registry);
        if override_id == BlockId::AIR {
            prop_assert!(!out.block_data.contains_key(&key));
        } else {
            prop_assert_eq!(out.block_data.get(&key), Some(&override_id));
        }
    }

    /// §8 invariant 6: `end_stone` can never be removed through the
    /// ordinary mutation path, for any target position.
    #[test]
    fn bedrock_is_never_removable(x in -1000i32..1000, y in -30i32..30, z in -1000i32..1000) {
        use voxel_world_engine::world::chunk::Chunk;
        use std::sync::Arc;

        let registry = Arc::new(BlockRegistry::with_defaults());
        let chunk_pos = voxel_world_engine::coords::VoxelPos::new(x, y, z).chunk_pos();
        let mut chunk = Chunk::new(chunk_pos, registry);
        let mut no_neighbors = |_: BlockKey| -> Option<BlockId> { None };

        chunk.add_block_dynamic((x, y, z), BlockId::END_STONE, &mut no_neighbors).unwrap();
        let result = chunk.remove_block((x, y, z), &mut no_neighbors);
        prop_assert!(result.is_err());
        prop_assert_eq!(chunk.block((x, y, z)), Some(BlockId::END_STONE));
    }

    /// §8 invariant 3: placing then removing a block at the same key
    /// round-trips `solid_blocks`/`visible_keys` back to their prior state,
    /// for any non-bedrock block type and any position.
    #[test]
    fn place_then_remove_round_trips(
        x in -1000i32..1000, y in -30i32..30, z in -1000i32..1000,
        ty in prop_oneof![Just(BlockId::STONE), Just(BlockId::DIRT), Just(BlockId::WOOD), Just(BlockId::SAND)],
    ) {
        use voxel_world_engine::world::chunk::Chunk;
        use std::sync::Arc;

        let registry = Arc::new(BlockRegistry::with_defaults());
        let chunk_pos = voxel_world_engine::coords::VoxelPos::new(x, y, z).chunk_pos();
        let mut chunk = Chunk::new(chunk_pos, registry);
        let mut no_neighbors = |_: BlockKey| -> Option<BlockId> { None };

        let before_solid = format!("{:?}", chunk.is_solid((x, y, z)));
        let before_visible = format!("{:?}", chunk.is_visible((x, y, z)));

        chunk.add_block_dynamic((x, y, z), ty, &mut no_neighbors).unwrap();
        chunk.add_block_dynamic((x, y, z), BlockId::AIR, &mut no_neighbors).unwrap();

        prop_assert_eq!(format!("{:?}", chunk.is_solid((x, y, z))), before_solid);
        prop_assert_eq!(format!("{:?}", chunk.is_visible((x, y, z))), before_visible);
    }
}

/// Synthetic terrain for no-tunneling checks: a single solid wall at
/// `x == WALL_X`, open everywhere else.
struct WallWorld {
    wall_x: i32,
}

impl TerrainQuery for WallWorld {
    fn is_solid(&self, x: i32, _y: i32, _z: i32) -> bool {
        x == self.wall_x
    }
}

proptest! {
    /// §8 invariant 5 (no-tunneling): starting outside the wall and moving
    /// toward it at any speed/dt combination within the engine's clamps,
    /// the player is never found occupying the wall cell after one step.
    #[test]
    fn no_tunneling_through_a_wall(
        start_x in -5.0f32..4.0,
        dt in 0.001f32..0.2,
        frames in 1u32..120,
    ) {
        let terrain = WallWorld { wall_x: 5 };
        // yaw = pi/2 so `forward = (sin(yaw), 0, cos(yaw)) = (1, 0, 0)`,
        // driving straight toward the wall along x.
        let mut state = PlayerState {
            position: cgmath::Point3::new(start_x, 10.0, 0.0),
            yaw: std::f32::consts::FRAC_PI_2,
            ..PlayerState::default()
        };
        let input = MovementInput { forward: true, ..MovementInput::default() };

        for _ in 0..frames {
            physics::step(&mut state, input, &terrain, dt);
            // The player may come to rest flush against the wall's face but
            // must never cross to the far side of it (no clean tunneling).
            prop_assert!(state.position.x < terrain.wall_x as f32 + 0.5);
        }
    }
}
