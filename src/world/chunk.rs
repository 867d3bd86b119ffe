//! Chunk data and mutation operations (spec §4.3, §4.9).

use crate::block::{BlockId, BlockRegistry};
use crate::coords::{ChunkPos, VoxelPos};
use crate::error::{EngineError, EngineResult};
use crate::world::generation::{ambient_occlusion, is_occluding_at, BlockKey, EntityAnchors, GenOutput, InstancePos};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Pending,
    Generating,
    Ready,
    Unloading,
    Disposed,
}

pub struct Chunk {
    pub pos: ChunkPos,
    pub state: ChunkState,
    registry: Arc<BlockRegistry>,

    solid_blocks: HashSet<BlockKey>,
    block_data: HashMap<BlockKey, BlockId>,
    visible_keys: HashSet<BlockKey>,
    deltas: HashMap<BlockKey, BlockId>,
    render_buckets: HashMap<BlockId, Vec<InstancePos>>,
    entities: EntityAnchors,
}

impl Chunk {
    /// Construct a not-yet-ready chunk. The caller (`World`) is
    /// responsible for dispatching the generation request and, once the
    /// worker replies, calling `on_gen_complete`.
    pub fn new(pos: ChunkPos, registry: Arc<BlockRegistry>) -> Self {
        Self {
            pos,
            state: ChunkState::Pending,
            registry,
            solid_blocks: HashSet::new(),
            block_data: HashMap::new(),
            visible_keys: HashSet::new(),
            deltas: HashMap::new(),
            render_buckets: HashMap::new(),
            entities: EntityAnchors::default(),
        }
    }

    pub fn mark_generating(&mut self) {
        if self.state == ChunkState::Pending {
            self.state = ChunkState::Generating;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == ChunkState::Ready
    }

    /// Apply generator output (spec §4.3 `on_gen_complete`). Any deltas
    /// recorded while the chunk was still `Pending`/`Generating` were
    /// already folded into `out` by the generator (it's handed the
    /// up-to-date delta map before it runs), so this purely replaces
    /// state rather than merging twice.
    pub fn on_gen_complete(&mut self, out: GenOutput) {
        self.solid_blocks = out.solid_blocks.into_iter().collect();
        self.block_data = out.block_data;
        self.visible_keys = out.visible_keys.into_iter().collect();
        self.render_buckets = out.render_buckets;
        self.entities = out.entities;

        for anchor in &self.entities.generic {
            for &key in &anchor.collision_blocks {
                self.solid_blocks.insert(key);
            }
        }

        self.state = ChunkState::Ready;
    }

    pub fn block(&self, key: BlockKey) -> Option<BlockId> {
        self.block_data.get(&key).copied()
    }

    pub fn is_solid(&self, key: BlockKey) -> bool {
        self.solid_blocks.contains(&key)
    }

    pub fn is_visible(&self, key: BlockKey) -> bool {
        self.visible_keys.contains(&key)
    }

    pub fn render_buckets(&self) -> &HashMap<BlockId, Vec<InstancePos>> {
        &self.render_buckets
    }

    pub fn entities(&self) -> &EntityAnchors {
        &self.entities
    }

    /// A copy of this chunk's accumulated deltas, for persistence flush.
    pub fn delta_snapshot(&self) -> HashMap<BlockKey, BlockId> {
        self.deltas.clone()
    }

    /// Seed this chunk's deltas before generation runs (used when
    /// reloading from the persistence store).
    pub fn seed_deltas(&mut self, deltas: HashMap<BlockKey, BlockId>) {
        self.deltas = deltas;
    }

    pub fn deltas(&self) -> &HashMap<BlockKey, BlockId> {
        &self.deltas
    }

    fn contains(&self, key: BlockKey) -> bool {
        VoxelPos::new(key.0, key.1, key.2).chunk_pos() == self.pos
    }

    /// Authoritative mutation (spec §4.3). `neighbor_block` resolves the
    /// type of a position that belongs to a *different* chunk — the only
    /// way this chunk is allowed to see neighbor state (§9 design note:
    /// "it accepts World as an explicit argument"). Returns the set of
    /// neighbor keys that fell outside this chunk, for the caller to
    /// delegate to `check_reveal` on the owning chunk.
    pub fn add_block_dynamic(
        &mut self,
        key: BlockKey,
        ty: BlockId,
        neighbor_block: &mut dyn FnMut(BlockKey) -> Option<BlockId>,
    ) -> EngineResult<Vec<BlockKey>> {
        if let Some(&old) = self.block_data.get(&key) {
            if old == BlockId::END_STONE && ty == BlockId::AIR {
                return Err(EngineError::InvalidMutation("end_stone is bedrock".into()));
            }
        }

        self.hide_instance(key);

        if ty == BlockId::AIR {
            self.block_data.remove(&key);
            self.visible_keys.remove(&key);
            self.solid_blocks.remove(&key);
        } else {
            self.block_data.insert(key, ty);
            if self.registry.is_solid(ty) {
                self.solid_blocks.insert(key);
            } else {
                self.solid_blocks.remove(&key);
            }
        }
        self.deltas.insert(key, ty);

        self.recompute_visibility(key, neighbor_block);

        let mut external = Vec::new();
        for n in VoxelPos::new(key.0, key.1, key.2).neighbors() {
            let nk = (n.x, n.y, n.z);
            if self.contains(nk) {
                self.recompute_visibility(nk, neighbor_block);
            } else {
                external.push(nk);
            }
        }
        Ok(external)
    }

    /// Cross-chunk reveal/hide helper (spec §4.3 `check_reveal`), invoked
    /// by `World` on the chunk that owns `key` after a neighboring chunk's
    /// mutation.
    pub fn check_reveal(&mut self, key: BlockKey, neighbor_block: &mut dyn FnMut(BlockKey) -> Option<BlockId>) {
        self.recompute_visibility(key, neighbor_block);
    }

    pub fn remove_block(&mut self, key: BlockKey, neighbor_block: &mut dyn FnMut(BlockKey) -> Option<BlockId>) -> EngineResult<Vec<BlockKey>> {
        self.add_block_dynamic(key, BlockId::AIR, neighbor_block)
    }

    /// Used when an entity model is destroyed: removes both the collider
    /// cell and any associated block data, exactly like `remove_block`.
    pub fn remove_collision_key(&mut self, key: BlockKey, neighbor_block: &mut dyn FnMut(BlockKey) -> Option<BlockId>) -> EngineResult<Vec<BlockKey>> {
        self.solid_blocks.remove(&key);
        self.add_block_dynamic(key, BlockId::AIR, neighbor_block)
    }

    fn recompute_visibility(&mut self, key: BlockKey, neighbor_block: &mut dyn FnMut(BlockKey) -> Option<BlockId>) {
        let Some(&id) = self.block_data.get(&key) else {
            self.visible_keys.remove(&key);
            return;
        };

        let props = self.registry.properties(id);
        let should_be_visible = if !props.is_occluding() {
            true
        } else {
            let (x, y, z) = key;
            [
                (x + 1, y, z), (x - 1, y, z),
                (x, y + 1, z), (x, y - 1, z),
                (x, y, z + 1), (x, y, z - 1),
            ]
            .iter()
            .any(|&n| !self.occluding_at(n, neighbor_block))
        };

        let currently_visible = self.visible_keys.contains(&key);
        if should_be_visible && !currently_visible {
            self.visible_keys.insert(key);
            self.show_instance(key, id);
        } else if !should_be_visible && currently_visible {
            self.visible_keys.remove(&key);
            self.hide_instance_for(key, id);
        }
    }

    fn occluding_at(&self, key: BlockKey, neighbor_block: &mut dyn FnMut(BlockKey) -> Option<BlockId>) -> bool {
        if self.contains(key) {
            is_occluding_at(&self.block_data, &self.registry, key)
        } else {
            neighbor_block(key)
                .map(|id| self.registry.is_occluding(id))
                .unwrap_or(false)
        }
    }

    fn show_instance(&mut self, key: BlockKey, id: BlockId) {
        let props = self.registry.properties(id);
        let (ao_low, ao_high) = if props.is_ao_enabled {
            ambient_occlusion(&self.block_data, &self.registry, key.0, key.1, key.2)
        } else {
            (0, 0)
        };
        self.render_buckets.entry(id).or_default().push(InstancePos {
            x: key.0 as f32 + 0.5,
            y: key.1 as f32 + 0.5,
            z: key.2 as f32 + 0.5,
            ao_low,
            ao_high,
        });
    }

    fn hide_instance(&mut self, key: BlockKey) {
        if let Some(&old_id) = self.block_data.get(&key) {
            self.hide_instance_for(key, old_id);
        }
    }

    fn hide_instance_for(&mut self, key: BlockKey, id: BlockId) {
        if let Some(vec) = self.render_buckets.get_mut(&id) {
            let target = (key.0 as f32 + 0.5, key.1 as f32 + 0.5, key.2 as f32 + 0.5);
            if let Some(idx) = vec.iter().position(|ip| (ip.x, ip.y, ip.z) == target) {
                vec.swap_remove(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_neighbors(_: BlockKey) -> Option<BlockId> {
        None
    }

    #[test]
    fn bedrock_removal_is_rejected() {
        let registry = Arc::new(BlockRegistry::with_defaults());
        let mut chunk = Chunk::new(ChunkPos::new(0, 0), registry);
        chunk.block_data.insert((0, 0, 0), BlockId::END_STONE);
        chunk.solid_blocks.insert((0, 0, 0));
        let mut cb = no_neighbors;
        let result = chunk.remove_block((0, 0, 0), &mut cb);
        assert!(result.is_err());
        assert_eq!(chunk.block((0, 0, 0)), Some(BlockId::END_STONE));
    }

    #[test]
    fn place_then_remove_round_trips_to_prior_state() {
        let registry = Arc::new(BlockRegistry::with_defaults());
        let mut chunk = Chunk::new(ChunkPos::new(0, 0), registry);
        let mut cb = no_neighbors;

        let key = (5, 10, 5);
        let before_solid = chunk.solid_blocks.clone();
        let before_visible = chunk.visible_keys.clone();

        chunk.add_block_dynamic(key, BlockId::STONE, &mut cb).unwrap();
        assert!(chunk.is_solid(key));
        chunk.add_block_dynamic(key, BlockId::AIR, &mut cb).unwrap();

        assert_eq!(chunk.solid_blocks, before_solid);
        assert_eq!(chunk.visible_keys, before_visible);
    }

    #[test]
    fn placing_opaque_neighbor_hides_previously_visible_block() {
        let registry = Arc::new(BlockRegistry::with_defaults());
        let mut chunk = Chunk::new(ChunkPos::new(0, 0), registry);
        let mut cb = no_neighbors;

        // Isolated stone block: visible (all neighbors are air).
        chunk.add_block_dynamic((0, 0, 0), BlockId::STONE, &mut cb).unwrap();
        assert!(chunk.is_visible((0, 0, 0)));

        // Surround it on all six sides with stone; it should become hidden.
        for n in VoxelPos::new(0, 0, 0).neighbors() {
            chunk.add_block_dynamic((n.x, n.y, n.z), BlockId::STONE, &mut cb).unwrap();
        }
        assert!(!chunk.is_visible((0, 0, 0)));
    }

    #[test]
    fn removing_opaque_neighbor_reveals_hidden_block() {
        let registry = Arc::new(BlockRegistry::with_defaults());
        let mut chunk = Chunk::new(ChunkPos::new(0, 0), registry);
        let mut cb = no_neighbors;

        chunk.add_block_dynamic((0, 0, 0), BlockId::STONE, &mut cb).unwrap();
        for n in VoxelPos::new(0, 0, 0).neighbors() {
            chunk.add_block_dynamic((n.x, n.y, n.z), BlockId::STONE, &mut cb).unwrap();
        }
        assert!(!chunk.is_visible((0, 0, 0)));

        chunk.remove_block((1, 0, 0), &mut cb).unwrap();
        assert!(chunk.is_visible((0, 0, 0)));
    }
}
