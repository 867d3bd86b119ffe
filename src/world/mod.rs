//! The top-level streaming world (spec §4.4): owns every loaded chunk, the
//! generation worker pool, and the persistence service, and exposes the
//! block-level query/mutation surface the player controller and physics
//! layer sit on top of.

pub mod chunk;
pub mod generation;
pub mod ray;

pub use chunk::{Chunk, ChunkState};
pub use generation::BlockKey;

use crate::block::{BlockId, BlockRegistry};
use crate::coords::{ChunkPos, VoxelPos};
use crate::error::{EngineError, EngineResult};
use crate::noise::raw_height;
use crate::persistence::PersistenceService;
use crate::worker::{TaskId, WorkerPool};
use std::collections::HashMap;
use std::sync::Arc;

/// Chunks beyond `render_distance + UNLOAD_HYSTERESIS` are dropped; this
/// slack stops a player standing near a chunk boundary from thrashing
/// load/unload every frame.
const UNLOAD_HYSTERESIS: i32 = 1;

pub struct World {
    seed: u32,
    registry: Arc<BlockRegistry>,
    chunks: HashMap<ChunkPos, Chunk>,
    render_distance: i32,
    gen_pool: WorkerPool<(ChunkPos, generation::GenOutput)>,
    pending_generation: HashMap<TaskId, ChunkPos>,
    persistence: PersistenceService,
}

impl World {
    pub fn new(seed: u32, registry: Arc<BlockRegistry>, persistence: PersistenceService, render_distance: i32) -> Self {
        Self {
            seed,
            registry,
            chunks: HashMap::new(),
            render_distance,
            gen_pool: WorkerPool::new(crate::worker::default_worker_count()),
            pending_generation: HashMap::new(),
            persistence,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Drive chunk streaming and drain completed background work. Called
    /// once per frame/tick; never blocks (spec §5).
    pub fn update(&mut self, focus: VoxelPos) {
        let focus_chunk = focus.chunk_pos();

        let desired: Vec<ChunkPos> = focus_chunk.neighborhood(self.render_distance).collect();
        for pos in &desired {
            self.chunks.entry(*pos).or_insert_with(|| Chunk::new(*pos, self.registry.clone()));
        }

        let unload_radius = self.render_distance + UNLOAD_HYSTERESIS;
        let to_unload: Vec<ChunkPos> = self
            .chunks
            .keys()
            .copied()
            .filter(|p| p.chebyshev_distance(focus_chunk) > unload_radius)
            .collect();
        for pos in to_unload {
            self.persistence.flush(pos);
            self.chunks.remove(&pos);
        }

        let to_generate: Vec<ChunkPos> = self
            .chunks
            .iter()
            .filter(|(_, c)| c.state == ChunkState::Pending)
            .map(|(p, _)| *p)
            .collect();
        for pos in to_generate {
            let deltas = self.persistence.get_deltas(pos);
            let seed = self.seed;
            let registry = self.registry.clone();
            let task = self.gen_pool.submit(move || {
                let out = generation::generate(pos, seed, &deltas, &registry);
                (pos, out)
            });
            self.pending_generation.insert(task, pos);
            if let Some(chunk) = self.chunks.get_mut(&pos) {
                chunk.mark_generating();
            }
        }

        for (task, (pos, out)) in self.gen_pool.poll().into_iter().map(|(t, r)| (t, r)) {
            self.pending_generation.remove(&task);
            if let Some(chunk) = self.chunks.get_mut(&pos) {
                chunk.on_gen_complete(out);
            }
        }

        self.persistence.poll_flush_results();
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn get_block(&self, key: BlockKey) -> Option<BlockId> {
        let pos = VoxelPos::new(key.0, key.1, key.2).chunk_pos();
        self.chunks.get(&pos)?.block(key)
    }

    /// True if the cell at `key` blocks movement. Falls back to the raw,
    /// pre-biome-adjustment noise height (spec §4.4: `y ≤ h_raw_noise(x,z)`)
    /// when the owning chunk isn't ready yet, so physics never has to wait
    /// on a worker result (spec §9 "fallback solidity check").
    pub fn is_solid(&self, key: BlockKey) -> bool {
        let pos = VoxelPos::new(key.0, key.1, key.2).chunk_pos();
        match self.chunks.get(&pos) {
            Some(chunk) if chunk.is_ready() => chunk.is_solid(key),
            _ => {
                let h = raw_height(key.0 as f32, key.2 as f32, self.seed as f32);
                key.1 as f32 <= h
            }
        }
    }

    pub fn is_visible(&self, key: BlockKey) -> bool {
        let pos = VoxelPos::new(key.0, key.1, key.2).chunk_pos();
        self.chunks.get(&pos).map(|c| c.is_visible(key)).unwrap_or(false)
    }

    /// Place or remove a single block (spec §4.3). Propagates the
    /// visibility update into same-chunk neighbors immediately and into
    /// cross-chunk neighbors via `check_reveal`, then records the change
    /// for persistence.
    pub fn set_block(&mut self, key: BlockKey, ty: BlockId) -> EngineResult<()> {
        let pos = VoxelPos::new(key.0, key.1, key.2).chunk_pos();
        let mut chunk = self
            .chunks
            .remove(&pos)
            .ok_or_else(|| EngineError::InvalidMutation(format!("chunk {pos} not loaded")))?;

        if !chunk.is_ready() {
            self.chunks.insert(pos, chunk);
            return Err(EngineError::InvalidMutation(format!("chunk {pos} not ready")));
        }

        let result = {
            let chunks_ref = &self.chunks;
            let mut neighbor_fn = |k: BlockKey| -> Option<BlockId> {
                let np = VoxelPos::new(k.0, k.1, k.2).chunk_pos();
                chunks_ref.get(&np).and_then(|c| c.block(k))
            };
            chunk.add_block_dynamic(key, ty, &mut neighbor_fn)
        };

        self.chunks.insert(pos, chunk);

        let external = result?;
        self.persistence.record_change(pos, key, ty);
        self.propagate_reveal(external);
        Ok(())
    }

    pub fn remove_block(&mut self, key: BlockKey) -> EngineResult<()> {
        self.set_block(key, BlockId::AIR)
    }

    /// Remove many blocks at once, grouped by owning chunk (used by the
    /// explosion resolver). Chunks that aren't loaded/ready are skipped
    /// silently — an explosion at the edge of loaded terrain only affects
    /// what's actually resident.
    pub fn remove_blocks_batch(&mut self, keys: &[BlockKey]) {
        let mut by_chunk: HashMap<ChunkPos, Vec<BlockKey>> = HashMap::new();
        for &key in keys {
            let pos = VoxelPos::new(key.0, key.1, key.2).chunk_pos();
            by_chunk.entry(pos).or_default().push(key);
        }

        for (pos, chunk_keys) in by_chunk {
            let Some(mut chunk) = self.chunks.remove(&pos) else { continue };
            if !chunk.is_ready() {
                self.chunks.insert(pos, chunk);
                continue;
            }

            let mut all_external = Vec::new();
            {
                let chunks_ref = &self.chunks;
                let mut neighbor_fn = |k: BlockKey| -> Option<BlockId> {
                    let np = VoxelPos::new(k.0, k.1, k.2).chunk_pos();
                    chunks_ref.get(&np).and_then(|c| c.block(k))
                };
                for key in &chunk_keys {
                    if let Ok(external) = chunk.remove_block(*key, &mut neighbor_fn) {
                        all_external.extend(external);
                    }
                }
            }

            for &key in &chunk_keys {
                self.persistence.record_change(pos, key, BlockId::AIR);
            }
            self.chunks.insert(pos, chunk);
            self.propagate_reveal(all_external);
        }
    }

    fn propagate_reveal(&mut self, external: Vec<BlockKey>) {
        for key in external {
            let pos = VoxelPos::new(key.0, key.1, key.2).chunk_pos();
            let Some(mut nchunk) = self.chunks.remove(&pos) else { continue };
            {
                let chunks_ref = &self.chunks;
                let mut neighbor_fn = |k: BlockKey| -> Option<BlockId> {
                    let np = VoxelPos::new(k.0, k.1, k.2).chunk_pos();
                    chunks_ref.get(&np).and_then(|c| c.block(k))
                };
                nchunk.check_reveal(key, &mut neighbor_fn);
            }
            self.chunks.insert(pos, nchunk);
        }
    }

    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn persistence(&self) -> &PersistenceService {
        &self.persistence
    }
}

impl crate::physics::TerrainQuery for World {
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        World::is_solid(self, (x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> World {
        World::new(1, Arc::new(BlockRegistry::with_defaults()), PersistenceService::in_memory(), 1)
    }

    #[test]
    fn update_loads_neighborhood_and_generates() {
        let mut world = test_world();
        world.update(VoxelPos::new(0, 0, 0));
        // First pass only submits generation; poll a few more times to let
        // the worker threads catch up.
        for _ in 0..50 {
            world.update(VoxelPos::new(0, 0, 0));
            if world.chunk(ChunkPos::new(0, 0)).map(|c| c.is_ready()).unwrap_or(false) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(world.loaded_chunk_count(), 9); // (2*1+1)^2
        assert!(world.chunk(ChunkPos::new(0, 0)).unwrap().is_ready());
    }

    #[test]
    fn set_block_rejected_before_chunk_is_ready() {
        let mut world = test_world();
        world.chunks.insert(ChunkPos::new(0, 0), Chunk::new(ChunkPos::new(0, 0), world.registry.clone()));
        let result = world.set_block((0, 5, 0), BlockId::STONE);
        assert!(result.is_err());
    }

    #[test]
    fn is_solid_falls_back_to_height_formula_when_chunk_missing() {
        let world = test_world();
        // Far below any plausible terrain height: should read solid via fallback.
        assert!(world.is_solid((10_000, -100, 10_000)));
    }
}
