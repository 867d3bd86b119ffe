//! Explosion pipeline (spec §4.8): BFS sphere over a snapshot, posted to
//! a worker thread so it never races with live world mutations, with
//! staggered TNT chain reactions.

use crate::block::BlockId;
use crate::constants::explosion::*;
use crate::worker::WorkerPool;
use crate::world::{BlockKey, World};
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

pub struct ExplosionResult {
    pub center: BlockKey,
    pub blocks_to_destroy: Vec<BlockKey>,
    pub tnt_to_ignite: Vec<(BlockKey, Duration)>,
}

/// Pure BFS sphere over a snapshot, run on a worker thread. `igniting`
/// excludes cells already scheduled so a chain never re-enqueues the same
/// TNT (spec §4.8 correctness contract).
fn resolve(
    center: BlockKey,
    radius: i32,
    snapshot: HashMap<BlockKey, BlockId>,
    igniting: HashSet<BlockKey>,
) -> ExplosionResult {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(center);
    visited.insert(center);

    let mut destroy = Vec::new();
    let mut ignite = Vec::new();
    let mut rng = rand::thread_rng();

    while let Some(cell) = queue.pop_front() {
        let (x, y, z) = cell;
        let dist_sq = (x - center.0).pow(2) + (y - center.1).pow(2) + (z - center.2).pow(2);
        if dist_sq > radius * radius {
            continue;
        }

        if let Some(&id) = snapshot.get(&cell) {
            if id == BlockId::END_STONE {
                continue; // bedrock is never destroyed
            }
            if id == BlockId::TNT {
                if !igniting.contains(&cell) {
                    let stagger = rng.gen_range(CHAIN_STAGGER_MS_MIN..=CHAIN_STAGGER_MS_MAX);
                    ignite.push((cell, Duration::from_millis(stagger)));
                }
            } else {
                destroy.push(cell);
            }
        }

        for n in [
            (x + 1, y, z), (x - 1, y, z),
            (x, y + 1, z), (x, y - 1, z),
            (x, y, z + 1), (x, y, z - 1),
        ] {
            if visited.insert(n) {
                queue.push_back(n);
            }
        }
    }

    ExplosionResult { center, blocks_to_destroy: destroy, tnt_to_ignite: ignite }
}

/// Owns the worker pool and the set of cells currently mid-ignition so a
/// TNT can't be scheduled twice (spec §4.8 correctness contract).
pub struct ExplosionService {
    pool: WorkerPool<ExplosionResult>,
    igniting: HashSet<BlockKey>,
}

impl ExplosionService {
    pub fn new() -> Self {
        Self { pool: WorkerPool::new(1), igniting: HashSet::new() }
    }

    /// Snapshot the `SNAPSHOT_RADIUS` neighborhood and post the BFS to the
    /// worker thread. No-op if the cell is already igniting.
    pub fn trigger(&mut self, world: &World, center: BlockKey, radius: i32) {
        if !self.igniting.insert(center) {
            return;
        }

        let r = SNAPSHOT_RADIUS.max(radius);
        let mut snapshot = HashMap::new();
        let (cx, cy, cz) = center;
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    let key = (cx + dx, cy + dy, cz + dz);
                    if let Some(id) = world.get_block(key) {
                        snapshot.insert(key, id);
                    }
                }
            }
        }

        let igniting = self.igniting.clone();
        self.pool.submit(move || resolve(center, radius, snapshot, igniting));
    }

    /// Drain finished explosions, apply their destroy list, and return the
    /// chain-reaction schedule for the caller to re-trigger after the
    /// per-TNT stagger delay elapses.
    pub fn poll_and_apply(&mut self, world: &mut World) -> Vec<(BlockKey, Duration)> {
        let mut chain = Vec::new();
        for (_, result) in self.pool.poll() {
            world.remove_blocks_batch(&result.blocks_to_destroy);
            self.igniting.remove(&result.center);
            chain.extend(result.tnt_to_ignite);
        }
        chain
    }
}

impl Default for ExplosionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_stone_survives_and_tnt_is_scheduled_once() {
        let mut snapshot = HashMap::new();
        snapshot.insert((0, 0, 0), BlockId::TNT);
        snapshot.insert((1, 0, 0), BlockId::STONE);
        snapshot.insert((2, 0, 0), BlockId::END_STONE);

        let result = resolve((0, 0, 0), DEFAULT_RADIUS, snapshot, HashSet::new());
        assert!(result.blocks_to_destroy.contains(&(1, 0, 0)));
        assert!(!result.blocks_to_destroy.contains(&(2, 0, 0)));
        assert_eq!(result.tnt_to_ignite.len(), 1);
    }

    #[test]
    fn already_igniting_tnt_is_never_rescheduled() {
        let mut snapshot = HashMap::new();
        snapshot.insert((0, 0, 0), BlockId::TNT);
        let mut igniting = HashSet::new();
        igniting.insert((0, 0, 0));

        let result = resolve((0, 0, 0), 1, snapshot, igniting);
        assert!(result.tnt_to_ignite.is_empty());
    }

    #[test]
    fn cells_outside_radius_are_never_visited_twice() {
        let mut snapshot = HashMap::new();
        for x in -2..=2 {
            snapshot.insert((x, 0, 0), BlockId::STONE);
        }
        let result = resolve((0, 0, 0), 1, snapshot, HashSet::new());
        let mut sorted = result.blocks_to_destroy.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), result.blocks_to_destroy.len());
    }
}
