//! Two-tier persistence cache (spec §4.5).
//!
//! Durable storage is an embedded key-value store (`sled`), keyed by
//! `"{cx}_{cz}"`, grounded directly on the pack's own per-chunk
//! `sled`-backed save/load pattern. The in-memory dirty cache is a
//! `DashMap` so `record_change` never contends with the flush thread.

mod save_format;

pub use save_format::{ChunkDelta, SavedPlayer, SavedWorld, SnapshotPayload};

use crate::block::{BlockId, BlockRegistry};
use crate::coords::ChunkPos;
use crate::error::{EngineError, EngineResult};
use crate::worker::WorkerPool;
use crate::world::generation::BlockKey;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

type DeltaMap = HashMap<BlockKey, BlockId>;

fn chunk_key(pos: ChunkPos) -> String {
    format!("{}_{}", pos.cx, pos.cz)
}

pub struct PersistenceService {
    db: Option<Arc<sled::Db>>,
    dirty: Arc<DashMap<ChunkPos, DeltaMap>>,
    flush_pool: WorkerPool<EngineResult<()>>,
}

impl PersistenceService {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let db = match sled::open(path.as_ref()) {
            Ok(db) => Some(Arc::new(db)),
            Err(e) => {
                log::warn!("persistence store unavailable at {:?}: {e}; running with in-memory deltas only", path.as_ref());
                None
            }
        };
        Self {
            db,
            dirty: Arc::new(DashMap::new()),
            flush_pool: WorkerPool::new(1),
        }
    }

    /// In-memory only, for tests and for `PersistenceUnavailable` degrade.
    pub fn in_memory() -> Self {
        Self {
            db: None,
            dirty: Arc::new(DashMap::new()),
            flush_pool: WorkerPool::new(1),
        }
    }

    /// Synchronous — updates the in-memory cache at the owning chunk.
    pub fn record_change(&self, pos: ChunkPos, key: BlockKey, ty: BlockId) {
        self.dirty.entry(pos).or_default().insert(key, ty);
    }

    /// Unions durable + in-memory deltas for a chunk (durable store is
    /// read synchronously here; `sled` reads are local and fast, unlike
    /// the write path which is pushed to the flush thread).
    pub fn get_deltas(&self, pos: ChunkPos) -> DeltaMap {
        let mut merged = self.load_durable(pos).unwrap_or_default();
        if let Some(in_memory) = self.dirty.get(&pos) {
            for (&k, &v) in in_memory.iter() {
                merged.insert(k, v);
            }
        }
        merged
    }

    fn load_durable(&self, pos: ChunkPos) -> Option<DeltaMap> {
        let db = self.db.as_ref()?;
        match db.get(chunk_key(pos)) {
            Ok(Some(bytes)) => bincode::deserialize(&bytes).ok(),
            Ok(None) => None,
            Err(e) => {
                log::warn!("persistence read failed for {pos}: {e}");
                None
            }
        }
    }

    /// Writes the durable record for `pos` on a background thread;
    /// non-blocking from the caller's perspective (spec §5 suspension
    /// points). A failure is logged, never propagated as fatal (§7).
    pub fn flush(&self, pos: ChunkPos) {
        let Some(db) = self.db.clone() else {
            return; // no durable store configured; deltas stay in-memory
        };
        let snapshot = self
            .dirty
            .get(&pos)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        if snapshot.is_empty() {
            return;
        }
        self.flush_pool.submit(move || -> EngineResult<()> {
            let bytes = bincode::serialize(&snapshot)?;
            db.insert(chunk_key(pos), bytes)?;
            Ok(())
        });
    }

    /// Drains and logs any flush failures that have completed since the
    /// last poll. Call once per `World::update`.
    pub fn poll_flush_results(&self) {
        for (_, result) in self.flush_pool.poll() {
            if let Err(e) = result {
                log::warn!("chunk flush failed: {e}");
            }
        }
    }

    /// Used by the external save-load UI (spec §6) to restore a
    /// previously exported world.
    pub fn inject_snapshot(&self, chunks: Vec<(ChunkPos, DeltaMap)>) -> EngineResult<()> {
        let db = self
            .db
            .as_ref()
            .ok_or_else(|| EngineError::PersistenceUnavailable("no durable store configured".into()))?;
        for (pos, deltas) in chunks {
            let bytes = bincode::serialize(&deltas)?;
            db.insert(chunk_key(pos), bytes)?;
            self.dirty.remove(&pos);
        }
        Ok(())
    }

    /// Exports every chunk currently known to the durable store plus any
    /// still-dirty in-memory deltas, for the save-snapshot UI.
    pub fn snapshot_all(&self) -> Vec<(ChunkPos, DeltaMap)> {
        let mut seen: HashMap<ChunkPos, DeltaMap> = HashMap::new();
        if let Some(db) = &self.db {
            for item in db.iter() {
                if let Ok((key, value)) = item {
                    if let Ok(key_str) = std::str::from_utf8(&key) {
                        if let Some((cx, cz)) = key_str.split_once('_') {
                            if let (Ok(cx), Ok(cz)) = (cx.parse(), cz.parse()) {
                                if let Ok(deltas) = bincode::deserialize::<DeltaMap>(&value) {
                                    seen.insert(ChunkPos::new(cx, cz), deltas);
                                }
                            }
                        }
                    }
                }
            }
        }
        for entry in self.dirty.iter() {
            seen.entry(*entry.key()).or_default().extend(entry.value().clone());
        }
        seen.into_iter().collect()
    }

    /// Build the external, name-keyed save payload (spec §6) for the
    /// save-snapshot UI to write to disk as JSON.
    pub fn export_snapshot(&self, seed: u32, player: SavedPlayer, registry: &BlockRegistry) -> SnapshotPayload {
        let chunks = self
            .snapshot_all()
            .into_iter()
            .map(|(pos, deltas)| save_format::delta_map_to_chunk_delta(pos, &deltas, registry))
            .collect();
        SnapshotPayload { player, world: SavedWorld { seed, chunks } }
    }

    /// Restore a previously exported payload: every chunk delta is written
    /// into the durable store (or the in-memory cache if none is
    /// configured) and the saved player state is handed back for the
    /// caller to place into a fresh `World`/`PlayerController`.
    pub fn import_snapshot(&self, payload: SnapshotPayload, registry: &BlockRegistry) -> EngineResult<SavedPlayer> {
        let mut converted = Vec::with_capacity(payload.world.chunks.len());
        for chunk_delta in &payload.world.chunks {
            converted.push(save_format::chunk_delta_to_delta_map(chunk_delta, registry)?);
        }

        if self.db.is_some() {
            self.inject_snapshot(converted)?;
        } else {
            for (pos, deltas) in converted {
                self.dirty.entry(pos).or_default().extend(deltas);
            }
        }

        Ok(payload.player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_then_get_deltas_round_trips_in_memory() {
        let svc = PersistenceService::in_memory();
        let pos = ChunkPos::new(1, 2);
        svc.record_change(pos, (16, 64, 32), BlockId::AIR);
        let deltas = svc.get_deltas(pos);
        assert_eq!(deltas.get(&(16, 64, 32)), Some(&BlockId::AIR));
    }

    #[test]
    fn durable_round_trip_through_sled() {
        let dir = tempfile::tempdir().unwrap();
        let svc = PersistenceService::open(dir.path());
        let pos = ChunkPos::new(3, -1);
        svc.record_change(pos, (48, 40, -10), BlockId::STONE);
        svc.flush(pos);

        // Give the background flush a moment to land.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        loop {
            svc.poll_flush_results();
            let reopened = PersistenceService::open(dir.path());
            let deltas = reopened.get_deltas(pos);
            if deltas.get(&(48, 40, -10)) == Some(&BlockId::STONE) {
                break;
            }
            if std::time::Instant::now() > deadline {
                panic!("flush did not land in durable store in time");
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }

    #[test]
    fn unavailable_store_degrades_to_in_memory_only() {
        // Point at a path nested under a file (not a directory) so `sled::open`
        // fails, exercising the degrade path.
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("not_a_dir");
        std::fs::write(&file_path, b"x").unwrap();
        let bad_path = file_path.join("nested");

        let svc = PersistenceService::open(&bad_path);
        let pos = ChunkPos::new(0, 0);
        svc.record_change(pos, (0, 0, 0), BlockId::DIRT);
        assert_eq!(svc.get_deltas(pos).get(&(0, 0, 0)), Some(&BlockId::DIRT));
        // flush is a no-op when no durable store is configured.
        svc.flush(pos);
    }

    #[test]
    fn export_then_import_snapshot_round_trips_player_and_deltas() {
        let registry = BlockRegistry::with_defaults();
        let svc = PersistenceService::in_memory();
        let pos = ChunkPos::new(5, -3);
        svc.record_change(pos, (80, 12, -50), BlockId::DIAMOND);

        let player = SavedPlayer { x: 1.0, y: 70.0, z: 2.0, yaw: 0.0, pitch: 0.0 };
        let payload = svc.export_snapshot(7, player.clone(), &registry);
        let json = payload.to_json().unwrap();

        let fresh = PersistenceService::in_memory();
        let restored_payload = SnapshotPayload::from_json(&json).unwrap();
        let restored_player = fresh.import_snapshot(restored_payload, &registry).unwrap();

        assert_eq!(restored_player.x, player.x);
        assert_eq!(fresh.get_deltas(pos).get(&(80, 12, -50)), Some(&BlockId::DIAMOND));
    }
}
