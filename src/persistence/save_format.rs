//! The external save-file shape (spec §6 "Persistent state layout").
//!
//! The durable per-chunk store (`sled` + `bincode`, see `persistence::mod`)
//! is an internal cache keyed by numeric `BlockId` and is never exposed
//! past this crate. The save-snapshot UI collaborator instead trades in
//! these human-readable, name-keyed structures over JSON — stable across
//! an internal id renumbering, and directly inspectable/diffable as a
//! save file on disk.

use crate::block::BlockRegistry;
use crate::coords::ChunkPos;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::DeltaMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
}

/// One chunk's delta overlay, key-formatted as `"x,y,z"` and valued by
/// block name (or `"air"` for a removal) rather than the internal id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDelta {
    pub cx: i32,
    pub cz: i32,
    pub changes: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedWorld {
    pub seed: u32,
    pub chunks: Vec<ChunkDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub player: SavedPlayer,
    pub world: SavedWorld,
}

fn format_key(key: (i32, i32, i32)) -> String {
    format!("{},{},{}", key.0, key.1, key.2)
}

fn parse_key(s: &str) -> EngineResult<(i32, i32, i32)> {
    let mut parts = s.split(',');
    let mut next = || -> EngineResult<i32> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| EngineError::Serialization(format!("malformed delta key {s:?}")))
    };
    Ok((next()?, next()?, next()?))
}

pub(super) fn delta_map_to_chunk_delta(pos: ChunkPos, deltas: &DeltaMap, registry: &BlockRegistry) -> ChunkDelta {
    let changes = deltas
        .iter()
        .map(|(&key, &id)| (format_key(key), registry.name(id).to_string()))
        .collect();
    ChunkDelta { cx: pos.cx, cz: pos.cz, changes }
}

pub(super) fn chunk_delta_to_delta_map(delta: &ChunkDelta, registry: &BlockRegistry) -> EngineResult<(ChunkPos, DeltaMap)> {
    let mut map = HashMap::with_capacity(delta.changes.len());
    for (key_str, name) in &delta.changes {
        let key = parse_key(key_str)?;
        let id = registry
            .by_name(name)
            .ok_or_else(|| EngineError::Serialization(format!("unknown block name {name:?} in save file")))?;
        map.insert(key, id);
    }
    Ok((ChunkPos::new(delta.cx, delta.cz), map))
}

impl SnapshotPayload {
    /// Serialize to the external save-file format (spec §6). JSON rather
    /// than the internal `bincode` encoding, since this boundary is meant
    /// to be read by the save-snapshot UI, not just this engine.
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    pub fn from_json(text: &str) -> EngineResult<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockId;

    #[test]
    fn chunk_delta_round_trips_through_name_keyed_format() {
        let registry = BlockRegistry::with_defaults();
        let pos = ChunkPos::new(3, -2);
        let mut deltas: DeltaMap = HashMap::new();
        deltas.insert((48, 64, -30), BlockId::STONE);
        deltas.insert((49, 10, -31), BlockId::AIR);

        let chunk_delta = delta_map_to_chunk_delta(pos, &deltas, &registry);
        assert_eq!(chunk_delta.changes.get("48,64,-30"), Some(&"stone".to_string()));
        assert_eq!(chunk_delta.changes.get("49,10,-31"), Some(&"air".to_string()));

        let (round_pos, round_map) = chunk_delta_to_delta_map(&chunk_delta, &registry).unwrap();
        assert_eq!(round_pos, pos);
        assert_eq!(round_map, deltas);
    }

    #[test]
    fn snapshot_payload_round_trips_through_json() {
        let payload = SnapshotPayload {
            player: SavedPlayer { x: 1.0, y: 70.0, z: -3.5, yaw: 0.2, pitch: -0.1 },
            world: SavedWorld {
                seed: 42,
                chunks: vec![ChunkDelta { cx: 0, cz: 0, changes: HashMap::from([("0,64,0".to_string(), "diamond".to_string())]) }],
            },
        };

        let json = payload.to_json().unwrap();
        let restored = SnapshotPayload::from_json(&json).unwrap();
        assert_eq!(restored.player.x, payload.player.x);
        assert_eq!(restored.world.seed, payload.world.seed);
        assert_eq!(restored.world.chunks[0].changes, payload.world.chunks[0].changes);
    }

    #[test]
    fn unknown_block_name_is_rejected_not_panicked() {
        let registry = BlockRegistry::with_defaults();
        let bad = ChunkDelta { cx: 0, cz: 0, changes: HashMap::from([("0,0,0".to_string(), "not_a_real_block".to_string())]) };
        assert!(chunk_delta_to_delta_map(&bad, &registry).is_err());
    }
}
