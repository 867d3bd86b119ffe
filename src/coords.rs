//! Coordinate types and the floor-division helpers the spec insists on
//! (§9 design notes: never `round`, always `floor`, to avoid half-block
//! skew around negative coordinates).

use crate::constants::CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single block position, integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Floor a floating-point world position down to its containing block.
    /// Never use `round` here — see design note in §9.
    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos::new(
            self.x.div_euclid(CHUNK_SIZE),
            self.z.div_euclid(CHUNK_SIZE),
        )
    }

    /// Position local to its owning chunk, each component in `0..CHUNK_SIZE`
    /// for x/z (y is unbounded).
    pub fn local(&self) -> (i32, i32, i32) {
        (self.x.rem_euclid(CHUNK_SIZE), self.y, self.z.rem_euclid(CHUNK_SIZE))
    }

    pub fn neighbors(&self) -> [VoxelPos; 6] {
        [
            VoxelPos::new(self.x + 1, self.y, self.z),
            VoxelPos::new(self.x - 1, self.y, self.z),
            VoxelPos::new(self.x, self.y + 1, self.z),
            VoxelPos::new(self.x, self.y - 1, self.z),
            VoxelPos::new(self.x, self.y, self.z + 1),
            VoxelPos::new(self.x, self.y, self.z - 1),
        ]
    }
}

impl fmt::Display for VoxelPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk column coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkPos {
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.cx * CHUNK_SIZE, self.cz * CHUNK_SIZE)
    }

    /// Chebyshev distance in chunks, used for load/unload hysteresis.
    pub fn chebyshev_distance(&self, other: ChunkPos) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }

    /// All chunk coordinates within `radius` (inclusive), covering a
    /// `(2*radius+1)^2` neighborhood, centered on `self`.
    pub fn neighborhood(&self, radius: i32) -> impl Iterator<Item = ChunkPos> + '_ {
        (-radius..=radius).flat_map(move |dx| {
            (-radius..=radius).map(move |dz| ChunkPos::new(self.cx + dx, self.cz + dz))
        })
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cx, self.cz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coords_use_floor_not_round() {
        // -1.0 / 16 should floor-divide to chunk -1, not 0.
        let pos = VoxelPos::new(-1, 0, -1);
        assert_eq!(pos.chunk_pos(), ChunkPos::new(-1, -1));
        let (lx, _, lz) = pos.local();
        assert_eq!(lx, 15);
        assert_eq!(lz, 15);
    }

    #[test]
    fn from_f32_floors_negative_fractions() {
        let pos = VoxelPos::from_f32(-0.3, 1.9, -2.1);
        assert_eq!(pos, VoxelPos::new(-1, 1, -3));
    }

    #[test]
    fn neighborhood_covers_full_square() {
        let center = ChunkPos::new(0, 0);
        let cells: Vec<_> = center.neighborhood(1).collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&ChunkPos::new(1, 1)));
        assert!(cells.contains(&ChunkPos::new(-1, -1)));
    }

    #[test]
    fn chebyshev_distance_is_max_of_axes() {
        assert_eq!(ChunkPos::new(0, 0).chebyshev_distance(ChunkPos::new(3, 1)), 3);
    }
}
