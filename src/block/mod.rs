//! Block identity and static properties (spec §3, §6).

mod registry;

pub use registry::{BlockProperties, BlockRegistry};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable block type identifier. `0` is always `air`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BlockId(pub u16);

unsafe impl bytemuck::Pod for BlockId {}
unsafe impl bytemuck::Zeroable for BlockId {}

// `BlockId` rides alongside instanced render data and goes through
// `bytemuck` casts; if it ever grew past two bytes the instance buffer
// layout computed in `world::generation` would silently shift.
static_assertions::assert_eq_size!(BlockId, u16);

impl Default for BlockId {
    fn default() -> Self {
        BlockId::AIR
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BlockRegistry::static_name(*self))
    }
}

// The registry abridged in spec §6. IDs are stable across saves, so this
// table only ever grows — never renumber an existing entry.
macro_rules! block_ids {
    ($($name:ident = $id:expr),* $(,)?) => {
        impl BlockId {
            $(pub const $name: BlockId = BlockId($id);)*
        }
    };
}

block_ids! {
    AIR = 0,
    COLLIDER = 1,
    STONE = 2,
    DIRT = 3,
    GRASS = 4,
    SAND = 5,
    WOOD = 6,
    PLANKS = 7,
    OAK_PLANKS = 8,
    DARK_PLANKS = 9,
    BLUE_PLANKS = 10,
    GREEN_PLANKS = 11,
    WHITE_PLANKS = 12,
    BIRCH_LOG = 13,
    MOSS = 14,
    AZALEA_LOG = 15,
    CACTUS = 16,
    COBBLESTONE = 17,
    MOSSY_STONE = 18,
    BRICKS = 19,
    HAY_BALE = 20,
    BOOKBOX = 21,
    CHEST = 22,
    BED = 23,
    CAR_BODY = 24,
    WHEEL = 25,
    SKY_STONE = 26,
    SKY_GRASS = 27,
    SKY_WOOD = 28,
    END_STONE = 29,
    OBSIDIAN = 30,
    MARBLE = 31,
    GOLD_ORE = 32,
    IRON_ORE = 33,
    GOLD_BLOCK = 34,
    IRON = 35,
    DIAMOND = 36,
    EMERALD = 37,
    AMETHYST = 38,
    DEBRIS = 39,
    TNT = 40,
    GLASS_BLOCK = 41,
    GLASS_BLINK = 42,
    LEAVES = 43,
    AZALEA_LEAVES = 44,
    YELLOW_LEAVES = 45,
    SKY_LEAVES = 46,
    FLOWER = 47,
    ALLIUM = 48,
    SHORT_GRASS = 49,
    VINE = 50,
    LILYPAD = 51,
    WATER = 52,
    SWAMP_WATER = 53,
    CLOUD = 54,
    CHIMNEY = 55,
    SWAMP_GRASS = 56,
    SKY_TREE_LOG = 57,
}
