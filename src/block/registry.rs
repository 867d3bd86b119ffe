//! Static block property table.
//!
//! Grounded on the teacher's `BlockRegistry`/`BlockRegistration` shape, but
//! collapsed to the spec's rule that there is no truly global mutable
//! registry at runtime (§9): properties are built once, immutably, and
//! shared behind an `Arc` rather than registered piecemeal by name.

use super::BlockId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct BlockProperties {
    pub name: &'static str,
    pub is_solid: bool,
    pub is_transparent: bool,
    pub is_ao_enabled: bool,
}

impl BlockProperties {
    /// `is_occluding` is a derived superset query (spec §3), not a stored
    /// bit: opaque solid blocks occlude, everything else doesn't.
    pub fn is_occluding(&self) -> bool {
        self.is_solid && !self.is_transparent
    }
}

pub struct BlockRegistry {
    table: HashMap<BlockId, BlockProperties>,
}

macro_rules! props {
    (solid_opaque, $name:expr) => {
        BlockProperties { name: $name, is_solid: true, is_transparent: false, is_ao_enabled: true }
    };
    (solid_opaque_no_ao, $name:expr) => {
        BlockProperties { name: $name, is_solid: true, is_transparent: false, is_ao_enabled: false }
    };
    (solid_transparent, $name:expr) => {
        BlockProperties { name: $name, is_solid: true, is_transparent: true, is_ao_enabled: false }
    };
    (non_solid, $name:expr) => {
        BlockProperties { name: $name, is_solid: false, is_transparent: true, is_ao_enabled: false }
    };
}

impl BlockRegistry {
    /// Build the static table described in spec §6. There is exactly one
    /// of these per process; `World` holds it behind an `Arc`.
    pub fn with_defaults() -> Self {
        use BlockId as B;
        let mut table = HashMap::new();

        table.insert(B::AIR, BlockProperties { name: "air", is_solid: false, is_transparent: true, is_ao_enabled: false });
        table.insert(B::COLLIDER, BlockProperties { name: "collider", is_solid: true, is_transparent: true, is_ao_enabled: false });

        for (id, name) in [
            (B::STONE, "stone"), (B::DIRT, "dirt"), (B::GRASS, "grass"), (B::SAND, "sand"),
            (B::WOOD, "wood"), (B::PLANKS, "planks"), (B::OAK_PLANKS, "oak_planks"),
            (B::DARK_PLANKS, "dark_planks"), (B::BLUE_PLANKS, "blue_planks"),
            (B::GREEN_PLANKS, "green_planks"), (B::WHITE_PLANKS, "white_planks"),
            (B::BIRCH_LOG, "birch_log"), (B::MOSS, "moss"), (B::AZALEA_LOG, "azalea_log"),
            (B::CACTUS, "cactus"), (B::COBBLESTONE, "cobblestone"), (B::MOSSY_STONE, "mossy_stone"),
            (B::BRICKS, "bricks"), (B::HAY_BALE, "hay_bale"), (B::BOOKBOX, "bookbox"),
            (B::CHEST, "chest"), (B::BED, "bed"), (B::CAR_BODY, "car_body"), (B::WHEEL, "wheel"),
            (B::SKY_STONE, "sky_stone"), (B::SKY_GRASS, "sky_grass"), (B::SKY_WOOD, "sky_wood"),
            (B::END_STONE, "end_stone"), (B::OBSIDIAN, "obsidian"), (B::MARBLE, "marble"),
            (B::GOLD_ORE, "gold_ore"), (B::IRON_ORE, "iron_ore"), (B::GOLD_BLOCK, "gold_block"),
            (B::IRON, "iron"), (B::DIAMOND, "diamond"), (B::EMERALD, "emerald"),
            (B::AMETHYST, "amethyst"), (B::DEBRIS, "debris"), (B::TNT, "tnt"),
            (B::SWAMP_GRASS, "swamp_grass"), (B::SKY_TREE_LOG, "sky_tree_log"),
        ] {
            table.insert(id, props!(solid_opaque, name));
        }

        for (id, name) in [
            (B::GLASS_BLOCK, "glass_block"), (B::GLASS_BLINK, "glass_blink"),
            (B::LEAVES, "leaves"), (B::AZALEA_LEAVES, "azalea_leaves"),
            (B::YELLOW_LEAVES, "yellow_leaves"), (B::SKY_LEAVES, "sky_leaves"),
        ] {
            table.insert(id, props!(solid_transparent, name));
        }

        for (id, name) in [
            (B::FLOWER, "flower"), (B::ALLIUM, "allium"), (B::SHORT_GRASS, "short_grass"),
            (B::VINE, "vine"), (B::LILYPAD, "lilypad"), (B::WATER, "water"),
            (B::SWAMP_WATER, "swamp_water"), (B::CLOUD, "cloud"), (B::CHIMNEY, "chimney"),
        ] {
            table.insert(id, props!(non_solid, name));
        }

        Self { table }
    }

    pub fn properties(&self, id: BlockId) -> BlockProperties {
        self.table.get(&id).copied().unwrap_or(BlockProperties {
            name: "unknown",
            is_solid: false,
            is_transparent: true,
            is_ao_enabled: false,
        })
    }

    pub fn is_solid(&self, id: BlockId) -> bool {
        self.properties(id).is_solid
    }

    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.properties(id).is_transparent
    }

    pub fn is_occluding(&self, id: BlockId) -> bool {
        self.properties(id).is_occluding()
    }

    pub fn is_ao_enabled(&self, id: BlockId) -> bool {
        self.properties(id).is_ao_enabled
    }

    pub fn name(&self, id: BlockId) -> &'static str {
        self.properties(id).name
    }

    /// Reverse lookup used when importing a save file (spec §6 persistent
    /// state layout stores block types by name, not by the internal
    /// numeric id, so a save survives an id renumbering that never
    /// happens but a name never does).
    pub fn by_name(&self, name: &str) -> Option<BlockId> {
        if name == "air" {
            return Some(BlockId::AIR);
        }
        self.table.iter().find(|(_, props)| props.name == name).map(|(&id, _)| id)
    }

    /// Lookup used by `BlockId`'s `Display` impl, which has no access to a
    /// live registry instance. Built lazily so there's still only one
    /// canonical table.
    pub fn static_name(id: BlockId) -> &'static str {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<BlockRegistry> = OnceLock::new();
        REGISTRY.get_or_init(BlockRegistry::with_defaults).name(id)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_not_occluding() {
        let reg = BlockRegistry::with_defaults();
        assert!(!reg.is_occluding(BlockId::AIR));
    }

    #[test]
    fn by_name_round_trips_with_name() {
        let reg = BlockRegistry::with_defaults();
        assert_eq!(reg.by_name("stone"), Some(BlockId::STONE));
        assert_eq!(reg.by_name("air"), Some(BlockId::AIR));
        assert_eq!(reg.by_name("not_a_block"), None);
        assert_eq!(reg.by_name(reg.name(BlockId::DIAMOND)), Some(BlockId::DIAMOND));
    }

    #[test]
    fn stone_occludes_glass_does_not() {
        let reg = BlockRegistry::with_defaults();
        assert!(reg.is_occluding(BlockId::STONE));
        assert!(!reg.is_occluding(BlockId::GLASS_BLOCK));
    }

    #[test]
    fn end_stone_is_solid_and_opaque() {
        let reg = BlockRegistry::with_defaults();
        assert!(reg.is_solid(BlockId::END_STONE));
        assert!(reg.is_occluding(BlockId::END_STONE));
    }

    #[test]
    fn water_is_non_solid() {
        let reg = BlockRegistry::with_defaults();
        assert!(!reg.is_solid(BlockId::WATER));
    }
}
