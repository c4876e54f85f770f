use super::constants::*;
use super::types::{AtlasRect, TileDefinition, TileId, TileKind, TilePalette};
use bevy::prelude::*;
use std::collections::HashMap;

/// Static lookup from tile id to its atlas rectangle and semantic
/// attributes. Built once at startup, never mutated.
#[derive(Resource, Debug, Clone)]
pub struct TileCatalog {
    definitions: HashMap<TileId, TileDefinition>,
}

impl TileCatalog {
    /// Build the standard catalog from the static tile table
    pub fn standard() -> Self {
        let mut definitions = HashMap::with_capacity(TILE_TABLE.len());
        for &(id, kind, palette) in TILE_TABLE {
            definitions.insert(
                id,
                TileDefinition {
                    id,
                    kind,
                    palette,
                    atlas_rect: atlas_rect_for(kind, palette),
                },
            );
        }
        Self { definitions }
    }

    pub fn get(&self, id: TileId) -> Option<&TileDefinition> {
        self.definitions.get(&id)
    }

    /// Check if a tile id refers to a real catalog entry
    pub fn contains(&self, id: TileId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDefinition> {
        self.definitions.values()
    }

    /// All catalog ids in ascending order (stable brush-cycling order)
    pub fn sorted_ids(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = self.definitions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Source rectangle for a kind/palette pair on the fixed atlas grid
fn atlas_rect_for(kind: TileKind, palette: TilePalette) -> AtlasRect {
    AtlasRect {
        x: kind.atlas_column() * ATLAS_CELL_WIDTH,
        y: palette.atlas_row() * ATLAS_CELL_HEIGHT,
        width: ATLAS_CELL_WIDTH,
        height: ATLAS_CELL_HEIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_contents() {
        let catalog = TileCatalog::standard();
        assert_eq!(catalog.len(), TILE_TABLE.len());

        // Known ids resolve with the expected attributes
        let grass = catalog.get(TILE_GRASS_CUBE).unwrap();
        assert_eq!(grass.kind, TileKind::Cube);
        assert_eq!(grass.palette, TilePalette::Green);

        let water = catalog.get(TILE_WATER).unwrap();
        assert_eq!(water.kind, TileKind::Water);
        assert_eq!(water.palette, TilePalette::Blue);

        // Air and out-of-table ids are not catalog entries
        assert!(!catalog.contains(TILE_EMPTY));
        assert!(!catalog.contains(999));
    }

    #[test]
    fn test_atlas_rects_stay_inside_atlas() {
        let catalog = TileCatalog::standard();
        for def in catalog.iter() {
            let rect = def.atlas_rect;
            assert!(rect.x + rect.width <= ATLAS_WIDTH);
            assert!(rect.y + rect.height <= ATLAS_HEIGHT);
        }
    }

    #[test]
    fn test_atlas_rects_unique_per_kind_palette() {
        let catalog = TileCatalog::standard();
        let mut seen = std::collections::HashSet::new();
        for def in catalog.iter() {
            assert!(
                seen.insert((def.kind, def.palette)),
                "duplicate kind/palette pair for tile {}",
                def.id
            );
        }
    }

    #[test]
    fn test_sorted_ids_ascending() {
        let ids = TileCatalog::standard().sorted_ids();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
