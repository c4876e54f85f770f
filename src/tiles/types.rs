use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Type alias for tile IDs (u16 allows 0-65,535 unique tiles)
pub type TileId = u16;

/// Semantic shape of a tile sprite, consumed via exhaustive `match`
/// in the renderer and terrain generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Cube,
    Ramp,
    Corner,
    Staircase,
    Flat,
    Pillar,
    Water,
}

impl TileKind {
    /// Column index of this kind in the shared atlas grid
    pub const fn atlas_column(&self) -> u32 {
        match self {
            TileKind::Cube => 0,
            TileKind::Ramp => 1,
            TileKind::Corner => 2,
            TileKind::Staircase => 3,
            TileKind::Flat => 4,
            TileKind::Pillar => 5,
            TileKind::Water => 6,
        }
    }

    /// Drop priority under LOD pressure: lower ranks are dropped first.
    /// Structural kinds return `None` and are never dropped.
    pub const fn lod_rank(&self) -> Option<u8> {
        match self {
            TileKind::Flat => Some(0),
            TileKind::Corner => Some(1),
            TileKind::Cube
            | TileKind::Ramp
            | TileKind::Staircase
            | TileKind::Pillar
            | TileKind::Water => None,
        }
    }
}

/// Color palette of a tile sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TilePalette {
    Green,
    Gray,
    Orange,
    Blue,
}

impl TilePalette {
    /// Row index of this palette in the shared atlas grid
    pub const fn atlas_row(&self) -> u32 {
        match self {
            TilePalette::Green => 0,
            TilePalette::Gray => 1,
            TilePalette::Orange => 2,
            TilePalette::Blue => 3,
        }
    }
}

/// Source rectangle inside the shared atlas image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Immutable catalog entry describing one placeable tile sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDefinition {
    pub id: TileId,
    pub kind: TileKind,
    pub palette: TilePalette,
    pub atlas_rect: AtlasRect,
}

/// World-grid coordinate (x, y on the diamond plane, z the elevation layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Coarse region this coordinate falls in, used for LOD staleness
    /// bookkeeping (regions are squares in the x/y plane, all z collapsed)
    pub fn region(&self, region_size: i32) -> IVec2 {
        IVec2::new(
            self.x.div_euclid(region_size),
            self.y.div_euclid(region_size),
        )
    }
}

impl From<(i32, i32, i32)> for TilePos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<TilePos> for IVec3 {
    fn from(pos: TilePos) -> Self {
        IVec3::new(pos.x, pos.y, pos.z)
    }
}

/// Discrete rotation of a placed tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const fn degrees(&self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }
}

/// A tile placed in the world grid, referencing a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub tile_id: TileId,
    pub rotation: Rotation,
}

impl PlacedTile {
    pub const fn new(tile_id: TileId) -> Self {
        Self {
            tile_id,
            rotation: Rotation::R0,
        }
    }

    pub const fn with_rotation(tile_id: TileId, rotation: Rotation) -> Self {
        Self { tile_id, rotation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_mapping() {
        // Positive coordinates
        assert_eq!(TilePos::new(0, 0, 0).region(16), IVec2::new(0, 0));
        assert_eq!(TilePos::new(15, 15, 3).region(16), IVec2::new(0, 0));
        assert_eq!(TilePos::new(16, 31, 0).region(16), IVec2::new(1, 1));

        // Negative coordinates round toward negative infinity
        assert_eq!(TilePos::new(-1, -1, 0).region(16), IVec2::new(-1, -1));
        assert_eq!(TilePos::new(-16, -17, 0).region(16), IVec2::new(-1, -2));
    }

    #[test]
    fn test_lod_rank_ordering() {
        // Flat is dropped before corner, structural kinds never
        assert_eq!(TileKind::Flat.lod_rank(), Some(0));
        assert_eq!(TileKind::Corner.lod_rank(), Some(1));
        assert_eq!(TileKind::Cube.lod_rank(), None);
        assert_eq!(TileKind::Water.lod_rank(), None);
    }

    #[test]
    fn test_rotation_default() {
        assert_eq!(PlacedTile::new(1).rotation, Rotation::R0);
        assert_eq!(
            PlacedTile::with_rotation(1, Rotation::R180)
                .rotation
                .degrees(),
            180
        );
    }
}
