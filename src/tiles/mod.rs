pub mod catalog;
pub mod constants;
pub mod types;

// Re-export commonly used items
pub use catalog::TileCatalog;
pub use constants::*;
pub use types::{
    AtlasRect, PlacedTile, Rotation, TileDefinition, TileId, TileKind, TilePalette, TilePos,
};
