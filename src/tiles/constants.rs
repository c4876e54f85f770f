use super::types::{TileId, TileKind, TilePalette};

/// Pixel size of one sprite cell in the shared atlas grid
pub const ATLAS_CELL_WIDTH: u32 = 64;
pub const ATLAS_CELL_HEIGHT: u32 = 64;

/// Atlas grid dimensions: one column per tile kind, one row per palette
pub const ATLAS_COLS: u32 = 7;
pub const ATLAS_ROWS: u32 = 4;

/// Full atlas image dimensions in pixels
pub const ATLAS_WIDTH: u32 = ATLAS_CELL_WIDTH * ATLAS_COLS; // 448
pub const ATLAS_HEIGHT: u32 = ATLAS_CELL_HEIGHT * ATLAS_ROWS; // 256

/// Asset path of the shared sprite atlas
pub const ATLAS_PATH: &str = "tilesets/iso_blocks.png";

// Isometric projection geometry (2:1 diamond)
/// Half the on-screen width of a tile diamond at 1x zoom
pub const TILE_HALF_WIDTH: f32 = 32.0;

/// Half the on-screen height of a tile diamond at 1x zoom
pub const TILE_HALF_HEIGHT: f32 = 16.0;

/// Vertical pixel offset per z-level at 1x zoom; one level up moves
/// a tile strictly upward on screen by this amount
pub const LEVEL_HEIGHT: f32 = 24.0;

/// Side length (in tiles) of the coarse regions tracked for LOD staleness
pub const REGION_SIZE: i32 = 16;

/// Empty/air tile; never placed in the grid
pub const TILE_EMPTY: TileId = 0;

// Well-known tile ids used by the terrain generator and input defaults.
// Ids follow kind-major order within each palette block; see the table below.
pub const TILE_GRASS_CUBE: TileId = 1;
pub const TILE_GRASS_FLAT: TileId = 5;
pub const TILE_ROCK_CUBE: TileId = 8;
pub const TILE_ROCK_PILLAR: TileId = 13;
pub const TILE_SAND_CUBE: TileId = 15;
pub const TILE_SAND_FLAT: TileId = 19;
pub const TILE_WATER: TileId = 28;

/// Static tile table: (id, kind, palette). Atlas rects are derived from
/// the kind column and palette row at catalog construction time.
pub const TILE_TABLE: &[(TileId, TileKind, TilePalette)] = &[
    // Green palette (grass)
    (1, TileKind::Cube, TilePalette::Green),
    (2, TileKind::Ramp, TilePalette::Green),
    (3, TileKind::Corner, TilePalette::Green),
    (4, TileKind::Staircase, TilePalette::Green),
    (5, TileKind::Flat, TilePalette::Green),
    (6, TileKind::Pillar, TilePalette::Green),
    (7, TileKind::Water, TilePalette::Green),
    // Gray palette (rock)
    (8, TileKind::Cube, TilePalette::Gray),
    (9, TileKind::Ramp, TilePalette::Gray),
    (10, TileKind::Corner, TilePalette::Gray),
    (11, TileKind::Staircase, TilePalette::Gray),
    (12, TileKind::Flat, TilePalette::Gray),
    (13, TileKind::Pillar, TilePalette::Gray),
    (14, TileKind::Water, TilePalette::Gray),
    // Orange palette (sand/clay)
    (15, TileKind::Cube, TilePalette::Orange),
    (16, TileKind::Ramp, TilePalette::Orange),
    (17, TileKind::Corner, TilePalette::Orange),
    (18, TileKind::Staircase, TilePalette::Orange),
    (19, TileKind::Flat, TilePalette::Orange),
    (20, TileKind::Pillar, TilePalette::Orange),
    (21, TileKind::Water, TilePalette::Orange),
    // Blue palette (water/ice)
    (22, TileKind::Cube, TilePalette::Blue),
    (23, TileKind::Ramp, TilePalette::Blue),
    (24, TileKind::Corner, TilePalette::Blue),
    (25, TileKind::Staircase, TilePalette::Blue),
    (26, TileKind::Pillar, TilePalette::Blue),
    (27, TileKind::Flat, TilePalette::Blue),
    (28, TileKind::Water, TilePalette::Blue),
];
