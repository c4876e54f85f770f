use crate::tiles::{PlacedTile, Rotation, TileCatalog, TileId, TilePos, REGION_SIZE};
use bevy::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::mem;

/// Error type for grid mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// The referenced tile id has no catalog entry
    InvalidTile(TileId),
    /// fill_region called with min > max on an axis
    InvalidRegion {
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::InvalidTile(id) => write!(f, "Unknown tile id {}", id),
            GridError::InvalidRegion {
                min_x,
                min_y,
                max_x,
                max_y,
            } => write!(
                f,
                "Invalid region ({}, {})..({}, {}): min exceeds max",
                min_x, min_y, max_x, max_y
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// Sparse 3D tile world: a map from integer coordinates to placed tiles.
/// Absence of an entry means air. Owns all placement and removal; every
/// mutation bumps a tick counter and stamps the coarse region it touched,
/// which the LOD planner reads as staleness.
#[derive(Resource, Debug, Default)]
pub struct WorldGrid {
    tiles: HashMap<TilePos, PlacedTile>,
    /// Coarse x/y region -> tick of the last mutation inside it
    region_touched: HashMap<IVec2, u64>,
    tick: u64,
}

impl WorldGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the tile at `pos`, returning the previous
    /// occupant if any. Fails without mutating when the id is unknown.
    pub fn place_tile(
        &mut self,
        catalog: &TileCatalog,
        pos: TilePos,
        tile_id: TileId,
        rotation: Option<Rotation>,
    ) -> Result<Option<PlacedTile>, GridError> {
        if !catalog.contains(tile_id) {
            return Err(GridError::InvalidTile(tile_id));
        }
        let placed = PlacedTile::with_rotation(tile_id, rotation.unwrap_or_default());
        let previous = self.tiles.insert(pos, placed);
        self.touch(pos);
        Ok(previous)
    }

    /// Delete the tile at `pos`; a miss is not an error
    pub fn remove_tile(&mut self, pos: TilePos) -> Option<PlacedTile> {
        let removed = self.tiles.remove(&pos);
        if removed.is_some() {
            self.touch(pos);
        }
        removed
    }

    pub fn get_tile(&self, pos: TilePos) -> Option<&PlacedTile> {
        self.tiles.get(&pos)
    }

    /// Place `tile_id` on every coordinate of the closed rectangle at a
    /// fixed elevation. The id and bounds are validated once at entry, so
    /// the operation cannot partially fail. Returns the number of cells
    /// written.
    pub fn fill_region(
        &mut self,
        catalog: &TileCatalog,
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
        z: i32,
        tile_id: TileId,
    ) -> Result<usize, GridError> {
        if min_x > max_x || min_y > max_y {
            return Err(GridError::InvalidRegion {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        if !catalog.contains(tile_id) {
            return Err(GridError::InvalidTile(tile_id));
        }

        let mut written = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let pos = TilePos::new(x, y, z);
                self.tiles.insert(pos, PlacedTile::new(tile_id));
                self.touch(pos);
                written += 1;
            }
        }
        Ok(written)
    }

    /// Remove all tiles (terrain reset); staleness history goes with them
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.region_touched.clear();
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TilePos, &PlacedTile)> {
        self.tiles.iter()
    }

    /// Tick of the last mutation inside the region containing `pos`;
    /// 0 means never touched (only possible after a clear)
    pub fn region_last_touched(&self, pos: TilePos) -> u64 {
        self.region_touched
            .get(&pos.region(REGION_SIZE))
            .copied()
            .unwrap_or(0)
    }

    /// Approximate heap footprint of the grid for the performance snapshot
    pub fn memory_usage_bytes(&self) -> usize {
        let entry = mem::size_of::<TilePos>() + mem::size_of::<PlacedTile>();
        let region = mem::size_of::<IVec2>() + mem::size_of::<u64>();
        self.tiles.capacity() * entry + self.region_touched.capacity() * region
    }

    /// Highest occupied z at a column, if the column holds any tile.
    /// Used to rebuild a height field from the grid on demand.
    pub fn top_level_at(&self, x: i32, y: i32) -> Option<i32> {
        self.tiles
            .keys()
            .filter(|pos| pos.x == x && pos.y == y)
            .map(|pos| pos.z)
            .max()
    }

    fn touch(&mut self, pos: TilePos) {
        self.tick = self.tick.wrapping_add(1);
        self.region_touched.insert(pos.region(REGION_SIZE), self.tick);
    }
}
