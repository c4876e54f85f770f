use super::grid::{GridError, WorldGrid};
use crate::tiles::{
    TileCatalog, TileId, TilePos, TILE_GRASS_CUBE, TILE_ROCK_CUBE, TILE_ROCK_PILLAR,
    TILE_SAND_CUBE, TILE_WATER,
};
use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use std::time::{SystemTime, UNIX_EPOCH};

/// Footprint presets for island generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSize {
    Small,
    Medium,
    Large,
}

impl MapSize {
    /// Side length of the square footprint in tiles
    pub const fn dimension(&self) -> usize {
        match self {
            MapSize::Small => 32,
            MapSize::Medium => 64,
            MapSize::Large => 128,
        }
    }
}

/// Number of quantized height bands: water, shore, lowland, highland, peak
pub const BAND_COUNT: i32 = 5;

// Normalized-elevation cut points between bands; tuned by eye, the
// contracts (determinism, band range) are what tests pin down
const SHORE_CUT: f32 = 0.22;
const LOWLAND_CUT: f32 = 0.38;
const HIGHLAND_CUT: f32 = 0.58;
const PEAK_CUT: f32 = 0.80;

// Noise shape: three octaves of Perlin, frequency doubling and
// amplitude halving per octave
const OCTAVES: u32 = 3;
const BASE_FREQUENCY: f64 = 3.0;

/// Transient 2D elevation field over a square footprint, normalized to
/// [0, 1]. Produced during one generation call; kept only so the last
/// field can be exported without regenerating.
#[derive(Debug, Clone)]
pub struct HeightField {
    size: usize,
    values: Vec<f32>,
}

impl HeightField {
    fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.size + x]
    }

    fn set(&mut self, x: usize, y: usize, value: f32) {
        self.values[y * self.size + x] = value;
    }

    /// Row-major copy for the export-height-map command
    pub fn export(&self) -> Vec<Vec<f32>> {
        (0..self.size)
            .map(|y| (0..self.size).map(|x| self.get(x, y)).collect())
            .collect()
    }
}

/// What a generation call produced, for UI reporting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    pub tiles_written: usize,
    pub dimension: usize,
    pub seed: u32,
}

/// Procedural island generator. Produces a height field, carves an
/// island silhouette with radial falloff, quantizes into bands and
/// writes solid tile columns into the world grid.
#[derive(Resource, Debug, Default)]
pub struct TerrainGenerator {
    last_field: Option<HeightField>,
}

impl TerrainGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate an island into `grid`. A supplied seed makes the output
    /// fully deterministic; without one a seed is derived from the clock.
    pub fn generate(
        &mut self,
        grid: &mut WorldGrid,
        catalog: &TileCatalog,
        size: MapSize,
        seed: Option<u32>,
    ) -> Result<GenerationReport, GridError> {
        let seed = seed.unwrap_or_else(clock_seed);
        let dimension = size.dimension();
        let field = build_height_field(dimension, seed);

        let mut tiles_written = 0;
        for y in 0..dimension {
            for x in 0..dimension {
                let band = band_for(field.get(x, y));
                tiles_written += write_column(grid, catalog, x as i32, y as i32, band)?;
            }
        }

        info!(
            "Generated {}x{} island (seed {}): {} tiles",
            dimension, dimension, seed, tiles_written
        );

        self.last_field = Some(field);
        Ok(GenerationReport {
            tiles_written,
            dimension,
            seed,
        })
    }

    /// Snapshot of the last generated height field, or one recomputed
    /// from the grid's top elevation per column when nothing is cached.
    /// Returns `None` only when there is no field and no tiles at all.
    pub fn export_height_field(&self, grid: &WorldGrid) -> Option<Vec<Vec<f32>>> {
        if let Some(field) = &self.last_field {
            return Some(field.export());
        }
        field_from_grid(grid).map(|field| field.export())
    }
}

/// Quantize a normalized elevation into its height band (0 = water)
pub fn band_for(elevation: f32) -> i32 {
    if elevation < SHORE_CUT {
        0
    } else if elevation < LOWLAND_CUT {
        1
    } else if elevation < HIGHLAND_CUT {
        2
    } else if elevation < PEAK_CUT {
        3
    } else {
        4
    }
}

/// Surface tile for a band's top layer
fn surface_tile(band: i32) -> TileId {
    match band {
        0 => TILE_WATER,
        1 => TILE_SAND_CUBE,
        2 => TILE_GRASS_CUBE,
        3 => TILE_ROCK_CUBE,
        _ => TILE_ROCK_PILLAR,
    }
}

/// Write one solid column: rock fill from z=0 up to the band, the band's
/// surface tile on top. Water cells get a single water tile at z=0.
fn write_column(
    grid: &mut WorldGrid,
    catalog: &TileCatalog,
    x: i32,
    y: i32,
    band: i32,
) -> Result<usize, GridError> {
    if band == 0 {
        grid.place_tile(catalog, TilePos::new(x, y, 0), TILE_WATER, None)?;
        return Ok(1);
    }
    for z in 0..band {
        grid.place_tile(catalog, TilePos::new(x, y, z), TILE_ROCK_CUBE, None)?;
    }
    grid.place_tile(catalog, TilePos::new(x, y, band), surface_tile(band), None)?;
    Ok(band as usize + 1)
}

/// Seeded Perlin fBm over the footprint with radial falloff toward the
/// edges, normalized to [0, 1]
fn build_height_field(dimension: usize, seed: u32) -> HeightField {
    let perlin = Perlin::new(seed);
    let mut field = HeightField::new(dimension);
    let half = dimension as f32 / 2.0;

    for y in 0..dimension {
        for x in 0..dimension {
            let nx = x as f64 / dimension as f64;
            let ny = y as f64 / dimension as f64;

            let mut elevation = 0.0_f64;
            let mut amplitude = 1.0_f64;
            let mut frequency = BASE_FREQUENCY;
            let mut total = 0.0_f64;
            for octave in 0..OCTAVES {
                // Offset each octave so they do not sample the same lattice
                let offset = octave as f64 * 37.0;
                elevation += amplitude * perlin.get([nx * frequency + offset, ny * frequency + offset]);
                total += amplitude;
                amplitude *= 0.5;
                frequency *= 2.0;
            }
            // Perlin output is in [-1, 1]; map the octave sum to [0, 1]
            let mut elevation = ((elevation / total) as f32 + 1.0) * 0.5;

            // Radial falloff: edges trend toward minimum elevation
            let dx = (x as f32 - half) / half;
            let dy = (y as f32 - half) / half;
            let falloff = (1.0 - (dx * dx + dy * dy)).clamp(0.0, 1.0);
            elevation *= falloff;

            field.set(x, y, elevation.clamp(0.0, 1.0));
        }
    }
    field
}

/// Rebuild a height field from the grid's top elevation per column,
/// scanning the occupied bounding box. Bands map back to evenly spaced
/// normalized values.
fn field_from_grid(grid: &WorldGrid) -> Option<HeightField> {
    if grid.is_empty() {
        return None;
    }
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    for (pos, _) in grid.iter() {
        min_x = min_x.min(pos.x);
        min_y = min_y.min(pos.y);
        max_x = max_x.max(pos.x);
        max_y = max_y.max(pos.y);
    }
    let dimension = ((max_x - min_x + 1).max(max_y - min_y + 1)) as usize;
    let mut field = HeightField::new(dimension);
    for y in 0..dimension {
        for x in 0..dimension {
            if let Some(top) = grid.top_level_at(min_x + x as i32, min_y + y as i32) {
                let normalized = (top.min(BAND_COUNT - 1) as f32 + 0.5) / BAND_COUNT as f32;
                field.set(x, y, normalized);
            }
        }
    }
    Some(field)
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0)
}
