use super::grid::WorldGrid;
use crate::iso::IsoCamera;
use crate::tiles::{PlacedTile, TileCatalog, TilePos};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

/// Magic number for world snapshot files ("ISOW" in ASCII)
const MAGIC_NUMBER: [u8; 4] = [b'I', b'S', b'O', b'W'];

/// Current snapshot file format version
const VERSION: u16 = 1;

/// Error type for snapshot save/load operations
#[derive(Debug)]
pub enum SerializationError {
    Io(io::Error),
    InvalidMagicNumber,
    InvalidVersion(u16),
    InvalidChecksum,
    Corrupt(String),
}

impl From<io::Error> for SerializationError {
    fn from(err: io::Error) -> Self {
        SerializationError::Io(err)
    }
}

impl From<bincode::Error> for SerializationError {
    fn from(err: bincode::Error) -> Self {
        SerializationError::Corrupt(err.to_string())
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::Io(e) => write!(f, "IO error: {}", e),
            SerializationError::InvalidMagicNumber => write!(f, "Invalid magic number"),
            SerializationError::InvalidVersion(v) => write!(f, "Invalid version: {}", v),
            SerializationError::InvalidChecksum => write!(f, "Checksum mismatch"),
            SerializationError::Corrupt(msg) => write!(f, "Corrupt payload: {}", msg),
        }
    }
}

impl std::error::Error for SerializationError {}

/// One persisted grid entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SavedTile {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub tile: PlacedTile,
}

/// Serializable snapshot of the whole world plus, optionally, the camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tiles: Vec<SavedTile>,
    pub camera: Option<IsoCamera>,
}

impl WorldSnapshot {
    /// Capture the current grid (and camera, when given) for saving
    pub fn capture(grid: &WorldGrid, camera: Option<&IsoCamera>) -> Self {
        let mut tiles: Vec<SavedTile> = grid
            .iter()
            .map(|(pos, tile)| SavedTile {
                x: pos.x,
                y: pos.y,
                z: pos.z,
                tile: *tile,
            })
            .collect();
        // Stable on-disk order keeps snapshots byte-comparable
        tiles.sort_by_key(|t| (t.z, t.y, t.x));
        Self {
            tiles,
            camera: camera.cloned(),
        }
    }
}

/// Save a world snapshot to disk in binary format
pub fn save_world<P: AsRef<Path>>(
    path: P,
    grid: &WorldGrid,
    camera: Option<&IsoCamera>,
) -> Result<(), SerializationError> {
    // Ensure directory exists
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    let snapshot = WorldSnapshot::capture(grid, camera);
    let payload = bincode::serialize(&snapshot)?;

    let mut file = File::create(path)?;
    file.write_all(&MAGIC_NUMBER)?;
    file.write_all(&VERSION.to_le_bytes())?;
    file.write_all(&(payload.len() as u32).to_le_bytes())?;
    file.write_all(&payload)?;

    let checksum = crc32fast::hash(&payload);
    file.write_all(&checksum.to_le_bytes())?;

    file.sync_all()?;
    Ok(())
}

/// Load a world snapshot from disk
pub fn load_world<P: AsRef<Path>>(path: P) -> Result<WorldSnapshot, SerializationError> {
    let mut file = File::open(path)?;

    // Read and verify magic number
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if magic != MAGIC_NUMBER {
        return Err(SerializationError::InvalidMagicNumber);
    }

    // Read and verify version
    let mut version_bytes = [0u8; 2];
    file.read_exact(&mut version_bytes)?;
    let version = u16::from_le_bytes(version_bytes);
    if version != VERSION {
        return Err(SerializationError::InvalidVersion(version));
    }

    // Read payload
    let mut len_bytes = [0u8; 4];
    file.read_exact(&mut len_bytes)?;
    let payload_len = u32::from_le_bytes(len_bytes) as usize;
    let mut payload = vec![0u8; payload_len];
    file.read_exact(&mut payload)?;

    // Read and verify checksum
    let mut checksum_bytes = [0u8; 4];
    file.read_exact(&mut checksum_bytes)?;
    let expected_checksum = u32::from_le_bytes(checksum_bytes);
    if crc32fast::hash(&payload) != expected_checksum {
        return Err(SerializationError::InvalidChecksum);
    }

    Ok(bincode::deserialize(&payload)?)
}

/// Check if a snapshot file exists
pub fn snapshot_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists()
}

/// Apply a loaded snapshot onto a grid. Entries with a tile id unknown to
/// the catalog are skipped with a warning rather than aborting the load.
/// Returns the number of tiles restored.
pub fn hydrate(snapshot: &WorldSnapshot, grid: &mut WorldGrid, catalog: &TileCatalog) -> usize {
    let mut restored = 0;
    for saved in &snapshot.tiles {
        let pos = TilePos::new(saved.x, saved.y, saved.z);
        match grid.place_tile(catalog, pos, saved.tile.tile_id, Some(saved.tile.rotation)) {
            Ok(_) => restored += 1,
            Err(e) => {
                warn!("Skipping snapshot entry at {:?}: {}", pos, e);
            }
        }
    }
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{Rotation, TILE_GRASS_CUBE, TILE_ROCK_CUBE};
    use std::env;

    fn test_grid(catalog: &TileCatalog) -> WorldGrid {
        let mut grid = WorldGrid::new();
        grid.place_tile(catalog, TilePos::new(0, 0, 0), TILE_GRASS_CUBE, None)
            .unwrap();
        grid.place_tile(
            catalog,
            TilePos::new(-5, 3, 2),
            TILE_ROCK_CUBE,
            Some(Rotation::R270),
        )
        .unwrap();
        grid
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let catalog = TileCatalog::standard();
        let grid = test_grid(&catalog);
        let mut camera = IsoCamera::new();
        camera.pan(12.0, -34.0);
        camera.set_zoom(2).unwrap();

        let path = env::temp_dir().join("isoworld_roundtrip.bin");
        save_world(&path, &grid, Some(&camera)).expect("save failed");

        let snapshot = load_world(&path).expect("load failed");
        assert_eq!(snapshot.tiles.len(), 2);

        let mut restored = WorldGrid::new();
        assert_eq!(hydrate(&snapshot, &mut restored, &catalog), 2);
        let tile = restored.get_tile(TilePos::new(-5, 3, 2)).unwrap();
        assert_eq!(tile.tile_id, TILE_ROCK_CUBE);
        assert_eq!(tile.rotation, Rotation::R270);

        let camera_back = snapshot.camera.unwrap();
        assert_eq!(camera_back.pan_x, 12.0);
        assert_eq!(camera_back.zoom().factor(), 2.0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_corrupted_payload_rejected() {
        let catalog = TileCatalog::standard();
        let grid = test_grid(&catalog);
        let path = env::temp_dir().join("isoworld_corrupt.bin");
        save_world(&path, &grid, None).unwrap();

        // Flip a payload byte past the header
        let mut bytes = fs::read(&path).unwrap();
        bytes[12] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            load_world(&path),
            Err(SerializationError::InvalidChecksum)
        ));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let path = env::temp_dir().join("isoworld_magic.bin");
        fs::write(&path, b"NOPE0000000000000000").unwrap();
        assert!(matches!(
            load_world(&path),
            Err(SerializationError::InvalidMagicNumber)
        ));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_unknown_tile_ids_skipped_on_hydrate() {
        let catalog = TileCatalog::standard();
        let snapshot = WorldSnapshot {
            tiles: vec![
                SavedTile {
                    x: 0,
                    y: 0,
                    z: 0,
                    tile: PlacedTile::new(TILE_GRASS_CUBE),
                },
                SavedTile {
                    x: 1,
                    y: 0,
                    z: 0,
                    tile: PlacedTile::new(999),
                },
            ],
            camera: None,
        };

        let mut grid = WorldGrid::new();
        assert_eq!(hydrate(&snapshot, &mut grid, &catalog), 1);
        assert_eq!(grid.len(), 1);
        assert!(grid.get_tile(TilePos::new(1, 0, 0)).is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = env::temp_dir().join("isoworld_does_not_exist.bin");
        assert!(!snapshot_exists(&path));
        assert!(matches!(
            load_world(&path),
            Err(SerializationError::Io(_))
        ));
    }
}
