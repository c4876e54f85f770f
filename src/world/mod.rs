pub mod generator;
pub mod grid;
pub mod serialization;
pub mod zlevel;

// Re-export commonly used items
pub use generator::{GenerationReport, HeightField, MapSize, TerrainGenerator};
pub use grid::{GridError, WorldGrid};
pub use zlevel::ZLevelManager;
