pub mod camera;

// Re-export commonly used items
pub use camera::{CameraError, IsoCamera, Viewport, ZoomLevel};
