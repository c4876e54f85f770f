use crate::tiles::{TilePos, LEVEL_HEIGHT, TILE_HALF_HEIGHT, TILE_HALF_WIDTH};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete zoom steps; the camera never holds any other factor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomLevel {
    #[default]
    X1,
    X2,
    X4,
}

impl ZoomLevel {
    pub const fn factor(&self) -> f32 {
        match self {
            ZoomLevel::X1 => 1.0,
            ZoomLevel::X2 => 2.0,
            ZoomLevel::X4 => 4.0,
        }
    }

    /// Parse an integer zoom factor; only 1, 2 and 4 are valid
    pub fn from_factor(factor: u8) -> Result<Self, CameraError> {
        match factor {
            1 => Ok(ZoomLevel::X1),
            2 => Ok(ZoomLevel::X2),
            4 => Ok(ZoomLevel::X4),
            other => Err(CameraError::InvalidZoom(other)),
        }
    }

    /// Next step toward 4x, saturating
    pub const fn zoomed_in(&self) -> Self {
        match self {
            ZoomLevel::X1 => ZoomLevel::X2,
            ZoomLevel::X2 | ZoomLevel::X4 => ZoomLevel::X4,
        }
    }

    /// Next step toward 1x, saturating
    pub const fn zoomed_out(&self) -> Self {
        match self {
            ZoomLevel::X4 => ZoomLevel::X2,
            ZoomLevel::X2 | ZoomLevel::X1 => ZoomLevel::X1,
        }
    }
}

/// Error type for camera operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraError {
    InvalidZoom(u8),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::InvalidZoom(z) => {
                write!(f, "Invalid zoom factor {} (allowed: 1, 2, 4)", z)
            }
        }
    }
}

impl std::error::Error for CameraError {}

/// Drawing-surface dimensions in pixels, passed into the planner and
/// renderer each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Isometric camera: pan offset, discrete zoom, and the active z-level
/// mirror. Screen coordinates are pixels with the origin at the top-left
/// of the viewport and y growing downward.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct IsoCamera {
    pub pan_x: f32,
    pub pan_y: f32,
    zoom: ZoomLevel,
    /// Mirrors the z-level manager; kept here so projection helpers and
    /// exported camera state carry the full view description
    pub active_z: i32,
}

impl IsoCamera {
    pub fn new() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: ZoomLevel::X1,
            active_z: 0,
        }
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    /// Set zoom from an integer factor; rejects anything outside {1, 2, 4}
    pub fn set_zoom(&mut self, factor: u8) -> Result<(), CameraError> {
        self.zoom = ZoomLevel::from_factor(factor)?;
        Ok(())
    }

    pub fn set_zoom_level(&mut self, level: ZoomLevel) {
        self.zoom = level;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = self.zoom.zoomed_in();
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.zoomed_out();
    }

    /// Add pixel deltas to the pan offset; unbounded
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Restore pan 0/0 and 1x zoom; the active z-level is left alone
    pub fn reset(&mut self) {
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.zoom = ZoomLevel::X1;
    }

    /// Project a world coordinate onto the screen (2:1 diamond layout).
    /// Adjacent tiles along world x differ by exactly one half-tile step
    /// horizontally and vertically; +1 z moves the tile strictly upward.
    pub fn world_to_screen(&self, x: f32, y: f32, z: f32) -> Vec2 {
        let scale = self.zoom.factor();
        Vec2::new(
            (x - y) * TILE_HALF_WIDTH * scale + self.pan_x,
            (x + y) * TILE_HALF_HEIGHT * scale - z * LEVEL_HEIGHT * scale + self.pan_y,
        )
    }

    /// Project a grid coordinate onto the screen
    pub fn project(&self, pos: TilePos) -> Vec2 {
        self.world_to_screen(pos.x as f32, pos.y as f32, pos.z as f32)
    }

    /// Algebraic inverse of `world_to_screen` at a fixed z-level;
    /// round-trips exactly within floating-point tolerance
    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32, z: i32) -> Vec2 {
        let scale = self.zoom.factor();
        let a = (screen_x - self.pan_x) / (TILE_HALF_WIDTH * scale);
        let b = (screen_y - self.pan_y + z as f32 * LEVEL_HEIGHT * scale)
            / (TILE_HALF_HEIGHT * scale);
        Vec2::new((a + b) * 0.5, (b - a) * 0.5)
    }

    /// Click-to-tile picking at the camera's active z-level
    pub fn pick_tile(&self, screen_x: f32, screen_y: f32) -> TilePos {
        let world = self.screen_to_world(screen_x, screen_y, self.active_z);
        TilePos::new(
            world.x.round() as i32,
            world.y.round() as i32,
            self.active_z,
        )
    }
}

impl Default for IsoCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_diamond_steps() {
        let camera = IsoCamera::new();
        let origin = camera.world_to_screen(0.0, 0.0, 0.0);
        let east = camera.world_to_screen(1.0, 0.0, 0.0);
        let south = camera.world_to_screen(0.0, 1.0, 0.0);

        // +x: right and down by one half step each
        assert_eq!(east - origin, Vec2::new(TILE_HALF_WIDTH, TILE_HALF_HEIGHT));
        // +y: left and down
        assert_eq!(south - origin, Vec2::new(-TILE_HALF_WIDTH, TILE_HALF_HEIGHT));
    }

    #[test]
    fn test_z_moves_strictly_upward() {
        let camera = IsoCamera::new();
        let ground = camera.world_to_screen(3.0, 4.0, 0.0);
        let raised = camera.world_to_screen(3.0, 4.0, 1.0);
        assert_eq!(raised.x, ground.x);
        assert_eq!(ground.y - raised.y, LEVEL_HEIGHT);
    }

    #[test]
    fn test_round_trip_all_zooms() {
        for factor in [1u8, 2, 4] {
            let mut camera = IsoCamera::new();
            camera.set_zoom(factor).unwrap();
            camera.pan(123.5, -987.25);
            camera.active_z = 3;

            for (x, y, z) in [(0, 0, 0), (5, -7, 3), (-100, 42, 12), (31, 31, 4)] {
                let screen = camera.world_to_screen(x as f32, y as f32, z as f32);
                let world = camera.screen_to_world(screen.x, screen.y, z);
                assert!((world.x - x as f32).abs() < EPS, "x at zoom {}", factor);
                assert!((world.y - y as f32).abs() < EPS, "y at zoom {}", factor);
            }
        }
    }

    #[test]
    fn test_pick_tile_rounds_to_nearest() {
        let mut camera = IsoCamera::new();
        camera.active_z = 2;
        let center = camera.project(TilePos::new(6, -3, 2));
        assert_eq!(camera.pick_tile(center.x, center.y), TilePos::new(6, -3, 2));

        // A nudge smaller than half a step still picks the same tile
        assert_eq!(
            camera.pick_tile(center.x + 3.0, center.y - 3.0),
            TilePos::new(6, -3, 2)
        );
    }

    #[test]
    fn test_invalid_zoom_rejected() {
        let mut camera = IsoCamera::new();
        assert_eq!(camera.set_zoom(3), Err(CameraError::InvalidZoom(3)));
        assert_eq!(camera.set_zoom(0), Err(CameraError::InvalidZoom(0)));
        // State unchanged after rejection
        assert_eq!(camera.zoom(), ZoomLevel::X1);
    }

    #[test]
    fn test_zoom_steps_saturate() {
        let mut camera = IsoCamera::new();
        camera.zoom_in();
        camera.zoom_in();
        camera.zoom_in();
        assert_eq!(camera.zoom(), ZoomLevel::X4);
        camera.zoom_out();
        camera.zoom_out();
        camera.zoom_out();
        assert_eq!(camera.zoom(), ZoomLevel::X1);
    }

    #[test]
    fn test_reset_keeps_active_z() {
        let mut camera = IsoCamera::new();
        camera.pan(50.0, 60.0);
        camera.set_zoom(4).unwrap();
        camera.active_z = 5;
        camera.reset();
        assert_eq!(camera.pan_x, 0.0);
        assert_eq!(camera.pan_y, 0.0);
        assert_eq!(camera.zoom(), ZoomLevel::X1);
        assert_eq!(camera.active_z, 5);
    }
}
