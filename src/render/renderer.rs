use super::planner::FramePlan;
use crate::iso::{IsoCamera, Viewport, ZoomLevel};
use crate::tiles::{
    AtlasRect, TileCatalog, TilePalette, ATLAS_CELL_HEIGHT, TILE_HALF_HEIGHT,
};
use bevy::prelude::*;
use std::fmt;

/// Largest world-axis span the grid overlay will cover in one frame;
/// keeps the line count bounded at extreme zoom-out
const MAX_GRID_SPAN: i32 = 256;

/// Error type for renderer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// The shared atlas image has not finished loading; the frame is
    /// skipped rather than drawn partially
    AssetNotReady,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::AssetNotReady => write!(f, "Atlas image not loaded yet"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Toggleable overlays
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_grid: bool,
    pub show_labels: bool,
}

/// One atlas-sampling draw operation; `screen` is the sprite center
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDraw {
    pub src: AtlasRect,
    pub screen: Vec2,
    pub scale: f32,
}

/// Sprites sharing one atlas/palette draw call
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteBatch {
    pub palette: TilePalette,
    pub sprites: Vec<SpriteDraw>,
}

/// A grid-overlay line segment in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub from: Vec2,
    pub to: Vec2,
}

/// A per-tile coordinate label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDraw {
    pub text: String,
    pub screen: Vec2,
}

/// Everything one frame draws, ready for the surface layer to consume
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDrawList {
    pub batches: Vec<SpriteBatch>,
    pub grid_lines: Vec<GridLine>,
    pub labels: Vec<LabelDraw>,
    pub draw_calls: usize,
}

/// Turns planner batches into concrete draw operations. Holds only the
/// atlas readiness flag; everything else is per-call input.
#[derive(Resource, Debug, Default)]
pub struct Renderer {
    atlas_ready: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_atlas_ready(&mut self, ready: bool) {
        self.atlas_ready = ready;
    }

    pub fn atlas_ready(&self) -> bool {
        self.atlas_ready
    }

    /// Build the frame's draw list. Fails with `AssetNotReady` (and draws
    /// nothing) until the atlas image is available.
    pub fn compose(
        &self,
        plan: &FramePlan,
        catalog: &TileCatalog,
        camera: &IsoCamera,
        viewport: Viewport,
        options: RenderOptions,
    ) -> Result<FrameDrawList, RenderError> {
        if !self.atlas_ready {
            return Err(RenderError::AssetNotReady);
        }

        let scale = camera.zoom().factor();
        let mut list = FrameDrawList {
            draw_calls: plan.draw_calls,
            ..Default::default()
        };

        // Tile sprites, one batch per planner batch. The projected point
        // is the top diamond center; the sprite cell is bottom-aligned so
        // taller cells (cubes, pillars) rise above it.
        for batch in &plan.batches {
            let mut sprites = Vec::with_capacity(batch.instances.len());
            for inst in &batch.instances {
                let Some(def) = catalog.get(inst.tile_id) else {
                    continue;
                };
                let bottom = inst.screen.y + TILE_HALF_HEIGHT * scale;
                let center = Vec2::new(
                    inst.screen.x,
                    bottom - (def.atlas_rect.height as f32 * scale) / 2.0,
                );
                sprites.push(SpriteDraw {
                    src: def.atlas_rect,
                    screen: center,
                    scale,
                });
            }
            list.batches.push(SpriteBatch {
                palette: batch.palette,
                sprites,
            });
        }

        if options.show_grid {
            list.grid_lines = grid_overlay(camera, viewport);
        }

        // Coordinate labels are illegible below 2x, so they only render
        // from that zoom upward
        if options.show_labels && camera.zoom() != ZoomLevel::X1 {
            for batch in &plan.batches {
                for inst in &batch.instances {
                    list.labels.push(LabelDraw {
                        text: format!("{},{},{}", inst.pos.x, inst.pos.y, inst.pos.z),
                        screen: Vec2::new(
                            inst.screen.x,
                            inst.screen.y - ATLAS_CELL_HEIGHT as f32 * scale * 0.5,
                        ),
                    });
                }
            }
        }

        Ok(list)
    }
}

/// Diamond grid lines over the visible world rectangle at the camera's
/// active z-level. The projection is affine, so each grid line is a
/// straight segment between two projected endpoints.
fn grid_overlay(camera: &IsoCamera, viewport: Viewport) -> Vec<GridLine> {
    let z = camera.active_z;
    // World-space bounds of the viewport corners at this z
    let corners = [
        camera.screen_to_world(0.0, 0.0, z),
        camera.screen_to_world(viewport.width, 0.0, z),
        camera.screen_to_world(0.0, viewport.height, z),
        camera.screen_to_world(viewport.width, viewport.height, z),
    ];
    let min_x = corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|c| c.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|c| c.y).fold(f32::NEG_INFINITY, f32::max);

    let x0 = min_x.floor() as i32;
    let x1 = (max_x.ceil() as i32).min(x0 + MAX_GRID_SPAN);
    let y0 = min_y.floor() as i32;
    let y1 = (max_y.ceil() as i32).min(y0 + MAX_GRID_SPAN);

    let zf = z as f32;
    let mut lines = Vec::with_capacity(((x1 - x0) + (y1 - y0) + 4) as usize);
    // Cell boundaries run at half-tile offsets along both axes
    for x in x0..=x1 + 1 {
        let a = camera.world_to_screen(x as f32 - 0.5, y0 as f32 - 0.5, zf);
        let b = camera.world_to_screen(x as f32 - 0.5, y1 as f32 + 0.5, zf);
        lines.push(GridLine { from: a, to: b });
    }
    for y in y0..=y1 + 1 {
        let a = camera.world_to_screen(x0 as f32 - 0.5, y as f32 - 0.5, zf);
        let b = camera.world_to_screen(x1 as f32 + 0.5, y as f32 - 0.5, zf);
        lines.push(GridLine { from: a, to: b });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::perf::RenderFlags;
    use super::super::planner::FramePlanner;
    use crate::tiles::{TILE_GRASS_CUBE, TILE_ROCK_CUBE};
    use crate::world::WorldGrid;

    fn composed_frame(
        options: RenderOptions,
        zoom: u8,
    ) -> Result<FrameDrawList, RenderError> {
        let catalog = TileCatalog::standard();
        let mut grid = WorldGrid::new();
        grid.fill_region(&catalog, 0, 0, 2, 2, 0, TILE_GRASS_CUBE)
            .unwrap();
        grid.fill_region(&catalog, 0, 0, 1, 1, 1, TILE_ROCK_CUBE)
            .unwrap();

        let mut camera = IsoCamera::new();
        camera.set_zoom(zoom).unwrap();
        camera.pan(400.0, 200.0);

        let viewport = Viewport::new(800.0, 600.0);
        let plan = FramePlanner::new().plan(
            &grid,
            &catalog,
            &camera,
            viewport,
            &RenderFlags::default(),
            60.0,
        );

        let mut renderer = Renderer::new();
        renderer.set_atlas_ready(true);
        renderer.compose(&plan, &catalog, &camera, viewport, options)
    }

    #[test]
    fn test_not_ready_skips_frame() {
        let renderer = Renderer::new();
        let result = renderer.compose(
            &FramePlan::default(),
            &TileCatalog::standard(),
            &IsoCamera::new(),
            Viewport::new(800.0, 600.0),
            RenderOptions::default(),
        );
        assert_eq!(result.unwrap_err(), RenderError::AssetNotReady);
    }

    #[test]
    fn test_sprites_cover_every_instance() {
        let list = composed_frame(RenderOptions::default(), 1).unwrap();
        let sprite_count: usize = list.batches.iter().map(|b| b.sprites.len()).sum();
        assert_eq!(sprite_count, 13); // 9 cubes + 4 rocks
        assert_eq!(list.draw_calls, list.batches.len());
        assert!(list.grid_lines.is_empty());
        assert!(list.labels.is_empty());
    }

    #[test]
    fn test_grid_overlay_lines() {
        let options = RenderOptions {
            show_grid: true,
            show_labels: false,
        };
        let list = composed_frame(options, 1).unwrap();
        assert!(!list.grid_lines.is_empty());
        // Every line has distinct endpoints
        assert!(list.grid_lines.iter().all(|l| l.from != l.to));
    }

    #[test]
    fn test_labels_respect_min_zoom() {
        let options = RenderOptions {
            show_grid: false,
            show_labels: true,
        };
        // At 1x labels stay hidden even when enabled
        let list = composed_frame(options, 1).unwrap();
        assert!(list.labels.is_empty());

        // At 2x they appear, one per drawn tile
        let list = composed_frame(options, 2).unwrap();
        assert_eq!(list.labels.len(), 13);
        assert!(list.labels.iter().any(|l| l.text == "0,0,0"));
    }

    #[test]
    fn test_taller_stack_draws_higher_on_screen() {
        let list = composed_frame(RenderOptions::default(), 1).unwrap();
        // The z=1 rock at (0,0) must sit above the z=0 cube at (0,0)
        let mut at_origin: Vec<&SpriteDraw> = Vec::new();
        for batch in &list.batches {
            for sprite in &batch.sprites {
                if (sprite.screen.x - 400.0).abs() < 0.5 {
                    at_origin.push(sprite);
                }
            }
        }
        assert!(at_origin.len() >= 2);
        let min_y = at_origin.iter().map(|s| s.screen.y).fold(f32::INFINITY, f32::min);
        let max_y = at_origin.iter().map(|s| s.screen.y).fold(f32::NEG_INFINITY, f32::max);
        assert!(max_y - min_y > 0.0);
    }
}
