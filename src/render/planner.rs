use super::perf::RenderFlags;
use crate::iso::{IsoCamera, Viewport};
use crate::tiles::{TileCatalog, TileId, TilePalette, TilePos, ATLAS_CELL_HEIGHT, ATLAS_CELL_WIDTH};
use crate::world::WorldGrid;
use bevy::prelude::*;

/// How far the LOD controller may cut into the visible set; structural
/// tiles are never dropped regardless of this ceiling
const MAX_LOD_DROP_FRACTION: f32 = 0.6;

/// One tile to draw this frame, with its projected screen position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileInstance {
    pub pos: TilePos,
    pub tile_id: TileId,
    pub screen: Vec2,
}

/// A group of instances sharing one atlas/palette draw target
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub palette: TilePalette,
    pub instances: Vec<TileInstance>,
}

/// Planner output: ordered batches plus the figures the performance
/// monitor reads back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePlan {
    pub batches: Vec<DrawBatch>,
    /// Tiles that will actually be drawn this frame
    pub visible: usize,
    /// All placed tiles, visible or not
    pub total: usize,
    pub draw_calls: usize,
    pub culled: usize,
    pub lod_dropped: usize,
}

/// Reduces "all placed tiles" to "what must be drawn, in how many draw
/// calls": viewport culling, palette batching, and load-shedding LOD
#[derive(Resource, Debug, Default)]
pub struct FramePlanner;

impl FramePlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(
        &self,
        grid: &WorldGrid,
        catalog: &TileCatalog,
        camera: &IsoCamera,
        viewport: Viewport,
        flags: &RenderFlags,
        current_fps: f32,
    ) -> FramePlan {
        let total = grid.len();

        // Project every tile and keep the ones inside the viewport (with
        // a sprite-sized margin for partially visible tiles). With
        // culling off, everything is considered visible.
        let scale = camera.zoom().factor();
        let margin_x = ATLAS_CELL_WIDTH as f32 * scale;
        let margin_y = ATLAS_CELL_HEIGHT as f32 * scale;
        let mut in_view: Vec<TileInstance> = Vec::new();
        for (&pos, tile) in grid.iter() {
            let screen = camera.project(pos);
            let inside = screen.x >= -margin_x
                && screen.x <= viewport.width + margin_x
                && screen.y >= -margin_y
                && screen.y <= viewport.height + margin_y;
            if inside || !flags.culling {
                in_view.push(TileInstance {
                    pos,
                    tile_id: tile.tile_id,
                    screen,
                });
            }
        }
        let culled = total - in_view.len();

        // LOD: under frame-budget pressure, shed decorative tiles first,
        // stalest regions first, until the deficit is covered
        let lod_dropped = if flags.lod && current_fps > 0.0 && current_fps < flags.target_fps {
            self.shed_detail(&mut in_view, grid, catalog, flags, current_fps)
        } else {
            0
        };

        // Painter's order: back-to-front along the diamond, low z first
        in_view.sort_by_key(|inst| (inst.pos.x + inst.pos.y, inst.pos.z, inst.pos.x));

        let visible = in_view.len();
        let batches = if flags.batching {
            batch_by_palette(in_view, catalog)
        } else {
            // One draw call per tile
            in_view
                .into_iter()
                .map(|inst| DrawBatch {
                    palette: catalog
                        .get(inst.tile_id)
                        .map(|def| def.palette)
                        .unwrap_or(TilePalette::Green),
                    instances: vec![inst],
                })
                .collect()
        };
        let draw_calls = batches.len();

        FramePlan {
            batches,
            visible,
            total,
            draw_calls,
            culled,
            lod_dropped,
        }
    }

    /// Remove droppable instances in (lod rank, region staleness) order.
    /// Returns how many were removed.
    fn shed_detail(
        &self,
        in_view: &mut Vec<TileInstance>,
        grid: &WorldGrid,
        catalog: &TileCatalog,
        flags: &RenderFlags,
        current_fps: f32,
    ) -> usize {
        let deficit = ((flags.target_fps - current_fps) / flags.target_fps)
            .clamp(0.0, MAX_LOD_DROP_FRACTION);
        let budget = (in_view.len() as f32 * deficit).ceil() as usize;
        if budget == 0 {
            return 0;
        }

        // Indices of droppable instances, stalest-first within each rank
        let mut candidates: Vec<(u8, u64, usize)> = in_view
            .iter()
            .enumerate()
            .filter_map(|(index, inst)| {
                let rank = catalog.get(inst.tile_id)?.kind.lod_rank()?;
                Some((rank, grid.region_last_touched(inst.pos), index))
            })
            .collect();
        candidates.sort_by_key(|&(rank, touched, _)| (rank, touched));

        let mut drop_indices: Vec<usize> = candidates
            .into_iter()
            .take(budget)
            .map(|(_, _, index)| index)
            .collect();
        drop_indices.sort_unstable_by(|a, b| b.cmp(a));
        for index in &drop_indices {
            in_view.swap_remove(*index);
        }
        drop_indices.len()
    }
}

/// Group instances by palette, batches ordered by atlas row, instance
/// order preserved inside each batch
fn batch_by_palette(instances: Vec<TileInstance>, catalog: &TileCatalog) -> Vec<DrawBatch> {
    let mut batches: Vec<DrawBatch> = Vec::new();
    for inst in instances {
        let palette = match catalog.get(inst.tile_id) {
            Some(def) => def.palette,
            None => continue,
        };
        match batches.iter_mut().find(|b| b.palette == palette) {
            Some(batch) => batch.instances.push(inst),
            None => batches.push(DrawBatch {
                palette,
                instances: vec![inst],
            }),
        }
    }
    batches.sort_by_key(|b| b.palette.atlas_row());
    batches
}
