use bevy::{input::mouse::MouseWheel, prelude::*};
use std::time::Instant;

mod hud;
mod iso;
mod render;
mod tiles;
mod world;

use hud::PerfHudPlugin;
use iso::{IsoCamera, Viewport};
use render::{FrameDrawList, FramePlanner, PerformanceMonitor, RenderError, RenderOptions, Renderer};
use tiles::{TileCatalog, TileId, ATLAS_PATH, TILE_GRASS_CUBE};
use world::{serialization, MapSize, TerrainGenerator, WorldGrid, ZLevelManager};

/// Where the world snapshot lives on disk
const SAVE_PATH: &str = "saves/world.bin";

/// Camera pan speed in screen pixels per second
const PAN_SPEED: f32 = 300.0;

/// Widest span the fill-visible-area command will write, per axis
const MAX_FILL_SPAN: i32 = 64;

/// Handle to the shared sprite atlas image
#[derive(Resource)]
struct AtlasHandle(Handle<Image>);

/// Tile id the next place command will use
#[derive(Resource)]
struct BrushTile(TileId);

impl Default for BrushTile {
    fn default() -> Self {
        Self(TILE_GRASS_CUBE)
    }
}

/// Latest composed draw list, consumed by the sprite/gizmo sync systems
#[derive(Resource, Default, PartialEq)]
struct CurrentFrame(Option<FrameDrawList>);

/// Marker for entities rebuilt from the draw list each time it changes
#[derive(Component)]
struct FrameVisual;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(ImagePlugin::default_nearest()))
        .add_plugins(PerfHudPlugin)
        .init_resource::<TileCatalog>()
        .init_resource::<WorldGrid>()
        .init_resource::<TerrainGenerator>()
        .init_resource::<ZLevelManager>()
        .init_resource::<IsoCamera>()
        .init_resource::<FramePlanner>()
        .init_resource::<Renderer>()
        .init_resource::<PerformanceMonitor>()
        .init_resource::<RenderOptions>()
        .init_resource::<BrushTile>()
        .init_resource::<CurrentFrame>()
        .add_systems(Startup, (setup_engine, load_saved_world).chain())
        .add_systems(
            Update,
            (
                watch_atlas_ready,
                camera_pan_input,
                camera_zoom_input,
                zlevel_input,
                brush_input,
                edit_input,
                fill_visible_input,
                terrain_commands,
                overlay_and_mode_commands,
                save_load_commands,
            ),
        )
        .add_systems(
            Update,
            (
                run_frame_pipeline,
                sync_frame_sprites.after(run_frame_pipeline),
                draw_grid_overlay.after(run_frame_pipeline),
            ),
        )
        .run();
}

fn setup_engine(mut commands: Commands, assets: Res<AssetServer>) {
    // Fixed 2D camera; all projection math lives in IsoCamera
    commands.spawn((Camera2d, Transform::from_xyz(0.0, 0.0, 999.0)));

    let atlas: Handle<Image> = assets.load(ATLAS_PATH);
    commands.insert_resource(AtlasHandle(atlas));

    info!("Engine setup complete");
}

/// Hydrate the grid and camera from the last snapshot, if one exists.
/// Unreadable snapshots degrade to an empty world.
fn load_saved_world(
    mut grid: ResMut<WorldGrid>,
    mut camera: ResMut<IsoCamera>,
    catalog: Res<TileCatalog>,
) {
    if !serialization::snapshot_exists(SAVE_PATH) {
        info!("No saved world at {}; starting empty", SAVE_PATH);
        return;
    }
    match serialization::load_world(SAVE_PATH) {
        Ok(snapshot) => {
            let restored = serialization::hydrate(&snapshot, &mut grid, &catalog);
            if let Some(saved_camera) = snapshot.camera {
                *camera = saved_camera;
            }
            info!("Restored {} tiles from {}", restored, SAVE_PATH);
        }
        Err(e) => {
            warn!("Could not read {}: {}; starting empty", SAVE_PATH, e);
        }
    }
}

/// Flip the renderer to ready once the atlas image has loaded
fn watch_atlas_ready(
    mut events: MessageReader<AssetEvent<Image>>,
    atlas: Res<AtlasHandle>,
    mut renderer: ResMut<Renderer>,
) {
    for event in events.read() {
        if event.is_loaded_with_dependencies(atlas.0.id()) {
            renderer.set_atlas_ready(true);
            info!("Tile atlas loaded; rendering enabled");
        }
    }
}

/// WASD / arrow key panning
fn camera_pan_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut camera: ResMut<IsoCamera>,
) {
    let step = PAN_SPEED * time.delta_secs();
    let mut delta = Vec2::ZERO;

    if keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp) {
        delta.y += step;
    }
    if keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown) {
        delta.y -= step;
    }
    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        delta.x += step;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        delta.x -= step;
    }

    if delta != Vec2::ZERO {
        camera.pan(delta.x, delta.y);
    }
}

/// Discrete zoom: scroll wheel or - / = step through {1, 2, 4};
/// digit keys jump straight to a level
fn camera_zoom_input(
    mut scroll_events: MessageReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut camera: ResMut<IsoCamera>,
) {
    for event in scroll_events.read() {
        if event.y > 0.0 {
            camera.zoom_in();
        } else if event.y < 0.0 {
            camera.zoom_out();
        }
    }

    if keyboard.just_pressed(KeyCode::Equal) {
        camera.zoom_in();
    }
    if keyboard.just_pressed(KeyCode::Minus) {
        camera.zoom_out();
    }

    for (key, factor) in [
        (KeyCode::Digit1, 1),
        (KeyCode::Digit2, 2),
        (KeyCode::Digit4, 4),
    ] {
        if keyboard.just_pressed(key) {
            if let Err(e) = camera.set_zoom(factor) {
                warn!("Zoom rejected: {}", e);
            }
        }
    }
}

/// PageUp / PageDown switch the active elevation layer
fn zlevel_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut levels: ResMut<ZLevelManager>,
    mut camera: ResMut<IsoCamera>,
) {
    let mut changed = false;
    if keyboard.just_pressed(KeyCode::PageUp) {
        levels.up();
        changed = true;
    }
    if keyboard.just_pressed(KeyCode::PageDown) {
        levels.down();
        changed = true;
    }
    if changed {
        camera.active_z = levels.active_level();
        info!("Active z-level: {}", levels.active_level());
    }
}

/// Tab cycles the brush through the catalog
fn brush_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    catalog: Res<TileCatalog>,
    mut brush: ResMut<BrushTile>,
) {
    if keyboard.just_pressed(KeyCode::Tab) {
        let ids = catalog.sorted_ids();
        if ids.is_empty() {
            return;
        }
        let next = match ids.iter().position(|&id| id == brush.0) {
            Some(i) => ids[(i + 1) % ids.len()],
            None => ids[0],
        };
        brush.0 = next;
        info!("Brush tile: {}", next);
    }
}

/// Left click places the brush tile at the picked cell on the active
/// level; right click removes whatever is there
fn edit_input(
    mouse: Res<ButtonInput<MouseButton>>,
    window_query: Query<&Window>,
    camera: Res<IsoCamera>,
    catalog: Res<TileCatalog>,
    mut grid: ResMut<WorldGrid>,
    brush: Res<BrushTile>,
) {
    let place = mouse.just_pressed(MouseButton::Left);
    let remove = mouse.just_pressed(MouseButton::Right);
    if !place && !remove {
        return;
    }
    let Ok(window) = window_query.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    let pos = camera.pick_tile(cursor.x, cursor.y);
    if place {
        match grid.place_tile(&catalog, pos, brush.0, None) {
            Ok(_) => debug!("Placed tile {} at {:?}", brush.0, pos),
            Err(e) => warn!("Place rejected: {}", e),
        }
    } else if grid.remove_tile(pos).is_some() {
        debug!("Removed tile at {:?}", pos);
    }
}

/// KeyF floods the visible area at the active level with the brush tile
fn fill_visible_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    window_query: Query<&Window>,
    camera: Res<IsoCamera>,
    catalog: Res<TileCatalog>,
    mut grid: ResMut<WorldGrid>,
    brush: Res<BrushTile>,
    levels: Res<ZLevelManager>,
) {
    if !keyboard.just_pressed(KeyCode::KeyF) {
        return;
    }
    let Ok(window) = window_query.single() else {
        return;
    };

    let z = levels.active_level();
    let corners = [
        camera.screen_to_world(0.0, 0.0, z),
        camera.screen_to_world(window.width(), 0.0, z),
        camera.screen_to_world(0.0, window.height(), z),
        camera.screen_to_world(window.width(), window.height(), z),
    ];
    let min_x = corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min).ceil() as i32;
    let max_x = corners.iter().map(|c| c.x).fold(f32::NEG_INFINITY, f32::max).floor() as i32;
    let min_y = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min).ceil() as i32;
    let max_y = corners.iter().map(|c| c.y).fold(f32::NEG_INFINITY, f32::max).floor() as i32;

    let max_x = max_x.min(min_x + MAX_FILL_SPAN);
    let max_y = max_y.min(min_y + MAX_FILL_SPAN);

    match grid.fill_region(&catalog, min_x, min_y, max_x, max_y, z, brush.0) {
        Ok(written) => info!("Filled {} cells at z {}", written, z),
        Err(e) => warn!("Fill rejected: {}", e),
    }
}

/// Terrain commands: T generates an island, R resets the terrain,
/// H exports the current height field
fn terrain_commands(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut grid: ResMut<WorldGrid>,
    catalog: Res<TileCatalog>,
    mut generator: ResMut<TerrainGenerator>,
) {
    if keyboard.just_pressed(KeyCode::KeyT) {
        let size = if keyboard.pressed(KeyCode::ShiftLeft) {
            MapSize::Large
        } else {
            MapSize::Medium
        };
        match generator.generate(&mut grid, &catalog, size, None) {
            Ok(report) => info!(
                "Terrain ready: {} tiles over {}x{} (seed {})",
                report.tiles_written, report.dimension, report.dimension, report.seed
            ),
            Err(e) => error!("Terrain generation failed: {}", e),
        }
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        grid.clear();
        info!("Terrain reset");
    }

    if keyboard.just_pressed(KeyCode::KeyH) {
        match generator.export_height_field(&grid) {
            Some(field) => info!(
                "Height field exported: {}x{}",
                field.len(),
                field.first().map_or(0, |row| row.len())
            ),
            None => warn!("Nothing to export: world is empty"),
        }
    }
}

/// Overlay toggles and optimization modes: G grid, L labels, C camera
/// reset, F1 performance, F2 quality, F3 auto-optimize
fn overlay_and_mode_commands(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut options: ResMut<RenderOptions>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut camera: ResMut<IsoCamera>,
) {
    if keyboard.just_pressed(KeyCode::KeyG) {
        options.show_grid = !options.show_grid;
        info!("Grid overlay: {}", options.show_grid);
    }
    if keyboard.just_pressed(KeyCode::KeyL) {
        options.show_labels = !options.show_labels;
        info!("Tile labels: {}", options.show_labels);
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        camera.reset();
        info!("Camera reset");
    }
    if keyboard.just_pressed(KeyCode::F1) {
        monitor.optimize_for_performance(&mut options);
    }
    if keyboard.just_pressed(KeyCode::F2) {
        monitor.optimize_for_quality();
    }
    if keyboard.just_pressed(KeyCode::F3) {
        let enable = !monitor.auto_enabled();
        monitor.set_auto(enable);
    }
}

/// F5 saves the world (and camera); F9 loads it back
fn save_load_commands(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut grid: ResMut<WorldGrid>,
    mut camera: ResMut<IsoCamera>,
    catalog: Res<TileCatalog>,
) {
    if keyboard.just_pressed(KeyCode::F5) {
        match serialization::save_world(SAVE_PATH, &grid, Some(&camera)) {
            Ok(()) => info!("Saved {} tiles to {}", grid.len(), SAVE_PATH),
            Err(e) => error!("Save failed: {}", e),
        }
    }

    if keyboard.just_pressed(KeyCode::F9) {
        match serialization::load_world(SAVE_PATH) {
            Ok(snapshot) => {
                grid.clear();
                let restored = serialization::hydrate(&snapshot, &mut grid, &catalog);
                if let Some(saved_camera) = snapshot.camera {
                    *camera = saved_camera;
                }
                info!("Loaded {} tiles from {}", restored, SAVE_PATH);
            }
            Err(e) => error!("Load failed: {}", e),
        }
    }
}

/// The per-frame pipeline: time the planner and renderer, publish the
/// draw list, feed the monitor, let auto-optimize adjust flags
fn run_frame_pipeline(
    time: Res<Time>,
    window_query: Query<&Window>,
    grid: Res<WorldGrid>,
    catalog: Res<TileCatalog>,
    camera: Res<IsoCamera>,
    planner: Res<FramePlanner>,
    renderer: Res<Renderer>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut options: ResMut<RenderOptions>,
    mut current: ResMut<CurrentFrame>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let viewport = Viewport::new(window.width(), window.height());

    let render_start = Instant::now();
    let flags = monitor.flags();
    let plan = planner.plan(&grid, &catalog, &camera, viewport, &flags, monitor.fps());

    match renderer.compose(&plan, &catalog, &camera, viewport, *options) {
        Ok(list) => {
            current.set_if_neq(CurrentFrame(Some(list)));
        }
        Err(RenderError::AssetNotReady) => {
            // Valid state during startup: skip drawing this frame
            current.set_if_neq(CurrentFrame(None));
        }
    }
    let render_time_ms = render_start.elapsed().as_secs_f32() * 1000.0;
    let frame_time_ms = time.delta_secs() * 1000.0;

    monitor.record_frame(
        frame_time_ms,
        render_time_ms,
        plan.total,
        plan.visible,
        plan.draw_calls,
        grid.memory_usage_bytes(),
    );
    monitor.auto_optimize(&mut options);
}

/// Rebuild sprite and label entities whenever the draw list changes.
/// Screen pixels (origin top-left, y down) map onto the fixed 2D camera
/// (origin center, y up).
fn sync_frame_sprites(
    mut commands: Commands,
    current: Res<CurrentFrame>,
    atlas: Res<AtlasHandle>,
    window_query: Query<&Window>,
    existing: Query<Entity, With<FrameVisual>>,
) {
    if !current.is_changed() {
        return;
    }
    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
    let Some(list) = &current.0 else {
        return;
    };
    let Ok(window) = window_query.single() else {
        return;
    };
    let (half_w, half_h) = (window.width() / 2.0, window.height() / 2.0);

    let mut depth = 0.0;
    for batch in &list.batches {
        for sprite in &batch.sprites {
            let rect = Rect::new(
                sprite.src.x as f32,
                sprite.src.y as f32,
                (sprite.src.x + sprite.src.width) as f32,
                (sprite.src.y + sprite.src.height) as f32,
            );
            commands.spawn((
                FrameVisual,
                Sprite {
                    image: atlas.0.clone(),
                    rect: Some(rect),
                    custom_size: Some(Vec2::new(
                        sprite.src.width as f32 * sprite.scale,
                        sprite.src.height as f32 * sprite.scale,
                    )),
                    ..default()
                },
                Transform::from_xyz(
                    sprite.screen.x - half_w,
                    half_h - sprite.screen.y,
                    depth,
                ),
            ));
            depth += 0.001;
        }
    }

    for label in &list.labels {
        commands.spawn((
            FrameVisual,
            Text2d::new(label.text.clone()),
            TextFont {
                font_size: 10.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_xyz(label.screen.x - half_w, half_h - label.screen.y, 900.0),
        ));
    }
}

/// Grid overlay lines, drawn as gizmos every frame
fn draw_grid_overlay(
    current: Res<CurrentFrame>,
    window_query: Query<&Window>,
    mut gizmos: Gizmos,
) {
    let Some(list) = &current.0 else {
        return;
    };
    let Ok(window) = window_query.single() else {
        return;
    };
    let (half_w, half_h) = (window.width() / 2.0, window.height() / 2.0);

    for line in &list.grid_lines {
        gizmos.line_2d(
            Vec2::new(line.from.x - half_w, half_h - line.from.y),
            Vec2::new(line.to.x - half_w, half_h - line.to.y),
            Color::srgba(1.0, 1.0, 1.0, 0.25),
        );
    }
}
