mod systems;
mod ui;

pub use systems::*;
pub use ui::*;

use bevy::prelude::*;

/// Plugin for the performance-report overlay
pub struct PerfHudPlugin;

impl Plugin for PerfHudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudState>()
            .add_systems(Startup, setup_hud)
            .add_systems(Update, (toggle_hud_visibility, update_hud_report));
    }
}

/// Current state of the report overlay
#[derive(Resource, Default)]
pub struct HudState {
    pub visible: bool,
}

/// Marker component for the overlay root
#[derive(Component)]
pub struct HudPanel;

/// Marker component for the report text node
#[derive(Component)]
pub struct HudReportText;
