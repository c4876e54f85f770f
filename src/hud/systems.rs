use super::{HudPanel, HudReportText, HudState};
use crate::render::PerformanceMonitor;
use bevy::prelude::*;

/// Toggles the report overlay when 'P' is pressed
pub fn toggle_hud_visibility(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut hud_state: ResMut<HudState>,
    mut panel_query: Single<&mut Visibility, With<HudPanel>>,
) {
    if keyboard.just_pressed(KeyCode::KeyP) {
        hud_state.visible = !hud_state.visible;

        **panel_query = if hud_state.visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }
}

/// Refreshes the report text from the latest performance snapshot
pub fn update_hud_report(
    hud_state: Res<HudState>,
    monitor: Res<PerformanceMonitor>,
    mut text_query: Single<&mut Text, With<HudReportText>>,
) {
    if !hud_state.visible {
        return;
    }
    text_query.0 = monitor.report();
}
