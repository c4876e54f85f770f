use super::{HudPanel, HudReportText};
use bevy::prelude::*;

/// Sets up the performance-report panel (hidden by default)
pub fn setup_hud(mut commands: Commands) {
    commands
        .spawn((
            HudPanel,
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(10.0),
                top: Val::Px(10.0),
                padding: UiRect::all(Val::Px(12.0)),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.75)),
            Visibility::Hidden, // Hidden by default
            ZIndex(1000),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Performance (Press 'P' to close)"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    margin: UiRect::bottom(Val::Px(8.0)),
                    ..default()
                },
            ));

            // Report body, refreshed while the panel is visible
            parent.spawn((
                HudReportText,
                Text::new(""),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.9, 0.8)),
            ));
        });
}
