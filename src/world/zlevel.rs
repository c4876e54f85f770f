use bevy::prelude::*;

/// Tracks which elevation layer is active for editing and picking.
/// New placements default to this level unless an explicit z is given.
/// No bound is enforced beyond what grid coordinates can represent.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZLevelManager {
    active: i32,
}

impl ZLevelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_level(&self) -> i32 {
        self.active
    }

    pub fn switch_to(&mut self, level: i32) {
        self.active = level;
    }

    pub fn up(&mut self) -> i32 {
        self.active = self.active.saturating_add(1);
        self.active
    }

    pub fn down(&mut self) -> i32 {
        self.active = self.active.saturating_sub(1);
        self.active
    }
}
