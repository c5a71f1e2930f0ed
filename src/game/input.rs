//! Per-frame input snapshot
//!
//! The windowing layer collects events into a snapshot that the session
//! reads synchronously during its update; game logic never sees raw events.

use glam::Vec2;

/// Input state for one frame. Held keys persist across frames; edge-triggered
/// fields are cleared by `end_frame()` after the update consumed them.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    pub left_held: bool,
    pub right_held: bool,
    /// Launch/confirm pressed this frame (space)
    pub launch: bool,
    /// Pause toggle pressed this frame
    pub pause: bool,
    /// Ingame-menu toggle pressed this frame (escape)
    pub menu: bool,
    /// Mouse position in normalized device coordinates, y up
    pub mouse_ndc: Vec2,
    /// Left mouse button pressed this frame
    pub clicked: bool,
}

impl InputSnapshot {
    /// Signed horizontal movement axis from the held keys
    pub fn move_axis(&self) -> f32 {
        (self.right_held as i32 - self.left_held as i32) as f32
    }

    /// Clear edge-triggered fields once the frame consumed them
    pub fn end_frame(&mut self) {
        self.launch = false;
        self.pause = false;
        self.menu = false;
        self.clicked = false;
    }
}
