//! Brick Rush - a classic brick-breaker arcade game
//!
//! Core modules:
//! - `renderer`: batched 2D quad renderer on top of WebGPU
//! - `game`: collision resolution, game state machine, particles, levels
//! - `audio`: fire-and-forget sound dispatch
//! - `settings`: data-driven user preferences

pub mod app;
pub mod assets;
pub mod audio;
pub mod game;
pub mod renderer;
pub mod settings;

pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Upper clamp on per-frame delta time ("frame hitch and catch up" policy)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Play field bounds (both axes)
    pub const FIELD_MIN: f32 = -1.0;
    pub const FIELD_MAX: f32 = 1.0;
    /// Bottom of the brick grid sits at FIELD_OFFSET_Y - 1
    pub const FIELD_OFFSET_Y: f32 = 1.3;

    /// Platform defaults
    pub const PLATFORM_Y: f32 = -0.96;
    pub const PLATFORM_HALF_HEIGHT: f32 = 0.03;
    pub const PLATFORM_HALF_WIDTH: f32 = 0.2;
    pub const PLATFORM_SPEED: f32 = 1.1;
    /// Platform movement clamps against the walls with a small margin
    pub const PLATFORM_CLAMP: f32 = 0.98;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.035;
    pub const BALL_START_SPEED: f32 = 0.9;
    /// Bounce steepness at the platform edges
    pub const PLATFORM_STEEPNESS: f32 = 1.5;

    /// Power-up multipliers
    pub const PLATFORM_GROW: f32 = 2.0;
    pub const PLATFORM_SHRINK: f32 = 0.5;
    pub const BALL_SPEED_UP: f32 = 1.5;
    pub const BALL_SLOW_DOWN: f32 = 0.667;

    /// Starting lives
    pub const START_LIVES: u32 = 3;

    /// Timed transition length in seconds
    pub const TRANSITION_SECS: f64 = 1.5;

    /// Batch renderer capacities
    pub const BATCH_SIZE: usize = 1000;
    pub const MAX_TEXTURE_SLOTS: usize = 8;
    /// Triangle-strip primitive restart sentinel
    pub const PRIMITIVE_RESTART: u32 = u32::MAX;
}

/// Normalize with a safe fallback for degenerate vectors
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let n = v.normalize_or_zero();
    if n.length_squared() < 0.5 { fallback } else { n }
}
