//! Core game entities and the state machine's data types

use glam::Vec2;

use crate::consts::{
    BALL_RADIUS, BALL_START_SPEED, PLATFORM_HALF_HEIGHT, PLATFORM_HALF_WIDTH, PLATFORM_SPEED,
    PLATFORM_Y, TRANSITION_SECS,
};
use crate::renderer::PostFilter;

/// The ball. While `resting_offset` is set the ball tracks the platform
/// horizontally instead of free-flying.
#[derive(Debug, Clone, Copy)]
pub struct Ball {
    pub position: Vec2,
    /// Normalized flight direction; meaningless while resting
    pub direction: Vec2,
    pub speed: f32,
    pub radius: f32,
    /// Horizontal offset from the platform center while resting
    pub resting_offset: Option<f32>,
}

impl Ball {
    /// A fresh ball resting on the platform center
    pub fn resting() -> Self {
        Self {
            position: Vec2::new(0.0, PLATFORM_Y + PLATFORM_HALF_HEIGHT + BALL_RADIUS),
            direction: Vec2::Y,
            speed: BALL_START_SPEED,
            radius: BALL_RADIUS,
            resting_offset: Some(0.0),
        }
    }

    pub fn is_resting(&self) -> bool {
        self.resting_offset.is_some()
    }
}

impl Default for Ball {
    fn default() -> Self {
        Self::resting()
    }
}

/// The player's paddle; y position is fixed
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    pub x: f32,
    pub half_width: f32,
    pub speed: f32,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            x: 0.0,
            half_width: PLATFORM_HALF_WIDTH,
            speed: PLATFORM_SPEED,
        }
    }
}

/// Brick behavior, dispatched on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickKind {
    /// Plain destructible brick
    Brick,
    /// Indestructible unless the wall-breaker power-up is active
    Wall,
    PlatformGrow,
    PlatformShrink,
    PlatformSticking,
    WallBreaker,
    BallSpeedUp,
    BallSlowDown,
    EffectBlur,
    EffectDrunk,
    EffectChaos,
    EffectConfuse,
}

impl BrickKind {
    /// Score awarded when the brick is destroyed
    pub fn score(self) -> u32 {
        match self {
            BrickKind::Brick => 10,
            BrickKind::Wall => 50,
            _ => 25,
        }
    }

    /// Whether this brick counts toward the level-clear condition
    pub fn is_destructible(self) -> bool {
        self != BrickKind::Wall
    }
}

/// One brick on the field
#[derive(Debug, Clone, Copy)]
pub struct Brick {
    pub kind: BrickKind,
    /// Column in the brick atlas, taken from the level file's color digit
    pub color_index: u32,
    pub grid: glam::UVec2,
    pub position: Vec2,
    pub half_size: Vec2,
}

/// Temporary power-up modifiers; reset when a ball is lost
#[derive(Debug, Clone, Copy, Default)]
pub struct Effects {
    pub wall_breaker: bool,
    pub sticky_platform: bool,
    /// Active screen filter; mutually exclusive, last hit wins
    pub filter: PostFilter,
}

/// What to do when a transition's deadline elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    /// Just switch to the stored next phase
    None,
    /// Reset ball/platform/effects for the current level
    ReloadAfterBallLost,
    LoadNextLevel,
    ResetToFirstLevel,
}

/// A timed, non-interactive phase sequencing fades and deferred loads
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: Phase,
    pub started_at: f64,
    pub ends_at: f64,
    pub fade_in: bool,
    /// Keep integrating the ball during the transition (level-clear fanfare)
    pub keep_ball: bool,
    pub message: Option<String>,
    pub action: TransitionAction,
}

impl Transition {
    pub fn new(now: f64, next: Phase, action: TransitionAction) -> Self {
        Self {
            next,
            started_at: now,
            ends_at: now + TRANSITION_SECS,
            fade_in: false,
            keep_ball: false,
            message: None,
            action,
        }
    }

    pub fn with_fade_in(mut self) -> Self {
        self.fade_in = true;
        self
    }

    pub fn with_keep_ball(mut self) -> Self {
        self.keep_ball = true;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn elapsed(&self, now: f64) -> bool {
        now >= self.ends_at
    }

    /// Fade progress in [0, 1]
    pub fn progress(&self, now: f64) -> f32 {
        let span = self.ends_at - self.started_at;
        (((now - self.started_at) / span).clamp(0.0, 1.0)) as f32
    }
}

/// Top-level target phase, without transition payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    MainMenu,
    Playing,
    EndScreen {
        won: bool,
    },
}

/// The full state machine state
#[derive(Debug, Clone)]
pub enum GameState {
    MainMenu,
    Playing,
    Paused,
    IngameMenu,
    Transition(Transition),
    EndScreen { won: bool },
}

impl GameState {
    pub fn from_phase(phase: Phase) -> Self {
        match phase {
            Phase::MainMenu => GameState::MainMenu,
            Phase::Playing => GameState::Playing,
            Phase::EndScreen { won } => GameState::EndScreen { won },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resting_ball_sits_on_platform() {
        let ball = Ball::resting();
        assert!(ball.is_resting());
        assert!((ball.position.y - (PLATFORM_Y + PLATFORM_HALF_HEIGHT + BALL_RADIUS)).abs() < 1e-6);
    }

    #[test]
    fn test_wall_is_not_destructible() {
        assert!(!BrickKind::Wall.is_destructible());
        assert!(BrickKind::Brick.is_destructible());
        assert!(BrickKind::EffectChaos.is_destructible());
    }

    #[test]
    fn test_transition_deadline() {
        let t = Transition::new(10.0, Phase::Playing, TransitionAction::None);
        assert!(!t.elapsed(10.0));
        assert!(!t.elapsed(10.0 + TRANSITION_SECS - 0.01));
        assert!(t.elapsed(10.0 + TRANSITION_SECS));
        assert!((t.progress(10.0 + TRANSITION_SECS / 2.0) - 0.5).abs() < 1e-6);
    }
}
