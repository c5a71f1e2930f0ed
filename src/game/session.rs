//! The game session: per-frame simulation step and state machine
//!
//! One `GameSession` owns the ball, platform, brick field, power-up effects
//! and progression state for a whole run of the program. The windowing layer
//! feeds it an input snapshot and a delta time each frame; rendering is a
//! pure read of the session afterwards.

use glam::Vec2;

use crate::audio::Sound;
use crate::consts::{MAX_FRAME_DT, PLATFORM_CLAMP, PLATFORM_GROW, PLATFORM_SHRINK, START_LIVES};
use crate::consts::{BALL_SLOW_DOWN, BALL_SPEED_UP, PLATFORM_STEEPNESS};
use crate::normalize_or;
use crate::renderer::PostFilter;

use super::collision::{ball_brick_collision, ball_platform_collision, walls_collision, WallHit};
use super::input::InputSnapshot;
use super::level::Level;
use super::particles::{ParticleSystem, ParticleUpdater};
use super::state::{
    Ball, Brick, BrickKind, Effects, GameState, Phase, Platform, Transition, TransitionAction,
};

/// Button actions produced by the UI layer, applied between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Play,
    Resume,
    Restart,
    ToMainMenu,
    PlayAgain,
    Quit,
}

pub struct GameSession {
    pub state: GameState,
    pub ball: Ball,
    pub platform: Platform,
    pub effects: Effects,
    pub bricks: Vec<Brick>,
    pub lives: u32,
    pub score: u32,
    pub level_index: usize,
    pub particles: ParticleSystem,
    pub particles_enabled: bool,
    levels: Vec<Level>,
    /// Session clock in seconds; transition deadlines compare against this
    clock: f64,
    /// Sounds triggered this frame, drained by the audio layer
    sounds: Vec<Sound>,
    quit_requested: bool,
}

impl GameSession {
    pub fn new(levels: Vec<Level>) -> Self {
        let mut session = Self {
            state: GameState::MainMenu,
            ball: Ball::resting(),
            platform: Platform::default(),
            effects: Effects::default(),
            bricks: Vec::new(),
            lives: START_LIVES,
            score: 0,
            level_index: 0,
            particles: ParticleSystem::new(ParticleUpdater::BallTrail, 0x5EED),
            particles_enabled: true,
            levels,
            clock: 0.0,
            sounds: Vec::new(),
            quit_requested: false,
        };
        session.load_level(0);
        session
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Sounds triggered since the last drain
    pub fn drain_sounds(&mut self) -> Vec<Sound> {
        std::mem::take(&mut self.sounds)
    }

    /// Screen filter for the post pass; only active while actually playing
    pub fn active_filter(&self) -> PostFilter {
        match self.state {
            GameState::Playing | GameState::Paused | GameState::Transition(_) => {
                self.effects.filter
            }
            _ => PostFilter::None,
        }
    }

    pub fn destructible_count(&self) -> usize {
        self.bricks.iter().filter(|b| b.kind.is_destructible()).count()
    }

    /// One simulation step. `dt` is clamped so a frame hitch cannot compress
    /// a large timestep into one physics update.
    pub fn update(&mut self, input: &InputSnapshot, dt: f32) {
        let dt = dt.min(MAX_FRAME_DT);
        self.clock += dt as f64;

        match self.state.clone() {
            GameState::Playing => self.step_playing(input, dt),
            GameState::Paused => {
                if input.pause {
                    self.state = GameState::Playing;
                } else if input.menu {
                    self.state = GameState::IngameMenu;
                }
            }
            GameState::IngameMenu => {
                if input.menu {
                    self.state = GameState::Playing;
                }
            }
            GameState::Transition(transition) => self.step_transition(transition, dt),
            GameState::MainMenu | GameState::EndScreen { .. } => {}
        }

        if self.particles_enabled {
            let emitter = match (&self.state, self.ball.is_resting()) {
                (GameState::Playing, false) => Some(self.ball.position),
                (GameState::Transition(t), false) if t.keep_ball => Some(self.ball.position),
                _ => None,
            };
            self.particles.advance(dt, emitter);
        }
    }

    /// Apply a UI button press
    pub fn handle_ui(&mut self, action: UiAction) {
        self.sounds.push(Sound::Click);
        match action {
            UiAction::Play | UiAction::PlayAgain => {
                self.begin_transition(
                    Transition::new(self.clock, Phase::Playing, TransitionAction::ResetToFirstLevel)
                        .with_fade_in(),
                );
            }
            UiAction::Resume => self.state = GameState::Playing,
            UiAction::Restart => {
                self.begin_transition(Transition::new(
                    self.clock,
                    Phase::Playing,
                    TransitionAction::ResetToFirstLevel,
                ));
            }
            UiAction::ToMainMenu => self.state = GameState::MainMenu,
            UiAction::Quit => self.quit_requested = true,
        }
    }

    fn begin_transition(&mut self, transition: Transition) {
        self.state = GameState::Transition(transition);
    }

    fn step_playing(&mut self, input: &InputSnapshot, dt: f32) {
        if input.pause {
            self.state = GameState::Paused;
            return;
        }
        if input.menu {
            self.state = GameState::IngameMenu;
            return;
        }

        self.move_platform(input.move_axis(), dt);

        if let Some(offset) = self.ball.resting_offset {
            // Track the platform, preserving the offset from its center
            self.ball.position.x = self.platform.x + offset;
            if input.launch {
                self.launch_ball(offset);
            }
            return;
        }

        self.ball.position += self.ball.direction * self.ball.speed * dt;
        self.resolve_collisions();

        if self.destructible_count() == 0 {
            self.sounds.push(Sound::LevelClear);
            self.begin_transition(
                Transition::new(self.clock, Phase::Playing, TransitionAction::LoadNextLevel)
                    .with_keep_ball()
                    .with_message("LEVEL CLEAR"),
            );
        }
    }

    fn move_platform(&mut self, axis: f32, dt: f32) {
        self.platform.x += axis * self.platform.speed * dt;
        let limit = PLATFORM_CLAMP - self.platform.half_width;
        self.platform.x = self.platform.x.clamp(-limit, limit);
    }

    /// Release a resting ball. The launch angle follows the platform bounce
    /// formula, so a ball stuck near an edge leaves at a steep angle.
    fn launch_ball(&mut self, offset: f32) {
        let angle_factor = offset / self.platform.half_width * PLATFORM_STEEPNESS;
        self.ball.direction = normalize_or(Vec2::new(angle_factor, 1.0), Vec2::Y);
        self.ball.resting_offset = None;
        self.sounds.push(Sound::Bounce);
    }

    /// Full collision resolution, once per frame: bricks first, then the
    /// platform, then the walls.
    fn resolve_collisions(&mut self) {
        // First overlapping brick in list order wins; single contact per frame
        let hit = self.bricks.iter().enumerate().find_map(|(idx, brick)| {
            ball_brick_collision(
                self.ball.position,
                self.ball.radius,
                self.ball.direction,
                brick.position,
                brick.half_size,
            )
            .map(|hit| (idx, hit))
        });
        if let Some((idx, hit)) = hit {
            self.ball.position = hit.position;
            self.ball.direction = hit.direction;
            let kind = self.bricks[idx].kind;
            if self.apply_brick_effect(kind) {
                self.score += kind.score();
                self.bricks.remove(idx);
                self.sounds.push(Sound::BrickBreak);
            } else {
                self.sounds.push(Sound::Bounce);
            }
        }

        if let Some(hit) = ball_platform_collision(
            self.ball.position,
            self.ball.radius,
            self.ball.direction,
            self.platform.x,
            self.platform.half_width,
        ) {
            self.ball.position = hit.position;
            self.ball.direction = hit.direction;
            if self.effects.sticky_platform {
                // Reattach instead of bouncing
                self.ball.resting_offset = Some(self.ball.position.x - self.platform.x);
            }
            self.sounds.push(Sound::Bounce);
        }

        match walls_collision(self.ball.position, self.ball.radius, self.ball.direction) {
            Some(WallHit::Side(hit)) | Some(WallHit::Top(hit)) => {
                self.ball.position = hit.position;
                self.ball.direction = hit.direction;
                self.sounds.push(Sound::Bounce);
            }
            Some(WallHit::Bottom) => self.lose_life(),
            None => {}
        }
    }

    /// Brick-type side effect dispatch; returns whether the brick breaks
    fn apply_brick_effect(&mut self, kind: BrickKind) -> bool {
        match kind {
            BrickKind::Brick => true,
            BrickKind::Wall => self.effects.wall_breaker,
            BrickKind::PlatformGrow => {
                self.platform.half_width *= PLATFORM_GROW;
                self.power_up()
            }
            BrickKind::PlatformShrink => {
                self.platform.half_width *= PLATFORM_SHRINK;
                self.power_up()
            }
            BrickKind::PlatformSticking => {
                self.effects.sticky_platform = true;
                self.power_up()
            }
            BrickKind::WallBreaker => {
                self.effects.wall_breaker = true;
                self.power_up()
            }
            BrickKind::BallSpeedUp => {
                self.ball.speed *= BALL_SPEED_UP;
                self.power_up()
            }
            BrickKind::BallSlowDown => {
                self.ball.speed *= BALL_SLOW_DOWN;
                self.power_up()
            }
            BrickKind::EffectBlur => self.set_filter(PostFilter::Blur),
            BrickKind::EffectDrunk => self.set_filter(PostFilter::Drunk),
            BrickKind::EffectChaos => self.set_filter(PostFilter::Chaos),
            BrickKind::EffectConfuse => self.set_filter(PostFilter::Confuse),
        }
    }

    fn power_up(&mut self) -> bool {
        self.sounds.push(Sound::PowerUp);
        true
    }

    fn set_filter(&mut self, filter: PostFilter) -> bool {
        self.effects.filter = filter;
        self.power_up()
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives > 0 {
            self.sounds.push(Sound::BallLost);
            self.begin_transition(
                Transition::new(
                    self.clock,
                    Phase::Playing,
                    TransitionAction::ReloadAfterBallLost,
                )
                .with_message("BALL LOST"),
            );
        } else {
            self.sounds.push(Sound::GameOver);
            self.begin_transition(
                Transition::new(
                    self.clock,
                    Phase::EndScreen { won: false },
                    TransitionAction::None,
                )
                .with_message("GAME OVER"),
            );
        }
    }

    fn step_transition(&mut self, transition: Transition, dt: f32) {
        if transition.keep_ball && !self.ball.is_resting() {
            // Level-clear fanfare: the ball stays live, and the bottom wall
            // bounces instead of costing a life
            self.ball.position += self.ball.direction * self.ball.speed * dt;
            match walls_collision(self.ball.position, self.ball.radius, self.ball.direction) {
                Some(WallHit::Side(hit)) | Some(WallHit::Top(hit)) => {
                    self.ball.position = hit.position;
                    self.ball.direction = hit.direction;
                }
                Some(WallHit::Bottom) => {
                    self.ball.direction.y = self.ball.direction.y.abs();
                }
                None => {}
            }
        }

        if !transition.elapsed(self.clock) {
            self.state = GameState::Transition(transition);
            return;
        }

        match transition.action {
            TransitionAction::None => {
                self.state = GameState::from_phase(transition.next);
            }
            TransitionAction::ReloadAfterBallLost => {
                self.mid_game_reset();
                self.state = GameState::from_phase(transition.next);
            }
            TransitionAction::LoadNextLevel => {
                if self.level_index + 1 >= self.levels.len() {
                    self.state = GameState::EndScreen { won: true };
                } else {
                    self.load_level(self.level_index + 1);
                    self.state = GameState::from_phase(transition.next);
                }
            }
            TransitionAction::ResetToFirstLevel => {
                self.lives = START_LIVES;
                self.score = 0;
                self.load_level(0);
                self.state = GameState::from_phase(transition.next);
            }
        }
    }

    /// New-ball reset: ball back on the platform, power-ups cleared,
    /// bricks untouched
    fn mid_game_reset(&mut self) {
        self.ball = Ball::resting();
        self.platform = Platform::default();
        self.effects = Effects::default();
        self.particles.clear();
    }

    fn load_level(&mut self, index: usize) {
        self.level_index = index;
        self.bricks = self
            .levels
            .get(index)
            .map(|level| level.bricks.clone())
            .unwrap_or_default();
        if self.bricks.is_empty() {
            log::warn!("Session - level {index} is empty");
        }
        self.mid_game_reset();
        log::info!(
            "Session - loaded level {} with {} bricks",
            index + 1,
            self.bricks.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BALL_RADIUS, TRANSITION_SECS};
    use glam::UVec2;

    fn level_with(bricks: Vec<Brick>) -> Level {
        Level {
            bricks,
            width: 1,
            height: 1,
        }
    }

    fn brick(kind: BrickKind, position: Vec2) -> Brick {
        Brick {
            kind,
            color_index: 1,
            grid: UVec2::ZERO,
            position,
            half_size: Vec2::new(0.1, 0.05),
        }
    }

    fn playing_session(bricks: Vec<Brick>) -> GameSession {
        let mut session = GameSession::new(vec![level_with(bricks)]);
        session.state = GameState::Playing;
        session
    }

    /// Run updates with no input until the pending transition resolves
    fn settle(session: &mut GameSession) {
        let input = InputSnapshot::default();
        let steps = (TRANSITION_SECS / 0.05) as usize + 2;
        for _ in 0..steps {
            session.update(&input, 0.05);
        }
    }

    #[test]
    fn test_ball_reaches_brick_and_reflects() {
        // Ball 0.05 below the brick's bottom edge, flying straight up at 1.5
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.5))]);
        session.ball = Ball {
            position: Vec2::new(0.0, 0.45 - 0.05),
            direction: Vec2::Y,
            speed: 1.5,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.1);
        assert!(session.bricks.is_empty());
        assert!(session.ball.direction.y < 0.0);
        assert_eq!(session.score, BrickKind::Brick.score());
    }

    #[test]
    fn test_wall_brick_survives_without_breaker() {
        let mut session = playing_session(vec![
            brick(BrickKind::Wall, Vec2::new(0.0, 0.5)),
            brick(BrickKind::Brick, Vec2::new(0.5, 0.5)),
        ]);
        session.ball = Ball {
            position: Vec2::new(0.0, 0.4),
            direction: Vec2::Y,
            speed: 1.0,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.05);
        assert_eq!(session.bricks.len(), 2);
        assert!(session.ball.direction.y < 0.0);

        // Same approach with the wall-breaker active destroys it
        let mut session = playing_session(vec![
            brick(BrickKind::Wall, Vec2::new(0.0, 0.5)),
            brick(BrickKind::Brick, Vec2::new(0.5, 0.5)),
        ]);
        session.effects.wall_breaker = true;
        session.ball = Ball {
            position: Vec2::new(0.0, 0.4),
            direction: Vec2::Y,
            speed: 1.0,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.05);
        assert_eq!(session.bricks.len(), 1);
    }

    #[test]
    fn test_power_up_bricks_mutate_modifiers() {
        let mut session = playing_session(vec![brick(BrickKind::PlatformGrow, Vec2::ZERO)]);
        let before = session.platform.half_width;
        assert!(session.apply_brick_effect(BrickKind::PlatformGrow));
        assert!((session.platform.half_width - before * PLATFORM_GROW).abs() < 1e-6);

        let speed = session.ball.speed;
        assert!(session.apply_brick_effect(BrickKind::BallSlowDown));
        assert!((session.ball.speed - speed * BALL_SLOW_DOWN).abs() < 1e-6);

        assert!(session.apply_brick_effect(BrickKind::EffectDrunk));
        assert_eq!(session.effects.filter, PostFilter::Drunk);
        // Filters are mutually exclusive, last one wins
        assert!(session.apply_brick_effect(BrickKind::EffectConfuse));
        assert_eq!(session.effects.filter, PostFilter::Confuse);
    }

    #[test]
    fn test_sticky_platform_reattaches_ball() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.9, 0.9))]);
        session.effects.sticky_platform = true;
        session.ball = Ball {
            position: Vec2::new(0.1, crate::consts::PLATFORM_Y + 0.02),
            direction: Vec2::NEG_Y,
            speed: 0.5,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.01);
        assert!(session.ball.is_resting());
        // Offset from the platform center is preserved
        assert!(session.ball.resting_offset.unwrap() > 0.0);
    }

    #[test]
    fn test_last_life_lost_ends_in_game_over() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.5))]);
        session.lives = 1;
        session.ball = Ball {
            position: Vec2::new(0.0, -0.98),
            direction: Vec2::NEG_Y,
            speed: 0.5,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.01);
        assert_eq!(session.lives, 0);
        assert!(matches!(session.state, GameState::Transition(_)));

        settle(&mut session);
        assert!(matches!(session.state, GameState::EndScreen { won: false }));
    }

    #[test]
    fn test_ball_lost_with_lives_left_reloads() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.5))]);
        session.effects.wall_breaker = true;
        session.ball = Ball {
            position: Vec2::new(0.0, -0.98),
            direction: Vec2::NEG_Y,
            speed: 0.5,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.01);
        assert_eq!(session.lives, START_LIVES - 1);

        settle(&mut session);
        assert!(matches!(session.state, GameState::Playing));
        assert!(session.ball.is_resting());
        // Power-ups do not survive a lost ball
        assert!(!session.effects.wall_breaker);
        assert_eq!(session.bricks.len(), 1);
    }

    #[test]
    fn test_level_clear_advances_to_next_level() {
        let levels = vec![
            level_with(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.5))]),
            level_with(vec![
                brick(BrickKind::Brick, Vec2::new(-0.5, 0.5)),
                brick(BrickKind::Brick, Vec2::new(0.5, 0.5)),
            ]),
        ];
        let mut session = GameSession::new(levels);
        session.state = GameState::Playing;
        session.ball = Ball {
            position: Vec2::new(0.0, 0.4),
            direction: Vec2::Y,
            speed: 1.0,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.05);
        assert_eq!(session.destructible_count(), 0);
        match &session.state {
            GameState::Transition(t) => {
                assert!(t.keep_ball);
                assert_eq!(t.action, TransitionAction::LoadNextLevel);
            }
            other => panic!("expected level-clear transition, got {other:?}"),
        }

        settle(&mut session);
        assert!(matches!(session.state, GameState::Playing));
        assert_eq!(session.level_index, 1);
        assert_eq!(session.bricks.len(), 2);
        assert!(session.ball.is_resting());
    }

    #[test]
    fn test_clearing_last_level_wins_the_game() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.5))]);
        session.ball = Ball {
            position: Vec2::new(0.0, 0.4),
            direction: Vec2::Y,
            speed: 1.0,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        session.update(&InputSnapshot::default(), 0.05);
        settle(&mut session);
        assert!(matches!(session.state, GameState::EndScreen { won: true }));
    }

    #[test]
    fn test_pause_toggles() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.5))]);
        let pause = InputSnapshot {
            pause: true,
            ..Default::default()
        };
        session.update(&pause, 0.01);
        assert!(matches!(session.state, GameState::Paused));
        session.update(&pause, 0.01);
        assert!(matches!(session.state, GameState::Playing));
    }

    #[test]
    fn test_launch_from_offset_is_angled() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.9))]);
        session.ball.resting_offset = Some(session.platform.half_width);
        let launch = InputSnapshot {
            launch: true,
            ..Default::default()
        };
        session.update(&launch, 0.01);
        assert!(!session.ball.is_resting());
        let expected = Vec2::new(PLATFORM_STEEPNESS, 1.0).normalize();
        assert!((session.ball.direction - expected).length() < 1e-5);
    }

    #[test]
    fn test_play_again_resets_progression() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.0, 0.5))]);
        session.score = 500;
        session.lives = 1;
        session.state = GameState::EndScreen { won: false };
        session.handle_ui(UiAction::PlayAgain);
        settle(&mut session);
        assert!(matches!(session.state, GameState::Playing));
        assert_eq!(session.score, 0);
        assert_eq!(session.lives, START_LIVES);
        assert_eq!(session.level_index, 0);
    }

    #[test]
    fn test_dt_clamp_limits_travel() {
        let mut session = playing_session(vec![brick(BrickKind::Brick, Vec2::new(0.9, 0.9))]);
        session.ball = Ball {
            position: Vec2::ZERO,
            direction: Vec2::Y,
            speed: 1.0,
            radius: BALL_RADIUS,
            resting_offset: None,
        };
        // A 5-second hitch advances physics by at most MAX_FRAME_DT
        session.update(&InputSnapshot::default(), 5.0);
        assert!((session.ball.position.y - MAX_FRAME_DT).abs() < 1e-6);
    }
}
