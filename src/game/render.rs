//! Scene assembly: turns the session into quads
//!
//! Rendering is a pure read of the session. Buttons are drawn as quads whose
//! hit regions are copied out via the batcher's last-quad accessor and
//! returned to the caller; clicks are applied between frames, never here.

use glam::{Vec2, Vec3, Vec4};

use crate::assets::Assets;
use crate::consts::{FIELD_MAX, FIELD_MIN, PLATFORM_HALF_HEIGHT, PLATFORM_Y, START_LIVES};
use crate::renderer::{BatchRenderer, DrawBackend, Paint, Quad, RenderTarget, TextureLibrary};

use super::session::{GameSession, UiAction};
use super::state::GameState;

const HUD_TEXT: f32 = 0.055;
const TITLE_TEXT: f32 = 0.16;
const BUTTON_TEXT: f32 = 0.07;
const BUTTON_HALF: Vec2 = Vec2::new(0.34, 0.065);

const BUTTON_COLOR: Vec4 = Vec4::new(0.16, 0.2, 0.32, 0.95);
const TEXT_COLOR: Vec4 = Vec4::new(0.92, 0.94, 1.0, 1.0);
const DIM_COLOR: Vec4 = Vec4::new(0.6, 0.65, 0.75, 1.0);

/// A clickable screen region produced while drawing
#[derive(Debug, Clone, Copy)]
pub struct UiButton {
    pub action: UiAction,
    pub region: Quad,
}

/// Draw one frame of the session into the offscreen scene target and return
/// the frame's clickable regions.
pub fn draw<B: DrawBackend>(
    session: &GameSession,
    assets: &Assets,
    library: &TextureLibrary,
    renderer: &mut BatchRenderer<B>,
) -> Vec<UiButton> {
    let mut buttons = Vec::new();
    renderer.use_fbo(RenderTarget::Offscreen);
    renderer.begin();

    renderer.render_quad(
        Vec3::new(0.0, 0.0, 0.0),
        Vec2::splat(1.0),
        Paint::Tiled(assets.background, 12.0),
    );

    match &session.state {
        GameState::MainMenu => {
            assets.text.draw_centered(renderer, "BRICK RUSH", 0.0, 0.6, TITLE_TEXT, TEXT_COLOR);
            draw_button(renderer, assets, &mut buttons, UiAction::Play, "PLAY", 0.1);
            draw_button(renderer, assets, &mut buttons, UiAction::Quit, "QUIT", -0.15);
        }
        GameState::Playing => {
            draw_field(session, assets, library, renderer);
            draw_hud(session, assets, renderer);
            if session.ball.is_resting() {
                assets.text.draw_centered(
                    renderer,
                    "PRESS SPACE",
                    0.0,
                    -0.4,
                    HUD_TEXT,
                    DIM_COLOR,
                );
            }
        }
        GameState::Paused => {
            draw_field(session, assets, library, renderer);
            draw_hud(session, assets, renderer);
            dim_overlay(renderer, 0.5);
            assets.text.draw_centered(renderer, "PAUSED", 0.0, 0.1, TITLE_TEXT, TEXT_COLOR);
        }
        GameState::IngameMenu => {
            draw_field(session, assets, library, renderer);
            draw_hud(session, assets, renderer);
            dim_overlay(renderer, 0.65);
            draw_button(renderer, assets, &mut buttons, UiAction::Resume, "RESUME", 0.35);
            draw_button(renderer, assets, &mut buttons, UiAction::Restart, "RESTART", 0.15);
            draw_button(renderer, assets, &mut buttons, UiAction::ToMainMenu, "MAIN MENU", -0.05);
            draw_button(renderer, assets, &mut buttons, UiAction::Quit, "QUIT", -0.25);
        }
        GameState::Transition(transition) => {
            draw_field(session, assets, library, renderer);
            draw_hud(session, assets, renderer);
            let alpha = if transition.fade_in {
                1.0 - transition.progress(session.clock())
            } else {
                0.4
            };
            dim_overlay(renderer, alpha);
            if let Some(message) = &transition.message {
                assets.text.draw_centered(renderer, message, 0.0, 0.1, TITLE_TEXT, TEXT_COLOR);
            }
        }
        GameState::EndScreen { won } => {
            dim_overlay(renderer, 0.3);
            let headline = if *won { "YOU WIN!" } else { "GAME OVER" };
            assets.text.draw_centered(renderer, headline, 0.0, 0.6, TITLE_TEXT, TEXT_COLOR);
            let score = format!("SCORE {}", session.score);
            assets.text.draw_centered(renderer, &score, 0.0, 0.35, BUTTON_TEXT, DIM_COLOR);
            draw_button(renderer, assets, &mut buttons, UiAction::PlayAgain, "PLAY AGAIN", 0.0);
            draw_button(renderer, assets, &mut buttons, UiAction::ToMainMenu, "MAIN MENU", -0.25);
        }
    }

    renderer.end();
    buttons
}

fn draw_field<B: DrawBackend>(
    session: &GameSession,
    assets: &Assets,
    library: &TextureLibrary,
    renderer: &mut BatchRenderer<B>,
) {
    for brick in &session.bricks {
        let sprite = assets.brick_sprite(library, brick.kind, brick.color_index);
        renderer.render_quad(
            brick.position.extend(0.0),
            // small gap between cells
            brick.half_size * 0.92,
            Paint::Sprite(sprite),
        );
    }

    renderer.render_quad(
        Vec3::new(session.platform.x, PLATFORM_Y, 0.0),
        Vec2::new(session.platform.half_width, PLATFORM_HALF_HEIGHT),
        Paint::Sprite(assets.platform),
    );

    for particle in session.particles.particles() {
        let color = particle.color.with_w(particle.color.w * particle.alpha());
        renderer.render_quad(
            particle.position.extend(0.0),
            Vec2::splat(particle.size),
            Paint::Solid(color),
        );
    }

    renderer.render_quad(
        session.ball.position.extend(0.0),
        Vec2::splat(session.ball.radius),
        Paint::Sprite(assets.ball),
    );
}

fn draw_hud<B: DrawBackend>(session: &GameSession, assets: &Assets, renderer: &mut BatchRenderer<B>) {
    let top = FIELD_MAX - 0.015;
    assets.text.draw(
        renderer,
        &format!("SCORE {}", session.score),
        Vec2::new(FIELD_MIN + 0.03, top),
        HUD_TEXT,
        TEXT_COLOR,
    );
    let level = format!("LEVEL {}", session.level_index + 1);
    assets
        .text
        .draw_centered(renderer, &level, 0.0, top, HUD_TEXT, DIM_COLOR);
    // one ball icon per remaining life, right-aligned
    for life in 0..session.lives.min(START_LIVES * 2) {
        renderer.render_quad(
            Vec3::new(FIELD_MAX - 0.05 - life as f32 * 0.06, top - HUD_TEXT * 0.5, 0.0),
            Vec2::splat(0.02),
            Paint::Sprite(assets.ball),
        );
    }
}

/// Darken the scene behind menu overlays
fn dim_overlay<B: DrawBackend>(renderer: &mut BatchRenderer<B>, alpha: f32) {
    renderer.render_quad(
        Vec3::ZERO,
        Vec2::splat(1.0),
        Paint::Solid(Vec4::new(0.0, 0.0, 0.0, alpha)),
    );
}

fn draw_button<B: DrawBackend>(
    renderer: &mut BatchRenderer<B>,
    assets: &Assets,
    buttons: &mut Vec<UiButton>,
    action: UiAction,
    label: &str,
    center_y: f32,
) {
    renderer.render_quad(Vec3::new(0.0, center_y, 0.0), BUTTON_HALF, Paint::Solid(BUTTON_COLOR));
    // the hit region is the background quad, copied before the label quads
    let region = renderer.last_quad();
    buttons.push(UiButton { action, region });
    assets.text.draw_centered(
        renderer,
        label,
        0.0,
        center_y + BUTTON_TEXT * 0.5,
        BUTTON_TEXT,
        TEXT_COLOR,
    );
}

/// Resolve a click against this frame's buttons
pub fn hit_test(buttons: &[UiButton], mouse_ndc: Vec2) -> Option<UiAction> {
    buttons
        .iter()
        .find(|button| button.region.contains(mouse_ndc))
        .map(|button| button.action)
}
