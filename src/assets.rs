//! Procedurally generated textures
//!
//! All art is synthesized at startup, so the binary needs no asset files.
//! Each generated texture is uploaded to the GPU and registered with the
//! texture library; both sides hand out indices in insertion order, which
//! keeps the library's ids aligned with the GPU texture table.

use glam::{IVec2, UVec2};

use crate::game::state::BrickKind;
use crate::renderer::text::{self, TextRenderer};
use crate::renderer::{RenderState, SpriteRef, TextureId, TextureLibrary};

/// Brick atlas layout: 16 color columns, one row per visual family
pub const BRICK_ATLAS_COLS: u32 = 16;
pub const BRICK_ATLAS_ROWS: u32 = 3;
const BRICK_CELL_PX: u32 = 32;

const BALL_PX: u32 = 32;
const BACKGROUND_PX: u32 = 64;

/// Sprite handles for everything the scene draws
pub struct Assets {
    pub background: SpriteRef,
    pub ball: SpriteRef,
    pub platform: SpriteRef,
    brick_atlas: TextureId,
    pub text: TextRenderer,
}

impl Assets {
    pub fn generate(render: &mut RenderState, library: &mut TextureLibrary) -> Self {
        let background = register_rgba(render, library, BACKGROUND_PX, BACKGROUND_PX, background_pixels());
        let ball = register_rgba(render, library, BALL_PX, BALL_PX, ball_pixels());
        let platform = register_rgba(render, library, BALL_PX, BALL_PX / 4, platform_pixels());

        let atlas_w = BRICK_ATLAS_COLS * BRICK_CELL_PX;
        let atlas_h = BRICK_ATLAS_ROWS * BRICK_CELL_PX;
        let gpu_idx = render.create_texture_rgba8(atlas_w, atlas_h, &brick_atlas_pixels());
        let brick_atlas = library.insert_atlas(UVec2::new(BRICK_ATLAS_COLS, BRICK_ATLAS_ROWS));
        debug_assert_eq!(gpu_idx, brick_atlas.0);

        let (glyphs, glyph_w, glyph_h) = text::atlas_pixels();
        let glyph_idx = render.create_texture_r8(glyph_w, glyph_h, &glyphs);
        let glyph_atlas = library.insert_atlas(TextRenderer::atlas_grid());
        debug_assert_eq!(glyph_idx, glyph_atlas.0);
        let text = TextRenderer::new(library, glyph_atlas);

        Self {
            background,
            ball,
            platform,
            brick_atlas,
            text,
        }
    }

    /// Atlas region for a brick, by its visual family row and color column
    pub fn brick_sprite(&self, library: &TextureLibrary, kind: BrickKind, color_index: u32) -> SpriteRef {
        let row = match kind {
            BrickKind::Brick => 0,
            BrickKind::Wall => 1,
            _ => 2,
        };
        let col = (color_index % BRICK_ATLAS_COLS) as i32;
        library.region(self.brick_atlas, IVec2::new(col, row))
    }
}

fn register_rgba(
    render: &mut RenderState,
    library: &mut TextureLibrary,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> SpriteRef {
    let gpu_idx = render.create_texture_rgba8(width, height, &pixels);
    let id = library.insert_plain();
    debug_assert_eq!(gpu_idx, id.0);
    library.sprite(id)
}

/// Hex color digit to an RGB base color, one hue per atlas column
fn color_for_index(index: u32) -> [f32; 3] {
    let hue = index as f32 / BRICK_ATLAS_COLS as f32 * 360.0;
    hsv_to_rgb(hue, 0.65, 0.9)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 % 6 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}

fn put_rgba(pixels: &mut [u8], width: u32, x: u32, y: u32, rgba: [f32; 4]) {
    let idx = ((y * width + x) * 4) as usize;
    for (i, channel) in rgba.iter().enumerate() {
        pixels[idx + i] = (channel.clamp(0.0, 1.0) * 255.0) as u8;
    }
}

/// Dark tiled background with a subtle grid line
fn background_pixels() -> Vec<u8> {
    let n = BACKGROUND_PX;
    let mut pixels = vec![0u8; (n * n * 4) as usize];
    for y in 0..n {
        for x in 0..n {
            let edge = x == 0 || y == 0;
            let base = if edge { 0.10 } else { 0.045 };
            let wave = 0.012 * (((x * y) % 7) as f32 / 7.0);
            put_rgba(&mut pixels, n, x, y, [base + wave, base + wave, base + 0.03, 1.0]);
        }
    }
    pixels
}

/// Shaded circle with transparent corners
fn ball_pixels() -> Vec<u8> {
    let n = BALL_PX;
    let mut pixels = vec![0u8; (n * n * 4) as usize];
    let center = (n as f32 - 1.0) / 2.0;
    let radius = n as f32 / 2.0 - 1.0;
    for y in 0..n {
        for x in 0..n {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius {
                continue;
            }
            // light from the upper left
            let shade = 1.0 - dist / radius * 0.55 - (dx + dy) / (2.0 * radius) * 0.15;
            put_rgba(&mut pixels, n, x, y, [shade, shade * 0.95, shade * 0.8, 1.0]);
        }
    }
    pixels
}

/// Rounded bar with a highlight stripe along the top
fn platform_pixels() -> Vec<u8> {
    let w = BALL_PX;
    let h = BALL_PX / 4;
    let mut pixels = vec![0u8; (w * h * 4) as usize];
    for y in 0..h {
        for x in 0..w {
            let stripe = if y == 1 { 0.25 } else { 0.0 };
            let fade = 1.0 - y as f32 / h as f32 * 0.4;
            put_rgba(&mut pixels, w, x, y, [
                0.55 * fade + stripe,
                0.65 * fade + stripe,
                0.85 * fade + stripe,
                1.0,
            ]);
        }
    }
    pixels
}

/// Brick atlas: beveled cells in 16 hues, three visual families
fn brick_atlas_pixels() -> Vec<u8> {
    let width = BRICK_ATLAS_COLS * BRICK_CELL_PX;
    let height = BRICK_ATLAS_ROWS * BRICK_CELL_PX;
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for row in 0..BRICK_ATLAS_ROWS {
        for col in 0..BRICK_ATLAS_COLS {
            let [r, g, b] = match row {
                // plain bricks carry the level's color digit
                0 => color_for_index(col),
                // walls are uniformly grey regardless of color
                1 => [0.5, 0.5, 0.52],
                // power-up bricks get a brighter, desaturated tone
                _ => {
                    let [r, g, b] = color_for_index(col);
                    [r * 0.5 + 0.5, g * 0.5 + 0.5, b * 0.5 + 0.5]
                }
            };
            for y in 0..BRICK_CELL_PX {
                for x in 0..BRICK_CELL_PX {
                    let border = 2;
                    let bevel = if x < border || y < border {
                        1.25
                    } else if x >= BRICK_CELL_PX - border || y >= BRICK_CELL_PX - border {
                        0.6
                    } else {
                        1.0
                    };
                    put_rgba(
                        &mut pixels,
                        width,
                        col * BRICK_CELL_PX + x,
                        row * BRICK_CELL_PX + y,
                        [r * bevel, g * bevel, b * bevel, 1.0],
                    );
                }
            }
        }
    }
    pixels
}
