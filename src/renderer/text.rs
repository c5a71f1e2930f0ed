//! Bitmap text rendering on top of the quad batcher
//!
//! A 5x7 pixel font is baked into a single-channel atlas at startup. Each
//! character becomes one glyph quad with `Paint::Glyph`, so a whole string
//! still rides in the shared batch and occupies a single texture slot.

use glam::{IVec2, UVec2, Vec2, Vec3, Vec4};

use super::batch::{BatchRenderer, DrawBackend, Paint};
use super::texture::{SpriteRef, TextureId, TextureLibrary};

/// Characters available in the font, in atlas cell order
pub const GLYPHS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789.!-:";

pub const ATLAS_COLS: u32 = 8;
pub const ATLAS_ROWS: u32 = 5;
/// Cell edge in pixels; the 5x7 glyph sits in the top-left corner
pub const CELL_PX: u32 = 8;

/// Glyph advance as a fraction of glyph height
const ADVANCE: f32 = 0.75;

/// 5x7 font bitmaps, one row byte per scanline, low 5 bits used (bit 4 is
/// the leftmost pixel). Order matches `GLYPHS`.
#[rustfmt::skip]
const FONT: [[u8; 7]; 40] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x06, 0x08, 0x10, 0x1F], // 2
    [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // .
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04], // !
    [0x00, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00], // -
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // :
];

/// Rasterize the font atlas as R8 pixels (row-major, top-left origin)
pub fn atlas_pixels() -> (Vec<u8>, u32, u32) {
    let width = ATLAS_COLS * CELL_PX;
    let height = ATLAS_ROWS * CELL_PX;
    let mut pixels = vec![0u8; (width * height) as usize];
    for (glyph_idx, rows) in FONT.iter().enumerate() {
        let cell_x = (glyph_idx as u32 % ATLAS_COLS) * CELL_PX;
        let cell_y = (glyph_idx as u32 / ATLAS_COLS) * CELL_PX;
        for (y, row) in rows.iter().enumerate() {
            for x in 0..5u32 {
                if row & (0x10 >> x) != 0 {
                    let px = cell_x + x;
                    let py = cell_y + y as u32;
                    pixels[(py * width + px) as usize] = 255;
                }
            }
        }
    }
    (pixels, width, height)
}

/// Draws strings as runs of glyph quads from the baked atlas
pub struct TextRenderer {
    glyphs: Vec<SpriteRef>,
}

impl TextRenderer {
    /// Register the font atlas cells with the texture library. `atlas` must
    /// have been inserted with an `ATLAS_COLS` x `ATLAS_ROWS` grid.
    pub fn new(library: &mut TextureLibrary, atlas: TextureId) -> Self {
        let glyphs = (0..GLYPHS.len())
            .map(|i| {
                let cell = IVec2::new(
                    (i as u32 % ATLAS_COLS) as i32,
                    (i as u32 / ATLAS_COLS) as i32,
                );
                library.region(atlas, cell)
            })
            .collect();
        Self { glyphs }
    }

    pub fn atlas_grid() -> UVec2 {
        UVec2::new(ATLAS_COLS, ATLAS_ROWS)
    }

    fn glyph(&self, c: char) -> Option<SpriteRef> {
        GLYPHS
            .find(c.to_ascii_uppercase())
            .map(|idx| self.glyphs[idx])
    }

    /// Width of a rendered string for a given glyph height
    pub fn measure(&self, text: &str, height: f32) -> f32 {
        text.chars().count() as f32 * height * ADVANCE
    }

    /// Queue a string with its top-left corner at `pos`. Unknown characters
    /// (including spaces) advance the pen without emitting a quad.
    pub fn draw<B: DrawBackend>(
        &self,
        renderer: &mut BatchRenderer<B>,
        text: &str,
        pos: Vec2,
        height: f32,
        color: Vec4,
    ) {
        let advance = height * ADVANCE;
        // The glyph occupies the top-left 5x7 of its 8x8 cell, so the drawn
        // quad is padded to the right and below the pen position
        let half = Vec2::splat(height * 0.5);
        let mut pen_x = pos.x;
        for c in text.chars() {
            if let Some(sprite) = self.glyph(c) {
                let center = Vec3::new(pen_x + half.x, pos.y - half.y, 0.0);
                renderer.render_quad(center, half, Paint::Glyph(sprite, color));
            }
            pen_x += advance;
        }
    }

    /// Queue a string horizontally centered on `center_x`
    pub fn draw_centered<B: DrawBackend>(
        &self,
        renderer: &mut BatchRenderer<B>,
        text: &str,
        center_x: f32,
        top_y: f32,
        height: f32,
        color: Vec4,
    ) {
        let width = self.measure(text, height);
        self.draw(renderer, text, Vec2::new(center_x - width * 0.5, top_y), height, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_covers_glyph_set() {
        assert_eq!(GLYPHS.chars().count(), FONT.len());
        assert!(GLYPHS.len() <= (ATLAS_COLS * ATLAS_ROWS) as usize);
    }

    #[test]
    fn test_atlas_rasterizes_into_cells() {
        let (pixels, width, height) = atlas_pixels();
        assert_eq!(pixels.len(), (width * height) as usize);
        // 'A' row 0 is 0x0E: pixels 1..4 of the first scanline are lit
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[1], 255);
        assert_eq!(pixels[2], 255);
        assert_eq!(pixels[3], 255);
        assert_eq!(pixels[4], 0);
        // glyph pixels never bleed into the cell padding columns
        for row in 0..height {
            for col in 0..width {
                if col % CELL_PX >= 5 || row % CELL_PX >= 7 {
                    assert_eq!(pixels[(row * width + col) as usize], 0);
                }
            }
        }
    }

    #[test]
    fn test_measure_scales_with_length() {
        let mut lib = TextureLibrary::new();
        let atlas = lib.insert_atlas(TextRenderer::atlas_grid());
        let text = TextRenderer::new(&mut lib, atlas);
        let one = text.measure("A", 0.1);
        let five = text.measure("ABCDE", 0.1);
        assert!((five - 5.0 * one).abs() < 1e-6);
    }
}
