//! Dynamic-batching quad renderer
//!
//! Accumulates quads into a fixed-capacity buffer, resolves each quad's
//! texture to one of a small number of concurrently bound slots, and submits
//! one indexed triangle-strip draw per flush. The GPU boundary is the
//! `DrawBackend` trait so the batching and slot logic stay testable without a
//! device.

use glam::{Vec2, Vec3, Vec4};

use crate::consts::{BATCH_SIZE, MAX_TEXTURE_SLOTS};

use super::texture::{SpriteRef, TextureId};
use super::vertex::{uv_full, Quad, QuadIndices};

/// Handle to a shader program registered with the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderId(pub u32);

/// Where flushes land: the swapchain surface or the offscreen post target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTarget {
    #[default]
    Surface,
    Offscreen,
}

/// One flushed batch, handed to the GPU boundary
pub struct SubmittedBatch<'a> {
    pub shader: ShaderId,
    pub target: RenderTarget,
    pub quads: &'a [Quad],
    pub indices: &'a [QuadIndices],
    /// Slot table for this draw; `None` entries bind the blank texture.
    /// Slot 0 is always blank.
    pub slots: &'a [Option<TextureId>; MAX_TEXTURE_SLOTS],
    pub slot_count: usize,
}

/// GPU submission boundary. The real implementation uploads buffers, binds
/// the slot textures and issues the draw; tests record calls instead.
pub trait DrawBackend {
    fn submit(&mut self, batch: SubmittedBatch<'_>);
}

/// How a quad is filled
#[derive(Debug, Clone, Copy)]
pub enum Paint {
    /// Blank texture (slot 0) tinted by a color
    Solid(Vec4),
    /// Textured, untinted
    Sprite(SpriteRef),
    /// Textured with a color tint
    Tinted(SpriteRef, Vec4),
    /// Textured with a UV tiling factor
    Tiled(SpriteRef, f32),
    /// Single-channel glyph texture: sampled red channel becomes alpha
    Glyph(SpriteRef, Vec4),
}

pub struct BatchRenderer<B: DrawBackend> {
    backend: B,
    quads: Vec<Quad>,
    indices: Vec<QuadIndices>,
    slots: [Option<TextureId>; MAX_TEXTURE_SLOTS],
    slot_count: usize,
    shader: Option<ShaderId>,
    target: RenderTarget,
    in_progress: bool,
    draw_calls: u64,
}

impl<B: DrawBackend> BatchRenderer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            quads: Vec::with_capacity(BATCH_SIZE),
            indices: Vec::with_capacity(BATCH_SIZE),
            slots: [None; MAX_TEXTURE_SLOTS],
            slot_count: 1,
            shader: None,
            target: RenderTarget::Surface,
            in_progress: false,
            draw_calls: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Shader used by subsequent flushes. Must be set before `begin()`.
    pub fn set_shader(&mut self, shader: ShaderId) {
        self.shader = Some(shader);
    }

    /// Redirect subsequent flushes to an offscreen target (or back)
    pub fn use_fbo(&mut self, target: RenderTarget) {
        self.target = target;
    }

    /// Start a new frame's batch
    pub fn begin(&mut self) {
        assert!(
            self.shader.is_some(),
            "Renderer - calling begin() without a shader set; call set_shader() first"
        );
        if self.in_progress {
            log::warn!("Renderer - multiple begin() calls without calling end()");
        }
        self.in_progress = true;
        self.quads.clear();
        self.indices.clear();
        self.reset_slots();
    }

    /// Close the batch and force a final flush
    pub fn end(&mut self) {
        if !self.in_progress {
            log::warn!("Renderer - end() called without a matching begin()");
        }
        self.in_progress = false;
        self.flush();
    }

    /// Submit queued quads as one draw call. No-op when empty. Each flush is
    /// a fully independent draw, so the slot table resets here too.
    pub fn flush(&mut self) {
        if self.quads.is_empty() {
            return;
        }
        let shader = self.shader.expect("Renderer - flush without a shader");
        self.backend.submit(SubmittedBatch {
            shader,
            target: self.target,
            quads: &self.quads,
            indices: &self.indices,
            slots: &self.slots,
            slot_count: self.slot_count,
        });
        self.draw_calls += 1;
        self.quads.clear();
        self.indices.clear();
        self.reset_slots();
    }

    /// Queue an axis-aligned quad
    pub fn render_quad(&mut self, center: Vec3, half_size: Vec2, paint: Paint) {
        self.reserve();
        let (color, uvs, tiling, tex_index, alpha_only) = self.resolve_paint(paint);
        self.push(Quad::axis_aligned(center, half_size, color, uvs, tiling, tex_index, alpha_only));
    }

    /// Queue a quad rotated about its center
    pub fn render_rotated_quad(&mut self, center: Vec3, half_size: Vec2, angle_rad: f32, paint: Paint) {
        self.reserve();
        let (color, uvs, tiling, tex_index, alpha_only) = self.resolve_paint(paint);
        self.push(Quad::rotated(center, half_size, angle_rad, color, uvs, tiling, tex_index, alpha_only));
    }

    /// Copy of the most recently queued quad, for UI hit regions.
    /// Calling this with nothing queued is a programmer error.
    pub fn last_quad(&self) -> Quad {
        *self
            .quads
            .last()
            .expect("Renderer - last_quad() with no quad queued this batch")
    }

    /// Total draw calls submitted over the renderer's lifetime
    pub fn draw_call_count(&self) -> u64 {
        self.draw_calls
    }

    /// Implicit flush when the quad buffer is at capacity. Must run before
    /// the paint resolves, so the quad's slot index refers to the slot table
    /// of the batch it will actually join.
    fn reserve(&mut self) {
        if self.quads.len() >= BATCH_SIZE {
            self.flush();
        }
    }

    fn push(&mut self, quad: Quad) {
        debug_assert!(self.quads.len() < BATCH_SIZE);
        self.indices.push(QuadIndices::new(self.quads.len() as u32));
        self.quads.push(quad);
    }

    fn resolve_paint(&mut self, paint: Paint) -> (Vec4, [Vec2; 4], f32, f32, f32) {
        match paint {
            Paint::Solid(color) => (color, uv_full(), 1.0, 0.0, 0.0),
            Paint::Sprite(sprite) => {
                let idx = self.resolve_texture_idx(&sprite);
                (Vec4::ONE, sprite.uvs(), 1.0, idx, 0.0)
            }
            Paint::Tinted(sprite, color) => {
                let idx = self.resolve_texture_idx(&sprite);
                (color, sprite.uvs(), 1.0, idx, 0.0)
            }
            Paint::Tiled(sprite, tiling) => {
                let idx = self.resolve_texture_idx(&sprite);
                (Vec4::ONE, sprite.uvs(), tiling, idx, 0.0)
            }
            Paint::Glyph(sprite, color) => {
                let idx = self.resolve_texture_idx(&sprite);
                (color, sprite.uvs(), 1.0, idx, 1.0)
            }
        }
    }

    /// Resolve a sprite to a texture slot for the in-flight batch.
    ///
    /// Atlas regions resolve to the atlas identity, so sub-textures of one
    /// atlas share a slot. Slots fill in first-seen order starting at 1
    /// (slot 0 is the blank texture). A full table forces a flush, which
    /// clears the table before assigning the freed slot 1.
    fn resolve_texture_idx(&mut self, sprite: &SpriteRef) -> f32 {
        let identity = sprite.identity();
        for i in 1..self.slot_count {
            if self.slots[i] == Some(identity) {
                return i as f32;
            }
        }
        if self.slot_count >= MAX_TEXTURE_SLOTS {
            self.flush();
        }
        let idx = self.slot_count;
        self.slots[idx] = Some(identity);
        self.slot_count += 1;
        idx as f32
    }

    fn reset_slots(&mut self) {
        self.slots = [None; MAX_TEXTURE_SLOTS];
        self.slot_count = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::texture::TextureLibrary;

    /// Records draw calls instead of touching a GPU
    #[derive(Default)]
    struct RecordingBackend {
        draws: Vec<(usize, usize, RenderTarget)>,
        /// Per draw: the slot table and every quad's encoded slot index
        bindings: Vec<([Option<TextureId>; MAX_TEXTURE_SLOTS], Vec<f32>)>,
    }

    impl DrawBackend for RecordingBackend {
        fn submit(&mut self, batch: SubmittedBatch<'_>) {
            self.draws
                .push((batch.quads.len(), batch.slot_count, batch.target));
            self.bindings.push((
                *batch.slots,
                batch
                    .quads
                    .iter()
                    .map(|quad| quad.vertices[0].tex_index)
                    .collect(),
            ));
        }
    }

    fn renderer() -> BatchRenderer<RecordingBackend> {
        let mut r = BatchRenderer::new(RecordingBackend::default());
        r.set_shader(ShaderId(0));
        r
    }

    #[test]
    fn test_capacity_flush_count() {
        let mut lib = TextureLibrary::new();
        let tex = lib.insert_plain();
        let sprite = lib.sprite(tex);

        let mut r = renderer();
        r.begin();
        let n: usize = 2500;
        for _ in 0..n {
            r.render_quad(Vec3::ZERO, Vec2::splat(0.1), Paint::Sprite(sprite));
        }
        r.end();

        // ceil(2500 / 1000) draws for a single shared texture
        let draws = &r.backend().draws;
        assert_eq!(draws.len(), n.div_ceil(BATCH_SIZE));
        assert_eq!(draws[0].0, BATCH_SIZE);
        assert_eq!(draws[1].0, BATCH_SIZE);
        assert_eq!(draws[2].0, n - 2 * BATCH_SIZE);
    }

    #[test]
    fn test_slot_resolution_idempotent() {
        let mut lib = TextureLibrary::new();
        let atlas = lib.insert_atlas(glam::UVec2::new(4, 4));
        let a = lib.region(atlas, glam::IVec2::new(0, 0));
        let b = lib.region(atlas, glam::IVec2::new(3, 2));

        let mut r = renderer();
        r.begin();
        // Two different regions of one atlas occupy exactly one slot
        let s1 = r.resolve_texture_idx(&a);
        let s2 = r.resolve_texture_idx(&b);
        let s3 = r.resolve_texture_idx(&a);
        assert_eq!(s1, 1.0);
        assert_eq!(s2, 1.0);
        assert_eq!(s3, 1.0);
        assert_eq!(r.slot_count, 2);
        r.end();
    }

    #[test]
    fn test_slot_pressure_forces_extra_draw() {
        let mut lib = TextureLibrary::new();
        let sprites: Vec<_> = (0..MAX_TEXTURE_SLOTS)
            .map(|_| {
                let id = lib.insert_plain();
                lib.sprite(id)
            })
            .collect();

        // Slot 0 is reserved blank, so MAX_TEXTURE_SLOTS - 1 distinct
        // textures fit in one draw call
        let mut r = renderer();
        r.begin();
        for s in sprites.iter().take(MAX_TEXTURE_SLOTS - 1) {
            r.render_quad(Vec3::ZERO, Vec2::splat(0.1), Paint::Sprite(*s));
        }
        r.end();
        assert_eq!(r.backend().draws.len(), 1);

        // One more distinct texture forces exactly two
        let mut r = renderer();
        r.begin();
        for s in sprites.iter().take(MAX_TEXTURE_SLOTS) {
            r.render_quad(Vec3::ZERO, Vec2::splat(0.1), Paint::Sprite(*s));
        }
        r.end();
        assert_eq!(r.backend().draws.len(), 2);
        // The overflowing texture got the freed slot 1
        assert_eq!(r.backend().draws[1].1, 2);
    }

    #[test]
    fn test_capacity_flush_rebinds_textures() {
        let mut lib = TextureLibrary::new();
        let a = {
            let id = lib.insert_plain();
            lib.sprite(id)
        };
        let b = {
            let id = lib.insert_plain();
            lib.sprite(id)
        };

        let mut r = renderer();
        r.begin();
        for _ in 0..BATCH_SIZE - 1 {
            r.render_quad(Vec3::ZERO, Vec2::splat(0.1), Paint::Sprite(a));
        }
        // fills the buffer exactly, occupying slot 2
        r.render_quad(Vec3::ZERO, Vec2::splat(0.1), Paint::Sprite(b));
        // must flush first and resolve against the fresh slot table,
        // landing in slot 1 of the second draw
        r.render_quad(Vec3::ZERO, Vec2::splat(0.1), Paint::Sprite(b));
        r.end();

        let bindings = &r.backend().bindings;
        assert_eq!(bindings.len(), 2);
        let (slots, tex_indices) = &bindings[1];
        assert_eq!(tex_indices.as_slice(), &[1.0]);
        assert_eq!(slots[1], Some(b.identity()));
        // every quad in every draw points at a slot occupied in that draw
        for (slots, tex_indices) in bindings {
            for idx in tex_indices {
                let slot = *idx as usize;
                assert!(slot == 0 || slots[slot].is_some(), "stale slot {slot}");
            }
        }
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut r = renderer();
        r.begin();
        r.flush();
        r.end();
        assert!(r.backend().draws.is_empty());
        assert_eq!(r.draw_call_count(), 0);
    }

    #[test]
    fn test_solid_quads_use_slot_zero() {
        let mut r = renderer();
        r.begin();
        r.render_quad(Vec3::ZERO, Vec2::splat(0.5), Paint::Solid(Vec4::ONE));
        let q = r.last_quad();
        assert_eq!(q.vertices[0].tex_index, 0.0);
        r.end();
        // Only the blank slot occupied
        assert_eq!(r.backend().draws[0].1, 1);
    }

    #[test]
    fn test_use_fbo_redirects_target() {
        let mut r = renderer();
        r.use_fbo(RenderTarget::Offscreen);
        r.begin();
        r.render_quad(Vec3::ZERO, Vec2::splat(0.5), Paint::Solid(Vec4::ONE));
        r.end();
        assert_eq!(r.backend().draws[0].2, RenderTarget::Offscreen);
    }

    #[test]
    #[should_panic]
    fn test_begin_without_shader_panics() {
        let mut r = BatchRenderer::new(RecordingBackend::default());
        r.begin();
    }

    #[test]
    #[should_panic]
    fn test_last_quad_empty_panics() {
        let mut r = renderer();
        r.begin();
        let _ = r.last_quad();
    }
}
