//! Vertex, quad and index types for the batched 2D renderer
//!
//! A quad is four vertices in bottom-left, top-left, bottom-right, top-right
//! order, matching a triangle strip with a primitive restart appended after
//! every four vertices.

use bytemuck::{Pod, Zeroable};
use glam::{Mat2, Vec2, Vec3, Vec4};

use crate::consts::PRIMITIVE_RESTART;

/// Per-vertex data shared by tinted, textured and glyph quads.
///
/// `tex_index` selects one of the 8 bound texture slots (float-encoded),
/// `alpha_only` marks single-channel glyph quads.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    pub uv_tiling: f32,
    pub tex_index: f32,
    pub alpha_only: f32,
}

impl Vertex {
    pub fn new(position: Vec3, color: Vec4, uv: Vec2, tiling: f32, tex_index: f32, alpha_only: f32) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            uv: uv.to_array(),
            uv_tiling: tiling,
            tex_index,
            alpha_only,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x4,
            2 => Float32x2,
            3 => Float32,
            4 => Float32,
            5 => Float32,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}

/// UV corners in quad vertex order for a sub-rectangle of a texture.
///
/// `min`/`max` are the top-left and bottom-right of the region in texture
/// space (v grows downward).
pub fn uv_corners(min: Vec2, max: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(min.x, max.y), // bottom-left
        Vec2::new(min.x, min.y), // top-left
        Vec2::new(max.x, max.y), // bottom-right
        Vec2::new(max.x, min.y), // top-right
    ]
}

/// Full-texture UVs
pub fn uv_full() -> [Vec2; 4] {
    uv_corners(Vec2::ZERO, Vec2::ONE)
}

/// One queued quad: four vertices, never mutated after construction
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct Quad {
    pub vertices: [Vertex; 4],
}

impl Quad {
    /// Axis-aligned quad from center and half extents
    pub fn axis_aligned(
        center: Vec3,
        half_size: Vec2,
        color: Vec4,
        uvs: [Vec2; 4],
        tiling: f32,
        tex_index: f32,
        alpha_only: f32,
    ) -> Self {
        let hx = Vec2::new(half_size.x, 0.0);
        let hy = Vec2::new(0.0, half_size.y);
        Self::from_basis(center, hx, hy, color, uvs, tiling, tex_index, alpha_only)
    }

    /// Rotated quad: the rotation is applied to the half-extent basis vectors
    /// before placing corners, which rotates the quad about its center.
    pub fn rotated(
        center: Vec3,
        half_size: Vec2,
        angle_rad: f32,
        color: Vec4,
        uvs: [Vec2; 4],
        tiling: f32,
        tex_index: f32,
        alpha_only: f32,
    ) -> Self {
        let rot = Mat2::from_angle(angle_rad);
        let hx = rot * Vec2::new(half_size.x, 0.0);
        let hy = rot * Vec2::new(0.0, half_size.y);
        Self::from_basis(center, hx, hy, color, uvs, tiling, tex_index, alpha_only)
    }

    #[allow(clippy::too_many_arguments)]
    fn from_basis(
        center: Vec3,
        hx: Vec2,
        hy: Vec2,
        color: Vec4,
        uvs: [Vec2; 4],
        tiling: f32,
        tex_index: f32,
        alpha_only: f32,
    ) -> Self {
        let corners = [-hx - hy, -hx + hy, hx - hy, hx + hy];
        let mut vertices = [Vertex::default(); 4];
        for (i, corner) in corners.iter().enumerate() {
            let pos = center + Vec3::new(corner.x, corner.y, 0.0);
            vertices[i] = Vertex::new(pos, color, uvs[i], tiling, tex_index, alpha_only);
        }
        Self { vertices }
    }

    /// Axis-aligned bounds of the quad (for UI hit regions)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for v in &self.vertices {
            min = min.min(Vec2::new(v.position[0], v.position[1]));
            max = max.max(Vec2::new(v.position[0], v.position[1]));
        }
        (min, max)
    }

    /// Whether a point lies inside the quad's axis-aligned bounds
    pub fn contains(&self, point: Vec2) -> bool {
        let (min, max) = self.bounds();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}

/// Index quintuple for one quad: four strip indices plus the restart sentinel
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct QuadIndices {
    pub indices: [u32; 5],
}

impl QuadIndices {
    pub fn new(quad_idx: u32) -> Self {
        let base = quad_idx * 4;
        Self {
            indices: [base, base + 1, base + 2, base + 3, PRIMITIVE_RESTART],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_axis_aligned_corner_order() {
        let q = Quad::axis_aligned(
            Vec3::new(1.0, 2.0, 0.0),
            Vec2::new(0.5, 0.25),
            Vec4::ONE,
            uv_full(),
            1.0,
            0.0,
            0.0,
        );
        // bottom-left, top-left, bottom-right, top-right
        assert_eq!(q.vertices[0].position, [0.5, 1.75, 0.0]);
        assert_eq!(q.vertices[1].position, [0.5, 2.25, 0.0]);
        assert_eq!(q.vertices[2].position, [1.5, 1.75, 0.0]);
        assert_eq!(q.vertices[3].position, [1.5, 2.25, 0.0]);
        // uv layout matches the corner order
        assert_eq!(q.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(q.vertices[1].uv, [0.0, 0.0]);
        assert_eq!(q.vertices[2].uv, [1.0, 1.0]);
        assert_eq!(q.vertices[3].uv, [1.0, 0.0]);
    }

    #[test]
    fn test_rotation_about_center() {
        // Quarter turn maps the x half-extent onto y
        let q = Quad::rotated(
            Vec3::ZERO,
            Vec2::new(1.0, 0.5),
            FRAC_PI_2,
            Vec4::ONE,
            uv_full(),
            1.0,
            0.0,
            0.0,
        );
        // top-right corner of the unrotated quad (1, 0.5) lands at (-0.5, 1)
        let tr = q.vertices[3].position;
        assert!((tr[0] - (-0.5)).abs() < 1e-5);
        assert!((tr[1] - 1.0).abs() < 1e-5);
        // center is preserved
        let cx: f32 = q.vertices.iter().map(|v| v.position[0]).sum::<f32>() / 4.0;
        let cy: f32 = q.vertices.iter().map(|v| v.position[1]).sum::<f32>() / 4.0;
        assert!(cx.abs() < 1e-5 && cy.abs() < 1e-5);
    }

    #[test]
    fn test_quad_indices_restart() {
        let qi = QuadIndices::new(3);
        assert_eq!(qi.indices, [12, 13, 14, 15, PRIMITIVE_RESTART]);
    }

    #[test]
    fn test_quad_contains() {
        let q = Quad::axis_aligned(Vec3::ZERO, Vec2::splat(0.5), Vec4::ONE, uv_full(), 1.0, 0.0, 0.0);
        assert!(q.contains(Vec2::new(0.2, -0.3)));
        assert!(!q.contains(Vec2::new(0.6, 0.0)));
    }
}
