//! Batched 2D quad renderer: CPU-side batching, texture slot table, wgpu
//! backend and bitmap text.

pub mod batch;
pub mod pipeline;
pub mod text;
pub mod texture;
pub mod vertex;

pub use batch::{BatchRenderer, DrawBackend, Paint, RenderTarget, ShaderId, SubmittedBatch};
pub use pipeline::{PostFilter, RenderState};
pub use text::TextRenderer;
pub use texture::{SpriteRef, TextureId, TextureLibrary};
pub use vertex::{Quad, QuadIndices, Vertex};
