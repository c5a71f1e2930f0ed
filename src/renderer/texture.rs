//! Texture identities, the resource cache, and atlas sub-regions
//!
//! GPU textures live in the render state; the library only tracks their
//! identities and grid metadata. A `SpriteRef` is a closed tagged variant:
//! either a whole plain texture or a cell of a shared atlas. Resolving a
//! region to its bindable identity is an explicit lookup, and the atlas must
//! outlive any region handles it issued (the library is owned by the app for
//! the session lifetime).

use glam::{IVec2, UVec2, Vec2};

use super::vertex::{uv_corners, uv_full};

/// Bindable GPU texture identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy)]
enum TextureKind {
    Plain,
    /// Fixed-cell-size atlas, addressed by integer grid coordinates
    Atlas { grid: UVec2 },
}

#[derive(Debug, Clone, Copy)]
struct TextureInfo {
    kind: TextureKind,
}

/// Insert-if-absent cache of texture metadata, read-mostly after startup
#[derive(Debug, Default)]
pub struct TextureLibrary {
    infos: Vec<TextureInfo>,
}

impl TextureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain texture and get its identity
    pub fn insert_plain(&mut self) -> TextureId {
        self.infos.push(TextureInfo { kind: TextureKind::Plain });
        TextureId(self.infos.len() as u32 - 1)
    }

    /// Register an atlas with the given grid dimensions (columns, rows)
    pub fn insert_atlas(&mut self, grid: UVec2) -> TextureId {
        self.infos.push(TextureInfo {
            kind: TextureKind::Atlas { grid },
        });
        TextureId(self.infos.len() as u32 - 1)
    }

    /// Sprite covering a whole plain texture
    pub fn sprite(&self, id: TextureId) -> SpriteRef {
        SpriteRef {
            source: SpriteSource::Plain(id),
            uv_min: Vec2::ZERO,
            uv_max: Vec2::ONE,
        }
    }

    /// Sprite for one atlas cell. Out-of-bounds cells are a contract
    /// violation, not a recoverable error.
    pub fn region(&self, atlas: TextureId, cell: IVec2) -> SpriteRef {
        let info = self.infos[atlas.0 as usize];
        let TextureKind::Atlas { grid } = info.kind else {
            panic!("TextureLibrary - region() on a non-atlas texture ({atlas:?})");
        };
        assert!(
            cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < grid.x && (cell.y as u32) < grid.y,
            "TextureLibrary - atlas cell {cell:?} out of bounds for grid {grid:?}"
        );
        let cell_size = Vec2::new(1.0 / grid.x as f32, 1.0 / grid.y as f32);
        let min = Vec2::new(cell.x as f32, cell.y as f32) * cell_size;
        SpriteRef {
            source: SpriteSource::AtlasRegion { atlas, cell },
            uv_min: min,
            uv_max: min + cell_size,
        }
    }
}

/// Where a sprite's pixels come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteSource {
    Plain(TextureId),
    AtlasRegion { atlas: TextureId, cell: IVec2 },
}

/// A drawable texture reference: a plain texture or an atlas sub-region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteRef {
    pub source: SpriteSource,
    uv_min: Vec2,
    uv_max: Vec2,
}

impl SpriteRef {
    /// The underlying bindable identity. Regions from the same atlas share
    /// one identity, so they share one texture slot per batch.
    pub fn identity(&self) -> TextureId {
        match self.source {
            SpriteSource::Plain(id) => id,
            SpriteSource::AtlasRegion { atlas, .. } => atlas,
        }
    }

    /// UV corners in quad vertex order
    pub fn uvs(&self) -> [Vec2; 4] {
        if self.uv_min == Vec2::ZERO && self.uv_max == Vec2::ONE {
            uv_full()
        } else {
            uv_corners(self.uv_min, self.uv_max)
        }
    }
}
