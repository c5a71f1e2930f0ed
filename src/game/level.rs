//! Level file parsing
//!
//! A level is a text file with one line per row of the play field. Each cell
//! is a two-character pair `<color><type>`: a hex color digit selecting the
//! brick atlas column, and a type code from [`TYPE_CODES`]. A space or `'0'`
//! type code leaves the cell empty. Malformed cells are logged and skipped;
//! only I/O failures are hard errors.

use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};

use crate::consts::{FIELD_OFFSET_Y, FIELD_MAX, FIELD_MIN};

use super::state::{Brick, BrickKind};

/// Type code characters, indexed in [`BrickKind`] declaration order
pub const TYPE_CODES: &str = "BWGSTKUDLRCF";

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("failed to read level file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no level files in {path}")]
    EmptyDirectory { path: PathBuf },
}

fn kind_for_code(code: char) -> Option<BrickKind> {
    const KINDS: [BrickKind; 12] = [
        BrickKind::Brick,
        BrickKind::Wall,
        BrickKind::PlatformGrow,
        BrickKind::PlatformShrink,
        BrickKind::PlatformSticking,
        BrickKind::WallBreaker,
        BrickKind::BallSpeedUp,
        BrickKind::BallSlowDown,
        BrickKind::EffectBlur,
        BrickKind::EffectDrunk,
        BrickKind::EffectChaos,
        BrickKind::EffectConfuse,
    ];
    TYPE_CODES.find(code).map(|idx| KINDS[idx])
}

/// A parsed level: bricks plus the grid dimensions they were laid out on
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub bricks: Vec<Brick>,
    pub width: u32,
    pub height: u32,
}

impl Level {
    /// Bricks that count toward the level-clear condition
    pub fn destructible_count(&self) -> usize {
        self.bricks.iter().filter(|b| b.kind.is_destructible()).count()
    }
}

/// Parse level text. Rows of length <= 1 are skipped and not counted; the
/// field width is the longest row's cell count.
pub fn parse_level(text: &str) -> Level {
    let rows: Vec<&str> = text.lines().filter(|line| line.len() > 1).collect();
    let width = rows.iter().map(|row| row.chars().count() / 2).max().unwrap_or(0) as u32;
    let height = rows.len() as u32;
    if width == 0 || height == 0 {
        log::warn!("Level - no usable rows, loading an empty field");
        return Level::default();
    }

    // Cell size from evenly dividing the horizontal [-1, 1] span and the
    // vertical span below the HUD band
    let field_top = FIELD_MAX;
    let field_bottom = FIELD_OFFSET_Y - 1.0;
    let cell_w = (FIELD_MAX - FIELD_MIN) / width as f32;
    let cell_h = (field_top - field_bottom) / height as f32;
    let half_size = Vec2::new(cell_w, cell_h) * 0.5;

    let mut bricks = Vec::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let chars: Vec<char> = row.chars().collect();
        for (col_idx, cell) in chars.chunks(2).enumerate() {
            let [color_char, type_char] = cell else { continue };
            if *type_char == ' ' || *type_char == '0' {
                continue;
            }
            let Some(kind) = kind_for_code(*type_char) else {
                log::warn!(
                    "Level - unrecognized type code {type_char:?} at row {row_idx}, col {col_idx}"
                );
                continue;
            };
            let Some(color_index) = color_char.to_digit(16) else {
                log::warn!(
                    "Level - invalid color digit {color_char:?} at row {row_idx}, col {col_idx}"
                );
                continue;
            };
            bricks.push(Brick {
                kind,
                color_index,
                grid: UVec2::new(col_idx as u32, row_idx as u32),
                position: Vec2::new(
                    FIELD_MIN + (col_idx as f32 + 0.5) * cell_w,
                    field_top - (row_idx as f32 + 0.5) * cell_h,
                ),
                half_size,
            });
        }
    }

    log::info!("Level - parsed {}x{} field with {} bricks", width, height, bricks.len());
    Level { bricks, width, height }
}

pub fn load_level(path: &Path) -> Result<Level, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_level(&text))
}

/// Level files in a directory, sorted by file name
pub fn level_files(dir: &Path) -> Result<Vec<PathBuf>, LevelError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LevelError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(LevelError::EmptyDirectory {
            path: dir.to_path_buf(),
        });
    }
    Ok(files)
}

/// Levels compiled into the binary, used when no levels directory exists
pub fn builtin_levels() -> Vec<Level> {
    [
        include_str!("../../levels/level01.txt"),
        include_str!("../../levels/level02.txt"),
        include_str!("../../levels/level03.txt"),
    ]
    .iter()
    .map(|text| parse_level(text))
    .collect()
}
