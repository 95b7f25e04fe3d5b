//! Load-time error types.
//!
//! Nothing in the per-frame path returns these; a malformed element renders
//! nothing instead. They only surface while reading config and map files.

use std::path::PathBuf;

use thiserror::Error;

use crate::shape::ShapeKind;

/// Errors produced while reading a [`RenderConfig`](crate::config::RenderConfig)
/// or a map file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    World(#[from] WorldError),
}

/// Structural problems in grid data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    #[error("grid has no cells")]
    EmptyGrid,

    #[error("level {level} row {row} has {found} cells, expected {expected}")]
    Ragged {
        level: usize,
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("{layer} layer is {found_w}x{found_h}, expected {expected_w}x{expected_h}")]
    LayerShape {
        layer: &'static str,
        found_w: usize,
        found_h: usize,
        expected_w: usize,
        expected_h: usize,
    },

    #[error("unknown slope glyph {0:?}")]
    UnknownSlope(char),

    #[error("{kind:?} shape at ({x}, {y}) needs {expected} points, got {found}")]
    ShapePoints {
        x: i32,
        y: i32,
        kind: ShapeKind,
        expected: usize,
        found: usize,
    },

    #[error("tile size must be positive, got {0}")]
    TileSize(f32),
}
