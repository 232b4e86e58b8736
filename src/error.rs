use std::io;
use std::path::PathBuf;
use std::time::TryFromFloatSecsError;

use thiserror::Error;

/// Errors raised while loading a puzzle, before any solving begins.
#[derive(Error, Debug)]
pub enum CrosswordError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load font {}", .path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: ab_glyph::InvalidFont,
    },

    #[error("failed to save image {}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("time limit of {secs} seconds is out of range")]
    TimeLimit {
        secs: f64,
        #[source]
        source: TryFromFloatSecsError,
    },

    #[error("grid structure has no rows")]
    EmptyStructure,

    #[error("grid structure row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl CrosswordError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> CrosswordError {
        CrosswordError::Io { path: path.into(), source }
    }
}
