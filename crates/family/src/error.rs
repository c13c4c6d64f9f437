use std::{io, path::PathBuf, result};

use read_fonts::ReadError;
use thiserror::Error;
use write_fonts::{BuilderError, error};

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read font: {0}")]
    ReadError(#[from] ReadError),

    #[error("failed to write font: {0}")]
    WriteError(#[from] error::Error),

    #[error("failed to build font: {0}")]
    BuilderError(#[from] BuilderError),

    #[error(transparent)]
    Outline(#[from] font_outline::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("required table '{0}' not found")]
    MissingTable(&'static str),

    #[error("family has no fonts")]
    NoFonts,

    #[error("glyph '{0}' not found")]
    GlyphNotFound(String),

    #[error("{} fonts are equally close to the default style: {}", candidates.len(), display_paths(candidates))]
    AmbiguousDefault { candidates: Vec<PathBuf> },

    #[error("no measurable origin: {0}")]
    NoMeasurableOrigin(String),

    #[error("unsupported axis tag '{0}'")]
    UnsupportedAxis(String),

    #[error("axis '{0}' is recognised but cannot be derived from measurements")]
    AxisNotDerivable(&'static str),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}
