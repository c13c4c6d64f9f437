//! Error types for outline decoding and flattening.

use std::result;

/// Errors that can occur while decoding or flattening glyph outlines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A component chain refers back to a glyph that is already being expanded.
    #[error("cyclic component reference: {}", chain.join(" -> "))]
    CyclicComponent { chain: Vec<String> },

    /// A component refers to a base glyph that does not exist.
    #[error("glyph '{glyph}' references missing component base '{base}'")]
    MissingComponent { glyph: String, base: String },

    /// A point index outside the glyph's flat point list.
    #[error("point {index} out of range for glyph '{glyph}' ({len} points)")]
    PointOutOfRange { glyph: String, index: usize, len: usize },

    /// Contour end indices do not describe the coordinate buffer.
    #[error("invalid contour end points for glyph '{glyph}': {message}")]
    InvalidContours { glyph: String, message: String },
}

/// Result type for outline operations.
pub type Result<T> = result::Result<T, Error>;
