//! # Font Outline
//!
//! TrueType glyph outlines as point lists, with the geometry needed to measure
//! them: seven-point contexts around every contour point, and an analyzer that
//! finds stems, bars, counters and diagonal strokes.
//!
//! ## Example
//!
//! ```
//! use font_outline::{Glyph, GlyphAnalyzer};
//!
//! let bar = Glyph::from_contours(
//!     "I",
//!     [vec![(0.0, 0.0, true), (0.0, 700.0, true), (90.0, 700.0, true), (90.0, 0.0, true)]],
//! );
//! let analysis = GlyphAnalyzer::default().analyze(&bar);
//! assert_eq!(analysis.stems.min(), Some(90));
//! ```

mod analyzer;
mod context;
mod error;
mod glyph;
mod point;
mod tolerance;

pub use analyzer::{ContextPair, GlyphAnalysis, GlyphAnalyzer, Measurements};
pub use context::{PointContext, WINDOW_SIZE};
pub use error::{Error, Result};
pub use glyph::{Component, Contour, Direction, Glyph, PHANTOM_POINTS, PathCommand, quad_to_cubic};
pub use point::{Point, PointType};
pub use tolerance::{DEFAULT_PARALLEL_TOLERANCE, ToleranceConfig};
