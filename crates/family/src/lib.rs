//! # Font Family
//!
//! Masters of a TrueType family prepared for variation: loading and writing
//! fonts, checking that every glyph can be interpolated across masters, and
//! deriving parametric axis masters from measured stems and counters.

mod axis;
mod compat;
mod error;
mod family;
mod font;
mod options;
mod prevar;
mod writer;

pub use axis::{Extreme, OriginMetrics, ParametricAxis};
pub use compat::{CompatReport, Issue, IssueKind, check_interpolation};
pub use error::{Error, Result};
pub use family::Family;
pub use font::{Font, GlyphIndex, KerningPair, Style};
pub use options::{
    AxisRange, CACHE_DIR_NAME, DEFAULT_REFERENCE_GLYPH, FamilyOptions, NOMINAL_WEIGHT,
    NOMINAL_WIDTH, TiePolicy, WEIGHT_CLASS_MAX, WEIGHT_CLASS_MIN, WIDTH_CLASS_MAX,
    WIDTH_CLASS_MIN,
};
pub use prevar::{AxisMasters, PreVarFamily};
