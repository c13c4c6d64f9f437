//! Options for family analysis and axis master generation

use std::path::PathBuf;

use font_outline::ToleranceConfig;
use indexmap::IndexMap;

use crate::axis::ParametricAxis;

/// OS/2 weight class of the interpolation origin.
pub const NOMINAL_WEIGHT: u16 = 400;

/// OS/2 width class of the interpolation origin.
pub const NOMINAL_WIDTH: u16 = 5;

/// OS/2 width classes run from ultra-condensed to ultra-expanded.
pub const WIDTH_CLASS_MIN: u16 = 1;
pub const WIDTH_CLASS_MAX: u16 = 9;

pub const WEIGHT_CLASS_MIN: u16 = 100;
pub const WEIGHT_CLASS_MAX: u16 = 900;

/// Glyph measured to parametrize axis masters.
pub const DEFAULT_REFERENCE_GLYPH: &str = "H";

/// Directory created next to the origin font for generated axis masters.
pub const CACHE_DIR_NAME: &str = ".varprep-cache";

/// What to do when several fonts are equally close to the default style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Refuse to pick; report every candidate.
    #[default]
    Strict,
    /// Take the candidate that was added to the family first.
    FirstFound,
}

/// Scale factors applied at an axis minimum and maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Options for family analysis
#[derive(Debug, Clone)]
pub struct FamilyOptions {
    pub nominal_weight: u16,
    pub nominal_width: u16,
    pub reference_glyph: String,
    pub tolerance: ToleranceConfig,
    pub tie_policy: TiePolicy,
    /// Among fonts equally close to the nominal weight, prefer the width class
    /// nearest the nominal width. When off, only the weight class decides and
    /// such fonts are left to `tie_policy`.
    pub width_tie_break: bool,
    /// Where axis masters are written; defaults to a directory beside the origin font.
    pub cache_dir: Option<PathBuf>,
    pub axis_ranges: IndexMap<ParametricAxis, AxisRange>,
}

impl Default for FamilyOptions {
    fn default() -> Self {
        Self {
            nominal_weight: NOMINAL_WEIGHT,
            nominal_width: NOMINAL_WIDTH,
            reference_glyph: DEFAULT_REFERENCE_GLYPH.to_string(),
            tolerance: ToleranceConfig::default(),
            tie_policy: TiePolicy::default(),
            width_tie_break: true,
            cache_dir: None,
            axis_ranges: IndexMap::new(),
        }
    }
}

impl FamilyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nominal_weight(mut self, weight: u16) -> Self {
        self.nominal_weight = weight;
        self
    }

    pub fn nominal_width(mut self, width: u16) -> Self {
        self.nominal_width = width;
        self
    }

    pub fn reference_glyph(mut self, name: impl Into<String>) -> Self {
        self.reference_glyph = name.into();
        self
    }

    pub fn tolerance(mut self, tolerance: ToleranceConfig) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tie_policy(mut self, policy: TiePolicy) -> Self {
        self.tie_policy = policy;
        self
    }

    pub fn width_tie_break(mut self, enabled: bool) -> Self {
        self.width_tie_break = enabled;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Override the scale factors for one axis
    pub fn axis_range(mut self, axis: ParametricAxis, range: AxisRange) -> Self {
        self.axis_ranges.insert(axis, range);
        self
    }

    /// Scale factors for `axis`, falling back to the axis default
    pub fn range_for(&self, axis: ParametricAxis) -> AxisRange {
        self.axis_ranges.get(&axis).copied().unwrap_or_else(|| axis.default_range())
    }
}
