//! Parametric design axes and the transforms that derive their extreme masters.
//!
//! Every derivable axis holds one dimension of the design fixed and drives
//! another to its extreme; margins or the advance width absorb the difference.

use std::{collections::HashMap, fmt, str::FromStr};

use font_outline::{GlyphAnalysis, GlyphAnalyzer, Measurements};
use kurbo::Vec2;
use log::debug;

use crate::{
    error::{Error, Result},
    font::{Font, Style},
    options::{AxisRange, WEIGHT_CLASS_MAX, WEIGHT_CLASS_MIN, WIDTH_CLASS_MAX, WIDTH_CLASS_MIN},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParametricAxis {
    /// Counter width; stems fixed.
    Xtra,
    /// Stem width; counters fixed.
    Xopq,
    /// Bar thickness.
    Yopq,
    /// Uppercase height.
    Ytuc,
    /// Lowercase x-height.
    Ytlc,
    /// Ascender height.
    Ytas,
    /// Descender depth.
    Ytde,
    /// All vertical proportions.
    Ytra,
    /// Weight without changing advance widths.
    Grad,
    Rnds,
    Stnc,
    Catl,
}

impl ParametricAxis {
    pub const ALL: [Self; 12] = [
        Self::Xtra,
        Self::Xopq,
        Self::Yopq,
        Self::Ytuc,
        Self::Ytlc,
        Self::Ytas,
        Self::Ytde,
        Self::Ytra,
        Self::Grad,
        Self::Rnds,
        Self::Stnc,
        Self::Catl,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Xtra => "XTRA",
            Self::Xopq => "XOPQ",
            Self::Yopq => "YOPQ",
            Self::Ytuc => "YTUC",
            Self::Ytlc => "YTLC",
            Self::Ytas => "YTAS",
            Self::Ytde => "YTDE",
            Self::Ytra => "YTRA",
            Self::Grad => "GRAD",
            Self::Rnds => "RNDS",
            Self::Stnc => "STNC",
            Self::Catl => "CATL",
        }
    }

    /// Whether extreme masters can be derived from outline measurements.
    pub fn is_derivable(self) -> bool {
        !matches!(self, Self::Rnds | Self::Stnc | Self::Catl)
    }

    /// Scale factors used when no override is configured.
    pub fn default_range(self) -> AxisRange {
        match self {
            Self::Xtra => AxisRange::new(0.5, 1.5),
            Self::Xopq | Self::Yopq => AxisRange::new(0.5, 2.0),
            Self::Grad => AxisRange::new(0.8, 1.2),
            Self::Ytuc | Self::Ytlc | Self::Ytas | Self::Ytde | Self::Ytra => {
                AxisRange::new(0.8, 1.2)
            }
            Self::Rnds | Self::Stnc | Self::Catl => AxisRange::new(1.0, 1.0),
        }
    }

    /// Size on the origin that this axis varies, in font units.
    pub fn origin_value(self, metrics: &OriginMetrics) -> Result<f64> {
        let missing = |what: &str| {
            Error::NoMeasurableOrigin(format!("'{}' has no measurable {what}", metrics.glyph))
        };
        match self {
            Self::Xtra => metrics.counter.ok_or_else(|| missing("counter")),
            Self::Xopq | Self::Grad => Ok(metrics.stem),
            Self::Yopq => metrics.bar.ok_or_else(|| missing("bar")),
            Self::Ytuc => Ok(metrics.cap_height),
            Self::Ytlc => Ok(metrics.x_height),
            Self::Ytas => Ok(metrics.ascender),
            Self::Ytde => Ok(-metrics.descender),
            Self::Ytra => Ok(metrics.ascender - metrics.descender),
            Self::Rnds | Self::Stnc | Self::Catl => Err(Error::AxisNotDerivable(self.tag())),
        }
    }

    /// Turn `font`, a copy of the origin, into this axis's `extreme` master.
    pub fn apply(
        self,
        font: &mut Font,
        extreme: Extreme,
        range: AxisRange,
        analyzer: &GlyphAnalyzer,
    ) -> Result<()> {
        let factor = extreme.pick(range);
        debug!("{self} {extreme}: factor {factor} on {}", font.path().display());
        match self {
            Self::Xtra => {
                let width = extreme.pick_class(WIDTH_CLASS_MIN, WIDTH_CLASS_MAX);
                font.set_style(Style::new(font.weight_class(), width));
                stretch_horizontally(font, analyzer, Stretch::Counters(factor))
            }
            Self::Xopq => {
                let weight = extreme.pick_class(WEIGHT_CLASS_MIN, WEIGHT_CLASS_MAX);
                font.set_style(Style::new(weight, font.width_class()));
                stretch_horizontally(font, analyzer, Stretch::Stems(factor))
            }
            Self::Grad => {
                let weight = extreme.pick_class(WEIGHT_CLASS_MIN, WEIGHT_CLASS_MAX);
                font.set_style(Style::new(weight, font.width_class()));
                stretch_horizontally(font, analyzer, Stretch::Grade(factor))
            }
            Self::Yopq => {
                scale_bars(font, analyzer, factor);
                Ok(())
            }
            Self::Ytuc => {
                scale_vertically(font, is_uppercase, |y| if y > 0.0 { y * factor } else { y });
                Ok(())
            }
            Self::Ytlc => {
                let x_height = font.x_height();
                scale_vertically(font, is_lowercase, |y| {
                    if y <= 0.0 {
                        y
                    } else if y <= x_height {
                        y * factor
                    } else {
                        y + x_height * (factor - 1.0)
                    }
                });
                Ok(())
            }
            Self::Ytas => {
                let x_height = font.x_height();
                scale_vertically(font, is_lowercase, |y| {
                    if y > x_height { x_height + (y - x_height) * factor } else { y }
                });
                Ok(())
            }
            Self::Ytde => {
                scale_vertically(font, |_| true, |y| if y < 0.0 { y * factor } else { y });
                Ok(())
            }
            Self::Ytra => {
                scale_vertically(font, |_| true, |y| y * factor);
                Ok(())
            }
            Self::Rnds | Self::Stnc | Self::Catl => Err(Error::AxisNotDerivable(self.tag())),
        }
    }
}

impl fmt::Display for ParametricAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ParametricAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|axis| axis.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedAxis(s.to_string()))
    }
}

/// Which end of an axis a master sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extreme {
    Min,
    Max,
}

impl Extreme {
    pub fn pick(self, range: AxisRange) -> f64 {
        match self {
            Self::Min => range.min,
            Self::Max => range.max,
        }
    }

    fn pick_class(self, min: u16, max: u16) -> u16 {
        match self {
            Self::Min => min,
            Self::Max => max,
        }
    }
}

impl fmt::Display for Extreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Min => "min",
            Self::Max => "max",
        })
    }
}

/// Sizes measured on the origin font that parametrize its axis masters.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginMetrics {
    /// The measured reference glyph.
    pub glyph: String,
    /// Most frequent stem width.
    pub stem: f64,
    pub counter: Option<f64>,
    pub bar: Option<f64>,
    /// Top of the reference glyph.
    pub cap_height: f64,
    pub x_height: f64,
    /// Highest point of any lowercase glyph.
    pub ascender: f64,
    /// Lowest point of any glyph, zero or below.
    pub descender: f64,
}

impl OriginMetrics {
    pub fn measure(font: &Font, glyph: &str, analyzer: &GlyphAnalyzer) -> Result<Self> {
        let origin = font.path().display();
        let Some(reference) = font.glyph(glyph) else {
            return Err(Error::NoMeasurableOrigin(format!("{origin} has no glyph '{glyph}'")));
        };
        let analysis = analyzer.analyze_with_outline(reference, &font.flatten(glyph)?);
        let Some(stem) = analysis.stems.most_frequent() else {
            return Err(Error::NoMeasurableOrigin(format!(
                "'{glyph}' in {origin} has no measurable stems"
            )));
        };

        let x_height = font.x_height();
        let mut ascender = x_height;
        let mut descender = 0.0f64;
        for name in font.glyph_names() {
            let Some(bounds) = font.glyph_bounds(name).ok().flatten() else {
                continue;
            };
            if is_lowercase(name) {
                ascender = ascender.max(bounds.y1);
            }
            descender = descender.min(bounds.y0);
        }
        let cap_height = font
            .glyph_bounds(glyph)?
            .map(|rect| rect.y1)
            .unwrap_or(font.units_per_em() as f64 * 0.7);

        Ok(Self {
            glyph: glyph.to_string(),
            stem: stem as f64,
            counter: analysis.horizontal_counters.most_frequent().map(|w| w as f64),
            bar: analysis.bars.most_frequent().map(|w| w as f64),
            cap_height,
            x_height,
            ascender,
            descender,
        })
    }
}

fn is_uppercase(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
}

fn is_lowercase(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
}

/// Monotone piecewise-linear map through `(old, new)` knots, continued with
/// slope one beyond the outer knots.
#[derive(Debug, Clone, Default, PartialEq)]
struct PiecewiseMap {
    knots: Vec<(f64, f64)>,
}

impl PiecewiseMap {
    fn linear(old: f64, new: f64) -> Self {
        if old <= 0.0 {
            return Self::default();
        }
        Self { knots: vec![(0.0, 0.0), (old, new)] }
    }

    fn apply(&self, value: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.knots.first(), self.knots.last()) else {
            return value;
        };
        if value <= first.0 {
            return value + first.1 - first.0;
        }
        if value >= last.0 {
            return value + last.1 - last.0;
        }
        self.knots
            .windows(2)
            .find(|pair| value <= pair[1].0)
            .map(|pair| {
                let ((a, new_a), (b, new_b)) = (pair[0], pair[1]);
                if b - a <= f64::EPSILON {
                    new_a
                } else {
                    new_a + (new_b - new_a) * (value - a) / (b - a)
                }
            })
            .unwrap_or(value)
    }

    /// How far everything past the last knot moves.
    fn end_shift(&self) -> f64 {
        self.knots.last().map_or(0.0, |&(old, new)| new - old)
    }
}

#[derive(Debug, Clone, Copy)]
enum Stretch {
    /// Scale the gaps between stems.
    Counters(f64),
    /// Scale stems, move counters rigidly.
    Stems(f64),
    /// Scale stems and take the growth out of the counters.
    Grade(f64),
}

impl Stretch {
    fn keeps_advance(self) -> bool {
        matches!(self, Self::Grade(_))
    }

    fn map(self, strokes: &[(f64, f64)]) -> PiecewiseMap {
        match self {
            Self::Counters(factor) => stroke_map(strokes, 1.0, |gap| gap * factor, 0.0),
            Self::Stems(factor) => stroke_map(strokes, factor, |gap| gap, 0.0),
            Self::Grade(factor) => {
                let growth: f64 = strokes.iter().map(|(a, b)| (b - a) * (factor - 1.0)).sum();
                match strokes.len() {
                    0 => PiecewiseMap::default(),
                    // A lone stroke grows about its centre.
                    1 => stroke_map(strokes, factor, |gap| gap, -growth / 2.0),
                    n => {
                        let per_gap = growth / (n - 1) as f64;
                        stroke_map(strokes, factor, |gap| gap - per_gap, 0.0)
                    }
                }
            }
        }
    }
}

/// Knots for sorted, disjoint stroke intervals: strokes scale by `stroke_scale`,
/// the gaps between them become `gap(old_gap)` wide.
fn stroke_map(
    strokes: &[(f64, f64)],
    stroke_scale: f64,
    gap: impl Fn(f64) -> f64,
    start_shift: f64,
) -> PiecewiseMap {
    let mut knots = Vec::with_capacity(strokes.len() * 2);
    let mut previous: Option<(f64, f64)> = None;
    for &(start, end) in strokes {
        let new_start = match previous {
            None => start + start_shift,
            Some((old_end, new_end)) => new_end + gap(start - old_end).max(0.0),
        };
        let new_end = new_start + (end - start) * stroke_scale;
        knots.push((start, new_start));
        knots.push((end, new_end));
        previous = Some((end, new_end));
    }
    PiecewiseMap { knots }
}

/// Sorted, merged intervals spanned by the measured pairs, along x or y.
fn stroke_intervals(measurements: &Measurements, coordinate: impl Fn(&font_outline::Point) -> f64) -> Vec<(f64, f64)> {
    let mut intervals: Vec<(f64, f64)> = measurements
        .iter()
        .flat_map(|(_, pairs)| pairs)
        .map(|pair| {
            let (a, b) = (coordinate(pair.first.p()), coordinate(pair.second.p()));
            (a.min(b), a.max(b))
        })
        .collect();
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn stems_of(analysis: &GlyphAnalysis) -> Vec<(f64, f64)> {
    stroke_intervals(&analysis.stems, |p| p.x)
}

fn bars_of(analysis: &GlyphAnalysis) -> Vec<(f64, f64)> {
    stroke_intervals(&analysis.bars, |p| p.y)
}

fn outline_glyph_names(font: &Font) -> (Vec<String>, Vec<String>) {
    font.glyphs()
        .map(|glyph| (glyph.name().to_string(), glyph.is_composite() && glyph.contour_count() == 0))
        .fold((Vec::new(), Vec::new()), |(mut simple, mut composite), (name, is_composite)| {
            if is_composite { composite.push(name) } else { simple.push(name) }
            (simple, composite)
        })
}

/// Rework every glyph horizontally around its own stems. Composites follow the
/// advance change of their first component.
fn stretch_horizontally(font: &mut Font, analyzer: &GlyphAnalyzer, stretch: Stretch) -> Result<()> {
    let (simple, composite) = outline_glyph_names(font);
    let mut advances: HashMap<String, (f64, f64)> = HashMap::with_capacity(simple.len());

    for name in simple {
        let Some(glyph) = font.glyph(&name) else { continue };
        let map = stretch.map(&stems_of(&analyzer.analyze(glyph)));
        let Some(glyph) = font.glyph_mut(&name) else { continue };
        let advance = glyph.advance_width();
        if !map.knots.is_empty() {
            glyph.map_points(|p| kurbo::Point::new(map.apply(p.x), p.y));
            if !stretch.keeps_advance() {
                glyph.set_advance_width(advance + map.end_shift());
            }
        }
        advances.insert(name, (advance, glyph.advance_width()));
    }

    for name in composite {
        let Some(glyph) = font.glyph_mut(&name) else { continue };
        let map = glyph
            .components()
            .first()
            .and_then(|first| advances.get(&first.base))
            .map(|&(old, new)| PiecewiseMap::linear(old, new))
            .unwrap_or_default();
        glyph.map_component_offsets(|offset| Vec2::new(map.apply(offset.x), offset.y));
        if !stretch.keeps_advance() {
            glyph.set_advance_width(map.apply(glyph.advance_width()));
        }
    }
    Ok(())
}

/// Thicken or thin every glyph's bars; everything above a bar moves with it.
fn scale_bars(font: &mut Font, analyzer: &GlyphAnalyzer, factor: f64) {
    let (simple, _) = outline_glyph_names(font);
    for name in simple {
        let Some(glyph) = font.glyph(&name) else { continue };
        let map = stroke_map(&bars_of(&analyzer.analyze(glyph)), factor, |gap| gap, 0.0);
        if map.knots.is_empty() {
            continue;
        }
        if let Some(glyph) = font.glyph_mut(&name) {
            glyph.map_points(|p| kurbo::Point::new(p.x, map.apply(p.y)));
        }
    }
}

/// Move every y of the selected glyphs, component offsets included, through `map`.
fn scale_vertically(font: &mut Font, selects: impl Fn(&str) -> bool, map: impl Fn(f64) -> f64) {
    for glyph in font.glyphs_mut() {
        if !selects(glyph.name()) {
            continue;
        }
        glyph.map_points(|p| kurbo::Point::new(p.x, map(p.y)));
        glyph.map_component_offsets(|offset| Vec2::new(offset.x, map(offset.y)));
    }
}
