//! Stem, bar and counter measurement.
//!
//! The analyzer pairs up point contexts that can act as the two sides of a
//! stroke, then decides from the filled outline whether the span between them
//! is ink (a stem or bar) or open space (a counter).

use std::collections::BTreeMap;

use kurbo::{BezPath, Line, Shape};
use log::debug;

use crate::{context::PointContext, glyph::Glyph, tolerance::ToleranceConfig};

/// Fractions across a span at which the fill is sampled. The outer two sit just
/// inside each side so a span that runs into a neighbouring stroke is rejected.
const ACROSS_SAMPLES: [f64; 5] = [0.02, 0.25, 0.5, 0.75, 0.98];

/// Fractions along the shared window of two straight sides.
const ALONG_SAMPLES: [f64; 3] = [0.25, 0.5, 0.75];

/// Spans narrower than this are two contexts on the same side.
const MIN_SPAN: f64 = 1e-6;

/// Two contexts measured against each other.
#[derive(Debug, Clone)]
pub struct ContextPair {
    pub first: PointContext,
    pub second: PointContext,
}

/// Measured widths, each with the context pairs that realise it.
#[derive(Debug, Clone, Default)]
pub struct Measurements {
    buckets: BTreeMap<i64, Vec<ContextPair>>,
}

impl Measurements {
    pub fn insert(&mut self, width: f64, first: &PointContext, second: &PointContext) {
        self.buckets
            .entry(width.round() as i64)
            .or_default()
            .push(ContextPair { first: first.clone(), second: second.clone() });
    }

    /// Number of distinct widths.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Distinct widths in ascending order.
    pub fn widths(&self) -> impl Iterator<Item = i64> + '_ {
        self.buckets.keys().copied()
    }

    pub fn get(&self, width: i64) -> Option<&[ContextPair]> {
        self.buckets.get(&width).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &[ContextPair])> {
        self.buckets.iter().map(|(width, pairs)| (*width, pairs.as_slice()))
    }

    pub fn min(&self) -> Option<i64> {
        self.buckets.keys().next().copied()
    }

    pub fn max(&self) -> Option<i64> {
        self.buckets.keys().next_back().copied()
    }

    /// Width realised by the most pairs; ties go to the narrower width.
    pub fn most_frequent(&self) -> Option<i64> {
        self.buckets
            .iter()
            .max_by(|(wa, a), (wb, b)| a.len().cmp(&b.len()).then(wb.cmp(wa)))
            .map(|(width, _)| *width)
    }
}

/// All measurements for one glyph.
#[derive(Debug, Clone, Default)]
pub struct GlyphAnalysis {
    /// Widths of vertical strokes.
    pub stems: Measurements,
    /// Heights of horizontal strokes.
    pub bars: Measurements,
    /// Open space between two stems.
    pub horizontal_counters: Measurements,
    /// Open space between two bars.
    pub vertical_counters: Measurements,
    pub diagonal_stems: Measurements,
}

impl GlyphAnalysis {
    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
            && self.bars.is_empty()
            && self.horizontal_counters.is_empty()
            && self.vertical_counters.is_empty()
            && self.diagonal_stems.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stroke {
    /// Sides are vertical, width runs along x.
    Vertical,
    /// Sides are horizontal, width runs along y.
    Horizontal,
}

impl Stroke {
    fn edge(self, pc: &PointContext, tolerance: &ToleranceConfig) -> Option<Line> {
        match self {
            Self::Vertical => pc.stem_edge(tolerance.vertical),
            Self::Horizontal => pc.bar_edge(tolerance.horizontal),
        }
    }

    fn is_round(self, pc: &PointContext, tolerance: &ToleranceConfig) -> bool {
        match self {
            Self::Vertical => pc.is_round_stem_extreme(tolerance.vertical),
            Self::Horizontal => pc.is_round_bar_extreme(tolerance.horizontal),
        }
    }

    fn in_window(self, a: &PointContext, b: &PointContext) -> bool {
        match self {
            Self::Vertical => a.in_vertical_window(b),
            Self::Horizontal => a.in_horizontal_window(b),
        }
    }

    fn across(self, p: kurbo::Point) -> f64 {
        match self {
            Self::Vertical => p.x,
            Self::Horizontal => p.y,
        }
    }

    fn along(self, p: kurbo::Point) -> f64 {
        match self {
            Self::Vertical => p.y,
            Self::Horizontal => p.x,
        }
    }

    fn point(self, across: f64, along: f64) -> kurbo::Point {
        match self {
            Self::Vertical => kurbo::Point::new(across, along),
            Self::Horizontal => kurbo::Point::new(along, across),
        }
    }
}

struct Side<'a> {
    pc: &'a PointContext,
    edge: Line,
    round: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Filled,
    Empty,
    Mixed,
}

/// Measures stems, bars and counters of glyph outlines.
#[derive(Debug, Clone, Default)]
pub struct GlyphAnalyzer {
    tolerance: ToleranceConfig,
}

impl GlyphAnalyzer {
    pub fn new(tolerance: ToleranceConfig) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> &ToleranceConfig {
        &self.tolerance
    }

    /// Analyze a glyph against its own contours.
    pub fn analyze(&self, glyph: &Glyph) -> GlyphAnalysis {
        self.analyze_with_outline(glyph, &glyph.to_bez_path())
    }

    /// Analyze a glyph, deciding ink versus open space against `outline`
    /// (for example the glyph with its components flattened in).
    pub fn analyze_with_outline(&self, glyph: &Glyph, outline: &BezPath) -> GlyphAnalysis {
        let contexts = glyph.contexts();
        let mut analysis = GlyphAnalysis::default();

        self.measure(
            contexts,
            outline,
            Stroke::Vertical,
            &mut analysis.stems,
            &mut analysis.horizontal_counters,
        );
        self.measure(
            contexts,
            outline,
            Stroke::Horizontal,
            &mut analysis.bars,
            &mut analysis.vertical_counters,
        );
        self.measure_diagonals(contexts, outline, &mut analysis.diagonal_stems);

        debug!(
            "{}: stems {:?}, bars {:?}, counters {:?}/{:?}, diagonals {:?}",
            glyph.name(),
            analysis.stems.widths().collect::<Vec<_>>(),
            analysis.bars.widths().collect::<Vec<_>>(),
            analysis.horizontal_counters.widths().collect::<Vec<_>>(),
            analysis.vertical_counters.widths().collect::<Vec<_>>(),
            analysis.diagonal_stems.widths().collect::<Vec<_>>(),
        );
        analysis
    }

    fn measure(
        &self,
        contexts: &[PointContext],
        outline: &BezPath,
        stroke: Stroke,
        strokes: &mut Measurements,
        counters: &mut Measurements,
    ) {
        let sides: Vec<Side> = contexts
            .iter()
            .filter_map(|pc| {
                stroke.edge(pc, &self.tolerance).map(|edge| Side {
                    pc,
                    edge,
                    round: stroke.is_round(pc, &self.tolerance),
                })
            })
            .collect();

        for (i, a) in sides.iter().enumerate() {
            for b in &sides[i + 1..] {
                if !stroke.in_window(a.pc, b.pc) {
                    continue;
                }
                let Some((lo, hi)) = shared_window(stroke, a.edge, b.edge) else {
                    continue;
                };
                let from = stroke.across(a.pc.p().to_kurbo());
                let to = stroke.across(b.pc.p().to_kurbo());
                let width = (to - from).abs();
                if width < MIN_SPAN {
                    continue;
                }

                let levels = sample_levels(stroke, a, b, lo, hi);
                match classify(outline, stroke, from, to, &levels) {
                    // A stroke is longer than it is thick; otherwise this is
                    // the stroke measured lengthwise.
                    Span::Filled if hi - lo >= width => strokes.insert(width, a.pc, b.pc),
                    Span::Empty => counters.insert(width, a.pc, b.pc),
                    _ => {}
                }
            }
        }
    }

    fn measure_diagonals(
        &self,
        contexts: &[PointContext],
        outline: &BezPath,
        diagonals: &mut Measurements,
    ) {
        let tolerance = &self.tolerance;
        let sides: Vec<&PointContext> = contexts
            .iter()
            .filter(|pc| {
                pc.p().on_curve
                    && pc.next().on_curve
                    && !pc.is_next_vertical(tolerance.vertical)
                    && !pc.is_next_horizontal(tolerance.horizontal)
            })
            .collect();

        for (i, a) in sides.iter().enumerate() {
            for b in &sides[i + 1..] {
                if !a.is_parallel(b, tolerance.parallel) {
                    continue;
                }
                let Some(line) = a.get_projected_window_line(b) else {
                    continue;
                };
                let width = line.p0.distance(line.p1);
                if width < MIN_SPAN {
                    continue;
                }
                let shorter = segment_length(a.line()).min(segment_length(b.line()));
                if shorter < width {
                    continue;
                }
                let filled = ACROSS_SAMPLES
                    .iter()
                    .all(|&t| is_filled(outline, line.p0.lerp(line.p1, t)));
                if filled {
                    diagonals.insert(width, a, b);
                }
            }
        }
    }
}

fn segment_length(line: Line) -> f64 {
    line.p0.distance(line.p1)
}

fn range(stroke: Stroke, edge: Line) -> (f64, f64) {
    let (a, b) = (stroke.along(edge.p0), stroke.along(edge.p1));
    (a.min(b), a.max(b))
}

/// Overlap of the two sides along the stroke direction.
fn shared_window(stroke: Stroke, a: Line, b: Line) -> Option<(f64, f64)> {
    let (a_lo, a_hi) = range(stroke, a);
    let (b_lo, b_hi) = range(stroke, b);
    let (lo, hi) = (a_lo.max(b_lo), a_hi.min(b_hi));
    (lo < hi).then_some((lo, hi))
}

/// Where along the stroke to test the fill. Round sides are only trustworthy at
/// the extreme itself; the curve falls away from the handles elsewhere.
fn sample_levels(stroke: Stroke, a: &Side, b: &Side, lo: f64, hi: f64) -> Vec<f64> {
    let round: Vec<f64> = [a, b]
        .iter()
        .filter(|side| side.round)
        .map(|side| stroke.along(side.pc.p().to_kurbo()))
        .collect();
    if !round.is_empty() {
        let level = round.iter().sum::<f64>() / round.len() as f64;
        return vec![level.clamp(lo, hi)];
    }
    ALONG_SAMPLES.iter().map(|t| lo + (hi - lo) * t).collect()
}

fn classify(outline: &BezPath, stroke: Stroke, from: f64, to: f64, levels: &[f64]) -> Span {
    let mut filled = 0;
    let mut empty = 0;
    for &level in levels {
        for t in ACROSS_SAMPLES {
            let point = stroke.point(from + (to - from) * t, level);
            if is_filled(outline, point) {
                filled += 1;
            } else {
                empty += 1;
            }
        }
    }
    match (filled, empty) {
        (_, 0) => Span::Filled,
        (0, _) => Span::Empty,
        _ => Span::Mixed,
    }
}

/// Non-zero winding fill test.
fn is_filled(outline: &BezPath, point: kurbo::Point) -> bool {
    outline.winding(point) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::Glyph;

    /// A sans-serif H: stems of `stem` units, crossbar 80 units high.
    fn letter_h(stem: f64) -> Glyph {
        let width = 600.0;
        Glyph::from_contours(
            "H",
            [vec![
                (0.0, 0.0, true),
                (0.0, 700.0, true),
                (stem, 700.0, true),
                (stem, 380.0, true),
                (width - stem, 380.0, true),
                (width - stem, 700.0, true),
                (width, 700.0, true),
                (width, 0.0, true),
                (width - stem, 0.0, true),
                (width - stem, 300.0, true),
                (stem, 300.0, true),
                (stem, 0.0, true),
            ]],
        )
        .with_advance_width(width + 100.0)
    }

    /// A quadratic O: outer 0..700 x 0..700, inner 100..600 x 100..600.
    fn letter_o() -> Glyph {
        Glyph::from_contours(
            "O",
            [
                vec![
                    (0.0, 350.0, true),
                    (0.0, 700.0, false),
                    (350.0, 700.0, true),
                    (700.0, 700.0, false),
                    (700.0, 350.0, true),
                    (700.0, 0.0, false),
                    (350.0, 0.0, true),
                    (0.0, 0.0, false),
                ],
                vec![
                    (100.0, 350.0, true),
                    (100.0, 100.0, false),
                    (350.0, 100.0, true),
                    (600.0, 100.0, false),
                    (600.0, 350.0, true),
                    (600.0, 600.0, false),
                    (350.0, 600.0, true),
                    (100.0, 600.0, false),
                ],
            ],
        )
    }

    #[test]
    fn h_has_single_stem_width() {
        for stem in [80.0, 120.0] {
            let analysis = GlyphAnalyzer::default().analyze(&letter_h(stem));
            assert_eq!(analysis.stems.widths().collect::<Vec<_>>(), vec![stem as i64]);
        }
    }

    #[test]
    fn h_counter_and_bar() {
        let analysis = GlyphAnalyzer::default().analyze(&letter_h(80.0));
        assert_eq!(analysis.horizontal_counters.widths().collect::<Vec<_>>(), vec![440]);
        assert_eq!(analysis.bars.widths().collect::<Vec<_>>(), vec![80]);
        assert!(analysis.vertical_counters.is_empty());
        assert!(analysis.diagonal_stems.is_empty());
    }

    #[test]
    fn o_has_round_stems_and_bars() {
        let analysis = GlyphAnalyzer::default().analyze(&letter_o());
        assert_eq!(analysis.stems.widths().collect::<Vec<_>>(), vec![100]);
        assert_eq!(analysis.bars.widths().collect::<Vec<_>>(), vec![100]);
        assert_eq!(analysis.horizontal_counters.widths().collect::<Vec<_>>(), vec![500]);
        assert_eq!(analysis.vertical_counters.widths().collect::<Vec<_>>(), vec![500]);
    }

    #[test]
    fn diagonal_stroke_width() {
        // A slanted parallelogram stroke, 100 units thick horizontally.
        let glyph = Glyph::from_contours(
            "slash",
            [vec![(0.0, 0.0, true), (400.0, 700.0, true), (500.0, 700.0, true), (100.0, 0.0, true)]],
        );
        let analysis = GlyphAnalyzer::default().analyze(&glyph);
        let expected = (100.0 * 700.0 / (400.0f64.hypot(700.0))).round() as i64;
        assert_eq!(analysis.diagonal_stems.widths().collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn off_grid_stems_need_alignment_slack() {
        // The H with every vertical side leaning by 0.4 units, as after interpolation.
        let glyph = Glyph::from_contours(
            "H",
            [vec![
                (0.0, 0.0, true),
                (0.4, 700.0, true),
                (80.4, 700.0, true),
                (80.0, 380.0, true),
                (520.0, 380.0, true),
                (520.4, 700.0, true),
                (600.4, 700.0, true),
                (600.0, 0.0, true),
                (520.0, 0.0, true),
                (520.4, 300.0, true),
                (80.4, 300.0, true),
                (80.0, 0.0, true),
            ]],
        );

        let exact = GlyphAnalyzer::default().analyze(&glyph);
        assert!(exact.stems.is_empty());
        assert!(exact.horizontal_counters.is_empty());

        let lenient = GlyphAnalyzer::new(ToleranceConfig::uniform(1.0)).analyze(&glyph);
        assert_eq!(lenient.stems.widths().collect::<Vec<_>>(), vec![80]);
        assert_eq!(lenient.horizontal_counters.widths().collect::<Vec<_>>(), vec![440]);
    }

    #[test]
    fn diagonal_sides_use_parallel_tolerance() {
        // Sides at about 60.3 and 64.4 degrees.
        let glyph = Glyph::from_contours(
            "slash",
            [vec![(0.0, 0.0, true), (400.0, 700.0, true), (500.0, 700.0, true), (164.0, 0.0, true)]],
        );
        assert!(GlyphAnalyzer::default().analyze(&glyph).diagonal_stems.is_empty());

        let wide = GlyphAnalyzer::new(ToleranceConfig::default().parallel(5.0)).analyze(&glyph);
        let expected = (164.0 * 700.0 / 400.0f64.hypot(700.0)).round() as i64;
        assert_eq!(wide.diagonal_stems.widths().collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn empty_glyph_yields_no_data() {
        let analysis = GlyphAnalyzer::default().analyze(&Glyph::new("space"));
        assert!(analysis.is_empty());
        assert_eq!(analysis.stems.min(), None);
    }

    #[test]
    fn most_frequent_prefers_narrower_on_tie() {
        let glyph = letter_h(80.0);
        let pcs = glyph.contexts();
        let mut m = Measurements::default();
        m.insert(90.0, &pcs[0], &pcs[1]);
        m.insert(80.2, &pcs[0], &pcs[2]);
        m.insert(79.6, &pcs[1], &pcs[2]);
        m.insert(90.4, &pcs[1], &pcs[3]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.most_frequent(), Some(80));
        assert_eq!(m.min(), Some(80));
        assert_eq!(m.max(), Some(90));
        assert_eq!(m.get(80).map(<[_]>::len), Some(2));
    }
}
