//! Plain-text rendering of reports and measurements.

use std::fmt;

use font_family::{AxisMasters, CompatReport};
use font_outline::{GlyphAnalysis, Measurements};

/// Issues grouped by glyph, then by kind.
pub struct ReportView<'a>(pub &'a CompatReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (glyph, _) in self.0.iter() {
            writeln!(f, "{glyph}")?;
            for (kind, details) in self.0.by_kind(glyph) {
                writeln!(f, "  {kind}:")?;
                for detail in details {
                    writeln!(f, "    {detail}")?;
                }
            }
        }
        Ok(())
    }
}

pub struct AnalysisView<'a>(pub &'a GlyphAnalysis);

impl fmt::Display for AnalysisView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        let rows = [
            ("stems", &analysis.stems),
            ("bars", &analysis.bars),
            ("horizontal counters", &analysis.horizontal_counters),
            ("vertical counters", &analysis.vertical_counters),
            ("diagonal stems", &analysis.diagonal_stems),
        ];
        for (label, measurements) in rows {
            writeln!(f, "{label:<20} {}", widths(measurements))?;
        }
        Ok(())
    }
}

pub struct MastersView<'a>(pub &'a AxisMasters);

impl fmt::Display for MastersView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masters = self.0;
        writeln!(f, "{} from '{}'", masters.axis, masters.origin.glyph)?;
        for (label, font, value) in [
            ("min", &masters.min, masters.values.min),
            ("max", &masters.max, masters.values.max),
        ] {
            writeln!(
                f,
                "  {label}: {} (weight {}, width {}, {value:.0} units)",
                font.path().display(),
                font.weight_class(),
                font.width_class()
            )?;
        }
        Ok(())
    }
}

/// `80 x2, 120` style summary; `-` when nothing was measured.
fn widths(measurements: &Measurements) -> String {
    if measurements.is_empty() {
        return "-".to_string();
    }
    measurements
        .iter()
        .map(|(width, pairs)| match pairs.len() {
            1 => width.to_string(),
            n => format!("{width} x{n}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
