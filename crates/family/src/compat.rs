//! Interpolation compatibility across masters.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use font_outline::{Glyph, PointType};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use thiserror::Error;

use crate::font::Font;

/// One reason a glyph cannot be interpolated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Issue {
    #[error("missing in {}", font.display())]
    MissingGlyph { font: PathBuf },

    #[error("{}: {actual} contours, expected {expected}", font.display())]
    ContourCount { font: PathBuf, expected: usize, actual: usize },

    #[error("{}: contour {contour} has {actual} points, expected {expected}", font.display())]
    PointCount { font: PathBuf, contour: usize, expected: usize, actual: usize },

    #[error("{}: contour {contour} is {actual}, expected {expected}", font.display())]
    ContourDirection {
        font: PathBuf,
        contour: usize,
        expected: font_outline::Direction,
        actual: font_outline::Direction,
    },

    #[error("{}: contour {contour} point {point} is {actual}, expected {expected}", font.display())]
    PointType {
        font: PathBuf,
        contour: usize,
        point: usize,
        expected: PointType,
        actual: PointType,
    },

    #[error("{}: {actual} components, expected {expected}", font.display())]
    ComponentCount { font: PathBuf, expected: usize, actual: usize },

    #[error("{}: component {index} is '{actual}', expected '{expected}'", font.display())]
    ComponentBase { font: PathBuf, index: usize, expected: String, actual: String },

    #[error("{}: component base '{base}' does-not-exist", font.display())]
    MissingComponentBase { font: PathBuf, base: String },

    #[error("{}: kerning pair {left}/{right} names a glyph that does-not-exist", font.display())]
    MissingKerningGlyph { font: PathBuf, left: String, right: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    MissingGlyph,
    ContourCount,
    PointCount,
    ContourDirection,
    PointType,
    ComponentCount,
    ComponentBase,
    MissingComponentBase,
    MissingKerningGlyph,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingGlyph => "missing glyph",
            Self::ContourCount => "contour count",
            Self::PointCount => "point count",
            Self::ContourDirection => "contour direction",
            Self::PointType => "point type",
            Self::ComponentCount => "component count",
            Self::ComponentBase => "component base",
            Self::MissingComponentBase => "missing component base",
            Self::MissingKerningGlyph => "missing kerning glyph",
        })
    }
}

impl Issue {
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::MissingGlyph { .. } => IssueKind::MissingGlyph,
            Self::ContourCount { .. } => IssueKind::ContourCount,
            Self::PointCount { .. } => IssueKind::PointCount,
            Self::ContourDirection { .. } => IssueKind::ContourDirection,
            Self::PointType { .. } => IssueKind::PointType,
            Self::ComponentCount { .. } => IssueKind::ComponentCount,
            Self::ComponentBase { .. } => IssueKind::ComponentBase,
            Self::MissingComponentBase { .. } => IssueKind::MissingComponentBase,
            Self::MissingKerningGlyph { .. } => IssueKind::MissingKerningGlyph,
        }
    }

    /// The master the issue was found in.
    pub fn font(&self) -> &Path {
        match self {
            Self::MissingGlyph { font }
            | Self::ContourCount { font, .. }
            | Self::PointCount { font, .. }
            | Self::ContourDirection { font, .. }
            | Self::PointType { font, .. }
            | Self::ComponentCount { font, .. }
            | Self::ComponentBase { font, .. }
            | Self::MissingComponentBase { font, .. }
            | Self::MissingKerningGlyph { font, .. } => font,
        }
    }

    /// Report line: the font for a missing glyph, the full message otherwise.
    pub fn detail(&self) -> String {
        match self {
            Self::MissingGlyph { font } => font.display().to_string(),
            other => other.to_string(),
        }
    }
}

/// Issues per glyph name. Empty when every master is compatible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatReport {
    glyphs: IndexMap<String, Vec<Issue>>,
}

impl CompatReport {
    pub fn is_compatible(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Number of glyphs with issues.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, glyph: &str) -> Option<&[Issue]> {
        self.glyphs.get(glyph).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Issue])> {
        self.glyphs.iter().map(|(name, issues)| (name.as_str(), issues.as_slice()))
    }

    /// Issues of one glyph grouped by kind, as report lines.
    pub fn by_kind(&self, glyph: &str) -> IndexMap<IssueKind, Vec<String>> {
        let mut grouped: IndexMap<IssueKind, Vec<String>> = IndexMap::new();
        for issue in self.get(glyph).unwrap_or_default() {
            grouped.entry(issue.kind()).or_default().push(issue.detail());
        }
        grouped
    }

    pub fn issue_count(&self) -> usize {
        self.glyphs.values().map(Vec::len).sum()
    }

    fn push(&mut self, glyph: &str, issue: Issue) {
        self.glyphs.entry(glyph.to_string()).or_default().push(issue);
    }
}

/// Compare every glyph of every master against the reference master.
///
/// A glyph missing from `reference` is compared against the first master that
/// has it.
pub fn check_interpolation(fonts: &[&Font], reference: Option<&Font>) -> CompatReport {
    let mut report = CompatReport::default();
    let Some(&first) = fonts.first() else {
        return report;
    };
    let reference = reference.unwrap_or(first);

    let names: IndexSet<&str> = fonts.iter().flat_map(|font| font.glyph_names()).collect();
    info!("checking {} glyphs across {} masters", names.len(), fonts.len());

    for &name in &names {
        let Some((reference_font, expected)) = std::iter::once(reference)
            .chain(fonts.iter().copied())
            .find_map(|font| font.glyph(name).map(|glyph| (font, glyph)))
        else {
            continue;
        };
        for &font in fonts {
            if font.path() == reference_font.path() {
                continue;
            }
            match font.glyph(name) {
                Some(glyph) => compare_glyph(&mut report, font.path(), expected, glyph),
                None => report.push(name, Issue::MissingGlyph { font: font.path().to_path_buf() }),
            }
        }
    }

    for &font in fonts {
        check_component_bases(&mut report, font);
        check_kerning(&mut report, font);
    }

    debug!("{} issues in {} glyphs", report.issue_count(), report.len());
    report
}

fn compare_glyph(report: &mut CompatReport, font: &Path, expected: &Glyph, actual: &Glyph) {
    let name = expected.name();
    let font_path = || font.to_path_buf();

    let (expected_contours, actual_contours) = (expected.contours(), actual.contours());
    if expected_contours.len() != actual_contours.len() {
        report.push(
            name,
            Issue::ContourCount {
                font: font_path(),
                expected: expected_contours.len(),
                actual: actual_contours.len(),
            },
        );
    } else {
        for (want, have) in expected_contours.iter().zip(actual_contours) {
            if want.len() != have.len() {
                report.push(
                    name,
                    Issue::PointCount {
                        font: font_path(),
                        contour: want.index,
                        expected: want.len(),
                        actual: have.len(),
                    },
                );
                continue;
            }
            if want.direction() != have.direction() {
                report.push(
                    name,
                    Issue::ContourDirection {
                        font: font_path(),
                        contour: want.index,
                        expected: want.direction(),
                        actual: have.direction(),
                    },
                );
            }
            for (point, (a, b)) in want.points.iter().zip(&have.points).enumerate() {
                if a.on_curve != b.on_curve {
                    report.push(
                        name,
                        Issue::PointType {
                            font: font_path(),
                            contour: want.index,
                            point,
                            expected: PointType::of(a),
                            actual: PointType::of(b),
                        },
                    );
                }
            }
        }
    }

    let (expected_components, actual_components) = (expected.components(), actual.components());
    if expected_components.len() != actual_components.len() {
        report.push(
            name,
            Issue::ComponentCount {
                font: font_path(),
                expected: expected_components.len(),
                actual: actual_components.len(),
            },
        );
        return;
    }
    for (index, (want, have)) in expected_components.iter().zip(actual_components).enumerate() {
        if want.base != have.base {
            report.push(
                name,
                Issue::ComponentBase {
                    font: font_path(),
                    index,
                    expected: want.base.clone(),
                    actual: have.base.clone(),
                },
            );
        }
    }
}

fn check_component_bases(report: &mut CompatReport, font: &Font) {
    for glyph in font.glyphs() {
        for component in glyph.components() {
            if !font.contains(&component.base) {
                report.push(
                    glyph.name(),
                    Issue::MissingComponentBase {
                        font: font.path().to_path_buf(),
                        base: component.base.clone(),
                    },
                );
            }
        }
    }
}

/// Each missing side of a pair is reported under its own glyph name.
fn check_kerning(report: &mut CompatReport, font: &Font) {
    for pair in font.kerning() {
        for side in [&pair.left, &pair.right] {
            if !font.contains(side) {
                report.push(
                    side,
                    Issue::MissingKerningGlyph {
                        font: font.path().to_path_buf(),
                        left: pair.left.clone(),
                        right: pair.right.clone(),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use font_outline::Component;
    use kurbo::Vec2;

    use super::*;
    use crate::font::KerningPair;

    fn square(name: &str) -> Glyph {
        Glyph::from_contours(
            name,
            [vec![(0.0, 0.0, true), (0.0, 100.0, true), (100.0, 100.0, true), (100.0, 0.0, true)]],
        )
    }

    fn master(path: &str) -> Font {
        Font::new(path, 1000).with_glyph(square("a")).with_glyph(square("b"))
    }

    #[test]
    fn identical_masters_are_compatible() {
        let (a, b) = (master("a.ttf"), master("b.ttf"));
        let report = check_interpolation(&[&a, &b], None);
        assert!(report.is_compatible());
    }

    #[test]
    fn missing_glyph_reported_per_font() {
        let a = master("a.ttf").with_glyph(square("c"));
        let b = master("b.ttf");
        let report = check_interpolation(&[&a, &b], Some(&a));
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get("c").unwrap(),
            [Issue::MissingGlyph { font: PathBuf::from("b.ttf") }]
        );
        assert_eq!(report.by_kind("c")[&IssueKind::MissingGlyph], ["b.ttf"]);
    }

    #[test]
    fn glyph_missing_from_reference_uses_next_master() {
        let a = master("a.ttf");
        let b = master("b.ttf").with_glyph(square("c"));
        let c = master("c.ttf").with_glyph(square("c"));
        let report = check_interpolation(&[&a, &b, &c], Some(&a));
        assert_eq!(
            report.get("c").unwrap(),
            [Issue::MissingGlyph { font: PathBuf::from("a.ttf") }]
        );
    }

    #[test]
    fn reversed_contour_is_reported() {
        let a = master("a.ttf");
        let reversed = Glyph::from_contours(
            "a",
            [vec![(0.0, 0.0, true), (100.0, 0.0, true), (100.0, 100.0, true), (0.0, 100.0, true)]],
        );
        let b = master("b.ttf").with_glyph(reversed);
        let report = check_interpolation(&[&a, &b], None);
        let issues = report.get("a").unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind(), IssueKind::ContourDirection);
    }

    #[test]
    fn point_count_mismatch() {
        let a = master("a.ttf");
        let five = Glyph::from_contours(
            "b",
            [vec![
                (0.0, 0.0, true),
                (0.0, 100.0, true),
                (50.0, 120.0, true),
                (100.0, 100.0, true),
                (100.0, 0.0, true),
            ]],
        );
        let b = master("b.ttf").with_glyph(five);
        let report = check_interpolation(&[&a, &b], None);
        assert_eq!(
            report.get("b").unwrap(),
            [Issue::PointCount {
                font: PathBuf::from("b.ttf"),
                contour: 0,
                expected: 4,
                actual: 5
            }]
        );
    }

    #[test]
    fn component_mismatches_and_missing_bases() {
        let with = |path: &str, bases: &[&str]| {
            let components = bases.iter().map(|b| Component::new(*b, Vec2::ZERO)).collect();
            master(path).with_glyph(Glyph::new("ab").with_components(components))
        };
        let a = with("a.ttf", &["a", "b"]);
        let b = with("b.ttf", &["a", "zz"]);
        let c = with("c.ttf", &["a"]);
        let report = check_interpolation(&[&a, &b, &c], Some(&a));
        let kinds: Vec<_> = report.get("ab").unwrap().iter().map(Issue::kind).collect();
        assert_eq!(
            kinds,
            [IssueKind::ComponentBase, IssueKind::ComponentCount, IssueKind::MissingComponentBase]
        );
        assert!(report.get("ab").unwrap()[2].to_string().contains("does-not-exist"));
    }

    #[test]
    fn kerning_sides_reported_independently() {
        let mut a = master("a.ttf");
        a.set_kerning(vec![KerningPair::new("x", "y", -10), KerningPair::new("a", "b", -5)]);
        let report = check_interpolation(&[&a], None);
        assert_eq!(report.len(), 2);
        assert_eq!(report.get("x").unwrap()[0].kind(), IssueKind::MissingKerningGlyph);
        assert_eq!(report.get("y").unwrap()[0].kind(), IssueKind::MissingKerningGlyph);
    }
}
