//! End-to-end tests over TrueType masters written to a temporary directory.

mod common;

use common::{TestGlyph, letter_h, letter_o, write_master};
use font_family::{
    CACHE_DIR_NAME, Error, Family, FamilyOptions, Font, Issue, IssueKind, ParametricAxis,
    PreVarFamily, Style, TiePolicy,
};
use font_outline::{GlyphAnalyzer, PointType};

fn notdef() -> TestGlyph {
    TestGlyph::empty(".notdef")
}

#[test]
fn loads_outlines_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_master(dir.path(), "Bold.ttf", 700, 3, &[notdef(), letter_h(80), letter_o()]);

    let font = Font::load(&path).unwrap();
    assert_eq!(font.path(), path);
    assert_eq!(font.units_per_em(), 1000);
    assert_eq!(font.declared_style(), Style::new(700, 3));
    assert_eq!(font.glyph_names().collect::<Vec<_>>(), [".notdef", "H", "O"]);

    let h = font.glyph("H").unwrap();
    assert_eq!(h.num_points(), 12);
    assert_eq!(h.advance_width(), 700.0);
    let o = font.glyph("O").unwrap();
    assert_eq!(o.contour_count(), 2);
    assert_eq!(o.on_curve_flags()[..2], [true, false]);
    assert!(font.glyph(".notdef").unwrap().is_empty());
}

#[test]
fn added_contour_is_the_only_issue() {
    let dir = tempfile::tempdir().unwrap();
    let mut h_with_dot = letter_h(80);
    h_with_dot.contours.push(vec![(250, 500, true), (250, 550, true), (300, 550, true), (300, 500, true)]);

    let regular = write_master(dir.path(), "Regular.ttf", 400, 5, &[notdef(), letter_h(80), letter_o()]);
    let bold = write_master(dir.path(), "Bold.ttf", 700, 5, &[notdef(), h_with_dot, letter_o()]);

    let family = Family::load(&[&regular, &bold]).unwrap();
    let report = family.check_interpolation(None);

    assert_eq!(report.len(), 1);
    let issues = report.get("H").unwrap();
    assert_eq!(
        issues,
        [Issue::ContourCount { font: bold.clone(), expected: 1, actual: 2 }]
    );
    assert_eq!(report.by_kind("H").keys().copied().collect::<Vec<_>>(), [IssueKind::ContourCount]);
}

#[test]
fn flipped_point_type_is_reported_at_its_index() {
    let dir = tempfile::tempdir().unwrap();
    let mut flipped = letter_o();
    flipped.contours[1][3].2 = true;

    let regular = write_master(dir.path(), "Regular.ttf", 400, 5, &[notdef(), letter_o()]);
    let other = write_master(dir.path(), "Other.ttf", 400, 5, &[notdef(), flipped]);

    let family = Family::load(&[&regular, &other]).unwrap();
    let report = family.check_interpolation(Some(&regular));

    assert_eq!(
        report.get("O").unwrap(),
        [Issue::PointType {
            font: other.clone(),
            contour: 1,
            point: 3,
            expected: PointType::OffCurve,
            actual: PointType::OnCurve,
        }]
    );
    let detail = &report.by_kind("O")[&IssueKind::PointType][0];
    assert!(detail.contains("contour 1 point 3"), "{detail}");
    assert_eq!(report.issue_count(), 1);
}

#[test]
fn stem_width_masters_are_compatible() {
    let dir = tempfile::tempdir().unwrap();
    let light = write_master(dir.path(), "Light.ttf", 300, 5, &[notdef(), letter_h(80)]);
    let bold = write_master(dir.path(), "Bold.ttf", 700, 5, &[notdef(), letter_h(120)]);

    let family = Family::load(&[&light, &bold]).unwrap();
    assert!(family.check_interpolation(None).is_compatible());

    let analyzer = GlyphAnalyzer::default();
    for (path, stem) in [(&light, 80), (&bold, 120)] {
        let h = family.get(path).unwrap().glyph("H").unwrap();
        assert_eq!(analyzer.analyze(h).stems.widths().collect::<Vec<_>>(), [stem]);
    }
}

#[test]
fn missing_glyph_names_the_master() {
    let dir = tempfile::tempdir().unwrap();
    let full = write_master(dir.path(), "Full.ttf", 400, 5, &[notdef(), letter_h(80), letter_o()]);
    let partial = write_master(dir.path(), "Partial.ttf", 700, 5, &[notdef(), letter_h(120)]);

    let mut family = PreVarFamily::load(&[&full, &partial], FamilyOptions::default()).unwrap();
    let report = family.check_interpolation();
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.by_kind("O")[&IssueKind::MissingGlyph],
        [partial.display().to_string()]
    );
}

#[test]
fn closest_weight_over_loaded_masters() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = [100, 300, 500, 700]
        .into_iter()
        .map(|weight| {
            write_master(dir.path(), &format!("w{weight}.ttf"), weight, 5, &[notdef(), letter_h(80)])
        })
        .collect();

    let family = Family::load(&paths).unwrap();
    let closest: Vec<u16> = family.closest_weight(400).iter().map(|f| f.weight_class()).collect();
    assert_eq!(closest, [300, 500]);

    let mut strict = PreVarFamily::new(family.clone(), FamilyOptions::default());
    assert!(matches!(strict.default_font(), Err(Error::AmbiguousDefault { candidates }) if candidates.len() == 2));

    let mut lenient =
        PreVarFamily::new(family, FamilyOptions::new().tie_policy(TiePolicy::FirstFound));
    let default = lenient.default_font().unwrap();
    assert_eq!(default.path(), paths[1]);
    assert_eq!(default.style(), Style::new(400, 5));
}

#[test]
fn xtra_axis_writes_two_new_masters() {
    let dir = tempfile::tempdir().unwrap();
    let regular = write_master(dir.path(), "Regular.ttf", 400, 5, &[notdef(), letter_h(80)]);
    let bold = write_master(dir.path(), "Bold.ttf", 700, 5, &[notdef(), letter_h(120)]);

    let mut family = PreVarFamily::load(&[&regular, &bold], FamilyOptions::default()).unwrap();
    let masters = family.axis(ParametricAxis::Xtra).unwrap();

    assert_eq!(masters.min.width_class(), 1);
    assert_eq!(masters.max.width_class(), 9);
    for master in [&masters.min, &masters.max] {
        assert_ne!(master.path(), regular);
        assert!(master.path().starts_with(dir.path().join(CACHE_DIR_NAME)));
        assert_eq!(Font::load(master.path()).unwrap().weight_class(), 400);
    }
    assert_ne!(masters.min.path(), masters.max.path());

    let narrow = masters.min.glyph("H").unwrap();
    assert_eq!(GlyphAnalyzer::default().analyze(narrow).stems.widths().collect::<Vec<_>>(), [80]);
    assert_eq!(narrow.advance_width(), 480.0);

    // The origin on disk is untouched.
    let origin = Font::load(&regular).unwrap();
    assert_eq!(origin.glyph("H").unwrap().advance_width(), 700.0);
    assert_eq!(origin.declared_style(), Style::new(400, 5));
    assert!(!dir.path().join("Regular-XTRA-min.ttf").exists());
}

#[test]
fn non_derivable_and_unknown_axes() {
    assert!(matches!("CATL".parse::<ParametricAxis>(), Ok(ParametricAxis::Catl)));
    assert!(matches!("ABCD".parse::<ParametricAxis>(), Err(Error::UnsupportedAxis(tag)) if tag == "ABCD"));

    let dir = tempfile::tempdir().unwrap();
    let regular = write_master(dir.path(), "Regular.ttf", 400, 5, &[notdef(), letter_h(80)]);
    let mut family = PreVarFamily::load(&[regular], FamilyOptions::default()).unwrap();
    assert!(matches!(family.axis(ParametricAxis::Stnc), Err(Error::AxisNotDerivable(_))));
}
