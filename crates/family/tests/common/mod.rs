//! Minimal TrueType masters built directly with write-fonts.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use font_types::{FWord, Fixed, LongDateTime, Tag, UfWord};
use read_fonts::tables::glyf::CurvePoint;
use write_fonts::{
    FontBuilder,
    tables::{
        glyf::{Bbox, Contour, GlyfLocaBuilder, Glyph, SimpleGlyph},
        head::{Flags, Head, MacStyle},
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        maxp::Maxp,
        os2::{Os2, SelectionFlags},
        post::Post,
    },
};

pub type Outline = Vec<Vec<(i16, i16, bool)>>;

#[derive(Debug, Clone)]
pub struct TestGlyph {
    pub name: &'static str,
    pub advance: u16,
    pub contours: Outline,
}

impl TestGlyph {
    pub fn new(name: &'static str, advance: u16, contours: Outline) -> Self {
        Self { name, advance, contours }
    }

    pub fn empty(name: &'static str) -> Self {
        Self::new(name, 0, Vec::new())
    }

    fn bbox(&self) -> Option<Bbox> {
        let mut points = self.contours.iter().flatten();
        let &(x, y, _) = points.next()?;
        let mut bbox = Bbox { x_min: x, y_min: y, x_max: x, y_max: y };
        for &(x, y, _) in points {
            bbox.x_min = bbox.x_min.min(x);
            bbox.y_min = bbox.y_min.min(y);
            bbox.x_max = bbox.x_max.max(x);
            bbox.y_max = bbox.y_max.max(y);
        }
        Some(bbox)
    }
}

/// Capital H, 700 units tall, drawn as one contour with the given stem width.
pub fn letter_h(stem: i16) -> TestGlyph {
    let (w, top) = (600, 700);
    TestGlyph::new(
        "H",
        700,
        vec![vec![
            (0, 0, true),
            (0, top, true),
            (stem, top, true),
            (stem, 380, true),
            (w - stem, 380, true),
            (w - stem, top, true),
            (w, top, true),
            (w, 0, true),
            (w - stem, 0, true),
            (w - stem, 300, true),
            (stem, 300, true),
            (stem, 0, true),
        ]],
    )
}

/// A quadratic O outline: on-curve extremes with off-curve corners.
pub fn letter_o() -> TestGlyph {
    TestGlyph::new(
        "O",
        600,
        vec![
            vec![
                (250, 0, true),
                (500, 0, false),
                (500, 350, true),
                (500, 700, false),
                (250, 700, true),
                (0, 700, false),
                (0, 350, true),
                (0, 0, false),
            ],
            vec![
                (250, 100, true),
                (100, 100, false),
                (100, 350, true),
                (100, 600, false),
                (250, 600, true),
                (400, 600, false),
                (400, 350, true),
                (400, 100, false),
            ],
        ],
    )
}

/// A TrueType binary holding `glyphs` in order, with the given OS/2 classes.
pub fn make_master(weight: u16, width: u16, glyphs: &[TestGlyph]) -> Vec<u8> {
    let units_per_em = 1000u16;

    let mut glyf_builder = GlyfLocaBuilder::new();
    let mut h_metrics = Vec::with_capacity(glyphs.len());
    let mut font_bbox: Option<Bbox> = None;
    for glyph in glyphs {
        let Some(bbox) = glyph.bbox() else {
            glyf_builder.add_glyph(&Glyph::Empty).unwrap();
            h_metrics.push(LongMetric { advance: glyph.advance, side_bearing: 0 });
            continue;
        };
        let contours = glyph
            .contours
            .iter()
            .map(|points| {
                points
                    .iter()
                    .map(|&(x, y, on_curve)| CurvePoint::new(x, y, on_curve))
                    .collect::<Vec<_>>()
            })
            .map(Contour::from)
            .collect();
        glyf_builder
            .add_glyph(&Glyph::Simple(SimpleGlyph { bbox, contours, instructions: vec![] }))
            .unwrap();
        h_metrics.push(LongMetric { advance: glyph.advance, side_bearing: bbox.x_min });
        font_bbox = Some(match font_bbox {
            None => bbox,
            Some(b) => Bbox {
                x_min: b.x_min.min(bbox.x_min),
                y_min: b.y_min.min(bbox.y_min),
                x_max: b.x_max.max(bbox.x_max),
                y_max: b.y_max.max(bbox.y_max),
            },
        });
    }
    let (glyf, loca, loca_format) = glyf_builder.build();
    let bbox = font_bbox.unwrap_or(Bbox { x_min: 0, y_min: 0, x_max: 0, y_max: 0 });
    let advance_max = glyphs.iter().map(|g| g.advance).max().unwrap_or(0);

    let head = Head {
        font_revision: Fixed::from_f64(1.0),
        checksum_adjustment: 0,
        magic_number: 0x5F0F3CF5,
        flags: Flags::empty(),
        units_per_em,
        created: LongDateTime::new(0),
        modified: LongDateTime::new(0),
        x_min: bbox.x_min,
        y_min: bbox.y_min,
        x_max: bbox.x_max,
        y_max: bbox.y_max,
        mac_style: MacStyle::empty(),
        lowest_rec_ppem: 8,
        font_direction_hint: 2,
        index_to_loc_format: loca_format as i16,
    };

    let hhea = Hhea {
        ascender: FWord::new(800),
        descender: FWord::new(-200),
        line_gap: FWord::new(0),
        advance_width_max: UfWord::new(advance_max),
        min_left_side_bearing: FWord::new(0),
        min_right_side_bearing: FWord::new(0),
        x_max_extent: FWord::new(bbox.x_max),
        caret_slope_rise: 1,
        caret_slope_run: 0,
        caret_offset: 0,
        number_of_h_metrics: glyphs.len() as u16,
    };

    let maxp = Maxp {
        num_glyphs: glyphs.len() as u16,
        max_points: Some(0),
        max_contours: Some(0),
        max_composite_points: Some(0),
        max_composite_contours: Some(0),
        max_zones: Some(1),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(0),
        max_component_depth: Some(0),
    };

    let post = Post::new_v2(glyphs.iter().map(|g| g.name));

    let mut builder = FontBuilder::new();
    builder.add_table(&head).unwrap();
    builder.add_table(&hhea).unwrap();
    builder.add_table(&Hmtx::new(h_metrics, Vec::new())).unwrap();
    builder.add_table(&maxp).unwrap();
    builder.add_table(&make_os2(weight, width)).unwrap();
    builder.add_table(&post).unwrap();
    builder.add_table(&glyf).unwrap();
    builder.add_table(&loca).unwrap();
    builder.build()
}

/// Write a master into `dir` and return its path.
pub fn write_master(
    dir: &Path,
    file_name: &str,
    weight: u16,
    width: u16,
    glyphs: &[TestGlyph],
) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, make_master(weight, width, glyphs)).unwrap();
    path
}

fn make_os2(weight: u16, width: u16) -> Os2 {
    Os2 {
        x_avg_char_width: 500,
        us_weight_class: weight,
        us_width_class: width,
        fs_type: 0,
        y_subscript_x_size: 650,
        y_subscript_y_size: 600,
        y_subscript_x_offset: 0,
        y_subscript_y_offset: 75,
        y_superscript_x_size: 650,
        y_superscript_y_size: 600,
        y_superscript_x_offset: 0,
        y_superscript_y_offset: 350,
        y_strikeout_size: 50,
        y_strikeout_position: 300,
        s_family_class: 0,
        panose_10: [0; 10],
        ul_unicode_range_1: 0,
        ul_unicode_range_2: 0,
        ul_unicode_range_3: 0,
        ul_unicode_range_4: 0,
        ach_vend_id: Tag::new(b"NONE"),
        fs_selection: SelectionFlags::REGULAR,
        us_first_char_index: 0x20,
        us_last_char_index: 0x7E,
        s_typo_ascender: 800,
        s_typo_descender: -200,
        s_typo_line_gap: 0,
        us_win_ascent: 900,
        us_win_descent: 200,
        ul_code_page_range_1: Some(0),
        ul_code_page_range_2: Some(0),
        sx_height: Some(500),
        s_cap_height: Some(700),
        us_default_char: Some(0),
        us_break_char: Some(0x20),
        us_max_context: Some(0),
        us_lower_optical_point_size: None,
        us_upper_optical_point_size: None,
    }
}
