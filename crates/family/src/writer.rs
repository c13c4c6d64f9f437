//! Writing fonts back to TrueType.
//!
//! Outline-dependent tables are rebuilt from the in-memory glyphs; every other
//! table of the source font is copied through unchanged.

use std::{collections::HashMap, fs, path::Path};

use font_outline::Glyph;
use font_types::{F2Dot14, FWord, Fixed, GlyphId16, LongDateTime, UfWord};
use kurbo::Rect;
use log::{info, warn};
use read_fonts::{FontRef, TableProvider, tables::glyf::CurvePoint, types::Tag};
use write_fonts::{
    FontBuilder,
    from_obj::ToOwnedTable,
    tables::{
        glyf::{
            Anchor, Bbox, Component, ComponentFlags, CompositeGlyph, Contour, GlyfLocaBuilder,
            Glyph as WriteGlyph, SimpleGlyph, Transform,
        },
        head::{Flags, Head, MacStyle},
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        maxp::Maxp,
        os2::{Os2, SelectionFlags},
        post::Post,
    },
};

use crate::{
    error::{Error, Result},
    font::{Font, KERN, build_kern},
};

/// Tables regenerated from the in-memory font rather than copied.
const REBUILT: [Tag; 9] = [
    Tag::new(b"glyf"),
    Tag::new(b"loca"),
    Tag::new(b"head"),
    Tag::new(b"hhea"),
    Tag::new(b"hmtx"),
    Tag::new(b"maxp"),
    Tag::new(b"OS/2"),
    Tag::new(b"post"),
    KERN,
];

/// Per-glyph horizontal extents gathered while writing `glyf`.
#[derive(Default)]
struct Extents {
    bounds: Option<Rect>,
    advance_max: u16,
    min_lsb: Option<i16>,
    min_rsb: Option<i16>,
    x_max_extent: Option<i16>,
    max_points: u16,
    max_contours: u16,
    max_component_elements: u16,
}

impl Font {
    /// Write the font back to its own path.
    pub fn save(&self) -> Result<()> {
        self.save_as(self.path())
    }

    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_bytes()?;
        fs::write(path, &data).map_err(|e| Error::io(path, e))?;
        info!("wrote {} ({} glyphs, {} bytes)", path.display(), self.len(), data.len());
        Ok(())
    }

    /// Serialize to a TrueType binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let source = self.source_data().map(FontRef::new).transpose()?;
        let mut builder = FontBuilder::new();

        if let Some(font) = &source {
            for record in font.table_directory.table_records() {
                let tag = record.tag();
                if REBUILT.contains(&tag) {
                    continue;
                }
                if let Some(table_data) = font.table_data(tag) {
                    builder.add_raw(tag, table_data);
                }
            }
        }

        let gids: HashMap<&str, u16> = self
            .glyph_names()
            .enumerate()
            .map(|(gid, name)| (name, gid as u16))
            .collect();

        let mut glyf_builder = GlyfLocaBuilder::new();
        let mut h_metrics = Vec::with_capacity(self.len());
        let mut extents = Extents::default();
        for glyph in self.glyphs() {
            let bounds = self.glyph_bounds(glyph.name())?;
            glyf_builder.add_glyph(&self.write_glyph(glyph, bounds, &gids)?)?;
            h_metrics.push(extents.add(glyph, bounds));
        }
        let (glyf, loca, loca_format) = glyf_builder.build();
        builder.add_table(&glyf)?;
        builder.add_table(&loca)?;

        builder.add_table(&self.head(source.as_ref(), loca_format, &extents))?;
        builder.add_table(&self.hhea(source.as_ref(), h_metrics.len() as u16, &extents))?;
        builder.add_table(&Hmtx::new(h_metrics, Vec::new()))?;
        builder.add_table(&self.maxp(source.as_ref(), &extents))?;
        builder.add_table(&self.os2(source.as_ref()))?;
        builder.add_table(&self.post(source.as_ref()))?;

        if !self.kerning().is_empty() {
            builder.add_raw(KERN, build_kern(self.kerning(), |name| gids.get(name).copied()));
        }

        Ok(builder.build())
    }

    fn write_glyph(
        &self,
        glyph: &Glyph,
        bounds: Option<Rect>,
        gids: &HashMap<&str, u16>,
    ) -> Result<WriteGlyph> {
        let Some(bounds) = bounds else {
            return Ok(WriteGlyph::Empty);
        };
        let bbox = to_bbox(bounds);

        if glyph.contour_count() > 0 {
            if glyph.is_composite() {
                warn!("{}: components dropped from a glyph that also has contours", glyph.name());
            }
            let contours = glyph
                .contours()
                .iter()
                .map(|contour| {
                    contour
                        .points
                        .iter()
                        .map(|p| CurvePoint::new(round_i16(p.x), round_i16(p.y), p.on_curve))
                        .collect::<Vec<_>>()
                })
                .map(Contour::from)
                .collect();
            return Ok(WriteGlyph::Simple(SimpleGlyph { bbox, contours, instructions: vec![] }));
        }

        let mut components = glyph
            .components()
            .iter()
            .map(|component| -> Result<Component> {
                let gid = gids.get(component.base.as_str()).ok_or_else(|| {
                    font_outline::Error::MissingComponent {
                        glyph: glyph.name().to_string(),
                        base: component.base.clone(),
                    }
                })?;
                Ok(Component {
                    glyph: GlyphId16::new(*gid),
                    anchor: Anchor::Offset {
                        x: round_i16(component.offset.x),
                        y: round_i16(component.offset.y),
                    },
                    flags: ComponentFlags {
                        round_xy_to_grid: true,
                        use_my_metrics: false,
                        scaled_component_offset: false,
                        unscaled_component_offset: false,
                        overlap_compound: false,
                    },
                    transform: identity(),
                })
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter();

        let Some(first) = components.next() else {
            return Ok(WriteGlyph::Empty);
        };
        let mut composite = CompositeGlyph::new(first, bbox);
        for component in components {
            composite.add_component(component, bbox);
        }
        Ok(WriteGlyph::Composite(composite))
    }

    fn head(&self, source: Option<&FontRef>, loca_format: LocaFormat, extents: &Extents) -> Head {
        let mut head: Head = match source.and_then(|font| font.head().ok()) {
            Some(head) => head.to_owned_table(),
            None => Head {
                font_revision: Fixed::from_f64(1.0),
                checksum_adjustment: 0,
                magic_number: 0x5F0F3CF5,
                flags: Flags::empty(),
                units_per_em: self.units_per_em(),
                created: LongDateTime::new(0),
                modified: LongDateTime::new(0),
                x_min: 0,
                y_min: 0,
                x_max: 0,
                y_max: 0,
                mac_style: MacStyle::empty(),
                lowest_rec_ppem: 8,
                font_direction_hint: 2,
                index_to_loc_format: 0,
            },
        };
        let bbox = extents.bounds.map(to_bbox).unwrap_or(Bbox { x_min: 0, y_min: 0, x_max: 0, y_max: 0 });
        head.units_per_em = self.units_per_em();
        head.x_min = bbox.x_min;
        head.y_min = bbox.y_min;
        head.x_max = bbox.x_max;
        head.y_max = bbox.y_max;
        head.index_to_loc_format = loca_format as i16;
        head
    }

    fn hhea(&self, source: Option<&FontRef>, number_of_h_metrics: u16, extents: &Extents) -> Hhea {
        let mut hhea: Hhea = match source.and_then(|font| font.hhea().ok()) {
            Some(hhea) => hhea.to_owned_table(),
            None => {
                let upm = self.units_per_em() as i16;
                Hhea {
                    ascender: FWord::new(upm - upm / 5),
                    descender: FWord::new(-upm / 5),
                    line_gap: FWord::new(0),
                    advance_width_max: UfWord::new(0),
                    min_left_side_bearing: FWord::new(0),
                    min_right_side_bearing: FWord::new(0),
                    x_max_extent: FWord::new(0),
                    caret_slope_rise: 1,
                    caret_slope_run: 0,
                    caret_offset: 0,
                    number_of_h_metrics,
                }
            }
        };
        hhea.number_of_h_metrics = number_of_h_metrics;
        hhea.advance_width_max = extents.advance_max.into();
        hhea.min_left_side_bearing = extents.min_lsb.unwrap_or(0).into();
        hhea.min_right_side_bearing = extents.min_rsb.unwrap_or(0).into();
        hhea.x_max_extent = extents.x_max_extent.unwrap_or(0).into();
        hhea
    }

    fn maxp(&self, source: Option<&FontRef>, extents: &Extents) -> Maxp {
        let mut maxp: Maxp = match source.and_then(|font| font.maxp().ok()) {
            Some(maxp) => maxp.to_owned_table(),
            None => Maxp {
                num_glyphs: 0,
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
            },
        };
        maxp.num_glyphs = self.len() as u16;
        if maxp.max_points.is_some() {
            maxp.max_points = Some(extents.max_points);
            maxp.max_contours = Some(extents.max_contours);
            maxp.max_component_elements = Some(extents.max_component_elements);
        }
        maxp
    }

    fn os2(&self, source: Option<&FontRef>) -> Os2 {
        let mut os2: Os2 = match source.and_then(|font| font.os2().ok()) {
            Some(os2) => os2.to_owned_table(),
            None => default_os2(self.units_per_em() as i16),
        };
        os2.us_weight_class = self.weight_class();
        os2.us_width_class = self.width_class();
        os2
    }

    fn post(&self, source: Option<&FontRef>) -> Post {
        let mut post = Post::new_v2(self.glyph_names().collect::<Vec<_>>());
        if let Some(source) = source.and_then(|font| font.post().ok()) {
            post.italic_angle = Fixed::from_bits(source.italic_angle().to_bits());
            post.underline_position = FWord::new(source.underline_position().to_i16());
            post.underline_thickness = FWord::new(source.underline_thickness().to_i16());
            post.is_fixed_pitch = source.is_fixed_pitch();
        }
        post
    }
}

impl Extents {
    /// Record one glyph and return its metric entry.
    fn add(&mut self, glyph: &Glyph, bounds: Option<Rect>) -> LongMetric {
        let advance = glyph.advance_width().round().clamp(0.0, u16::MAX as f64) as u16;
        self.advance_max = self.advance_max.max(advance);
        self.max_points = self.max_points.max(glyph.num_points() as u16);
        self.max_contours = self.max_contours.max(glyph.contour_count() as u16);
        self.max_component_elements =
            self.max_component_elements.max(glyph.components().len() as u16);

        let Some(rect) = bounds else {
            return LongMetric { advance, side_bearing: round_i16(glyph.left_side_bearing()) };
        };
        self.bounds = Some(self.bounds.map_or(rect, |b| b.union(rect)));

        let bbox = to_bbox(rect);
        let lsb = bbox.x_min;
        let rsb = saturate_i16(advance as i32 - bbox.x_max as i32);
        let extent = saturate_i16(bbox.x_max as i32);
        self.min_lsb = Some(self.min_lsb.map_or(lsb, |v| v.min(lsb)));
        self.min_rsb = Some(self.min_rsb.map_or(rsb, |v| v.min(rsb)));
        self.x_max_extent = Some(self.x_max_extent.map_or(extent, |v| v.max(extent)));
        LongMetric { advance, side_bearing: lsb }
    }
}

fn round_i16(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn saturate_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn to_bbox(rect: Rect) -> Bbox {
    Bbox {
        x_min: round_i16(rect.x0),
        y_min: round_i16(rect.y0),
        x_max: round_i16(rect.x1),
        y_max: round_i16(rect.y1),
    }
}

fn identity() -> Transform {
    Transform {
        xx: F2Dot14::from_f32(1.0),
        yx: F2Dot14::from_f32(0.0),
        xy: F2Dot14::from_f32(0.0),
        yy: F2Dot14::from_f32(1.0),
    }
}

fn default_os2(units_per_em: i16) -> Os2 {
    let ascender = units_per_em - units_per_em / 5;
    let descender = -units_per_em / 5;
    Os2 {
        x_avg_char_width: units_per_em / 2,
        us_weight_class: 400,
        us_width_class: 5,
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
        s_typo_ascender: ascender,
        s_typo_descender: descender,
        s_typo_line_gap: 0,
        us_win_ascent: ascender as u16,
        us_win_descent: (-descender) as u16,
        ul_code_page_range_1: Some(0),
        ul_code_page_range_2: Some(0),
        sx_height: Some(units_per_em / 2),
        s_cap_height: Some(ascender),
        us_default_char: Some(0),
        us_break_char: Some(0x20),
        us_max_context: Some(0),
        us_lower_optical_point_size: None,
        us_upper_optical_point_size: None,
    }
}

#[cfg(test)]
mod tests {
    use font_outline::Component;
    use kurbo::Vec2;

    use super::*;
    use crate::font::{KerningPair, Style};

    fn sample() -> Font {
        let square = Glyph::from_contours(
            "a",
            [vec![(10.0, 0.0, true), (10.0, 100.0, true), (110.0, 100.0, true), (110.0, 0.0, true)]],
        )
        .with_advance_width(120.0);
        let curve = Glyph::from_contours(
            "o",
            [vec![(0.0, 50.0, true), (0.0, 100.0, false), (50.0, 100.0, true), (100.0, 50.0, false)]],
        )
        .with_advance_width(100.0);
        let composite = Glyph::new("aa")
            .with_components(vec![
                Component::new("a", Vec2::ZERO),
                Component::new("a", Vec2::new(120.0, 0.0)),
            ])
            .with_advance_width(240.0);
        Font::new("sample.ttf", 1000)
            .with_style(Style::new(700, 3))
            .with_glyph(Glyph::new(".notdef"))
            .with_glyph(square)
            .with_glyph(curve)
            .with_glyph(composite)
    }

    #[test]
    fn in_memory_font_round_trips() {
        let mut font = sample();
        font.add_kerning_pair(KerningPair::new("a", "o", -15));
        let data = font.to_bytes().unwrap();
        let loaded = Font::from_data("sample.ttf", data).unwrap();

        assert_eq!(loaded.glyph_names().collect::<Vec<_>>(), [".notdef", "a", "o", "aa"]);
        assert_eq!(loaded.style(), Style::new(700, 3));
        assert_eq!(loaded.units_per_em(), 1000);
        assert_eq!(loaded.kerning(), [KerningPair::new("a", "o", -15)]);

        let a = loaded.glyph("a").unwrap();
        assert_eq!(a.coordinates(), font.glyph("a").unwrap().coordinates());
        assert_eq!(a.advance_width(), 120.0);
        assert_eq!(a.left_side_bearing(), 10.0);

        let o = loaded.glyph("o").unwrap();
        assert_eq!(o.on_curve_flags(), [true, false, true, false]);

        let aa = loaded.glyph("aa").unwrap();
        assert_eq!(aa.components().len(), 2);
        assert_eq!(aa.components()[1].offset, Vec2::new(120.0, 0.0));
        assert!(loaded.glyph(".notdef").unwrap().is_empty());
    }

    #[test]
    fn wide_advance_saturates_side_bearings() {
        let wide = Glyph::from_contours(
            "wide",
            [vec![(-100.0, 0.0, true), (-100.0, 100.0, true), (30_000.0, 100.0, true), (30_000.0, 0.0, true)]],
        )
        .with_advance_width(65_000.0);
        let rect = Rect::new(-100.0, 0.0, 30_000.0, 100.0);

        let mut extents = Extents::default();
        let metric = extents.add(&wide, Some(rect));
        assert_eq!(metric.advance, 65_000);
        assert_eq!(metric.side_bearing, -100);
        assert_eq!(extents.min_rsb, Some(i16::MAX));
        assert_eq!(extents.x_max_extent, Some(30_000));

        let narrow = Glyph::new("narrow").with_advance_width(0.0);
        extents.add(&narrow, Some(Rect::new(0.0, 0.0, 32_767.0, 10.0)));
        assert_eq!(extents.min_rsb, Some(-32_767));
    }

    #[test]
    fn kerning_beyond_one_subtable_survives_save() {
        let mut font = Font::new("kern.ttf", 1000);
        let names: Vec<String> = (0..110).map(|i| format!("g{i}")).collect();
        for name in &names {
            font = font.with_glyph(Glyph::new(name.as_str()));
        }
        for left in &names {
            for right in &names {
                font.add_kerning_pair(KerningPair::new(left.as_str(), right.as_str(), -5));
            }
        }

        let loaded = Font::from_data("kern.ttf", font.to_bytes().unwrap()).unwrap();
        assert_eq!(loaded.kerning().len(), 12_100);
        assert_eq!(loaded.kerning()[12_099], KerningPair::new("g109", "g109", -5));
    }

    #[test]
    fn style_override_is_written() {
        let mut font = sample();
        font.set_style(Style::new(400, 5));
        let loaded = Font::from_data("x.ttf", font.to_bytes().unwrap()).unwrap();
        assert_eq!(loaded.declared_style(), Style::new(400, 5));
    }

    #[test]
    fn loaded_font_keeps_unmodelled_tables() {
        let data = font_test_data::VAZIRMATN_VAR.to_vec();
        let original = FontRef::new(&data).unwrap();
        let font = Font::from_data("vazirmatn.ttf", data.clone()).unwrap();
        assert_eq!(font.len(), original.maxp().unwrap().num_glyphs() as usize);

        let written = font.to_bytes().unwrap();
        let rewritten = FontRef::new(&written).unwrap();
        assert!(rewritten.fvar().is_ok());
        assert!(rewritten.gvar().is_ok());

        let reloaded = Font::from_data("vazirmatn.ttf", written.clone()).unwrap();
        for (before, after) in font.glyphs().zip(reloaded.glyphs()) {
            assert_eq!(before.name(), after.name());
            assert_eq!(before.num_points(), after.num_points());
            assert_eq!(before.contour_count(), after.contour_count());
        }
    }
}
