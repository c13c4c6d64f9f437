//! In-memory TrueType fonts: a glyph arena plus the style metadata and kerning
//! needed for compatibility checks.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    result,
    sync::Arc,
};

use font_outline::{Component, Glyph};
use indexmap::IndexMap;
use kurbo::{BezPath, Rect, Vec2};
use log::{debug, warn};
use read_fonts::{
    FontData, FontRef, ReadError, TableProvider,
    tables::glyf::{self, Anchor},
    types::{GlyphId, GlyphId16, Tag},
};

use crate::{
    error::{Error, Result},
    options::{NOMINAL_WEIGHT, NOMINAL_WIDTH},
};

pub(crate) const KERN: Tag = Tag::new(b"kern");

/// OS/2 weight and width class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    pub weight_class: u16,
    pub width_class: u16,
}

impl Style {
    pub const fn new(weight_class: u16, width_class: u16) -> Self {
        Self { weight_class, width_class }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new(NOMINAL_WEIGHT, NOMINAL_WIDTH)
    }
}

/// Position of a glyph in its font's glyph order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphIndex(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KerningPair {
    pub left: String,
    pub right: String,
    pub value: i16,
}

impl KerningPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>, value: i16) -> Self {
        Self { left: left.into(), right: right.into(), value }
    }
}

/// A font held in memory.
///
/// Glyphs live in an arena ordered by glyph id; other code refers to them by
/// name or [`GlyphIndex`]. The declared style is what the font file says; the
/// effective style is what gets written back and may be overridden, e.g. when
/// the font becomes a family's interpolation origin.
#[derive(Debug, Clone)]
pub struct Font {
    path: PathBuf,
    declared: Style,
    style: Style,
    units_per_em: u16,
    glyphs: IndexMap<String, Glyph>,
    kerning: Vec<KerningPair>,
    /// Bytes the font was decoded from; tables we do not model are copied from here.
    source: Option<Arc<[u8]>>,
}

impl Font {
    /// An empty font that exists only in memory until saved.
    pub fn new(path: impl Into<PathBuf>, units_per_em: u16) -> Self {
        Self {
            path: path.into(),
            declared: Style::default(),
            style: Style::default(),
            units_per_em,
            glyphs: IndexMap::new(),
            kerning: Vec::new(),
            source: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_data(path, data)
    }

    /// Decode a TrueType font; `path` becomes its identity.
    pub fn from_data(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let source: Arc<[u8]> = data.into();
        let font = FontRef::new(&source)?;

        let units_per_em = font.head()?.units_per_em();
        let declared = font
            .os2()
            .map(|os2| Style::new(os2.us_weight_class(), os2.us_width_class()))
            .unwrap_or_default();
        let num_glyphs = font.maxp()?.num_glyphs();
        let names = glyph_names(&font, num_glyphs);

        let glyf = font.glyf().map_err(|_| Error::MissingTable("glyf"))?;
        let loca = font.loca(None).map_err(|_| Error::MissingTable("loca"))?;
        let hmtx = font.hmtx().ok();

        let mut glyphs = IndexMap::with_capacity(names.len());
        for (gid, name) in names.iter().enumerate() {
            let id = GlyphId::new(gid as u32);
            let glyph = match loca.get_glyf(id, &glyf)? {
                Some(glyf::Glyph::Simple(simple)) => simple_glyph(name, &simple)?,
                Some(glyf::Glyph::Composite(composite)) => composite_glyph(name, &composite, &names),
                None => Glyph::new(name.as_str()),
            };
            let glyph = match &hmtx {
                Some(hmtx) => glyph
                    .with_advance_width(hmtx.advance(id).unwrap_or(0) as f64)
                    .with_left_side_bearing(hmtx.side_bearing(id).unwrap_or(0) as f64),
                None => glyph,
            };
            glyphs.insert(name.clone(), glyph);
        }

        let kerning = read_kerning(&font, &names);
        debug!(
            "{}: {} glyphs, {} kerning pairs, weight {} width {}",
            path.display(),
            glyphs.len(),
            kerning.len(),
            declared.weight_class,
            declared.width_class
        );

        Ok(Self {
            path,
            declared,
            style: declared,
            units_per_em,
            glyphs,
            kerning,
            source: Some(source),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Style as written in the font.
    pub fn declared_style(&self) -> Style {
        self.declared
    }

    /// Style the font currently carries, including any override.
    pub fn style(&self) -> Style {
        self.style
    }

    pub fn weight_class(&self) -> u16 {
        self.style.weight_class
    }

    pub fn width_class(&self) -> u16 {
        self.style.width_class
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    /// Set both the declared and effective style, as if the file said so.
    pub fn with_style(mut self, style: Style) -> Self {
        self.declared = style;
        self.style = style;
        self
    }

    /// Drop any override and go back to the declared style.
    pub fn reset_style(&mut self) {
        self.style = self.declared;
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.get(name)
    }

    pub fn glyph_mut(&mut self, name: &str) -> Option<&mut Glyph> {
        self.glyphs.get_mut(name)
    }

    pub fn glyph_index(&self, name: &str) -> Option<GlyphIndex> {
        self.glyphs.get_index_of(name).map(GlyphIndex)
    }

    pub fn glyph_at(&self, index: GlyphIndex) -> Option<&Glyph> {
        self.glyphs.get_index(index.0).map(|(_, glyph)| glyph)
    }

    /// Glyph names in glyph order.
    pub fn glyph_names(&self) -> impl Iterator<Item = &str> {
        self.glyphs.keys().map(String::as_str)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    pub fn glyphs_mut(&mut self) -> impl Iterator<Item = &mut Glyph> {
        self.glyphs.values_mut()
    }

    /// Add a glyph at the end of the glyph order, or replace one with the same name in place.
    pub fn insert_glyph(&mut self, glyph: Glyph) -> Option<Glyph> {
        self.glyphs.insert(glyph.name().to_string(), glyph)
    }

    pub fn with_glyph(mut self, glyph: Glyph) -> Self {
        self.insert_glyph(glyph);
        self
    }

    pub fn kerning(&self) -> &[KerningPair] {
        &self.kerning
    }

    pub fn set_kerning(&mut self, pairs: Vec<KerningPair>) {
        self.kerning = pairs;
    }

    pub fn add_kerning_pair(&mut self, pair: KerningPair) {
        self.kerning.push(pair);
    }

    pub(crate) fn source_data(&self) -> Option<&[u8]> {
        self.source.as_deref()
    }

    /// Top of the lowercase "x", or half the em when the font has none.
    pub fn x_height(&self) -> f64 {
        self.glyph_bounds("x")
            .ok()
            .flatten()
            .map(|rect| rect.y1)
            .unwrap_or(self.units_per_em as f64 / 2.0)
    }

    /// Outline of `name` with every component resolved at its offset.
    pub fn flatten(&self, name: &str) -> Result<BezPath> {
        let mut path = BezPath::new();
        self.walk(name, |glyph, offset| glyph.append_to(&mut path, offset))?;
        Ok(path)
    }

    /// Control-point bounds of `name`, components included. `None` for glyphs
    /// without any points.
    pub fn glyph_bounds(&self, name: &str) -> Result<Option<Rect>> {
        let mut bounds: Option<Rect> = None;
        self.walk(name, |glyph, offset| {
            if let Some(rect) = glyph.bounds() {
                let rect = rect + offset;
                bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
            }
        })?;
        Ok(bounds)
    }

    /// Visit `name` and, recursively, every glyph it places, with cumulative offsets.
    fn walk(&self, name: &str, mut visit: impl FnMut(&Glyph, Vec2)) -> Result<()> {
        let mut chain = Vec::new();
        self.walk_inner(name, Vec2::ZERO, &mut chain, &mut visit)
    }

    fn walk_inner(
        &self,
        name: &str,
        offset: Vec2,
        chain: &mut Vec<String>,
        visit: &mut impl FnMut(&Glyph, Vec2),
    ) -> Result<()> {
        if chain.iter().any(|seen| seen == name) {
            let mut chain = chain.clone();
            chain.push(name.to_string());
            return Err(font_outline::Error::CyclicComponent { chain }.into());
        }
        let Some(glyph) = self.glyph(name) else {
            return Err(match chain.last() {
                Some(parent) => font_outline::Error::MissingComponent {
                    glyph: parent.clone(),
                    base: name.to_string(),
                }
                .into(),
                None => Error::GlyphNotFound(name.to_string()),
            });
        };

        visit(glyph, offset);
        chain.push(name.to_string());
        for component in glyph.components() {
            self.walk_inner(&component.base, offset + component.offset, chain, visit)?;
        }
        chain.pop();
        Ok(())
    }
}

fn glyph_names(font: &FontRef, num_glyphs: u16) -> Vec<String> {
    let post = font.post().ok();
    let mut seen = HashSet::new();
    (0..num_glyphs)
        .map(|gid| {
            let name = post
                .as_ref()
                .and_then(|post| post.glyph_name(GlyphId16::new(gid)))
                .map(str::to_string)
                .unwrap_or_else(|| format!("glyph{gid:05}"));
            if seen.insert(name.clone()) {
                name
            } else {
                warn!("duplicate glyph name '{name}' at glyph {gid}");
                format!("{name}.{gid}")
            }
        })
        .collect()
}

fn simple_glyph(name: &str, simple: &glyf::SimpleGlyph) -> Result<Glyph> {
    let (coordinates, on_curve): (Vec<_>, Vec<_>) = simple
        .points()
        .map(|p| (kurbo::Point::new(p.x as f64, p.y as f64), p.on_curve))
        .unzip();
    let end_points = simple
        .end_pts_of_contours()
        .iter()
        .map(|e| e.get() as usize)
        .collect();
    Ok(Glyph::from_raw(name, coordinates, on_curve, end_points)?)
}

fn composite_glyph(name: &str, composite: &glyf::CompositeGlyph, names: &[String]) -> Glyph {
    let components = composite
        .components()
        .filter_map(|c| {
            let Some(base) = names.get(c.glyph.to_u32() as usize) else {
                warn!(
                    "{name}: component refers to glyph {} past the end of the font",
                    c.glyph.to_u32()
                );
                return None;
            };
            let t = &c.transform;
            let matrix = [t.xx.to_f32(), t.yx.to_f32(), t.xy.to_f32(), t.yy.to_f32()];
            if matrix != [1.0, 0.0, 0.0, 1.0] {
                warn!("{name}: transform on component '{base}' is not kept");
            }
            let offset = match c.anchor {
                Anchor::Offset { x, y } => Vec2::new(x as f64, y as f64),
                Anchor::Point { .. } => {
                    warn!("{name}: point-matched component '{base}' placed at the origin");
                    Vec2::ZERO
                }
            };
            Some(Component::new(base.as_str(), offset))
        })
        .collect();
    Glyph::new(name).with_components(components)
}

fn read_kerning(font: &FontRef, names: &[String]) -> Vec<KerningPair> {
    let Some(data) = font.table_data(KERN) else {
        return Vec::new();
    };
    parse_kern(data, names).unwrap_or_else(|e| {
        warn!("ignoring unreadable kern table: {e}");
        Vec::new()
    })
}

/// Format 0 subtables of a version 0 `kern` table.
fn parse_kern(data: FontData, names: &[String]) -> result::Result<Vec<KerningPair>, ReadError> {
    let version: u16 = data.read_at(0)?;
    if version != 0 {
        warn!("kern table version {version} is not supported");
        return Ok(Vec::new());
    }
    let name_of = |gid: u16| {
        names
            .get(gid as usize)
            .cloned()
            .unwrap_or_else(|| format!("glyph{gid:05}"))
    };

    let num_tables: u16 = data.read_at(2)?;
    let mut offset = 4;
    let mut pairs = Vec::new();
    for _ in 0..num_tables {
        let length: u16 = data.read_at(offset + 2)?;
        let coverage: u16 = data.read_at(offset + 4)?;
        let horizontal = coverage & 1 != 0;
        if coverage >> 8 == 0 && horizontal {
            let num_pairs: u16 = data.read_at(offset + 6)?;
            for i in 0..num_pairs as usize {
                let record = offset + 14 + i * 6;
                let left: u16 = data.read_at(record)?;
                let right: u16 = data.read_at(record + 2)?;
                let value: i16 = data.read_at(record + 4)?;
                pairs.push(KerningPair::new(name_of(left), name_of(right), value));
            }
        }
        offset += length as usize;
    }
    Ok(pairs)
}

/// Most pairs a format 0 subtable can hold while its length still fits in a `u16`.
pub(crate) const MAX_KERN_PAIRS_PER_SUBTABLE: usize = (u16::MAX as usize - 14) / 6;

/// Encode pairs as version 0 format 0 subtables, split so each subtable length fits in
/// its `u16` field. Pairs naming unknown glyphs are skipped.
pub(crate) fn build_kern(pairs: &[KerningPair], glyph_index: impl Fn(&str) -> Option<u16>) -> Vec<u8> {
    let mut records: Vec<(u16, u16, i16)> = pairs
        .iter()
        .filter_map(|pair| Some((glyph_index(&pair.left)?, glyph_index(&pair.right)?, pair.value)))
        .collect();
    records.sort_by_key(|&(left, right, _)| (left, right));
    records.dedup_by_key(|&mut (left, right, _)| (left, right));

    let max_records = MAX_KERN_PAIRS_PER_SUBTABLE * u16::MAX as usize;
    if records.len() > max_records {
        warn!("dropping {} kerning pairs past the kern table limit", records.len() - max_records);
        records.truncate(max_records);
    }
    let chunks: Vec<_> = records.chunks(MAX_KERN_PAIRS_PER_SUBTABLE).collect();

    let mut out = Vec::with_capacity(4 + chunks.len() * 14 + records.len() * 6);
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&(chunks.len() as u16).to_be_bytes());
    for chunk in chunks {
        for word in subtable_header(chunk.len()) {
            out.extend_from_slice(&word.to_be_bytes());
        }
        for &(left, right, value) in chunk {
            out.extend_from_slice(&left.to_be_bytes());
            out.extend_from_slice(&right.to_be_bytes());
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
    out
}

/// Subtable header words for `count` pairs, `count <= MAX_KERN_PAIRS_PER_SUBTABLE`.
fn subtable_header(count: usize) -> [u16; 7] {
    let power = if count == 0 { 0 } else { 1usize << count.ilog2() };
    let search_range = power * 6;
    let entry_selector = if power == 0 { 0 } else { power.trailing_zeros() as usize };
    let range_shift = count * 6 - search_range;
    let length = 14 + count * 6;
    [0, length, 0x0001, count, search_range, entry_selector, range_shift].map(|word| word as u16)
}
