//! A family prepared for variation: a chosen origin plus derived axis masters.

use std::{
    fs,
    ops::Deref,
    path::{Path, PathBuf},
};

use font_outline::GlyphAnalyzer;
use indexmap::IndexMap;
use log::{info, warn};

use crate::{
    axis::{Extreme, OriginMetrics, ParametricAxis},
    compat::CompatReport,
    error::{Error, Result},
    family::Family,
    font::{Font, Style},
    options::{AxisRange, CACHE_DIR_NAME, FamilyOptions, TiePolicy},
};

/// The two synthesized extremes of one parametric axis.
#[derive(Debug, Clone)]
pub struct AxisMasters {
    pub axis: ParametricAxis,
    pub min: Font,
    pub max: Font,
    /// Measurements taken on the origin to derive both masters.
    pub origin: OriginMetrics,
    /// The varied dimension at each extreme, in font units.
    pub values: AxisRange,
}

impl AxisMasters {
    pub fn get(&self, extreme: Extreme) -> &Font {
        match extreme {
            Extreme::Min => &self.min,
            Extreme::Max => &self.max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreVarFamily {
    family: Family,
    options: FamilyOptions,
    analyzer: GlyphAnalyzer,
    default: Option<PathBuf>,
    axes: IndexMap<ParametricAxis, AxisMasters>,
}

impl PreVarFamily {
    pub fn new(family: Family, options: FamilyOptions) -> Self {
        let analyzer = GlyphAnalyzer::new(options.tolerance);
        Self { family, options, analyzer, default: None, axes: IndexMap::new() }
    }

    pub fn load<P>(paths: &[P], options: FamilyOptions) -> Result<Self>
    where
        P: AsRef<Path> + Sync,
    {
        Ok(Self::new(Family::load(paths)?, options))
    }

    pub fn options(&self) -> &FamilyOptions {
        &self.options
    }

    pub fn analyzer(&self) -> &GlyphAnalyzer {
        &self.analyzer
    }

    pub fn family(&self) -> &Family {
        &self.family
    }

    /// Add a master. Clears the chosen default and every cached axis.
    pub fn add_font(&mut self, font: Font) -> Option<Font> {
        self.invalidate();
        self.family.add(font)
    }

    pub fn remove_font(&mut self, path: &Path) -> Option<Font> {
        self.invalidate();
        self.family.remove(path)
    }

    /// Path of the default font, if one has been chosen.
    pub fn default_path(&self) -> Option<&Path> {
        self.default.as_deref()
    }

    /// Choose the interpolation origin and normalize its style to the nominal
    /// weight and width.
    ///
    /// The origin is the font whose declared weight class is nearest the
    /// nominal weight, then, if [`FamilyOptions::width_tie_break`] is set, whose
    /// width class is nearest the nominal width. Remaining ties fail with [`Error::AmbiguousDefault`] unless the tie
    /// policy is [`TiePolicy::FirstFound`].
    pub fn default_font(&mut self) -> Result<&Font> {
        let path = match &self.default {
            Some(path) => path.clone(),
            None => {
                let path = self.select_default()?;
                let style = Style::new(self.options.nominal_weight, self.options.nominal_width);
                if let Some(font) = self.family.get_mut(&path) {
                    info!(
                        "default font {} ({}/{} normalized to {}/{})",
                        path.display(),
                        font.weight_class(),
                        font.width_class(),
                        style.weight_class,
                        style.width_class
                    );
                    font.set_style(style);
                }
                self.default = Some(path.clone());
                path
            }
        };
        self.family.get(&path).ok_or(Error::NoFonts)
    }

    fn select_default(&self) -> Result<PathBuf> {
        let (weight, width) = (self.options.nominal_weight, self.options.nominal_width);
        let by_width = self.options.width_tie_break;
        let distance = |font: &Font| {
            let declared = font.declared_style();
            let width_distance = if by_width { declared.width_class.abs_diff(width) } else { 0 };
            (declared.weight_class.abs_diff(weight), width_distance)
        };
        let best = self.family.fonts().map(distance).min().ok_or(Error::NoFonts)?;
        let candidates: Vec<PathBuf> = self
            .family
            .fonts()
            .filter(|font| distance(font) == best)
            .map(|font| font.path().to_path_buf())
            .collect();

        match (candidates.len(), self.options.tie_policy) {
            (1, _) | (_, TiePolicy::FirstFound) => Ok(candidates[0].clone()),
            (_, TiePolicy::Strict) => Err(Error::AmbiguousDefault { candidates }),
        }
    }

    /// Check every master against the default font. Falls back to the first
    /// font that has each glyph when no default can be chosen.
    pub fn check_interpolation(&mut self) -> CompatReport {
        let reference = match self.default_font() {
            Ok(font) => Some(font.path().to_path_buf()),
            Err(e) => {
                if !self.family.is_empty() {
                    warn!("checking without a default font: {e}");
                }
                None
            }
        };
        self.family.check_interpolation(reference.as_deref())
    }

    /// Masters for `axis`, deriving and writing them on first request.
    pub fn axis(&mut self, axis: ParametricAxis) -> Result<&AxisMasters> {
        if !axis.is_derivable() {
            return Err(Error::AxisNotDerivable(axis.tag()));
        }
        if self.axes.contains_key(&axis) {
            return Ok(&self.axes[&axis]);
        }
        if self.family.is_empty() {
            return Err(Error::NoMeasurableOrigin("family has no fonts".to_string()));
        }

        let path = self.default_font()?.path().to_path_buf();
        let origin = self.family.get(&path).ok_or(Error::NoFonts)?;
        let metrics = OriginMetrics::measure(origin, &self.options.reference_glyph, &self.analyzer)?;
        let value = axis.origin_value(&metrics)?;
        let range = self.options.range_for(axis);

        let dir = match &self.options.cache_dir {
            Some(dir) => dir.clone(),
            None => path.parent().unwrap_or(Path::new("")).join(CACHE_DIR_NAME),
        };
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let derive = |extreme: Extreme| -> Result<Font> {
            let dest = dir.join(master_file_name(&path, axis, extreme));
            duplicate(origin, &dest)?;
            let mut master = Font::load(&dest)?;
            master.set_style(origin.style());
            axis.apply(&mut master, extreme, range, &self.analyzer)?;
            master.save()?;
            info!("{axis} {extreme} master written to {}", dest.display());
            Ok(master)
        };
        let min = derive(Extreme::Min)?;
        let max = derive(Extreme::Max)?;

        let masters = AxisMasters {
            axis,
            min,
            max,
            origin: metrics,
            values: AxisRange::new(value * range.min, value * range.max),
        };
        Ok(self.axes.entry(axis).or_insert(masters))
    }

    /// Axis masters derived so far, in request order.
    pub fn axes(&self) -> impl Iterator<Item = &AxisMasters> {
        self.axes.values()
    }

    fn invalidate(&mut self) {
        if let Some(path) = self.default.take() {
            if let Some(font) = self.family.get_mut(&path) {
                font.reset_style();
            }
        }
        self.axes.clear();
    }
}

impl Deref for PreVarFamily {
    type Target = Family;

    fn deref(&self) -> &Family {
        &self.family
    }
}

/// Copy the origin's backing file, or serialize it when it only exists in memory.
fn duplicate(origin: &Font, dest: &Path) -> Result<()> {
    if origin.path().is_file() {
        fs::copy(origin.path(), dest).map_err(|e| Error::io(dest, e))?;
        Ok(())
    } else {
        origin.save_as(dest)
    }
}

fn master_file_name(origin: &Path, axis: ParametricAxis, extreme: Extreme) -> String {
    let stem = origin.file_stem().and_then(|s| s.to_str()).unwrap_or("font");
    format!("{stem}-{}-{extreme}.ttf", axis.tag())
}
