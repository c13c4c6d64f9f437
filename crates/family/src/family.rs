use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use log::info;
use rayon::prelude::*;

use crate::{
    compat::{CompatReport, check_interpolation},
    error::Result,
    font::Font,
};

/// Fonts keyed by path, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct Family {
    fonts: IndexMap<PathBuf, Font>,
}

impl Family {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every path in parallel. Fails on the first font that cannot be read.
    pub fn load<P>(paths: &[P]) -> Result<Self>
    where
        P: AsRef<Path> + Sync,
    {
        let fonts = paths
            .par_iter()
            .map(|path| Font::load(path))
            .collect::<Result<Vec<_>>>()?;
        info!("loaded {} fonts", fonts.len());
        Ok(fonts.into_iter().collect())
    }

    /// Add a font, replacing any font with the same path.
    pub fn add(&mut self, font: Font) -> Option<Font> {
        self.fonts.insert(font.path().to_path_buf(), font)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Font> {
        self.fonts.shift_remove(path)
    }

    pub fn get(&self, path: &Path) -> Option<&Font> {
        self.fonts.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Font> {
        self.fonts.get_mut(path)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn fonts(&self) -> impl Iterator<Item = &Font> {
        self.fonts.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.fonts.keys().map(PathBuf::as_path)
    }

    /// Fonts grouped by declared weight class.
    pub fn by_weight(&self) -> BTreeMap<u16, Vec<&Font>> {
        self.group_by(|font| font.declared_style().weight_class)
    }

    /// Fonts grouped by declared width class.
    pub fn by_width(&self) -> BTreeMap<u16, Vec<&Font>> {
        self.group_by(|font| font.declared_style().width_class)
    }

    /// Every font whose declared weight class is nearest to `weight`.
    pub fn closest_weight(&self, weight: u16) -> Vec<&Font> {
        self.closest_by(|font| font.declared_style().weight_class.abs_diff(weight))
    }

    /// Every font whose declared width class is nearest to `width`.
    pub fn closest_width(&self, width: u16) -> Vec<&Font> {
        self.closest_by(|font| font.declared_style().width_class.abs_diff(width))
    }

    /// Union of glyph names, in first-seen order.
    pub fn glyph_names(&self) -> IndexSet<&str> {
        self.fonts().flat_map(Font::glyph_names).collect()
    }

    /// Check every master against `reference`, or against the first font.
    pub fn check_interpolation(&self, reference: Option<&Path>) -> CompatReport {
        let fonts: Vec<&Font> = self.fonts().collect();
        check_interpolation(&fonts, reference.and_then(|path| self.get(path)))
    }

    fn group_by(&self, key: impl Fn(&Font) -> u16) -> BTreeMap<u16, Vec<&Font>> {
        let mut groups: BTreeMap<u16, Vec<&Font>> = BTreeMap::new();
        for font in self.fonts() {
            groups.entry(key(font)).or_default().push(font);
        }
        groups
    }

    fn closest_by<K: Ord + Copy>(&self, distance: impl Fn(&Font) -> K) -> Vec<&Font> {
        let Some(best) = self.fonts().map(&distance).min() else {
            return Vec::new();
        };
        self.fonts().filter(|font| distance(font) == best).collect()
    }
}

impl FromIterator<Font> for Family {
    fn from_iter<I: IntoIterator<Item = Font>>(iter: I) -> Self {
        let mut family = Self::new();
        for font in iter {
            family.add(font);
        }
        family
    }
}
