//! Genotype catalog: the reference list of genotypes with display colors.
//!
//! Colors are a function of each record's position in the (filtered) list and
//! the active [`Palette`]; they are recomputed whenever either changes, never
//! cached across catalog states.

use crate::error::{PlotmapError, Result};
use crate::storage::{self, CatalogRow};
use serde::Deserialize;
use std::path::Path;

/// High-contrast palette used by the map editor.
pub const DISTINCT_COLORS: [&str; 30] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe", "#008080", "#e6beff", "#9a6324", "#fffac8", "#800000", "#aaffc3",
    "#808000", "#ffd8b1", "#000075", "#808080", "#ffffff", "#000000", "#ff7f00", "#1f78b4",
    "#b15928", "#6a3d9a", "#b2df8a", "#fb9a99", "#cab2d6", "#ffff99",
];

/// Soft palette used by the map viewer.
pub const PASTEL_COLORS: [&str; 20] = [
    "#c8e6c9", "#b3e5fc", "#ffe082", "#ffab91", "#d1c4e9", "#f8bbd0", "#b2dfdb", "#f0f4c3",
    "#ffccbc", "#d7ccc8", "#f5e1a4", "#aed581", "#81d4fa", "#ffd54f", "#ff8a65", "#9575cd",
    "#f06292", "#4dd0e1", "#dce775", "#ffb74d",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    #[default]
    Distinct,
    Pastel,
}

impl Palette {
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Palette::Distinct => &DISTINCT_COLORS,
            Palette::Pastel => &PASTEL_COLORS,
        }
    }

    /// Color for the entry at `index` in catalog order.
    pub fn color_at(self, index: usize) -> &'static str {
        let colors = self.colors();
        colors[index % colors.len()]
    }
}

/// One genotype from the reference spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeRecord {
    pub identifier: String,
    pub male_parent_label: String,
    pub female_parent_label: String,
    /// `#rrggbb`
    pub display_color: String,
}

impl GenotypeRecord {
    /// Parse `display_color` into RGB components.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        parse_hex_color(&self.display_color)
    }
}

pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<GenotypeRecord>,
    palette: Palette,
}

impl Catalog {
    pub fn empty(palette: Palette) -> Self {
        Self {
            records: Vec::new(),
            palette,
        }
    }

    /// Build a catalog from spreadsheet rows, dropping rows without an identifier.
    pub fn from_rows(rows: Vec<CatalogRow>, palette: Palette) -> Self {
        let records = rows
            .into_iter()
            .filter(|row| !row.genotype.is_empty())
            .map(|row| GenotypeRecord {
                identifier: row.genotype,
                male_parent_label: row.male_donor,
                female_parent_label: row.female_receptor,
                display_color: String::new(),
            })
            .collect();
        let mut catalog = Self { records, palette };
        catalog.recolor();
        catalog
    }

    /// Parse an in-memory workbook (any format calamine detects).
    pub fn from_spreadsheet_bytes(bytes: &[u8], palette: Palette) -> Result<Self> {
        let rows = storage::read_catalog_workbook_bytes(bytes)?;
        Ok(Self::from_rows(rows, palette))
    }

    fn recolor(&mut self) {
        let palette = self.palette;
        for (idx, record) in self.records.iter_mut().enumerate() {
            record.display_color = palette.color_at(idx).to_string();
        }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.recolor();
    }

    pub fn records(&self) -> &[GenotypeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose identifier equals `identifier` exactly.
    pub fn find(&self, identifier: &str) -> Option<&GenotypeRecord> {
        self.records.iter().find(|g| g.identifier == identifier)
    }

    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.records.iter().position(|g| g.identifier == identifier)
    }
}

/// Read a catalog from a spreadsheet file.
///
/// `.csv` files are parsed as text; every other extension goes through
/// calamine's format detection.
pub fn load_catalog(path: &Path, palette: Palette) -> Result<Catalog> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let rows = if is_csv {
        storage::read_catalog_csv(path)?
    } else {
        storage::read_catalog_workbook(path)?
    };
    let catalog = Catalog::from_rows(rows, palette);
    log::info!(
        "Loaded {} genotypes from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}

/// Best-effort catalog load: any failure yields an empty catalog.
pub fn load_catalog_or_empty(path: &Path, palette: Palette) -> Catalog {
    match load_catalog(path, palette) {
        Ok(catalog) => catalog,
        Err(e) => {
            log::warn!("Genotype catalog {} unavailable: {}", path.display(), e);
            Catalog::empty(palette)
        }
    }
}

/// Hover/tooltip payload for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotDetail<'a> {
    pub genotype: &'a GenotypeRecord,
    pub plot_number: Option<u32>,
}

impl PlotDetail<'_> {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Genotype: {}", self.genotype.identifier),
            format!("Male donor: {}", self.genotype.male_parent_label),
            format!("Female receptor: {}", self.genotype.female_parent_label),
        ];
        if let Some(plot) = self.plot_number {
            lines.push(format!("Plot number: {}", plot));
        }
        lines
    }
}

pub(crate) fn require_known(catalog: &Catalog, identifier: &str) -> Result<()> {
    if catalog.find(identifier).is_none() {
        return Err(PlotmapError::UnknownGenotype(identifier.to_string()));
    }
    Ok(())
}
