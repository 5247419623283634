//! Read-only map viewer state.

use crate::catalog::{Catalog, GenotypeRecord, PlotDetail};
use crate::document::io::read_map_file;
use crate::document::ops::{detail_in, lookup_in};
use crate::error::Result;
use crate::grid::{CellPos, PlotGrid};
use crate::sequence::{LoadSequence, LoadTicket};
use crate::storage::{GridLayout, parse_map_json};
use std::path::{Path, PathBuf};

/// A catalog plus an optional imported map. No selection, no counter.
#[derive(Debug, Default)]
pub struct Viewer {
    catalog: Catalog,
    grid: Option<PlotGrid>,
    catalog_loads: LoadSequence,
    layout: GridLayout,
    pub file_path: Option<PathBuf>,
}

impl Viewer {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Read map files nested under `layout`.
    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> Option<&PlotGrid> {
        self.grid.as_ref()
    }

    /// Replace the displayed map. Nothing changes on failure.
    pub fn import_json_str(&mut self, content: &str) -> Result<()> {
        let (grid, _) = parse_map_json(content, self.layout)?;
        self.grid = Some(grid);
        Ok(())
    }

    pub fn import_json_file(&mut self, path: &Path) -> Result<()> {
        let content = read_map_file(path)?;
        self.import_json_str(&content)?;
        self.file_path = Some(path.to_path_buf());
        log::info!("Viewing map from {}", path.display());
        Ok(())
    }

    pub fn lookup_genotype(&self, pos: CellPos) -> Option<&GenotypeRecord> {
        lookup_in(self.grid.as_ref()?, &self.catalog, pos)
    }

    pub fn plot_detail(&self, pos: CellPos) -> Option<PlotDetail<'_>> {
        detail_in(self.grid.as_ref()?, &self.catalog, pos)
    }

    pub fn begin_catalog_load(&mut self) -> LoadTicket {
        self.catalog_loads.begin()
    }

    /// Returns whether the catalog was applied.
    pub fn finish_catalog_load(&mut self, ticket: LoadTicket, catalog: Catalog) -> bool {
        if !self.catalog_loads.accept(ticket) {
            log::debug!("Dropping stale catalog load {ticket:?}");
            return false;
        }
        self.catalog = catalog;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Palette;
    use crate::storage::CatalogRow;

    const MAP: &str = r#"{"columns": 2, "plantsPerColumn": 1, "grid": [
        [{"row": 0, "col": 0, "genotype": "G1", "plotNumber": 7}],
        [{"row": 0, "col": 1, "genotype": "ghost", "plotNumber": 8}]
    ]}"#;

    fn catalog() -> Catalog {
        Catalog::from_rows(
            vec![CatalogRow {
                genotype: "G1".to_string(),
                male_donor: "M".to_string(),
                female_receptor: "F".to_string(),
            }],
            Palette::Pastel,
        )
    }

    #[test]
    fn test_viewer_lookups_match_editor_semantics() {
        let mut viewer = Viewer::new(catalog());
        assert!(viewer.plot_detail(CellPos::new(0, 0)).is_none());
        viewer.import_json_str(MAP).unwrap();

        let detail = viewer.plot_detail(CellPos::new(0, 0)).unwrap();
        assert_eq!(detail.lines()[0], "Genotype: G1");
        assert_eq!(detail.plot_number, Some(7));
        assert!(viewer.lookup_genotype(CellPos::new(1, 0)).is_none());
        assert!(viewer.lookup_genotype(CellPos::new(0, 1)).is_none());
    }

    #[test]
    fn test_viewer_failed_import_keeps_previous_map() {
        let mut viewer = Viewer::new(catalog());
        viewer.import_json_str(MAP).unwrap();
        let err = viewer.import_json_str(r#"{"rows": 1}"#).unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(viewer.grid().unwrap().column_count(), 2);
    }

    #[test]
    fn test_viewer_drops_stale_catalog() {
        let mut viewer = Viewer::default();
        let old = viewer.begin_catalog_load();
        let new = viewer.begin_catalog_load();
        assert!(!viewer.finish_catalog_load(old, catalog()));
        assert!(viewer.catalog().is_empty());
        assert!(viewer.finish_catalog_load(new, catalog()));
        assert_eq!(viewer.catalog().palette(), Palette::Pastel);
    }

    #[test]
    fn test_viewer_reads_row_major_maps() {
        let mut viewer = Viewer::new(catalog()).with_layout(GridLayout::RowMajor);
        // One row of two columns.
        let map = r#"{"columns": 2, "plantsPerColumn": 1, "grid": [
            [{"genotype": "ghost", "plotNumber": 8}, {"genotype": "G1", "plotNumber": 7}]
        ]}"#;
        viewer.import_json_str(map).unwrap();
        assert_eq!(viewer.plot_detail(CellPos::new(1, 0)).unwrap().plot_number, Some(7));
        assert!(viewer.lookup_genotype(CellPos::new(0, 0)).is_none());

        // Column-major files do not fit a row-major reader.
        assert!(viewer.import_json_str(MAP).unwrap_err().is_format_error());
    }
}
