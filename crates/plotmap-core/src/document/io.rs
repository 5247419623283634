use super::Document;
use crate::catalog::Catalog;
use crate::error::{PlotmapError, Result};
use crate::grid::PlotGrid;
use crate::sequence::LoadTicket;
use crate::storage::{
    ExportFormat, TabularRow, flatten_rows, parse_map_json, write_map_json, write_rows_csv,
    write_rows_xlsx,
};
use std::path::{Path, PathBuf};

const MAX_MAP_FILE_BYTES: u64 = 256 * 1_048_576; // 256 MiB

/// Read a map file, refusing anything implausibly large.
///
/// Content that is not UTF-8 is a format error, like malformed JSON.
pub(crate) fn read_map_file(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_MAP_FILE_BYTES {
        return Err(PlotmapError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Refusing to read {}: map file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_MAP_FILE_BYTES
            ),
        )));
    }
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes)
        .map_err(|e| PlotmapError::InvalidFormat(format!("not UTF-8 text ({e})")))
}

impl Document {
    /// Replace the map with one parsed from JSON.
    ///
    /// The plot counter is left as is. Nothing changes on failure.
    pub fn import_json_str(&mut self, content: &str) -> Result<()> {
        let (grid, _) = parse_map_json(content, self.settings.layout)?;
        self.settings.columns = grid.column_count();
        self.settings.plants_per_column = grid.rows_per_column();
        self.grid = Some(grid);
        self.selection.clear();
        self.modified = false;
        Ok(())
    }

    /// Load a map file and remember its path for later saves.
    pub fn import_json_file(&mut self, path: &Path) -> Result<()> {
        let content = read_map_file(path)?;
        self.import_json_str(&content)?;
        self.file_path = Some(path.to_path_buf());
        log::info!("Imported map from {}", path.display());
        Ok(())
    }

    /// Current map as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String> {
        write_map_json(self.require_grid()?, self.settings.layout)
    }

    /// Rows for spreadsheet export under the configured grouping.
    pub fn tabular_rows(&self) -> Result<Vec<TabularRow>> {
        Ok(flatten_rows(
            self.require_grid()?,
            &self.catalog,
            self.settings.export_grouping,
        ))
    }

    /// Write the map to `path`, picking the format from its extension.
    pub fn export_file(&self, path: &Path) -> Result<()> {
        let format = ExportFormat::from_path(path)
            .ok_or_else(|| PlotmapError::UnsupportedFormat(path.display().to_string()))?;
        match format {
            ExportFormat::Json => std::fs::write(path, self.export_json()?)?,
            ExportFormat::Xlsx => std::fs::write(path, write_rows_xlsx(&self.tabular_rows()?)?)?,
            ExportFormat::Csv => write_rows_csv(path, &self.tabular_rows()?)?,
        }
        log::info!("Exported map to {}", path.display());
        Ok(())
    }

    /// Save as JSON to the current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(PlotmapError::NoFilePath);
        };
        self.save_file_as(&path)?;
        Ok(path)
    }

    /// Save as JSON to `path` and make it the current file path.
    pub fn save_file_as(&mut self, path: &Path) -> Result<()> {
        if ExportFormat::from_path(path) != Some(ExportFormat::Json) {
            return Err(PlotmapError::UnsupportedFormat(path.display().to_string()));
        }
        std::fs::write(path, self.export_json()?)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        log::info!("Saved map to {}", path.display());
        Ok(())
    }

    /// Issue a ticket for a background catalog load.
    pub fn begin_catalog_load(&mut self) -> LoadTicket {
        self.catalog_loads.begin()
    }

    /// Apply a finished catalog load if its ticket is still the latest.
    ///
    /// A chosen genotype missing from the new catalog is reset.
    /// Returns whether the catalog was applied.
    pub fn finish_catalog_load(&mut self, ticket: LoadTicket, catalog: Catalog) -> bool {
        if !self.catalog_loads.accept(ticket) {
            log::debug!("Dropping stale catalog load {ticket:?}");
            return false;
        }
        let still_known = self
            .chosen_genotype
            .as_deref()
            .is_none_or(|id| catalog.find(id).is_some());
        if !still_known {
            self.chosen_genotype = None;
        }
        self.catalog = catalog;
        true
    }

    fn require_grid(&self) -> Result<&PlotGrid> {
        self.grid.as_ref().ok_or(PlotmapError::NoMap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Palette;
    use crate::document::MapSettings;
    use crate::grid::CellPos;
    use crate::storage::{CatalogRow, ExportGrouping, GridLayout, TABLE_HEADER};

    fn temp_path(stem: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "plotmap_{}_{}_{}_{:?}.{}",
            stem,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
            ext
        ))
    }

    struct Cleanup(PathBuf);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn catalog(ids: &[&str]) -> Catalog {
        let rows = ids
            .iter()
            .map(|id| CatalogRow {
                genotype: id.to_string(),
                male_donor: format!("{id}-m"),
                female_receptor: format!("{id}-f"),
            })
            .collect();
        Catalog::from_rows(rows, Palette::Distinct)
    }

    fn assigned_doc() -> Document {
        let settings = MapSettings {
            columns: 2,
            plants_per_column: 2,
            ..MapSettings::default()
        };
        let mut doc = Document::new(settings, catalog(&["G1", "G2"]));
        doc.create_map().unwrap();
        doc.pointer_down(CellPos::new(0, 0), false);
        doc.pointer_enter(CellPos::new(0, 1));
        doc.pointer_up();
        doc.choose_genotype(Some("G1")).unwrap();
        doc.confirm_assignment().unwrap();
        doc
    }

    #[test]
    fn test_import_replaces_grid_and_keeps_counter() {
        let source = assigned_doc();
        let json = source.export_json().unwrap();

        let mut doc = Document::new(MapSettings::default(), catalog(&["G1"]));
        doc.set_starting_plot_number(5);
        doc.create_map().unwrap();
        doc.tap(CellPos::new(3, 3));
        doc.import_json_str(&json).unwrap();

        assert_eq!(doc.grid(), source.grid());
        assert_eq!(doc.settings().columns, 2);
        assert_eq!(doc.settings().plants_per_column, 2);
        assert!(doc.selection().is_empty());
        assert_eq!(doc.current_plot_number(), 5);
    }

    #[test]
    fn test_failed_import_leaves_state_untouched() {
        let mut doc = assigned_doc();
        doc.tap(CellPos::new(1, 1));
        let before = doc.grid().cloned();
        for bad in ["{", r#"{"columns": 0, "plantsPerColumn": 2, "grid": []}"#] {
            let err = doc.import_json_str(bad).unwrap_err();
            assert!(err.is_format_error());
        }
        assert_eq!(doc.grid().cloned(), before);
        assert_eq!(doc.selection().len(), 1);
        assert_eq!(doc.settings().columns, 2);
    }

    #[test]
    fn test_export_requires_map() {
        let doc = Document::default();
        assert!(matches!(doc.export_json(), Err(PlotmapError::NoMap)));
        assert!(matches!(doc.tabular_rows(), Err(PlotmapError::NoMap)));
    }

    #[test]
    fn test_tabular_rows_follow_grouping_setting() {
        let mut doc = assigned_doc();
        assert_eq!(doc.tabular_rows().unwrap().len(), 2);
        doc.set_export_grouping(ExportGrouping::Grouped);
        let rows = doc.tabular_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].plot_number, Some(1000));
        assert_eq!(rows[0].column, 1);
        assert_eq!(rows[0].plants_per_plot, 2);
        assert_eq!(rows[0].male_donor, "G1-m");
    }

    #[test]
    fn test_save_and_reload_json_file() {
        let path = temp_path("save", "json");
        let _cleanup = Cleanup(path.clone());

        let mut doc = assigned_doc();
        assert!(matches!(doc.save_file(), Err(PlotmapError::NoFilePath)));
        doc.save_file_as(&path).unwrap();
        assert!(!doc.modified);
        assert_eq!(doc.save_file().unwrap(), path);

        let mut reloaded = Document::default();
        reloaded.import_json_file(&path).unwrap();
        assert_eq!(reloaded.grid(), doc.grid());
        assert_eq!(reloaded.file_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_row_major_layout_round_trips() {
        let mut doc = assigned_doc();
        doc.settings.layout = GridLayout::RowMajor;
        let json = doc.export_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        // Row 1 holds (col 0, row 1), assigned, then (col 1, row 1), empty.
        assert_eq!(value["grid"][1][0]["genotype"], "G1");
        assert!(value["grid"][1][1].get("genotype").is_none());

        let mut reopened = Document::new(
            MapSettings {
                layout: GridLayout::RowMajor,
                ..MapSettings::default()
            },
            catalog(&["G1"]),
        );
        reopened.import_json_str(&json).unwrap();
        assert_eq!(reopened.grid(), doc.grid());
    }

    #[test]
    fn test_binary_map_file_is_format_error() {
        let path = temp_path("binary", "json");
        let _cleanup = Cleanup(path.clone());
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        let mut doc = assigned_doc();
        let err = doc.import_json_file(&path).unwrap_err();
        assert!(err.is_format_error(), "{err}");
        assert!(doc.file_path.is_none());
        assert_eq!(doc.grid().unwrap().assigned_count(), 2);
    }

    #[test]
    fn test_save_as_rejects_non_json() {
        let mut doc = assigned_doc();
        let path = temp_path("save", "xlsx");
        assert!(matches!(
            doc.save_file_as(&path),
            Err(PlotmapError::UnsupportedFormat(_))
        ));
        assert!(doc.file_path.is_none());
    }

    #[test]
    fn test_export_file_by_extension() {
        let doc = assigned_doc();

        let csv = temp_path("export", "csv");
        let _c1 = Cleanup(csv.clone());
        doc.export_file(&csv).unwrap();
        let text = std::fs::read_to_string(&csv).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(TABLE_HEADER.join(",").as_str()));
        assert_eq!(lines.next(), Some("1000,1,G1,G1-m,G1-f,1"));

        let xlsx = temp_path("export", "xlsx");
        let _c2 = Cleanup(xlsx.clone());
        doc.export_file(&xlsx).unwrap();
        let bytes = std::fs::read(&xlsx).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let json = temp_path("export", "json");
        let _c3 = Cleanup(json.clone());
        doc.export_file(&json).unwrap();
        assert_eq!(std::fs::read_to_string(&json).unwrap(), doc.export_json().unwrap());

        let ods = temp_path("export", "ods");
        assert!(matches!(
            doc.export_file(&ods),
            Err(PlotmapError::UnsupportedFormat(_))
        ));
        assert!(!ods.exists());
    }

    #[test]
    fn test_stale_catalog_load_is_dropped() {
        let mut doc = Document::default();
        let first = doc.begin_catalog_load();
        let second = doc.begin_catalog_load();

        assert!(doc.finish_catalog_load(second, catalog(&["NEW"])));
        assert!(!doc.finish_catalog_load(first, catalog(&["OLD"])));
        assert!(doc.catalog().find("NEW").is_some());
        assert!(doc.catalog().find("OLD").is_none());
    }

    #[test]
    fn test_catalog_reload_resets_missing_choice() {
        let mut doc = Document::new(MapSettings::default(), catalog(&["G1", "G2"]));
        doc.choose_genotype(Some("G2")).unwrap();
        let ticket = doc.begin_catalog_load();
        doc.finish_catalog_load(ticket, catalog(&["G2"]));
        assert_eq!(doc.chosen_genotype(), Some("G2"));
        let ticket = doc.begin_catalog_load();
        doc.finish_catalog_load(ticket, catalog(&["G1"]));
        assert!(doc.chosen_genotype().is_none());
    }
}
