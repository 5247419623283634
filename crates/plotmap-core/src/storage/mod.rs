//! Storage for map JSON, genotype catalogs and spreadsheet export.

pub(crate) mod csv;
mod json;
mod tabular;
mod xlsx;

pub use csv::{read_catalog_csv, write_rows_csv};
pub use json::{GridLayout, MapFile, parse_map_json, write_map_json};
pub use tabular::{ExportGrouping, TABLE_HEADER, TabularRow, flatten_rows};
pub use xlsx::{MAP_SHEET_NAME, read_catalog_workbook, read_catalog_workbook_bytes, write_rows_xlsx};

use std::path::Path;

/// Sheet name looked up first when reading a catalog workbook.
pub const CATALOG_SHEET_NAME: &str = "Genotypes";

pub const GENOTYPE_HEADER: &str = "Genotype";
pub const MALE_DONOR_HEADER: &str = "Male donor";
pub const FEMALE_RECEPTOR_HEADER: &str = "Female receptor";

/// One catalog data row, before empty identifiers are filtered out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    pub genotype: String,
    pub male_donor: String,
    pub female_receptor: String,
}

/// Map a header-first table of text cells to catalog rows.
///
/// The first row is the header; columns are located by exact name. A missing
/// column yields empty values. Fully blank data rows are skipped.
pub(crate) fn rows_from_table<I>(table: I) -> Vec<CatalogRow>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut rows = table.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let find = |name: &str| header.iter().position(|h| h.trim() == name);
    let genotype_idx = find(GENOTYPE_HEADER);
    let male_idx = find(MALE_DONOR_HEADER);
    let female_idx = find(FEMALE_RECEPTOR_HEADER);

    let field = |row: &[String], idx: Option<usize>| {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    rows.filter(|row| row.iter().any(|v| !v.is_empty()))
        .map(|row| CatalogRow {
            genotype: field(&row, genotype_idx),
            male_donor: field(&row, male_idx),
            female_receptor: field(&row, female_idx),
        })
        .collect()
}

/// Output format chosen from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ExportFormat::Json),
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}
