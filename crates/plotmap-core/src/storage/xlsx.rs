//! Spreadsheet catalog reading (calamine) and plot table writing (rust_xlsxwriter).

use super::tabular::{TABLE_HEADER, TabularRow};
use super::{CATALOG_SHEET_NAME, CatalogRow, rows_from_table};
use crate::error::{PlotmapError, Result};
use calamine::{Data, Range, Reader, open_workbook_auto, open_workbook_auto_from_rs};
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Sheet name of the exported plot table.
pub const MAP_SHEET_NAME: &str = "Map";

/// Read catalog rows from any workbook format calamine detects.
pub fn read_catalog_workbook(path: &Path) -> Result<Vec<CatalogRow>> {
    let mut workbook = open_workbook_auto(path)?;
    read_catalog_sheet(&mut workbook)
}

/// Same as [`read_catalog_workbook`], from bytes already in memory.
pub fn read_catalog_workbook_bytes(bytes: &[u8]) -> Result<Vec<CatalogRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    read_catalog_sheet(&mut workbook)
}

fn read_catalog_sheet<RS: Read + Seek>(
    workbook: &mut calamine::Sheets<RS>,
) -> Result<Vec<CatalogRow>> {
    let sheet_names = workbook.sheet_names();
    let sheet = sheet_names
        .iter()
        .find(|name| name.as_str() == CATALOG_SHEET_NAME)
        .or_else(|| sheet_names.first())
        .cloned()
        .ok_or(PlotmapError::SheetNotFound)?;
    if sheet != CATALOG_SHEET_NAME {
        log::debug!("No '{CATALOG_SHEET_NAME}' sheet, reading '{sheet}'");
    }
    let range = workbook.worksheet_range(&sheet)?;
    Ok(rows_from_table(range_to_text(&range)))
}

fn range_to_text(range: &Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

/// Text form of a cell: integral floats lose their `.0`, empty cells are "".
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Render the plot table as an `.xlsx` workbook with a single `Map` sheet.
///
/// The header row is always written. A missing plot number leaves its cell blank.
pub fn write_rows_xlsx(rows: &[TabularRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(MAP_SHEET_NAME)?;

    for (col, title) in TABLE_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        if let Some(plot) = row.plot_number {
            worksheet.write_number(r, 0, plot)?;
        }
        worksheet.write_number(r, 1, row.column as f64)?;
        worksheet.write_string(r, 2, &row.genotype)?;
        worksheet.write_string(r, 3, &row.male_donor)?;
        worksheet.write_string(r, 4, &row.female_receptor)?;
        worksheet.write_number(r, 5, row.plants_per_plot as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}
