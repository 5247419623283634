//! CSV catalog import and plot table export

use super::tabular::{TABLE_HEADER, TabularRow};
use super::{CatalogRow, rows_from_table};
use crate::error::Result;
use std::io::Write;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

/// Read a genotype catalog from a header-first CSV file.
pub fn read_catalog_csv(path: &Path) -> Result<Vec<CatalogRow>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_catalog_csv(&content))
}

pub(crate) fn parse_catalog_csv(content: &str) -> Vec<CatalogRow> {
    // A UTF-8 BOM from spreadsheet exports would otherwise stick to the first header.
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    rows_from_table(Records::new(content))
}

/// CSV records of a whole document. Quoted fields may span lines.
struct Records<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Records<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            chars: content.chars().peekable(),
        }
    }
}

impl Iterator for Records<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Vec<String>> {
        self.chars.peek()?;
        let mut record = Vec::new();
        let mut field = Field::default();
        let mut in_quotes = false;

        while let Some(c) = self.chars.next() {
            match (in_quotes, c) {
                (true, '"') if self.chars.next_if_eq(&'"').is_some() => field.text.push('"'),
                (true, '"') => in_quotes = false,
                (true, _) => field.text.push(c),
                (false, '"') => {
                    in_quotes = true;
                    field.quoted = true;
                }
                (false, ',') => record.push(field.finish()),
                (false, '\r') if self.chars.peek() == Some(&'\n') => {}
                (false, '\n') => {
                    record.push(field.finish());
                    return Some(record);
                }
                (false, _) => field.text.push(c),
            }
        }
        record.push(field.finish());
        Some(record)
    }
}

#[derive(Default)]
struct Field {
    text: String,
    quoted: bool,
}

impl Field {
    /// Unquoted fields lose surrounding whitespace; quoted ones keep it.
    fn finish(&mut self) -> String {
        let Field { text, quoted } = std::mem::take(self);
        if quoted { text } else { text.trim().to_string() }
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub(crate) fn rows_to_csv(rows: &[TabularRow]) -> String {
    let mut out = String::new();
    out.push_str(&TABLE_HEADER.join(","));
    out.push('\n');
    for row in rows {
        let fields = [
            row.plot_number.map(|n| n.to_string()).unwrap_or_default(),
            row.column.to_string(),
            escape_csv_field(&row.genotype),
            escape_csv_field(&row.male_donor),
            escape_csv_field(&row.female_receptor),
            row.plants_per_plot.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Write the plot table (header first) to a CSV file.
pub fn write_rows_csv(path: &Path, rows: &[TabularRow]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(rows_to_csv(rows).as_bytes())?;
    Ok(())
}
