//! Map JSON format.
//!
//! ```json
//! { "columns": 2, "plantsPerColumn": 2, "grid": [[{"row":0,"col":0}, ...], ...] }
//! ```
//! Older files name the dimensions `rows` and `plantsPerRow`.
//!
//! `grid` is nested column-first by default. Under [`GridLayout::RowMajor`]
//! the outer array holds rows instead, as older row-oriented tools wrote it.

use crate::error::{PlotmapError, Result};
use crate::grid::{PlotCell, PlotGrid};
use serde::{Deserialize, Serialize};

/// Nesting order of the `grid` array in map files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridLayout {
    /// `grid[col][row]`
    #[default]
    ColumnMajor,
    /// `grid[row][col]`
    RowMajor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFile<'a> {
    pub columns: usize,
    pub plants_per_column: usize,
    pub grid: Vec<Vec<&'a PlotCell>>,
}

impl<'a> MapFile<'a> {
    pub fn from_grid(grid: &'a PlotGrid, layout: GridLayout) -> Self {
        let nested = match layout {
            GridLayout::ColumnMajor => grid
                .columns()
                .iter()
                .map(|column| column.iter().collect())
                .collect(),
            GridLayout::RowMajor => (0..grid.rows_per_column())
                .map(|r| grid.columns().iter().map(|column| &column[r]).collect())
                .collect(),
        };
        Self {
            columns: grid.column_count(),
            plants_per_column: grid.rows_per_column(),
            grid: nested,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMapFile {
    columns: Option<usize>,
    rows: Option<usize>,
    plants_per_column: Option<usize>,
    plants_per_row: Option<usize>,
    grid: Option<Vec<Vec<PlotCell>>>,
}

fn positive(value: Option<usize>, name: &str) -> Result<usize> {
    match value {
        Some(0) => Err(PlotmapError::InvalidFormat(format!("{name} must be positive"))),
        Some(n) => Ok(n),
        None => Err(PlotmapError::InvalidFormat(format!("missing {name}"))),
    }
}

/// Regroup `grid[row][col]` as `grid[col][row]`.
fn transpose(rows: Vec<Vec<PlotCell>>, columns: usize) -> Result<Vec<Vec<PlotCell>>> {
    if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns) {
        return Err(PlotmapError::InvalidFormat(format!(
            "row {} has {} cells, expected {}",
            r + 1,
            row.len(),
            columns
        )));
    }
    let mut out: Vec<Vec<PlotCell>> =
        (0..columns).map(|_| Vec::with_capacity(rows.len())).collect();
    for row in rows {
        for (column, cell) in out.iter_mut().zip(row) {
            column.push(cell);
        }
    }
    Ok(out)
}

/// Parse a map file into a grid.
///
/// Returns the grid and the number of cells whose stored coordinates did not
/// match their position and were corrected.
pub fn parse_map_json(content: &str, layout: GridLayout) -> Result<(PlotGrid, usize)> {
    let raw: RawMapFile = serde_json::from_str(content)?;
    let columns = positive(raw.columns.or(raw.rows), "columns")?;
    let rows = positive(raw.plants_per_column.or(raw.plants_per_row), "plantsPerColumn")?;
    let grid = raw
        .grid
        .ok_or_else(|| PlotmapError::InvalidFormat("missing grid".to_string()))?;
    let (outer, outer_name) = match layout {
        GridLayout::ColumnMajor => (columns, "columns"),
        GridLayout::RowMajor => (rows, "rows"),
    };
    if grid.len() != outer {
        return Err(PlotmapError::InvalidFormat(format!(
            "grid has {} {}, expected {}",
            grid.len(),
            outer_name,
            outer
        )));
    }
    let grid = match layout {
        GridLayout::ColumnMajor => grid,
        GridLayout::RowMajor => transpose(grid, columns)?,
    };

    let (grid, corrected) = PlotGrid::from_columns(grid, rows).map_err(|e| match e {
        PlotmapError::InvalidDimensions { .. } => PlotmapError::InvalidFormat(e.to_string()),
        other => other,
    })?;
    if corrected > 0 {
        log::warn!("Corrected coordinates of {corrected} cells while importing map");
    }
    Ok((grid, corrected))
}

/// Serialize a grid as pretty-printed map JSON.
pub fn write_map_json(grid: &PlotGrid, layout: GridLayout) -> Result<String> {
    Ok(serde_json::to_string_pretty(&MapFile::from_grid(grid, layout))?)
}
