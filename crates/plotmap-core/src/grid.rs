//! Column-major plot grid.

use crate::error::{PlotmapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on `columns * rows_per_column` accepted at creation/import.
pub const MAX_GRID_CELLS: usize = 1_000_000;

/// A (column, row) coordinate in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub col: usize,
    pub row: usize,
}

impl CellPos {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for CellPos {
    /// 1-based, column first: "C3/R12".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}/R{}", self.col + 1, self.row + 1)
    }
}

/// One plant position on the field map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotCell {
    #[serde(default)]
    pub row: usize,
    #[serde(default)]
    pub col: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genotype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_number: Option<u32>,
}

impl PlotCell {
    pub fn empty(col: usize, row: usize) -> Self {
        Self {
            row,
            col,
            genotype: None,
            plot_number: None,
        }
    }

    pub fn pos(&self) -> CellPos {
        CellPos::new(self.col, self.row)
    }

    pub fn is_assigned(&self) -> bool {
        self.genotype.is_some()
    }
}

/// Fixed-size grid stored as `columns[col][row]`.
///
/// Every column holds exactly `rows_per_column` cells and each cell's
/// `row`/`col` fields match its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotGrid {
    columns: Vec<Vec<PlotCell>>,
    rows_per_column: usize,
}

pub(crate) fn check_dimensions(columns: usize, rows: usize) -> Result<()> {
    let too_large = columns
        .checked_mul(rows)
        .is_none_or(|total| total > MAX_GRID_CELLS);
    if columns == 0 || rows == 0 || too_large {
        return Err(PlotmapError::InvalidDimensions { columns, rows });
    }
    Ok(())
}

impl PlotGrid {
    /// Build a grid of empty cells.
    pub fn new(columns: usize, rows_per_column: usize) -> Result<Self> {
        check_dimensions(columns, rows_per_column)?;
        let columns = (0..columns)
            .map(|c| (0..rows_per_column).map(|r| PlotCell::empty(c, r)).collect())
            .collect();
        Ok(Self {
            columns,
            rows_per_column,
        })
    }

    /// Build a grid from already-shaped columns.
    ///
    /// Shape is validated; cell coordinates are re-derived from position.
    /// Returns the grid and the number of cells whose stored coordinates were corrected.
    pub fn from_columns(
        mut columns: Vec<Vec<PlotCell>>,
        rows_per_column: usize,
    ) -> Result<(Self, usize)> {
        check_dimensions(columns.len(), rows_per_column)?;
        let mut corrected = 0;
        for (c, column) in columns.iter_mut().enumerate() {
            if column.len() != rows_per_column {
                return Err(PlotmapError::InvalidFormat(format!(
                    "column {} has {} cells, expected {}",
                    c + 1,
                    column.len(),
                    rows_per_column
                )));
            }
            for (r, cell) in column.iter_mut().enumerate() {
                if cell.col != c || cell.row != r {
                    cell.col = c;
                    cell.row = r;
                    corrected += 1;
                }
            }
        }
        Ok((
            Self {
                columns,
                rows_per_column,
            },
            corrected,
        ))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows_per_column(&self) -> usize {
        self.rows_per_column
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        pos.col < self.columns.len() && pos.row < self.rows_per_column
    }

    pub fn get(&self, pos: CellPos) -> Option<&PlotCell> {
        self.columns.get(pos.col)?.get(pos.row)
    }

    pub(crate) fn get_mut(&mut self, pos: CellPos) -> Option<&mut PlotCell> {
        self.columns.get_mut(pos.col)?.get_mut(pos.row)
    }

    pub fn columns(&self) -> &[Vec<PlotCell>] {
        &self.columns
    }

    /// Cells in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = &PlotCell> {
        self.columns.iter().flatten()
    }

    pub fn assigned_count(&self) -> usize {
        self.iter().filter(|cell| cell.is_assigned()).count()
    }

    /// Highest plot number present, if any.
    pub fn max_plot_number(&self) -> Option<u32> {
        self.iter().filter_map(|cell| cell.plot_number).max()
    }

    /// Write genotype and plot number into every listed cell.
    /// Positions outside the grid are skipped. Returns the number of cells written.
    pub(crate) fn assign<'a>(
        &mut self,
        positions: impl IntoIterator<Item = &'a CellPos>,
        genotype: &str,
        plot_number: u32,
    ) -> usize {
        let mut written = 0;
        for pos in positions {
            if let Some(cell) = self.get_mut(*pos) {
                cell.genotype = Some(genotype.to_string());
                cell.plot_number = Some(plot_number);
                written += 1;
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_shape_and_coordinates() {
        let grid = PlotGrid::new(3, 4).unwrap();
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.rows_per_column(), 4);
        for (c, column) in grid.columns().iter().enumerate() {
            assert_eq!(column.len(), 4);
            for (r, cell) in column.iter().enumerate() {
                assert_eq!(cell.col, c);
                assert_eq!(cell.row, r);
                assert!(cell.genotype.is_none());
                assert!(cell.plot_number.is_none());
            }
        }
    }

    #[test]
    fn test_new_grid_rejects_zero_and_oversized_dimensions() {
        assert!(matches!(
            PlotGrid::new(0, 5),
            Err(PlotmapError::InvalidDimensions { columns: 0, rows: 5 })
        ));
        assert!(PlotGrid::new(5, 0).is_err());
        assert!(PlotGrid::new(MAX_GRID_CELLS, 2).is_err());
        assert!(PlotGrid::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_get_is_column_major_and_bounds_checked() {
        let grid = PlotGrid::new(2, 3).unwrap();
        let cell = grid.get(CellPos::new(1, 2)).unwrap();
        assert_eq!((cell.col, cell.row), (1, 2));
        assert!(grid.get(CellPos::new(2, 0)).is_none());
        assert!(grid.get(CellPos::new(0, 3)).is_none());
        assert!(!grid.contains(CellPos::new(0, 3)));
    }

    #[test]
    fn test_from_columns_rejects_ragged_columns() {
        let columns = vec![
            vec![PlotCell::empty(0, 0), PlotCell::empty(0, 1)],
            vec![PlotCell::empty(1, 0)],
        ];
        let err = PlotGrid::from_columns(columns, 2).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("column 2 has 1 cells"));
    }

    #[test]
    fn test_from_columns_restamps_stale_coordinates() {
        let mut stale = PlotCell::empty(7, 7);
        stale.genotype = Some("G1".to_string());
        let columns = vec![vec![PlotCell::empty(0, 0), stale]];
        let (grid, corrected) = PlotGrid::from_columns(columns, 2).unwrap();
        assert_eq!(corrected, 1);
        let cell = grid.get(CellPos::new(0, 1)).unwrap();
        assert_eq!((cell.col, cell.row), (0, 1));
        assert_eq!(cell.genotype.as_deref(), Some("G1"));
    }

    #[test]
    fn test_assign_skips_out_of_bounds() {
        let mut grid = PlotGrid::new(2, 2).unwrap();
        let positions = [CellPos::new(0, 0), CellPos::new(5, 5)];
        assert_eq!(grid.assign(&positions, "G1", 1000), 1);
        assert_eq!(grid.assigned_count(), 1);
        assert_eq!(grid.max_plot_number(), Some(1000));
    }

    #[test]
    fn test_cell_serializes_without_absent_fields() {
        let cell = PlotCell::empty(1, 0);
        assert_eq!(
            serde_json::to_string(&cell).unwrap(),
            r#"{"row":0,"col":1}"#
        );
        let mut assigned = PlotCell::empty(0, 0);
        assigned.genotype = Some("G1".to_string());
        assigned.plot_number = Some(1000);
        assert_eq!(
            serde_json::to_string(&assigned).unwrap(),
            r#"{"row":0,"col":0,"genotype":"G1","plotNumber":1000}"#
        );
    }
}
