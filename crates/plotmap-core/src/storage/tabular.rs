//! Flatten a grid into spreadsheet rows.

use crate::catalog::Catalog;
use crate::grid::PlotGrid;
use serde::Deserialize;
use std::collections::HashMap;

/// Header row shared by the `.xlsx` and `.csv` writers.
pub const TABLE_HEADER: [&str; 6] = [
    "Plot number",
    "Column",
    "Genotype",
    "Male donor",
    "Female receptor",
    "Number of plants per plot",
];

/// How populated cells become exported rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportGrouping {
    /// One row per populated cell.
    #[default]
    PerCell,
    /// One row per (plot number, column) pair, counting its cells.
    Grouped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRow {
    pub plot_number: Option<u32>,
    /// 1-based
    pub column: usize,
    pub genotype: String,
    pub male_donor: String,
    pub female_receptor: String,
    pub plants_per_plot: usize,
}

/// Rows for every cell carrying a genotype, in column-major order.
///
/// Parent labels come from the catalog and are empty for unknown identifiers.
pub fn flatten_rows(grid: &PlotGrid, catalog: &Catalog, grouping: ExportGrouping) -> Vec<TabularRow> {
    let mut rows: Vec<TabularRow> = Vec::new();
    let mut groups: HashMap<(Option<u32>, usize), usize> = HashMap::new();

    for cell in grid.iter() {
        let Some(genotype) = cell.genotype.as_deref() else {
            continue;
        };

        if grouping == ExportGrouping::Grouped {
            if let Some(&idx) = groups.get(&(cell.plot_number, cell.col)) {
                rows[idx].plants_per_plot += 1;
                continue;
            }
            groups.insert((cell.plot_number, cell.col), rows.len());
        }

        let record = catalog.find(genotype);
        rows.push(TabularRow {
            plot_number: cell.plot_number,
            column: cell.col + 1,
            genotype: genotype.to_string(),
            male_donor: record
                .map(|g| g.male_parent_label.clone())
                .unwrap_or_default(),
            female_receptor: record
                .map(|g| g.female_parent_label.clone())
                .unwrap_or_default(),
            plants_per_plot: 1,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Palette;
    use crate::grid::PlotCell;
    use crate::storage::CatalogRow;

    fn catalog() -> Catalog {
        Catalog::from_rows(
            vec![CatalogRow {
                genotype: "G1".to_string(),
                male_donor: "M1".to_string(),
                female_receptor: "F1".to_string(),
            }],
            Palette::Distinct,
        )
    }

    fn cell(col: usize, row: usize, genotype: &str, plot: u32) -> PlotCell {
        PlotCell {
            row,
            col,
            genotype: Some(genotype.to_string()),
            plot_number: Some(plot),
        }
    }

    fn grid_with(cells: &[PlotCell], columns: usize, rows: usize) -> PlotGrid {
        let mut layout: Vec<Vec<PlotCell>> = (0..columns)
            .map(|c| (0..rows).map(|r| PlotCell::empty(c, r)).collect())
            .collect();
        for c in cells {
            layout[c.col][c.row] = c.clone();
        }
        PlotGrid::from_columns(layout, rows).unwrap().0
    }

    #[test]
    fn test_per_cell_rows_follow_column_major_order() {
        let grid = grid_with(
            &[cell(1, 0, "G1", 1001), cell(0, 1, "G1", 1000), cell(0, 0, "X", 1002)],
            2,
            2,
        );
        let rows = flatten_rows(&grid, &catalog(), ExportGrouping::PerCell);
        let order: Vec<_> = rows.iter().map(|r| (r.column, r.plot_number)).collect();
        assert_eq!(order, vec![(1, Some(1002)), (1, Some(1000)), (2, Some(1001))]);
        assert!(rows.iter().all(|r| r.plants_per_plot == 1));
        // Unknown identifiers export with empty parent labels.
        assert_eq!(rows[0].male_donor, "");
        assert_eq!(rows[1].male_donor, "M1");
        assert_eq!(rows[1].female_receptor, "F1");
    }

    #[test]
    fn test_grouped_rows_count_plants_per_plot_and_column() {
        let grid = grid_with(
            &[
                cell(0, 0, "G1", 1000),
                cell(0, 1, "G1", 1000),
                cell(1, 0, "G1", 1000),
                cell(0, 2, "G1", 1001),
            ],
            2,
            3,
        );
        let rows = flatten_rows(&grid, &catalog(), ExportGrouping::Grouped);
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].plot_number, rows[0].column, rows[0].plants_per_plot), (Some(1000), 1, 2));
        assert_eq!((rows[1].plot_number, rows[1].column, rows[1].plants_per_plot), (Some(1001), 1, 1));
        assert_eq!((rows[2].plot_number, rows[2].column, rows[2].plants_per_plot), (Some(1000), 2, 1));
    }

    #[test]
    fn test_empty_grid_has_no_rows() {
        let grid = PlotGrid::new(3, 3).unwrap();
        assert!(flatten_rows(&grid, &catalog(), ExportGrouping::Grouped).is_empty());
    }
}
