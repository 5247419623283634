use super::Document;
use crate::catalog::{self, GenotypeRecord, PlotDetail};
use crate::error::{PlotmapError, Result};
use crate::grid::{CellPos, PlotGrid, check_dimensions};
use crate::selection::DragPolicy;
use crate::storage::ExportGrouping;

/// Outcome of a confirmed assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub plot_number: u32,
    pub genotype: String,
    /// Number of cells written
    pub cells: usize,
}

impl Document {
    /// Replace the grid with an empty one built from the current settings.
    ///
    /// Clears the selection and chosen genotype and resets the plot counter.
    pub fn create_map(&mut self) -> Result<()> {
        let grid = PlotGrid::new(self.settings.columns, self.settings.plants_per_column)?;
        self.grid = Some(grid);
        self.selection.clear();
        self.chosen_genotype = None;
        self.current_plot_number = self.settings.starting_plot_number;
        self.file_path = None;
        self.modified = false;
        log::debug!(
            "Created {}x{} map",
            self.settings.columns,
            self.settings.plants_per_column
        );
        Ok(())
    }

    /// Change the dimensions used by the next [`Document::create_map`].
    pub fn set_dimensions(&mut self, columns: usize, plants_per_column: usize) -> Result<()> {
        check_dimensions(columns, plants_per_column)?;
        self.settings.columns = columns;
        self.settings.plants_per_column = plants_per_column;
        Ok(())
    }

    /// Set the starting plot number; the counter restarts from it.
    pub fn set_starting_plot_number(&mut self, start: u32) {
        self.settings.starting_plot_number = start;
        self.current_plot_number = start;
    }

    pub fn set_drag_policy(&mut self, policy: DragPolicy) {
        self.settings.drag_policy = policy;
        self.selection.set_policy(policy);
    }

    pub fn set_export_grouping(&mut self, grouping: ExportGrouping) {
        self.settings.export_grouping = grouping;
    }

    fn in_grid(&self, pos: CellPos) -> bool {
        self.grid.as_ref().is_some_and(|grid| grid.contains(pos))
    }

    pub fn pointer_down(&mut self, pos: CellPos, range_modifier: bool) {
        if self.in_grid(pos) {
            self.selection.pointer_down(pos, range_modifier);
        }
    }

    pub fn pointer_enter(&mut self, pos: CellPos) {
        if self.in_grid(pos) {
            self.selection.pointer_enter(pos);
        }
    }

    pub fn pointer_up(&mut self) {
        self.selection.pointer_up();
    }

    pub fn tap(&mut self, pos: CellPos) {
        if self.in_grid(pos) {
            self.selection.tap(pos);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Pick the genotype for the next assignment, or reset it with `None`.
    pub fn choose_genotype(&mut self, identifier: Option<&str>) -> Result<()> {
        match identifier {
            Some(id) => {
                catalog::require_known(&self.catalog, id)?;
                self.chosen_genotype = Some(id.to_string());
            }
            None => self.chosen_genotype = None,
        }
        Ok(())
    }

    /// Write the chosen genotype and current plot number into every selected cell.
    ///
    /// On success the selection and chosen genotype are cleared and the
    /// counter advances by one. Nothing changes on failure.
    pub fn confirm_assignment(&mut self) -> Result<Assignment> {
        let grid = self.grid.as_mut().ok_or(PlotmapError::NoMap)?;
        let genotype = self
            .chosen_genotype
            .clone()
            .ok_or(PlotmapError::NoGenotypeChosen)?;
        if self.selection.is_empty() {
            return Err(PlotmapError::NothingSelected);
        }
        let plot_number = self.current_plot_number;
        let next = plot_number
            .checked_add(1)
            .ok_or(PlotmapError::PlotNumberOverflow)?;

        let cells = grid.assign(self.selection.iter(), &genotype, plot_number);
        self.selection.clear();
        self.chosen_genotype = None;
        self.current_plot_number = next;
        self.modified = true;
        log::debug!("Assigned {genotype} as plot {plot_number} to {cells} cells");

        Ok(Assignment {
            plot_number,
            genotype,
            cells,
        })
    }

    /// Catalog record for the genotype in `pos`, if any.
    pub fn lookup_genotype(&self, pos: CellPos) -> Option<&GenotypeRecord> {
        let grid = self.grid.as_ref()?;
        lookup_in(grid, &self.catalog, pos)
    }

    pub fn plot_detail(&self, pos: CellPos) -> Option<PlotDetail<'_>> {
        let grid = self.grid.as_ref()?;
        detail_in(grid, &self.catalog, pos)
    }
}

pub(crate) fn lookup_in<'a>(
    grid: &PlotGrid,
    catalog: &'a catalog::Catalog,
    pos: CellPos,
) -> Option<&'a GenotypeRecord> {
    let id = grid.get(pos)?.genotype.as_deref()?;
    catalog.find(id)
}

pub(crate) fn detail_in<'a>(
    grid: &PlotGrid,
    catalog: &'a catalog::Catalog,
    pos: CellPos,
) -> Option<PlotDetail<'a>> {
    let genotype = lookup_in(grid, catalog, pos)?;
    let plot_number = grid.get(pos)?.plot_number;
    Some(PlotDetail {
        genotype,
        plot_number,
    })
}
