use crate::catalog::Catalog;
use crate::grid::PlotGrid;
use crate::selection::{DragPolicy, Selection};
use crate::sequence::LoadSequence;
use crate::storage::{ExportGrouping, GridLayout};
use std::path::PathBuf;

/// User-adjustable map parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSettings {
    pub columns: usize,
    pub plants_per_column: usize,
    pub starting_plot_number: u32,
    pub drag_policy: DragPolicy,
    pub export_grouping: ExportGrouping,
    /// Nesting of the `grid` array in map files read and written
    pub layout: GridLayout,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            columns: 5,
            plants_per_column: 5,
            starting_plot_number: 1000,
            drag_policy: DragPolicy::Free,
            export_grouping: ExportGrouping::PerCell,
            layout: GridLayout::ColumnMajor,
        }
    }
}

/// UI-agnostic state of the map editor.
pub struct Document {
    /// Genotypes available for assignment
    pub(crate) catalog: Catalog,
    /// `None` until a map is created or imported
    pub(crate) grid: Option<PlotGrid>,
    pub(crate) settings: MapSettings,
    pub(crate) selection: Selection,
    /// Plot number the next assignment receives
    pub(crate) current_plot_number: u32,
    pub(crate) chosen_genotype: Option<String>,
    pub(crate) catalog_loads: LoadSequence,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the map has changed since it was last saved or loaded
    pub modified: bool,
}

impl Document {
    /// Create an editor with no map.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(settings: MapSettings, catalog: Catalog) -> Self {
        Document {
            catalog,
            grid: None,
            selection: Selection::new(settings.drag_policy),
            current_plot_number: settings.starting_plot_number,
            settings,
            chosen_genotype: None,
            catalog_loads: LoadSequence::new(),
            file_path: None,
            modified: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> Option<&PlotGrid> {
        self.grid.as_ref()
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn current_plot_number(&self) -> u32 {
        self.current_plot_number
    }

    pub fn chosen_genotype(&self) -> Option<&str> {
        self.chosen_genotype.as_deref()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(MapSettings::default(), Catalog::default())
    }
}
