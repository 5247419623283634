//! plotmap-core - UI-agnostic field map model + storage.

pub mod catalog;
pub mod document;
pub mod error;
pub mod grid;
pub mod selection;
pub mod sequence;
pub mod storage;
pub mod viewer;

pub use catalog::{Catalog, GenotypeRecord, Palette, PlotDetail, load_catalog, load_catalog_or_empty};
pub use document::{Assignment, Document, MapSettings};
pub use error::{PlotmapError, Result};
pub use grid::{CellPos, PlotCell, PlotGrid};
pub use selection::{DragPolicy, Selection};
pub use sequence::{LoadSequence, LoadTicket};
pub use storage::{ExportFormat, ExportGrouping, GridLayout};
pub use viewer::Viewer;
