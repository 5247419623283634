//! Error types for Plotmap core.

use thiserror::Error;

/// Errors that can occur in the Plotmap application
#[derive(Error, Debug)]
pub enum PlotmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook has no sheets")]
    SheetNotFound,

    #[error("Invalid map dimensions: {columns} columns x {rows} plants per column")]
    InvalidDimensions { columns: usize, rows: usize },

    #[error("No map created yet")]
    NoMap,

    #[error("No cells selected")]
    NothingSelected,

    #[error("No genotype chosen")]
    NoGenotypeChosen,

    #[error("Unknown genotype: {0}")]
    UnknownGenotype(String),

    #[error("Plot number overflow")]
    PlotNumberOverflow,

    #[error("Unsupported file type: {0} (expected .json, .xlsx or .csv)")]
    UnsupportedFormat(String),

    #[error("No file path set")]
    NoFilePath,
}

impl PlotmapError {
    /// True for errors caused by an unreadable map file rather than by I/O or state.
    pub fn is_format_error(&self) -> bool {
        matches!(self, PlotmapError::Json(_) | PlotmapError::InvalidFormat(_))
    }
}

pub type Result<T> = std::result::Result<T, PlotmapError>;
