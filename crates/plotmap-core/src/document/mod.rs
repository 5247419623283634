//! Map editor state and logic (UI-agnostic).

pub(crate) mod io;
pub(crate) mod ops;
mod state;

pub use ops::Assignment;
pub use state::{Document, MapSettings};
