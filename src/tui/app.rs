//! Application state and logic.
//!
//! [`App`] wraps either the map editor ([`Document`]) or the read-only
//! [`Viewer`] together with terminal-only state: cursor, viewport, command
//! line, genotype picker and modals.

use plotmap_core::{
    Catalog, CellPos, Document, DragPolicy, ExportGrouping, GenotypeRecord, GridLayout, LoadTicket,
    Palette, PlotDetail, PlotGrid, Result, Viewer, load_catalog_or_empty,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// Which surface the app is showing.
pub enum Workspace {
    Editor(Document),
    Viewer(Viewer),
}

impl Workspace {
    pub fn grid(&self) -> Option<&PlotGrid> {
        match self {
            Workspace::Editor(doc) => doc.grid(),
            Workspace::Viewer(viewer) => viewer.grid(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        match self {
            Workspace::Editor(doc) => doc.catalog(),
            Workspace::Viewer(viewer) => viewer.catalog(),
        }
    }

    pub fn lookup_genotype(&self, pos: CellPos) -> Option<&GenotypeRecord> {
        match self {
            Workspace::Editor(doc) => doc.lookup_genotype(pos),
            Workspace::Viewer(viewer) => viewer.lookup_genotype(pos),
        }
    }

    pub fn plot_detail(&self, pos: CellPos) -> Option<PlotDetail<'_>> {
        match self {
            Workspace::Editor(doc) => doc.plot_detail(pos),
            Workspace::Viewer(viewer) => viewer.plot_detail(pos),
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Workspace::Editor(doc) => doc.file_path.as_deref(),
            Workspace::Viewer(viewer) => viewer.file_path.as_deref(),
        }
    }

    pub fn modified(&self) -> bool {
        match self {
            Workspace::Editor(doc) => doc.modified,
            Workspace::Viewer(_) => false,
        }
    }

    fn import_json_file(&mut self, path: &Path) -> Result<()> {
        match self {
            Workspace::Editor(doc) => doc.import_json_file(path),
            Workspace::Viewer(viewer) => viewer.import_json_file(path),
        }
    }

    fn begin_catalog_load(&mut self) -> LoadTicket {
        match self {
            Workspace::Editor(doc) => doc.begin_catalog_load(),
            Workspace::Viewer(viewer) => viewer.begin_catalog_load(),
        }
    }

    fn finish_catalog_load(&mut self, ticket: LoadTicket, catalog: Catalog) -> bool {
        match self {
            Workspace::Editor(doc) => doc.finish_catalog_load(ticket, catalog),
            Workspace::Viewer(viewer) => viewer.finish_catalog_load(ticket, catalog),
        }
    }
}

/// Input mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Navigate, toggle cells, single-key commands.
    Normal,
    /// Keyboard drag: cursor movement extends the selection.
    Visual,
    /// Enter ex-style commands (`:w`, `:q`, etc.).
    Command,
    /// Choose a genotype for the selected cells.
    Picker,
}

/// A finished background catalog load.
struct CatalogLoaded {
    ticket: LoadTicket,
    path: PathBuf,
    catalog: Catalog,
}

/// Main application state container.
pub struct App {
    pub workspace: Workspace,
    /// Cursor position (grid column)
    pub cursor_col: usize,
    /// Cursor position (grid row)
    pub cursor_row: usize,
    /// Viewport offset (column)
    pub viewport_col: usize,
    /// Viewport offset in screen rows from the top
    pub viewport_row: usize,
    pub visible_cols: usize,
    pub visible_rows: usize,
    /// Cell under the mouse pointer
    pub hover: Option<CellPos>,
    pub mode: Mode,
    pub command_buffer: String,
    /// Cursor position within command buffer (byte offset)
    pub command_cursor: usize,
    /// Highlighted catalog entry in the picker
    pub picker_index: usize,
    pub status_message: String,
    /// Set after a first `q` with unsaved changes
    pub confirm_quit: bool,
    /// Set after a first `n` with unsaved changes
    pub confirm_discard: bool,
    pub help_modal: bool,
    pub help_scroll: usize,
    /// Import failure detail shown in a modal
    pub notice: Option<String>,
    /// Clicks toggle cells instead of starting a drag
    pub touch: bool,
    pub palette: Palette,
    catalog_tx: Sender<CatalogLoaded>,
    catalog_rx: Receiver<CatalogLoaded>,
}

impl App {
    pub fn new(workspace: Workspace, palette: Palette) -> Self {
        let (catalog_tx, catalog_rx) = mpsc::channel();
        App {
            workspace,
            cursor_col: 0,
            cursor_row: 0,
            viewport_col: 0,
            viewport_row: 0,
            visible_cols: 8,
            visible_rows: 20,
            hover: None,
            mode: Mode::Normal,
            command_buffer: String::new(),
            command_cursor: 0,
            picker_index: 0,
            status_message: String::new(),
            confirm_quit: false,
            confirm_discard: false,
            help_modal: false,
            help_scroll: 0,
            notice: None,
            touch: false,
            palette,
            catalog_tx,
            catalog_rx,
        }
    }

    pub fn editor(settings: plotmap_core::MapSettings, palette: Palette) -> Self {
        Self::new(
            Workspace::Editor(Document::new(settings, Catalog::empty(palette))),
            palette,
        )
    }

    pub fn viewer(palette: Palette, layout: GridLayout) -> Self {
        let viewer = Viewer::new(Catalog::empty(palette)).with_layout(layout);
        Self::new(Workspace::Viewer(viewer), palette)
    }

    pub fn is_viewer(&self) -> bool {
        matches!(self.workspace, Workspace::Viewer(_))
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.workspace {
            Workspace::Editor(doc) => Some(doc),
            Workspace::Viewer(_) => None,
        }
    }

    fn document_mut(&mut self) -> Option<&mut Document> {
        match &mut self.workspace {
            Workspace::Editor(doc) => Some(doc),
            Workspace::Viewer(_) => None,
        }
    }

    pub fn grid_size(&self) -> (usize, usize) {
        self.workspace
            .grid()
            .map(|g| (g.column_count(), g.rows_per_column()))
            .unwrap_or((0, 0))
    }

    pub fn cursor_pos(&self) -> CellPos {
        CellPos::new(self.cursor_col, self.cursor_row)
    }

    /// Screen row (from the top) of a grid row. The viewer draws the last row first.
    pub fn display_row(&self, row: usize) -> usize {
        let (_, rows) = self.grid_size();
        if self.is_viewer() {
            rows.saturating_sub(1).saturating_sub(row)
        } else {
            row
        }
    }

    /// Grid row shown at screen row `display`.
    pub fn row_at_display(&self, display: usize) -> usize {
        // The mapping is its own inverse.
        self.display_row(display)
    }

    /// Move cursor by a screen-direction delta, clamped to the grid.
    ///
    /// During a keyboard drag the new cell is fed to the selection.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let (cols, rows) = self.grid_size();
        if cols == 0 || rows == 0 {
            return;
        }
        self.cursor_col = (self.cursor_col as i64 + dx as i64).clamp(0, cols as i64 - 1) as usize;
        let display = (self.display_row(self.cursor_row) as i64 + dy as i64)
            .clamp(0, rows as i64 - 1) as usize;
        self.cursor_row = self.row_at_display(display);
        self.update_viewport();

        if self.mode == Mode::Visual {
            let pos = self.cursor_pos();
            if let Some(doc) = self.document_mut() {
                doc.pointer_enter(pos);
            }
        }
    }

    pub fn set_cursor(&mut self, pos: CellPos) {
        self.cursor_col = pos.col;
        self.cursor_row = pos.row;
        self.update_viewport();
    }

    /// Update viewport to keep cursor visible
    pub fn update_viewport(&mut self) {
        if self.cursor_col < self.viewport_col {
            self.viewport_col = self.cursor_col;
        } else if self.cursor_col >= self.viewport_col + self.visible_cols {
            self.viewport_col = self.cursor_col + 1 - self.visible_cols;
        }

        let display = self.display_row(self.cursor_row);
        if display < self.viewport_row {
            self.viewport_row = display;
        } else if display >= self.viewport_row + self.visible_rows {
            self.viewport_row = display + 1 - self.visible_rows;
        }
    }

    fn reset_cursor(&mut self) {
        self.cursor_col = 0;
        self.cursor_row = self.row_at_display(0);
        self.viewport_col = 0;
        self.viewport_row = 0;
        self.hover = None;
        self.mode = Mode::Normal;
    }

    /// Lines for the detail panel: the hovered cell, else the cursor cell.
    pub fn detail_lines(&self) -> Vec<String> {
        let Some(grid) = self.workspace.grid() else {
            return vec!["No map".to_string()];
        };
        let pos = self.hover.unwrap_or_else(|| self.cursor_pos());
        let Some(cell) = grid.get(pos) else {
            return Vec::new();
        };
        let mut lines = vec![format!("Cell {}", pos)];
        match self.workspace.plot_detail(pos) {
            Some(detail) => lines.extend(detail.lines()),
            None => match (&cell.genotype, cell.plot_number) {
                (Some(id), plot) => {
                    lines.push(format!("Genotype: {} (not in catalog)", id));
                    if let Some(plot) = plot {
                        lines.push(format!("Plot number: {}", plot));
                    }
                }
                (None, _) => lines.push("Unassigned".to_string()),
            },
        }
        lines
    }

    /// Spawn a background catalog load. Only the most recent load is applied.
    pub fn start_catalog_load(&mut self, path: PathBuf) {
        let ticket = self.workspace.begin_catalog_load();
        let tx = self.catalog_tx.clone();
        let palette = self.palette;
        self.status_message = format!("Loading genotypes from {}...", path.display());
        std::thread::spawn(move || {
            let catalog = load_catalog_or_empty(&path, palette);
            let _ = tx.send(CatalogLoaded {
                ticket,
                path,
                catalog,
            });
        });
    }

    /// Apply finished catalog loads. Returns whether any was applied.
    pub fn poll_catalog_loads(&mut self) -> bool {
        let mut applied = false;
        while let Ok(loaded) = self.catalog_rx.try_recv() {
            applied |= self.apply_catalog_load(loaded);
        }
        applied
    }

    fn apply_catalog_load(&mut self, loaded: CatalogLoaded) -> bool {
        let count = loaded.catalog.len();
        if !self.workspace.finish_catalog_load(loaded.ticket, loaded.catalog) {
            return false;
        }
        self.picker_index = 0;
        if self.mode == Mode::Picker && count == 0 {
            self.mode = Mode::Normal;
        }
        self.status_message = format!(
            "Loaded {} genotypes from {}",
            count,
            loaded.path.display()
        );
        true
    }

    /// Open a map file. Format errors open the notice modal.
    pub fn open_map(&mut self, path: &Path) {
        match self.workspace.import_json_file(path) {
            Ok(()) => {
                self.reset_cursor();
                self.status_message = format!("Loaded {}", path.display());
            }
            Err(e) if e.is_format_error() => {
                log::warn!("Rejected map {}: {}", path.display(), e);
                self.notice = Some(e.to_string());
            }
            Err(e) => {
                self.status_message = format!("Error: {}", e);
            }
        }
    }

    /// Open `path` if it exists; in the editor a missing file becomes the save target.
    pub fn open_or_create(&mut self, path: PathBuf) {
        if path.exists() {
            self.open_map(&path);
            return;
        }
        if self.is_viewer() {
            self.status_message = format!("Error: File not found: {}", path.display());
            return;
        }
        self.new_map();
        self.status_message = format!("New file: {}", path.display());
        if let Some(doc) = self.document_mut() {
            doc.file_path = Some(path);
        }
    }

    pub fn close_help_modal(&mut self) {
        self.help_modal = false;
        self.help_scroll = 0;
    }

    pub fn scroll_help_by(&mut self, delta: i32) {
        self.help_scroll = (self.help_scroll as i64 + delta as i64).max(0) as usize;
    }

    pub fn close_notice(&mut self) {
        self.notice = None;
    }

    pub fn new_map(&mut self) {
        let Some(doc) = self.document_mut() else {
            return;
        };
        match doc.create_map() {
            Ok(()) => {
                let settings = doc.settings();
                let message = format!(
                    "New map: {} columns x {} plants, first plot {}",
                    settings.columns, settings.plants_per_column, settings.starting_plot_number
                );
                self.reset_cursor();
                self.status_message = message;
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    /// `n` from Normal mode. Unsaved work needs a second press.
    pub fn request_new_map(&mut self) {
        if self.workspace.modified() && !self.confirm_discard {
            self.confirm_discard = true;
            self.status_message =
                "Unsaved changes! Press n again to discard them, or :w to save".to_string();
            return;
        }
        self.confirm_discard = false;
        self.new_map();
    }

    pub fn toggle_cursor_cell(&mut self) {
        let pos = self.cursor_pos();
        if let Some(doc) = self.document_mut() {
            doc.tap(pos);
        }
    }

    pub fn start_keyboard_drag(&mut self) {
        let pos = self.cursor_pos();
        let Some(doc) = self.document_mut() else {
            return;
        };
        if doc.grid().is_none() {
            self.status_message = "No map yet. Press n or use :new".to_string();
            return;
        }
        doc.pointer_down(pos, false);
        self.mode = Mode::Visual;
    }

    pub fn end_keyboard_drag(&mut self) {
        if let Some(doc) = self.document_mut() {
            doc.pointer_up();
        }
        self.mode = Mode::Normal;
    }

    pub fn open_picker(&mut self) {
        if self.mode == Mode::Visual {
            self.end_keyboard_drag();
        }
        let Some(doc) = self.document() else {
            return;
        };
        let problem = if doc.grid().is_none() {
            Some("No map yet. Press n or use :new")
        } else if doc.selection().is_empty() {
            Some("Select cells first")
        } else if doc.catalog().is_empty() {
            Some("Genotype catalog is empty. Load one with :catalog <file>")
        } else {
            None
        };
        if let Some(problem) = problem {
            self.status_message = problem.to_string();
            return;
        }
        self.picker_index = doc
            .chosen_genotype()
            .and_then(|id| doc.catalog().position(id))
            .unwrap_or(0);
        self.mode = Mode::Picker;
    }

    pub fn picker_move(&mut self, delta: i32) {
        let len = self.workspace.catalog().len();
        if len == 0 {
            return;
        }
        self.picker_index =
            (self.picker_index as i64 + delta as i64).clamp(0, len as i64 - 1) as usize;
    }

    /// Assign the highlighted genotype to the selection.
    pub fn confirm_picker(&mut self) {
        self.mode = Mode::Normal;
        let index = self.picker_index;
        let Workspace::Editor(doc) = &mut self.workspace else {
            return;
        };
        let Some(id) = doc
            .catalog()
            .records()
            .get(index)
            .map(|g| g.identifier.clone())
        else {
            return;
        };
        let result = doc
            .choose_genotype(Some(&id))
            .and_then(|()| doc.confirm_assignment());
        self.status_message = match result {
            Ok(done) => format!(
                "Assigned {} as plot {} to {} cells",
                done.genotype, done.plot_number, done.cells
            ),
            Err(e) => format!("Error: {}", e),
        };
    }

    pub fn cancel(&mut self) {
        match self.mode {
            Mode::Command => {
                self.command_buffer.clear();
                self.command_cursor = 0;
            }
            Mode::Visual => self.end_keyboard_drag(),
            Mode::Picker => {}
            Mode::Normal => {
                if let Some(doc) = self.document_mut() {
                    doc.clear_selection();
                }
            }
        }
        self.mode = Mode::Normal;
    }

    /// `q` from Normal mode. Returns `true` if the application should quit.
    pub fn request_quit(&mut self) -> bool {
        if !self.workspace.modified() || self.confirm_quit {
            return true;
        }
        self.confirm_quit = true;
        self.status_message =
            "Unsaved changes! Press q again to quit, or :wq to save and quit".to_string();
        false
    }

    /// Execute a command entered in command mode.
    ///
    /// Returns `true` if the application should quit, `false` otherwise.
    pub fn execute_command(&mut self) -> bool {
        let cmd = self.command_buffer.trim().to_string();
        self.command_buffer.clear();
        self.command_cursor = 0;
        self.mode = Mode::Normal;

        let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
        let command = parts[0];
        let args = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

        match command {
            "" => {}
            "q" => {
                if self.workspace.modified() {
                    self.status_message =
                        "Unsaved changes! Use :q! to force quit or :wq to save and quit"
                            .to_string();
                    return false;
                }
                return true;
            }
            "q!" => return true,
            "e" | "import" | "open" | "e!" | "import!" | "open!" => match args {
                Some(_) if !command.ends_with('!') && self.workspace.modified() => {
                    self.status_message = format!(
                        "Unsaved changes! Use :{}! to discard them or :w to save",
                        command
                    );
                }
                Some(path) => self.open_map(Path::new(path)),
                None => self.status_message = format!("Usage: :{} <file.json>", command),
            },
            "catalog" => {
                if let Some(path) = args {
                    self.start_catalog_load(PathBuf::from(path));
                } else {
                    self.status_message = "Usage: :catalog <file.xlsx|file.csv>".to_string();
                }
            }
            "help" | "h" => self.help_modal = true,
            _ if self.is_viewer() => {
                self.status_message = format!("Not available in the viewer: {}", command);
            }
            "w" | "save" => self.save(args),
            "wq" => {
                self.save(args);
                if !self.workspace.modified() {
                    return true;
                }
            }
            "export" => {
                if let Some(path) = args {
                    self.export(Path::new(path));
                } else {
                    self.status_message = "Usage: :export <file.xlsx|file.csv|file.json>".to_string();
                }
            }
            "new" if self.workspace.modified() => {
                self.status_message =
                    "Unsaved changes! Use :new! to discard them or :w to save".to_string();
            }
            "new" | "new!" => self.new_map_command(args),
            "start" => match args.map(str::parse::<u32>) {
                Some(Ok(start)) => {
                    if let Some(doc) = self.document_mut() {
                        doc.set_starting_plot_number(start);
                    }
                    self.status_message = format!("Next plot number: {}", start);
                }
                _ => self.status_message = "Usage: :start <plot number>".to_string(),
            },
            "drag" => {
                let policy = match args {
                    Some("free") => Some(DragPolicy::Free),
                    Some("column") | Some("column-locked") => Some(DragPolicy::ColumnLocked),
                    _ => None,
                };
                match policy {
                    Some(policy) => {
                        if let Some(doc) = self.document_mut() {
                            doc.set_drag_policy(policy);
                        }
                        self.status_message = format!("Drag policy: {}", drag_label(policy));
                    }
                    None => self.status_message = "Usage: :drag free|column".to_string(),
                }
            }
            "group" => {
                let grouping = match args {
                    Some("per-cell") | Some("cell") => Some(ExportGrouping::PerCell),
                    Some("grouped") | Some("plot") => Some(ExportGrouping::Grouped),
                    _ => None,
                };
                match grouping {
                    Some(grouping) => {
                        if let Some(doc) = self.document_mut() {
                            doc.set_export_grouping(grouping);
                        }
                        self.status_message =
                            format!("Export grouping: {}", grouping_label(grouping));
                    }
                    None => self.status_message = "Usage: :group per-cell|grouped".to_string(),
                }
            }
            _ => {
                self.status_message = format!("Unknown command: {}", command);
            }
        }
        false
    }

    fn new_map_command(&mut self, args: Option<&str>) {
        if let Some(args) = args {
            let dims: Vec<Option<usize>> = args
                .split_whitespace()
                .map(|s| s.parse::<usize>().ok())
                .collect();
            let (columns, rows) = match dims.as_slice() {
                [Some(c), Some(r)] => (*c, *r),
                _ => {
                    self.status_message =
                        "Usage: :new [COLUMNS PLANTS_PER_COLUMN]".to_string();
                    return;
                }
            };
            let Some(doc) = self.document_mut() else {
                return;
            };
            if let Err(e) = doc.set_dimensions(columns, rows) {
                self.status_message = format!("Error: {}", e);
                return;
            }
        }
        self.new_map();
    }

    fn save(&mut self, path: Option<&str>) {
        let Some(doc) = self.document_mut() else {
            return;
        };
        let result = match path {
            Some(path) => doc
                .save_file_as(Path::new(path))
                .map(|()| PathBuf::from(path)),
            None => doc.save_file(),
        };
        self.status_message = match result {
            Ok(path) => format!("Saved to {}", path.display()),
            Err(plotmap_core::PlotmapError::NoFilePath) => {
                "No file path. Use :w <file.json>".to_string()
            }
            Err(e) => format!("Error saving: {}", e),
        };
    }

    fn export(&mut self, path: &Path) {
        let Some(doc) = self.document() else {
            return;
        };
        self.status_message = match doc.export_file(path) {
            Ok(()) => format!("Exported to {}", path.display()),
            Err(e) => format!("Export error: {}", e),
        };
    }
}

pub fn drag_label(policy: DragPolicy) -> &'static str {
    match policy {
        DragPolicy::Free => "free",
        DragPolicy::ColumnLocked => "column",
    }
}

pub fn grouping_label(grouping: ExportGrouping) -> &'static str {
    match grouping {
        ExportGrouping::PerCell => "per-cell",
        ExportGrouping::Grouped => "grouped",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotmap_core::MapSettings;
    use std::time::Duration;

    fn temp_path(stem: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "plotmap_app_{}_{}_{}_{:?}.{}",
            stem,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
            ext
        ))
    }

    struct Cleanup(PathBuf);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn run(app: &mut App, command: &str) -> bool {
        app.command_buffer = command.to_string();
        app.execute_command()
    }

    fn wait_for_catalog(app: &mut App) {
        let loaded = app
            .catalog_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("catalog load finished");
        app.apply_catalog_load(loaded);
    }

    fn editor_with_catalog() -> (App, Cleanup) {
        let path = temp_path("catalog", "csv");
        std::fs::write(
            &path,
            "Genotype,Male donor,Female receptor\nG1,M1,F1\nG2,M2,F2\n",
        )
        .unwrap();
        let mut app = App::editor(MapSettings::default(), Palette::Distinct);
        app.start_catalog_load(path.clone());
        wait_for_catalog(&mut app);
        (app, Cleanup(path))
    }

    #[test]
    fn test_new_command_creates_map_with_dimensions() {
        let mut app = App::editor(MapSettings::default(), Palette::Distinct);
        assert!(!run(&mut app, "new 3 7"));
        assert_eq!(app.grid_size(), (3, 7));

        run(&mut app, "new 0 7");
        assert!(app.status_message.starts_with("Error"));
        assert_eq!(app.grid_size(), (3, 7));

        run(&mut app, "new x");
        assert!(app.status_message.starts_with("Usage"));
    }

    #[test]
    fn test_catalog_load_then_keyboard_assignment() {
        let (mut app, _cleanup) = editor_with_catalog();
        assert_eq!(app.workspace.catalog().len(), 2);

        run(&mut app, "new 2 3");
        run(&mut app, "start 500");
        app.start_keyboard_drag();
        app.move_cursor(0, 1);
        app.move_cursor(0, 1);
        assert_eq!(app.document().unwrap().selection().len(), 3);

        app.open_picker();
        assert_eq!(app.mode, Mode::Picker);
        app.picker_move(1);
        app.confirm_picker();

        assert_eq!(app.status_message, "Assigned G2 as plot 500 to 3 cells");
        let doc = app.document().unwrap();
        assert_eq!(doc.current_plot_number(), 501);
        assert!(doc.modified);
        assert_eq!(
            doc.grid().unwrap().get(CellPos::new(0, 2)).unwrap().plot_number,
            Some(500)
        );
    }

    #[test]
    fn test_picker_requires_selection() {
        let (mut app, _cleanup) = editor_with_catalog();
        app.new_map();
        app.open_picker();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.status_message, "Select cells first");
    }

    #[test]
    fn test_stale_catalog_result_is_ignored() {
        let mut app = App::editor(MapSettings::default(), Palette::Distinct);
        let stale = app.workspace.begin_catalog_load();
        let _latest = app.workspace.begin_catalog_load();
        let applied = app.apply_catalog_load(CatalogLoaded {
            ticket: stale,
            path: PathBuf::from("old.xlsx"),
            catalog: Catalog::empty(Palette::Distinct),
        });
        assert!(!applied);
        assert!(app.status_message.is_empty());
    }

    #[test]
    fn test_quit_with_unsaved_changes() {
        let (mut app, _cleanup) = editor_with_catalog();
        app.new_map();
        app.toggle_cursor_cell();
        app.open_picker();
        app.confirm_picker();
        assert!(!run(&mut app, "q"));
        assert!(app.status_message.starts_with("Unsaved changes"));
        assert!(!app.request_quit());
        assert!(app.request_quit());
        assert!(run(&mut app, "q!"));
    }

    #[test]
    fn test_replacing_unsaved_map_needs_confirmation() {
        let (mut app, _cleanup) = editor_with_catalog();
        let path = temp_path("other", "json");
        let _map_cleanup = Cleanup(path.clone());
        std::fs::write(&path, r#"{"columns": 1, "plantsPerColumn": 1, "grid": [[{}]]}"#)
            .unwrap();

        run(&mut app, "new 2 2");
        app.toggle_cursor_cell();
        app.open_picker();
        app.confirm_picker();
        assert!(app.workspace.modified());

        run(&mut app, "new 3 3");
        assert!(app.status_message.contains(":new!"));
        assert_eq!(app.grid_size(), (2, 2));
        run(&mut app, &format!("e {}", path.display()));
        assert!(app.status_message.contains(":e!"));
        assert_eq!(app.grid_size(), (2, 2));

        app.request_new_map();
        assert!(app.status_message.starts_with("Unsaved changes"));
        assert_eq!(app.document().unwrap().grid().unwrap().assigned_count(), 1);
        assert!(app.workspace.modified());

        run(&mut app, &format!("e! {}", path.display()));
        assert_eq!(app.grid_size(), (1, 1));
        assert!(!app.workspace.modified());
    }

    #[test]
    fn test_new_bang_discards_changes() {
        let (mut app, _cleanup) = editor_with_catalog();
        app.new_map();
        app.toggle_cursor_cell();
        app.open_picker();
        app.confirm_picker();

        run(&mut app, "new! 3 3");
        assert_eq!(app.grid_size(), (3, 3));
        assert_eq!(app.document().unwrap().grid().unwrap().assigned_count(), 0);
    }

    #[test]
    fn test_write_and_reopen_map() {
        let (mut app, _cleanup) = editor_with_catalog();
        let path = temp_path("map", "json");
        let _map_cleanup = Cleanup(path.clone());

        run(&mut app, "new 2 2");
        app.toggle_cursor_cell();
        app.open_picker();
        app.confirm_picker();
        assert!(run(&mut app, &format!("wq {}", path.display())));

        let mut viewer = App::viewer(Palette::Pastel, GridLayout::default());
        viewer.open_map(&path);
        assert!(viewer.notice.is_none());
        assert_eq!(viewer.grid_size(), (2, 2));
        assert_eq!(
            viewer.workspace.grid().unwrap().get(CellPos::new(0, 0)).unwrap().genotype.as_deref(),
            Some("G1")
        );
    }

    #[test]
    fn test_invalid_import_opens_notice() {
        let path = temp_path("broken", "json");
        let _cleanup = Cleanup(path.clone());
        std::fs::write(&path, r#"{"columns": 2}"#).unwrap();

        let mut app = App::editor(MapSettings::default(), Palette::Distinct);
        app.new_map();
        run(&mut app, &format!("e {}", path.display()));
        let notice = app.notice.clone().expect("notice");
        assert!(notice.starts_with("Invalid file format"));
        assert_eq!(app.grid_size(), (5, 5));
    }

    #[test]
    fn test_binary_map_opens_notice() {
        let path = temp_path("binary", "json");
        let _cleanup = Cleanup(path.clone());
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        let mut app = App::viewer(Palette::Pastel, GridLayout::default());
        app.open_map(&path);
        let notice = app.notice.clone().expect("notice");
        assert!(notice.starts_with("Invalid file format"), "{notice}");
    }

    #[test]
    fn test_viewer_rejects_editor_commands() {
        let mut app = App::viewer(Palette::Pastel, GridLayout::default());
        run(&mut app, "new 3 3");
        assert!(app.status_message.starts_with("Not available"));
        assert_eq!(app.grid_size(), (0, 0));
        assert!(run(&mut app, "q"));
    }

    #[test]
    fn test_viewer_rows_are_bottom_up() {
        let path = temp_path("view", "json");
        let _cleanup = Cleanup(path.clone());
        let mut doc = Document::default();
        doc.set_dimensions(1, 4).unwrap();
        doc.create_map().unwrap();
        doc.save_file_as(&path).unwrap();

        let mut app = App::viewer(Palette::Pastel, GridLayout::default());
        app.open_map(&path);
        assert_eq!(app.cursor_row, 3);
        assert_eq!(app.display_row(3), 0);
        assert_eq!(app.row_at_display(3), 0);
        app.move_cursor(0, 1);
        assert_eq!(app.cursor_row, 2);
    }

    #[test]
    fn test_drag_and_group_commands() {
        let mut app = App::editor(MapSettings::default(), Palette::Distinct);
        run(&mut app, "drag column");
        run(&mut app, "group grouped");
        let settings = app.document().unwrap().settings();
        assert_eq!(settings.drag_policy, DragPolicy::ColumnLocked);
        assert_eq!(settings.export_grouping, ExportGrouping::Grouped);
        run(&mut app, "drag sideways");
        assert_eq!(app.status_message, "Usage: :drag free|column");
    }

    #[test]
    fn test_export_unsupported_extension() {
        let mut app = App::editor(MapSettings::default(), Palette::Distinct);
        app.new_map();
        run(&mut app, "export map.ods");
        assert!(app.status_message.starts_with("Export error"));
    }

    #[test]
    fn test_detail_lines_follow_hover() {
        let (mut app, _cleanup) = editor_with_catalog();
        app.new_map();
        app.toggle_cursor_cell();
        app.open_picker();
        app.confirm_picker();

        app.hover = Some(CellPos::new(1, 1));
        assert_eq!(app.detail_lines(), vec!["Cell C2/R2", "Unassigned"]);
        app.hover = None;
        let lines = app.detail_lines();
        assert_eq!(lines[0], "Cell C1/R1");
        assert_eq!(lines[1], "Genotype: G1");
        assert_eq!(lines.last().map(String::as_str), Some("Plot number: 1000"));
    }
}
