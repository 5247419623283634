//! UI rendering

use super::app::{App, Mode, drag_label, grouping_label};
use super::help::{get_about_help, get_commands_help, get_help_text};
use super::keymap::status_hint;
use plotmap_core::{CellPos, GenotypeRecord};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use std::collections::BTreeSet;

pub(crate) const INFO_BAR_HEIGHT: u16 = 3;
pub(crate) const GRID_MIN_HEIGHT: u16 = 10;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;
pub(crate) const DETAIL_PANEL_WIDTH: u16 = 34;
pub(crate) const ROW_HEADER_WIDTH: u16 = 4;
pub(crate) const GRID_COLUMN_SPACING: u16 = 1;
pub(crate) const CELL_WIDTH: u16 = 6;

pub(crate) fn split_main_chunks(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(INFO_BAR_HEIGHT),
            Constraint::Min(GRID_MIN_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Grid panel on the left, detail panel on the right.
pub(crate) fn split_body(area: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(DETAIL_PANEL_WIDTH)])
        .split(area);
    [chunks[0], chunks[1]]
}

pub(crate) fn grid_cell_at(
    app: &App,
    grid_area: Rect,
    mouse_col: u16,
    mouse_row: u16,
) -> Option<CellPos> {
    if grid_area.width < 3 || grid_area.height < 4 {
        return None;
    }

    let inner_x = grid_area.x.saturating_add(1);
    let inner_y = grid_area.y.saturating_add(1);
    let inner_width = grid_area.width.saturating_sub(2);
    let inner_height = grid_area.height.saturating_sub(2);
    let inner_right = inner_x.saturating_add(inner_width);
    let inner_bottom = inner_y.saturating_add(inner_height);

    if mouse_col < inner_x
        || mouse_col >= inner_right
        || mouse_row < inner_y
        || mouse_row >= inner_bottom
    {
        return None;
    }

    // Header row holds column numbers, not plots.
    if inner_height <= 1 || mouse_row == inner_y {
        return None;
    }

    let (max_cols, max_rows) = app.grid_size();
    let rel_row = mouse_row.saturating_sub(inner_y.saturating_add(1)) as usize;
    if rel_row >= app.visible_rows {
        return None;
    }
    let display = app.viewport_row.saturating_add(rel_row);
    if display >= max_rows {
        return None;
    }

    let first_cell_x = inner_x
        .saturating_add(ROW_HEADER_WIDTH)
        .saturating_add(GRID_COLUMN_SPACING);
    if mouse_col < first_cell_x {
        return None;
    }
    let rel_x = mouse_col - first_cell_x;
    let stride = CELL_WIDTH + GRID_COLUMN_SPACING;
    if rel_x % stride >= CELL_WIDTH {
        return None;
    }
    let offset = (rel_x / stride) as usize;
    if offset >= app.visible_cols {
        return None;
    }
    let col = app.viewport_col + offset;
    if col >= max_cols {
        return None;
    }

    Some(CellPos::new(col, app.row_at_display(display)))
}

/// Axis label for a 0-based index. The viewer labels 1 and every fifth index.
fn axis_label(index: usize, viewer: bool) -> String {
    let n = index + 1;
    if !viewer || n == 1 || n % 5 == 0 {
        n.to_string()
    } else {
        String::new()
    }
}

fn genotype_color(genotype: &GenotypeRecord) -> Color {
    match genotype.rgb() {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Color::Gray,
    }
}

/// Draw the application UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let [info_area, body_area, status_area] = split_main_chunks(f.area());
    let [grid_area, detail_area] = split_body(body_area);

    // Update visible dimensions based on actual size. The viewer repeats
    // its axes on the right and bottom edges.
    let mirrored = u16::from(app.is_viewer());
    let available_width = grid_area
        .width
        .saturating_sub((ROW_HEADER_WIDTH + GRID_COLUMN_SPACING) * (1 + mirrored) + 2)
        as usize;
    let available_height = grid_area.height.saturating_sub(3 + mirrored) as usize; // headers + borders
    app.visible_cols = (available_width / (CELL_WIDTH + GRID_COLUMN_SPACING) as usize).max(1);
    app.visible_rows = available_height.max(1);
    app.update_viewport();

    draw_info_bar(f, app, info_area);
    draw_grid(f, app, grid_area);
    draw_detail_panel(f, app, detail_area);
    draw_status_bar(f, app, status_area);

    if app.mode == Mode::Picker {
        draw_picker(f, app);
    }
    if let Some(detail) = app.notice.as_deref() {
        draw_notice(f, detail);
    }
    if app.help_modal {
        draw_help_modal(f, app);
    }
}

fn draw_info_bar(f: &mut Frame, app: &App, area: Rect) {
    let (cols, rows) = app.grid_size();
    let content = match (app.mode, app.document()) {
        (Mode::Command, _) => {
            let (before, after) = app.command_buffer.split_at(app.command_cursor);
            format!(":{}│{}", before, after)
        }
        (_, None) => {
            if cols == 0 {
                "No map loaded. Use :e <file.json>".to_string()
            } else {
                format!(
                    "{} columns x {} plants  |  {} genotypes",
                    cols,
                    rows,
                    app.workspace.catalog().len()
                )
            }
        }
        (_, Some(doc)) => {
            let settings = doc.settings();
            let size = if doc.grid().is_some() {
                format!("{} x {}", cols, rows)
            } else {
                format!("no map ({} x {} on n)", settings.columns, settings.plants_per_column)
            };
            format!(
                "{}  |  next plot {}  |  genotype {}  |  selected {}  |  drag {}  |  export {}",
                size,
                doc.current_plot_number(),
                doc.chosen_genotype().unwrap_or("-"),
                doc.selection().len(),
                drag_label(settings.drag_policy),
                grouping_label(settings.export_grouping),
            )
        }
    };

    let title = match (app.mode, app.is_viewer()) {
        (Mode::Command, _) => " Command ",
        (_, true) => " Viewer ",
        (Mode::Visual, false) => " Drag ",
        (Mode::Picker, false) => " Assign ",
        (Mode::Normal, false) => " Editor ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(match app.mode {
            Mode::Command => Color::Cyan,
            Mode::Visual => Color::Magenta,
            Mode::Picker => Color::Yellow,
            Mode::Normal => Color::White,
        }));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn draw_grid(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Field ");
    let Some(grid) = app.workspace.grid() else {
        let hint = if app.is_viewer() {
            "Open a map with :e <file.json>"
        } else {
            "Press n to create a map"
        };
        f.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    };
    let viewer = app.is_viewer();
    let (max_cols, max_rows) = (grid.column_count(), grid.rows_per_column());
    let last_col = (app.viewport_col + app.visible_cols).min(max_cols);
    let last_display = (app.viewport_row + app.visible_rows).min(max_rows);
    let header_style = |active: bool| {
        if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let column_labels = || {
        let mut cells = vec![Cell::from(" ")]; // Corner
        for col in app.viewport_col..last_col {
            cells.push(Cell::from(axis_label(col, viewer)).style(header_style(col == app.cursor_col)));
        }
        Row::new(cells).height(1)
    };

    let selection = app.document().map(|doc| doc.selection());
    let mut rows = Vec::new();
    for display in app.viewport_row..last_display {
        let row = app.row_at_display(display);
        let mut cells =
            vec![Cell::from(axis_label(row, viewer)).style(header_style(row == app.cursor_row))];

        for col in app.viewport_col..last_col {
            let pos = CellPos::new(col, row);
            let Some(cell) = grid.get(pos) else {
                continue;
            };
            let text = match cell.plot_number {
                Some(plot) => plot.to_string(),
                None if cell.genotype.is_some() => "?".to_string(),
                None => "·".to_string(),
            };

            let mut style = match app.workspace.lookup_genotype(pos) {
                Some(genotype) => Style::default().fg(Color::Black).bg(genotype_color(genotype)),
                None if cell.genotype.is_some() => Style::default().fg(Color::Red),
                None => Style::default().fg(Color::DarkGray),
            };
            if selection.is_some_and(|s| s.contains(pos)) {
                style = style
                    .fg(Color::White)
                    .bg(Color::Blue)
                    .add_modifier(Modifier::BOLD);
            }
            if app.hover == Some(pos) {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if pos == app.cursor_pos() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            cells.push(Cell::from(text).style(style));
        }
        if viewer {
            cells.push(Cell::from(axis_label(row, viewer)).style(header_style(row == app.cursor_row)));
        }
        rows.push(Row::new(cells));
    }

    let mut widths = vec![Constraint::Length(ROW_HEADER_WIDTH)];
    widths.extend((app.viewport_col..last_col).map(|_| Constraint::Length(CELL_WIDTH)));
    if viewer {
        widths.push(Constraint::Length(ROW_HEADER_WIDTH));
    }

    let mut table = Table::new(rows, widths)
        .header(column_labels())
        .block(block)
        .column_spacing(GRID_COLUMN_SPACING);
    if viewer {
        table = table.footer(column_labels());
    }
    f.render_widget(table, area);
}

fn draw_detail_panel(f: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = app.detail_lines().into_iter().map(Line::from).collect();

    let catalog = app.workspace.catalog();
    let used: BTreeSet<&str> = app
        .workspace
        .grid()
        .map(|grid| grid.iter().filter_map(|c| c.genotype.as_deref()).collect())
        .unwrap_or_default();
    if !used.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Legend",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for genotype in catalog.records().iter().filter(|g| used.contains(g.identifier.as_str())) {
            lines.push(Line::from(vec![
                Span::styled("  ", Style::default().bg(genotype_color(genotype))),
                Span::raw(format!(" {}", genotype.identifier)),
            ]));
        }
    }

    let block = Block::default().borders(Borders::ALL).title(" Plot ");
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn draw_picker(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 70, f.area());
    let modal_style = Style::default().fg(Color::White).bg(Color::Black);
    let selected = app.document().map(|d| d.selection().len()).unwrap_or(0);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Genotype for {} cells ", selected))
        .border_style(Style::default().fg(Color::Yellow))
        .style(modal_style);

    let visible = area.height.saturating_sub(2).max(1) as usize;
    let first = app.picker_index.saturating_sub(visible - 1);
    let lines: Vec<Line> = app
        .workspace
        .catalog()
        .records()
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(i, genotype)| {
            let text = format!(
                " {}  ({} x {})",
                genotype.identifier, genotype.male_parent_label, genotype.female_parent_label
            );
            let style = if i == app.picker_index {
                Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled("  ", Style::default().bg(genotype_color(genotype))),
                Span::styled(text, style),
            ])
        })
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block).style(modal_style), area);
}

fn draw_notice(f: &mut Frame, detail: &str) {
    let area = centered_rect(60, 30, f.area());
    let modal_style = Style::default().fg(Color::White).bg(Color::Black);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Import failed ")
        .border_style(Style::default().fg(Color::Red))
        .style(modal_style);
    let lines = vec![
        Line::from(Span::styled(
            "Invalid file format.",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(detail.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(modal_style)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let file_info = if let Some(path) = app.workspace.file_path() {
        let modified_indicator = if app.workspace.modified() { " [+]" } else { "" };
        format!("{}{}", path.display(), modified_indicator)
    } else if app.workspace.modified() {
        "[New Map] [+]".to_string()
    } else {
        "[New Map]".to_string()
    };

    let status = if !app.status_message.is_empty() {
        app.status_message.clone()
    } else {
        format!("{}  |  {}", file_info, status_hint(app.mode, app.is_viewer()))
    };

    let style = if app.status_message.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else if !app.status_message.is_empty() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    f.render_widget(Paragraph::new(Line::from(Span::styled(status, style))), area);
}

fn help_lines(title: &str, texts: Vec<String>) -> Vec<Line<'static>> {
    texts
        .into_iter()
        .map(|text| {
            let style = if text == title {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if text.starts_with("  ") {
                Style::default().fg(Color::White)
            } else {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            };
            Line::from(Span::styled(text, style))
        })
        .collect()
}

fn draw_help_modal(f: &mut Frame, app: &App) {
    let area = centered_rect(88, 88, f.area());
    let modal_style = Style::default().fg(Color::White).bg(Color::Black);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" About Plotmap ")
        .border_style(Style::default().fg(Color::Green))
        .style(modal_style);

    let viewer = app.is_viewer();
    let mut lines = help_lines("About Plotmap", get_about_help(viewer));
    lines.push(Line::from(""));
    lines.extend(help_lines("", get_help_text(viewer)));
    lines.push(Line::from(""));
    lines.extend(help_lines("Commands", get_commands_help(viewer)));

    let viewport_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(viewport_height);
    let effective_scroll = app.help_scroll.min(max_scroll);
    let scroll_y = u16::try_from(effective_scroll).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(modal_style)
        .scroll((scroll_y, 0))
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}
