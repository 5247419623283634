use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::prelude::*;
use std::io;
use std::time::Duration;

use super::actions::{ApplyResult, apply_action, handle_command_text};
use super::app::{App, Mode, Workspace};
use super::keymap::translate;
use super::ui;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) fn handle_mouse_event(app: &mut App, terminal_area: Rect, mouse: MouseEvent) {
    if app.help_modal || app.notice.is_some() {
        return;
    }
    // A release ends the gesture wherever it lands, keyboard drags included.
    if mouse.kind == MouseEventKind::Up(MouseButton::Left) {
        if app.mode == Mode::Visual {
            app.end_keyboard_drag();
        } else if let Workspace::Editor(doc) = &mut app.workspace {
            doc.pointer_up();
        }
        return;
    }
    if matches!(app.mode, Mode::Command | Mode::Picker) {
        return;
    }

    let [_info_area, body_area, _status_area] = ui::split_main_chunks(terminal_area);
    let [grid_area, _detail_area] = ui::split_body(body_area);
    let pos = ui::grid_cell_at(app, grid_area, mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Moved => app.hover = pos,
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(pos) = pos else {
                return;
            };
            app.hover = Some(pos);
            app.set_cursor(pos);
            let touch = app.touch;
            if let Workspace::Editor(doc) = &mut app.workspace {
                if touch {
                    doc.tap(pos);
                } else {
                    doc.pointer_down(pos, mouse.modifiers.contains(KeyModifiers::SHIFT));
                }
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(pos) = pos else {
                return;
            };
            app.hover = Some(pos);
            if let Workspace::Editor(doc) = &mut app.workspace {
                doc.pointer_enter(pos);
            }
        }
        _ => {}
    }
}

/// Returns `true` if the application should quit.
pub(crate) fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    // Notice modal: any key dismisses it
    if app.notice.is_some() {
        app.close_notice();
        return false;
    }

    // Help modal takes over input
    if app.help_modal {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => app.close_help_modal(),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_help_by(1),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_help_by(-1),
            KeyCode::PageDown => app.scroll_help_by(12),
            KeyCode::PageUp => app.scroll_help_by(-12),
            KeyCode::Home | KeyCode::Char('g') => app.help_scroll = 0,
            _ => {}
        }
        return false;
    }

    if app.mode != Mode::Command {
        app.status_message.clear();
    }

    if let Some(action) = translate(app.mode, app.is_viewer(), key) {
        return apply_action(app, action) == ApplyResult::Quit;
    }

    // Text entry fallback (not bound in the keymap).
    if app.mode == Mode::Command {
        handle_command_text(app, key);
    }
    false
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.poll_catalog_loads();
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                // Only process key press events (Windows reports Press + Release)
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(app, key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => {
                let size = terminal.size()?;
                let terminal_area = Rect::new(0, 0, size.width, size.height);
                handle_mouse_event(app, terminal_area, mouse);
            }
            _ => {}
        }
    }
}
