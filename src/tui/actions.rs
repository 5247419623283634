use crossterm::event::{self, KeyCode, KeyModifiers};

use super::app::{App, Mode};
use super::keymap::Action;

/// Byte offset of the character before `cursor`.
fn prev_boundary(buffer: &str, cursor: usize) -> usize {
    buffer[..cursor].char_indices().next_back().map_or(0, |(i, _)| i)
}

/// Byte offset just past the character at `cursor`.
fn next_boundary(buffer: &str, cursor: usize) -> usize {
    buffer[cursor..].chars().next().map_or(cursor, |c| cursor + c.len_utf8())
}

/// Line editing for the command buffer. `cursor` is a byte offset on a char boundary.
fn handle_text_input(buffer: &mut String, cursor: &mut usize, key: event::KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Left => *cursor = prev_boundary(buffer, *cursor),
        KeyCode::Right => *cursor = next_boundary(buffer, *cursor),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = buffer.len(),
        KeyCode::Backspace => erase_before(buffer, cursor),
        KeyCode::Char('h') if ctrl => erase_before(buffer, cursor),
        // Ctrl-U drops everything left of the cursor
        KeyCode::Char('u') if ctrl => {
            buffer.drain(..*cursor);
            *cursor = 0;
        }
        KeyCode::Delete => {
            let end = next_boundary(buffer, *cursor);
            buffer.drain(*cursor..end);
        }
        KeyCode::Char(c) if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() => {
            buffer.insert(*cursor, c);
            *cursor += c.len_utf8();
        }
        _ => {}
    }
}

fn erase_before(buffer: &mut String, cursor: &mut usize) {
    let start = prev_boundary(buffer, *cursor);
    buffer.drain(start..*cursor);
    *cursor = start;
}

/// Result of applying an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyResult {
    Continue,
    Quit,
}

/// Apply an action to the application state.
///
/// Returns `ApplyResult::Quit` if the application should exit.
pub fn apply_action(app: &mut App, action: Action) -> ApplyResult {
    // Any other key withdraws a pending confirmation.
    if action != Action::Quit {
        app.confirm_quit = false;
    }
    if action != Action::NewMap {
        app.confirm_discard = false;
    }
    match action {
        Action::Cancel => app.cancel(),
        Action::EnterCommand => {
            if app.mode == Mode::Visual {
                app.end_keyboard_drag();
            }
            app.mode = Mode::Command;
            app.command_buffer.clear();
            app.command_cursor = 0;
        }
        Action::ExecuteCommand => {
            if app.execute_command() {
                return ApplyResult::Quit;
            }
        }
        Action::Move(dx, dy) => app.move_cursor(dx, dy),
        Action::ToggleCell => app.toggle_cursor_cell(),
        Action::StartDrag => app.start_keyboard_drag(),
        Action::EndDrag => app.end_keyboard_drag(),
        Action::OpenPicker => app.open_picker(),
        Action::PickerMove(delta) => app.picker_move(delta),
        Action::ConfirmPicker => app.confirm_picker(),
        Action::NewMap => app.request_new_map(),
        Action::OpenHelp => app.help_modal = true,
        Action::Quit => {
            if app.request_quit() {
                return ApplyResult::Quit;
            }
        }
    }
    ApplyResult::Continue
}

pub fn handle_command_text(app: &mut App, key: event::KeyEvent) {
    handle_text_input(&mut app.command_buffer, &mut app.command_cursor, key);
}
