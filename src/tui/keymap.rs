//! Key translation layer.
//!
//! This keeps key handling separate from app behavior. Text entry in the
//! command line is not bound here; unbound keys fall through to the buffer.

use crossterm::event::{KeyCode, KeyEvent};

use super::app::Mode;

/// Actions that can be triggered by key presses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Close the command line, picker or keyboard drag.
    Cancel,
    /// Enter Command mode (`:` prompt).
    EnterCommand,
    /// Execute the command in the command buffer.
    ExecuteCommand,
    /// Move cursor by (dx, dy) in screen direction.
    Move(i32, i32),
    /// Toggle the cursor cell in the selection.
    ToggleCell,
    /// Start a keyboard drag at the cursor.
    StartDrag,
    /// End the keyboard drag.
    EndDrag,
    /// Open the genotype picker for the selection.
    OpenPicker,
    /// Move the picker highlight.
    PickerMove(i32),
    /// Assign the highlighted genotype.
    ConfirmPicker,
    /// Create a map with the current settings.
    NewMap,
    OpenHelp,
    Quit,
}

/// Translate a key event to an action for the current mode.
///
/// Returns `None` if the key has no binding in the current context. The
/// viewer has no selection, so selection keys are unbound there.
pub fn translate(mode: Mode, viewer: bool, key: KeyEvent) -> Option<Action> {
    match mode {
        Mode::Normal => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Move(0, -1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Move(0, 1)),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::Move(-1, 0)),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::Move(1, 0)),

            KeyCode::Char(':') => Some(Action::EnterCommand),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('q') => Some(Action::Quit),

            KeyCode::Char(' ') if !viewer => Some(Action::ToggleCell),
            KeyCode::Char('v') if !viewer => Some(Action::StartDrag),
            KeyCode::Char('a') | KeyCode::Enter if !viewer => Some(Action::OpenPicker),
            KeyCode::Char('n') if !viewer => Some(Action::NewMap),
            KeyCode::Esc if !viewer => Some(Action::Cancel),
            _ => None,
        },

        Mode::Visual => match key.code {
            KeyCode::Esc | KeyCode::Char('v') => Some(Action::EndDrag),

            KeyCode::Up | KeyCode::Char('k') => Some(Action::Move(0, -1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Move(0, 1)),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::Move(-1, 0)),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::Move(1, 0)),

            KeyCode::Char('a') | KeyCode::Enter => Some(Action::OpenPicker),
            _ => None,
        },

        Mode::Picker => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::ConfirmPicker),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::PickerMove(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::PickerMove(1)),
            KeyCode::PageUp => Some(Action::PickerMove(-10)),
            KeyCode::PageDown => Some(Action::PickerMove(10)),
            _ => None,
        },

        Mode::Command => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::ExecuteCommand),
            _ => None,
        },
    }
}

/// One-line key summary for the status bar.
pub fn status_hint(mode: Mode, viewer: bool) -> &'static str {
    match (mode, viewer) {
        (_, true) => "hjkl:move  mouse:hover  :e <file>:open  ?:help  q:quit",
        (Mode::Visual, false) => "hjkl:extend  a:assign  v/Esc:end drag",
        (Mode::Picker, false) => "j/k:choose  Enter:assign  Esc:cancel",
        (Mode::Command, false) => "Enter:run  Esc:cancel",
        (Mode::Normal, false) => {
            "hjkl:move  Space:toggle  v:drag  a:assign  n:new map  :w:save  ?:help  q:quit"
        }
    }
}
