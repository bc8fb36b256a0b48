// SPDX-License-Identifier: MIT
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::layout::{Axis, ScrollAxis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Preview,
    Serialized,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    FocusNext,
    LeaveEditor,
    SelectNext,
    SelectPrev,
    ClearSelection,
    AddPanel(Axis),
    AddNestedPanel(Axis),
    RemoveSelected,
    ToggleDirection,
    ToggleAdminOnly,
    MakeScrollable(ScrollAxis),
    Grow,
    Shrink,
    ToggleRole,
    RegenerateScript,
    Click { column: u16, row: u16 },
    Edit(KeyEvent),
    None,
}

pub fn handle_key(key: KeyEvent, focus: Focus) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if focus != Focus::Preview {
        return match key.code {
            KeyCode::Esc => Action::LeaveEditor,
            KeyCode::BackTab => Action::FocusNext,
            _ => Action::Edit(key),
        };
    }
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Tab => Action::FocusNext,
        KeyCode::Esc => Action::ClearSelection,
        KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
        KeyCode::Up | KeyCode::Char('k') => Action::SelectPrev,
        KeyCode::Char('h') => Action::AddPanel(Axis::Horizontal),
        KeyCode::Char('v') => Action::AddPanel(Axis::Vertical),
        KeyCode::Char('H') => Action::AddNestedPanel(Axis::Horizontal),
        KeyCode::Char('V') => Action::AddNestedPanel(Axis::Vertical),
        KeyCode::Char('d') | KeyCode::Delete => Action::RemoveSelected,
        KeyCode::Char('t') => Action::ToggleDirection,
        KeyCode::Char('a') => Action::ToggleAdminOnly,
        KeyCode::Char('1') => Action::MakeScrollable(ScrollAxis::Horizontal),
        KeyCode::Char('2') => Action::MakeScrollable(ScrollAxis::Vertical),
        KeyCode::Char('3') => Action::MakeScrollable(ScrollAxis::Both),
        KeyCode::Char('+' | '=') => Action::Grow,
        KeyCode::Char('-' | '_') => Action::Shrink,
        KeyCode::Char('r') => Action::ToggleRole,
        KeyCode::Char('g') => Action::RegenerateScript,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn preview_keys_map_to_edits() {
        assert_eq!(handle_key(key(KeyCode::Char('v')), Focus::Preview), Action::AddPanel(Axis::Vertical));
        assert_eq!(
            handle_key(key(KeyCode::Char('H')), Focus::Preview),
            Action::AddNestedPanel(Axis::Horizontal)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('3')), Focus::Preview),
            Action::MakeScrollable(ScrollAxis::Both)
        );
        assert_eq!(handle_key(key(KeyCode::Char('z')), Focus::Preview), Action::None);
    }

    #[test]
    fn editor_focus_captures_text_keys() {
        let q = key(KeyCode::Char('q'));
        assert_eq!(handle_key(q, Focus::Serialized), Action::Edit(q));
        assert_eq!(handle_key(key(KeyCode::Esc), Focus::Script), Action::LeaveEditor);
        let tab = key(KeyCode::Tab);
        assert_eq!(handle_key(tab, Focus::Script), Action::Edit(tab));
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(ctrl_c, Focus::Preview), Action::Quit);
        assert_eq!(handle_key(ctrl_c, Focus::Serialized), Action::Quit);
    }
}
