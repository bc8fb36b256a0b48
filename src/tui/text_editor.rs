// SPDX-License-Identifier: MIT
//! Rope-backed multi-line editing buffer for the text surfaces.
//!
//! The cursor is a (line, char) pair; terminal placement goes through
//! display widths so wide glyphs take two cells.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ropey::{Rope, RopeSlice};
use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 2;

#[derive(Debug, Clone)]
pub struct TextEditor {
    rope: Rope,
    row: usize,
    col: usize,
    scroll: usize,
    hscroll: usize,
}

impl TextEditor {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            row: 0,
            col: 0,
            scroll: 0,
            hscroll: 0,
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// (line, char within line)
    #[must_use]
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    #[must_use]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    #[must_use]
    pub fn hscroll(&self) -> usize {
        self.hscroll
    }

    /// Display column of the cursor, in terminal cells from the line start.
    #[must_use]
    pub fn cursor_column(&self) -> usize {
        self.content(self.row).chars().take(self.col).map(cell_width).sum()
    }

    /// Replaces the content, keeping the cursor where it was when possible.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.row = self.row.min(self.line_count() - 1);
        self.col = self.col.min(self.line_len(self.row));
    }

    /// The cells of `row` that fall inside a viewport `width` cells wide,
    /// starting at the horizontal scroll offset. A wide glyph cut by either
    /// edge is replaced by blanks.
    #[must_use]
    pub fn visible_line(&self, row: usize, width: usize) -> String {
        let mut out = String::new();
        if row >= self.line_count() {
            return out;
        }
        let end = self.hscroll + width;
        let mut x = 0;
        for c in self.content(row).chars() {
            let (start, stop) = (x, x + cell_width(c));
            x = stop;
            if start >= end {
                break;
            }
            if stop <= self.hscroll {
                continue;
            }
            if start < self.hscroll || stop > end {
                let shown = stop.min(end) - start.max(self.hscroll);
                out.extend(std::iter::repeat_n(' ', shown));
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Applies one key press. Returns `true` if the text changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(c);
                true
            }
            KeyCode::Tab => {
                for _ in 0..TAB_WIDTH {
                    self.insert_char(' ');
                }
                true
            }
            KeyCode::Enter => {
                self.insert_char('\n');
                self.row += 1;
                self.col = 0;
                true
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.move_left();
                false
            }
            KeyCode::Right => {
                self.move_right();
                false
            }
            KeyCode::Up => {
                self.move_vertical(false);
                false
            }
            KeyCode::Down => {
                self.move_vertical(true);
                false
            }
            KeyCode::Home => {
                self.col = 0;
                false
            }
            KeyCode::End => {
                self.col = self.line_len(self.row);
                false
            }
            _ => false,
        }
    }

    /// Keeps the cursor inside a viewport of `width` x `height` cells.
    pub fn scroll_to_cursor(&mut self, width: usize, height: usize) {
        if height > 0 {
            if self.row < self.scroll {
                self.scroll = self.row;
            } else if self.row >= self.scroll + height {
                self.scroll = self.row + 1 - height;
            }
        }
        if width > 0 {
            let column = self.cursor_column();
            if column < self.hscroll {
                self.hscroll = column;
            } else if column >= self.hscroll + width {
                self.hscroll = column + 1 - width;
            }
        }
    }

    /// Line `row` without its line break.
    fn content(&self, row: usize) -> RopeSlice<'_> {
        let line = self.rope.line(row);
        line.slice(..line_len(line))
    }

    fn line_len(&self, row: usize) -> usize {
        if row < self.line_count() {
            line_len(self.rope.line(row))
        } else {
            0
        }
    }

    fn char_index(&self) -> usize {
        self.rope.line_to_char(self.row) + self.col
    }

    fn insert_char(&mut self, c: char) {
        self.rope.insert_char(self.char_index(), c);
        self.col += 1;
    }

    fn backspace(&mut self) -> bool {
        if self.col > 0 {
            let index = self.char_index();
            self.rope.remove(index - 1..index);
            self.col -= 1;
            true
        } else if self.row > 0 {
            let start = self.rope.line_to_char(self.row - 1) + self.line_len(self.row - 1);
            let end = self.rope.line_to_char(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.rope.remove(start..end);
            true
        } else {
            false
        }
    }

    fn delete(&mut self) -> bool {
        let index = self.char_index();
        if self.col < self.line_len(self.row) {
            self.rope.remove(index..=index);
            true
        } else if self.row + 1 < self.line_count() {
            let next = self.rope.line_to_char(self.row + 1);
            self.rope.remove(index..next);
            true
        } else {
            false
        }
    }

    fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.line_count() {
            self.row += 1;
            self.col = 0;
        }
    }

    fn move_vertical(&mut self, down: bool) {
        if down && self.row + 1 < self.line_count() {
            self.row += 1;
        } else if !down && self.row > 0 {
            self.row -= 1;
        }
        self.col = self.col.min(self.line_len(self.row));
    }
}

/// Chars in `line` before its trailing line break, if any.
fn line_len(line: RopeSlice<'_>) -> usize {
    let mut len = line.len_chars();
    while len > 0 && is_line_break(line.char(len - 1)) {
        len -= 1;
    }
    len
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

fn cell_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(editor: &mut TextEditor, code: KeyCode) -> bool {
        editor.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(editor: &mut TextEditor, text: &str) {
        for c in text.chars() {
            press(editor, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_and_newlines() {
        let mut editor = TextEditor::new("");
        type_str(&mut editor, "{");
        press(&mut editor, KeyCode::Enter);
        type_str(&mut editor, "}");
        assert_eq!(editor.text(), "{\n}");
        assert_eq!(editor.cursor(), (1, 1));
        assert_eq!(editor.line_count(), 2);
    }

    #[test]
    fn backspace_joins_lines() {
        let mut editor = TextEditor::new("ab\ncd");
        press(&mut editor, KeyCode::Down);
        assert_eq!(editor.cursor(), (1, 0));
        assert!(press(&mut editor, KeyCode::Backspace));
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.cursor(), (0, 2));
        press(&mut editor, KeyCode::Home);
        assert!(!press(&mut editor, KeyCode::Backspace));
    }

    #[test]
    fn crlf_is_removed_as_one_break() {
        let mut editor = TextEditor::new("ab\r\ncd");
        press(&mut editor, KeyCode::End);
        assert_eq!(editor.cursor(), (0, 2));
        assert!(press(&mut editor, KeyCode::Delete));
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn delete_at_line_end_pulls_next_line() {
        let mut editor = TextEditor::new("ab\ncd");
        press(&mut editor, KeyCode::End);
        assert!(press(&mut editor, KeyCode::Delete));
        assert_eq!(editor.text(), "abcd");
        press(&mut editor, KeyCode::End);
        assert!(!press(&mut editor, KeyCode::Delete));
    }

    #[test]
    fn multibyte_characters_are_edited_by_char() {
        let mut editor = TextEditor::new("héllo");
        press(&mut editor, KeyCode::Right);
        press(&mut editor, KeyCode::Right);
        press(&mut editor, KeyCode::Backspace);
        assert_eq!(editor.text(), "hllo");
        type_str(&mut editor, "ü");
        assert_eq!(editor.text(), "hüllo");
    }

    #[test]
    fn wide_glyphs_take_two_cells() {
        let mut editor = TextEditor::new("你好x");
        press(&mut editor, KeyCode::Right);
        press(&mut editor, KeyCode::Right);
        assert_eq!(editor.cursor(), (0, 2));
        assert_eq!(editor.cursor_column(), 4);
        press(&mut editor, KeyCode::End);
        assert_eq!(editor.cursor_column(), 5);
    }

    #[test]
    fn long_line_scrolls_horizontally() {
        let line = format!("{}Z", "a".repeat(60));
        let mut editor = TextEditor::new(&line);
        press(&mut editor, KeyCode::End);
        editor.scroll_to_cursor(28, 4);
        assert_eq!(editor.hscroll(), 61 + 1 - 28);
        let visible = editor.visible_line(0, 28);
        assert!(visible.ends_with('Z'));
        assert!(editor.cursor_column() - editor.hscroll() < 28);

        press(&mut editor, KeyCode::Home);
        editor.scroll_to_cursor(28, 4);
        assert_eq!(editor.hscroll(), 0);
        assert_eq!(editor.visible_line(0, 28), "a".repeat(28));
    }

    #[test]
    fn wide_glyph_cut_by_viewport_edge_is_blanked() {
        let mut editor = TextEditor::new("a你b");
        assert_eq!(editor.visible_line(0, 2), "a ");
        press(&mut editor, KeyCode::End);
        editor.scroll_to_cursor(2, 1);
        assert_eq!(editor.hscroll(), 3);
        assert_eq!(editor.visible_line(0, 2), "b");
        editor.hscroll = 2;
        assert_eq!(editor.visible_line(0, 2), " b");
    }

    #[test]
    fn set_text_clamps_cursor() {
        let mut editor = TextEditor::new("one\ntwo\nthree");
        press(&mut editor, KeyCode::Down);
        press(&mut editor, KeyCode::Down);
        press(&mut editor, KeyCode::End);
        editor.set_text("x");
        assert_eq!(editor.cursor(), (0, 1));
    }

    #[test]
    fn control_chords_are_not_inserted() {
        let mut editor = TextEditor::new("");
        let changed = editor.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(!changed);
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut editor = TextEditor::new("1\n2\n3\n4\n5");
        for _ in 0..4 {
            press(&mut editor, KeyCode::Down);
        }
        editor.scroll_to_cursor(10, 2);
        assert_eq!(editor.scroll(), 3);
        for _ in 0..4 {
            press(&mut editor, KeyCode::Up);
        }
        editor.scroll_to_cursor(10, 2);
        assert_eq!(editor.scroll(), 0);
    }
}
