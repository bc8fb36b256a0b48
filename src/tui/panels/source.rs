// SPDX-License-Identifier: MIT
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::sync::SyncError;
use crate::tui::text_editor::TextEditor;
use crate::tui::theme::Theme;

/// Commit state of a text surface, shown under its editor.
pub enum SurfaceState<'a> {
    InSync,
    Pending,
    Failed(&'a SyncError),
    Disabled,
}

#[allow(clippy::cast_possible_truncation)]
pub fn render(
    frame: &mut ratatui::Frame,
    area: Rect,
    title: &str,
    editor: &mut TextEditor,
    state: &SurfaceState<'_>,
    focused: bool,
    theme: &Theme,
) {
    let block = Block::default()
        .title(title.to_owned())
        .borders(Borders::ALL)
        .border_style(if focused {
            theme.border_focused
        } else {
            theme.border_normal
        })
        .title_style(theme.title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 || inner.width < 2 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    let (text_area, status_area) = (rows[0], rows[1]);

    let (width, height) = (usize::from(text_area.width), usize::from(text_area.height));
    editor.scroll_to_cursor(width, height);
    let scroll = editor.scroll();
    let lines: Vec<Line<'_>> = (scroll..editor.line_count().min(scroll + height))
        .map(|row| Line::from(editor.visible_line(row, width)))
        .collect();
    frame.render_widget(Paragraph::new(lines), text_area);

    if focused {
        let (row, _) = editor.cursor();
        let x = text_area.x + (editor.cursor_column() - editor.hscroll()) as u16;
        let y = text_area.y + (row - scroll) as u16;
        frame.set_cursor_position(Position::new(x, y));
    }

    let status = match state {
        SurfaceState::InSync => Span::styled("in sync", theme.hint),
        SurfaceState::Pending => Span::styled("pending...", theme.pending),
        SurfaceState::Failed(error) => Span::styled(error.to_string(), theme.diagnostic),
        SurfaceState::Disabled => Span::styled("script evaluation disabled", theme.hint),
    };
    frame.render_widget(Paragraph::new(Line::from(status)), status_area);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn draw(editor: &mut TextEditor) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                render(f, area, "src", editor, &SurfaceState::InSync, true, &Theme::default());
            })
            .unwrap();
        terminal
    }

    fn press(editor: &mut TextEditor, code: KeyCode) {
        editor.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn cursor_lands_after_wide_glyphs() {
        let mut editor = TextEditor::new("你好x");
        press(&mut editor, KeyCode::Right);
        press(&mut editor, KeyCode::Right);
        let mut terminal = draw(&mut editor);

        assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(5, 1));
        assert_eq!(terminal.backend().buffer()[(5u16, 1u16)].symbol(), "x");
    }

    #[test]
    fn end_of_long_line_stays_visible() {
        let mut editor = TextEditor::new(&format!("{}Z", "a".repeat(60)));
        press(&mut editor, KeyCode::End);
        let mut terminal = draw(&mut editor);

        let row: String = (0..30u16)
            .map(|x| terminal.backend().buffer()[(x, 1u16)].symbol().to_owned())
            .collect();
        assert!(row.contains('Z'), "row was {row:?}");
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor.y, 1);
        assert!(cursor.x < 29);
    }
}
