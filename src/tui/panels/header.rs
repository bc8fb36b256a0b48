// SPDX-License-Identifier: MIT
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::session::EditorSession;
use crate::tui::input::Focus;
use crate::tui::theme::Theme;

pub fn render(
    frame: &mut ratatui::Frame,
    area: Rect,
    session: &EditorSession,
    focus: Focus,
    theme: &Theme,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let version = env!("CARGO_PKG_VERSION");
    let tree = session.tree();
    let selected = session.selected().unwrap_or("none");
    let focus = match focus {
        Focus::Preview => "preview",
        Focus::Serialized => "json",
        Focus::Script => "script",
    };

    let text = format!(
        "panelwright v{version} | Role: {} | Panels: {} | Depth: {} | Selected: {selected} | Focus: {focus}",
        session.role(),
        tree.panel_count(),
        tree.depth(),
    );

    let line = Line::from(vec![Span::styled(
        format!("{text:<width$}", width = area.width as usize),
        theme.status_bar,
    )]);

    frame.render_widget(Paragraph::new(line), area);
}
