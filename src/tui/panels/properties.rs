// SPDX-License-Identifier: MIT
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::layout::{Panel, PanelBody};
use crate::tui::theme::Theme;

const PREVIEW_HINTS: &str =
    "h/v add  H/V nested  d remove  t direction  a admin  1/2/3 scroll  +/- size  r role  g script  Tab focus  q quit";
const EDITOR_HINTS: &str = "Esc leave editor  Shift-Tab next surface  Ctrl-C quit";

/// Summary lines for the property bar.
#[must_use]
pub fn describe(panel: &Panel) -> [String; 2] {
    let scroll = panel
        .scroll
        .filter(|s| s.enabled)
        .map_or_else(|| "off".to_owned(), |s| s.direction.to_string());
    let clamp = |value: Option<f64>| value.map_or_else(|| "-".to_owned(), |v| format!("{v}"));
    let first = format!(
        "{}  size {:.1}  min {}  max {}  admin-only {}  scroll {scroll}",
        panel.id,
        panel.default_size,
        clamp(panel.min_size),
        clamp(panel.max_size),
        if panel.is_admin_only { "yes" } else { "no" },
    );
    let second = match &panel.body {
        PanelBody::Leaf(leaf) => format!(
            "leaf  content {:?}  container {:?}  text {:?}",
            leaf.content.as_deref().unwrap_or_default(),
            leaf.container_class.as_deref().unwrap_or_default(),
            leaf.text_class.as_deref().unwrap_or_default(),
        ),
        PanelBody::Container(nested) => format!(
            "container  {} with {} panel(s)",
            nested.direction,
            nested.panels.len()
        ),
    };
    [first, second]
}

pub fn render(
    frame: &mut ratatui::Frame,
    area: Rect,
    selected: Option<&Panel>,
    status: &str,
    editing: bool,
    theme: &Theme,
) {
    let block = Block::default()
        .title("Properties")
        .borders(Borders::ALL)
        .border_style(theme.border_normal)
        .title_style(theme.title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width < 2 {
        return;
    }

    let mut lines: Vec<Line<'_>> = match selected {
        Some(panel) => describe(panel).into_iter().map(Line::from).collect(),
        None => vec![Line::from(Span::styled(
            "No panel selected; new panels go to the root",
            theme.placeholder,
        ))],
    };
    lines.push(Line::from(status.to_owned()));
    lines.push(Line::from(Span::styled(
        if editing { EDITOR_HINTS } else { PREVIEW_HINTS },
        theme.hint,
    )));
    frame.render_widget(Paragraph::new(lines), inner);
}
