// SPDX-License-Identifier: MIT
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

use crate::layout::visibility::Role;
use crate::layout::{Axis, Layout, LeafContent};
use crate::render::{PaneGroup, PaneSpec, PaneView, render_for_role};
use crate::tui::theme::{ADMIN_TAG, SCROLL_MARKERS, SELECTED_MARKER, Theme};

/// Screen rectangle occupied by a panel, recorded for mouse hit-testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneHit {
    pub area: Rect,
    pub id: String,
}

/// Innermost panel under `(column, row)`. Nested panes are recorded after
/// their container, so the last hit wins.
#[must_use]
pub fn hit_test(hits: &[PaneHit], column: u16, row: u16) -> Option<&str> {
    hits.iter()
        .rev()
        .find(|hit| hit.area.contains((column, row).into()))
        .map(|hit| hit.id.as_str())
}

/// Draws panes straight into a ratatui [`Buffer`].
pub struct BufferPanes<'a> {
    buf: &'a mut Buffer,
    theme: &'a Theme,
    hits: Vec<PaneHit>,
}

impl<'a> BufferPanes<'a> {
    pub fn new(buf: &'a mut Buffer, theme: &'a Theme) -> Self {
        Self {
            buf,
            theme,
            hits: Vec::new(),
        }
    }

    #[must_use]
    pub fn into_hits(self) -> Vec<PaneHit> {
        self.hits
    }

    fn block(&self, view: &PaneView<'_>) -> Block<'static> {
        let border_style = if view.selected {
            self.theme.border_selected
        } else if view.admin_only {
            self.theme.border_admin
        } else {
            self.theme.border_normal
        };
        let marker = SELECTED_MARKER[usize::from(view.selected)];
        let mut title = format!("{marker} {}", view.id);
        if view.admin_only {
            title = format!("{title} [{ADMIN_TAG}]");
        }
        if let Some(scroll) = view.scroll.filter(|s| s.enabled) {
            let glyph = match (scroll.direction.horizontal(), scroll.direction.vertical()) {
                (true, false) => SCROLL_MARKERS[0],
                (false, true) => SCROLL_MARKERS[1],
                _ => SCROLL_MARKERS[2],
            };
            title.push(' ');
            title.push(glyph);
        }
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(Theme::border_type(view.class_name))
            .border_style(border_style)
            .title_style(self.theme.title)
    }

    fn record(&mut self, area: Rect, id: &str) {
        self.hits.push(PaneHit {
            area,
            id: id.to_owned(),
        });
    }
}

impl PaneGroup for BufferPanes<'_> {
    type Region = Rect;

    fn split(&mut self, region: Rect, axis: Axis, panes: &[PaneSpec]) -> Vec<Rect> {
        let total = match axis {
            Axis::Horizontal => region.width,
            Axis::Vertical => region.height,
        };
        let mut offset = 0;
        split_lengths(total, panes)
            .into_iter()
            .map(|length| {
                let area = match axis {
                    Axis::Horizontal => Rect::new(region.x + offset, region.y, length, region.height),
                    Axis::Vertical => Rect::new(region.x, region.y + offset, region.width, length),
                };
                offset += length;
                area
            })
            .collect()
    }

    fn container(&mut self, region: Rect, view: &PaneView<'_>) -> Rect {
        self.record(region, view.id);
        let block = self.block(view);
        let inner = block.inner(region);
        block.render(region, self.buf);
        inner
    }

    fn leaf(&mut self, region: Rect, view: &PaneView<'_>, content: &LeafContent) {
        self.record(region, view.id);
        if region.width < 2 || region.height < 2 {
            return;
        }
        let block = self.block(view);
        let inner = block.inner(region);
        block.render(region, self.buf);

        let text_style = Theme::class_style(content.text_class.as_deref());
        let container_style = Theme::class_style(content.container_class.as_deref());
        let lines: Vec<Line<'_>> = content
            .content
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(|line| Line::from(Span::styled(line, text_style)))
            .collect();
        let centered = content
            .container_class
            .as_deref()
            .is_some_and(|c| c.split_whitespace().any(|class| class == "justify-center"));
        let mut paragraph = Paragraph::new(lines)
            .style(container_style)
            .alignment(if centered { Alignment::Center } else { Alignment::Left });
        // Horizontally scrollable text keeps its long lines intact.
        if !view.scroll.is_some_and(|s| s.enabled && s.direction.horizontal()) {
            paragraph = paragraph.wrap(Wrap { trim: false });
        }
        paragraph.render(inner, self.buf);
    }

    fn placeholder(&mut self, region: Rect) {
        if region.height == 0 {
            return;
        }
        let middle = Rect::new(region.x, region.y + region.height / 2, region.width, 1);
        Paragraph::new(Span::styled("No visible panels", self.theme.placeholder))
            .alignment(Alignment::Center)
            .render(middle, self.buf);
    }
}

/// Renders `layout` as `role` sees it into `area` and returns the pane
/// rectangles for hit-testing.
pub fn draw_layout(
    layout: &Layout,
    role: Role,
    selected: Option<&str>,
    theme: &Theme,
    area: Rect,
    buf: &mut Buffer,
) -> Vec<PaneHit> {
    let mut panes = BufferPanes::new(buf, theme);
    render_for_role(layout, role, selected, &mut panes, area);
    panes.into_hits()
}

/// Resolves clamped percentages for a group, then apportions `total` cells
/// by largest remainder so the lengths always add up to `total`.
///
/// Panes whose proportional share falls outside their clamp are pinned to the
/// bound and the rest is redistributed among the others. When the clamps
/// cannot all be met the pinned shares are scaled to fit.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn split_lengths(total: u16, panes: &[PaneSpec]) -> Vec<u16> {
    if panes.is_empty() {
        return Vec::new();
    }
    let shares = clamped_shares(panes);
    let sum: f64 = shares.iter().sum();
    let exact: Vec<f64> = if sum > 0.0 {
        shares.iter().map(|s| f64::from(total) * s / sum).collect()
    } else {
        let equal = f64::from(total) / panes.len() as f64;
        vec![equal; panes.len()]
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut lengths: Vec<u16> = exact.iter().map(|e| e.floor() as u16).collect();
    let assigned: u16 = lengths.iter().sum();
    let mut order: Vec<usize> = (0..panes.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa).then(a.cmp(&b))
    });
    for &index in order.iter().cycle().take(usize::from(total.saturating_sub(assigned))) {
        lengths[index] += 1;
    }
    lengths
}

#[allow(clippy::cast_precision_loss)]
fn clamped_shares(panes: &[PaneSpec]) -> Vec<f64> {
    let mut pinned: Vec<Option<f64>> = vec![None; panes.len()];
    loop {
        let pinned_total: f64 = pinned.iter().flatten().sum();
        let remaining = (100.0 - pinned_total).max(0.0);
        let free: Vec<usize> = (0..panes.len()).filter(|&i| pinned[i].is_none()).collect();
        let free_weight: f64 = free.iter().map(|&i| panes[i].size).sum();

        let shares: Vec<f64> = panes
            .iter()
            .zip(&pinned)
            .map(|(pane, pin)| {
                pin.unwrap_or_else(|| {
                    if free_weight > 0.0 {
                        remaining * pane.size / free_weight
                    } else {
                        remaining / free.len() as f64
                    }
                })
            })
            .collect();

        let mut changed = false;
        for &index in &free {
            let PaneSpec { min_size, max_size, .. } = panes[index];
            if shares[index] < min_size {
                pinned[index] = Some(min_size);
                changed = true;
            } else if shares[index] > max_size {
                pinned[index] = Some(max_size);
                changed = true;
            }
        }
        if !changed {
            return shares;
        }
    }
}
