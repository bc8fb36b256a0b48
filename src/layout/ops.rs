// SPDX-License-Identifier: MIT
//! Pure structural algorithms over a [`Layout`] tree.
//!
//! Every operation borrows the current tree and returns a new one; the input
//! is never touched. An id that is not in the tree is not an error: inserts
//! fall back to the root level and patches become no-ops, because a stale
//! selection is an expected transient state.

use super::model::{Axis, LeafContent, Layout, Panel, PanelBody, ScrollAxis, ScrollConfig};

/// Share every proportion is normalized to.
pub const FULL_SHARE: f64 = 100.0;
const SPLIT_SHARE: f64 = 50.0;
const CONTAINER_PREFIX: &str = "container";

/// Hands out `prefix-N` ids from a monotonically increasing counter, skipping
/// any candidate the caller reports as taken.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self, prefix: &str, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            let candidate = format!("{prefix}-{}", self.next);
            self.next += 1;
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }

    pub fn allocate_in(&mut self, layout: &Layout, prefix: &str) -> String {
        self.allocate(prefix, |candidate| find_by_id(layout, candidate).is_some())
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Depth-first search across every nesting level; first match wins.
#[must_use]
pub fn find_by_id<'a>(layout: &'a Layout, id: &str) -> Option<&'a Panel> {
    find_in(&layout.panels, id)
}

fn find_in<'a>(panels: &'a [Panel], id: &str) -> Option<&'a Panel> {
    for panel in panels {
        if panel.id == id {
            return Some(panel);
        }
        if let Some(found) = panel.nested().and_then(|nested| find_in(&nested.panels, id)) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(panels: &'a mut [Panel], id: &str) -> Option<&'a mut Panel> {
    for panel in panels {
        if panel.id == id {
            return Some(panel);
        }
        if let PanelBody::Container(nested) = &mut panel.body
            && let Some(found) = find_in_mut(&mut nested.panels, id)
        {
            return Some(found);
        }
    }
    None
}

/// The sibling sequence that contains `id`, together with the axis that
/// sequence is laid out on.
#[must_use]
pub fn find_parent_context<'a>(layout: &'a Layout, id: &str) -> Option<(&'a [Panel], Axis)> {
    parent_in(&layout.panels, layout.direction, id)
}

fn parent_in<'a>(panels: &'a [Panel], direction: Axis, id: &str) -> Option<(&'a [Panel], Axis)> {
    if panels.iter().any(|panel| panel.id == id) {
        return Some((panels, direction));
    }
    panels
        .iter()
        .filter_map(Panel::nested)
        .find_map(|nested| parent_in(&nested.panels, nested.direction, id))
}

/// Every id in depth-first pre-order.
#[must_use]
pub fn panel_ids(layout: &Layout) -> Vec<&str> {
    let mut ids = Vec::with_capacity(layout.panel_count());
    collect_ids(&layout.panels, &mut ids);
    ids
}

fn collect_ids<'a>(panels: &'a [Panel], ids: &mut Vec<&'a str>) {
    for panel in panels {
        ids.push(&panel.id);
        if let Some(nested) = panel.nested() {
            collect_ids(&nested.panels, ids);
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Proportional shares of `panels` scaled to sum to [`FULL_SHARE`].
///
/// Arbitrary non-negative ratios are accepted. When every size is zero the
/// panels split the space evenly.
#[must_use]
pub fn normalized_shares(panels: &[Panel]) -> Vec<f64> {
    if panels.is_empty() {
        return Vec::new();
    }
    let total: f64 = panels.iter().map(|p| p.default_size).sum();
    if total > 0.0 {
        panels
            .iter()
            .map(|p| p.default_size / total * FULL_SHARE)
            .collect()
    } else {
        #[allow(clippy::cast_precision_loss)]
        let even = FULL_SHARE / panels.len() as f64;
        vec![even; panels.len()]
    }
}

#[must_use]
pub fn normalize_sizes(panels: &[Panel]) -> Vec<Panel> {
    panels
        .iter()
        .zip(normalized_shares(panels))
        .map(|(panel, share)| Panel {
            default_size: share,
            ..panel.clone()
        })
        .collect()
}

/// Applies [`normalize_sizes`] independently at every nesting level.
#[must_use]
pub fn normalize_tree(layout: &Layout) -> Layout {
    let mut next = layout.clone();
    normalize_level(&mut next);
    next
}

fn normalize_level(layout: &mut Layout) {
    let shares = normalized_shares(&layout.panels);
    for (panel, share) in layout.panels.iter_mut().zip(shares) {
        panel.default_size = share;
        if let Some(nested) = panel.nested_mut() {
            normalize_level(nested);
        }
    }
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

/// Inserts `panel` relative to `target` along `axis`.
///
/// - No target, or a target that is not in the tree: the root level either
///   grows (same axis) or is wrapped into a synthetic container beside the
///   new panel (cross axis).
/// - Target is a container: the same grow-or-wrap rule applied to its nested
///   layout.
/// - Target is a leaf: it becomes a container whose first child
///   (`{id}-content`) inherits the leaf payload and whose second child is
///   `panel`, split 50/50 along `axis`.
///
/// `panel.id` must not already be in the tree.
#[must_use]
pub fn insert_panel(
    layout: &Layout,
    target: Option<&str>,
    panel: Panel,
    axis: Axis,
    ids: &mut IdAllocator,
) -> Layout {
    let new_id = panel.id.clone();
    let mut fresh = |prefix: &str| {
        ids.allocate(prefix, |candidate| {
            candidate == new_id || find_by_id(layout, candidate).is_some()
        })
    };
    let mut next = layout.clone();

    let resolved = target.filter(|id| find_by_id(layout, id).is_some());
    let Some(target_id) = resolved else {
        if let Some(missing) = target {
            tracing::debug!(panel = missing, "insert target not found, using root level");
        }
        attach(&mut next, panel, axis, || fresh(CONTAINER_PREFIX));
        return next;
    };

    if let Some(found) = find_in_mut(&mut next.panels, target_id) {
        if let Some(nested) = found.nested_mut() {
            attach(nested, panel, axis, || fresh(CONTAINER_PREFIX));
        } else {
            let preferred = format!("{target_id}-content");
            let content_id = if preferred == new_id || find_by_id(layout, &preferred).is_some() {
                fresh(&preferred)
            } else {
                preferred
            };
            split_leaf(found, panel, axis, content_id);
        }
    }
    next
}

fn attach(level: &mut Layout, mut panel: Panel, axis: Axis, wrapper_id: impl FnOnce() -> String) {
    if level.panels.is_empty() {
        level.direction = axis;
        panel.default_size = FULL_SHARE;
        level.panels.push(panel);
        return;
    }

    if level.direction == axis {
        let total: f64 = level.panels.iter().map(|p| p.default_size).sum();
        #[allow(clippy::cast_precision_loss)]
        let (count, grown) = (level.panels.len() as f64, (level.panels.len() + 1) as f64);
        for sibling in &mut level.panels {
            sibling.default_size *= count / grown;
        }
        panel.default_size = total / grown;
        level.panels.push(panel);
    } else {
        let existing = Layout::new(level.direction, std::mem::take(&mut level.panels));
        let wrapper = Panel::container(wrapper_id(), SPLIT_SHARE, existing);
        panel.default_size = SPLIT_SHARE;
        level.direction = axis;
        level.panels = vec![wrapper, panel];
    }
}

fn split_leaf(target: &mut Panel, mut panel: Panel, axis: Axis, content_id: String) {
    let leaf = match std::mem::replace(&mut target.body, PanelBody::Leaf(LeafContent::default())) {
        PanelBody::Leaf(leaf) => leaf,
        container @ PanelBody::Container(_) => {
            target.body = container;
            return;
        }
    };
    let moved = Panel {
        id: content_id,
        default_size: SPLIT_SHARE,
        min_size: target.min_size,
        max_size: target.max_size,
        is_admin_only: false,
        scroll: target.scroll.take(),
        body: PanelBody::Leaf(leaf),
    };
    panel.default_size = SPLIT_SHARE;
    target.body = PanelBody::Container(Layout::new(axis, vec![moved, panel]));
}

// ---------------------------------------------------------------------------
// Removal and patches
// ---------------------------------------------------------------------------

/// Filters `id` out of whichever sibling sequence holds it. Survivors keep
/// their sizes; normalization at render time absorbs the gap.
#[must_use]
pub fn remove_panel(layout: &Layout, id: &str) -> Layout {
    let mut next = layout.clone();
    remove_from(&mut next.panels, id);
    next
}

fn remove_from(panels: &mut Vec<Panel>, id: &str) {
    panels.retain(|panel| panel.id != id);
    for panel in panels.iter_mut() {
        if let Some(nested) = panel.nested_mut() {
            remove_from(&mut nested.panels, id);
        }
    }
}

fn patched(layout: &Layout, id: &str, patch: impl FnOnce(&mut Panel)) -> Layout {
    let mut next = layout.clone();
    if let Some(panel) = find_in_mut(&mut next.panels, id) {
        patch(panel);
    }
    next
}

/// Flips the root axis, or the nested axis of `target`. Leaves are untouched.
#[must_use]
pub fn toggle_direction(layout: &Layout, target: Option<&str>) -> Layout {
    match target {
        None => Layout {
            direction: layout.direction.flipped(),
            ..layout.clone()
        },
        Some(id) => patched(layout, id, |panel| {
            if let Some(nested) = panel.nested_mut() {
                nested.direction = nested.direction.flipped();
            }
        }),
    }
}

#[must_use]
pub fn set_scrollable(layout: &Layout, id: &str, axis: ScrollAxis) -> Layout {
    patched(layout, id, |panel| panel.scroll = Some(ScrollConfig::enabled(axis)))
}

/// Toggles the admin-only flag.
#[must_use]
pub fn set_admin_only(layout: &Layout, id: &str) -> Layout {
    patched(layout, id, |panel| panel.is_admin_only = !panel.is_admin_only)
}

/// Sets a panel's proportion, clamped to `[0, 100]`. Non-finite input is ignored.
#[must_use]
pub fn set_default_size(layout: &Layout, id: &str, size: f64) -> Layout {
    if !size.is_finite() {
        return layout.clone();
    }
    patched(layout, id, |panel| panel.default_size = size.clamp(0.0, FULL_SHARE))
}
