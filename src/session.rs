// SPDX-License-Identifier: MIT
use std::time::Instant;

use crate::layout::ops::{self, IdAllocator, find_by_id, find_parent_context, panel_ids};
use crate::layout::presets::{new_content_panel, new_nested_panel, nested_child_ids};
use crate::layout::visibility::{Role, project};
use crate::layout::{Axis, Layout, Panel, ScrollAxis};
use crate::sync::{DualSync, Surface};

const PANEL_PREFIX: &str = "panel";
pub const RESIZE_STEP: f64 = 5.0;

/// Everything one editor instance owns: the canonical tree, the selection,
/// the viewer role and the text mirrors. Every edit replaces `tree` with a
/// new value and refreshes the serialized mirror.
pub struct EditorSession {
    tree: Layout,
    selected: Option<String>,
    ids: IdAllocator,
    role: Role,
    sync: DualSync,
}

impl EditorSession {
    #[must_use]
    pub fn new(tree: Layout, role: Role, sync: DualSync) -> Self {
        Self {
            tree,
            selected: None,
            ids: IdAllocator::new(),
            role,
            sync,
        }
    }

    #[must_use]
    pub fn tree(&self) -> &Layout {
        &self.tree
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn sync(&self) -> &DualSync {
        &self.sync
    }

    /// The tree as the current role sees it.
    #[must_use]
    pub fn visible_tree(&self) -> Layout {
        project(&self.tree, self.role)
    }

    // -- selection ----------------------------------------------------------

    /// Selects `id`, or clears the selection if it was already selected.
    pub fn toggle_selection(&mut self, id: &str) {
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        } else if find_by_id(&self.tree, id).is_some() {
            self.selected = Some(id.to_owned());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn select_next(&mut self) {
        self.step_selection(true);
    }

    pub fn select_prev(&mut self) {
        self.step_selection(false);
    }

    fn step_selection(&mut self, forward: bool) {
        let visible = self.visible_tree();
        let ids = panel_ids(&visible);
        let len = ids.len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .as_deref()
            .and_then(|sel| ids.iter().position(|id| *id == sel));
        let next = match current {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.selected = Some(ids[next].to_owned());
    }

    // -- structural edits ---------------------------------------------------

    /// Adds a content panel next to (or inside) the selection, or at the
    /// root. Returns the new panel's id.
    pub fn add_panel(&mut self, axis: Axis) -> String {
        let id = self.ids.allocate_in(&self.tree, PANEL_PREFIX);
        self.insert(new_content_panel(&id), axis);
        id
    }

    /// Adds a container holding two panels laid out across `axis`.
    pub fn add_nested_panel(&mut self, axis: Axis) -> String {
        let tree = &self.tree;
        let id = self.ids.allocate(PANEL_PREFIX, |candidate| {
            find_by_id(tree, candidate).is_some()
                || nested_child_ids(candidate)
                    .iter()
                    .any(|child| find_by_id(tree, child).is_some())
        });
        self.insert(new_nested_panel(&id, axis), axis);
        id
    }

    fn insert(&mut self, panel: Panel, axis: Axis) {
        let target = self.selected.as_deref();
        match target.and_then(|id| find_parent_context(&self.tree, id)) {
            Some((siblings, level_axis)) => tracing::debug!(
                panel = %panel.id,
                target = ?target,
                siblings = siblings.len(),
                %level_axis,
                %axis,
                "inserting panel"
            ),
            None => tracing::debug!(panel = %panel.id, %axis, "inserting panel at root"),
        }
        let next = ops::insert_panel(&self.tree, target, panel, axis, &mut self.ids);
        self.commit(next);
    }

    pub fn remove_panel(&mut self, id: &str) {
        tracing::debug!(panel = id, "removing panel");
        let next = ops::remove_panel(&self.tree, id);
        self.commit(next);
    }

    /// Removes the selected panel; returns its id.
    pub fn remove_selected(&mut self) -> Option<String> {
        let id = self.selected.take()?;
        self.remove_panel(&id);
        Some(id)
    }

    /// Flips the selected container's axis, or the root's when nothing is
    /// selected. A selected leaf is left alone.
    pub fn toggle_direction(&mut self) {
        let next = ops::toggle_direction(&self.tree, self.selected.as_deref());
        self.commit(next);
    }

    pub fn make_scrollable(&mut self, axis: ScrollAxis) -> bool {
        let Some(id) = self.selected.clone() else {
            return false;
        };
        let next = ops::set_scrollable(&self.tree, &id, axis);
        self.commit(next);
        true
    }

    pub fn toggle_admin_only(&mut self) -> bool {
        let Some(id) = self.selected.clone() else {
            return false;
        };
        let next = ops::set_admin_only(&self.tree, &id);
        self.commit(next);
        self.drop_hidden_selection();
        true
    }

    /// Grows (or, with a negative `delta`, shrinks) the selected panel's
    /// default size.
    pub fn resize_selected(&mut self, delta: f64) -> Option<f64> {
        let id = self.selected.clone()?;
        let current = find_by_id(&self.tree, &id)?.default_size;
        let next = ops::set_default_size(&self.tree, &id, current + delta);
        let size = find_by_id(&next, &id).map(|p| p.default_size);
        self.commit(next);
        size
    }

    /// Replaces the whole tree, e.g. from a text surface.
    pub fn replace_tree(&mut self, tree: Layout) {
        self.tree = tree;
        self.drop_dangling_selection();
    }

    fn commit(&mut self, tree: Layout) {
        self.replace_tree(tree);
        self.sync.refresh_from_tree(&self.tree);
    }

    fn drop_dangling_selection(&mut self) {
        if let Some(id) = &self.selected
            && find_by_id(&self.tree, id).is_none()
        {
            self.selected = None;
        }
    }

    fn drop_hidden_selection(&mut self) {
        if let Some(id) = &self.selected
            && find_by_id(&self.visible_tree(), id).is_none()
        {
            self.selected = None;
        }
    }

    // -- role and text surfaces ----------------------------------------------

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.drop_hidden_selection();
    }

    pub fn toggle_role(&mut self) -> Role {
        self.set_role(self.role.toggled());
        self.role
    }

    pub fn edit_text(&mut self, surface: Surface, text: String, now: Instant) {
        self.sync.edit(surface, text, now);
    }

    pub fn regenerate_script(&mut self) {
        self.sync.regenerate_script(&self.tree);
    }

    /// Applies any text commit that has come due. Returns `true` if the tree
    /// changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.sync.tick(now) {
            Some(tree) => {
                self.replace_tree(tree);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::layout::presets::default_layout;
    use crate::layout::testing::approx_eq;
    use crate::sync::script::ScriptEvaluator;
    use crate::sync::worker::ScriptWorker;
    use crate::sync::{DEFAULT_DEBOUNCE, SyncError};

    fn make_session(role: Role) -> EditorSession {
        let tree = default_layout();
        let sync = DualSync::new(&tree, DEFAULT_DEBOUNCE, None);
        EditorSession::new(tree, role, sync)
    }

    #[test]
    fn add_panel_at_root_grows_level() {
        let mut session = make_session(Role::Admin);
        let id = session.add_panel(Axis::Horizontal);
        assert_eq!(id, "panel-3");
        assert_eq!(session.tree().panels.len(), 3);
        assert!(session.sync().text(Surface::Serialized).contains("panel-3"));
    }

    #[test]
    fn add_panel_splits_selected_leaf() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-1");
        let id = session.add_panel(Axis::Vertical);

        let target = find_by_id(session.tree(), "panel-1").unwrap();
        let nested = target.nested().unwrap();
        assert_eq!(nested.direction, Axis::Vertical);
        assert_eq!(nested.panels[0].id, "panel-1-content");
        assert_eq!(nested.panels[1].id, id);
    }

    #[test]
    fn nested_panel_ids_avoid_existing_children() {
        let mut session = make_session(Role::Admin);
        let first = session.add_nested_panel(Axis::Horizontal);
        assert_eq!(first, "panel-3");
        let second = session.add_nested_panel(Axis::Horizontal);
        assert_ne!(second, first);
        assert!(find_by_id(session.tree(), &format!("{second}-1")).is_some());
    }

    #[test]
    fn removing_selected_clears_selection() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-2");
        assert_eq!(session.remove_selected().as_deref(), Some("panel-2"));
        assert_eq!(session.selected(), None);
        assert!(find_by_id(session.tree(), "panel-2").is_none());
        assert!(session.remove_selected().is_none());
    }

    #[test]
    fn toggle_selection_twice_deselects() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-1");
        session.toggle_selection("panel-1");
        assert_eq!(session.selected(), None);
        session.toggle_selection("missing");
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn selection_cycles_over_visible_panels() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-2");
        session.toggle_admin_only();
        session.set_role(Role::Standard);
        assert_eq!(session.selected(), None, "hidden panel cannot stay selected");

        session.select_next();
        assert_eq!(session.selected(), Some("panel-1"));
        session.select_next();
        assert_eq!(session.selected(), Some("panel-1"));

        session.set_role(Role::Admin);
        session.select_prev();
        assert_eq!(session.selected(), Some("panel-2"));
    }

    #[test]
    fn toggle_direction_targets_selected_container() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-1");
        session.add_panel(Axis::Vertical);
        assert_eq!(session.selected(), Some("panel-1"));
        session.toggle_direction();
        let nested = find_by_id(session.tree(), "panel-1").unwrap().nested().unwrap();
        assert_eq!(nested.direction, Axis::Horizontal);
        assert_eq!(session.tree().direction, Axis::Horizontal);

        session.clear_selection();
        session.toggle_direction();
        assert_eq!(session.tree().direction, Axis::Vertical);
    }

    #[test]
    fn toggle_direction_with_leaf_selected_is_a_no_op() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-2");
        let before = session.tree().clone();
        session.toggle_direction();
        assert_eq!(session.tree(), &before);
        assert_eq!(session.tree().direction, Axis::Horizontal);
    }

    #[test]
    fn resize_is_clamped() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-1");
        assert!(approx_eq(session.resize_selected(RESIZE_STEP).unwrap(), 55.0));
        assert!(approx_eq(session.resize_selected(-200.0).unwrap(), 0.0));
    }

    #[test]
    fn patches_need_a_selection() {
        let mut session = make_session(Role::Admin);
        assert!(!session.make_scrollable(ScrollAxis::Both));
        session.toggle_selection("panel-1");
        assert!(session.make_scrollable(ScrollAxis::Both));
        let panel = find_by_id(session.tree(), "panel-1").unwrap();
        assert_eq!(panel.scroll.map(|s| s.direction), Some(ScrollAxis::Both));
    }

    #[test]
    fn committed_text_replaces_tree_and_drops_dangling_selection() {
        let mut session = make_session(Role::Admin);
        session.toggle_selection("panel-2");
        let t0 = Instant::now();
        let text = r#"{"direction":"vertical","panels":[{"id":"panel-1","defaultSize":100}]}"#;
        session.edit_text(Surface::Serialized, text.into(), t0);

        assert!(!session.tick(t0 + Duration::from_millis(100)));
        assert!(session.tick(t0 + DEFAULT_DEBOUNCE));
        assert_eq!(session.tree().direction, Axis::Vertical);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn structural_edit_cancels_pending_text() {
        let mut session = make_session(Role::Admin);
        let t0 = Instant::now();
        session.edit_text(Surface::Serialized, "{broken".into(), t0);
        session.add_panel(Axis::Horizontal);
        assert!(!session.tick(t0 + DEFAULT_DEBOUNCE));
        assert!(session.sync().diagnostic(Surface::Serialized).is_none());
        assert_eq!(session.tree().panels.len(), 3);
    }

    /// Answers every script with a single-panel layout after a delay.
    struct SlowScript;

    impl ScriptEvaluator for SlowScript {
        fn evaluate(&self, _source: &str) -> Result<serde_json::Value, SyncError> {
            std::thread::sleep(Duration::from_millis(150));
            Ok(serde_json::json!({
                "direction": "vertical",
                "panels": [{"id": "from-script", "defaultSize": 100}]
            }))
        }
    }

    #[test]
    fn add_panel_survives_a_late_script_result() {
        let tree = default_layout();
        let worker = ScriptWorker::spawn(Box::new(SlowScript)).unwrap();
        let sync = DualSync::new(&tree, DEFAULT_DEBOUNCE, Some(worker));
        let mut session = EditorSession::new(tree, Role::Admin, sync);
        let t0 = Instant::now();

        session.edit_text(Surface::Script, "return myConfig;".into(), t0);
        assert!(!session.tick(t0 + DEFAULT_DEBOUNCE));
        let id = session.add_panel(Axis::Horizontal);

        std::thread::sleep(Duration::from_millis(300));
        assert!(!session.tick(t0 + Duration::from_secs(2)));
        assert!(find_by_id(session.tree(), &id).is_some());
        assert!(find_by_id(session.tree(), "from-script").is_none());
    }
}
