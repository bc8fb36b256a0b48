// SPDX-License-Identifier: MIT
use std::fmt;

use super::model::{Layout, Panel, PanelBody};

/// Viewer role supplied by the embedding application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    Standard,
    Admin,
}

impl Role {
    #[must_use]
    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Standard => Self::Admin,
            Self::Admin => Self::Standard,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The subset of `layout` visible to `role`.
///
/// Each level is filtered on its own: an admin-only panel hides itself and
/// its subtree, never its siblings. Sizes are left as they are; the renderer
/// normalizes the survivors.
#[must_use]
pub fn project(layout: &Layout, role: Role) -> Layout {
    Layout {
        direction: layout.direction,
        class_name: layout.class_name.clone(),
        panels: project_panels(&layout.panels, role),
    }
}

fn project_panels(panels: &[Panel], role: Role) -> Vec<Panel> {
    panels
        .iter()
        .filter(|panel| !panel.is_admin_only || role.is_admin())
        .map(|panel| match &panel.body {
            PanelBody::Container(nested) => Panel {
                body: PanelBody::Container(project(nested, role)),
                ..panel.clone()
            },
            PanelBody::Leaf(_) => panel.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::layout::ops::{find_by_id, normalize_tree, normalized_shares};
    use crate::layout::testing::{approx_eq, arb_layout};
    use crate::layout::{Axis, LeafContent};

    fn make_leaf(id: &str, size: f64) -> Panel {
        Panel::leaf(id, size, LeafContent::text(id))
    }

    fn with_secret() -> Layout {
        Layout::new(
            Axis::Horizontal,
            vec![
                make_leaf("a", 40.0),
                make_leaf("secret", 20.0).admin_only(),
                Panel::container(
                    "group",
                    40.0,
                    Layout::new(
                        Axis::Vertical,
                        vec![make_leaf("inner", 50.0), make_leaf("inner-secret", 50.0).admin_only()],
                    ),
                ),
            ],
        )
    }

    #[test]
    fn admin_only_panel_hidden_from_standard_viewers() {
        let standard = project(&with_secret(), Role::Standard);
        let admin = project(&with_secret(), Role::Admin);

        assert!(find_by_id(&standard, "secret").is_none());
        assert!(find_by_id(&standard, "inner-secret").is_none());
        assert!(find_by_id(&standard, "inner").is_some());
        assert!(find_by_id(&admin, "secret").is_some());
        assert!(find_by_id(&admin, "inner-secret").is_some());
    }

    #[test]
    fn siblings_absorb_hidden_share() {
        let standard = project(&with_secret(), Role::Standard);
        let shares = normalized_shares(&standard.panels);
        assert_eq!(shares.len(), 2);
        assert!(approx_eq(shares.iter().sum(), 100.0));
        assert!(approx_eq(shares[0], 50.0));
    }

    #[test]
    fn hidden_container_takes_its_subtree() {
        let mut tree = with_secret();
        tree.panels[2].is_admin_only = true;
        let standard = project(&tree, Role::Standard);
        assert!(find_by_id(&standard, "inner").is_none());
        assert_eq!(standard.panels.len(), 1);
    }

    fn assert_levels_sum_to_full(layout: &Layout) -> Result<(), TestCaseError> {
        if !layout.panels.is_empty() {
            let sum: f64 = layout.panels.iter().map(|p| p.default_size).sum();
            prop_assert!(approx_eq(sum, 100.0), "level summed to {}", sum);
        }
        for nested in layout.panels.iter().filter_map(Panel::nested) {
            assert_levels_sum_to_full(nested)?;
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn projected_levels_normalize_to_full(tree in arb_layout(), admin in any::<bool>()) {
            let role = if admin { Role::Admin } else { Role::Standard };
            let visible = normalize_tree(&project(&tree, role));
            assert_levels_sum_to_full(&visible)?;
        }

        #[test]
        fn standard_projection_has_no_admin_panels(tree in arb_layout()) {
            let visible = project(&tree, Role::Standard);
            let mut stack = vec![&visible];
            while let Some(level) = stack.pop() {
                for panel in &level.panels {
                    prop_assert!(!panel.is_admin_only);
                    if let Some(nested) = panel.nested() {
                        stack.push(nested);
                    }
                }
            }
        }
    }
}
