// SPDX-License-Identifier: MIT
//! Recursive layout rendering against a resizable pane-group capability.

use crate::layout::ops::normalized_shares;
use crate::layout::visibility::{Role, project};
use crate::layout::{Axis, LeafContent, Layout, Panel, PanelBody, ScrollConfig};

/// Geometry request for one pane inside a group. Percent units; the clamp
/// defaults of the panel are already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneSpec {
    pub size: f64,
    pub min_size: f64,
    pub max_size: f64,
}

/// Per-panel decoration data handed to the capability.
#[derive(Debug, Clone, Copy)]
pub struct PaneView<'a> {
    pub id: &'a str,
    pub selected: bool,
    pub admin_only: bool,
    pub scroll: Option<ScrollConfig>,
    pub class_name: Option<&'a str>,
}

/// A pane-group implementation: splits a region into adjustable adjacent
/// regions and fills them.
pub trait PaneGroup {
    type Region: Copy;

    /// Splits `region` along `axis`, returning one region per spec, in order.
    fn split(&mut self, region: Self::Region, axis: Axis, panes: &[PaneSpec]) -> Vec<Self::Region>;

    /// Decorates a container pane and returns the region its nested layout
    /// should occupy.
    fn container(&mut self, region: Self::Region, view: &PaneView<'_>) -> Self::Region {
        let _ = view;
        region
    }

    fn leaf(&mut self, region: Self::Region, view: &PaneView<'_>, content: &LeafContent);

    /// A level with nothing visible.
    fn placeholder(&mut self, region: Self::Region);
}

/// Draws an already-filtered tree. Each level is normalized before its
/// panes are requested; a single panel fills its region without a split.
pub fn render_layout<G: PaneGroup>(
    layout: &Layout,
    selected: Option<&str>,
    group: &mut G,
    region: G::Region,
) {
    match layout.panels.as_slice() {
        [] => group.placeholder(region),
        [only] => render_panel(only, selected, group, region),
        panels => {
            let specs: Vec<PaneSpec> = panels
                .iter()
                .zip(normalized_shares(panels))
                .map(|(panel, size)| PaneSpec {
                    size,
                    min_size: panel.effective_min_size(),
                    max_size: panel.effective_max_size(),
                })
                .collect();
            let regions = group.split(region, layout.direction, &specs);
            for (panel, pane) in panels.iter().zip(regions) {
                render_panel(panel, selected, group, pane);
            }
        }
    }
}

/// Projects `layout` for `role`, then renders it.
pub fn render_for_role<G: PaneGroup>(
    layout: &Layout,
    role: Role,
    selected: Option<&str>,
    group: &mut G,
    region: G::Region,
) {
    render_layout(&project(layout, role), selected, group, region);
}

fn render_panel<G: PaneGroup>(
    panel: &Panel,
    selected: Option<&str>,
    group: &mut G,
    region: G::Region,
) {
    let view = PaneView {
        id: &panel.id,
        selected: selected == Some(panel.id.as_str()),
        admin_only: panel.is_admin_only,
        scroll: panel.scroll,
        class_name: panel.nested().and_then(|n| n.class_name.as_deref()),
    };
    match &panel.body {
        PanelBody::Leaf(content) => group.leaf(region, &view, content),
        PanelBody::Container(nested) => {
            let inner = group.container(region, &view);
            render_layout(nested, selected, group, inner);
        }
    }
}
