// SPDX-License-Identifier: MIT
use super::model::{Axis, LayoutError, LeafContent, Layout, Panel};

const CONTENT_CONTAINER: &str = "flex h-[200px] items-center justify-center p-6";
const NESTED_CONTAINER: &str = "flex h-full items-center justify-center p-6";
const TEXT_CLASS: &str = "font-semibold";

/// Two side-by-side panels, the tree a fresh editor starts from.
#[must_use]
pub fn default_layout() -> Layout {
    let panel = |id: &str, label: &str| {
        Panel::leaf(
            id,
            50.0,
            LeafContent::text(label).with_classes(CONTENT_CONTAINER, TEXT_CLASS),
        )
        .with_clamps(20.0, 80.0)
    };
    Layout::new(
        Axis::Horizontal,
        vec![panel("panel-1", "Panel 1"), panel("panel-2", "Panel 2")],
    )
    .with_class("max-w-full rounded-lg border")
}

/// Header over a main area with a sidebar.
#[must_use]
pub fn dashboard_layout() -> Layout {
    let header = Panel::leaf(
        "header-panel",
        15.0,
        LeafContent::text("Dashboard").with_classes(
            "flex items-center justify-between p-4 bg-muted/20",
            "font-bold",
        ),
    )
    .with_clamps(10.0, 20.0);

    let main = Panel::leaf(
        "main-content",
        70.0,
        LeafContent::text("Recent Activity\n\nItem 1\nItem 2\nItem 3")
            .with_classes("p-4 h-full overflow-auto", "font-semibold"),
    )
    .with_clamps(50.0, 80.0);

    let sidebar = Panel::leaf(
        "sidebar",
        30.0,
        LeafContent::text("Quick Actions\n\nDashboard\nAnalytics\nSettings\nProfile")
            .with_classes("p-4 border-l h-full bg-muted/10", "text-muted-foreground"),
    )
    .with_clamps(20.0, 40.0);

    let content = Panel::container(
        "content-panel",
        85.0,
        Layout::new(Axis::Horizontal, vec![main, sidebar]).with_class("h-full"),
    )
    .with_clamps(50.0, 90.0);

    Layout::new(Axis::Vertical, vec![header, content]).with_class("max-w-full rounded-lg h-full")
}

/// Leaf panel added by the "add panel" action.
#[must_use]
pub fn new_content_panel(id: &str) -> Panel {
    let number = id.split('-').nth(1).unwrap_or(id);
    Panel::leaf(
        id,
        50.0,
        LeafContent::text(format!("Panel {number}")).with_classes(CONTENT_CONTAINER, TEXT_CLASS),
    )
    .with_clamps(20.0, 80.0)
}

/// Ids taken by [`new_nested_panel`] for a given container id.
#[must_use]
pub fn nested_child_ids(id: &str) -> [String; 2] {
    [format!("{id}-1"), format!("{id}-2")]
}

/// Container added by the "add nested panel" action. Its two children are
/// laid out perpendicular to `axis`.
#[must_use]
pub fn new_nested_panel(id: &str, axis: Axis) -> Panel {
    let [first, second] = nested_child_ids(id);
    let child = |child_id: String, label: &str| {
        Panel::leaf(
            child_id,
            50.0,
            LeafContent::text(label).with_classes(NESTED_CONTAINER, TEXT_CLASS),
        )
        .with_clamps(20.0, 80.0)
    };
    Panel::container(
        id,
        50.0,
        Layout::new(
            axis.flipped(),
            vec![child(first, "Nested 1"), child(second, "Nested 2")],
        ),
    )
    .with_clamps(20.0, 80.0)
}

const SCRIPT_HEADER: &str = "// Edit this code to customize your layout.\n\
// The snippet runs as a function body; return the layout object.\n";

/// Script-surface text whose evaluation returns `layout`.
///
/// # Errors
///
/// Returns an error if the layout cannot be serialized.
pub fn script_for(layout: &Layout) -> Result<String, LayoutError> {
    let literal = layout.to_json_pretty()?;
    Ok(format!(
        "{SCRIPT_HEADER}const myConfig = {literal};\n\n// Return your config to update the layout\nreturn myConfig;\n"
    ))
}
