// SPDX-License-Identifier: MIT
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Lower clamp applied when a panel leaves `minSize` unset (or zero).
pub const DEFAULT_MIN_SIZE: f64 = 10.0;
/// Upper clamp applied when a panel leaves `maxSize` unset (or zero).
pub const DEFAULT_MAX_SIZE: f64 = 90.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

impl Axis {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollAxis {
    Horizontal,
    Vertical,
    Both,
}

impl ScrollAxis {
    #[must_use]
    pub fn horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }

    #[must_use]
    pub fn vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }
}

impl fmt::Display for ScrollAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
            Self::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub enabled: bool,
    pub direction: ScrollAxis,
}

impl ScrollConfig {
    #[must_use]
    pub fn enabled(direction: ScrollAxis) -> Self {
        Self {
            enabled: true,
            direction,
        }
    }
}

/// Display payload of a leaf panel. All fields are opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafContent {
    pub content: Option<String>,
    pub container_class: Option<String>,
    pub text_class: Option<String>,
}

impl LeafContent {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_classes(mut self, container_class: &str, text_class: &str) -> Self {
        self.container_class = Some(container_class.to_string());
        self.text_class = Some(text_class.to_string());
        self
    }

    fn is_set(&self) -> bool {
        self.content.is_some() || self.container_class.is_some() || self.text_class.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    Leaf(LeafContent),
    Container(Layout),
}

/// One node of the layout tree.
///
/// A panel is either a content leaf or a container owning a nested [`Layout`];
/// the body enum makes carrying both impossible.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPanel")]
pub struct Panel {
    pub id: String,
    pub default_size: f64,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub is_admin_only: bool,
    pub scroll: Option<ScrollConfig>,
    pub body: PanelBody,
}

impl Panel {
    #[must_use]
    pub fn leaf(id: impl Into<String>, default_size: f64, content: LeafContent) -> Self {
        Self {
            id: id.into(),
            default_size,
            min_size: None,
            max_size: None,
            is_admin_only: false,
            scroll: None,
            body: PanelBody::Leaf(content),
        }
    }

    #[must_use]
    pub fn container(id: impl Into<String>, default_size: f64, nested: Layout) -> Self {
        Self {
            id: id.into(),
            default_size,
            min_size: None,
            max_size: None,
            is_admin_only: false,
            scroll: None,
            body: PanelBody::Container(nested),
        }
    }

    #[must_use]
    pub fn with_clamps(mut self, min_size: f64, max_size: f64) -> Self {
        self.min_size = Some(min_size);
        self.max_size = Some(max_size);
        self
    }

    #[must_use]
    pub fn admin_only(mut self) -> Self {
        self.is_admin_only = true;
        self
    }

    #[must_use]
    pub fn nested(&self) -> Option<&Layout> {
        match &self.body {
            PanelBody::Container(nested) => Some(nested),
            PanelBody::Leaf(_) => None,
        }
    }

    pub fn nested_mut(&mut self) -> Option<&mut Layout> {
        match &mut self.body {
            PanelBody::Container(nested) => Some(nested),
            PanelBody::Leaf(_) => None,
        }
    }

    #[must_use]
    pub fn leaf_content(&self) -> Option<&LeafContent> {
        match &self.body {
            PanelBody::Leaf(leaf) => Some(leaf),
            PanelBody::Container(_) => None,
        }
    }

    #[must_use]
    pub fn effective_min_size(&self) -> f64 {
        self.min_size
            .filter(|v| *v > 0.0)
            .unwrap_or(DEFAULT_MIN_SIZE)
    }

    #[must_use]
    pub fn effective_max_size(&self) -> f64 {
        self.max_size
            .filter(|v| *v > 0.0)
            .unwrap_or(DEFAULT_MAX_SIZE)
    }

    /// Human-facing name: the leaf text when there is one, the id otherwise.
    #[must_use]
    pub fn label(&self) -> &str {
        self.leaf_content()
            .and_then(|leaf| leaf.content.as_deref())
            .filter(|text| !text.is_empty())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub direction: Axis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub panels: Vec<Panel>,
}

impl Layout {
    #[must_use]
    pub fn new(direction: Axis, panels: Vec<Panel>) -> Self {
        Self {
            direction,
            class_name: None,
            panels,
        }
    }

    #[must_use]
    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    /// Parses and validates the serialized-tree text format.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON, does not have the
    /// layout shape, or violates a tree invariant (see [`Layout::validate`]).
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let layout: Self = serde_json::from_str(text).map_err(LayoutError::Syntax)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Converts an already-decoded JSON value (e.g. a script result).
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not have the layout shape or
    /// violates a tree invariant.
    pub fn from_value(value: serde_json::Value) -> Result<Self, LayoutError> {
        let layout: Self = serde_json::from_value(value).map_err(LayoutError::Syntax)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Pretty-printed serialized-tree text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, LayoutError> {
        serde_json::to_string_pretty(self).map_err(LayoutError::Encode)
    }

    /// Checks global id uniqueness and size sanity across the whole tree.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in depth-first order.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        validate_panels(&self.panels, &mut seen)
    }

    /// Number of panels at every level, containers included.
    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels
            .iter()
            .map(|p| 1 + p.nested().map_or(0, Layout::panel_count))
            .sum()
    }

    /// Nesting depth; a flat layout has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self
            .panels
            .iter()
            .filter_map(Panel::nested)
            .map(Layout::depth)
            .max()
            .unwrap_or(0)
    }
}

fn validate_panels<'a>(panels: &'a [Panel], seen: &mut HashSet<&'a str>) -> Result<(), LayoutError> {
    for panel in panels {
        if !seen.insert(panel.id.as_str()) {
            return Err(LayoutError::DuplicateId(panel.id.clone()));
        }
        check_size(&panel.id, "defaultSize", panel.default_size)?;
        if let Some(min) = panel.min_size {
            check_size(&panel.id, "minSize", min)?;
        }
        if let Some(max) = panel.max_size {
            check_size(&panel.id, "maxSize", max)?;
        }
        if let (Some(min), Some(max)) = (panel.min_size, panel.max_size)
            && min > max
        {
            return Err(LayoutError::InvertedClamp {
                id: panel.id.clone(),
                min,
                max,
            });
        }
        if let Some(nested) = panel.nested() {
            validate_panels(&nested.panels, seen)?;
        }
    }
    Ok(())
}

fn check_size(id: &str, field: &'static str, value: f64) -> Result<(), LayoutError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidSize {
            id: id.to_string(),
            field,
            value,
        })
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid layout: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("failed to encode layout: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("duplicate panel id `{0}`")]
    DuplicateId(String),
    #[error("panel `{0}` has both leaf content and a nested layout")]
    MixedBody(String),
    #[error("panel `{id}` has an invalid {field}: {value}")]
    InvalidSize {
        id: String,
        field: &'static str,
        value: f64,
    },
    #[error("panel `{id}` has minSize {min} greater than maxSize {max}")]
    InvertedClamp { id: String, min: f64, max: f64 },
}

// ---------------------------------------------------------------------------
// Wire shape: a flat record where leaf fields and `nested` sit side by side
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPanel {
    id: String,
    default_size: f64,
    #[serde(default)]
    min_size: Option<f64>,
    #[serde(default)]
    max_size: Option<f64>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    content_container_class: Option<String>,
    #[serde(default)]
    text_class: Option<String>,
    #[serde(default)]
    is_scrollable: Option<ScrollConfig>,
    #[serde(default)]
    is_admin_only: bool,
    #[serde(default)]
    nested: Option<Layout>,
}

impl TryFrom<RawPanel> for Panel {
    type Error = LayoutError;

    fn try_from(raw: RawPanel) -> Result<Self, Self::Error> {
        let leaf = LeafContent {
            content: raw.content,
            container_class: raw.content_container_class,
            text_class: raw.text_class,
        };
        let body = match raw.nested {
            Some(_) if leaf.is_set() => return Err(LayoutError::MixedBody(raw.id)),
            Some(nested) => PanelBody::Container(nested),
            None => PanelBody::Leaf(leaf),
        };
        Ok(Self {
            id: raw.id,
            default_size: raw.default_size,
            min_size: raw.min_size,
            max_size: raw.max_size,
            is_admin_only: raw.is_admin_only,
            scroll: raw.is_scrollable,
            body,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawPanelRef<'a> {
    id: &'a str,
    default_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_container_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_scrollable: Option<ScrollConfig>,
    #[serde(skip_serializing_if = "is_false")]
    is_admin_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    nested: Option<&'a Layout>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl Serialize for Panel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let leaf = self.leaf_content();
        RawPanelRef {
            id: &self.id,
            default_size: self.default_size,
            min_size: self.min_size,
            max_size: self.max_size,
            content: leaf.and_then(|l| l.content.as_deref()),
            content_container_class: leaf.and_then(|l| l.container_class.as_deref()),
            text_class: leaf.and_then(|l| l.text_class.as_deref()),
            is_scrollable: self.scroll,
            is_admin_only: self.is_admin_only,
            nested: self.nested(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "direction": "vertical",
      "className": "h-full",
      "panels": [
        { "id": "header", "defaultSize": 15, "minSize": 10, "maxSize": 20, "content": "Header" },
        {
          "id": "body",
          "defaultSize": 85,
          "isAdminOnly": true,
          "nested": {
            "direction": "horizontal",
            "panels": [
              { "id": "main", "defaultSize": 70, "isScrollable": { "enabled": true, "direction": "both" } },
              { "id": "side", "defaultSize": 30, "textClass": "font-semibold" }
            ]
          }
        }
      ]
    }"#;

    #[test]
    fn parses_nested_layout() {
        let layout = Layout::from_json(SAMPLE).unwrap();

        assert_eq!(layout.direction, Axis::Vertical);
        assert_eq!(layout.class_name.as_deref(), Some("h-full"));
        assert_eq!(layout.panels.len(), 2);
        assert_eq!(layout.panel_count(), 4);
        assert_eq!(layout.depth(), 2);

        let body = &layout.panels[1];
        assert!(body.is_admin_only);
        let nested = body.nested().expect("body should be a container");
        assert_eq!(nested.direction, Axis::Horizontal);
        assert_eq!(
            nested.panels[0].scroll,
            Some(ScrollConfig::enabled(ScrollAxis::Both))
        );
    }

    #[test]
    fn serialization_round_trips() {
        let layout = Layout::from_json(SAMPLE).unwrap();
        let text = layout.to_json_pretty().unwrap();
        let reparsed = Layout::from_json(&text).unwrap();
        assert_eq!(layout, reparsed);
    }

    #[test]
    fn unset_fields_are_omitted() {
        let layout = Layout::new(Axis::Horizontal, vec![Panel::leaf("p1", 100.0, LeafContent::text("Hi"))]);
        let text = serde_json::to_string(&layout).unwrap();
        assert_eq!(
            text,
            r#"{"direction":"horizontal","panels":[{"id":"p1","defaultSize":100.0,"content":"Hi"}]}"#
        );
    }

    #[test]
    fn rejects_mixed_body() {
        let text = r#"{"direction":"horizontal","panels":[
            {"id":"p1","defaultSize":50,"content":"x","nested":{"direction":"vertical","panels":[]}}
        ]}"#;
        let err = Layout::from_json(text).unwrap_err();
        assert!(err.to_string().contains("both leaf content and a nested layout"));
    }

    #[test]
    fn rejects_duplicate_ids_across_levels() {
        let text = r#"{"direction":"horizontal","panels":[
            {"id":"p1","defaultSize":50},
            {"id":"c","defaultSize":50,"nested":{"direction":"vertical","panels":[
                {"id":"p1","defaultSize":100}
            ]}}
        ]}"#;
        assert!(matches!(
            Layout::from_json(text),
            Err(LayoutError::DuplicateId(id)) if id == "p1"
        ));
    }

    #[test]
    fn rejects_negative_and_inverted_sizes() {
        let negative = r#"{"direction":"horizontal","panels":[{"id":"p1","defaultSize":-5}]}"#;
        assert!(matches!(
            Layout::from_json(negative),
            Err(LayoutError::InvalidSize { field: "defaultSize", .. })
        ));

        let inverted =
            r#"{"direction":"horizontal","panels":[{"id":"p1","defaultSize":5,"minSize":60,"maxSize":40}]}"#;
        assert!(matches!(
            Layout::from_json(inverted),
            Err(LayoutError::InvertedClamp { .. })
        ));
    }

    #[test]
    fn malformed_text_is_a_syntax_error() {
        assert!(matches!(
            Layout::from_json("{bad json"),
            Err(LayoutError::Syntax(_))
        ));
    }

    #[test]
    fn clamp_defaults_apply_to_unset_and_zero() {
        let mut panel = Panel::leaf("p1", 50.0, LeafContent::default());
        assert!((panel.effective_min_size() - DEFAULT_MIN_SIZE).abs() < f64::EPSILON);
        assert!((panel.effective_max_size() - DEFAULT_MAX_SIZE).abs() < f64::EPSILON);

        panel.min_size = Some(0.0);
        panel.max_size = Some(75.0);
        assert!((panel.effective_min_size() - DEFAULT_MIN_SIZE).abs() < f64::EPSILON);
        assert!((panel.effective_max_size() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn label_prefers_content() {
        let leaf = Panel::leaf("p1", 50.0, LeafContent::text("Hello"));
        let empty = Panel::leaf("p2", 50.0, LeafContent::default());
        assert_eq!(leaf.label(), "Hello");
        assert_eq!(empty.label(), "p2");
    }
}
