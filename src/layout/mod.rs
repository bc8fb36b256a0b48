// SPDX-License-Identifier: MIT
pub mod model;
pub mod ops;
pub mod presets;
pub mod visibility;

pub use model::{Axis, LayoutError, LeafContent, Layout, Panel, PanelBody, ScrollAxis, ScrollConfig};
