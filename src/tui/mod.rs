// SPDX-License-Identifier: MIT
pub mod app;
pub mod input;
pub mod panels;
pub mod panes;
pub mod text_editor;
pub mod theme;
