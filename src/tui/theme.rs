// SPDX-License-Identifier: MIT
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

pub struct Theme {
    pub border_normal: Style,
    pub border_selected: Style,
    pub border_admin: Style,
    pub border_focused: Style,
    pub title: Style,
    pub status_bar: Style,
    pub placeholder: Style,
    pub diagnostic: Style,
    pub pending: Style,
    pub hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_normal: Style::default().fg(Color::White),
            border_selected: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_admin: Style::default().fg(Color::Magenta),
            border_focused: Style::default().fg(Color::Yellow),
            title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().fg(Color::Black).bg(Color::White),
            placeholder: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            diagnostic: Style::default().fg(Color::Red),
            pending: Style::default().fg(Color::Yellow),
            hint: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Terminal approximation of a utility-class string such as
    /// `"font-semibold text-muted-foreground"`. Unknown classes are ignored.
    #[must_use]
    pub fn class_style(class_name: Option<&str>) -> Style {
        let Some(class_name) = class_name else {
            return Style::default();
        };
        class_name
            .split_whitespace()
            .fold(Style::default(), |style, class| match class {
                "font-bold" | "font-semibold" => style.add_modifier(Modifier::BOLD),
                "italic" => style.add_modifier(Modifier::ITALIC),
                "underline" => style.add_modifier(Modifier::UNDERLINED),
                "text-muted-foreground" => style.fg(Color::DarkGray),
                c if c.starts_with("bg-muted") => style.bg(Color::Black),
                _ => style,
            })
    }

    #[must_use]
    pub fn border_type(class_name: Option<&str>) -> BorderType {
        let rounded = class_name
            .is_some_and(|c| c.split_whitespace().any(|class| class.starts_with("rounded")));
        if rounded {
            BorderType::Rounded
        } else {
            BorderType::Plain
        }
    }
}

pub const SELECTED_MARKER: [char; 2] = ['\u{25CB}', '\u{25CF}'];
pub const ADMIN_TAG: &str = "admin";
pub const SCROLL_MARKERS: [char; 3] = ['\u{2194}', '\u{2195}', '\u{271A}'];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_style_maps_known_classes() {
        let style = Theme::class_style(Some("flex font-semibold text-muted-foreground"));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(style.fg, Some(Color::DarkGray));
        assert_eq!(Theme::class_style(None), Style::default());
        assert_eq!(Theme::class_style(Some("p-6 h-full")), Style::default());
    }

    #[test]
    fn rounded_class_selects_rounded_border() {
        assert_eq!(Theme::border_type(Some("max-w-full rounded-lg border")), BorderType::Rounded);
        assert_eq!(Theme::border_type(Some("border")), BorderType::Plain);
        assert_eq!(Theme::border_type(None), BorderType::Plain);
    }
}
