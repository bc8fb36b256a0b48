// SPDX-License-Identifier: MIT
use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::{Block, Borders};

use super::input::{Action, Focus};
use super::panels::source::SurfaceState;
use super::panels::{header, properties, source};
use super::panes::{PaneHit, draw_layout, hit_test};
use super::text_editor::TextEditor;
use super::theme::Theme;
use crate::layout::ops::find_by_id;
use crate::layout::visibility::Role;
use crate::session::{EditorSession, RESIZE_STEP};
use crate::sync::Surface;

const PROPERTIES_HEIGHT: u16 = 6;
const PREVIEW_PERCENT: u16 = 60;

pub struct App {
    pub session: EditorSession,
    pub focus: Focus,
    pub should_quit: bool,
    pub theme: Theme,
    status: String,
    serialized_editor: TextEditor,
    script_editor: TextEditor,
    pane_hits: Vec<PaneHit>,
}

impl App {
    #[must_use]
    pub fn new(session: EditorSession) -> Self {
        let serialized_editor = TextEditor::new(session.sync().text(Surface::Serialized));
        let script_editor = TextEditor::new(session.sync().text(Surface::Script));
        Self {
            session,
            focus: Focus::Preview,
            should_quit: false,
            theme: Theme::default(),
            status: "Ready".to_owned(),
            serialized_editor,
            script_editor,
            pane_hits: Vec::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Applies commits that have come due and pulls mirror changes into the
    /// editors.
    pub fn tick(&mut self, now: Instant) {
        if self.session.tick(now) {
            self.status = "Layout updated from text".to_owned();
        }
        self.sync_editors();
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::FocusNext => self.focus = self.next_focus(),
            Action::LeaveEditor => self.focus = Focus::Preview,
            Action::SelectNext => self.session.select_next(),
            Action::SelectPrev => self.session.select_prev(),
            Action::ClearSelection => self.session.clear_selection(),
            Action::AddPanel(axis) => {
                let id = self.session.add_panel(axis);
                self.status = format!("Added {id} ({axis})");
            }
            Action::AddNestedPanel(axis) => {
                let id = self.session.add_nested_panel(axis);
                self.status = format!("Added nested {id} ({axis})");
            }
            Action::RemoveSelected => {
                self.status = match self.session.remove_selected() {
                    Some(id) => format!("Removed {id}"),
                    None => "Select a panel to remove".to_owned(),
                };
            }
            Action::ToggleDirection => {
                self.session.toggle_direction();
                self.status = "Direction toggled".to_owned();
            }
            Action::ToggleAdminOnly => {
                self.status = if self.session.toggle_admin_only() {
                    "Admin-only flag toggled".to_owned()
                } else {
                    "Select a panel first".to_owned()
                };
            }
            Action::MakeScrollable(axis) => {
                self.status = if self.session.make_scrollable(axis) {
                    format!("Scrolling set to {axis}")
                } else {
                    "Select a panel first".to_owned()
                };
            }
            Action::Grow | Action::Shrink => {
                let delta = if action == Action::Grow {
                    RESIZE_STEP
                } else {
                    -RESIZE_STEP
                };
                self.status = match self.session.resize_selected(delta) {
                    Some(size) => format!("Default size {size:.1}"),
                    None => "Select a panel first".to_owned(),
                };
            }
            Action::ToggleRole => {
                let role = self.session.toggle_role();
                if role == Role::Standard {
                    self.focus = Focus::Preview;
                }
                self.status = format!("Viewing as {role}");
            }
            Action::RegenerateScript => {
                self.session.regenerate_script();
                self.status = "Script regenerated from layout".to_owned();
            }
            Action::Click { column, row } => {
                if let Some(id) = hit_test(&self.pane_hits, column, row).map(str::to_owned) {
                    self.session.toggle_selection(&id);
                    self.focus = Focus::Preview;
                }
            }
            Action::Edit(key) => {
                let surface = match self.focus {
                    Focus::Serialized => Surface::Serialized,
                    Focus::Script => Surface::Script,
                    Focus::Preview => return,
                };
                let editor = self.editor_mut(surface);
                if editor.handle_key(key) {
                    let text = editor.text();
                    self.session.edit_text(surface, text, now);
                }
            }
            Action::None => {}
        }
        self.sync_editors();
    }

    fn next_focus(&self) -> Focus {
        if !self.session.role().is_admin() {
            return Focus::Preview;
        }
        match self.focus {
            Focus::Preview => Focus::Serialized,
            Focus::Serialized if self.session.sync().script_enabled() => Focus::Script,
            Focus::Serialized | Focus::Script => Focus::Preview,
        }
    }

    fn editor_mut(&mut self, surface: Surface) -> &mut TextEditor {
        match surface {
            Surface::Serialized => &mut self.serialized_editor,
            Surface::Script => &mut self.script_editor,
        }
    }

    fn sync_editors(&mut self) {
        for surface in [Surface::Serialized, Surface::Script] {
            let text = self.session.sync().text(surface);
            let editor = match surface {
                Surface::Serialized => &mut self.serialized_editor,
                Surface::Script => &mut self.script_editor,
            };
            if editor.text() != text {
                editor.set_text(text);
            }
        }
    }

    pub fn render(&mut self, frame: &mut ratatui::Frame) {
        let outer = frame.area();
        if outer.height < PROPERTIES_HEIGHT + 4 || outer.width < 20 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(PROPERTIES_HEIGHT),
            ])
            .split(outer);
        let (header_area, body_area, properties_area) = (vertical[0], vertical[1], vertical[2]);

        header::render(frame, header_area, &self.session, self.focus, &self.theme);

        let role = self.session.role();
        let (preview_area, editors_area) = if role.is_admin() {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(PREVIEW_PERCENT),
                    Constraint::Percentage(100 - PREVIEW_PERCENT),
                ])
                .split(body_area);
            (columns[0], Some(columns[1]))
        } else {
            (body_area, None)
        };

        let tree = self.session.tree();
        let preview = Block::default()
            .title(format!("Preview ({role})"))
            .borders(Borders::ALL)
            .border_type(Theme::border_type(tree.class_name.as_deref()))
            .border_style(if self.focus == Focus::Preview {
                self.theme.border_focused
            } else {
                self.theme.border_normal
            })
            .title_style(self.theme.title);
        let canvas = preview.inner(preview_area);
        frame.render_widget(preview, preview_area);
        self.pane_hits = draw_layout(
            tree,
            role,
            self.session.selected(),
            &self.theme,
            canvas,
            frame.buffer_mut(),
        );

        if let Some(editors_area) = editors_area {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(editors_area);
            let serialized_state = surface_state(&self.session, Surface::Serialized);
            source::render(
                frame,
                rows[0],
                "Layout JSON",
                &mut self.serialized_editor,
                &serialized_state,
                self.focus == Focus::Serialized,
                &self.theme,
            );
            let script_state = surface_state(&self.session, Surface::Script);
            source::render(
                frame,
                rows[1],
                "Layout script",
                &mut self.script_editor,
                &script_state,
                self.focus == Focus::Script,
                &self.theme,
            );
        }

        let selected = self
            .session
            .selected()
            .and_then(|id| find_by_id(self.session.tree(), id));
        properties::render(
            frame,
            properties_area,
            selected,
            &self.status,
            self.focus != Focus::Preview,
            &self.theme,
        );
    }
}

fn surface_state(session: &EditorSession, surface: Surface) -> SurfaceState<'_> {
    let sync = session.sync();
    if surface == Surface::Script && !sync.script_enabled() {
        return SurfaceState::Disabled;
    }
    if let Some(error) = sync.diagnostic(surface) {
        SurfaceState::Failed(error)
    } else if sync.is_pending(surface) {
        SurfaceState::Pending
    } else {
        SurfaceState::InSync
    }
}
