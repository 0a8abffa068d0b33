//! In-place text editing.
//!
//! Double-clicking a text element hides it and asks the host to open an
//! input surface on top of it (`TextOverlayOpened`). Blur and Enter both
//! finish the edit; whichever arrives first wins and the other is a no-op.
//! Each edit carries a token so a late exit from an older overlay cannot
//! close a newer one.

use crate::events::EditorEvent;
use crate::session::EditorSession;
use serde::Serialize;
use tc_core::geometry::absolute_position;
use tc_core::{Color, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Editing {
        token: u64,
        target: NodeId,
    },
}

/// Text editor state machine: `Idle -> Editing -> Idle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEditState {
    phase: Phase,
    issued: u64,
}

impl TextEditState {
    pub fn is_editing(&self) -> bool {
        matches!(self.phase, Phase::Editing { .. })
    }

    /// The element being edited, if any.
    pub fn target(&self) -> Option<NodeId> {
        match self.phase {
            Phase::Editing { target, .. } => Some(target),
            Phase::Idle => None,
        }
    }

    fn open(&mut self, target: NodeId) -> u64 {
        self.issued += 1;
        self.phase = Phase::Editing {
            token: self.issued,
            target,
        };
        self.issued
    }

    /// Leave `Editing` if `token` is the live edit. Returns its target.
    fn close(&mut self, token: u64) -> Option<NodeId> {
        match self.phase {
            Phase::Editing { token: live, target } if live == token => {
                self.phase = Phase::Idle;
                Some(target)
            }
            _ => None,
        }
    }
}

/// What ended an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    Blur,
    Enter,
}

/// Placement and style of the input surface the host draws over the
/// hidden text element. Coordinates are page pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub token: u64,
    pub target: NodeId,
    pub value: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f32,
    pub font_family: String,
    pub color: Color,
    pub line_height: f32,
}

impl EditorSession {
    /// Start editing a text element. Returns `None` if `id` is not an
    /// editable text node.
    pub fn begin_text_edit(&mut self, id: NodeId) -> Option<TextOverlay> {
        let node = self.scene.get_by_id(id)?;
        if !node.is_editable() || node.as_text().is_none() {
            log::debug!("text edit: {id:?} is not editable text");
            return None;
        }
        if self.text_edit.is_editing() {
            self.cancel_text_edit();
        }

        self.deselect();
        let idx = self.scene.index_of(id)?;
        let origin = self
            .viewport
            .to_screen(absolute_position(&self.scene, idx, &self.viewport));
        let node = self.scene.get_by_id_mut(id)?;
        node.attrs.visible = false;
        let (width, height) = node.size();
        let text = node.as_text()?;
        let padding = text.padding;

        let token = self.text_edit.open(id);
        let overlay = TextOverlay {
            token,
            target: id,
            value: text.text.clone(),
            left: origin.x,
            top: origin.y,
            width: f64::from((width - padding * 2.0).max(0.0)),
            height: f64::from((height - padding * 2.0).max(0.0)),
            font_size: text.font_size,
            font_family: text.font_family.clone(),
            color: text.fill.unwrap_or(Color::BLACK),
            line_height: text.line_height,
        };

        self.emit(EditorEvent::TextOverlayOpened(overlay.clone()));
        self.emit(EditorEvent::RedrawRequested);
        log::debug!("text edit: #{token} opened on {id:?}");
        Some(overlay)
    }

    /// Write `value` back and close the edit. Only the first exit of a
    /// given edit does anything; later calls return false.
    pub fn finish_text_edit(&mut self, token: u64, value: &str, trigger: ExitTrigger) -> bool {
        let Some(target) = self.text_edit.close(token) else {
            log::debug!("text edit: #{token} already closed ({trigger:?})");
            return false;
        };

        match self.scene.get_by_id_mut(target) {
            Some(node) => {
                if let Some(text) = node.as_text_mut() {
                    text.text = value.to_string();
                }
                node.attrs.visible = true;
            }
            None => log::warn!("text edit: {target:?} vanished while editing"),
        }

        self.emit(EditorEvent::TextOverlayClosed);
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        log::debug!("text edit: #{token} closed by {trigger:?}");
        true
    }

    /// Key press inside the overlay. Enter without Shift finishes the edit;
    /// returns true when the host should suppress the key's default.
    pub fn overlay_key(&mut self, token: u64, key: &str, shift: bool, value: &str) -> bool {
        if key != "Enter" || shift {
            return false;
        }
        self.finish_text_edit(token, value, ExitTrigger::Enter)
    }

    pub fn is_editing_text(&self) -> bool {
        self.text_edit.is_editing()
    }

    /// Abandon an open edit without writing or committing. Used when the
    /// scene is about to be replaced.
    pub(crate) fn cancel_text_edit(&mut self) {
        let Phase::Editing { token, target } = self.text_edit.phase else {
            return;
        };
        self.text_edit.close(token);
        if let Some(node) = self.scene.get_by_id_mut(target) {
            node.attrs.visible = true;
        }
        self.emit(EditorEvent::TextOverlayClosed);
        log::debug!("text edit: #{token} cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::factory::TextOptions;
    use pretty_assertions::assert_eq;
    use tc_core::SceneNode;

    fn text_of(node: &SceneNode) -> Option<&str> {
        node.as_text().map(|t| t.text.as_str())
    }

    fn session_with(text: &str) -> (EditorSession, NodeId) {
        let mut s = EditorSession::new(EditorConfig::default());
        let id = s.add_text(TextOptions {
            text: text.into(),
            ..Default::default()
        });
        s.drain_events();
        (s, id)
    }

    #[test]
    fn opening_hides_the_node_and_deselects() {
        let (mut s, id) = session_with("A");
        let overlay = s.begin_text_edit(id).unwrap();

        assert_eq!(overlay.value, "A");
        assert_eq!((overlay.left, overlay.top), (50.0, 150.0));
        assert_eq!(overlay.width, 200.0);
        assert!(!s.node(id).unwrap().attrs.visible);
        assert_eq!(s.selection(), None);
        assert!(s.events().contains(&EditorEvent::TextOverlayOpened(overlay)));
    }

    #[test]
    fn overlay_follows_container_origin() {
        let (mut s, id) = session_with("A");
        s.set_container_origin(10.0, 20.0);
        let overlay = s.begin_text_edit(id).unwrap();
        assert_eq!((overlay.left, overlay.top), (60.0, 170.0));
    }

    #[test]
    fn blur_then_enter_commits_once() {
        let (mut s, id) = session_with("A");
        let before = s.history().len();
        let token = s.begin_text_edit(id).unwrap().token;

        assert!(s.finish_text_edit(token, "B", ExitTrigger::Blur));
        assert!(!s.overlay_key(token, "Enter", false, "B"));

        assert_eq!(s.history().len(), before + 1);
        assert_eq!(s.node(id).and_then(text_of), Some("B"));
        assert!(s.node(id).unwrap().attrs.visible);
    }

    #[test]
    fn shift_enter_keeps_editing() {
        let (mut s, id) = session_with("A");
        let token = s.begin_text_edit(id).unwrap().token;
        assert!(!s.overlay_key(token, "Enter", true, "A\n"));
        assert!(s.is_editing_text());
        assert!(s.overlay_key(token, "Enter", false, "A\nB"));
        assert!(!s.is_editing_text());
    }

    #[test]
    fn stale_token_cannot_close_a_newer_edit() {
        let (mut s, id) = session_with("A");
        let first = s.begin_text_edit(id).unwrap().token;
        let second = s.begin_text_edit(id).unwrap().token;
        assert!(!s.finish_text_edit(first, "stale", ExitTrigger::Blur));
        assert!(s.finish_text_edit(second, "fresh", ExitTrigger::Blur));
        assert_eq!(s.node(id).and_then(text_of), Some("fresh"));
    }

    #[test]
    fn non_text_targets_are_refused() {
        let mut s = EditorSession::new(EditorConfig::default());
        let rect = s.add_rectangle(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        assert_eq!(s.begin_text_edit(rect), None);
        assert!(!s.is_editing_text());
    }
}
