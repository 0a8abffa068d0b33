//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s, then runs
//! them against the session. On macOS `meta` is ⌘; elsewhere `ctrl`
//! plays the same role.

use crate::session::EditorSession;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,

    // ── Text ──
    ToggleBold,
    ToggleItalic,

    // ── Z-order ──
    SendToBack,
    BringToFront,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "b" | "B" => Some(ShortcutAction::ToggleBold),
                "i" | "I" => Some(ShortcutAction::ToggleItalic),
                "[" => Some(ShortcutAction::SendToBack),
                "]" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

/// A `keydown` as seen by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    /// Focus is in a form field (input, textarea, contenteditable).
    pub typing: bool,
}

impl KeyInput {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// The shortcut changed the editor.
    pub handled: bool,
    /// The host should call `preventDefault()` on the event.
    pub prevent_default: bool,
}

impl EditorSession {
    /// Run a keyboard shortcut. Nothing fires while the user is typing in a
    /// form field or the text overlay, so Backspace edits text instead of
    /// deleting the selection.
    pub fn handle_key(&mut self, input: &KeyInput) -> KeyOutcome {
        if input.typing || self.is_editing_text() {
            return KeyOutcome::default();
        }
        let Some(action) =
            ShortcutMap::resolve(&input.key, input.ctrl, input.shift, input.alt, input.meta)
        else {
            return KeyOutcome::default();
        };

        let handled = match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::Duplicate => self.duplicate_selection().is_some(),
            ShortcutAction::ToggleBold => self.toggle_bold(),
            ShortcutAction::ToggleItalic => self.toggle_italic(),
            ShortcutAction::SendToBack => self.send_to_back(),
            ShortcutAction::BringToFront => self.bring_to_front(),
            ShortcutAction::Deselect => {
                let had = self.selection.is_some();
                self.deselect();
                had
            }
        };
        log::debug!("shortcut: {action:?} handled={handled}");

        // Delete/Backspace only block browser navigation when they deleted
        // something; modifier combos always shadow the browser binding.
        let prevent_default = match action {
            ShortcutAction::Delete | ShortcutAction::Deselect => handled,
            _ => true,
        };
        KeyOutcome {
            handled,
            prevent_default,
        }
    }
}
