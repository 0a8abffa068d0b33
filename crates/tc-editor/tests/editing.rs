//! Integration tests: selection, overlay and in-place text editing.

use pretty_assertions::assert_eq;
use tc_core::{Color, NodeId, SceneNode};
use tc_editor::{
    CanvasEvent, EditorConfig, EditorEvent, EditorSession, ExitTrigger, KeyInput, TextOptions,
};

fn session() -> EditorSession {
    let _ = env_logger::builder().is_test(true).try_init();
    EditorSession::new(EditorConfig::default())
}

/// Overlay binding must always mirror the selection.
fn assert_overlay_matches(s: &EditorSession) {
    let bound = s.overlay_nodes();
    match s.selection() {
        Some(id) => assert_eq!(bound.as_slice(), &[id]),
        None => assert!(bound.is_empty()),
    }
}

#[test]
fn overlay_tracks_selection_through_a_session() {
    let mut s = session();
    assert_overlay_matches(&s);

    let text = s.add_text(TextOptions::default());
    assert_overlay_matches(&s);
    let rect = s.add_rectangle(kurbo::Rect::new(0.0, 0.0, 300.0, 550.0), Color::BLACK);
    assert_overlay_matches(&s);

    s.dispatch(CanvasEvent::Click { target: Some(rect) });
    assert_eq!(s.selection(), Some(rect));
    assert_overlay_matches(&s);

    s.duplicate_selection();
    assert_overlay_matches(&s);

    s.dispatch(CanvasEvent::Click { target: None });
    assert_overlay_matches(&s);

    s.select(text);
    s.undo();
    assert_overlay_matches(&s);

    s.redo();
    s.select(text);
    s.handle_key(&KeyInput::plain("Delete"));
    assert_eq!(s.selection(), None);
    assert_overlay_matches(&s);
}

#[test]
fn click_on_text_selects_it_at_its_position() {
    let mut s = session();
    let text = s.add_text(TextOptions::default());
    s.deselect();

    // Default text box starts at (50, 150) and is 200 wide.
    assert!(s.click_at(60.0, 155.0));
    assert_eq!(s.selection(), Some(text));
    assert!(s.click_at(5.0, 5.0));
    assert_eq!(s.selection(), None);
}

#[test]
fn blur_and_enter_in_the_same_tick_commit_once() {
    let mut s = session();
    let id = s.add_text(TextOptions {
        text: "A".into(),
        ..Default::default()
    });
    let before = s.history().len();

    assert!(s.dispatch(CanvasEvent::DoubleClick { target: Some(id) }));
    let token = s
        .drain_events()
        .into_iter()
        .find_map(|e| match e {
            EditorEvent::TextOverlayOpened(overlay) => Some(overlay.token),
            _ => None,
        })
        .unwrap();

    let blur = s.finish_text_edit(token, "B", ExitTrigger::Blur);
    let enter = s.overlay_key(token, "Enter", false, "B");
    assert!(blur ^ enter);

    assert_eq!(s.history().len(), before + 1);
    let text = s.node(id).and_then(SceneNode::as_text).unwrap();
    assert_eq!(text.text, "B");
    let closed = s
        .drain_events()
        .into_iter()
        .filter(|e| *e == EditorEvent::TextOverlayClosed)
        .count();
    assert_eq!(closed, 1);
}

#[test]
fn shortcuts_are_ignored_while_editing_text() {
    let mut s = session();
    let id = s.add_text(TextOptions::default());
    let overlay = s.begin_text_edit(id).unwrap();
    s.select(id);

    let outcome = s.handle_key(&KeyInput::plain("Backspace"));
    assert!(!outcome.handled);
    assert!(s.node(id).is_some());

    s.finish_text_edit(overlay.token, "kept", ExitTrigger::Enter);
    assert_eq!(s.elements(), vec![id]);
}

#[test]
fn undo_during_text_edit_closes_the_overlay() {
    let mut s = session();
    let id = s.add_text(TextOptions::default());
    s.add_emoji("🎉");
    let overlay = s.begin_text_edit(id).unwrap();

    assert!(s.undo());
    assert!(!s.is_editing_text());
    assert!(s.node(id).unwrap().attrs.visible);
    assert!(!s.finish_text_edit(overlay.token, "late", ExitTrigger::Blur));
}

#[test]
fn clicks_on_unknown_nodes_deselect() {
    let mut s = session();
    s.add_text(TextOptions::default());
    s.dispatch(CanvasEvent::Click {
        target: Some(NodeId::intern("not-on-canvas")),
    });
    assert_eq!(s.selection(), None);
}
