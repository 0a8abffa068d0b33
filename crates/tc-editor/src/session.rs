//! The editor session: one context object holding the scene, selection,
//! overlay, history and media for a single canvas.
//!
//! Every operation of the editing core is a method on `EditorSession`,
//! spread across the modules that own each concern (`selection`,
//! `factory`, `pipeline`, ...). Async operations borrow the session
//! through `Rc<RefCell<_>>` only between suspension points.

use crate::config::EditorConfig;
use crate::events::EditorEvent;
use crate::history::History;
use crate::media::{FrameDriver, MediaBackend, MediaRegistry, NullMediaBackend};
use crate::text_edit::TextEditState;
use futures::future::AbortHandle;
use smallvec::SmallVec;
use tc_core::snapshot;
use tc_core::{
    Color, NodeId, NodeIndex, NodeKind, SceneGraph, SceneNode, Snapshot, TextProps, Viewport,
};

pub struct EditorSession {
    pub(crate) config: EditorConfig,
    pub(crate) scene: SceneGraph,
    pub(crate) viewport: Viewport,
    pub(crate) selection: Option<NodeId>,
    pub(crate) history: History,
    pub(crate) media: MediaRegistry,
    pub(crate) backend: Box<dyn MediaBackend>,
    pub(crate) frames: FrameDriver,
    pub(crate) text_edit: TextEditState,
    /// Bumped by every template load; stale loads compare against it.
    pub(crate) template_generation: u64,
    pub(crate) inflight_template: Option<AbortHandle>,
    pub(crate) canvas_color: Color,
    pub(crate) welcome: Option<NodeId>,
    events: Vec<EditorEvent>,
}

impl EditorSession {
    /// An empty canvas with a fresh overlay and one baseline history entry.
    pub fn new(config: EditorConfig) -> Self {
        let viewport = Viewport::new(config.canvas_width, config.canvas_height);
        let history = History::new(config.history_limit);
        let mut session = Self {
            config,
            scene: SceneGraph::new(),
            viewport,
            selection: None,
            history,
            media: MediaRegistry::default(),
            backend: Box::new(NullMediaBackend),
            frames: FrameDriver::default(),
            text_edit: TextEditState::default(),
            template_generation: 0,
            inflight_template: None,
            canvas_color: Color::rgb(0x33, 0x33, 0x33),
            welcome: None,
            events: Vec::new(),
        };
        session.reset_overlay();
        session.commit();
        session
    }

    /// Add the welcome text and make it the history baseline.
    pub fn with_welcome(mut self) -> Self {
        let text = self.config.welcome_text.clone();
        let id = self.add_text(crate::factory::TextOptions {
            text,
            font_size: 30.0,
            fill: Color::WHITE,
            x: 30.0,
            y: 100.0,
            ..Default::default()
        });
        self.welcome = Some(id);
        if let Some(snapshot) = self.capture() {
            self.history.reset(snapshot);
        }
        self
    }

    pub fn with_media_backend(mut self, backend: Box<dyn MediaBackend>) -> Self {
        self.backend = backend;
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Where the stage container sits on the page.
    pub fn set_container_origin(&mut self, x: f64, y: f64) {
        self.viewport.container_origin = kurbo::Point::new(x, y);
        self.refresh_floating();
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn media(&self) -> &MediaRegistry {
        &self.media
    }

    pub fn frames(&self) -> &FrameDriver {
        &self.frames
    }

    pub fn canvas_color(&self) -> Color {
        self.canvas_color
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.scene.get_by_id(id)
    }

    /// Editable elements, back to front.
    pub fn elements(&self) -> Vec<NodeId> {
        self.scene.editable_children()
    }

    /// Elements currently bound to the transform overlay.
    pub fn overlay_nodes(&self) -> SmallVec<[NodeId; 1]> {
        match self.scene.get_by_id(NodeId::transformer()).map(|n| &n.kind) {
            Some(NodeKind::Transformer { nodes }) => nodes.clone(),
            _ => SmallVec::new(),
        }
    }

    // ─── Outbox ──────────────────────────────────────────────────────────

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[EditorEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Scene plumbing ──────────────────────────────────────────────────

    /// Put a node on the canvas with its variant's bindings installed.
    /// The overlay stays the topmost child.
    pub(crate) fn attach(&mut self, mut node: SceneNode) -> NodeIndex {
        node.bind();
        let idx = self.scene.add_element(node);
        self.raise_overlay();
        idx
    }

    /// Bring the overlay back above every element.
    pub(crate) fn raise_overlay(&mut self) {
        self.scene.move_to_top(NodeId::transformer());
    }

    /// Point the overlay at `nodes` (empty to unbind).
    pub(crate) fn bind_overlay(&mut self, nodes: SmallVec<[NodeId; 1]>) {
        match self.scene.get_by_id_mut(NodeId::transformer()) {
            Some(SceneNode {
                kind: NodeKind::Transformer { nodes: bound },
                ..
            }) => *bound = nodes,
            _ => log::warn!("overlay: transformer node missing"),
        }
    }

    /// Replace the overlay with a fresh, unbound one on top of the layer.
    pub(crate) fn reset_overlay(&mut self) {
        self.scene.remove_element(NodeId::transformer());
        self.scene.add_element(SceneNode::new(
            NodeId::transformer(),
            NodeKind::Transformer {
                nodes: SmallVec::new(),
            },
        ));
    }

    /// Destroy every element and release its media. Leaves a fresh overlay.
    pub(crate) fn clear_scene(&mut self) {
        self.cancel_text_edit();
        self.scene.destroy_children();
        self.media.release_all();
        self.welcome = None;
        self.reset_overlay();
        self.deselect();
        self.sync_frame_driver();
    }

    /// Remove the welcome text if it is still on the canvas untouched.
    pub(crate) fn remove_welcome(&mut self) {
        let Some(id) = self.welcome.take() else {
            return;
        };
        let untouched = self
            .scene
            .get_by_id(id)
            .and_then(SceneNode::as_text)
            .is_some_and(|t: &TextProps| t.text == self.config.welcome_text);
        if untouched {
            if self.selection == Some(id) {
                self.deselect();
            }
            self.scene.remove_element(id);
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    fn capture(&self) -> Option<Snapshot> {
        match snapshot::serialize(&self.scene) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                log::error!("history: cannot capture scene: {err}");
                None
            }
        }
    }

    /// Record the current scene as a new history entry.
    pub fn commit(&mut self) -> bool {
        let Some(snapshot) = self.capture() else {
            return false;
        };
        self.history.commit(snapshot);
        log::debug!(
            "history: commit {}/{}",
            self.history.pointer() + 1,
            self.history.len()
        );
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            log::debug!("history: nothing to undo");
            return false;
        };
        self.restore_from(&snapshot)
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            log::debug!("history: nothing to redo");
            return false;
        };
        self.restore_from(&snapshot)
    }

    /// Replace the whole scene with a snapshot.
    ///
    /// Control nodes are rebuilt, bindings reinstalled, and media handles
    /// reconciled: handles of vanished elements are released, surviving
    /// elements keep theirs, and restored media without one get a fresh
    /// paused handle. Selection is cleared.
    fn restore_from(&mut self, snapshot: &Snapshot) -> bool {
        let restored = match snapshot::restore(snapshot) {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("history: cannot restore scene: {err}");
                return false;
            }
        };

        self.cancel_text_edit();
        self.scene = restored;
        self.reset_overlay();

        let scene = &self.scene;
        self.media.retain(|id, slot| {
            scene
                .get_by_id(id)
                .and_then(SceneNode::media)
                .is_some_and(|m| &m == slot.media())
        });
        let missing: Vec<_> = self
            .scene
            .editable_children()
            .into_iter()
            .filter(|id| !self.media.contains(*id))
            .filter_map(|id| self.scene.get_by_id(id)?.media().map(|m| (id, m)))
            .collect();
        for (id, media) in missing {
            self.open_media(id, &media);
        }

        if self.welcome.is_some_and(|id| !self.scene.contains(id)) {
            self.welcome = None;
        }

        self.deselect();
        self.sync_frame_driver();
        self.emit(EditorEvent::RedrawRequested);
        true
    }
}
