//! Selection and transform controller.
//!
//! At most one element is selected. Whenever the selection is set, the
//! transform overlay is bound to exactly that element; whenever it is
//! cleared, the overlay is bound to nothing. Pointer events from the
//! graphics layer are routed through each node's binding table.

use crate::events::{EditorEvent, PanelPlacement};
use crate::session::EditorSession;
use crate::sidebar::SidebarState;
use kurbo::Point;
use smallvec::smallvec;
use tc_core::geometry::client_rect;
use tc_core::{NodeId, SceneNode, hit_test};

/// Final transform reported by the graphics layer after a resize/rotate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformUpdate {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

/// Pointer events on the canvas. `target: None` is the stage background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    Click { target: Option<NodeId> },
    DoubleClick { target: Option<NodeId> },
    DragMove { target: NodeId, x: f32, y: f32 },
    DragEnd { target: NodeId, x: f32, y: f32 },
    TransformEnd { target: NodeId, transform: TransformUpdate },
}

impl EditorSession {
    /// Select an element. Non-editable or unknown targets deselect instead.
    pub fn select(&mut self, id: NodeId) -> bool {
        let Some(node) = self.scene.get_by_id(id) else {
            log::warn!("select: unknown element {id:?}");
            self.deselect();
            return false;
        };
        if !node.is_editable() {
            self.deselect();
            return false;
        }
        let sidebar = SidebarState::for_node(node);

        self.selection = Some(id);
        self.bind_overlay(smallvec![id]);
        self.emit(EditorEvent::SidebarChanged(sidebar));
        self.emit(EditorEvent::ToolbarVisible(true));
        self.refresh_floating();
        self.emit(EditorEvent::RedrawRequested);
        log::debug!("select: {id:?}");
        true
    }

    /// Clear the selection and reset the sidebar to canvas defaults.
    pub fn deselect(&mut self) {
        self.selection = None;
        self.bind_overlay(smallvec![]);
        self.emit(EditorEvent::FloatingControls(None));
        self.emit(EditorEvent::ToolbarVisible(false));
        self.emit(EditorEvent::SidebarChanged(SidebarState::Canvas {
            canvas_color: self.canvas_color,
        }));
        self.emit(EditorEvent::RedrawRequested);
    }

    /// Delete the selected element, releasing any media it owns.
    pub fn delete_selection(&mut self) -> bool {
        let Some(id) = self.selection else {
            log::debug!("delete: nothing selected");
            return false;
        };
        self.media.release(id);
        self.bind_overlay(smallvec![]);
        self.scene.remove_element(id);
        if self.welcome == Some(id) {
            self.welcome = None;
        }
        self.deselect();
        self.sync_frame_driver();
        self.commit();
        log::debug!("delete: {id:?}");
        true
    }

    /// Clone the selected element next to the original and select the clone.
    pub fn duplicate_selection(&mut self) -> Option<NodeId> {
        let id = self.selection?;
        let prefix = self.scene.get_by_id(id)?.class().as_str().to_lowercase();
        let clone = self.scene.clone_subtree(id, &prefix)?;

        let (dx, dy) = (self.config.duplicate_offset_x, self.config.duplicate_offset_y);
        let media = self.scene.get_by_id_mut(clone).and_then(|node| {
            node.attrs.x += dx;
            node.attrs.y += dy;
            node.attrs.draggable = true;
            node.attrs.name = Some(tc_core::EDITABLE_TAG.to_string());
            node.bind();
            node.media()
        });
        self.raise_overlay();
        if let Some(media) = media {
            self.open_media(clone, &media);
        }
        self.sync_frame_driver();
        self.select(clone);
        self.commit();
        log::debug!("duplicate: {id:?} -> {clone:?}");
        Some(clone)
    }

    pub fn bring_to_front(&mut self) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        let before = self.scene.z_index_of(id);
        self.scene.move_to_top(id);
        self.raise_overlay();
        let moved = self.scene.z_index_of(id) != before;
        if moved {
            self.commit();
            self.emit(EditorEvent::RedrawRequested);
        }
        moved
    }

    pub fn send_to_back(&mut self) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        let moved = self.scene.move_to_bottom(id);
        if moved {
            self.commit();
            self.emit(EditorEvent::RedrawRequested);
        }
        moved
    }

    /// Where the floating media controls go for the current selection.
    /// `None` when nothing is selected or the selection is not media.
    pub fn floating_placement(&self) -> Option<PanelPlacement> {
        let id = self.selection?;
        let node = self.scene.get_by_id(id)?;
        if !node.is_media() {
            return None;
        }
        let rect = client_rect(&self.scene, self.scene.index_of(id)?, &self.viewport);
        if !rect.x0.is_finite() || !rect.y0.is_finite() {
            return None;
        }
        let center = self.viewport.to_screen(rect.center());
        let (width, height) = (self.config.panel_width, self.config.panel_height);
        Some(PanelPlacement {
            left: center.x - width / 2.0,
            top: center.y - height / 2.0,
            width,
            height,
            playing: self.is_media_playing(id),
        })
    }

    pub(crate) fn refresh_floating(&mut self) {
        let placement = self.floating_placement();
        self.emit(EditorEvent::FloatingControls(placement));
    }

    /// Route a pointer event through the target's binding table.
    /// Returns true if the event changed anything.
    pub fn dispatch(&mut self, event: CanvasEvent) -> bool {
        match event {
            CanvasEvent::Click { target: None } => {
                self.deselect();
                true
            }
            CanvasEvent::Click {
                target: Some(target),
            } => {
                let Some(node) = self.scene.get_by_id(target) else {
                    self.deselect();
                    return true;
                };
                let bindings = node.bindings;
                if !bindings.select {
                    self.deselect();
                    return true;
                }
                self.select(target);
                if !bindings.cancel_bubble {
                    self.stage_click(Some(target));
                }
                true
            }
            CanvasEvent::DoubleClick { target } => {
                let Some(target) = target else {
                    return false;
                };
                let editable_text = self
                    .scene
                    .get_by_id(target)
                    .is_some_and(|n| n.bindings.edit_text);
                editable_text && self.begin_text_edit(target).is_some()
            }
            CanvasEvent::DragMove { target, x, y } => {
                let Some(node) = self.scene.get_by_id_mut(target) else {
                    return false;
                };
                node.attrs.x = x;
                node.attrs.y = y;
                let track = node.bindings.track_floating;
                if track && self.selection == Some(target) {
                    self.refresh_floating();
                }
                true
            }
            CanvasEvent::DragEnd { target, x, y } => {
                let Some(node) = self.scene.get_by_id_mut(target) else {
                    return false;
                };
                node.attrs.x = x;
                node.attrs.y = y;
                if node.bindings.commit_on_drag_end {
                    self.commit();
                }
                true
            }
            CanvasEvent::TransformEnd { target, transform } => {
                let Some(node) = self.scene.get_by_id_mut(target) else {
                    return false;
                };
                let attrs = &mut node.attrs;
                attrs.x = transform.x;
                attrs.y = transform.y;
                attrs.rotation = transform.rotation;
                attrs.scale_x = transform.scale_x;
                attrs.scale_y = transform.scale_y;
                let bindings = node.bindings;
                if bindings.commit_on_transform_end {
                    self.commit();
                }
                if bindings.track_floating && self.selection == Some(target) {
                    self.refresh_floating();
                }
                true
            }
        }
    }

    /// Click at a stage-space point, resolved with the reference hit test.
    pub fn click_at(&mut self, x: f64, y: f64) -> bool {
        let target = hit_test(&self.scene, &self.viewport, Point::new(x, y));
        self.dispatch(CanvasEvent::Click { target })
    }

    /// Stage-level click handler: background or non-editable targets deselect.
    fn stage_click(&mut self, target: Option<NodeId>) {
        let editable = target
            .and_then(|id| self.scene.get_by_id(id))
            .is_some_and(SceneNode::is_editable);
        if !editable {
            self.deselect();
        }
    }
}
