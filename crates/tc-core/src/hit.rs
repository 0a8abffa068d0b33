//! Hit testing: stage point → node lookup.
//!
//! Reverse-walks the scene (front-to-back) to find the topmost listening
//! node under a point. A node that does not listen hides its whole subtree,
//! and a listening group with non-listening children swallows clicks on
//! them, which is how the audio tile behaves as one unit.

use crate::geometry::{Viewport, absolute_transform};
use crate::id::NodeId;
use crate::model::NodeKind;
use crate::scene::SceneGraph;
use kurbo::{Point, Rect};
use petgraph::graph::NodeIndex;

/// Find the topmost node at a stage-space point.
/// Returns `None` if only the background is hit.
pub fn hit_test(scene: &SceneGraph, viewport: &Viewport, at: Point) -> Option<NodeId> {
    hit_test_node(scene, scene.root, viewport, at)
}

fn hit_test_node(
    scene: &SceneGraph,
    idx: NodeIndex,
    viewport: &Viewport,
    at: Point,
) -> Option<NodeId> {
    let node = &scene.graph[idx];
    let is_root = idx == scene.root;
    if !is_root && (!node.attrs.listening || !node.attrs.visible) {
        return None;
    }
    if matches!(node.kind, NodeKind::Transformer { .. }) {
        return None;
    }

    for child in scene.children(idx).into_iter().rev() {
        if let Some(hit) = hit_test_node(scene, child, viewport, at) {
            return Some(hit);
        }
    }

    if is_root {
        return None;
    }

    // Test in local space so rotated nodes hit on their true outline.
    let local = absolute_transform(scene, idx, viewport).inverse() * at;
    let (w, h) = node.size();
    let bounds = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));
    bounds.contains(local).then_some(node.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupProps, RectProps, SceneNode, TextProps};

    fn boxed(id: &str, x: f32, y: f32, w: f32, h: f32) -> SceneNode {
        let mut node = SceneNode::editable(NodeId::intern(id), NodeKind::Rect(RectProps::default()));
        node.attrs.x = x;
        node.attrs.y = y;
        node.attrs.width = w;
        node.attrs.height = h;
        node
    }

    #[test]
    fn topmost_wins() {
        let mut sg = SceneGraph::new();
        sg.add_element(boxed("hit_back", 0.0, 0.0, 100.0, 100.0));
        sg.add_element(boxed("hit_front", 50.0, 50.0, 100.0, 100.0));
        let vp = Viewport::default();

        assert_eq!(
            hit_test(&sg, &vp, Point::new(75.0, 75.0)),
            Some(NodeId::intern("hit_front"))
        );
        assert_eq!(
            hit_test(&sg, &vp, Point::new(10.0, 10.0)),
            Some(NodeId::intern("hit_back"))
        );
        assert_eq!(hit_test(&sg, &vp, Point::new(250.0, 500.0)), None);
    }

    #[test]
    fn group_swallows_non_listening_children() {
        let mut sg = SceneGraph::new();
        let mut tile = SceneNode::editable(
            NodeId::intern("hit_tile"),
            NodeKind::Group(GroupProps::default()),
        );
        tile.attrs.x = 100.0;
        tile.attrs.y = 100.0;
        tile.attrs.width = 100.0;
        tile.attrs.height = 100.0;
        let g = sg.add_element(tile);

        let mut label = SceneNode::new(NodeId::intern("hit_label"), NodeKind::Text(TextProps::default()));
        label.attrs.width = 100.0;
        label.attrs.height = 100.0;
        label.attrs.listening = false;
        sg.add_child(g, label);

        assert_eq!(
            hit_test(&sg, &Viewport::default(), Point::new(150.0, 150.0)),
            Some(NodeId::intern("hit_tile"))
        );
    }
}
