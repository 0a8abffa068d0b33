//! Scene snapshots.
//!
//! A snapshot is the whole tree under the root layer, encoded as
//! MessagePack. The bytes are opaque to callers and never change after
//! capture, so cloning a `Snapshot` only bumps a reference count.
//!
//! `restore` only imports top-level nodes carrying the editable tag.
//! Control nodes such as the transform overlay are dropped and the caller
//! rebuilds them fresh.

use crate::model::SceneNode;
use crate::scene::SceneGraph;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Bumped whenever the record layout changes.
const FORMAT_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode scene: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode scene: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("failed to render scene as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u8),
}

/// An immutable serialized copy of the scene at one instant.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<[u8]>);

impl Snapshot {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({} bytes)", self.0.len())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SceneRecord {
    version: u8,
    children: Vec<NodeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    node: SceneNode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeRecord>,
}

fn record_of(scene: &SceneGraph, idx: NodeIndex) -> NodeRecord {
    NodeRecord {
        node: scene.graph[idx].clone(),
        children: scene
            .children(idx)
            .into_iter()
            .map(|child| record_of(scene, child))
            .collect(),
    }
}

fn scene_record(scene: &SceneGraph) -> SceneRecord {
    SceneRecord {
        version: FORMAT_VERSION,
        children: scene
            .children(scene.root)
            .into_iter()
            .map(|idx| record_of(scene, idx))
            .collect(),
    }
}

/// Capture the current scene.
pub fn serialize(scene: &SceneGraph) -> Result<Snapshot, SnapshotError> {
    let bytes = rmp_serde::to_vec_named(&scene_record(scene))?;
    Ok(Snapshot(Arc::from(bytes)))
}

/// Rebuild a scene from a snapshot.
///
/// Top-level nodes without the editable tag are skipped. Every imported
/// top-level node gets its variant's pointer bindings installed; nested
/// children (e.g. the icon and label inside an audio tile) stay unbound.
pub fn restore(snapshot: &Snapshot) -> Result<SceneGraph, SnapshotError> {
    let record: SceneRecord = rmp_serde::from_slice(snapshot.as_bytes())?;
    if record.version != FORMAT_VERSION {
        return Err(SnapshotError::Version(record.version));
    }

    let mut scene = SceneGraph::new();
    let root = scene.root;
    for child in record.children {
        if !child.node.is_editable() {
            log::debug!("restore: skipping control node {:?}", child.node.id);
            continue;
        }
        let mut node = child.node;
        node.bind();
        let idx = scene.add_child(root, node);
        import_children(&mut scene, idx, child.children);
    }
    Ok(scene)
}

fn import_children(scene: &mut SceneGraph, parent: NodeIndex, children: Vec<NodeRecord>) {
    for child in children {
        let idx = scene.add_child(parent, child.node);
        import_children(scene, idx, child.children);
    }
}

/// Render a snapshot as pretty JSON for inspection.
pub fn to_json(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    let record: SceneRecord = rmp_serde::from_slice(snapshot.as_bytes())?;
    Ok(serde_json::to_string_pretty(&record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::*;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    fn sample_scene() -> SceneGraph {
        let mut sg = SceneGraph::new();
        let mut title = SceneNode::editable(
            NodeId::intern("snap_title"),
            NodeKind::Text(TextProps {
                text: "HEADLINE".into(),
                font_family: "Bebas Neue".into(),
                font_size: 50.0,
                fill: Some(Color::WHITE),
                ..Default::default()
            }),
        );
        title.attrs.x = 40.0;
        title.attrs.y = 70.0;
        title.attrs.shadow.enabled = true;
        title.attrs.animation = AnimationPreset::ZoomIn;
        sg.add_element(title);

        let mut panel = SceneNode::editable(
            NodeId::intern("snap_panel"),
            NodeKind::Rect(RectProps {
                fill: Some(Color::rgb(0xFF, 0xB5, 0x31)),
                corner_radius: 8.0,
            }),
        );
        panel.attrs.set_opacity(0.5);
        sg.add_element(panel);
        sg.move_to_bottom(NodeId::intern("snap_panel"));
        sg
    }

    #[test]
    fn roundtrip_keeps_order_and_attributes() {
        let sg = sample_scene();
        let restored = restore(&serialize(&sg).unwrap()).unwrap();

        assert_eq!(restored.editable_children(), sg.editable_children());
        for id in sg.editable_children() {
            let before = sg.get_by_id(id).unwrap();
            let after = restored.get_by_id(id).unwrap();
            assert_eq!(after.kind, before.kind);
            assert_eq!(after.attrs, before.attrs);
        }
    }

    #[test]
    fn restore_skips_control_nodes_and_binds() {
        let mut sg = sample_scene();
        sg.add_element(SceneNode::new(
            NodeId::transformer(),
            NodeKind::Transformer {
                nodes: smallvec![NodeId::intern("snap_title")],
            },
        ));

        let restored = restore(&serialize(&sg).unwrap()).unwrap();
        assert!(!restored.contains(NodeId::transformer()));

        let title = restored.get_by_id(NodeId::intern("snap_title")).unwrap();
        assert_eq!(title.bindings, Bindings::for_class(ElementClass::Text));
    }

    #[test]
    fn json_view_lists_nodes() {
        let json = to_json(&serialize(&sample_scene()).unwrap()).unwrap();
        assert!(json.contains("snap_title"));
        assert!(json.contains("#FFB531"));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = restore(&Snapshot::from_bytes(&[0xC1, 0x00])).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }
}
