//! The scene graph: a tree of `SceneNode`s rooted at a single layer.
//!
//! Edges go from parent → child. Child order is the z-order (index 0 is
//! painted first, i.e. at the back) and is kept explicitly per parent so
//! z-index moves never depend on how `petgraph` iterates adjacency.

use crate::id::NodeId;
use crate::model::{NodeKind, SceneNode};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// The underlying directed graph.
    pub graph: StableDiGraph<SceneNode, ()>,

    /// The root layer index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    id_index: HashMap<NodeId, NodeIndex>,

    /// Children of each parent, back to front.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl SceneGraph {
    /// Create an empty scene with just the root layer.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(SceneNode::new(NodeId::layer(), NodeKind::Layer));

        let mut id_index = HashMap::new();
        id_index.insert(NodeId::layer(), root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
        }
    }

    /// Add a node on top of the root layer. Returns the new node's index.
    pub fn add_element(&mut self, node: SceneNode) -> NodeIndex {
        self.add_child(self.root, node)
    }

    /// Add a node on top of `parent`'s children.
    ///
    /// Ids are unique: a node whose id is reserved or already in the scene
    /// is added under a fresh id derived from it. Existing nodes are never
    /// displaced.
    pub fn add_child(&mut self, parent: NodeIndex, mut node: SceneNode) -> NodeIndex {
        if (node.id.is_reserved() && node.is_editable()) || self.id_index.contains_key(&node.id) {
            let fresh = NodeId::with_prefix(node.id.as_str());
            log::warn!("scene: id {:?} already taken, using {fresh:?}", node.id);
            node.id = fresh;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        self.id_index.insert(id, idx);
        idx
    }

    /// Remove an element and everything below it.
    /// Returns the removed node, or `None` for unknown ids and the root.
    pub fn remove_element(&mut self, id: NodeId) -> Option<SceneNode> {
        let idx = self.index_of(id)?;
        if idx == self.root {
            return None;
        }
        self.remove_subtree(idx)
    }

    fn remove_subtree(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|&c| c != idx);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
        }
        removed
    }

    /// Destroy every child of the root layer.
    pub fn destroy_children(&mut self) {
        for child in self.children(self.root) {
            self.remove_subtree(child);
        }
    }

    /// Look up a node by id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably by id.
    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node, back to front.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.child_order.get(&idx).cloned().unwrap_or_default()
    }

    /// Top-level nodes carrying the editable-identity tag, back to front.
    pub fn editable_children(&self) -> Vec<NodeId> {
        self.children(self.root)
            .into_iter()
            .map(|idx| &self.graph[idx])
            .filter(|n| n.is_editable())
            .map(|n| n.id)
            .collect()
    }

    /// Number of editable top-level elements.
    pub fn editable_count(&self) -> usize {
        self.editable_children().len()
    }

    /// Position of a node among its siblings (0 = back).
    pub fn z_index_of(&self, id: NodeId) -> Option<usize> {
        let idx = self.index_of(id)?;
        let parent = self.parent(idx)?;
        self.child_order.get(&parent)?.iter().position(|&c| c == idx)
    }

    /// Move a node to `index` among its siblings, clamped to the valid range.
    /// Returns true if the z-order changed.
    pub fn set_z_index(&mut self, id: NodeId, index: usize) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let Some(parent) = self.parent(idx) else {
            return false;
        };
        let Some(order) = self.child_order.get_mut(&parent) else {
            return false;
        };
        let Some(from) = order.iter().position(|&c| c == idx) else {
            return false;
        };
        let to = index.min(order.len() - 1);
        if from == to {
            return false;
        }
        let child = order.remove(from);
        order.insert(to, child);
        true
    }

    /// Move a node to the front of z-order (last child).
    pub fn move_to_top(&mut self, id: NodeId) -> bool {
        self.set_z_index(id, usize::MAX)
    }

    /// Move a node to the back of z-order (first child).
    pub fn move_to_bottom(&mut self, id: NodeId) -> bool {
        self.set_z_index(id, 0)
    }

    /// Deep-clone a subtree under fresh ids and append it on top of the
    /// same parent. Returns the id of the new subtree root.
    pub fn clone_subtree(&mut self, id: NodeId, prefix: &str) -> Option<NodeId> {
        let idx = self.index_of(id)?;
        let parent = self.parent(idx)?;
        Some(self.clone_into(idx, parent, prefix))
    }

    fn clone_into(&mut self, idx: NodeIndex, parent: NodeIndex, prefix: &str) -> NodeId {
        let mut copy = self.graph[idx].clone();
        copy.id = NodeId::with_prefix(prefix);
        let new_id = copy.id;
        let new_idx = self.add_child(parent, copy);
        for child in self.children(idx) {
            self.clone_into(child, new_idx, prefix);
        }
        new_id
    }

    /// Iterate over every node id currently in the scene.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.id_index.keys().copied()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
