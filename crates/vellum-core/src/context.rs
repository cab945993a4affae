//! Derived hierarchy index over a [`Document`].
//!
//! The context is a directed graph with one vertex per scene and per
//! reachable node, edges running parent → child. Scenes are the roots, so a
//! top-level node's parent is its scene id. Vertices are inserted in a
//! pre-order walk of each scene, which makes `NodeIndex` order equal to
//! document order; children are recovered by sorting outgoing neighbors.
//!
//! The context is never patched: the reducer rebuilds it after every
//! structural change.

use crate::document::Document;
use crate::id::NodeId;
use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct Entry {
    index: NodeIndex,
    parent: Option<NodeId>,
    scene: NodeId,
    depth: usize,
}

/// Parent / children / scene-membership index.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    graph: DiGraph<NodeId, ()>,
    entries: HashMap<NodeId, Entry>,
    scenes: Vec<NodeId>,
}

impl DocumentContext {
    /// Build the index by walking every scene in stacking order.
    ///
    /// Dangling child references and second references to an already placed
    /// node are skipped with a warning; the first placement wins.
    pub fn build(doc: &Document) -> Self {
        let mut ctx = Self {
            graph: DiGraph::with_capacity(doc.nodes.len() + doc.scenes.len(), doc.nodes.len()),
            entries: HashMap::with_capacity(doc.nodes.len() + doc.scenes.len()),
            scenes: Vec::with_capacity(doc.scenes.len()),
        };

        for scene in doc.scenes_in_order() {
            let root = ctx.graph.add_node(scene.id);
            ctx.entries.insert(
                scene.id,
                Entry {
                    index: root,
                    parent: None,
                    scene: scene.id,
                    depth: 0,
                },
            );
            ctx.scenes.push(scene.id);

            let mut stack: Vec<(NodeId, NodeId, usize)> = scene
                .children
                .iter()
                .rev()
                .map(|&child| (scene.id, child, 1))
                .collect();

            while let Some((parent, id, depth)) = stack.pop() {
                if ctx.entries.contains_key(&id) {
                    log::warn!("{id} is referenced more than once; keeping first placement");
                    continue;
                }
                let Some(node) = doc.node(id) else {
                    log::warn!("{parent} references missing node {id}");
                    continue;
                };
                let Some(parent_index) = ctx.entries.get(&parent).map(|e| e.index) else {
                    continue;
                };
                let index = ctx.graph.add_node(id);
                ctx.graph.add_edge(parent_index, index, ());
                ctx.entries.insert(
                    id,
                    Entry {
                        index,
                        parent: Some(parent),
                        scene: scene.id,
                        depth,
                    },
                );
                stack.extend(
                    node.children()
                        .iter()
                        .rev()
                        .map(|&child| (id, child, depth + 1)),
                );
            }
        }

        log::trace!(
            "context rebuilt: {} scene(s), {} node(s)",
            ctx.scenes.len(),
            ctx.entries.len() - ctx.scenes.len()
        );
        ctx
    }

    // ─── Membership ──────────────────────────────────────────────────────

    /// True for scenes and placed nodes.
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn is_scene(&self, id: NodeId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.parent.is_none())
    }

    /// Placed node ids in document order (scenes in stacking order, each
    /// scene pre-order). Scene ids are not included.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .map(|ix| self.graph[ix])
            .filter(|id| !self.is_scene(*id))
            .collect()
    }

    /// Scene ids in stacking order.
    pub fn scene_ids(&self) -> &[NodeId] {
        &self.scenes
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Parent of a node; a top-level node's parent is its scene.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id).and_then(|e| e.parent)
    }

    /// Children in paint order. Unknown ids and leaves yield an empty list.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(entry) = self.entries.get(&id) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(entry.index, Direction::Outgoing)
            .collect();
        children.sort();
        children.into_iter().map(|ix| self.graph[ix]).collect()
    }

    /// The scene transitively containing `id`. A scene is its own scene.
    pub fn scene_of(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id).map(|e| e.scene)
    }

    /// Scenes are depth 0, top-level nodes depth 1.
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        self.entries.get(&id).map(|e| e.depth)
    }

    /// Position of `id` in its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children_of(parent).iter().position(|&c| c == id)
    }

    /// The top-level child of `scene_id` that contains `id` (possibly `id`
    /// itself). `None` when `id` does not live in that scene.
    pub fn top_id_within_scene(&self, id: NodeId, scene_id: NodeId) -> Option<NodeId> {
        let entry = self.entries.get(&id)?;
        if entry.scene != scene_id || entry.parent.is_none() {
            return None;
        }
        let mut current = id;
        loop {
            match self.parent_of(current) {
                Some(parent) if parent == scene_id => return Some(current),
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Ancestors from the scene root down to the direct parent.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent_of(parent);
        }
        chain.reverse();
        chain
    }

    /// Other children of the same parent, in paint order.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent_of(id) else {
            return Vec::new();
        };
        self.children_of(parent)
            .into_iter()
            .filter(|&c| c != id)
            .collect()
    }

    /// True when `ancestor` is a strict ancestor of `descendant`.
    pub fn is_ancestor(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        match (self.entries.get(&ancestor), self.entries.get(&descendant)) {
            (Some(a), Some(d)) if a.depth < d.depth => {
                has_path_connecting(&self.graph, a.index, d.index, None)
            }
            _ => false,
        }
    }

    /// Pre-order `(id, depth)` listing of the subtree rooted at `id`.
    pub fn hierarchy(&self, id: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let Some(depth) = self.depth_of(id) else {
            return out;
        };
        let mut stack = vec![(id, depth)];
        while let Some((current, depth)) = stack.pop() {
            out.push((current, depth));
            stack.extend(
                self.children_of(current)
                    .into_iter()
                    .rev()
                    .map(|c| (c, depth + 1)),
            );
        }
        out
    }

    /// Drop ids whose ancestor is also listed, plus duplicates and ids the
    /// context does not know. Order of the survivors is preserved.
    pub fn prune_nested(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let listed: HashSet<NodeId> = ids.iter().copied().collect();
        let mut seen = HashSet::new();
        ids.iter()
            .copied()
            .filter(|&id| self.contains(id) && seen.insert(id))
            .filter(|&id| !self.ancestors(id).iter().any(|a| listed.contains(a)))
            .collect()
    }
}
