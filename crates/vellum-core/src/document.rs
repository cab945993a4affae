//! The document aggregate: a flat node map plus a scene map.
//!
//! Nodes reference their children by id. Both maps are `Arc`-shared and
//! every value inside them is `Arc`-shared too, so cloning a document is
//! O(1) and a mutation copies only the map spine and the touched entries.
//! This is what lets the editor keep hundreds of undo snapshots around.

use crate::error::DocumentError;
use crate::id::NodeId;
use crate::model::{Axis, Color, Node, NodePrototype};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A ruler guide on a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub axis: Axis,
    pub offset: f32,
}

/// A named, ordered root-level collection of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    /// Top-level node ids in paint order.
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub guides: Vec<Guide>,
    /// Stacking order among sibling scenes.
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
}

impl Scene {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            children: Vec::new(),
            guides: Vec::new(),
            order: 0,
            background_color: None,
        }
    }
}

/// The authoritative document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Arc<HashMap<NodeId, Arc<Node>>>,
    pub scenes: Arc<HashMap<NodeId, Arc<Scene>>>,
    pub entry_scene_id: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a single `main` scene.
    pub fn new() -> Self {
        let main = NodeId::intern("main");
        let mut scenes = HashMap::new();
        scenes.insert(main, Arc::new(Scene::new(main, "main")));
        Self {
            nodes: Arc::new(HashMap::new()),
            scenes: Arc::new(scenes),
            entry_scene_id: main,
        }
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(Arc::as_ref)
    }

    pub fn scene(&self, id: NodeId) -> Option<&Scene> {
        self.scenes.get(&id).map(Arc::as_ref)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_scene(&self, id: NodeId) -> bool {
        self.scenes.contains_key(&id)
    }

    /// Children of a scene or a node. Unknown ids and leaf nodes yield `&[]`.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        if let Some(scene) = self.scene(id) {
            return &scene.children;
        }
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Scenes sorted by `order`, ties broken by id.
    pub fn scenes_in_order(&self) -> Vec<&Scene> {
        let mut scenes: Vec<&Scene> = self.scenes.values().map(Arc::as_ref).collect();
        scenes.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        scenes
    }

    /// The node itself followed by its whole subtree, pre-order.
    /// Dangling child references are skipped.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains_node(id) {
            return out;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(node) = self.node(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    /// Capture the subtree at `id` as a prototype. Ids are blanked and
    /// child order is kept; dangling references are skipped.
    pub fn prototype_of(&self, id: NodeId) -> Option<NodePrototype> {
        self.prototype_within(id, &mut HashSet::new())
    }

    fn prototype_within(&self, id: NodeId, seen: &mut HashSet<NodeId>) -> Option<NodePrototype> {
        if !seen.insert(id) {
            return None;
        }
        let original = self.node(id)?;
        let children = original
            .children()
            .iter()
            .filter_map(|&child| self.prototype_within(child, seen))
            .collect();
        let mut node = original.clone();
        node.id = NodeId::intern("");
        if let Some(list) = node.children_mut() {
            list.clear();
        }
        Some(NodePrototype { node, children })
    }

    /// A fresh node id with the given prefix that is unused in this document.
    pub fn fresh_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::with_prefix(prefix);
            if !self.contains_node(id) && !self.contains_scene(id) {
                return id;
            }
        }
    }

    // ─── Mutation (copy-on-write) ────────────────────────────────────────

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        Arc::make_mut(&mut self.nodes).get_mut(&id).map(Arc::make_mut)
    }

    pub fn scene_mut(&mut self, id: NodeId) -> Option<&mut Scene> {
        Arc::make_mut(&mut self.scenes).get_mut(&id).map(Arc::make_mut)
    }

    /// Mutable child list of a scene or container node.
    pub fn children_of_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        if self.contains_scene(id) {
            return self.scene_mut(id).map(|scene| &mut scene.children);
        }
        self.node_mut(id).and_then(Node::children_mut)
    }

    pub fn insert_node(&mut self, node: Node) {
        Arc::make_mut(&mut self.nodes).insert(node.id, Arc::new(node));
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<Arc<Node>> {
        if !self.contains_node(id) {
            return None;
        }
        Arc::make_mut(&mut self.nodes).remove(&id)
    }

    pub fn insert_scene(&mut self, scene: Scene) {
        Arc::make_mut(&mut self.scenes).insert(scene.id, Arc::new(scene));
    }

    pub fn remove_scene(&mut self, id: NodeId) -> Option<Arc<Scene>> {
        if !self.contains_scene(id) {
            return None;
        }
        Arc::make_mut(&mut self.scenes).remove(&id)
    }

    // ─── Validation ──────────────────────────────────────────────────────

    /// Check the structural invariants a loaded snapshot must satisfy: map
    /// keys match the ids they hold, the entry scene exists, every child
    /// reference resolves, no node has two parents and there is no
    /// containment cycle.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.scenes.is_empty() {
            return Err(DocumentError::Invalid("document has no scenes".into()));
        }
        if !self.contains_scene(self.entry_scene_id) {
            return Err(DocumentError::Invalid(format!(
                "entry scene {} does not exist",
                self.entry_scene_id
            )));
        }
        let keys = self
            .scenes
            .iter()
            .map(|(&key, s)| (key, s.id))
            .chain(self.nodes.iter().map(|(&key, n)| (key, n.id)));
        for (key, id) in keys {
            if key != id {
                return Err(DocumentError::Invalid(format!("entry {key} holds id {id}")));
            }
        }

        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let owners = self
            .scenes
            .values()
            .map(|s| (s.id, s.children.as_slice()))
            .chain(self.nodes.values().map(|n| (n.id, n.children())));
        for (owner, children) in owners {
            if self.contains_node(owner) && self.contains_scene(owner) {
                return Err(DocumentError::Invalid(format!(
                    "{owner} is both a scene and a node"
                )));
            }
            for &child in children {
                if !self.contains_node(child) {
                    return Err(DocumentError::Invalid(format!(
                        "{owner} references missing child {child}"
                    )));
                }
                if let Some(previous) = parent.insert(child, owner) {
                    return Err(DocumentError::Invalid(format!(
                        "{child} has two parents: {previous} and {owner}"
                    )));
                }
            }
        }

        // With single parents guaranteed, a cycle shows up as a parented node
        // that no scene can reach.
        let reachable: HashSet<NodeId> = self
            .scenes
            .values()
            .flat_map(|s| s.children.iter())
            .flat_map(|&top| self.descendants(top))
            .collect();
        if let Some(stuck) = parent.keys().find(|id| !reachable.contains(id)) {
            return Err(DocumentError::Invalid(format!(
                "{stuck} is part of a containment cycle"
            )));
        }

        let detached = self.nodes.len() - reachable.len();
        if detached > 0 {
            log::debug!("document has {detached} detached node(s)");
        }
        Ok(())
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let doc: Document = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, DocumentError> {
        let doc: Document = rmp_serde::from_slice(bytes)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Compact binary snapshot. Struct fields are encoded by name so the
    /// flattened node kinds survive the trip.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;
    use pretty_assertions::assert_eq;

    fn doc_with(children: &[(&str, &[&str])]) -> Document {
        let mut doc = Document::new();
        for (id, kids) in children {
            let mut node = Node::new(NodeId::intern(id), NodeKind::container());
            if let Some(list) = node.children_mut() {
                list.extend(kids.iter().map(|k| NodeId::intern(k)));
            }
            doc.insert_node(node);
        }
        doc
    }

    #[test]
    fn new_document_has_main_scene() {
        let doc = Document::new();
        assert_eq!(doc.entry_scene_id, NodeId::intern("main"));
        assert!(doc.scene(NodeId::intern("main")).is_some());
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn clone_shares_until_mutation() {
        let mut doc = doc_with(&[("a", &[])]);
        let before = doc.clone();
        assert!(Arc::ptr_eq(&doc.nodes, &before.nodes));

        doc.node_mut(NodeId::intern("a")).unwrap().name = "renamed".into();
        assert!(!Arc::ptr_eq(&doc.nodes, &before.nodes));
        assert_eq!(before.node(NodeId::intern("a")).unwrap().name, "");
        // Untouched scenes are still shared.
        assert!(Arc::ptr_eq(&doc.scenes, &before.scenes));
    }

    #[test]
    fn descendants_are_pre_order() {
        let doc = doc_with(&[("root", &["x", "y"]), ("x", &["x1"]), ("x1", &[]), ("y", &[])]);
        let descendants = doc.descendants(NodeId::intern("root"));
        let ids: Vec<&str> = descendants
            .iter()
            .map(NodeId::as_str)
            .collect();
        assert_eq!(ids, vec!["root", "x", "x1", "y"]);
        assert!(doc.descendants(NodeId::intern("ghost")).is_empty());
    }

    #[test]
    fn validate_rejects_missing_child() {
        let mut doc = doc_with(&[("a", &["ghost"])]);
        doc.scene_mut(NodeId::intern("main"))
            .unwrap()
            .children
            .push(NodeId::intern("a"));
        assert!(matches!(doc.validate(), Err(DocumentError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_two_parents() {
        let mut doc = doc_with(&[("p", &["c"]), ("q", &["c"]), ("c", &[])]);
        let main = doc.scene_mut(NodeId::intern("main")).unwrap();
        main.children.extend([NodeId::intern("p"), NodeId::intern("q")]);
        let err = doc.validate().unwrap_err().to_string();
        assert!(err.contains("two parents"), "{err}");
    }

    #[test]
    fn validate_rejects_key_id_mismatch() {
        let json = r#"{
            "entry_scene_id": "main",
            "scenes": { "main": { "id": "main", "children": ["a"] } },
            "nodes": { "a": { "id": "zzz", "type": "ellipse" } }
        }"#;
        let err = Document::from_json(json).unwrap_err().to_string();
        assert!(err.contains("holds id zzz"), "{err}");

        let json = r#"{
            "entry_scene_id": "main",
            "scenes": { "main": { "id": "other" } },
            "nodes": {}
        }"#;
        assert!(matches!(Document::from_json(json), Err(DocumentError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_cycle() {
        let doc = doc_with(&[("u", &["v"]), ("v", &["u"])]);
        let err = doc.validate().unwrap_err().to_string();
        assert!(err.contains("cycle"), "{err}");
    }

    #[test]
    fn prototype_of_captures_subtree_without_ids() {
        let mut doc = doc_with(&[("root", &["x", "y"]), ("x", &["x1"]), ("x1", &[])]);
        let mut y = Node::new(NodeId::intern("y"), NodeKind::Ellipse);
        y.left = 7.0;
        doc.insert_node(y);

        let proto = doc.prototype_of(NodeId::intern("root")).unwrap();
        assert_eq!(proto.len(), 4);
        assert_eq!(proto.node.id, NodeId::intern(""));
        assert!(proto.node.children().is_empty());
        assert_eq!(proto.children[0].children.len(), 1);
        assert_eq!(proto.children[1].node.kind, NodeKind::Ellipse);
        assert_eq!(proto.children[1].node.left, 7.0);
        assert!(doc.prototype_of(NodeId::intern("ghost")).is_none());
    }

    #[test]
    fn scenes_sort_by_order_then_id() {
        let mut doc = Document::new();
        let mut b = Scene::new(NodeId::intern("b-scene"), "B");
        b.order = -1;
        doc.insert_scene(b);
        doc.insert_scene(Scene::new(NodeId::intern("a-scene"), "A"));
        let order: Vec<&str> = doc.scenes_in_order().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["b-scene", "a-scene", "main"]);
    }

    #[test]
    fn fresh_id_is_unused() {
        let doc = Document::new();
        let id = doc.fresh_id("rectangle");
        assert!(!doc.contains_node(id));
        assert!(id.as_str().starts_with("rectangle-"));
    }

    #[test]
    fn msgpack_roundtrip() {
        let mut doc = doc_with(&[("frame", &["dot"])]);
        let mut dot = Node::new(NodeId::intern("dot"), NodeKind::Ellipse);
        dot.left = 12.0;
        doc.insert_node(dot);
        doc.scene_mut(NodeId::intern("main"))
            .unwrap()
            .children
            .push(NodeId::intern("frame"));

        let bytes = doc.to_msgpack().unwrap();
        let back = Document::from_msgpack(&bytes).unwrap();
        assert_eq!(back, doc);
    }
}
