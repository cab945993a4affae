//! Editor state: a document plus session-only selection and hover.

use serde::Serialize;
use std::sync::Arc;
use vellum_core::{Document, DocumentContext, Node, NodeId, NodePrototype, Scene};

/// One immutable snapshot of the editing session.
///
/// Cloning is cheap: the document shares its maps and the context sits
/// behind an `Arc`, so history can hold many snapshots.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub document: Document,
    /// Derived from `document`; rebuilt after every structural change.
    pub document_ctx: Arc<DocumentContext>,
    pub scene_id: NodeId,
    /// Ordered, unique, every id present in `document`.
    pub selection: Vec<NodeId>,
    pub hovered: Option<NodeId>,
    /// Session scratch: survives undo/redo and is never an undo step.
    pub clipboard: Option<Arc<Clipboard>>,
}

/// Subtrees captured by copy or cut, ready to be pasted any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    /// The copied roots. Paste never targets one of these.
    pub ids: Vec<NodeId>,
    pub prototypes: Vec<NodePrototype>,
}

impl PartialEq for EditorState {
    /// The context is derived and the clipboard sits outside history, so
    /// neither takes part in equality.
    fn eq(&self, other: &Self) -> bool {
        self.scene_id == other.scene_id
            && self.selection == other.selection
            && self.hovered == other.hovered
            && self.same_document(other)
    }
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        let document_ctx = Arc::new(DocumentContext::build(&document));
        Self {
            scene_id: document.entry_scene_id,
            document,
            document_ctx,
            selection: Vec::new(),
            hovered: None,
            clipboard: None,
        }
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.document.scene(self.scene_id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.document.node(id)
    }

    pub fn selected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.selection.iter().filter_map(|&id| self.document.node(id))
    }

    /// Document equality with a pointer fast path for untouched snapshots.
    pub fn same_document(&self, other: &Self) -> bool {
        let shared = Arc::ptr_eq(&self.document.nodes, &other.document.nodes)
            && Arc::ptr_eq(&self.document.scenes, &other.document.scenes)
            && self.document.entry_scene_id == other.document.entry_scene_id;
        shared || self.document == other.document
    }

    /// Whether moving from `self` to `next` is worth an undo step. Hover
    /// alone never is.
    pub fn differs_for_history(&self, next: &Self) -> bool {
        self.scene_id != next.scene_id
            || self.selection != next.selection
            || !self.same_document(next)
    }

    /// Rebuild the hierarchy index and drop ids that no longer resolve.
    pub(crate) fn rebuild_context(&mut self) {
        self.document_ctx = Arc::new(DocumentContext::build(&self.document));
        self.prune();
    }

    /// Remove stale selection and hover ids.
    pub(crate) fn prune(&mut self) {
        let ctx = &self.document_ctx;
        let before = self.selection.len();
        self.selection
            .retain(|&id| ctx.contains(id) && !ctx.is_scene(id));
        if self.selection.len() != before {
            log::debug!(
                "pruned {} stale id(s) from selection",
                before - self.selection.len()
            );
        }
        if self.hovered.is_some_and(|id| !ctx.contains(id)) {
            self.hovered = None;
        }
    }

    pub fn summary(&self) -> EditorSummary {
        EditorSummary {
            selection: self.selection.clone(),
            hovered: self.hovered,
            scene_id: self.scene_id,
            past_depth: 0,
            future_depth: 0,
            can_undo: false,
            can_redo: false,
        }
    }
}

/// Read-only view for toolbars and breadcrumbs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSummary {
    pub selection: Vec<NodeId>,
    pub hovered: Option<NodeId>,
    pub scene_id: NodeId,
    pub past_depth: usize,
    pub future_depth: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}
