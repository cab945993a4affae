//! The reducer: `(state, action) -> state`.
//!
//! `reduce` never touches its input. It clones the state (cheap, the
//! document is shared) and mutates the copy through copy-on-write, so only
//! the nodes an action touches are duplicated. A rejected action returns an
//! error and no state at all, which leaves the caller's state as it was.

use crate::action::{Action, HoverEvent, LayoutPatch, Order, Target, TextPatch};
use crate::config::EditorConfig;
use crate::error::ReducerError;
use crate::state::{Clipboard, EditorState};
use std::collections::HashMap;
use std::sync::Arc;
use vellum_core::{
    Document, DocumentContext, Node, NodeId, NodeKind, NodePrototype, Scene, query_selector,
};

/// Apply one action. History actions are handled by [`crate::History`];
/// here they return the state unchanged.
pub fn reduce(
    state: &EditorState,
    action: &Action,
    config: &EditorConfig,
) -> Result<EditorState, ReducerError> {
    let mut next = state.clone();
    match action {
        // ─── Selection ───────────────────────────────────────────────────
        Action::Select { selectors } => {
            let ctx = &state.document_ctx;
            let mut ids = Vec::new();
            for selector in selectors {
                ids.extend(query_selector(ctx, &state.selection, selector));
            }
            let ids = unique_in_scene(ctx, ids, state.scene_id);
            if ids.is_empty() {
                log::debug!("select resolved to nothing; keeping selection");
            } else {
                next.selection = ids;
            }
        }
        Action::Blur => next.selection.clear(),
        Action::Hover { event, target } => match event {
            HoverEvent::Enter if state.document_ctx.contains(*target) => {
                next.hovered = Some(*target);
            }
            HoverEvent::Enter => return Err(ReducerError::NotFound(*target)),
            HoverEvent::Leave => {
                if next.hovered == Some(*target) {
                    next.hovered = None;
                }
            }
        },

        // ─── Structure ───────────────────────────────────────────────────
        Action::InsertNode {
            id,
            parent,
            index,
            prototype,
        } => {
            let parent = parent.unwrap_or(state.scene_id);
            require_container(&state.document, parent)?;
            let top = match id {
                Some(id) if !is_taken(&state.document, *id) => *id,
                Some(id) => {
                    log::warn!("{id} is already in use; allocating a fresh id");
                    next.document.fresh_id(prototype.node.kind.type_name())
                }
                None => next.document.fresh_id(prototype.node.kind.type_name()),
            };
            instantiate(&mut next.document, prototype, top);
            insert_child(&mut next.document, parent, top, *index);
            next.rebuild_context();
            if config.select_on_insert {
                next.selection = vec![top];
            }
            log::debug!("inserted {top} into {parent}");
        }
        Action::DeleteNode { target } => {
            let targets = resolve_targets(state, *target)?;
            let targets = state.document_ctx.prune_nested(&targets);
            for id in &targets {
                delete_subtree(&mut next.document, &state.document_ctx, *id);
            }
            if !targets.is_empty() {
                next.rebuild_context();
            }
        }
        Action::Duplicate { target } => {
            let targets = resolve_targets(state, *target)?;
            let targets = state.document_ctx.prune_nested(&targets);
            let mut copies = Vec::with_capacity(targets.len());
            for id in targets {
                let Some(parent) = state.document_ctx.parent_of(id) else {
                    continue;
                };
                let copy = clone_subtree(&mut next.document, id);
                let at = next
                    .document
                    .children_of(parent)
                    .iter()
                    .position(|&c| c == id)
                    .map(|i| i + 1);
                insert_child(&mut next.document, parent, copy, at);
                copies.push(copy);
            }
            if !copies.is_empty() {
                next.rebuild_context();
                next.selection = copies;
            }
        }
        Action::Mv {
            source,
            target,
            index,
        } => {
            if source.is_empty() {
                return Err(ReducerError::EmptyTarget);
            }
            require_container(&state.document, *target)?;
            let ctx = &state.document_ctx;
            for &node in source {
                if !ctx.contains(node) || ctx.is_scene(node) {
                    return Err(ReducerError::NotFound(node));
                }
                if node == *target || ctx.is_ancestor(node, *target) {
                    return Err(ReducerError::CyclicReparent {
                        node,
                        target: *target,
                    });
                }
            }
            let moving = dedup(source);
            for &node in &moving {
                detach(&mut next.document, ctx, node);
            }
            let mut at = *index;
            for node in moving {
                insert_child(&mut next.document, *target, node, at);
                at = at.map(|i| i + 1);
            }
            next.rebuild_context();
        }
        Action::Order { target, order } => {
            let targets = resolve_targets(state, *target)?;
            for id in targets {
                reorder(&mut next.document, &state.document_ctx, id, *order);
            }
            next.rebuild_context();
        }
        Action::Contain { target } => {
            let targets = resolve_targets(state, *target)?;
            let targets = state.document_ctx.prune_nested(&targets);
            let containers = contain(&mut next.document, &state.document_ctx, &targets);
            if !containers.is_empty() {
                next.rebuild_context();
                next.selection = containers;
            }
        }

        // ─── Clipboard ───────────────────────────────────────────────────
        Action::Copy { target } | Action::Cut { target } => {
            let targets = resolve_targets(state, *target)?;
            let targets = state.document_ctx.prune_nested(&targets);
            if targets.is_empty() {
                log::debug!("{} has nothing to capture", action.label());
                return Ok(next);
            }
            let prototypes = targets
                .iter()
                .filter_map(|&id| state.document.prototype_of(id))
                .collect();
            next.clipboard = Some(Arc::new(Clipboard {
                ids: targets.clone(),
                prototypes,
            }));
            if matches!(action, Action::Cut { .. }) {
                for id in &targets {
                    delete_subtree(&mut next.document, &state.document_ctx, *id);
                }
                next.rebuild_context();
            }
        }
        Action::Paste => {
            let Some(clipboard) = &state.clipboard else {
                log::debug!("paste with an empty clipboard");
                return Ok(next);
            };
            let mut parents: Vec<NodeId> = state
                .selection
                .iter()
                .copied()
                .filter(|id| !clipboard.ids.contains(id))
                .filter(|&id| state.node(id).is_some_and(Node::is_container))
                .collect();
            if parents.is_empty() {
                parents.push(state.scene_id);
            }
            let mut pasted = Vec::new();
            for parent in parents {
                for prototype in &clipboard.prototypes {
                    let top = next.document.fresh_id(prototype.node.kind.type_name());
                    instantiate(&mut next.document, prototype, top);
                    insert_child(&mut next.document, parent, top, None);
                    pasted.push(top);
                }
            }
            if !pasted.is_empty() {
                next.rebuild_context();
                next.selection = pasted;
            }
        }

        // ─── Properties ──────────────────────────────────────────────────
        Action::Translate { target, dx, dy } => {
            let targets = resolve_targets(state, *target)?;
            let targets = state.document_ctx.prune_nested(&targets);
            update_nodes(&mut next.document, &targets, |node| {
                node.left += dx;
                node.top += dy;
            });
        }
        Action::ChangePosition { target, left, top } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                node.left = *left;
                node.top = *top;
            });
        }
        Action::ChangePositioning { target, position } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                node.position = *position;
            });
        }
        Action::ChangeSize {
            target,
            width,
            height,
        } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                if let Some(width) = width {
                    node.width = *width;
                }
                if let Some(height) = height {
                    node.height = *height;
                }
            });
        }
        Action::ChangeRotation { target, rotation } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                node.rotation = *rotation;
            });
        }
        Action::ChangeOpacity { target, opacity } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                node.opacity = Some(opacity.clamp(0.0, 1.0));
            });
        }
        Action::ChangeFills { target, paints } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                node.set_fill_paints(paints.iter().cloned());
            });
        }
        Action::ChangeStrokes { target, paints } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                node.set_stroke_paints(paints.iter().cloned());
            });
        }
        Action::ChangeStrokeWidth { target, width } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| {
                node.stroke_width = width.max(0.0);
            });
        }
        Action::ChangeCornerRadius { target, radius } => {
            let targets = resolve_targets(state, *target)?;
            let targets = applicable(&state.document, targets, |n| n.corner_radius().is_some());
            update_nodes(&mut next.document, &targets, |node| {
                if let Some(r) = node.corner_radius_mut() {
                    *r = radius.max(0.0);
                }
            });
        }
        Action::ChangeText { target, patch } => {
            let targets = resolve_targets(state, *target)?;
            let targets = applicable(&state.document, targets, |n| {
                matches!(n.kind, NodeKind::Text { .. })
            });
            update_nodes(&mut next.document, &targets, |node| apply_text(node, patch));
        }
        Action::ChangeLayout { target, patch } => {
            let targets = resolve_targets(state, *target)?;
            let targets = applicable(&state.document, targets, |n| {
                matches!(n.kind, NodeKind::Container { .. })
            });
            update_nodes(&mut next.document, &targets, |node| apply_layout(node, patch));
        }
        Action::SetActive { target, active } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| node.active = *active);
        }
        Action::SetLocked { target, locked } => {
            let targets = resolve_targets(state, *target)?;
            update_nodes(&mut next.document, &targets, |node| node.locked = *locked);
        }
        Action::Rename { target, name } => {
            let node = next
                .document
                .node_mut(*target)
                .ok_or(ReducerError::NotFound(*target))?;
            node.name.clone_from(name);
        }

        // ─── Scenes ──────────────────────────────────────────────────────
        Action::LoadScene { scene } => {
            if !state.document.contains_scene(*scene) {
                return Err(ReducerError::SceneNotFound(*scene));
            }
            switch_scene(&mut next, *scene);
        }
        Action::NewScene { name } => {
            let id = next.document.fresh_id("scene");
            let mut scene = Scene::new(id, name.clone());
            scene.order = state
                .document
                .scenes
                .values()
                .map(|s| s.order)
                .max()
                .map_or(0, |o| o + 1);
            next.document.insert_scene(scene);
            next.rebuild_context();
            switch_scene(&mut next, id);
        }
        Action::DeleteScene { scene } => {
            let Some(removed) = state.document.scene(*scene) else {
                return Err(ReducerError::SceneNotFound(*scene));
            };
            if state.document.scenes.len() <= 1 {
                return Err(ReducerError::LastScene);
            }
            for &top in &removed.children {
                for id in state.document.descendants(top) {
                    next.document.remove_node(id);
                }
            }
            next.document.remove_scene(*scene);
            let fallback = next.document.scenes_in_order().first().map(|s| s.id);
            if let Some(fallback) = fallback {
                if next.document.entry_scene_id == *scene {
                    next.document.entry_scene_id = fallback;
                }
                next.rebuild_context();
                if next.scene_id == *scene {
                    switch_scene(&mut next, fallback);
                }
            }
        }
        Action::RenameScene { scene, name } => {
            let s = next
                .document
                .scene_mut(*scene)
                .ok_or(ReducerError::SceneNotFound(*scene))?;
            s.name.clone_from(name);
        }

        // ─── History ─────────────────────────────────────────────────────
        Action::Undo | Action::Redo => {
            log::trace!("{} reached the reducer; ignoring", action.label());
        }
    }
    Ok(next)
}

// ─── Target resolution ───────────────────────────────────────────────────

/// Node ids an action applies to. An explicit id must exist; the selection
/// may be empty, which makes the action a no-op.
fn resolve_targets(state: &EditorState, target: Target) -> Result<Vec<NodeId>, ReducerError> {
    match target {
        Target::Selection => Ok(state.selection.clone()),
        Target::Node(id) => {
            let ctx = &state.document_ctx;
            if ctx.contains(id) && !ctx.is_scene(id) {
                Ok(vec![id])
            } else {
                Err(ReducerError::NotFound(id))
            }
        }
    }
}

/// Keep the ids whose node satisfies `pred`; the rest are skipped silently.
fn applicable(doc: &Document, ids: Vec<NodeId>, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
    ids.into_iter()
        .filter(|&id| match doc.node(id) {
            Some(node) if pred(node) => true,
            Some(_) => {
                log::trace!("skipping {id}: property does not apply");
                false
            }
            None => false,
        })
        .collect()
}

fn unique_in_scene(ctx: &DocumentContext, ids: Vec<NodeId>, scene: NodeId) -> Vec<NodeId> {
    dedup(&ids)
        .into_iter()
        .filter(|&id| ctx.scene_of(id) == Some(scene) && !ctx.is_scene(id))
        .collect()
}

fn dedup(ids: &[NodeId]) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::with_capacity(ids.len());
    for &id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn is_taken(doc: &Document, id: NodeId) -> bool {
    doc.contains_node(id) || doc.contains_scene(id)
}

fn require_container(doc: &Document, id: NodeId) -> Result<(), ReducerError> {
    if doc.contains_scene(id) {
        return Ok(());
    }
    match doc.node(id) {
        Some(node) if node.is_container() => Ok(()),
        Some(_) => Err(ReducerError::NotAContainer(id)),
        None => Err(ReducerError::NotFound(id)),
    }
}

// ─── Structural helpers ──────────────────────────────────────────────────

fn update_nodes(doc: &mut Document, ids: &[NodeId], mut f: impl FnMut(&mut Node)) {
    for &id in ids {
        if let Some(node) = doc.node_mut(id) {
            f(node);
        }
    }
}

/// Insert `child` into `parent`'s child list at `index` (clamped), or at the
/// end when no index is given.
fn insert_child(doc: &mut Document, parent: NodeId, child: NodeId, index: Option<usize>) {
    let Some(children) = doc.children_of_mut(parent) else {
        log::warn!("{parent} cannot hold {child}");
        return;
    };
    let at = index.map_or(children.len(), |i| i.min(children.len()));
    children.insert(at, child);
}

/// Remove `id` from its parent's child list. The node stays in the map.
fn detach(doc: &mut Document, ctx: &DocumentContext, id: NodeId) {
    if let Some(children) = ctx
        .parent_of(id)
        .and_then(|parent| doc.children_of_mut(parent))
    {
        children.retain(|&c| c != id);
    }
}

fn delete_subtree(doc: &mut Document, ctx: &DocumentContext, id: NodeId) {
    detach(doc, ctx, id);
    let doomed = doc.descendants(id);
    for gone in &doomed {
        doc.remove_node(*gone);
    }
    log::debug!("deleted {id} ({} node(s))", doomed.len());
}

/// Materialize a prototype tree with `id` as the root's id. Nested children
/// get fresh ids.
fn instantiate(doc: &mut Document, prototype: &NodePrototype, id: NodeId) {
    let mut node = prototype.node.clone();
    node.id = id;
    let child_ids: Vec<NodeId> = prototype
        .children
        .iter()
        .map(|child| {
            let child_id = doc.fresh_id(child.node.kind.type_name());
            instantiate(doc, child, child_id);
            child_id
        })
        .collect();
    match node.children_mut() {
        Some(children) => *children = child_ids,
        None if !child_ids.is_empty() => {
            log::warn!("{id} cannot contain children; dropping {}", child_ids.len());
            for orphan in child_ids {
                for gone in doc.descendants(orphan) {
                    doc.remove_node(gone);
                }
            }
        }
        None => {}
    }
    doc.insert_node(node);
}

/// Deep-copy the subtree at `id` under fresh ids; returns the copy's root.
/// The copy is not attached to any parent.
fn clone_subtree(doc: &mut Document, id: NodeId) -> NodeId {
    let originals = doc.descendants(id);
    let mapping: HashMap<NodeId, NodeId> = originals
        .iter()
        .map(|&old| {
            let prefix = doc
                .node(old)
                .map_or("node", |n| n.kind.type_name());
            (old, doc.fresh_id(prefix))
        })
        .collect();
    for old in &originals {
        let (Some(mut copy), Some(&new_id)) = (doc.node(*old).cloned(), mapping.get(old)) else {
            continue;
        };
        copy.id = new_id;
        if let Some(children) = copy.children_mut() {
            for child in children.iter_mut() {
                if let Some(&renamed) = mapping.get(child) {
                    *child = renamed;
                }
            }
        }
        doc.insert_node(copy);
    }
    mapping.get(&id).copied().unwrap_or(id)
}

/// Wrap `targets` in one new container per parent. The container takes the
/// slot of the bottom-most target and spans the union of the targets' boxes;
/// children keep their canvas position and their relative paint order.
/// Returns the new containers.
fn contain(doc: &mut Document, ctx: &DocumentContext, targets: &[NodeId]) -> Vec<NodeId> {
    let mut groups: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    for &id in targets {
        let Some(parent) = ctx.parent_of(id) else {
            continue;
        };
        match groups.iter_mut().find(|(p, _)| *p == parent) {
            Some((_, members)) => members.push(id),
            None => groups.push((parent, vec![id])),
        }
    }

    let mut containers = Vec::with_capacity(groups.len());
    for (parent, members) in groups {
        let siblings = doc.children_of(parent).to_vec();
        let ordered: Vec<NodeId> = siblings
            .iter()
            .copied()
            .filter(|id| members.contains(id))
            .collect();
        let Some(slot) = ordered
            .first()
            .and_then(|first| siblings.iter().position(|c| c == first))
        else {
            continue;
        };
        let Some((left, top, right, bottom)) = union_box(doc, &ordered) else {
            continue;
        };

        let container = doc.fresh_id("container");
        let prototype = NodePrototype::container(right - left, bottom - top).at(left, top);
        instantiate(doc, &prototype, container);
        for &id in &ordered {
            detach(doc, ctx, id);
        }
        insert_child(doc, parent, container, Some(slot));
        if let Some(children) = doc.children_of_mut(container) {
            children.extend(ordered.iter().copied());
        }
        update_nodes(doc, &ordered, |node| {
            node.left -= left;
            node.top -= top;
        });
        log::debug!("contained {} node(s) in {container}", ordered.len());
        containers.push(container);
    }
    containers
}

/// Axis-aligned union of the nodes' own boxes in parent space, as
/// `(left, top, right, bottom)`. Auto lengths count as zero.
fn union_box(doc: &Document, ids: &[NodeId]) -> Option<(f32, f32, f32, f32)> {
    ids.iter()
        .filter_map(|&id| doc.node(id))
        .map(|n| {
            let w = n.width.fixed().unwrap_or(0.0);
            let h = n.height.fixed().unwrap_or(0.0);
            (n.left, n.top, n.left + w, n.top + h)
        })
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
}

fn reorder(doc: &mut Document, ctx: &DocumentContext, id: NodeId, order: Order) {
    let Some(children) = ctx
        .parent_of(id)
        .and_then(|parent| doc.children_of_mut(parent))
    else {
        return;
    };
    let Some(from) = children.iter().position(|&c| c == id) else {
        return;
    };
    let last = children.len() - 1;
    let to = match order {
        Order::Back => 0,
        Order::Backward => from.saturating_sub(1),
        Order::Forward => (from + 1).min(last),
        Order::Front => last,
        Order::Index(i) => i.min(last),
    };
    if from != to {
        let moved = children.remove(from);
        children.insert(to, moved);
    }
}

fn switch_scene(state: &mut EditorState, scene: NodeId) {
    if state.scene_id != scene {
        log::debug!("switching scene {} -> {scene}", state.scene_id);
    }
    state.scene_id = scene;
    state.selection.clear();
    state.hovered = None;
}

// ─── Property patches ────────────────────────────────────────────────────

fn apply_text(node: &mut Node, patch: &TextPatch) {
    let NodeKind::Text {
        text,
        text_align,
        text_align_vertical,
        font_family,
        font_size,
        font_weight,
    } = &mut node.kind
    else {
        return;
    };
    if let Some(v) = &patch.text {
        text.clone_from(v);
    }
    if let Some(v) = patch.text_align {
        *text_align = v;
    }
    if let Some(v) = patch.text_align_vertical {
        *text_align_vertical = v;
    }
    if let Some(v) = &patch.font_family {
        font_family.clone_from(v);
    }
    if let Some(v) = patch.font_size {
        *font_size = v.max(0.0);
    }
    if let Some(v) = patch.font_weight {
        *font_weight = v;
    }
}

fn apply_layout(node: &mut Node, patch: &LayoutPatch) {
    let NodeKind::Container {
        layout,
        direction,
        padding,
        gap,
        clips_content,
        ..
    } = &mut node.kind
    else {
        return;
    };
    if let Some(v) = patch.layout {
        *layout = v;
    }
    if let Some(v) = patch.direction {
        *direction = v;
    }
    if let Some(v) = patch.padding {
        *padding = v;
    }
    if let Some(v) = patch.gap {
        *gap = v.max(0.0);
    }
    if let Some(v) = patch.clips_content {
        *clips_content = v;
    }
}
