//! Undo/redo history over editor snapshots.
//!
//! Every recorded action pushes the previous snapshot onto `past`. Because
//! snapshots share structure, restoring one is a pointer swap rather than a
//! replay of inverse mutations.
//!
//! Drag gestures use **batching**: `begin_batch` remembers the state at the
//! start of the gesture and `end_batch` records a single step from there to
//! the final state, however many actions were dispatched in between.

use crate::action::Action;
use crate::config::EditorConfig;
use crate::error::ReducerError;
use crate::reducer::reduce;
use crate::state::{EditorState, EditorSummary};
use std::collections::VecDeque;

/// A snapshot plus the label of the action that left it.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub label: String,
    pub state: EditorState,
}

/// `past` / `present` / `future` with bounded depth.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistoryEntry>,
    present: EditorState,
    future: Vec<HistoryEntry>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Snapshot and label captured when the outermost batch opened.
    batch_start: Option<HistoryEntry>,
}

impl History {
    pub fn new(present: EditorState, max_depth: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(max_depth.min(128)),
            present,
            future: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_start: None,
        }
    }

    pub fn present(&self) -> &EditorState {
        &self.present
    }

    /// Run `action` through the reducer and record the result.
    ///
    /// On error nothing changes. Undo/redo never fail: with an empty source
    /// stack they do nothing.
    pub fn dispatch(&mut self, action: &Action, config: &EditorConfig) -> Result<(), ReducerError> {
        match action {
            Action::Undo => {
                self.undo();
                return Ok(());
            }
            Action::Redo => {
                self.redo();
                return Ok(());
            }
            _ => {}
        }

        let next = reduce(&self.present, action, config)?;

        if self.batch_depth > 0 {
            // Applied live; end_batch records the cumulative effect.
            self.present = next;
            return Ok(());
        }

        if self.present.differs_for_history(&next) {
            let previous = std::mem::replace(&mut self.present, next);
            self.record(action.label().to_string(), previous);
        } else {
            // Hover-only (or no-op) changes: keep future intact.
            self.present = next;
        }
        Ok(())
    }

    fn record(&mut self, label: String, previous: EditorState) {
        self.past.push_back(HistoryEntry {
            label,
            state: previous,
        });
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        // Clear redo stack on new action
        self.future.clear();
    }

    /// Start a batch group. All actions until the matching `end_batch()`
    /// collapse into one undo step labelled `label`.
    pub fn begin_batch(&mut self, label: &str) {
        if self.batch_depth == 0 {
            self.batch_start = Some(HistoryEntry {
                label: label.to_string(),
                state: self.present.clone(),
            });
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and the state
    /// actually changed, push one entry. Returns whether an entry was pushed.
    pub fn end_batch(&mut self) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        let Some(start) = self.batch_start.take() else {
            return false;
        };
        if start.state.differs_for_history(&self.present) {
            self.record(start.label, start.state);
            true
        } else {
            false
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Step back one entry. Returns the undone action's label.
    pub fn undo(&mut self) -> Option<String> {
        if self.is_batching() {
            log::warn!("undo ignored while a batch is open");
            return None;
        }
        let HistoryEntry { label, mut state } = self.past.pop_back()?;
        state.clipboard.clone_from(&self.present.clipboard);
        let current = std::mem::replace(&mut self.present, state);
        self.future.push(HistoryEntry {
            label: label.clone(),
            state: current,
        });
        log::debug!("undo {label}");
        Some(label)
    }

    /// Re-apply the last undone entry. Returns its label.
    pub fn redo(&mut self) -> Option<String> {
        if self.is_batching() {
            log::warn!("redo ignored while a batch is open");
            return None;
        }
        let HistoryEntry { label, mut state } = self.future.pop()?;
        state.clipboard.clone_from(&self.present.clipboard);
        let current = std::mem::replace(&mut self.present, state);
        self.past.push_back(HistoryEntry {
            label: label.clone(),
            state: current,
        });
        log::debug!("redo {label}");
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_depth(&self) -> usize {
        self.past.len()
    }

    pub fn future_depth(&self) -> usize {
        self.future.len()
    }

    /// Labels of the undo stack, oldest first.
    pub fn past_labels(&self) -> impl Iterator<Item = &str> {
        self.past.iter().map(|e| e.label.as_str())
    }

    pub fn summary(&self) -> EditorSummary {
        EditorSummary {
            past_depth: self.past_depth(),
            future_depth: self.future_depth(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            ..self.present.summary()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{HoverEvent, Target};
    use vellum_core::{Document, NodeId, NodePrototype};

    fn history(max_depth: usize) -> History {
        History::new(EditorState::new(Document::new()), max_depth)
    }

    fn insert() -> Action {
        Action::InsertNode {
            id: None,
            parent: None,
            index: None,
            prototype: NodePrototype::rectangle(10.0, 10.0),
        }
    }

    #[test]
    fn undo_on_empty_stack_is_noop() {
        let mut h = history(10);
        let before = h.present().clone();
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        h.dispatch(&Action::Undo, &EditorConfig::default()).unwrap();
        assert_eq!(h.present(), &before);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut h = history(3);
        let config = EditorConfig::default();
        for _ in 0..5 {
            h.dispatch(&insert(), &config).unwrap();
        }
        assert_eq!(h.past_depth(), 3);
        while h.undo().is_some() {}
        // Two inserts fell off the bottom of the stack.
        assert_eq!(h.present().document.nodes.len(), 2);
    }

    #[test]
    fn redo_clears_on_new_action() {
        let mut h = history(10);
        let config = EditorConfig::default();
        h.dispatch(&insert(), &config).unwrap();
        h.undo();
        assert!(h.can_redo());
        h.dispatch(&insert(), &config).unwrap();
        assert!(!h.can_redo());
    }

    #[test]
    fn hover_does_not_record_or_clear_future() {
        let mut h = history(10);
        let config = EditorConfig::default();
        h.dispatch(&insert(), &config).unwrap();
        let node = h.present().selection[0];
        h.dispatch(&Action::Blur, &config).unwrap();
        h.undo();
        assert!(h.can_redo());

        h.dispatch(
            &Action::Hover {
                event: HoverEvent::Enter,
                target: node,
            },
            &config,
        )
        .unwrap();
        assert_eq!(h.present().hovered, Some(node));
        assert_eq!(h.past_depth(), 1);
        assert!(h.can_redo());
    }

    #[test]
    fn batch_collapses_into_one_step() {
        let mut h = history(10);
        let config = EditorConfig::default();
        h.dispatch(&insert(), &config).unwrap();
        let node = h.present().selection[0];

        h.begin_batch("drag");
        h.begin_batch("nested");
        for _ in 0..10 {
            h.dispatch(
                &Action::Translate {
                    target: Target::Node(node),
                    dx: 1.0,
                    dy: 0.0,
                },
                &config,
            )
            .unwrap();
        }
        assert!(!h.end_batch());
        assert!(h.end_batch());
        assert_eq!(h.past_depth(), 2);
        assert_eq!(h.present().node(node).unwrap().left, 10.0);

        assert_eq!(h.undo().as_deref(), Some("drag"));
        assert_eq!(h.present().node(node).unwrap().left, 0.0);
    }

    #[test]
    fn empty_batch_records_nothing() {
        let mut h = history(10);
        h.begin_batch("noop");
        assert!(!h.end_batch());
        assert_eq!(h.past_depth(), 0);
        assert!(!h.end_batch());
    }

    #[test]
    fn failed_action_leaves_history_untouched() {
        let mut h = history(10);
        let before = h.present().clone();
        let err = h.dispatch(
            &Action::DeleteNode {
                target: Target::Node(NodeId::intern("nope")),
            },
            &EditorConfig::default(),
        );
        assert!(err.is_err());
        assert_eq!(h.present(), &before);
        assert_eq!(h.past_depth(), 0);
    }
}
