//! Actions accepted by the reducer.
//!
//! Actions are plain data so UI collaborators can build them from JSON. A
//! property action names its target either as the literal `"selection"`
//! (every selected node) or as a single node id.

use serde::{Deserialize, Serialize};
use std::fmt;
use vellum_core::{
    Axis, LayoutMode, Length, NodeId, NodePrototype, Padding, Paint, Positioning, Selectors,
    TextAlign, TextAlignVertical,
};

// ─── Targets ─────────────────────────────────────────────────────────────

/// Required on every targeted action; there is no implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Target {
    Selection,
    Node(NodeId),
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        match s.as_str() {
            "selection" => Target::Selection,
            id => Target::Node(NodeId::intern(id)),
        }
    }
}

impl From<Target> for String {
    fn from(t: Target) -> Self {
        t.to_string()
    }
}

impl From<NodeId> for Target {
    fn from(id: NodeId) -> Self {
        Target::Node(id)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Selection => f.write_str("selection"),
            Target::Node(id) => f.write_str(id.as_str()),
        }
    }
}

/// Z-order move within the parent's child list. Later children paint on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// First child (painted first).
    Back,
    /// One step toward the back.
    Backward,
    /// One step toward the front.
    Forward,
    /// Last child (painted last).
    Front,
    /// Explicit index, clamped to the list.
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverEvent {
    Enter,
    Leave,
}

// ─── Patches ─────────────────────────────────────────────────────────────

/// Text properties to overwrite; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPatch {
    pub text: Option<String>,
    pub text_align: Option<TextAlign>,
    pub text_align_vertical: Option<TextAlignVertical>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<u16>,
}

/// Container layout properties to overwrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPatch {
    pub layout: Option<LayoutMode>,
    pub direction: Option<Axis>,
    pub padding: Option<Padding>,
    pub gap: Option<f32>,
    pub clips_content: Option<bool>,
}

// ─── Actions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    // Selection
    Select {
        selectors: Selectors,
    },
    Blur,
    Hover {
        event: HoverEvent,
        target: NodeId,
    },

    // Structure
    InsertNode {
        /// Requested id for the top-level node; a fresh one is allocated
        /// when absent or already taken.
        #[serde(default)]
        id: Option<NodeId>,
        /// Scene or container to insert into; the current scene when absent.
        #[serde(default)]
        parent: Option<NodeId>,
        /// Child index; appended (topmost) when absent.
        #[serde(default)]
        index: Option<usize>,
        prototype: NodePrototype,
    },
    DeleteNode {
        target: Target,
    },
    Duplicate {
        target: Target,
    },
    Mv {
        source: Vec<NodeId>,
        target: NodeId,
        #[serde(default)]
        index: Option<usize>,
    },
    Order {
        target: Target,
        order: Order,
    },
    /// Wrap the targets in a new container per parent, sized to their
    /// union box.
    Contain {
        target: Target,
    },

    // Clipboard
    Copy {
        target: Target,
    },
    Cut {
        target: Target,
    },
    /// Paste into every selected container that was not itself copied, or
    /// into the current scene when there is none.
    Paste,

    // Properties
    Translate {
        target: Target,
        dx: f32,
        dy: f32,
    },
    ChangePosition {
        target: Target,
        left: f32,
        top: f32,
    },
    ChangePositioning {
        target: Target,
        position: Positioning,
    },
    ChangeSize {
        target: Target,
        #[serde(default)]
        width: Option<Length>,
        #[serde(default)]
        height: Option<Length>,
    },
    ChangeRotation {
        target: Target,
        rotation: f32,
    },
    ChangeOpacity {
        target: Target,
        opacity: f32,
    },
    ChangeFills {
        target: Target,
        paints: Vec<Paint>,
    },
    ChangeStrokes {
        target: Target,
        paints: Vec<Paint>,
    },
    ChangeStrokeWidth {
        target: Target,
        width: f32,
    },
    ChangeCornerRadius {
        target: Target,
        radius: f32,
    },
    ChangeText {
        target: Target,
        patch: TextPatch,
    },
    ChangeLayout {
        target: Target,
        patch: LayoutPatch,
    },
    SetActive {
        target: Target,
        active: bool,
    },
    SetLocked {
        target: Target,
        locked: bool,
    },
    Rename {
        target: NodeId,
        name: String,
    },

    // Scenes
    LoadScene {
        scene: NodeId,
    },
    NewScene {
        name: String,
    },
    DeleteScene {
        scene: NodeId,
    },
    RenameScene {
        scene: NodeId,
        name: String,
    },

    // History
    Undo,
    Redo,
}

impl Action {
    /// Short label recorded with the history entry.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Select { .. } => "select",
            Action::Blur => "blur",
            Action::Hover { .. } => "hover",
            Action::InsertNode { .. } => "insert node",
            Action::DeleteNode { .. } => "delete node",
            Action::Duplicate { .. } => "duplicate",
            Action::Mv { .. } => "move into",
            Action::Order { .. } => "reorder",
            Action::Contain { .. } => "contain",
            Action::Copy { .. } => "copy",
            Action::Cut { .. } => "cut",
            Action::Paste => "paste",
            Action::Translate { .. } => "translate",
            Action::ChangePosition { .. } => "change position",
            Action::ChangePositioning { .. } => "change positioning",
            Action::ChangeSize { .. } => "resize",
            Action::ChangeRotation { .. } => "rotate",
            Action::ChangeOpacity { .. } => "change opacity",
            Action::ChangeFills { .. } => "change fills",
            Action::ChangeStrokes { .. } => "change strokes",
            Action::ChangeStrokeWidth { .. } => "change stroke width",
            Action::ChangeCornerRadius { .. } => "change corner radius",
            Action::ChangeText { .. } => "change text",
            Action::ChangeLayout { .. } => "change layout",
            Action::SetActive { .. } => "toggle active",
            Action::SetLocked { .. } => "toggle locked",
            Action::Rename { .. } => "rename",
            Action::LoadScene { .. } => "load scene",
            Action::NewScene { .. } => "new scene",
            Action::DeleteScene { .. } => "delete scene",
            Action::RenameScene { .. } => "rename scene",
            Action::Undo => "undo",
            Action::Redo => "redo",
        }
    }

    pub fn is_history(&self) -> bool {
        matches!(self, Action::Undo | Action::Redo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vellum_core::Selector;

    #[test]
    fn target_serializes_as_string() {
        let json = r#"{ "type": "translate", "target": "selection", "dx": 4, "dy": -2 }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            Action::Translate {
                target: Target::Selection,
                dx: 4.0,
                dy: -2.0
            }
        );

        let json = r#"{ "type": "set_locked", "target": "hero", "locked": true }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            Action::SetLocked {
                target: Target::Node(NodeId::intern("hero")),
                locked: true
            }
        );
    }

    #[test]
    fn select_parses_directives() {
        let json = r#"{ "type": "select", "selectors": ["~+", "hero"] }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        let Action::Select { selectors } = action else {
            panic!("expected select");
        };
        assert_eq!(
            selectors.as_slice(),
            &[Selector::NextSibling, Selector::Id(NodeId::intern("hero"))]
        );

        let bad = r#"{ "type": "select", "selectors": ["~?"] }"#;
        assert!(serde_json::from_str::<Action>(bad).is_err());
    }

    #[test]
    fn missing_target_is_rejected() {
        for json in [
            r#"{ "type": "delete_node" }"#,
            r#"{ "type": "translate", "dx": 1, "dy": 1 }"#,
            r#"{ "type": "set_active", "active": false }"#,
        ] {
            let err = serde_json::from_str::<Action>(json).unwrap_err();
            assert!(err.to_string().contains("target"), "{json}: {err}");
        }
    }

    #[test]
    fn order_index_shape() {
        let order: Order = serde_json::from_str(r#"{ "index": 2 }"#).unwrap();
        assert_eq!(order, Order::Index(2));
        let order: Order = serde_json::from_str(r#""front""#).unwrap();
        assert_eq!(order, Order::Front);
    }
}
