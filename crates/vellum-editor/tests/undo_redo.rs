//! Integration tests: every mutating action is undone by a single `Undo`.

use pretty_assertions::assert_eq;
use vellum_core::*;
use vellum_editor::*;

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn make_editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    let json = include_str!("fixtures/board.json");
    Editor::from_json(json, EditorConfig::default()).unwrap()
}

fn mutating_actions() -> Vec<Action> {
    let card = Target::Node(id("card"));
    let title = Target::Node(id("title"));
    vec![
        Action::Select {
            selectors: ["badge".parse::<Selector>().unwrap()].into_iter().collect(),
        },
        Action::InsertNode {
            id: Some(id("fresh")),
            parent: Some(id("body")),
            index: Some(0),
            prototype: NodePrototype::rectangle(20.0, 20.0),
        },
        Action::DeleteNode { target: card },
        Action::Duplicate { target: card },
        Action::Mv {
            source: vec![id("badge")],
            target: id("body"),
            index: None,
        },
        Action::Order {
            target: card,
            order: Order::Front,
        },
        Action::Contain { target: card },
        Action::Cut { target: card },
        Action::Translate {
            target: card,
            dx: 10.0,
            dy: -4.0,
        },
        Action::ChangePosition {
            target: card,
            left: 1.0,
            top: 2.0,
        },
        Action::ChangePositioning {
            target: card,
            position: Positioning::Relative,
        },
        Action::ChangeSize {
            target: card,
            width: Some(Length::Auto),
            height: None,
        },
        Action::ChangeRotation {
            target: card,
            rotation: 45.0,
        },
        Action::ChangeOpacity {
            target: card,
            opacity: 0.5,
        },
        Action::ChangeFills {
            target: card,
            paints: vec![Paint::solid(Color::BLACK)],
        },
        Action::ChangeStrokes {
            target: card,
            paints: vec![Paint::solid(Color::WHITE)],
        },
        Action::ChangeStrokeWidth {
            target: card,
            width: 3.0,
        },
        Action::ChangeCornerRadius {
            target: card,
            radius: 16.0,
        },
        Action::ChangeText {
            target: title,
            patch: TextPatch {
                text: Some("Bye".into()),
                text_align: Some(TextAlign::Right),
                ..TextPatch::default()
            },
        },
        Action::ChangeLayout {
            target: card,
            patch: LayoutPatch {
                layout: Some(LayoutMode::Flex),
                gap: Some(4.0),
                ..LayoutPatch::default()
            },
        },
        Action::SetActive {
            target: card,
            active: false,
        },
        Action::SetLocked {
            target: card,
            locked: true,
        },
        Action::Rename {
            target: id("card"),
            name: "Profile".into(),
        },
        Action::LoadScene { scene: id("empty") },
        Action::NewScene {
            name: "Extra".into(),
        },
        Action::DeleteScene { scene: id("empty") },
        Action::RenameScene {
            scene: id("page"),
            name: "Home".into(),
        },
    ]
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn undo_restores_previous_state_for_every_action() {
    for action in mutating_actions() {
        let mut editor = make_editor();
        let before = editor.state().clone();

        editor.dispatch(action.clone()).unwrap();
        assert_ne!(editor.state(), &before, "{} changed nothing", action.label());

        editor.dispatch(Action::Undo).unwrap();
        assert_eq!(editor.state(), &before, "undo after {}", action.label());
    }
}

#[test]
fn redo_reapplies_undone_action() {
    for action in mutating_actions() {
        let mut editor = make_editor();
        editor.dispatch(action.clone()).unwrap();
        let after = editor.state().clone();

        editor.undo();
        editor.dispatch(Action::Redo).unwrap();
        assert_eq!(editor.state(), &after, "redo after {}", action.label());
    }
}

#[test]
fn undo_restores_context() {
    let mut editor = make_editor();
    editor
        .dispatch(Action::Mv {
            source: vec![id("caption")],
            target: id("card"),
            index: Some(0),
        })
        .unwrap();
    assert_eq!(editor.state().document_ctx.parent_of(id("caption")), Some(id("card")));

    editor.undo();
    assert_eq!(editor.state().document_ctx.parent_of(id("caption")), Some(id("page")));
}

#[test]
fn multiple_undo_redo_sequence() {
    let mut editor = make_editor();
    for dx in [1.0, 2.0, 3.0] {
        editor
            .dispatch(Action::Translate {
                target: Target::Node(id("badge")),
                dx,
                dy: 0.0,
            })
            .unwrap();
    }
    let left = |e: &Editor| e.document().node(id("badge")).unwrap().left;
    assert_eq!(left(&editor), 346.0);

    editor.undo();
    editor.undo();
    assert_eq!(left(&editor), 341.0);
    editor.redo();
    assert_eq!(left(&editor), 343.0);

    let summary = editor.summary();
    assert_eq!(summary.past_depth, 2);
    assert_eq!(summary.future_depth, 1);
    assert!(summary.can_undo && summary.can_redo);
}

#[test]
fn drag_gesture_is_one_undo_step() {
    let mut editor = make_editor();
    editor.begin_batch("drag badge");
    for _ in 0..20 {
        editor
            .dispatch(Action::Translate {
                target: Target::Node(id("badge")),
                dx: 0.5,
                dy: 0.5,
            })
            .unwrap();
    }
    assert!(editor.end_batch());
    assert_eq!(editor.history().past_labels().collect::<Vec<_>>(), vec!["drag badge"]);

    editor.undo();
    let badge = editor.document().node(id("badge")).unwrap();
    assert_eq!((badge.left, badge.top), (340.0, 30.0));
    assert!(!editor.can_undo());
}

#[test]
fn history_depth_follows_config() {
    let json = include_str!("fixtures/board.json");
    let config = EditorConfig {
        max_history_depth: 2,
        ..EditorConfig::default()
    };
    let mut editor = Editor::from_json(json, config).unwrap();
    for rotation in [10.0, 20.0, 30.0, 40.0] {
        editor
            .dispatch(Action::ChangeRotation {
                target: Target::Node(id("card")),
                rotation,
            })
            .unwrap();
    }
    assert_eq!(editor.summary().past_depth, 2);
    editor.undo();
    editor.undo();
    assert_eq!(editor.undo(), None);
    assert_eq!(editor.document().node(id("card")).unwrap().rotation, 20.0);
}

// ─── Clipboard ──────────────────────────────────────────────────────────

#[test]
fn copy_is_not_an_undo_step() {
    let mut editor = make_editor();
    editor
        .dispatch(Action::Copy {
            target: Target::Node(id("badge")),
        })
        .unwrap();
    assert!(!editor.can_undo());
    assert!(editor.state().clipboard.is_some());
}

#[test]
fn paste_undoes_in_one_step_and_clipboard_survives() {
    let mut editor = make_editor();
    editor
        .dispatch(Action::Copy {
            target: Target::Node(id("card")),
        })
        .unwrap();
    let before = editor.state().clone();

    editor.dispatch(Action::Paste).unwrap();
    assert_eq!(editor.document().nodes.len(), before.document.nodes.len() + 4);

    editor.dispatch(Action::Undo).unwrap();
    assert_eq!(editor.state(), &before);
    assert!(editor.state().clipboard.is_some());

    editor.dispatch(Action::Redo).unwrap();
    assert_eq!(editor.document().nodes.len(), before.document.nodes.len() + 4);
}

#[test]
fn undoing_cut_restores_nodes_but_keeps_clipboard() {
    let mut editor = make_editor();
    editor
        .dispatch(Action::Cut {
            target: Target::Node(id("badge")),
        })
        .unwrap();
    assert!(editor.document().node(id("badge")).is_none());

    editor.undo();
    assert!(editor.document().node(id("badge")).is_some());
    let clipboard = editor.state().clipboard.clone().unwrap();
    assert_eq!(clipboard.ids, vec![id("badge")]);

    editor.dispatch(Action::Paste).unwrap();
    let pasted = editor.state().selection[0];
    assert_ne!(pasted, id("badge"));
    assert_eq!(editor.document().node(pasted).unwrap().kind, NodeKind::Ellipse);
}
