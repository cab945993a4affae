//! Selector directives evaluated against a [`DocumentContext`].
//!
//! Grammar:
//!
//! ```text
//! selector := "*" | "~+" | "~-" | "~" | ">" | ".." | "selection" | id
//! id       := [A-Za-z0-9_:-]+
//! ```
//!
//! Every directive maps an input selection to a new id list. Sibling order is
//! the literal child order of the parent (or scene), never spatial position.

use crate::context::DocumentContext;
use crate::error::QueryError;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::take_while;

/// A parsed selector directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    /// `*` every placed node.
    All,
    /// `~` siblings of the selection.
    Siblings,
    /// `~+` next sibling, wrapping to the first.
    NextSibling,
    /// `~-` previous sibling, wrapping to the last.
    PrevSibling,
    /// `>` children of each selected node.
    Children,
    /// `..` parent of each selected node.
    Parent,
    /// `selection` the input itself.
    Selection,
    /// A literal node id.
    Id(NodeId),
}

/// Short selector lists are the norm.
pub type Selectors = SmallVec<[Selector; 2]>;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-')
}

fn parse_word(input: &mut &str) -> ModalResult<Selector> {
    take_while(1.., is_id_char)
        .map(|word: &str| match word {
            "selection" => Selector::Selection,
            id => Selector::Id(NodeId::intern(id)),
        })
        .parse_next(input)
}

fn parse_selector(input: &mut &str) -> ModalResult<Selector> {
    alt((
        "*".value(Selector::All),
        "~+".value(Selector::NextSibling),
        "~-".value(Selector::PrevSibling),
        "~".value(Selector::Siblings),
        ">".value(Selector::Children),
        "..".value(Selector::Parent),
        parse_word,
    ))
    .parse_next(input)
}

impl FromStr for Selector {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_selector
            .parse(s.trim())
            .map_err(|_| QueryError::InvalidSelector(s.to_string()))
    }
}

impl TryFrom<String> for Selector {
    type Error = QueryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Selector> for String {
    fn from(sel: Selector) -> Self {
        sel.to_string()
    }
}

impl From<NodeId> for Selector {
    fn from(id: NodeId) -> Self {
        Selector::Id(id)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("*"),
            Selector::Siblings => f.write_str("~"),
            Selector::NextSibling => f.write_str("~+"),
            Selector::PrevSibling => f.write_str("~-"),
            Selector::Children => f.write_str(">"),
            Selector::Parent => f.write_str(".."),
            Selector::Selection => f.write_str("selection"),
            Selector::Id(id) => f.write_str(id.as_str()),
        }
    }
}

/// Parse `directive` and resolve it against `selection`.
pub fn query(
    ctx: &DocumentContext,
    selection: &[NodeId],
    directive: &str,
) -> Result<Vec<NodeId>, QueryError> {
    let selector: Selector = directive.parse()?;
    Ok(query_selector(ctx, selection, &selector))
}

/// Resolve an already parsed selector. Ids unknown to the context simply
/// contribute nothing. Results are de-duplicated, first occurrence wins.
pub fn query_selector(
    ctx: &DocumentContext,
    selection: &[NodeId],
    selector: &Selector,
) -> Vec<NodeId> {
    let raw = match selector {
        Selector::All => ctx.node_ids(),
        Selector::Siblings => siblings(ctx, selection),
        Selector::NextSibling => selection
            .iter()
            .filter_map(|&id| step_sibling(ctx, id, 1))
            .collect(),
        Selector::PrevSibling => selection
            .iter()
            .filter_map(|&id| step_sibling(ctx, id, -1))
            .collect(),
        Selector::Children => selection
            .iter()
            .flat_map(|&id| ctx.children_of(id))
            .collect(),
        Selector::Parent => selection
            .iter()
            .filter_map(|&id| ctx.parent_of(id))
            .filter(|&parent| !ctx.is_scene(parent))
            .collect(),
        Selector::Selection => selection
            .iter()
            .copied()
            .filter(|&id| ctx.contains(id) && !ctx.is_scene(id))
            .collect(),
        Selector::Id(id) if ctx.contains(*id) && !ctx.is_scene(*id) => vec![*id],
        Selector::Id(_) => Vec::new(),
    };
    dedup(raw)
}

/// Empty selection means everything; one id means its siblings; several ids
/// mean their common siblings, but only when they share a parent.
fn siblings(ctx: &DocumentContext, selection: &[NodeId]) -> Vec<NodeId> {
    match selection {
        [] => ctx.node_ids(),
        [only] => ctx.siblings(*only),
        [first, rest @ ..] => {
            let parent = ctx.parent_of(*first);
            if parent.is_some() && rest.iter().all(|&id| ctx.parent_of(id) == parent) {
                ctx.siblings(*first)
            } else {
                Vec::new()
            }
        }
    }
}

/// Neighbor of `id` in its parent's child list, circularly.
fn step_sibling(ctx: &DocumentContext, id: NodeId, step: isize) -> Option<NodeId> {
    let parent = ctx.parent_of(id)?;
    let children = ctx.children_of(parent);
    let len = children.len() as isize;
    let at = children.iter().position(|&c| c == id)? as isize;
    let next = (at + step).rem_euclid(len);
    children.get(next as usize).copied()
}

fn dedup(ids: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::model::{Node, NodeKind};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn flat(ids: &[&str]) -> DocumentContext {
        let mut doc = Document::new();
        for leaf in ids {
            doc.insert_node(Node::new(id(leaf), NodeKind::Ellipse));
        }
        doc.scene_mut(id("main"))
            .unwrap()
            .children
            .extend(ids.iter().map(|s| id(s)));
        DocumentContext::build(&doc)
    }

    #[test]
    fn parses_every_directive() {
        let cases = [
            ("*", Selector::All),
            ("~", Selector::Siblings),
            ("~+", Selector::NextSibling),
            ("~-", Selector::PrevSibling),
            (">", Selector::Children),
            ("..", Selector::Parent),
            ("selection", Selector::Selection),
            ("hero-1", Selector::Id(id("hero-1"))),
            (" ~+ ", Selector::NextSibling),
        ];
        for (src, expected) in cases {
            assert_eq!(src.parse::<Selector>(), Ok(expected), "{src}");
        }
    }

    #[test]
    fn rejects_unknown_directives() {
        for bad in ["", "~~", "+", "a b", "../..", "#id", "selection!"] {
            assert_eq!(
                bad.parse::<Selector>(),
                Err(QueryError::InvalidSelector(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn next_and_prev_wrap() {
        let ctx = flat(&["a", "b", "c"]);
        assert_eq!(query(&ctx, &[id("a")], "~+").unwrap(), vec![id("b")]);
        assert_eq!(query(&ctx, &[id("c")], "~+").unwrap(), vec![id("a")]);
        assert_eq!(query(&ctx, &[id("b")], "~-").unwrap(), vec![id("a")]);
        assert_eq!(query(&ctx, &[id("a")], "~-").unwrap(), vec![id("c")]);
    }

    #[test]
    fn only_child_wraps_to_itself() {
        let ctx = flat(&["solo"]);
        assert_eq!(query(&ctx, &[id("solo")], "~+").unwrap(), vec![id("solo")]);
    }

    #[test]
    fn sibling_steps_are_deduplicated() {
        let ctx = flat(&["a", "b"]);
        // a -> b and b -> a; then a and b again.
        assert_eq!(
            query(&ctx, &[id("a"), id("b"), id("a")], "~+").unwrap(),
            vec![id("b"), id("a")]
        );
    }

    #[test]
    fn siblings_of_empty_single_and_multiple() {
        let ctx = flat(&["a", "b", "c"]);
        assert_eq!(query(&ctx, &[], "~").unwrap(), vec![id("a"), id("b"), id("c")]);
        assert_eq!(query(&ctx, &[id("b")], "~").unwrap(), vec![id("a"), id("c")]);
        assert_eq!(
            query(&ctx, &[id("a"), id("b")], "~").unwrap(),
            vec![id("b"), id("c")]
        );
    }

    #[test]
    fn unknown_ids_yield_nothing() {
        let ctx = flat(&["a"]);
        assert!(query(&ctx, &[id("ghost")], "~+").unwrap().is_empty());
        assert!(query(&ctx, &[], "ghost").unwrap().is_empty());
        assert!(query(&ctx, &[id("a")], "..").unwrap().is_empty());
    }

    #[test]
    fn serde_uses_directive_text() {
        let sel: Selector = serde_json::from_str("\"~-\"").unwrap();
        assert_eq!(sel, Selector::PrevSibling);
        assert_eq!(serde_json::to_string(&Selector::Children).unwrap(), "\">\"");
        assert!(serde_json::from_str::<Selector>("\"!\"").is_err());
    }
}
