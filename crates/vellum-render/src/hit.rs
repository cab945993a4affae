//! Hit testing: canvas point → node lookup.
//!
//! Walks the paint order back to front, so the last-painted node under the
//! point wins. Rotated nodes are tested against their own box through the
//! inverse transform, not their axis-aligned bounds.

use crate::geometry::SceneGeometry;
use kurbo::{Point, Rect};
use vellum_core::{Document, NodeId};

/// Topmost unlocked node at `point`, or `None` for the background.
pub fn hit_test(doc: &Document, geometry: &SceneGeometry, point: Point) -> Option<NodeId> {
    geometry.paint_order().iter().rev().copied().find(|&id| {
        let unlocked = doc.node(id).is_some_and(|n| !n.locked);
        unlocked && geometry.get(id).is_some_and(|g| g.contains(point))
    })
}

/// Unlocked nodes whose render bounds intersect `marquee`, in paint order.
/// Used for box selection.
pub fn hit_test_rect(doc: &Document, geometry: &SceneGeometry, marquee: Rect) -> Vec<NodeId> {
    let marquee = marquee.abs();
    geometry
        .paint_order()
        .iter()
        .copied()
        .filter(|&id| doc.node(id).is_some_and(|n| !n.locked))
        .filter(|&id| {
            geometry
                .get(id)
                .is_some_and(|g| overlaps(g.bounds, marquee))
        })
        .collect()
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::ApproximateMetrics;
    use vellum_core::{Length, Node, NodeKind};

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn doc() -> Document {
        let mut doc = Document::new();
        for (name, left) in [("h-back", 0.0), ("h-front", 50.0)] {
            let mut node = Node::new(id(name), NodeKind::Rectangle { corner_radius: 0.0 });
            node.left = left;
            node.width = Length::Fixed(100.0);
            node.height = Length::Fixed(100.0);
            doc.insert_node(node);
            doc.scene_mut(id("main")).unwrap().children.push(id(name));
        }
        doc
    }

    #[test]
    fn topmost_wins() {
        let doc = doc();
        let geo = SceneGeometry::resolve(&doc, id("main"), &ApproximateMetrics);
        assert_eq!(hit_test(&doc, &geo, Point::new(75.0, 50.0)), Some(id("h-front")));
        assert_eq!(hit_test(&doc, &geo, Point::new(25.0, 50.0)), Some(id("h-back")));
        assert_eq!(hit_test(&doc, &geo, Point::new(500.0, 50.0)), None);
    }

    #[test]
    fn locked_nodes_are_transparent_to_hits() {
        let mut doc = doc();
        doc.node_mut(id("h-front")).unwrap().locked = true;
        let geo = SceneGeometry::resolve(&doc, id("main"), &ApproximateMetrics);
        assert_eq!(hit_test(&doc, &geo, Point::new(75.0, 50.0)), Some(id("h-back")));
    }

    #[test]
    fn marquee_collects_intersections() {
        let doc = doc();
        let geo = SceneGeometry::resolve(&doc, id("main"), &ApproximateMetrics);
        // Dragged right-to-left; edges that only touch do not count.
        let hits = hit_test_rect(&doc, &geo, Rect::new(140.0, 10.0, 120.0, 20.0));
        assert_eq!(hits, vec![id("h-front")]);
        let hits = hit_test_rect(&doc, &geo, Rect::new(0.0, 0.0, 60.0, 10.0));
        assert_eq!(hits, vec![id("h-back"), id("h-front")]);
        assert!(hit_test_rect(&doc, &geo, Rect::new(150.0, 0.0, 160.0, 10.0)).is_empty());
    }
}
