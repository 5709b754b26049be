//! Hit testing and box selection.

use crate::geometry::{BBox, Orientation, Point};
use crate::graph::{EdgeId, NodeId, Table};

impl Table {
    /// The node whose hit circle contains `p`, nearest first.
    pub fn node_at(&self, p: Point) -> Option<NodeId> {
        self.nodes()
            .filter_map(|(id, n)| {
                let dx = i64::from(n.x() - p.x);
                let dy = i64::from(n.y() - p.y);
                let d2 = dx * dx + dy * dy;
                let r = i64::from(n.radius());
                (d2 <= r * r).then_some((d2, id))
            })
            .min()
            .map(|(_, id)| id)
    }

    /// The enabled edge within `edge_width` pixels of `p`.
    ///
    /// Disabled edges are not drawn and so cannot be picked.
    pub fn edge_at(&self, p: Point) -> Option<EdgeId> {
        let width = self.settings().edge_width;
        self.edges()
            .filter(|(_, e)| !e.is_disabled())
            .filter_map(|(id, e)| {
                let (s, t) = self.edge_points(id).ok()?;
                let distance = match e.orientation() {
                    Orientation::Horizontal if (s.x..=t.x).contains(&p.x) => (p.y - s.y).abs(),
                    Orientation::Vertical if (s.y..=t.y).contains(&p.y) => (p.x - s.x).abs(),
                    _ => return None,
                };
                (distance <= width).then_some((distance, id))
            })
            .min()
            .map(|(_, id)| id)
    }

    /// Midpoint of an edge.
    pub fn edge_center(&self, id: EdgeId) -> Option<Point> {
        let (s, t) = self.edge_points(id).ok()?;
        Some(Point::new((s.x + t.x) / 2, (s.y + t.y) / 2))
    }

    /// Edges whose midpoint falls inside `bbox`.
    pub fn edges_in(&self, bbox: &BBox) -> Vec<EdgeId> {
        self.edges()
            .filter_map(|(id, _)| {
                let center = self.edge_center(id)?;
                bbox.contains(center).then_some(id)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::{BBox, Point};
    use crate::graph::{GridSettings, Table};

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    fn table() -> Table {
        Table::grid(GridSettings::default(), 0, 0, 2, 2, 100).unwrap()
    }

    #[test]
    fn test_node_at_within_radius() {
        let table = table();
        let center = table.find_node(p(100, 100)).unwrap();
        assert_eq!(table.node_at(p(103, 97)), Some(center));
        assert_eq!(table.node_at(p(110, 100)), None);
    }

    #[test]
    fn test_edge_at_picks_nearest_enabled_edge() {
        let table = table();
        let top = table.find_edge(p(0, 0), p(100, 0)).unwrap();
        assert_eq!(table.edge_at(p(50, 4)), Some(top));
        assert_eq!(table.edge_at(p(50, 50)), None);
    }

    #[test]
    fn test_edge_at_skips_disabled() {
        let mut table = table();
        let v = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        table.disable(v, true).unwrap();
        assert_eq!(table.edge_at(p(101, 50)), None);
    }

    #[test]
    fn test_edges_in_box() {
        let table = table();
        let selected = table.edges_in(&BBox::new(0, 0, 200, 60));
        // top border halves plus the three upper verticals
        assert_eq!(selected.len(), 5);
        assert_eq!(table.edges_in(&BBox::new(300, 300, 400, 400)), vec![]);
    }
}
