//! Coordinate transforms that leave topology untouched.

use std::collections::HashSet;

use crate::error::GridError;
use crate::geometry::{Orientation, Point};
use crate::graph::{EdgeId, NodeId, Side, Table};

impl Table {
    /// Scale every node about `(origin_x, origin_y)`.
    ///
    /// `dx` and `dy` are relative growth factors: a node at distance `d` from
    /// the origin ends up at `d * (1 + factor)`, rounded to the nearest pixel,
    /// so nodes on either side of the origin move in opposite directions.
    /// Factors at or below -1 would collapse or mirror the grid and are
    /// rejected, as is any result that merges two nodes.
    pub fn scale(&mut self, dx: f64, dy: f64, origin_x: i32, origin_y: i32) -> Result<(), GridError> {
        if !(dx.is_finite() && dy.is_finite() && dx > -1.0 && dy > -1.0) {
            return Err(GridError::InvalidScale { dx, dy });
        }

        let scaled = |v: i32, origin: i32, factor: f64| {
            origin + (f64::from(v - origin) * (1.0 + factor)).round() as i32
        };
        let positions: Vec<(NodeId, Point)> = self
            .nodes()
            .map(|(id, n)| {
                (
                    id,
                    Point::new(scaled(n.x(), origin_x, dx), scaled(n.y(), origin_y, dy)),
                )
            })
            .collect();

        let distinct: HashSet<Point> = positions.iter().map(|&(_, p)| p).collect();
        if distinct.len() != positions.len() {
            return Err(GridError::InvalidScale { dx, dy });
        }

        self.reposition(&positions)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(dx, dy, origin_x, origin_y, "scaled table");

        self.recompute_extents();
        Ok(())
    }

    /// Move the whole line through `edge` to `coordinate` on the cross axis.
    ///
    /// The target is clamped so the line stays at least `node_radius` away
    /// from the neighboring parallel lines. Returns the coordinate applied.
    pub fn move_line(&mut self, edge: EdgeId, coordinate: i32) -> Result<i32, GridError> {
        let (orientation, start) = {
            let e = self.edge(edge)?;
            (e.orientation(), e.start())
        };
        let line = self.line_nodes(start, orientation);
        let radius = self.settings().node_radius;
        let cross_of = |p: Point| match orientation {
            Orientation::Horizontal => p.y,
            Orientation::Vertical => p.x,
        };
        let current = cross_of(self.position(start)?);

        let (lesser, greater) = Side::across(orientation);
        let mut low = i32::MIN;
        let mut high = i32::MAX;
        for &n in &line {
            if let Some(prev) = self.neighbor(n, lesser) {
                low = low.max(cross_of(self.position(prev)?) + radius);
            }
            if let Some(next) = self.neighbor(n, greater) {
                high = high.min(cross_of(self.position(next)?) - radius);
            }
        }
        let target = if low > high {
            current
        } else {
            coordinate.clamp(low, high)
        };
        if target == current {
            return Ok(current);
        }

        let mut positions = Vec::with_capacity(line.len());
        for &n in &line {
            let p = self.position(n)?;
            let moved = match orientation {
                Orientation::Horizontal => Point::new(p.x, target),
                Orientation::Vertical => Point::new(target, p.y),
            };
            if self.find_node(moved).is_some() {
                return Ok(current);
            }
            positions.push((n, moved));
        }
        self.reposition(&positions)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%edge, from = current, to = target, "moved line");

        self.recompute_extents();
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GridSettings;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_scale_about_origin_corner() {
        let mut table = Table::grid(GridSettings::default(), 0, 0, 1, 1, 100).unwrap();
        table.scale(0.5, 1.0, 0, 0).unwrap();
        assert!(table.find_node(p(150, 200)).is_some());
        assert!(table.find_node(p(0, 0)).is_some());
        assert_eq!(table.edge_count(), 4);
        assert!(table.consistency_issues().is_empty());
    }

    #[test]
    fn test_scale_about_center_moves_both_sides_apart() {
        let mut table = Table::grid(GridSettings::default(), 0, 0, 1, 1, 100).unwrap();
        table.scale(0.1, 0.0, 50, 50).unwrap();
        assert!(table.find_node(p(-5, 0)).is_some());
        assert!(table.find_node(p(105, 100)).is_some());
    }

    #[test]
    fn test_scale_rejects_collapse() {
        let mut table = Table::grid(GridSettings::default(), 0, 0, 1, 1, 100).unwrap();
        assert!(matches!(
            table.scale(-1.0, 0.0, 0, 0),
            Err(GridError::InvalidScale { .. })
        ));
        assert!(matches!(
            table.scale(f64::NAN, 0.0, 0, 0),
            Err(GridError::InvalidScale { .. })
        ));
        assert!(table.find_node(p(100, 100)).is_some());
    }

    #[test]
    fn test_move_line_moves_whole_row() {
        let mut table = Table::grid(GridSettings::default(), 0, 0, 2, 2, 100).unwrap();
        let left_half = table.find_edge(p(0, 100), p(100, 100)).unwrap();
        assert_eq!(table.move_line(left_half, 140).unwrap(), 140);
        for x in [0, 100, 200] {
            assert!(table.find_node(p(x, 140)).is_some());
        }
        assert!(table.consistency_issues().is_empty());
    }

    #[test]
    fn test_move_line_clamps_to_neighbors() {
        let mut table = Table::grid(GridSettings::default(), 0, 0, 1, 2, 100).unwrap();
        let middle = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        assert_eq!(table.move_line(middle, 500).unwrap(), 195);
        assert_eq!(table.move_line(middle, -40).unwrap(), 5);
    }
}
