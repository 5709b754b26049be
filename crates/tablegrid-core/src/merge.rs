//! Merging cells.
//!
//! A disabled edge marks two neighboring cells as one. Disabling propagates
//! through complex nodes so merged regions stay rectangular, and once a
//! whole line segment is disabled its nodes can be dissolved, splicing the
//! crossing edges back into single edges.

use crate::error::GridError;
use crate::geometry::Orientation;
use crate::graph::{EdgeId, NodeId, Side, Table};

/// What a line or cell merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeOutcome {
    /// Edges whose disabled flag flipped, including propagated ones.
    pub toggled: usize,
    /// Nodes removed by dissolving.
    pub dissolved: usize,
}

impl Table {
    /// Set the disabled flag of `edge`.
    ///
    /// Boundary edges are left untouched. When an endpoint is complex (it
    /// becomes complex when disabling, or was complex before enabling) the
    /// change spreads to that node's other edges, transitively. Returns
    /// whether anything changed.
    pub fn disable(&mut self, edge: EdgeId, flag: bool) -> Result<bool, GridError> {
        Ok(self.toggle(edge, flag)? > 0)
    }

    fn toggle(&mut self, edge: EdgeId, flag: bool) -> Result<usize, GridError> {
        self.edge(edge)?;
        let mut worklist = vec![edge];
        let mut toggled = 0;

        while let Some(id) = worklist.pop() {
            let Ok(e) = self.edge(id) else {
                continue;
            };
            if e.is_disabled() == flag || self.is_boundary_edge(id) {
                continue;
            }
            let ends = [e.start(), e.end()];
            let was_complex = ends.map(|n| self.is_complex_node(n));
            self.set_disabled(id, flag)?;
            toggled += 1;

            for (node, was) in ends.into_iter().zip(was_complex) {
                let complex = if flag {
                    self.is_complex_node(node)
                } else {
                    was
                };
                if !complex {
                    continue;
                }
                for (_, other) in self.node(node)?.edges() {
                    if other != id && self.edge(other)?.is_disabled() != flag {
                        worklist.push(other);
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        {
            if toggled > 1 {
                tracing::debug!(%edge, flag, toggled, "disable propagated");
            }
        }

        Ok(toggled)
    }

    /// Dissolve the disabled run through `node`.
    ///
    /// A run is the collinear line through the node. It can be dissolved when
    /// every edge on it is disabled and every node on it has both crossing
    /// edges with matching flags; each such node is then removed and its two
    /// crossing edges are joined into one. The vertical run is tried before
    /// the horizontal one. Returns the number of nodes removed, zero when
    /// neither run qualifies or the node was already dissolved along with an
    /// earlier run.
    pub fn dissolve(&mut self, node: NodeId) -> Result<usize, GridError> {
        if self.is_removed_node(node) {
            return Ok(0);
        }
        self.node(node)?;
        for run in [Orientation::Vertical, Orientation::Horizontal] {
            let Some(chain) = self.dissolvable_run(node, run) else {
                continue;
            };
            for &n in &chain {
                self.splice(n, run.cross())?;
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(%node, ?run, removed = chain.len(), "dissolved run");

            self.recompute_extents();
            return Ok(chain.len());
        }
        Ok(0)
    }

    /// Whether [`dissolve`](Self::dissolve) would remove anything.
    pub fn is_dissolvable(&self, node: NodeId) -> bool {
        [Orientation::Vertical, Orientation::Horizontal]
            .into_iter()
            .any(|run| self.dissolvable_run(node, run).is_some())
    }

    fn dissolvable_run(&self, node: NodeId, run: Orientation) -> Option<Vec<NodeId>> {
        self.node(node).ok()?;
        let chain = self.line_nodes(node, run);
        let forward = Side::forward(run);
        let cross = run.cross();

        for &n in &chain {
            let current = self.node(n).ok()?;
            if let Some(e) = current.edge(forward) {
                if !self.edge(e).ok()?.is_disabled() {
                    return None;
                }
            }
            let before = self.edge(current.edge(Side::backward(cross))?).ok()?;
            let after = self.edge(current.edge(Side::forward(cross))?).ok()?;
            if before.is_disabled() != after.is_disabled() {
                return None;
            }
        }
        Some(chain)
    }

    /// Remove `node`, joining its two edges along `cross` into one and
    /// dropping its edges on the other axis.
    fn splice(&mut self, node: NodeId, cross: Orientation) -> Result<(), GridError> {
        let back = Side::backward(cross);
        let forward = Side::forward(cross);
        let (before, after) = {
            let n = self.node(node)?;
            match (n.edge(back), n.edge(forward)) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(GridError::UnknownNode(node)),
            }
        };

        let (lesser, greater) = Side::across(cross);
        for side in [lesser, greater] {
            if let Some(e) = self.node(node)?.edge(side) {
                self.remove_edge(e)?;
            }
        }

        let far = self.edge(after)?.end();
        self.remove_edge(after)?;
        *self.node_mut(node)?.slot_mut(back) = None;
        self.retarget_end(before, far)?;
        *self.node_mut(far)?.slot_mut(back) = Some(before);
        self.remove_node(node)?;
        Ok(())
    }

    /// Toggle every edge on the line through `edge`; when disabling, dissolve
    /// the line afterward.
    pub fn disable_line(&mut self, edge: EdgeId, flag: bool) -> Result<MergeOutcome, GridError> {
        let orientation = self.edge(edge)?.orientation();
        let first = self.edge(edge)?.start();
        let edges = self.line_edges(edge)?;
        let line = self.line_nodes(first, orientation);

        let mut outcome = MergeOutcome::default();
        for e in edges {
            if self.edge(e).is_ok() {
                outcome.toggled += self.toggle(e, flag)?;
            }
        }
        if flag {
            if let Some(&n) = line.iter().find(|&&n| self.is_dissolvable(n)) {
                outcome.dissolved = self.dissolve(n)?;
            }
        }
        Ok(outcome)
    }

    /// Merge the cell whose top-left corner is `a` with the neighboring cell
    /// whose top-left corner is `b`, directly to its right or below it.
    pub fn merge_cells(&mut self, a: NodeId, b: NodeId) -> Result<MergeOutcome, GridError> {
        let separator = self.separator(a, b, false)?;
        let mut outcome = MergeOutcome::default();
        for e in separator {
            outcome.toggled += self.toggle(e, true)?;
        }
        if self.node(b).is_ok() {
            outcome.dissolved = self.dissolve(b)?;
        }
        Ok(outcome)
    }

    /// Restore the line between `a` and `b` inside the merged region whose
    /// top-left corner is `a`.
    pub fn unmerge_cells(&mut self, a: NodeId, b: NodeId) -> Result<MergeOutcome, GridError> {
        let separator = self.separator(a, b, true)?;
        let mut outcome = MergeOutcome::default();
        for e in separator {
            outcome.toggled += self.toggle(e, false)?;
        }
        Ok(outcome)
    }

    /// Edges of the line segment separating the cell at `a` from the cell at
    /// `b`. With `inside` the segment lies within `a`'s merged region,
    /// otherwise it runs along `a`'s region border.
    fn separator(&self, a: NodeId, b: NodeId, inside: bool) -> Result<Vec<EdgeId>, GridError> {
        let pa = self.position(a)?;
        let pb = self.position(b)?;
        let region = self.cell_at(a).ok_or(GridError::NotAdjacent(a, b))?;

        let beside = pb.y == pa.y
            && if inside {
                pa.x < pb.x && pb.x < region.x1
            } else {
                pb.x == region.x1
            };
        let below = pb.x == pa.x
            && if inside {
                pa.y < pb.y && pb.y < region.bottom
            } else {
                pb.y == region.bottom
            };
        let (run, limit) = if beside {
            (Side::Bottom, region.bottom)
        } else if below {
            (Side::Right, region.x1)
        } else {
            return Err(GridError::NotAdjacent(a, b));
        };

        let mut edges = Vec::new();
        let mut cur = b;
        loop {
            let p = self.position(cur)?;
            let reached = match run {
                Side::Bottom => p.y >= limit,
                _ => p.x >= limit,
            };
            if reached {
                break;
            }
            let Some(e) = self.node(cur)?.edge(run) else {
                break;
            };
            edges.push(e);
            cur = self.edge(e)?.end();
        }
        if edges.is_empty() {
            return Err(GridError::NotAdjacent(a, b));
        }
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::graph::GridSettings;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    fn grid(rows: usize, cols: usize) -> Table {
        Table::grid(GridSettings::default(), 0, 0, rows, cols, 100).unwrap()
    }

    fn is_disabled(table: &Table, a: Point, b: Point) -> bool {
        let e = table.find_edge(a, b).unwrap();
        table.edge(e).unwrap().is_disabled()
    }

    #[test]
    fn test_disable_boundary_edge_is_noop() {
        let mut table = grid(1, 1);
        let top = table.find_edge(p(0, 0), p(100, 0)).unwrap();
        assert!(!table.disable(top, true).unwrap());
        assert!(!table.edge(top).unwrap().is_disabled());
    }

    #[test]
    fn test_disable_single_interior_edge() {
        let mut table = grid(2, 2);
        let v_top = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        assert!(table.disable(v_top, true).unwrap());
        assert!(is_disabled(&table, p(100, 0), p(100, 100)));
        assert!(!is_disabled(&table, p(100, 100), p(100, 200)));
        assert!(!is_disabled(&table, p(0, 100), p(100, 100)));
    }

    #[test]
    fn test_disable_twice_reports_no_change() {
        let mut table = grid(2, 2);
        let v_top = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        assert!(table.disable(v_top, true).unwrap());
        assert!(!table.disable(v_top, true).unwrap());
    }

    #[test]
    fn test_disable_propagates_through_complex_node() {
        let mut table = grid(2, 2);
        let v_top = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        let h_left = table.find_edge(p(0, 100), p(100, 100)).unwrap();
        table.disable(v_top, true).unwrap();
        table.disable(h_left, true).unwrap();

        assert!(is_disabled(&table, p(100, 100), p(200, 100)));
        assert!(is_disabled(&table, p(100, 100), p(100, 200)));
        assert!(table.is_complex_node(table.find_node(p(100, 100)).unwrap()));
    }

    #[test]
    fn test_enable_propagates_out_of_complex_node() {
        let mut table = grid(2, 2);
        let v_top = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        let h_left = table.find_edge(p(0, 100), p(100, 100)).unwrap();
        table.disable(v_top, true).unwrap();
        table.disable(h_left, true).unwrap();

        assert!(table.disable(v_top, false).unwrap());
        assert!(table.edges().all(|(_, e)| !e.is_disabled()));
    }

    #[test]
    fn test_dissolve_one_by_two_merge() {
        let mut table = grid(1, 2);
        let shared = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        let top_mid = table.find_node(p(100, 0)).unwrap();
        let bottom_mid = table.find_node(p(100, 100)).unwrap();
        table.disable(shared, true).unwrap();

        assert_eq!(table.dissolve(top_mid).unwrap(), 2);
        assert_eq!(table.dissolve(bottom_mid).unwrap(), 0);
        assert_eq!(table.node_count(), 4);
        assert_eq!(table.edge_count(), 4);
        assert!(table.find_edge(p(0, 0), p(200, 0)).is_some());
        assert!(table.find_edge(p(0, 100), p(200, 100)).is_some());
        assert!(table.consistency_issues().is_empty());
    }

    #[test]
    fn test_dissolve_unknown_node_is_error() {
        let mut table = grid(1, 1);
        assert_eq!(
            table.dissolve(NodeId(99)).unwrap_err(),
            GridError::UnknownNode(NodeId(99))
        );
    }

    #[test]
    fn test_dissolve_refuses_partially_enabled_run() {
        let mut table = grid(2, 2);
        let v_top = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        table.disable(v_top, true).unwrap();
        let top_mid = table.find_node(p(100, 0)).unwrap();
        assert!(!table.is_dissolvable(top_mid));
        assert_eq!(table.dissolve(top_mid).unwrap(), 0);
        assert_eq!(table.node_count(), 9);
    }

    #[test]
    fn test_dissolve_plain_split_node() {
        let mut table = grid(1, 1);
        let top = table.find_edge(p(0, 0), p(100, 0)).unwrap();
        let mid = table.split_edge(top, 0.5).unwrap();
        assert_eq!(table.dissolve(mid).unwrap(), 1);
        assert_eq!(table.edge_count(), 4);
        assert_eq!(table.edge_points(top).unwrap(), (p(0, 0), p(100, 0)));
        assert!(table.consistency_issues().is_empty());
    }

    #[test]
    fn test_disable_line_merges_columns() {
        let mut table = grid(2, 2);
        let v_top = table.find_edge(p(100, 0), p(100, 100)).unwrap();
        let outcome = table.disable_line(v_top, true).unwrap();

        assert_eq!(outcome, MergeOutcome { toggled: 2, dissolved: 3 });
        assert_eq!(table.node_count(), 6);
        assert!(table.find_edge(p(0, 100), p(200, 100)).is_some());
        assert!(table.consistency_issues().is_empty());
    }

    #[test]
    fn test_disable_line_on_border_changes_nothing() {
        let mut table = grid(2, 2);
        let top = table.find_edge(p(0, 0), p(100, 0)).unwrap();
        assert_eq!(table.disable_line(top, true).unwrap(), MergeOutcome::default());
    }

    #[test]
    fn test_merge_cells_horizontally() {
        let mut table = grid(1, 2);
        let a = table.find_node(p(0, 0)).unwrap();
        let b = table.find_node(p(100, 0)).unwrap();
        let outcome = table.merge_cells(a, b).unwrap();
        assert_eq!(outcome.toggled, 1);
        assert_eq!(outcome.dissolved, 2);
        assert_eq!(table.cells().len(), 1);
    }

    #[test]
    fn test_merge_cells_vertically_without_dissolve() {
        let mut table = grid(2, 2);
        let a = table.find_node(p(0, 0)).unwrap();
        let b = table.find_node(p(0, 100)).unwrap();
        let outcome = table.merge_cells(a, b).unwrap();
        assert_eq!(outcome, MergeOutcome { toggled: 1, dissolved: 0 });
        assert!(is_disabled(&table, p(0, 100), p(100, 100)));
        assert_eq!(table.cells().len(), 3);
    }

    #[test]
    fn test_unmerge_restores_line() {
        let mut table = grid(2, 2);
        let a = table.find_node(p(0, 0)).unwrap();
        let b = table.find_node(p(0, 100)).unwrap();
        table.merge_cells(a, b).unwrap();
        let outcome = table.unmerge_cells(a, b).unwrap();
        assert_eq!(outcome.toggled, 1);
        assert_eq!(table.cells().len(), 4);
    }

    #[test]
    fn test_merge_cells_rejects_distant_nodes() {
        let mut table = grid(3, 3);
        let a = table.find_node(p(0, 0)).unwrap();
        let far = table.find_node(p(200, 0)).unwrap();
        assert_eq!(
            table.merge_cells(a, far).unwrap_err(),
            GridError::NotAdjacent(a, far)
        );
    }
}
