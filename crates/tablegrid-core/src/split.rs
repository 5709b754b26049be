//! Edge splitting: a single edge, or a whole band of parallel edges.

use crate::error::GridError;
use crate::geometry::{Orientation, Point};
use crate::graph::{EdgeId, NodeId, Side, Table};

fn check_fraction(n: f64) -> Result<(), GridError> {
    if n > 0.0 && n < 1.0 {
        Ok(())
    } else {
        Err(GridError::InvalidSplitFraction(n))
    }
}

/// Coordinate of `p` along an edge of the given orientation.
fn along(orientation: Orientation, p: Point) -> i32 {
    match orientation {
        Orientation::Horizontal => p.x,
        Orientation::Vertical => p.y,
    }
}

impl Table {
    /// Split `edge` at fraction `n` of its length.
    ///
    /// The original edge keeps its id and becomes the first half; the second
    /// half is a new edge inheriting the disabled flag. Returns the new node.
    pub fn split_edge(&mut self, edge: EdgeId, n: f64) -> Result<NodeId, GridError> {
        check_fraction(n)?;
        let at = self.split_coordinate(edge, n)?;
        let node = self.split_at(edge, at)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%edge, %node, at, "split edge");

        Ok(node)
    }

    /// Split `edge` at fraction `n` and carry the split across the whole band.
    ///
    /// Walking outward on both sides of the edge, every interior parallel line
    /// crossed is split at the same absolute coordinate and the split nodes
    /// are joined by new cross edges. Border lines are never split by
    /// propagation: the walk stops on reaching one, or where the line already
    /// continues. On a single cell only the target edge is split. Returns
    /// every node created, the first split first.
    pub fn recursive_split(&mut self, edge: EdgeId, n: f64) -> Result<Vec<NodeId>, GridError> {
        check_fraction(n)?;
        let orientation = self.edge(edge)?.orientation();
        let at = self.split_coordinate(edge, n)?;
        let first = self.split_at(edge, at)?;

        let mut created = vec![first];
        let (lesser, greater) = Side::across(orientation);
        for side in [lesser, greater] {
            let mut cur = first;
            while let Some(next) = self.split_band(cur, orientation, side, at)? {
                created.push(next);
                cur = next;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(%edge, at, nodes = created.len(), "recursive split");

        self.recompute_extents();
        Ok(created)
    }

    fn split_coordinate(&self, edge: EdgeId, n: f64) -> Result<i32, GridError> {
        let orientation = self.edge(edge)?.orientation();
        let (s, e) = self.edge_points(edge)?;
        let (a, b) = (along(orientation, s), along(orientation, e));
        Ok(a + (f64::from(b - a) * n).round() as i32)
    }

    /// Split `edge` at the absolute coordinate `at` along its axis.
    pub(crate) fn split_at(&mut self, edge: EdgeId, at: i32) -> Result<NodeId, GridError> {
        let (orientation, end, disabled) = {
            let e = self.edge(edge)?;
            (e.orientation(), e.end(), e.is_disabled())
        };
        let (sp, ep) = self.edge_points(edge)?;
        let point = match orientation {
            Orientation::Horizontal => Point::new(at, sp.y),
            Orientation::Vertical => Point::new(sp.x, at),
        };
        if point <= sp || point >= ep {
            return Err(GridError::DegenerateEdge(point));
        }

        let forward = Side::forward(orientation);
        let backward = Side::backward(orientation);
        let mid = match self.find_node(point) {
            Some(id) => {
                let node = self.node(id)?;
                if let Some(existing) = node.edge(backward).or(node.edge(forward)) {
                    return Err(GridError::SlotOccupied { node: id, existing });
                }
                id
            }
            None => self.add_node(point),
        };

        *self.node_mut(end)?.slot_mut(backward) = None;
        self.retarget_end(edge, mid)?;
        *self.node_mut(mid)?.slot_mut(backward) = Some(edge);
        self.link_nodes(mid, end, disabled)?;
        Ok(mid)
    }

    /// Cross from the line through `from` to the next parallel line on
    /// `side`, split that line at `at` and link the two split points.
    ///
    /// Returns the node reached on the next line, or `None` once the band ends.
    fn split_band(
        &mut self,
        from: NodeId,
        orientation: Orientation,
        side: Side,
        at: i32,
    ) -> Result<Option<NodeId>, GridError> {
        if self.node(from)?.edge(side).is_some() {
            return Ok(None);
        }

        let line = self.line_nodes(from, orientation);
        let bridge = line
            .iter()
            .copied()
            .filter(|&n| self.node(n).is_ok_and(|n| n.edge(side).is_some()))
            .min_by_key(|&n| {
                self.position(n)
                    .map(|p| (along(orientation, p) - at).abs())
                    .unwrap_or(i32::MAX)
            });
        let Some(landing) = bridge.and_then(|b| self.neighbor(b, side)) else {
            return Ok(None);
        };
        if self.is_border_line(landing, orientation)? {
            return Ok(None);
        }

        let next_line = self.line_nodes(landing, orientation);
        let mut target = None;
        for &n in &next_line {
            if along(orientation, self.position(n)?) == at {
                target = Some(n);
                break;
            }
        }
        let target = match target {
            Some(n) => n,
            None => {
                let forward = Side::forward(orientation);
                let spanning = next_line.iter().find_map(|&n| {
                    let e = self.node(n).ok()?.edge(forward)?;
                    let (s, t) = self.edge_points(e).ok()?;
                    (along(orientation, s) < at && at < along(orientation, t)).then_some(e)
                });
                match spanning {
                    Some(e) => self.split_at(e, at)?,
                    None => return Ok(None),
                }
            }
        };

        if self.node(target)?.edge(side.opposite()).is_some() {
            return Ok(None);
        }
        self.link_nodes(from, target, false)?;
        Ok(Some(target))
    }

    fn is_border_line(&self, node: NodeId, orientation: Orientation) -> Result<bool, GridError> {
        let node = self.node(node)?;
        Ok(node
            .edge(Side::forward(orientation))
            .or(node.edge(Side::backward(orientation)))
            .is_none_or(|e| self.is_boundary_edge(e)))
    }
}
