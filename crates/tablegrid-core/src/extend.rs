//! Growing a table by duplicating a border row or column.

use crate::error::GridError;
use crate::geometry::Point;
use crate::graph::{EdgeId, NodeId, Side, Table};

impl Table {
    /// Duplicate the border line through `edge` outward.
    ///
    /// Every node on the line gets a copy `node_radius + offset` pixels
    /// further out; the copies are chained into a new border line and each is
    /// joined to its source by a connector edge. A connector is disabled when
    /// the source's inward edge is disabled or missing, so the new row or
    /// column repeats the merge pattern of the one it extends. Returns the
    /// new nodes in line order.
    pub fn extend_duplicate(&mut self, edge: EdgeId, offset: i32) -> Result<Vec<NodeId>, GridError> {
        let (orientation, start) = {
            let e = self.edge(edge)?;
            (e.orientation(), e.start())
        };
        if !self.is_boundary_edge(edge) {
            return Err(GridError::NotBoundaryEdge(edge));
        }
        let distance = self.settings().node_radius + offset;
        if distance <= 0 {
            return Err(GridError::InvalidDimensions(format!(
                "extension distance must be positive, got {distance}"
            )));
        }

        let line = self.line_nodes(start, orientation);
        let (lesser, greater) = Side::across(orientation);
        let has_neighbors = |side: Side| {
            line.iter()
                .any(|&n| self.node(n).is_ok_and(|n| n.edge(side).is_some()))
        };
        let outward = if has_neighbors(lesser) { greater } else { lesser };
        let inward = outward.opposite();
        let shift = |p: Point| match outward {
            Side::Top => Point::new(p.x, p.y - distance),
            Side::Bottom => Point::new(p.x, p.y + distance),
            Side::Left => Point::new(p.x - distance, p.y),
            Side::Right => Point::new(p.x + distance, p.y),
        };

        let mut sources = Vec::with_capacity(line.len());
        for &n in &line {
            let node = self.node(n)?;
            let merged = match node.edge(inward) {
                Some(e) => self.edge(e)?.is_disabled(),
                None => true,
            };
            sources.push((n, shift(node.position()), merged));
        }
        for &(_, target, _) in &sources {
            if let Some(existing) = self.find_node(target) {
                return Err(GridError::InvalidDimensions(format!(
                    "extension target ({}, {}) is already occupied by {existing}",
                    target.x, target.y
                )));
            }
        }

        let created: Vec<NodeId> = sources
            .iter()
            .map(|&(_, target, _)| self.add_node(target))
            .collect();
        for pair in created.windows(2) {
            self.link_nodes(pair[0], pair[1], false)?;
        }
        for (&(source, _, merged), &copy) in sources.iter().zip(&created) {
            let connector = self.link_nodes(source, copy, false)?;
            if merged && !self.is_boundary_edge(connector) {
                self.set_disabled(connector, true)?;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(%edge, ?outward, distance, nodes = created.len(), "extended border");

        self.recompute_extents();
        Ok(created)
    }
}
