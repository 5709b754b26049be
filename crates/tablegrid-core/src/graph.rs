//! Grid graph storage.
//!
//! A [`Table`] owns an arena of [`Node`]s and [`Edge`]s addressed by stable
//! integer ids. Nodes are grid intersections holding up to one edge per
//! direction; edges are horizontal or vertical segments between two nodes.
//! Ids are never reused, so a removed node or edge simply stops resolving.
//!
//! Slot invariants maintained by every mutation:
//! - a horizontal edge is the `right` slot of its start and the `left` slot of its end
//! - a vertical edge is the `bottom` slot of its start and the `top` slot of its end
//! - `start` always has the lesser coordinate along the edge's axis

use std::collections::HashMap;
use std::fmt;

use crate::error::GridError;
use crate::geometry::{BBox, COORDINATE_LIMIT, Orientation, Point};

/// Stable handle to a node in a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Stable handle to an edge in a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub usize);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One of the four directional neighbor slots of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Orientation of the edges this slot holds.
    pub fn orientation(self) -> Orientation {
        match self {
            Side::Top | Side::Bottom => Orientation::Vertical,
            Side::Left | Side::Right => Orientation::Horizontal,
        }
    }

    /// Slot an edge occupies on its `start` node.
    pub fn forward(orientation: Orientation) -> Side {
        match orientation {
            Orientation::Horizontal => Side::Right,
            Orientation::Vertical => Side::Bottom,
        }
    }

    /// Slot an edge occupies on its `end` node.
    pub fn backward(orientation: Orientation) -> Side {
        match orientation {
            Orientation::Horizontal => Side::Left,
            Orientation::Vertical => Side::Top,
        }
    }

    /// The two slots perpendicular to an edge of `orientation`, lesser side first.
    pub fn across(orientation: Orientation) -> (Side, Side) {
        match orientation {
            Orientation::Horizontal => (Side::Top, Side::Bottom),
            Orientation::Vertical => (Side::Left, Side::Right),
        }
    }
}

/// A grid intersection point.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    position: Point,
    radius: i32,
    top: Option<EdgeId>,
    bottom: Option<EdgeId>,
    left: Option<EdgeId>,
    right: Option<EdgeId>,
}

impl Node {
    fn new(position: Point, radius: i32) -> Self {
        Self {
            position,
            radius,
            top: None,
            bottom: None,
            left: None,
            right: None,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    /// Hit-test tolerance in pixels.
    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Edge wired into the given slot, if any.
    pub fn edge(&self, side: Side) -> Option<EdgeId> {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn top_edge(&self) -> Option<EdgeId> {
        self.top
    }

    pub fn bottom_edge(&self) -> Option<EdgeId> {
        self.bottom
    }

    pub fn left_edge(&self) -> Option<EdgeId> {
        self.left
    }

    pub fn right_edge(&self) -> Option<EdgeId> {
        self.right
    }

    /// All occupied slots.
    pub fn edges(&self) -> impl Iterator<Item = (Side, EdgeId)> + '_ {
        Side::ALL
            .into_iter()
            .filter_map(move |side| self.edge(side).map(|e| (side, e)))
    }

    /// Number of occupied slots.
    pub fn degree(&self) -> usize {
        self.edges().count()
    }

    pub(crate) fn slot_mut(&mut self, side: Side) -> &mut Option<EdgeId> {
        match side {
            Side::Top => &mut self.top,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// A horizontal or vertical segment between two nodes.
///
/// The edge does not own its nodes; it references them by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    start: NodeId,
    end: NodeId,
    orientation: Orientation,
    disabled: bool,
}

impl Edge {
    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }

    /// True when the line is suppressed and the two adjacent cells are merged.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

/// Geometry settings shared by every node of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSettings {
    /// Node hit-test radius; also the minimum gap kept between parallel lines.
    pub node_radius: i32,
    /// Half-width of the band around an edge that counts as a hit.
    pub edge_width: i32,
    /// Padding added around the node extent when computing [`Table::bbox`].
    pub bbox_margin: i32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            node_radius: 5,
            edge_width: 5,
            bbox_margin: 10,
        }
    }
}

/// The four corner nodes of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extents {
    pub top_left: NodeId,
    pub top_right: NodeId,
    pub bottom_left: NodeId,
    pub bottom_right: NodeId,
}

/// A grid graph for one table instance.
#[derive(Debug, Clone, Default)]
pub struct Table {
    settings: GridSettings,
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    node_index: HashMap<Point, NodeId>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
    extents: Option<Extents>,
}

impl Table {
    /// Create an empty table.
    pub fn new(settings: GridSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Create a table holding a uniform `rows` x `cols` grid.
    pub fn grid(
        settings: GridSettings,
        origin_x: i32,
        origin_y: i32,
        rows: usize,
        cols: usize,
        cell_size: i32,
    ) -> Result<Self, GridError> {
        let mut table = Self::new(settings);
        table.create_table(origin_x, origin_y, rows, cols, cell_size)?;
        Ok(table)
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    // --- Lookup ---

    pub fn node(&self, id: NodeId) -> Result<&Node, GridError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(GridError::UnknownNode(id))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, GridError> {
        self.edges
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(GridError::UnknownEdge(id))
    }

    /// Whether `id` once named a node that has since been removed.
    pub fn is_removed_node(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(None))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GridError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(GridError::UnknownNode(id))
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Result<&mut Edge, GridError> {
        self.edges
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(GridError::UnknownEdge(id))
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i), n)))
    }

    /// Live edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i), e)))
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_index.is_empty()
    }

    pub fn find_node(&self, p: Point) -> Option<NodeId> {
        self.node_index.get(&p).copied()
    }

    /// Find the edge between two points, in either order.
    pub fn find_edge(&self, a: Point, b: Point) -> Option<EdgeId> {
        let a = self.find_node(a)?;
        let b = self.find_node(b)?;
        self.edge_index
            .get(&(a, b))
            .or_else(|| self.edge_index.get(&(b, a)))
            .copied()
    }

    pub fn position(&self, id: NodeId) -> Result<Point, GridError> {
        Ok(self.node(id)?.position)
    }

    /// Start and end positions of an edge.
    pub fn edge_points(&self, id: EdgeId) -> Result<(Point, Point), GridError> {
        let edge = self.edge(id)?;
        Ok((self.position(edge.start)?, self.position(edge.end)?))
    }

    /// Node on the far side of the edge in `side`.
    pub fn neighbor(&self, node: NodeId, side: Side) -> Option<NodeId> {
        let edge = self.node(node).ok()?.edge(side)?;
        self.edge(edge).ok()?.other(node)
    }

    // --- Mutation primitives ---

    /// Insert a node at `p`, or return the node already there.
    pub fn add_node(&mut self, p: Point) -> NodeId {
        if let Some(id) = self.find_node(p) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(p, self.settings.node_radius)));
        self.node_index.insert(p, id);
        id
    }

    /// Link two points with an edge, inserting nodes as needed.
    ///
    /// Returns the canonical edge: if a coordinate-identical edge already
    /// exists it is returned unchanged. Fails without mutating the table when
    /// the points are not axis-aligned or when a node already holds a
    /// different edge in the slot the new edge needs.
    pub fn add_link(&mut self, a: Point, b: Point) -> Result<EdgeId, GridError> {
        let id = self.link_points(a, b)?;
        self.recompute_extents();
        Ok(id)
    }

    /// [`add_link`](Self::add_link) without refreshing extents.
    pub(crate) fn link_points(&mut self, a: Point, b: Point) -> Result<EdgeId, GridError> {
        let orientation = Orientation::between(a, b).ok_or(if a == b {
            GridError::DegenerateEdge(a)
        } else {
            GridError::NotAxisAligned { start: a, end: b }
        })?;
        let (start, end) = if a < b { (a, b) } else { (b, a) };

        if let Some(existing) = self.find_edge(start, end) {
            return Ok(existing);
        }
        for (p, side) in [
            (start, Side::forward(orientation)),
            (end, Side::backward(orientation)),
        ] {
            if let Some(node) = self.find_node(p) {
                if let Some(existing) = self.node(node)?.edge(side) {
                    return Err(GridError::SlotOccupied { node, existing });
                }
            }
        }

        let start = self.add_node(start);
        let end = self.add_node(end);
        self.link_nodes(start, end, false)
    }

    /// Wire a new edge between two existing nodes whose slots are free.
    pub(crate) fn link_nodes(
        &mut self,
        a: NodeId,
        b: NodeId,
        disabled: bool,
    ) -> Result<EdgeId, GridError> {
        let pa = self.position(a)?;
        let pb = self.position(b)?;
        let orientation = Orientation::between(pa, pb).ok_or(if pa == pb {
            GridError::DegenerateEdge(pa)
        } else {
            GridError::NotAxisAligned { start: pa, end: pb }
        })?;
        let (start, end) = if pa < pb { (a, b) } else { (b, a) };
        let forward = Side::forward(orientation);
        let backward = Side::backward(orientation);
        if let Some(existing) = self.node(start)?.edge(forward) {
            return Err(GridError::SlotOccupied {
                node: start,
                existing,
            });
        }
        if let Some(existing) = self.node(end)?.edge(backward) {
            return Err(GridError::SlotOccupied {
                node: end,
                existing,
            });
        }

        let id = EdgeId(self.edges.len());
        self.edges.push(Some(Edge {
            start,
            end,
            orientation,
            disabled,
        }));
        self.edge_index.insert((start, end), id);
        *self.node_mut(start)?.slot_mut(forward) = Some(id);
        *self.node_mut(end)?.slot_mut(backward) = Some(id);
        Ok(id)
    }

    /// Detach an edge from both endpoints and drop it.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, GridError> {
        let edge = self.edge(id)?.clone();
        for (node, side) in [
            (edge.start, Side::forward(edge.orientation)),
            (edge.end, Side::backward(edge.orientation)),
        ] {
            let slot = self.node_mut(node)?.slot_mut(side);
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.edge_index.remove(&(edge.start, edge.end));
        self.edges[id.0] = None;
        Ok(edge)
    }

    /// Drop a node together with every edge attached to it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GridError> {
        let attached: Vec<EdgeId> = self.node(id)?.edges().map(|(_, e)| e).collect();
        for edge in attached {
            self.remove_edge(edge)?;
        }
        let node = self.nodes[id.0].take().ok_or(GridError::UnknownNode(id))?;
        self.node_index.remove(&node.position);
        Ok(node)
    }

    /// Point an edge's end at a different node further along the same axis.
    ///
    /// The caller is responsible for the slots of the old and new end nodes.
    pub(crate) fn retarget_end(&mut self, edge: EdgeId, new_end: NodeId) -> Result<(), GridError> {
        let (start, old_end) = {
            let e = self.edge(edge)?;
            (e.start, e.end)
        };
        self.edge_index.remove(&(start, old_end));
        self.edge_index.insert((start, new_end), edge);
        self.edge_mut(edge)?.end = new_end;
        Ok(())
    }

    pub(crate) fn set_disabled(&mut self, edge: EdgeId, disabled: bool) -> Result<(), GridError> {
        self.edge_mut(edge)?.disabled = disabled;
        Ok(())
    }

    /// Replace every node position at once.
    ///
    /// `positions` must be collision free; the point index is rebuilt.
    pub(crate) fn reposition(&mut self, positions: &[(NodeId, Point)]) -> Result<(), GridError> {
        for &(id, p) in positions {
            self.node_mut(id)?.position = p;
        }
        self.node_index = self.nodes().map(|(id, n)| (n.position, id)).collect();
        Ok(())
    }

    // --- Construction ---

    /// Build a uniform grid of `rows` x `cols` cells of `cell_size` pixels.
    ///
    /// Shared edges between adjacent cells are created exactly once through
    /// coordinate-equality dedup. The whole grid must lie within
    /// [`COORDINATE_LIMIT`] of the origin on both axes.
    pub fn create_table(
        &mut self,
        origin_x: i32,
        origin_y: i32,
        rows: usize,
        cols: usize,
        cell_size: i32,
    ) -> Result<(), GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidDimensions(format!(
                "a table needs at least one row and one column, got {rows}x{cols}"
            )));
        }
        if cell_size <= 0 {
            return Err(GridError::InvalidDimensions(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }

        let in_range = |v: i32| (-COORDINATE_LIMIT..=COORDINATE_LIMIT).contains(&v);
        let fits = |origin: i32, count: usize| {
            i32::try_from(count).ok().filter(|&n| {
                in_range(origin)
                    && n.checked_mul(cell_size)
                        .and_then(|span| span.checked_add(origin))
                        .is_some_and(in_range)
            })
        };
        let (Some(row_count), Some(col_count)) = (fits(origin_y, rows), fits(origin_x, cols))
        else {
            return Err(GridError::InvalidDimensions(format!(
                "{rows}x{cols} cells of {cell_size} px from ({origin_x}, {origin_y}) \
                 exceed the coordinate range"
            )));
        };

        for row in 0..row_count {
            for col in 0..col_count {
                let x = origin_x + col * cell_size;
                let y = origin_y + row * cell_size;
                let tl = Point::new(x, y);
                let tr = Point::new(x + cell_size, y);
                let bl = Point::new(x, y + cell_size);
                let br = Point::new(x + cell_size, y + cell_size);
                self.link_points(tl, tr)?;
                self.link_points(tr, br)?;
                self.link_points(bl, br)?;
                self.link_points(tl, bl)?;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows,
            cols,
            cell_size,
            nodes = self.node_count(),
            edges = self.edge_count(),
            "created uniform grid"
        );

        self.recompute_extents();
        Ok(())
    }

    // --- Line traversal ---

    /// The collinear chain of nodes through `node` along `orientation`,
    /// ordered by increasing coordinate.
    pub fn line_nodes(&self, node: NodeId, orientation: Orientation) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cur = node;
        while let Some(prev) = self.neighbor(cur, Side::backward(orientation)) {
            chain.push(prev);
            cur = prev;
        }
        chain.reverse();
        chain.push(node);
        cur = node;
        while let Some(next) = self.neighbor(cur, Side::forward(orientation)) {
            chain.push(next);
            cur = next;
        }
        chain
    }

    /// The collinear chain of edges through `edge`, ordered by increasing coordinate.
    pub fn line_edges(&self, edge: EdgeId) -> Result<Vec<EdgeId>, GridError> {
        let e = self.edge(edge)?;
        let forward = Side::forward(e.orientation);
        let nodes = self.line_nodes(e.start, e.orientation);
        Ok(nodes
            .iter()
            .filter_map(|&n| self.node(n).ok()?.edge(forward))
            .collect())
    }

    // --- Classification ---

    /// An edge on the outer border: no part of its line has a neighbor on one side.
    pub fn is_boundary_edge(&self, id: EdgeId) -> bool {
        let Ok(edge) = self.edge(id) else {
            return false;
        };
        let (lesser, greater) = Side::across(edge.orientation);
        let line = self.line_nodes(edge.start, edge.orientation);
        let has = |side: Side| {
            line.iter()
                .any(|&n| self.node(n).is_ok_and(|n| n.edge(side).is_some()))
        };
        !(has(lesser) && has(greater))
    }

    /// A node missing at least two of its four slots.
    pub fn is_boundary_node(&self, id: NodeId) -> bool {
        self.node(id).is_ok_and(|n| n.degree() <= 2)
    }

    /// A node where two perpendicular edges are both disabled, i.e. a node
    /// inside a merged multi-cell region.
    pub fn is_complex_node(&self, id: NodeId) -> bool {
        let Ok(node) = self.node(id) else {
            return false;
        };
        let disabled = |side: Side| {
            node.edge(side)
                .and_then(|e| self.edge(e).ok())
                .is_some_and(Edge::is_disabled)
        };
        (disabled(Side::Top) || disabled(Side::Bottom))
            && (disabled(Side::Left) || disabled(Side::Right))
    }

    // --- Derived state ---

    /// Corner nodes as of the last structural change.
    pub fn extents(&self) -> Option<Extents> {
        self.extents
    }

    /// Recompute the four corner nodes from all nodes.
    ///
    /// Each corner is the node closest (Manhattan distance) to the matching
    /// corner of the node bounding box, so irregular outlines still resolve.
    pub fn recompute_extents(&mut self) -> Option<Extents> {
        self.extents = self.node_bounds().map(|b| {
            let nearest = |corner: Point| {
                self.nodes()
                    .min_by_key(|(id, n)| {
                        let d = (i64::from(n.x()) - i64::from(corner.x)).abs()
                            + (i64::from(n.y()) - i64::from(corner.y)).abs();
                        (d, *id)
                    })
                    .map(|(id, _)| id)
                    .unwrap_or(NodeId(0))
            };
            Extents {
                top_left: nearest(Point::new(b.x0, b.top)),
                top_right: nearest(Point::new(b.x1, b.top)),
                bottom_left: nearest(Point::new(b.x0, b.bottom)),
                bottom_right: nearest(Point::new(b.x1, b.bottom)),
            }
        });
        self.extents
    }

    /// Tight box around every node.
    pub fn node_bounds(&self) -> Option<BBox> {
        self.nodes()
            .map(|(_, n)| BBox::new(n.x(), n.y(), n.x(), n.y()))
            .reduce(|a, b| a.union(&b))
    }

    /// Node bounding box padded by the configured margin.
    pub fn bbox(&self) -> Option<BBox> {
        self.node_bounds().map(|b| b.pad(self.settings.bbox_margin))
    }

    /// Describe every violated structural invariant; empty for a consistent graph.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (id, edge) in self.edges() {
            let (Ok(start), Ok(end)) = (self.node(edge.start), self.node(edge.end)) else {
                issues.push(format!("{id} references a removed node"));
                continue;
            };
            match Orientation::between(start.position, end.position) {
                Some(o) if o == edge.orientation => {}
                _ => issues.push(format!("{id} orientation does not match its endpoints")),
            }
            if start.position >= end.position {
                issues.push(format!("{id} start does not precede end"));
            }
            if start.edge(Side::forward(edge.orientation)) != Some(id) {
                issues.push(format!("{id} is not wired into {}", edge.start));
            }
            if end.edge(Side::backward(edge.orientation)) != Some(id) {
                issues.push(format!("{id} is not wired into {}", edge.end));
            }
            if self.edge_index.get(&(edge.start, edge.end)) != Some(&id) {
                issues.push(format!("{id} is missing from the edge index"));
            }
            if edge.disabled && self.is_boundary_edge(id) {
                issues.push(format!("{id} is a disabled boundary edge"));
            }
        }

        for (id, node) in self.nodes() {
            if self.node_index.get(&node.position) != Some(&id) {
                issues.push(format!("{id} is missing from the point index"));
            }
            if node.degree() < 2 {
                issues.push(format!("{id} has {} edge(s)", node.degree()));
            }
            for (side, e) in node.edges() {
                match self.edge(e) {
                    Ok(edge) => {
                        let expected = if side == Side::forward(side.orientation()) {
                            edge.start
                        } else {
                            edge.end
                        };
                        if edge.orientation != side.orientation() || expected != id {
                            issues.push(format!("{id} {side:?} slot holds mismatched {e}"));
                        }
                    }
                    Err(_) => issues.push(format!("{id} {side:?} slot holds removed {e}")),
                }
            }
        }

        issues
    }
}
