//! Error and warning types for tablegrid.
//!
//! Provides [`GridError`] for operations that cannot be applied to a grid,
//! [`ReconcileWarning`] for non-fatal issues found while reconciling detector
//! output, and [`ReconcileResult`] for pairing a value with collected warnings.

use std::fmt;

use crate::geometry::Point;
use crate::graph::{EdgeId, NodeId};

/// Fatal error types for grid operations.
///
/// A grid operation either applies completely or returns one of these
/// without touching the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// An edge was requested between two points sharing neither x nor y.
    NotAxisAligned { start: Point, end: Point },
    /// An edge was requested between a point and itself.
    DegenerateEdge(Point),
    /// A split fraction outside the open interval (0, 1), or NaN.
    InvalidSplitFraction(f64),
    /// The node id does not refer to a live node.
    UnknownNode(NodeId),
    /// The edge id does not refer to a live edge.
    UnknownEdge(EdgeId),
    /// Linking would replace a different edge already wired into a node slot.
    SlotOccupied {
        /// The node whose slot is taken.
        node: NodeId,
        /// The edge currently occupying the slot.
        existing: EdgeId,
    },
    /// The operation requires an edge on the outer border of the table.
    NotBoundaryEdge(EdgeId),
    /// A scale factor that would collapse or mirror the grid.
    InvalidScale { dx: f64, dy: f64 },
    /// Grid dimensions that cannot produce any cell.
    InvalidDimensions(String),
    /// Two cell corners that do not share a grid line.
    NotAdjacent(NodeId, NodeId),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::NotAxisAligned { start, end } => write!(
                f,
                "edges can only be horizontal or vertical: ({}, {}) -> ({}, {})",
                start.x, start.y, end.x, end.y
            ),
            GridError::DegenerateEdge(p) => {
                write!(f, "edge endpoints coincide at ({}, {})", p.x, p.y)
            }
            GridError::InvalidSplitFraction(n) => {
                write!(f, "split fraction must lie strictly between 0 and 1, got {n}")
            }
            GridError::UnknownNode(id) => write!(f, "unknown node {id}"),
            GridError::UnknownEdge(id) => write!(f, "unknown edge {id}"),
            GridError::SlotOccupied { node, existing } => {
                write!(f, "node {node} is already linked through edge {existing}")
            }
            GridError::NotBoundaryEdge(id) => write!(f, "edge {id} is not on the table border"),
            GridError::InvalidScale { dx, dy } => {
                write!(f, "scale factors must stay above -1, got ({dx}, {dy})")
            }
            GridError::InvalidDimensions(msg) => write!(f, "invalid dimensions: {msg}"),
            GridError::NotAdjacent(a, b) => write!(f, "cells at {a} and {b} are not adjacent"),
        }
    }
}

impl std::error::Error for GridError {}

/// Machine-readable code for categorizing reconciliation issues.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum ReconcileWarningCode {
    /// Two detector cells started in the same grid slot; the later one was dropped.
    DuplicateCell,
    /// A detector cell started inside a slot already covered by a spanning cell.
    SubmergedCell,
    /// A detector cell's reported size disagreed with its neighbors and was refitted.
    SpanRefitted,
    /// The response carried no usable cells.
    EmptyResponse,
    /// Image dimensions were missing or zero; the scale ratio fell back to 1.
    ScaleFallback,
    /// A detector cell had no area, lay outside the usable coordinate range,
    /// or started on the last grid line; it was dropped.
    DegenerateCell,
    /// Any other warning not covered by specific variants.
    Other(String),
}

impl ReconcileWarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &str {
        match self {
            ReconcileWarningCode::DuplicateCell => "DUPLICATE_CELL",
            ReconcileWarningCode::SubmergedCell => "SUBMERGED_CELL",
            ReconcileWarningCode::SpanRefitted => "SPAN_REFITTED",
            ReconcileWarningCode::EmptyResponse => "EMPTY_RESPONSE",
            ReconcileWarningCode::ScaleFallback => "SCALE_FALLBACK",
            ReconcileWarningCode::DegenerateCell => "DEGENERATE_CELL",
            ReconcileWarningCode::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for ReconcileWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal issue encountered during reconciliation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReconcileWarning {
    /// Machine-readable warning code.
    pub code: ReconcileWarningCode,
    /// Human-readable description of the warning.
    pub description: String,
    /// Detector id of the cell involved, if any.
    pub cell_id: Option<i64>,
}

impl ReconcileWarning {
    /// Create a warning with a specific code and description.
    pub fn with_code(code: ReconcileWarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            cell_id: None,
        }
    }

    /// Create a warning attached to a detector cell.
    pub fn for_cell(
        code: ReconcileWarningCode,
        description: impl Into<String>,
        cell_id: i64,
    ) -> Self {
        Self {
            code,
            description: description.into(),
            cell_id: Some(cell_id),
        }
    }
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(id) = self.cell_id {
            write!(f, " [cell {id}]")?;
        }
        Ok(())
    }
}

/// Result wrapper that pairs a value with collected warnings.
#[derive(Debug, Clone)]
pub struct ReconcileResult<T> {
    /// The reconciled value.
    pub value: T,
    /// Warnings collected along the way.
    pub warnings: Vec<ReconcileWarning>,
}

impl<T> ReconcileResult<T> {
    /// Create a result with no warnings.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Create a result with warnings.
    pub fn with_warnings(value: T, warnings: Vec<ReconcileWarning>) -> Self {
        Self { value, warnings }
    }

    /// Returns true if there are no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Transform the value while preserving warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReconcileResult<U> {
        ReconcileResult {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
