//! tablegrid-core: Grid graph data types and algorithms for table layouts.
//!
//! This crate provides the planar grid graph ([`Table`] with its [`Node`]s
//! and [`Edge`]s), the structural operators that edit it (split, disable,
//! dissolve, extend, scale), and the reconciliation pipeline that turns
//! detector-reported cell rectangles into a regular grid. It has no required
//! external dependencies; `serde` and `tracing` are optional features.

pub mod cell;
pub mod error;
mod extend;
pub mod geometry;
pub mod graph;
mod merge;
pub mod reconcile;
mod regions;
mod select;
mod split;
pub mod svg;
mod transform;

pub use cell::{Cell, Crop};
pub use error::{GridError, ReconcileResult, ReconcileWarning, ReconcileWarningCode};
pub use geometry::{BBox, COORDINATE_LIMIT, Orientation, Point};
pub use graph::{Edge, EdgeId, Extents, GridSettings, Node, NodeId, Side, Table};
pub use merge::MergeOutcome;
pub use reconcile::{
    DetectorCell, DetectorOutput, ReconcileSettings, ReconciledGrid, Reconciler,
    collapse_coordinates, is_close,
};
pub use svg::{SvgOptions, SvgRenderer};
