//! tablegrid: Edit table layouts as a grid graph and reconcile detector output into it.
//!
//! This is the public API facade. It re-exports the graph, operators and
//! reconciliation pipeline from tablegrid-core and adds the detector wire
//! format, a [`Session`] that owns tables and guards against stale detector
//! responses, and (with the `http` feature) a blocking [`DetectorClient`].
//!
//! # Architecture
//!
//! - **tablegrid-core**: Grid graph, structural operators, reconciliation
//! - **tablegrid** (this crate): Wire format, session, detector client

#[cfg(feature = "http")]
mod client;
mod config;
mod error;
mod session;
pub mod wire;

pub use tablegrid_core;
pub use tablegrid_core::{
    BBox, Cell, Crop, DetectorCell, DetectorOutput, Edge, EdgeId, Extents, GridError,
    GridSettings, MergeOutcome, Node, NodeId, Orientation, Point, ReconcileResult,
    ReconcileSettings, ReconcileWarning, ReconcileWarningCode, ReconciledGrid, Reconciler, Side,
    SvgOptions, SvgRenderer, Table,
};

#[cfg(feature = "http")]
pub use client::DetectorClient;
pub use config::{DetectorConfig, ENV_DETECTOR_TIMEOUT, ENV_DETECTOR_URL};
pub use error::{Error, Result};
pub use session::{DetectionOutcome, DetectionTicket, Session, TableId};
pub use wire::{DetectionRequest, DetectorResponse, WireCell, WireTable};

/// Parse a detector response body and reconcile its first table.
///
/// Convenience for one-shot use without a [`Session`].
pub fn reconcile_json(
    body: &str,
    settings: ReconcileSettings,
) -> Result<ReconcileResult<ReconciledGrid>> {
    let response = DetectorResponse::parse(body)?;
    let settings = ReconcileSettings {
        hybrid: settings.hybrid || response.is_hybrid(),
        ..settings
    };
    let output = response
        .tables()
        .first()
        .map(WireTable::to_output)
        .unwrap_or_default();
    Ok(Reconciler::new(settings).reconcile(&output))
}
