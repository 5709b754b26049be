//! JSON wire format spoken by the table detector.
//!
//! Requests carry a small options object next to the image; responses are
//! either a list of tables or, for a crop re-split, a single bare table.

use serde::{Deserialize, Serialize, Serializer};
use tablegrid_core::{Cell, Crop, DetectorCell, DetectorOutput, ReconciledGrid};

use crate::config::DetectorConfig;
use crate::error::{Error, Result};

/// One cell as the detector reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCell {
    #[serde(default)]
    pub row: usize,
    #[serde(default)]
    pub column: usize,
    pub id: i64,
    #[serde(default = "one")]
    pub rows: usize,
    #[serde(default = "one")]
    pub columns: usize,
    #[serde(rename = "x-cord")]
    pub x: f64,
    #[serde(rename = "y-cord")]
    pub y: f64,
    pub height: f64,
    pub width: f64,
}

fn one() -> usize {
    1
}

impl From<&WireCell> for DetectorCell {
    fn from(cell: &WireCell) -> Self {
        DetectorCell {
            id: cell.id,
            x: cell.x,
            y: cell.y,
            width: cell.width,
            height: cell.height,
        }
    }
}

impl From<&Cell> for WireCell {
    fn from(cell: &Cell) -> Self {
        WireCell {
            row: cell.row,
            column: cell.column,
            id: cell.id,
            rows: cell.rows,
            columns: cell.columns,
            x: f64::from(cell.x),
            y: f64::from(cell.y),
            height: f64::from(cell.height),
            width: f64::from(cell.width),
        }
    }
}

/// One table as the detector reports it. `cells` is required, so a service
/// error object is not mistaken for an empty table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireTable {
    pub cells: Vec<WireCell>,
    #[serde(rename = "xCords", default)]
    pub x_cords: Vec<f64>,
    #[serde(rename = "yCords", default)]
    pub y_cords: Vec<f64>,
}

impl WireTable {
    /// Input for the reconciler.
    pub fn to_output(&self) -> DetectorOutput {
        DetectorOutput {
            cells: self.cells.iter().map(DetectorCell::from).collect(),
            x_cords: self.x_cords.clone(),
            y_cords: self.y_cords.clone(),
        }
    }
}

impl From<&ReconciledGrid> for WireTable {
    fn from(grid: &ReconciledGrid) -> Self {
        WireTable {
            cells: grid.cells.iter().map(WireCell::from).collect(),
            x_cords: grid.x_cords.iter().copied().map(f64::from).collect(),
            y_cords: grid.y_cords.iter().copied().map(f64::from).collect(),
        }
    }
}

/// A parsed detector response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DetectorResponse {
    /// Full-page detection: one entry per table found.
    Tables(Vec<WireTable>),
    /// Crop re-split: a single table already in display space.
    Hybrid(WireTable),
}

impl DetectorResponse {
    /// Parse a response body.
    ///
    /// An empty or whitespace-only body, or one that is neither a table nor a
    /// list of tables, is an [`Error::UnexpectedResponse`].
    pub fn parse(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(Error::UnexpectedResponse("empty body".to_string()));
        }
        serde_json::from_str(body).map_err(|e| {
            if e.is_data() {
                Error::UnexpectedResponse(e.to_string())
            } else {
                Error::Json(e)
            }
        })
    }

    pub fn is_hybrid(&self) -> bool {
        matches!(self, DetectorResponse::Hybrid(_))
    }

    pub fn tables(&self) -> &[WireTable] {
        match self {
            DetectorResponse::Tables(tables) => tables,
            DetectorResponse::Hybrid(table) => std::slice::from_ref(table),
        }
    }

    pub fn into_tables(self) -> Vec<WireTable> {
        match self {
            DetectorResponse::Tables(tables) => tables,
            DetectorResponse::Hybrid(table) => vec![table],
        }
    }
}

/// The `data` part of a detection request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRequest {
    #[serde(serialize_with = "as_flag")]
    pub border_table: bool,
    #[serde(serialize_with = "as_flag")]
    pub borderless_table: bool,
    #[serde(rename = "scaleRatio", skip_serializing_if = "Option::is_none")]
    pub scale_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub crops: Vec<[i32; 4]>,
}

// The detector reads its switches as 0/1 integers.
fn as_flag<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

impl DetectionRequest {
    /// Full-page request using the table kinds enabled in `config`.
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            border_table: config.border_table,
            borderless_table: config.borderless_table,
            scale_ratio: None,
            crops: Vec::new(),
        }
    }

    pub fn with_scale_ratio(mut self, ratio: f64) -> Self {
        self.scale_ratio = Some(ratio);
        self
    }

    /// Restrict detection to the given regions; the answer is a hybrid response.
    pub fn with_crops(mut self, crops: &[Crop]) -> Self {
        self.crops = crops.iter().map(Crop::get_crop).collect();
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
