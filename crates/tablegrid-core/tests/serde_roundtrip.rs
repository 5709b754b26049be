//! Serde serialization/deserialization round-trip tests.
//!
//! These tests verify that the public data types can be serialized to JSON
//! and deserialized back, producing equal values.

#![cfg(feature = "serde")]

use tablegrid_core::*;

/// Helper: serialize to JSON string, deserialize back, assert equality.
fn roundtrip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
}

// --- Geometry types ---

#[test]
fn test_serde_point() {
    roundtrip(&Point::new(-3, 14));
}

#[test]
fn test_serde_orientation() {
    roundtrip(&Orientation::Horizontal);
    roundtrip(&Orientation::Vertical);
}

#[test]
fn test_serde_bbox() {
    roundtrip(&BBox::new(10, 20, 300, 400));
}

// --- Graph types ---

#[test]
fn test_serde_ids_are_plain_numbers() {
    roundtrip(&NodeId(4));
    roundtrip(&EdgeId(9));
    assert_eq!(serde_json::to_string(&NodeId(4)).unwrap(), "4");
}

#[test]
fn test_serde_grid_settings() {
    roundtrip(&GridSettings::default());
}

#[test]
fn test_serde_extents() {
    let table = Table::grid(GridSettings::default(), 0, 0, 1, 1, 10).unwrap();
    roundtrip(&table.extents().unwrap());
}

#[test]
fn test_serde_merge_outcome() {
    roundtrip(&MergeOutcome {
        toggled: 2,
        dissolved: 3,
    });
}

// --- Cells ---

#[test]
fn test_serde_cell() {
    roundtrip(&Cell {
        id: 12,
        row: 1,
        column: 2,
        rows: 1,
        columns: 3,
        x: 100,
        y: 50,
        width: 300,
        height: 40,
        is_new_cell: true,
        is_submerged: false,
    });
}

#[test]
fn test_serde_crop() {
    roundtrip(&Crop::new(1, 2, 3, 4));
}

// --- Reconciliation ---

#[test]
fn test_serde_reconcile_settings() {
    roundtrip(&ReconcileSettings {
        tolerance: 4,
        canvas_width: 800,
        canvas_height: 600,
        image_width: 1600,
        image_height: 1200,
        hybrid: true,
        grid: GridSettings::default(),
    });
}

#[test]
fn test_serde_detector_output() {
    roundtrip(&DetectorOutput {
        cells: vec![DetectorCell {
            id: 1,
            x: 0.5,
            y: 1.0,
            width: 20.0,
            height: 10.0,
        }],
        x_cords: vec![0.0, 20.5],
        y_cords: vec![1.0, 11.0],
    });
}

#[test]
fn test_serde_reconciled_grid() {
    let out = DetectorOutput {
        cells: vec![DetectorCell {
            id: 1,
            x: 0.0,
            y: 0.0,
            width: 50.0,
            height: 50.0,
        }],
        ..DetectorOutput::default()
    };
    roundtrip(&Reconciler::default().reconcile(&out).value);
}

#[test]
fn test_serde_warning_codes() {
    roundtrip(&ReconcileWarningCode::DuplicateCell);
    roundtrip(&ReconcileWarningCode::SpanRefitted);
    roundtrip(&ReconcileWarningCode::DegenerateCell);
    roundtrip(&ReconcileWarningCode::Other("custom".to_string()));
}

#[test]
fn test_serde_warning() {
    roundtrip(&ReconcileWarning::for_cell(
        ReconcileWarningCode::SubmergedCell,
        "cell starts inside a spanning cell",
        7,
    ));
}
