//! Session lifecycle: detection tickets, stale responses, edits in between.

use std::path::PathBuf;

use tablegrid::{
    Crop, DetectionOutcome, DetectorConfig, DetectorResponse, Error, Point, ReconcileSettings,
    Session,
};

fn response(name: &str) -> DetectorResponse {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let body = std::fs::read_to_string(&path).unwrap();
    DetectorResponse::parse(&body).unwrap()
}

#[test]
fn full_page_response_adds_extra_tables() {
    let mut session = Session::default();
    let id = session.create_uniform(0, 0, 1, 1, 10).unwrap();
    let ticket = session.begin_detection(id).unwrap();

    let outcome = session
        .apply_detection(ticket, &response("full_page.json"))
        .unwrap();
    let DetectionOutcome::Applied { added, warnings } = outcome else {
        panic!("response should apply");
    };
    assert_eq!(added.len(), 1);
    assert!(!warnings.is_empty());
    assert_eq!(session.len(), 2);
    assert_eq!(session.table(added[0]).unwrap().cells().len(), 2);
    assert!(session.grid(added[0]).is_some());
}

#[test]
fn superseded_response_is_dropped() {
    let mut session = Session::default();
    let id = session.create_uniform(0, 0, 2, 2, 10).unwrap();

    let first = session.begin_detection(id).unwrap();
    session.cancel_detection(id).unwrap();
    let second = session.begin_detection(id).unwrap();
    assert!(second.sequence > first.sequence);

    let hybrid = response("hybrid.json");
    assert_eq!(
        session.apply_detection(first, &hybrid).unwrap(),
        DetectionOutcome::Dropped
    );
    assert_eq!(session.table(id).unwrap().cells().len(), 4);
    assert_eq!(session.pending(id), Some(second));

    assert!(session.apply_detection(second, &hybrid).unwrap().is_applied());
    assert!(session.table(id).unwrap().find_node(Point::new(110, 70)).is_some());
}

#[test]
fn response_for_removed_table_is_dropped() {
    let mut session = Session::default();
    let id = session.create_uniform(0, 0, 1, 1, 10).unwrap();
    let ticket = session.begin_detection(id).unwrap();
    session.remove_table(id).unwrap();

    let outcome = session
        .apply_detection(ticket, &response("full_page.json"))
        .unwrap();
    assert_eq!(outcome, DetectionOutcome::Dropped);
    assert!(session.is_empty());
}

#[test]
fn applied_ticket_cannot_be_replayed() {
    let mut session = Session::default();
    let id = session.create_uniform(0, 0, 1, 1, 10).unwrap();
    let ticket = session.begin_detection(id).unwrap();
    let hybrid = response("hybrid.json");
    assert!(session.apply_detection(ticket, &hybrid).unwrap().is_applied());
    assert_eq!(
        session.apply_detection(ticket, &hybrid).unwrap(),
        DetectionOutcome::Dropped
    );
}

#[test]
fn edits_while_detection_is_pending() {
    let mut session = Session::default();
    let id = session.create_uniform(0, 0, 2, 2, 100).unwrap();
    let _ticket = session.begin_detection(id).unwrap();

    let table = session.table_mut(id).unwrap();
    let edge = table
        .find_edge(Point::new(0, 0), Point::new(100, 0))
        .unwrap();
    table.recursive_split(edge, 0.5).unwrap();
    assert_eq!(session.table(id).unwrap().cells().len(), 5);

    assert!(matches!(
        session.begin_detection(id),
        Err(Error::DetectionPending(_))
    ));
}

#[test]
fn crop_request_for_table_region() {
    let settings = ReconcileSettings {
        canvas_width: 800,
        canvas_height: 600,
        image_width: 1600,
        image_height: 1200,
        ..ReconcileSettings::default()
    };
    let mut session = Session::new(settings);
    let id = session.create_uniform(20, 20, 2, 2, 50).unwrap();
    let bbox = session.table(id).unwrap().bbox().unwrap();

    let request = session.crop_request(&DetectorConfig::default(), &[Crop::from_bbox(&bbox)]);
    let json = request.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"border_table":1,"borderless_table":0,"scaleRatio":0.5,"crops":[[10,10,130,130]]}"#
    );
}
