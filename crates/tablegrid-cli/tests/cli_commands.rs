//! Integration tests for the tablegrid binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cmd() -> Command {
    Command::cargo_bin("tablegrid").unwrap()
}

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Three cells forming an "L"; the missing corner is synthesized.
const L_RESPONSE: &str = r#"[{"cells":[
    {"id":1,"x-cord":0,"y-cord":0,"width":100,"height":100},
    {"id":2,"x-cord":100,"y-cord":0,"width":100,"height":100},
    {"id":3,"x-cord":0,"y-cord":100,"width":100,"height":100}
],"xCords":[],"yCords":[]}]"#;

// --- grid ---

#[test]
fn grid_text_summary() {
    cmd()
        .args(["grid", "--rows", "2", "--cols", "3", "--cell-size", "10"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("nodes: 12, edges: 17, cells: 6"));
}

#[test]
fn grid_json_output_is_valid() {
    let output = cmd()
        .args(["grid", "--rows", "1", "--cols", "2", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["edges"], 7);
    assert_eq!(value["cells"].as_array().unwrap().len(), 2);
    assert_eq!(value["cells"][1]["x"], 50);
}

#[test]
fn grid_svg_output() {
    cmd()
        .args(["grid", "--format", "svg"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<svg"))
        .stdout(predicate::str::contains("<line"));
}

#[test]
fn grid_zero_rows_fails() {
    cmd()
        .args(["grid", "--rows", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn grid_beyond_coordinate_range_fails() {
    cmd()
        .args(["grid", "--rows", "1", "--cols", "30000", "--cell-size", "100000"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("exceed the coordinate range"));
}

#[test]
fn grid_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.svg");
    cmd()
        .args(["grid", "--format", "svg", "-o"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let svg = std::fs::read_to_string(&path).unwrap();
    assert!(svg.contains("</svg>"));
}

// --- reconcile ---

#[test]
fn reconcile_l_response() {
    let file = write_temp(L_RESPONSE);
    cmd()
        .arg("reconcile")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nodes: 9, edges: 12, cells: 4"))
        .stdout(predicate::str::contains("grid: 2 rows x 2 columns, 0 submerged"));
}

#[test]
fn reconcile_json_reports_synthesized_cell() {
    let file = write_temp(L_RESPONSE);
    let output = cmd()
        .arg("reconcile")
        .arg(file.path())
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let cells = value["grid"]["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 4);
    assert_eq!(cells[3]["is_new_cell"], true);
    assert_eq!(cells[3]["id"], 4);
    assert_eq!(value["grid"]["x_cords"], serde_json::json!([0, 100, 200]));
}

#[test]
fn reconcile_duplicate_warns_on_stderr() {
    let file = write_temp(
        r#"[{"cells":[
            {"id":1,"x-cord":0,"y-cord":0,"width":50,"height":50},
            {"id":2,"x-cord":1,"y-cord":1,"width":50,"height":50}
        ]}]"#,
    );
    cmd()
        .arg("reconcile")
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning: [DUPLICATE_CELL]"));
}

#[test]
fn reconcile_out_of_range_cell_warns() {
    let file = write_temp(
        r#"[{"cells":[
            {"id":1,"x-cord":0,"y-cord":0,"width":50,"height":50},
            {"id":2,"x-cord":2e9,"y-cord":0,"width":2e9,"height":50}
        ]}]"#,
    );
    cmd()
        .arg("reconcile")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cells: 1"))
        .stderr(predicate::str::contains("Warning: [DEGENERATE_CELL]"))
        .stderr(predicate::str::contains("[cell 2]"));
}

#[test]
fn reconcile_missing_file() {
    cmd()
        .args(["reconcile", "/nonexistent/response.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: file not found"));
}

#[test]
fn reconcile_malformed_json() {
    let file = write_temp("[{\"cells\":");
    cmd()
        .arg("reconcile")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

// --- edit ---

#[test]
fn edit_uniform_grid_with_script() {
    let script = write_temp(
        r#"[
            {"op":"recursive_split","from":[0,0],"to":[50,0],"at":0.5},
            {"op":"merge","a":[0,0],"b":[25,0]}
        ]"#,
    );
    let output = cmd()
        .arg("edit")
        .arg(script.path())
        .args(["--rows", "2", "--cols", "2", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // The split stops at the bottom border, so only the first row gains a
    // cell (5); merging the two halves back leaves 4.
    assert_eq!(value["cells"].as_array().unwrap().len(), 4);
}

#[test]
fn edit_reconciled_response() {
    let response = write_temp(L_RESPONSE);
    let script = write_temp(r#"[{"op":"disable","from":[100,100],"to":[200,100]}]"#);
    cmd()
        .arg("edit")
        .arg(script.path())
        .arg("--response")
        .arg(response.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cells: 3"));
}

#[test]
fn edit_reports_failing_step() {
    let script = write_temp(
        r#"[
            {"op":"scale","dx":0.5,"dy":0.5},
            {"op":"dissolve","node":[13,13]}
        ]"#,
    );
    cmd()
        .arg("edit")
        .arg(script.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: operation 2 (dissolve): no node at [13, 13]"));
}

#[test]
fn edit_rejects_unknown_operation() {
    let script = write_temp(r#"[{"op":"paint"}]"#);
    cmd()
        .arg("edit")
        .arg(script.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid script"));
}

#[test]
fn verbose_logs_to_stderr() {
    cmd()
        .args(["grid", "--verbose"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("built uniform grid"));
}
