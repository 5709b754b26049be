use std::path::Path;

use serde::Deserialize;
use tablegrid::{EdgeId, GridError, NodeId, Point, Table};

use crate::cli::{OutputArgs, ReconcileArgs};
use crate::shared::{Rendered, emit, read_file, reconcile_file};

/// One step of an edit script. Nodes and edges are addressed by position
/// (`[x, y]`) since ids are not stable across runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddLink {
        from: [i32; 2],
        to: [i32; 2],
    },
    Split {
        from: [i32; 2],
        to: [i32; 2],
        #[serde(default = "half")]
        at: f64,
    },
    RecursiveSplit {
        from: [i32; 2],
        to: [i32; 2],
        #[serde(default = "half")]
        at: f64,
    },
    Disable {
        from: [i32; 2],
        to: [i32; 2],
        #[serde(default = "yes")]
        flag: bool,
    },
    DisableLine {
        from: [i32; 2],
        to: [i32; 2],
        #[serde(default = "yes")]
        flag: bool,
    },
    Dissolve {
        node: [i32; 2],
    },
    Merge {
        a: [i32; 2],
        b: [i32; 2],
    },
    Unmerge {
        a: [i32; 2],
        b: [i32; 2],
    },
    Extend {
        from: [i32; 2],
        to: [i32; 2],
        #[serde(default)]
        offset: i32,
    },
    Scale {
        dx: f64,
        dy: f64,
        #[serde(default)]
        origin: [i32; 2],
    },
    MoveLine {
        from: [i32; 2],
        to: [i32; 2],
        coordinate: i32,
    },
    RemoveEdge {
        from: [i32; 2],
        to: [i32; 2],
    },
}

fn half() -> f64 {
    0.5
}

fn yes() -> bool {
    true
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddLink { .. } => "add_link",
            Operation::Split { .. } => "split",
            Operation::RecursiveSplit { .. } => "recursive_split",
            Operation::Disable { .. } => "disable",
            Operation::DisableLine { .. } => "disable_line",
            Operation::Dissolve { .. } => "dissolve",
            Operation::Merge { .. } => "merge",
            Operation::Unmerge { .. } => "unmerge",
            Operation::Extend { .. } => "extend",
            Operation::Scale { .. } => "scale",
            Operation::MoveLine { .. } => "move_line",
            Operation::RemoveEdge { .. } => "remove_edge",
        }
    }
}

pub fn run(
    script: &Path,
    response: Option<&Path>,
    uniform: (usize, usize, i32),
    reconcile: &ReconcileArgs,
    output: &OutputArgs,
) -> Result<(), i32> {
    let ops = parse_script(&read_file(script)?).map_err(|e| {
        eprintln!("Error: invalid script {}: {e}", script.display());
        1
    })?;

    let (mut table, warnings) = match response {
        Some(file) => {
            let (table, result) = reconcile_file(file, reconcile.to_settings())?;
            (table, result.warnings)
        }
        None => {
            let (rows, cols, cell_size) = uniform;
            let table = Table::grid(reconcile.grid.to_settings(), 0, 0, rows, cols, cell_size)
                .map_err(|e| {
                    eprintln!("Error: {e}");
                    1
                })?;
            (table, Vec::new())
        }
    };

    for (i, op) in ops.iter().enumerate() {
        apply(&mut table, op).map_err(|e| {
            eprintln!("Error: operation {} ({}): {e}", i + 1, op.name());
            1
        })?;
        tracing::debug!(
            step = i + 1,
            op = op.name(),
            nodes = table.node_count(),
            edges = table.edge_count(),
            "applied"
        );
    }

    for issue in table.consistency_issues() {
        tracing::warn!(%issue, "grid inconsistent after edits");
    }

    emit(
        &Rendered {
            table: &table,
            grid: None,
            warnings: &warnings,
        },
        output,
    )
}

pub fn parse_script(json: &str) -> Result<Vec<Operation>, serde_json::Error> {
    serde_json::from_str(json)
}

fn point(p: [i32; 2]) -> Point {
    Point::new(p[0], p[1])
}

fn edge(table: &Table, from: [i32; 2], to: [i32; 2]) -> Result<EdgeId, String> {
    table
        .find_edge(point(from), point(to))
        .ok_or_else(|| format!("no edge between {from:?} and {to:?}"))
}

fn node(table: &Table, at: [i32; 2]) -> Result<NodeId, String> {
    table
        .find_node(point(at))
        .ok_or_else(|| format!("no node at {at:?}"))
}

fn grid_err(e: GridError) -> String {
    e.to_string()
}

/// Apply one operation to `table`.
pub fn apply(table: &mut Table, op: &Operation) -> Result<(), String> {
    match *op {
        Operation::AddLink { from, to } => {
            table.add_link(point(from), point(to)).map_err(grid_err)?;
        }
        Operation::Split { from, to, at } => {
            let e = edge(table, from, to)?;
            table.split_edge(e, at).map_err(grid_err)?;
        }
        Operation::RecursiveSplit { from, to, at } => {
            let e = edge(table, from, to)?;
            table.recursive_split(e, at).map_err(grid_err)?;
        }
        Operation::Disable { from, to, flag } => {
            let e = edge(table, from, to)?;
            if !table.disable(e, flag).map_err(grid_err)? {
                tracing::info!(?from, ?to, "boundary edge left unchanged");
            }
        }
        Operation::DisableLine { from, to, flag } => {
            let e = edge(table, from, to)?;
            table.disable_line(e, flag).map_err(grid_err)?;
        }
        Operation::Dissolve { node: at } => {
            let n = node(table, at)?;
            table.dissolve(n).map_err(grid_err)?;
        }
        Operation::Merge { a, b } => {
            let (a, b) = (node(table, a)?, node(table, b)?);
            table.merge_cells(a, b).map_err(grid_err)?;
        }
        Operation::Unmerge { a, b } => {
            let (a, b) = (node(table, a)?, node(table, b)?);
            table.unmerge_cells(a, b).map_err(grid_err)?;
        }
        Operation::Extend { from, to, offset } => {
            let e = edge(table, from, to)?;
            table.extend_duplicate(e, offset).map_err(grid_err)?;
        }
        Operation::Scale { dx, dy, origin } => {
            table
                .scale(dx, dy, origin[0], origin[1])
                .map_err(grid_err)?;
        }
        Operation::MoveLine {
            from,
            to,
            coordinate,
        } => {
            let e = edge(table, from, to)?;
            let applied = table.move_line(e, coordinate).map_err(grid_err)?;
            if applied != coordinate {
                tracing::info!(requested = coordinate, applied, "line move clamped");
            }
        }
        Operation::RemoveEdge { from, to } => {
            let e = edge(table, from, to)?;
            table.remove_edge(e).map_err(grid_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegrid::GridSettings;

    fn grid(rows: usize, cols: usize) -> Table {
        Table::grid(GridSettings::default(), 0, 0, rows, cols, 50).unwrap()
    }

    #[test]
    fn parse_script_with_defaults() {
        let ops = parse_script(
            r#"[{"op":"split","from":[0,0],"to":[50,0]},
                {"op":"disable","from":[50,0],"to":[50,50]},
                {"op":"scale","dx":1.0,"dy":0.5}]"#,
        )
        .unwrap();
        assert_eq!(
            ops[0],
            Operation::Split {
                from: [0, 0],
                to: [50, 0],
                at: 0.5
            }
        );
        assert_eq!(
            ops[1],
            Operation::Disable {
                from: [50, 0],
                to: [50, 50],
                flag: true
            }
        );
        assert_eq!(
            ops[2],
            Operation::Scale {
                dx: 1.0,
                dy: 0.5,
                origin: [0, 0]
            }
        );
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(parse_script(r#"[{"op":"explode"}]"#).is_err());
    }

    #[test]
    fn merge_then_unmerge() {
        let mut table = grid(1, 2);
        apply(&mut table, &Operation::Merge { a: [0, 0], b: [50, 0] }).unwrap();
        assert_eq!(table.cells().len(), 1);
        assert_eq!(table.node_count(), 4);

        let mut table = grid(2, 2);
        apply(
            &mut table,
            &Operation::Disable {
                from: [50, 0],
                to: [50, 50],
                flag: true,
            },
        )
        .unwrap();
        assert_eq!(table.cells().len(), 3);
        apply(&mut table, &Operation::Unmerge { a: [0, 0], b: [50, 0] }).unwrap();
        assert_eq!(table.cells().len(), 4);
    }

    #[test]
    fn missing_edge_names_the_points() {
        let mut table = grid(1, 1);
        let err = apply(
            &mut table,
            &Operation::Split {
                from: [0, 0],
                to: [10, 0],
                at: 0.5,
            },
        )
        .unwrap_err();
        assert_eq!(err, "no edge between [0, 0] and [10, 0]");
    }

    #[test]
    fn grid_errors_are_reported() {
        let mut table = grid(1, 1);
        let err = apply(
            &mut table,
            &Operation::Split {
                from: [0, 0],
                to: [50, 0],
                at: 1.5,
            },
        )
        .unwrap_err();
        assert!(err.contains("1.5"));
    }
}
