use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use tablegrid::{
    DetectorResponse, ReconcileResult, ReconcileSettings, ReconcileWarning, ReconciledGrid,
    Reconciler, SvgOptions, SvgRenderer, Table, WireTable,
};

use crate::cli::{OutputArgs, OutputFormat};

/// A table ready to print, with the reconciliation it came from if any.
pub struct Rendered<'a> {
    pub table: &'a Table,
    pub grid: Option<&'a ReconciledGrid>,
    pub warnings: &'a [ReconcileWarning],
}

/// Read a file with a user-friendly error message.
pub fn read_file(file: &Path) -> Result<String, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    std::fs::read_to_string(file).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", file.display());
        1
    })
}

/// Parse a detector response file and reconcile its first table.
pub fn reconcile_file(
    file: &Path,
    settings: ReconcileSettings,
) -> Result<(Table, ReconcileResult<ReconciledGrid>), i32> {
    let body = read_file(file)?;
    let response = DetectorResponse::parse(&body).map_err(|e| {
        eprintln!("Error: failed to parse {}: {e}", file.display());
        1
    })?;
    reconcile_response(&response, settings)
}

/// Reconcile the first table of a parsed response and build its grid.
pub fn reconcile_response(
    response: &DetectorResponse,
    settings: ReconcileSettings,
) -> Result<(Table, ReconcileResult<ReconciledGrid>), i32> {
    let settings = ReconcileSettings {
        hybrid: settings.hybrid || response.is_hybrid(),
        ..settings
    };
    if response.tables().len() > 1 {
        tracing::info!(
            tables = response.tables().len(),
            "response has several tables, using the first"
        );
    }
    let output = response
        .tables()
        .first()
        .map(WireTable::to_output)
        .unwrap_or_default();
    let reconciler = Reconciler::new(settings);
    let result = reconciler.reconcile(&output);
    let table = reconciler.build_table(&result.value).map_err(|e| {
        eprintln!("Error: failed to build grid: {e}");
        1
    })?;
    Ok((table, result))
}

/// Write `rendered` in the requested format to stdout or the output file.
pub fn emit(rendered: &Rendered<'_>, output: &OutputArgs) -> Result<(), i32> {
    let text = match output.format {
        OutputFormat::Text => to_text(rendered),
        OutputFormat::Json => to_json(rendered)?,
        OutputFormat::Svg => SvgRenderer::new(rendered.table).to_svg(&SvgOptions::default()),
    };

    if output.format != OutputFormat::Json {
        for warning in rendered.warnings {
            eprintln!("Warning: {warning}");
        }
    }

    match &output.output {
        Some(path) => std::fs::write(path, text).map_err(|e| {
            eprintln!("Error: failed to write {}: {e}", path.display());
            1
        }),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| {
                    eprintln!("Error: failed to write output: {e}");
                    1
                })
        }
    }
}

fn to_text(rendered: &Rendered<'_>) -> String {
    let table = rendered.table;
    let cells = table.cells();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "nodes: {}, edges: {}, cells: {}",
        table.node_count(),
        table.edge_count(),
        cells.len()
    );
    if let Some(b) = table.bbox() {
        let _ = writeln!(out, "bbox: [{}, {}, {}, {}]", b.x0, b.top, b.x1, b.bottom);
    }
    if let Some(grid) = rendered.grid {
        let _ = writeln!(
            out,
            "grid: {} rows x {} columns, {} submerged",
            grid.row_count(),
            grid.column_count(),
            grid.submerged.len()
        );
    }

    for cell in &cells {
        let _ = writeln!(
            out,
            "cell {:>3}: row {} col {} span {}x{} at ({}, {}) size {}x{}",
            cell.id,
            cell.row,
            cell.column,
            cell.rows,
            cell.columns,
            cell.x,
            cell.y,
            cell.width,
            cell.height
        );
    }
    out
}

fn to_json(rendered: &Rendered<'_>) -> Result<String, i32> {
    let table = rendered.table;
    let value = serde_json::json!({
        "nodes": table.node_count(),
        "edges": table.edge_count(),
        "bbox": table.bbox(),
        "cells": table.cells(),
        "grid": rendered.grid,
        "warnings": rendered.warnings,
    });
    serde_json::to_string_pretty(&value)
        .map(|mut s| {
            s.push('\n');
            s
        })
        .map_err(|e| {
            eprintln!("Error: failed to encode JSON: {e}");
            1
        })
}
