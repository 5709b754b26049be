//! Turning detector output into a regular grid.
//!
//! A detector reports an irregular list of cell rectangles. [`Reconciler`]
//! snaps them onto a shared set of row and column coordinates, resolves
//! overlaps, fills uncovered slots with synthesized cells, and finally builds
//! a [`Table`] from the result.

use crate::cell::Cell;
use crate::error::{GridError, ReconcileResult, ReconcileWarning, ReconcileWarningCode};
use crate::geometry::{COORDINATE_LIMIT, Point};
use crate::graph::{GridSettings, Table};

/// Configuration for reconciliation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReconcileSettings {
    /// Coordinates closer than this many pixels are treated as one line.
    pub tolerance: i32,
    /// Width of the display surface; 0 means detector coordinates are used as is.
    pub canvas_width: u32,
    /// Height of the display surface.
    pub canvas_height: u32,
    /// Width of the image the detector saw.
    pub image_width: u32,
    /// Height of the image the detector saw.
    pub image_height: u32,
    /// The response answers a crop re-split and is already in display space.
    pub hybrid: bool,
    /// Settings for the table built from the result.
    pub grid: GridSettings,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            tolerance: 6,
            canvas_width: 0,
            canvas_height: 0,
            image_width: 0,
            image_height: 0,
            hybrid: false,
            grid: GridSettings::default(),
        }
    }
}

impl ReconcileSettings {
    /// Factor mapping image pixels to display pixels.
    ///
    /// `None` when a canvas is configured but the image size is unknown.
    pub fn scale_ratio(&self) -> Option<f64> {
        if self.hybrid || (self.canvas_width == 0 && self.canvas_height == 0) {
            return Some(1.0);
        }
        if self.image_width == 0 || self.image_height == 0 {
            return None;
        }
        let by_height = f64::from(self.canvas_height) / f64::from(self.image_height);
        let by_width = f64::from(self.canvas_width) / f64::from(self.image_width);
        Some(by_height.min(by_width))
    }
}

/// One cell rectangle as reported by the detector, in image pixels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorCell {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Everything the detector returned for one table.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorOutput {
    pub cells: Vec<DetectorCell>,
    /// Column boundaries found by the detector.
    pub x_cords: Vec<f64>,
    /// Row boundaries found by the detector.
    pub y_cords: Vec<f64>,
}

/// Cells on a regular grid together with the grid coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReconciledGrid {
    /// Cells covering every slot exactly once, in row-major order.
    pub cells: Vec<Cell>,
    /// Detector cells dropped because their origin slot was already covered.
    pub submerged: Vec<Cell>,
    /// Column line coordinates, ascending.
    pub x_cords: Vec<i32>,
    /// Row line coordinates, ascending.
    pub y_cords: Vec<i32>,
}

impl ReconciledGrid {
    pub fn row_count(&self) -> usize {
        self.y_cords.len().saturating_sub(1)
    }

    pub fn column_count(&self) -> usize {
        self.x_cords.len().saturating_sub(1)
    }
}

/// Whether two coordinates are within `tolerance` of each other.
pub fn is_close(a: i32, b: i32, tolerance: i32) -> bool {
    (a - b).abs() <= tolerance
}

/// Collapse near-duplicate coordinates.
///
/// Values are sorted and clustered: a value joins the current cluster while
/// it lies within `tolerance` of the cluster's first value. Each cluster is
/// replaced by its rounded mean.
pub fn collapse_coordinates(values: &[i32], tolerance: i32) -> Vec<i32> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mut collapsed = Vec::new();
    let mut cluster_start = 0;
    for i in 1..=sorted.len() {
        let end_of_cluster =
            i == sorted.len() || !is_close(sorted[i], sorted[cluster_start], tolerance);
        if end_of_cluster {
            let cluster = &sorted[cluster_start..i];
            let sum: i64 = cluster.iter().map(|&v| i64::from(v)).sum();
            let mean = (sum as f64 / cluster.len() as f64).round() as i32;
            collapsed.push(mean);
            cluster_start = i;
        }
    }
    collapsed.dedup();
    collapsed
}

/// Index of the coordinate nearest to `value`.
fn nearest_index(coords: &[i32], value: i32) -> usize {
    coords
        .iter()
        .enumerate()
        .min_by_key(|&(_, &c)| (c - value).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// For each group of cells sharing a start coordinate, the far edge of the
/// last cell in the group.
fn group_ends(
    cells: &[Cell],
    tolerance: i32,
    start: impl Fn(&Cell) -> i32,
    end: impl Fn(&Cell) -> i32,
) -> Vec<i32> {
    let mut sorted: Vec<&Cell> = cells.iter().collect();
    sorted.sort_by_key(|c| start(*c));

    let mut ends = Vec::new();
    let mut cluster_start = 0;
    for i in 1..=sorted.len() {
        let end_of_cluster = i == sorted.len()
            || !is_close(start(sorted[i]), start(sorted[cluster_start]), tolerance);
        if end_of_cluster {
            if let Some(far) = sorted[cluster_start..i].iter().map(|c| end(*c)).max() {
                ends.push(far);
            }
            cluster_start = i;
        }
    }
    ends
}

/// Outer bound from a detector coordinate list; 0 when the list holds two
/// entries or fewer.
fn last_bound(coords: &[f64], ratio: f64) -> i32 {
    if coords.len() <= 2 {
        return 0;
    }
    coords
        .iter()
        .filter_map(|&v| to_coordinate(v, ratio))
        .max()
        .unwrap_or(0)
}

/// Scale a detector value into display pixels, if it is in range.
fn to_coordinate(v: f64, ratio: f64) -> Option<i32> {
    let v = (v * ratio).round();
    (v.is_finite() && v.abs() <= f64::from(COORDINATE_LIMIT)).then_some(v as i32)
}

/// `(x, y, width, height)` of a detector cell in display pixels, or `None`
/// when any corner falls outside the coordinate range.
fn display_box(dc: &DetectorCell, ratio: f64) -> Option<(i32, i32, i32, i32)> {
    let x = to_coordinate(dc.x, ratio)?;
    let y = to_coordinate(dc.y, ratio)?;
    let width = to_coordinate(dc.width, ratio)?;
    let height = to_coordinate(dc.height, ratio)?;
    let in_range = |v: i32| (-COORDINATE_LIMIT..=COORDINATE_LIMIT).contains(&v);
    (in_range(x + width) && in_range(y + height)).then_some((x, y, width, height))
}

/// A cell with its slot range on the coordinate grid.
struct Placed {
    cell: Cell,
    r0: usize,
    c0: usize,
    r1: usize,
    c1: usize,
}

impl Placed {
    fn finish(mut self, xs: &[i32], ys: &[i32]) -> Cell {
        self.cell.row = self.r0;
        self.cell.column = self.c0;
        self.cell.rows = self.r1 - self.r0;
        self.cell.columns = self.c1 - self.c0;
        self.cell.x = xs[self.c0];
        self.cell.y = ys[self.r0];
        self.cell.width = xs[self.c1] - xs[self.c0];
        self.cell.height = ys[self.r1] - ys[self.r0];
        self.cell
    }
}

/// Orchestrator for the reconciliation pipeline.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    settings: ReconcileSettings,
}

impl Reconciler {
    pub fn new(settings: ReconcileSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// Reconcile detector output and build the table in one go.
    pub fn run(&self, output: &DetectorOutput) -> Result<ReconcileResult<Table>, GridError> {
        let grid = self.reconcile(output);
        let table = self.build_table(&grid.value)?;
        Ok(ReconcileResult::with_warnings(table, grid.warnings))
    }

    /// Snap detector cells onto a regular grid.
    ///
    /// Pipeline: scale → coordinate sets → snap → resolve overlaps → fill gaps.
    /// The result covers every slot of the coordinate cross product exactly
    /// once, and the same input always produces the same output.
    pub fn reconcile(&self, output: &DetectorOutput) -> ReconcileResult<ReconciledGrid> {
        let mut warnings = Vec::new();
        let tolerance = self.settings.tolerance;

        // Step 1: Scale ratio
        let ratio = match self.settings.scale_ratio() {
            Some(r) => r,
            None => {
                warnings.push(ReconcileWarning::with_code(
                    ReconcileWarningCode::ScaleFallback,
                    "image size unknown, using detector coordinates unscaled",
                ));
                1.0
            }
        };

        // Step 2: Transform cells into display coordinates
        let mut cells = Vec::with_capacity(output.cells.len());
        for dc in &output.cells {
            let Some((x, y, width, height)) = display_box(dc, ratio) else {
                warnings.push(ReconcileWarning::for_cell(
                    ReconcileWarningCode::DegenerateCell,
                    "cell lies outside the usable coordinate range",
                    dc.id,
                ));
                continue;
            };
            if width <= 0 || height <= 0 {
                warnings.push(ReconcileWarning::for_cell(
                    ReconcileWarningCode::DegenerateCell,
                    "cell has no area after scaling",
                    dc.id,
                ));
                continue;
            }
            cells.push(Cell {
                id: dc.id,
                row: 0,
                column: 0,
                rows: 1,
                columns: 1,
                x,
                y,
                width,
                height,
                is_new_cell: false,
                is_submerged: false,
            });
        }
        if cells.is_empty() {
            warnings.push(ReconcileWarning::with_code(
                ReconcileWarningCode::EmptyResponse,
                "detector returned no usable cells",
            ));
            return ReconcileResult::with_warnings(ReconciledGrid::default(), warnings);
        }

        // Step 3: Coordinate sets from cell origins plus inferred far edges
        let mut xs: Vec<i32> = cells.iter().map(|c| c.x).collect();
        xs.extend(group_ends(&cells, tolerance, |c| c.y, Cell::right));
        let last_x = last_bound(&output.x_cords, ratio);
        if last_x > 0 {
            xs.push(last_x);
        }
        let xs = collapse_coordinates(&xs, tolerance);

        let mut ys: Vec<i32> = cells.iter().map(|c| c.y).collect();
        ys.extend(group_ends(&cells, tolerance, |c| c.x, Cell::bottom));
        let last_y = last_bound(&output.y_cords, ratio);
        if last_y > 0 {
            ys.push(last_y);
        }
        let ys = collapse_coordinates(&ys, tolerance);

        if xs.len() < 2 || ys.len() < 2 {
            warnings.push(ReconcileWarning::with_code(
                ReconcileWarningCode::EmptyResponse,
                "cells collapse to fewer than two grid lines",
            ));
            return ReconcileResult::with_warnings(ReconciledGrid::default(), warnings);
        }
        let rows = ys.len() - 1;
        let cols = xs.len() - 1;

        #[cfg(feature = "tracing")]
        tracing::debug!(ratio, rows, cols, cells = cells.len(), "coordinate grid");

        // Step 4: Snap every cell onto slot ranges
        let mut placed = Vec::with_capacity(cells.len());
        for cell in cells {
            let c0 = nearest_index(&xs, cell.x);
            let r0 = nearest_index(&ys, cell.y);
            if c0 >= cols || r0 >= rows {
                warnings.push(ReconcileWarning::for_cell(
                    ReconcileWarningCode::DegenerateCell,
                    "cell starts on the last grid line",
                    cell.id,
                ));
                continue;
            }
            let c1 = nearest_index(&xs, cell.right()).max(c0 + 1);
            let r1 = nearest_index(&ys, cell.bottom()).max(r0 + 1);
            placed.push(Placed {
                cell,
                r0,
                c0,
                r1,
                c1,
            });
        }

        // Step 5: Resolve overlaps; the grid is the source of truth for spans
        placed.sort_by_key(|p| (p.r0, p.c0, p.cell.id));
        let mut occupied: Vec<Option<usize>> = vec![None; rows * cols];
        let mut kept: Vec<Placed> = Vec::with_capacity(placed.len());
        let mut submerged = Vec::new();
        for mut p in placed {
            if let Some(owner) = occupied[p.r0 * cols + p.c0] {
                let same_origin = (kept[owner].r0, kept[owner].c0) == (p.r0, p.c0);
                let (code, description) = if same_origin {
                    (ReconcileWarningCode::DuplicateCell, "another cell starts in the same slot")
                } else {
                    (ReconcileWarningCode::SubmergedCell, "cell starts inside a spanning cell")
                };
                warnings.push(ReconcileWarning::for_cell(code, description, p.cell.id));
                p.cell.is_submerged = true;
                submerged.push(p.finish(&xs, &ys));
                continue;
            }

            let reported = (p.r1, p.c1);
            if let Some(c) = (p.c0 + 1..p.c1).find(|&c| occupied[p.r0 * cols + c].is_some()) {
                p.c1 = c;
            }
            if let Some(r) =
                (p.r0 + 1..p.r1).find(|&r| (p.c0..p.c1).any(|c| occupied[r * cols + c].is_some()))
            {
                p.r1 = r;
            }
            if (p.r1, p.c1) != reported {
                warnings.push(ReconcileWarning::for_cell(
                    ReconcileWarningCode::SpanRefitted,
                    format!(
                        "span {}x{} truncated to {}x{}",
                        reported.0 - p.r0,
                        reported.1 - p.c0,
                        p.r1 - p.r0,
                        p.c1 - p.c0
                    ),
                    p.cell.id,
                ));
            }

            for r in p.r0..p.r1 {
                for c in p.c0..p.c1 {
                    occupied[r * cols + c] = Some(kept.len());
                }
            }
            kept.push(p);
        }

        // Step 6: Fill uncovered slots with synthesized cells
        let mut next_id = kept
            .iter()
            .map(|p| p.cell.id)
            .chain(submerged.iter().map(|c| c.id))
            .max()
            .unwrap_or(0)
            + 1;
        for r in 0..rows {
            for c in 0..cols {
                if occupied[r * cols + c].is_some() {
                    continue;
                }
                occupied[r * cols + c] = Some(kept.len());
                kept.push(Placed {
                    cell: Cell {
                        id: next_id,
                        row: r,
                        column: c,
                        rows: 1,
                        columns: 1,
                        x: 0,
                        y: 0,
                        width: 0,
                        height: 0,
                        is_new_cell: true,
                        is_submerged: false,
                    },
                    r0: r,
                    c0: c,
                    r1: r + 1,
                    c1: c + 1,
                });
                next_id += 1;
            }
        }

        // Step 7: Geometry from the coordinate grid, row-major order
        let mut cells: Vec<Cell> = kept.into_iter().map(|p| p.finish(&xs, &ys)).collect();
        cells.sort_by_key(|c| (c.row, c.column));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            cells = cells.len(),
            synthesized = cells.iter().filter(|c| c.is_new_cell).count(),
            submerged = submerged.len(),
            warnings = warnings.len(),
            "reconciled cells"
        );

        ReconcileResult::with_warnings(
            ReconciledGrid {
                cells,
                submerged,
                x_cords: xs,
                y_cords: ys,
            },
            warnings,
        )
    }

    /// Build the grid graph for reconciled cells.
    ///
    /// Each cell contributes its bottom and right lines; top and left lines
    /// come only from cells on the first row and column, so shared lines are
    /// created once. Lines inside a spanning cell are created disabled, and a
    /// synthesized cell's right line is disabled when another synthesized
    /// cell sits directly to its right.
    pub fn build_table(&self, grid: &ReconciledGrid) -> Result<Table, GridError> {
        let mut table = Table::new(self.settings.grid);
        if grid.cells.is_empty() {
            return Ok(table);
        }

        let cols = grid.column_count();
        let mut synthesized_at = vec![false; grid.row_count() * cols];
        for cell in grid.cells.iter().filter(|c| c.is_new_cell) {
            if let Some(slot) = synthesized_at.get_mut(cell.row * cols + cell.column) {
                *slot = true;
            }
        }

        let point = |r: usize, c: usize| -> Result<Point, GridError> {
            match (grid.x_cords.get(c), grid.y_cords.get(r)) {
                (Some(&x), Some(&y)) => Ok(Point::new(x, y)),
                _ => Err(GridError::InvalidDimensions(format!(
                    "slot ({r}, {c}) lies outside the coordinate grid"
                ))),
            }
        };
        let link = |table: &mut Table, a: Point, b: Point, disabled: bool| {
            let e = table.link_points(a, b)?;
            if disabled {
                table.set_disabled(e, true)?;
            }
            Ok::<(), GridError>(())
        };

        for cell in &grid.cells {
            let (r0, c0) = (cell.row, cell.column);
            let (r1, c1) = (r0 + cell.rows, c0 + cell.columns);

            if r0 == 0 {
                for c in c0..c1 {
                    link(&mut table, point(r0, c)?, point(r0, c + 1)?, false)?;
                }
            }
            if c0 == 0 {
                for r in r0..r1 {
                    link(&mut table, point(r, c0)?, point(r + 1, c0)?, false)?;
                }
            }
            for c in c0..c1 {
                link(&mut table, point(r1, c)?, point(r1, c + 1)?, false)?;
            }
            let merge_right = cell.is_new_cell
                && c1 < cols
                && synthesized_at.get(r0 * cols + c1).copied().unwrap_or(false);
            for r in r0..r1 {
                link(&mut table, point(r, c1)?, point(r + 1, c1)?, merge_right)?;
            }

            for r in r0 + 1..r1 {
                for c in c0..c1 {
                    link(&mut table, point(r, c)?, point(r, c + 1)?, true)?;
                }
            }
            for c in c0 + 1..c1 {
                for r in r0..r1 {
                    link(&mut table, point(r, c)?, point(r + 1, c)?, true)?;
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nodes = table.node_count(),
            edges = table.edge_count(),
            "built table from reconciled cells"
        );

        table.recompute_extents();
        Ok(table)
    }
}
