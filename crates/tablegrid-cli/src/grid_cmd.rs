use tablegrid::Table;

use crate::cli::{GridArgs, OutputArgs};
use crate::shared::{Rendered, emit};

pub fn run(
    rows: usize,
    cols: usize,
    cell_size: i32,
    origin: (i32, i32),
    grid: &GridArgs,
    output: &OutputArgs,
) -> Result<(), i32> {
    let table = Table::grid(grid.to_settings(), origin.0, origin.1, rows, cols, cell_size)
        .map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;

    tracing::debug!(rows, cols, cell_size, "built uniform grid");

    emit(
        &Rendered {
            table: &table,
            grid: None,
            warnings: &[],
        },
        output,
    )
}
