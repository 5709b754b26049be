use std::path::Path;

use crate::cli::{OutputArgs, ReconcileArgs};
use crate::shared::{Rendered, emit, reconcile_file};

pub fn run(file: &Path, reconcile: &ReconcileArgs, output: &OutputArgs) -> Result<(), i32> {
    let (table, result) = reconcile_file(file, reconcile.to_settings())?;

    tracing::debug!(
        cells = result.value.cells.len(),
        warnings = result.warnings.len(),
        "reconciled {}",
        file.display()
    );

    emit(
        &Rendered {
            table: &table,
            grid: Some(&result.value),
            warnings: &result.warnings,
        },
        output,
    )
}
