use std::path::Path;
use std::time::Duration;

use tablegrid::{Crop, DetectionOutcome, DetectorClient, DetectorConfig, Session, Table};

use crate::cli::{OutputArgs, ReconcileArgs};
use crate::shared::{Rendered, emit};

pub struct DetectArgs<'a> {
    pub endpoint: Option<&'a str>,
    pub timeout: Option<u64>,
    pub borderless: bool,
    pub crops: &'a [[i32; 4]],
}

pub fn run(
    image: &Path,
    args: &DetectArgs<'_>,
    reconcile: &ReconcileArgs,
    output: &OutputArgs,
) -> Result<(), i32> {
    if !image.exists() {
        eprintln!("Error: file not found: {}", image.display());
        return Err(1);
    }

    let mut config = DetectorConfig::from_env().map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint.to_string();
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.borderless_table = args.borderless;

    let client = DetectorClient::new(config).map_err(|e| {
        eprintln!("Error: failed to create HTTP client: {e}");
        1
    })?;

    let bytes = std::fs::read(image).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", image.display());
        1
    })?;
    let file_name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let crops: Vec<Crop> = args
        .crops
        .iter()
        .map(|c| Crop::new(c[0], c[1], c[2], c[3]))
        .collect();

    let mut session = Session::new(reconcile.to_settings());
    let id = session.create_table(Table::new(reconcile.grid.to_settings()));
    let outcome = client
        .detect_into(&mut session, id, bytes, &file_name, &crops)
        .map_err(|e| {
            eprintln!("Error: detection failed: {e}");
            1
        })?;

    let warnings = match outcome {
        DetectionOutcome::Applied { warnings, added } => {
            if !added.is_empty() {
                tracing::info!(extra = added.len(), "detector found more tables, printing the first");
            }
            warnings
        }
        DetectionOutcome::Dropped => {
            eprintln!("Error: detector response was discarded");
            return Err(1);
        }
    };

    let table = session.table(id).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;
    emit(
        &Rendered {
            table,
            grid: session.grid(id),
            warnings: &warnings,
        },
        output,
    )
}
