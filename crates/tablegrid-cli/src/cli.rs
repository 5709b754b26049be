use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tablegrid::{GridSettings, ReconcileSettings};

/// Build, reconcile, edit and render table grids.
#[derive(Debug, Parser)]
#[command(name = "tablegrid", about, version)]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a uniform grid
    Grid {
        /// Number of rows
        #[arg(long, default_value_t = 3)]
        rows: usize,

        /// Number of columns
        #[arg(long, default_value_t = 3)]
        cols: usize,

        /// Width and height of every cell
        #[arg(long, default_value_t = 50)]
        cell_size: i32,

        /// X coordinate of the top-left node
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        origin_x: i32,

        /// Y coordinate of the top-left node
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        origin_y: i32,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Reconcile a detector response file into a grid
    Reconcile {
        /// Path to the detector JSON response
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        reconcile: ReconcileArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Apply a JSON script of operations to a grid
    Edit {
        /// Path to the JSON operation script
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Start from a reconciled detector response instead of a uniform grid
        #[arg(long, value_name = "FILE")]
        response: Option<PathBuf>,

        /// Rows of the starting uniform grid
        #[arg(long, default_value_t = 3)]
        rows: usize,

        /// Columns of the starting uniform grid
        #[arg(long, default_value_t = 3)]
        cols: usize,

        /// Cell size of the starting uniform grid
        #[arg(long, default_value_t = 50)]
        cell_size: i32,

        #[command(flatten)]
        reconcile: ReconcileArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Send an image to the table detector and reconcile the answer (needs the `http` feature)
    Detect {
        /// Path to the page image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Detector base URL (default: TABLEGRID_DETECTOR_URL or http://127.0.0.1:5000)
        #[arg(long)]
        endpoint: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Also look for borderless tables
        #[arg(long)]
        borderless: bool,

        /// Re-split only this region, as x1,y1,x2,y2 (repeatable)
        #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_crop)]
        crop: Vec<[i32; 4]>,

        #[command(flatten)]
        reconcile: ReconcileArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Grid geometry settings.
#[derive(Debug, Clone, Args)]
pub struct GridArgs {
    /// Node hit radius
    #[arg(long, default_value_t = 5)]
    pub node_radius: i32,

    /// Edge hit half-width
    #[arg(long, default_value_t = 5)]
    pub edge_width: i32,

    /// Padding around the nodes in the table bbox
    #[arg(long, default_value_t = 10)]
    pub bbox_margin: i32,
}

impl GridArgs {
    pub fn to_settings(&self) -> GridSettings {
        GridSettings {
            node_radius: self.node_radius,
            edge_width: self.edge_width,
            bbox_margin: self.bbox_margin,
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Args)]
pub struct ReconcileArgs {
    /// Coordinates closer than this many pixels are merged (default: 6)
    #[arg(long, default_value_t = 6)]
    pub tolerance: i32,

    /// Width of the display canvas; 0 keeps detector coordinates
    #[arg(long, default_value_t = 0)]
    pub canvas_width: u32,

    /// Height of the display canvas
    #[arg(long, default_value_t = 0)]
    pub canvas_height: u32,

    /// Width of the image the detector saw
    #[arg(long, default_value_t = 0)]
    pub image_width: u32,

    /// Height of the image the detector saw
    #[arg(long, default_value_t = 0)]
    pub image_height: u32,

    /// Treat the response as already in display coordinates
    #[arg(long)]
    pub hybrid: bool,

    #[command(flatten)]
    pub grid: GridArgs,
}

impl ReconcileArgs {
    pub fn to_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            tolerance: self.tolerance,
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            image_width: self.image_width,
            image_height: self.image_height,
            hybrid: self.hybrid,
            grid: self.grid.to_settings(),
        }
    }
}

/// Where and how to write the result.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Output format for grid results.
#[derive(Debug, Clone, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary and cell list
    Text,
    /// JSON with cells, grid lines and warnings
    Json,
    /// SVG drawing of the grid
    Svg,
}

fn parse_crop(value: &str) -> Result<[i32; 4], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected x1,y1,x2,y2, got '{value}'"));
    }
    let mut crop = [0; 4];
    for (slot, part) in crop.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("invalid coordinate '{part}'"))?;
    }
    Ok(crop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_grid_defaults() {
        let cli = Cli::parse_from(["tablegrid", "grid"]);
        match cli.command {
            Commands::Grid {
                rows,
                cols,
                cell_size,
                origin_x,
                ref output,
                ..
            } => {
                assert_eq!((rows, cols, cell_size, origin_x), (3, 3, 50, 0));
                assert_eq!(output.format, OutputFormat::Text);
                assert!(output.output.is_none());
            }
            _ => panic!("expected Grid command"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_grid_with_negative_origin() {
        let cli = Cli::parse_from([
            "tablegrid", "grid", "--rows", "2", "--origin-x", "-20", "--format", "svg",
        ]);
        match cli.command {
            Commands::Grid {
                rows,
                origin_x,
                ref output,
                ..
            } => {
                assert_eq!(rows, 2);
                assert_eq!(origin_x, -20);
                assert_eq!(output.format, OutputFormat::Svg);
            }
            _ => panic!("expected Grid command"),
        }
    }

    #[test]
    fn parse_reconcile_settings() {
        let cli = Cli::parse_from([
            "tablegrid",
            "reconcile",
            "response.json",
            "--tolerance",
            "4",
            "--canvas-width",
            "800",
            "--canvas-height",
            "600",
            "--image-width",
            "1600",
            "--image-height",
            "1200",
            "--node-radius",
            "3",
            "--format",
            "json",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Reconcile {
                ref file,
                ref reconcile,
                ref output,
            } => {
                assert_eq!(file, &PathBuf::from("response.json"));
                let settings = reconcile.to_settings();
                assert_eq!(settings.tolerance, 4);
                assert_eq!(settings.scale_ratio(), Some(0.5));
                assert_eq!(settings.grid.node_radius, 3);
                assert_eq!(output.format, OutputFormat::Json);
            }
            _ => panic!("expected Reconcile command"),
        }
    }

    #[test]
    fn reconcile_defaults_match_library() {
        let cli = Cli::parse_from(["tablegrid", "reconcile", "r.json"]);
        match cli.command {
            Commands::Reconcile { ref reconcile, .. } => {
                assert_eq!(reconcile.to_settings(), ReconcileSettings::default());
            }
            _ => panic!("expected Reconcile command"),
        }
    }

    #[test]
    fn parse_edit_with_response() {
        let cli = Cli::parse_from([
            "tablegrid",
            "edit",
            "ops.json",
            "--response",
            "r.json",
            "-o",
            "out.svg",
        ]);
        match cli.command {
            Commands::Edit {
                ref script,
                ref response,
                ref output,
                ..
            } => {
                assert_eq!(script, &PathBuf::from("ops.json"));
                assert_eq!(response.as_deref(), Some(std::path::Path::new("r.json")));
                assert_eq!(output.output, Some(PathBuf::from("out.svg")));
            }
            _ => panic!("expected Edit command"),
        }
    }

    #[test]
    fn missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["tablegrid"]).is_err());
    }

    #[test]
    fn unknown_format_is_error() {
        assert!(Cli::try_parse_from(["tablegrid", "grid", "--format", "csv"]).is_err());
    }

    #[test]
    fn parse_crop_values() {
        assert_eq!(parse_crop("1, 2,3,4"), Ok([1, 2, 3, 4]));
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("a,2,3,4").is_err());
    }
}
