mod cli;
#[cfg(feature = "http")]
mod detect_cmd;
mod edit_cmd;
mod grid_cmd;
mod reconcile_cmd;
mod shared;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        cli::Commands::Grid {
            rows,
            cols,
            cell_size,
            origin_x,
            origin_y,
            ref grid,
            ref output,
        } => grid_cmd::run(rows, cols, cell_size, (origin_x, origin_y), grid, output),
        cli::Commands::Reconcile {
            ref file,
            ref reconcile,
            ref output,
        } => reconcile_cmd::run(file, reconcile, output),
        cli::Commands::Edit {
            ref script,
            ref response,
            rows,
            cols,
            cell_size,
            ref reconcile,
            ref output,
        } => edit_cmd::run(
            script,
            response.as_deref(),
            (rows, cols, cell_size),
            reconcile,
            output,
        ),
        cli::Commands::Detect {
            ref image,
            ref endpoint,
            timeout,
            borderless,
            ref crop,
            ref reconcile,
            ref output,
        } => {
            #[cfg(feature = "http")]
            {
                detect_cmd::run(
                    image,
                    &detect_cmd::DetectArgs {
                        endpoint: endpoint.as_deref(),
                        timeout,
                        borderless,
                        crops: crop,
                    },
                    reconcile,
                    output,
                )
            }
            #[cfg(not(feature = "http"))]
            {
                let _ = (image, endpoint, timeout, borderless, crop, reconcile, output);
                eprintln!("Error: tablegrid was built without the `http` feature; detect is unavailable");
                Err(1)
            }
        }
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
