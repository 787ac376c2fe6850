//! sling-assets CLI — inspect the asset keys a Sling replication produces.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "sling-assets",
    version,
    about = "Map Sling replication streams to stable asset keys and asset specs"
)]
struct Cli {
    #[command(subcommand)]
    command: sling_assets::cli::Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();
    let result = sling_assets::cli::logging::init(&cli.log_level)
        .and_then(|()| sling_assets::cli::dispatch(cli.command));
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
