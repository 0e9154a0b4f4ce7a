use std::path::PathBuf;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tradewarden::infrastructure::config::settings::Config;
use tradewarden::infrastructure::Telemetry;

/// Guarded-call telemetry daemon: metrics exposition and history persistence.
#[derive(Debug, Parser)]
#[command(name = "tradewarden", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!(config = %cli.config.display(), "tradewarden starting");

    let telemetry = Telemetry::build(&config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = telemetry.start(shutdown_rx).await;

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    running.join().await;
    // Last interval would otherwise be lost.
    telemetry.flush().await;

    info!("tradewarden stopped");
}
