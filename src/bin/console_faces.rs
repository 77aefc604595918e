use clap::Parser;
use console_faces::{config::SystemConfig, system::System, ConsoleFacesError};
use std::{path::PathBuf, time::Duration};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Milliseconds to wait before sending the ready signal
    #[arg(short, long, default_value_t = 2000)]
    ready_after: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn ctrl_c_error(e: std::io::Error) -> ConsoleFacesError {
    ConsoleFacesError::Internal(format!("Failed to wait for Ctrl+C: {}", e))
}

async fn run(cli: &Cli) -> Result<(), ConsoleFacesError> {
    let config = if cli.config.exists() {
        SystemConfig::from_file(&cli.config)?
    } else {
        info!("{} not found, using defaults", cli.config.display());
        SystemConfig::default()
    };
    debug!("config: {:?}", config);

    let system = System::new(config);
    system.start().await?;

    println!(
        "ConsoleFaces started with seed {}. Press Ctrl+C to shutdown.",
        system.seed()
    );
    if let Some(path) = system.log_path() {
        println!("Logging to {}", path.display());
    }

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(cli.ready_after)) => {
            system.signal_ready().await?;
            tokio::signal::ctrl_c().await.map_err(ctrl_c_error)?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(ctrl_c_error)?;
        }
    }

    println!("Shutdown signal received, performing clean shutdown...");
    system.shutdown().await?;

    let status = system.status().await;
    println!(
        "Shutdown completed: {} hosts, {} instances, \
         {} instantiation / {} sweep / {} ping failures.",
        status.host_count,
        status.tracked_count,
        status.failures.instantiation,
        status.failures.sweep,
        status.failures.ping
    );

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
