//! Pulse realtime dashboard - entry point.
//!
//! Starts one session from the environment's auth token, subscribes to the
//! portfolio watchlist, and streams prices until interrupted.

use anyhow::Result;
use clap::Parser;
use pulse_feed::WatchlistSubscription;
use tracing::info;

/// Pulse realtime portfolio dashboard
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PULSE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pulse_telemetry::init_logging()?;

    info!("Starting pulse dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => pulse_app::AppConfig::from_file(path)?,
        None => pulse_app::AppConfig::load()?,
    };
    info!(url = %config.ws.url, "Configuration loaded");

    let mut session = pulse_app::Session::new(config);
    session.set_token(std::env::var("PULSE_AUTH_TOKEN").ok()).await;

    // Hold the watchlist subscription for the lifetime of the process;
    // dropping it clears all server-side subscriptions on the way out.
    let _watchlist = match session.handle() {
        Some(handle) => Some(WatchlistSubscription::new(handle)?),
        None => {
            info!("No PULSE_AUTH_TOKEN set, running idle");
            None
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    drop(_watchlist);
    session.shutdown().await;

    Ok(())
}
