//! Signed booking lookup proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http server ─▶ rate limit ─▶ signature gate ─▶ booking resolver
//!                                                                        │
//!                                                                        ▼
//!     Client Response                                              upstream client
//!     ◀───────────── JSON body / error mapping ◀──────────────────── (coworkers, bookings)
//! ```

use std::path::PathBuf;

use clap::Parser;

use bookings_proxy::config::load_config;
use bookings_proxy::lifecycle::startup;
use bookings_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "bookings-proxy")]
#[command(about = "Signed booking lookup proxy", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "BOOKINGS_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        rate_limit_enabled = config.rate_limit.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
