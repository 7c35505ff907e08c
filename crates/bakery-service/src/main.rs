//! Main entry point for the bakery order service.
//!
//! Loads configuration, opens the order store and serves the HTTP API until
//! interrupted. Failing to reach the database at startup is fatal.

use bakery_config::Config;
use bakery_service::{server, telemetry};
use bakery_storage::create_store;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the bakery service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to a TOML configuration file; the environment is used when omitted
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	telemetry::init(&args.log_level);

	let config = Config::load(args.config.as_deref()).await?;
	tracing::info!(
		"Loaded configuration ({} backend, {}:{})",
		config.database.backend,
		config.server.host,
		config.server.port
	);

	let store = create_store(&config.database).await.map_err(|e| {
		tracing::error!("Database connection error: {}", e);
		e
	})?;

	server::start_server(config.server, store).await
}
