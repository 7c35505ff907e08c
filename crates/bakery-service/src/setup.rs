//! One-shot database setup for the bakery service.
//!
//! Creates the database and the `orders` table if they are missing and, with
//! `--seed`, inserts a few sample orders. Run it with credentials allowed to
//! create databases. It does not retry; a failure exits non-zero.

use bakery_config::{Config, StorageBackend};
use bakery_service::telemetry;
use bakery_storage::schema;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Command-line arguments for the setup tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to a TOML configuration file; the environment is used when omitted
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Insert sample orders after creating the table
	#[arg(long)]
	seed: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();
	telemetry::init(&args.log_level);

	let config = match Config::load(args.config.as_deref()).await {
		Ok(config) => config,
		Err(e) => {
			tracing::error!("MySQL setup failed: {}", e);
			return ExitCode::FAILURE;
		},
	};

	if config.database.backend != StorageBackend::Mysql {
		tracing::error!(
			"MySQL setup failed: configured backend is '{}'",
			config.database.backend
		);
		return ExitCode::FAILURE;
	}

	match schema::provision(&config.database, args.seed).await {
		Ok(summary) => {
			tracing::info!(
				"MySQL setup completed for database {} ({} sample rows inserted)",
				summary.database,
				summary.seeded
			);
			ExitCode::SUCCESS
		},
		Err(e) => {
			tracing::error!("MySQL setup failed: {}", e);
			ExitCode::FAILURE
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_seed_is_opt_in() {
		let args = Args::try_parse_from(["bakery-setup"]).unwrap();
		assert!(!args.seed);

		let args = Args::try_parse_from(["bakery-setup", "--seed"]).unwrap();
		assert!(args.seed);
	}
}
