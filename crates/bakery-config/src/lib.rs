//! Configuration module for the bakery order service.
//!
//! Settings come from environment variables (with a `.env` file loaded first)
//! or from a TOML file. Every setting has a default, so an empty environment
//! yields a configuration pointing at a local MySQL server.
//!
//! ## TOML files
//!
//! A file may reference environment variables as `${VAR}` or
//! `${VAR:-default}`; they are resolved before parsing:
//!
//! ```toml
//! [server]
//! port = 5000
//!
//! [database]
//! host = "${DB_HOST:-localhost}"
//! password = "${DB_PASSWORD:-}"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

mod password;

pub use password::Password;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the bakery service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
	/// HTTP listener settings.
	#[serde(default)]
	pub server: ServerConfig,
	/// Database connection and pool settings.
	#[serde(default)]
	pub database: DatabaseConfig,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
	/// Host address to bind the server to.
	#[serde(default = "default_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_port")]
	pub port: u16,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
		}
	}
}

/// Storage backend selected for the order store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	/// MySQL through a bounded connection pool.
	#[default]
	Mysql,
	/// Process-local table, lost on restart.
	Memory,
}

impl fmt::Display for StorageBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StorageBackend::Mysql => f.write_str("mysql"),
			StorageBackend::Memory => f.write_str("memory"),
		}
	}
}

impl FromStr for StorageBackend {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"mysql" => Ok(StorageBackend::Mysql),
			"memory" => Ok(StorageBackend::Memory),
			other => Err(ConfigError::Validation(format!(
				"Unknown storage backend '{}' (expected 'mysql' or 'memory')",
				other
			))),
		}
	}
}

/// Configuration for the database and its connection pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
	/// Which storage implementation to use.
	#[serde(default)]
	pub backend: StorageBackend,
	/// Database server host.
	#[serde(default = "default_db_host")]
	pub host: String,
	/// Database server port.
	#[serde(default = "default_db_port")]
	pub port: u16,
	/// User to connect as.
	#[serde(default = "default_db_user")]
	pub user: String,
	/// Password for `user`; redacted when printed.
	#[serde(default)]
	pub password: Password,
	/// Name of the database holding the `orders` table.
	#[serde(default = "default_db_name")]
	pub name: String,
	/// Upper bound on pooled connections.
	#[serde(default = "default_max_connections")]
	pub max_connections: u32,
	/// How long a request waits for a free connection before failing.
	#[serde(default = "default_acquire_timeout_seconds")]
	pub acquire_timeout_seconds: u64,
	/// Limit on the single connection attempt made at startup.
	#[serde(default = "default_connect_timeout_seconds")]
	pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			backend: StorageBackend::default(),
			host: default_db_host(),
			port: default_db_port(),
			user: default_db_user(),
			password: Password::default(),
			name: default_db_name(),
			max_connections: default_max_connections(),
			acquire_timeout_seconds: default_acquire_timeout_seconds(),
			connect_timeout_seconds: default_connect_timeout_seconds(),
		}
	}
}

fn default_host() -> String {
	"0.0.0.0".to_string()
}

fn default_port() -> u16 {
	5000
}

fn default_db_host() -> String {
	"localhost".to_string()
}

fn default_db_port() -> u16 {
	3306
}

fn default_db_user() -> String {
	"root".to_string()
}

fn default_db_name() -> String {
	"sweet_crust_bakery".to_string()
}

fn default_max_connections() -> u32 {
	10
}

/// Waiting requests queue rather than fail, so the default is generous.
fn default_acquire_timeout_seconds() -> u64 {
	3600
}

fn default_connect_timeout_seconds() -> u64 {
	10
}

/// Returns true if `name` can be spliced into DDL as a bare identifier.
pub fn is_plain_identifier(name: &str) -> bool {
	!name.is_empty()
		&& name.len() <= 64
		&& name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}, used when the
/// variable is unset or empty.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let var_name = var_name.as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) if !v.is_empty() || default_value.is_none() => v,
			_ => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

/// Parses an optional numeric variable, naming the variable on failure.
fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
	match value {
		None => Ok(None),
		Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
			ConfigError::Validation(format!("{} must be a number, got '{}'", name, raw))
		}),
	}
}

impl Config {
	/// Builds the configuration from the process environment.
	///
	/// A `.env` file in the working directory is loaded first if present.
	pub fn from_env() -> Result<Self, ConfigError> {
		dotenv::dotenv().ok();
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the configuration from an arbitrary variable source.
	///
	/// Recognised variables: `HOST`, `PORT`, `DB_BACKEND`, `DB_HOST`,
	/// `DB_PORT`, `DB_USER`, `DB_PASSWORD` (or `DB_PASS`), `DB_NAME`,
	/// `DB_MAX_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT_SECONDS` and
	/// `DB_CONNECT_TIMEOUT_SECONDS`. Empty variables count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());
		let mut config = Config::default();

		if let Some(host) = lookup("HOST") {
			config.server.host = host;
		}
		if let Some(port) = parse_var("PORT", lookup("PORT"))? {
			config.server.port = port;
		}

		let database = &mut config.database;
		if let Some(backend) = lookup("DB_BACKEND") {
			database.backend = backend.parse()?;
		}
		if let Some(host) = lookup("DB_HOST") {
			database.host = host;
		}
		if let Some(port) = parse_var("DB_PORT", lookup("DB_PORT"))? {
			database.port = port;
		}
		if let Some(user) = lookup("DB_USER") {
			database.user = user;
		}
		if let Some(password) = lookup("DB_PASSWORD").or_else(|| lookup("DB_PASS")) {
			database.password = Password::from(password);
		}
		if let Some(name) = lookup("DB_NAME") {
			database.name = name;
		}
		if let Some(max) = parse_var("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"))? {
			database.max_connections = max;
		}
		if let Some(timeout) = parse_var(
			"DB_ACQUIRE_TIMEOUT_SECONDS",
			lookup("DB_ACQUIRE_TIMEOUT_SECONDS"),
		)? {
			database.acquire_timeout_seconds = timeout;
		}
		if let Some(timeout) = parse_var(
			"DB_CONNECT_TIMEOUT_SECONDS",
			lookup("DB_CONNECT_TIMEOUT_SECONDS"),
		)? {
			database.connect_timeout_seconds = timeout;
		}

		config.validate()?;
		Ok(config)
	}

	/// Loads configuration from a TOML file with environment variable resolution.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		tracing::debug!("Loaded configuration file {}", path.display());
		content.parse()
	}

	/// Loads from `path` when given, otherwise from the environment.
	pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		match path {
			Some(path) => Self::from_file(path).await,
			None => Self::from_env(),
		}
	}

	/// Validates the configuration to ensure all required fields are properly set.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.server.host.is_empty() {
			return Err(ConfigError::Validation("Server host cannot be empty".into()));
		}
		if self.server.port == 0 {
			return Err(ConfigError::Validation("Server port must be non-zero".into()));
		}

		let database = &self.database;
		if database.backend == StorageBackend::Memory {
			return Ok(());
		}
		if database.host.is_empty() {
			return Err(ConfigError::Validation("Database host cannot be empty".into()));
		}
		if database.port == 0 {
			return Err(ConfigError::Validation("Database port must be non-zero".into()));
		}
		if database.user.is_empty() {
			return Err(ConfigError::Validation("Database user cannot be empty".into()));
		}
		if !is_plain_identifier(&database.name) {
			return Err(ConfigError::Validation(format!(
				"Database name '{}' must be a plain identifier (letters, digits, '_' or '$')",
				database.name
			)));
		}
		if database.max_connections == 0 {
			return Err(ConfigError::Validation(
				"Database max_connections must be at least 1".into(),
			));
		}
		if database.connect_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Database connect_timeout_seconds must be at least 1".into(),
			));
		}

		Ok(())
	}
}

/// Parses TOML text, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
