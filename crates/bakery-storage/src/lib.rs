//! Storage module for the bakery order service.
//!
//! This module provides the `OrderStore` abstraction over the `orders` table,
//! a MySQL implementation backed by a bounded connection pool, an in-memory
//! implementation for tests and local runs, and the schema provisioning used
//! by the setup tool.

use async_trait::async_trait;
use bakery_config::{DatabaseConfig, StorageBackend};
use bakery_types::{NewOrder, Order, OrderStatus, ReplaceOrder};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod mysql;
}

pub mod schema;

pub use implementations::memory::MemoryOrderStore;
pub use implementations::mysql::MySqlOrderStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// A unique constraint rejected the write.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// The database could not be reached or no connection was available.
	#[error("Connection error: {0}")]
	Connection(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl StorageError {
	/// Returns true if the error is a uniqueness conflict.
	pub fn is_conflict(&self) -> bool {
		matches!(self, StorageError::Conflict(_))
	}
}

impl From<sqlx::Error> for StorageError {
	fn from(error: sqlx::Error) -> Self {
		match &error {
			sqlx::Error::Database(db) if db.is_unique_violation() => {
				StorageError::Conflict(db.message().to_string())
			},
			sqlx::Error::Io(_)
			| sqlx::Error::Tls(_)
			| sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed => StorageError::Connection(error.to_string()),
			sqlx::Error::Configuration(_) => StorageError::Configuration(error.to_string()),
			_ => StorageError::Backend(error.to_string()),
		}
	}
}

/// Persistence operations on orders.
///
/// Every operation is a single statement. Mutations return the number of
/// rows they touched; zero is not an error.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
	/// Inserts a new order. Fails with `StorageError::Conflict` if the
	/// `order_id` is already taken.
	async fn insert(&self, order: &NewOrder) -> Result<(), StorageError>;

	/// Returns all orders, most recently created first.
	async fn list(&self) -> Result<Vec<Order>, StorageError>;

	/// Overwrites the mutable fields of the order with the given `order_id`.
	async fn replace(&self, order_id: &str, fields: &ReplaceOrder) -> Result<u64, StorageError>;

	/// Deletes the order with the given `order_id`.
	async fn delete(&self, order_id: &str) -> Result<u64, StorageError>;

	/// Sets only the status of the order with the given `order_id`.
	async fn update_status(&self, order_id: &str, status: OrderStatus)
		-> Result<u64, StorageError>;

	/// Releases held connections once the server has stopped.
	async fn close(&self) {}
}

/// Creates the order store selected by the configuration.
///
/// For MySQL this opens the pool and fails if the server cannot be reached.
pub async fn create_store(config: &DatabaseConfig) -> Result<Arc<dyn OrderStore>, StorageError> {
	match config.backend {
		StorageBackend::Mysql => Ok(Arc::new(MySqlOrderStore::connect(config).await?)),
		StorageBackend::Memory => {
			tracing::warn!("Using in-memory order store; orders are lost on restart");
			Ok(Arc::new(MemoryOrderStore::new()))
		},
	}
}
