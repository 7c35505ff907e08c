//! MySQL order store.
//!
//! Statements run against a bounded `sqlx` pool. A connection is checked out
//! for the duration of one statement and returned to the pool when the
//! statement future completes or is dropped. Requests beyond the pool size
//! wait in the pool's queue until a connection frees up or the acquire
//! timeout elapses.
//!
//! Startup makes one connection attempt, bounded by the connect timeout, so
//! an unreachable server is reported at once instead of being retried for
//! the length of the acquire timeout.

use crate::{OrderStore, StorageError};
use async_trait::async_trait;
use bakery_config::DatabaseConfig;
use bakery_types::{NewOrder, Order, OrderStatus, ReplaceOrder};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Connection, Row};
use std::time::Duration;
use tracing::info;

const INSERT_ORDER: &str = "INSERT INTO orders \
	(order_id, customer_name, product_ordered, quantity, order_date, status) \
	VALUES (?, ?, ?, ?, ?, ?)";

const SELECT_ORDERS: &str = "SELECT id, order_id, customer_name, product_ordered, quantity, \
	order_date, status, created_at FROM orders ORDER BY created_at DESC, id DESC";

const REPLACE_ORDER: &str = "UPDATE orders SET customer_name = ?, product_ordered = ?, \
	quantity = ?, order_date = ?, status = ? WHERE order_id = ?";

const DELETE_ORDER: &str = "DELETE FROM orders WHERE order_id = ?";

const UPDATE_STATUS: &str = "UPDATE orders SET status = ? WHERE order_id = ?";

/// Connect options for the configured server, without selecting a database.
pub fn server_options(config: &DatabaseConfig) -> MySqlConnectOptions {
	MySqlConnectOptions::new()
		.host(&config.host)
		.port(config.port)
		.username(&config.user)
		.password(config.password.expose())
}

/// Connect options for the configured server and database.
pub fn database_options(config: &DatabaseConfig) -> MySqlConnectOptions {
	server_options(config).database(&config.name)
}

/// Order store backed by a MySQL connection pool.
#[derive(Debug, Clone)]
pub struct MySqlOrderStore {
	pool: MySqlPool,
}

impl MySqlOrderStore {
	/// Verifies the server is reachable, then opens the pool.
	///
	/// Fails after a single attempt if the server refuses the connection or
	/// does not answer within the connect timeout.
	pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
		info!(
			"Connecting to MySQL at {}:{} (database {}, max {} connections)",
			config.host, config.port, config.name, config.max_connections
		);

		let options = database_options(config);
		let timeout = Duration::from_secs(config.connect_timeout_seconds);
		let conn = tokio::time::timeout(timeout, MySqlConnection::connect_with(&options))
			.await
			.map_err(|_| {
				StorageError::Connection(format!(
					"No answer from {}:{} within {}s",
					config.host, config.port, config.connect_timeout_seconds
				))
			})??;
		conn.close().await?;

		let pool = MySqlPoolOptions::new()
			.max_connections(config.max_connections)
			.acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
			.connect_lazy_with(options);

		info!("Connected to MySQL");
		Ok(Self { pool })
	}
}

fn order_from_row(row: &MySqlRow) -> Result<Order, StorageError> {
	let status: Option<String> = row.try_get("status")?;
	let status = status
		.map(|value| value.parse::<OrderStatus>())
		.transpose()
		.map_err(|e| StorageError::Backend(format!("Unexpected stored status: {}", e)))?;

	Ok(Order {
		id: row.try_get("id")?,
		order_id: row.try_get("order_id")?,
		customer_name: row.try_get("customer_name")?,
		product_ordered: row.try_get("product_ordered")?,
		quantity: row.try_get::<Option<i32>, _>("quantity")?,
		order_date: row.try_get::<Option<NaiveDate>, _>("order_date")?,
		status,
		created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
	})
}

#[async_trait]
impl OrderStore for MySqlOrderStore {
	async fn insert(&self, order: &NewOrder) -> Result<(), StorageError> {
		sqlx::query(INSERT_ORDER)
			.bind(&order.order_id)
			.bind(&order.customer_name)
			.bind(&order.product_ordered)
			.bind(order.quantity)
			.bind(order.order_date)
			.bind(order.status.as_str())
			.execute(&self.pool)
			.await?;
		Ok(())
	}

	async fn list(&self) -> Result<Vec<Order>, StorageError> {
		let rows = sqlx::query(SELECT_ORDERS).fetch_all(&self.pool).await?;
		rows.iter().map(order_from_row).collect()
	}

	async fn replace(&self, order_id: &str, fields: &ReplaceOrder) -> Result<u64, StorageError> {
		let result = sqlx::query(REPLACE_ORDER)
			.bind(fields.customer_name.as_deref())
			.bind(fields.product_ordered.as_deref())
			.bind(fields.quantity)
			.bind(fields.order_date)
			.bind(fields.status.map(|status| status.as_str()))
			.bind(order_id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}

	async fn delete(&self, order_id: &str) -> Result<u64, StorageError> {
		let result = sqlx::query(DELETE_ORDER)
			.bind(order_id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}

	async fn update_status(
		&self,
		order_id: &str,
		status: OrderStatus,
	) -> Result<u64, StorageError> {
		let result = sqlx::query(UPDATE_STATUS)
			.bind(status.as_str())
			.bind(order_id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}

	async fn close(&self) {
		self.pool.close().await;
		info!("MySQL pool closed");
	}
}
