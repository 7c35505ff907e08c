//! Schema provisioning for the `orders` table.
//!
//! Used by the setup tool, outside the request path. Every step is
//! idempotent: the database and table are created only if absent and sample
//! rows are inserted with `INSERT IGNORE`.

use crate::implementations::mysql::{database_options, server_options};
use crate::StorageError;
use bakery_config::{is_plain_identifier, DatabaseConfig};
use bakery_types::OrderStatus;
use chrono::NaiveDate;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use tracing::info;

/// DDL for the `orders` table.
pub const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
	id INT AUTO_INCREMENT PRIMARY KEY,
	order_id VARCHAR(50) UNIQUE NOT NULL,
	customer_name VARCHAR(100) NOT NULL,
	product_ordered VARCHAR(100) NOT NULL,
	quantity INT DEFAULT 1,
	order_date DATE,
	status ENUM('Pending', 'Completed', 'Cancelled') DEFAULT 'Pending',
	created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const INSERT_SAMPLE_ORDER: &str = "INSERT IGNORE INTO orders \
	(order_id, customer_name, product_ordered, quantity, order_date, status) \
	VALUES (?, ?, ?, ?, ?, ?)";

/// A row inserted by `seed_sample_orders`.
#[derive(Debug, Clone, Copy)]
pub struct SampleOrder {
	pub order_id: &'static str,
	pub customer_name: &'static str,
	pub product_ordered: &'static str,
	pub quantity: i32,
	pub order_date: (i32, u32, u32),
	pub status: OrderStatus,
}

/// Rows inserted when seeding is requested.
pub const SAMPLE_ORDERS: [SampleOrder; 3] = [
	SampleOrder {
		order_id: "ORD001",
		customer_name: "Alice Johnson",
		product_ordered: "Sourdough Bread",
		quantity: 2,
		order_date: (2024, 1, 15),
		status: OrderStatus::Pending,
	},
	SampleOrder {
		order_id: "ORD002",
		customer_name: "Bob Smith",
		product_ordered: "Chocolate Croissant",
		quantity: 6,
		order_date: (2024, 1, 16),
		status: OrderStatus::Completed,
	},
	SampleOrder {
		order_id: "ORD003",
		customer_name: "Carol White",
		product_ordered: "Birthday Cake",
		quantity: 1,
		order_date: (2024, 1, 17),
		status: OrderStatus::Pending,
	},
];

/// Outcome of a provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionSummary {
	pub database: String,
	/// Sample rows actually inserted; rows already present are skipped.
	pub seeded: u64,
}

/// Builds the `CREATE DATABASE` statement, refusing names that are not
/// plain identifiers since they cannot be bound as parameters.
pub fn create_database_statement(name: &str) -> Result<String, StorageError> {
	if !is_plain_identifier(name) {
		return Err(StorageError::Configuration(format!(
			"Refusing to create database with name '{}'",
			name
		)));
	}
	Ok(format!("CREATE DATABASE IF NOT EXISTS `{}`", name))
}

/// Creates the configured database if it does not exist.
pub async fn create_database(
	conn: &mut MySqlConnection,
	name: &str,
) -> Result<(), StorageError> {
	let statement = create_database_statement(name)?;
	sqlx::raw_sql(&statement).execute(&mut *conn).await?;
	info!("Database {} created or already exists", name);
	Ok(())
}

/// Creates the `orders` table if it does not exist.
pub async fn create_orders_table(conn: &mut MySqlConnection) -> Result<(), StorageError> {
	sqlx::raw_sql(CREATE_ORDERS_TABLE).execute(&mut *conn).await?;
	info!("Orders table created or already exists");
	Ok(())
}

/// Inserts the sample orders, skipping any whose `order_id` already exists.
pub async fn seed_sample_orders(conn: &mut MySqlConnection) -> Result<u64, StorageError> {
	let mut inserted = 0;
	for sample in SAMPLE_ORDERS {
		let (year, month, day) = sample.order_date;
		let order_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
			StorageError::Configuration(format!("Invalid sample date for {}", sample.order_id))
		})?;

		let result = sqlx::query(INSERT_SAMPLE_ORDER)
			.bind(sample.order_id)
			.bind(sample.customer_name)
			.bind(sample.product_ordered)
			.bind(sample.quantity)
			.bind(order_date)
			.bind(sample.status.as_str())
			.execute(&mut *conn)
			.await?;
		inserted += result.rows_affected();
	}
	info!("Sample data inserted ({} new rows)", inserted);
	Ok(inserted)
}

/// Creates the database and table, optionally seeding sample rows.
///
/// Connects first without selecting a database, then reconnects to the
/// created one. Connections are closed before returning.
pub async fn provision(
	config: &DatabaseConfig,
	seed: bool,
) -> Result<ProvisionSummary, StorageError> {
	info!("Connecting to MySQL at {}:{}", config.host, config.port);
	let mut admin = MySqlConnection::connect_with(&server_options(config)).await?;
	info!("Connected to MySQL server");

	let created = create_database(&mut admin, &config.name).await;
	admin.close().await?;
	created?;

	let mut conn = MySqlConnection::connect_with(&database_options(config)).await?;
	let result = async {
		create_orders_table(&mut conn).await?;
		if seed {
			seed_sample_orders(&mut conn).await
		} else {
			Ok(0)
		}
	}
	.await;
	conn.close().await?;
	info!("Connection closed");

	Ok(ProvisionSummary {
		database: config.name.clone(),
		seeded: result?,
	})
}
