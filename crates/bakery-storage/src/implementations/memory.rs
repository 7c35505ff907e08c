//! In-memory order store.
//!
//! This module provides a memory-based implementation of the OrderStore trait,
//! useful for testing and development scenarios where persistence is not required.
//! It applies the same unique and NOT NULL rules as the MySQL schema.

use crate::{OrderStore, StorageError};
use async_trait::async_trait;
use bakery_types::{NewOrder, Order, OrderStatus, ReplaceOrder};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Table {
	/// Last assigned row id.
	last_id: i32,
	rows: Vec<Order>,
}

/// In-memory order store.
///
/// Row ids are assigned from an increasing counter and never reused, like an
/// auto-increment column.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
	/// The in-memory table protected by a read-write lock.
	table: Arc<RwLock<Table>>,
}

impl MemoryOrderStore {
	/// Creates a new, empty MemoryOrderStore.
	pub fn new() -> Self {
		Self::default()
	}
}

fn not_null(column: &str) -> StorageError {
	StorageError::Backend(format!("Column '{}' cannot be null", column))
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
	async fn insert(&self, order: &NewOrder) -> Result<(), StorageError> {
		let mut table = self.table.write().await;
		if table.rows.iter().any(|row| row.order_id == order.order_id) {
			return Err(StorageError::Conflict(format!(
				"Duplicate entry '{}' for key 'orders.order_id'",
				order.order_id
			)));
		}

		table.last_id += 1;
		let id = table.last_id;
		table.rows.push(Order {
			id,
			order_id: order.order_id.clone(),
			customer_name: order.customer_name.clone(),
			product_ordered: order.product_ordered.clone(),
			quantity: Some(order.quantity),
			order_date: Some(order.order_date),
			status: Some(order.status),
			created_at: Utc::now(),
		});
		Ok(())
	}

	async fn list(&self) -> Result<Vec<Order>, StorageError> {
		let table = self.table.read().await;
		let mut orders = table.rows.clone();
		orders.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| b.id.cmp(&a.id))
		});
		Ok(orders)
	}

	async fn replace(&self, order_id: &str, fields: &ReplaceOrder) -> Result<u64, StorageError> {
		let mut table = self.table.write().await;
		let Some(row) = table.rows.iter_mut().find(|row| row.order_id == order_id) else {
			return Ok(0);
		};

		let customer_name = fields
			.customer_name
			.clone()
			.ok_or_else(|| not_null("customer_name"))?;
		let product_ordered = fields
			.product_ordered
			.clone()
			.ok_or_else(|| not_null("product_ordered"))?;

		row.customer_name = customer_name;
		row.product_ordered = product_ordered;
		row.quantity = fields.quantity;
		row.order_date = fields.order_date;
		row.status = fields.status;
		Ok(1)
	}

	async fn delete(&self, order_id: &str) -> Result<u64, StorageError> {
		let mut table = self.table.write().await;
		let before = table.rows.len();
		table.rows.retain(|row| row.order_id != order_id);
		Ok((before - table.rows.len()) as u64)
	}

	async fn update_status(
		&self,
		order_id: &str,
		status: OrderStatus,
	) -> Result<u64, StorageError> {
		let mut table = self.table.write().await;
		match table.rows.iter_mut().find(|row| row.order_id == order_id) {
			Some(row) => {
				row.status = Some(status);
				Ok(1)
			},
			None => Ok(0),
		}
	}
}
