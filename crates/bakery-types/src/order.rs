//! Order types for the bakery service.
//!
//! `Order` is the stored record as read back from the database. Each write
//! operation has its own input type: `NewOrder` for creation, `ReplaceOrder`
//! for full replacement and `StatusUpdate` for status changes. Each is built
//! from a loosely typed request body.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::validation::{
	coerce_date_column, coerce_int_column, coerce_text_column, parse_order_date, parse_quantity,
	require_text, ValidationError,
};

/// Status of an order.
///
/// Clients may only set `Pending` or `Completed`. `Cancelled` exists in the
/// storage schema and can be read back or written by a replace, but creation
/// and status updates reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
	#[default]
	Pending,
	Completed,
	Cancelled,
}

impl OrderStatus {
	/// Statuses accepted from clients on create and status update.
	pub const CLIENT_SETTABLE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Completed];

	/// Returns the storage representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "Pending",
			OrderStatus::Completed => "Completed",
			OrderStatus::Cancelled => "Cancelled",
		}
	}

	/// Parses a status supplied by a client.
	///
	/// Matching is exact and case-sensitive.
	pub fn parse_client(value: &str) -> Result<Self, ValidationError> {
		match value.parse::<OrderStatus>() {
			Ok(status) if Self::CLIENT_SETTABLE.contains(&status) => Ok(status),
			_ => Err(ValidationError::InvalidStatus(value.to_string())),
		}
	}

	/// Converts a value written to the nullable `status` column.
	///
	/// Any stored status is accepted by name, or by its 1-based position in
	/// the column's enumeration.
	pub fn from_column(value: Option<&Value>) -> Result<Option<Self>, ValidationError> {
		match value {
			None | Some(Value::Null) => Ok(None),
			Some(Value::String(s)) => s.parse().map(Some),
			Some(Value::Number(n)) => match n.as_u64() {
				Some(1) => Ok(Some(OrderStatus::Pending)),
				Some(2) => Ok(Some(OrderStatus::Completed)),
				Some(3) => Ok(Some(OrderStatus::Cancelled)),
				_ => Err(ValidationError::InvalidStatus(n.to_string())),
			},
			Some(other) => Err(ValidationError::InvalidStatus(other.to_string())),
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Pending" => Ok(OrderStatus::Pending),
			"Completed" => Ok(OrderStatus::Completed),
			"Cancelled" => Ok(OrderStatus::Cancelled),
			other => Err(ValidationError::InvalidStatus(other.to_string())),
		}
	}
}

/// A stored order.
///
/// `quantity`, `order_date` and `status` are nullable columns; rows written
/// through a replace may leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Internal row id, distinct from `order_id`.
	pub id: i32,
	/// Caller-supplied unique identifier.
	pub order_id: String,
	pub customer_name: String,
	pub product_ordered: String,
	pub quantity: Option<i32>,
	pub order_date: Option<NaiveDate>,
	pub status: Option<OrderStatus>,
	/// Insertion time, set by the database.
	pub created_at: DateTime<Utc>,
}

/// Raw body of a create request.
///
/// Fields are kept loose so that presence, emptiness and coercion can be
/// checked explicitly when converting into a `NewOrder`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
	pub order_id: Option<String>,
	pub customer_name: Option<String>,
	pub product_ordered: Option<String>,
	pub quantity: Option<Value>,
	pub order_date: Option<String>,
	pub status: Option<String>,
}

/// A validated order ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
	pub order_id: String,
	pub customer_name: String,
	pub product_ordered: String,
	/// Always strictly positive.
	pub quantity: i32,
	pub order_date: NaiveDate,
	pub status: OrderStatus,
}

impl TryFrom<CreateOrderRequest> for NewOrder {
	type Error = ValidationError;

	fn try_from(request: CreateOrderRequest) -> Result<Self, Self::Error> {
		let order_id = require_text("order_id", request.order_id)?;
		let customer_name = require_text("customer_name", request.customer_name)?;
		let product_ordered = require_text("product_ordered", request.product_ordered)?;
		let quantity = parse_quantity(request.quantity.as_ref())?;
		let order_date = parse_order_date(&require_text("order_date", request.order_date)?)?;

		// An empty status falls back to the default like an absent one.
		let status = match request.status.as_deref() {
			None | Some("") => OrderStatus::default(),
			Some(value) => OrderStatus::parse_client(value)?,
		};

		Ok(NewOrder {
			order_id,
			customer_name,
			product_ordered,
			quantity,
			order_date,
			status,
		})
	}
}

/// Raw body of a replace request.
///
/// Any JSON value is accepted for every field; absent and null fields both
/// clear the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplaceOrderRequest {
	pub customer_name: Option<Value>,
	pub product_ordered: Option<Value>,
	pub quantity: Option<Value>,
	pub order_date: Option<Value>,
	pub status: Option<Value>,
}

/// Column values written by a full replace.
///
/// No semantic validation is applied: negative quantities and `Cancelled`
/// are written as given, and absent fields are written as NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceOrder {
	pub customer_name: Option<String>,
	pub product_ordered: Option<String>,
	pub quantity: Option<i32>,
	pub order_date: Option<NaiveDate>,
	pub status: Option<OrderStatus>,
}

/// Converts each field the way MySQL converts an assigned value. Fails only
/// for values the column cannot hold.
impl TryFrom<ReplaceOrderRequest> for ReplaceOrder {
	type Error = ValidationError;

	fn try_from(request: ReplaceOrderRequest) -> Result<Self, Self::Error> {
		Ok(ReplaceOrder {
			customer_name: coerce_text_column("customer_name", request.customer_name.as_ref())?,
			product_ordered: coerce_text_column("product_ordered", request.product_ordered.as_ref())?,
			quantity: coerce_int_column("quantity", request.quantity.as_ref())?,
			order_date: coerce_date_column("order_date", request.order_date.as_ref())?,
			status: OrderStatus::from_column(request.status.as_ref())?,
		})
	}
}

/// Raw body of a status update request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
	pub status: Option<String>,
}

/// A validated status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
	pub status: OrderStatus,
}

impl TryFrom<StatusUpdateRequest> for StatusUpdate {
	type Error = ValidationError;

	fn try_from(request: StatusUpdateRequest) -> Result<Self, Self::Error> {
		let value = request.status.unwrap_or_default();
		Ok(StatusUpdate {
			status: OrderStatus::parse_client(&value)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn create_request(body: Value) -> CreateOrderRequest {
		serde_json::from_value(body).unwrap()
	}

	#[test]
	fn test_new_order_defaults_status_to_pending() {
		let order = NewOrder::try_from(create_request(json!({
			"order_id": "A1",
			"customer_name": "Jo",
			"product_ordered": "Bread",
			"quantity": 2,
			"order_date": "2024-01-01"
		})))
		.unwrap();

		assert_eq!(order.order_id, "A1");
		assert_eq!(order.quantity, 2);
		assert_eq!(order.order_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
		assert_eq!(order.status, OrderStatus::Pending);
	}

	#[test]
	fn test_new_order_empty_status_is_default() {
		let order = NewOrder::try_from(create_request(json!({
			"order_id": "A1",
			"customer_name": "Jo",
			"product_ordered": "Bread",
			"quantity": "3",
			"order_date": "2024-01-01",
			"status": ""
		})))
		.unwrap();

		assert_eq!(order.quantity, 3);
		assert_eq!(order.status, OrderStatus::Pending);
	}

	#[test]
	fn test_new_order_accepts_completed() {
		let order = NewOrder::try_from(create_request(json!({
			"order_id": "A2",
			"customer_name": "Jo",
			"product_ordered": "Cake",
			"quantity": 1,
			"order_date": "2024-03-05",
			"status": "Completed"
		})))
		.unwrap();

		assert_eq!(order.status, OrderStatus::Completed);
	}

	#[test]
	fn test_new_order_rejects_cancelled_and_unknown_status() {
		for status in ["Cancelled", "pending", "Shipped"] {
			let result = NewOrder::try_from(create_request(json!({
				"order_id": "A1",
				"customer_name": "Jo",
				"product_ordered": "Bread",
				"quantity": 2,
				"order_date": "2024-01-01",
				"status": status
			})));
			assert_eq!(
				result,
				Err(ValidationError::InvalidStatus(status.to_string()))
			);
		}
	}

	#[test]
	fn test_new_order_reports_missing_fields() {
		let result = NewOrder::try_from(create_request(json!({
			"customer_name": "Jo",
			"product_ordered": "Bread",
			"quantity": 2,
			"order_date": "2024-01-01"
		})));
		assert_eq!(result, Err(ValidationError::MissingField("order_id")));

		let result = NewOrder::try_from(create_request(json!({
			"order_id": "A1",
			"customer_name": "Jo",
			"product_ordered": "Bread",
			"quantity": 2,
			"order_date": ""
		})));
		assert_eq!(result, Err(ValidationError::MissingField("order_date")));
	}

	#[test]
	fn test_status_parsing() {
		assert_eq!("Cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
		assert_eq!(
			OrderStatus::parse_client("Completed").unwrap(),
			OrderStatus::Completed
		);
		assert!(OrderStatus::parse_client("Cancelled").is_err());
		assert!(OrderStatus::parse_client("").is_err());
	}

	#[test]
	fn test_status_update_requires_status() {
		let update = StatusUpdate::try_from(StatusUpdateRequest {
			status: Some("Completed".into()),
		})
		.unwrap();
		assert_eq!(update.status, OrderStatus::Completed);

		let result = StatusUpdate::try_from(StatusUpdateRequest { status: None });
		assert_eq!(result, Err(ValidationError::InvalidStatus(String::new())));
	}

	#[test]
	fn test_order_serialization() {
		let order = Order {
			id: 1,
			order_id: "A1".into(),
			customer_name: "Jo".into(),
			product_ordered: "Bread".into(),
			quantity: Some(2),
			order_date: NaiveDate::from_ymd_opt(2024, 1, 1),
			status: Some(OrderStatus::Pending),
			created_at: DateTime::parse_from_rfc3339("2024-01-01T08:00:00Z")
				.unwrap()
				.with_timezone(&Utc),
		};

		let value = serde_json::to_value(&order).unwrap();
		assert_eq!(value["order_date"], "2024-01-01");
		assert_eq!(value["status"], "Pending");
		assert_eq!(value["quantity"], 2);
		assert_eq!(value["created_at"], "2024-01-01T08:00:00Z");
	}

	fn replace_request(body: Value) -> ReplaceOrderRequest {
		serde_json::from_value(body).unwrap()
	}

	#[test]
	fn test_replace_order_allows_cancelled() {
		let replace = ReplaceOrder::try_from(replace_request(json!({
			"customer_name": "Jo",
			"product_ordered": "Bread",
			"quantity": -4,
			"order_date": "2024-01-02",
			"status": "Cancelled"
		})))
		.unwrap();

		assert_eq!(replace.quantity, Some(-4));
		assert_eq!(replace.status, Some(OrderStatus::Cancelled));
	}

	#[test]
	fn test_replace_order_coerces_loose_values() {
		let replace = ReplaceOrder::try_from(replace_request(json!({
			"customer_name": "Jo",
			"product_ordered": "Bread",
			"quantity": "3",
			"order_date": "2024-01-02T08:00:00Z",
			"status": 2
		})))
		.unwrap();

		assert_eq!(replace.quantity, Some(3));
		assert_eq!(replace.order_date, NaiveDate::from_ymd_opt(2024, 1, 2));
		assert_eq!(replace.status, Some(OrderStatus::Completed));

		let replace = ReplaceOrder::try_from(replace_request(json!({
			"quantity": 2.0,
			"status": null
		})))
		.unwrap();
		assert_eq!(replace.quantity, Some(2));
		assert_eq!(replace, ReplaceOrder { quantity: Some(2), ..ReplaceOrder::default() });
	}

	#[test]
	fn test_replace_order_rejects_values_columns_cannot_hold() {
		for body in [
			json!({ "quantity": "two" }),
			json!({ "order_date": "next week" }),
			json!({ "status": "Shipped" }),
			json!({ "status": "" }),
			json!({ "customer_name": ["Jo"] }),
		] {
			assert!(
				ReplaceOrder::try_from(replace_request(body.clone())).is_err(),
				"body: {}",
				body
			);
		}
	}
}
