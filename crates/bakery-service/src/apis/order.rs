//! Bakery Order API Implementation
//!
//! Each function here implements one order endpoint against an `OrderStore`.
//! Storage failures are mapped to API errors locally; driver detail is
//! logged and never returned to the caller.

use bakery_storage::OrderStore;
use bakery_types::{
	APIError, CreateOrderRequest, NewOrder, Order, ReplaceOrder, ReplaceOrderRequest,
	StatusUpdate, StatusUpdateRequest, SuccessResponse,
};
use tracing::{debug, error, info, warn};

/// Handles POST /api/orders.
pub async fn create_order(
	store: &dyn OrderStore,
	request: CreateOrderRequest,
) -> Result<SuccessResponse, APIError> {
	let order = NewOrder::try_from(request).map_err(|e| {
		warn!("Rejected order: {}", e);
		APIError::invalid_input()
	})?;

	match store.insert(&order).await {
		Ok(()) => {
			info!("Order {} added", order.order_id);
			Ok(SuccessResponse::new("Order added successfully"))
		},
		Err(e) if e.is_conflict() => {
			warn!("Order {} already exists: {}", order.order_id, e);
			Err(APIError::duplicate_order())
		},
		Err(e) => {
			error!("Failed to add order {}: {}", order.order_id, e);
			Err(APIError::server_error())
		},
	}
}

/// Handles GET /api/orders.
pub async fn list_orders(store: &dyn OrderStore) -> Result<Vec<Order>, APIError> {
	store.list().await.map_err(|e| {
		error!("Failed to list orders: {}", e);
		APIError::server_error()
	})
}

/// Handles PUT /api/orders/{order_id}.
///
/// Fields are written without validation, and a missing order still
/// reports success. A value no column can hold fails like any other
/// rejected write.
pub async fn replace_order(
	store: &dyn OrderStore,
	order_id: &str,
	request: ReplaceOrderRequest,
) -> Result<SuccessResponse, APIError> {
	let fields = ReplaceOrder::try_from(request).map_err(|e| {
		error!("Failed to update order {}: {}", order_id, e);
		APIError::server_error()
	})?;

	match store.replace(order_id, &fields).await {
		Ok(affected) => {
			if affected == 0 {
				debug!("Replace matched no order with id {}", order_id);
			} else {
				info!("Order {} updated", order_id);
			}
			Ok(SuccessResponse::new("Order updated successfully"))
		},
		Err(e) => {
			error!("Failed to update order {}: {}", order_id, e);
			Err(APIError::server_error())
		},
	}
}

/// Handles DELETE /api/orders/{order_id}.
pub async fn delete_order(
	store: &dyn OrderStore,
	order_id: &str,
) -> Result<SuccessResponse, APIError> {
	match store.delete(order_id).await {
		Ok(affected) => {
			if affected == 0 {
				debug!("Delete matched no order with id {}", order_id);
			} else {
				info!("Order {} deleted", order_id);
			}
			Ok(SuccessResponse::new("Order deleted successfully"))
		},
		Err(e) => {
			error!("Failed to delete order {}: {}", order_id, e);
			Err(APIError::server_error())
		},
	}
}

/// Handles PATCH /api/orders/{order_id}/status.
pub async fn update_status(
	store: &dyn OrderStore,
	order_id: &str,
	request: StatusUpdateRequest,
) -> Result<SuccessResponse, APIError> {
	let update = StatusUpdate::try_from(request).map_err(|e| {
		warn!("Rejected status update for {}: {}", order_id, e);
		APIError::invalid_status()
	})?;

	match store.update_status(order_id, update.status).await {
		Ok(affected) => {
			if affected == 0 {
				debug!("Status update matched no order with id {}", order_id);
			} else {
				info!("Order {} status set to {}", order_id, update.status);
			}
			Ok(SuccessResponse::new("Status updated"))
		},
		Err(e) => {
			error!("Failed to update status of order {}: {}", order_id, e);
			Err(APIError::server_error())
		},
	}
}
