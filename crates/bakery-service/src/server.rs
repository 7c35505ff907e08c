//! HTTP server for the bakery order API.
//!
//! Routes live under `/api`. Every handler shares one `OrderStore` through
//! `AppState`; no other state is kept in process.

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	response::Json,
	routing::{get, patch, put},
	Router,
};
use bakery_config::ServerConfig;
use bakery_storage::OrderStore;
use bakery_types::{
	APIError, CreateOrderRequest, Order, ReplaceOrderRequest, StatusUpdateRequest,
	SuccessResponse,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Order persistence, shared by all requests.
	pub store: Arc<dyn OrderStore>,
}

impl AppState {
	pub fn new(store: Arc<dyn OrderStore>) -> Self {
		Self { store }
	}
}

/// Builds the API router with tracing and permissive CORS.
pub fn build_router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", get(handle_list_orders).post(handle_create_order))
				.route(
					"/orders/{order_id}",
					put(handle_replace_order).delete(handle_delete_order),
				)
				.route("/orders/{order_id}/status", patch(handle_update_status)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server and serves until Ctrl-C.
pub async fn start_server(
	config: ServerConfig,
	store: Arc<dyn OrderStore>,
) -> Result<(), Box<dyn std::error::Error>> {
	let bind_address = format!("{}:{}", config.host, config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Bakery API server running on http://{}", bind_address);

	serve(listener, store, shutdown_signal()).await?;
	Ok(())
}

/// Serves the API on `listener` until `shutdown` completes, then closes the
/// store.
pub async fn serve<F>(
	listener: TcpListener,
	store: Arc<dyn OrderStore>,
	shutdown: F,
) -> std::io::Result<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	let app = build_router(AppState::new(store.clone()));

	let served = axum::serve(listener, app)
		.with_graceful_shutdown(shutdown)
		.await;
	store.close().await;
	served?;

	tracing::info!("Bakery API server stopped");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::warn!("Failed to listen for shutdown signal: {}", e);
		std::future::pending::<()>().await;
	}
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, APIError> {
	let Json(request) = payload.map_err(|e| {
		tracing::warn!("Unreadable order body: {}", e);
		APIError::invalid_input()
	})?;
	crate::apis::order::create_order(state.store.as_ref(), request)
		.await
		.map(Json)
}

/// Handles GET /api/orders requests.
async fn handle_list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, APIError> {
	crate::apis::order::list_orders(state.store.as_ref())
		.await
		.map(Json)
}

/// Handles PUT /api/orders/{order_id} requests.
async fn handle_replace_order(
	Path(order_id): Path<String>,
	State(state): State<AppState>,
	payload: Result<Json<ReplaceOrderRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, APIError> {
	let Json(request) = payload.map_err(|e| {
		tracing::warn!("Unreadable replace body for {}: {}", order_id, e);
		APIError::invalid_input()
	})?;
	crate::apis::order::replace_order(state.store.as_ref(), &order_id, request)
		.await
		.map(Json)
}

/// Handles DELETE /api/orders/{order_id} requests.
async fn handle_delete_order(
	Path(order_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, APIError> {
	crate::apis::order::delete_order(state.store.as_ref(), &order_id)
		.await
		.map(Json)
}

/// Handles PATCH /api/orders/{order_id}/status requests.
async fn handle_update_status(
	Path(order_id): Path<String>,
	State(state): State<AppState>,
	payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, APIError> {
	let Json(request) = payload.map_err(|e| {
		tracing::warn!("Unreadable status body for {}: {}", order_id, e);
		APIError::invalid_status()
	})?;
	crate::apis::order::update_status(state.store.as_ref(), &order_id, request)
		.await
		.map(Json)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{
		body::Body,
		http::{header, Method, Request, StatusCode},
	};
	use bakery_storage::{MemoryOrderStore, MockOrderStore, StorageError};
	use http_body_util::BodyExt;
	use serde_json::{json, Value};
	use tower::ServiceExt;

	fn test_app() -> Router {
		build_router(AppState::new(Arc::new(MemoryOrderStore::new())))
	}

	async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let builder = Request::builder().method(method).uri(uri);
		let request = match body {
			Some(body) => builder
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};

		let response = app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = response.into_body().collect().await.unwrap().to_bytes();
		let value = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, value)
	}

	fn bread_order() -> Value {
		json!({
			"order_id": "A1",
			"customer_name": "Jo",
			"product_ordered": "Bread",
			"quantity": 2,
			"order_date": "2024-01-01"
		})
	}

	#[tokio::test]
	async fn test_order_lifecycle() {
		let app = test_app();

		let (status, body) = send(&app, Method::POST, "/api/orders", Some(bread_order())).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({ "success": true, "message": "Order added successfully" }));

		let (status, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(status, StatusCode::OK);
		let orders = body.as_array().unwrap();
		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0]["order_id"], "A1");
		assert_eq!(orders[0]["order_date"], "2024-01-01");
		assert_eq!(orders[0]["status"], "Pending");

		let (status, body) = send(&app, Method::POST, "/api/orders", Some(bread_order())).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body, json!({ "error": "Order ID already exists" }));

		let (status, body) = send(
			&app,
			Method::PATCH,
			"/api/orders/A1/status",
			Some(json!({ "status": "Completed" })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({ "success": true, "message": "Status updated" }));

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body[0]["status"], "Completed");
		assert_eq!(body[0]["customer_name"], "Jo");
		assert_eq!(body[0]["quantity"], 2);

		let (status, body) = send(&app, Method::DELETE, "/api/orders/A1", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({ "success": true, "message": "Order deleted successfully" }));

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body, json!([]));
	}

	#[tokio::test]
	async fn test_create_rejects_invalid_input() {
		let app = test_app();

		let mut missing_quantity = bread_order();
		missing_quantity.as_object_mut().unwrap().remove("quantity");
		let mut fractional = bread_order();
		fractional["quantity"] = json!("2.5");

		for body in [missing_quantity, fractional, json!({})] {
			let (status, response) = send(&app, Method::POST, "/api/orders", Some(body)).await;
			assert_eq!(status, StatusCode::BAD_REQUEST);
			assert_eq!(response, json!({ "error": "Invalid input" }));
		}

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body, json!([]));
	}

	#[tokio::test]
	async fn test_unreadable_bodies_are_client_errors() {
		let app = test_app();

		let request = Request::builder()
			.method(Method::POST)
			.uri("/api/orders")
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from("{not json"))
			.unwrap();
		let response = app.clone().oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let (status, body) = send(
			&app,
			Method::PATCH,
			"/api/orders/A1/status",
			Some(json!({ "status": 3 })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body, json!({ "error": "Invalid status" }));
	}

	#[tokio::test]
	async fn test_invalid_status_leaves_order_unchanged() {
		let app = test_app();
		send(&app, Method::POST, "/api/orders", Some(bread_order())).await;

		let (status, body) = send(
			&app,
			Method::PATCH,
			"/api/orders/A1/status",
			Some(json!({ "status": "Cancelled" })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body, json!({ "error": "Invalid status" }));

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body[0]["status"], "Pending");
	}

	#[tokio::test]
	async fn test_mutations_on_missing_order_succeed() {
		let app = test_app();
		send(&app, Method::POST, "/api/orders", Some(bread_order())).await;

		let (status, _) = send(&app, Method::DELETE, "/api/orders/nope", None).await;
		assert_eq!(status, StatusCode::OK);

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/nope",
			Some(json!({
				"customer_name": "Sam",
				"product_ordered": "Scone",
				"quantity": 1,
				"order_date": "2024-02-02",
				"status": "Pending"
			})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({ "success": true, "message": "Order updated successfully" }));

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body.as_array().unwrap().len(), 1);
		assert_eq!(body[0]["customer_name"], "Jo");
	}

	#[tokio::test]
	async fn test_replace_overwrites_fields() {
		let app = test_app();
		send(&app, Method::POST, "/api/orders", Some(bread_order())).await;

		let (status, _) = send(
			&app,
			Method::PUT,
			"/api/orders/A1",
			Some(json!({
				"customer_name": "Sam",
				"product_ordered": "Scone",
				"quantity": 5,
				"order_date": "2024-02-02",
				"status": "Completed"
			})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body[0]["order_id"], "A1");
		assert_eq!(body[0]["customer_name"], "Sam");
		assert_eq!(body[0]["product_ordered"], "Scone");
		assert_eq!(body[0]["quantity"], 5);
		assert_eq!(body[0]["order_date"], "2024-02-02");
		assert_eq!(body[0]["status"], "Completed");
	}

	#[tokio::test]
	async fn test_replace_takes_values_create_takes() {
		let app = test_app();
		let mut order = bread_order();
		order["quantity"] = json!("2");
		let (status, _) = send(&app, Method::POST, "/api/orders", Some(order)).await;
		assert_eq!(status, StatusCode::OK);

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/A1",
			Some(json!({
				"customer_name": "Jo",
				"product_ordered": "Bread",
				"quantity": "3",
				"order_date": "2024-01-05T10:00:00Z",
				"status": "Pending"
			})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({ "success": true, "message": "Order updated successfully" }));

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body[0]["quantity"], 3);
		assert_eq!(body[0]["order_date"], "2024-01-05");

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/A1",
			Some(json!({ "customer_name": "Jo", "product_ordered": "Bread", "quantity": 2.0 })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["success"], true);
	}

	#[tokio::test]
	async fn test_replace_with_unstorable_value_is_server_error() {
		let app = test_app();
		send(&app, Method::POST, "/api/orders", Some(bread_order())).await;

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/A1",
			Some(json!({ "customer_name": "Jo", "product_ordered": "Bread", "quantity": "lots" })),
		)
		.await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, json!({ "error": "Server error" }));

		let (_, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(body[0]["quantity"], 2);
	}

	#[tokio::test]
	async fn test_storage_failures_do_not_leak_detail() {
		let mut store = MockOrderStore::new();
		store
			.expect_list()
			.returning(|| Err(StorageError::Connection("Access denied for user 'root'".into())));
		store
			.expect_delete()
			.returning(|_| Err(StorageError::Backend("lock wait timeout".into())));
		let app = build_router(AppState::new(Arc::new(store)));

		let (status, body) = send(&app, Method::GET, "/api/orders", None).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, json!({ "error": "Server error" }));

		let (status, body) = send(&app, Method::DELETE, "/api/orders/A1", None).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, json!({ "error": "Server error" }));
	}

	#[tokio::test]
	async fn test_shutdown_closes_store() {
		let mut store = MockOrderStore::new();
		store.expect_close().times(1).return_const(());
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

		serve(listener, Arc::new(store), async {}).await.unwrap();
	}

	#[tokio::test]
	async fn test_cors_headers_present() {
		let app = test_app();
		let request = Request::builder()
			.method(Method::GET)
			.uri("/api/orders")
			.header(header::ORIGIN, "http://localhost:3000")
			.body(Body::empty())
			.unwrap();

		let response = app.oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
			"*"
		);
	}
}
