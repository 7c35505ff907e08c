//! API types for the bakery HTTP API.
//!
//! Every error leaves the service as a small JSON body with a single
//! `error` field; the HTTP status carries the category.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message returned when a create or replace body is rejected.
pub const INVALID_INPUT: &str = "Invalid input";
/// Message returned when a status update carries an unknown status.
pub const INVALID_STATUS: &str = "Invalid status";
/// Message returned when an order id is already taken.
pub const DUPLICATE_ORDER: &str = "Order ID already exists";
/// Message returned for any storage or infrastructure failure.
pub const SERVER_ERROR: &str = "Server error";

/// Acknowledgment body for successful writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
	pub success: bool,
	pub message: String,
}

impl SuccessResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
		}
	}
}

/// API error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Human-readable description
	pub error: String,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum APIError {
	/// Client input error (400)
	BadRequest { message: String },
	/// Uniqueness conflict (409)
	Conflict { message: String },
	/// Storage or infrastructure failure (500)
	InternalServerError { message: String },
}

impl APIError {
	pub fn invalid_input() -> Self {
		APIError::BadRequest {
			message: INVALID_INPUT.to_string(),
		}
	}

	pub fn invalid_status() -> Self {
		APIError::BadRequest {
			message: INVALID_STATUS.to_string(),
		}
	}

	pub fn duplicate_order() -> Self {
		APIError::Conflict {
			message: DUPLICATE_ORDER.to_string(),
		}
	}

	pub fn server_error() -> Self {
		APIError::InternalServerError {
			message: SERVER_ERROR.to_string(),
		}
	}

	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> StatusCode {
		match self {
			APIError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			APIError::Conflict { .. } => StatusCode::CONFLICT,
			APIError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let message = match self {
			APIError::BadRequest { message }
			| APIError::Conflict { message }
			| APIError::InternalServerError { message } => message,
		};
		ErrorResponse {
			error: message.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message } => write!(f, "Bad Request: {}", message),
			APIError::Conflict { message } => write!(f, "Conflict: {}", message),
			APIError::InternalServerError { message } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}
