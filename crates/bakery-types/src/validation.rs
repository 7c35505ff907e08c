//! Input validation for order requests.
//!
//! Request bodies arrive loosely typed; the helpers here coerce individual
//! fields into their domain types and report the first field that fails.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while turning a request body into a validated input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// A required field is absent, null, empty or zero.
	#[error("Missing required field: {0}")]
	MissingField(&'static str),
	/// A field is present but cannot be coerced into its domain type.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue {
		field: &'static str,
		message: String,
	},
	/// A status outside the values clients may set.
	#[error("Invalid status: {0}")]
	InvalidStatus(String),
}

impl ValidationError {
	fn invalid(field: &'static str, message: impl Into<String>) -> Self {
		ValidationError::InvalidValue {
			field,
			message: message.into(),
		}
	}
}

/// Returns the text of a required string field.
///
/// Absent and empty values are both treated as missing.
pub fn require_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
	match value {
		Some(text) if !text.is_empty() => Ok(text),
		_ => Err(ValidationError::MissingField(field)),
	}
}

/// Coerces a quantity into a positive whole number.
///
/// Accepts JSON integers, floats without a fractional part and numeric
/// strings. Zero, empty strings and null count as missing; everything else
/// that is not a positive integer within the column range is invalid.
pub fn parse_quantity(value: Option<&Value>) -> Result<i32, ValidationError> {
	const FIELD: &str = "quantity";

	let number = match value {
		None | Some(Value::Null) => return Err(ValidationError::MissingField(FIELD)),
		Some(Value::Number(n)) => {
			if let Some(i) = n.as_i64() {
				i as f64
			} else {
				n.as_f64()
					.ok_or_else(|| ValidationError::invalid(FIELD, "not a number"))?
			}
		},
		Some(Value::String(s)) => {
			if s.is_empty() {
				return Err(ValidationError::MissingField(FIELD));
			}
			s.trim()
				.parse::<f64>()
				.map_err(|_| ValidationError::invalid(FIELD, format!("'{}' is not a number", s)))?
		},
		Some(other) => {
			return Err(ValidationError::invalid(
				FIELD,
				format!("unsupported type: {}", other),
			))
		},
	};

	if number == 0.0 {
		return Err(ValidationError::MissingField(FIELD));
	}
	if !number.is_finite() || number.fract() != 0.0 {
		return Err(ValidationError::invalid(FIELD, "must be a whole number"));
	}
	if number < 0.0 {
		return Err(ValidationError::invalid(FIELD, "must be positive"));
	}
	if number > i32::MAX as f64 {
		return Err(ValidationError::invalid(FIELD, "exceeds the maximum quantity"));
	}

	Ok(number as i32)
}

/// Parses an order date given as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_order_date(value: &str) -> Result<NaiveDate, ValidationError> {
	const FIELD: &str = "order_date";

	if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
		return Ok(date);
	}
	DateTime::parse_from_rfc3339(value)
		.map(|timestamp| timestamp.date_naive())
		.map_err(|_| ValidationError::invalid(FIELD, format!("'{}' is not a date", value)))
}

/// Converts a value written to a nullable text column.
///
/// Numbers and booleans are stored as their text form, as MySQL does when
/// assigning them to a `VARCHAR`.
pub fn coerce_text_column(
	field: &'static str,
	value: Option<&Value>,
) -> Result<Option<String>, ValidationError> {
	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => Ok(Some(s.clone())),
		Some(Value::Number(n)) => Ok(Some(n.to_string())),
		Some(Value::Bool(b)) => Ok(Some(if *b { "1" } else { "0" }.to_string())),
		Some(other) => Err(ValidationError::invalid(
			field,
			format!("cannot store {} in a text column", other),
		)),
	}
}

/// Converts a value written to a nullable `INT` column.
///
/// Numeric strings are parsed and fractions round half away from zero.
/// Values that do not parse or fall outside the column range are rejected.
pub fn coerce_int_column(
	field: &'static str,
	value: Option<&Value>,
) -> Result<Option<i32>, ValidationError> {
	let number = match value {
		None | Some(Value::Null) => return Ok(None),
		Some(Value::Bool(b)) => return Ok(Some(i32::from(*b))),
		Some(Value::Number(n)) => match n.as_i64() {
			Some(i) => i as f64,
			None => n
				.as_f64()
				.ok_or_else(|| ValidationError::invalid(field, "not a number"))?,
		},
		Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
			ValidationError::invalid(field, format!("incorrect integer value '{}'", s))
		})?,
		Some(other) => {
			return Err(ValidationError::invalid(
				field,
				format!("cannot store {} in an integer column", other),
			))
		},
	};

	let rounded = number.round();
	if !rounded.is_finite() || rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
		return Err(ValidationError::invalid(field, "out of range for an integer column"));
	}
	Ok(Some(rounded as i32))
}

/// Converts a value written to a nullable `DATE` column.
///
/// Besides the formats `parse_order_date` accepts, a `YYYY-MM-DD HH:MM:SS`
/// timestamp keeps its date part and an integer is read as `YYYYMMDD`.
pub fn coerce_date_column(
	field: &'static str,
	value: Option<&Value>,
) -> Result<Option<NaiveDate>, ValidationError> {
	let incorrect = |v: &dyn std::fmt::Display| {
		ValidationError::invalid(field, format!("incorrect date value '{}'", v))
	};

	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(s)) => {
			let s = s.trim();
			if let Ok(date) = parse_order_date(s) {
				return Ok(Some(date));
			}
			NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
				.or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
				.map(|timestamp| Some(timestamp.date()))
				.map_err(|_| incorrect(&s))
		},
		Some(Value::Number(n)) => n
			.as_u64()
			.and_then(|digits| NaiveDate::parse_from_str(&digits.to_string(), "%Y%m%d").ok())
			.map(Some)
			.ok_or_else(|| incorrect(n)),
		Some(other) => Err(incorrect(other)),
	}
}
