//! Database password that never appears in logs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// Zeroed on drop. `Debug`, `Display` and `Serialize` print a placeholder,
/// so a whole `Config` can be logged.
#[derive(Clone, Default)]
pub struct Password(Zeroizing<String>);

impl Password {
	/// Returns the plain text, for building connect options.
	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<String> for Password {
	fn from(s: String) -> Self {
		Self(Zeroizing::new(s))
	}
}

impl From<&str> for Password {
	fn from(s: &str) -> Self {
		Self::from(s.to_string())
	}
}

impl fmt::Debug for Password {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Password({})", REDACTED)
	}
}

impl fmt::Display for Password {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl Serialize for Password {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for Password {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Password::from)
	}
}
