//! Wire types for the facegate protocol.
//!
//! This crate contains the serde-serializable types exchanged with the
//! face-recognition server: REST request/response bodies and the `{type, payload}`
//! envelope carried over the event channel.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with the server: Field names match the JSON the server emits
//! * Lenient: Optional fields default instead of failing the whole body
//!
//! Higher-level session and channel APIs are built on top of these types in `facegate-rs`.

pub mod admin;
pub mod auth;
pub mod capture;
pub mod envelope;
pub mod recognition;

pub use admin::*;
pub use auth::*;
pub use capture::*;
pub use envelope::*;
pub use recognition::*;

use serde::{Deserialize, Serialize};

/// Status marker most server responses carry (`"success"` or `"error"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
	Success,
	Error,
}

/// Error body shape returned by the server.
///
/// Older endpoints report `error`, newer ones `message`; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<ResponseStatus>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl ErrorBody {
	/// Best human-readable message, preferring `error` over `message`.
	pub fn best_message(&self) -> Option<&str> {
		self.error.as_deref().or(self.message.as_deref())
	}

	/// Extracts an error body from an arbitrary JSON value, if it looks like one.
	pub fn from_value(value: &serde_json::Value) -> Option<Self> {
		serde_json::from_value(value.clone()).ok()
	}
}
