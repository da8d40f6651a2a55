//! Event channel envelope.
//!
//! Every frame on the event channel is a JSON object of the form
//! `{"type": "<event>", "payload": <any>}` in both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Synthetic event emitted locally when the channel opens. Never sent over the wire.
pub const EVENT_CONNECTED: &str = "connected";
/// Synthetic event emitted locally when the channel closes. Never sent over the wire.
pub const EVENT_DISCONNECTED: &str = "disconnected";
/// Synthetic event emitted locally on a transport error. Never sent over the wire.
pub const EVENT_ERROR: &str = "error";

/// Returns `true` for the event names reserved for local lifecycle notifications.
pub fn is_local_event(name: &str) -> bool {
	matches!(name, EVENT_CONNECTED | EVENT_DISCONNECTED | EVENT_ERROR)
}

/// The `{type, payload}` wire unit exchanged over the event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub payload: Value,
}

impl Envelope {
	pub fn new(kind: impl Into<String>, payload: Value) -> Self {
		Self { kind: kind.into(), payload }
	}
}
