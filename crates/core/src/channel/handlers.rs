use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Callback for one event type. Removal is by handle identity, so keep the
/// `Arc` returned from [`super::EventChannel::on`] to unsubscribe later.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Event type to ordered handler list.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
	handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
}

impl HandlerRegistry {
	pub fn subscribe(&self, event: &str, handler: EventHandler) {
		self.handlers.lock().entry(event.to_string()).or_default().push(handler);
	}

	/// Removes every registration of `handler` for `event`. Returns how many
	/// were removed.
	pub fn unsubscribe(&self, event: &str, handler: &EventHandler) -> usize {
		let mut handlers = self.handlers.lock();
		let Some(list) = handlers.get_mut(event) else {
			return 0;
		};
		let before = list.len();
		list.retain(|h| !Arc::ptr_eq(h, handler));
		let removed = before - list.len();
		if list.is_empty() {
			handlers.remove(event);
		}
		removed
	}

	pub fn handler_count(&self, event: &str) -> usize {
		self.handlers.lock().get(event).map_or(0, Vec::len)
	}

	/// Invokes a snapshot of the handlers for `event` in registration order.
	/// Handlers may subscribe or unsubscribe while being called.
	pub fn emit(&self, event: &str, payload: &Value) -> usize {
		let snapshot: Vec<EventHandler> = match self.handlers.lock().get(event) {
			Some(list) => list.clone(),
			None => return 0,
		};
		for handler in &snapshot {
			handler(payload);
		}
		debug!(target: "facegate.channel", event, handlers = snapshot.len(), "event dispatched");
		snapshot.len()
	}
}

/// Wraps a typed callback as an [`EventHandler`]. Payloads that do not
/// deserialize into `T` are logged and skipped.
pub fn typed_handler<T, F>(event: &'static str, f: F) -> EventHandler
where
	T: DeserializeOwned,
	F: Fn(T) + Send + Sync + 'static,
{
	Arc::new(move |payload: &Value| match T::deserialize(payload) {
		Ok(value) => f(value),
		Err(err) => debug!(target: "facegate.channel", event, error = %err, "payload did not match handler type"),
	})
}
