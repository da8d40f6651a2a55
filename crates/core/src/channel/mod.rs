//! Reconnecting WebSocket event channel.
//!
//! One [`EventChannel`] keeps at most one live connection to its server. Inbound
//! text frames are parsed as `{type, payload}` envelopes and the payload is
//! dispatched to every handler registered for `type`. Three events are raised
//! locally and never come from the wire in normal operation:
//!
//! - `connected` when a connection opens,
//! - `disconnected` when it closes (including a failed open),
//! - `error` with the failure text as a string payload.
//!
//! # Reconnection
//!
//! An unexpected closure schedules attempt `k` after `base_delay * k`, up to
//! `max_attempts`. A successful open resets the counter. Once exhausted the
//! channel stays down until [`EventChannel::connect`] is called again.
//! [`EventChannel::disconnect`] never triggers a reconnect.
//!
//! Every `connect`/`disconnect` bumps a generation counter. Connection tasks
//! carry the generation they were started under and stop emitting as soon as it
//! is stale, so a closed connection can neither dispatch late messages nor
//! schedule a reconnect.
//!
//! Background tasks only hold a weak reference to the channel. Dropping the
//! last [`EventChannel`] handle closes the socket and cancels any pending
//! reconnect.

mod handlers;
mod reconnect;

use std::sync::{Arc, Weak};

use facegate_protocol::{EVENT_CONNECTED, EVENT_DISCONNECTED, EVENT_ERROR, Envelope, is_local_event};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

pub use handlers::{EventHandler, typed_handler};
pub use reconnect::ReconnectPolicy;

use crate::error::{Error, Result};
use handlers::HandlerRegistry;

/// Connection lifecycle as observed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
	Disconnected,
	Connecting,
	Open,
	/// Waiting for the backoff timer before the next attempt.
	Reconnecting,
	/// The retry budget is spent; only `connect()` revives the channel.
	Exhausted,
}

/// Parses one inbound frame.
pub fn parse_envelope(text: &str) -> Result<Envelope> {
	serde_json::from_str(text).map_err(|err| Error::ChannelParse(err.to_string()))
}

struct Shared {
	state: ChannelState,
	attempts: u32,
	generation: u64,
	outbound: Option<mpsc::UnboundedSender<Message>>,
	reconnect_task: Option<JoinHandle<()>>,
}

struct Inner {
	url: String,
	policy: ReconnectPolicy,
	handlers: HandlerRegistry,
	shared: Mutex<Shared>,
}

/// Handle to a reconnecting event channel. Clones share the connection and
/// the handler table.
#[derive(Clone)]
pub struct EventChannel {
	inner: Arc<Inner>,
}

impl std::fmt::Debug for EventChannel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let shared = self.inner.shared.lock();
		f.debug_struct("EventChannel")
			.field("url", &self.inner.url)
			.field("state", &shared.state)
			.field("attempts", &shared.attempts)
			.finish()
	}
}

impl EventChannel {
	pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
		Self {
			inner: Arc::new(Inner {
				url: url.into(),
				policy,
				handlers: HandlerRegistry::default(),
				shared: Mutex::new(Shared {
					state: ChannelState::Disconnected,
					attempts: 0,
					generation: 0,
					outbound: None,
					reconnect_task: None,
				}),
			}),
		}
	}

	pub fn url(&self) -> &str {
		&self.inner.url
	}

	pub fn policy(&self) -> ReconnectPolicy {
		self.inner.policy
	}

	/// Opens a connection in the background, replacing any live one. Resets the
	/// attempt counter and cancels a pending reconnect.
	pub fn connect(&self) {
		let generation = {
			let mut shared = self.inner.shared.lock();
			if let Some(timer) = shared.reconnect_task.take() {
				timer.abort();
			}
			shared.attempts = 0;
			shared.generation += 1;
			shared.outbound = None;
			shared.state = ChannelState::Connecting;
			shared.generation
		};
		debug!(target: "facegate.channel", url = %self.inner.url, generation, "connecting");
		tokio::spawn(run_connection(Arc::downgrade(&self.inner), self.inner.url.clone(), generation));
	}

	/// Closes the live connection, if any, and cancels a pending reconnect.
	/// Emits `disconnected` when a connection was open.
	pub fn disconnect(&self) {
		let was_open = {
			let mut shared = self.inner.shared.lock();
			if let Some(timer) = shared.reconnect_task.take() {
				timer.abort();
			}
			shared.generation += 1;
			shared.outbound = None;
			let was_open = shared.state == ChannelState::Open;
			shared.state = ChannelState::Disconnected;
			was_open
		};
		if was_open {
			info!(target: "facegate.channel", "disconnected by caller");
			self.inner.handlers.emit(EVENT_DISCONNECTED, &Value::Null);
		}
	}

	/// Sends `{type, payload}` when the connection is open. Returns `false`
	/// (and drops the message) otherwise.
	pub fn send(&self, kind: &str, payload: Value) -> bool {
		let text = match serde_json::to_string(&Envelope::new(kind, payload)) {
			Ok(text) => text,
			Err(err) => {
				warn!(target: "facegate.channel", event = kind, error = %err, "cannot serialize envelope");
				return false;
			}
		};

		let shared = self.inner.shared.lock();
		match (&shared.outbound, shared.state) {
			(Some(tx), ChannelState::Open) => tx.send(Message::Text(text.into())).is_ok(),
			_ => {
				debug!(target: "facegate.channel", event = kind, "channel not open, message dropped");
				false
			}
		}
	}

	/// Registers `handler` for `event` and returns the handle needed by [`off`](Self::off).
	pub fn on<F>(&self, event: &str, handler: F) -> EventHandler
	where
		F: Fn(&Value) + Send + Sync + 'static,
	{
		let handler: EventHandler = Arc::new(handler);
		self.inner.handlers.subscribe(event, handler.clone());
		handler
	}

	/// Registers an existing handle. The same handle may be registered twice.
	pub fn subscribe(&self, event: &str, handler: EventHandler) {
		self.inner.handlers.subscribe(event, handler);
	}

	/// Removes `handler` from `event`. Returns whether anything was removed.
	pub fn off(&self, event: &str, handler: &EventHandler) -> bool {
		self.inner.handlers.unsubscribe(event, handler) > 0
	}

	pub fn handler_count(&self, event: &str) -> usize {
		self.inner.handlers.handler_count(event)
	}

	pub fn state(&self) -> ChannelState {
		self.inner.shared.lock().state
	}

	/// Reconnect attempts made since the last successful open.
	pub fn attempts(&self) -> u32 {
		self.inner.shared.lock().attempts
	}

	pub fn is_open(&self) -> bool {
		self.state() == ChannelState::Open
	}
}

impl Inner {
	fn is_current(&self, generation: u64) -> bool {
		self.shared.lock().generation == generation
	}

	fn dispatch_text(&self, generation: u64, text: &str) {
		if !self.is_current(generation) {
			return;
		}
		match parse_envelope(text) {
			Ok(envelope) => {
				if is_local_event(&envelope.kind) {
					debug!(target: "facegate.channel", event = %envelope.kind, "peer sent a reserved event name");
				}
				self.handlers.emit(&envelope.kind, &envelope.payload);
			}
			Err(err) => warn!(target: "facegate.channel", error = %err, "discarding unparseable message"),
		}
	}

	fn emit_error(&self, generation: u64, detail: String) {
		if self.is_current(generation) {
			self.handlers.emit(EVENT_ERROR, &Value::String(detail));
		}
	}

	/// Handles the end of a connection (or a failed open) started under `generation`.
	fn on_closed(self: &Arc<Self>, generation: u64) {
		{
			let mut shared = self.shared.lock();
			if shared.generation != generation {
				return;
			}
			shared.outbound = None;
		}
		info!(target: "facegate.channel", "connection closed");
		self.handlers.emit(EVENT_DISCONNECTED, &Value::Null);
		self.schedule_reconnect(generation);
	}

	fn schedule_reconnect(self: &Arc<Self>, generation: u64) {
		let mut shared = self.shared.lock();
		if shared.generation != generation {
			return;
		}
		if !self.policy.allows(shared.attempts) {
			shared.state = ChannelState::Exhausted;
			warn!(target: "facegate.channel", attempts = shared.attempts, "reconnect attempts exhausted");
			return;
		}

		shared.attempts += 1;
		let attempt = shared.attempts;
		let delay = self.policy.delay_for_attempt(attempt);
		shared.state = ChannelState::Reconnecting;
		info!(target: "facegate.channel", attempt, max_attempts = self.policy.max_attempts, delay_ms = delay.as_millis() as u64, "scheduling reconnect");

		let weak = Arc::downgrade(self);
		let url = self.url.clone();
		shared.reconnect_task = Some(tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			let Some(inner) = weak.upgrade() else {
				return;
			};
			{
				let mut shared = inner.shared.lock();
				if shared.generation != generation {
					return;
				}
				shared.reconnect_task = None;
				shared.state = ChannelState::Connecting;
			}
			drop(inner);
			tokio::spawn(run_connection(weak, url, generation));
		}));
	}
}

impl Drop for Inner {
	fn drop(&mut self) {
		let shared = self.shared.get_mut();
		if let Some(timer) = shared.reconnect_task.take() {
			timer.abort();
		}
		if shared.outbound.take().is_some() {
			debug!(target: "facegate.channel", url = %self.url, "last handle dropped, closing connection");
		}
	}
}

/// Drives one connection. Holds only `weak` so the channel can be dropped
/// while the socket is open; the writer sees its sender vanish and closes.
async fn run_connection(weak: Weak<Inner>, url: String, generation: u64) {
	let stream = match connect_async(url.as_str()).await {
		Ok((stream, _)) => stream,
		Err(err) => {
			warn!(target: "facegate.channel", %url, error = %err, "connection failed");
			if let Some(inner) = weak.upgrade() {
				inner.emit_error(generation, err.to_string());
				inner.on_closed(generation);
			}
			return;
		}
	};

	let (tx, mut rx) = mpsc::unbounded_channel();
	{
		let Some(inner) = weak.upgrade() else {
			return;
		};
		{
			let mut shared = inner.shared.lock();
			if shared.generation != generation {
				return;
			}
			shared.outbound = Some(tx);
			shared.attempts = 0;
			shared.state = ChannelState::Open;
		}
		info!(target: "facegate.channel", %url, "connected");
		inner.handlers.emit(EVENT_CONNECTED, &Value::Null);
	}

	let (mut write, mut read) = stream.split();
	loop {
		tokio::select! {
			outgoing = rx.recv() => match outgoing {
				Some(message) => {
					if let Err(err) = write.send(message).await {
						warn!(target: "facegate.channel", error = %err, "send failed");
						if let Some(inner) = weak.upgrade() {
							inner.emit_error(generation, err.to_string());
						}
						break;
					}
				}
				None => {
					// Sender dropped: the caller disconnected, reconnected, or dropped the channel.
					let _ = write.send(Message::Close(None)).await;
					break;
				}
			},
			incoming = read.next() => match incoming {
				Some(Ok(Message::Text(text))) => dispatch(&weak, generation, &text),
				Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
					Ok(text) => dispatch(&weak, generation, text),
					Err(err) => warn!(target: "facegate.channel", error = %err, "discarding non-utf8 binary message"),
				},
				Some(Ok(Message::Close(frame))) => {
					debug!(target: "facegate.channel", ?frame, "close frame received");
					break;
				}
				Some(Ok(_)) => {}
				Some(Err(err)) => {
					warn!(target: "facegate.channel", error = %err, "read failed");
					if let Some(inner) = weak.upgrade() {
						inner.emit_error(generation, err.to_string());
					}
					break;
				}
				None => break,
			},
		}
	}

	if let Some(inner) = weak.upgrade() {
		inner.on_closed(generation);
	}
}

fn dispatch(weak: &Weak<Inner>, generation: u64, text: &str) {
	if let Some(inner) = weak.upgrade() {
		inner.dispatch_text(generation, text);
	}
}
