use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use facegate::protocol::{ConfidenceBand, EVENT_CONNECTED, EVENT_DISCONNECTED, EVENT_ERROR};
use facegate::{ChannelState, ClientConfig, EventChannel, Facegate};
use serde_json::{Value, json};
use tokio::sync::Notify;
use tracing::info;

use crate::cli::ListenArgs;

/// Time given to the writer task to flush before the process exits.
const FLUSH_GRACE: Duration = Duration::from_millis(200);
const STATE_POLL: Duration = Duration::from_millis(200);

pub async fn listen(client: &Facegate, args: ListenArgs) -> Result<()> {
	let channel = client.event_channel();

	let mut events: Vec<String> = vec![EVENT_CONNECTED.into(), EVENT_DISCONNECTED.into(), EVENT_ERROR.into()];
	for event in args.events {
		if !events.contains(&event) {
			events.push(event);
		}
	}
	let config = Arc::new(client.config().clone());
	for event in events {
		let name = event.clone();
		let config = Arc::clone(&config);
		channel.on(&event, move |payload: &Value| {
			println!("{}", json!({"event": name, "payload": annotate_confidence(payload, &config)}));
		});
	}

	info!(target: "facegate.cli", url = channel.url(), "listening");
	channel.connect();

	let deadline = args.duration_secs.map(Duration::from_secs);
	let result = tokio::select! {
		result = watch_exhaustion(&channel) => result,
		_ = tokio::signal::ctrl_c() => Ok(()),
		_ = sleep_or_forever(deadline) => Ok(()),
	};
	channel.disconnect();
	result
}

pub async fn send(client: &Facegate, kind: &str, payload: Option<&str>, timeout_secs: u64) -> Result<()> {
	let payload: Value = match payload {
		Some(raw) => serde_json::from_str(raw).with_context(|| format!("payload is not valid JSON: {raw}"))?,
		None => Value::Null,
	};

	let channel = client.event_channel();
	let opened = Arc::new(Notify::new());
	let signal = Arc::clone(&opened);
	channel.on(EVENT_CONNECTED, move |_: &Value| signal.notify_one());
	channel.connect();

	if tokio::time::timeout(Duration::from_secs(timeout_secs), opened.notified()).await.is_err() {
		channel.disconnect();
		bail!("event channel did not open within {timeout_secs}s");
	}

	if !channel.send(kind, payload) {
		channel.disconnect();
		bail!("event channel closed before the message could be sent");
	}
	tokio::time::sleep(FLUSH_GRACE).await;
	channel.disconnect();
	println!("{}", json!({"sent": kind}));
	Ok(())
}

async fn watch_exhaustion(channel: &EventChannel) -> Result<()> {
	loop {
		tokio::time::sleep(STATE_POLL).await;
		if channel.state() == ChannelState::Exhausted {
			bail!("event channel gave up after {} reconnect attempts", channel.attempts());
		}
	}
}

async fn sleep_or_forever(deadline: Option<Duration>) {
	match deadline {
		Some(duration) => tokio::time::sleep(duration).await,
		None => std::future::pending().await,
	}
}

/// Adds the confidence band, its display text, and the threshold verdict next
/// to a numeric `confidence` field. Other payloads pass through unchanged.
fn annotate_confidence(payload: &Value, config: &ClientConfig) -> Value {
	let mut payload = payload.clone();
	if let Some(object) = payload.as_object_mut() {
		if let Some(confidence) = object.get("confidence").and_then(Value::as_f64) {
			object.insert("confidence_band".into(), json!(ConfidenceBand::classify(confidence)));
			object.insert("confidence_text".into(), json!(ConfidenceBand::format(confidence)));
			object.insert("meets_threshold".into(), json!(config.meets_threshold(confidence)));
		}
	}
	payload
}
