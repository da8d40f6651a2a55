use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use facegate::{EncodedFrame, Facegate};
use serde_json::json;
use tracing::info;

use super::print_json;
use crate::cli::RecognizeArgs;

pub async fn execute(client: &Facegate, args: RecognizeArgs) -> Result<()> {
	let mut session = client.recognition_session();
	let frames = Arc::new(AtomicU64::new(0));

	let counter = Arc::clone(&frames);
	let on_frame = Arc::new(move |frame: EncodedFrame| {
		let index = counter.fetch_add(1, Ordering::SeqCst) + 1;
		println!(
			"{}",
			json!({"frame": index, "width": frame.width, "height": frame.height, "bytes": frame.bytes.len()})
		);
	});

	session.start(&args.target, on_frame).await.context("starting recognition")?;
	if let Some(status) = session.status().await {
		info!(target: "facegate.cli", active = status.recognition_active, message = ?status.message, "server recognition status");
	}

	match args.duration_secs {
		Some(secs) => {
			tokio::select! {
				_ = tokio::time::sleep(Duration::from_secs(secs)) => {}
				_ = tokio::signal::ctrl_c() => {}
			}
		}
		None => {
			tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
		}
	}

	session.stop().await;
	print_json(&json!({"frames": frames.load(Ordering::SeqCst)}))
}
