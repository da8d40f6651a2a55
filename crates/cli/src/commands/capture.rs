use std::time::Duration;

use anyhow::{Context, Result, bail};
use facegate::Facegate;
use serde_json::json;
use tracing::{info, warn};

use super::print_json;
use crate::cli::CaptureArgs;

pub async fn execute(client: &Facegate, args: CaptureArgs) -> Result<()> {
	let mut session = client.capture_session(args.user_id, &args.name);
	if let Some(images) = args.images {
		session = session.with_max_images(images);
	}
	let interval = args.interval_ms.map(Duration::from_millis).unwrap_or_else(|| client.config().capture_interval());

	session
		.start(&args.target)
		.await
		.with_context(|| format!("starting capture for user {}", args.user_id))?;
	info!(target: "facegate.cli", user_id = args.user_id, name = %args.name, total = session.progress().total, "capturing");

	let outcome = tokio::select! {
		result = session.capture_until_full(interval) => Some(result),
		_ = tokio::signal::ctrl_c() => None,
	};
	let progress = match outcome {
		Some(Ok(progress)) => progress,
		Some(Err(err)) => {
			session.stop();
			return Err(err).context("capturing images");
		}
		None => {
			warn!(target: "facegate.cli", captured = session.progress().captured, "interrupted, discarding capture");
			session.stop();
			bail!("capture interrupted");
		}
	};

	let result = session.complete().await.context("completing capture")?;
	let faces: u32 = session.images().iter().map(|image| image.faces_detected).sum();
	print_json(&json!({
		"user_id": args.user_id,
		"captured": progress.captured,
		"total": progress.total,
		"percentage": progress.percentage,
		"faces_detected": faces,
		"images_processed": result.images_processed,
		"message": result.message,
	}))
}
