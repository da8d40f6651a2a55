use std::sync::Arc;
use std::time::Duration;

use facegate_protocol::RecognitionStatus;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::camera::{CameraSource, EncodedFrame, FrameHandler};
use crate::error::Result;
use crate::notifier::{Notifier, Severity};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionState {
	Idle,
	Active,
}

/// Continuous recognition against the server.
///
/// The server runs recognition on its own feed once started; locally the
/// session keeps a frame loop going so callers can render what the camera
/// sees. Frames stay on this side.
pub struct RecognitionSession {
	camera: CameraSource,
	transport: Arc<dyn Transport>,
	notifier: Arc<dyn Notifier>,
	frame_interval: Duration,
	callback: Arc<Mutex<Option<FrameHandler>>>,
	state: RecognitionState,
}

impl std::fmt::Debug for RecognitionSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RecognitionSession")
			.field("state", &self.state)
			.field("frame_interval", &self.frame_interval)
			.field("camera", &self.camera)
			.finish()
	}
}

impl RecognitionSession {
	pub fn new(camera: CameraSource, transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
		Self {
			camera,
			transport,
			notifier,
			frame_interval: Duration::from_millis(1000),
			callback: Arc::new(Mutex::new(None)),
			state: RecognitionState::Idle,
		}
	}

	pub fn with_frame_interval(mut self, interval: Duration) -> Self {
		self.frame_interval = interval;
		self
	}

	pub fn state(&self) -> RecognitionState {
		self.state
	}

	pub fn is_active(&self) -> bool {
		self.state == RecognitionState::Active
	}

	pub fn camera(&self) -> &CameraSource {
		&self.camera
	}

	/// Opens the camera, announces `POST /recognition/start`, and starts the
	/// local frame loop feeding `callback`.
	pub async fn start(&mut self, video_target: &str, callback: FrameHandler) -> Result<()> {
		self.notifier.show_loading("Starting recognition...", "Opening the camera");
		let opened = self.open(video_target).await;
		self.notifier.hide_loading();
		opened?;

		*self.callback.lock() = Some(callback);
		self.state = RecognitionState::Active;

		let slot = Arc::clone(&self.callback);
		let forward: FrameHandler = Arc::new(move |frame: EncodedFrame| {
			let callback = slot.lock().clone();
			if let Some(callback) = callback {
				callback(frame);
			}
		});
		if let Err(err) = self.camera.start_capture_loop(self.frame_interval, forward) {
			self.reset();
			return Err(err.into());
		}

		info!(target: "facegate.recognition", interval_ms = self.frame_interval.as_millis() as u64, "recognition started");
		Ok(())
	}

	async fn open(&mut self, video_target: &str) -> Result<()> {
		if let Err(err) = self.camera.initialize(video_target).await {
			self.camera.stop();
			return Err(err.into());
		}

		if let Err(err) = self.transport.post("/recognition/start", None).await {
			warn!(target: "facegate.recognition", error = %err, "server refused recognition start");
			self.camera.stop();
			return Err(err);
		}
		Ok(())
	}

	/// Announces `POST /recognition/stop` and releases everything. A server
	/// failure is reported through the notifier, never returned.
	pub async fn stop(&mut self) {
		if let Err(err) = self.transport.post("/recognition/stop", None).await {
			warn!(target: "facegate.recognition", error = %err, "recognition stop failed");
			self.notifier.notify(Severity::Warning, &format!("Failed to stop recognition: {err}"));
		}
		self.reset();
		info!(target: "facegate.recognition", "recognition stopped");
	}

	/// `GET /recognition/status`. `None` on any failure, which is reported
	/// through the notifier.
	pub async fn status(&self) -> Option<RecognitionStatus> {
		let value = match self.transport.get("/recognition/status").await {
			Ok(value) => value,
			Err(err) => {
				warn!(target: "facegate.recognition", error = %err, "status check failed");
				self.notifier.notify(Severity::Warning, &format!("Status check failed: {err}"));
				return None;
			}
		};
		match serde_json::from_value(value) {
			Ok(status) => Some(status),
			Err(err) => {
				warn!(target: "facegate.recognition", error = %err, "unexpected status body");
				self.notifier.notify(Severity::Warning, "Status check returned an unexpected response");
				None
			}
		}
	}

	fn reset(&mut self) {
		self.camera.stop();
		*self.callback.lock() = None;
		self.state = RecognitionState::Idle;
	}
}

impl Drop for RecognitionSession {
	fn drop(&mut self) {
		self.reset();
	}
}
