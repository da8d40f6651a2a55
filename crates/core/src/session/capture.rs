use std::sync::Arc;
use std::time::{Duration, SystemTime};

use facegate_protocol::{CaptureCompleteResult, CaptureImageResult};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::SessionRegistry;
use crate::camera::CameraSource;
use crate::error::{Error, Result};
use crate::notifier::{LogNotifier, Notifier};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
	Idle,
	Active,
	Completed,
	Aborted,
}

/// One training image the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
	pub timestamp: SystemTime,
	pub faces_detected: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProgress {
	pub captured: usize,
	pub total: usize,
	/// Rounded to the nearest whole percent; 0 when `total` is 0.
	pub percentage: u32,
}

impl CaptureProgress {
	pub fn new(captured: usize, total: usize) -> Self {
		let percentage = if total == 0 {
			0
		} else {
			(captured as f64 / total as f64 * 100.0).round() as u32
		};
		Self { captured, total, percentage }
	}

	pub fn is_full(&self) -> bool {
		self.captured >= self.total
	}
}

/// Collects training images for one user and commits them.
///
/// At most one session is active per [`SessionRegistry`]. The camera and the
/// registry slot are released on every exit path: `stop`, `complete`, a
/// failed `start`, and drop.
pub struct CaptureSession {
	user_id: i64,
	user_name: String,
	max_images: usize,
	state: CaptureState,
	images: Vec<CapturedImage>,
	claim: Option<u64>,
	transport: Arc<dyn Transport>,
	camera: CameraSource,
	registry: Arc<SessionRegistry>,
	notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for CaptureSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CaptureSession")
			.field("user_id", &self.user_id)
			.field("user_name", &self.user_name)
			.field("state", &self.state)
			.field("captured", &self.images.len())
			.field("max_images", &self.max_images)
			.finish()
	}
}

impl CaptureSession {
	pub fn new(user_id: i64, user_name: impl Into<String>, transport: Arc<dyn Transport>, camera: CameraSource, registry: Arc<SessionRegistry>) -> Self {
		Self {
			user_id,
			user_name: user_name.into(),
			max_images: 20,
			state: CaptureState::Idle,
			images: Vec::new(),
			claim: None,
			transport,
			camera,
			registry,
			notifier: Arc::new(LogNotifier),
		}
	}

	/// Reports progress of the final commit. Defaults to [`LogNotifier`].
	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	pub fn with_max_images(mut self, max_images: usize) -> Self {
		self.max_images = max_images;
		self
	}

	pub fn user_id(&self) -> i64 {
		self.user_id
	}

	pub fn user_name(&self) -> &str {
		&self.user_name
	}

	pub fn state(&self) -> CaptureState {
		self.state
	}

	pub fn is_active(&self) -> bool {
		self.state == CaptureState::Active
	}

	pub fn images(&self) -> &[CapturedImage] {
		&self.images
	}

	pub fn camera(&self) -> &CameraSource {
		&self.camera
	}

	/// Claims the registry slot, opens the camera on `video_target`, and
	/// announces the session with `POST /capture/start/{user_id}`. A no-op on a
	/// session that is already active.
	pub async fn start(&mut self, video_target: &str) -> Result<()> {
		if self.state == CaptureState::Active {
			debug!(target: "facegate.capture", user_id = self.user_id, "capture session already active");
			return Ok(());
		}

		let claim = self.registry.claim(self.user_id, &self.user_name)?;
		self.claim = Some(claim);

		if let Err(err) = self.camera.initialize(video_target).await {
			warn!(target: "facegate.capture", user_id = self.user_id, error = %err, "camera unavailable");
			self.release();
			return Err(err.into());
		}

		if let Err(err) = self.transport.post(&format!("/capture/start/{}", self.user_id), None).await {
			warn!(target: "facegate.capture", user_id = self.user_id, error = %err, "server refused capture start");
			self.release();
			return Err(err);
		}

		self.images.clear();
		self.state = CaptureState::Active;
		info!(target: "facegate.capture", user_id = self.user_id, user = %self.user_name, max_images = self.max_images, "capture session started");
		Ok(())
	}

	/// Asks the server to capture one image. `Ok(false)` when inactive or full.
	pub async fn capture_image(&mut self) -> Result<bool> {
		if self.state != CaptureState::Active || self.images.len() >= self.max_images {
			return Ok(false);
		}

		let value = self.transport.post("/capture/image", None).await?;
		let result: CaptureImageResult = parse_lenient(value);
		self.images.push(CapturedImage {
			timestamp: SystemTime::now(),
			faces_detected: result.faces_detected,
		});
		debug!(
			target: "facegate.capture",
			captured = self.images.len(),
			total = self.max_images,
			faces = result.faces_detected,
			"image captured"
		);
		Ok(true)
	}

	/// Captures until the session is full, pausing `interval` between requests.
	/// Stops at the first error.
	pub async fn capture_until_full(&mut self, interval: Duration) -> Result<CaptureProgress> {
		while self.capture_image().await? {
			if self.progress().is_full() {
				break;
			}
			tokio::time::sleep(interval).await;
		}
		Ok(self.progress())
	}

	/// Commits the captured images with `POST /capture/complete`.
	pub async fn complete(&mut self) -> Result<CaptureCompleteResult> {
		if self.images.is_empty() {
			return Err(Error::EmptySession);
		}

		self.notifier.show_loading("Processing images...", "Training the face model");
		let result = self.transport.post("/capture/complete", None).await;
		self.notifier.hide_loading();
		self.release();

		match result {
			Ok(value) => {
				self.state = CaptureState::Completed;
				info!(target: "facegate.capture", user_id = self.user_id, images = self.images.len(), "capture session completed");
				Ok(parse_lenient(value))
			}
			Err(err) => {
				self.state = CaptureState::Aborted;
				warn!(target: "facegate.capture", user_id = self.user_id, error = %err, "capture completion failed");
				Err(err)
			}
		}
	}

	/// Releases the camera and the slot. Idempotent.
	pub fn stop(&mut self) {
		self.release();
		if self.state == CaptureState::Active {
			self.state = CaptureState::Aborted;
			info!(target: "facegate.capture", user_id = self.user_id, captured = self.images.len(), "capture session stopped");
		}
	}

	pub fn progress(&self) -> CaptureProgress {
		CaptureProgress::new(self.images.len(), self.max_images)
	}

	fn release(&mut self) {
		self.camera.stop();
		if let Some(claim) = self.claim.take() {
			self.registry.release(claim);
		}
	}
}

impl Drop for CaptureSession {
	fn drop(&mut self) {
		self.release();
	}
}

fn parse_lenient<T: serde::de::DeserializeOwned + Default>(value: Value) -> T {
	serde_json::from_value(value).unwrap_or_default()
}
