//! Camera access.
//!
//! [`CameraSource`] binds a video target through a pluggable [`CameraBackend`],
//! hands out the current frame as a JPEG still, and can run a local periodic
//! capture loop. Stopping is idempotent and safe on a source that never started.

mod frame;
mod still;

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub use frame::{EncodedFrame, JPEG_MIME, RawFrame, encode_jpeg};
pub use still::StillImageBackend;

use crate::error::CameraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
	#[default]
	User,
	Environment,
}

/// Device request constraints and output encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConstraints {
	pub ideal_width: u32,
	pub ideal_height: u32,
	pub facing_mode: FacingMode,
	pub jpeg_quality: u8,
}

impl Default for StreamConstraints {
	fn default() -> Self {
		Self {
			ideal_width: 640,
			ideal_height: 480,
			facing_mode: FacingMode::User,
			jpeg_quality: 80,
		}
	}
}

/// A live device stream.
pub trait VideoStream: Send {
	/// Frame currently shown, at the stream's native dimensions.
	fn current_frame(&mut self) -> Option<RawFrame>;
	/// Releases every track of the device.
	fn stop_tracks(&mut self);
}

/// Opens device streams bound to a display target.
#[async_trait]
pub trait CameraBackend: Send + Sync {
	async fn open(&self, target: &str, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// Receives frames from the capture loop.
pub type FrameHandler = Arc<dyn Fn(EncodedFrame) + Send + Sync>;

#[derive(Default)]
struct CameraState {
	target: Option<String>,
	stream: Option<Box<dyn VideoStream>>,
	loop_task: Option<JoinHandle<()>>,
}

impl CameraState {
	fn release(&mut self) -> bool {
		if let Some(task) = self.loop_task.take() {
			task.abort();
		}
		self.target = None;
		match self.stream.take() {
			Some(mut stream) => {
				stream.stop_tracks();
				true
			}
			None => false,
		}
	}
}

/// Shared handle to one camera. Clones refer to the same device binding.
#[derive(Clone)]
pub struct CameraSource {
	backend: Arc<dyn CameraBackend>,
	constraints: StreamConstraints,
	state: Arc<Mutex<CameraState>>,
}

impl std::fmt::Debug for CameraSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("CameraSource")
			.field("target", &state.target)
			.field("active", &state.stream.is_some())
			.field("looping", &state.loop_task.is_some())
			.finish()
	}
}

impl CameraSource {
	pub fn new(backend: Arc<dyn CameraBackend>, constraints: StreamConstraints) -> Self {
		Self {
			backend,
			constraints,
			state: Arc::new(Mutex::new(CameraState::default())),
		}
	}

	pub fn constraints(&self) -> &StreamConstraints {
		&self.constraints
	}

	/// Binds `target` and opens the device. An already active source is
	/// stopped first.
	pub async fn initialize(&self, target: &str) -> Result<(), CameraError> {
		if self.is_active() {
			self.stop();
		}

		let stream = self.backend.open(target, &self.constraints).await?;

		let mut state = self.state.lock();
		state.release();
		state.stream = Some(stream);
		state.target = Some(target.to_string());
		info!(target: "facegate.camera", video_target = target, "camera initialized");
		Ok(())
	}

	pub fn is_active(&self) -> bool {
		self.state.lock().stream.is_some()
	}

	pub fn target(&self) -> Option<String> {
		self.state.lock().target.clone()
	}

	/// Current frame as a JPEG. `None` when inactive, when no frame is
	/// available yet, or when encoding fails.
	pub fn capture_frame(&self) -> Option<EncodedFrame> {
		capture_from(&self.state, self.constraints.jpeg_quality)
	}

	/// Spawns a loop calling `handler` with a fresh frame every `interval`,
	/// replacing any previous loop. The first frame arrives after one interval.
	pub fn start_capture_loop(&self, interval: Duration, handler: FrameHandler) -> Result<(), CameraError> {
		let mut state = self.state.lock();
		if state.stream.is_none() {
			return Err(CameraError::NotActive);
		}
		if let Some(previous) = state.loop_task.take() {
			previous.abort();
		}

		let weak = Arc::downgrade(&self.state);
		let quality = self.constraints.jpeg_quality;
		let interval = interval.max(Duration::from_millis(1));
		state.loop_task = Some(tokio::spawn(run_capture_loop(weak, quality, interval, handler)));
		debug!(target: "facegate.camera", interval_ms = interval.as_millis() as u64, "capture loop started");
		Ok(())
	}

	pub fn stop_capture_loop(&self) {
		if let Some(task) = self.state.lock().loop_task.take() {
			task.abort();
			debug!(target: "facegate.camera", "capture loop stopped");
		}
	}

	pub fn is_capturing(&self) -> bool {
		self.state.lock().loop_task.is_some()
	}

	/// Stops all tracks, clears the binding, and cancels the capture loop.
	pub fn stop(&self) {
		if self.state.lock().release() {
			info!(target: "facegate.camera", "camera stopped");
		}
	}
}

fn capture_from(state: &Mutex<CameraState>, quality: u8) -> Option<EncodedFrame> {
	let raw = {
		let mut state = state.lock();
		state.stream.as_mut()?.current_frame()?
	};
	encode_jpeg(&raw, quality)
}

async fn run_capture_loop(state: Weak<Mutex<CameraState>>, quality: u8, interval: Duration, handler: FrameHandler) {
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	ticker.tick().await;

	loop {
		ticker.tick().await;
		let Some(state) = state.upgrade() else {
			break;
		};
		if let Some(frame) = capture_from(&state, quality) {
			handler(frame);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::FakeCamera;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn source(camera: &FakeCamera) -> CameraSource {
		CameraSource::new(Arc::new(camera.clone()), StreamConstraints::default())
	}

	#[tokio::test]
	async fn initialize_marks_active_and_frames_flow() {
		let camera = FakeCamera::new(["video"]);
		let source = source(&camera);
		assert!(source.capture_frame().is_none());

		source.initialize("video").await.unwrap();
		assert!(source.is_active());
		assert_eq!(source.target().as_deref(), Some("video"));

		let frame = source.capture_frame().unwrap();
		assert_eq!((frame.width, frame.height), (640, 480));
		assert!(frame.to_data_url().starts_with("data:image/jpeg;base64,"));
	}

	#[tokio::test]
	async fn unknown_target_fails_and_stays_inactive() {
		let camera = FakeCamera::new(["video"]);
		let source = source(&camera);
		let err = source.initialize("missing").await.unwrap_err();
		assert_eq!(err, CameraError::TargetNotFound("missing".into()));
		assert!(!source.is_active());
	}

	#[tokio::test]
	async fn denied_access_is_reported() {
		let camera = FakeCamera::new(["video"]);
		camera.deny_access(true);
		let err = source(&camera).initialize("video").await.unwrap_err();
		assert!(matches!(err, CameraError::AccessDenied(_)));
	}

	#[tokio::test]
	async fn stop_is_idempotent_and_safe_before_start() {
		let camera = FakeCamera::new(["video"]);
		let source = source(&camera);
		source.stop();

		source.initialize("video").await.unwrap();
		source.stop();
		source.stop();
		assert!(!source.is_active());
		assert_eq!(camera.stopped_streams(), 1);
	}

	#[tokio::test]
	async fn reinitialize_releases_previous_stream() {
		let camera = FakeCamera::new(["video", "other"]);
		let source = source(&camera);
		source.initialize("video").await.unwrap();
		source.initialize("other").await.unwrap();
		assert_eq!(camera.opened_streams(), 2);
		assert_eq!(camera.stopped_streams(), 1);
		assert_eq!(source.target().as_deref(), Some("other"));
	}

	#[tokio::test]
	async fn capture_loop_requires_active_camera() {
		let camera = FakeCamera::new(["video"]);
		let result = source(&camera).start_capture_loop(Duration::from_millis(10), Arc::new(|_: EncodedFrame| {}));
		assert_eq!(result, Err(CameraError::NotActive));
	}

	#[tokio::test(start_paused = true)]
	async fn capture_loop_delivers_frames_until_stopped() {
		let camera = FakeCamera::new(["video"]);
		let source = source(&camera);
		source.initialize("video").await.unwrap();

		let frames = Arc::new(AtomicUsize::new(0));
		let counter = frames.clone();
		source
			.start_capture_loop(
				Duration::from_millis(100),
				Arc::new(move |_: EncodedFrame| {
					counter.fetch_add(1, Ordering::SeqCst);
				}),
			)
			.unwrap();

		tokio::time::sleep(Duration::from_millis(350)).await;
		assert_eq!(frames.load(Ordering::SeqCst), 3);

		source.stop();
		tokio::time::sleep(Duration::from_millis(500)).await;
		assert_eq!(frames.load(Ordering::SeqCst), 3);
		assert!(!source.is_capturing());
	}
}
