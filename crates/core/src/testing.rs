//! In-memory collaborators for exercising sessions without a server or device.
//!
//! # Example
//!
//! ```ignore
//! let transport = FakeTransport::new();
//! transport.respond(Method::Post, "/capture/image", FakeReply::json(json!({"faces_detected": 1})));
//! let camera = FakeCamera::new(["video"]);
//!
//! let mut session = CaptureSession::new(7, "Ada", Arc::new(transport.clone()), camera.source(), registry);
//! session.start("video").await?;
//! assert_eq!(transport.calls_to("/capture/start/7"), 1);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::camera::{CameraBackend, CameraSource, RawFrame, StreamConstraints, VideoStream};
use crate::error::{CameraError, Error, Result};
use crate::notifier::{Notifier, Severity};
use crate::transport::{Method, Transport};

/// Scripted outcome for one request.
#[derive(Debug, Clone)]
pub enum FakeReply {
	Json(Value),
	Fail { status: Option<u16>, message: String },
	Expired,
}

impl FakeReply {
	pub fn json(value: Value) -> Self {
		Self::Json(value)
	}

	pub fn fail(status: u16, message: impl Into<String>) -> Self {
		Self::Fail {
			status: Some(status),
			message: message.into(),
		}
	}

	fn into_result(self) -> Result<Value> {
		match self {
			Self::Json(value) => Ok(value),
			Self::Fail { status, message } => Err(Error::Transport { status, message }),
			Self::Expired => Err(Error::SessionExpired),
		}
	}
}

/// A request the fake received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
	pub method: Method,
	pub endpoint: String,
	pub body: Option<Value>,
}

#[derive(Default)]
struct FakeTransportState {
	sticky: HashMap<(Method, String), FakeReply>,
	queued: HashMap<(Method, String), VecDeque<FakeReply>>,
	calls: Vec<RecordedCall>,
}

/// [`Transport`] answering from a script. Unscripted requests succeed with
/// `{"status":"success"}`.
#[derive(Clone, Default)]
pub struct FakeTransport {
	state: Arc<Mutex<FakeTransportState>>,
}

impl FakeTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Answers every `method endpoint` request with `reply`.
	pub fn respond(&self, method: Method, endpoint: &str, reply: FakeReply) {
		self.state.lock().sticky.insert((method, endpoint.to_string()), reply);
	}

	/// Answers the next `method endpoint` request with `reply`, ahead of any
	/// sticky reply.
	pub fn respond_once(&self, method: Method, endpoint: &str, reply: FakeReply) {
		self.state.lock().queued.entry((method, endpoint.to_string())).or_default().push_back(reply);
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.state.lock().calls.clone()
	}

	pub fn calls_to(&self, endpoint: &str) -> usize {
		self.state.lock().calls.iter().filter(|call| call.endpoint == endpoint).count()
	}

	pub fn endpoints(&self) -> Vec<String> {
		self.state.lock().calls.iter().map(|call| call.endpoint.clone()).collect()
	}
}

#[async_trait]
impl Transport for FakeTransport {
	async fn request(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Value> {
		let mut state = self.state.lock();
		state.calls.push(RecordedCall {
			method,
			endpoint: endpoint.to_string(),
			body,
		});
		let key = (method, endpoint.to_string());
		let queued = state.queued.get_mut(&key).and_then(VecDeque::pop_front);
		let reply = match queued {
			Some(reply) => reply,
			None => state.sticky.get(&key).cloned().unwrap_or_else(|| FakeReply::Json(json!({"status": "success"}))),
		};
		drop(state);
		reply.into_result()
	}
}

#[derive(Default)]
struct FakeCameraState {
	targets: HashSet<String>,
	deny: AtomicBool,
	opened: AtomicUsize,
	stopped: AtomicUsize,
}

/// [`CameraBackend`] with a fixed set of targets that serves a solid 640x480
/// frame and counts opens and stops.
#[derive(Clone, Default)]
pub struct FakeCamera {
	state: Arc<FakeCameraState>,
}

impl FakeCamera {
	pub fn new<I, S>(targets: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			state: Arc::new(FakeCameraState {
				targets: targets.into_iter().map(Into::into).collect(),
				..Default::default()
			}),
		}
	}

	/// Makes subsequent opens fail with `AccessDenied`.
	pub fn deny_access(&self, deny: bool) {
		self.state.deny.store(deny, Ordering::SeqCst);
	}

	/// A [`CameraSource`] backed by this fake with default constraints.
	pub fn source(&self) -> CameraSource {
		CameraSource::new(Arc::new(self.clone()), StreamConstraints::default())
	}

	pub fn opened_streams(&self) -> usize {
		self.state.opened.load(Ordering::SeqCst)
	}

	pub fn stopped_streams(&self) -> usize {
		self.state.stopped.load(Ordering::SeqCst)
	}

	/// Streams opened and not yet stopped.
	pub fn live_streams(&self) -> usize {
		self.opened_streams() - self.stopped_streams()
	}
}

#[async_trait]
impl CameraBackend for FakeCamera {
	async fn open(&self, target: &str, constraints: &StreamConstraints) -> std::result::Result<Box<dyn VideoStream>, CameraError> {
		if !self.state.targets.contains(target) {
			return Err(CameraError::TargetNotFound(target.to_string()));
		}
		if self.state.deny.load(Ordering::SeqCst) {
			return Err(CameraError::AccessDenied("permission denied".to_string()));
		}
		self.state.opened.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(FakeStream {
			frame: RawFrame::solid(constraints.ideal_width, constraints.ideal_height, [90, 140, 200]),
			camera: Arc::clone(&self.state),
			stopped: false,
		}))
	}
}

struct FakeStream {
	frame: RawFrame,
	camera: Arc<FakeCameraState>,
	stopped: bool,
}

impl VideoStream for FakeStream {
	fn current_frame(&mut self) -> Option<RawFrame> {
		(!self.stopped).then(|| self.frame.clone())
	}

	fn stop_tracks(&mut self) {
		if !self.stopped {
			self.stopped = true;
			self.camera.stopped.fetch_add(1, Ordering::SeqCst);
		}
	}
}

/// [`Notifier`] that keeps every message and loading transition.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
	messages: Arc<Mutex<Vec<(Severity, String)>>>,
	loading: Arc<Mutex<Vec<Option<String>>>>,
}

impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn messages(&self) -> Vec<(Severity, String)> {
		self.messages.lock().clone()
	}

	/// `Some(text)` for each `show_loading`, `None` for each `hide_loading`.
	pub fn loading(&self) -> Vec<Option<String>> {
		self.loading.lock().clone()
	}

	pub fn is_loading(&self) -> bool {
		matches!(self.loading.lock().last(), Some(Some(_)))
	}
}

impl Notifier for RecordingNotifier {
	fn notify(&self, severity: Severity, message: &str) {
		self.messages.lock().push((severity, message.to_string()));
	}

	fn show_loading(&self, text: &str, _subtext: &str) {
		self.loading.lock().push(Some(text.to_string()));
	}

	fn hide_loading(&self) {
		self.loading.lock().push(None);
	}
}
