//! Capture and recognition sessions driven against in-memory fakes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use facegate::testing::{FakeCamera, FakeReply, FakeTransport, RecordingNotifier};
use facegate::{CaptureSession, CaptureState, EncodedFrame, Error, Method, RecognitionSession, RecognitionState, SessionRegistry, Severity};
use serde_json::json;

struct Harness {
	transport: FakeTransport,
	camera: FakeCamera,
	registry: Arc<SessionRegistry>,
}

impl Harness {
	fn new() -> Self {
		Self {
			transport: FakeTransport::new(),
			camera: FakeCamera::new(["video"]),
			registry: Arc::new(SessionRegistry::new()),
		}
	}

	fn capture(&self, user_id: i64, max_images: usize) -> CaptureSession {
		CaptureSession::new(user_id, format!("user {user_id}"), Arc::new(self.transport.clone()), self.camera.source(), self.registry.clone()).with_max_images(max_images)
	}
}

#[tokio::test]
async fn capture_happy_path() {
	let h = Harness::new();
	h.transport.respond(Method::Post, "/capture/image", FakeReply::json(json!({"status": "success", "faces_detected": 1})));
	h.transport.respond(Method::Post, "/capture/complete", FakeReply::json(json!({"status": "success", "images_processed": 3})));

	let mut session = h.capture(7, 3);
	session.start("video").await.unwrap();
	assert_eq!(session.state(), CaptureState::Active);
	assert_eq!(h.registry.active().map(|a| a.user_id), Some(7));

	while session.capture_image().await.unwrap() {}
	let progress = session.progress();
	assert_eq!((progress.captured, progress.total, progress.percentage), (3, 3, 100));
	assert!(session.images().iter().all(|image| image.faces_detected == 1));

	let result = session.complete().await.unwrap();
	assert_eq!(result.images_processed, Some(3));
	assert_eq!(session.state(), CaptureState::Completed);
	assert!(!h.registry.is_occupied());
	assert_eq!(h.camera.live_streams(), 0);

	assert_eq!(
		h.transport.endpoints(),
		vec!["/capture/start/7", "/capture/image", "/capture/image", "/capture/image", "/capture/complete"]
	);
}

#[tokio::test]
async fn capture_stops_at_max_without_calling_server() {
	let h = Harness::new();
	let mut session = h.capture(1, 1);
	session.start("video").await.unwrap();

	assert!(session.capture_image().await.unwrap());
	assert!(!session.capture_image().await.unwrap());
	assert_eq!(h.transport.calls_to("/capture/image"), 1);
	assert_eq!(session.images().len(), 1);
}

#[tokio::test]
async fn capture_while_idle_is_a_no_op() {
	let h = Harness::new();
	let mut session = h.capture(1, 5);
	assert!(!session.capture_image().await.unwrap());
	assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn failed_capture_appends_nothing() {
	let h = Harness::new();
	h.transport.respond_once(Method::Post, "/capture/image", FakeReply::fail(400, "No face detected in frame"));

	let mut session = h.capture(1, 5);
	session.start("video").await.unwrap();

	let err = session.capture_image().await.unwrap_err();
	assert_eq!(err.to_string(), "No face detected in frame");
	assert!(session.images().is_empty());
	assert!(session.capture_image().await.unwrap());
	assert_eq!(session.progress().captured, 1);
}

#[tokio::test]
async fn second_session_conflicts_without_touching_camera() {
	let h = Harness::new();
	let mut first = h.capture(1, 5);
	first.start("video").await.unwrap();

	let mut second = h.capture(2, 5);
	let err = second.start("video").await.unwrap_err();
	assert!(matches!(err, Error::SessionConflict { active_user_id: 1 }));
	assert_eq!(h.camera.opened_streams(), 1);
	assert_eq!(second.state(), CaptureState::Idle);

	assert!(first.camera().is_active());
	assert_eq!(h.registry.active().map(|a| a.user_id), Some(1));
}

#[tokio::test]
async fn restarting_an_active_session_keeps_it_running() {
	let h = Harness::new();
	let mut session = h.capture(4, 5);
	session.start("video").await.unwrap();
	session.capture_image().await.unwrap();

	session.start("video").await.unwrap();
	assert_eq!(session.state(), CaptureState::Active);
	assert_eq!(session.progress().captured, 1);
	assert_eq!(h.registry.active().map(|a| a.user_id), Some(4));
	assert_eq!(h.camera.opened_streams(), 1);
	assert_eq!(h.transport.endpoints(), vec!["/capture/start/4", "/capture/image"]);
}

#[tokio::test]
async fn start_with_unknown_target_releases_slot() {
	let h = Harness::new();
	let mut session = h.capture(1, 5);
	let err = session.start("no-such-video").await.unwrap_err();
	assert!(err.is_camera());
	assert!(!h.registry.is_occupied());
	assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn start_rejected_by_server_releases_camera_and_slot() {
	let h = Harness::new();
	h.transport.respond(Method::Post, "/capture/start/1", FakeReply::fail(404, "User not found"));

	let mut session = h.capture(1, 5);
	let err = session.start("video").await.unwrap_err();
	assert_eq!(err.status(), Some(404));
	assert_eq!(h.camera.live_streams(), 0);
	assert!(!h.registry.is_occupied());
	assert_eq!(session.state(), CaptureState::Idle);
}

#[tokio::test]
async fn complete_with_no_images_makes_no_call() {
	let h = Harness::new();
	let mut session = h.capture(1, 5);
	session.start("video").await.unwrap();

	assert!(matches!(session.complete().await, Err(Error::EmptySession)));
	assert_eq!(h.transport.calls_to("/capture/complete"), 0);
	assert_eq!(session.state(), CaptureState::Active);
}

#[tokio::test]
async fn failed_complete_still_releases_camera() {
	let h = Harness::new();
	h.transport.respond(Method::Post, "/capture/complete", FakeReply::fail(500, "Training failed"));

	let mut session = h.capture(1, 5);
	session.start("video").await.unwrap();
	session.capture_image().await.unwrap();

	let err = session.complete().await.unwrap_err();
	assert_eq!(err.to_string(), "Training failed");
	assert_eq!(session.state(), CaptureState::Aborted);
	assert_eq!(h.camera.live_streams(), 0);
	assert!(!h.registry.is_occupied());
}

#[tokio::test]
async fn complete_shows_loading_around_the_commit() {
	let h = Harness::new();
	h.transport.respond(Method::Post, "/capture/complete", FakeReply::fail(500, "Training failed"));
	let notifier = RecordingNotifier::new();

	let mut session = h.capture(3, 2).with_notifier(Arc::new(notifier.clone()));
	session.start("video").await.unwrap();
	session.capture_image().await.unwrap();
	assert!(notifier.loading().is_empty());

	session.complete().await.unwrap_err();
	assert_eq!(notifier.loading(), vec![Some("Processing images...".to_string()), None]);
	assert!(!notifier.is_loading());
}

#[tokio::test]
async fn expired_session_surfaces_from_capture() {
	let h = Harness::new();
	h.transport.respond(Method::Post, "/capture/image", FakeReply::Expired);

	let mut session = h.capture(1, 5);
	session.start("video").await.unwrap();
	assert!(session.capture_image().await.unwrap_err().is_session_expired());
}

#[tokio::test]
async fn stop_is_idempotent_and_frees_the_slot() {
	let h = Harness::new();
	let mut session = h.capture(1, 5);
	session.start("video").await.unwrap();

	session.stop();
	session.stop();
	assert_eq!(session.state(), CaptureState::Aborted);
	assert_eq!(h.camera.live_streams(), 0);

	let mut next = h.capture(2, 5);
	next.start("video").await.unwrap();
	assert_eq!(h.registry.active().map(|a| a.user_id), Some(2));
}

#[tokio::test]
async fn dropping_an_active_session_frees_the_slot() {
	let h = Harness::new();
	{
		let mut session = h.capture(1, 5);
		session.start("video").await.unwrap();
	}
	assert!(!h.registry.is_occupied());
	assert_eq!(h.camera.live_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn capture_until_full_paces_requests() {
	let h = Harness::new();
	let mut session = h.capture(1, 4);
	session.start("video").await.unwrap();

	let started = tokio::time::Instant::now();
	let progress = session.capture_until_full(Duration::from_millis(500)).await.unwrap();
	assert_eq!(progress.captured, 4);
	let elapsed = started.elapsed();
	assert!(elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_millis(2000), "{elapsed:?}");
}

fn recognition(h: &Harness, notifier: &RecordingNotifier) -> RecognitionSession {
	RecognitionSession::new(h.camera.source(), Arc::new(h.transport.clone()), Arc::new(notifier.clone())).with_frame_interval(Duration::from_millis(100))
}

#[tokio::test(start_paused = true)]
async fn recognition_feeds_frames_locally() {
	let h = Harness::new();
	let notifier = RecordingNotifier::new();
	let mut session = recognition(&h, &notifier);

	let frames = Arc::new(AtomicUsize::new(0));
	let counter = frames.clone();
	session
		.start(
			"video",
			Arc::new(move |frame: EncodedFrame| {
				assert!(frame.to_data_url().starts_with("data:image/jpeg;base64,"));
				counter.fetch_add(1, Ordering::SeqCst);
			}),
		)
		.await
		.unwrap();
	assert_eq!(session.state(), RecognitionState::Active);

	tokio::time::sleep(Duration::from_millis(250)).await;
	assert_eq!(frames.load(Ordering::SeqCst), 2);
	assert_eq!(h.transport.endpoints(), vec!["/recognition/start"]);

	session.stop().await;
	tokio::time::sleep(Duration::from_millis(300)).await;
	assert_eq!(frames.load(Ordering::SeqCst), 2);
	assert_eq!(session.state(), RecognitionState::Idle);
	assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn recognition_start_failure_releases_camera() {
	let h = Harness::new();
	h.transport.respond(Method::Post, "/recognition/start", FakeReply::fail(503, "Recognition service unavailable"));
	let notifier = RecordingNotifier::new();
	let mut session = recognition(&h, &notifier);

	let err = session.start("video", Arc::new(|_: EncodedFrame| {})).await.unwrap_err();
	assert_eq!(err.status(), Some(503));
	assert_eq!(session.state(), RecognitionState::Idle);
	assert_eq!(h.camera.live_streams(), 0);
}

#[tokio::test]
async fn recognition_start_hides_loading_on_failure() {
	let h = Harness::new();
	let notifier = RecordingNotifier::new();
	let mut session = recognition(&h, &notifier);

	let err = session.start("no-such-video", Arc::new(|_: EncodedFrame| {})).await.unwrap_err();
	assert!(err.is_camera());
	assert_eq!(notifier.loading(), vec![Some("Starting recognition...".to_string()), None]);
	assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn recognition_stop_failure_is_reported_not_returned() {
	let h = Harness::new();
	h.transport.respond(Method::Post, "/recognition/stop", FakeReply::fail(500, "boom"));
	let notifier = RecordingNotifier::new();
	let mut session = recognition(&h, &notifier);
	session.start("video", Arc::new(|_: EncodedFrame| {})).await.unwrap();

	session.stop().await;
	assert_eq!(session.state(), RecognitionState::Idle);
	assert_eq!(h.camera.live_streams(), 0);

	let messages = notifier.messages();
	assert_eq!(messages.len(), 1);
	assert_eq!(messages[0].0, Severity::Warning);
	assert!(messages[0].1.contains("boom"));
}

#[tokio::test]
async fn recognition_status_maps_failures_to_none() {
	let h = Harness::new();
	let notifier = RecordingNotifier::new();
	let session = recognition(&h, &notifier);

	h.transport.respond_once(
		Method::Get,
		"/recognition/status",
		FakeReply::json(json!({"status": "success", "recognition_active": true, "message": "running"})),
	);
	let status = session.status().await.unwrap();
	assert!(status.recognition_active);

	h.transport.respond_once(Method::Get, "/recognition/status", FakeReply::fail(500, "down"));
	assert!(session.status().await.is_none());
	assert_eq!(notifier.messages().len(), 1);
}
