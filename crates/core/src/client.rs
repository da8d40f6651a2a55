//! Wiring of the client components from one [`ClientConfig`].

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::camera::{CameraBackend, CameraSource, StillImageBackend};
use crate::channel::EventChannel;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::notifier::{LogNotifier, Notifier};
use crate::session::{CaptureSession, RecognitionSession, SessionRegistry};
use crate::store::{FileTokenStore, TokenStore};
use crate::transport::{ApiClient, Transport};

/// Entry point owning the shared collaborators.
///
/// Sessions created from the same `Facegate` share its [`SessionRegistry`], so
/// only one capture session can be active at a time.
pub struct Facegate {
	config: ClientConfig,
	api: Arc<ApiClient>,
	auth: AuthManager,
	registry: Arc<SessionRegistry>,
	notifier: Arc<dyn Notifier>,
	backend: Arc<dyn CameraBackend>,
}

impl std::fmt::Debug for Facegate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Facegate").field("config", &self.config).field("api", &self.api).finish_non_exhaustive()
	}
}

impl Facegate {
	/// Validates `config` and builds a client with a file token store under the
	/// state dir, still-image camera, and log notifier.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.state_dir()));
		Self::with_parts(config, store, Arc::new(StillImageBackend), Arc::new(LogNotifier))
	}

	pub fn with_parts(config: ClientConfig, store: Arc<dyn TokenStore>, backend: Arc<dyn CameraBackend>, notifier: Arc<dyn Notifier>) -> Result<Self> {
		config.validate()?;
		let api = Arc::new(ApiClient::with_timeout(config.api_base_url.clone(), store, config.request_timeout())?);
		Ok(Self {
			auth: AuthManager::new(Arc::clone(&api)),
			api,
			config,
			registry: Arc::new(SessionRegistry::new()),
			notifier,
			backend,
		})
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub fn api(&self) -> &Arc<ApiClient> {
		&self.api
	}

	pub fn auth(&self) -> &AuthManager {
		&self.auth
	}

	pub fn registry(&self) -> &Arc<SessionRegistry> {
		&self.registry
	}

	pub fn notifier(&self) -> &Arc<dyn Notifier> {
		&self.notifier
	}

	/// Fresh camera handle using the configured constraints.
	pub fn camera(&self) -> CameraSource {
		CameraSource::new(Arc::clone(&self.backend), self.config.camera.clone())
	}

	pub fn capture_session(&self, user_id: i64, user_name: &str) -> CaptureSession {
		let transport: Arc<dyn Transport> = self.api.clone();
		CaptureSession::new(user_id, user_name, transport, self.camera(), Arc::clone(&self.registry))
			.with_max_images(self.config.max_capture_images)
			.with_notifier(Arc::clone(&self.notifier))
	}

	pub fn recognition_session(&self) -> RecognitionSession {
		let transport: Arc<dyn Transport> = self.api.clone();
		RecognitionSession::new(self.camera(), transport, Arc::clone(&self.notifier)).with_frame_interval(self.config.recognition_frame_interval())
	}

	/// Unconnected event channel for the configured WebSocket URL.
	pub fn event_channel(&self) -> EventChannel {
		EventChannel::new(self.config.websocket_url.clone(), self.config.reconnect)
	}
}
