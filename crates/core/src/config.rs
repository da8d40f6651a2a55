//! Client configuration.
//!
//! Loaded from a JSON file (`<config dir>/facegate/config.json` by default) with
//! every field optional, then adjusted by `FACEGATE_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::camera::StreamConstraints;
use crate::channel::ReconnectPolicy;
use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "facegate";

pub const ENV_API_URL: &str = "FACEGATE_API_URL";
pub const ENV_WS_URL: &str = "FACEGATE_WS_URL";
pub const ENV_STATE_DIR: &str = "FACEGATE_STATE_DIR";

/// Effective settings for a facegate client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// REST base, e.g. `http://localhost:5000/api`. Endpoints are appended verbatim.
	pub api_base_url: String,
	/// Event channel address.
	pub websocket_url: String,
	/// Minimum confidence (0-100) for a recognition to count as a match.
	pub recognition_threshold: f64,
	/// Training images collected per capture session.
	pub max_capture_images: usize,
	/// Pause between capture requests when driving a session automatically.
	pub capture_interval_ms: u64,
	/// Period of the local frame loop during recognition.
	pub recognition_frame_interval_ms: u64,
	pub reconnect: ReconnectPolicy,
	pub camera: StreamConstraints,
	/// Where the session token is persisted. Defaults to the platform config dir.
	pub state_dir: Option<PathBuf>,
	/// Per-request HTTP timeout. `None` waits indefinitely.
	pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_base_url: "http://localhost:5000/api".to_string(),
			websocket_url: "ws://localhost:5000/ws".to_string(),
			recognition_threshold: 70.0,
			max_capture_images: 20,
			capture_interval_ms: 500,
			recognition_frame_interval_ms: 1000,
			reconnect: ReconnectPolicy::default(),
			camera: StreamConstraints::default(),
			state_dir: None,
			request_timeout_secs: None,
		}
	}
}

impl ClientConfig {
	/// Reads a config file. Missing keys take their defaults.
	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path).map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
		serde_json::from_str(&content).map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
	}

	/// Loads `path` when given, otherwise the default location if it exists,
	/// otherwise the built-in defaults.
	pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
		match path {
			Some(path) => Self::load(path),
			None => match default_config_path() {
				Some(path) if path.exists() => Self::load(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	/// Applies `FACEGATE_API_URL`, `FACEGATE_WS_URL` and `FACEGATE_STATE_DIR` when set.
	pub fn apply_env_overrides(&mut self) {
		self.apply_overrides(|key| std::env::var(key).ok());
	}

	fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
		if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
			self.api_base_url = url;
		}
		if let Some(url) = lookup(ENV_WS_URL).filter(|v| !v.is_empty()) {
			self.websocket_url = url;
		}
		if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.is_empty()) {
			self.state_dir = Some(PathBuf::from(dir));
		}
	}

	/// Checks URL schemes and numeric ranges.
	pub fn validate(&self) -> Result<()> {
		let api = Url::parse(&self.api_base_url).map_err(|e| Error::Config(format!("api_base_url {:?}: {e}", self.api_base_url)))?;
		if !matches!(api.scheme(), "http" | "https") {
			return Err(Error::Config(format!("api_base_url must be http(s), got {}", api.scheme())));
		}

		let ws = Url::parse(&self.websocket_url).map_err(|e| Error::Config(format!("websocket_url {:?}: {e}", self.websocket_url)))?;
		if !matches!(ws.scheme(), "ws" | "wss") {
			return Err(Error::Config(format!("websocket_url must be ws(s), got {}", ws.scheme())));
		}

		if !(0.0..=100.0).contains(&self.recognition_threshold) {
			return Err(Error::Config(format!("recognition_threshold must be within 0..=100, got {}", self.recognition_threshold)));
		}
		if self.camera.jpeg_quality == 0 || self.camera.jpeg_quality > 100 {
			return Err(Error::Config(format!("camera.jpeg_quality must be within 1..=100, got {}", self.camera.jpeg_quality)));
		}
		Ok(())
	}

	/// Resolved directory for persisted client state.
	pub fn state_dir(&self) -> PathBuf {
		self.state_dir
			.clone()
			.or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR)))
			.unwrap_or_else(|| PathBuf::from(".facegate"))
	}

	pub fn capture_interval(&self) -> Duration {
		Duration::from_millis(self.capture_interval_ms)
	}

	pub fn recognition_frame_interval(&self) -> Duration {
		Duration::from_millis(self.recognition_frame_interval_ms)
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout_secs.map(Duration::from_secs)
	}

	/// Whether a recognition confidence clears the configured threshold.
	pub fn meets_threshold(&self, confidence: f64) -> bool {
		confidence >= self.recognition_threshold
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}
}

/// `<config dir>/facegate/config.json`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
