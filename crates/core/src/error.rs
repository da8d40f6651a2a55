//! Error types for the facegate client layer.

use thiserror::Error;

/// Failures acquiring or driving the capture device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
	/// The display target the camera should bind to does not exist.
	#[error("failed to access camera: video target not found: {0}")]
	TargetNotFound(String),
	/// The device refused access (permission denied).
	#[error("failed to access camera: access denied: {0}")]
	AccessDenied(String),
	/// No usable device, or the device failed while opening.
	#[error("failed to access camera: {0}")]
	Unavailable(String),
	/// An operation that needs a live stream ran while the camera was stopped.
	#[error("camera not active")]
	NotActive,
}

/// Errors surfaced by facegate operations.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Camera(#[from] CameraError),

	/// Non-2xx response, network failure, or a `{"status":"error"}` body.
	#[error("{message}")]
	Transport { status: Option<u16>, message: String },

	/// The server answered 401; the stored token has been discarded.
	#[error("session expired, log in again")]
	SessionExpired,

	/// `complete()` on a capture session with no captured images.
	#[error("no images captured")]
	EmptySession,

	/// Another capture session already holds the registry slot.
	#[error("a capture session is already active for user {active_user_id}")]
	SessionConflict { active_user_id: i64 },

	/// A malformed inbound channel envelope.
	#[error("malformed channel envelope: {0}")]
	ChannelParse(String),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub(crate) fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
		Self::Transport {
			status,
			message: message.into(),
		}
	}

	/// HTTP status attached to a transport failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport { status, .. } => *status,
			Self::SessionExpired => Some(401),
			_ => None,
		}
	}

	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired)
	}

	pub fn is_camera(&self) -> bool {
		matches!(self, Self::Camera(_))
	}
}

pub type Result<T> = std::result::Result<T, Error>;
