//! Training-image capture bodies.

use serde::{Deserialize, Serialize};

/// Result of one server-side capture+detect cycle (`POST /capture/image`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureImageResult {
	#[serde(default)]
	pub faces_detected: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// Result of finalizing a training set (`POST /capture/complete`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureCompleteResult {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub images_processed: Option<u32>,
}
