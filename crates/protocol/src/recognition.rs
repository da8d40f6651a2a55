//! Recognition status and confidence classification.

use serde::{Deserialize, Serialize};

use crate::ResponseStatus;

/// Body of `GET /recognition/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionStatus {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<ResponseStatus>,
	#[serde(default)]
	pub recognition_active: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// Display band for a recognition confidence percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
	High,
	Medium,
	Low,
}

impl ConfidenceBand {
	/// Classifies a 0-100 confidence value: `>= 80` high, `>= 60` medium, else low.
	pub fn classify(confidence: f64) -> Self {
		if confidence >= 80.0 {
			Self::High
		} else if confidence >= 60.0 {
			Self::Medium
		} else {
			Self::Low
		}
	}

	/// Formats a confidence value with one decimal and a percent sign.
	pub fn format(confidence: f64) -> String {
		format!("{confidence:.1}%")
	}
}
