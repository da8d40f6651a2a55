//! Administrative read-only bodies: system health and registered users.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ResponseStatus;

/// Body of `GET /system/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<ResponseStatus>,
	/// Component name to health flag (`camera`, `database`, `face_detection`, ...).
	#[serde(default)]
	pub components: BTreeMap<String, bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub face_recognition_method: Option<String>,
}

impl SystemStatus {
	/// Names of components reporting unhealthy.
	pub fn failing_components(&self) -> Vec<&str> {
		self.components.iter().filter(|(_, ok)| !**ok).map(|(name, _)| name.as_str()).collect()
	}
}

/// A registered person as listed by `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
	pub id: i64,
	#[serde(default)]
	pub person_id: Option<String>,
	pub name: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub department: Option<String>,
	#[serde(default)]
	pub created_at: Option<String>,
	#[serde(default = "default_true")]
	pub is_active: bool,
	#[serde(default)]
	pub has_face_data: bool,
}

fn default_true() -> bool {
	true
}

/// Body of `GET /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
	#[serde(default)]
	pub users: Vec<UserSummary>,
	#[serde(default)]
	pub count: usize,
}
