//! Login exchange bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub username: String,
	pub password: String,
}

/// Successful body of `POST /login`.
///
/// Current servers return the account under `user`; older ones used `admin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
	pub access_token: String,
	#[serde(default, alias = "admin")]
	pub user: Option<AdminUser>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// The authenticated account as described by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
	pub username: String,
	#[serde(default = "default_role")]
	pub role: String,
}

fn default_role() -> String {
	"admin".to_string()
}

impl LoginResponse {
	/// Parses a login body, returning `None` when no access token is present.
	pub fn from_value(value: &Value) -> Option<Self> {
		serde_json::from_value(value.clone()).ok()
	}
}
