//! Login and logout against the server.

use std::sync::Arc;

use facegate_protocol::{AdminUser, LoginRequest, LoginResponse};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::transport::{ApiClient, Method};

const NETWORK_ERROR: &str = "Network error";
const LOGIN_FAILED: &str = "Login failed";

/// Result of a login attempt. Login never fails with an `Err`; the failure text
/// is meant to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
	Success { user: AdminUser },
	Failure { error: String },
}

impl LoginOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}
}

/// Owns the login flow and the current account.
#[derive(Debug)]
pub struct AuthManager {
	api: Arc<ApiClient>,
	current_user: Mutex<Option<AdminUser>>,
}

impl AuthManager {
	pub fn new(api: Arc<ApiClient>) -> Self {
		Self {
			api,
			current_user: Mutex::new(None),
		}
	}

	/// `POST /login`. On success the access token is persisted in the store.
	pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
		let request = LoginRequest {
			username: username.to_string(),
			password: password.to_string(),
		};
		let body = match serde_json::to_value(&request) {
			Ok(body) => body,
			Err(err) => return LoginOutcome::Failure { error: err.to_string() },
		};

		let raw = match self.api.send_raw(Method::Post, "/login", Some(body)).await {
			Ok(raw) => raw,
			Err(err) => {
				warn!(target: "facegate.auth", error = %err, "login request failed");
				return LoginOutcome::Failure {
					error: NETWORK_ERROR.to_string(),
				};
			}
		};

		if !raw.is_success() {
			let error = raw.error_message().unwrap_or_else(|| LOGIN_FAILED.to_string());
			info!(target: "facegate.auth", status = raw.status, %error, "login rejected");
			return LoginOutcome::Failure { error };
		}

		let Some(response) = raw.body.as_ref().and_then(LoginResponse::from_value) else {
			let error = raw.error_message().unwrap_or_else(|| LOGIN_FAILED.to_string());
			return LoginOutcome::Failure { error };
		};

		if let Err(err) = self.api.store().set(&response.access_token) {
			warn!(target: "facegate.auth", error = %err, "could not persist session token");
			return LoginOutcome::Failure { error: err.to_string() };
		}

		let user = response.user.unwrap_or_else(|| AdminUser {
			username: username.to_string(),
			role: "admin".to_string(),
		});
		info!(target: "facegate.auth", username = %user.username, "logged in");
		*self.current_user.lock() = Some(user.clone());
		LoginOutcome::Success { user }
	}

	/// Forgets the token and the current account.
	pub fn logout(&self) -> Result<()> {
		*self.current_user.lock() = None;
		self.api.store().remove()
	}

	pub fn is_authenticated(&self) -> bool {
		self.api.store().is_authenticated()
	}

	/// Account from the last successful login in this process.
	pub fn current_user(&self) -> Option<AdminUser> {
		self.current_user.lock().clone()
	}
}
