//! Authenticated HTTP transport.
//!
//! Every REST call made by the sessions goes through the [`Transport`] trait so
//! tests can swap in [`crate::testing::FakeTransport`]. [`ApiClient`] is the
//! real implementation on top of `reqwest`.
//!
//! # Result mapping
//!
//! | response | result |
//! |----------|--------|
//! | 2xx, JSON body | `Ok(body)` |
//! | 2xx, `{"status":"error", ...}` | `Err(Transport)` with the body's message |
//! | 401 | token removed from the store, `Err(SessionExpired)` |
//! | other non-2xx | `Err(Transport { status, message })` |
//! | network failure | `Err(Transport { status: None, .. })` |

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use facegate_protocol::{ErrorBody, ResponseStatus, SystemStatus, UserList};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::store::TokenStore;

const FALLBACK_MESSAGE: &str = "Request failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
	Get,
	Post,
	Put,
	Delete,
}

impl Method {
	fn as_reqwest(self) -> reqwest::Method {
		match self {
			Self::Get => reqwest::Method::GET,
			Self::Post => reqwest::Method::POST,
			Self::Put => reqwest::Method::PUT,
			Self::Delete => reqwest::Method::DELETE,
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		})
	}
}

/// Performs authenticated requests against the API base.
///
/// `endpoint` is a path such as `/capture/start/7`; implementations join it to
/// their configured base URL.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn request(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Value>;

	async fn get(&self, endpoint: &str) -> Result<Value> {
		self.request(Method::Get, endpoint, None).await
	}

	async fn post(&self, endpoint: &str, body: Option<Value>) -> Result<Value> {
		self.request(Method::Post, endpoint, body).await
	}

	async fn put(&self, endpoint: &str, body: Option<Value>) -> Result<Value> {
		self.request(Method::Put, endpoint, body).await
	}

	async fn delete(&self, endpoint: &str) -> Result<Value> {
		self.request(Method::Delete, endpoint, None).await
	}
}

/// Response before status interpretation.
#[derive(Debug)]
pub(crate) struct RawResponse {
	pub status: u16,
	/// `None` when the body was not valid JSON. An empty body reads as `Null`.
	pub body: Option<Value>,
}

impl RawResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Server-provided error text (`error`, else `message`).
	pub fn error_message(&self) -> Option<String> {
		self.body
			.as_ref()
			.and_then(ErrorBody::from_value)
			.and_then(|body| body.best_message().map(str::to_string))
	}
}

/// `reqwest`-backed [`Transport`].
#[derive(Clone)]
pub struct ApiClient {
	base_url: String,
	http: reqwest::Client,
	store: Arc<dyn TokenStore>,
}

impl fmt::Debug for ApiClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
	}
}

impl ApiClient {
	pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Result<Self> {
		Self::with_timeout(base_url, store, None)
	}

	/// Client whose requests give up after `timeout`. `None` never times out.
	pub fn with_timeout(base_url: impl Into<String>, store: Arc<dyn TokenStore>, timeout: Option<Duration>) -> Result<Self> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		let http = builder.build().map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
		Ok(Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			http,
			store,
		})
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	fn url_for(&self, endpoint: &str) -> String {
		if endpoint.starts_with('/') {
			format!("{}{endpoint}", self.base_url)
		} else {
			format!("{}/{endpoint}", self.base_url)
		}
	}

	/// Sends a request and returns the status and body without interpreting them.
	pub(crate) async fn send_raw(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<RawResponse> {
		let url = self.url_for(endpoint);
		let mut request = self.http.request(method.as_reqwest(), &url).header(CONTENT_TYPE, "application/json");
		if let Some(token) = self.store.get() {
			request = request.bearer_auth(token);
		}
		if let Some(body) = body {
			request = request.body(serde_json::to_vec(&body)?);
		}

		let response = request.send().await.map_err(|err| {
			warn!(target: "facegate.transport", %method, %url, error = %err, "request failed to send");
			Error::transport(None, err.to_string())
		})?;
		let status = response.status().as_u16();
		let text = response.text().await.map_err(|err| Error::transport(Some(status), err.to_string()))?;
		let body = if text.trim().is_empty() { Some(Value::Null) } else { serde_json::from_str(&text).ok() };

		debug!(target: "facegate.transport", %method, %url, status, "response received");
		Ok(RawResponse { status, body })
	}

	/// `GET /system/status`.
	pub async fn system_status(&self) -> Result<SystemStatus> {
		let value = self.get("/system/status").await?;
		Ok(serde_json::from_value(value)?)
	}

	/// `GET /users`.
	pub async fn list_users(&self) -> Result<UserList> {
		let value = self.get("/users").await?;
		Ok(serde_json::from_value(value)?)
	}
}

#[async_trait]
impl Transport for ApiClient {
	async fn request(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Value> {
		let raw = self.send_raw(method, endpoint, body).await?;

		if raw.status == 401 {
			warn!(target: "facegate.transport", %method, endpoint, "session rejected by server, discarding token");
			self.store.remove()?;
			return Err(Error::SessionExpired);
		}

		if !raw.is_success() {
			let message = raw.error_message().unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
			return Err(Error::transport(Some(raw.status), message));
		}

		let Some(body) = raw.body else {
			return Err(Error::transport(Some(raw.status), "invalid JSON in response body"));
		};

		if let Some(err) = ErrorBody::from_value(&body).filter(|b| b.status == Some(ResponseStatus::Error)) {
			let message = err.best_message().unwrap_or(FALLBACK_MESSAGE).to_string();
			return Err(Error::transport(Some(raw.status), message));
		}

		Ok(body)
	}
}
