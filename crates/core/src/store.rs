//! Persistent storage for the authentication token.
//!
//! The token is opaque to the client. [`FileTokenStore`] keeps it in
//! `session.json` under the state directory so it survives process restarts;
//! [`MemoryTokenStore`] is for embedding and tests.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Fixed file name holding the token.
pub const SESSION_FILE: &str = "session.json";

/// Persists one opaque token.
pub trait TokenStore: Send + Sync {
	fn get(&self) -> Option<String>;
	fn set(&self, token: &str) -> Result<()>;
	fn remove(&self) -> Result<()>;

	fn is_authenticated(&self) -> bool {
		self.get().is_some()
	}
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
	#[serde(default)]
	access_token: Option<String>,
}

/// JSON-file backed token store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
	path: PathBuf,
}

impl FileTokenStore {
	/// Store rooted at `state_dir`; the file is created lazily on first `set`.
	pub fn new(state_dir: &Path) -> Self {
		Self {
			path: state_dir.join(SESSION_FILE),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> SessionFile {
		fs::read_to_string(&self.path)
			.ok()
			.and_then(|content| serde_json::from_str(&content).ok())
			.unwrap_or_default()
	}
}

impl TokenStore for FileTokenStore {
	fn get(&self) -> Option<String> {
		self.load().access_token.filter(|token| !token.is_empty())
	}

	fn set(&self, token: &str) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let file = SessionFile {
			access_token: Some(token.to_string()),
		};
		fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
		debug!(target: "facegate.auth", path = %self.path.display(), "session token stored");
		Ok(())
	}

	fn remove(&self) -> Result<()> {
		match fs::remove_file(&self.path) {
			Ok(()) => {
				debug!(target: "facegate.auth", path = %self.path.display(), "session token removed");
				Ok(())
			}
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
	token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(token: impl Into<String>) -> Self {
		Self {
			token: Mutex::new(Some(token.into())),
		}
	}
}

impl TokenStore for MemoryTokenStore {
	fn get(&self) -> Option<String> {
		self.token.lock().clone()
	}

	fn set(&self, token: &str) -> Result<()> {
		*self.token.lock() = Some(token.to_string());
		Ok(())
	}

	fn remove(&self) -> Result<()> {
		*self.token.lock() = None;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn file_store_round_trips_across_instances() {
		let tmp = TempDir::new().unwrap();
		let store = FileTokenStore::new(tmp.path());
		assert!(!store.is_authenticated());

		store.set("abc.def.ghi").unwrap();
		let reopened = FileTokenStore::new(tmp.path());
		assert_eq!(reopened.get().as_deref(), Some("abc.def.ghi"));
	}

	#[test]
	fn file_store_remove_is_idempotent() {
		let tmp = TempDir::new().unwrap();
		let store = FileTokenStore::new(tmp.path());
		store.set("token").unwrap();
		store.remove().unwrap();
		store.remove().unwrap();
		assert_eq!(store.get(), None);
		assert!(!store.path().exists());
	}

	#[test]
	fn corrupt_session_file_reads_as_logged_out() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join(SESSION_FILE), "garbage").unwrap();
		assert_eq!(FileTokenStore::new(tmp.path()).get(), None);
	}

	#[test]
	fn file_store_creates_missing_state_dir() {
		let tmp = TempDir::new().unwrap();
		let store = FileTokenStore::new(&tmp.path().join("a").join("b"));
		store.set("t").unwrap();
		assert!(store.path().exists());
	}

	#[test]
	fn memory_store_basics() {
		let store = MemoryTokenStore::with_token("x");
		assert!(store.is_authenticated());
		store.remove().unwrap();
		assert!(!store.is_authenticated());
	}
}
