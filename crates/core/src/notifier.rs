//! User-facing reporting capability.
//!
//! Sessions never render anything themselves; they report through a [`Notifier`].
//! [`LogNotifier`] routes everything into `tracing`, which is what headless
//! consumers and the CLI use.

use tracing::{debug, error, info, warn};

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	Info,
	Success,
	Warning,
	Danger,
}

/// Shows messages and loading indicators to the user.
pub trait Notifier: Send + Sync {
	fn notify(&self, severity: Severity, message: &str);

	fn show_loading(&self, text: &str, subtext: &str) {
		let _ = (text, subtext);
	}

	fn hide_loading(&self) {}
}

/// Notifier that emits `tracing` events under the `facegate.notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn notify(&self, severity: Severity, message: &str) {
		match severity {
			Severity::Info | Severity::Success => info!(target: "facegate.notify", ?severity, "{message}"),
			Severity::Warning => warn!(target: "facegate.notify", "{message}"),
			Severity::Danger => error!(target: "facegate.notify", "{message}"),
		}
	}

	fn show_loading(&self, text: &str, subtext: &str) {
		info!(target: "facegate.notify", %subtext, "{text}");
	}

	fn hide_loading(&self) {
		debug!(target: "facegate.notify", "loading finished");
	}
}
