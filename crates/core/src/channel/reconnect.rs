use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounded linear backoff for the event channel.
///
/// After an unexpected closure the channel waits `base_delay * k` before
/// attempt `k` (1-based) and gives up once `max_attempts` attempts have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
	pub max_attempts: u32,
	pub base_delay_ms: u64,
}

impl Default for ReconnectPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 5,
			base_delay_ms: 1000,
		}
	}
}

impl ReconnectPolicy {
	pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
		Self {
			max_attempts,
			base_delay_ms: base_delay.as_millis() as u64,
		}
	}

	pub fn base_delay(&self) -> Duration {
		Duration::from_millis(self.base_delay_ms)
	}

	/// Wait before attempt `attempt`. Attempt 0 is the initial connect.
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		self.base_delay().saturating_mul(attempt)
	}

	/// Whether another attempt may follow `attempts` failed ones.
	pub fn allows(&self, attempts: u32) -> bool {
		attempts < self.max_attempts
	}
}
