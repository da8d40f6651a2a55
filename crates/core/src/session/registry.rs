use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// The user whose capture session currently holds the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCapture {
	pub user_id: i64,
	pub user_name: String,
}

#[derive(Debug, Default)]
struct Slot {
	next_claim: u64,
	held: Option<(u64, ActiveCapture)>,
}

/// Single-slot registry enforcing at most one active capture session.
///
/// Owned by the application shell and shared as `Arc<SessionRegistry>`.
/// Claims are identified by an opaque id so a session can only release the
/// slot it holds.
#[derive(Debug, Default)]
pub struct SessionRegistry {
	slot: Mutex<Slot>,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes the slot for `user_id`. Fails with `SessionConflict` when held.
	pub fn claim(&self, user_id: i64, user_name: &str) -> Result<u64> {
		let mut slot = self.slot.lock();
		if let Some((_, active)) = &slot.held {
			return Err(Error::SessionConflict {
				active_user_id: active.user_id,
			});
		}
		slot.next_claim += 1;
		let claim = slot.next_claim;
		slot.held = Some((
			claim,
			ActiveCapture {
				user_id,
				user_name: user_name.to_string(),
			},
		));
		debug!(target: "facegate.capture", user_id, claim, "capture slot claimed");
		Ok(claim)
	}

	/// Frees the slot if `claim` still holds it. Returns whether it did.
	pub fn release(&self, claim: u64) -> bool {
		let mut slot = self.slot.lock();
		match &slot.held {
			Some((held, _)) if *held == claim => {
				slot.held = None;
				debug!(target: "facegate.capture", claim, "capture slot released");
				true
			}
			_ => false,
		}
	}

	pub fn active(&self) -> Option<ActiveCapture> {
		self.slot.lock().held.as_ref().map(|(_, active)| active.clone())
	}

	pub fn is_occupied(&self) -> bool {
		self.slot.lock().held.is_some()
	}
}
