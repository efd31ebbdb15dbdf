//! Host idle-processing interface.
//!
//! The host application owns the lexicon store and exposes exactly one way
//! to touch it: callbacks run on its own thread during idle windows. The
//! pipeline only ever schedules onto that thread and never blocks on it.

mod idle_queue;

pub use idle_queue::{IdleQueue, TransactionGuard};
use serde::Deserialize;

/// Urgency tier of an idle callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleTier {
	High,
	Medium,
	Low,
}

impl IdleTier {
	pub(crate) const COUNT: usize = 3;

	pub(crate) const fn index(self) -> usize {
		self as usize
	}
}

/// Answer of an idle callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleStatus {
	/// Work is done; drop the callback.
	Done,
	/// Could not run (or has more to do); keep the callback queued.
	TryLater,
}

/// Callback run on the host's store-owning thread.
pub type IdleCallback = Box<dyn FnMut() -> IdleStatus + Send>;

/// The host's idle-scheduling primitive.
pub trait IdleHost: Send + Sync {
	/// Queues `callback` to run on the host thread during an idle window.
	fn schedule_on_idle(&self, tier: IdleTier, callback: IdleCallback);

	/// Returns true while a store transaction is open on the host thread.
	fn transaction_in_progress(&self) -> bool;
}
