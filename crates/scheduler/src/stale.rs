//! Stale-model detection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use lexa_primitives::RecordClass;

struct DetectorInner {
	stale: AtomicBool,
	relevant_changes: AtomicU64,
}

/// Passive listener on the store's change feed.
///
/// Flips a stale flag whenever a record class that feeds the grammar or the
/// lexicon changes. Only the engine thread clears the flag, immediately
/// before it rebuilds, so a change arriving during a rebuild re-arms the flag
/// and triggers another rebuild on the next check.
///
/// Starts stale: the engine has not been built yet.
#[derive(Clone)]
pub struct StaleModelDetector {
	inner: Arc<DetectorInner>,
}

impl Default for StaleModelDetector {
	fn default() -> Self {
		Self::new()
	}
}

impl StaleModelDetector {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(DetectorInner {
				stale: AtomicBool::new(true),
				relevant_changes: AtomicU64::new(0),
			}),
		}
	}

	/// Records a change notification. Returns true if it marked the model stale.
	pub fn notify(&self, class: RecordClass) -> bool {
		if !class.affects_engine() {
			return false;
		}
		self.inner.relevant_changes.fetch_add(1, Ordering::Relaxed);
		if !self.inner.stale.swap(true, Ordering::AcqRel) {
			tracing::debug!(class = ?class, "stale.model_changed");
		}
		true
	}

	/// Marks the model stale regardless of record class.
	pub fn mark_stale(&self) {
		self.inner.stale.store(true, Ordering::Release);
	}

	pub fn is_stale(&self) -> bool {
		self.inner.stale.load(Ordering::Acquire)
	}

	/// Number of relevant change notifications seen so far.
	pub fn relevant_changes(&self) -> u64 {
		self.inner.relevant_changes.load(Ordering::Relaxed)
	}

	/// Clears the flag, returning whether it was set.
	pub(crate) fn take_stale(&self) -> bool {
		self.inner.stale.swap(false, Ordering::AcqRel)
	}
}
