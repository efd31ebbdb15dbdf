use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lexa_worker::TaskClass;
use parking_lot::Mutex;

use super::{IdleCallback, IdleHost, IdleStatus, IdleTier};

/// Tiered idle queue pumped by the host from its own thread.
///
/// [`IdleQueue::pump`] runs every callback queued at the time of the call
/// once, most urgent tier first. Callbacks answering [`IdleStatus::TryLater`]
/// go back to the end of their tier. Callbacks may schedule new callbacks;
/// those run on the next pump.
#[derive(Default)]
pub struct IdleQueue {
	tiers: Mutex<[VecDeque<IdleCallback>; IdleTier::COUNT]>,
	open_transactions: Arc<AtomicUsize>,
}

impl IdleQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs one idle window. Returns the number of callbacks that finished.
	pub fn pump(&self) -> usize {
		let batch: Vec<(IdleTier, IdleCallback)> = {
			let mut tiers = self.tiers.lock();
			[IdleTier::High, IdleTier::Medium, IdleTier::Low]
				.into_iter()
				.flat_map(|tier| std::mem::take(&mut tiers[tier.index()]).into_iter().map(move |cb| (tier, cb)))
				.collect()
		};
		if batch.is_empty() {
			return 0;
		}

		let mut done = 0;
		let mut retry = Vec::new();
		for (tier, mut callback) in batch {
			match callback() {
				IdleStatus::Done => done += 1,
				IdleStatus::TryLater => retry.push((tier, callback)),
			}
		}
		tracing::trace!(
			worker_class = TaskClass::HostIdle.as_str(),
			done,
			retry = retry.len(),
			"idle.pump"
		);

		if !retry.is_empty() {
			let mut tiers = self.tiers.lock();
			for (tier, callback) in retry {
				tiers[tier.index()].push_back(callback);
			}
		}
		done
	}

	/// Number of queued callbacks.
	pub fn pending(&self) -> usize {
		self.tiers.lock().iter().map(VecDeque::len).sum()
	}

	/// Marks a store transaction open until the guard drops.
	///
	/// While any guard is alive, [`IdleHost::transaction_in_progress`] is true.
	pub fn begin_transaction(&self) -> TransactionGuard {
		self.open_transactions.fetch_add(1, Ordering::SeqCst);
		TransactionGuard {
			depth: Arc::clone(&self.open_transactions),
		}
	}
}

impl IdleHost for IdleQueue {
	fn schedule_on_idle(&self, tier: IdleTier, callback: IdleCallback) {
		self.tiers.lock()[tier.index()].push_back(callback);
	}

	fn transaction_in_progress(&self) -> bool {
		self.open_transactions.load(Ordering::SeqCst) > 0
	}
}

/// Guard for an open host transaction.
pub struct TransactionGuard {
	depth: Arc<AtomicUsize>,
}

impl Drop for TransactionGuard {
	fn drop(&mut self) {
		let prev = self.depth.fetch_sub(1, Ordering::SeqCst);
		debug_assert!(prev > 0, "open_transactions underflow");
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	fn counter_callback(counter: &Arc<AtomicUsize>, status: IdleStatus) -> IdleCallback {
		let counter = Arc::clone(counter);
		Box::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
			status
		})
	}

	#[test]
	fn pump_runs_urgent_tiers_first() {
		let queue = IdleQueue::new();
		let order = Arc::new(Mutex::new(Vec::new()));
		for (tier, name) in [(IdleTier::Low, "low"), (IdleTier::High, "high"), (IdleTier::Medium, "medium")] {
			let order = Arc::clone(&order);
			queue.schedule_on_idle(
				tier,
				Box::new(move || {
					order.lock().push(name);
					IdleStatus::Done
				}),
			);
		}
		assert_eq!(queue.pump(), 3);
		assert_eq!(*order.lock(), vec!["high", "medium", "low"]);
		assert_eq!(queue.pending(), 0);
	}

	#[test]
	fn try_later_keeps_callback_queued() {
		let queue = IdleQueue::new();
		let runs = Arc::new(AtomicUsize::new(0));
		queue.schedule_on_idle(IdleTier::Low, counter_callback(&runs, IdleStatus::TryLater));

		assert_eq!(queue.pump(), 0);
		assert_eq!(queue.pump(), 0);
		assert_eq!(runs.load(Ordering::SeqCst), 2);
		assert_eq!(queue.pending(), 1);
	}

	#[test]
	fn transaction_guard_tracks_depth() {
		let queue = IdleQueue::new();
		assert!(!queue.transaction_in_progress());
		let outer = queue.begin_transaction();
		let inner = queue.begin_transaction();
		drop(outer);
		assert!(queue.transaction_in_progress());
		drop(inner);
		assert!(!queue.transaction_in_progress());
	}
}
