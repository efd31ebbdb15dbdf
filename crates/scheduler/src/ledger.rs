//! Outstanding-count ledger and work tickets.
//!
//! Every enqueued item gets one [`WorkTicket`]. Issuing the ticket increments
//! its priority bucket; the ticket's single terminal transition decrements it.
//! A ticket dropped before reaching a terminal state is released as
//! abandoned, so the counts balance on every path including shutdown.

use std::fmt;
use std::sync::Arc;

use lexa_primitives::Priority;
use parking_lot::Mutex;

/// Lifecycle state of a [`WorkTicket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
	Pending,
	/// Released without work: stale reference, unchanged result, dropped try-a-word.
	Skipped,
	/// Released after work that files nothing.
	Completed,
	/// Parked with the filer until the host files the result.
	HandedToFiler,
	Filed,
	/// Released without reaching any of the above, e.g. at shutdown.
	Abandoned,
}

impl TicketState {
	pub const fn is_terminal(self) -> bool {
		!matches!(self, Self::Pending | Self::HandedToFiler)
	}
}

/// Point-in-time copy of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
	pub outstanding: [usize; Priority::COUNT],
	pub enqueued: u64,
	pub skipped: u64,
	pub completed: u64,
	pub filed: u64,
	pub abandoned: u64,
}

impl LedgerSnapshot {
	pub fn outstanding(&self, priority: Priority) -> usize {
		self.outstanding[priority.index()]
	}

	pub fn total_outstanding(&self) -> usize {
		self.outstanding.iter().sum()
	}

	/// Number of tickets that reached a terminal state.
	pub fn released(&self) -> u64 {
		self.skipped + self.completed + self.filed + self.abandoned
	}

	/// True when nothing but reload work is outstanding.
	pub fn is_idle(&self) -> bool {
		Priority::ALL
			.iter()
			.filter(|&&priority| priority != Priority::ReloadGrammarAndLexicon)
			.all(|&priority| self.outstanding(priority) == 0)
	}
}

type ReleaseHook = Box<dyn Fn(bool) + Send + Sync>;

/// Per-priority outstanding counts behind one mutex.
pub struct OutstandingCounts {
	state: Mutex<LedgerSnapshot>,
	on_release: Option<ReleaseHook>,
}

impl Default for OutstandingCounts {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for OutstandingCounts {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OutstandingCounts").field("state", &*self.state.lock()).finish()
	}
}

impl OutstandingCounts {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(LedgerSnapshot::default()),
			on_release: None,
		}
	}

	/// Calls `hook` after every release with the ledger's idle state.
	///
	/// The hook runs outside the ledger lock.
	pub fn with_release_hook(hook: impl Fn(bool) + Send + Sync + 'static) -> Self {
		Self {
			state: Mutex::new(LedgerSnapshot::default()),
			on_release: Some(Box::new(hook)),
		}
	}

	/// Increments `priority` and returns the ticket that owns the increment.
	pub fn issue(self: &Arc<Self>, priority: Priority) -> WorkTicket {
		{
			let mut state = self.state.lock();
			state.outstanding[priority.index()] += 1;
			state.enqueued += 1;
		}
		WorkTicket {
			ledger: Arc::clone(self),
			priority,
			state: TicketState::Pending,
		}
	}

	pub fn outstanding(&self, priority: Priority) -> usize {
		self.state.lock().outstanding(priority)
	}

	pub fn is_idle(&self) -> bool {
		self.state.lock().is_idle()
	}

	pub fn snapshot(&self) -> LedgerSnapshot {
		self.state.lock().clone()
	}

	fn release(&self, priority: Priority, outcome: TicketState) {
		let idle = {
			let mut state = self.state.lock();
			let bucket = &mut state.outstanding[priority.index()];
			debug_assert!(*bucket > 0, "outstanding count underflow for {}", priority.as_str());
			*bucket = bucket.saturating_sub(1);
			match outcome {
				TicketState::Skipped => state.skipped += 1,
				TicketState::Completed => state.completed += 1,
				TicketState::Filed => state.filed += 1,
				TicketState::Abandoned => state.abandoned += 1,
				TicketState::Pending | TicketState::HandedToFiler => {
					debug_assert!(false, "release with non-terminal state {outcome:?}")
				}
			}
			state.is_idle()
		};
		if let Some(hook) = &self.on_release {
			hook(idle);
		}
	}
}

/// Owner of one outstanding-count increment.
#[must_use = "dropping a pending ticket releases it as abandoned"]
pub struct WorkTicket {
	ledger: Arc<OutstandingCounts>,
	priority: Priority,
	state: TicketState,
}

impl fmt::Debug for WorkTicket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WorkTicket")
			.field("priority", &self.priority)
			.field("state", &self.state)
			.finish()
	}
}

impl WorkTicket {
	pub fn priority(&self) -> Priority {
		self.priority
	}

	pub fn state(&self) -> TicketState {
		self.state
	}

	/// Releases the ticket without work. Valid while pending or parked with the filer.
	pub fn skip(mut self) {
		self.finish(TicketState::Skipped);
	}

	/// Releases the ticket after work that files nothing.
	pub fn complete(mut self) {
		debug_assert_eq!(self.state, TicketState::Pending);
		self.finish(TicketState::Completed);
	}

	/// Parks the ticket with the filer; release is deferred to [`WorkTicket::filed`].
	pub fn hand_to_filer(mut self) -> Self {
		debug_assert_eq!(self.state, TicketState::Pending);
		self.state = TicketState::HandedToFiler;
		self
	}

	/// Releases a parked ticket after its result was filed.
	pub fn filed(mut self) {
		debug_assert_eq!(self.state, TicketState::HandedToFiler);
		self.finish(TicketState::Filed);
	}

	fn finish(&mut self, outcome: TicketState) {
		debug_assert!(!self.state.is_terminal(), "ticket released twice");
		self.state = outcome;
		self.ledger.release(self.priority, outcome);
	}
}

impl Drop for WorkTicket {
	fn drop(&mut self) {
		if self.state.is_terminal() {
			return;
		}
		tracing::warn!(priority = self.priority.as_str(), state = ?self.state, "ledger.ticket_abandoned");
		self.finish(TicketState::Abandoned);
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn every_exit_releases_once() {
		let ledger = Arc::new(OutstandingCounts::new());
		ledger.issue(Priority::Low).skip();
		ledger.issue(Priority::TryAWord).complete();
		ledger.issue(Priority::High).hand_to_filer().filed();
		drop(ledger.issue(Priority::Medium));
		drop(ledger.issue(Priority::Medium).hand_to_filer());

		let snapshot = ledger.snapshot();
		assert_eq!(
			snapshot,
			LedgerSnapshot {
				outstanding: [0; Priority::COUNT],
				enqueued: 5,
				skipped: 1,
				completed: 1,
				filed: 1,
				abandoned: 2,
			}
		);
		assert_eq!(snapshot.released(), snapshot.enqueued);
	}

	#[test]
	fn parked_ticket_keeps_count_until_filed() {
		let ledger = Arc::new(OutstandingCounts::new());
		let ticket = ledger.issue(Priority::Low).hand_to_filer();
		assert_eq!(ticket.state(), TicketState::HandedToFiler);
		assert_eq!(ledger.outstanding(Priority::Low), 1);
		assert!(!ledger.is_idle());
		ticket.filed();
		assert_eq!(ledger.outstanding(Priority::Low), 0);
		assert!(ledger.is_idle());
	}

	#[test]
	fn reload_work_does_not_block_idle() {
		let ledger = Arc::new(OutstandingCounts::new());
		let reload = ledger.issue(Priority::ReloadGrammarAndLexicon);
		assert!(ledger.is_idle());
		reload.complete();
	}

	#[test]
	fn release_hook_sees_idle_transition() {
		let idle_calls = Arc::new(AtomicUsize::new(0));
		let seen = Arc::clone(&idle_calls);
		let ledger = Arc::new(OutstandingCounts::with_release_hook(move |idle| {
			if idle {
				seen.fetch_add(1, Ordering::SeqCst);
			}
		}));
		let first = ledger.issue(Priority::High);
		let second = ledger.issue(Priority::Low);
		first.skip();
		assert_eq!(idle_calls.load(Ordering::SeqCst), 0);
		second.skip();
		assert_eq!(idle_calls.load(Ordering::SeqCst), 1);
	}
}
