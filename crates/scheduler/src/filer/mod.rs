//! Result filing on the host thread.
//!
//! The engine thread hands finished results to [`ResultFiler::file`], which
//! only records them and makes sure one idle callback is queued on the host.
//! That callback drains up to `max_batch` wordforms into a single
//! non-undoable store transaction, then releases the tickets and broadcasts
//! one [`WordformFiled`] per ticket.

mod apply;

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use indexmap::map::Entry;
use lexa_primitives::{ParseResult, WordformId};
use lexa_worker::TaskClass;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};
use tokio::sync::broadcast;

use crate::config::SchedulerConfig;
use crate::host::{IdleHost, IdleStatus, IdleTier};
use crate::item::WordformFiled;
use crate::ledger::WorkTicket;
use crate::store::LexiconStore;

/// Cumulative filing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilerStats {
	/// Transactions run.
	pub batches: u64,
	/// Wordforms written.
	pub filed: u64,
	/// Wordforms dropped because a referenced record was gone.
	pub invalid: u64,
	/// Callback runs declined because a host transaction was open.
	pub deferred: u64,
	/// Pending results replaced by a newer one for the same wordform.
	pub superseded: u64,
}

struct PendingFiling {
	result: ParseResult,
	/// Every ticket waiting on this wordform; superseded ones ride along.
	tickets: SmallVec<[WorkTicket; 1]>,
}

#[derive(Default)]
struct FilerState {
	pending: IndexMap<WordformId, PendingFiling>,
	/// Drained by a running batch but not yet written.
	in_flight: FxHashSet<WordformId>,
	callback_scheduled: bool,
	closed: bool,
	stats: FilerStats,
}

struct FilerInner {
	store: Arc<dyn LexiconStore>,
	host: Arc<dyn IdleHost>,
	tier: IdleTier,
	max_batch: usize,
	state: Mutex<FilerState>,
	events: broadcast::Sender<WordformFiled>,
}

/// Batches parse results into host-thread store transactions.
#[derive(Clone)]
pub struct ResultFiler {
	inner: Arc<FilerInner>,
}

impl ResultFiler {
	pub fn new(store: Arc<dyn LexiconStore>, host: Arc<dyn IdleHost>, config: &SchedulerConfig) -> Self {
		let (events, _) = broadcast::channel(config.event_capacity);
		Self {
			inner: Arc::new(FilerInner {
				store,
				host,
				tier: config.filing_tier,
				max_batch: config.max_batch,
				state: Mutex::new(FilerState::default()),
				events,
			}),
		}
	}

	/// Queues `result` for `wordform`, replacing any result still pending for it.
	///
	/// `ticket` is released when the host files the wordform. After
	/// [`ResultFiler::close`] the ticket is abandoned immediately.
	pub fn file(&self, wordform: WordformId, result: ParseResult, ticket: WorkTicket) {
		let schedule = {
			let mut guard = self.inner.state.lock();
			let state = &mut *guard;
			if state.closed {
				None
			} else {
				match state.pending.entry(wordform) {
					Entry::Occupied(mut entry) => {
						let pending = entry.get_mut();
						pending.result = result;
						pending.tickets.push(ticket);
						state.stats.superseded += 1;
						tracing::debug!(%wordform, "filer.superseded");
					}
					Entry::Vacant(entry) => {
						entry.insert(PendingFiling {
							result,
							tickets: smallvec![ticket],
						});
					}
				}
				Some(!std::mem::replace(&mut state.callback_scheduled, true))
			}
		};

		match schedule {
			None => tracing::warn!(%wordform, "filer.closed: dropping result"),
			Some(true) => self.schedule(),
			Some(false) => {}
		}
	}

	fn schedule(&self) {
		let weak: Weak<FilerInner> = Arc::downgrade(&self.inner);
		self.inner.host.schedule_on_idle(
			self.inner.tier,
			Box::new(move || match weak.upgrade() {
				Some(inner) => inner.run_batch(),
				None => IdleStatus::Done,
			}),
		);
	}

	/// Stops accepting results and abandons the tickets still pending.
	///
	/// A callback already queued on the host becomes a no-op.
	pub fn close(&self) {
		let drained: Vec<PendingFiling> = {
			let mut state = self.inner.state.lock();
			state.closed = true;
			state.pending.drain(..).map(|(_, pending)| pending).collect()
		};
		let tickets: usize = drained.iter().map(|pending| pending.tickets.len()).sum();
		if tickets > 0 {
			tracing::warn!(wordforms = drained.len(), tickets, "filer.close: abandoning pending results");
		}
	}

	pub fn is_closed(&self) -> bool {
		self.inner.state.lock().closed
	}

	/// True when no result for `wordform` is pending or being written.
	///
	/// Once this holds, the store's checksum for `wordform` reflects the last
	/// result handed to this filer.
	pub fn is_settled(&self, wordform: WordformId) -> bool {
		let state = self.inner.state.lock();
		!state.pending.contains_key(&wordform) && !state.in_flight.contains(&wordform)
	}

	/// Number of wordforms waiting to be filed.
	pub fn pending(&self) -> usize {
		self.inner.state.lock().pending.len()
	}

	pub fn stats(&self) -> FilerStats {
		self.inner.state.lock().stats
	}

	/// Subscribes to completion events. Slow receivers see `Lagged` errors.
	pub fn subscribe(&self) -> broadcast::Receiver<WordformFiled> {
		self.inner.events.subscribe()
	}
}

impl FilerInner {
	/// Body of the host idle callback.
	fn run_batch(&self) -> IdleStatus {
		if self.host.transaction_in_progress() {
			self.state.lock().stats.deferred += 1;
			tracing::debug!("filer.deferred: host transaction open");
			return IdleStatus::TryLater;
		}

		let batch: Vec<(WordformId, PendingFiling)> = {
			let mut state = self.state.lock();
			if state.closed {
				state.callback_scheduled = false;
				return IdleStatus::Done;
			}
			let take = state.pending.len().min(self.max_batch);
			let batch: Vec<_> = state.pending.drain(..take).collect();
			state.in_flight.extend(batch.iter().map(|(wordform, _)| *wordform));
			batch
		};

		if !batch.is_empty() {
			self.apply(batch);
		}

		let mut state = self.state.lock();
		if state.closed || state.pending.is_empty() {
			state.callback_scheduled = false;
			IdleStatus::Done
		} else {
			tracing::debug!(remaining = state.pending.len(), "filer.rescheduled");
			IdleStatus::TryLater
		}
	}

	fn apply(&self, batch: Vec<(WordformId, PendingFiling)>) {
		let mut valid = Vec::with_capacity(batch.len());
		self.store.edit_non_undoable(&mut |edit| {
			valid.clear();
			valid.extend(batch.iter().map(|(wordform, pending)| apply::file_one(&mut *edit, *wordform, &pending.result)));
		});

		let filed = valid.iter().filter(|&&ok| ok).count();
		let invalid = batch.len() - filed;
		{
			let mut state = self.state.lock();
			for (wordform, _) in &batch {
				state.in_flight.remove(wordform);
			}
			state.stats.batches += 1;
			state.stats.filed += filed as u64;
			state.stats.invalid += invalid as u64;
		}
		tracing::trace!(worker_class = TaskClass::HostIdle.as_str(), filed, invalid, "filer.batch");

		for ((wordform, pending), ok) in batch.into_iter().zip(valid) {
			for ticket in pending.tickets {
				if ok {
					let priority = ticket.priority();
					ticket.filed();
					let _ = self.events.send(WordformFiled { wordform, priority });
				} else {
					ticket.skip();
				}
			}
		}
	}
}
