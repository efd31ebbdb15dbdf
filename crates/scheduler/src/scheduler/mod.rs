//! The top-level coordinator.
//!
//! [`Scheduler`] owns the engine thread and the priority lanes. Callers push
//! [`WorkItem`]s from any thread; the engine thread pops the most urgent
//! eligible item, runs it through the [`ParseWorker`], and blocks on a
//! condvar while nothing can run.

mod queue;
mod run;

use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

use lexa_primitives::{FormId, Priority, WordformId};
use lexa_progress::ProgressSink;
use lexa_worker::{TaskClass, join_thread, spawn_named_thread};
use parking_lot::{Condvar, Mutex};
use tokio::sync::broadcast;

use self::queue::{Job, PriorityQueues};
use crate::config::SchedulerConfig;
use crate::engine::Parser;
use crate::error::{SchedulerError, SchedulerFailure};
use crate::filer::{FilerStats, ResultFiler};
use crate::host::IdleHost;
use crate::item::{WordformFiled, WorkItem};
use crate::ledger::{LedgerSnapshot, OutstandingCounts};
use crate::stale::StaleModelDetector;
use crate::store::LexiconStore;
use crate::worker::ParseWorker;

#[derive(Default)]
struct LoopState {
	queues: PriorityQueues,
	exclusive: bool,
	stop: bool,
}

/// State shared between callers and the engine thread.
///
/// Lock order: `state` before the ledger's lock. Tickets are never released
/// while `state` is held, since a release re-enters it to wake the loop.
pub(crate) struct Shared {
	state: Mutex<LoopState>,
	wake: Condvar,
	ledger: Arc<OutstandingCounts>,
	failure: Mutex<Option<SchedulerFailure>>,
}

impl Shared {
	fn new() -> Arc<Self> {
		Arc::new_cyclic(|weak: &Weak<Shared>| {
			let weak = weak.clone();
			Shared {
				state: Mutex::new(LoopState::default()),
				wake: Condvar::new(),
				ledger: Arc::new(OutstandingCounts::with_release_hook(move |idle| {
					if idle && let Some(shared) = weak.upgrade() {
						let _state = shared.state.lock();
						shared.wake.notify_all();
					}
				})),
				failure: Mutex::new(None),
			}
		})
	}
}

/// Builder returned by [`Scheduler::builder`].
pub struct SchedulerBuilder {
	parser: Box<dyn Parser>,
	store: Arc<dyn LexiconStore>,
	host: Arc<dyn IdleHost>,
	config: SchedulerConfig,
	sink: Option<ProgressSink>,
	detector: Option<StaleModelDetector>,
}

impl SchedulerBuilder {
	pub fn config(mut self, config: SchedulerConfig) -> Self {
		self.config = config;
		self
	}

	/// Sink receiving every root report the scheduler opens.
	pub fn progress_sink(mut self, sink: ProgressSink) -> Self {
		self.sink = Some(sink);
		self
	}

	/// Uses an existing detector, e.g. one the store already feeds.
	pub fn detector(mut self, detector: StaleModelDetector) -> Self {
		self.detector = Some(detector);
		self
	}

	/// Spawns the engine thread.
	pub fn start(self) -> Result<Scheduler, SchedulerError> {
		let Self {
			parser,
			store,
			host,
			config,
			sink,
			detector,
		} = self;
		let detector = detector.unwrap_or_default();
		let filer = ResultFiler::new(Arc::clone(&store), host, &config);
		let worker = ParseWorker::new(parser, detector.clone(), store, filer.clone(), config.normalization);
		let shared = Shared::new();

		let thread = spawn_named_thread(TaskClass::Engine, config.thread_name.clone(), {
			let shared = Arc::clone(&shared);
			move || run::engine_loop(shared, worker, sink)
		})
		.map_err(SchedulerError::Spawn)?;

		Ok(Scheduler {
			shared,
			thread: Mutex::new(Some(thread)),
			filer,
			detector,
		})
	}
}

/// Asynchronous parse scheduler. Dropping it shuts it down.
pub struct Scheduler {
	shared: Arc<Shared>,
	thread: Mutex<Option<JoinHandle<()>>>,
	filer: ResultFiler,
	detector: StaleModelDetector,
}

impl Scheduler {
	pub fn builder(parser: impl Parser + 'static, store: Arc<dyn LexiconStore>, host: Arc<dyn IdleHost>) -> SchedulerBuilder {
		SchedulerBuilder {
			parser: Box::new(parser),
			store,
			host,
			config: SchedulerConfig::default(),
			sink: None,
			detector: None,
		}
	}

	/// Queues `item` at `priority` and wakes the engine thread. Never blocks
	/// on the engine.
	pub fn enqueue(&self, priority: Priority, item: WorkItem) {
		self.enqueue_batch([(priority, item)]);
	}

	/// Queues several items under one lock acquisition.
	pub fn enqueue_batch(&self, items: impl IntoIterator<Item = (Priority, WorkItem)>) {
		let rejected: Vec<Job> = {
			let mut state = self.shared.state.lock();
			let mut rejected = Vec::new();
			for (priority, item) in items {
				let job = Job {
					item,
					ticket: self.shared.ledger.issue(priority),
				};
				if state.stop {
					rejected.push(job);
					continue;
				}
				tracing::trace!(
					priority = priority.as_str(),
					kind = job.item.kind(),
					lane = state.queues.lane_len(priority),
					"scheduler.enqueue"
				);
				state.queues.push(job);
			}
			rejected
		};
		self.shared.wake.notify_one();
		if !rejected.is_empty() {
			tracing::warn!(items = rejected.len(), "scheduler.enqueue: scheduler is shut down");
		}
	}

	pub fn schedule_wordform(&self, wordform: WordformId, priority: Priority) {
		self.enqueue(priority, WorkItem::update(wordform));
	}

	pub fn schedule_wordforms(&self, wordforms: impl IntoIterator<Item = WordformId>, priority: Priority) {
		self.enqueue_batch(wordforms.into_iter().map(|wordform| (priority, WorkItem::update(wordform))));
	}

	/// Queues an interactive parse. It only runs if exclusive mode is still
	/// active when the engine thread reaches it.
	pub fn try_a_word(&self, text: impl Into<String>, trace: bool, trace_filter: Vec<FormId>) -> Result<(), SchedulerError> {
		let text = text.into();
		if text.trim().is_empty() {
			return Err(SchedulerError::EmptyInput);
		}
		let item = WorkItem::TryAWord {
			text,
			trace,
			trace_filter,
		};
		self.enqueue(item.default_priority(), item);
		Ok(())
	}

	pub fn reload_grammar_and_lexicon(&self) {
		let item = WorkItem::ReloadGrammarAndLexicon;
		self.enqueue(item.default_priority(), item);
	}

	/// Enables or disables exclusive mode.
	///
	/// While active, try-a-word items run and wordform updates wait in their
	/// lanes. Turning it off wakes the engine thread to resume them.
	pub fn set_exclusive_mode(&self, active: bool) {
		let changed = {
			let mut state = self.shared.state.lock();
			std::mem::replace(&mut state.exclusive, active) != active
		};
		if changed {
			tracing::info!(active, "scheduler.exclusive_mode");
			self.shared.wake.notify_all();
		}
	}

	pub fn exclusive_mode(&self) -> bool {
		self.shared.state.lock().exclusive
	}

	/// Outstanding items of `priority`, counting those still waiting to be filed.
	pub fn queue_depth(&self, priority: Priority) -> usize {
		self.shared.ledger.outstanding(priority)
	}

	/// True when nothing but reload work is outstanding.
	pub fn is_idle(&self) -> bool {
		self.shared.ledger.is_idle()
	}

	pub fn ledger(&self) -> LedgerSnapshot {
		self.shared.ledger.snapshot()
	}

	/// Failure that stopped the engine thread, if any.
	pub fn unhandled_failure(&self) -> Option<SchedulerFailure> {
		self.shared.failure.lock().clone()
	}

	pub fn subscribe_filed(&self) -> broadcast::Receiver<WordformFiled> {
		self.filer.subscribe()
	}

	/// Detector handle the host feeds with store change notifications.
	pub fn model_changes(&self) -> StaleModelDetector {
		self.detector.clone()
	}

	pub fn filer_stats(&self) -> FilerStats {
		self.filer.stats()
	}

	/// Stops the engine thread after its current item and joins it.
	///
	/// Items still queued and results still waiting for the host are released
	/// as abandoned. Later calls are no-ops.
	pub fn shutdown(&self) {
		let Some(thread) = self.thread.lock().take() else {
			return;
		};
		self.shared.state.lock().stop = true;
		self.shared.wake.notify_all();

		if let Err(message) = join_thread(thread) {
			self.shared.failure.lock().get_or_insert(SchedulerFailure { message, panicked: true });
		}

		let queued = std::mem::take(&mut self.shared.state.lock().queues);
		let abandoned = queued.len();
		drop(queued);
		self.filer.close();
		tracing::info!(abandoned, "scheduler.shutdown");
	}
}

impl Drop for Scheduler {
	fn drop(&mut self) {
		self.shutdown();
	}
}
