//! Shared harness for scheduler integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

pub use lexa_scheduler::testing::{Call, ScriptedParser};
use lexa_scheduler::{
	FormId, IdleQueue, MemoryStore, MsaId, ParseAnalysis, ParseMorph, ParseResult, Scheduler, SchedulerConfig, testing,
};

/// A tiny lexicon: `cat` (noun) and `-s` (plural).
pub struct Lexicon {
	pub cat: FormId,
	pub noun: MsaId,
	pub plural_s: FormId,
	pub plural: MsaId,
}

impl Lexicon {
	pub fn cats(&self) -> ParseResult {
		ParseResult::new([ParseAnalysis::new([
			ParseMorph::new(self.cat, self.noun),
			ParseMorph::new(self.plural_s, self.plural),
		])])
	}
}

pub struct Harness {
	pub parser: ScriptedParser,
	pub store: Arc<MemoryStore>,
	pub host: Arc<IdleQueue>,
	pub lex: Lexicon,
	pub scheduler: Scheduler,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_config(SchedulerConfig::default())
	}

	pub fn with_config(config: SchedulerConfig) -> Self {
		let _ = tracing_subscriber::fmt::try_init();
		let parser = ScriptedParser::default();
		let store = Arc::new(MemoryStore::new());
		let host = Arc::new(IdleQueue::new());
		let lex = Lexicon {
			cat: store.add_form(),
			noun: store.add_msa(),
			plural_s: store.add_form(),
			plural: store.add_msa(),
		};
		let scheduler = Scheduler::builder(parser.clone(), store.clone(), host.clone())
			.config(config)
			.start()
			.expect("scheduler starts");
		store.watch(scheduler.model_changes());
		Self {
			parser,
			store,
			host,
			lex,
			scheduler,
		}
	}

	/// Acts as the host thread: pumps idle callbacks until `condition` holds.
	pub fn pump_until(&self, mut condition: impl FnMut() -> bool) -> bool {
		let deadline = Instant::now() + Duration::from_secs(5);
		while Instant::now() < deadline {
			self.host.pump();
			if condition() {
				return true;
			}
			std::thread::sleep(Duration::from_millis(2));
		}
		condition()
	}

	/// Waits without pumping, so nothing gets filed.
	pub fn wait_until(&self, condition: impl FnMut() -> bool) -> bool {
		testing::wait_until(condition)
	}
}
