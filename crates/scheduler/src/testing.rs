//! Test doubles for the scheduling pipeline, enabled by the `test-support`
//! feature.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lexa_primitives::{FormId, ParseResult};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::SchedulerConfig;
use crate::engine::Parser;
use crate::error::EngineError;
use crate::filer::ResultFiler;
use crate::host::IdleQueue;
use crate::ledger::OutstandingCounts;
use crate::store::MemoryStore;

/// One call the engine received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Parse(String),
	Trace(String, Vec<FormId>),
	Reload,
}

#[derive(Default)]
struct Script {
	responses: FxHashMap<String, ParseResult>,
	calls: Vec<Call>,
	threads: Vec<String>,
	outdated: bool,
	fail_reload: Option<String>,
	panic_on: Option<String>,
	disposed: usize,
}

/// Parser answering from a canned table; unknown forms parse to no analyses.
///
/// Clones share one script, so a test keeps a handle after moving the parser
/// into a scheduler.
#[derive(Clone, Default)]
pub struct ScriptedParser {
	script: Arc<Mutex<Script>>,
}

impl ScriptedParser {
	pub fn respond(&self, form: &str, result: ParseResult) {
		self.script.lock().responses.insert(form.to_string(), result);
	}

	pub fn fail_reload(&self, message: &str) {
		self.script.lock().fail_reload = Some(message.to_string());
	}

	pub fn panic_on(&self, form: &str) {
		self.script.lock().panic_on = Some(form.to_string());
	}

	/// Makes `is_up_to_date` answer false until the next reload.
	pub fn mark_outdated(&self) {
		self.script.lock().outdated = true;
	}

	pub fn calls(&self) -> Vec<Call> {
		self.script.lock().calls.clone()
	}

	/// Forms passed to `parse_word`, in call order.
	pub fn parsed(&self) -> Vec<String> {
		self.script
			.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				Call::Parse(form) => Some(form.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn traced(&self) -> Vec<(String, Vec<FormId>)> {
		self.script
			.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				Call::Trace(form, selected) => Some((form.clone(), selected.clone())),
				_ => None,
			})
			.collect()
	}

	pub fn reloads(&self) -> usize {
		self.script.lock().calls.iter().filter(|call| **call == Call::Reload).count()
	}

	/// Names of the threads the parser was called on.
	pub fn threads(&self) -> Vec<String> {
		self.script.lock().threads.clone()
	}

	pub fn disposed(&self) -> usize {
		self.script.lock().disposed
	}

	fn record(&self, call: Call) {
		let mut script = self.script.lock();
		script.calls.push(call);
		let thread = std::thread::current().name().unwrap_or("<unnamed>").to_string();
		if !script.threads.contains(&thread) {
			script.threads.push(thread);
		}
	}
}

impl Parser for ScriptedParser {
	fn parse_word(&mut self, form: &str) -> ParseResult {
		self.record(Call::Parse(form.to_string()));
		let (response, panics) = {
			let script = self.script.lock();
			(
				script.responses.get(form).cloned().unwrap_or_default(),
				script.panic_on.as_deref() == Some(form),
			)
		};
		if panics {
			panic!("engine state corrupted while parsing {form}");
		}
		response
	}

	fn parse_word_trace(&mut self, form: &str, selected: &[FormId]) -> String {
		self.record(Call::Trace(form.to_string(), selected.to_vec()));
		format!("<trace form=\"{form}\"/>")
	}

	fn is_up_to_date(&self) -> bool {
		!self.script.lock().outdated
	}

	fn reload(&mut self) -> Result<(), EngineError> {
		self.record(Call::Reload);
		let mut script = self.script.lock();
		script.outdated = false;
		match &script.fail_reload {
			Some(message) => Err(EngineError::new(message.clone())),
			None => Ok(()),
		}
	}

	fn dispose(&mut self) {
		self.script.lock().disposed += 1;
	}
}

/// Store, idle queue, ledger and filer wired together the way the scheduler
/// wires them, without an engine thread.
pub struct Rig {
	pub store: Arc<MemoryStore>,
	pub host: Arc<IdleQueue>,
	pub ledger: Arc<OutstandingCounts>,
	pub filer: ResultFiler,
}

impl Rig {
	pub fn new(config: &SchedulerConfig) -> Self {
		let store = Arc::new(MemoryStore::new());
		let host = Arc::new(IdleQueue::new());
		let filer = ResultFiler::new(store.clone(), host.clone(), config);
		Self {
			store,
			host,
			ledger: Arc::new(OutstandingCounts::new()),
			filer,
		}
	}
}

/// Polls `condition` until it holds or five seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + Duration::from_secs(5);
	while Instant::now() < deadline {
		if condition() {
			return true;
		}
		std::thread::sleep(Duration::from_millis(2));
	}
	condition()
}
