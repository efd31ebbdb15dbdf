use std::sync::Arc;

use lexa_progress::{ProgressSink, TaskReport};
use lexa_worker::{TaskClass, catch_panic};

use super::Shared;
use super::queue::Job;
use crate::error::{SchedulerError, SchedulerFailure};
use crate::item::WorkItem;
use crate::worker::ParseWorker;

enum Next {
	Stop,
	Idle,
	Job { job: Job, exclusive: bool },
}

/// Body of the engine thread.
///
/// Any error or panic escaping the loop is stored as the scheduler's failure
/// and the thread exits; nothing restarts it.
pub(super) fn engine_loop(shared: Arc<Shared>, mut worker: ParseWorker, sink: Option<ProgressSink>) {
	tracing::info!(worker_class = TaskClass::Engine.as_str(), "scheduler.engine_started");
	let failure = match catch_panic(|| drive(&shared, &mut worker, sink.as_ref())) {
		Ok(Ok(())) => None,
		Ok(Err(err)) => Some(SchedulerFailure {
			message: err.to_string(),
			panicked: false,
		}),
		Err(message) => Some(SchedulerFailure { message, panicked: true }),
	};

	if let Some(failure) = failure {
		tracing::error!(panicked = failure.panicked, error = %failure.message, "scheduler.fail_stop");
		*shared.failure.lock() = Some(failure);
	}
	worker.dispose();
	tracing::info!(worker_class = TaskClass::Engine.as_str(), "scheduler.engine_stopped");
}

fn drive(shared: &Shared, worker: &mut ParseWorker, sink: Option<&ProgressSink>) -> Result<(), SchedulerError> {
	let mut idle_report: Option<TaskReport> = None;
	loop {
		let next = {
			let mut state = shared.state.lock();
			loop {
				if state.stop {
					break Next::Stop;
				}
				let exclusive = state.exclusive;
				if let Some(job) = state.queues.pop_eligible(exclusive) {
					break Next::Job { job, exclusive };
				}
				if idle_report.is_none() && shared.ledger.is_idle() {
					break Next::Idle;
				}
				shared.wake.wait(&mut state);
			}
		};

		match next {
			Next::Stop => return Ok(()),
			Next::Idle => idle_report = Some(TaskReport::root("Idle", sink.cloned())),
			Next::Job { job, exclusive } => {
				idle_report = None;
				run_job(worker, sink, job, exclusive)?;
			}
		}
	}
}

fn run_job(worker: &mut ParseWorker, sink: Option<&ProgressSink>, job: Job, exclusive: bool) -> Result<(), SchedulerError> {
	let Job { item, ticket } = job;
	let priority = ticket.priority();
	tracing::trace!(priority = priority.as_str(), kind = item.kind(), "scheduler.dequeue");

	match item {
		WorkItem::ReloadGrammarAndLexicon => {
			let report = TaskReport::root("Reloading grammar and lexicon", sink.cloned());
			worker.reload_grammar_and_lexicon(&report).inspect_err(|err| report.record_error(err.to_string()))?;
			ticket.complete();
		}
		WorkItem::TryAWord {
			text,
			trace,
			trace_filter,
		} => {
			if !exclusive {
				tracing::debug!(%text, "scheduler.try_a_word_dropped: exclusive mode off");
				ticket.skip();
				return Ok(());
			}
			let report = TaskReport::root(format!("Trying word '{text}'"), sink.cloned());
			match worker.try_a_word(&text, trace, &trace_filter, &report) {
				Ok(()) => ticket.complete(),
				Err(err) if err.is_contract_violation() => {
					report.record_error(err.to_string());
					ticket.skip();
				}
				Err(err) => {
					report.record_error(err.to_string());
					return Err(err);
				}
			}
		}
		WorkItem::UpdateWordform { wordform } => {
			let report = TaskReport::root(format!("Updating {wordform}"), sink.cloned());
			let outcome = worker
				.update_wordform(wordform, ticket, &report)
				.inspect_err(|err| report.record_error(err.to_string()))?;
			tracing::trace!(%wordform, ?outcome, "scheduler.updated");
		}
	}
	Ok(())
}
