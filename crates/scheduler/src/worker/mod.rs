//! The engine-side worker.
//!
//! [`ParseWorker`] owns the [`Parser`] and is only ever driven from the
//! scheduler's engine thread, so the stale check-then-clear in
//! [`ParseWorker::check_needs_update`] cannot race with itself.

use std::sync::Arc;

use lexa_primitives::{FormId, WordformId};
use lexa_progress::TaskReport;
use lexa_worker::TaskClass;

use crate::config::Normalization;
use crate::engine::Parser;
use crate::error::SchedulerError;
use crate::filer::ResultFiler;
use crate::ledger::WorkTicket;
use crate::stale::StaleModelDetector;
use crate::store::LexiconStore;

/// Why an update released its ticket without filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// The wordform was deleted after the item was queued.
	WordformGone,
	/// The wordform's text is empty after normalization.
	EmptyForm,
	/// The new result hashes the same as the last filed one.
	Unchanged,
}

/// Result of [`ParseWorker::update_wordform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
	/// The ticket was released immediately.
	Skipped(SkipReason),
	/// The ticket now waits for the filer.
	HandedToFiler,
}

pub struct ParseWorker {
	parser: Box<dyn Parser>,
	detector: StaleModelDetector,
	store: Arc<dyn LexiconStore>,
	filer: ResultFiler,
	normalization: Normalization,
	disposed: bool,
}

impl ParseWorker {
	pub fn new(
		parser: Box<dyn Parser>,
		detector: StaleModelDetector,
		store: Arc<dyn LexiconStore>,
		filer: ResultFiler,
		normalization: Normalization,
	) -> Self {
		Self {
			parser,
			detector,
			store,
			filer,
			normalization,
			disposed: false,
		}
	}

	/// Parses `text` for display, writing the trace document (or the plain
	/// result rendering when `trace` is off) into `report`'s details.
	pub fn try_a_word(&mut self, text: &str, trace: bool, filter: &[FormId], report: &TaskReport) -> Result<(), SchedulerError> {
		let form = self.normalization.apply(text);
		if form.is_empty() {
			return Err(SchedulerError::EmptyInput);
		}
		self.check_needs_update(report)?;
		report.set_working();

		let details = if trace {
			self.parser.parse_word_trace(&form, filter)
		} else {
			self.parser.parse_word(&form).to_string()
		};
		tracing::trace!(worker_class = TaskClass::Engine.as_str(), trace, "worker.try_a_word");
		report.set_details(details);
		Ok(())
	}

	/// Reparses one wordform and hands the result to the filer.
	///
	/// The ticket is consumed on every path: released as skipped, parked with
	/// the filer, or dropped (abandoned) when the engine fails to reload.
	pub fn update_wordform(
		&mut self,
		wordform: WordformId,
		ticket: WorkTicket,
		report: &TaskReport,
	) -> Result<UpdateOutcome, SchedulerError> {
		let Some(text) = self.store.wordform_text(wordform) else {
			return Ok(skip(wordform, ticket, SkipReason::WordformGone));
		};
		let form = self.normalization.apply(&text);
		if form.is_empty() {
			return Ok(skip(wordform, ticket, SkipReason::EmptyForm));
		}

		self.check_needs_update(report)?;
		report.set_working();
		let result = self.parser.parse_word(&form);

		// Settledness first: only this thread hands results to the filer, so
		// once settled the stored checksum cannot move under us.
		if self.filer.is_settled(wordform) && self.store.wordform_checksum(wordform) == Some(result.content_hash()) {
			return Ok(skip(wordform, ticket, SkipReason::Unchanged));
		}

		tracing::trace!(
			%wordform,
			analyses = result.analyses().len(),
			failed = result.is_failure(),
			"worker.update_wordform"
		);
		self.filer.file(wordform, result, ticket.hand_to_filer());
		Ok(UpdateOutcome::HandedToFiler)
	}

	/// Discards engine state and rebuilds it.
	pub fn reload_grammar_and_lexicon(&mut self, report: &TaskReport) -> Result<(), SchedulerError> {
		self.detector.take_stale();
		self.reload(report)
	}

	/// Rebuilds the engine if the model changed or the engine says it is outdated.
	pub fn check_needs_update(&mut self, report: &TaskReport) -> Result<(), SchedulerError> {
		if self.detector.take_stale() || !self.parser.is_up_to_date() {
			self.reload(report)?;
		}
		Ok(())
	}

	fn reload(&mut self, report: &TaskReport) -> Result<(), SchedulerError> {
		let step = report.child("Loading grammar and lexicon");
		step.set_working();
		if let Err(err) = self.parser.reload() {
			step.record_error(err.message());
			self.detector.mark_stale();
			return Err(err.into());
		}
		tracing::info!(worker_class = TaskClass::Engine.as_str(), "worker.reloaded");
		Ok(())
	}

	/// Releases the engine. Later calls are no-ops.
	pub fn dispose(&mut self) {
		if std::mem::replace(&mut self.disposed, true) {
			return;
		}
		self.parser.dispose();
		tracing::debug!("worker.disposed");
	}
}

impl Drop for ParseWorker {
	fn drop(&mut self) {
		self.dispose();
	}
}

fn skip(wordform: WordformId, ticket: WorkTicket, reason: SkipReason) -> UpdateOutcome {
	tracing::debug!(%wordform, ?reason, "worker.skipped");
	ticket.skip();
	UpdateOutcome::Skipped(reason)
}

#[cfg(test)]
mod tests;
