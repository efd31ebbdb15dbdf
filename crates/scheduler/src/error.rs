//! Error types for the scheduling pipeline.

use std::fmt;

use thiserror::Error;

/// Failure reported by a parsing engine while rebuilding its state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
	message: String,
}

impl EngineError {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Errors surfaced by the scheduler and its worker.
#[derive(Debug, Error)]
pub enum SchedulerError {
	/// Try-a-word text was empty or whitespace only.
	#[error("try-a-word text must not be empty")]
	EmptyInput,

	/// The engine failed to rebuild grammar and lexicon state.
	#[error("failed to reload grammar and lexicon: {0}")]
	Reload(#[from] EngineError),

	/// The dedicated engine thread could not be started.
	#[error("failed to spawn engine thread: {0}")]
	Spawn(#[source] std::io::Error),
}

impl SchedulerError {
	/// Returns true for caller mistakes, as opposed to engine failures.
	pub fn is_contract_violation(&self) -> bool {
		matches!(self, Self::EmptyInput)
	}
}

/// Fatal failure captured from the engine thread.
///
/// The thread stops after recording one of these; the scheduler is not
/// restarted and callers are expected to build a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerFailure {
	pub message: String,
	/// True when the failure was a panic rather than a returned error.
	pub panicked: bool,
}

impl fmt::Display for SchedulerFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.panicked {
			write!(f, "engine thread panicked: {}", self.message)
		} else {
			write!(f, "engine thread failed: {}", self.message)
		}
	}
}
