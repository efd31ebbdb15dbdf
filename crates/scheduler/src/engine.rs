//! The parsing engine capability.

use lexa_primitives::{FormId, ParseResult};

use crate::error::EngineError;

/// A parsing engine backend.
///
/// Implementations keep compiled grammar and lexicon state that is not safe
/// for concurrent use. The scheduler moves the engine onto its dedicated
/// thread and never calls it from anywhere else, so methods take `&mut self`.
///
/// Engine-level parse failures are not errors: they travel inside
/// [`ParseResult::failed`] and end up as diagnostic records.
pub trait Parser: Send {
	/// Parses one normalized form.
	fn parse_word(&mut self, form: &str) -> ParseResult;

	/// Parses one normalized form, producing a diagnostic trace document.
	///
	/// `selected` narrows the trace to the given morph forms; empty means
	/// trace everything.
	fn parse_word_trace(&mut self, form: &str, selected: &[FormId]) -> String;

	/// Returns false when the engine knows its compiled state is outdated.
	fn is_up_to_date(&self) -> bool;

	/// Discards compiled state and rebuilds it from the current model.
	fn reload(&mut self) -> Result<(), EngineError>;

	/// Releases engine resources. Called once, on the engine thread.
	fn dispose(&mut self) {}
}
