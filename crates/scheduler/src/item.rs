//! Work items and completion events.

use lexa_primitives::{FormId, Priority, WordformId};

/// One unit of work for the engine thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
	/// One-shot interactive parse. Runs only while exclusive mode is active.
	TryAWord {
		text: String,
		trace: bool,
		/// Morph forms the trace is narrowed to; empty traces everything.
		trace_filter: Vec<FormId>,
	},
	/// Reparse one wordform and file the result.
	UpdateWordform { wordform: WordformId },
	/// Rebuild engine state unconditionally.
	ReloadGrammarAndLexicon,
}

impl WorkItem {
	pub fn try_a_word(text: impl Into<String>) -> Self {
		Self::TryAWord {
			text: text.into(),
			trace: false,
			trace_filter: Vec::new(),
		}
	}

	pub const fn update(wordform: WordformId) -> Self {
		Self::UpdateWordform { wordform }
	}

	/// Lane an item goes to when the caller does not pick one.
	pub const fn default_priority(&self) -> Priority {
		match self {
			Self::TryAWord { .. } => Priority::TryAWord,
			Self::UpdateWordform { .. } => Priority::Low,
			Self::ReloadGrammarAndLexicon => Priority::ReloadGrammarAndLexicon,
		}
	}

	pub const fn kind(&self) -> &'static str {
		match self {
			Self::TryAWord { .. } => "try_a_word",
			Self::UpdateWordform { .. } => "update_wordform",
			Self::ReloadGrammarAndLexicon => "reload_grammar_and_lexicon",
		}
	}
}

/// Fired once per filed ticket, after the filing transaction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordformFiled {
	pub wordform: WordformId,
	/// Priority the originating item was enqueued at.
	pub priority: Priority,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn convenience_entry_points_use_their_own_lanes() {
		assert_eq!(WorkItem::try_a_word("cats").default_priority(), Priority::TryAWord);
		assert_eq!(
			WorkItem::ReloadGrammarAndLexicon.default_priority(),
			Priority::ReloadGrammarAndLexicon
		);
		assert_eq!(WorkItem::update(WordformId::from(7)).default_priority(), Priority::Low);
	}
}
