use serde::{Deserialize, Serialize};

/// Work priority, lowest ordinal is most urgent.
///
/// Doubles as the queue selector and the outstanding-count bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
	/// Rebuild engine state before anything else.
	ReloadGrammarAndLexicon,
	/// Interactive one-shot parse.
	TryAWord,
	High,
	Medium,
	Low,
}

impl Priority {
	/// Number of priority buckets.
	pub const COUNT: usize = 5;

	/// All priorities, most urgent first.
	pub const ALL: [Priority; Self::COUNT] = [
		Priority::ReloadGrammarAndLexicon,
		Priority::TryAWord,
		Priority::High,
		Priority::Medium,
		Priority::Low,
	];

	/// Returns the bucket index of this priority.
	#[inline]
	pub const fn index(self) -> usize {
		self as usize
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ReloadGrammarAndLexicon => "reload_grammar_and_lexicon",
			Self::TryAWord => "try_a_word",
			Self::High => "high",
			Self::Medium => "medium",
			Self::Low => "low",
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn all_is_sorted_by_urgency() {
		let mut sorted = Priority::ALL;
		sorted.sort();
		assert_eq!(sorted, Priority::ALL);
	}

	#[rstest]
	#[case(Priority::ReloadGrammarAndLexicon, 0)]
	#[case(Priority::TryAWord, 1)]
	#[case(Priority::High, 2)]
	#[case(Priority::Medium, 3)]
	#[case(Priority::Low, 4)]
	fn index_matches_position(#[case] priority: Priority, #[case] index: usize) {
		assert_eq!(priority.index(), index);
		assert_eq!(Priority::ALL[index], priority);
	}
}
