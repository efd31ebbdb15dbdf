use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smallvec::SmallVec;

use crate::ids::{FormId, InflTypeId, MsaId};

/// One morph of a candidate analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseMorph {
	pub form: FormId,
	pub msa: MsaId,
	pub infl_type: Option<InflTypeId>,
}

impl ParseMorph {
	pub const fn new(form: FormId, msa: MsaId) -> Self {
		Self { form, msa, infl_type: None }
	}

	#[must_use]
	pub const fn with_infl_type(mut self, infl_type: InflTypeId) -> Self {
		self.infl_type = Some(infl_type);
		self
	}
}

impl fmt::Display for ParseMorph {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.form, self.msa)?;
		if let Some(infl_type) = self.infl_type {
			write!(f, "/{infl_type}")?;
		}
		Ok(())
	}
}

/// One candidate segmentation of a wordform, in surface order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ParseAnalysis {
	morphs: SmallVec<[ParseMorph; 4]>,
}

impl ParseAnalysis {
	pub fn new(morphs: impl IntoIterator<Item = ParseMorph>) -> Self {
		Self {
			morphs: morphs.into_iter().collect(),
		}
	}

	#[inline]
	pub fn morphs(&self) -> &[ParseMorph] {
		&self.morphs
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.morphs.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.morphs.is_empty()
	}

	/// Returns true if `bundles` holds exactly these morphs in the same order.
	pub fn matches(&self, bundles: &[ParseMorph]) -> bool {
		self.morphs.as_slice() == bundles
	}
}

impl FromIterator<ParseMorph> for ParseAnalysis {
	fn from_iter<I: IntoIterator<Item = ParseMorph>>(iter: I) -> Self {
		Self::new(iter)
	}
}

/// Immutable output of one engine parse.
///
/// Two results are equal iff their analysis sequences are equal (order
/// sensitive) and their error messages match. [`ParseResult::content_hash`]
/// follows the same definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ParseResult {
	analyses: Vec<ParseAnalysis>,
	error: Option<String>,
}

impl ParseResult {
	/// Creates a successful result.
	pub fn new(analyses: impl IntoIterator<Item = ParseAnalysis>) -> Self {
		Self {
			analyses: analyses.into_iter().collect(),
			error: None,
		}
	}

	/// Creates a result carrying an engine-reported failure.
	pub fn failed(message: impl Into<String>) -> Self {
		Self {
			analyses: Vec::new(),
			error: Some(message.into()),
		}
	}

	#[inline]
	pub fn analyses(&self) -> &[ParseAnalysis] {
		&self.analyses
	}

	#[inline]
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	#[inline]
	pub fn is_failure(&self) -> bool {
		self.error.is_some()
	}

	/// Deterministic hash of the result contents, stored alongside a wordform
	/// to recognize repeated identical results.
	pub fn content_hash(&self) -> u64 {
		let mut hasher = FxHasher::default();
		self.hash(&mut hasher);
		hasher.finish()
	}
}

impl fmt::Display for ParseResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(error) = &self.error {
			return write!(f, "error: {error}");
		}
		if self.analyses.is_empty() {
			return f.write_str("no analyses");
		}
		for (i, analysis) in self.analyses.iter().enumerate() {
			if i > 0 {
				f.write_str("\n")?;
			}
			for (j, morph) in analysis.morphs().iter().enumerate() {
				if j > 0 {
					f.write_str(" + ")?;
				}
				write!(f, "{morph}")?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn morph(form: u64, msa: u64) -> ParseMorph {
		ParseMorph::new(FormId(form), MsaId(msa))
	}

	#[test]
	fn equality_is_order_sensitive() {
		let a = ParseAnalysis::new([morph(1, 10)]);
		let b = ParseAnalysis::new([morph(2, 20)]);
		let forward = ParseResult::new([a.clone(), b.clone()]);
		let reversed = ParseResult::new([b, a]);
		assert_ne!(forward, reversed);
		assert_ne!(forward.content_hash(), reversed.content_hash());
	}

	#[test]
	fn equal_results_share_a_hash() {
		let build = || ParseResult::new([ParseAnalysis::new([morph(1, 10), morph(2, 20).with_infl_type(InflTypeId(5))])]);
		assert_eq!(build(), build());
		assert_eq!(build().content_hash(), build().content_hash());
	}

	#[test]
	fn error_message_participates_in_equality() {
		assert_ne!(ParseResult::failed("too many analyses"), ParseResult::failed("buffer overflow"));
		assert_ne!(ParseResult::failed("x"), ParseResult::default());
	}

	#[test]
	fn inflection_type_distinguishes_morphs() {
		let plain = ParseAnalysis::new([morph(1, 10)]);
		assert!(plain.matches(&[morph(1, 10)]));
		assert!(!plain.matches(&[morph(1, 10).with_infl_type(InflTypeId(1))]));
		assert!(!plain.matches(&[morph(1, 10), morph(2, 20)]));
	}

	#[test]
	fn display_lists_one_analysis_per_line() {
		let result = ParseResult::new([ParseAnalysis::new([morph(1, 10), morph(2, 20)]), ParseAnalysis::new([morph(3, 30)])]);
		assert_eq!(result.to_string(), "form#1/msa#10 + form#2/msa#20\nform#3/msa#30");
		assert_eq!(ParseResult::failed("rejected").to_string(), "error: rejected");
	}
}
