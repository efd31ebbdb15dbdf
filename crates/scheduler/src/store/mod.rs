//! Lexicon store interface.
//!
//! The store is owned by the host. The engine thread only reads wordform text
//! and checksums through [`LexiconStore`]; every mutation goes through
//! [`LexiconStore::edit_non_undoable`], which the filer calls from inside a
//! host idle callback.

mod memory;

use lexa_primitives::{Agent, AnalysisId, FormId, InflTypeId, MsaId, Opinion, ParseMorph, ProblemId, WordformId};
pub use memory::{AnalysisView, MemoryStore};

/// Shared lexicon data store.
pub trait LexiconStore: Send + Sync {
	/// Current text of a live wordform, `None` once it is deleted.
	fn wordform_text(&self, wordform: WordformId) -> Option<String>;

	/// Content hash of the last result filed for a wordform.
	fn wordform_checksum(&self, wordform: WordformId) -> Option<u64>;

	/// Runs `edit` inside one transaction that is not recorded for undo.
	fn edit_non_undoable(&self, edit: &mut dyn FnMut(&mut dyn StoreEdit));
}

/// Mutable view of the store inside one transaction.
pub trait StoreEdit {
	fn is_wordform_live(&self, wordform: WordformId) -> bool;
	fn is_form_live(&self, form: FormId) -> bool;
	fn is_msa_live(&self, msa: MsaId) -> bool;
	fn is_infl_type_live(&self, infl_type: InflTypeId) -> bool;

	/// Analyses owned by a wordform, in creation order.
	fn analyses(&self, wordform: WordformId) -> Vec<AnalysisId>;

	/// Ordered morph bundles of an analysis.
	fn analysis_bundles(&self, analysis: AnalysisId) -> Vec<ParseMorph>;

	/// Creates an analysis on `wordform` with one morph bundle per morph.
	fn create_analysis(&mut self, wordform: WordformId, morphs: &[ParseMorph]) -> AnalysisId;

	fn delete_analysis(&mut self, analysis: AnalysisId);

	fn opinion(&self, analysis: AnalysisId, agent: Agent) -> Opinion;
	fn set_opinion(&mut self, analysis: AnalysisId, agent: Agent, opinion: Opinion);

	/// Returns true if any text segment points at this analysis.
	fn is_referenced_by_segments(&self, analysis: AnalysisId) -> bool;

	/// Problem records the parser previously attached to a wordform.
	fn parser_problems(&self, wordform: WordformId) -> Vec<ProblemId>;
	fn remove_problem(&mut self, problem: ProblemId);
	fn add_parser_problem(&mut self, wordform: WordformId, message: &str) -> ProblemId;

	fn set_checksum(&mut self, wordform: WordformId, checksum: u64);
}
