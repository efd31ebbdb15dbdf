use lexa_primitives::{
	Agent, AnalysisId, FormId, InflTypeId, MsaId, Opinion, ParseMorph, ProblemId, RecordClass, WordformId,
};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::{LexiconStore, StoreEdit};
use crate::stale::StaleModelDetector;

/// Read-only copy of one analysis, for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisView {
	pub id: AnalysisId,
	pub bundles: Vec<ParseMorph>,
	pub parser_opinion: Opinion,
	pub user_opinion: Opinion,
	pub referenced: bool,
}

struct WordformRecord {
	text: String,
	checksum: Option<u64>,
	analyses: Vec<AnalysisId>,
	problems: Vec<ProblemId>,
}

struct AnalysisRecord {
	wordform: WordformId,
	bundles: SmallVec<[ParseMorph; 4]>,
	parser: Opinion,
	user: Opinion,
	referenced: bool,
}

struct ProblemRecord {
	wordform: WordformId,
	message: String,
}

#[derive(Default)]
struct MemoryState {
	next_id: u64,
	wordforms: FxHashMap<WordformId, WordformRecord>,
	analyses: FxHashMap<AnalysisId, AnalysisRecord>,
	problems: FxHashMap<ProblemId, ProblemRecord>,
	forms: FxHashSet<FormId>,
	msas: FxHashSet<MsaId>,
	infl_types: FxHashSet<InflTypeId>,
	transactions: u64,
	detector: Option<StaleModelDetector>,
}

impl MemoryState {
	fn alloc(&mut self) -> u64 {
		self.next_id += 1;
		self.next_id
	}

	fn changed(&self, class: RecordClass) {
		if let Some(detector) = &self.detector {
			detector.notify(class);
		}
	}

	fn drop_analysis(&mut self, analysis: AnalysisId) {
		if let Some(record) = self.analyses.remove(&analysis)
			&& let Some(wordform) = self.wordforms.get_mut(&record.wordform)
		{
			wordform.analyses.retain(|&id| id != analysis);
		}
	}
}

/// In-memory [`LexiconStore`].
///
/// Every id, whatever its kind, comes from one counter, so ids are unique
/// across record kinds. Setup methods mutate directly and are meant for the
/// host thread and for tests; the filer only goes through
/// [`LexiconStore::edit_non_undoable`].
#[derive(Default)]
pub struct MemoryStore {
	state: RwLock<MemoryState>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Forwards grammar and lexicon changes to `detector`.
	pub fn watch(&self, detector: StaleModelDetector) {
		self.state.write().detector = Some(detector);
	}

	pub fn add_wordform(&self, text: impl Into<String>) -> WordformId {
		let mut state = self.state.write();
		let id = WordformId(state.alloc());
		state.wordforms.insert(
			id,
			WordformRecord {
				text: text.into(),
				checksum: None,
				analyses: Vec::new(),
				problems: Vec::new(),
			},
		);
		state.changed(RecordClass::Wordform);
		id
	}

	/// Deletes a wordform together with its analyses and problems.
	pub fn delete_wordform(&self, wordform: WordformId) -> bool {
		let mut state = self.state.write();
		let Some(record) = state.wordforms.remove(&wordform) else {
			return false;
		};
		for analysis in record.analyses {
			state.analyses.remove(&analysis);
		}
		for problem in record.problems {
			state.problems.remove(&problem);
		}
		state.changed(RecordClass::Wordform);
		true
	}

	pub fn set_wordform_text(&self, wordform: WordformId, text: impl Into<String>) {
		let mut state = self.state.write();
		if let Some(record) = state.wordforms.get_mut(&wordform) {
			record.text = text.into();
			state.changed(RecordClass::Wordform);
		}
	}

	pub fn add_form(&self) -> FormId {
		let mut state = self.state.write();
		let id = FormId(state.alloc());
		state.forms.insert(id);
		state.changed(RecordClass::MorphForm);
		id
	}

	pub fn delete_form(&self, form: FormId) {
		let mut state = self.state.write();
		if state.forms.remove(&form) {
			state.changed(RecordClass::MorphForm);
		}
	}

	pub fn add_msa(&self) -> MsaId {
		let mut state = self.state.write();
		let id = MsaId(state.alloc());
		state.msas.insert(id);
		state.changed(RecordClass::MorphoSyntaxAnalysis);
		id
	}

	pub fn add_infl_type(&self) -> InflTypeId {
		let mut state = self.state.write();
		let id = InflTypeId(state.alloc());
		state.infl_types.insert(id);
		state.changed(RecordClass::InflectionType);
		id
	}

	/// Adds an analysis as if a user had entered it.
	pub fn add_analysis(&self, wordform: WordformId, morphs: &[ParseMorph]) -> Option<AnalysisId> {
		let mut state = self.state.write();
		if !state.wordforms.contains_key(&wordform) {
			return None;
		}
		let id = MemoryEdit { state: &mut *state }.create_analysis(wordform, morphs);
		state.changed(RecordClass::Analysis);
		Some(id)
	}

	pub fn set_opinion(&self, analysis: AnalysisId, agent: Agent, opinion: Opinion) {
		MemoryEdit {
			state: &mut *self.state.write(),
		}
		.set_opinion(analysis, agent, opinion);
	}

	/// Marks an analysis as used by a text segment.
	pub fn mark_referenced(&self, analysis: AnalysisId) {
		let mut state = self.state.write();
		if let Some(record) = state.analyses.get_mut(&analysis) {
			record.referenced = true;
			state.changed(RecordClass::Segment);
		}
	}

	pub fn analyses_of(&self, wordform: WordformId) -> Vec<AnalysisView> {
		let state = self.state.read();
		let Some(record) = state.wordforms.get(&wordform) else {
			return Vec::new();
		};
		record
			.analyses
			.iter()
			.filter_map(|id| {
				state.analyses.get(id).map(|analysis| AnalysisView {
					id: *id,
					bundles: analysis.bundles.to_vec(),
					parser_opinion: analysis.parser,
					user_opinion: analysis.user,
					referenced: analysis.referenced,
				})
			})
			.collect()
	}

	/// Messages of the problems attached to a wordform.
	pub fn problems_of(&self, wordform: WordformId) -> Vec<String> {
		let state = self.state.read();
		let Some(record) = state.wordforms.get(&wordform) else {
			return Vec::new();
		};
		record
			.problems
			.iter()
			.filter_map(|id| state.problems.get(id).map(|problem| problem.message.clone()))
			.collect()
	}

	pub fn checksum_of(&self, wordform: WordformId) -> Option<u64> {
		self.wordform_checksum(wordform)
	}

	/// Number of non-undoable transactions run so far.
	pub fn transactions(&self) -> u64 {
		self.state.read().transactions
	}
}

impl LexiconStore for MemoryStore {
	fn wordform_text(&self, wordform: WordformId) -> Option<String> {
		self.state.read().wordforms.get(&wordform).map(|record| record.text.clone())
	}

	fn wordform_checksum(&self, wordform: WordformId) -> Option<u64> {
		self.state.read().wordforms.get(&wordform).and_then(|record| record.checksum)
	}

	fn edit_non_undoable(&self, edit: &mut dyn FnMut(&mut dyn StoreEdit)) {
		let mut state = self.state.write();
		state.transactions += 1;
		edit(&mut MemoryEdit { state: &mut *state });
	}
}

struct MemoryEdit<'a> {
	state: &'a mut MemoryState,
}

impl StoreEdit for MemoryEdit<'_> {
	fn is_wordform_live(&self, wordform: WordformId) -> bool {
		self.state.wordforms.contains_key(&wordform)
	}

	fn is_form_live(&self, form: FormId) -> bool {
		self.state.forms.contains(&form)
	}

	fn is_msa_live(&self, msa: MsaId) -> bool {
		self.state.msas.contains(&msa)
	}

	fn is_infl_type_live(&self, infl_type: InflTypeId) -> bool {
		self.state.infl_types.contains(&infl_type)
	}

	fn analyses(&self, wordform: WordformId) -> Vec<AnalysisId> {
		self.state
			.wordforms
			.get(&wordform)
			.map(|record| record.analyses.clone())
			.unwrap_or_default()
	}

	fn analysis_bundles(&self, analysis: AnalysisId) -> Vec<ParseMorph> {
		self.state
			.analyses
			.get(&analysis)
			.map(|record| record.bundles.to_vec())
			.unwrap_or_default()
	}

	fn create_analysis(&mut self, wordform: WordformId, morphs: &[ParseMorph]) -> AnalysisId {
		let id = AnalysisId(self.state.alloc());
		self.state.analyses.insert(
			id,
			AnalysisRecord {
				wordform,
				bundles: morphs.iter().copied().collect(),
				parser: Opinion::NoOpinion,
				user: Opinion::NoOpinion,
				referenced: false,
			},
		);
		if let Some(record) = self.state.wordforms.get_mut(&wordform) {
			record.analyses.push(id);
		}
		id
	}

	fn delete_analysis(&mut self, analysis: AnalysisId) {
		self.state.drop_analysis(analysis);
	}

	fn opinion(&self, analysis: AnalysisId, agent: Agent) -> Opinion {
		self.state.analyses.get(&analysis).map_or(Opinion::NoOpinion, |record| match agent {
			Agent::Parser => record.parser,
			Agent::User => record.user,
		})
	}

	fn set_opinion(&mut self, analysis: AnalysisId, agent: Agent, opinion: Opinion) {
		if let Some(record) = self.state.analyses.get_mut(&analysis) {
			match agent {
				Agent::Parser => record.parser = opinion,
				Agent::User => record.user = opinion,
			}
		}
	}

	fn is_referenced_by_segments(&self, analysis: AnalysisId) -> bool {
		self.state.analyses.get(&analysis).is_some_and(|record| record.referenced)
	}

	fn parser_problems(&self, wordform: WordformId) -> Vec<ProblemId> {
		self.state
			.wordforms
			.get(&wordform)
			.map(|record| record.problems.clone())
			.unwrap_or_default()
	}

	fn remove_problem(&mut self, problem: ProblemId) {
		if let Some(record) = self.state.problems.remove(&problem)
			&& let Some(wordform) = self.state.wordforms.get_mut(&record.wordform)
		{
			wordform.problems.retain(|&id| id != problem);
		}
	}

	fn add_parser_problem(&mut self, wordform: WordformId, message: &str) -> ProblemId {
		let id = ProblemId(self.state.alloc());
		self.state.problems.insert(
			id,
			ProblemRecord {
				wordform,
				message: message.to_string(),
			},
		);
		if let Some(record) = self.state.wordforms.get_mut(&wordform) {
			record.problems.push(id);
		}
		id
	}

	fn set_checksum(&mut self, wordform: WordformId, checksum: u64) {
		if let Some(record) = self.state.wordforms.get_mut(&wordform) {
			record.checksum = Some(checksum);
		}
	}
}
