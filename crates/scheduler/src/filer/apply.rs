use lexa_primitives::{Agent, Opinion, ParseMorph, ParseResult, WordformId};

use crate::store::StoreEdit;

/// Writes one result into the store. Returns false, touching nothing, when
/// the wordform or any record the result refers to is gone.
pub(super) fn file_one(edit: &mut dyn StoreEdit, wordform: WordformId, result: &ParseResult) -> bool {
	if !edit.is_wordform_live(wordform) {
		tracing::debug!(%wordform, "filer.invalid: wordform gone");
		return false;
	}
	if let Some(morph) = result
		.analyses()
		.iter()
		.flat_map(|analysis| analysis.morphs())
		.find(|morph| !is_live(&*edit, morph))
	{
		tracing::debug!(%wordform, %morph, "filer.invalid: morph reference gone");
		return false;
	}

	for problem in edit.parser_problems(wordform) {
		edit.remove_problem(problem);
	}
	for analysis in edit.analyses(wordform) {
		if edit.opinion(analysis, Agent::Parser).is_some() {
			edit.set_opinion(analysis, Agent::Parser, Opinion::NoOpinion);
		}
	}

	if let Some(message) = result.error() {
		edit.add_parser_problem(wordform, message);
	} else {
		for candidate in result.analyses() {
			if candidate.is_empty() {
				continue;
			}
			let existing = edit
				.analyses(wordform)
				.into_iter()
				.find(|&analysis| candidate.matches(&edit.analysis_bundles(analysis)));
			let analysis = match existing {
				Some(analysis) => analysis,
				None => edit.create_analysis(wordform, candidate.morphs()),
			};
			edit.set_opinion(analysis, Agent::Parser, Opinion::Approves);
		}
	}

	prune(edit, wordform);
	edit.set_checksum(wordform, result.content_hash());
	true
}

fn is_live(edit: &dyn StoreEdit, morph: &ParseMorph) -> bool {
	edit.is_form_live(morph.form)
		&& edit.is_msa_live(morph.msa)
		&& morph.infl_type.is_none_or(|infl_type| edit.is_infl_type_live(infl_type))
}

/// Settles analyses nobody holds an opinion on anymore: a text still using
/// one keeps it as user-approved, otherwise it is deleted. Analyses with any
/// user opinion are left alone.
fn prune(edit: &mut dyn StoreEdit, wordform: WordformId) {
	for analysis in edit.analyses(wordform) {
		if edit.opinion(analysis, Agent::Parser).is_some() || edit.opinion(analysis, Agent::User).is_some() {
			continue;
		}
		if edit.is_referenced_by_segments(analysis) {
			edit.set_opinion(analysis, Agent::User, Opinion::Approves);
		} else {
			edit.delete_analysis(analysis);
		}
	}
}
