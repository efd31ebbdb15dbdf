use lexa_primitives::{ParseAnalysis, ParseMorph, ParseResult, Priority};
use lexa_progress::{TaskPhase, TaskReport};

use super::*;
use crate::config::SchedulerConfig;
use crate::testing::{Rig, ScriptedParser};

fn worker(rig: &Rig, parser: &ScriptedParser) -> ParseWorker {
	ParseWorker::new(
		Box::new(parser.clone()),
		StaleModelDetector::new(),
		rig.store.clone(),
		rig.filer.clone(),
		Normalization::Nfd,
	)
}

#[test]
fn deleted_wordform_is_skipped_without_parsing() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let wordform = rig.store.add_wordform("cats");
	rig.store.delete_wordform(wordform);

	let report = TaskReport::root("update", None);
	let outcome = worker.update_wordform(wordform, rig.ledger.issue(Priority::Medium), &report).unwrap();

	assert_eq!(outcome, UpdateOutcome::Skipped(SkipReason::WordformGone));
	assert_eq!(rig.ledger.outstanding(Priority::Medium), 0);
	assert!(parser.parsed().is_empty());
	assert_eq!(rig.filer.pending(), 0);
}

#[test]
fn blank_wordform_is_skipped() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let wordform = rig.store.add_wordform("   ");

	let report = TaskReport::root("update", None);
	let outcome = worker.update_wordform(wordform, rig.ledger.issue(Priority::Low), &report).unwrap();
	assert_eq!(outcome, UpdateOutcome::Skipped(SkipReason::EmptyForm));
	assert_eq!(rig.ledger.snapshot().skipped, 1);
}

#[test]
fn first_update_reloads_stale_engine_then_hands_off() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let wordform = rig.store.add_wordform("cats");

	let report = TaskReport::root("update", None);
	let outcome = worker.update_wordform(wordform, rig.ledger.issue(Priority::Low), &report).unwrap();

	assert_eq!(outcome, UpdateOutcome::HandedToFiler);
	assert_eq!(parser.reloads(), 1);
	assert_eq!(parser.parsed(), vec!["cats".to_string()]);
	assert_eq!(rig.filer.pending(), 1);
	assert_eq!(rig.ledger.outstanding(Priority::Low), 1);
	assert!(report.snapshot().find("Loading grammar and lexicon").is_some());
}

#[test]
fn unchanged_result_short_circuits() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let wordform = rig.store.add_wordform("cats");
	let checksum = ParseResult::default().content_hash();
	rig.store.edit_non_undoable(&mut |edit| edit.set_checksum(wordform, checksum));

	let report = TaskReport::root("update", None);
	let outcome = worker.update_wordform(wordform, rig.ledger.issue(Priority::Low), &report).unwrap();

	assert_eq!(outcome, UpdateOutcome::Skipped(SkipReason::Unchanged));
	assert_eq!(rig.filer.pending(), 0);
	assert_eq!(rig.ledger.outstanding(Priority::Low), 0);
}

#[test]
fn refiling_the_stored_result_is_not_short_circuited_while_newer_one_waits() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let wordform = rig.store.add_wordform("cats");
	let (form, msa) = (rig.store.add_form(), rig.store.add_msa());
	let noun = ParseResult::new([ParseAnalysis::new([ParseMorph::new(form, msa)])]);
	let report = TaskReport::root("update", None);

	parser.respond("cats", noun.clone());
	worker.update_wordform(wordform, rig.ledger.issue(Priority::Low), &report).unwrap();
	rig.host.pump();
	assert_eq!(rig.store.checksum_of(wordform), Some(noun.content_hash()));

	// Grammar flips to "no parse" and back before the host goes idle.
	parser.respond("cats", ParseResult::default());
	let outcome = worker.update_wordform(wordform, rig.ledger.issue(Priority::Low), &report).unwrap();
	assert_eq!(outcome, UpdateOutcome::HandedToFiler);
	assert!(!rig.filer.is_settled(wordform));

	parser.respond("cats", noun.clone());
	let outcome = worker.update_wordform(wordform, rig.ledger.issue(Priority::Low), &report).unwrap();
	assert_eq!(outcome, UpdateOutcome::HandedToFiler);

	rig.host.pump();
	assert!(rig.filer.is_settled(wordform));
	assert_eq!(rig.store.checksum_of(wordform), Some(noun.content_hash()));
	assert_eq!(rig.store.analyses_of(wordform).len(), 1);
	assert!(rig.ledger.is_idle());
}

#[test]
fn engine_reporting_outdated_triggers_reload() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let report = TaskReport::root("check", None);

	worker.check_needs_update(&report).unwrap();
	worker.check_needs_update(&report).unwrap();
	assert_eq!(parser.reloads(), 1);

	parser.mark_outdated();
	worker.check_needs_update(&report).unwrap();
	assert_eq!(parser.reloads(), 2);
}

#[test]
fn failed_reload_abandons_ticket_and_rearms_stale_flag() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	parser.fail_reload("rule table corrupt");
	let detector = StaleModelDetector::new();
	let mut worker = ParseWorker::new(
		Box::new(parser.clone()),
		detector.clone(),
		rig.store.clone(),
		rig.filer.clone(),
		Normalization::Nfd,
	);
	let wordform = rig.store.add_wordform("cats");

	let report = TaskReport::root("update", None);
	let err = worker
		.update_wordform(wordform, rig.ledger.issue(Priority::High), &report)
		.unwrap_err();

	assert!(matches!(err, SchedulerError::Reload(_)));
	assert!(detector.is_stale());
	assert_eq!(rig.ledger.snapshot().abandoned, 1);
	let step = report.snapshot();
	let step = step.find("Loading grammar and lexicon").unwrap();
	assert_eq!(step.phase, TaskPhase::ErrorEncountered);
}

#[test]
fn try_a_word_writes_rendering_or_trace_into_details() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let form = rig.store.add_form();
	let msa = rig.store.add_msa();
	parser.respond("cat", ParseResult::new([ParseAnalysis::new([ParseMorph::new(form, msa)])]));
	let mut worker = worker(&rig, &parser);

	let plain = TaskReport::root("try", None);
	worker.try_a_word(" cat ", false, &[], &plain).unwrap();
	assert_eq!(plain.snapshot().details.as_deref(), Some(format!("{form}/{msa}").as_str()));

	let traced = TaskReport::root("trace", None);
	worker.try_a_word("cat", true, &[form], &traced).unwrap();
	assert_eq!(traced.snapshot().details.as_deref(), Some("<trace form=\"cat\"/>"));
	assert_eq!(parser.traced(), vec![("cat".to_string(), vec![form])]);
}

#[test]
fn try_a_word_rejects_blank_text() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let report = TaskReport::root("try", None);

	let err = worker.try_a_word(" \t", false, &[], &report).unwrap_err();
	assert!(err.is_contract_violation());
	assert_eq!(parser.reloads(), 0);
}

#[test]
fn forms_are_decomposed_before_parsing() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	let wordform = rig.store.add_wordform("caf\u{e9}");

	let report = TaskReport::root("update", None);
	worker.update_wordform(wordform, rig.ledger.issue(Priority::Low), &report).unwrap();
	assert_eq!(parser.parsed(), vec!["cafe\u{301}".to_string()]);
}

#[test]
fn dispose_runs_once() {
	let rig = Rig::new(&SchedulerConfig::default());
	let parser = ScriptedParser::default();
	let mut worker = worker(&rig, &parser);
	worker.dispose();
	worker.dispose();
	drop(worker);
	assert_eq!(parser.disposed(), 1);
}
