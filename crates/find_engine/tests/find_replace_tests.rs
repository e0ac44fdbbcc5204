//! Integration tests for find and replace
//!
//! Drives the public API end to end through an in-memory host: find-next
//! sessions with wraparound, single replace, replace-all, cancellation and
//! refused mutations.

use doc_model::{
    ContainerPath, Direction, DocumentTree, EmbeddedKind, EmbeddedObject, NodeId, NodeKind, Paragraph, PathStep,
    PositionPath, PropertyId, Run, OBJECT_REPLACEMENT_CHAR,
};
use find_engine::{
    find_all, CancellationGate, EngineConfig, FindError, FindRequest, FindSession, FindStatus, FragmentKind,
    MatchOptions, MatchOutcome, MatchSpec, MemoryHost, OutcomeKind, RecordingSink, RenderTarget, ReplaceEngine,
    ReplaceResult, WrapController,
};
use std::cell::Cell;

fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

fn cat_and_hat() -> MemoryHost {
    MemoryHost::new(DocumentTree::from_texts(&["The cat sat.", "The hat is red."]))
}

fn target(host: &MemoryHost) -> RenderTarget {
    RenderTarget::new(host.root_id(), FragmentKind::MAIN)
}

fn at() -> MatchSpec {
    MatchSpec::literal("at", MatchOptions::new()).unwrap()
}

/// Run find-next until the session ends, returning every match and the final status
fn find_until_done(
    host: &MemoryHost,
    finder: &WrapController<'_>,
    spec: &MatchSpec,
    direction: Direction,
    sink: &mut RecordingSink,
) -> (Vec<PositionPath>, FindStatus) {
    let mut selection: Option<PositionPath> = None;
    let mut session: Option<FindSession> = None;
    let mut found = Vec::new();
    loop {
        let request = FindRequest {
            selection: selection.as_ref(),
            direction,
            session: session.take(),
        };
        let outcome = finder.find(host, spec, request, sink).unwrap();
        match outcome.status {
            FindStatus::Found(range) => {
                found.push(range.clone());
                selection = Some(range);
                session = outcome.session;
            }
            other => return (found, other),
        }
        assert!(found.len() < 100, "find-next did not terminate");
    }
}

// ========== Scenario tests ==========

#[test]
fn test_find_next_over_two_paragraphs() {
    init_tracing();
    let host = cat_and_hat();
    let finder = WrapController::new(target(&host));
    let mut sink = RecordingSink::new();

    let (found, status) = find_until_done(&host, &finder, &at(), Direction::Forward, &mut sink);
    let positions: Vec<(usize, usize)> = found
        .iter()
        .map(|r| (r.container().steps()[0].index, r.start_offset()))
        .collect();
    // "cat", "sat" and "hat" all contain "at"
    assert_eq!(positions, vec![(0, 5), (0, 9), (1, 5)]);
    assert_eq!(status, FindStatus::NoMoreMatchesFound);
    assert_eq!(
        sink.outcomes,
        vec![MatchOutcome::new(OutcomeKind::NoMoreMatchesFound, None)]
    );
}

#[test]
fn test_find_previous_visits_same_matches_backwards() {
    init_tracing();
    let host = cat_and_hat();
    let finder = WrapController::new(target(&host));
    let mut sink = RecordingSink::new();

    let (forward, _) = find_until_done(&host, &finder, &at(), Direction::Forward, &mut sink);
    let (mut reverse, status) = find_until_done(&host, &finder, &at(), Direction::Reverse, &mut sink);
    reverse.reverse();
    assert_eq!(forward, reverse);
    assert_eq!(status, FindStatus::NoMoreMatchesFound);
}

#[test]
fn test_replace_all_scenario() {
    init_tracing();
    let mut host = cat_and_hat();
    let engine = ReplaceEngine::new(WrapController::new(target(&host)));
    let mut sink = RecordingSink::new();
    let spec = at().with_replacement_text("AT");

    let summary = engine.replace_all(&mut host, &spec, &mut sink).unwrap();
    assert_eq!(summary.replaced_count, 3);
    assert!(!summary.aborted);
    assert_eq!(host.texts(), vec!["The cAT sAT.", "The hAT is red."]);
    assert_eq!(sink.count_of(OutcomeKind::ReplaceAllFinished), 1);
}

#[test]
fn test_replace_all_without_matches_reports_once() {
    init_tracing();
    let mut host = cat_and_hat();
    let engine = ReplaceEngine::new(WrapController::new(target(&host)));
    let mut sink = RecordingSink::new();
    let spec = MatchSpec::literal("xyz", MatchOptions::new())
        .unwrap()
        .with_replacement_text("abc");

    let summary = engine.replace_all(&mut host, &spec, &mut sink).unwrap();
    assert_eq!(summary.replaced_count, 0);
    assert!(!summary.aborted);
    assert_eq!(sink.outcomes.len(), 1);
    assert_eq!(sink.outcomes[0].kind, OutcomeKind::NoMatchFound);
    assert_eq!(host.texts(), vec!["The cat sat.", "The hat is red."]);
}

#[test]
fn test_whole_word_finds_nothing_inside_words() {
    init_tracing();
    let host = MemoryHost::new(DocumentTree::from_texts(&["The cat sat."]));
    let spec = MatchSpec::literal("at", MatchOptions::new().match_whole_word(true)).unwrap();
    assert!(find_all(&spec, host.tree()).unwrap().is_empty());

    let finder = WrapController::new(target(&host));
    let mut sink = RecordingSink::new();
    let outcome = finder
        .find(&host, &spec, FindRequest::new(Direction::Forward), &mut sink)
        .unwrap();
    assert_eq!(outcome.status, FindStatus::NoMatchFound);
    assert!(outcome.state.stopped_at_limit);
}

// ========== Structure ==========

/// body: [intro, section{ body: [first, second], notes: [note] }, outro]
fn nested_host() -> MemoryHost {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    tree.add_paragraph(root, PropertyId::BODY, Paragraph::from_text("intro cat"))
        .unwrap();
    let section = tree
        .add_container(root, PropertyId::BODY, NodeKind::Section)
        .unwrap();
    tree.add_paragraph(section, PropertyId::BODY, Paragraph::from_text("no match"))
        .unwrap();
    tree.add_paragraph(section, PropertyId::BODY, Paragraph::from_text("a cat here"))
        .unwrap();
    tree.add_paragraph(section, PropertyId::NOTES, Paragraph::from_text("note cat"))
        .unwrap();
    tree.add_paragraph(root, PropertyId::BODY, Paragraph::from_text("outro"))
        .unwrap();
    MemoryHost::new(tree)
}

#[test]
fn test_find_descends_into_nested_containers() {
    init_tracing();
    let host = nested_host();
    let finder = WrapController::new(target(&host));
    let mut sink = RecordingSink::new();
    let spec = MatchSpec::literal("cat", MatchOptions::new()).unwrap();

    let (found, _) = find_until_done(&host, &finder, &spec, Direction::Forward, &mut sink);
    let paths: Vec<ContainerPath> = found.iter().map(|r| r.container().clone()).collect();
    assert_eq!(
        paths,
        vec![
            ContainerPath::body(0),
            ContainerPath::body(1).child(PathStep::new(PropertyId::BODY, 1)),
            ContainerPath::body(1).child(PathStep::new(PropertyId::NOTES, 0)),
        ]
    );
}

#[test]
fn test_replace_all_in_nested_containers() {
    init_tracing();
    let mut host = nested_host();
    let engine = ReplaceEngine::new(WrapController::new(target(&host)));
    let mut sink = RecordingSink::new();
    let spec = MatchSpec::literal("CAT", MatchOptions::new())
        .unwrap()
        .with_replacement_text("dog");

    let summary = engine.replace_all(&mut host, &spec, &mut sink).unwrap();
    assert_eq!(summary.replaced_count, 3);
    assert_eq!(
        host.texts(),
        vec!["intro dog", "no match", "a dog here", "note dog", "outro"]
    );
}

// ========== Replace ==========

#[test]
fn test_replace_then_continue_session() {
    init_tracing();
    let mut host = cat_and_hat();
    let engine = ReplaceEngine::new(WrapController::new(target(&host)));
    let mut sink = RecordingSink::new();
    let spec = at().with_replacement_text("og");

    let first = engine
        .finder()
        .find(&host, &spec, FindRequest::new(Direction::Forward), &mut sink)
        .unwrap();
    let selection = first.found().unwrap().clone();

    let replaced = engine
        .replace(&mut host, &spec, &selection, first.session.clone(), &mut sink)
        .unwrap();
    assert_eq!(replaced.result, ReplaceResult::Replaced { changed: 2 });
    assert_eq!(host.texts()[0], "The cog sat.");

    let next = replaced.next.found().unwrap().clone();
    assert_eq!(next, PositionPath::in_container(ContainerPath::body(0), 9, 11));
    assert!(replaced.next.session.is_some());
}

#[test]
fn test_replace_preserves_footnote_marker() {
    init_tracing();
    let marker = Run::embedded(
        EmbeddedObject::new(NodeId::new(), EmbeddedKind::FootnoteReference),
        "en",
    );
    let para = Paragraph::with_runs(vec![Run::new("see the ca"), marker, Run::new("t here")]);
    let mut host = MemoryHost::new(DocumentTree::from_paragraphs(vec![para]));
    let engine = ReplaceEngine::new(WrapController::new(target(&host)));
    let mut sink = RecordingSink::new();
    let spec = MatchSpec::literal("cat", MatchOptions::new())
        .unwrap()
        .with_replacement_text("dog");

    let summary = engine.replace_all(&mut host, &spec, &mut sink).unwrap();
    assert_eq!(summary.replaced_count, 1);
    let text = host.texts().remove(0);
    assert_eq!(text.matches(OBJECT_REPLACEMENT_CHAR).count(), 1);
    assert_eq!(text, format!("see the dog{} here", OBJECT_REPLACEMENT_CHAR));
}

#[test]
fn test_refused_mutation_does_not_stop_replace_all() {
    init_tracing();
    let mut host = cat_and_hat();
    host.set_read_only(ContainerPath::body(0));
    let engine = ReplaceEngine::new(WrapController::new(target(&host)));
    let mut sink = RecordingSink::new();
    let spec = at().with_replacement_text("AT");

    let summary = engine.replace_all(&mut host, &spec, &mut sink).unwrap();
    assert_eq!(summary.replaced_count, 1);
    assert_eq!(summary.refused, 2);
    assert_eq!(host.texts(), vec!["The cat sat.", "The hAT is red."]);
}

// ========== Cancellation ==========

#[test]
fn test_abort_during_replace_all_keeps_partial_count() {
    init_tracing();
    let mut host = MemoryHost::new(DocumentTree::from_texts(&["cat cat", "cat cat", "cat"]));
    let gate = CancellationGate::new();
    let pumps = Cell::new(0);
    let pump = || {
        pumps.set(pumps.get() + 1);
        if pumps.get() == 2 {
            gate.request_abort();
        }
    };
    let finder = WrapController::new(target(&host))
        .with_config(EngineConfig {
            poll_interval: 10_000,
            ..Default::default()
        })
        .with_gate(&gate)
        .with_pump(&pump);
    let engine = ReplaceEngine::new(finder);
    let mut sink = RecordingSink::new();
    let spec = MatchSpec::literal("cat", MatchOptions::new())
        .unwrap()
        .with_replacement_text("dog");

    let summary = engine.replace_all(&mut host, &spec, &mut sink).unwrap();
    assert!(summary.aborted);
    assert_eq!(summary.replaced_count, 2);
    assert_eq!(host.texts(), vec!["dog dog", "cat cat", "cat"]);
    assert_eq!(
        sink.outcomes,
        vec![MatchOutcome::new(OutcomeKind::ReplaceAllFinished, Some(2))]
    );
}

#[test]
fn test_pump_runs_during_long_traversal() {
    init_tracing();
    let texts: Vec<String> = (0..50).map(|i| format!("paragraph {}", i)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let host = MemoryHost::new(DocumentTree::from_texts(&refs));
    let pumps = Cell::new(0);
    let pump = || pumps.set(pumps.get() + 1);
    let finder = WrapController::new(target(&host))
        .with_config(EngineConfig {
            poll_interval: 4,
            ..Default::default()
        })
        .with_pump(&pump);
    let mut sink = RecordingSink::new();
    let spec = MatchSpec::literal("absent", MatchOptions::new()).unwrap();

    let outcome = finder
        .find(&host, &spec, FindRequest::new(Direction::Forward), &mut sink)
        .unwrap();
    assert_eq!(outcome.status, FindStatus::NoMatchFound);
    assert!(pumps.get() >= 10);
}

// ========== Errors ==========

#[test]
fn test_invalid_regex_leaves_document_untouched() {
    init_tracing();
    let mut host = cat_and_hat();
    let engine = ReplaceEngine::new(WrapController::new(target(&host)));
    let mut sink = RecordingSink::new();
    let spec = MatchSpec::literal("[unclosed", MatchOptions::new().regex(true))
        .unwrap()
        .with_replacement_text("x");

    let err = engine.replace_all(&mut host, &spec, &mut sink).unwrap_err();
    match err {
        FindError::InvalidPattern(e) => assert!(!e.message.is_empty()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.outcomes.is_empty());
    assert_eq!(host.texts(), vec!["The cat sat.", "The hat is red."]);
}

#[test]
fn test_empty_pattern_is_rejected() {
    assert!(matches!(
        MatchSpec::literal("", MatchOptions::new()),
        Err(FindError::EmptyPattern)
    ));
}

#[test]
fn test_unknown_root_is_reported() {
    let host = cat_and_hat();
    let finder = WrapController::new(RenderTarget::new(NodeId::new(), FragmentKind::MAIN));
    let mut sink = RecordingSink::new();
    let result = finder.find(&host, &at(), FindRequest::new(Direction::Forward), &mut sink);
    assert!(matches!(result, Err(FindError::DocModel(_))));
}

#[test]
fn test_match_settings_and_config_load_from_json() {
    let spec: MatchSpec = serde_json::from_str(
        r#"{
            "pattern": [{ "text": "cat", "writing_system": "en", "style": null }],
            "replacement": [{ "text": "dog", "writing_system": null, "style": null }],
            "options": { "match_case": true, "match_diacritics": false,
                         "match_whole_word": true, "match_writing_system": false,
                         "use_regex": false }
        }"#,
    )
    .unwrap();
    assert_eq!(spec.replacement_text(), "dog");
    assert!(spec.options().match_whole_word);

    let config = EngineConfig::from_json(r#"{ "poll_interval": 16 }"#).unwrap();
    assert_eq!(config.poll_interval, 16);
}
