//! Find-next / find-previous with wraparound
//!
//! One find call is at most two passes. The direct pass searches from the
//! origin to the document boundary. If it fails and the session has not
//! wrapped yet, the wrapped pass restarts from the opposite boundary and
//! stops when it reaches the point where the session started. A session
//! that has already wrapped only gets a direct pass, limited by that start
//! point, so no position is visited twice.
//!
//! No state is kept between calls: the host passes back the
//! [`FindSession`] returned by the previous call.

use crate::{
    CancellationGate, CollectorState, CursorOrigin, EngineConfig, InputPump, MatchCollector, MatchOutcome,
    MatchOutcomeSink, MatchSpec, Matcher, OutcomeKind, Pacer, RegexEngine, RegexLiteEngine, RegexValidator,
    RenderTarget, Result, StructuralRenderer, TraversalCursor,
};
use doc_model::{Direction, DocumentTree, PathPoint, PositionPath};
use serde::{Deserialize, Serialize};

/// What a host remembers between consecutive find calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindSession {
    pub direction: Direction,
    /// Where the first search of the session started; `None` on an empty document
    pub start: Option<PathPoint>,
    pub found_any: bool,
    pub has_wrapped: bool,
}

impl FindSession {
    fn begin(direction: Direction, start: Option<PathPoint>) -> Self {
        Self {
            direction,
            start,
            found_any: false,
            has_wrapped: false,
        }
    }
}

/// Input of one find call
#[derive(Debug, Clone, Default)]
pub struct FindRequest<'s> {
    /// Current selection; the search starts after it (forward) or before it (reverse)
    pub selection: Option<&'s PositionPath>,
    pub direction: Direction,
    /// Session returned by the previous call
    pub session: Option<FindSession>,
}

impl<'s> FindRequest<'s> {
    pub fn new(direction: Direction) -> Self {
        Self {
            selection: None,
            direction,
            session: None,
        }
    }

    pub fn from_selection(mut self, selection: &'s PositionPath) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_session(mut self, session: Option<FindSession>) -> Self {
        self.session = session;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindStatus {
    Found(PositionPath),
    /// Matches were found earlier in the session, none remain
    NoMoreMatchesFound,
    NoMatchFound,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOutcome {
    pub status: FindStatus,
    pub state: CollectorState,
    /// Session to pass to the next call; `None` once the session is over
    pub session: Option<FindSession>,
    /// Whether the host should show its default message
    pub show_default_message: bool,
}

impl FindOutcome {
    /// The match, if one was found
    pub fn found(&self) -> Option<&PositionPath> {
        match &self.status {
            FindStatus::Found(range) => Some(range),
            _ => None,
        }
    }
}

/// Runs single find operations against a rendered document
pub struct WrapController<'a, E: RegexEngine = RegexLiteEngine> {
    target: RenderTarget,
    engine: &'a E,
    config: EngineConfig,
    gate: Option<&'a CancellationGate>,
    pump: Option<&'a dyn InputPump>,
}

impl<'a> WrapController<'a, RegexLiteEngine> {
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            engine: &RegexLiteEngine,
            config: EngineConfig::default(),
            gate: None,
            pump: None,
        }
    }
}

impl<'a, E: RegexEngine> WrapController<'a, E> {
    /// Use another regex backend
    pub fn with_engine<F: RegexEngine>(self, engine: &'a F) -> WrapController<'a, F> {
        WrapController {
            target: self.target,
            engine,
            config: self.config,
            gate: self.gate,
            pump: self.pump,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_gate(mut self, gate: &'a CancellationGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_pump(mut self, pump: &'a dyn InputPump) -> Self {
        self.pump = Some(pump);
        self
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn engine(&self) -> &'a E {
        self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn pacer(&self) -> Pacer<'a> {
        Pacer::new(self.gate, self.pump, self.config.effective_poll_interval())
    }

    /// Validate, render and search once
    pub fn find<H: StructuralRenderer + ?Sized>(
        &self,
        host: &H,
        spec: &MatchSpec,
        request: FindRequest<'_>,
        sink: &mut dyn MatchOutcomeSink,
    ) -> Result<FindOutcome> {
        RegexValidator::new(self.engine).validate(spec)?;
        let matcher = Matcher::new(spec, self.engine, &self.config)?;
        let tree = host.render(self.target.root, self.target.fragment)?;
        self.search(&tree, &matcher, request, sink)
    }

    /// Search a rendered tree with a prepared matcher
    pub(crate) fn search(
        &self,
        tree: &DocumentTree,
        matcher: &Matcher<'_, E>,
        request: FindRequest<'_>,
        sink: &mut dyn MatchOutcomeSink,
    ) -> Result<FindOutcome> {
        let direction = request.direction;
        let origin = request.selection.and_then(|selection| origin_of(tree, selection, direction));

        let mut session = match request.session {
            Some(session) if session.direction == direction => session,
            Some(_) => {
                tracing::debug!("Search direction changed, starting a new session");
                FindSession::begin(direction, origin.clone().or_else(|| tree.boundary_point(direction)))
            }
            None => FindSession::begin(direction, origin.clone().or_else(|| tree.boundary_point(direction))),
        };

        let direct_limit = if session.has_wrapped { session.start.clone() } else { None };
        let cursor_origin = origin.map_or(CursorOrigin::Boundary, CursorOrigin::At);
        let mut cursor = TraversalCursor::new(tree, direction, cursor_origin)?.with_pacer(self.pacer());
        let mut collector = MatchCollector::new(matcher, direction, direct_limit);

        if let Some(found) = collector.next(&mut cursor) {
            let mut state = collector.state();
            state.has_wrapped = session.has_wrapped;
            session.found_any = true;
            return Ok(found_outcome(found, state, session));
        }
        if cursor.was_aborted() {
            return Ok(aborted_outcome(collector.state()));
        }
        let mut state = collector.state();

        if !session.has_wrapped {
            match session.start.clone() {
                Some(start) => {
                    tracing::debug!("No match before the {:?} boundary, wrapping", direction);
                    let mut cursor =
                        TraversalCursor::new(tree, direction, CursorOrigin::Boundary)?.with_pacer(self.pacer());
                    let mut collector = MatchCollector::new(matcher, direction, Some(start));
                    if let Some(found) = collector.next(&mut cursor) {
                        let mut state = collector.state();
                        state.has_wrapped = true;
                        session.has_wrapped = true;
                        session.found_any = true;
                        return Ok(found_outcome(found, state, session));
                    }
                    if cursor.was_aborted() {
                        return Ok(aborted_outcome(collector.state()));
                    }
                    state = collector.state();
                }
                None => state.stopped_at_limit = true,
            }
        }

        let kind = if session.found_any {
            OutcomeKind::NoMoreMatchesFound
        } else {
            OutcomeKind::NoMatchFound
        };
        tracing::debug!("Find finished without a match: {:?}", kind);
        let show_default_message = sink.notify(&MatchOutcome::new(kind, None));
        let status = match kind {
            OutcomeKind::NoMoreMatchesFound => FindStatus::NoMoreMatchesFound,
            _ => FindStatus::NoMatchFound,
        };
        Ok(FindOutcome {
            status,
            state,
            session: None,
            show_default_message,
        })
    }
}

/// Search origin for a selection: its later end going forward, its earlier end going back
fn origin_of(tree: &DocumentTree, selection: &PositionPath, direction: Direction) -> Option<PathPoint> {
    let point = tree
        .ordered_ends(selection)
        .map(|(first, last)| if direction.is_forward() { last } else { first })
        .filter(|point| tree.contains_point(point));
    if point.is_none() {
        tracing::warn!("Selection {:?} is stale, searching from the document boundary", selection);
    }
    point.cloned()
}

fn found_outcome(found: PositionPath, state: CollectorState, session: FindSession) -> FindOutcome {
    tracing::debug!("Found match at {:?}", found);
    FindOutcome {
        status: FindStatus::Found(found),
        state,
        session: Some(session),
        show_default_message: false,
    }
}

fn aborted_outcome(state: CollectorState) -> FindOutcome {
    tracing::debug!("Find aborted");
    FindOutcome {
        status: FindStatus::Aborted,
        state,
        session: None,
        show_default_message: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FragmentKind, MatchOptions, MemoryHost, RecordingSink};
    use doc_model::ContainerPath;

    fn setup(texts: &[&str]) -> (MemoryHost, WrapController<'static>) {
        let host = MemoryHost::new(DocumentTree::from_texts(texts));
        let controller = WrapController::new(RenderTarget::new(host.root_id(), FragmentKind::MAIN));
        (host, controller)
    }

    fn at(spec: &str) -> MatchSpec {
        MatchSpec::literal(spec, MatchOptions::new()).unwrap()
    }

    fn found_offsets(outcome: &FindOutcome) -> Option<(usize, usize)> {
        outcome
            .found()
            .map(|range| (range.container().steps()[0].index, range.start_offset()))
    }

    #[test]
    fn test_find_next_walks_matches_then_reports_no_more() {
        let (host, finder) = setup(&["The cat sat.", "The hat is red."]);
        let spec = at("at");
        let mut sink = RecordingSink::new();

        let mut selection: Option<PositionPath> = None;
        let mut session = None;
        let mut seen = Vec::new();
        loop {
            let request = FindRequest {
                selection: selection.as_ref(),
                direction: Direction::Forward,
                session: session.take(),
            };
            let outcome = finder.find(&host, &spec, request, &mut sink).unwrap();
            match &outcome.status {
                FindStatus::Found(range) => {
                    seen.push(found_offsets(&outcome).unwrap());
                    selection = Some(range.clone());
                    session = outcome.session;
                }
                other => {
                    assert_eq!(other, &FindStatus::NoMoreMatchesFound);
                    assert!(outcome.state.stopped_at_limit);
                    break;
                }
            }
        }
        assert_eq!(seen, vec![(0, 5), (0, 9), (1, 5)]);
        assert_eq!(sink.count_of(OutcomeKind::NoMoreMatchesFound), 1);
    }

    #[test]
    fn test_find_wraps_from_middle() {
        let (host, finder) = setup(&["at one", "two at"]);
        let spec = at("at");
        let mut sink = RecordingSink::new();
        let selection = PositionPath::collapsed(PathPoint::new(ContainerPath::body(1), 0));

        let first = finder
            .find(&host, &spec, FindRequest::new(Direction::Forward).from_selection(&selection), &mut sink)
            .unwrap();
        assert_eq!(found_offsets(&first), Some((1, 4)));
        assert!(!first.state.has_wrapped);

        let current = first.found().unwrap().clone();
        let second = finder
            .find(
                &host,
                &spec,
                FindRequest::new(Direction::Forward)
                    .from_selection(&current)
                    .with_session(first.session.clone()),
                &mut sink,
            )
            .unwrap();
        assert_eq!(found_offsets(&second), Some((0, 0)));
        assert!(second.state.has_wrapped);

        let current = second.found().unwrap().clone();
        let third = finder
            .find(
                &host,
                &spec,
                FindRequest::new(Direction::Forward)
                    .from_selection(&current)
                    .with_session(second.session.clone()),
                &mut sink,
            )
            .unwrap();
        assert_eq!(third.status, FindStatus::NoMoreMatchesFound);
        assert!(third.state.stopped_at_limit);
    }

    #[test]
    fn test_find_previous_wraps_to_bottom() {
        let (host, finder) = setup(&["at one", "two at"]);
        let spec = at("at");
        let mut sink = RecordingSink::new();
        let selection = PositionPath::collapsed(PathPoint::new(ContainerPath::body(1), 0));

        let first = finder
            .find(&host, &spec, FindRequest::new(Direction::Reverse).from_selection(&selection), &mut sink)
            .unwrap();
        assert_eq!(found_offsets(&first), Some((0, 0)));
        assert!(!first.state.has_wrapped);

        let current = first.found().unwrap().clone();
        let second = finder
            .find(
                &host,
                &spec,
                FindRequest::new(Direction::Reverse)
                    .from_selection(&current)
                    .with_session(first.session.clone()),
                &mut sink,
            )
            .unwrap();
        assert_eq!(found_offsets(&second), Some((1, 4)));
        assert!(second.state.has_wrapped);

        let current = second.found().unwrap().clone();
        let third = finder
            .find(
                &host,
                &spec,
                FindRequest::new(Direction::Reverse)
                    .from_selection(&current)
                    .with_session(second.session.clone()),
                &mut sink,
            )
            .unwrap();
        assert_eq!(third.status, FindStatus::NoMoreMatchesFound);
        assert!(third.state.stopped_at_limit);
    }

    #[test]
    fn test_find_previous_from_end() {
        let (host, finder) = setup(&["The cat sat.", "The hat is red."]);
        let spec = at("at");
        let mut sink = RecordingSink::new();
        let outcome = finder
            .find(&host, &spec, FindRequest::new(Direction::Reverse), &mut sink)
            .unwrap();
        assert_eq!(found_offsets(&outcome), Some((1, 5)));
    }

    #[test]
    fn test_no_match_anywhere() {
        let (host, finder) = setup(&["The cat sat."]);
        let mut sink = RecordingSink::new();
        let outcome = finder
            .find(&host, &at("xyz"), FindRequest::new(Direction::Forward), &mut sink)
            .unwrap();
        assert_eq!(outcome.status, FindStatus::NoMatchFound);
        assert!(outcome.state.stopped_at_limit);
        assert!(outcome.show_default_message);
        assert_eq!(sink.count_of(OutcomeKind::NoMatchFound), 1);
    }

    #[test]
    fn test_empty_document_terminates() {
        let (host, finder) = setup(&[]);
        let mut sink = RecordingSink::new();
        for direction in [Direction::Forward, Direction::Reverse] {
            let outcome = finder.find(&host, &at("a"), FindRequest::new(direction), &mut sink).unwrap();
            assert_eq!(outcome.status, FindStatus::NoMatchFound);
            assert!(outcome.state.stopped_at_limit);
        }
    }

    #[test]
    fn test_direction_change_resets_session() {
        let (host, finder) = setup(&["at at at"]);
        let spec = at("at");
        let mut sink = RecordingSink::new();
        let selection = PositionPath::in_container(ContainerPath::body(0), 3, 5);
        let stale_session = FindSession {
            direction: Direction::Forward,
            start: Some(PathPoint::new(ContainerPath::body(0), 5)),
            found_any: true,
            has_wrapped: true,
        };
        let outcome = finder
            .find(
                &host,
                &spec,
                FindRequest::new(Direction::Reverse)
                    .from_selection(&selection)
                    .with_session(Some(stale_session)),
                &mut sink,
            )
            .unwrap();
        assert_eq!(found_offsets(&outcome), Some((0, 0)));
        let session = outcome.session.unwrap();
        assert_eq!(session.direction, Direction::Reverse);
        assert!(!session.has_wrapped);
        assert_eq!(session.start, Some(PathPoint::new(ContainerPath::body(0), 3)));
    }

    #[test]
    fn test_stale_selection_falls_back_to_boundary() {
        let (host, finder) = setup(&["cat"]);
        let mut sink = RecordingSink::new();
        let stale = PositionPath::collapsed(PathPoint::new(ContainerPath::body(4), 2));
        let outcome = finder
            .find(
                &host,
                &at("cat"),
                FindRequest::new(Direction::Forward).from_selection(&stale),
                &mut sink,
            )
            .unwrap();
        assert_eq!(found_offsets(&outcome), Some((0, 0)));
    }

    #[test]
    fn test_invalid_regex_fails_before_search() {
        let (host, finder) = setup(&["abc"]);
        let mut sink = RecordingSink::new();
        let spec = MatchSpec::literal("a(", MatchOptions::new().regex(true)).unwrap();
        let result = finder.find(&host, &spec, FindRequest::new(Direction::Forward), &mut sink);
        assert!(matches!(result, Err(crate::FindError::InvalidPattern(_))));
        assert!(sink.outcomes.is_empty());
    }

    #[test]
    fn test_abort_during_find() {
        let (host, finder) = setup(&["no", "match", "here"]);
        let gate = CancellationGate::new();
        gate.request_abort();
        let finder = finder.with_gate(&gate).with_config(EngineConfig {
            poll_interval: 1,
            ..Default::default()
        });
        let mut sink = RecordingSink::new();
        let outcome = finder
            .find(&host, &at("zzz"), FindRequest::new(Direction::Forward), &mut sink)
            .unwrap();
        assert_eq!(outcome.status, FindStatus::Aborted);
        assert!(sink.outcomes.is_empty());
    }
}
