//! Single replace and replace-all
//!
//! A single replace re-checks the selection against the match spec before
//! touching the document, then issues a follow-up find so the host gets the
//! next selection. Replace-all renders the document once, locates every
//! match in that snapshot, then applies the replacements in document order,
//! shifting offsets by the length changes already made in each paragraph.

use crate::{
    CancellationGate, CursorOrigin, DocumentMutator, FindOutcome, FindRequest, FindSession, InputPump,
    MatchCollector, MatchOutcome, MatchOutcomeSink, MatchSpec, Matcher, OutcomeKind, Pacer, RegexEngine,
    RegexLiteEngine, RegexValidator, Result, StrippedText, StructuralRenderer, TraversalCursor, WrapController,
};
use doc_model::{
    ContainerPath, Direction, DocumentTree, Paragraph, PathPoint, PositionPath, Run, RunProps, OBJECT_REPLACEMENT_CHAR,
};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplaceResult {
    /// The selection was replaced; `changed` is the inserted length in characters
    Replaced { changed: usize },
    /// The selection no longer matches the pattern
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOutcome {
    pub result: ReplaceResult,
    /// Result of the follow-up find
    pub next: FindOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceAllSummary {
    pub replaced_count: u32,
    pub aborted: bool,
    /// Matches the host refused to change
    pub refused: u32,
    pub show_default_message: bool,
}

/// Performs replacements through a host's [`DocumentMutator`]
pub struct ReplaceEngine<'a, E: RegexEngine = RegexLiteEngine> {
    finder: WrapController<'a, E>,
}

impl<'a, E: RegexEngine> ReplaceEngine<'a, E> {
    pub fn new(finder: WrapController<'a, E>) -> Self {
        Self { finder }
    }

    pub fn with_gate(self, gate: &'a CancellationGate) -> Self {
        Self {
            finder: self.finder.with_gate(gate),
        }
    }

    pub fn with_pump(self, pump: &'a dyn InputPump) -> Self {
        Self {
            finder: self.finder.with_pump(pump),
        }
    }

    pub fn finder(&self) -> &WrapController<'a, E> {
        &self.finder
    }

    /// Replace the selection if it still matches, then find the next match
    pub fn replace<H: StructuralRenderer + DocumentMutator + ?Sized>(
        &self,
        host: &mut H,
        spec: &MatchSpec,
        selection: &PositionPath,
        session: Option<FindSession>,
        sink: &mut dyn MatchOutcomeSink,
    ) -> Result<ReplaceOutcome> {
        RegexValidator::new(self.finder.engine()).validate(spec)?;
        let matcher = Matcher::new(spec, self.finder.engine(), self.finder.config())?;
        let direction = session.as_ref().map(|s| s.direction).unwrap_or_default();
        let target = self.finder.target();

        let planned = {
            let tree = host.render(target.root, target.fragment)?;
            matcher.match_at(&tree, selection).and_then(|(start, end)| {
                let paragraph = tree.paragraph_at(selection.container())?;
                Some((start, end, replacement_content(&matcher, paragraph, start, end)))
            })
        };

        let Some((start, end, content)) = planned else {
            tracing::debug!("Selection {:?} no longer matches, searching again", selection);
            let request = FindRequest {
                selection: Some(selection),
                direction,
                session,
            };
            let next = self.finder.find(&*host, spec, request, sink)?;
            return Ok(ReplaceOutcome {
                result: ReplaceResult::NotApplicable,
                next,
            });
        };

        let container = selection.container().clone();
        let inserted: usize = content.iter().map(Run::char_len).sum();
        host.replace_range(&PositionPath::in_container(container.clone(), start, end), content)?;
        tracing::debug!("Replaced {}..{} in {:?} with {} chars", start, end, container, inserted);

        let resume = match direction {
            Direction::Forward => start + inserted,
            Direction::Reverse => start,
        };
        let resume = PositionPath::collapsed(PathPoint::new(container, resume));
        let request = FindRequest {
            selection: Some(&resume),
            direction,
            session,
        };
        let next = self.finder.find(&*host, spec, request, sink)?;
        Ok(ReplaceOutcome {
            result: ReplaceResult::Replaced { changed: inserted },
            next,
        })
    }

    /// Replace every match in the document, front to back.
    ///
    /// Matches are located once, in the text as it was before the pass, so
    /// replacement text is never searched again. Stops early when the
    /// cancellation gate is set; replacements already made stay in place.
    /// Refused mutations are skipped.
    pub fn replace_all<H: StructuralRenderer + DocumentMutator + ?Sized>(
        &self,
        host: &mut H,
        spec: &MatchSpec,
        sink: &mut dyn MatchOutcomeSink,
    ) -> Result<ReplaceAllSummary> {
        RegexValidator::new(self.finder.engine()).validate(spec)?;
        let matcher = Matcher::new(spec, self.finder.engine(), self.finder.config())?;
        let target = self.finder.target();
        let mut pacer = self.finder.pacer();
        let mut summary = ReplaceAllSummary::default();

        let planned = if pacer.poll() {
            let tree = host.render(target.root, target.fragment)?;
            plan_replacements(&matcher, &tree, pacer)?
        } else {
            None
        };

        match planned {
            Some(planned) => {
                tracing::debug!("Replace-all located {} match(es)", planned.len());
                let mut shift = ParagraphShift::default();
                for plan in planned {
                    if !pacer.poll() {
                        summary.aborted = true;
                        break;
                    }

                    let (start, end) = shift.apply(&plan.container, plan.start, plan.end);
                    let inserted: usize = plan.content.iter().map(Run::char_len).sum();
                    let range = PositionPath::in_container(plan.container, start, end);
                    match host.replace_range(&range, plan.content) {
                        Ok(()) => {
                            summary.replaced_count += 1;
                            shift.record(end - start, inserted);
                        }
                        Err(e) => {
                            tracing::warn!("Skipping match at {:?}: {}", range, e);
                            summary.refused += 1;
                        }
                    }

                    if !pacer.pump_now() {
                        summary.aborted = true;
                        break;
                    }
                }
            }
            None => summary.aborted = true,
        }

        let kind = if summary.replaced_count == 0 && summary.refused == 0 && !summary.aborted {
            OutcomeKind::NoMatchFound
        } else {
            OutcomeKind::ReplaceAllFinished
        };
        tracing::debug!(
            "Replace-all done: {} replaced, {} refused, aborted={}",
            summary.replaced_count,
            summary.refused,
            summary.aborted
        );
        summary.show_default_message = sink.notify(&MatchOutcome::new(kind, Some(summary.replaced_count)));
        Ok(summary)
    }
}

/// One replacement worked out against the unmodified document
struct PlannedReplacement {
    container: ContainerPath,
    start: usize,
    end: usize,
    content: Vec<Run>,
}

/// Every match of one forward pass with its replacement content.
///
/// Returns `None` when the traversal was aborted.
fn plan_replacements<E: RegexEngine>(
    matcher: &Matcher<'_, E>,
    tree: &DocumentTree,
    pacer: Pacer<'_>,
) -> Result<Option<Vec<PlannedReplacement>>> {
    let mut cursor = TraversalCursor::new(tree, Direction::Forward, CursorOrigin::Boundary)?.with_pacer(pacer);
    let mut collector = MatchCollector::forward(matcher, None);
    let mut planned = Vec::new();
    while let Some(range) = collector.next(&mut cursor) {
        let (start, end) = (range.start_offset(), range.end_offset());
        let Some(paragraph) = tree.paragraph_at(range.container()) else {
            continue;
        };
        planned.push(PlannedReplacement {
            container: range.container().clone(),
            start,
            end,
            content: replacement_content(matcher, paragraph, start, end),
        });
    }
    if cursor.was_aborted() {
        return Ok(None);
    }
    Ok(Some(planned))
}

/// Length change made so far in the paragraph being replaced
#[derive(Debug, Default)]
struct ParagraphShift {
    container: Option<ContainerPath>,
    removed: usize,
    inserted: usize,
}

impl ParagraphShift {
    /// Map original offsets to live ones, resetting on a new paragraph
    fn apply(&mut self, container: &ContainerPath, start: usize, end: usize) -> (usize, usize) {
        if self.container.as_ref() != Some(container) {
            self.container = Some(container.clone());
            self.removed = 0;
            self.inserted = 0;
        }
        (
            start + self.inserted - self.removed,
            end + self.inserted - self.removed,
        )
    }

    fn record(&mut self, removed: usize, inserted: usize) {
        self.removed += removed;
        self.inserted += inserted;
    }
}

/// Runs that replace the match at `start..end` of `paragraph`.
///
/// Object markers inside the match are kept and placed after the new text.
fn replacement_content<E: RegexEngine>(matcher: &Matcher<'_, E>, paragraph: &Paragraph, start: usize, end: usize) -> Vec<Run> {
    let spec = matcher.spec();
    let matched = paragraph.runs_in_range(start, end);
    let matched_props = matched
        .iter()
        .find(|run| !run.is_object())
        .map(|run| run.props.clone())
        .unwrap_or_default();

    let expansion = matcher.compiled().and_then(|compiled| {
        let stripped = StrippedText::build(paragraph);
        let byte = stripped.byte_at_or_after(start)?;
        Some((compiled, stripped, byte))
    });

    let mut out = Vec::new();
    for run in spec.replacement_runs() {
        let text = match &expansion {
            Some((compiled, stripped, byte)) => matcher.engine().expand(compiled, &stripped.text, *byte, &run.text),
            None => run.text.clone(),
        };
        let text: String = text.nfd().filter(|&c| c != OBJECT_REPLACEMENT_CHAR).collect();
        if text.is_empty() {
            continue;
        }
        let writing_system = if spec.options().match_writing_system {
            matched_props.writing_system.clone()
        } else {
            run.writing_system
                .clone()
                .unwrap_or_else(|| matched_props.writing_system.clone())
        };
        let props = RunProps {
            writing_system,
            style: run.style.clone().or_else(|| matched_props.style.clone()),
            object: None,
        };
        out.push(Run::with_props(text, props));
    }

    out.extend(matched.into_iter().filter(Run::is_object));
    out
}
