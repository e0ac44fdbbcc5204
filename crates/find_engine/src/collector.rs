//! Pattern matching over a traversal cursor
//!
//! A [`Matcher`] is a [`MatchSpec`] prepared for one search: the folded
//! literal pattern, or the compiled regex. A [`MatchCollector`] pulls one
//! paragraph at a time from a [`TraversalCursor`], computes the greedy
//! left-to-right set of non-overlapping matches in it, and hands them out
//! front to back (forward) or back to front (reverse). Both directions
//! therefore report the same matches over the same text.

use crate::{
    compile_spec, CursorOrigin, EngineConfig, FoldedText, MatchSpec, Pacer, RegexEngine, RegexLiteEngine, Result,
    TextFolder, TextRunSpec, TraversalCursor,
};
use doc_model::{
    ContainerPath, Direction, DocumentTree, Paragraph, PathPoint, PositionPath, RunProps, OBJECT_REPLACEMENT_CHAR,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use unicode_normalization::char::is_combining_mark;
use unicode_segmentation::UnicodeSegmentation;

/// Progress flags of one search pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorState {
    pub found_match: bool,
    pub has_wrapped: bool,
    /// The pass reached its limit (or ran out of text) without a match
    pub stopped_at_limit: bool,
}

enum Pattern<C> {
    Literal {
        folder: TextFolder,
        chars: Vec<char>,
        /// Pattern run that produced each folded character
        run_of: Vec<usize>,
        runs: Vec<TextRunSpec>,
    },
    Regex(C),
}

/// A match spec prepared for matching
pub struct Matcher<'e, E: RegexEngine = RegexLiteEngine> {
    spec: MatchSpec,
    pattern: Pattern<E::Compiled>,
    engine: &'e E,
    config: EngineConfig,
}

impl<'e, E: RegexEngine> Matcher<'e, E> {
    /// Prepare a match spec; regex patterns are compiled here
    pub fn new(spec: &MatchSpec, engine: &'e E, config: &EngineConfig) -> Result<Self> {
        let pattern = if spec.options().use_regex {
            Pattern::Regex(compile_spec(spec, engine)?)
        } else {
            let folder = spec.folder();
            let mut chars = Vec::new();
            let mut run_of = Vec::new();
            let mut buf = Vec::new();
            for (index, run) in spec.pattern_runs().iter().enumerate() {
                for c in run.text.chars() {
                    buf.clear();
                    folder.fold_char(c, &mut buf);
                    run_of.extend(std::iter::repeat(index).take(buf.len()));
                    chars.extend_from_slice(&buf);
                }
            }
            Pattern::Literal {
                folder,
                chars,
                run_of,
                runs: spec.pattern_runs().to_vec(),
            }
        };

        Ok(Self {
            spec: spec.clone(),
            pattern,
            engine,
            config: config.clone(),
        })
    }

    pub fn spec(&self) -> &MatchSpec {
        &self.spec
    }

    pub fn engine(&self) -> &'e E {
        self.engine
    }

    /// Compiled regex, in regex mode
    pub fn compiled(&self) -> Option<&E::Compiled> {
        match &self.pattern {
            Pattern::Regex(compiled) => Some(compiled),
            Pattern::Literal { .. } => None,
        }
    }

    /// All matches inside a window, as paragraph offsets, left to right
    fn matches_in(&self, window: &Window<'_>) -> Vec<(usize, usize)> {
        let found = match &self.pattern {
            Pattern::Literal { folder, .. } => {
                let folded = FoldedText::build(folder, window.chars.iter().copied());
                let bounds = grapheme_boundaries(&window.chars);
                let mut out = Vec::new();
                let mut i = 0;
                while i < folded.len() {
                    match self.literal_at(window, &folded, &bounds, i) {
                        Some((s, e)) => {
                            out.push((s, e));
                            i = folded.first.get(e).copied().unwrap_or(folded.len()).max(i + 1);
                        }
                        None => i += 1,
                    }
                }
                out
            }
            Pattern::Regex(compiled) => {
                let stripped = StrippedText::build(window.paragraph);
                let window_end = window.base + window.chars.len();
                let mut out = Vec::new();
                let Some(mut from) = stripped.byte_at_or_after(window.base) else {
                    return Vec::new();
                };
                while let Some((start, len)) = self.engine.find(compiled, &stripped.text, from) {
                    if len == 0 {
                        match stripped.next_char_byte(start) {
                            Some(next) => {
                                from = next;
                                continue;
                            }
                            None => break,
                        }
                    }
                    let Some((s, e)) = stripped.paragraph_range(start, start + len) else {
                        break;
                    };
                    if e > window_end {
                        break;
                    }
                    out.push((s - window.base, e - window.base));
                    from = start + len;
                }
                out
            }
        };
        found
            .into_iter()
            .map(|(s, e)| (s + window.base, e + window.base))
            .collect()
    }

    /// Check a literal candidate starting at folded index `i`.
    ///
    /// Returns window-relative source offsets.
    fn literal_at(&self, window: &Window<'_>, folded: &FoldedText, bounds: &[bool], i: usize) -> Option<(usize, usize)> {
        let Pattern::Literal { chars, run_of, runs, .. } = &self.pattern else {
            return None;
        };
        let options = self.spec.options();
        let j = i + chars.len();
        if j > folded.len() || !folded.starts_source_char(i) || folded.chars[i..j] != chars[..] {
            return None;
        }
        if !folded.ends_source_char(j) {
            return None;
        }

        let s = folded.owner[i];
        let mut e = folded.owner[j - 1] + 1;
        if !options.match_diacritics {
            while e < window.chars.len() && folded.is_transparent(e) && is_combining_mark(window.chars[e]) {
                e += 1;
            }
        }
        if !bounds[s] || !bounds[e] {
            return None;
        }

        for k in i..j {
            let props = window.props[folded.owner[k]];
            let run = &runs[run_of[k - i]];
            if options.match_writing_system {
                if let Some(ws) = &run.writing_system {
                    if &props.writing_system != ws {
                        return None;
                    }
                }
            }
            if let Some(style) = &run.style {
                if props.style() != Some(style.as_str()) {
                    return None;
                }
            }
        }

        if options.match_whole_word {
            let before = if s > 0 { Some(window.chars[s - 1]) } else { window.before };
            let after = if e < window.chars.len() { Some(window.chars[e]) } else { window.after };
            let forms_word = |c: Option<char>| c.is_some_and(|c| self.config.is_word_forming(c));
            if forms_word(before) || forms_word(after) {
                return None;
            }
        }

        Some((s, e))
    }

    /// Whether `range` covers exactly one match, ignoring object markers at its edges
    pub fn match_at(&self, tree: &DocumentTree, range: &PositionPath) -> Option<(usize, usize)> {
        if !range.same_container() {
            return None;
        }
        let paragraph = tree.paragraph_at(range.container())?;
        let (mut start, mut end) = (range.start_offset(), range.end_offset());
        if end > paragraph.char_len() {
            return None;
        }
        while start < end && paragraph.char_at(start) == Some(OBJECT_REPLACEMENT_CHAR) {
            start += 1;
        }
        while end > start && paragraph.char_at(end - 1) == Some(OBJECT_REPLACEMENT_CHAR) {
            end -= 1;
        }
        if start == end {
            return None;
        }

        let window = Window::whole(range.container().clone(), paragraph);
        let hit = match &self.pattern {
            Pattern::Literal { folder, .. } => {
                let folded = FoldedText::build(folder, window.chars.iter().copied());
                let bounds = grapheme_boundaries(&window.chars);
                if folded.is_transparent(start) {
                    return None;
                }
                self.literal_at(&window, &folded, &bounds, folded.first[start])
            }
            Pattern::Regex(compiled) => {
                let stripped = StrippedText::build(paragraph);
                let from = stripped.byte_at_or_after(start)?;
                let (found, len) = self.engine.find(compiled, &stripped.text, from)?;
                if found != from || len == 0 {
                    return None;
                }
                stripped.paragraph_range(found, found + len)
            }
        };
        hit.filter(|&found| found == (start, end))
    }
}

impl<E: RegexEngine> std::fmt::Debug for Matcher<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher").field("spec", &self.spec).finish()
    }
}

/// Text of one paragraph (or the clipped part a cursor produced)
struct Window<'a> {
    container: ContainerPath,
    paragraph: &'a Paragraph,
    /// Paragraph offset of `chars[0]`
    base: usize,
    chars: Vec<char>,
    props: Vec<&'a RunProps>,
    before: Option<char>,
    after: Option<char>,
}

impl<'a> Window<'a> {
    fn whole(container: ContainerPath, paragraph: &'a Paragraph) -> Self {
        let mut chars = Vec::new();
        let mut props = Vec::new();
        for run in paragraph.runs() {
            for c in run.text.chars() {
                chars.push(c);
                props.push(&run.props);
            }
        }
        Self {
            container,
            paragraph,
            base: 0,
            chars,
            props,
            before: None,
            after: None,
        }
    }

    /// Read every chunk of the next paragraph from the cursor
    fn next_from(cursor: &mut TraversalCursor<'a>) -> Option<Self> {
        let first = cursor.next()?;
        let container = first.location.container.clone();
        let mut chunks = vec![first];
        while let Some(chunk) = cursor.next() {
            if chunk.location.container != container {
                cursor.unread(chunk);
                break;
            }
            chunks.push(chunk);
        }
        if cursor.was_aborted() {
            return None;
        }
        chunks.sort_by_key(|c| c.location.offset);

        let paragraph = cursor.tree().paragraph_at(&container)?;
        let base = chunks[0].location.offset;
        let mut chars = Vec::new();
        let mut props = Vec::new();
        for chunk in &chunks {
            for c in chunk.text.chars() {
                chars.push(c);
                props.push(chunk.props);
            }
        }
        let before = base.checked_sub(1).and_then(|o| paragraph.char_at(o));
        let after = paragraph.char_at(base + chars.len());

        Some(Self {
            container,
            paragraph,
            base,
            chars,
            props,
            before,
            after,
        })
    }
}

fn grapheme_boundaries(chars: &[char]) -> Vec<bool> {
    let text: String = chars.iter().collect();
    let mut bounds = vec![false; chars.len() + 1];
    let mut index = 0;
    for grapheme in text.graphemes(true) {
        bounds[index] = true;
        index += grapheme.chars().count();
    }
    bounds[chars.len()] = true;
    bounds
}

/// Paragraph text without object markers, as handed to a regex engine
pub(crate) struct StrippedText {
    pub text: String,
    /// Byte offset of each character of `text`, plus the total length
    byte_starts: Vec<usize>,
    /// Paragraph offset of each character of `text`
    offsets: Vec<usize>,
}

impl StrippedText {
    pub fn build(paragraph: &Paragraph) -> Self {
        let mut text = String::new();
        let mut byte_starts = Vec::new();
        let mut offsets = Vec::new();
        for (offset, c) in paragraph.text().chars().enumerate() {
            if c == OBJECT_REPLACEMENT_CHAR {
                continue;
            }
            byte_starts.push(text.len());
            offsets.push(offset);
            text.push(c);
        }
        byte_starts.push(text.len());
        Self {
            text,
            byte_starts,
            offsets,
        }
    }

    /// Byte offset of the first kept character at or after a paragraph offset
    pub fn byte_at_or_after(&self, offset: usize) -> Option<usize> {
        let index = self.offsets.partition_point(|&o| o < offset);
        self.byte_starts.get(index).copied()
    }

    fn next_char_byte(&self, byte: usize) -> Option<usize> {
        let index = self.byte_starts.binary_search(&byte).ok()?;
        self.byte_starts.get(index + 1).copied()
    }

    /// Paragraph range covered by a byte range of `text`
    pub fn paragraph_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let first = self.byte_starts.binary_search(&start).ok()?;
        let last = self.byte_starts.binary_search(&end).ok()?;
        if last <= first {
            return None;
        }
        Some((self.offsets[first], self.offsets[last - 1] + 1))
    }
}

/// Yields successive matches from a cursor
pub struct MatchCollector<'m, 'e, E: RegexEngine = RegexLiteEngine> {
    matcher: &'m Matcher<'e, E>,
    direction: Direction,
    limit: Option<PathPoint>,
    queue: VecDeque<(ContainerPath, usize, usize)>,
    state: CollectorState,
    limit_reached: bool,
    done: bool,
}

impl<'m, 'e, E: RegexEngine> MatchCollector<'m, 'e, E> {
    /// Collect matches in `direction`, stopping at `limit` if given
    pub fn new(matcher: &'m Matcher<'e, E>, direction: Direction, limit: Option<PathPoint>) -> Self {
        Self {
            matcher,
            direction,
            limit,
            queue: VecDeque::new(),
            state: CollectorState::default(),
            limit_reached: false,
            done: false,
        }
    }

    pub fn forward(matcher: &'m Matcher<'e, E>, limit: Option<PathPoint>) -> Self {
        Self::new(matcher, Direction::Forward, limit)
    }

    pub fn reverse(matcher: &'m Matcher<'e, E>, limit: Option<PathPoint>) -> Self {
        Self::new(matcher, Direction::Reverse, limit)
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Next match in the collector's direction
    pub fn next(&mut self, cursor: &mut TraversalCursor<'_>) -> Option<PositionPath> {
        loop {
            let next = match self.direction {
                Direction::Forward => self.queue.pop_front(),
                Direction::Reverse => self.queue.pop_back(),
            };
            if let Some((container, start, end)) = next {
                self.state.found_match = true;
                return Some(PositionPath::in_container(container, start, end));
            }
            if self.done {
                return None;
            }
            if self.limit_reached {
                self.finish(false);
                return None;
            }

            let Some(window) = Window::next_from(cursor) else {
                self.finish(cursor.was_aborted());
                return None;
            };

            let mut matches = self.matcher.matches_in(&window);
            if let Some(limit) = &self.limit {
                let order = cursor.tree().compare_paths(&window.container, &limit.container);
                let past = match self.direction {
                    Direction::Forward => Ordering::Greater,
                    Direction::Reverse => Ordering::Less,
                };
                match order {
                    Some(Ordering::Equal) => {
                        matches.retain(|&(s, e)| match self.direction {
                            Direction::Forward => s < limit.offset,
                            Direction::Reverse => e > limit.offset,
                        });
                        self.limit_reached = true;
                    }
                    Some(o) if o != past => {}
                    _ => {
                        tracing::trace!("collector passed its limit at {:?}", window.container);
                        self.finish(false);
                        return None;
                    }
                }
            }

            tracing::trace!("{} match(es) in {:?}", matches.len(), window.container);
            self.queue
                .extend(matches.into_iter().map(|(s, e)| (window.container.clone(), s, e)));
        }
    }

    fn finish(&mut self, aborted: bool) {
        self.done = true;
        if self.limit.is_some() && !aborted {
            self.state.stopped_at_limit = true;
        }
    }
}

/// Every match of `spec` in `tree`, in document order
pub fn find_all(spec: &MatchSpec, tree: &DocumentTree) -> Result<Vec<PositionPath>> {
    find_all_with(spec, tree, &RegexLiteEngine, &EngineConfig::default())
}

/// [`find_all`] with an explicit regex engine and configuration
pub fn find_all_with<E: RegexEngine>(
    spec: &MatchSpec,
    tree: &DocumentTree,
    engine: &E,
    config: &EngineConfig,
) -> Result<Vec<PositionPath>> {
    collect_matches(spec, tree, engine, config, Direction::Forward)
}

/// Every match of `spec` in `tree`, in the order a `direction` traversal meets them
pub fn collect_matches<E: RegexEngine>(
    spec: &MatchSpec,
    tree: &DocumentTree,
    engine: &E,
    config: &EngineConfig,
    direction: Direction,
) -> Result<Vec<PositionPath>> {
    let matcher = Matcher::new(spec, engine, config)?;
    let mut cursor = TraversalCursor::new(tree, direction, CursorOrigin::Boundary)?.with_pacer(Pacer::idle());
    let mut collector = MatchCollector::new(&matcher, direction, None);
    let mut out = Vec::new();
    while let Some(found) = collector.next(&mut cursor) {
        out.push(found);
    }
    Ok(out)
}
