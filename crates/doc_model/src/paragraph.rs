//! Paragraph node - a block of text made of formatting runs

use crate::{DocModelError, NodeId, Result, Run};
use serde::{Deserialize, Serialize};

/// A paragraph containing text runs.
///
/// Offsets into a paragraph count Unicode scalar values across all runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    id: NodeId,
    runs: Vec<Run>,
}

impl Paragraph {
    /// Create a new empty paragraph
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            runs: Vec::new(),
        }
    }

    /// Create a paragraph holding the given runs
    pub fn with_runs(runs: Vec<Run>) -> Self {
        let mut para = Self::new();
        for run in runs {
            para.push_run(run);
        }
        para
    }

    /// Create a paragraph with a single run in the default writing system
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_runs(vec![Run::new(text)])
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Append a run, merging it into the previous one when formatting allows
    pub fn push_run(&mut self, run: Run) {
        if run.is_empty() {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.can_merge_with(&run) {
                last.text.push_str(&run.text);
                return;
            }
        }
        self.runs.push(run);
    }

    /// Plain text of the paragraph, object markers included
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Locate the run containing a character offset.
    ///
    /// Returns the run index and the offset inside that run.
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (index, run) in self.runs.iter().enumerate() {
            let len = run.char_len();
            if offset < start + len {
                return Some((index, offset - start));
            }
            start += len;
        }
        None
    }

    /// Character at an offset
    pub fn char_at(&self, offset: usize) -> Option<char> {
        let (index, inner) = self.locate(offset)?;
        self.runs[index].text.chars().nth(inner)
    }

    /// Copy of the runs covering `start..end`
    pub fn runs_in_range(&self, start: usize, end: usize) -> Vec<Run> {
        let mut out = Vec::new();
        let mut offset = 0;
        for run in &self.runs {
            let len = run.char_len();
            let run_end = offset + len;
            if run_end > start && offset < end {
                let from = start.saturating_sub(offset);
                let to = (end - offset).min(len);
                out.push(run.sub_run(from, to));
            }
            offset = run_end;
        }
        out
    }

    /// Replace the characters in `start..end` with new runs.
    ///
    /// Runs cut by the range edges keep their formatting on both sides, and
    /// mergeable neighbours are joined afterwards.
    pub fn replace_range(&mut self, start: usize, end: usize, content: Vec<Run>) -> Result<()> {
        let len = self.char_len();
        if start > end || end > len {
            return Err(DocModelError::InvalidPosition {
                offset: start.max(end),
                len,
            });
        }

        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut offset = 0;
        for run in self.runs.drain(..) {
            let run_len = run.char_len();
            let run_end = offset + run_len;
            if run_end <= start {
                before.push(run);
            } else if offset >= end {
                after.push(run);
            } else {
                if offset < start {
                    before.push(run.sub_run(0, start - offset));
                }
                if run_end > end {
                    after.push(run.sub_run(end - offset, run_len));
                }
            }
            offset = run_end;
        }

        for run in before.into_iter().chain(content).chain(after) {
            self.push_run(run);
        }
        Ok(())
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}
