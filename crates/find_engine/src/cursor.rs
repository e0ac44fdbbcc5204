//! Lazy traversal of document text
//!
//! A [`TraversalCursor`] walks the paragraphs of a rendered tree in either
//! reading order and yields one [`TextChunk`] per formatting run. Chunks
//! borrow from the tree, so nothing is copied. The paragraph holding the
//! origin is clipped: a forward cursor yields only what follows the origin
//! offset, a reverse cursor only what precedes it.

use crate::{Pacer, Result};
use doc_model::{ContainerPath, DocModelError, Direction, DocumentTree, Paragraph, Paragraphs, PathPoint, RunProps};
use std::collections::VecDeque;

/// Where a cursor starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorOrigin {
    /// Start of the document for forward cursors, end for reverse ones
    Boundary,
    At(PathPoint),
}

/// A run of text and where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk<'a> {
    pub text: &'a str,
    /// Paragraph and character offset of the first character of `text`
    pub location: PathPoint,
    pub props: &'a RunProps,
}

impl TextChunk<'_> {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Finite, non-restartable sequence of text chunks
pub struct TraversalCursor<'a> {
    tree: &'a DocumentTree,
    paragraphs: Paragraphs<'a>,
    direction: Direction,
    clip: Option<usize>,
    pending: VecDeque<TextChunk<'a>>,
    unread: Option<TextChunk<'a>>,
    pacer: Pacer<'a>,
    aborted: bool,
}

impl<'a> TraversalCursor<'a> {
    /// Create a cursor over `tree`.
    ///
    /// Fails when the origin does not name a paragraph and offset of this tree.
    pub fn new(tree: &'a DocumentTree, direction: Direction, origin: CursorOrigin) -> Result<Self> {
        let (paragraphs, clip) = match origin {
            CursorOrigin::Boundary => (tree.paragraphs(direction, None)?, None),
            CursorOrigin::At(point) => {
                let para = tree
                    .paragraph_at(&point.container)
                    .ok_or_else(|| DocModelError::InvalidPath(format!("{:?}", point.container)))?;
                if point.offset > para.char_len() {
                    return Err(DocModelError::InvalidPosition {
                        offset: point.offset,
                        len: para.char_len(),
                    }
                    .into());
                }
                (tree.paragraphs(direction, Some(&point.container))?, Some(point.offset))
            }
        };

        Ok(Self {
            tree,
            paragraphs,
            direction,
            clip,
            pending: VecDeque::new(),
            unread: None,
            pacer: Pacer::idle(),
            aborted: false,
        })
    }

    /// Pump input and poll for cancellation while traversing
    pub fn with_pacer(mut self, pacer: Pacer<'a>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn tree(&self) -> &'a DocumentTree {
        self.tree
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether traversal ended because of a cancellation request
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }

    /// Push a chunk back so the next call returns it again
    pub fn unread(&mut self, chunk: TextChunk<'a>) {
        self.unread = Some(chunk);
    }

    fn load(&mut self, path: ContainerPath, para: &'a Paragraph, clip: Option<usize>) {
        let mut start = 0;
        for run in para.runs() {
            let end = start + run.char_len();
            let (from, to) = match (self.direction, clip) {
                (_, None) => (start, end),
                (Direction::Forward, Some(offset)) => (start.max(offset), end),
                (Direction::Reverse, Some(offset)) => (start, end.min(offset)),
            };
            if from < to {
                let chunk = TextChunk {
                    text: run.slice(from - start, to - start),
                    location: PathPoint::new(path.clone(), from),
                    props: &run.props,
                };
                match self.direction {
                    Direction::Forward => self.pending.push_back(chunk),
                    Direction::Reverse => self.pending.push_front(chunk),
                }
            }
            start = end;
        }
    }
}

impl<'a> Iterator for TraversalCursor<'a> {
    type Item = TextChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(chunk) = self.unread.take() {
            return Some(chunk);
        }
        if self.aborted {
            return None;
        }
        loop {
            if !self.pacer.tick() {
                self.aborted = true;
                self.pending.clear();
                return None;
            }
            if let Some(chunk) = self.pending.pop_front() {
                return Some(chunk);
            }
            let (path, para) = self.paragraphs.next()?;
            let clip = self.clip.take();
            self.load(path, para, clip);
        }
    }
}

impl std::fmt::Debug for TraversalCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalCursor")
            .field("direction", &self.direction)
            .field("pending", &self.pending.len())
            .field("aborted", &self.aborted)
            .finish()
    }
}
