//! Host-side collaborators
//!
//! The engine never owns the document. It asks a [`StructuralRenderer`] for
//! a snapshot, changes text only through a [`DocumentMutator`], and reports
//! terminal outcomes to a [`MatchOutcomeSink`].

use crate::MutationError;
use doc_model::{DocumentTree, NodeId, PositionPath, Run};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Opaque view selector passed through to the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FragmentKind(pub u32);

impl FragmentKind {
    pub const MAIN: FragmentKind = FragmentKind(0);
}

/// What the engine asks the renderer to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTarget {
    pub root: NodeId,
    pub fragment: FragmentKind,
}

impl RenderTarget {
    pub fn new(root: NodeId, fragment: FragmentKind) -> Self {
        Self { root, fragment }
    }
}

/// Produces the structural content to traverse
pub trait StructuralRenderer {
    fn render(&self, root: NodeId, fragment: FragmentKind) -> doc_model::Result<Cow<'_, DocumentTree>>;
}

/// The only way the engine changes stored text.
///
/// Calls happen inside whatever undo scope the host has opened.
pub trait DocumentMutator {
    fn replace_range(&mut self, range: &PositionPath, content: Vec<Run>) -> Result<(), MutationError>;
}

/// Kind of terminal outcome reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// Matches were found earlier in this session, none remain
    NoMoreMatchesFound,
    /// Nothing in the document matches
    NoMatchFound,
    ReplaceAllFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub kind: OutcomeKind,
    pub count: Option<u32>,
}

impl MatchOutcome {
    pub fn new(kind: OutcomeKind, count: Option<u32>) -> Self {
        Self { kind, count }
    }
}

/// Receives terminal outcomes.
///
/// The return value says whether the default user message should still
/// be shown.
pub trait MatchOutcomeSink {
    fn notify(&mut self, outcome: &MatchOutcome) -> bool;
}

impl<F: FnMut(&MatchOutcome) -> bool> MatchOutcomeSink for F {
    fn notify(&mut self, outcome: &MatchOutcome) -> bool {
        self(outcome)
    }
}

/// Sink that keeps every outcome and always asks for the default message
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub outcomes: Vec<MatchOutcome>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_of(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }
}

impl MatchOutcomeSink for RecordingSink {
    fn notify(&mut self, outcome: &MatchOutcome) -> bool {
        self.outcomes.push(*outcome);
        true
    }
}
