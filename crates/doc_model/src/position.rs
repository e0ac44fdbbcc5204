//! Structural addresses inside a document tree
//!
//! A [`ContainerPath`] names a paragraph by the chain of
//! `(property, occurrence)` steps leading to it from the root. A
//! [`PathPoint`] adds a character offset, and a [`PositionPath`] pairs an
//! anchor with an end to describe a range. Paths are plain values: they are
//! compared structurally and resolved against a tree on demand, so a path
//! taken from one render stays meaningful for the next one as long as the
//! structure did not change.

use crate::PropertyId;
use serde::{Deserialize, Serialize};

/// One level of containment: the `index`-th occurrence inside `property`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    pub property: PropertyId,
    pub index: usize,
}

impl PathStep {
    pub fn new(property: PropertyId, index: usize) -> Self {
        Self { property, index }
    }
}

/// Path from the root to a paragraph
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerPath(Vec<PathStep>);

impl ContainerPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    /// Path of the `index`-th paragraph directly in the root's body
    pub fn body(index: usize) -> Self {
        Self(vec![PathStep::new(PropertyId::BODY, index)])
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Number of containment levels
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path extended by one more level
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        Self(steps)
    }
}

/// A point inside a paragraph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathPoint {
    pub container: ContainerPath,
    /// Character offset within the paragraph text
    pub offset: usize,
}

impl PathPoint {
    pub fn new(container: ContainerPath, offset: usize) -> Self {
        Self { container, offset }
    }
}

/// A range in the document: where it was anchored and where it ends.
///
/// The anchor may come after the end for backward-oriented ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionPath {
    pub anchor: PathPoint,
    pub end: PathPoint,
}

impl PositionPath {
    pub fn new(anchor: PathPoint, end: PathPoint) -> Self {
        Self { anchor, end }
    }

    /// A range covering `start..end` inside one paragraph
    pub fn in_container(container: ContainerPath, start: usize, end: usize) -> Self {
        Self {
            anchor: PathPoint::new(container.clone(), start),
            end: PathPoint::new(container, end),
        }
    }

    /// An empty range (insertion point)
    pub fn collapsed(point: PathPoint) -> Self {
        Self {
            anchor: point.clone(),
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.end
    }

    /// Whether both ends lie in the same paragraph
    pub fn same_container(&self) -> bool {
        self.anchor.container == self.end.container
    }

    /// Smaller offset of a single-paragraph range
    pub fn start_offset(&self) -> usize {
        self.anchor.offset.min(self.end.offset)
    }

    /// Larger offset of a single-paragraph range
    pub fn end_offset(&self) -> usize {
        self.anchor.offset.max(self.end.offset)
    }

    /// Paragraph of the anchor
    pub fn container(&self) -> &ContainerPath {
        &self.anchor.container
    }
}
