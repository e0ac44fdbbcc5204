//! Text run - a contiguous span of text with consistent formatting

use crate::{NodeId, WritingSystemId};
use serde::{Deserialize, Serialize};

/// Placeholder character standing in for an embedded non-text object
pub const OBJECT_REPLACEMENT_CHAR: char = '\u{FFFC}';

/// Kind of object an embedded-object run refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddedKind {
    FootnoteReference,
    Picture,
    Link,
    Other,
}

/// Reference to a non-text object embedded in a paragraph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddedObject {
    /// The object the marker stands for
    pub target: NodeId,
    pub kind: EmbeddedKind,
}

impl EmbeddedObject {
    pub fn new(target: NodeId, kind: EmbeddedKind) -> Self {
        Self { target, kind }
    }
}

/// Formatting carried by a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProps {
    /// Writing system of the text
    pub writing_system: WritingSystemId,
    /// Character style name, if any
    pub style: Option<String>,
    /// Set for embedded-object runs only
    pub object: Option<EmbeddedObject>,
}

impl RunProps {
    pub fn new(writing_system: impl Into<WritingSystemId>) -> Self {
        Self {
            writing_system: writing_system.into(),
            style: None,
            object: None,
        }
    }

    /// Set the character style
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn is_object(&self) -> bool {
        self.object.is_some()
    }
}

/// A text run - contiguous text with consistent formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// The text content of this run
    pub text: String,
    pub props: RunProps,
}

impl Run {
    /// Create a run in the default writing system
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            props: RunProps::default(),
        }
    }

    /// Create a run with explicit formatting
    pub fn with_props(text: impl Into<String>, props: RunProps) -> Self {
        Self {
            text: text.into(),
            props,
        }
    }

    /// Create a run in a specific writing system
    pub fn with_writing_system(
        text: impl Into<String>,
        writing_system: impl Into<WritingSystemId>,
    ) -> Self {
        Self::with_props(text, RunProps::new(writing_system))
    }

    /// Create an embedded-object marker run.
    ///
    /// The run always holds a single [`OBJECT_REPLACEMENT_CHAR`].
    pub fn embedded(object: EmbeddedObject, writing_system: impl Into<WritingSystemId>) -> Self {
        Self {
            text: OBJECT_REPLACEMENT_CHAR.to_string(),
            props: RunProps {
                writing_system: writing_system.into(),
                style: None,
                object: Some(object),
            },
        }
    }

    pub fn is_object(&self) -> bool {
        self.props.is_object()
    }

    /// Length of the run in characters (Unicode scalar values)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if this run is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte index of a character offset within this run
    pub fn byte_index(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Slice the run by character offsets
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let from = self.byte_index(start);
        let to = self.byte_index(end);
        &self.text[from..to.max(from)]
    }

    /// Copy of the characters in `start..end` with the same formatting
    pub fn sub_run(&self, start: usize, end: usize) -> Run {
        Run::with_props(self.slice(start, end), self.props.clone())
    }

    /// Whether another run can be merged into this one without losing formatting
    pub fn can_merge_with(&self, other: &Run) -> bool {
        !self.is_object() && !other.is_object() && self.props == other.props
    }
}
