//! In-memory host
//!
//! Owns a [`DocumentTree`] and serves it to the engine directly. Paragraphs
//! can be marked read-only to exercise refused mutations.

use crate::{DocumentMutator, FragmentKind, MutationError, StructuralRenderer};
use doc_model::{ContainerPath, DocModelError, DocumentTree, NodeId, PositionPath, Run};
use std::borrow::Cow;

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    tree: DocumentTree,
    read_only: Vec<ContainerPath>,
}

impl MemoryHost {
    pub fn new(tree: DocumentTree) -> Self {
        Self {
            tree,
            read_only: Vec::new(),
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.tree.root_id()
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Refuse every later change to a paragraph
    pub fn set_read_only(&mut self, path: ContainerPath) {
        if !self.read_only.contains(&path) {
            self.read_only.push(path);
        }
    }

    pub fn is_read_only(&self, path: &ContainerPath) -> bool {
        self.read_only.contains(path)
    }

    /// Plain text of every paragraph in document order
    pub fn texts(&self) -> Vec<String> {
        self.tree.texts()
    }
}

impl StructuralRenderer for MemoryHost {
    fn render(&self, root: NodeId, _fragment: FragmentKind) -> doc_model::Result<Cow<'_, DocumentTree>> {
        if root != self.tree.root_id() {
            return Err(DocModelError::NodeNotFound(root.as_uuid()));
        }
        Ok(Cow::Borrowed(&self.tree))
    }
}

impl DocumentMutator for MemoryHost {
    fn replace_range(&mut self, range: &PositionPath, content: Vec<Run>) -> Result<(), MutationError> {
        if self.is_read_only(range.container()) {
            return Err(MutationError::ReadOnly(format!("{:?}", range.container())));
        }
        self.tree
            .replace_range(range, content)
            .map_err(|e| MutationError::InvalidRange(e.to_string()))
    }
}
