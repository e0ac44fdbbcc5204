//! Document tree storage and structural queries

use crate::{
    Container, ContainerPath, DocModelError, Direction, Node, NodeId, NodeIndex, NodeKind, Paragraph,
    Paragraphs, PathPoint, PositionPath, PropertyId, Result, Run,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A rendered snapshot of a document: an arena of containers and paragraphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeIndex,
}

impl DocumentTree {
    /// Create an empty tree with a document root
    pub fn new() -> Self {
        Self::with_root(NodeKind::Document)
    }

    /// Create an empty tree whose root has the given kind
    pub fn with_root(kind: NodeKind) -> Self {
        Self {
            nodes: vec![Node::Container(Container::new(kind))],
            root: NodeIndex(0),
        }
    }

    /// Create a tree with one body paragraph per entry
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        let mut tree = Self::new();
        for para in paragraphs {
            tree.nodes.push(Node::Paragraph(para));
            let index = NodeIndex(tree.nodes.len() - 1);
            if let Node::Container(root) = &mut tree.nodes[0] {
                root.push_child(PropertyId::BODY, index);
            }
        }
        tree
    }

    /// Create a tree of plain body paragraphs
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::from_paragraphs(texts.iter().map(|t| Paragraph::from_text(*t)).collect())
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Get the root ID
    pub fn root_id(&self) -> NodeId {
        self.nodes[self.root.0].id()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    /// Number of paragraphs in the arena
    pub fn paragraph_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Paragraph(_))).count()
    }

    fn push_node(&mut self, parent: NodeIndex, property: PropertyId, node: Node) -> Result<NodeIndex> {
        let index = NodeIndex(self.nodes.len());
        match self.nodes.get_mut(parent.0) {
            Some(Node::Container(container)) => {
                container.push_child(property, index);
            }
            Some(Node::Paragraph(_)) => {
                return Err(DocModelError::InvalidOperation(
                    "Paragraphs cannot contain other nodes".into(),
                ));
            }
            None => {
                return Err(DocModelError::InvalidOperation(format!(
                    "No node at index {}",
                    parent.0
                )));
            }
        }
        self.nodes.push(node);
        Ok(index)
    }

    /// Append a container to a property of `parent`
    pub fn add_container(&mut self, parent: NodeIndex, property: PropertyId, kind: NodeKind) -> Result<NodeIndex> {
        self.push_node(parent, property, Node::Container(Container::new(kind)))
    }

    /// Append a paragraph to a property of `parent`
    pub fn add_paragraph(&mut self, parent: NodeIndex, property: PropertyId, para: Paragraph) -> Result<NodeIndex> {
        self.push_node(parent, property, Node::Paragraph(para))
    }

    /// Resolve a path to the node it names
    pub fn resolve(&self, path: &ContainerPath) -> Option<NodeIndex> {
        let mut current = self.root;
        for step in path.steps() {
            let container = self.node(current)?.as_container()?;
            let prop = container.properties().iter().find(|p| p.id == step.property)?;
            current = *prop.children.get(step.index)?;
        }
        Some(current)
    }

    /// Get the paragraph named by a path
    pub fn paragraph_at(&self, path: &ContainerPath) -> Option<&Paragraph> {
        self.node(self.resolve(path)?)?.as_paragraph()
    }

    fn paragraph_at_mut(&mut self, path: &ContainerPath) -> Option<&mut Paragraph> {
        let index = self.resolve(path)?;
        match self.nodes.get_mut(index.0) {
            Some(Node::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    /// Character at a point
    pub fn char_at(&self, point: &PathPoint) -> Option<char> {
        self.paragraph_at(&point.container)?.char_at(point.offset)
    }

    /// Whether a point names an existing paragraph and an offset inside it
    pub fn contains_point(&self, point: &PathPoint) -> bool {
        self.paragraph_at(&point.container)
            .is_some_and(|p| point.offset <= p.char_len())
    }

    /// First point in `direction`: start of the first paragraph, or end of the last
    pub fn boundary_point(&self, direction: Direction) -> Option<PathPoint> {
        let (path, para) = Paragraphs::new(self, direction).next()?;
        let offset = match direction {
            Direction::Forward => 0,
            Direction::Reverse => para.char_len(),
        };
        Some(PathPoint::new(path, offset))
    }

    /// Document order of two paragraph paths.
    ///
    /// Returns `None` when either path does not resolve in this tree.
    pub fn compare_paths(&self, a: &ContainerPath, b: &ContainerPath) -> Option<Ordering> {
        self.resolve(a)?;
        self.resolve(b)?;

        let mut current = self.root;
        for (sa, sb) in a.steps().iter().zip(b.steps()) {
            let container = self.node(current)?.as_container()?;
            if sa == sb {
                let ordinal = container.property_ordinal(sa.property)?;
                current = container.properties()[ordinal].children[sa.index];
                continue;
            }
            if sa.property == sb.property {
                return Some(sa.index.cmp(&sb.index));
            }
            let oa = container.property_ordinal(sa.property)?;
            let ob = container.property_ordinal(sb.property)?;
            return Some(oa.cmp(&ob));
        }
        Some(a.depth().cmp(&b.depth()))
    }

    /// Document order of two points
    pub fn compare_points(&self, a: &PathPoint, b: &PathPoint) -> Option<Ordering> {
        match self.compare_paths(&a.container, &b.container)? {
            Ordering::Equal => Some(a.offset.cmp(&b.offset)),
            other => Some(other),
        }
    }

    /// Earlier and later ends of a range, in document order
    pub fn ordered_ends<'r>(&self, range: &'r PositionPath) -> Option<(&'r PathPoint, &'r PathPoint)> {
        match self.compare_points(&range.anchor, &range.end)? {
            Ordering::Greater => Some((&range.end, &range.anchor)),
            _ => Some((&range.anchor, &range.end)),
        }
    }

    /// Iterate over paragraphs in `direction`, optionally starting at a paragraph
    pub fn paragraphs(&self, direction: Direction, from: Option<&ContainerPath>) -> Result<Paragraphs<'_>> {
        match from {
            Some(path) => Paragraphs::starting_at(self, direction, path),
            None => Ok(Paragraphs::new(self, direction)),
        }
    }

    /// Replace the text covered by a single-paragraph range
    pub fn replace_range(&mut self, range: &PositionPath, content: Vec<Run>) -> Result<()> {
        if !range.same_container() {
            return Err(DocModelError::InvalidOperation(
                "Range spans more than one paragraph".into(),
            ));
        }
        let (start, end) = (range.start_offset(), range.end_offset());
        let para = self
            .paragraph_at_mut(range.container())
            .ok_or_else(|| DocModelError::InvalidPath(format!("{:?}", range.container())))?;
        para.replace_range(start, end, content)
    }

    /// Plain text of every paragraph in document order
    pub fn texts(&self) -> Vec<String> {
        Paragraphs::new(self, Direction::Forward).map(|(_, p)| p.text()).collect()
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}
