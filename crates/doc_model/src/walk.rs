//! Depth-first paragraph walker
//!
//! Walks the container tree in document order (or its reverse) and yields
//! every paragraph together with its [`ContainerPath`]. The walker keeps
//! one frame per open container, so memory stays proportional to the tree
//! depth rather than the document size.

use crate::{Container, ContainerPath, DocModelError, DocumentTree, Node, NodeIndex, Paragraph, PathStep, Result};
use serde::{Deserialize, Serialize};

/// Reading order of a traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn is_forward(self) -> bool {
        self == Direction::Forward
    }
}

/// Walk position inside one container.
///
/// Forward: `(prop, child)` is the next slot to visit.
/// Reverse: `child` counts the slots of `prop` not yet visited.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeIndex,
    prop: usize,
    child: usize,
}

impl Frame {
    fn entering(direction: Direction, node: NodeIndex, container: &Container) -> Self {
        match direction {
            Direction::Forward => Self { node, prop: 0, child: 0 },
            Direction::Reverse => Self {
                node,
                prop: container.properties().len(),
                child: 0,
            },
        }
    }

    fn next_slot(&mut self, direction: Direction, container: &Container) -> Option<(usize, usize)> {
        let props = container.properties();
        match direction {
            Direction::Forward => loop {
                let prop = props.get(self.prop)?;
                if self.child < prop.children.len() {
                    self.child += 1;
                    return Some((self.prop, self.child - 1));
                }
                self.prop += 1;
                self.child = 0;
            },
            Direction::Reverse => loop {
                if self.child > 0 {
                    self.child -= 1;
                    return Some((self.prop, self.child));
                }
                if self.prop == 0 {
                    return None;
                }
                self.prop -= 1;
                self.child = props[self.prop].children.len();
            },
        }
    }
}

/// Lazy iterator over the paragraphs of a tree
#[derive(Debug, Clone)]
pub struct Paragraphs<'a> {
    tree: &'a DocumentTree,
    direction: Direction,
    stack: Vec<Frame>,
    /// Steps leading to the container of every frame but the root
    path: Vec<PathStep>,
    pending: Option<(ContainerPath, &'a Paragraph)>,
}

impl<'a> Paragraphs<'a> {
    /// Walk the whole tree from the boundary matching `direction`
    pub fn new(tree: &'a DocumentTree, direction: Direction) -> Self {
        let root = tree.root();
        let stack = match tree.node(root) {
            Some(Node::Container(c)) => vec![Frame::entering(direction, root, c)],
            _ => Vec::new(),
        };
        Self {
            tree,
            direction,
            stack,
            path: Vec::new(),
            pending: None,
        }
    }

    /// Walk from the paragraph at `from`, which is yielded first
    pub fn starting_at(tree: &'a DocumentTree, direction: Direction, from: &ContainerPath) -> Result<Self> {
        let steps = from.steps();
        if steps.is_empty() {
            return Err(DocModelError::InvalidPath("empty path".into()));
        }

        let mut stack = Vec::with_capacity(steps.len());
        let mut path = Vec::with_capacity(steps.len());
        let mut pending = None;
        let mut current = tree.root();

        for (depth, step) in steps.iter().enumerate() {
            let container = tree
                .node(current)
                .and_then(Node::as_container)
                .ok_or_else(|| DocModelError::InvalidPath(format!("no container at depth {}", depth)))?;
            let prop = container
                .property_ordinal(step.property)
                .ok_or_else(|| DocModelError::InvalidPath(format!("missing {} at depth {}", step.property, depth)))?;
            let child = *container.properties()[prop]
                .children
                .get(step.index)
                .ok_or_else(|| DocModelError::InvalidPath(format!("index {} out of range at depth {}", step.index, depth)))?;

            stack.push(match direction {
                Direction::Forward => Frame { node: current, prop, child: step.index + 1 },
                Direction::Reverse => Frame { node: current, prop, child: step.index },
            });

            if depth + 1 == steps.len() {
                let para = tree
                    .node(child)
                    .and_then(Node::as_paragraph)
                    .ok_or_else(|| DocModelError::InvalidPath("path does not end at a paragraph".into()))?;
                pending = Some((from.clone(), para));
            } else {
                path.push(*step);
                current = child;
            }
        }

        Ok(Self {
            tree,
            direction,
            stack,
            path,
            pending,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<'a> Iterator for Paragraphs<'a> {
    type Item = (ContainerPath, &'a Paragraph);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.pending.take() {
            return Some(item);
        }

        let tree = self.tree;
        loop {
            let frame = self.stack.last_mut()?;
            let container = match tree.node(frame.node) {
                Some(Node::Container(c)) => c,
                _ => {
                    self.stack.pop();
                    self.path.pop();
                    continue;
                }
            };

            let Some((prop_ordinal, child_index)) = frame.next_slot(self.direction, container) else {
                self.stack.pop();
                self.path.pop();
                continue;
            };

            let prop = &container.properties()[prop_ordinal];
            let child = prop.children[child_index];
            let step = PathStep::new(prop.id, child_index);

            match tree.node(child) {
                Some(Node::Paragraph(para)) => {
                    let mut steps = self.path.clone();
                    steps.push(step);
                    return Some((ContainerPath::new(steps), para));
                }
                Some(Node::Container(inner)) => {
                    self.stack.push(Frame::entering(self.direction, child, inner));
                    self.path.push(step);
                }
                None => {}
            }
        }
    }
}
