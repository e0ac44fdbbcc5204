//! Arena node types

use crate::{NodeId, Paragraph, PropertyId};
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`crate::DocumentTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Enumeration of the structural node kinds a renderer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Document,
    Section,
    Paragraph,
    Field,
    Footnote,
    Table,
    Cell,
    /// Host-specific container kind
    Custom(u32),
}

/// An ordered property slot of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub children: Vec<NodeIndex>,
}

/// A structural node whose content lives in property slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    id: NodeId,
    kind: NodeKind,
    /// Properties in document order
    properties: Vec<Property>,
}

impl Container {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            properties: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Position of a property among this container's properties
    pub fn property_ordinal(&self, id: PropertyId) -> Option<usize> {
        self.properties.iter().position(|p| p.id == id)
    }

    /// Append a child to a property, creating the slot after existing ones
    pub(crate) fn push_child(&mut self, id: PropertyId, child: NodeIndex) -> usize {
        match self.properties.iter_mut().find(|p| p.id == id) {
            Some(prop) => {
                prop.children.push(child);
                prop.children.len() - 1
            }
            None => {
                self.properties.push(Property {
                    id,
                    children: vec![child],
                });
                0
            }
        }
    }
}

/// A node stored in the tree arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Container(Container),
    Paragraph(Paragraph),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Container(c) => c.id(),
            Node::Paragraph(p) => p.id(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Container(c) => c.kind(),
            Node::Paragraph(_) => NodeKind::Paragraph,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Node::Container(c) => Some(c),
            Node::Paragraph(_) => None,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Node::Paragraph(p) => Some(p),
            Node::Container(_) => None,
        }
    }
}
