//! Identifiers used to address nodes, properties and writing systems

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node in the document tree.
/// Uses UUID v4 so ids stay stable across renders of the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier of a property slot on a container (body, footnotes, cells...).
///
/// Property ids are defined by the host; the engine only compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

impl PropertyId {
    /// Main text flow of a document or section
    pub const BODY: PropertyId = PropertyId(1);
    /// Notes attached to a container
    pub const NOTES: PropertyId = PropertyId(2);
    /// Rows or cells of a table-like container
    pub const CELLS: PropertyId = PropertyId(3);
    /// Contents of a field
    pub const FIELD_CONTENTS: PropertyId = PropertyId(4);

    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prop#{}", self.0)
    }
}

/// Writing system tag attached to text (e.g. "en", "fr-CA", "tr")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WritingSystemId(pub String);

impl WritingSystemId {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, lowercased ("tr" for "tr-TR")
    pub fn language(&self) -> String {
        self.0
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

impl Default for WritingSystemId {
    fn default() -> Self {
        Self("und".to_string())
    }
}

impl From<&str> for WritingSystemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WritingSystemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for WritingSystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique() {
        let id = NodeId::new();
        assert_ne!(id, NodeId::new());
        assert_eq!(NodeId::from(id.as_uuid()), id);
    }

    #[test]
    fn test_writing_system_language() {
        assert_eq!(WritingSystemId::new("tr-TR").language(), "tr");
        assert_eq!(WritingSystemId::new("AZ_latn").language(), "az");
        assert_eq!(WritingSystemId::default().as_str(), "und");
    }
}
