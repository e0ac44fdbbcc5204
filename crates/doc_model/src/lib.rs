//! Document Model - structural snapshot of a document for search and replace
//!
//! A [`DocumentTree`] is the read-only view a host renders for the engine:
//! an arena of containers with ordered property slots, paragraphs made of
//! formatting runs, and embedded-object markers. Positions inside it are
//! expressed as structural paths ([`ContainerPath`], [`PathPoint`],
//! [`PositionPath`]) that stay valid across renders of the same structure.

mod node;
mod paragraph;
mod run;
mod position;
mod node_id;
mod tree;
mod walk;
mod error;

pub use node::*;
pub use paragraph::*;
pub use run::*;
pub use position::*;
pub use node_id::*;
pub use tree::*;
pub use walk::*;
pub use error::*;
