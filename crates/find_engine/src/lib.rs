//! Find Engine - pattern search and replace over structured documents
//!
//! This crate locates occurrences of a [`MatchSpec`] inside a rendered
//! [`doc_model::DocumentTree`], in either direction and with wraparound,
//! and performs single or bulk replacements through a host-provided
//! [`DocumentMutator`]. Long operations pump host input and poll a
//! [`CancellationGate`] so they can be stopped.

mod error;
mod config;
mod match_spec;
mod folding;
mod regex;
mod cancel;
mod collaborators;
mod cursor;
mod collector;
mod wrap;
mod replace;
mod memory_host;

pub use error::*;
pub use config::*;
pub use match_spec::*;
pub use folding::*;
pub use regex::*;
pub use cancel::*;
pub use collaborators::*;
pub use cursor::*;
pub use collector::*;
pub use wrap::*;
pub use replace::*;
pub use memory_host::*;
