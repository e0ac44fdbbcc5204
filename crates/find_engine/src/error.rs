//! Error types for find and replace operations

use thiserror::Error;

/// The regular expression could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid pattern: {message}")]
pub struct InvalidPatternError {
    /// Diagnostic reported by the regex engine
    pub message: String,
}

impl InvalidPatternError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The host refused to change the document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Read-only region: {0}")]
    ReadOnly(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Mutation rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum FindError {
    #[error("Search pattern is empty")]
    EmptyPattern,

    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    #[error("Replacement failed: {0}")]
    Mutation(#[from] MutationError),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FindError>;
