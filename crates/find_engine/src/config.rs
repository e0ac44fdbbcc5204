//! Engine configuration
//!
//! Settings are plain serde values so hosts can keep them next to the rest
//! of their preferences and load them from JSON.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Tunables for traversal pacing and word classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Traversal steps between two calls to the input pump
    pub poll_interval: usize,
    /// Characters treated as word-forming besides letters, digits and marks
    pub extra_word_chars: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: 64,
            extra_word_chars: String::new(),
        }
    }
}

impl EngineConfig {
    /// Parse settings from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<EngineConfig>(json) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Failed to parse engine config: {}", e);
                Err(e.into())
            }
        }
    }

    /// Serialize settings to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Poll interval, never zero
    pub fn effective_poll_interval(&self) -> usize {
        self.poll_interval.max(1)
    }

    /// Whether a character forms part of a word
    pub fn is_word_forming(&self, c: char) -> bool {
        c.is_alphanumeric()
            || unicode_normalization::char::is_combining_mark(c)
            || self.extra_word_chars.contains(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_interval, 64);
        assert!(config.extra_word_chars.is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "extra_word_chars": "'-" }"#).unwrap();
        assert_eq!(config.poll_interval, 64);
        assert!(config.is_word_forming('\''));
        assert!(config.is_word_forming('-'));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig {
            poll_interval: 8,
            extra_word_chars: "_".to_string(),
        };
        let back = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(crate::FindError::Config(_))
        ));
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_invalid_json_is_logged() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            EngineConfig::from_json(r#"{ "poll_interval": "often" }"#)
        });
        assert!(result.is_err());

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Failed to parse engine config"));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = EngineConfig {
            poll_interval: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_poll_interval(), 1);
    }

    #[test]
    fn test_word_forming_classification() {
        let config = EngineConfig::default();
        assert!(config.is_word_forming('a'));
        assert!(config.is_word_forming('7'));
        assert!(config.is_word_forming('\u{0301}'));
        assert!(!config.is_word_forming(' '));
        assert!(!config.is_word_forming('.'));
        assert!(!config.is_word_forming(doc_model::OBJECT_REPLACEMENT_CHAR));
    }
}
