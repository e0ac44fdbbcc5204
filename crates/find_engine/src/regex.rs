//! Regular expression support
//!
//! The engine does not implement regular expressions itself. A
//! [`RegexEngine`] compiles and runs patterns; [`RegexLiteEngine`] is the
//! default backend.

use crate::{InvalidPatternError, MatchSpec};
use doc_model::OBJECT_REPLACEMENT_CHAR;

/// External regex matcher
pub trait RegexEngine {
    type Compiled;

    /// Compile a pattern, returning the engine's diagnostic on failure
    fn compile(&self, pattern: &str) -> Result<Self::Compiled, String>;

    /// Find the first match starting at or after byte offset `from`.
    ///
    /// Returns the byte start and byte length of the match.
    fn find(&self, compiled: &Self::Compiled, text: &str, from: usize) -> Option<(usize, usize)>;

    /// Expand capture references in `replacement` for the match at byte `start`.
    ///
    /// Engines without capture support return the replacement unchanged.
    fn expand(&self, _compiled: &Self::Compiled, _text: &str, _start: usize, replacement: &str) -> String {
        replacement.to_string()
    }
}

/// Regex backend built on `regex-lite`
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexLiteEngine;

impl RegexEngine for RegexLiteEngine {
    type Compiled = regex_lite::Regex;

    fn compile(&self, pattern: &str) -> Result<Self::Compiled, String> {
        regex_lite::Regex::new(pattern).map_err(|e| e.to_string())
    }

    fn find(&self, compiled: &Self::Compiled, text: &str, from: usize) -> Option<(usize, usize)> {
        if from > text.len() {
            return None;
        }
        compiled.find_at(text, from).map(|m| (m.start(), m.len()))
    }

    fn expand(&self, compiled: &Self::Compiled, text: &str, start: usize, replacement: &str) -> String {
        let mut out = String::new();
        match compiled.captures_at(text, start) {
            Some(caps) => caps.expand(replacement, &mut out),
            None => out.push_str(replacement),
        }
        out
    }
}

/// Pattern text as handed to the regex engine.
///
/// Object markers are dropped and case-insensitive searches get an inline
/// `(?i)` flag.
pub fn regex_source(spec: &MatchSpec) -> String {
    let pattern: String = spec
        .pattern_text()
        .chars()
        .filter(|&c| c != OBJECT_REPLACEMENT_CHAR)
        .collect();
    if spec.options().match_case {
        pattern
    } else {
        format!("(?i){}", pattern)
    }
}

/// Compile the spec's pattern, wrapping failures as [`InvalidPatternError`]
pub fn compile_spec<E: RegexEngine>(spec: &MatchSpec, engine: &E) -> Result<E::Compiled, InvalidPatternError> {
    engine.compile(&regex_source(spec)).map_err(InvalidPatternError::new)
}

/// Checks a spec's pattern before any traversal starts
#[derive(Debug, Clone, Copy)]
pub struct RegexValidator<'e, E: RegexEngine = RegexLiteEngine> {
    engine: &'e E,
}

impl<'e, E: RegexEngine> RegexValidator<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Validate the pattern of a regex-mode spec.
    ///
    /// Literal specs always pass. The compiled pattern is discarded, so
    /// repeated calls give the same answer.
    pub fn validate(&self, spec: &MatchSpec) -> Result<(), InvalidPatternError> {
        if !spec.options().use_regex {
            return Ok(());
        }
        compile_spec(spec, self.engine).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchOptions;

    fn regex_spec(pattern: &str) -> MatchSpec {
        MatchSpec::literal(pattern, MatchOptions::new().regex(true)).unwrap()
    }

    #[test]
    fn test_valid_pattern_passes() {
        let validator = RegexValidator::new(&RegexLiteEngine);
        assert!(validator.validate(&regex_spec(r"c[aeiou]t")).is_ok());
    }

    #[test]
    fn test_invalid_pattern_reports_diagnostic() {
        let validator = RegexValidator::new(&RegexLiteEngine);
        let spec = regex_spec("(unclosed");
        let first = validator.validate(&spec).unwrap_err();
        let second = validator.validate(&spec).unwrap_err();
        assert!(!first.message.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_literal_pattern_is_not_compiled() {
        let validator = RegexValidator::new(&RegexLiteEngine);
        let spec = MatchSpec::literal("(unclosed", MatchOptions::new()).unwrap();
        assert!(validator.validate(&spec).is_ok());
    }

    #[test]
    fn test_case_insensitive_source() {
        assert_eq!(regex_source(&regex_spec("ab")), "(?i)ab");
        let exact = MatchSpec::literal("ab", MatchOptions::new().regex(true).match_case(true)).unwrap();
        assert_eq!(regex_source(&exact), "ab");
    }

    #[test]
    fn test_find_and_expand() {
        let engine = RegexLiteEngine;
        let re = engine.compile(r"(\w)at").unwrap();
        let text = "The cat sat.";
        assert_eq!(engine.find(&re, text, 0), Some((4, 3)));
        assert_eq!(engine.find(&re, text, 5), Some((8, 3)));
        assert_eq!(engine.find(&re, text, 11), None);
        assert_eq!(engine.find(&re, text, 40), None);
        assert_eq!(engine.expand(&re, text, 8, "${1}ip"), "sip");
    }
}
