//! Search description: pattern, replacement and match options
//!
//! A [`MatchSpec`] is built once per find or replace invocation and never
//! changes afterwards. Construction is where misuse is caught: an empty
//! pattern is rejected, and regex mode switches off the options that only
//! make sense for literal matching.

use crate::{FindError, Result, TextFolder};
use doc_model::{WritingSystemId, OBJECT_REPLACEMENT_CHAR};
use serde::{Deserialize, Serialize};

/// Options for find operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Case-sensitive search
    pub match_case: bool,
    /// Accents and other combining marks must match
    pub match_diacritics: bool,
    /// Match whole words only
    pub match_whole_word: bool,
    /// Matched text must be in the pattern's writing systems
    pub match_writing_system: bool,
    /// Treat the pattern as a regular expression
    pub use_regex: bool,
}

impl MatchOptions {
    /// Create a new MatchOptions with everything off
    pub fn new() -> Self {
        Self::default()
    }

    /// Set case sensitivity
    pub fn match_case(mut self, value: bool) -> Self {
        self.match_case = value;
        self
    }

    /// Set diacritic sensitivity
    pub fn match_diacritics(mut self, value: bool) -> Self {
        self.match_diacritics = value;
        self
    }

    /// Set whole word matching
    pub fn match_whole_word(mut self, value: bool) -> Self {
        self.match_whole_word = value;
        self
    }

    /// Set writing system matching
    pub fn match_writing_system(mut self, value: bool) -> Self {
        self.match_writing_system = value;
        self
    }

    /// Enable regex mode
    pub fn regex(mut self, value: bool) -> Self {
        self.use_regex = value;
        self
    }

    /// Options with the literal-only flags cleared when regex mode is on
    pub fn normalized(self) -> Self {
        if self.use_regex {
            Self {
                match_whole_word: false,
                match_diacritics: false,
                match_writing_system: false,
                ..self
            }
        } else {
            self
        }
    }
}

/// One formatting run of a pattern or replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRunSpec {
    pub text: String,
    /// Writing system of the run; `None` lets the matched text decide
    pub writing_system: Option<WritingSystemId>,
    /// Character style the matched text must carry (pattern) or receives (replacement)
    pub style: Option<String>,
}

impl TextRunSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            writing_system: None,
            style: None,
        }
    }

    pub fn with_writing_system(mut self, ws: impl Into<WritingSystemId>) -> Self {
        self.writing_system = Some(ws.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

#[derive(Deserialize)]
struct RawMatchSpec {
    pattern: Vec<TextRunSpec>,
    #[serde(default)]
    replacement: Vec<TextRunSpec>,
    #[serde(default)]
    options: MatchOptions,
    #[serde(default)]
    collation_locale: Option<String>,
}

impl TryFrom<RawMatchSpec> for MatchSpec {
    type Error = FindError;

    fn try_from(raw: RawMatchSpec) -> Result<Self> {
        let mut spec = MatchSpec::new(raw.pattern, raw.options)?.with_replacement(raw.replacement);
        spec.collation_locale = raw.collation_locale;
        Ok(spec)
    }
}

/// Immutable description of what to search for and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMatchSpec")]
pub struct MatchSpec {
    pattern: Vec<TextRunSpec>,
    replacement: Vec<TextRunSpec>,
    options: MatchOptions,
    collation_locale: Option<String>,
}

impl MatchSpec {
    /// Create a spec from pattern runs.
    ///
    /// Fails with [`FindError::EmptyPattern`] when the pattern has nothing
    /// that could be matched.
    pub fn new(pattern: Vec<TextRunSpec>, options: MatchOptions) -> Result<Self> {
        let options = options.normalized();
        let spec = Self {
            pattern: pattern.into_iter().filter(|r| !r.text.is_empty()).collect(),
            replacement: Vec::new(),
            options,
            collation_locale: None,
        };

        let text = spec.pattern_text();
        let empty = if options.use_regex {
            text.chars().all(|c| c == OBJECT_REPLACEMENT_CHAR)
        } else {
            spec.folder().fold_str(&text).is_empty()
        };
        if empty {
            return Err(FindError::EmptyPattern);
        }
        Ok(spec)
    }

    /// Create a spec from a single unformatted pattern string
    pub fn literal(text: impl Into<String>, options: MatchOptions) -> Result<Self> {
        Self::new(vec![TextRunSpec::new(text)], options)
    }

    /// Attach replacement runs
    pub fn with_replacement(mut self, runs: Vec<TextRunSpec>) -> Self {
        self.replacement = runs;
        self
    }

    /// Attach an unformatted replacement string
    pub fn with_replacement_text(self, text: impl Into<String>) -> Self {
        self.with_replacement(vec![TextRunSpec::new(text)])
    }

    /// Use a specific locale for literal comparison
    pub fn with_collation_locale(mut self, locale: impl Into<String>) -> Self {
        self.collation_locale = Some(locale.into());
        self
    }

    pub fn pattern_runs(&self) -> &[TextRunSpec] {
        &self.pattern
    }

    pub fn replacement_runs(&self) -> &[TextRunSpec] {
        &self.replacement
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn collation_locale(&self) -> Option<&str> {
        self.collation_locale.as_deref()
    }

    /// Concatenated pattern text
    pub fn pattern_text(&self) -> String {
        self.pattern.iter().map(|r| r.text.as_str()).collect()
    }

    /// Concatenated replacement text
    pub fn replacement_text(&self) -> String {
        self.replacement.iter().map(|r| r.text.as_str()).collect()
    }

    /// Locale driving literal comparison: the explicit collation locale,
    /// else the writing system of the first pattern run
    pub fn effective_locale(&self) -> Option<&str> {
        self.collation_locale.as_deref().or_else(|| {
            self.pattern
                .iter()
                .find_map(|r| r.writing_system.as_ref().map(WritingSystemId::as_str))
        })
    }

    /// Folder implementing this spec's comparison rules
    pub fn folder(&self) -> TextFolder {
        TextFolder::new(&self.options, self.effective_locale())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_options_builder() {
        let options = MatchOptions::new()
            .match_case(true)
            .match_whole_word(true)
            .match_diacritics(true)
            .regex(false);

        assert!(options.match_case);
        assert!(options.match_whole_word);
        assert!(options.match_diacritics);
        assert!(!options.use_regex);
    }

    #[test]
    fn test_regex_forces_literal_options_off() {
        let options = MatchOptions::new()
            .match_case(true)
            .match_whole_word(true)
            .match_diacritics(true)
            .match_writing_system(true)
            .regex(true);
        let spec = MatchSpec::literal("a+", options).unwrap();

        assert!(spec.options().use_regex);
        assert!(spec.options().match_case);
        assert!(!spec.options().match_whole_word);
        assert!(!spec.options().match_diacritics);
        assert!(!spec.options().match_writing_system);
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        assert!(matches!(
            MatchSpec::literal("", MatchOptions::new()),
            Err(FindError::EmptyPattern)
        ));
        assert!(matches!(
            MatchSpec::new(Vec::new(), MatchOptions::new()),
            Err(FindError::EmptyPattern)
        ));
        let orc_only = OBJECT_REPLACEMENT_CHAR.to_string();
        assert!(matches!(
            MatchSpec::literal(orc_only, MatchOptions::new()),
            Err(FindError::EmptyPattern)
        ));
    }

    #[test]
    fn test_marks_only_pattern_depends_on_diacritics() {
        assert!(MatchSpec::literal("\u{0301}", MatchOptions::new()).is_err());
        assert!(MatchSpec::literal("\u{0301}", MatchOptions::new().match_diacritics(true)).is_ok());
    }

    #[test]
    fn test_pattern_runs_concatenate() {
        let spec = MatchSpec::new(
            vec![
                TextRunSpec::new("ca").with_writing_system("en"),
                TextRunSpec::new(""),
                TextRunSpec::new("fé").with_writing_system("fr"),
            ],
            MatchOptions::new(),
        )
        .unwrap()
        .with_replacement_text("dog");

        assert_eq!(spec.pattern_runs().len(), 2);
        assert_eq!(spec.pattern_text(), "café");
        assert_eq!(spec.replacement_text(), "dog");
        assert_eq!(spec.effective_locale(), Some("en"));
        assert_eq!(spec.clone().with_collation_locale("tr").effective_locale(), Some("tr"));
    }

    #[test]
    fn test_deserialize_enforces_invariants() {
        let json = r#"{
            "pattern": [{ "text": "x+", "writing_system": null, "style": null }],
            "options": { "match_case": false, "match_diacritics": true,
                         "match_whole_word": true, "match_writing_system": false,
                         "use_regex": true }
        }"#;
        let spec: MatchSpec = serde_json::from_str(json).unwrap();
        assert!(!spec.options().match_whole_word);
        assert!(!spec.options().match_diacritics);

        let empty = r#"{ "pattern": [] }"#;
        assert!(serde_json::from_str::<MatchSpec>(empty).is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let spec = MatchSpec::literal("cat", MatchOptions::new().match_case(true))
            .unwrap()
            .with_replacement_text("dog")
            .with_collation_locale("en-US");
        let json = serde_json::to_string(&spec).unwrap();
        let back: MatchSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
