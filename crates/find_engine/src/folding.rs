//! Collation folding for literal matching
//!
//! Literal comparison works on folded text: every character is put in
//! canonical decomposition, then case and combining marks are dropped or
//! kept according to the match options. Two strings compare equal under a
//! match spec exactly when their folded forms are equal. Folding is done per
//! character so that each folded character can be traced back to the
//! source character that produced it.

use crate::MatchOptions;
use doc_model::{WritingSystemId, OBJECT_REPLACEMENT_CHAR};
use unicode_normalization::char::{decompose_canonical, is_combining_mark};

/// Languages whose dotted and dotless i fold differently
const TURKIC_LANGUAGES: &[&str] = &["tr", "az", "crh", "tt", "ba"];

/// Per-character folding under one set of match options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFolder {
    match_case: bool,
    match_diacritics: bool,
    turkic: bool,
}

impl TextFolder {
    pub fn new(options: &MatchOptions, locale: Option<&str>) -> Self {
        let turkic = locale.is_some_and(|tag| {
            let language = WritingSystemId::new(tag).language();
            TURKIC_LANGUAGES.contains(&language.as_str())
        });
        Self {
            match_case: options.match_case,
            match_diacritics: options.match_diacritics,
            turkic,
        }
    }

    /// Append the folded form of `c` to `out`.
    ///
    /// Object markers fold to nothing, as do combining marks when
    /// diacritics are ignored.
    pub fn fold_char(&self, c: char, out: &mut Vec<char>) {
        if c == OBJECT_REPLACEMENT_CHAR {
            return;
        }
        if self.turkic && !self.match_case {
            match c {
                'I' => {
                    out.push('ı');
                    return;
                }
                '\u{0130}' => {
                    out.push('i');
                    return;
                }
                _ => {}
            }
        }
        decompose_canonical(c, |d| {
            if !self.match_diacritics && is_combining_mark(d) {
                return;
            }
            if self.match_case {
                out.push(d);
            } else {
                out.extend(d.to_lowercase());
            }
        });
    }

    /// Folded form of a whole string
    pub fn fold_str(&self, text: &str) -> String {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            self.fold_char(c, &mut out);
        }
        out.into_iter().collect()
    }
}

/// Folded text with a map back to source character indices
#[derive(Debug, Clone, Default)]
pub struct FoldedText {
    pub chars: Vec<char>,
    /// Source index of each folded character
    pub owner: Vec<usize>,
    /// First folded index produced by each source character
    pub first: Vec<usize>,
}

impl FoldedText {
    /// Fold a sequence of source characters
    pub fn build(folder: &TextFolder, source: impl IntoIterator<Item = char>) -> Self {
        let mut folded = FoldedText::default();
        let mut buf = Vec::new();
        for (index, c) in source.into_iter().enumerate() {
            buf.clear();
            folder.fold_char(c, &mut buf);
            folded.first.push(folded.chars.len());
            folded.owner.extend(std::iter::repeat(index).take(buf.len()));
            folded.chars.extend_from_slice(&buf);
        }
        folded
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Whether source character `index` folded to nothing
    pub fn is_transparent(&self, index: usize) -> bool {
        let start = self.first[index];
        let end = self.first.get(index + 1).copied().unwrap_or(self.chars.len());
        start == end
    }

    /// Whether folded index `at` is the first output of its source character
    pub fn starts_source_char(&self, at: usize) -> bool {
        at == 0 || self.owner[at - 1] != self.owner[at]
    }

    /// Whether folded index `at` ends a source character's output
    pub fn ends_source_char(&self, at: usize) -> bool {
        at == self.chars.len() || self.owner[at] != self.owner[at - 1]
    }
}
