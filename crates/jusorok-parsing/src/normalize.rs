//! Cleanup of raw recognized text.
//!
//! OCR output arrives with decomposed jamo, full-width digits, assorted dash
//! characters and ragged whitespace. [`normalize`] folds all of that into one
//! space-joined string while remembering where each source line began, so the
//! segmenter can still reason about line starts.

use unicode_normalization::UnicodeNormalization;

/// Normalized text plus the byte offset at which each source line starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub line_starts: Vec<usize>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The source lines, without the joining spaces.
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.line_starts.iter().enumerate().map(move |(i, &start)| {
            let end = self
                .line_starts
                .get(i + 1)
                .map_or(self.text.len(), |&next| next - 1);
            &self.text[start..end]
        })
    }

    /// Lines joined back with `\n`.
    pub fn to_multiline(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    /// `true` if `offset` is the first byte of a source line.
    pub fn is_line_start(&self, offset: usize) -> bool {
        self.line_starts.binary_search(&offset).is_ok()
    }
}

/// Normalize raw recognized text. Never fails; empty input gives empty text.
pub fn normalize(raw: &str) -> NormalizedText {
    // Fold before composing: dropping a format character or narrowing a
    // full-width letter can leave a composable pair behind. Fold again after
    // NFC so the output is a fixed point.
    let folded: String = raw
        .replace("\r\n", "\n")
        .chars()
        .filter_map(fold_char)
        .collect::<String>()
        .nfc()
        .filter_map(fold_char)
        .collect();

    let mut out = NormalizedText::default();
    for line in folded.split('\n') {
        let mut words = line.split_whitespace().peekable();
        if words.peek().is_none() {
            continue;
        }
        if !out.text.is_empty() {
            out.text.push(' ');
        }
        out.line_starts.push(out.text.len());
        for (i, word) in words.enumerate() {
            if i > 0 {
                out.text.push(' ');
            }
            out.text.push_str(word);
        }
    }

    tracing::trace!(
        lines = out.line_starts.len(),
        bytes = out.text.len(),
        "normalized text"
    );
    out
}

/// Map one character to its normalized form, or drop it.
fn fold_char(c: char) -> Option<char> {
    match c {
        '\n' => Some('\n'),
        '\r' => Some('\n'),
        // Zero-width and invisible format characters.
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}'
        | '\u{FEFF}' => None,
        '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE63}' => Some('-'),
        // Full-width ASCII block.
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0),
        c if c.is_whitespace() => Some(' '),
        c if c.is_control() => None,
        c => Some(c),
    }
}
