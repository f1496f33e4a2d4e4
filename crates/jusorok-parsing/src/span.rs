use std::ops::Range;

use regex::{Captures, Regex};

/// One entry block with the byte ranges already claimed by earlier rules.
///
/// Rules run in a fixed order and each successful match consumes its range,
/// so later rules never see text an earlier rule already explained.
#[derive(Debug, Clone)]
pub(crate) struct RemainingSpan<'a> {
    text: &'a str,
    consumed: Vec<Range<usize>>,
}

impl<'a> RemainingSpan<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            consumed: Vec::new(),
        }
    }

    pub(crate) fn text(&self) -> &'a str {
        self.text
    }

    pub(crate) fn consume(&mut self, range: Range<usize>) {
        self.consumed.push(range);
    }

    /// `true` if no byte of `range` has been consumed.
    pub(crate) fn is_free(&self, range: &Range<usize>) -> bool {
        self.consumed
            .iter()
            .all(|c| c.end <= range.start || range.end <= c.start)
    }

    /// First match of `re` starting at or after `from` whose whole range is
    /// free and which passes `accept`.
    ///
    /// Retries from the next character after a rejected start, so a rejected
    /// match never hides an overlapping later one.
    pub(crate) fn find_free(
        &self,
        re: &Regex,
        from: usize,
        accept: impl Fn(&Captures<'a>) -> bool,
    ) -> Option<Captures<'a>> {
        self.find_free_group(re, from, 0, accept)
    }

    /// Like [`find_free`](Self::find_free), but only capture `group` has to
    /// be free. Used when the surrounding punctuation may already be claimed.
    pub(crate) fn find_free_group(
        &self,
        re: &Regex,
        from: usize,
        group: usize,
        accept: impl Fn(&Captures<'a>) -> bool,
    ) -> Option<Captures<'a>> {
        let mut pos = from;
        while pos <= self.text.len() {
            let caps = re.captures_at(self.text, pos)?;
            let whole = caps.get(0)?;
            let free = caps
                .get(group)
                .is_some_and(|m| self.is_free(&m.range()));
            if free && accept(&caps) {
                return Some(caps);
            }
            pos = next_char_boundary(self.text, whole.start());
        }
        None
    }
}

/// Offset of the character after the one starting at `pos`.
pub(crate) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}

pub(crate) fn char_before(text: &str, pos: usize) -> Option<char> {
    text[..pos].chars().next_back()
}

pub(crate) fn char_after(text: &str, pos: usize) -> Option<char> {
    text[pos..].chars().next()
}

pub(crate) fn is_hangul(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// `true` when `c` would continue a word (Hangul syllable or ASCII alphanumeric).
pub(crate) fn is_word_char(c: char) -> bool {
    is_hangul(c) || c.is_ascii_alphanumeric()
}
