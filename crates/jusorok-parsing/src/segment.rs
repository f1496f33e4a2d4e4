//! Splitting one page of text into contact entries.
//!
//! Two boundary signals are recognised:
//!
//! - a **contact line**: a source line that starts with a 2–4 syllable Hangul
//!   token immediately followed by a phone-number-like token;
//! - an **address prefix**: a 시/도 token.
//!
//! A candidate boundary only splits when the entry in progress already holds
//! a signal of the same kind: a phone number for a contact line, a 시/도 for
//! an address prefix. That keeps a name + phone line together with the
//! address that follows it (or precedes it).
//!
//! In an entry that starts with its name and phone, a name + phone seen after
//! the entry's own 시/도 belongs to the next entry, so an address-prefix split
//! is moved back to the start of that name.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::address::sido_ranges;
use crate::normalize::NormalizedText;
use crate::phone::phone_like_ranges;
use crate::span::is_hangul;

/// What opened an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSignal {
    /// First entry of the text.
    Start,
    ContactLine,
    AddressPrefix,
}

impl fmt::Display for SegmentSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentSignal::Start => write!(f, "start"),
            SegmentSignal::ContactLine => write!(f, "contact_line"),
            SegmentSignal::AddressPrefix => write!(f, "address_prefix"),
        }
    }
}

/// One candidate entry: a byte range of the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub signal: SegmentSignal,
}

static CONTACT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[가-힣]{2,4} ?:? ?(?:\+82|0)\d{1,2}[ .-]?\d{3,4}[ .-]?\d{4}").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Event {
    // Declaration order is the tie-break order at equal offsets.
    ContactLine,
    Sido,
    Phone,
}

/// Start of the 2–4 syllable Hangul token written right before `phone`.
fn name_start_before(text: &str, phone: usize) -> Option<usize> {
    let head = text[..phone].trim_end_matches(|c| c == ' ' || c == ':');
    let start = head
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_hangul(c))
        .last()
        .map(|(i, _)| i)?;
    (2..=4).contains(&head[start..].chars().count()).then_some(start)
}

/// Signals seen so far in the entry in progress.
#[derive(Debug, Default)]
struct OpenEntry {
    first_phone: Option<usize>,
    first_sido: Option<usize>,
    /// Latest phone after the first 시/도, when the phone came first.
    trailing_phone: Option<usize>,
}

impl OpenEntry {
    fn see_phone(&mut self, pos: usize) {
        match (self.first_phone, self.first_sido) {
            (None, _) => self.first_phone = Some(pos),
            (Some(phone), Some(sido)) if phone < sido => self.trailing_phone = Some(pos),
            _ => {}
        }
    }

    fn see_sido(&mut self, pos: usize) {
        self.first_sido.get_or_insert(pos);
    }

    fn has_phone(&self) -> bool {
        self.first_phone.is_some()
    }

    fn has_sido(&self) -> bool {
        self.first_sido.is_some()
    }
}

/// Split normalized text into entries, in source order.
///
/// Empty text yields no entries; text without any boundary signal yields
/// exactly one.
pub fn segment(normalized: &NormalizedText) -> Vec<EntrySpan> {
    let text = normalized.text.as_str();
    if text.is_empty() {
        return Vec::new();
    }

    let mut events: Vec<(usize, Event)> = Vec::new();
    events.extend(
        normalized
            .line_starts
            .iter()
            .filter(|&&start| CONTACT_LINE_RE.is_match(&text[start..]))
            .map(|&start| (start, Event::ContactLine)),
    );
    events.extend(sido_ranges(text).into_iter().map(|r| (r.start, Event::Sido)));
    events.extend(
        phone_like_ranges(text)
            .into_iter()
            .map(|r| (r.start, Event::Phone)),
    );
    events.sort();

    let mut boundaries: Vec<(usize, SegmentSignal)> = vec![(0, SegmentSignal::Start)];
    let mut open = OpenEntry::default();
    for (pos, event) in events {
        let current_start = boundaries.last().map_or(0, |b| b.0);
        match event {
            Event::ContactLine => {
                if open.has_phone() && pos > current_start {
                    boundaries.push((pos, SegmentSignal::ContactLine));
                    open = OpenEntry::default();
                }
            }
            Event::Sido => {
                if open.has_sido() && pos > current_start {
                    let moved_back = open.trailing_phone.and_then(|phone| {
                        name_start_before(text, phone)
                            .filter(|&name| open.first_sido.is_some_and(|sido| name > sido))
                            .map(|name| (name, phone))
                    });
                    match moved_back {
                        Some((name, phone)) => {
                            tracing::trace!(name, pos, "moved address-prefix split to name");
                            boundaries.push((name, SegmentSignal::ContactLine));
                            open = OpenEntry::default();
                            open.see_phone(phone);
                        }
                        None => {
                            boundaries.push((pos, SegmentSignal::AddressPrefix));
                            open = OpenEntry::default();
                        }
                    }
                }
                open.see_sido(pos);
            }
            Event::Phone => open.see_phone(pos),
        }
    }

    let spans: Vec<EntrySpan> = boundaries
        .iter()
        .enumerate()
        .map(|(i, &(start, signal))| {
            let raw_end = boundaries.get(i + 1).map_or(text.len(), |b| b.0);
            let end = start + text[start..raw_end].trim_end().len();
            EntrySpan {
                start,
                end,
                text: text[start..end].to_string(),
                signal,
            }
        })
        .collect();

    tracing::debug!(entries = spans.len(), "segmented text");
    spans
}
