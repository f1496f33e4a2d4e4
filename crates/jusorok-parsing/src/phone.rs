//! Korean phone number recognition.
//!
//! Three rules run in order: mobile (`010`), landline (area code `02` or
//! `0[3-6][1-5]`), and any other `0`-led run of 9 to 12 digits. The first
//! rule with an acceptable match wins. A match is never taken from inside a
//! longer digit run.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use jusorok_core::PhoneType;

use crate::span::{RemainingSpan, char_after, char_before};

/// A recognized phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneMatch {
    pub range: Range<usize>,
    /// Hyphenated canonical form for mobile and landline numbers, the
    /// matched text for unknown ones.
    pub number: String,
    pub kind: PhoneType,
}

static MOBILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+82[ .-]?0?|0)10[ .-]?(\d{3,4})[ .-]?(\d{4})").unwrap()
});

static LANDLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?(02|0[3-6][1-5])\)?[ .-]?(\d{3,4})[ .-]?(\d{4})").unwrap()
});

// Spaces are not accepted as separators here: they would let the run swallow
// a neighbouring building number.
static UNKNOWN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"0(?:[.-]?\d){8,11}").unwrap());

fn rules() -> [(&'static Regex, PhoneType); 3] {
    [
        (&*MOBILE_RE, PhoneType::Cellphone),
        (&*LANDLINE_RE, PhoneType::Landline),
        (&*UNKNOWN_RE, PhoneType::Unknown),
    ]
}

/// `true` when the match does not sit inside a longer digit run.
fn at_digit_boundary(text: &str, caps: &Captures) -> bool {
    let Some(m) = caps.get(0) else {
        return false;
    };
    let before_ok = char_before(text, m.start()).is_none_or(|c| !c.is_ascii_digit());
    let after_ok = char_after(text, m.end()).is_none_or(|c| !c.is_ascii_digit());
    before_ok && after_ok
}

fn to_match(caps: &Captures, kind: PhoneType) -> Option<PhoneMatch> {
    let whole = caps.get(0)?;
    let number = match kind {
        PhoneType::Cellphone => format!("010-{}-{}", &caps[1], &caps[2]),
        PhoneType::Landline => format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]),
        PhoneType::Unknown => whole.as_str().to_string(),
    };
    Some(PhoneMatch {
        range: whole.range(),
        number,
        kind,
    })
}

/// Find the phone number of one entry block, trying the rules in order.
pub(crate) fn find_phone(span: &RemainingSpan) -> Option<PhoneMatch> {
    let text = span.text();
    rules().into_iter().find_map(|(re, kind)| {
        span.find_free(re, 0, |caps| at_digit_boundary(text, caps))
            .and_then(|caps| to_match(&caps, kind))
    })
}

/// Extract the phone number of a block of normalized text.
pub fn extract_phone(text: &str) -> Option<PhoneMatch> {
    find_phone(&RemainingSpan::new(text))
}

/// Every phone-like token in `text`, in source order, without overlaps.
///
/// Used by the segmenter, which only needs positions.
pub fn phone_like_ranges(text: &str) -> Vec<Range<usize>> {
    let mut found: Vec<Range<usize>> = Vec::new();
    for (re, _) in rules() {
        for caps in re.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let range = m.range();
            if at_digit_boundary(text, &caps)
                && found
                    .iter()
                    .all(|r| r.end <= range.start || range.end <= r.start)
            {
                found.push(range);
            }
        }
    }
    found.sort_by_key(|r| r.start);
    found
}
