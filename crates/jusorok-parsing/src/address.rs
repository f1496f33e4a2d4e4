//! Address cascade.
//!
//! `시/도 → 시/군/구 → 도로명 → 건물번호 → 동 → 호 → 법정동 → 건물명 → 층`
//!
//! The head stages (시/도 through 건물번호) scan forward from the end of the
//! previous head match. The tail stages scan whatever is still unconsumed
//! from the first head match onwards. A missing stage leaves its field empty and
//! never stops the stages after it.

use std::collections::BTreeMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use jusorok_core::Field;
use jusorok_core::gazetteer::{SIDO_FORMS, sido_form};

use crate::config::{DEFAULT_BUILDING_SUFFIXES, ExtractionConfig};
use crate::fields::{FieldMatch, MatchStrength};
use crate::span::{RemainingSpan, char_after, char_before, is_hangul, is_word_char};

static SIDO_RE: Lazy<Regex> = Lazy::new(|| {
    let mut forms: Vec<&str> = SIDO_FORMS.iter().map(|f| f.text).collect();
    // Longest first so that `서울특별시` wins over `서울`.
    forms.sort_by_key(|f| std::cmp::Reverse(f.chars().count()));
    let alternation = forms
        .iter()
        .map(|f| regex::escape(f))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?:{alternation})")).unwrap()
});

static SIGUNGU_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣]{1,10}(?:시|군|구)(?: [가-힣]{1,10}구)?").unwrap());

static ROAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[가-힣][가-힣A-Za-z0-9]*(?:대로|로|길)(?: ?\d+(?:번)? ?(?:길|로))?").unwrap()
});

static BUILDING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,5}(?:-\d{1,5})?)(?: ?(번지))?").unwrap());

static DONG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,4}|[A-Za-z]) ?동").unwrap());

static HO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z]?\d{1,5}) ?호").unwrap());

static PAREN_LEGAL_DONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\( ?([가-힣]+\d*동)").unwrap());

static BARE_LEGAL_DONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣]{1,8}\d{0,2}동").unwrap());

static PAREN_BUILDING_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\( ?[^,()]*, ?([^,()]*[^,() ])").unwrap());

static FLOOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(지하 ?\d{1,2}|[Bb]\d{1,2}|\d{1,3}) ?층").unwrap());

pub(crate) static DEFAULT_BUILDING_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    let suffixes: Vec<String> = DEFAULT_BUILDING_SUFFIXES
        .iter()
        .map(|s| s.to_string())
        .collect();
    building_name_regex(&suffixes).unwrap()
});

/// Compile the building-name pattern for a set of suffixes.
pub fn building_name_regex(suffixes: &[String]) -> Result<Regex, regex::Error> {
    let mut sorted: Vec<&String> = suffixes.iter().collect();
    sorted.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    let alternation = sorted
        .iter()
        .map(|s| regex::escape(s.trim()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("[가-힣A-Za-z0-9○]+(?:{alternation})"))
}

/// Building-name pattern for `config`.
pub(crate) fn building_name_re(config: &ExtractionConfig) -> &Regex {
    config
        .building_name_re
        .as_ref()
        .unwrap_or(&*DEFAULT_BUILDING_NAME_RE)
}

/// Append the field's suffix unless the value already ends with it.
///
/// Whitespace inside suffixed components is dropped (`103 동` → `103동`).
/// Fields without a suffix are only trimmed.
pub fn format_component(field: Field, raw: &str) -> String {
    match field.suffix() {
        Some(suffix) => {
            let mut value: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            if !value.ends_with(suffix) {
                value.push(suffix);
            }
            value
        }
        None => raw.trim().to_string(),
    }
}

fn not_word_before(text: &str, pos: usize) -> bool {
    char_before(text, pos).is_none_or(|c| !is_word_char(c))
}

fn not_hangul_after(text: &str, pos: usize) -> bool {
    char_after(text, pos).is_none_or(|c| !is_hangul(c))
}

fn whole(caps: &Captures) -> Range<usize> {
    caps.get(0).map_or(0..0, |m| m.range())
}

fn group(caps: &Captures, i: usize) -> Range<usize> {
    caps.get(i).map_or(0..0, |m| m.range())
}

fn sido_accept(text: &str, caps: &Captures) -> bool {
    let range = whole(caps);
    match sido_form(&text[range.clone()]) {
        Some(form) if form.official => true,
        // Short forms like `서울` or `광주` only count as whole tokens.
        Some(_) => {
            char_before(text, range.start).is_none_or(|c| !is_hangul(c))
                && not_hangul_after(text, range.end)
        }
        None => false,
    }
}

/// First unconsumed 시/도 token of the span.
pub(crate) fn first_sido(span: &RemainingSpan) -> Option<Range<usize>> {
    let text = span.text();
    span.find_free(&SIDO_RE, 0, |caps| sido_accept(text, caps))
        .map(|caps| whole(&caps))
}

/// Every 시/도 token of `text`, in source order.
pub fn sido_ranges(text: &str) -> Vec<Range<usize>> {
    let mut span = RemainingSpan::new(text);
    let mut found = Vec::new();
    while let Some(range) = first_sido(&span) {
        span.consume(range.clone());
        found.push(range);
    }
    found
}

/// Collects matches and claims their ranges in the span.
struct Cascade<'s, 'a> {
    span: &'s mut RemainingSpan<'a>,
    found: BTreeMap<Field, FieldMatch>,
}

impl Cascade<'_, '_> {
    fn record(&mut self, field: Field, value: String, strength: MatchStrength, range: Range<usize>) {
        self.span.consume(range.clone());
        self.found.insert(
            field,
            FieldMatch {
                value,
                strength,
                range,
            },
        );
    }
}

/// Run the cascade over one entry span, consuming every matched range.
pub(crate) fn extract_address(
    span: &mut RemainingSpan,
    building_name_re: &Regex,
) -> BTreeMap<Field, FieldMatch> {
    let text = span.text();
    let mut cascade = Cascade {
        span,
        found: BTreeMap::new(),
    };
    let mut anchor = 0;
    let mut sido_end = None;

    // ── Head: 시/도 ──
    if let Some(range) = first_sido(cascade.span) {
        let official = sido_form(&text[range.clone()]).is_some_and(|f| f.official);
        let strength = if official {
            MatchStrength::Full
        } else {
            MatchStrength::Partial
        };
        anchor = range.end;
        sido_end = Some(range.end);
        cascade.record(Field::Sido, text[range.clone()].to_string(), strength, range);
    }

    // ── Head: 시/군/구 ──
    if let Some(caps) = cascade.span.find_free(&SIGUNGU_RE, anchor, |caps| {
        let range = whole(caps);
        let first_token = text[range.clone()].split(' ').next().unwrap_or_default();
        // OCR often drops the space after the 시/도.
        let glued_to_sido = sido_end == Some(range.start);
        (glued_to_sido || char_before(text, range.start).is_none_or(|c| !is_hangul(c)))
            && not_hangul_after(text, range.end)
            && sido_form(first_token).is_none()
    }) {
        let range = whole(&caps);
        anchor = range.end;
        cascade.record(
            Field::Sigungu,
            text[range.clone()].to_string(),
            MatchStrength::Full,
            range,
        );
    }

    // ── Head: 도로명 ──
    if let Some(caps) = cascade.span.find_free(&ROAD_RE, anchor, |caps| {
        let range = whole(caps);
        not_word_before(text, range.start) && not_hangul_after(text, range.end)
    }) {
        let range = whole(&caps);
        anchor = range.end;
        cascade.record(
            Field::RoadName,
            text[range.clone()].to_string(),
            MatchStrength::Full,
            range,
        );
    }

    // ── Head: 건물번호 ── (needs some address context before it)
    let has_head = !cascade.found.is_empty();
    if has_head
        && let Some(caps) = cascade.span.find_free(&BUILDING_NUMBER_RE, anchor, |caps| {
            let range = whole(caps);
            let before_ok = char_before(text, range.start)
                .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '-'));
            let after_ok = char_after(text, range.end)
                .is_none_or(|c| !(c.is_ascii_digit() || c == '-' || is_hangul(c)));
            before_ok && after_ok
        })
    {
        let by_lot = caps.get(2).is_some();
        let strength = if cascade.found.contains_key(&Field::RoadName) && !by_lot {
            MatchStrength::Full
        } else {
            MatchStrength::Partial
        };
        cascade.record(
            Field::BuildingNumber,
            caps[1].to_string(),
            strength,
            whole(&caps),
        );
    }

    // Tail stages look at everything unconsumed from the first head match on.
    let anchor = cascade
        .found
        .values()
        .map(|m| m.range.start)
        .min()
        .unwrap_or(0);

    // ── Tail: 동, 호 ──
    for (field, re) in [(Field::Dong, &*DONG_RE), (Field::Ho, &*HO_RE)] {
        if let Some(caps) = cascade.span.find_free(re, anchor, |caps| {
            let range = whole(caps);
            not_word_before(text, range.start)
                && (field == Field::Ho || not_hangul_after(text, range.end))
        }) {
            cascade.record(
                field,
                format_component(field, &caps[1]),
                MatchStrength::Full,
                whole(&caps),
            );
        }
    }

    // ── Tail: 법정동 ──
    if let Some(caps) = cascade
        .span
        .find_free_group(&PAREN_LEGAL_DONG_RE, anchor, 1, |_| true)
    {
        cascade.record(
            Field::LegalDong,
            format_component(Field::LegalDong, &caps[1]),
            MatchStrength::Full,
            group(&caps, 1),
        );
    } else if has_head
        && let Some(caps) = cascade.span.find_free(&BARE_LEGAL_DONG_RE, anchor, |caps| {
            let range = whole(caps);
            char_before(text, range.start).is_none_or(|c| !is_word_char(c))
                && char_after(text, range.end).is_none_or(|c| !is_word_char(c))
        })
    {
        cascade.record(
            Field::LegalDong,
            format_component(Field::LegalDong, &caps[0]),
            MatchStrength::Partial,
            whole(&caps),
        );
    }

    // ── Tail: 건물명 ──
    if let Some(caps) = cascade.span.find_free(building_name_re, anchor, |caps| {
        char_before(text, whole(caps).start).is_none_or(|c| !(is_word_char(c) || c == '○'))
    }) {
        cascade.record(
            Field::BuildingName,
            caps[0].to_string(),
            MatchStrength::Full,
            whole(&caps),
        );
    } else if let Some(caps) =
        cascade
            .span
            .find_free_group(&PAREN_BUILDING_NAME_RE, anchor, 1, |_| true)
    {
        cascade.record(
            Field::BuildingName,
            caps[1].trim().to_string(),
            MatchStrength::Partial,
            group(&caps, 1),
        );
    }

    // ── Tail: 층 ──
    if let Some(caps) = cascade.span.find_free(&FLOOR_RE, anchor, |caps| {
        not_word_before(text, whole(caps).start)
    }) {
        cascade.record(
            Field::Floor,
            format_component(Field::Floor, &caps[1]),
            MatchStrength::Full,
            whole(&caps),
        );
    }

    cascade.found
}
