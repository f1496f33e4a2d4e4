use std::ops::Range;

use jusorok_core::gazetteer::sido_form;

use crate::fields::{FieldMatch, MatchStrength};
use crate::span::{RemainingSpan, is_hangul};

/// Honorifics written after a name (`김철수 님`).
const HONORIFICS: &[&str] = &["님", "씨", "귀하"];

/// Endings of administrative and road tokens that are never taken as names.
const ADDRESS_ENDINGS: &[char] = &['시', '군', '구', '로', '길', '층'];

/// Maximal runs of Hangul syllables, in source order.
fn hangul_runs(text: &str) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (is_hangul(c), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..text.len());
    }
    runs
}

fn looks_like_address(token: &str) -> bool {
    sido_form(token).is_some()
        || token.ends_with("번지")
        || token.chars().last().is_some_and(|c| ADDRESS_ENDINGS.contains(&c))
}

/// Start of the stretch before `limit` that may hold the name: Hangul words,
/// spaces and label colons, back to the nearest other character.
fn window_start(text: &str, limit: usize) -> usize {
    text[..limit]
        .char_indices()
        .rev()
        .find(|&(_, c)| !(is_hangul(c) || c == ' ' || c == ':'))
        .map_or(0, |(i, c)| i + c.len_utf8())
}

fn is_plausible_name(token: &str) -> bool {
    (2..=4).contains(&token.chars().count()) && !looks_like_address(token)
}

/// Find the person's name in an entry span.
///
/// The name is the longest plausible 2–4 syllable Hangul token before the
/// phone number, with the nearer token winning a tie. Form labels and
/// honorifics are skipped. The search stops at the nearest address token or
/// non-Hangul character. Without a phone number the 시/도 start is the anchor
/// and the match is partial.
pub(crate) fn find_name(
    span: &RemainingSpan,
    phone_start: Option<usize>,
    sido_start: Option<usize>,
    labels: &[String],
) -> Option<FieldMatch> {
    let (limit, strength) = match (phone_start, sido_start) {
        (Some(p), _) => (p, MatchStrength::Full),
        (None, Some(s)) => (s, MatchStrength::Partial),
        (None, None) => return None,
    };

    let text = span.text();
    let start = window_start(text, limit);
    let mut best: Option<Range<usize>> = None;
    for run in hangul_runs(&text[start..limit]).into_iter().rev() {
        let run = start + run.start..start + run.end;
        let token = &text[run.clone()];
        if !span.is_free(&run) || labels.iter().any(|l| l == token) || HONORIFICS.contains(&token)
        {
            continue;
        }
        if looks_like_address(token) {
            break;
        }
        let longer = best
            .as_ref()
            .is_none_or(|b| token.chars().count() > text[b.clone()].chars().count());
        if is_plausible_name(token) && longer {
            best = Some(run);
        }
    }

    let Some(range) = best else {
        tracing::trace!(limit, "no plausible name before anchor");
        return None;
    };
    Some(FieldMatch {
        value: text[range.clone()].to_string(),
        strength,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NAME_LABELS;

    fn labels() -> Vec<String> {
        DEFAULT_NAME_LABELS.iter().map(|s| s.to_string()).collect()
    }

    fn name_before(text: &str, marker: &str) -> Option<String> {
        let span = RemainingSpan::new(text);
        find_name(&span, text.find(marker), None, &labels()).map(|m| m.value)
    }

    #[test]
    fn test_nearest_token_before_phone() {
        assert_eq!(
            name_before("서울특별시 성북구 김철수 010-1234-5678", "010"),
            Some("김철수".to_string())
        );
    }

    #[test]
    fn test_labels_and_honorifics_are_skipped() {
        assert_eq!(
            name_before("성명: 이영희 님 전화: 010-1234-5678", "010"),
            Some("이영희".to_string())
        );
    }

    #[test]
    fn test_stray_syllable_does_not_hide_name() {
        assert_eq!(
            name_before("김철수 집 010-1234-5678", "010"),
            Some("김철수".to_string())
        );
    }

    #[test]
    fn test_longest_token_wins_nearest_breaks_ties() {
        assert_eq!(
            name_before("남궁민수 자택 010-1234-5678", "010"),
            Some("남궁민수".to_string())
        );
        assert_eq!(
            name_before("자택 김철수 010-1234-5678", "010"),
            Some("김철수".to_string())
        );
    }

    #[test]
    fn test_search_stops_at_address_and_punctuation() {
        assert_eq!(
            name_before("(하월곡동, 아파트) 김철수 010-1234-5678", "010"),
            Some("김철수".to_string())
        );
        assert_eq!(name_before("남궁민수 성북구 집 010-1234-5678", "010"), None);
    }

    #[test]
    fn test_long_token_rejected_not_truncated() {
        assert_eq!(name_before("남궁민수철 010-1234-5678", "010"), None);
    }

    #[test]
    fn test_address_token_is_not_a_name() {
        assert_eq!(name_before("서울특별시 성북구 010-1234-5678", "010"), None);
        assert_eq!(name_before("화랑로 11길 26 010-1234-5678", "010"), None);
    }

    #[test]
    fn test_sido_anchor_gives_partial_match() {
        let text = "최지우 경기도 성남시";
        let span = RemainingSpan::new(text);
        let m = find_name(&span, None, text.find("경기도"), &labels()).unwrap();
        assert_eq!(m.value, "최지우");
        assert_eq!(m.strength, MatchStrength::Partial);
    }

    #[test]
    fn test_no_anchor_no_name() {
        let span = RemainingSpan::new("김철수");
        assert!(find_name(&span, None, None, &labels()).is_none());
    }

    #[test]
    fn test_hangul_runs() {
        let text = "김철수:010 A동";
        let runs: Vec<&str> = hangul_runs(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(runs, vec!["김철수", "동"]);
    }
}
