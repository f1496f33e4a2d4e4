//! Text quality metrics.
//!
//! These are inputs to the confidence scorer, not confidences themselves.
//! Each resolved field gets `0.5·length + 0.3·script + 0.2·context`, where
//! context is shared by every field of the entry.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use jusorok_core::Field;

use crate::fields::ExtractedFields;
use crate::span::is_hangul;

const LENGTH_WEIGHT: f64 = 0.5;
const SCRIPT_WEIGHT: f64 = 0.3;
const CONTEXT_WEIGHT: f64 = 0.2;

/// Hangul ratio at which a block counts as fully Korean. Addresses carry a
/// lot of digits, so a plain ratio would punish well-formed entries.
const HANGUL_RATIO_SATURATION: f64 = 0.4;

/// Token count of a complete name + phone + address entry.
const EXPECTED_TOKENS: f64 = 6.0;

/// Quality metrics of one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuality {
    /// Hangul syllables / non-whitespace characters.
    pub hangul_ratio: f64,
    /// `min(tokens / 6, 1)`.
    pub token_score: f64,
    /// Mean of the saturated Hangul ratio and the token score.
    pub context: f64,
    /// Quality per resolved field. Fields not listed have quality 0.
    pub fields: BTreeMap<Field, f64>,
    /// Mean of `context` and every resolved field's quality.
    pub overall: f64,
}

impl EntryQuality {
    pub fn field(&self, field: Field) -> f64 {
        self.fields.get(&field).copied().unwrap_or(0.0)
    }

    pub fn to_metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "hangul_ratio": self.hangul_ratio,
            "token_score": self.token_score,
            "overall": self.overall,
        })
    }
}

/// Characters a field's value is expected to consist of.
#[derive(Debug, Clone, Copy)]
enum CharClass {
    Hangul,
    PhoneDigits,
    Numeric,
    /// Hangul, ASCII alphanumerics and spaces.
    Mixed,
}

impl CharClass {
    fn contains(self, c: char) -> bool {
        match self {
            CharClass::Hangul => is_hangul(c),
            CharClass::PhoneDigits => c.is_ascii_digit() || c == '-' || c == '+',
            CharClass::Numeric => c.is_ascii_digit() || c == '-',
            CharClass::Mixed => is_hangul(c) || c.is_ascii_alphanumeric() || c == ' ' || c == '○',
        }
    }
}

/// Plausible length in characters and expected character class per field.
fn profile(field: Field) -> (RangeInclusive<usize>, CharClass) {
    match field {
        Field::Name => (2..=4, CharClass::Hangul),
        Field::Phone => (9..=14, CharClass::PhoneDigits),
        Field::Sido => (2..=7, CharClass::Hangul),
        Field::Sigungu => (2..=10, CharClass::Mixed),
        Field::RoadName => (2..=14, CharClass::Mixed),
        Field::BuildingNumber => (1..=11, CharClass::Numeric),
        Field::Dong => (2..=5, CharClass::Mixed),
        Field::Ho => (2..=7, CharClass::Mixed),
        Field::LegalDong => (2..=8, CharClass::Hangul),
        Field::BuildingName => (3..=20, CharClass::Mixed),
        Field::Floor => (2..=6, CharClass::Mixed),
    }
}

/// 1 inside the range, decaying proportionally outside it.
fn length_score(len: usize, range: &RangeInclusive<usize>) -> f64 {
    let (min, max) = (*range.start(), *range.end());
    if len == 0 {
        0.0
    } else if len < min {
        len as f64 / min as f64
    } else if len > max {
        max as f64 / len as f64
    } else {
        1.0
    }
}

fn script_score(value: &str, class: CharClass) -> f64 {
    let total = value.chars().count();
    if total == 0 {
        return 0.0;
    }
    value.chars().filter(|c| class.contains(*c)).count() as f64 / total as f64
}

/// Hangul syllables / non-whitespace characters; 0 for blank text.
pub fn hangul_ratio(text: &str) -> f64 {
    let (hangul, total) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(h, t), c| {
            (h + usize::from(is_hangul(c)), t + 1)
        });
    if total == 0 {
        0.0
    } else {
        hangul as f64 / total as f64
    }
}

/// Quality of a single field value given the entry's context score.
pub fn field_quality(field: Field, value: &str, context: f64) -> f64 {
    let (range, class) = profile(field);
    let length = length_score(value.chars().count(), &range);
    let script = script_score(value, class);
    (LENGTH_WEIGHT * length + SCRIPT_WEIGHT * script + CONTEXT_WEIGHT * context).clamp(0.0, 1.0)
}

/// Analyze one entry block and its extracted fields.
pub fn analyze(block: &str, fields: &ExtractedFields) -> EntryQuality {
    let hangul_ratio = hangul_ratio(block);
    let token_score = (block.split_whitespace().count() as f64 / EXPECTED_TOKENS).min(1.0);
    let context = ((hangul_ratio / HANGUL_RATIO_SATURATION).min(1.0) + token_score) / 2.0;

    let field_scores: BTreeMap<Field, f64> = fields
        .matches
        .iter()
        .map(|(field, m)| (*field, field_quality(*field, &m.value, context)))
        .collect();

    let overall = (context + field_scores.values().sum::<f64>()) / (1 + field_scores.len()) as f64;

    EntryQuality {
        hangul_ratio,
        token_score,
        context,
        fields: field_scores,
        overall,
    }
}
