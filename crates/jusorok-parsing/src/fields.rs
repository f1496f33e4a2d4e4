//! Per-entry field extraction.
//!
//! Rules run in a fixed order over a shrinking [`RemainingSpan`]: the phone
//! number first, then the name, then the address cascade. Extraction never
//! fails; an entry where nothing matched is still a valid result.

use std::collections::BTreeMap;
use std::ops::Range;

use jusorok_core::{Field, PhoneType};

use crate::config::ExtractionConfig;
use crate::span::RemainingSpan;
use crate::{address, name, phone};

/// How well a rule's pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrength {
    /// Canonical pattern.
    Full,
    /// Alias, fallback or ambiguous pattern.
    Partial,
}

impl MatchStrength {
    /// Numeric strength given the configured partial value.
    pub fn value(self, partial: f64) -> f64 {
        match self {
            MatchStrength::Full => 1.0,
            MatchStrength::Partial => partial,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStrength::Full => "full",
            MatchStrength::Partial => "partial",
        }
    }
}

/// One extracted value with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub value: String,
    pub strength: MatchStrength,
    /// Byte range in the entry text.
    pub range: Range<usize>,
}

/// Everything the rules found in one entry block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub matches: BTreeMap<Field, FieldMatch>,
    /// `None` only when no phone number was found.
    pub phone_type: Option<PhoneType>,
}

impl ExtractedFields {
    pub fn get(&self, field: Field) -> Option<&FieldMatch> {
        self.matches.get(&field)
    }

    pub fn value(&self, field: Field) -> Option<&str> {
        self.get(field).map(|m| m.value.as_str())
    }

    pub fn has(&self, field: Field) -> bool {
        self.matches.contains_key(&field)
    }

    /// `true` if at least one address component resolved.
    pub fn has_address(&self) -> bool {
        self.matches.keys().any(|f| f.is_address())
    }

    pub(crate) fn insert(&mut self, field: Field, m: FieldMatch) {
        self.matches.insert(field, m);
    }
}

/// Extract name, phone and address components from one entry block.
pub fn extract_fields(block: &str, config: &ExtractionConfig) -> ExtractedFields {
    let mut span = RemainingSpan::new(block);
    let mut fields = ExtractedFields::default();

    let phone = phone::find_phone(&span);
    if let Some(phone) = &phone {
        span.consume(phone.range.clone());
        let strength = match phone.kind {
            PhoneType::Unknown => MatchStrength::Partial,
            _ => MatchStrength::Full,
        };
        fields.insert(
            Field::Phone,
            FieldMatch {
                value: phone.number.clone(),
                strength,
                range: phone.range.clone(),
            },
        );
        fields.phone_type = Some(phone.kind);
    }

    let sido_start = address::first_sido(&span).map(|r| r.start);
    let labels = config.name_labels();
    if let Some(found) = name::find_name(
        &span,
        phone.as_ref().map(|p| p.range.start),
        sido_start,
        &labels,
    ) {
        span.consume(found.range.clone());
        fields.insert(Field::Name, found);
    }

    for (field, m) in address::extract_address(&mut span, address::building_name_re(config)) {
        fields.insert(field, m);
    }

    tracing::trace!(
        resolved = fields.matches.len(),
        phone_type = ?fields.phone_type,
        "extracted fields"
    );
    fields
}
