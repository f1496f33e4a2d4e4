//! Packaging scored entries into a [`MultiEntryResult`].

use std::collections::BTreeMap;

use jusorok_core::{AddressComponents, ContactEntry, Field, MultiEntryResult};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::ExtractionConfig;
use crate::fields::ExtractedFields;
use crate::normalize::NormalizedText;
use crate::quality::EntryQuality;
use crate::review::ReviewReason;
use crate::segment::EntrySpan;

/// One entry after extraction, quality analysis, scoring and review.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub span: EntrySpan,
    pub fields: ExtractedFields,
    pub quality: EntryQuality,
    /// Confidence for every field of [`Field::ALL`].
    pub confidence: BTreeMap<Field, f64>,
    pub aggregate: f64,
    pub reasons: Vec<ReviewReason>,
    pub human_review: bool,
}

/// Deterministic id for a normalized text.
pub fn derive_image_id(normalized: &NormalizedText) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, normalized.text.as_bytes()).to_string()
}

fn confidence_map<'a>(
    confidence: &BTreeMap<Field, f64>,
    fields: impl IntoIterator<Item = &'a Field>,
) -> BTreeMap<String, f64> {
    fields
        .into_iter()
        .map(|f| {
            (
                f.key().to_string(),
                confidence.get(f).copied().unwrap_or(0.0),
            )
        })
        .collect()
}

fn build_address(scored: &ScoredEntry) -> Option<AddressComponents> {
    if !scored.fields.has_address() {
        return None;
    }
    let mut address = AddressComponents {
        confidence: confidence_map(&scored.confidence, &Field::ADDRESS),
        human_review: scored.reasons.iter().any(|r| r.is_address()),
        ..Default::default()
    };
    for field in Field::ADDRESS {
        if let Some(slot) = address.slot_mut(field) {
            *slot = scored.fields.value(field).map(str::to_string);
        }
    }
    Some(address)
}

fn build_entry(index: usize, scored: &ScoredEntry) -> ContactEntry {
    ContactEntry {
        name: scored.fields.value(Field::Name).map(str::to_string),
        phone_number: scored.fields.value(Field::Phone).map(str::to_string),
        phone_type: scored.fields.phone_type,
        address: build_address(scored),
        confidence: confidence_map(&scored.confidence, &Field::ALL),
        entry_number: index + 1,
        human_review: scored.human_review,
    }
}

/// Build the final result. Entries keep the order of `scored`.
pub fn assemble(
    normalized: &NormalizedText,
    scored: &[ScoredEntry],
    config: &ExtractionConfig,
    image_id: Option<String>,
) -> MultiEntryResult {
    let entries: Vec<ContactEntry> = scored
        .iter()
        .enumerate()
        .map(|(i, s)| build_entry(i, s))
        .collect();

    let mut metadata: BTreeMap<String, Value> = BTreeMap::new();
    metadata.insert("normalized_text".into(), json!(normalized.text));
    metadata.insert("line_starts".into(), json!(normalized.line_starts));
    metadata.insert(
        "segment_boundaries".into(),
        Value::Array(
            scored
                .iter()
                .map(|s| {
                    json!({
                        "start": s.span.start,
                        "end": s.span.end,
                        "signal": s.span.signal.to_string(),
                    })
                })
                .collect(),
        ),
    );
    metadata.insert(
        "entry_quality".into(),
        Value::Array(scored.iter().map(|s| s.quality.to_metadata()).collect()),
    );
    metadata.insert(
        "review_reasons".into(),
        Value::Array(
            scored
                .iter()
                .map(|s| json!(s.reasons.iter().map(|r| r.to_string()).collect::<Vec<_>>()))
                .collect(),
        ),
    );
    metadata.insert("config".into(), config.to_metadata());

    let image_id = image_id.unwrap_or_else(|| derive_image_id(normalized));

    MultiEntryResult {
        total_entries: entries.len(),
        entries,
        processing_metadata: metadata,
        image_id,
    }
}
