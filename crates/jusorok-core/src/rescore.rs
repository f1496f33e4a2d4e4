//! Optional re-scoring of an assembled result.
//!
//! A re-scorer (for instance an LLM-backed validator) sees the finished
//! [`MultiEntryResult`] and may only adjust confidence values and review
//! flags. [`apply_rescorer`] enforces that contract: whatever the re-scorer
//! returns, extracted values, entry numbering and identifiers come from the
//! original result.

use crate::gazetteer::{canonical_road, canonical_sido, districts_of, roads_of};
use crate::{ContactEntry, Field, MultiEntryResult};

/// A re-scoring stage run after assembly.
pub trait Rescorer: Send + Sync {
    /// Short name recorded in the result metadata.
    fn name(&self) -> &str;

    /// Return a copy of `result` with adjusted confidences and review flags.
    fn rescore(&self, result: MultiEntryResult) -> MultiEntryResult;
}

/// Fallback used when no re-scoring capability is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRescorer;

impl Rescorer for NoopRescorer {
    fn name(&self) -> &str {
        "noop"
    }

    fn rescore(&self, result: MultiEntryResult) -> MultiEntryResult {
        result
    }
}

/// Mock validator backed by the static [`gazetteer`](crate::gazetteer) tables.
///
/// Components found in the tables are raised to full confidence. A 시/군/구
/// or road missing from a table that covers its parent is capped at
/// `unvalidated_cap` and the entry is flagged.
#[derive(Debug, Clone)]
pub struct GazetteerRescorer {
    pub unvalidated_cap: f64,
}

impl Default for GazetteerRescorer {
    fn default() -> Self {
        Self {
            unvalidated_cap: 0.3,
        }
    }
}

impl GazetteerRescorer {
    fn rescore_entry(&self, entry: &mut ContactEntry) {
        let Some(address) = entry.address.as_ref() else {
            return;
        };
        let sido = address.sido.clone();
        let sigungu = address.sigungu.clone();
        let road_name = address.road_name.clone();

        let Some(canonical) = sido.as_deref().and_then(canonical_sido) else {
            return;
        };
        set_confidence(entry, Field::Sido, 1.0);

        let (Some(districts), Some(sigungu)) = (districts_of(canonical), sigungu) else {
            return;
        };
        let district = sigungu.split_whitespace().next().unwrap_or(&sigungu);
        if !districts.contains(&district) {
            tracing::debug!(entry = entry.entry_number, district, "district not in gazetteer");
            self.cap(entry, Field::Sigungu);
            return;
        }
        set_confidence(entry, Field::Sigungu, 1.0);

        let (Some(roads), Some(road_name)) = (roads_of(canonical, district), road_name) else {
            return;
        };
        if canonical_road(roads, &road_name).is_some() {
            set_confidence(entry, Field::RoadName, 1.0);
        } else {
            tracing::debug!(entry = entry.entry_number, road = %road_name, "road not in gazetteer");
            self.cap(entry, Field::RoadName);
        }
    }

    fn cap(&self, entry: &mut ContactEntry, field: Field) {
        let capped = entry.field_confidence(field).min(self.unvalidated_cap);
        set_confidence(entry, field, capped);
        entry.human_review = true;
        if let Some(address) = entry.address.as_mut() {
            address.human_review = true;
        }
    }
}

impl Rescorer for GazetteerRescorer {
    fn name(&self) -> &str {
        "gazetteer"
    }

    fn rescore(&self, mut result: MultiEntryResult) -> MultiEntryResult {
        for entry in &mut result.entries {
            self.rescore_entry(entry);
        }
        result
    }
}

fn set_confidence(entry: &mut ContactEntry, field: Field, value: f64) {
    entry.confidence.insert(field.key().to_string(), value);
    if field.is_address()
        && let Some(address) = entry.address.as_mut()
    {
        address.confidence.insert(field.key().to_string(), value);
    }
}

/// Run `rescorer` on `original`, keeping only the changes it is allowed to make.
pub fn apply_rescorer(rescorer: &dyn Rescorer, original: MultiEntryResult) -> MultiEntryResult {
    let baseline = original.clone();
    let candidate = rescorer.rescore(original);

    if candidate.entries.len() != baseline.entries.len() {
        tracing::warn!(
            rescorer = rescorer.name(),
            expected = baseline.entries.len(),
            got = candidate.entries.len(),
            "rescorer changed the entry list, ignoring its output"
        );
        return baseline;
    }

    let mut restored_values = 0usize;
    let mut merged = baseline.clone();
    for (out, cand) in merged.entries.iter_mut().zip(&candidate.entries) {
        if Field::ALL
            .iter()
            .any(|f| out.field_value(*f) != cand.field_value(*f))
            || out.phone_type != cand.phone_type
        {
            restored_values += 1;
        }

        merge_confidences(&mut out.confidence, &cand.confidence);
        out.human_review = cand.human_review;

        if let (Some(out_addr), Some(cand_addr)) = (out.address.as_mut(), cand.address.as_ref()) {
            merge_confidences(&mut out_addr.confidence, &cand_addr.confidence);
            out_addr.human_review = cand_addr.human_review;
        }
    }

    if restored_values > 0 {
        tracing::warn!(
            rescorer = rescorer.name(),
            entries = restored_values,
            "rescorer altered extracted values, originals kept"
        );
    }

    merged.processing_metadata.insert(
        "rescorer".to_string(),
        serde_json::Value::String(rescorer.name().to_string()),
    );
    merged
}

/// Take finite values for keys already present in `out`, clamped to [0, 1].
fn merge_confidences(
    out: &mut std::collections::BTreeMap<String, f64>,
    candidate: &std::collections::BTreeMap<String, f64>,
) {
    for (key, value) in out.iter_mut() {
        if let Some(v) = candidate.get(key).copied().filter(|v| v.is_finite()) {
            *value = v.clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{AddressComponents, PhoneType};

    fn confidence_map(fields: &[Field], value: f64) -> BTreeMap<String, f64> {
        fields.iter().map(|f| (f.key().to_string(), value)).collect()
    }

    fn entry(sido: &str, sigungu: &str, road: &str) -> ContactEntry {
        let address = AddressComponents {
            sido: Some(sido.to_string()),
            sigungu: Some(sigungu.to_string()),
            road_name: Some(road.to_string()),
            building_number: Some("21".to_string()),
            confidence: confidence_map(&Field::ADDRESS, 0.7),
            ..Default::default()
        };
        ContactEntry {
            name: Some("김철수".to_string()),
            phone_number: Some("010-1234-5678".to_string()),
            phone_type: Some(PhoneType::Cellphone),
            address: Some(address),
            confidence: confidence_map(&Field::ALL, 0.7),
            entry_number: 1,
            human_review: false,
        }
    }

    fn result_of(entries: Vec<ContactEntry>) -> MultiEntryResult {
        MultiEntryResult {
            total_entries: entries.len(),
            entries,
            processing_metadata: BTreeMap::new(),
            image_id: "fixed".to_string(),
        }
    }

    #[test]
    fn noop_keeps_everything_but_records_name() {
        let original = result_of(vec![entry("서울특별시", "강남구", "테헤란로")]);
        let out = apply_rescorer(&NoopRescorer, original.clone());
        assert_eq!(out.entries, original.entries);
        assert_eq!(
            out.processing_metadata.get("rescorer"),
            Some(&serde_json::Value::String("noop".into()))
        );
    }

    #[test]
    fn gazetteer_validates_known_components() {
        let original = result_of(vec![entry("서울시", "강남구", "자곡로")]);
        let out = apply_rescorer(&GazetteerRescorer::default(), original);
        let e = &out.entries[0];
        assert_eq!(e.field_confidence(Field::Sido), 1.0);
        assert_eq!(e.field_confidence(Field::Sigungu), 1.0);
        assert_eq!(e.field_confidence(Field::RoadName), 1.0);
        assert_eq!(e.address.as_ref().unwrap().confidence["road_name"], 1.0);
        assert!(!e.human_review);
        // Values are never rewritten, even when an alias was validated.
        assert_eq!(e.field_value(Field::Sido), Some("서울시"));
    }

    #[test]
    fn gazetteer_flags_unlisted_road() {
        let original = result_of(vec![entry("서울특별시", "강남구", "자극로")]);
        let out = apply_rescorer(&GazetteerRescorer::default(), original);
        let e = &out.entries[0];
        assert!(e.field_confidence(Field::RoadName) <= 0.3);
        assert!(e.human_review);
        assert!(e.address.as_ref().unwrap().human_review);
    }

    #[test]
    fn gazetteer_ignores_uncovered_regions() {
        let original = result_of(vec![entry("부산광역시", "해운대구", "해운대로")]);
        let out = apply_rescorer(&GazetteerRescorer::default(), original);
        let e = &out.entries[0];
        assert_eq!(e.field_confidence(Field::Sido), 1.0);
        assert_eq!(e.field_confidence(Field::Sigungu), 0.7);
        assert!(!e.human_review);
    }

    struct Tampering;

    impl Rescorer for Tampering {
        fn name(&self) -> &str {
            "tampering"
        }

        fn rescore(&self, mut result: MultiEntryResult) -> MultiEntryResult {
            for e in &mut result.entries {
                e.name = Some("홍길동".to_string());
                e.entry_number = 99;
                e.confidence.insert("name".to_string(), 7.0);
                e.confidence.insert("extra".to_string(), 0.5);
                e.human_review = true;
            }
            result.image_id = "other".to_string();
            result
        }
    }

    #[test]
    fn contract_restores_values_and_clamps() {
        let original = result_of(vec![entry("서울특별시", "성북구", "화랑로")]);
        let out = apply_rescorer(&Tampering, original);
        let e = &out.entries[0];
        assert_eq!(e.name.as_deref(), Some("김철수"));
        assert_eq!(e.entry_number, 1);
        assert_eq!(out.image_id, "fixed");
        assert_eq!(e.field_confidence(Field::Name), 1.0);
        assert!(!e.confidence.contains_key("extra"));
        assert!(e.human_review);
    }

    struct Dropping;

    impl Rescorer for Dropping {
        fn name(&self) -> &str {
            "dropping"
        }

        fn rescore(&self, mut result: MultiEntryResult) -> MultiEntryResult {
            result.entries.clear();
            result
        }
    }

    #[test]
    fn contract_rejects_dropped_entries() {
        let original = result_of(vec![entry("서울특별시", "성북구", "화랑로")]);
        let out = apply_rescorer(&Dropping, original.clone());
        assert_eq!(out, original);
    }
}
