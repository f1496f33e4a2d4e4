//! Human-review decision.
//!
//! An entry is flagged when its aggregate confidence is below the threshold
//! or when a structural rule fires. Structural rules do not look at the
//! threshold, so a high mean can never hide a field that could not be
//! resolved. Entries are only ever flagged, never dropped.

use std::collections::BTreeMap;
use std::fmt;

use jusorok_core::{Field, PhoneType};

use crate::config::ExtractionConfig;
use crate::fields::ExtractedFields;

/// Why an entry was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReviewReason {
    /// Aggregate confidence below the review threshold.
    LowAggregate,
    /// An address was found but neither 시/도 nor 시/군/구.
    MissingRegion,
    /// A phone number that matched no canonical shape.
    UnknownPhoneType,
    /// Only one of 동 and 호 was found.
    UnpairedDongHo,
    /// Neither a name nor a phone number was found.
    NoContact,
    /// A resolved field scored below the per-field minimum.
    WeakField(Field),
}

impl ReviewReason {
    /// `true` for reasons that concern the address block.
    pub fn is_address(self) -> bool {
        match self {
            ReviewReason::MissingRegion | ReviewReason::UnpairedDongHo => true,
            ReviewReason::WeakField(field) => field.is_address(),
            _ => false,
        }
    }
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewReason::LowAggregate => write!(f, "low_aggregate"),
            ReviewReason::MissingRegion => write!(f, "missing_region"),
            ReviewReason::UnknownPhoneType => write!(f, "unknown_phone_type"),
            ReviewReason::UnpairedDongHo => write!(f, "unpaired_dong_ho"),
            ReviewReason::NoContact => write!(f, "no_contact"),
            ReviewReason::WeakField(field) => write!(f, "weak_field:{field}"),
        }
    }
}

/// Thresholds deciding `human_review`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPolicy {
    pub review_threshold: f64,
    pub min_field_confidence: f64,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl ReviewPolicy {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            review_threshold: config.review_threshold(),
            min_field_confidence: config.min_field_confidence(),
        }
    }

    /// Rules that hold regardless of the numeric threshold.
    pub fn structural_reasons(
        &self,
        fields: &ExtractedFields,
        confidence: &BTreeMap<Field, f64>,
    ) -> Vec<ReviewReason> {
        let mut reasons = Vec::new();

        if fields.has_address() && !fields.has(Field::Sido) && !fields.has(Field::Sigungu) {
            reasons.push(ReviewReason::MissingRegion);
        }
        if fields.phone_type == Some(PhoneType::Unknown) {
            reasons.push(ReviewReason::UnknownPhoneType);
        }
        if fields.has(Field::Dong) != fields.has(Field::Ho) {
            reasons.push(ReviewReason::UnpairedDongHo);
        }
        if !fields.has(Field::Name) && !fields.has(Field::Phone) {
            reasons.push(ReviewReason::NoContact);
        }
        for field in Field::ALL {
            let value = confidence.get(&field).copied().unwrap_or(0.0);
            if fields.has(field) && value < self.min_field_confidence {
                reasons.push(ReviewReason::WeakField(field));
            }
        }

        reasons
    }

    /// Every reason that applies, threshold rule first.
    pub fn reasons(
        &self,
        fields: &ExtractedFields,
        confidence: &BTreeMap<Field, f64>,
        aggregate: f64,
    ) -> Vec<ReviewReason> {
        let mut reasons = Vec::new();
        if aggregate < self.review_threshold {
            reasons.push(ReviewReason::LowAggregate);
        }
        reasons.extend(self.structural_reasons(fields, confidence));
        reasons
    }

    /// Review decision from an aggregate and the structural reasons.
    pub fn needs_review(&self, aggregate: f64, structural: &[ReviewReason]) -> bool {
        aggregate < self.review_threshold || !structural.is_empty()
    }
}
