//! Per-field confidence.
//!
//! `confidence = match_weight · match_strength + quality_weight · quality`,
//! where match strength is 1 for a canonical match, the configured partial
//! strength for an alias or fallback match, and 0 for an empty field. Every
//! field of [`Field::ALL`] gets a value, so aggregation is always over the
//! same eleven fields.

use std::collections::BTreeMap;

use jusorok_core::Field;

use crate::config::ExtractionConfig;
use crate::fields::ExtractedFields;
use crate::quality::EntryQuality;

/// Weights for the confidence function.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub match_weight: f64,
    pub quality_weight: f64,
    pub partial_match_strength: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl ScoringWeights {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            match_weight: config.match_weight(),
            quality_weight: config.quality_weight(),
            partial_match_strength: config.partial_match_strength(),
        }
    }
}

/// Combine match strength and quality into a confidence in [0, 1].
pub fn field_confidence(strength: f64, quality: f64, weights: &ScoringWeights) -> f64 {
    (weights.match_weight * strength + weights.quality_weight * quality).clamp(0.0, 1.0)
}

/// Confidence for every field of [`Field::ALL`].
pub fn score_fields(
    fields: &ExtractedFields,
    quality: &EntryQuality,
    weights: &ScoringWeights,
) -> BTreeMap<Field, f64> {
    Field::ALL
        .iter()
        .map(|&field| {
            let confidence = match fields.get(field) {
                Some(m) => field_confidence(
                    m.strength.value(weights.partial_match_strength),
                    quality.field(field),
                    weights,
                ),
                None => 0.0,
            };
            (field, confidence)
        })
        .collect()
}

/// Mean over every field confidence, empty fields included.
pub fn aggregate(confidence: &BTreeMap<Field, f64>) -> f64 {
    if confidence.is_empty() {
        return 0.0;
    }
    confidence.values().sum::<f64>() / confidence.len() as f64
}
