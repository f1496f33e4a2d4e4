use regex::Regex;
use thiserror::Error;

use jusorok_core::config_file::ConfigFile;

pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.6;
pub const DEFAULT_MATCH_WEIGHT: f64 = 0.7;
pub const DEFAULT_PARTIAL_MATCH_STRENGTH: f64 = 0.6;
pub const DEFAULT_MIN_FIELD_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 8;

/// Suffixes that mark a token as a building name.
pub static DEFAULT_BUILDING_SUFFIXES: &[&str] = &[
    "아파트",
    "빌딩",
    "타워",
    "맨션",
    "오피스텔",
    "빌라",
    "스퀘어",
    "센터",
    "플라자",
    "타운",
];

/// Form labels that are never taken as a person's name.
pub static DEFAULT_NAME_LABELS: &[&str] = &[
    "성명",
    "이름",
    "전화",
    "연락처",
    "휴대폰",
    "핸드폰",
    "주소",
    "전화번호",
    "휴대전화",
    "수령인",
    "받는분",
];

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn extensions(&self) -> &[T] {
        match self {
            ListOverride::Extend(v) => v,
            _ => &[],
        }
    }

    fn values(&self) -> &[T] {
        match self {
            ListOverride::Default => &[],
            ListOverride::Replace(v) | ListOverride::Extend(v) => v,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("match_weight + quality_weight must equal 1, got {match_weight} + {quality_weight}")]
    WeightSum {
        match_weight: f64,
        quality_weight: f64,
    },
    #[error("{list} must not contain empty entries")]
    EmptyListItem { list: &'static str },
    #[error("{list} must not be empty")]
    EmptyList { list: &'static str },
    #[error("invalid building suffix pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration for the contact extraction pipeline.
///
/// Construct with [`ExtractionConfigBuilder`]; every value is validated in
/// [`build()`](ExtractionConfigBuilder::build) so a config that exists is
/// always usable.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    // ── review.rs ──
    pub(crate) review_threshold: f64,
    pub(crate) min_field_confidence: f64,

    // ── scoring.rs ──
    pub(crate) match_weight: f64,
    pub(crate) quality_weight: f64,
    pub(crate) partial_match_strength: f64,

    // ── extractor.rs ──
    /// Entry count above which fields are extracted on the rayon pool.
    pub(crate) parallel_threshold: usize,

    // ── address.rs / name.rs ──
    pub(crate) building_suffixes: ListOverride<String>,
    /// Compiled from `building_suffixes`; `None` means the built-in pattern.
    pub(crate) building_name_re: Option<Regex>,
    pub(crate) name_labels: ListOverride<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            min_field_confidence: DEFAULT_MIN_FIELD_CONFIDENCE,
            match_weight: DEFAULT_MATCH_WEIGHT,
            quality_weight: 1.0 - DEFAULT_MATCH_WEIGHT,
            partial_match_strength: DEFAULT_PARTIAL_MATCH_STRENGTH,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            building_suffixes: ListOverride::Default,
            building_name_re: None,
            name_labels: ListOverride::Default,
        }
    }
}

impl ExtractionConfig {
    pub fn review_threshold(&self) -> f64 {
        self.review_threshold
    }

    pub fn min_field_confidence(&self) -> f64 {
        self.min_field_confidence
    }

    pub fn match_weight(&self) -> f64 {
        self.match_weight
    }

    pub fn quality_weight(&self) -> f64 {
        self.quality_weight
    }

    pub fn partial_match_strength(&self) -> f64 {
        self.partial_match_strength
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Building-name suffixes after applying overrides.
    pub fn building_suffixes(&self) -> Vec<String> {
        self.building_suffixes.resolve(&owned(DEFAULT_BUILDING_SUFFIXES))
    }

    /// Name label words after applying overrides.
    pub fn name_labels(&self) -> Vec<String> {
        self.name_labels.resolve(&owned(DEFAULT_NAME_LABELS))
    }

    /// Building-name suffixes appended to the defaults, if any.
    ///
    /// A full replacement list is not an extension and gives an empty slice.
    pub fn extra_building_suffixes(&self) -> &[String] {
        self.building_suffixes.extensions()
    }

    /// Name labels appended to the defaults, if any.
    pub fn extra_name_labels(&self) -> &[String] {
        self.name_labels.extensions()
    }

    /// A copy of this config with a different review threshold.
    ///
    /// Returns an error when `threshold` is outside [0, 1].
    pub fn with_review_threshold(&self, threshold: f64) -> Result<Self, ConfigError> {
        check_unit("review_threshold", threshold)?;
        Ok(Self {
            review_threshold: threshold,
            ..self.clone()
        })
    }

    /// Snapshot recorded in result metadata.
    pub fn to_metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "review_threshold": self.review_threshold,
            "min_field_confidence": self.min_field_confidence,
            "match_weight": self.match_weight,
            "quality_weight": self.quality_weight,
            "partial_match_strength": self.partial_match_strength,
            "building_suffixes": self.building_suffixes(),
            "name_labels": self.name_labels(),
        })
    }
}

/// Builder for [`ExtractionConfig`].
///
/// When only one of the two weights is given, the other is derived so that
/// they sum to 1.
#[derive(Debug, Clone, Default)]
pub struct ExtractionConfigBuilder {
    review_threshold: Option<f64>,
    min_field_confidence: Option<f64>,
    match_weight: Option<f64>,
    quality_weight: Option<f64>,
    partial_match_strength: Option<f64>,
    parallel_threshold: Option<usize>,
    building_suffixes: ListOverride<String>,
    name_labels: ListOverride<String>,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the values present in a config file.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let mut builder = Self::new();
        if let Some(scoring) = &file.scoring {
            builder.match_weight = scoring.match_weight;
            builder.quality_weight = scoring.quality_weight;
            builder.partial_match_strength = scoring.partial_match_strength;
        }
        if let Some(review) = &file.review {
            builder.review_threshold = review.review_threshold;
            builder.min_field_confidence = review.min_field_confidence;
        }
        if let Some(extraction) = &file.extraction {
            builder.parallel_threshold = extraction.parallel_threshold;
            if let Some(extra) = &extraction.extra_building_suffixes {
                builder.building_suffixes = ListOverride::Extend(extra.clone());
            }
            if let Some(extra) = &extraction.extra_name_labels {
                builder.name_labels = ListOverride::Extend(extra.clone());
            }
        }
        builder
    }

    // ── Review ──

    pub fn review_threshold(mut self, threshold: f64) -> Self {
        self.review_threshold = Some(threshold);
        self
    }

    pub fn min_field_confidence(mut self, value: f64) -> Self {
        self.min_field_confidence = Some(value);
        self
    }

    // ── Scoring ──

    /// Weight of the match strength. Also resets an explicit quality weight.
    pub fn match_weight(mut self, weight: f64) -> Self {
        self.match_weight = Some(weight);
        self.quality_weight = None;
        self
    }

    pub fn quality_weight(mut self, weight: f64) -> Self {
        self.quality_weight = Some(weight);
        self
    }

    pub fn partial_match_strength(mut self, strength: f64) -> Self {
        self.partial_match_strength = Some(strength);
        self
    }

    pub fn parallel_threshold(mut self, n: usize) -> Self {
        self.parallel_threshold = Some(n);
        self
    }

    // ── Building suffixes ──

    pub fn set_building_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.building_suffixes = ListOverride::Replace(suffixes);
        self
    }

    pub fn add_building_suffix(mut self, suffix: String) -> Self {
        match &mut self.building_suffixes {
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(suffix),
            ListOverride::Default => self.building_suffixes = ListOverride::Extend(vec![suffix]),
        }
        self
    }

    // ── Name labels ──

    pub fn set_name_labels(mut self, labels: Vec<String>) -> Self {
        self.name_labels = ListOverride::Replace(labels);
        self
    }

    pub fn add_name_label(mut self, label: String) -> Self {
        match &mut self.name_labels {
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(label),
            ListOverride::Default => self.name_labels = ListOverride::Extend(vec![label]),
        }
        self
    }

    /// Validate every value and compile overridden patterns.
    pub fn build(self) -> Result<ExtractionConfig, ConfigError> {
        let (match_weight, quality_weight) = match (self.match_weight, self.quality_weight) {
            (Some(m), Some(q)) => (m, q),
            (Some(m), None) => (m, 1.0 - m),
            (None, Some(q)) => (1.0 - q, q),
            (None, None) => (DEFAULT_MATCH_WEIGHT, 1.0 - DEFAULT_MATCH_WEIGHT),
        };

        let config = ExtractionConfig {
            review_threshold: check_unit(
                "review_threshold",
                self.review_threshold.unwrap_or(DEFAULT_REVIEW_THRESHOLD),
            )?,
            min_field_confidence: check_unit(
                "min_field_confidence",
                self.min_field_confidence
                    .unwrap_or(DEFAULT_MIN_FIELD_CONFIDENCE),
            )?,
            match_weight: check_unit("match_weight", match_weight)?,
            quality_weight: check_unit("quality_weight", quality_weight)?,
            partial_match_strength: check_unit(
                "partial_match_strength",
                self.partial_match_strength
                    .unwrap_or(DEFAULT_PARTIAL_MATCH_STRENGTH),
            )?,
            parallel_threshold: self
                .parallel_threshold
                .unwrap_or(DEFAULT_PARALLEL_THRESHOLD),
            building_name_re: None,
            building_suffixes: self.building_suffixes,
            name_labels: self.name_labels,
        };

        if (config.match_weight + config.quality_weight - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum {
                match_weight: config.match_weight,
                quality_weight: config.quality_weight,
            });
        }

        check_list("building_suffixes", &config.building_suffixes, false)?;
        check_list("name_labels", &config.name_labels, true)?;

        let building_name_re = match config.building_suffixes {
            ListOverride::Default => None,
            _ => Some(crate::address::building_name_regex(
                &config.building_suffixes(),
            )?),
        };

        Ok(ExtractionConfig {
            building_name_re,
            ..config
        })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}

fn check_list(
    list: &'static str,
    values: &ListOverride<String>,
    allow_empty: bool,
) -> Result<(), ConfigError> {
    if values.values().iter().any(|v| v.trim().is_empty()) {
        return Err(ConfigError::EmptyListItem { list });
    }
    if !allow_empty && matches!(values, ListOverride::Replace(v) if v.is_empty()) {
        return Err(ConfigError::EmptyList { list });
    }
    Ok(())
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
