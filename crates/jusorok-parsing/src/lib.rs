use thiserror::Error;

pub mod address;
pub mod assemble;
pub mod config;
pub mod extractor;
pub mod fields;
mod name;
pub mod normalize;
pub mod phone;
pub mod quality;
pub mod review;
pub mod scoring;
pub mod segment;
mod span;

pub use assemble::{ScoredEntry, derive_image_id};
pub use config::{ConfigError, ExtractionConfig, ExtractionConfigBuilder, ListOverride};
pub use extractor::ContactExtractor;
pub use fields::{ExtractedFields, FieldMatch, MatchStrength};
pub use normalize::{NormalizedText, normalize};
pub use review::{ReviewPolicy, ReviewReason};
pub use scoring::ScoringWeights;
pub use segment::{EntrySpan, SegmentSignal};
// Re-export domain types from core (canonical definitions live there)
pub use jusorok_core::{
    AddressComponents, ContactEntry, Field, MultiEntryResult, OcrBackend, OcrError, OcrMetadata,
    PhoneType, Recognized,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("text recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("no text was recognized")]
    EmptyText,
}

/// Extract every contact entry from raw recognized text.
///
/// Pipeline:
/// 1. Normalize the text (NFC, width and dash folding, whitespace)
/// 2. Segment it into entry spans on contact-line and 시/도 signals
/// 3. For each entry, extract phone, name and the address cascade
/// 4. Analyze text quality and score every field
/// 5. Decide `human_review` from the aggregate and structural rules
/// 6. Assemble the result with a derived image id and metadata
///
/// Never fails: empty text gives zero entries, and unresolvable fields are
/// `null` with zero confidence.
pub fn extract(raw: &str, config: &ExtractionConfig) -> MultiEntryResult {
    ContactExtractor::with_config(config.clone()).extract(raw)
}
